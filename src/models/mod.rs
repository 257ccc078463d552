//! Data models for the PlateShare backend.
//!
//! Listings and requests are schema-flexible JSON documents; these modules hold
//! the few members the server itself reads or writes.

mod document;
pub mod food;
pub mod request;

pub use document::*;

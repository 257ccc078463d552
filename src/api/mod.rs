//! REST API module.
//!
//! Reads return bare JSON documents or arrays; writes answer with a
//! `{success, message, result}` envelope.

mod foods;
mod requests;

pub use foods::*;
pub use requests::*;

use axum::{
    extract::FromRequest,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;

/// Success envelope for write operations.
#[derive(Debug, Serialize)]
pub struct WriteResponse<T: Serialize> {
    #[serde(skip)]
    pub status: StatusCode,
    pub success: bool,
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<T>,
}

impl<T: Serialize> WriteResponse<T> {
    pub fn created(message: &'static str, result: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            success: true,
            message,
            result: Some(result),
        }
    }

    pub fn ok(message: &'static str, result: T) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message,
            result: Some(result),
        }
    }
}

impl WriteResponse<()> {
    /// Envelope without a result member.
    pub fn done(message: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            success: true,
            message,
            result: None,
        }
    }
}

impl<T: Serialize> IntoResponse for WriteResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// JSON request body whose rejections answer in the error envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

/// Response type that can be either success or error.
pub type ApiResult<T> = Result<T, AppError>;

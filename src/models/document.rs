//! Identifiers and write results shared by every collection.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::errors::AppError;

/// Member holding a document's identifier.
pub const ID_FIELD: &str = "_id";
/// Member holding the server-assigned creation timestamp.
pub const CREATED_AT_FIELD: &str = "createdAt";

/// A JSON document as stored and returned by the API.
pub type Document = Map<String, Value>;

/// Store-assigned identifier of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier supplied by a client.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        raw.parse()
            .map_err(|_| AppError::BadRequest(format!("Invalid id: {}", raw)))
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.as_hyphenated().fmt(f)
    }
}

/// Outcome of inserting one document.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

impl InsertOneResult {
    pub fn new(id: DocumentId) -> Self {
        Self {
            acknowledged: true,
            inserted_id: id.to_string(),
        }
    }
}

/// Outcome of updating one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
        }
    }
}

/// Stamp a fresh identity and creation time onto a client payload.
///
/// Client values for `_id` and `createdAt` are discarded.
pub fn stamp_new(mut doc: Document, id: DocumentId, now: &str) -> Document {
    doc.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    doc.insert(CREATED_AT_FIELD.to_string(), Value::String(now.to_string()));
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_valid_id() {
        let id = DocumentId::generate();
        let parsed = DocumentId::parse(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_parse_normalizes_case() {
        let parsed = DocumentId::parse("6F9619FF-8B86-D011-B42D-00CF4FC964FF").unwrap();
        assert_eq!(parsed.to_string(), "6f9619ff-8b86-d011-b42d-00cf4fc964ff");
    }

    #[test]
    fn test_parse_malformed_id() {
        let err = DocumentId::parse("not-an-id").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn test_stamp_new_overrides_client_fields() {
        let doc = json!({ "_id": "mine", "createdAt": "yesterday", "title": "Bread" });
        let Value::Object(doc) = doc else { unreachable!() };
        let id = DocumentId::generate();

        let stamped = stamp_new(doc, id, "2026-01-01T00:00:00+00:00");

        assert_eq!(stamped["_id"], json!(id.to_string()));
        assert_eq!(stamped["createdAt"], json!("2026-01-01T00:00:00+00:00"));
        assert_eq!(stamped["title"], json!("Bread"));
    }
}

//! Food listing documents posted by donors.

use serde::Deserialize;
use serde_json::Value;

use super::{stamp_new, Document, DocumentId};

/// Member holding the listing status.
pub const STATUS_FIELD: &str = "food_status";

/// Status of a listing that can still be requested.
pub const STATUS_AVAILABLE: &str = "Available";
/// Status of a listing whose request was accepted.
pub const STATUS_DONATED: &str = "donated";

/// Query parameters of `GET /foods`.
#[derive(Debug, Default, Deserialize)]
pub struct ListFoodsQuery {
    #[serde(default)]
    pub email: Option<String>,
}

impl ListFoodsQuery {
    /// Donor filter; an empty value means no filter.
    pub fn donator_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|email| !email.is_empty())
    }
}

/// Turn a donor payload into a new listing document.
pub fn new_listing(body: Document, id: DocumentId, now: &str) -> Document {
    let mut doc = stamp_new(body, id, now);
    doc.insert(
        STATUS_FIELD.to_string(),
        Value::String(STATUS_AVAILABLE.to_string()),
    );
    doc
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_listing_forces_available() {
        let Value::Object(body) = json!({
            "title": "Bread",
            "food_status": "donated",
            "donator": { "email": "a@x.com" }
        }) else {
            unreachable!()
        };

        let doc = new_listing(body, DocumentId::generate(), "now");

        assert_eq!(doc[STATUS_FIELD], json!("Available"));
        assert_eq!(doc["donator"]["email"], json!("a@x.com"));
        assert_eq!(doc["createdAt"], json!("now"));
    }

    #[test]
    fn test_empty_email_is_no_filter() {
        let query = ListFoodsQuery {
            email: Some(String::new()),
        };
        assert_eq!(query.donator_email(), None);

        let query = ListFoodsQuery {
            email: Some("a@x.com".to_string()),
        };
        assert_eq!(query.donator_email(), Some("a@x.com"));
    }
}

//! Food requests submitted by recipients against a listing.

use serde::Deserialize;
use serde_json::Value;

use super::{stamp_new, Document, DocumentId, UpdateResult};

pub const STATUS_FIELD: &str = "status";
pub const FOOD_ID_PATH: &str = "$.foodId";
pub const USER_EMAIL_PATH: &str = "$.userEmail";

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACCEPTED: &str = "accepted";

/// Query parameters of `GET /my-requests`.
#[derive(Debug, Default, Deserialize)]
pub struct MyRequestsQuery {
    #[serde(default)]
    pub email: Option<String>,
}

/// Body of `PATCH /requests/{id}`.
///
/// `status` is persisted as given; only `"accepted"` has a side effect.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRequestStatus {
    pub status: String,
    #[serde(default)]
    pub food_id: Option<String>,
}

impl UpdateRequestStatus {
    /// Listing to mark as donated, if this update accepts the request.
    pub fn listing_to_donate(&self) -> Option<&str> {
        if self.status != STATUS_ACCEPTED {
            return None;
        }
        self.food_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Result of a status update, including the listing side effect.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub request: UpdateResult,
    pub listing: Option<UpdateResult>,
}

/// Turn a recipient payload into a new pending request document.
pub fn new_request(body: Document, id: DocumentId, now: &str) -> Document {
    let mut doc = stamp_new(body, id, now);
    doc.insert(
        STATUS_FIELD.to_string(),
        Value::String(STATUS_PENDING.to_string()),
    );
    doc
}

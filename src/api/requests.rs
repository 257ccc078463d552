//! Food request API endpoints.

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::{ApiResult, JsonBody, WriteResponse};
use crate::errors::AppError;
use crate::models::request::{MyRequestsQuery, UpdateRequestStatus};
use crate::models::{Document, DocumentId, InsertOneResult, UpdateResult};
use crate::AppState;

/// Body of a successful status update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateResponse {
    pub success: bool,
    pub message: &'static str,
    pub update_req: UpdateResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_update: Option<UpdateResult>,
}

impl IntoResponse for StatusUpdateResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// POST /requests - Submit a request against a listing.
pub async fn create_request(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<WriteResponse<InsertOneResult>> {
    let result = state
        .repo
        .create_request(body)
        .await
        .map_err(|e| e.or_message("Failed to submit food request"))?;

    tracing::info!(request_id = %result.inserted_id, "Food request submitted");
    Ok(WriteResponse::created("Request submitted", result))
}

/// GET /requests/{foodId} - List requests for a listing.
pub async fn list_requests_for_food(
    State(state): State<AppState>,
    Path(food_id): Path<String>,
) -> ApiResult<Json<Vec<Document>>> {
    let requests = state
        .repo
        .list_requests_for_listing(&food_id)
        .await
        .map_err(|e| e.or_message("Failed to fetch requests"))?;
    Ok(Json(requests))
}

/// PATCH /requests/{id} - Accept, reject or otherwise re-status a request.
pub async fn update_request_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(update): JsonBody<UpdateRequestStatus>,
) -> ApiResult<StatusUpdateResponse> {
    let id = DocumentId::parse(&id)?;

    let outcome = state
        .repo
        .update_request_status(&id, &update)
        .await
        .map_err(|e| e.or_message("Failed to update request"))?;

    tracing::info!(request_id = %id, status = %update.status, "Request status updated");
    Ok(StatusUpdateResponse {
        success: true,
        message: "Request status updated",
        update_req: outcome.request,
        listing_update: outcome.listing,
    })
}

/// GET /my-requests - List requests made by one user.
pub async fn list_my_requests(
    State(state): State<AppState>,
    Query(query): Query<MyRequestsQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let email = match query.email.as_deref() {
        Some(email) if !email.is_empty() => email,
        _ => return Err(AppError::BadRequest("Email query required".to_string())),
    };

    let requests = state
        .repo
        .list_requests_by_user(email)
        .await
        .map_err(|e| e.or_message("Failed to fetch user requests"))?;
    Ok(Json(requests))
}

//! Food listing API endpoints.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::{ApiResult, JsonBody, WriteResponse};
use crate::errors::AppError;
use crate::models::food::ListFoodsQuery;
use crate::models::{Document, DocumentId, InsertOneResult, UpdateResult};
use crate::AppState;

/// POST /foods - Create a new listing.
pub async fn create_food(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<Document>,
) -> ApiResult<WriteResponse<InsertOneResult>> {
    let result = state
        .repo
        .create_listing(body)
        .await
        .map_err(|e| e.or_message("Failed to add food"))?;

    tracing::info!(food_id = %result.inserted_id, "Food listing created");
    Ok(WriteResponse::created("Food added successfully", result))
}

/// GET /foods - List available listings, optionally for one donor.
pub async fn list_foods(
    State(state): State<AppState>,
    Query(query): Query<ListFoodsQuery>,
) -> ApiResult<Json<Vec<Document>>> {
    let foods = state
        .repo
        .list_available(query.donator_email())
        .await
        .map_err(|e| e.or_message("Failed to fetch foods"))?;
    Ok(Json(foods))
}

/// GET /foods/{id} - Get a single listing.
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Document>> {
    let id = DocumentId::parse(&id)?;

    match state.repo.get_listing(&id).await {
        Ok(Some(food)) => Ok(Json(food)),
        Ok(None) => Err(AppError::NotFound("Food not found".to_string())),
        Err(e) => Err(e.or_message("Failed to fetch food")),
    }
}

/// PATCH /foods/{id} - Merge fields into a listing.
pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    JsonBody(patch): JsonBody<Document>,
) -> ApiResult<WriteResponse<UpdateResult>> {
    let id = DocumentId::parse(&id)?;

    let result = state
        .repo
        .update_listing(&id, patch)
        .await
        .map_err(|e| e.or_message("Update failed"))?;

    if result.matched_count == 0 {
        return Err(AppError::NotFound("Food not found".to_string()));
    }
    Ok(WriteResponse::ok("Food updated", result))
}

/// DELETE /foods/{id} - Delete a listing.
pub async fn delete_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<WriteResponse<()>> {
    let id = DocumentId::parse(&id)?;

    state
        .repo
        .delete_listing(&id)
        .await
        .map_err(|e| e.or_message("Delete failed"))?;

    tracing::info!(food_id = %id, "Food listing deleted");
    Ok(WriteResponse::done("Food deleted"))
}

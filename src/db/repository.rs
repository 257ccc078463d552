//! Database repository for document operations.
//!
//! Field merges are single `json_set` statements, so each write is atomic per
//! document. Accepting a request spans two documents and runs in a transaction.

use chrono::Utc;
use serde_json::Value;
use sqlx::{Row, SqliteConnection};
use std::sync::Arc;

use super::{Collection, Database};
use crate::errors::AppError;
use crate::models::food::{self, STATUS_AVAILABLE, STATUS_DONATED};
use crate::models::request::{self, StatusUpdate, UpdateRequestStatus};
use crate::models::{Document, DocumentId, InsertOneResult, UpdateResult, ID_FIELD};

/// Database repository for all data operations.
#[derive(Clone)]
pub struct Repository {
    db: Arc<Database>,
}

impl Repository {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Check that the store answers queries.
    pub async fn ping(&self) -> Result<(), AppError> {
        let pool = self.db.get_connection().await?;
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    // ==================== LISTING OPERATIONS ====================

    /// Insert a new listing, forcing it to "Available".
    pub async fn create_listing(&self, body: Document) -> Result<InsertOneResult, AppError> {
        let id = DocumentId::generate();
        let doc = food::new_listing(body, id, &now());
        self.insert(Collection::Foods, id, &doc).await?;
        Ok(InsertOneResult::new(id))
    }

    /// List available listings, optionally only those of one donor.
    pub async fn list_available(
        &self,
        donator_email: Option<&str>,
    ) -> Result<Vec<Document>, AppError> {
        let pool = self.db.get_connection().await?;
        let rows = match donator_email {
            Some(email) => {
                sqlx::query(
                    "SELECT doc FROM foods WHERE json_extract(doc, '$.food_status') = ? AND json_extract(doc, '$.donator.email') = ? ORDER BY rowid",
                )
                .bind(STATUS_AVAILABLE)
                .bind(email)
                .fetch_all(pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT doc FROM foods WHERE json_extract(doc, '$.food_status') = ? ORDER BY rowid",
                )
                .bind(STATUS_AVAILABLE)
                .fetch_all(pool)
                .await?
            }
        };

        rows.iter().map(document_from_row).collect()
    }

    /// Get a listing by ID.
    pub async fn get_listing(&self, id: &DocumentId) -> Result<Option<Document>, AppError> {
        self.find_by_id(Collection::Foods, id).await
    }

    /// Merge top-level fields into a listing.
    pub async fn update_listing(
        &self,
        id: &DocumentId,
        patch: Document,
    ) -> Result<UpdateResult, AppError> {
        if patch.contains_key(ID_FIELD) {
            return Err(AppError::Validation(format!("{} cannot be modified", ID_FIELD)));
        }
        let fields: Vec<(String, Value)> = patch.into_iter().collect();

        let pool = self.db.get_connection().await?;
        let mut conn = pool.acquire().await?;
        set_fields(&mut conn, Collection::Foods, id, &fields).await
    }

    /// Delete a listing.
    pub async fn delete_listing(&self, id: &DocumentId) -> Result<(), AppError> {
        let pool = self.db.get_connection().await?;
        let result = sqlx::query("DELETE FROM foods WHERE id = ?")
            .bind(id.to_string())
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Food not found".to_string()));
        }
        Ok(())
    }

    // ==================== REQUEST OPERATIONS ====================

    /// Insert a new request in the "pending" state.
    pub async fn create_request(&self, body: Document) -> Result<InsertOneResult, AppError> {
        let id = DocumentId::generate();
        let doc = request::new_request(body, id, &now());
        self.insert(Collection::FoodRequests, id, &doc).await?;
        Ok(InsertOneResult::new(id))
    }

    /// List requests made against a listing.
    pub async fn list_requests_for_listing(
        &self,
        food_id: &str,
    ) -> Result<Vec<Document>, AppError> {
        self.find_by_member(Collection::FoodRequests, request::FOOD_ID_PATH, food_id)
            .await
    }

    /// List requests made by a user.
    pub async fn list_requests_by_user(&self, email: &str) -> Result<Vec<Document>, AppError> {
        self.find_by_member(Collection::FoodRequests, request::USER_EMAIL_PATH, email)
            .await
    }

    /// Set a request's status; accepting it also marks the listing as donated.
    ///
    /// Both writes commit together. A request id that matches nothing rolls back
    /// and yields `NotFound`; a listing id that matches nothing does not.
    pub async fn update_request_status(
        &self,
        id: &DocumentId,
        update: &UpdateRequestStatus,
    ) -> Result<StatusUpdate, AppError> {
        let listing_id = update
            .listing_to_donate()
            .map(DocumentId::parse)
            .transpose()?;

        let pool = self.db.get_connection().await?;
        let mut tx = pool.begin().await?;

        let request_fields = [(
            request::STATUS_FIELD.to_string(),
            Value::String(update.status.clone()),
        )];
        let request_result =
            set_fields(&mut tx, Collection::FoodRequests, id, &request_fields).await?;
        if request_result.matched_count == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound("Request not found".to_string()));
        }

        let listing_result = match listing_id {
            Some(listing_id) => {
                let listing_fields = [(
                    food::STATUS_FIELD.to_string(),
                    Value::String(STATUS_DONATED.to_string()),
                )];
                let result =
                    set_fields(&mut tx, Collection::Foods, &listing_id, &listing_fields).await?;
                if result.matched_count == 0 {
                    tracing::warn!(
                        request_id = %id,
                        food_id = %listing_id,
                        "Accepted request references a missing listing"
                    );
                }
                Some(result)
            }
            None => None,
        };

        tx.commit().await?;

        Ok(StatusUpdate {
            request: request_result,
            listing: listing_result,
        })
    }

    // ==================== SHARED HELPERS ====================

    async fn insert(
        &self,
        collection: Collection,
        id: DocumentId,
        doc: &Document,
    ) -> Result<(), AppError> {
        let pool = self.db.get_connection().await?;
        let doc_json = Value::Object(doc.clone()).to_string();

        sqlx::query(&format!(
            "INSERT INTO {} (id, doc) VALUES (?, json(?))",
            collection.table()
        ))
        .bind(id.to_string())
        .bind(&doc_json)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn find_by_id(
        &self,
        collection: Collection,
        id: &DocumentId,
    ) -> Result<Option<Document>, AppError> {
        let pool = self.db.get_connection().await?;
        let row = sqlx::query(&format!("SELECT doc FROM {} WHERE id = ?", collection.table()))
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;

        row.as_ref().map(document_from_row).transpose()
    }

    async fn find_by_member(
        &self,
        collection: Collection,
        path: &'static str,
        value: &str,
    ) -> Result<Vec<Document>, AppError> {
        let pool = self.db.get_connection().await?;
        let rows = sqlx::query(&format!(
            "SELECT doc FROM {} WHERE json_extract(doc, '{}') = ? ORDER BY rowid",
            collection.table(),
            path
        ))
        .bind(value)
        .fetch_all(pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }
}

/// Overwrite top-level members of one document in a single statement.
async fn set_fields(
    conn: &mut SqliteConnection,
    collection: Collection,
    id: &DocumentId,
    fields: &[(String, Value)],
) -> Result<UpdateResult, AppError> {
    let id = id.to_string();

    if !fields.is_empty() {
        let mut paths = Vec::with_capacity(fields.len());
        for (key, value) in fields {
            paths.push((member_path(key)?, value.to_string()));
        }

        let args = vec!["?, json(?)"; paths.len()].join(", ");
        let sql = format!(
            "UPDATE {table} SET doc = json_set(doc, {args}) WHERE id = ? AND doc IS NOT json_set(doc, {args})",
            table = collection.table(),
        );

        let mut query = sqlx::query(&sql);
        for (path, value) in &paths {
            query = query.bind(path.as_str()).bind(value.as_str());
        }
        query = query.bind(id.as_str());
        for (path, value) in &paths {
            query = query.bind(path.as_str()).bind(value.as_str());
        }

        let modified = query.execute(&mut *conn).await?.rows_affected();
        if modified > 0 {
            return Ok(UpdateResult::new(modified, modified));
        }
    }

    let exists = sqlx::query(&format!("SELECT 1 FROM {} WHERE id = ?", collection.table()))
        .bind(id.as_str())
        .fetch_optional(&mut *conn)
        .await?
        .is_some();

    Ok(UpdateResult::new(u64::from(exists), 0))
}

/// JSON path addressing a top-level member by name.
fn member_path(key: &str) -> Result<String, AppError> {
    if key.contains('"') {
        return Err(AppError::Validation(format!(
            "Field name {:?} is not supported",
            key
        )));
    }
    Ok(format!("$.\"{}\"", key))
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Document, AppError> {
    let doc: String = row.get("doc");
    Ok(serde_json::from_str(&doc)?)
}

fn now() -> String {
    Utc::now().to_rfc3339()
}

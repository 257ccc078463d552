//! Database module for SQLite persistence.
//!
//! SQLite acts as a document store: every collection is a table of JSON
//! documents keyed by their identifier.

mod repository;

pub use repository::*;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::OnceCell;

use crate::errors::AppError;

/// A document collection and the table that backs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Foods,
    FoodRequests,
}

impl Collection {
    pub fn table(self) -> &'static str {
        match self {
            Collection::Foods => "foods",
            Collection::FoodRequests => "food_requests",
        }
    }
}

/// Lazily connected handle to the database.
///
/// The pool is opened on the first `get_connection` call and cached for the
/// lifetime of the process. Concurrent first callers share a single attempt; a
/// failed attempt leaves the cache empty so the next call tries again.
pub struct Database {
    db_path: PathBuf,
    timeout: Duration,
    pool: OnceCell<SqlitePool>,
}

impl Database {
    pub fn new(db_path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            db_path: db_path.into(),
            timeout,
            pool: OnceCell::new(),
        }
    }

    /// Return the cached pool, connecting first if needed.
    pub async fn get_connection(&self) -> Result<&SqlitePool, AppError> {
        self.pool
            .get_or_try_init(|| async {
                let pool = init_database(&self.db_path, self.timeout).await?;
                tracing::info!("Database connected at {:?}", self.db_path);
                Ok::<_, AppError>(pool)
            })
            .await
    }
}

/// Initialize the database connection pool and run migrations.
pub async fn init_database(db_path: &Path, timeout: Duration) -> Result<SqlitePool, sqlx::Error> {
    // Ensure the parent directory exists
    if let Some(parent) = db_path.parent() {
        tokio::fs::create_dir_all(parent).await.ok();
    }

    let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

    let options = SqliteConnectOptions::from_str(&db_url)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
        .busy_timeout(timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .acquire_timeout(timeout)
        .connect_with(options)
        .await?;

    // Run embedded migrations
    run_migrations(&pool).await?;

    Ok(pool)
}

/// Run database migrations.
async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for collection in [Collection::Foods, Collection::FoodRequests] {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (id TEXT PRIMARY KEY, doc TEXT NOT NULL CHECK (json_valid(doc)))",
            collection.table()
        ))
        .execute(pool)
        .await?;
    }

    // Expression indexes for the lookups the API performs
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_foods_status ON foods(json_extract(doc, '$.food_status'));
        CREATE INDEX IF NOT EXISTS idx_foods_donator_email ON foods(json_extract(doc, '$.donator.email'));
        CREATE INDEX IF NOT EXISTS idx_food_requests_food_id ON food_requests(json_extract(doc, '$.foodId'));
        CREATE INDEX IF NOT EXISTS idx_food_requests_user_email ON food_requests(json_extract(doc, '$.userEmail'));
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_connection_is_cached() {
        let temp_dir = TempDir::new().unwrap();
        let db = Database::new(temp_dir.path().join("test.sqlite"), Duration::from_secs(5));

        let first = db.get_connection().await.unwrap() as *const SqlitePool;
        let second = db.get_connection().await.unwrap() as *const SqlitePool;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_first_use_opens_one_pool() {
        let temp_dir = TempDir::new().unwrap();
        let db = Arc::new(Database::new(
            temp_dir.path().join("test.sqlite"),
            Duration::from_secs(5),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let db = db.clone();
                tokio::spawn(async move {
                    db.get_connection().await.map(|pool| pool as *const SqlitePool as usize)
                })
            })
            .collect();

        let mut addrs = Vec::new();
        for handle in handles {
            addrs.push(handle.await.unwrap().unwrap());
        }
        addrs.dedup();
        assert_eq!(addrs.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_connect_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        // A directory cannot be opened as a database file.
        let db = Database::new(temp_dir.path(), Duration::from_secs(1));

        let err = db.get_connection().await.unwrap_err();
        assert!(matches!(err, AppError::Database(_)));
    }
}

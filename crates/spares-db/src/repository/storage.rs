//! # Key-Value Storage
//!
//! Small JSON blobs stored by key, for state that doesn't deserve its own
//! table (the current operator, mostly).
//!
//! A value that no longer parses as the requested type reads as absent and
//! logs a warning; callers fall back to their default.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, warn};

use spares_core::snapshot::KEY_CURRENT_USER;
use spares_core::Operator;

use crate::error::DbResult;

/// Repository for the `kv_store` table.
///
/// ## Usage
/// ```rust,ignore
/// db.storage().set("current_user", &operator).await?;
/// let operator: Option<Operator> = db.storage().get("current_user").await?;
/// ```
#[derive(Debug, Clone)]
pub struct StorageRepository {
    pool: SqlitePool,
}

impl StorageRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StorageRepository { pool }
    }

    /// Reads and parses a value. Missing and unreadable values are both `None`.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DbResult<Option<T>> {
        let raw: Option<String> = sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(key = %key, error = %e, "Stored value is unreadable, ignoring");
                Ok(None)
            }
        }
    }

    /// Stores a value, replacing whatever was there.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        set_with(&mut conn, key, value).await
    }

    /// Deletes a key. Returns whether it existed.
    pub async fn remove(&self, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM kv_store WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn keys(&self) -> DbResult<Vec<String>> {
        let keys: Vec<String> = sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(keys)
    }

    /// The remembered operator, or the default admin.
    pub async fn current_user_or_default(&self) -> DbResult<Operator> {
        Ok(self
            .get::<Operator>(KEY_CURRENT_USER)
            .await?
            .unwrap_or_default())
    }

    pub async fn set_current_user(&self, operator: &Operator) -> DbResult<()> {
        self.set(KEY_CURRENT_USER, operator).await
    }
}

pub(crate) async fn set_with<T: Serialize>(
    conn: &mut SqliteConnection,
    key: &str,
    value: &T,
) -> DbResult<()> {
    let json = serde_json::to_string(value)?;
    debug!(key = %key, bytes = json.len(), "Storing value");

    sqlx::query(
        r#"
        INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
        ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(json)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! The `Database` from `spares-db` holds a `SqlitePool`, so commands can
//! share one handle without extra locking.

use std::path::Path;

use spares_core::Operator;
use spares_db::{Database, DbConfig, DbResult};

/// Wrapper around `Database` handed to every command.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Opens (and migrates) the database file.
    pub async fn open(path: &Path) -> DbResult<Self> {
        let db = Database::new(DbConfig::new(path)).await?;
        Ok(DbState::new(db))
    }

    /// Returns a reference to the inner Database.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let low = db_state.inner().products().low_stock().await?;
    /// ```
    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// The operator recorded on sales, restocks and payments.
    pub async fn operator(&self) -> DbResult<Operator> {
        self.db.storage().current_user_or_default().await
    }
}

//! # Opening the Shop Database
//!
//! Each shop keeps everything in one SQLite file. The `spares` binary opens
//! it once per command, applies any pending migrations, runs the command
//! and closes the pool again.
//!
//! ```text
//! DbConfig::new("~/.local/share/spares/spares.db")
//!      │
//!      ▼
//! Database::new(config)
//!      ├── parent directory created if missing
//!      ├── PRAGMA journal_mode=WAL, synchronous=NORMAL, foreign_keys=ON
//!      ├── PRAGMA busy_timeout   (a second `spares` process waits, not fails)
//!      └── migrations::run_migrations
//!      │
//!      ▼
//! db.categories() / db.products() / db.sales() / db.credits() / ...
//! ```
//!
//! Tests use [`DbConfig::in_memory`], which pins the pool to one connection
//! because every new `:memory:` connection would see an empty database.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use tracing::{debug, info};

use spares_core::snapshot::Snapshot;

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::category::CategoryRepository;
use crate::repository::credit::CreditRepository;
use crate::repository::product::ProductRepository;
use crate::repository::restock::RestockRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::snapshot::{ImportReport, SnapshotRepository};
use crate::repository::storage::StorageRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the data lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DbLocation {
    File(PathBuf),
    Memory,
}

/// How to open the database.
///
/// | Setting            | File default | In-memory |
/// |--------------------|--------------|-----------|
/// | `max_connections`  | 4            | 1         |
/// | `acquire_timeout`  | 30 s         | 5 s       |
/// | `busy_timeout`     | 5 s          | 5 s       |
/// | `run_migrations`   | yes          | yes       |
///
/// ```rust,ignore
/// let config = DbConfig::new("/srv/kariakoo/spares.db")
///     .max_connections(2)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub location: DbLocation,
    pub max_connections: u32,
    /// How long a command waits for a pooled connection.
    pub acquire_timeout: Duration,
    /// How long SQLite retries a locked database before giving up.
    pub busy_timeout: Duration,
    pub run_migrations: bool,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            location: DbLocation::File(path.into()),
            max_connections: 4,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// A throwaway database for tests and demos.
    pub fn in_memory() -> Self {
        DbConfig {
            location: DbLocation::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_secs(5),
            run_migrations: true,
        }
    }

    /// Ignored for in-memory databases, which always use one connection.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max.max(1);
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    pub fn is_in_memory(&self) -> bool {
        self.location == DbLocation::Memory
    }

    fn pool_size(&self) -> u32 {
        if self.is_in_memory() {
            1
        } else {
            self.max_connections
        }
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = match &self.location {
            DbLocation::Memory => SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
                .journal_mode(SqliteJournalMode::Memory),
            DbLocation::File(path) => {
                ensure_parent_dir(path)?;
                SqliteConnectOptions::new()
                    .filename(path)
                    .create_if_missing(true)
                    .journal_mode(SqliteJournalMode::Wal)
            }
        };

        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

fn ensure_parent_dir(path: &Path) -> DbResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
            debug!(dir = %dir.display(), "Creating database directory");
            std::fs::create_dir_all(dir).map_err(|e| {
                DbError::ConnectionFailed(format!("cannot create {}: {}", dir.display(), e))
            })
        }
        _ => Ok(()),
    }
}

// =============================================================================
// Database
// =============================================================================

/// Handle to the shop database. Cheap to clone; every repository accessor
/// hands out a repository sharing the same pool.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("spares.db")).await?;
/// let reorder = db.products().low_stock().await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        match &config.location {
            DbLocation::File(path) => info!(path = %path.display(), "Opening shop database"),
            DbLocation::Memory => debug!("Opening in-memory database"),
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.pool_size())
            .acquire_timeout(config.acquire_timeout)
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        let db = Database { pool };
        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await?;
        debug!("Schema up to date");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(self.pool.clone())
    }

    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone())
    }

    pub fn sales(&self) -> SaleRepository {
        SaleRepository::new(self.pool.clone())
    }

    pub fn credits(&self) -> CreditRepository {
        CreditRepository::new(self.pool.clone())
    }

    pub fn restocks(&self) -> RestockRepository {
        RestockRepository::new(self.pool.clone())
    }

    /// The key-value shim (`current_user` and friends).
    pub fn storage(&self) -> StorageRepository {
        StorageRepository::new(self.pool.clone())
    }

    pub fn snapshots(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.pool.clone())
    }

    /// Reads every table into one [`Snapshot`].
    pub async fn export_snapshot(&self) -> DbResult<Snapshot> {
        self.snapshots().export().await
    }

    /// Imports a snapshot in one transaction, skipping records that exist.
    pub async fn import_snapshot(&self, snapshot: &Snapshot) -> DbResult<ImportReport> {
        self.snapshots().import(snapshot).await
    }

    /// Round-trips a trivial query.
    pub async fn ping(&self) -> DbResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Waits for in-flight queries, then closes every connection. The WAL is
    /// checkpointed into the main file when the last connection goes.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Database closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        db.ping().await.unwrap();
        assert_eq!(db.products().count().await.unwrap(), 0);
        assert_eq!(db.categories().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_database_pragmas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("shop.db");

        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        assert!(path.exists());

        let mode: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(mode.0.to_lowercase(), "wal");

        let fk: (i64,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(fk.0, 1);

        db.close().await;

        // Reopening finds the schema already in place
        let again = Database::new(DbConfig::new(&path)).await.unwrap();
        again.ping().await.unwrap();
        again.close().await;
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/shop.db")
            .max_connections(0)
            .busy_timeout(Duration::from_secs(10))
            .run_migrations(false);

        assert_eq!(config.location, DbLocation::File(PathBuf::from("/tmp/shop.db")));
        assert_eq!(config.pool_size(), 1);
        assert_eq!(config.busy_timeout, Duration::from_secs(10));
        assert!(!config.run_migrations);
        assert!(!config.is_in_memory());

        let memory = DbConfig::in_memory().max_connections(8);
        assert!(memory.is_in_memory());
        assert_eq!(memory.pool_size(), 1);
    }
}

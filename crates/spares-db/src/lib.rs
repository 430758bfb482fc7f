//! # spares-db: Database Layer for Spares POS
//!
//! SQLite storage for the shop, behind async repositories built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Spares POS Data Flow                             │
//! │                                                                         │
//! │  CLI command (spares sale checkout ...)                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  spares-core: plan_checkout(cart, tender, ...) → CheckoutPlan          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    spares-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CategoryRepo  │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_initial  │  │   │
//! │  │   │ WAL, FKs on   │    │ SaleRepo      │    │ _schema.sql  │  │   │
//! │  │   │               │    │ CreditRepo    │    │              │  │   │
//! │  │   └───────────────┘    │ RestockRepo   │    └──────────────┘  │   │
//! │  │                        │ StorageRepo   │                       │   │
//! │  │                        │ SnapshotRepo  │                       │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  spares.db (platform data dir, or SPARES_DB_PATH)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - One repository per table family
//!
//! ## Usage
//!
//! ```rust,ignore
//! use spares_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("spares.db")).await?;
//!
//! let low = db.products().low_stock().await?;
//! let owed = db.credits().summary().await?.total_outstanding;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, DbLocation};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::credit::CreditRepository;
pub use repository::product::ProductRepository;
pub use repository::restock::RestockRepository;
pub use repository::sale::SaleRepository;
pub use repository::snapshot::{ImportReport, SnapshotRepository};
pub use repository::storage::StorageRepository;

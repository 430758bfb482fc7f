//! # Repository Module
//!
//! Database repository implementations for Spares POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI command                                                           │
//! │       │                                                                 │
//! │       │  db.sales().record_checkout(&plan)                              │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── BEGIN                                                             │
//! │  ├── INSERT sales, sale_items                                          │
//! │  ├── UPDATE products SET quantity = quantity - n  (guarded)            │
//! │  ├── INSERT credits (when money is owed)                               │
//! │  └── COMMIT                                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes that other repositories need inside their own transactions are
//! exposed as `pub(crate)` functions taking `&mut SqliteConnection`.
//!
//! ## Available Repositories
//!
//! - [`CategoryRepository`](category::CategoryRepository) - Categories and subcategories
//! - [`ProductRepository`](product::ProductRepository) - Product CRUD and stock
//! - [`SaleRepository`](sale::SaleRepository) - Checkout and sale history
//! - [`CreditRepository`](credit::CreditRepository) - Credit ledger
//! - [`RestockRepository`](restock::RestockRepository) - Restocks and history
//! - [`StorageRepository`](storage::StorageRepository) - Key-value blobs
//! - [`SnapshotRepository`](snapshot::SnapshotRepository) - Whole-store backup

pub mod category;
pub mod credit;
pub mod product;
pub mod restock;
pub mod sale;
pub mod snapshot;
pub mod storage;

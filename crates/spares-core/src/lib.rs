//! # spares-core: Pure Business Logic for Spares POS
//!
//! Everything the shop counter decides lives here as plain functions over
//! plain data: totals, payment splitting, credit balances, restocks and
//! report aggregation. No database, no files, no clock reads (callers pass
//! `now`).
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Spares POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    spares CLI (apps/cli)                        │   │
//! │  │    sale checkout, restock add, credit pay, report csv, ...     │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ spares-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  cart    │ │ checkout │ │  credit  │ │inventory │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  report  │ │  export  │ │ snapshot │ │validation│          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    spares-db (Database Layer)                   │   │
//! │  │        SQLite, migrations, repositories, key-value storage      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, Credit, etc.)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation
//! - [`cart`] - Sales-screen cart and totals
//! - [`checkout`] - Turns a cart and a tender into a sale, stock deductions and credit
//! - [`credit`] - Credit ledger payments and summaries
//! - [`inventory`] - Restock, low stock, inventory summary
//! - [`report`] - Period filtering and sales aggregation
//! - [`export`] - CSV and printable HTML reports
//! - [`snapshot`] - Whole-store JSON backup format
//!
//! ## Example Usage
//!
//! ```rust
//! use spares_core::money::Money;
//!
//! let price = Money::from_minor(12_500);
//! assert_eq!(price.to_string(), "12,500");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod checkout;
pub mod credit;
pub mod error;
pub mod export;
pub mod inventory;
pub mod money;
pub mod report;
pub mod snapshot;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity on a single cart line or restock.
///
/// Catches typos like 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;

/// Largest price, discount or payment accepted, in minor units.
///
/// A full cart of maximum lines stays far below `i64::MAX`.
pub const MAX_AMOUNT: Money = Money::from_minor(10_000_000_000);

/// Largest quantity a product may hold on the shelf.
pub const MAX_STOCK_LEVEL: i64 = 1_000_000;

/// Operator used until someone logs in.
pub const DEFAULT_OPERATOR_NAME: &str = "Admin";

pub const DEFAULT_OPERATOR_ROLE: &str = "admin";

//! # Error Types
//!
//! Domain-specific error types for spares-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  spares-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  spares-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  CLI errors (in app)                                                   │
//! │  └── ApiError         - What the operator sees (code + message)        │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → stderr       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    #[error("Credit not found: {0}")]
    CreditNotFound(String),

    /// Requested quantity exceeds what is on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to cart "BRK-PAD-01" (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "BRK-PAD-01", available: 3, requested: 5 }
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// A category cannot be deleted while products still point at it.
    #[error("Category '{name}' is used by {product_count} product(s)")]
    CategoryInUse { name: String, product_count: usize },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    #[error("Product {0} is not in the cart")]
    NotInCart(String),

    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Per-unit discount larger than the unit price.
    #[error("Discount {discount} exceeds unit price {unit_price} for {sku}")]
    DiscountExceedsPrice {
        sku: String,
        discount: Money,
        unit_price: Money,
    },

    /// Sales that leave a balance on credit need to know who owes it.
    #[error("Customer name is required when part of the sale goes on credit")]
    CustomerRequired,

    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// A credit payment larger than what the customer still owes.
    #[error("Payment {amount} exceeds remaining balance {remaining}")]
    PaymentExceedsBalance { amount: Money, remaining: Money },

    #[error("Credit {0} is already cleared")]
    CreditAlreadyCleared(String),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

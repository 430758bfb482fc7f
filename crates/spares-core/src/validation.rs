//! # Validation Module
//!
//! Input validation for forms: products, categories, sales and credits.
//!
//! ## Validation Layers
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Layer 1: CLI argument parsing (clap)                                  │
//! │  ├── Types, required arguments                                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Lengths, formats, ranges                                          │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  ├── UNIQUE sku, CHECK quantity >= 0, foreign keys                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use spares_core::validation::{validate_sku, validate_quantity};
//!
//! validate_sku("CHAIN-428H").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use std::collections::HashSet;

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT, MAX_ITEM_QUANTITY, MAX_STOCK_LEVEL};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - 1 to 50 characters
/// - Letters, numbers, hyphens and underscores only
///
/// ```rust
/// use spares_core::validation::validate_sku;
///
/// assert!(validate_sku("SPK-NGK-C7").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required("sku", sku, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required("name", name, 200)
}

pub fn validate_category_name(name: &str) -> ValidationResult<()> {
    required("category name", name, 100)
}

/// Subcategory names must be non-empty and unique within their category
/// (case-insensitive).
pub fn validate_subcategories(names: &[String]) -> ValidationResult<()> {
    let mut seen = HashSet::new();
    for name in names {
        required("subcategory", name, 100)?;
        if !seen.insert(name.trim().to_lowercase()) {
            return Err(ValidationError::Duplicate {
                field: "subcategory".to_string(),
                value: name.trim().to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    required("customer name", name, 100)
}

pub fn validate_operator_name(name: &str) -> ValidationResult<()> {
    required("operator name", name, 50)
}

/// Phone numbers: digits, spaces, `+` and `-`, at most 20 characters.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    if phone.len() > 20 {
        return Err(ValidationError::TooLong {
            field: "phone".to_string(),
            max: 20,
        });
    }
    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == '+' || c == ' ' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces, '+' and '-'".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Quantity for a cart line or restock: `1..=MAX_ITEM_QUANTITY`.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Stock levels and thresholds may be zero, up to `MAX_STOCK_LEVEL`.
pub fn validate_stock_level(field: &str, qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if qty > MAX_STOCK_LEVEL {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_STOCK_LEVEL,
        });
    }

    Ok(())
}

/// Prices may be zero (giveaways) but never negative.
///
/// ```rust
/// use spares_core::money::Money;
/// use spares_core::validation::validate_price;
///
/// assert!(validate_price("price", Money::from_minor(0)).is_ok());
/// assert!(validate_price("price", Money::from_minor(-1)).is_err());
/// assert!(validate_price("price", Money::from_minor(i64::MAX)).is_err());
/// ```
pub fn validate_price(field: &str, amount: Money) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }
    within_ceiling(field, amount, 0)
}

pub fn validate_payment_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "payment amount".to_string(),
        });
    }
    within_ceiling("payment amount", amount, 1)
}

fn within_ceiling(field: &str, amount: Money, min: i64) -> ValidationResult<()> {
    if amount > MAX_AMOUNT {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min,
            max: MAX_AMOUNT.minor(),
        });
    }
    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("CHAIN-428").is_ok());
        assert!(validate_sku("oil_10w40").is_ok());

        assert!(validate_sku("").is_err());
        assert!(validate_sku("   ").is_err());
        assert!(validate_sku("has space").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_names() {
        assert!(validate_product_name("Chain Sprocket Kit").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_category_name("Engine").is_ok());
        assert!(validate_category_name(&"x".repeat(101)).is_err());
        assert!(validate_customer_name("  ").is_err());
        assert!(validate_operator_name("Neema").is_ok());
        assert!(validate_operator_name("").is_err());
    }

    #[test]
    fn test_validate_subcategories_rejects_duplicates() {
        let ok = vec!["Pads".to_string(), "Discs".to_string()];
        assert!(validate_subcategories(&ok).is_ok());

        let dup = vec!["Pads".to_string(), "pads ".to_string()];
        assert!(matches!(
            validate_subcategories(&dup),
            Err(ValidationError::Duplicate { .. })
        ));

        let blank = vec!["".to_string()];
        assert!(validate_subcategories(&blank).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+255 712 345 678").is_ok());
        assert!(validate_phone("0712-345678").is_ok());
        assert!(validate_phone("call me").is_err());
        assert!(validate_phone(&"1".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_amounts() {
        assert!(validate_stock_level("quantity", 0).is_ok());
        assert!(validate_stock_level("quantity", -1).is_err());
        assert!(validate_payment_amount(Money::from_minor(1)).is_ok());
        assert!(validate_payment_amount(Money::zero()).is_err());
    }

    #[test]
    fn test_amount_and_stock_ceilings() {
        assert!(validate_price("price", MAX_AMOUNT).is_ok());
        assert!(validate_price("price", MAX_AMOUNT + Money::from_minor(1)).is_err());
        assert!(validate_price("price", Money::from_minor(i64::MAX)).is_err());
        assert!(validate_payment_amount(MAX_AMOUNT).is_ok());
        assert!(matches!(
            validate_payment_amount(Money::from_minor(i64::MAX)),
            Err(ValidationError::OutOfRange { .. })
        ));

        assert!(validate_stock_level("quantity", MAX_STOCK_LEVEL).is_ok());
        assert!(validate_stock_level("quantity", MAX_STOCK_LEVEL + 1).is_err());
        assert!(validate_stock_level("quantity", i64::MAX).is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("").is_err());
        assert!(validate_uuid("not-a-uuid").is_err());
    }
}

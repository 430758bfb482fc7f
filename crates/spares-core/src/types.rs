//! # Domain Types
//!
//! Core domain types used throughout Spares POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│     Product     │◄──│  RestockRecord  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name           │   │  sku (unique)   │   │  previous_qty   │       │
//! │  │  subcategories  │   │  price / cost   │   │  quantity_added │       │
//! │  └─────────────────┘   │  quantity / min │   │  total_cost     │       │
//! │                        └────────▲────────┘   └─────────────────┘       │
//! │                                 │ product_id (snapshot)                │
//! │  ┌─────────────────┐   ┌────────┴────────┐                             │
//! │  │     Credit      │──►│      Sale       │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  remaining      │   │  items          │                             │
//! │  │  payments       │   │  payment split  │                             │
//! │  └─────────────────┘   └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records serialize in camelCase, the shape the web UI keeps in browser
//! storage, so a snapshot exported there can be imported here unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Category
// =============================================================================

/// A product category with an ordered list of subcategory names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "sqlx", sqlx(json))]
    #[serde(default)]
    pub subcategories: Vec<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A spare part on the shelf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub category_id: String,
    /// Denormalized so listings don't need a join; kept in sync on rename.
    pub category_name: String,
    pub subcategory: Option<String>,
    pub price: Money,
    pub cost_price: Money,
    pub quantity: i64,
    /// Low-stock threshold.
    pub min_quantity: i64,
    pub sku: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub last_restocked: Option<DateTime<Utc>>,
}

impl Product {
    /// Quantity at or below the threshold. Evaluated on demand, no hysteresis.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_quantity
    }

    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity <= 0
    }

    /// On-hand value at cost price.
    pub fn stock_value_at_cost(&self) -> Money {
        self.cost_price.times(self.quantity)
    }

    /// On-hand value at selling price.
    pub fn stock_value_at_price(&self) -> Money {
        self.price.times(self.quantity)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was settled at the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum PaymentMethod {
    Cash,
    MobileMoney,
    /// Cash plus mobile money; any shortfall becomes credit.
    Split,
    /// Entire amount owed by the customer.
    Credit,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::MobileMoney => "mobile-money",
            PaymentMethod::Split => "split",
            PaymentMethod::Credit => "credit",
        }
    }
}

/// Method used to pay down a credit balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
#[ts(export)]
pub enum CreditPaymentMethod {
    Cash,
    MobileMoney,
}

impl CreditPaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditPaymentMethod::Cash => "cash",
            CreditPaymentMethod::MobileMoney => "mobile-money",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SaleStatus {
    /// Paid in full at the counter.
    Completed,
    /// Split payment with a shortfall carried as credit.
    Partial,
    /// Entire sale on credit.
    Credit,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Partial => "partial",
            SaleStatus::Credit => "credit",
        }
    }
}

/// Who bought, when it matters (credit sales).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub name: String,
    pub phone: Option<String>,
}

/// Amount settled per method. `cash + mobile_money + credit == final_amount`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PaymentBreakdown {
    pub cash: Money,
    pub mobile_money: Money,
    pub credit: Money,
}

impl PaymentBreakdown {
    /// Money actually collected at the counter.
    #[inline]
    pub fn collected(&self) -> Money {
        self.cash + self.mobile_money
    }

    #[inline]
    pub fn total(&self) -> Money {
        self.collected() + self.credit
    }
}

/// A line item, frozen at the time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub product_id: String,
    /// Product name at time of sale.
    pub name: String,
    /// SKU at time of sale.
    #[serde(default)]
    pub sku: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// Discount per unit, not per line.
    pub discount: Money,
    /// `(unit_price - discount) × quantity`
    pub subtotal: Money,
}

impl SaleItem {
    /// Gross line value before discount.
    #[inline]
    pub fn gross(&self) -> Money {
        self.unit_price.times(self.quantity)
    }

    /// Total discount granted on this line.
    #[inline]
    pub fn line_discount(&self) -> Money {
        self.discount.times(self.quantity)
    }
}

/// A completed checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItem>,
    /// Gross, `Σ unit_price × quantity`.
    pub total_amount: Money,
    pub total_discount: Money,
    /// `total_amount - total_discount`
    pub final_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment: PaymentBreakdown,
    pub customer: Option<Customer>,
    pub status: SaleStatus,
    #[serde(default)]
    pub served_by: String,
}

impl Sale {
    /// Total units across all lines.
    pub fn units(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

// =============================================================================
// Credit
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum CreditStatus {
    /// Nothing paid yet.
    Active,
    /// Some payments recorded, balance remaining.
    Partial,
    /// Balance is zero.
    Cleared,
}

impl CreditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditStatus::Active => "active",
            CreditStatus::Partial => "partial",
            CreditStatus::Cleared => "cleared",
        }
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        !matches!(self, CreditStatus::Cleared)
    }
}

/// One payment against a credit balance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditPayment {
    pub id: String,
    pub amount: Money,
    pub method: CreditPaymentMethod,
    pub received_by: String,
    pub note: Option<String>,
    #[ts(as = "String")]
    pub paid_at: DateTime<Utc>,
}

/// A customer's outstanding balance from a sale.
///
/// Invariant: `amount_paid + remaining_balance == total_amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Credit {
    pub id: String,
    pub customer: Customer,
    pub sale_id: String,
    pub items: Vec<SaleItem>,
    pub total_amount: Money,
    pub amount_paid: Money,
    pub remaining_balance: Money,
    pub payments: Vec<CreditPayment>,
    pub status: CreditStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Restock History
// =============================================================================

/// One replenishment event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RestockRecord {
    pub id: String,
    pub product_id: String,
    pub product_name: String,
    pub previous_quantity: i64,
    pub quantity_added: i64,
    pub new_quantity: i64,
    pub cost_price: Money,
    /// `cost_price × quantity_added`
    pub total_cost: Money,
    pub restocked_by: String,
    pub supplier: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Operator
// =============================================================================

/// The person at the counter. Login is decorative, so this is just a name
/// remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Operator {
    pub name: String,
    pub role: String,
}

impl Default for Operator {
    fn default() -> Self {
        Operator {
            name: crate::DEFAULT_OPERATOR_NAME.to_string(),
            role: crate::DEFAULT_OPERATOR_ROLE.to_string(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Credit Ledger
//!
//! Customer balances left over from credit and partial sales, and the
//! payments that clear them.
//!
//! ## Status Transitions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌──────────┐   pay < remaining   ┌──────────┐   pay = remaining       │
//! │   │  ACTIVE  │ ──────────────────► │ PARTIAL  │ ─────────────────┐      │
//! │   └────┬─────┘                     └────┬─────┘                  │      │
//! │        │                                │ pay < remaining        ▼      │
//! │        │      pay = remaining           └──────► PARTIAL   ┌──────────┐ │
//! │        └───────────────────────────────────────────────────► CLEARED  │ │
//! │                                                            └──────────┘ │
//! │                                                                         │
//! │   amount_paid + remaining_balance == total_amount at every step         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Credit, CreditPayment, CreditPaymentMethod, CreditStatus, Customer, Sale};
use crate::validation::validate_payment_amount;

impl Credit {
    /// Opens a credit for the unpaid part of a sale.
    pub fn from_sale(sale: &Sale, amount: Money, customer: Customer, now: DateTime<Utc>) -> Self {
        Credit {
            id: Uuid::new_v4().to_string(),
            customer,
            sale_id: sale.id.clone(),
            items: sale.items.clone(),
            total_amount: amount,
            amount_paid: Money::zero(),
            remaining_balance: amount,
            payments: Vec::new(),
            status: CreditStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Holds when the ledger is consistent.
    pub fn is_balanced(&self) -> bool {
        self.amount_paid + self.remaining_balance == self.total_amount
    }
}

/// A payment to apply against a credit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub amount: Money,
    pub method: CreditPaymentMethod,
    pub note: Option<String>,
}

/// Applies a payment and returns the recorded payment event.
///
/// The credit is only modified when the payment is accepted.
///
/// ```rust
/// # use chrono::Utc;
/// # use spares_core::{Credit, CreditStatus, Customer, Money, PaymentBreakdown,
/// #     PaymentMethod, Sale, SaleStatus, CreditPaymentMethod};
/// use spares_core::credit::{apply_payment, PaymentRequest};
///
/// # let sale = Sale {
/// #     id: "s1".into(), created_at: Utc::now(), items: vec![],
/// #     total_amount: Money::from_minor(5_000), total_discount: Money::zero(),
/// #     final_amount: Money::from_minor(5_000), payment_method: PaymentMethod::Credit,
/// #     payment: PaymentBreakdown::default(), customer: None,
/// #     status: SaleStatus::Credit, served_by: "Admin".into(),
/// # };
/// # let customer = Customer { name: "Juma".into(), phone: None };
/// let mut credit = Credit::from_sale(&sale, Money::from_minor(5_000), customer, Utc::now());
///
/// let request = PaymentRequest {
///     amount: Money::from_minor(5_000),
///     method: CreditPaymentMethod::Cash,
///     note: None,
/// };
/// apply_payment(&mut credit, request, "Admin", Utc::now()).unwrap();
///
/// assert_eq!(credit.status, CreditStatus::Cleared);
/// assert!(credit.remaining_balance.is_zero());
/// ```
pub fn apply_payment(
    credit: &mut Credit,
    request: PaymentRequest,
    received_by: &str,
    now: DateTime<Utc>,
) -> CoreResult<CreditPayment> {
    if !credit.status.is_open() {
        return Err(CoreError::CreditAlreadyCleared(credit.id.clone()));
    }

    validate_payment_amount(request.amount)?;

    if request.amount > credit.remaining_balance {
        return Err(CoreError::PaymentExceedsBalance {
            amount: request.amount,
            remaining: credit.remaining_balance,
        });
    }

    let payment = CreditPayment {
        id: Uuid::new_v4().to_string(),
        amount: request.amount,
        method: request.method,
        received_by: received_by.to_string(),
        note: request
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        paid_at: now,
    };

    credit.remaining_balance -= request.amount;
    credit.amount_paid += request.amount;
    credit.status = if credit.remaining_balance.is_zero() {
        CreditStatus::Cleared
    } else {
        CreditStatus::Partial
    };
    credit.updated_at = now;
    credit.payments.push(payment.clone());

    Ok(payment)
}

// =============================================================================
// Summaries
// =============================================================================

/// Figures for the top of the credits screen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreditSummary {
    /// Credits with a balance still owed.
    pub open_count: usize,
    pub active_count: usize,
    pub partial_count: usize,
    pub cleared_count: usize,
    pub total_outstanding: Money,
    pub total_collected: Money,
}

impl CreditSummary {
    pub fn from_credits<'a>(credits: impl IntoIterator<Item = &'a Credit>) -> Self {
        let mut summary = CreditSummary::default();
        for credit in credits {
            match credit.status {
                CreditStatus::Active => summary.active_count += 1,
                CreditStatus::Partial => summary.partial_count += 1,
                CreditStatus::Cleared => summary.cleared_count += 1,
            }
            if credit.status.is_open() {
                summary.open_count += 1;
                summary.total_outstanding += credit.remaining_balance;
            }
            summary.total_collected += credit.amount_paid;
        }
        summary
    }
}

/// What one customer owes across all their open credits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerBalance {
    pub name: String,
    pub phone: Option<String>,
    pub credit_count: usize,
    pub outstanding: Money,
}

/// Groups open balances by customer name, ignoring case. Largest balance
/// first; ties by name.
pub fn outstanding_by_customer<'a>(
    credits: impl IntoIterator<Item = &'a Credit>,
) -> Vec<CustomerBalance> {
    let mut by_name: HashMap<String, CustomerBalance> = HashMap::new();

    for credit in credits.into_iter().filter(|c| c.status.is_open()) {
        let key = credit.customer.name.trim().to_lowercase();
        let entry = by_name.entry(key).or_insert_with(|| CustomerBalance {
            name: credit.customer.name.trim().to_string(),
            phone: None,
            credit_count: 0,
            outstanding: Money::zero(),
        });
        entry.credit_count += 1;
        entry.outstanding += credit.remaining_balance;
        if entry.phone.is_none() {
            entry.phone = credit.customer.phone.clone();
        }
    }

    let mut balances: Vec<CustomerBalance> = by_name.into_values().collect();
    balances.sort_by(|a, b| b.outstanding.cmp(&a.outstanding).then_with(|| a.name.cmp(&b.name)));
    balances
}

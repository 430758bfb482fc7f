//! # Checkout
//!
//! Turns a cart plus a tender into everything a sale writes: the sale
//! record, one stock deduction per line and, when money is still owed, a
//! credit record.
//!
//! ## Payment Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Tender            Paid now                  Credit       Status        │
//! │  ──────            ────────                  ──────       ──────        │
//! │  Cash              final (cash)              0            completed     │
//! │  MobileMoney       final (mobile money)      0            completed     │
//! │  Split, c+m = F    c + m                     0            completed     │
//! │  Split, c+m < F    c + m                     F − (c+m)    partial  (*)  │
//! │  Split, c+m > F    rejected, change is not tracked                      │
//! │  Credit            0                         F            credit   (*)  │
//! │                                                                         │
//! │  (*) customer name required                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here touches storage. `spares-db` applies the plan inside one
//! transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::Cart;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{
    Credit, Customer, PaymentBreakdown, PaymentMethod, Sale, SaleStatus,
};
use crate::validation::{validate_customer_name, validate_phone, validate_price};

/// How the customer is paying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum Tender {
    Cash,
    MobileMoney,
    #[serde(rename_all = "camelCase")]
    Split {
        cash: Money,
        mobile_money: Money,
    },
    Credit,
}

impl Tender {
    pub fn method(&self) -> PaymentMethod {
        match self {
            Tender::Cash => PaymentMethod::Cash,
            Tender::MobileMoney => PaymentMethod::MobileMoney,
            Tender::Split { .. } => PaymentMethod::Split,
            Tender::Credit => PaymentMethod::Credit,
        }
    }
}

/// Quantity to take off the shelf for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDeduction {
    pub product_id: String,
    pub sku: String,
    pub quantity: i64,
}

/// Everything a checkout persists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutPlan {
    pub sale: Sale,
    pub stock_deductions: Vec<StockDeduction>,
    pub credit: Option<Credit>,
}

/// Plans a checkout.
///
/// ## Example
/// ```rust
/// # use chrono::Utc;
/// # use spares_core::{Money, Product, SaleStatus};
/// use spares_core::cart::Cart;
/// use spares_core::checkout::{plan_checkout, Tender};
///
/// # let product = Product {
/// #     id: "p1".into(), name: "Spark Plug".into(), category_id: "c1".into(),
/// #     category_name: "Engine".into(), subcategory: None,
/// #     price: Money::from_minor(5_000), cost_price: Money::from_minor(3_000),
/// #     quantity: 10, min_quantity: 2, sku: "SPK-01".into(),
/// #     created_at: Utc::now(), updated_at: Utc::now(), last_restocked: None,
/// # };
/// let mut cart = Cart::new();
/// cart.add_item(&product, 2).unwrap();
///
/// let plan = plan_checkout(&cart, Tender::Cash, None, "Admin", Utc::now()).unwrap();
/// assert_eq!(plan.sale.status, SaleStatus::Completed);
/// assert_eq!(plan.sale.payment.cash.minor(), 10_000);
/// assert!(plan.credit.is_none());
/// ```
pub fn plan_checkout(
    cart: &Cart,
    tender: Tender,
    customer: Option<Customer>,
    served_by: &str,
    now: DateTime<Utc>,
) -> CoreResult<CheckoutPlan> {
    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let totals = cart.totals();
    let final_amount = totals.final_amount;
    let customer = normalize_customer(customer)?;

    let (payment, status) = match tender {
        Tender::Cash => (
            PaymentBreakdown {
                cash: final_amount,
                ..Default::default()
            },
            SaleStatus::Completed,
        ),
        Tender::MobileMoney => (
            PaymentBreakdown {
                mobile_money: final_amount,
                ..Default::default()
            },
            SaleStatus::Completed,
        ),
        Tender::Split { cash, mobile_money } => split_payment(final_amount, cash, mobile_money)?,
        Tender::Credit => (
            PaymentBreakdown {
                credit: final_amount,
                ..Default::default()
            },
            SaleStatus::Credit,
        ),
    };

    let owing_customer = if payment.credit.is_positive() {
        Some(customer.clone().ok_or(CoreError::CustomerRequired)?)
    } else {
        None
    };

    let sale = Sale {
        id: Uuid::new_v4().to_string(),
        created_at: now,
        items: cart.items.iter().map(|i| i.to_sale_item()).collect(),
        total_amount: totals.total_amount,
        total_discount: totals.total_discount,
        final_amount,
        payment_method: tender.method(),
        payment,
        customer,
        status,
        served_by: served_by.to_string(),
    };

    let stock_deductions = cart
        .items
        .iter()
        .map(|i| StockDeduction {
            product_id: i.product_id.clone(),
            sku: i.sku.clone(),
            quantity: i.quantity,
        })
        .collect();

    let credit = owing_customer.map(|c| Credit::from_sale(&sale, payment.credit, c, now));

    Ok(CheckoutPlan {
        sale,
        stock_deductions,
        credit,
    })
}

fn split_payment(
    final_amount: Money,
    cash: Money,
    mobile_money: Money,
) -> CoreResult<(PaymentBreakdown, SaleStatus)> {
    validate_price("cash amount", cash)?;
    validate_price("mobile money amount", mobile_money)?;

    if cash.is_zero() && mobile_money.is_zero() {
        return Err(CoreError::InvalidPaymentAmount {
            reason: "split payment needs a cash or mobile money amount".to_string(),
        });
    }

    let collected = cash
        .checked_add(mobile_money)
        .ok_or_else(|| CoreError::InvalidPaymentAmount {
            reason: "split amounts are too large".to_string(),
        })?;
    if collected > final_amount {
        return Err(CoreError::InvalidPaymentAmount {
            reason: format!(
                "split amounts {} exceed the amount due {}",
                collected, final_amount
            ),
        });
    }

    let shortfall = final_amount - collected;
    let status = if shortfall.is_zero() {
        SaleStatus::Completed
    } else {
        SaleStatus::Partial
    };

    Ok((
        PaymentBreakdown {
            cash,
            mobile_money,
            credit: shortfall,
        },
        status,
    ))
}

/// Trims the customer fields; a blank name means no customer.
fn normalize_customer(customer: Option<Customer>) -> CoreResult<Option<Customer>> {
    let Some(customer) = customer else {
        return Ok(None);
    };

    let name = customer.name.trim().to_string();
    if name.is_empty() {
        return Ok(None);
    }
    validate_customer_name(&name)?;

    let phone = match customer.phone.map(|p| p.trim().to_string()) {
        Some(p) if !p.is_empty() => {
            validate_phone(&p)?;
            Some(p)
        }
        _ => None,
    };

    Ok(Some(Customer { name, phone }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::tests::test_product;
    use crate::types::CreditStatus;

    fn cart_of(price: i64, qty: i64) -> Cart {
        let mut cart = Cart::new();
        cart.add_item(&test_product("1", price, 100), qty).unwrap();
        cart
    }

    fn customer(name: &str) -> Option<Customer> {
        Some(Customer {
            name: name.to_string(),
            phone: Some("0712 000 111".to_string()),
        })
    }

    #[test]
    fn test_empty_cart_rejected() {
        let err = plan_checkout(&Cart::new(), Tender::Cash, None, "Admin", Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::EmptyCart));
    }

    #[test]
    fn test_cash_sale_totals() {
        let mut cart = cart_of(1000, 2);
        cart.set_discount("1", Money::from_minor(100)).unwrap();

        let plan = plan_checkout(&cart, Tender::Cash, None, "Admin", Utc::now()).unwrap();
        let sale = &plan.sale;

        assert_eq!(sale.total_amount.minor(), 2000);
        assert_eq!(sale.total_discount.minor(), 200);
        assert_eq!(sale.final_amount, sale.total_amount - sale.total_discount);
        assert_eq!(sale.payment.cash.minor(), 1800);
        assert_eq!(sale.payment.total(), sale.final_amount);
        assert_eq!(sale.items[0].subtotal.minor(), 1800);
        assert_eq!(sale.served_by, "Admin");
        assert_eq!(
            plan.stock_deductions,
            vec![StockDeduction {
                product_id: "1".to_string(),
                sku: "SKU-1".to_string(),
                quantity: 2,
            }]
        );
    }

    #[test]
    fn test_mobile_money_sale() {
        let plan = plan_checkout(&cart_of(500, 3), Tender::MobileMoney, None, "Admin", Utc::now())
            .unwrap();
        assert_eq!(plan.sale.payment_method, PaymentMethod::MobileMoney);
        assert_eq!(plan.sale.payment.mobile_money.minor(), 1500);
        assert_eq!(plan.sale.status, SaleStatus::Completed);
    }

    #[test]
    fn test_split_exact_is_completed() {
        let tender = Tender::Split {
            cash: Money::from_minor(3000),
            mobile_money: Money::from_minor(2000),
        };
        let plan = plan_checkout(&cart_of(5000, 1), tender, None, "Admin", Utc::now()).unwrap();
        assert_eq!(plan.sale.status, SaleStatus::Completed);
        assert!(plan.credit.is_none());
        assert!(plan.sale.payment.credit.is_zero());
    }

    #[test]
    fn test_split_shortfall_becomes_credit() {
        let tender = Tender::Split {
            cash: Money::from_minor(2000),
            mobile_money: Money::from_minor(1000),
        };
        let plan =
            plan_checkout(&cart_of(5000, 1), tender, customer("Juma"), "Admin", Utc::now()).unwrap();

        assert_eq!(plan.sale.status, SaleStatus::Partial);
        assert_eq!(plan.sale.payment.credit.minor(), 2000);
        assert_eq!(plan.sale.payment.total(), plan.sale.final_amount);

        let credit = plan.credit.unwrap();
        assert_eq!(credit.sale_id, plan.sale.id);
        assert_eq!(credit.total_amount.minor(), 2000);
        assert_eq!(credit.remaining_balance.minor(), 2000);
        assert!(credit.amount_paid.is_zero());
        assert_eq!(credit.status, CreditStatus::Active);
        assert_eq!(credit.customer.name, "Juma");
    }

    #[test]
    fn test_split_shortfall_requires_customer() {
        let tender = Tender::Split {
            cash: Money::from_minor(1000),
            mobile_money: Money::zero(),
        };
        let err = plan_checkout(&cart_of(5000, 1), tender, customer("   "), "Admin", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::CustomerRequired));
    }

    #[test]
    fn test_split_rejects_bad_amounts() {
        let over = Tender::Split {
            cash: Money::from_minor(4000),
            mobile_money: Money::from_minor(2000),
        };
        assert!(matches!(
            plan_checkout(&cart_of(5000, 1), over, None, "Admin", Utc::now()),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));

        let nothing = Tender::Split {
            cash: Money::zero(),
            mobile_money: Money::zero(),
        };
        assert!(plan_checkout(&cart_of(5000, 1), nothing, customer("Juma"), "Admin", Utc::now())
            .is_err());

        let negative = Tender::Split {
            cash: Money::from_minor(-1),
            mobile_money: Money::from_minor(100),
        };
        assert!(plan_checkout(&cart_of(5000, 1), negative, customer("Juma"), "Admin", Utc::now())
            .is_err());
    }

    #[test]
    fn test_split_amounts_near_i64_max_rejected() {
        let huge = Tender::Split {
            cash: Money::from_minor(i64::MAX),
            mobile_money: Money::from_minor(1),
        };
        let err = plan_checkout(&cart_of(5000, 1), huge, customer("Juma"), "Admin", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let both_max = Tender::Split {
            cash: crate::MAX_AMOUNT,
            mobile_money: crate::MAX_AMOUNT,
        };
        let err = plan_checkout(&cart_of(5000, 1), both_max, customer("Juma"), "Admin", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidPaymentAmount { .. }));
    }

    #[test]
    fn test_full_credit_sale() {
        let plan =
            plan_checkout(&cart_of(2500, 2), Tender::Credit, customer("Amina"), "Admin", Utc::now())
                .unwrap();
        assert_eq!(plan.sale.status, SaleStatus::Credit);
        assert!(plan.sale.payment.collected().is_zero());

        let credit = plan.credit.unwrap();
        assert_eq!(credit.total_amount.minor(), 5000);
        assert_eq!(credit.items, plan.sale.items);
        assert_eq!(credit.customer.phone.as_deref(), Some("0712 000 111"));
    }

    #[test]
    fn test_credit_sale_requires_customer() {
        let err = plan_checkout(&cart_of(2500, 1), Tender::Credit, None, "Admin", Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::CustomerRequired));
    }

    #[test]
    fn test_invalid_phone_rejected() {
        let bad = Some(Customer {
            name: "Juma".to_string(),
            phone: Some("call me".to_string()),
        });
        assert!(plan_checkout(&cart_of(100, 1), Tender::Credit, bad, "Admin", Utc::now()).is_err());
    }

    #[test]
    fn test_tender_wire_format() {
        let tender: Tender = serde_json::from_str(
            r#"{"method":"split","cash":1000,"mobileMoney":500}"#,
        )
        .unwrap();
        assert_eq!(
            tender,
            Tender::Split {
                cash: Money::from_minor(1000),
                mobile_money: Money::from_minor(500),
            }
        );
        let cash: Tender = serde_json::from_str(r#"{"method":"mobile-money"}"#).unwrap();
        assert_eq!(cash.method(), PaymentMethod::MobileMoney);
    }
}

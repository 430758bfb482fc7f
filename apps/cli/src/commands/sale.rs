//! # Sale Commands
//!
//! Checkout and the sales history.
//!
//! ## Checkout Flow
//! ```text
//! spares sale checkout --item SPK-C7:2 --item BRK-PAD:1:500 --method split --cash 10000 --customer Juma
//!      │
//!      ▼
//! parse lines ──► products().find(sku) ──► Cart::add_item / set_discount
//!      │                                        (stock checked here)
//!      ▼
//! Tender::Split { cash: 10000, mobile_money: 0 }
//!      │
//!      ▼
//! plan_checkout(&cart, tender, customer, operator, now)
//!      │
//!      ▼
//! sales().record_checkout(&plan)
//!      ├── INSERT sale + items
//!      ├── UPDATE products SET quantity = quantity - n   (guarded, per line)
//!      └── INSERT credit (shortfall owed by Juma)
//!      │
//!      ▼
//! { sale, credit }
//! ```

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use spares_core::cart::Cart;
use spares_core::checkout::{plan_checkout, Tender};
use spares_core::{Credit, Customer, Money, Sale, ValidationError};

use crate::cli::{CheckoutArgs, SaleCommand, TenderArg};
use crate::commands::Output;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleResponse {
    pub sale: Sale,
    pub credit: Option<Credit>,
}

/// One `--item` argument.
#[derive(Debug, Clone, PartialEq)]
struct CartLine {
    product: String,
    quantity: i64,
    discount: Option<Money>,
}

pub async fn run(db: &DbState, config: &ConfigState, cmd: SaleCommand) -> Result<Output, ApiError> {
    match cmd {
        SaleCommand::Checkout(args) => checkout(db, config, args).await,
        SaleCommand::Show { id } => show(db, &id).await,
        SaleCommand::List { from, to } => list(db, from, to).await,
    }
}

pub(crate) async fn checkout(
    db: &DbState,
    config: &ConfigState,
    args: CheckoutArgs,
) -> Result<Output, ApiError> {
    debug!(lines = args.items.len(), method = ?args.method, "sale checkout command");

    let lines = args
        .items
        .iter()
        .map(|raw| parse_line(raw, config))
        .collect::<Result<Vec<_>, _>>()?;

    let mut cart = Cart::new();
    for line in &lines {
        let product = db.inner().products().find(&line.product).await?;
        cart.add_item(&product, line.quantity)?;
        if let Some(discount) = line.discount {
            cart.set_discount(&product.id, discount)?;
        }
    }

    let tender = tender(config, &args)?;
    let customer = args.customer.map(|name| Customer {
        name,
        phone: args.phone,
    });

    let operator = db.operator().await?;
    let plan = plan_checkout(&cart, tender, customer, &operator.name, Utc::now())?;
    db.inner().sales().record_checkout(&plan).await?;

    info!(
        id = %plan.sale.id,
        total = %plan.sale.final_amount,
        status = plan.sale.status.as_str(),
        "Checkout complete"
    );
    Output::json(&SaleResponse {
        sale: plan.sale,
        credit: plan.credit,
    })
}

async fn show(db: &DbState, id: &str) -> Result<Output, ApiError> {
    debug!(id = %id, "sale show command");

    let sale = db.inner().sales().find(id).await?;
    let credit = db.inner().credits().get_by_sale(&sale.id).await?;

    Output::json(&SaleResponse { sale, credit })
}

/// Sales between two days, both inclusive; oldest first.
async fn list(db: &DbState, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Output, ApiError> {
    debug!(?from, ?to, "sale list command");

    if let (Some(from), Some(to)) = (from, to) {
        if to < from {
            return Err(ApiError::validation(format!(
                "end {} is before start {}",
                to, from
            )));
        }
    }

    let start = from.map(start_of_day);
    let end = match to {
        Some(d) => {
            let next = d
                .checked_add_days(Days::new(1))
                .ok_or_else(|| ApiError::validation(format!("{} is too far in the future", d)))?;
            Some(start_of_day(next))
        }
        None => None,
    };
    let sales = db.inner().sales().list_between(start, end).await?;

    Output::json(&sales)
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// Parses `SKU:QTY` or `SKU:QTY:DISCOUNT`.
fn parse_line(raw: &str, config: &ConfigState) -> Result<CartLine, ApiError> {
    let invalid = |reason: &str| {
        ApiError::from(ValidationError::InvalidFormat {
            field: "item".to_string(),
            reason: format!("'{}': {}", raw, reason),
        })
    };

    let mut parts = raw.split(':');
    let product = parts.next().map(str::trim).unwrap_or_default();
    if product.is_empty() {
        return Err(invalid("missing SKU"));
    }

    let quantity = match parts.next() {
        Some(q) => q
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid("quantity must be a whole number"))?,
        None => return Err(invalid("expected SKU:QTY")),
    };

    let discount = parts
        .next()
        .map(|d| config.parse_money(d.trim()))
        .transpose()?;

    if parts.next().is_some() {
        return Err(invalid("expected SKU:QTY[:DISCOUNT]"));
    }

    Ok(CartLine {
        product: product.to_string(),
        quantity,
        discount,
    })
}

fn tender(config: &ConfigState, args: &CheckoutArgs) -> Result<Tender, ApiError> {
    let amount = |value: &Option<String>| -> Result<Money, ApiError> {
        match value {
            Some(v) => config.parse_money(v),
            None => Ok(Money::zero()),
        }
    };

    if args.method != TenderArg::Split && (args.cash.is_some() || args.mobile_money.is_some()) {
        return Err(ApiError::validation(
            "--cash and --mobile-money only apply to --method split",
        ));
    }

    Ok(match args.method {
        TenderArg::Cash => Tender::Cash,
        TenderArg::MobileMoney => Tender::MobileMoney,
        TenderArg::Split => Tender::Split {
            cash: amount(&args.cash)?,
            mobile_money: amount(&args.mobile_money)?,
        },
        TenderArg::Credit => Tender::Credit,
    })
}

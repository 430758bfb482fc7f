//! # Credit Commands
//!
//! The credits screen: who owes what, and taking payments.

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use spares_core::credit::{outstanding_by_customer, CreditSummary, CustomerBalance, PaymentRequest};
use spares_core::{CreditPaymentMethod, CreditStatus};

use crate::cli::{CreditCommand, CreditStatusArg, PayMethodArg};
use crate::commands::Output;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditOverview {
    #[serde(flatten)]
    pub summary: CreditSummary,
    pub customers: Vec<CustomerBalance>,
}

impl From<CreditStatusArg> for CreditStatus {
    fn from(arg: CreditStatusArg) -> Self {
        match arg {
            CreditStatusArg::Active => CreditStatus::Active,
            CreditStatusArg::Partial => CreditStatus::Partial,
            CreditStatusArg::Cleared => CreditStatus::Cleared,
        }
    }
}

impl From<PayMethodArg> for CreditPaymentMethod {
    fn from(arg: PayMethodArg) -> Self {
        match arg {
            PayMethodArg::Cash => CreditPaymentMethod::Cash,
            PayMethodArg::MobileMoney => CreditPaymentMethod::MobileMoney,
        }
    }
}

pub async fn run(db: &DbState, config: &ConfigState, cmd: CreditCommand) -> Result<Output, ApiError> {
    match cmd {
        CreditCommand::List { status } => list(db, status.map(CreditStatus::from)).await,
        CreditCommand::Show { id } => show(db, &id).await,
        CreditCommand::Pay {
            id,
            amount,
            method,
            note,
        } => {
            let request = PaymentRequest {
                amount: config.parse_money(&amount)?,
                method: method.into(),
                note,
            };
            pay(db, &id, request).await
        }
        CreditCommand::Summary => summary(db).await,
    }
}

/// Newest first.
async fn list(db: &DbState, status: Option<CreditStatus>) -> Result<Output, ApiError> {
    debug!(?status, "credit list command");

    let credits = db.inner().credits().list(status).await?;
    Output::json(&credits)
}

async fn show(db: &DbState, id: &str) -> Result<Output, ApiError> {
    debug!(id = %id, "credit show command");

    let credit = db.inner().credits().find(id).await?;
    Output::json(&credit)
}

pub(crate) async fn pay(db: &DbState, id: &str, request: PaymentRequest) -> Result<Output, ApiError> {
    debug!(id = %id, amount = %request.amount, "credit pay command");

    let operator = db.operator().await?;
    let credit = db
        .inner()
        .credits()
        .record_payment(id, request, &operator.name, Utc::now())
        .await?;

    Output::json(&credit)
}

async fn summary(db: &DbState) -> Result<Output, ApiError> {
    debug!("credit summary command");

    let credits = db.inner().credits().list(None).await?;
    Output::json(&CreditOverview {
        summary: CreditSummary::from_credits(&credits),
        customers: outstanding_by_customer(&credits),
    })
}

//! # Report Commands
//!
//! The sales report screen, CSV export and the printable page.
//!
//! ```text
//! --period week --date 2024-03-13   ──►  Mon 2024-03-11 .. Mon 2024-03-18
//! --from 2024-03-01 --to 2024-03-31 ──►  2024-03-01 .. 2024-04-01
//!                │
//!                ▼
//! sales().list_between(start, end)  ──►  SalesReport::build
//!                                              │
//!                      ┌───────────────────────┼──────────────────────┐
//!                      ▼                       ▼                      ▼
//!                  summary (JSON)        to_csv (file/stdout)   to_print_html
//! ```

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info};

use spares_core::export::{to_csv, to_print_html};
use spares_core::report::{ProductSummary, ReportPeriod, SalesReport, SalesSummary};

use crate::cli::{PeriodArg, PeriodArgs, ReportCommand};
use crate::commands::{write_file, Output};
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// The report without the individual sales.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: SalesSummary,
    pub products: Vec<ProductSummary>,
}

impl From<SalesReport> for ReportSummary {
    fn from(report: SalesReport) -> Self {
        ReportSummary {
            label: report.label,
            start: report.start,
            end: report.end,
            summary: report.summary,
            products: report.products,
        }
    }
}

pub async fn run(db: &DbState, config: &ConfigState, cmd: ReportCommand) -> Result<Output, ApiError> {
    match cmd {
        ReportCommand::Summary(period) => {
            let report = build(db, &period).await?;
            Output::json(&ReportSummary::from(report))
        }
        ReportCommand::Csv { period, out } => {
            let report = build(db, &period).await?;
            emit(to_csv(&report, &config.store_info()), out)
        }
        ReportCommand::Html { period, out } => {
            let report = build(db, &period).await?;
            emit(to_print_html(&report, &config.store_info()), out)
        }
    }
}

/// Resolves the period arguments into a period and its anchor day.
pub(crate) fn resolve_period(
    args: &PeriodArgs,
    today: NaiveDate,
) -> Result<(ReportPeriod, NaiveDate), ApiError> {
    let anchor = args.date.unwrap_or(today);

    let period = match (args.from, args.to) {
        (Some(from), Some(to)) => ReportPeriod::custom(from, to)?,
        (None, None) => match args.period {
            PeriodArg::Day => ReportPeriod::Day,
            PeriodArg::Week => ReportPeriod::Week,
            PeriodArg::Month => ReportPeriod::Month,
        },
        _ => return Err(ApiError::validation("--from and --to must be given together")),
    };

    Ok((period, anchor))
}

async fn build(db: &DbState, args: &PeriodArgs) -> Result<SalesReport, ApiError> {
    let (period, anchor) = resolve_period(args, Utc::now().date_naive())?;
    let (start, end) = period.range(anchor)?;
    debug!(%start, %end, "Building sales report");

    let sales = db.inner().sales().list_between(Some(start), Some(end)).await?;
    let report = SalesReport::build(&sales, period, anchor)?;

    info!(
        label = %report.label,
        sales = report.summary.sale_count,
        net = %report.summary.net_sales,
        "Report built"
    );
    Ok(report)
}

fn emit(contents: String, out: Option<PathBuf>) -> Result<Output, ApiError> {
    match out {
        Some(path) => write_file(&path, &contents),
        None => Ok(Output::Raw(contents)),
    }
}

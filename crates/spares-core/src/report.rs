//! # Sales Reports
//!
//! Filters sales into a period and aggregates them for the report screen,
//! the CSV export and the print view.
//!
//! ## Periods
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  anchor = Wed 2024-03-13                                                │
//! │                                                                         │
//! │  Day     [2024-03-13 00:00, 2024-03-14 00:00)                           │
//! │  Week    [2024-03-11 00:00, 2024-03-18 00:00)   Monday start            │
//! │  Month   [2024-03-01 00:00, 2024-04-01 00:00)                           │
//! │  Custom  [from 00:00, to + 1 day 00:00)         both dates inclusive    │
//! │                                                                         │
//! │  All boundaries are UTC.                                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{PaymentMethod, Sale, SaleStatus};

// =============================================================================
// Period
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ReportPeriod {
    Day,
    Week,
    Month,
    Custom { from: NaiveDate, to: NaiveDate },
}

impl ReportPeriod {
    /// Validates a custom range.
    pub fn custom(from: NaiveDate, to: NaiveDate) -> CoreResult<Self> {
        if to < from {
            return Err(CoreError::Validation(ValidationError::InvalidFormat {
                field: "date range".to_string(),
                reason: format!("end {} is before start {}", to, from),
            }));
        }
        Ok(ReportPeriod::Custom { from, to })
    }

    /// Half-open UTC range `[start, end)` containing `anchor`. Custom ranges
    /// ignore the anchor. Fails when the range runs past the calendar.
    pub fn range(&self, anchor: NaiveDate) -> CoreResult<(DateTime<Utc>, DateTime<Utc>)> {
        let (first, last_exclusive) = match *self {
            ReportPeriod::Day => (anchor, next_day(anchor)?),
            ReportPeriod::Week => {
                let back = Days::new(anchor.weekday().num_days_from_monday() as u64);
                let monday = anchor
                    .checked_sub_days(back)
                    .ok_or_else(|| out_of_calendar(anchor))?;
                let next = monday
                    .checked_add_days(Days::new(7))
                    .ok_or_else(|| out_of_calendar(anchor))?;
                (monday, next)
            }
            ReportPeriod::Month => {
                let first = anchor.with_day(1).unwrap_or(anchor);
                let next = first
                    .checked_add_months(Months::new(1))
                    .ok_or_else(|| out_of_calendar(anchor))?;
                (first, next)
            }
            ReportPeriod::Custom { from, to } => (from, next_day(to)?),
        };
        Ok((start_of(first), start_of(last_exclusive)))
    }

    /// Human label, e.g. `Week of 2024-03-11`.
    pub fn label(&self, anchor: NaiveDate) -> CoreResult<String> {
        let (start, _) = self.range(anchor)?;
        Ok(match self {
            ReportPeriod::Day => format!("Day {}", start.date_naive()),
            ReportPeriod::Week => format!("Week of {}", start.date_naive()),
            ReportPeriod::Month => start.format("Month %B %Y").to_string(),
            ReportPeriod::Custom { from, to } => format!("{} to {}", from, to),
        })
    }
}

fn next_day(date: NaiveDate) -> CoreResult<NaiveDate> {
    date.checked_add_days(Days::new(1))
        .ok_or_else(|| out_of_calendar(date))
}

fn out_of_calendar(date: NaiveDate) -> CoreError {
    CoreError::Validation(ValidationError::InvalidFormat {
        field: "date".to_string(),
        reason: format!("period around {} runs past the supported calendar", date),
    })
}

fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

// =============================================================================
// Summaries
// =============================================================================

/// Headline figures for a period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesSummary {
    pub sale_count: usize,
    pub completed_count: usize,
    pub partial_count: usize,
    pub credit_count: usize,
    pub items_sold: i64,
    /// Before discounts.
    pub gross_sales: Money,
    pub total_discount: Money,
    pub net_sales: Money,
    pub cash_collected: Money,
    pub mobile_money_collected: Money,
    /// Portion of net sales left owing on credit.
    pub credit_issued: Money,
    /// `net_sales / sale_count`, rounded down; zero with no sales.
    pub average_sale: Money,
}

impl SalesSummary {
    pub fn from_sales<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Self {
        let mut s = SalesSummary::default();
        for sale in sales {
            s.sale_count += 1;
            match sale.status {
                SaleStatus::Completed => s.completed_count += 1,
                SaleStatus::Partial => s.partial_count += 1,
                SaleStatus::Credit => s.credit_count += 1,
            }
            s.items_sold += sale.units();
            s.gross_sales += sale.total_amount;
            s.total_discount += sale.total_discount;
            s.net_sales += sale.final_amount;
            s.cash_collected += sale.payment.cash;
            s.mobile_money_collected += sale.payment.mobile_money;
            s.credit_issued += sale.payment.credit;
        }
        if s.sale_count > 0 {
            s.average_sale = Money::from_minor(s.net_sales.minor() / s.sale_count as i64);
        }
        s
    }

    /// Number of sales per payment method.
    pub fn method_counts<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Vec<(PaymentMethod, usize)> {
        let mut counts: Vec<(PaymentMethod, usize)> = [
            PaymentMethod::Cash,
            PaymentMethod::MobileMoney,
            PaymentMethod::Split,
            PaymentMethod::Credit,
        ]
        .into_iter()
        .map(|m| (m, 0))
        .collect();
        for sale in sales {
            if let Some(entry) = counts.iter_mut().find(|(m, _)| *m == sale.payment_method) {
                entry.1 += 1;
            }
        }
        counts
    }
}

/// One row of the per-product table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductSummary {
    pub product_id: String,
    pub name: String,
    pub sku: String,
    pub quantity_sold: i64,
    pub gross: Money,
    pub discount: Money,
    pub revenue: Money,
}

/// Per-product rows, highest revenue first.
pub fn product_summaries<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> Vec<ProductSummary> {
    let mut rows: HashMap<&str, ProductSummary> = HashMap::new();

    for item in sales.into_iter().flat_map(|s| s.items.iter()) {
        let row = rows
            .entry(item.product_id.as_str())
            .or_insert_with(|| ProductSummary {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                sku: item.sku.clone(),
                quantity_sold: 0,
                gross: Money::zero(),
                discount: Money::zero(),
                revenue: Money::zero(),
            });
        row.quantity_sold += item.quantity;
        row.gross += item.gross();
        row.discount += item.line_discount();
        row.revenue += item.subtotal;
    }

    let mut rows: Vec<ProductSummary> = rows.into_values().collect();
    rows.sort_by(|a, b| {
        b.revenue
            .cmp(&a.revenue)
            .then_with(|| b.quantity_sold.cmp(&a.quantity_sold))
            .then_with(|| a.name.cmp(&b.name))
    });
    rows
}

// =============================================================================
// Report
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub label: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub summary: SalesSummary,
    pub products: Vec<ProductSummary>,
    /// Sales in range, newest first.
    pub sales: Vec<Sale>,
}

impl SalesReport {
    pub fn build(sales: &[Sale], period: ReportPeriod, anchor: NaiveDate) -> CoreResult<Self> {
        let (start, end) = period.range(anchor)?;

        let mut in_range: Vec<Sale> = sales
            .iter()
            .filter(|s| s.created_at >= start && s.created_at < end)
            .cloned()
            .collect();
        in_range.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(SalesReport {
            label: period.label(anchor)?,
            start,
            end,
            summary: SalesSummary::from_sales(&in_range),
            products: product_summaries(&in_range),
            sales: in_range,
        })
    }

    /// Last day covered; `end` itself is exclusive.
    pub fn last_day(&self) -> NaiveDate {
        let end = self.end.date_naive();
        end.pred_opt().unwrap_or(end)
    }
}

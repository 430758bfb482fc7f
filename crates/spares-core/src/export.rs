//! # Report Export
//!
//! Renders a [`SalesReport`] as CSV or as a printable HTML page.
//!
//! ## CSV Layout
//! ```text
//! "Summary"
//! "Period","Day 2024-03-13"
//! "Total Sales",2
//! ...
//!
//! "Detailed Sales"
//! "Date","Sale ID","Items",...
//! "2024-03-13 15:30","7d1c...","Spark Plug x4; Drive Chain x1",...
//!
//! "Product Summary"
//! "Product","SKU","Quantity Sold","Gross","Discount","Revenue"
//! ```
//!
//! Text cells are always quoted. Cells starting with `=`, `+`, `-` or `@`
//! get a leading `'` so spreadsheets don't evaluate them.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::report::SalesReport;
use crate::types::Sale;

/// Shop details printed on exports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreInfo {
    pub name: String,
    #[serde(default)]
    pub address_lines: Vec<String>,
    /// Shown before amounts, e.g. `TSh`.
    pub currency_symbol: String,
    /// Minor-unit digits; 0 for currencies without cents.
    pub decimals: u8,
}

impl Default for StoreInfo {
    fn default() -> Self {
        StoreInfo {
            name: "Motorbike Spares".to_string(),
            address_lines: Vec::new(),
            currency_symbol: "TSh".to_string(),
            decimals: 0,
        }
    }
}

impl StoreInfo {
    pub fn format_money(&self, amount: Money) -> String {
        format!("{} {}", self.currency_symbol, amount.format_grouped(self.decimals))
    }
}

// =============================================================================
// CSV
// =============================================================================

fn neutralize_formula(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@']) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

fn text(value: &str) -> String {
    format!("\"{}\"", neutralize_formula(value).replace('"', "\"\""))
}

fn row(cells: &[String]) -> String {
    cells.join(",")
}

fn items_label(sale: &Sale) -> String {
    sale.items
        .iter()
        .map(|i| format!("{} x{}", i.name, i.quantity))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Renders the report as CSV with `Summary`, `Detailed Sales` and
/// `Product Summary` sections separated by blank lines.
pub fn to_csv(report: &SalesReport, store: &StoreInfo) -> String {
    let amount = |m: Money| m.to_plain(store.decimals);
    let s = &report.summary;
    let mut lines: Vec<String> = Vec::new();

    lines.push(text("Summary"));
    lines.push(row(&[text("Store"), text(&store.name)]));
    lines.push(row(&[text("Period"), text(&report.label)]));
    lines.push(row(&[text("Total Sales"), s.sale_count.to_string()]));
    lines.push(row(&[text("Items Sold"), s.items_sold.to_string()]));
    lines.push(row(&[text("Gross Sales"), amount(s.gross_sales)]));
    lines.push(row(&[text("Total Discount"), amount(s.total_discount)]));
    lines.push(row(&[text("Net Sales"), amount(s.net_sales)]));
    lines.push(row(&[text("Cash"), amount(s.cash_collected)]));
    lines.push(row(&[text("Mobile Money"), amount(s.mobile_money_collected)]));
    lines.push(row(&[text("Credit Issued"), amount(s.credit_issued)]));
    lines.push(row(&[text("Average Sale"), amount(s.average_sale)]));

    lines.push(String::new());
    lines.push(text("Detailed Sales"));
    lines.push(row(&[
        "Date", "Sale ID", "Items", "Quantity", "Total", "Discount", "Final", "Payment Method",
        "Status", "Customer", "Served By",
    ]
    .map(text)));
    for sale in &report.sales {
        let customer = sale.customer.as_ref().map(|c| c.name.as_str()).unwrap_or("");
        lines.push(row(&[
            text(&sale.created_at.format("%Y-%m-%d %H:%M").to_string()),
            text(&sale.id),
            text(&items_label(sale)),
            sale.units().to_string(),
            amount(sale.total_amount),
            amount(sale.total_discount),
            amount(sale.final_amount),
            text(sale.payment_method.as_str()),
            text(sale.status.as_str()),
            text(customer),
            text(&sale.served_by),
        ]));
    }

    lines.push(String::new());
    lines.push(text("Product Summary"));
    lines.push(row(
        &["Product", "SKU", "Quantity Sold", "Gross", "Discount", "Revenue"].map(text),
    ));
    for p in &report.products {
        lines.push(row(&[
            text(&p.name),
            text(&p.sku),
            p.quantity_sold.to_string(),
            amount(p.gross),
            amount(p.discount),
            amount(p.revenue),
        ]));
    }

    let mut csv = lines.join("\n");
    csv.push('\n');
    csv
}

// =============================================================================
// Print HTML
// =============================================================================

/// Escapes the five HTML special characters.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

const PRINT_STYLE: &str = "\
body{font-family:Arial,Helvetica,sans-serif;margin:24px;color:#222}\
h1{margin:0 0 4px;font-size:22px}\
.muted{color:#666;font-size:12px;margin:0}\
.cards{display:flex;flex-wrap:wrap;gap:12px;margin:20px 0}\
.card{border:1px solid #ddd;border-radius:6px;padding:10px 14px;min-width:140px}\
.card .label{font-size:11px;color:#666;text-transform:uppercase}\
.card .value{font-size:18px;font-weight:bold}\
table{width:100%;border-collapse:collapse;margin-bottom:24px;font-size:12px}\
th,td{border:1px solid #ddd;padding:6px;text-align:left}\
th{background:#f3f3f3}\
td.num{text-align:right}\
@media print{body{margin:0}}";

/// Renders a self-contained HTML page for printing.
pub fn to_print_html(report: &SalesReport, store: &StoreInfo) -> String {
    let money = |m: Money| escape_html(&store.format_money(m));
    let s = &report.summary;
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!(
        "<title>{} - {}</title>\n",
        escape_html(&store.name),
        escape_html(&report.label)
    ));
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", PRINT_STYLE));

    html.push_str(&format!("<h1>{}</h1>\n", escape_html(&store.name)));
    for line in &store.address_lines {
        html.push_str(&format!("<p class=\"muted\">{}</p>\n", escape_html(line)));
    }
    html.push_str(&format!(
        "<p class=\"muted\">Sales report: {} ({} to {})</p>\n",
        escape_html(&report.label),
        report.start.format("%Y-%m-%d"),
        report.last_day().format("%Y-%m-%d")
    ));

    html.push_str("<div class=\"cards\">\n");
    let cards = [
        ("Sales", s.sale_count.to_string()),
        ("Items Sold", s.items_sold.to_string()),
        ("Gross", money(s.gross_sales)),
        ("Discount", money(s.total_discount)),
        ("Net", money(s.net_sales)),
        ("Cash", money(s.cash_collected)),
        ("Mobile Money", money(s.mobile_money_collected)),
        ("Credit Issued", money(s.credit_issued)),
        ("Average Sale", money(s.average_sale)),
    ];
    for (label, value) in cards {
        html.push_str(&format!(
            "<div class=\"card\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>\n",
            label, value
        ));
    }
    html.push_str("</div>\n");

    html.push_str("<h2>Sales</h2>\n<table>\n<tr><th>Date</th><th>Items</th><th>Qty</th><th>Final</th><th>Payment</th><th>Status</th><th>Customer</th></tr>\n");
    for sale in &report.sales {
        let customer = sale.customer.as_ref().map(|c| c.name.as_str()).unwrap_or("-");
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            sale.created_at.format("%Y-%m-%d %H:%M"),
            escape_html(&items_label(sale)),
            sale.units(),
            money(sale.final_amount),
            sale.payment_method.as_str(),
            sale.status.as_str(),
            escape_html(customer),
        ));
    }
    if report.sales.is_empty() {
        html.push_str("<tr><td colspan=\"7\">No sales in this period</td></tr>\n");
    }
    html.push_str("</table>\n");

    html.push_str("<h2>Products</h2>\n<table>\n<tr><th>Product</th><th>SKU</th><th>Qty Sold</th><th>Gross</th><th>Discount</th><th>Revenue</th></tr>\n");
    for p in &report.products {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td><td class=\"num\">{}</td></tr>\n",
            escape_html(&p.name),
            escape_html(&p.sku),
            p.quantity_sold,
            money(p.gross),
            money(p.discount),
            money(p.revenue),
        ));
    }
    html.push_str("</table>\n</body>\n</html>\n");
    html
}

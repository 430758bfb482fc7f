//! # Command Line Definition
//!
//! Every screen of the shop maps to a subcommand group:
//!
//! ```text
//! spares login / logout / whoami      Session
//! spares category ...                 Inventory screen, categories panel
//! spares product ...                  Inventory screen
//! spares restock ...                  Restock dialog and history
//! spares sale ...                     Sales screen (checkout) and history
//! spares credit ...                   Credits screen
//! spares report ...                   Sales report screen, CSV and print
//! spares backup ...                   Whole-store export/import
//! ```
//!
//! Amounts are typed in major units (`12500`, `12,500`, or `10.50` when the
//! currency has decimals) and parsed with the configured precision.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Debug, Parser)]
#[command(name = "spares", version, about = "Point of sale for a motorbike spare parts shop")]
pub struct Cli {
    /// Database file (overrides SPARES_DB_PATH and the config file)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Config file (overrides SPARES_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Remember who is at the counter
    Login {
        name: String,
        #[arg(long, default_value = "cashier")]
        role: String,
    },
    /// Forget the current operator
    Logout,
    /// Show the current operator
    Whoami,
    #[command(subcommand)]
    Category(CategoryCommand),
    #[command(subcommand)]
    Product(ProductCommand),
    #[command(subcommand)]
    Restock(RestockCommand),
    #[command(subcommand)]
    Sale(SaleCommand),
    #[command(subcommand)]
    Credit(CreditCommand),
    #[command(subcommand)]
    Report(ReportCommand),
    #[command(subcommand)]
    Backup(BackupCommand),
}

// =============================================================================
// Inventory
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum CategoryCommand {
    List,
    Add {
        name: String,
        /// Subcategory name (repeatable)
        #[arg(long = "sub", value_name = "NAME")]
        subcategories: Vec<String>,
    },
    Rename {
        /// Category id or name
        category: String,
        new_name: String,
    },
    /// Replace the subcategory list
    SetSubcategories {
        category: String,
        subcategories: Vec<String>,
    },
    Delete {
        category: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProductCommand {
    List(ProductListArgs),
    Show {
        /// Product id or SKU
        product: String,
    },
    Add(ProductAddArgs),
    Update(ProductUpdateArgs),
    Delete {
        product: String,
    },
    /// Products at or below their threshold
    LowStock,
    /// Stock counts and value
    Summary,
}

#[derive(Debug, Args)]
pub struct ProductListArgs {
    /// Match on name or SKU
    #[arg(long)]
    pub search: Option<String>,
    /// Category id or name
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub subcategory: Option<String>,
    #[arg(long)]
    pub low_stock: bool,
}

#[derive(Debug, Args)]
pub struct ProductAddArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub sku: String,
    /// Category id or name
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub subcategory: Option<String>,
    #[arg(long)]
    pub price: String,
    #[arg(long)]
    pub cost: String,
    #[arg(long, default_value_t = 0)]
    pub quantity: i64,
    /// Low-stock threshold
    #[arg(long, default_value_t = 5)]
    pub min_quantity: i64,
}

#[derive(Debug, Args)]
pub struct ProductUpdateArgs {
    /// Product id or SKU
    pub product: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub sku: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    /// Subcategory; pass an empty string to clear it
    #[arg(long)]
    pub subcategory: Option<String>,
    #[arg(long)]
    pub price: Option<String>,
    #[arg(long)]
    pub cost: Option<String>,
    /// Stock count correction
    #[arg(long)]
    pub quantity: Option<i64>,
    #[arg(long)]
    pub min_quantity: Option<i64>,
}

#[derive(Debug, Subcommand)]
pub enum RestockCommand {
    Add {
        /// Product id or SKU
        product: String,
        quantity: i64,
        /// New unit cost; keeps the current one when omitted
        #[arg(long)]
        cost: Option<String>,
        #[arg(long)]
        supplier: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    History {
        /// Product id or SKU; all products when omitted
        product: Option<String>,
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

// =============================================================================
// Sales & Credits
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum SaleCommand {
    Checkout(CheckoutArgs),
    Show {
        id: String,
    },
    List {
        /// First day, inclusive
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last day, inclusive
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct CheckoutArgs {
    /// Cart line as SKU:QTY or SKU:QTY:DISCOUNT (discount per unit; repeatable)
    #[arg(long = "item", value_name = "SKU:QTY[:DISCOUNT]", required = true)]
    pub items: Vec<String>,

    #[arg(long, value_enum, default_value_t = TenderArg::Cash)]
    pub method: TenderArg,

    /// Cash part of a split payment
    #[arg(long)]
    pub cash: Option<String>,

    /// Mobile money part of a split payment
    #[arg(long)]
    pub mobile_money: Option<String>,

    /// Required when any of the sale goes on credit
    #[arg(long)]
    pub customer: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TenderArg {
    Cash,
    MobileMoney,
    Split,
    Credit,
}

#[derive(Debug, Subcommand)]
pub enum CreditCommand {
    List {
        #[arg(long, value_enum)]
        status: Option<CreditStatusArg>,
    },
    Show {
        id: String,
    },
    /// Record a payment against a credit
    Pay {
        id: String,
        amount: String,
        #[arg(long, value_enum, default_value_t = PayMethodArg::Cash)]
        method: PayMethodArg,
        #[arg(long)]
        note: Option<String>,
    },
    /// Ledger totals and balances per customer
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CreditStatusArg {
    Active,
    Partial,
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PayMethodArg {
    Cash,
    MobileMoney,
}

// =============================================================================
// Reports & Backup
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    Summary(PeriodArgs),
    Csv {
        #[command(flatten)]
        period: PeriodArgs,
        /// Output file; stdout when omitted
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Printable HTML page
    Html {
        #[command(flatten)]
        period: PeriodArgs,
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
pub struct PeriodArgs {
    #[arg(long, value_enum, default_value_t = PeriodArg::Day)]
    pub period: PeriodArg,

    /// Day the period is anchored on; today when omitted
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Custom range start (with --to)
    #[arg(long, requires = "to")]
    pub from: Option<NaiveDate>,

    /// Custom range end, inclusive (with --from)
    #[arg(long, requires = "from")]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PeriodArg {
    Day,
    Week,
    Month,
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Write the whole store as one JSON file
    Export { out: PathBuf },
    /// Merge a JSON snapshot into the store; existing records win
    Import { path: PathBuf },
}

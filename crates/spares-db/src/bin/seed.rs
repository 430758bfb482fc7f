//! # Seed Data Generator
//!
//! Populates the database with a motorbike spares catalogue for development.
//!
//! ## Usage
//! ```bash
//! # Default catalogue into ./spares_dev.db
//! cargo run -p spares-db --bin seed
//!
//! # Specify database path
//! cargo run -p spares-db --bin seed -- --db ./data/spares.db
//!
//! # Leave every product at or below its low-stock threshold
//! cargo run -p spares-db --bin seed -- --low-stock
//! ```
//!
//! ## Generated Data
//! - Categories with subcategories (Engine, Brakes, Electrical, ...)
//! - One product per part with SKU `{CATEGORY}-{INDEX}`
//! - Prices in whole shillings, cost at 60-75% of price
//! - Stock between 0 and 40, threshold 3-5

use chrono::Utc;
use spares_core::inventory::ProductDraft;
use spares_core::{Category, Money};
use spares_db::{Database, DbConfig};
use std::env;

/// `(code, category, subcategories, [(part, subcategory, price)])`
type CatalogueEntry = (
    &'static str,
    &'static str,
    &'static [&'static str],
    &'static [(&'static str, &'static str, i64)],
);

const CATALOGUE: &[CatalogueEntry] = &[
    (
        "ENG",
        "Engine",
        &["Ignition", "Filters", "Gaskets", "Pistons"],
        &[
            ("Spark Plug C7HSA", "Ignition", 5_000),
            ("Spark Plug D8TC", "Ignition", 6_000),
            ("CDI Unit Boxer", "Ignition", 35_000),
            ("Air Filter Bajaj Boxer", "Filters", 8_000),
            ("Oil Filter TVS", "Filters", 6_500),
            ("Head Gasket 150cc", "Gaskets", 7_000),
            ("Full Gasket Set 125cc", "Gaskets", 18_000),
            ("Piston Kit STD 150cc", "Pistons", 45_000),
            ("Piston Rings 0.50", "Pistons", 15_000),
        ],
    ),
    (
        "BRK",
        "Brakes",
        &["Pads", "Shoes", "Cables"],
        &[
            ("Front Brake Pads Boxer", "Pads", 12_000),
            ("Disc Pads TVS Apache", "Pads", 15_000),
            ("Rear Brake Shoes", "Shoes", 9_000),
            ("Front Brake Cable", "Cables", 4_500),
            ("Rear Brake Rod", "Cables", 5_500),
        ],
    ),
    (
        "DRV",
        "Drive",
        &["Chains", "Sprockets", "Clutch"],
        &[
            ("Chain 428H 118L", "Chains", 28_000),
            ("Chain Kit Boxer", "Chains", 55_000),
            ("Front Sprocket 14T", "Sprockets", 7_500),
            ("Rear Sprocket 41T", "Sprockets", 16_000),
            ("Clutch Plates Set", "Clutch", 22_000),
            ("Clutch Cable", "Clutch", 4_000),
        ],
    ),
    (
        "ELC",
        "Electrical",
        &["Lighting", "Battery", "Switches"],
        &[
            ("Headlight Bulb 12V 35W", "Lighting", 3_500),
            ("Indicator Bulb", "Lighting", 1_000),
            ("Tail Light Assembly", "Lighting", 14_000),
            ("Battery 12V 5Ah", "Battery", 48_000),
            ("Handlebar Switch Left", "Switches", 12_500),
            ("Ignition Switch", "Switches", 16_000),
        ],
    ),
    (
        "TYR",
        "Tyres",
        &["Front", "Rear", "Tubes"],
        &[
            ("Tyre 2.75-17 Front", "Front", 42_000),
            ("Tyre 3.00-18 Rear", "Rear", 52_000),
            ("Inner Tube 17\"", "Tubes", 8_000),
            ("Inner Tube 18\"", "Tubes", 9_000),
        ],
    ),
    (
        "OIL",
        "Oils & Fluids",
        &[],
        &[
            ("Engine Oil 20W-50 1L", "", 12_000),
            ("Engine Oil 10W-40 1L", "", 15_000),
            ("Brake Fluid DOT4", "", 7_000),
            ("Chain Lube Spray", "", 9_500),
        ],
    ),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./spares_dev.db");
    let mut low_stock = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--low-stock" => low_stock = true,
            "--help" | "-h" => {
                println!("Spares POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./spares_dev.db)");
                println!("      --low-stock    Seed every product at or below its threshold");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("🌱 Spares POS Seed Data Generator");
    println!("=================================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.products().count().await?;
    if existing > 0 {
        println!("⚠ Database already has {} products", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    println!();
    println!("Generating catalogue...");

    let start = std::time::Instant::now();
    let mut generated = 0;

    for (category_idx, (code, name, subcategories, parts)) in CATALOGUE.iter().enumerate() {
        let category = Category::new(
            name,
            subcategories.iter().map(|s| s.to_string()).collect(),
            Utc::now(),
        )?;
        db.categories().insert(&category).await?;

        for (part_idx, (part, subcategory, price)) in parts.iter().enumerate() {
            let seed = category_idx * 100 + part_idx;
            let draft = generate_part(code, part, subcategory, *price, seed, low_stock);
            let sku = draft.sku.clone();

            let product = match draft.into_product(&category, Utc::now()) {
                Ok(product) => product,
                Err(e) => {
                    eprintln!("Invalid part {}: {}", sku, e);
                    continue;
                }
            };

            if let Err(e) = db.products().insert(&product).await {
                eprintln!("Failed to insert {}: {}", product.sku, e);
                continue;
            }

            generated += 1;
        }

        println!("  {} ({} parts)", name, parts.len());
    }

    let elapsed = start.elapsed();
    println!();
    println!("✓ Generated {} products in {:?}", generated, elapsed);

    let low = db.products().low_stock().await?;
    println!("  Low stock: {} products", low.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}

/// Builds one product draft with stable pseudo-random figures.
fn generate_part(
    code: &str,
    name: &str,
    subcategory: &str,
    price: i64,
    seed: usize,
    low_stock: bool,
) -> ProductDraft {
    // Cost at 60-75% of price, rounded to 100 shillings
    let cost_pct = 60 + (seed % 16) as i64;
    let cost = (price * cost_pct / 100) / 100 * 100;

    let min_quantity = 3 + (seed % 3) as i64;
    let quantity = if low_stock {
        (seed % (min_quantity as usize + 1)) as i64
    } else {
        ((seed * 7) % 41) as i64
    };

    ProductDraft {
        name: name.to_string(),
        sku: format!("{}-{:03}", code, seed % 100 + 1),
        subcategory: (!subcategory.is_empty()).then(|| subcategory.to_string()),
        price: Money::from_minor(price),
        cost_price: Money::from_minor(cost),
        quantity,
        min_quantity,
    }
}

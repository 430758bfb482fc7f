//! # Product Commands
//!
//! The inventory screen: listing with filters, the add/edit form, low-stock
//! alerts and the stock value cards.
//!
//! ## Lookup
//! ```text
//! spares product show SPK-C7
//!      │
//!      ▼
//! products().find("SPK-C7")
//!      ├── id match?  ──► product
//!      ├── SKU match? ──► product
//!      └── neither    ──► NOT_FOUND
//! ```

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use spares_core::inventory::{InventorySummary, ProductDraft, ProductFilter};
use spares_core::{Money, Product};

use crate::cli::{ProductAddArgs, ProductCommand, ProductListArgs, ProductUpdateArgs};
use crate::commands::Output;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

/// Product plus the derived stock flags shown as badges.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    #[serde(flatten)]
    pub product: Product,
    pub low_stock: bool,
    pub out_of_stock: bool,
    pub stock_value: Money,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            low_stock: p.is_low_stock(),
            out_of_stock: p.is_out_of_stock(),
            stock_value: p.stock_value_at_cost(),
            product: p,
        }
    }
}

pub async fn run(db: &DbState, config: &ConfigState, cmd: ProductCommand) -> Result<Output, ApiError> {
    match cmd {
        ProductCommand::List(args) => list(db, args).await,
        ProductCommand::Show { product } => show(db, &product).await,
        ProductCommand::Add(args) => add(db, config, args).await,
        ProductCommand::Update(args) => update(db, config, args).await,
        ProductCommand::Delete { product } => delete(db, &product).await,
        ProductCommand::LowStock => low_stock(db).await,
        ProductCommand::Summary => summary(db).await,
    }
}

pub(crate) async fn list(db: &DbState, args: ProductListArgs) -> Result<Output, ApiError> {
    debug!(?args, "product list command");

    let category_id = match &args.category {
        Some(c) => Some(db.inner().categories().find(c).await?.id),
        None => None,
    };

    let filter = ProductFilter {
        text: args.search,
        category_id,
        subcategory: args.subcategory,
        low_stock_only: args.low_stock,
    };

    let products = db.inner().products().search(&filter).await?;
    let dtos: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();

    Output::json(&dtos)
}

async fn show(db: &DbState, id_or_sku: &str) -> Result<Output, ApiError> {
    debug!(product = %id_or_sku, "product show command");

    let product = db.inner().products().find(id_or_sku).await?;
    Output::json(&ProductDto::from(product))
}

pub(crate) async fn add(
    db: &DbState,
    config: &ConfigState,
    args: ProductAddArgs,
) -> Result<Output, ApiError> {
    debug!(sku = %args.sku, "product add command");

    let category = db.inner().categories().find(&args.category).await?;
    let draft = ProductDraft {
        name: args.name,
        sku: args.sku,
        subcategory: args.subcategory,
        price: config.parse_money(&args.price)?,
        cost_price: config.parse_money(&args.cost)?,
        quantity: args.quantity,
        min_quantity: args.min_quantity,
    };

    let product = draft.into_product(&category, Utc::now())?;
    db.inner().products().insert(&product).await?;

    Output::json(&ProductDto::from(product))
}

/// Edits a product. Fields not given keep their current value.
pub(crate) async fn update(
    db: &DbState,
    config: &ConfigState,
    args: ProductUpdateArgs,
) -> Result<Output, ApiError> {
    debug!(product = %args.product, "product update command");

    let mut product = db.inner().products().find(&args.product).await?;

    let category = match &args.category {
        Some(c) => db.inner().categories().find(c).await?,
        None => db.inner().categories().find(&product.category_id).await?,
    };

    let mut draft = ProductDraft::from(&product);
    if let Some(name) = args.name {
        draft.name = name;
    }
    if let Some(sku) = args.sku {
        draft.sku = sku;
    }
    if args.subcategory.is_some() {
        draft.subcategory = args.subcategory;
    } else if category.id != product.category_id {
        // The old subcategory belongs to the old category
        draft.subcategory = None;
    }
    if let Some(price) = args.price {
        draft.price = config.parse_money(&price)?;
    }
    if let Some(cost) = args.cost {
        draft.cost_price = config.parse_money(&cost)?;
    }
    if let Some(quantity) = args.quantity {
        draft.quantity = quantity;
    }
    if let Some(min_quantity) = args.min_quantity {
        draft.min_quantity = min_quantity;
    }

    draft.apply_to(&mut product, &category, Utc::now())?;
    db.inner().products().update(&product).await?;

    Output::json(&ProductDto::from(product))
}

pub(crate) async fn delete(db: &DbState, id_or_sku: &str) -> Result<Output, ApiError> {
    debug!(product = %id_or_sku, "product delete command");

    let product = db.inner().products().find(id_or_sku).await?;
    db.inner().products().delete(&product.id).await?;

    info!(sku = %product.sku, "Product removed");
    Ok(Output::Json(json!({ "deleted": product.id, "sku": product.sku })))
}

async fn low_stock(db: &DbState) -> Result<Output, ApiError> {
    debug!("product low-stock command");

    let products = db.inner().products().low_stock().await?;
    let dtos: Vec<ProductDto> = products.into_iter().map(ProductDto::from).collect();

    Output::json(&dtos)
}

async fn summary(db: &DbState) -> Result<Output, ApiError> {
    debug!("product summary command");

    let products = db.inner().products().list().await?;
    Output::json(&InventorySummary::from_products(&products))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::category;
    use crate::commands::test_support::{json, test_state};
    use crate::error::ErrorCode;

    fn add_args(sku: &str, quantity: i64) -> ProductAddArgs {
        ProductAddArgs {
            name: format!("Part {sku}"),
            sku: sku.to_string(),
            category: "Brakes".to_string(),
            subcategory: Some("Pads".to_string()),
            price: "12,000".to_string(),
            cost: "8000".to_string(),
            quantity,
            min_quantity: 3,
        }
    }

    fn update_args(product: &str) -> ProductUpdateArgs {
        ProductUpdateArgs {
            product: product.to_string(),
            name: None,
            sku: None,
            category: None,
            subcategory: None,
            price: None,
            cost: None,
            quantity: None,
            min_quantity: None,
        }
    }

    async fn setup() -> (DbState, ConfigState) {
        let (db, config) = test_state().await;
        category::run(
            &db,
            crate::cli::CategoryCommand::Add {
                name: "Brakes".to_string(),
                subcategories: vec!["Pads".to_string(), "Shoes".to_string()],
            },
        )
        .await
        .unwrap();
        (db, config)
    }

    #[tokio::test]
    async fn test_add_and_show() {
        let (db, config) = setup().await;

        let out = json(add(&db, &config, add_args("BRK-PAD", 10)).await.unwrap());
        assert_eq!(out["price"], 12_000);
        assert_eq!(out["categoryName"], "Brakes");
        assert_eq!(out["lowStock"], false);
        assert_eq!(out["stockValue"], 80_000);

        let by_sku = json(show(&db, "BRK-PAD").await.unwrap());
        let by_id = json(show(&db, out["id"].as_str().unwrap()).await.unwrap());
        assert_eq!(by_sku, by_id);
    }

    #[tokio::test]
    async fn test_add_rejects_bad_input() {
        let (db, config) = setup().await;

        let mut args = add_args("BRK-PAD", 1);
        args.subcategory = Some("Cables".to_string());
        let err = add(&db, &config, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut args = add_args("BRK-PAD", 1);
        args.price = "twelve".to_string();
        let err = add(&db, &config, args).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        add(&db, &config, add_args("BRK-PAD", 1)).await.unwrap();
        let err = add(&db, &config, add_args("BRK-PAD", 1)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("BRK-PAD"));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let (db, config) = setup().await;

        add(&db, &config, add_args("BRK-PAD", 10)).await.unwrap();
        let mut shoes = add_args("BRK-SHOE", 1);
        shoes.subcategory = Some("shoes".to_string());
        add(&db, &config, shoes).await.unwrap();

        let all = json(list(&db, ProductListArgs {
            search: None,
            category: Some("brakes".to_string()),
            subcategory: None,
            low_stock: false,
        })
        .await
        .unwrap());
        assert_eq!(all.as_array().unwrap().len(), 2);

        let low = json(list(&db, ProductListArgs {
            search: Some("brk".to_string()),
            category: None,
            subcategory: None,
            low_stock: true,
        })
        .await
        .unwrap());
        assert_eq!(low.as_array().unwrap().len(), 1);
        assert_eq!(low[0]["sku"], "BRK-SHOE");
        // Subcategory is stored with the category's spelling
        assert_eq!(low[0]["subcategory"], "Shoes");

        let err = list(&db, ProductListArgs {
            search: None,
            category: Some("Tyres".to_string()),
            subcategory: None,
            low_stock: false,
        })
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let (db, config) = setup().await;
        add(&db, &config, add_args("BRK-PAD", 10)).await.unwrap();

        let mut args = update_args("BRK-PAD");
        args.price = Some("13500".to_string());
        args.subcategory = Some(String::new());
        let out = json(update(&db, &config, args).await.unwrap());

        assert_eq!(out["price"], 13_500);
        assert_eq!(out["costPrice"], 8_000);
        assert_eq!(out["quantity"], 10);
        assert!(out["subcategory"].is_null());
    }

    #[tokio::test]
    async fn test_update_move_category_drops_subcategory() {
        let (db, config) = setup().await;
        category::run(
            &db,
            crate::cli::CategoryCommand::Add {
                name: "Drive".to_string(),
                subcategories: vec![],
            },
        )
        .await
        .unwrap();
        add(&db, &config, add_args("BRK-PAD", 10)).await.unwrap();

        let mut args = update_args("BRK-PAD");
        args.category = Some("Drive".to_string());
        let out = json(update(&db, &config, args).await.unwrap());

        assert_eq!(out["categoryName"], "Drive");
        assert!(out["subcategory"].is_null());
    }

    #[tokio::test]
    async fn test_low_stock_and_summary() {
        let (db, config) = setup().await;
        add(&db, &config, add_args("BRK-PAD", 10)).await.unwrap();
        add(&db, &config, add_args("BRK-SHOE", 0)).await.unwrap();

        let low = json(low_stock(&db).await.unwrap());
        assert_eq!(low.as_array().unwrap().len(), 1);
        assert_eq!(low[0]["outOfStock"], true);

        let summary = json(summary(&db).await.unwrap());
        assert_eq!(summary["productCount"], 2);
        assert_eq!(summary["totalUnits"], 10);
        assert_eq!(summary["valueAtCost"], 80_000);
        assert_eq!(summary["valueAtPrice"], 120_000);
        assert_eq!(summary["outOfStockCount"], 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let (db, config) = setup().await;
        add(&db, &config, add_args("BRK-PAD", 10)).await.unwrap();

        delete(&db, "BRK-PAD").await.unwrap();
        let err = show(&db, "BRK-PAD").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}

//! # Restock Commands
//!
//! Receiving stock from a supplier and the restock history panel.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use spares_core::inventory::RestockRequest;
use spares_core::{Product, RestockRecord};

use crate::cli::RestockCommand;
use crate::commands::Output;
use crate::error::ApiError;
use crate::state::{ConfigState, DbState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestockResponse {
    pub product: Product,
    pub record: RestockRecord,
}

pub async fn run(db: &DbState, config: &ConfigState, cmd: RestockCommand) -> Result<Output, ApiError> {
    match cmd {
        RestockCommand::Add {
            product,
            quantity,
            cost,
            supplier,
            notes,
        } => {
            let cost_price = cost.map(|c| config.parse_money(&c)).transpose()?;
            let request = RestockRequest {
                quantity,
                cost_price,
                supplier,
                notes,
            };
            add(db, &product, request).await
        }
        RestockCommand::History { product, limit } => history(db, product.as_deref(), limit).await,
    }
}

pub(crate) async fn add(
    db: &DbState,
    id_or_sku: &str,
    request: RestockRequest,
) -> Result<Output, ApiError> {
    debug!(product = %id_or_sku, quantity = request.quantity, "restock add command");

    let operator = db.operator().await?;
    let product = db.inner().products().find(id_or_sku).await?;

    let (product, record) = db
        .inner()
        .restocks()
        .restock(&product.id, request, &operator.name, Utc::now())
        .await?;

    info!(
        sku = %product.sku,
        added = record.quantity_added,
        on_hand = product.quantity,
        "Restock recorded"
    );
    Output::json(&RestockResponse { product, record })
}

/// Newest first. With a product, its full history; otherwise the latest
/// `limit` restocks across the shop.
async fn history(db: &DbState, product: Option<&str>, limit: i64) -> Result<Output, ApiError> {
    debug!(product = ?product, limit, "restock history command");

    let records = match product {
        Some(id_or_sku) => {
            let product = db.inner().products().find(id_or_sku).await?;
            db.inner().restocks().list_for_product(&product.id).await?
        }
        None => db.inner().restocks().list_recent(limit.max(1)).await?,
    };

    Output::json(&records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CategoryCommand, ProductAddArgs};
    use crate::commands::test_support::{json, test_state};
    use crate::commands::{category, product, session};
    use crate::error::ErrorCode;

    async fn setup() -> (DbState, ConfigState) {
        let (db, config) = test_state().await;
        category::run(
            &db,
            CategoryCommand::Add {
                name: "Drive".to_string(),
                subcategories: vec![],
            },
        )
        .await
        .unwrap();
        for sku in ["CHAIN-428", "SPROCKET-14T"] {
            product::add(
                &db,
                &config,
                ProductAddArgs {
                    name: format!("Part {sku}"),
                    sku: sku.to_string(),
                    category: "Drive".to_string(),
                    subcategory: None,
                    price: "28000".to_string(),
                    cost: "20000".to_string(),
                    quantity: 2,
                    min_quantity: 3,
                },
            )
            .await
            .unwrap();
        }
        (db, config)
    }

    fn add_cmd(product: &str, quantity: i64, cost: Option<&str>) -> RestockCommand {
        RestockCommand::Add {
            product: product.to_string(),
            quantity,
            cost: cost.map(str::to_string),
            supplier: Some("Kariakoo Motors".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_restock_updates_product_and_history() {
        let (db, config) = setup().await;
        session::login(&db, "Baraka", "manager").await.unwrap();

        let out = json(run(&db, &config, add_cmd("CHAIN-428", 10, Some("21000"))).await.unwrap());
        assert_eq!(out["product"]["quantity"], 12);
        assert_eq!(out["product"]["costPrice"], 21_000);
        assert!(!out["product"]["lastRestocked"].is_null());
        assert_eq!(out["record"]["previousQuantity"], 2);
        assert_eq!(out["record"]["newQuantity"], 12);
        assert_eq!(out["record"]["totalCost"], 210_000);
        assert_eq!(out["record"]["restockedBy"], "Baraka");

        run(&db, &config, add_cmd("SPROCKET-14T", 5, None)).await.unwrap();

        let all = json(history(&db, None, 20).await.unwrap());
        assert_eq!(all.as_array().unwrap().len(), 2);

        let one = json(history(&db, Some("CHAIN-428"), 20).await.unwrap());
        assert_eq!(one.as_array().unwrap().len(), 1);
        assert_eq!(one[0]["supplier"], "Kariakoo Motors");
    }

    #[tokio::test]
    async fn test_restock_rejects_bad_quantity() {
        let (db, config) = setup().await;

        let err = run(&db, &config, add_cmd("CHAIN-428", 0, None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = run(&db, &config, add_cmd("NOPE", 1, None)).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let p = db.inner().products().find("CHAIN-428").await.unwrap();
        assert_eq!(p.quantity, 2);
    }
}

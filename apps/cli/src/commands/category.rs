//! # Category Commands
//!
//! The categories panel of the inventory screen.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};

use spares_core::Category;

use crate::cli::CategoryCommand;
use crate::commands::Output;
use crate::error::ApiError;
use crate::state::DbState;

/// Category with the number of products filed under it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryDto {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: usize,
}

pub async fn run(db: &DbState, cmd: CategoryCommand) -> Result<Output, ApiError> {
    match cmd {
        CategoryCommand::List => list(db).await,
        CategoryCommand::Add {
            name,
            subcategories,
        } => add(db, &name, subcategories).await,
        CategoryCommand::Rename { category, new_name } => rename(db, &category, &new_name).await,
        CategoryCommand::SetSubcategories {
            category,
            subcategories,
        } => set_subcategories(db, &category, subcategories).await,
        CategoryCommand::Delete { category } => delete(db, &category).await,
    }
}

async fn list(db: &DbState) -> Result<Output, ApiError> {
    debug!("category list command");

    let categories = db.inner().categories().list().await?;
    let products = db.inner().products().list().await?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for p in &products {
        *counts.entry(p.category_id.as_str()).or_default() += 1;
    }

    let dtos: Vec<CategoryDto> = categories
        .into_iter()
        .map(|category| CategoryDto {
            product_count: counts.get(category.id.as_str()).copied().unwrap_or(0),
            category,
        })
        .collect();

    Output::json(&dtos)
}

async fn add(db: &DbState, name: &str, subcategories: Vec<String>) -> Result<Output, ApiError> {
    debug!(name = %name, "category add command");

    let category = Category::new(name, subcategories, Utc::now())?;
    db.inner().categories().insert(&category).await?;

    Output::json(&category)
}

async fn rename(db: &DbState, id_or_name: &str, new_name: &str) -> Result<Output, ApiError> {
    debug!(category = %id_or_name, new_name = %new_name, "category rename command");

    let mut category = db.inner().categories().find(id_or_name).await?;
    category.rename(new_name, Utc::now())?;
    db.inner().categories().update(&category).await?;

    Output::json(&category)
}

/// Replaces the subcategory list. Products keep whatever subcategory they
/// already carry.
async fn set_subcategories(
    db: &DbState,
    id_or_name: &str,
    subcategories: Vec<String>,
) -> Result<Output, ApiError> {
    debug!(category = %id_or_name, count = subcategories.len(), "category set-subcategories command");

    let mut category = db.inner().categories().find(id_or_name).await?;
    category.set_subcategories(subcategories, Utc::now())?;
    db.inner().categories().update(&category).await?;

    Output::json(&category)
}

async fn delete(db: &DbState, id_or_name: &str) -> Result<Output, ApiError> {
    debug!(category = %id_or_name, "category delete command");

    let category = db.inner().categories().find(id_or_name).await?;
    db.inner().categories().delete(&category.id).await?;

    info!(name = %category.name, "Category removed");
    Ok(Output::Json(json!({ "deleted": category.id, "name": category.name })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ProductAddArgs;
    use crate::commands::product;
    use crate::commands::test_support::{json, test_state};
    use crate::error::ErrorCode;

    fn add_args(sku: &str, category: &str) -> ProductAddArgs {
        ProductAddArgs {
            name: format!("Part {sku}"),
            sku: sku.to_string(),
            category: category.to_string(),
            subcategory: None,
            price: "5000".to_string(),
            cost: "3000".to_string(),
            quantity: 4,
            min_quantity: 2,
        }
    }

    #[tokio::test]
    async fn test_add_and_list_with_counts() {
        let (db, config) = test_state().await;

        add(&db, "Engine", vec!["Ignition".into(), "Filters".into()])
            .await
            .unwrap();
        add(&db, "Brakes", vec![]).await.unwrap();
        product::add(&db, &config, add_args("SPK-C7", "engine"))
            .await
            .unwrap();

        let out = json(list(&db).await.unwrap());
        let rows = out.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        // Alphabetical
        assert_eq!(rows[0]["name"], "Brakes");
        assert_eq!(rows[0]["productCount"], 0);
        assert_eq!(rows[1]["name"], "Engine");
        assert_eq!(rows[1]["productCount"], 1);
        assert_eq!(rows[1]["subcategories"][1], "Filters");
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let (db, _) = test_state().await;

        add(&db, "Engine", vec![]).await.unwrap();
        let err = add(&db, "ENGINE", vec![]).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_rename_updates_products() {
        let (db, config) = test_state().await;

        add(&db, "Electric", vec![]).await.unwrap();
        product::add(&db, &config, add_args("BULB-12V", "Electric"))
            .await
            .unwrap();

        let out = json(rename(&db, "electric", "Electrical").await.unwrap());
        assert_eq!(out["name"], "Electrical");

        let p = db.inner().products().find("BULB-12V").await.unwrap();
        assert_eq!(p.category_name, "Electrical");
    }

    #[tokio::test]
    async fn test_set_subcategories() {
        let (db, _) = test_state().await;

        add(&db, "Tyres", vec!["Front".into()]).await.unwrap();
        let out = json(
            set_subcategories(&db, "Tyres", vec!["Front".into(), "Rear".into()])
                .await
                .unwrap(),
        );
        assert_eq!(out["subcategories"].as_array().unwrap().len(), 2);

        let err = set_subcategories(&db, "Tyres", vec!["Tubes".into(), "tubes".into()])
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_delete_in_use_rejected() {
        let (db, config) = test_state().await;

        add(&db, "Drive", vec![]).await.unwrap();
        product::add(&db, &config, add_args("CHAIN-428", "Drive"))
            .await
            .unwrap();

        let err = delete(&db, "Drive").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::BusinessLogic);

        product::delete(&db, "CHAIN-428").await.unwrap();
        delete(&db, "Drive").await.unwrap();

        let err = delete(&db, "Drive").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}

//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ Read, subtract in Rust, write back the absolute value              │
//! │     (a second writer in between is silently overwritten)               │
//! │                                                                         │
//! │  ✅ Delta update guarded in SQL                                        │
//! │     UPDATE products SET quantity = quantity + ?delta                   │
//! │     WHERE id = ? AND quantity + ?delta >= 0                            │
//! │                                                                         │
//! │  rows_affected = 0 → product missing or not enough stock               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use spares_core::inventory::ProductFilter;
use spares_core::{CoreError, Product};

use crate::error::{DbError, DbResult};

pub(crate) const PRODUCT_COLUMNS: &str = "id, name, category_id, category_name, subcategory, \
     price, cost_price, quantity, min_quantity, sku, created_at, updated_at, last_restocked";

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let product = repo.get_by_sku("CHAIN-428").await?;
/// repo.adjust_stock(&product.id, -2).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// All products, alphabetical.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name COLLATE NOCASE, sku"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Products matching the inventory screen filters.
    ///
    /// Category narrowing happens in SQL; text, subcategory and low-stock
    /// matching reuse [`ProductFilter::matches`].
    pub async fn search(&self, filter: &ProductFilter) -> DbResult<Vec<Product>> {
        debug!(?filter, "Searching products");

        let products = match &filter.category_id {
            Some(category_id) => {
                sqlx::query_as::<_, Product>(&format!(
                    "SELECT {PRODUCT_COLUMNS} FROM products WHERE category_id = ?1 \
                     ORDER BY name COLLATE NOCASE, sku"
                ))
                .bind(category_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => self.list().await?,
        };

        let matched: Vec<Product> = products.into_iter().filter(|p| filter.matches(p)).collect();
        debug!(count = matched.len(), "Search returned products");
        Ok(matched)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        get_with(&mut conn, id).await
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Resolves a product by id first, then by SKU.
    pub async fn find(&self, id_or_sku: &str) -> DbResult<Product> {
        if let Some(product) = self.get_by_id(id_or_sku).await? {
            return Ok(product);
        }
        self.get_by_sku(id_or_sku)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id_or_sku.to_string()).into())
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    /// * `Err(DbError::ForeignKeyViolation)` - Category doesn't exist
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(sku = %product.sku, "Inserting product");

        let mut conn = self.pool.acquire().await?;
        insert_with(&mut conn, product).await.map_err(|e| match e {
            DbError::UniqueViolation { .. } => DbError::duplicate("sku", &product.sku),
            other => other,
        })
    }

    /// Saves every editable field of an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category_id = ?3,
                category_name = ?4,
                subcategory = ?5,
                price = ?6,
                cost_price = ?7,
                quantity = ?8,
                min_quantity = ?9,
                sku = ?10,
                updated_at = ?11,
                last_restocked = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.category_id)
        .bind(&product.category_name)
        .bind(&product.subcategory)
        .bind(product.price)
        .bind(product.cost_price)
        .bind(product.quantity)
        .bind(product.min_quantity)
        .bind(&product.sku)
        .bind(product.updated_at)
        .bind(product.last_restocked)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("sku", &product.sku),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(product.id.clone()).into());
        }

        Ok(())
    }

    /// Deletes a product. Sales and restock history keep their own name
    /// snapshots, so reports are unaffected.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::ProductNotFound(id.to_string()).into());
        }

        Ok(())
    }

    /// Changes stock by `delta` (negative for sales). Never goes below zero.
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        let mut tx = self.pool.begin().await?;
        adjust_stock_with(&mut tx, id, delta, Utc::now()).await?;
        let product = get_with(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        tx.commit().await?;
        Ok(product)
    }

    /// Products at or below their threshold, lowest stock first.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE quantity <= min_quantity \
             ORDER BY quantity, name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers (used inside other repositories' transactions)
// =============================================================================

pub(crate) async fn get_with(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(product)
}

pub(crate) async fn insert_with(conn: &mut SqliteConnection, product: &Product) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, name, category_id, category_name, subcategory,
            price, cost_price, quantity, min_quantity, sku,
            created_at, updated_at, last_restocked
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13
        )
        "#,
    )
    .bind(&product.id)
    .bind(&product.name)
    .bind(&product.category_id)
    .bind(&product.category_name)
    .bind(&product.subcategory)
    .bind(product.price)
    .bind(product.cost_price)
    .bind(product.quantity)
    .bind(product.min_quantity)
    .bind(&product.sku)
    .bind(product.created_at)
    .bind(product.updated_at)
    .bind(product.last_restocked)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Guarded delta update. Fails with `InsufficientStock` rather than letting
/// quantity go negative.
pub(crate) async fn adjust_stock_with(
    conn: &mut SqliteConnection,
    id: &str,
    delta: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, delta, "Adjusting stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET quantity = quantity + ?2, updated_at = ?3
        WHERE id = ?1 AND quantity + ?2 >= 0
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let product = get_with(conn, id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
        return Err(CoreError::InsufficientStock {
            sku: product.sku,
            available: product.quantity,
            requested: -delta,
        }
        .into());
    }

    Ok(())
}

pub(crate) async fn exists_with(conn: &mut SqliteConnection, id: &str, sku: &str) -> DbResult<bool> {
    let found: Option<String> =
        sqlx::query_scalar("SELECT id FROM products WHERE id = ?1 OR sku = ?2 LIMIT 1")
            .bind(id)
            .bind(sku)
            .fetch_optional(&mut *conn)
            .await?;

    Ok(found.is_some())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{seed_category, seed_product, test_db};
    use spares_core::Money;

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let product = seed_product(&db, &category, "SPK-C7", 5000, 10).await;

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored, product);

        let by_sku = db.products().find("SPK-C7").await.unwrap();
        assert_eq!(by_sku.id, product.id);
        assert!(db.products().find("NOPE").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let product = seed_product(&db, &category, "SPK-C7", 5000, 10).await;

        let mut dup = product.clone();
        dup.id = uuid::Uuid::new_v4().to_string();
        let err = db.products().insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_update() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let mut product = seed_product(&db, &category, "SPK-C7", 5000, 10).await;

        product.price = Money::from_minor(5500);
        product.min_quantity = 4;
        db.products().update(&product).await.unwrap();

        let stored = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.price.minor(), 5500);
        assert_eq!(stored.min_quantity, 4);

        product.id = "missing".to_string();
        assert!(db.products().update(&product).await.is_err());
    }

    #[tokio::test]
    async fn test_adjust_stock_never_negative() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let product = seed_product(&db, &category, "SPK-C7", 5000, 3).await;

        let updated = db.products().adjust_stock(&product.id, -2).await.unwrap();
        assert_eq!(updated.quantity, 1);

        let err = db.products().adjust_stock(&product.id, -2).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));

        let err = db.products().adjust_stock("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_low_stock_and_search() {
        let db = test_db().await;
        let engine = seed_category(&db, "Engine").await;
        let brakes = seed_category(&db, "Brakes").await;
        seed_product(&db, &engine, "SPK-C7", 5000, 10).await;
        seed_product(&db, &engine, "OIL-10W40", 12000, 1).await;
        seed_product(&db, &brakes, "BRK-PAD", 15000, 0).await;

        let low = db.products().low_stock().await.unwrap();
        assert_eq!(low.len(), 2);
        assert_eq!(low[0].sku, "BRK-PAD");

        let filter = ProductFilter {
            category_id: Some(engine.id.clone()),
            text: Some("oil".to_string()),
            ..Default::default()
        };
        let found = db.products().search(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].sku, "OIL-10W40");

        assert_eq!(db.products().search(&ProductFilter::default()).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let product = seed_product(&db, &category, "SPK-C7", 5000, 10).await;

        db.products().delete(&product.id).await.unwrap();
        assert!(db.products().get_by_id(&product.id).await.unwrap().is_none());
        assert!(db.products().delete(&product.id).await.is_err());
    }
}

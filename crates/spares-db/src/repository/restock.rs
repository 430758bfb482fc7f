//! # Restock Repository
//!
//! Stock replenishment and its audit trail.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use spares_core::inventory::{apply_restock, plan_restock, RestockRequest};
use spares_core::{CoreError, Product, RestockRecord};

use super::product;
use crate::error::{DbError, DbResult};

const RESTOCK_COLUMNS: &str = "id, product_id, product_name, previous_quantity, quantity_added, \
     new_quantity, cost_price, total_cost, restocked_by, supplier, notes, created_at";

/// Repository for restock operations.
#[derive(Debug, Clone)]
pub struct RestockRepository {
    pool: SqlitePool,
}

impl RestockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RestockRepository { pool }
    }

    /// Adds stock to a product and writes the history record.
    ///
    /// The product update is guarded on the quantity the record was planned
    /// from, so a concurrent sale makes this fail instead of writing a history
    /// row that doesn't add up.
    pub async fn restock(
        &self,
        product_id: &str,
        request: RestockRequest,
        restocked_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<(Product, RestockRecord)> {
        debug!(product_id = %product_id, quantity = request.quantity, "Restocking");

        let mut tx = self.pool.begin().await?;

        let mut product = product::get_with(&mut tx, product_id)
            .await?
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let record = plan_restock(&product, request, restocked_by, now)?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET quantity = ?2, cost_price = ?3, last_restocked = ?4, updated_at = ?4
            WHERE id = ?1 AND quantity = ?5
            "#,
        )
        .bind(&product.id)
        .bind(record.new_quantity)
        .bind(record.cost_price)
        .bind(record.created_at)
        .bind(record.previous_quantity)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::QueryFailed(format!(
                "stock for {} changed during restock",
                product.sku
            )));
        }

        insert_with(&mut tx, &record).await?;
        tx.commit().await?;

        apply_restock(&mut product, &record);

        info!(
            sku = %product.sku,
            added = record.quantity_added,
            new_quantity = record.new_quantity,
            total_cost = %record.total_cost,
            "Product restocked"
        );
        Ok((product, record))
    }

    /// History for one product, newest first.
    pub async fn list_for_product(&self, product_id: &str) -> DbResult<Vec<RestockRecord>> {
        let records = sqlx::query_as::<_, RestockRecord>(&format!(
            "SELECT {RESTOCK_COLUMNS} FROM restock_history WHERE product_id = ?1 \
             ORDER BY created_at DESC, id"
        ))
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Most recent restocks across all products.
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<RestockRecord>> {
        let records = sqlx::query_as::<_, RestockRecord>(&format!(
            "SELECT {RESTOCK_COLUMNS} FROM restock_history ORDER BY created_at DESC, id LIMIT ?1"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Full history, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<RestockRecord>> {
        let records = sqlx::query_as::<_, RestockRecord>(&format!(
            "SELECT {RESTOCK_COLUMNS} FROM restock_history ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }
}

pub(crate) async fn insert_with(conn: &mut SqliteConnection, record: &RestockRecord) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO restock_history (
            id, product_id, product_name, previous_quantity, quantity_added,
            new_quantity, cost_price, total_cost, restocked_by, supplier, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&record.id)
    .bind(&record.product_id)
    .bind(&record.product_name)
    .bind(record.previous_quantity)
    .bind(record.quantity_added)
    .bind(record.new_quantity)
    .bind(record.cost_price)
    .bind(record.total_cost)
    .bind(&record.restocked_by)
    .bind(&record.supplier)
    .bind(&record.notes)
    .bind(record.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn exists_with(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let found: Option<String> = sqlx::query_scalar("SELECT id FROM restock_history WHERE id = ?1")
        .bind(id)
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

    fn request(quantity: i64, cost: Option<i64>) -> RestockRequest {
        RestockRequest {
            quantity,
            cost_price: cost.map(Money::from_minor),
            supplier: Some("Kariakoo Traders".to_string()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_restock_updates_product_and_history() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let plug = seed_product(&db, &category, "SPK-C7", 5000, 3).await;

        let (updated, record) = db
            .restocks()
            .restock(&plug.id, request(10, Some(2800)), "Admin", Utc::now())
            .await
            .unwrap();

        assert_eq!(updated.quantity, 13);
        assert_eq!(updated.cost_price.minor(), 2800);
        assert!(updated.last_restocked.is_some());
        assert_eq!(record.previous_quantity, 3);
        assert_eq!(record.new_quantity, 13);
        assert_eq!(record.total_cost.minor(), 28_000);

        let stored = db.products().get_by_id(&plug.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);

        let history = db.restocks().list_for_product(&plug.id).await.unwrap();
        assert_eq!(history, vec![record]);
    }

    #[tokio::test]
    async fn test_restock_keeps_cost_when_not_given() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let plug = seed_product(&db, &category, "SPK-C7", 5000, 0).await;

        let (updated, record) = db
            .restocks()
            .restock(&plug.id, request(4, None), "Admin", Utc::now())
            .await
            .unwrap();
        assert_eq!(updated.cost_price, plug.cost_price);
        assert_eq!(record.total_cost, plug.cost_price.times(4));
    }

    #[tokio::test]
    async fn test_invalid_restock_writes_nothing() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let plug = seed_product(&db, &category, "SPK-C7", 5000, 3).await;

        let err = db
            .restocks()
            .restock(&plug.id, request(0, None), "Admin", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));

        let err = db
            .restocks()
            .restock("missing", request(1, None), "Admin", Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));

        assert!(db.restocks().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let plug = seed_product(&db, &category, "SPK-C7", 5000, 0).await;

        let earlier = Utc::now() - chrono::Duration::days(1);
        db.restocks()
            .restock(&plug.id, request(1, None), "Admin", earlier)
            .await
            .unwrap();
        db.restocks()
            .restock(&plug.id, request(2, None), "Admin", Utc::now())
            .await
            .unwrap();

        let recent = db.restocks().list_recent(1).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].quantity_added, 2);
        assert_eq!(db.restocks().list_all().await.unwrap().len(), 2);
    }
}

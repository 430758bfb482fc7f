//! # Sale Repository
//!
//! Persists checkouts and reads sale history back for reports.
//!
//! ## Checkout Transaction
//! ```text
//! record_checkout(&plan)
//!      │
//!      ├── BEGIN
//!      ├── INSERT INTO sales
//!      ├── INSERT INTO sale_items (one row per line, line_no keeps order)
//!      ├── UPDATE products SET quantity = quantity - n   (per deduction, guarded)
//!      ├── INSERT INTO credits                           (only when money is owed)
//!      └── COMMIT
//!
//! Any failure rolls everything back: no sale without its stock movement.
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use spares_core::checkout::CheckoutPlan;
use spares_core::{
    CoreError, Customer, Money, PaymentBreakdown, PaymentMethod, Sale, SaleItem, SaleStatus,
};

use super::{credit, product};
use crate::error::DbResult;

const SALE_COLUMNS: &str = "id, created_at, total_amount, total_discount, final_amount, \
     payment_method, cash_amount, mobile_money_amount, credit_amount, \
     customer_name, customer_phone, status, served_by";

const ITEM_COLUMNS: &str =
    "si.sale_id, si.product_id, si.name, si.sku, si.quantity, si.unit_price, si.discount, si.subtotal";

/// Flat `sales` row; items are loaded separately.
#[derive(Debug, FromRow)]
struct SaleRow {
    id: String,
    created_at: DateTime<Utc>,
    total_amount: Money,
    total_discount: Money,
    final_amount: Money,
    payment_method: PaymentMethod,
    cash_amount: Money,
    mobile_money_amount: Money,
    credit_amount: Money,
    customer_name: Option<String>,
    customer_phone: Option<String>,
    status: SaleStatus,
    served_by: String,
}

impl SaleRow {
    fn into_sale(self, items: Vec<SaleItem>) -> Sale {
        let customer = self.customer_name.map(|name| Customer {
            name,
            phone: self.customer_phone,
        });

        Sale {
            id: self.id,
            created_at: self.created_at,
            items,
            total_amount: self.total_amount,
            total_discount: self.total_discount,
            final_amount: self.final_amount,
            payment_method: self.payment_method,
            payment: PaymentBreakdown {
                cash: self.cash_amount,
                mobile_money: self.mobile_money_amount,
                credit: self.credit_amount,
            },
            customer,
            status: self.status,
            served_by: self.served_by,
        }
    }
}

#[derive(Debug, FromRow)]
struct SaleItemRow {
    sale_id: String,
    #[sqlx(flatten)]
    item: SaleItem,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Writes a planned checkout atomically.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::InsufficientStock))` - Shelf changed
    ///   since the cart was built; nothing is written
    pub async fn record_checkout(&self, plan: &CheckoutPlan) -> DbResult<()> {
        let sale = &plan.sale;
        debug!(id = %sale.id, lines = sale.items.len(), "Recording checkout");

        let mut tx = self.pool.begin().await?;

        insert_with(&mut tx, sale).await?;

        for deduction in &plan.stock_deductions {
            product::adjust_stock_with(
                &mut tx,
                &deduction.product_id,
                -deduction.quantity,
                sale.created_at,
            )
            .await?;
        }

        if let Some(credit) = &plan.credit {
            credit::insert_with(&mut tx, credit).await?;
        }

        tx.commit().await?;

        info!(
            id = %sale.id,
            method = sale.payment_method.as_str(),
            total = %sale.final_amount,
            on_credit = %sale.payment.credit,
            "Sale recorded"
        );
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let row = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items si WHERE si.sale_id = ?1 ORDER BY si.line_no"
        ))
        .bind(id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(|r| r.item)
        .collect();

        Ok(Some(row.into_sale(items)))
    }

    /// Like [`get_by_id`](Self::get_by_id) but a missing sale is an error.
    pub async fn find(&self, id: &str) -> DbResult<Sale> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()).into())
    }

    /// Sales with `start <= created_at < end`, oldest first. Either bound may
    /// be open.
    pub async fn list_between(
        &self,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> DbResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(&format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at < ?2) \
             ORDER BY created_at, id"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let item_rows = sqlx::query_as::<_, SaleItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items si JOIN sales s ON s.id = si.sale_id \
             WHERE (?1 IS NULL OR s.created_at >= ?1) AND (?2 IS NULL OR s.created_at < ?2) \
             ORDER BY si.sale_id, si.line_no"
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        let mut items: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for row in item_rows {
            items.entry(row.sale_id).or_default().push(row.item);
        }

        let sales: Vec<Sale> = rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_sale(lines)
            })
            .collect();

        debug!(count = sales.len(), "Loaded sales");
        Ok(sales)
    }

    /// Full sale history, oldest first.
    pub async fn list_all(&self) -> DbResult<Vec<Sale>> {
        self.list_between(None, None).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub(crate) async fn insert_with(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    let (customer_name, customer_phone) = match &sale.customer {
        Some(c) => (Some(c.name.as_str()), c.phone.as_deref()),
        None => (None, None),
    };

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, created_at, total_amount, total_discount, final_amount,
            payment_method, cash_amount, mobile_money_amount, credit_amount,
            customer_name, customer_phone, status, served_by
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13
        )
        "#,
    )
    .bind(&sale.id)
    .bind(sale.created_at)
    .bind(sale.total_amount)
    .bind(sale.total_discount)
    .bind(sale.final_amount)
    .bind(sale.payment_method)
    .bind(sale.payment.cash)
    .bind(sale.payment.mobile_money)
    .bind(sale.payment.credit)
    .bind(customer_name)
    .bind(customer_phone)
    .bind(sale.status)
    .bind(&sale.served_by)
    .execute(&mut *conn)
    .await?;

    for (line_no, item) in sale.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO sale_items (
                sale_id, line_no, product_id, name, sku,
                quantity, unit_price, discount, subtotal
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&sale.id)
        .bind(line_no as i64)
        .bind(&item.product_id)
        .bind(&item.name)
        .bind(&item.sku)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.discount)
        .bind(item.subtotal)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub(crate) async fn exists_with(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let found: Option<String> = sqlx::query_scalar("SELECT id FROM sales WHERE id = ?1")
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
    use crate::error::DbError;
    use crate::repository::test_support::{seed_category, seed_product, test_db};
    use chrono::{Duration, TimeZone};
    use spares_core::cart::Cart;
    use spares_core::checkout::{plan_checkout, Tender};

    #[tokio::test]
    async fn test_cash_checkout_deducts_stock() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let plug = seed_product(&db, &category, "SPK-C7", 5000, 10).await;
        let oil = seed_product(&db, &category, "OIL-1L", 12000, 4).await;

        let mut cart = Cart::new();
        cart.add_item(&plug, 2).unwrap();
        cart.add_item(&oil, 1).unwrap();
        cart.set_discount(&oil.id, Money::from_minor(1000)).unwrap();

        let plan = plan_checkout(&cart, Tender::Cash, None, "Admin", Utc::now()).unwrap();
        db.sales().record_checkout(&plan).await.unwrap();

        let stored = db.sales().find(&plan.sale.id).await.unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.items[0].sku, "SPK-C7");
        assert_eq!(stored.final_amount.minor(), 21_000);
        assert_eq!(stored.payment.cash.minor(), 21_000);
        assert_eq!(stored.status, SaleStatus::Completed);
        assert!(stored.customer.is_none());

        let plug = db.products().get_by_id(&plug.id).await.unwrap().unwrap();
        let oil = db.products().get_by_id(&oil.id).await.unwrap().unwrap();
        assert_eq!(plug.quantity, 8);
        assert_eq!(oil.quantity, 3);
    }

    #[tokio::test]
    async fn test_credit_checkout_opens_credit() {
        let db = test_db().await;
        let category = seed_category(&db, "Brakes").await;
        let pads = seed_product(&db, &category, "BRK-PAD", 15000, 5).await;

        let mut cart = Cart::new();
        cart.add_item(&pads, 1).unwrap();
        let customer = Customer {
            name: "Juma".to_string(),
            phone: Some("0712345678".to_string()),
        };

        let plan = plan_checkout(
            &cart,
            Tender::Split {
                cash: Money::from_minor(10_000),
                mobile_money: Money::zero(),
            },
            Some(customer),
            "Admin",
            Utc::now(),
        )
        .unwrap();
        db.sales().record_checkout(&plan).await.unwrap();

        let sale = db.sales().find(&plan.sale.id).await.unwrap();
        assert_eq!(sale.status, SaleStatus::Partial);
        assert_eq!(sale.payment.credit.minor(), 5_000);
        assert_eq!(sale.customer.as_ref().map(|c| c.name.as_str()), Some("Juma"));

        let credits = db.credits().list(None).await.unwrap();
        assert_eq!(credits.len(), 1);
        assert_eq!(credits[0].sale_id, sale.id);
        assert_eq!(credits[0].remaining_balance.minor(), 5_000);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let plug = seed_product(&db, &category, "SPK-C7", 5000, 3).await;

        let mut cart = Cart::new();
        cart.add_item(&plug, 3).unwrap();
        let plan = plan_checkout(&cart, Tender::Cash, None, "Admin", Utc::now()).unwrap();

        // Someone else sold two in the meantime.
        db.products().adjust_stock(&plug.id, -2).await.unwrap();

        let err = db.sales().record_checkout(&plan).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));

        assert_eq!(db.sales().count().await.unwrap(), 0);
        let plug = db.products().get_by_id(&plug.id).await.unwrap().unwrap();
        assert_eq!(plug.quantity, 1);
    }

    #[tokio::test]
    async fn test_list_between_bounds() {
        let db = test_db().await;
        let category = seed_category(&db, "Engine").await;
        let plug = seed_product(&db, &category, "SPK-C7", 5000, 10).await;

        let day = Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        for offset in [-1, 0, 1] {
            let mut cart = Cart::new();
            cart.add_item(&plug, 1).unwrap();
            let at = day + Duration::days(offset) + Duration::hours(10);
            let plan = plan_checkout(&cart, Tender::MobileMoney, None, "Admin", at).unwrap();
            db.sales().record_checkout(&plan).await.unwrap();
        }

        let today = db
            .sales()
            .list_between(Some(day), Some(day + Duration::days(1)))
            .await
            .unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].items.len(), 1);
        assert_eq!(today[0].payment_method, PaymentMethod::MobileMoney);

        let since = db.sales().list_between(Some(day), None).await.unwrap();
        assert_eq!(since.len(), 2);
        assert_eq!(db.sales().list_all().await.unwrap().len(), 3);
    }
}

//! # Credit Repository
//!
//! The credit ledger: balances owed by customers and the payments made
//! against them.
//!
//! Line items are stored as a JSON snapshot on the credit row so the ledger
//! still reads correctly after products are renamed or deleted.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use spares_core::credit::{apply_payment, CreditSummary, PaymentRequest};
use spares_core::{
    CoreError, Credit, CreditPayment, CreditStatus, Customer, Money, SaleItem,
};

use crate::error::DbResult;

const CREDIT_COLUMNS: &str = "id, customer_name, customer_phone, sale_id, items, total_amount, \
     amount_paid, remaining_balance, status, created_at, updated_at";

const PAYMENT_COLUMNS: &str = "credit_id, id, amount, method, received_by, note, paid_at";

#[derive(Debug, FromRow)]
struct CreditRow {
    id: String,
    customer_name: String,
    customer_phone: Option<String>,
    sale_id: String,
    #[sqlx(json)]
    items: Vec<SaleItem>,
    total_amount: Money,
    amount_paid: Money,
    remaining_balance: Money,
    status: CreditStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CreditRow {
    fn into_credit(self, payments: Vec<CreditPayment>) -> Credit {
        Credit {
            id: self.id,
            customer: Customer {
                name: self.customer_name,
                phone: self.customer_phone,
            },
            sale_id: self.sale_id,
            items: self.items,
            total_amount: self.total_amount,
            amount_paid: self.amount_paid,
            remaining_balance: self.remaining_balance,
            payments,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PaymentRow {
    credit_id: String,
    #[sqlx(flatten)]
    payment: CreditPayment,
}

/// Repository for credit database operations.
///
/// ## Usage
/// ```rust,ignore
/// let open = db.credits().list_open().await?;
/// let credit = db.credits().record_payment(&open[0].id, request, "Admin", Utc::now()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CreditRepository {
    pool: SqlitePool,
}

impl CreditRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CreditRepository { pool }
    }

    /// Inserts a credit together with any payments it already carries.
    pub async fn insert(&self, credit: &Credit) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_with(&mut tx, credit).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Loads a credit with its payment history, oldest payment first.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Credit>> {
        let mut conn = self.pool.acquire().await?;
        get_with(&mut conn, id).await
    }

    pub async fn find(&self, id: &str) -> DbResult<Credit> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::CreditNotFound(id.to_string()).into())
    }

    /// The credit opened by a sale, if any.
    pub async fn get_by_sale(&self, sale_id: &str) -> DbResult<Option<Credit>> {
        let id: Option<String> = sqlx::query_scalar("SELECT id FROM credits WHERE sale_id = ?1")
            .bind(sale_id)
            .fetch_optional(&self.pool)
            .await?;

        match id {
            Some(id) => self.get_by_id(&id).await,
            None => Ok(None),
        }
    }

    /// Credits, newest first, optionally narrowed to one status.
    pub async fn list(&self, status: Option<CreditStatus>) -> DbResult<Vec<Credit>> {
        let rows = sqlx::query_as::<_, CreditRow>(&format!(
            "SELECT {CREDIT_COLUMNS} FROM credits WHERE (?1 IS NULL OR status = ?1) \
             ORDER BY created_at DESC, id"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        let payment_rows = sqlx::query_as::<_, PaymentRow>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM credit_payments ORDER BY paid_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;

        let mut payments: HashMap<String, Vec<CreditPayment>> = HashMap::new();
        for row in payment_rows {
            payments.entry(row.credit_id).or_default().push(row.payment);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let history = payments.remove(&row.id).unwrap_or_default();
                row.into_credit(history)
            })
            .collect())
    }

    /// Credits with a balance still owed (`active` or `partial`).
    pub async fn list_open(&self) -> DbResult<Vec<Credit>> {
        let credits = self.list(None).await?;
        Ok(credits.into_iter().filter(|c| c.status.is_open()).collect())
    }

    /// Applies a payment to a credit and persists both in one transaction.
    ///
    /// ## Returns
    /// * `Err(DbError::Domain(CoreError::PaymentExceedsBalance))` - More than is owed
    /// * `Err(DbError::Domain(CoreError::CreditAlreadyCleared))` - Nothing owed
    pub async fn record_payment(
        &self,
        id: &str,
        request: PaymentRequest,
        received_by: &str,
        now: DateTime<Utc>,
    ) -> DbResult<Credit> {
        debug!(id = %id, amount = %request.amount, "Recording credit payment");

        let mut tx = self.pool.begin().await?;

        let mut credit = get_with(&mut tx, id)
            .await?
            .ok_or_else(|| CoreError::CreditNotFound(id.to_string()))?;

        let payment = apply_payment(&mut credit, request, received_by, now)?;

        sqlx::query(
            r#"
            UPDATE credits
            SET amount_paid = ?2, remaining_balance = ?3, status = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&credit.id)
        .bind(credit.amount_paid)
        .bind(credit.remaining_balance)
        .bind(credit.status)
        .bind(credit.updated_at)
        .execute(&mut *tx)
        .await?;

        insert_payment_with(&mut tx, &credit.id, &payment).await?;

        tx.commit().await?;

        info!(
            id = %credit.id,
            paid = %payment.amount,
            remaining = %credit.remaining_balance,
            status = credit.status.as_str(),
            "Credit payment recorded"
        );
        Ok(credit)
    }

    /// Ledger totals across every credit.
    pub async fn summary(&self) -> DbResult<CreditSummary> {
        let credits = self.list(None).await?;
        Ok(CreditSummary::from_credits(&credits))
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM credits")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

// =============================================================================
// Connection-level helpers
// =============================================================================

pub(crate) async fn get_with(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Credit>> {
    let row = sqlx::query_as::<_, CreditRow>(&format!(
        "SELECT {CREDIT_COLUMNS} FROM credits WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let payments = sqlx::query_as::<_, PaymentRow>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM credit_payments WHERE credit_id = ?1 ORDER BY paid_at, id"
    ))
    .bind(id)
    .fetch_all(&mut *conn)
    .await?
    .into_iter()
    .map(|r| r.payment)
    .collect();

    Ok(Some(row.into_credit(payments)))
}

pub(crate) async fn insert_with(conn: &mut SqliteConnection, credit: &Credit) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO credits (
            id, customer_name, customer_phone, sale_id, items,
            total_amount, amount_paid, remaining_balance, status,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&credit.id)
    .bind(&credit.customer.name)
    .bind(&credit.customer.phone)
    .bind(&credit.sale_id)
    .bind(Json(&credit.items))
    .bind(credit.total_amount)
    .bind(credit.amount_paid)
    .bind(credit.remaining_balance)
    .bind(credit.status)
    .bind(credit.created_at)
    .bind(credit.updated_at)
    .execute(&mut *conn)
    .await?;

    for payment in &credit.payments {
        insert_payment_with(conn, &credit.id, payment).await?;
    }

    Ok(())
}

async fn insert_payment_with(
    conn: &mut SqliteConnection,
    credit_id: &str,
    payment: &CreditPayment,
) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO credit_payments (id, credit_id, amount, method, received_by, note, paid_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        "#,
    )
    .bind(&payment.id)
    .bind(credit_id)
    .bind(payment.amount)
    .bind(payment.method)
    .bind(&payment.received_by)
    .bind(&payment.note)
    .bind(payment.paid_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn exists_with(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let found: Option<String> = sqlx::query_scalar("SELECT id FROM credits WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    Ok(found.is_some())
}

// =============================================================================
// Unit Tests
// =============================================================================

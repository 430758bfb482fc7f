//! # Snapshot Repository
//!
//! Whole-store export and import, for backups and for moving data in from
//! the browser version of the shop.
//!
//! ## Import Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  One transaction. Existing data always wins.                           │
//! │                                                                         │
//! │  categories       skip if id or name (any case) exists                 │
//! │  inventory        skip if id or SKU exists, or its category is missing │
//! │  sales            skip if id exists                                    │
//! │  credits          skip if id exists                                    │
//! │  restock_history  skip if id exists                                    │
//! │  current_user     replaces the stored operator when present            │
//! │                                                                         │
//! │  Stock levels are taken from `inventory` as-is; imported sales do not  │
//! │  deduct stock a second time.                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use spares_core::snapshot::{Snapshot, SnapshotCounts, KEY_CURRENT_USER};

use super::category::CategoryRepository;
use super::credit::CreditRepository;
use super::product::ProductRepository;
use super::restock::RestockRepository;
use super::sale::SaleRepository;
use super::storage::StorageRepository;
use super::{category, credit, product, restock, sale, storage};
use crate::error::DbResult;

/// What an import wrote and what it left alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub inserted: SnapshotCounts,
    pub skipped: SnapshotCounts,
}

#[derive(Debug, Clone)]
pub struct SnapshotRepository {
    pool: SqlitePool,
}

impl SnapshotRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SnapshotRepository { pool }
    }

    /// Reads every table into one snapshot.
    pub async fn export(&self) -> DbResult<Snapshot> {
        let snapshot = Snapshot {
            categories: CategoryRepository::new(self.pool.clone()).list().await?,
            inventory: ProductRepository::new(self.pool.clone()).list().await?,
            sales: SaleRepository::new(self.pool.clone()).list_all().await?,
            credits: CreditRepository::new(self.pool.clone()).list(None).await?,
            restock_history: RestockRepository::new(self.pool.clone()).list_all().await?,
            current_user: StorageRepository::new(self.pool.clone())
                .get(KEY_CURRENT_USER)
                .await?,
        };

        info!(counts = ?snapshot.counts(), "Snapshot exported");
        Ok(snapshot)
    }

    /// Imports a snapshot. All or nothing: a failure part way rolls back.
    pub async fn import(&self, snapshot: &Snapshot) -> DbResult<ImportReport> {
        let mut report = ImportReport::default();
        let mut tx = self.pool.begin().await?;

        for c in &snapshot.categories {
            if category::exists_with(&mut tx, &c.id, &c.name).await? {
                debug!(id = %c.id, name = %c.name, "Skipping existing category");
                report.skipped.categories += 1;
            } else {
                category::insert_with(&mut tx, c).await?;
                report.inserted.categories += 1;
            }
        }

        for p in &snapshot.inventory {
            if product::exists_with(&mut tx, &p.id, &p.sku).await?
                || !category_id_exists(&mut tx, &p.category_id).await?
            {
                debug!(id = %p.id, sku = %p.sku, "Skipping product");
                report.skipped.products += 1;
            } else {
                product::insert_with(&mut tx, p).await?;
                report.inserted.products += 1;
            }
        }

        for s in &snapshot.sales {
            if sale::exists_with(&mut tx, &s.id).await? {
                report.skipped.sales += 1;
            } else {
                sale::insert_with(&mut tx, s).await?;
                report.inserted.sales += 1;
            }
        }

        for c in &snapshot.credits {
            if credit::exists_with(&mut tx, &c.id).await? {
                report.skipped.credits += 1;
            } else {
                credit::insert_with(&mut tx, c).await?;
                report.inserted.credits += 1;
            }
        }

        for r in &snapshot.restock_history {
            if restock::exists_with(&mut tx, &r.id).await? {
                report.skipped.restocks += 1;
            } else {
                restock::insert_with(&mut tx, r).await?;
                report.inserted.restocks += 1;
            }
        }

        if let Some(operator) = &snapshot.current_user {
            storage::set_with(&mut tx, KEY_CURRENT_USER, operator).await?;
        }

        tx.commit().await?;

        info!(
            inserted = ?report.inserted,
            skipped = ?report.skipped,
            "Snapshot imported"
        );
        Ok(report)
    }
}

async fn category_id_exists(conn: &mut SqliteConnection, id: &str) -> DbResult<bool> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories WHERE id = ?1")
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    Ok(count > 0)
}

// =============================================================================
// Unit Tests
// =============================================================================

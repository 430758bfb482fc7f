//! # Category Repository
//!
//! Categories and their subcategory lists. Renames are pushed down to the
//! denormalized `category_name` on products in the same transaction.

use sqlx::types::Json;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use spares_core::inventory::ensure_category_unused;
use spares_core::{Category, CoreError};

use crate::error::{DbError, DbResult};

const CATEGORY_COLUMNS: &str = "id, name, subcategories, created_at, updated_at";

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CategoryRepository { pool }
    }

    /// All categories, alphabetical.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name COLLATE NOCASE"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Looks a category up by name, ignoring case.
    pub async fn get_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = ?1 COLLATE NOCASE"
        ))
        .bind(name.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Resolves a category by id first, then by name.
    pub async fn find(&self, id_or_name: &str) -> DbResult<Category> {
        if let Some(category) = self.get_by_id(id_or_name).await? {
            return Ok(category);
        }
        self.get_by_name(id_or_name)
            .await?
            .ok_or_else(|| CoreError::CategoryNotFound(id_or_name.to_string()).into())
    }

    /// Inserts a new category.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Name already taken (case-insensitive)
    pub async fn insert(&self, category: &Category) -> DbResult<()> {
        debug!(name = %category.name, "Inserting category");

        let mut conn = self.pool.acquire().await?;
        insert_with(&mut conn, category).await.map_err(|e| match e {
            DbError::UniqueViolation { .. } => DbError::duplicate("category name", &category.name),
            other => other,
        })?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(())
    }

    /// Saves name and subcategories, and refreshes `category_name` on every
    /// product in the category.
    pub async fn update(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, "Updating category");

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE categories SET name = ?2, subcategories = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(Json(&category.subcategories))
        .bind(category.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("category name", &category.name),
            other => other,
        })?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CategoryNotFound(category.id.clone()).into());
        }

        let renamed = sqlx::query(
            "UPDATE products SET category_name = ?2 WHERE category_id = ?1 AND category_name <> ?2",
        )
        .bind(&category.id)
        .bind(&category.name)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = %category.id,
            products_updated = renamed.rows_affected(),
            "Category updated"
        );
        Ok(())
    }

    /// Deletes a category that no product references.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting category");

        let mut tx = self.pool.begin().await?;

        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;

        let in_use: Vec<spares_core::Product> = sqlx::query_as(&format!(
            "SELECT {} FROM products WHERE category_id = ?1",
            super::product::PRODUCT_COLUMNS
        ))
        .bind(id)
        .fetch_all(&mut *tx)
        .await?;
        ensure_category_unused(&category.id, &category.name, &in_use)?;

        sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, name = %category.name, "Category deleted");
        Ok(())
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

pub(crate) async fn insert_with(conn: &mut SqliteConnection, category: &Category) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO categories (id, name, subcategories, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&category.id)
    .bind(&category.name)
    .bind(Json(&category.subcategories))
    .bind(category.created_at)
    .bind(category.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn exists_with(conn: &mut SqliteConnection, id: &str, name: &str) -> DbResult<bool> {
    let found: Option<String> = sqlx::query_scalar(
        "SELECT id FROM categories WHERE id = ?1 OR name = ?2 COLLATE NOCASE LIMIT 1",
    )
    .bind(id)
    .bind(name)
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
    use chrono::Utc;

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = test_db().await;
        let category = seed_category(&db, "Brakes").await;

        let by_id = db.categories().get_by_id(&category.id).await.unwrap().unwrap();
        assert_eq!(by_id, category);
        assert_eq!(by_id.subcategories, vec!["Pads"]);

        let by_name = db.categories().get_by_name("brakes").await.unwrap();
        assert_eq!(by_name.map(|c| c.id), Some(category.id.clone()));
        assert_eq!(db.categories().find("BRAKES").await.unwrap().id, category.id);
        assert!(db.categories().find("Lights").await.is_err());
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        seed_category(&db, "Engine").await;

        let dup = Category::new("ENGINE", vec![], Utc::now()).unwrap();
        let err = db.categories().insert(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_rename_propagates_to_products() {
        let db = test_db().await;
        let mut category = seed_category(&db, "Brakes").await;
        let product = seed_product(&db, &category, "BRK-1", 1000, 5).await;

        category.rename("Braking", Utc::now()).unwrap();
        category
            .set_subcategories(vec!["Pads".into(), "Shoes".into()], Utc::now())
            .unwrap();
        db.categories().update(&category).await.unwrap();

        let stored = db.categories().get_by_id(&category.id).await.unwrap().unwrap();
        assert_eq!(stored.name, "Braking");
        assert_eq!(stored.subcategories, vec!["Pads", "Shoes"]);

        let product = db.products().get_by_id(&product.id).await.unwrap().unwrap();
        assert_eq!(product.category_name, "Braking");
    }

    #[tokio::test]
    async fn test_delete_blocked_while_in_use() {
        let db = test_db().await;
        let category = seed_category(&db, "Brakes").await;
        let product = seed_product(&db, &category, "BRK-1", 1000, 5).await;

        let err = db.categories().delete(&category.id).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::CategoryInUse { product_count: 1, .. })
        ));

        db.products().delete(&product.id).await.unwrap();
        db.categories().delete(&category.id).await.unwrap();
        assert_eq!(db.categories().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let db = test_db().await;
        seed_category(&db, "Tyres").await;
        seed_category(&db, "brakes").await;
        seed_category(&db, "Engine").await;

        let names: Vec<String> = db
            .categories()
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["brakes", "Engine", "Tyres"]);
    }
}

//! Product catalog repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use bazaar_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::{CatalogFilter, NewProduct, Product, ProductChanges, ProductPage};

// =============================================================================
// Internal Row Types
// =============================================================================

const PRODUCT_COLUMNS: &str = "id, name, description, price, stock, category, images, \
                               is_active, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    category: String,
    images: Vec<String>,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let price = Price::new(row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid price for product {}: {e}", row.id))
        })?;

        Ok(Self {
            id: ProductId::new(row.id),
            name: row.name,
            description: row.description,
            price,
            stock: row.stock,
            category: row.category,
            images: row.images,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Escape `LIKE` wildcards so the search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

pub(crate) fn id_values(ids: &[ProductId]) -> Vec<i32> {
    ids.iter().map(ProductId::as_i32).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Public catalog
    // =========================================================================

    /// One page of active products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_active(&self, filter: &CatalogFilter) -> Result<ProductPage, RepositoryError> {
        let search = filter.search.as_deref().map(like_pattern);

        let total: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM products
            WHERE is_active
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
            ",
        )
        .bind(filter.category.as_deref())
        .bind(search.as_deref())
        .fetch_one(self.pool)
        .await?;

        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE is_active
              AND ($1::text IS NULL OR category = $1)
              AND ($2::text IS NULL OR name ILIKE $2 OR description ILIKE $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "
        ))
        .bind(filter.category.as_deref())
        .bind(search.as_deref())
        .bind(filter.limit)
        .bind(filter.offset())
        .fetch_all(self.pool)
        .await?;

        Ok(ProductPage {
            products: rows
                .into_iter()
                .map(TryInto::try_into)
                .collect::<Result<_, _>>()?,
            total_pages: filter.total_pages(total),
            current_page: filter.page,
        })
    }

    /// An active product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND is_active"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Distinct categories of active products, sorted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(&self) -> Result<Vec<String>, RepositoryError> {
        let categories = sqlx::query_scalar(
            "SELECT DISTINCT category FROM products WHERE is_active ORDER BY category",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// Every product including inactive ones, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Whether a product exists, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)")
            .bind(id.as_i32())
            .fetch_one(self.pool)
            .await?;

        Ok(exists)
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, product: &NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO products (name, description, price, stock, category, images, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price.amount())
        .bind(product.stock)
        .bind(&product.category)
        .bind(&product.images)
        .bind(product.is_active)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Apply a partial update. Returns `None` when the product does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        changes: &ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products SET
                name        = COALESCE($2, name),
                description = COALESCE($3, description),
                price       = COALESCE($4, price),
                stock       = COALESCE($5, stock),
                category    = COALESCE($6, category),
                images      = COALESCE($7, images),
                is_active   = COALESCE($8, is_active),
                updated_at  = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id.as_i32())
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.price.map(|p| p.amount()))
        .bind(changes.stock)
        .bind(changes.category.as_deref())
        .bind(changes.images.as_deref())
        .bind(changes.is_active)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Delete a product. Returns `false` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every listed product. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn bulk_delete(&self, ids: &[ProductId]) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ANY($1)")
            .bind(id_values(ids))
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Show or hide every listed product. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn bulk_set_active(
        &self,
        ids: &[ProductId],
        is_active: bool,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE products SET is_active = $2, updated_at = NOW() WHERE id = ANY($1)",
        )
        .bind(id_values(ids))
        .bind(is_active)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

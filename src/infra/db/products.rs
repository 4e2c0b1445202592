use async_trait::async_trait;

use crate::application::repos::{
    CreateProductParams, ProductsRepo, ProductsWriteRepo, RepoError, UpdateProductParams,
};
use crate::domain::entities::{ProductListEntry, ProductRecord, PromoRecord};

use super::util::map_sqlx_error;
use super::{PostgresRepositories, ProductRow, PromoRow};

const PRODUCT_COLUMNS: &str = "id, name, description, price, size, stock, \
     image_url, image_key, visit_count, is_deleted, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct ProductListRow {
    #[sqlx(flatten)]
    product: ProductRow,
    favorites_count: i64,
}

#[async_trait]
impl ProductsRepo for PostgresRepositories {
    async fn list_products(&self) -> Result<Vec<ProductListEntry>, RepoError> {
        let rows: Vec<ProductListRow> = sqlx::query_as(
            "SELECT p.id, p.name, p.description, p.price, p.size, p.stock, \
                    p.image_url, p.image_key, p.visit_count, p.is_deleted, \
                    p.created_at, p.updated_at, \
                    COUNT(f.id) AS favorites_count \
             FROM products p \
             LEFT JOIN favorites f ON f.product_id = p.id \
             WHERE NOT p.is_deleted \
             GROUP BY p.id \
             ORDER BY p.created_at DESC",
        )
        .fetch_all(self.replica())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows
            .into_iter()
            .map(|row| ProductListEntry {
                product: ProductRecord::from(row.product),
                favorites_count: row.favorites_count,
            })
            .collect())
    }

    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id)
        .fetch_optional(self.replica())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ProductRecord::from))
    }

    async fn list_active_promos_for(&self, product_id: i64) -> Result<Vec<PromoRecord>, RepoError> {
        let rows: Vec<PromoRow> = sqlx::query_as(
            "SELECT id, product_id, discount, is_active, image_url, image_key, \
                    created_at, updated_at \
             FROM promos \
             WHERE product_id = $1 AND is_active \
             ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(self.replica())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PromoRecord::from).collect())
    }
}

#[async_trait]
impl ProductsWriteRepo for PostgresRepositories {
    async fn create_product(&self, params: CreateProductParams) -> Result<ProductRecord, RepoError> {
        let CreateProductParams {
            name,
            description,
            price,
            size,
            stock,
            image_url,
            image_key,
        } = params;

        let row: ProductRow = sqlx::query_as(&format!(
            "INSERT INTO products (name, description, price, size, stock, image_url, image_key) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(size)
        .bind(stock)
        .bind(image_url)
        .bind(image_key)
        .fetch_one(self.primary())
        .await
        .map_err(map_sqlx_error)?;

        Ok(ProductRecord::from(row))
    }

    async fn update_product(&self, params: UpdateProductParams) -> Result<ProductRecord, RepoError> {
        let UpdateProductParams {
            id,
            name,
            description,
            price,
            size,
            stock,
            image,
        } = params;
        let (image_url, image_key) = match image {
            Some((url, key)) => (Some(url), Some(key)),
            None => (None, None),
        };

        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "UPDATE products \
             SET name = $2, description = $3, price = $4, size = $5, stock = $6, \
                 image_url = COALESCE($7, image_url), \
                 image_key = COALESCE($8, image_key), \
                 updated_at = now() \
             WHERE id = $1 AND NOT is_deleted \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(size)
        .bind(stock)
        .bind(image_url)
        .bind(image_key)
        .fetch_optional(self.primary())
        .await
        .map_err(map_sqlx_error)?;

        row.map(ProductRecord::from).ok_or(RepoError::NotFound)
    }

    async fn find_product_for_update(&self, id: i64) -> Result<Option<ProductRecord>, RepoError> {
        let row: Option<ProductRow> = sqlx::query_as(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1 AND NOT is_deleted"
        ))
        .bind(id)
        .fetch_optional(self.primary())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(ProductRecord::from))
    }

    async fn soft_delete_product(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE products SET is_deleted = TRUE, updated_at = now() \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(self.primary())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn increment_visits(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query(
            "UPDATE products SET visit_count = visit_count + 1 \
             WHERE id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .execute(self.primary())
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

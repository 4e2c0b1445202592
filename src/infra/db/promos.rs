use async_trait::async_trait;

use crate::application::repos::{
    CreatePromoParams, PromosRepo, PromosWriteRepo, RepoError, UpdatePromoParams,
};
use crate::domain::entities::{ProductRecord, PromoDetail, PromoRecord};

use super::util::map_sqlx_error;
use super::{PostgresRepositories, PromoRow};

const PROMO_COLUMNS: &str =
    "id, product_id, discount, is_active, image_url, image_key, created_at, updated_at";

/// Promo joined with its product; product columns are aliased with a `p_`
/// prefix to keep the two id/timestamp sets apart.
const PROMO_DETAIL_SELECT: &str = "SELECT pr.id, pr.product_id, pr.discount, pr.is_active, \
            pr.image_url, pr.image_key, pr.created_at, pr.updated_at, \
            p.id AS p_id, p.name AS p_name, p.description AS p_description, \
            p.price AS p_price, p.size AS p_size, p.stock AS p_stock, \
            p.image_url AS p_image_url, p.image_key AS p_image_key, \
            p.visit_count AS p_visit_count, p.is_deleted AS p_is_deleted, \
            p.created_at AS p_created_at, p.updated_at AS p_updated_at \
     FROM promos pr \
     JOIN products p ON p.id = pr.product_id";

#[derive(Debug, sqlx::FromRow)]
struct PromoDetailRow {
    #[sqlx(flatten)]
    promo: PromoRow,
    p_id: i64,
    p_name: String,
    p_description: String,
    p_price: i64,
    p_size: i32,
    p_stock: i32,
    p_image_url: String,
    p_image_key: String,
    p_visit_count: i64,
    p_is_deleted: bool,
    p_created_at: time::OffsetDateTime,
    p_updated_at: time::OffsetDateTime,
}

impl From<PromoDetailRow> for PromoDetail {
    fn from(row: PromoDetailRow) -> Self {
        Self {
            promo: PromoRecord::from(row.promo),
            product: ProductRecord {
                id: row.p_id,
                name: row.p_name,
                description: row.p_description,
                price: row.p_price,
                size: row.p_size,
                stock: row.p_stock,
                image_url: row.p_image_url,
                image_key: row.p_image_key,
                visit_count: row.p_visit_count,
                is_deleted: row.p_is_deleted,
                created_at: row.p_created_at,
                updated_at: row.p_updated_at,
            },
        }
    }
}

#[async_trait]
impl PromosRepo for PostgresRepositories {
    async fn list_promos(&self) -> Result<Vec<PromoDetail>, RepoError> {
        let rows: Vec<PromoDetailRow> =
            sqlx::query_as(&format!("{PROMO_DETAIL_SELECT} ORDER BY pr.created_at DESC"))
                .fetch_all(self.replica())
                .await
                .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PromoDetail::from).collect())
    }

    async fn list_active_promos(&self) -> Result<Vec<PromoDetail>, RepoError> {
        let rows: Vec<PromoDetailRow> = sqlx::query_as(&format!(
            "{PROMO_DETAIL_SELECT} WHERE pr.is_active ORDER BY pr.created_at DESC"
        ))
        .fetch_all(self.replica())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(PromoDetail::from).collect())
    }

    async fn find_promo(&self, id: i64) -> Result<Option<PromoDetail>, RepoError> {
        let row: Option<PromoDetailRow> =
            sqlx::query_as(&format!("{PROMO_DETAIL_SELECT} WHERE pr.id = $1"))
                .bind(id)
                .fetch_optional(self.replica())
                .await
                .map_err(map_sqlx_error)?;

        Ok(row.map(PromoDetail::from))
    }
}

#[async_trait]
impl PromosWriteRepo for PostgresRepositories {
    async fn create_promo(&self, params: CreatePromoParams) -> Result<PromoRecord, RepoError> {
        let CreatePromoParams {
            product_id,
            discount,
            image_url,
            image_key,
        } = params;

        let row: PromoRow = sqlx::query_as(&format!(
            "INSERT INTO promos (product_id, discount, is_active, image_url, image_key) \
             VALUES ($1, $2, TRUE, $3, $4) \
             RETURNING {PROMO_COLUMNS}"
        ))
        .bind(product_id)
        .bind(discount)
        .bind(image_url)
        .bind(image_key)
        .fetch_one(self.primary())
        .await
        .map_err(map_sqlx_error)?;

        Ok(PromoRecord::from(row))
    }

    async fn update_promo(&self, params: UpdatePromoParams) -> Result<PromoRecord, RepoError> {
        let UpdatePromoParams {
            id,
            discount,
            is_active,
            image,
        } = params;
        let (image_url, image_key) = match image {
            Some((url, key)) => (Some(url), Some(key)),
            None => (None, None),
        };

        let row: Option<PromoRow> = sqlx::query_as(&format!(
            "UPDATE promos \
             SET discount = $2, is_active = $3, \
                 image_url = COALESCE($4, image_url), \
                 image_key = COALESCE($5, image_key), \
                 updated_at = now() \
             WHERE id = $1 \
             RETURNING {PROMO_COLUMNS}"
        ))
        .bind(id)
        .bind(discount)
        .bind(is_active)
        .bind(image_url)
        .bind(image_key)
        .fetch_optional(self.primary())
        .await
        .map_err(map_sqlx_error)?;

        row.map(PromoRecord::from).ok_or(RepoError::NotFound)
    }

    async fn find_promo_for_update(&self, id: i64) -> Result<Option<PromoRecord>, RepoError> {
        let row: Option<PromoRow> = sqlx::query_as(&format!(
            "SELECT {PROMO_COLUMNS} FROM promos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.primary())
        .await
        .map_err(map_sqlx_error)?;

        Ok(row.map(PromoRecord::from))
    }

    async fn delete_promo(&self, id: i64) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM promos WHERE id = $1")
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

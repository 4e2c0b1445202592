use async_trait::async_trait;

use crate::application::repos::{FavoritesRepo, RepoError, ToggleOutcome};
use crate::domain::entities::FavoriteRecord;

use super::util::map_sqlx_error;
use super::{FavoriteRow, PostgresRepositories};

#[async_trait]
impl FavoritesRepo for PostgresRepositories {
    async fn toggle(&self, user_id: i64, product_id: i64) -> Result<ToggleOutcome, RepoError> {
        let mut tx = self.primary().begin().await.map_err(map_sqlx_error)?;

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM favorites WHERE user_id = $1 AND product_id = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        if let Some(favorite_id) = existing {
            sqlx::query("DELETE FROM favorites WHERE id = $1")
                .bind(favorite_id)
                .execute(&mut *tx)
                .await
                .map_err(map_sqlx_error)?;
            tx.commit().await.map_err(map_sqlx_error)?;
            return Ok(ToggleOutcome::Removed);
        }

        // The product check shares the transaction so a concurrent
        // soft-delete cannot land between the check and the insert.
        let live: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM products WHERE id = $1 AND NOT is_deleted FOR SHARE",
        )
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        if live.is_none() {
            return Err(RepoError::NotFound);
        }

        let row: FavoriteRow = sqlx::query_as(
            "INSERT INTO favorites (user_id, product_id) VALUES ($1, $2) \
             RETURNING id, user_id, product_id, created_at",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)?;
        Ok(ToggleOutcome::Added(FavoriteRecord::from(row)))
    }

    async fn exists(&self, user_id: i64, product_id: i64) -> Result<bool, RepoError> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT id FROM favorites WHERE user_id = $1 AND product_id = $2",
        )
        .bind(user_id)
        .bind(product_id)
        .fetch_optional(self.replica())
        .await
        .map_err(map_sqlx_error)?;

        Ok(found.is_some())
    }

    async fn count_for_product(&self, product_id: i64) -> Result<i64, RepoError> {
        sqlx::query_scalar("SELECT COUNT(*) FROM favorites WHERE product_id = $1")
            .bind(product_id)
            .fetch_one(self.replica())
            .await
            .map_err(map_sqlx_error)
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteRecord>, RepoError> {
        let rows: Vec<FavoriteRow> = sqlx::query_as(
            "SELECT id, user_id, product_id, created_at FROM favorites \
             WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(self.replica())
        .await
        .map_err(map_sqlx_error)?;

        Ok(rows.into_iter().map(FavoriteRecord::from).collect())
    }
}

//! Favorite service: transactional toggle with a cache-backed rate limiter.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tracing::{instrument, warn};

use crate::application::error::AppError;
use crate::application::repos::{FavoritesRepo, ToggleOutcome};
use crate::cache::{CacheKey, CacheStore};
use crate::domain::entities::FavoriteRecord;

#[derive(Clone)]
pub struct FavoriteService {
    repo: Arc<dyn FavoritesRepo>,
    cache: Arc<dyn CacheStore>,
    rate_limit_window: Duration,
}

impl FavoriteService {
    pub fn new(
        repo: Arc<dyn FavoritesRepo>,
        cache: Arc<dyn CacheStore>,
        rate_limit_window: Duration,
    ) -> Self {
        Self {
            repo,
            cache,
            rate_limit_window,
        }
    }

    /// Flip the (user, product) favorite relation. The existence check and
    /// the mutation run in one primary-store transaction inside the repo;
    /// the rate limiter sits in front of it and is independent of the
    /// transaction.
    #[instrument(skip(self))]
    pub async fn toggle(&self, user_id: i64, product_id: i64) -> Result<ToggleOutcome, AppError> {
        match self
            .cache
            .set_if_absent(
                &CacheKey::FavoriteRateLimit(user_id),
                "1",
                self.rate_limit_window,
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                counter!("vetrina_favorite_rate_limited_total").increment(1);
                return Err(AppError::RateLimited("favorite toggle"));
            }
            Err(err) => {
                // Fail open: the limiter is an optimization, not a
                // correctness guard.
                warn!(error = %err, "rate limit key unavailable, allowing toggle");
            }
        }

        let outcome = self.repo.toggle(user_id, product_id).await?;
        Ok(outcome)
    }

    pub async fn count_for_product(&self, product_id: i64) -> Result<i64, AppError> {
        Ok(self.repo.count_for_product(product_id).await?)
    }

    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteRecord>, AppError> {
        Ok(self.repo.list_for_user(user_id).await?)
    }
}

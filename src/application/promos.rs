//! Promo service: cached list/detail reads and validated CRUD.
//!
//! Promos carry no soft-delete flag; deletion is physical. A promo is only
//! creatable against a product that exists and is not soft-deleted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use crate::application::cache_aside::{invalidate, read_through};
use crate::application::error::AppError;
use crate::application::objectstore::{ObjectStore, PendingUpload};
use crate::application::repos::{
    CreatePromoParams, ProductsWriteRepo, PromosRepo, PromosWriteRepo, UpdatePromoParams,
};
use crate::cache::{CacheKey, CacheStore};
use crate::domain::entities::{PromoDetail, PromoRecord};

/// Object-store folder receiving promo images.
const PROMO_IMAGE_FOLDER: &str = "promos";

fn validate_discount(discount: f64) -> Result<(), AppError> {
    if !discount.is_finite() || !(0.0..=1.0).contains(&discount) {
        return Err(AppError::validation(
            "discount must be a fraction between 0 and 1",
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct PromoService {
    reader: Arc<dyn PromosRepo>,
    writer: Arc<dyn PromosWriteRepo>,
    products: Arc<dyn ProductsWriteRepo>,
    cache: Arc<dyn CacheStore>,
    objects: Arc<dyn ObjectStore>,
    listing_ttl: Duration,
}

impl PromoService {
    pub fn new(
        reader: Arc<dyn PromosRepo>,
        writer: Arc<dyn PromosWriteRepo>,
        products: Arc<dyn ProductsWriteRepo>,
        cache: Arc<dyn CacheStore>,
        objects: Arc<dyn ObjectStore>,
        listing_ttl: Duration,
    ) -> Self {
        Self {
            reader,
            writer,
            products,
            cache,
            objects,
            listing_ttl,
        }
    }

    pub async fn list_promos(&self) -> Result<Vec<PromoDetail>, AppError> {
        read_through(
            self.cache.as_ref(),
            CacheKey::AllPromos,
            self.listing_ttl,
            || async { Ok(self.reader.list_promos().await?) },
        )
        .await
    }

    pub async fn list_active(&self) -> Result<Vec<PromoDetail>, AppError> {
        read_through(
            self.cache.as_ref(),
            CacheKey::ActivePromos,
            self.listing_ttl,
            || async { Ok(self.reader.list_active_promos().await?) },
        )
        .await
    }

    pub async fn get_promo(&self, id: i64) -> Result<PromoDetail, AppError> {
        read_through(
            self.cache.as_ref(),
            CacheKey::Promo(id),
            self.listing_ttl,
            || async {
                self.reader.find_promo(id).await?.ok_or(AppError::NotFound)
            },
        )
        .await
    }

    /// Create an active promo for a live product. The product check reads
    /// the primary so a fresh soft-delete cannot be missed behind replica
    /// lag.
    #[instrument(skip(self, image), fields(product_id))]
    pub async fn create_promo(
        &self,
        product_id: i64,
        discount: f64,
        image: PendingUpload,
    ) -> Result<PromoRecord, AppError> {
        validate_discount(discount)?;

        if self
            .products
            .find_product_for_update(product_id)
            .await?
            .is_none()
        {
            return Err(AppError::NotFound);
        }

        let asset = self.objects.upload(image.path(), PROMO_IMAGE_FOLDER).await?;
        drop(image);

        let record = self
            .writer
            .create_promo(CreatePromoParams {
                product_id,
                discount,
                image_url: asset.url,
                image_key: asset.key,
            })
            .await?;

        invalidate(self.cache.as_ref(), CacheKey::AllPromos).await?;
        invalidate(self.cache.as_ref(), CacheKey::ActivePromos).await?;

        Ok(record)
    }

    #[instrument(skip(self, image), fields(promo_id = id))]
    pub async fn update_promo(
        &self,
        id: i64,
        discount: f64,
        is_active: bool,
        image: Option<PendingUpload>,
    ) -> Result<PromoRecord, AppError> {
        validate_discount(discount)?;

        let replacement = match image {
            Some(pending) => {
                let asset = self.objects.upload(pending.path(), PROMO_IMAGE_FOLDER).await?;
                Some((asset.url, asset.key))
            }
            None => None,
        };

        let record = self
            .writer
            .update_promo(UpdatePromoParams {
                id,
                discount,
                is_active,
                image: replacement,
            })
            .await?;

        invalidate(self.cache.as_ref(), CacheKey::AllPromos).await?;
        invalidate(self.cache.as_ref(), CacheKey::ActivePromos).await?;
        invalidate(self.cache.as_ref(), CacheKey::Promo(id)).await?;

        Ok(record)
    }

    #[instrument(skip(self), fields(promo_id = id))]
    pub async fn delete_promo(&self, id: i64) -> Result<(), AppError> {
        let promo = self
            .writer
            .find_promo_for_update(id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Err(err) = self.objects.delete(&promo.image_key).await {
            warn!(error = %err, key = %promo.image_key, "promo asset removal failed");
        }

        invalidate(self.cache.as_ref(), CacheKey::AllPromos).await?;
        invalidate(self.cache.as_ref(), CacheKey::ActivePromos).await?;
        invalidate(self.cache.as_ref(), CacheKey::Promo(id)).await?;

        self.writer.delete_promo(id).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discount_bounds_are_inclusive() {
        assert!(validate_discount(0.0).is_ok());
        assert!(validate_discount(0.2).is_ok());
        assert!(validate_discount(1.0).is_ok());
    }

    #[test]
    fn out_of_range_discount_rejected() {
        assert!(matches!(validate_discount(1.5), Err(AppError::Validation(_))));
        assert!(matches!(validate_discount(-0.1), Err(AppError::Validation(_))));
        assert!(matches!(validate_discount(f64::NAN), Err(AppError::Validation(_))));
    }
}

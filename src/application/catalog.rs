//! Catalog service: cache-aside reads, dual-write mutation paths, search and
//! the de-duplicated visit counter.
//!
//! The relational primary is the single source of truth and commit point;
//! the cache and the search index are derived projections. Index mirroring
//! on create/update is synchronous (policy-tunable), index removal on delete
//! is best-effort, and every product write evicts both the per-id key and
//! the listing key before it is acknowledged.

use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::application::cache_aside::{invalidate, read_through};
use crate::application::error::AppError;
use crate::application::objectstore::{ObjectStore, PendingUpload};
use crate::application::repos::{
    CreateProductParams, FavoritesRepo, ProductsRepo, ProductsWriteRepo, UpdateProductParams,
};
use crate::application::search::{MirrorPolicy, ProductDocument, SearchIndex};
use crate::cache::keys::normalize_query;
use crate::cache::{CacheKey, CacheStore};
use crate::domain::entities::{ProductListEntry, ProductRecord, PromoRecord};
use crate::domain::types::Caller;

/// Object-store folder receiving product images.
const PRODUCT_IMAGE_FOLDER: &str = "products";

#[derive(Debug, Clone, Copy)]
pub struct CatalogTtls {
    pub product: Duration,
    pub listing: Duration,
    pub search: Duration,
    pub visit_lock: Duration,
}

/// Validated caller input for product creation and update.
#[derive(Debug, Clone)]
pub struct ProductInput {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub size: i32,
    pub stock: i32,
}

impl ProductInput {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("product name must not be empty"));
        }
        if self.price < 0 {
            return Err(AppError::validation("price must be non-negative"));
        }
        if self.size <= 0 {
            return Err(AppError::validation("size must be positive"));
        }
        if self.stock < 0 {
            return Err(AppError::validation("stock must be non-negative"));
        }
        Ok(())
    }
}

/// A product denormalized for its detail view.
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductRecord,
    pub favorited: bool,
    pub promos: Vec<PromoRecord>,
}

#[derive(Clone)]
pub struct CatalogService {
    reader: Arc<dyn ProductsRepo>,
    writer: Arc<dyn ProductsWriteRepo>,
    favorites: Arc<dyn FavoritesRepo>,
    cache: Arc<dyn CacheStore>,
    index: Arc<dyn SearchIndex>,
    objects: Arc<dyn ObjectStore>,
    ttls: CatalogTtls,
    mirror_policy: MirrorPolicy,
}

impl CatalogService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        reader: Arc<dyn ProductsRepo>,
        writer: Arc<dyn ProductsWriteRepo>,
        favorites: Arc<dyn FavoritesRepo>,
        cache: Arc<dyn CacheStore>,
        index: Arc<dyn SearchIndex>,
        objects: Arc<dyn ObjectStore>,
        ttls: CatalogTtls,
        mirror_policy: MirrorPolicy,
    ) -> Self {
        Self {
            reader,
            writer,
            favorites,
            cache,
            index,
            objects,
            ttls,
            mirror_policy,
        }
    }

    /// Non-deleted products with favorite counts, read through the listing
    /// cache entry.
    pub async fn list_products(&self) -> Result<Vec<ProductListEntry>, AppError> {
        read_through(
            self.cache.as_ref(),
            CacheKey::AllProducts,
            self.ttls.listing,
            || async { Ok(self.reader.list_products().await?) },
        )
        .await
    }

    /// Detail read: cached snapshot (or replica row), favorite-by-caller
    /// flag, attached active promos, and a visit recorded for
    /// non-administrative callers.
    #[instrument(skip(self), fields(product_id = id))]
    pub async fn get_product(&self, id: i64, caller: Caller) -> Result<ProductDetail, AppError> {
        let product = read_through(
            self.cache.as_ref(),
            CacheKey::Product(id),
            self.ttls.product,
            || async {
                self.reader
                    .find_product(id)
                    .await?
                    .ok_or(AppError::NotFound)
            },
        )
        .await?;

        let favorited = match caller.user_id() {
            Some(user_id) => self.favorites.exists(user_id, id).await.unwrap_or_else(|err| {
                warn!(error = %err, "favorite lookup failed, reporting false");
                false
            }),
            None => false,
        };

        if caller.counts_as_visit() {
            if let Err(err) = self.record_visit(id).await {
                warn!(error = %err, "visit increment failed");
            }
        }

        let promos = self.reader.list_active_promos_for(id).await?;

        Ok(ProductDetail {
            product,
            favorited,
            promos,
        })
    }

    /// Increment the visit counter at most once per lock window. Losing the
    /// lock race is the expected outcome under concurrent reads and is not
    /// an error.
    pub async fn record_visit(&self, id: i64) -> Result<(), AppError> {
        let acquired = match self
            .cache
            .set_if_absent(&CacheKey::VisitLock(id), "1", self.ttls.visit_lock)
            .await
        {
            Ok(acquired) => acquired,
            Err(err) => {
                // Fail open: an unreachable cache costs one increment, not
                // the read.
                warn!(error = %err, "visit lock unavailable, skipping increment");
                return Ok(());
            }
        };
        if !acquired {
            counter!("vetrina_visit_lock_contended_total").increment(1);
            debug!(product_id = id, "visit already recorded in this window");
            return Ok(());
        }

        self.writer.increment_visits(id).await?;
        invalidate(self.cache.as_ref(), CacheKey::Product(id)).await?;
        Ok(())
    }

    #[instrument(skip(self, input, image))]
    pub async fn create_product(
        &self,
        input: ProductInput,
        image: PendingUpload,
    ) -> Result<ProductRecord, AppError> {
        input.validate()?;

        let asset = self
            .objects
            .upload(image.path(), PRODUCT_IMAGE_FOLDER)
            .await?;
        drop(image);

        let record = self
            .writer
            .create_product(CreateProductParams {
                name: input.name,
                description: input.description,
                price: input.price,
                size: input.size,
                stock: input.stock,
                image_url: asset.url,
                image_key: asset.key,
            })
            .await?;

        // The caller's next search must see the new product.
        self.mirror(&record).await?;
        invalidate(self.cache.as_ref(), CacheKey::AllProducts).await?;

        Ok(record)
    }

    #[instrument(skip(self, input, image), fields(product_id = id))]
    pub async fn update_product(
        &self,
        id: i64,
        input: ProductInput,
        image: Option<PendingUpload>,
    ) -> Result<ProductRecord, AppError> {
        input.validate()?;

        let replacement = match image {
            Some(pending) => {
                let asset = self
                    .objects
                    .upload(pending.path(), PRODUCT_IMAGE_FOLDER)
                    .await?;
                // The previous remote asset is left orphaned; reconciliation
                // is a sweep concern, not a request concern.
                Some((asset.url, asset.key))
            }
            None => None,
        };

        let record = self
            .writer
            .update_product(UpdateProductParams {
                id,
                name: input.name,
                description: input.description,
                price: input.price,
                size: input.size,
                stock: input.stock,
                image: replacement,
            })
            .await?;

        self.mirror(&record).await?;
        invalidate(self.cache.as_ref(), CacheKey::Product(id)).await?;
        invalidate(self.cache.as_ref(), CacheKey::AllProducts).await?;

        Ok(record)
    }

    /// Soft delete: one logical state transition on the primary, with
    /// best-effort cleanup of the derived asset and index document.
    #[instrument(skip(self), fields(product_id = id))]
    pub async fn delete_product(&self, id: i64) -> Result<(), AppError> {
        let product = self
            .writer
            .find_product_for_update(id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Err(err) = self.objects.delete(&product.image_key).await {
            warn!(error = %err, key = %product.image_key, "image asset removal failed");
        }

        if let Err(err) = self.index.remove(id).await {
            counter!("vetrina_index_mirror_failed_total", "op" => "remove").increment(1);
            warn!(error = %err, "search document removal failed, index will lag");
        }

        invalidate(self.cache.as_ref(), CacheKey::Product(id)).await?;
        invalidate(self.cache.as_ref(), CacheKey::AllProducts).await?;

        self.writer.soft_delete_product(id).await?;
        Ok(())
    }

    /// Text search over live documents, read through the query cache. The
    /// empty query lists every live document under its own key namespace.
    pub async fn search(&self, raw_query: &str) -> Result<Vec<ProductDocument>, AppError> {
        let normalized = normalize_query(raw_query);
        let key = CacheKey::for_search(&normalized);
        read_through(self.cache.as_ref(), key, self.ttls.search, || async {
            Ok(self.index.query(&normalized).await?)
        })
        .await
    }

    async fn mirror(&self, record: &ProductRecord) -> Result<(), AppError> {
        let document = ProductDocument::from(record);
        match self.index.upsert(&document, true).await {
            Ok(()) => Ok(()),
            Err(err) => {
                counter!("vetrina_index_mirror_failed_total", "op" => "upsert").increment(1);
                match self.mirror_policy {
                    MirrorPolicy::Strict => Err(err.into()),
                    MirrorPolicy::BestEffort => {
                        warn!(product_id = record.id, error = %err, "index mirror deferred, search will lag");
                        Ok(())
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> ProductInput {
        ProductInput {
            name: "Shoe".into(),
            description: "Running shoe".into(),
            price: 100,
            size: 42,
            stock: 5,
        }
    }

    #[test]
    fn valid_input_passes() {
        assert!(input().validate().is_ok());
    }

    #[test]
    fn negative_price_rejected() {
        let mut bad = input();
        bad.price = -1;
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn zero_size_rejected() {
        let mut bad = input();
        bad.size = 0;
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn negative_stock_rejected() {
        let mut bad = input();
        bad.stock = -3;
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn blank_name_rejected() {
        let mut bad = input();
        bad.name = "   ".into();
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }
}

//! Repository traits describing persistence adapters.
//!
//! Read traits are served by the replica pool, write traits by the primary.
//! Consistency-sensitive reads on the write paths (existence checks before a
//! delete or a promo create) go through the write trait so they see the
//! primary.

use async_trait::async_trait;

use crate::domain::entities::{
    FavoriteRecord, ProductListEntry, ProductRecord, PromoDetail, PromoRecord,
};

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("duplicate record violates unique constraint `{constraint}`")]
    Duplicate { constraint: String },
    #[error("resource not found")]
    NotFound,
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
    #[error("database timeout")]
    Timeout,
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct CreateProductParams {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub size: i32,
    pub stock: i32,
    pub image_url: String,
    pub image_key: String,
}

#[derive(Debug, Clone)]
pub struct UpdateProductParams {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub size: i32,
    pub stock: i32,
    /// Replacement image, when one was uploaded. `None` keeps the current
    /// asset.
    pub image: Option<(String, String)>,
}

#[derive(Debug, Clone)]
pub struct CreatePromoParams {
    pub product_id: i64,
    pub discount: f64,
    pub image_url: String,
    pub image_key: String,
}

#[derive(Debug, Clone)]
pub struct UpdatePromoParams {
    pub id: i64,
    pub discount: f64,
    pub is_active: bool,
    pub image: Option<(String, String)>,
}

/// Outcome of a favorite toggle, reported back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    Added(FavoriteRecord),
    Removed,
}

#[async_trait]
pub trait ProductsRepo: Send + Sync {
    /// Non-deleted products with favorite counts, for listings.
    async fn list_products(&self) -> Result<Vec<ProductListEntry>, RepoError>;

    /// A single non-deleted product, or `None`.
    async fn find_product(&self, id: i64) -> Result<Option<ProductRecord>, RepoError>;

    /// Active promos attached to a product's detail view.
    async fn list_active_promos_for(&self, product_id: i64) -> Result<Vec<PromoRecord>, RepoError>;
}

#[async_trait]
pub trait ProductsWriteRepo: Send + Sync {
    async fn create_product(&self, params: CreateProductParams) -> Result<ProductRecord, RepoError>;

    /// Updates a non-deleted row; `NotFound` when the row is absent or
    /// soft-deleted.
    async fn update_product(&self, params: UpdateProductParams) -> Result<ProductRecord, RepoError>;

    /// Primary-pool read used by write paths that must not race the replica.
    async fn find_product_for_update(&self, id: i64) -> Result<Option<ProductRecord>, RepoError>;

    /// Marks the row deleted. `NotFound` when already deleted or absent; the
    /// transition is one-way.
    async fn soft_delete_product(&self, id: i64) -> Result<(), RepoError>;

    /// Increment-by-one for the visit counter on a live row.
    async fn increment_visits(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait PromosRepo: Send + Sync {
    async fn list_promos(&self) -> Result<Vec<PromoDetail>, RepoError>;

    async fn list_active_promos(&self) -> Result<Vec<PromoDetail>, RepoError>;

    async fn find_promo(&self, id: i64) -> Result<Option<PromoDetail>, RepoError>;
}

#[async_trait]
pub trait PromosWriteRepo: Send + Sync {
    async fn create_promo(&self, params: CreatePromoParams) -> Result<PromoRecord, RepoError>;

    async fn update_promo(&self, params: UpdatePromoParams) -> Result<PromoRecord, RepoError>;

    async fn find_promo_for_update(&self, id: i64) -> Result<Option<PromoRecord>, RepoError>;

    async fn delete_promo(&self, id: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait FavoritesRepo: Send + Sync {
    /// Flip the favorite relation inside one primary-store transaction. The
    /// product existence check and the insert share the transaction so a
    /// concurrent soft-delete cannot slip between them.
    async fn toggle(&self, user_id: i64, product_id: i64) -> Result<ToggleOutcome, RepoError>;

    /// Best-effort check used to decorate product reads.
    async fn exists(&self, user_id: i64, product_id: i64) -> Result<bool, RepoError>;

    async fn count_for_product(&self, product_id: i64) -> Result<i64, RepoError>;

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<FavoriteRecord>, RepoError>;
}

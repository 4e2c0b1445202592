//! Postgres-backed repository implementations.
//!
//! Reads go to the replica pool, writes and consistency-sensitive reads to
//! the primary. When no replica URL is configured both handles point at the
//! same pool.

mod favorites;
mod products;
mod promos;
mod util;

pub use util::map_sqlx_error;

use std::sync::Arc;

use sqlx::postgres::{PgPool, PgPoolOptions};
use time::OffsetDateTime;

use crate::config::DatabaseSettings;
use crate::domain::entities::{FavoriteRecord, ProductRecord, PromoRecord};
use crate::infra::error::InfraError;

#[derive(Clone)]
pub struct PostgresRepositories {
    primary: Arc<PgPool>,
    replica: Arc<PgPool>,
}

impl PostgresRepositories {
    pub fn new(primary: PgPool, replica: PgPool) -> Self {
        Self {
            primary: Arc::new(primary),
            replica: Arc::new(replica),
        }
    }

    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, InfraError> {
        let primary = pool(&settings.primary_url, settings.max_connections).await?;
        let replica = match settings.replica_url.as_deref() {
            Some(url) => pool(url, settings.max_connections).await?,
            None => primary.clone(),
        };
        Ok(Self::new(primary, replica))
    }

    pub fn primary(&self) -> &PgPool {
        &self.primary
    }

    pub fn replica(&self) -> &PgPool {
        &self.replica
    }
}

async fn pool(url: &str, max_connections: u32) -> Result<PgPool, InfraError> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
        .map_err(|err| InfraError::database(err.to_string()))
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub size: i32,
    pub stock: i32,
    pub image_url: String,
    pub image_key: String,
    pub visit_count: i64,
    pub is_deleted: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<ProductRow> for ProductRecord {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            size: row.size,
            stock: row.stock,
            image_url: row.image_url,
            image_key: row.image_key,
            visit_count: row.visit_count,
            is_deleted: row.is_deleted,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct PromoRow {
    pub id: i64,
    pub product_id: i64,
    pub discount: f64,
    pub is_active: bool,
    pub image_url: String,
    pub image_key: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl From<PromoRow> for PromoRecord {
    fn from(row: PromoRow) -> Self {
        Self {
            id: row.id,
            product_id: row.product_id,
            discount: row.discount,
            is_active: row.is_active,
            image_url: row.image_url,
            image_key: row.image_key,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FavoriteRow {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    pub created_at: OffsetDateTime,
}

impl From<FavoriteRow> for FavoriteRecord {
    fn from(row: FavoriteRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            product_id: row.product_id,
            created_at: row.created_at,
        }
    }
}

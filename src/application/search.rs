//! Search index seam.
//!
//! The index holds a denormalized projection of every live product and
//! nothing else: absence of a document for a soft-deleted product is
//! load-bearing. Mirroring is driven from the relational commit point; the
//! index is never read back to make write decisions.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::domain::entities::ProductRecord;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("search backend error: {0}")]
    Backend(String),
}

impl SearchError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Projection of a live product into the index. Internal fields
/// (`is_deleted`, `image_key`) are not mirrored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductDocument {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub size: i32,
    pub stock: i32,
    pub image_url: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<&ProductRecord> for ProductDocument {
    fn from(product: &ProductRecord) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            size: product.size,
            stock: product.stock,
            image_url: product.image_url.clone(),
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Insert or replace the document for a product. With
    /// `visible_immediately` the call does not return until the document is
    /// searchable, so a caller's follow-up query sees its own write.
    async fn upsert(
        &self,
        document: &ProductDocument,
        visible_immediately: bool,
    ) -> Result<(), SearchError>;

    /// Remove a product's document. Call sites on the delete path treat
    /// failures as best-effort.
    async fn remove(&self, id: i64) -> Result<(), SearchError>;

    /// Match live documents against a normalized query; the empty query
    /// returns every document.
    async fn query(&self, text: &str) -> Result<Vec<ProductDocument>, SearchError>;
}

/// Failure policy for index mirroring on the create/update paths.
///
/// `Strict` surfaces index failures to the caller and aborts the write
/// acknowledgement; `BestEffort` logs them and keeps the relational write
/// authoritative, at the cost of a wider search staleness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MirrorPolicy {
    Strict,
    BestEffort,
}

impl Default for MirrorPolicy {
    fn default() -> Self {
        MirrorPolicy::Strict
    }
}

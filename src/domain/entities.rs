//! Domain entities mirrored from persistent storage.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A catalog product. `visit_count` is monotonic; `is_deleted = true` is a
/// terminal state and rows are never physically removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
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
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A product row joined with its favorite count, as served by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListEntry {
    #[serde(flatten)]
    pub product: ProductRecord,
    pub favorites_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoRecord {
    pub id: i64,
    pub product_id: i64,
    /// Discount fraction, constrained to [0, 1].
    pub discount: f64,
    pub is_active: bool,
    pub image_url: String,
    pub image_key: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A promo denormalized with its product, as served by promo reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromoDetail {
    #[serde(flatten)]
    pub promo: PromoRecord,
    pub product: ProductRecord,
}

/// A user/product favorite relation, unique per pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: i64,
    pub user_id: i64,
    pub product_id: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

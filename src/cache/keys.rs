//! Cache key definitions.
//!
//! Every key the service touches is enumerated here so invalidation sites
//! cannot drift from population sites. Empty and non-empty search queries
//! deliberately live in distinct namespaces.

use std::fmt;

/// A typed cache key, rendered to the wire format on demand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Serialized snapshot of a single product.
    Product(i64),
    /// Serialized non-deleted product listing with favorite counts.
    AllProducts,
    /// Serialized promo detail.
    Promo(i64),
    /// Serialized full promo listing.
    AllPromos,
    /// Serialized active-only promo listing.
    ActivePromos,
    /// Search results for the empty query (all live documents).
    SearchAll,
    /// Search results for a normalized, non-empty query.
    Search(String),
    /// Short-TTL visit de-duplication lock for a product.
    VisitLock(i64),
    /// Short-TTL per-user favorite toggle rate limiter.
    FavoriteRateLimit(i64),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Product(id) => write!(f, "product:{id}"),
            CacheKey::AllProducts => write!(f, "all_products"),
            CacheKey::Promo(id) => write!(f, "promo:{id}"),
            CacheKey::AllPromos => write!(f, "all_promos"),
            CacheKey::ActivePromos => write!(f, "active_promos"),
            CacheKey::SearchAll => write!(f, "search:all"),
            CacheKey::Search(query) => write!(f, "search:q:{query}"),
            CacheKey::VisitLock(id) => write!(f, "lock_visit:{id}"),
            CacheKey::FavoriteRateLimit(user_id) => write!(f, "ratelimit:favorite:{user_id}"),
        }
    }
}

impl CacheKey {
    /// Key for a normalized search query; routes the empty query to its own
    /// namespace.
    pub fn for_search(normalized: &str) -> Self {
        if normalized.is_empty() {
            CacheKey::SearchAll
        } else {
            CacheKey::Search(normalized.to_string())
        }
    }

    /// Stable namespace label used for metrics.
    pub fn namespace(&self) -> &'static str {
        match self {
            CacheKey::Product(_) => "product",
            CacheKey::AllProducts => "all_products",
            CacheKey::Promo(_) => "promo",
            CacheKey::AllPromos => "all_promos",
            CacheKey::ActivePromos => "active_promos",
            CacheKey::SearchAll | CacheKey::Search(_) => "search",
            CacheKey::VisitLock(_) => "lock_visit",
            CacheKey::FavoriteRateLimit(_) => "ratelimit_favorite",
        }
    }
}

/// Lowercase and trim a raw search query into its cache/index form.
pub fn normalize_query(raw: &str) -> String {
    raw.trim().to_lowercase()
}

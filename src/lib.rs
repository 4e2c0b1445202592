//! Vetrina is a product catalog backend: Postgres holds the canonical rows,
//! Redis serves cache-aside reads and short-lived locks, and a Meilisearch
//! index mirrors the live products for full-text search. Product images live
//! in an external object store.
//!
//! The layering follows the dependency direction: `domain` knows nothing of
//! storage, `application` defines the service logic against repository and
//! backend traits, and `infra` supplies the Postgres, Redis, Meilisearch and
//! HTTP adapters.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;

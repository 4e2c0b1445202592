//! Infrastructure adapters: Postgres repositories, Redis cache, Meilisearch
//! index, object-store client, HTTP surface and telemetry.

pub mod db;
pub mod error;
pub mod http;
pub mod objectstore;
pub mod redis;
pub mod search;
pub mod telemetry;

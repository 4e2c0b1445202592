//! Application services orchestrating the cache, store, index and object
//! store seams.

pub mod cache_aside;
pub mod catalog;
pub mod error;
pub mod favorites;
pub mod objectstore;
pub mod promos;
pub mod repos;
pub mod search;

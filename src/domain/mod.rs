//! Domain model: entities, caller identity and domain-level errors.

pub mod entities;
pub mod error;
pub mod types;

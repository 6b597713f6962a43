//! Persistence layer: entity records plus the JSON file store.

pub mod json;
pub mod model;

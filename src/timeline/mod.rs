//! Overlay timeline domain: schema, template assembly, quality checks,
//! and version diffing.

pub mod builder;
pub mod diff;
pub mod model;
pub mod quality;

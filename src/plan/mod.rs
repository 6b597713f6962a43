//! Video context extraction and edit-plan assembly.

pub mod context;
pub mod planner;

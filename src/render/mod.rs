//! Filter-graph compilation and ffmpeg execution.

pub mod engine;
pub mod graph;

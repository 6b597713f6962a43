//! Asynchronous job execution: the worker-pool queue and the pipeline
//! flows it runs.

pub mod orchestrator;
pub mod queue;

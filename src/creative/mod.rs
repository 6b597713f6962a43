//! Ad copy generation and overlay editing, local or model-backed.

pub mod editor;
pub mod gemini;
pub mod local;
pub mod provider;

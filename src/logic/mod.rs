//! Alert pipeline logic
//!
//! The orchestration core: classification gateway, incident decision,
//! tool-augmented generation, assembly, notification. No HTTP-surface types
//! here; handlers sit on top.

pub mod classifier;
pub mod data_uri;
pub mod decision;
pub mod generation;
pub mod notify;
pub mod pipeline;

//! Storage Layer
//!
//! In-memory repository implementing every store boundary of the pipeline:
//! snapshot history, alerts, forecasts, and the location directory.

mod repository;

pub use repository::{Repository, StorageConfig};

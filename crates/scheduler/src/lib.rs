//! Cycle Orchestrator
//!
//! Runs alert evaluation, daily forecasting and forecast retention over every
//! active monitoring location, with an explicit start/stop lifecycle.

mod scheduler;

pub use scheduler::{Cycle, CycleReport, Orchestrator, SchedulerConfig, SchedulerError};

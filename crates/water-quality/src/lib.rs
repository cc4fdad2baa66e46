//! Water Quality Vocabulary
//!
//! Shared types for the monitoring pipeline: measured parameters, immutable
//! snapshots, monitored locations, input validation, and an injectable clock.

mod clock;
mod error;
mod location;
mod parameter;
mod snapshot;
mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StoreError, ValidationError};
pub use location::{Location, LocationDirectory};
pub use parameter::{Direction, Parameter};
pub use snapshot::{SiteConditions, Snapshot};
pub use validation::{ValidationConfig, Validator};

//! Monitored Locations

use crate::StoreError;
use serde::{Deserialize, Serialize};

/// A monitoring site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Location {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: true,
        }
    }
}

/// Source of the locations scheduled for evaluation and forecasting
pub trait LocationDirectory: Send + Sync {
    fn active_locations(&self) -> Result<Vec<Location>, StoreError>;
}

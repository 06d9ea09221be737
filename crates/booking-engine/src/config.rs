//! Engine limits.

use serde::{Deserialize, Serialize};

use crate::recurrence::{DEFAULT_HORIZON_MONTHS, MAX_OCCURRENCES};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Most occurrences a single recurring request may produce.
    pub max_occurrences: usize,
    /// Series length, in calendar months, when a rule has no end date.
    pub default_horizon_months: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_occurrences: MAX_OCCURRENCES,
            default_horizon_months: DEFAULT_HORIZON_MONTHS,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

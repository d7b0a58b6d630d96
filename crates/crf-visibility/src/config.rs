//! Engine configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VisibilityError};

/// Placeholder logged instead of field values unless value logging is enabled.
pub const REDACTED_VALUE: &str = "[REDACTED]";

/// Options of one form view.
///
/// Every key is optional in the TOML representation:
///
/// ```toml
/// max_cascade_events = 500
/// disabled = true
/// log_values = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Upper bound of events delivered by one inbound operation.
    pub max_cascade_events: usize,
    /// Renders every field of the view as disabled.
    pub disabled: bool,
    /// Allows field values (patient data) in log output.
    pub log_values: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_cascade_events: 10_000,
            disabled: false,
            log_values: false,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(input: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(input)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| VisibilityError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents).map_err(|source| VisibilityError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    #[must_use]
    pub fn with_max_cascade_events(mut self, limit: usize) -> Self {
        self.max_cascade_events = limit;
        self
    }

    #[must_use]
    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    #[must_use]
    pub fn with_log_values(mut self, enable: bool) -> Self {
        self.log_values = enable;
        self
    }

    /// Returns the value when value logging is enabled, otherwise a redacted token.
    pub fn loggable<'a>(&self, value: Option<&'a str>) -> &'a str {
        match value {
            Some(value) if self.log_values => value,
            Some(_) => REDACTED_VALUE,
            None => "<empty>",
        }
    }
}

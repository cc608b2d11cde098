//! Interpreter configuration.

use serde::{Deserialize, Serialize};

/// Settings fixed when an [`Interpreter`](crate::Interpreter) is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Validate AS_STRIDED layouts against their source before building
    /// the view. Enabled by default in debug builds.
    pub check_views: bool,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            check_views: cfg!(debug_assertions),
        }
    }
}

impl InterpreterConfig {
    /// Parse a JSON config; missing fields keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn with_check_views(mut self, check_views: bool) -> Self {
        self.check_views = check_views;
        self
    }
}

//! Configuration types for the dependency engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default slack tolerance for the critical path, in days.
///
/// Absorbs a weekend between a Friday finish and a Monday start.
pub const DEFAULT_TOLERANCE_DAYS: i64 = 3;

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("tolerance_days must be >= 0, got {0}")]
    NegativeTolerance(i64),
}

/// Configuration for the critical path analyzer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CriticalPathConfig {
    /// A task is critical when its float is at most this many days.
    pub tolerance_days: i64,
}

impl Default for CriticalPathConfig {
    fn default() -> Self {
        Self {
            tolerance_days: DEFAULT_TOLERANCE_DAYS,
        }
    }
}

impl CriticalPathConfig {
    pub fn with_tolerance(tolerance_days: i64) -> Self {
        Self { tolerance_days }
    }
}

/// Configuration for the cascade scheduler.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeConfig {
    /// Prepend the root task's own update to the result.
    pub include_root: bool,
}

/// Top-level engine configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Verbosity level: 0=silent, 1=changes, 2=checks, 3=debug.
    pub verbosity: u8,
    pub critical_path: CriticalPathConfig,
    pub cascade: CascadeConfig,
}

impl EngineConfig {
    /// Parse and validate a (possibly partial) JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.critical_path.tolerance_days < 0 {
            return Err(ConfigError::NegativeTolerance(
                self.critical_path.tolerance_days,
            ));
        }
        Ok(())
    }
}

//! Engine configuration.
//!
//! Defaults suit a test suite; override through
//! [`EngineBuilder`](crate::EngineBuilder) or load from JSON:
//!
//! ```
//! use mockwire::{EngineConfig, UnhandledPolicy};
//!
//! let config = EngineConfig::from_json(r#"{ "on_unhandled": "error" }"#).unwrap();
//! assert_eq!(config.on_unhandled, UnhandledPolicy::Error);
//! assert_eq!(config.max_concurrent_resolutions, 256);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{MockError, Result};

/// Default maximum concurrent resolutions in the dispatcher.
pub const DEFAULT_MAX_CONCURRENT_RESOLUTIONS: usize = 256;

/// Default lifecycle event buffer.
pub const DEFAULT_EVENT_CAPACITY: usize = 128;

/// What to do with a request no handler answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnhandledPolicy {
    /// Forward silently.
    Bypass,
    /// Forward and log a warning.
    #[default]
    Warn,
    /// Log an error and reject the request.
    Error,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Policy for unhandled requests.
    pub on_unhandled: UnhandledPolicy,
    /// Resolutions the dispatcher runs at once.
    pub max_concurrent_resolutions: usize,
    /// Lifecycle events buffered per subscriber.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            on_unhandled: UnhandledPolicy::default(),
            max_concurrent_resolutions: DEFAULT_MAX_CONCURRENT_RESOLUTIONS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_resolutions == 0
            || u32::try_from(self.max_concurrent_resolutions).is_err()
        {
            return Err(MockError::Config(format!(
                "max_concurrent_resolutions must be between 1 and {}, got {}",
                u32::MAX,
                self.max_concurrent_resolutions
            )));
        }
        if self.event_capacity == 0 {
            return Err(MockError::Config(
                "event_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

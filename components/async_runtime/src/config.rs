//! Runtime configuration.

use crate::error::RuntimeError;
use serde::{Deserialize, Serialize};

/// Default bound of the cross-thread host inbox.
pub const DEFAULT_HOST_INBOX_CAPACITY: usize = 256;

/// Configuration for a [`Realm`](crate::Realm) and its event loop.
///
/// # Examples
///
/// ```
/// use async_runtime::RuntimeConfig;
///
/// let config = RuntimeConfig::default().with_job_budget(1_000);
/// let json = config.to_json().unwrap();
/// assert_eq!(RuntimeConfig::from_json(&json).unwrap(), config);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Upper bound on jobs executed by a single drain; `None` drains to completion.
    pub job_budget: Option<usize>,
    /// Whether the host rejection tracker is notified.
    pub track_rejections: bool,
    /// Capacity of the host inbox channel.
    pub host_inbox_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            job_budget: None,
            track_rejections: true,
            host_inbox_capacity: DEFAULT_HOST_INBOX_CAPACITY,
        }
    }
}

impl RuntimeConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of jobs run per drain.
    pub fn with_job_budget(mut self, budget: usize) -> Self {
        self.job_budget = Some(budget);
        self
    }

    /// Disables the rejection tracker hook.
    pub fn without_rejection_tracking(mut self) -> Self {
        self.track_rejections = false;
        self
    }

    /// Sets the host inbox capacity.
    pub fn with_host_inbox_capacity(mut self, capacity: usize) -> Self {
        self.host_inbox_capacity = capacity;
        self
    }

    /// Checks the configuration for values the runtime cannot honour.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        if self.job_budget == Some(0) {
            return Err(RuntimeError::InvalidConfig(
                "job_budget must be at least 1".to_string(),
            ));
        }
        if self.host_inbox_capacity == 0 {
            return Err(RuntimeError::InvalidConfig(
                "host_inbox_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Parses and validates a configuration from JSON. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, RuntimeError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, RuntimeError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

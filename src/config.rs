//! Execution configuration.
//!
//! Scheduler sizing and marker namespacing for one run. Everything here is a
//! plain construction-time parameter; policies live in `PolicySet`.

use std::num::NonZeroUsize;

use serde::{Deserialize, Serialize};

use crate::keys::PropertyKeys;
use crate::{Error, Result};

/// Configuration for one `Execution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Units running concurrently. Defaults to available parallelism.
    pub parallel_tasks: usize,
    /// Outstanding completions not yet collected by the drain.
    pub max_pending: usize,
    /// Marker prefix. `None` picks a random one per run.
    pub property_prefix: Option<String>,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        let parallel_tasks = std::thread::available_parallelism()
            .map(NonZeroUsize::get)
            .unwrap_or(1);
        Self {
            parallel_tasks,
            max_pending: parallel_tasks * 4,
            property_prefix: None,
        }
    }
}

impl ExecutionConfig {
    /// Parse from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: ExecutionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.parallel_tasks == 0 {
            return Err(Error::InvalidConfig("parallel_tasks must be > 0".into()));
        }
        if self.max_pending < self.parallel_tasks {
            return Err(Error::InvalidConfig(format!(
                "max_pending ({}) must be >= parallel_tasks ({})",
                self.max_pending, self.parallel_tasks
            )));
        }
        if let Some(prefix) = &self.property_prefix {
            if prefix.is_empty() {
                return Err(Error::InvalidConfig("property_prefix must not be empty".into()));
            }
        }
        Ok(())
    }

    /// Marker keys for this configuration.
    pub fn property_keys(&self) -> PropertyKeys {
        match &self.property_prefix {
            Some(prefix) => PropertyKeys::new(prefix.clone()),
            None => PropertyKeys::random(),
        }
    }
}

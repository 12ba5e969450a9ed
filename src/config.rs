use std::time::Duration;

use crate::error::{Error, Result};

/// Upper bound on definitions returned by one federated moniker lookup.
pub const DEFINITION_MONIKER_LIMIT: usize = 100;

/// Peer bundles queried per reference page during the remote phase.
pub const REMOTE_BUNDLE_LIMIT: usize = 20;

/// Requests slower than this are logged at `warn`.
pub const SLOW_REQUEST_THRESHOLD_MS: u64 = 1000;

/// Budgets and thresholds for a [`crate::ide::QueryResolver`].
///
/// Missing fields take their defaults, so an empty JSON object is a valid
/// configuration.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Maximum definitions taken from an exporting bundle's moniker table.
    pub definition_moniker_limit: usize,
    /// Maximum peer bundles queried per reference page.
    pub remote_bundle_limit: usize,
    /// Elapsed time after which an operation is reported as slow.
    pub slow_request_threshold_ms: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            definition_moniker_limit: DEFINITION_MONIKER_LIMIT,
            remote_bundle_limit: REMOTE_BUNDLE_LIMIT,
            slow_request_threshold_ms: SLOW_REQUEST_THRESHOLD_MS,
        }
    }
}

impl ResolverConfig {
    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if the JSON is malformed or a budget is zero.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::InvalidConfig {
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject budgets that would stop federated lookups from making progress.
    pub fn validate(&self) -> Result<()> {
        if self.definition_moniker_limit == 0 {
            return Err(Error::InvalidConfig {
                reason: "definition_moniker_limit must be at least 1".to_string(),
            });
        }
        if self.remote_bundle_limit == 0 {
            return Err(Error::InvalidConfig {
                reason: "remote_bundle_limit must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn slow_request_threshold(&self) -> Duration {
        Duration::from_millis(self.slow_request_threshold_ms)
    }
}

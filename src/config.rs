//! Configuration types for fetch-fanout

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::time::Duration;

/// Default per-request timeout for the HTTP transport
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Order in which successful records are reported
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Fastest fetch first; equal durations keep submission order
    #[default]
    Elapsed,
    /// Same order as the input resource list
    Submission,
}

/// Batch fetch configuration
///
/// Every field has a default, so `FetchConfig::default()` (or an empty JSON
/// object) gives the plain behavior: one task per resource, no concurrency
/// cap, results sorted by elapsed time.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds (default: 30, `null` = no timeout)
    ///
    /// This bounds a single transport request. An expired request becomes a
    /// failed outcome for that resource; the batch itself is never cancelled.
    #[serde(default = "default_request_timeout", with = "optional_duration_serde")]
    pub request_timeout: Option<Duration>,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum number of fetches in flight at once (default: unlimited)
    ///
    /// Every resource still gets its own task at submission time; tasks beyond
    /// the limit wait for a permit before opening their resource.
    #[serde(default)]
    pub max_concurrent_fetches: Option<usize>,

    /// Ordering of the aggregated results
    #[serde(default)]
    pub sort: SortOrder,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
            max_concurrent_fetches: None,
            sort: SortOrder::default(),
        }
    }
}

impl FetchConfig {
    /// Parse a configuration from JSON, filling in defaults for missing fields
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: FetchConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Cap on in-flight fetches, `None` when unbounded
    ///
    /// A zero cap is rejected by [`validate`](Self::validate) and reads as `None` here.
    pub fn concurrency_limit(&self) -> Option<NonZeroUsize> {
        self.max_concurrent_fetches.and_then(NonZeroUsize::new)
    }

    /// Check the configuration for values that can never work
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_fetches == Some(0) {
            return Err(Error::config(
                "max_concurrent_fetches",
                "must be greater than zero when set",
            ));
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(Error::config(
                "request_timeout",
                "must be greater than zero when set",
            ));
        }

        if self.user_agent.trim().is_empty() {
            return Err(Error::config("user_agent", "must not be empty"));
        }

        Ok(())
    }
}

fn default_request_timeout() -> Option<Duration> {
    Some(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
}

fn default_user_agent() -> String {
    format!("fetch-fanout/{}", env!("CARGO_PKG_VERSION"))
}

// Optional Duration serialization helper (whole seconds)
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

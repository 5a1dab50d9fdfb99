//! Error types for fetch-fanout
//!
//! Two layers of errors live here:
//! - [`Error`] covers everything that happens at the batch boundary
//!   (configuration, resource validation, client construction, reporting).
//! - [`FetchError`] is the cause carried by a failed [`Outcome`](crate::Outcome).
//!   It never aborts a batch; it only marks one task as failed.

use thiserror::Error;

/// Result type alias for fetch-fanout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for fetch-fanout
///
/// None of these variants are produced by an individual fetch. They describe
/// problems that prevent a batch from being started or reported.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_fetches")
        key: Option<String>,
    },

    /// A resource identifier was rejected before dispatch
    #[error("invalid resource '{input}': {reason}")]
    InvalidResource {
        /// The raw identifier as supplied by the caller
        input: String,
        /// Why the identifier was rejected
        reason: String,
    },

    /// HTTP client construction failed
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// I/O error (writing a report)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Shorthand for an [`Error::Config`] naming the offending key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Broad classification of a failed fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The resource could not be opened
    Connect,
    /// The resource was opened but reading its content failed
    Read,
    /// The task running the fetch never delivered a result
    Task,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FailureKind::Connect => "connect",
            FailureKind::Read => "read",
            FailureKind::Task => "task",
        };
        f.write_str(name)
    }
}

/// Cause of a single failed fetch
///
/// Every variant names the resource it belongs to, so a failure can be logged
/// on its own after it has been separated from its task.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Opening the resource failed (DNS, connection, protocol or HTTP status)
    #[error("failed to open {resource}: {reason}")]
    Connect {
        /// The resource that could not be opened
        resource: String,
        /// The underlying cause
        reason: String,
    },

    /// Reading the opened resource failed partway
    #[error("failed to read {resource}: {reason}")]
    Read {
        /// The resource whose content could not be read
        resource: String,
        /// The underlying cause
        reason: String,
    },

    /// The concurrent task was interrupted, aborted or panicked
    #[error("task for {resource} did not complete: {reason}")]
    Task {
        /// The resource the task was fetching
        resource: String,
        /// The underlying cause
        reason: String,
    },
}

impl FetchError {
    /// Create a [`FetchError::Connect`]
    pub fn connect(resource: impl ToString, reason: impl ToString) -> Self {
        Self::Connect {
            resource: resource.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a [`FetchError::Read`]
    pub fn read(resource: impl ToString, reason: impl ToString) -> Self {
        Self::Read {
            resource: resource.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a [`FetchError::Task`]
    pub fn task(resource: impl ToString, reason: impl ToString) -> Self {
        Self::Task {
            resource: resource.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Which stage of the fetch failed
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Connect { .. } => FailureKind::Connect,
            FetchError::Read { .. } => FailureKind::Read,
            FetchError::Task { .. } => FailureKind::Task,
        }
    }

    /// The resource this failure belongs to
    pub fn resource(&self) -> &str {
        match self {
            FetchError::Connect { resource, .. }
            | FetchError::Read { resource, .. }
            | FetchError::Task { resource, .. } => resource,
        }
    }

    /// The underlying cause without the resource prefix
    pub fn reason(&self) -> &str {
        match self {
            FetchError::Connect { reason, .. }
            | FetchError::Read { reason, .. }
            | FetchError::Task { reason, .. } => reason,
        }
    }
}

//! # fetch-fanout
//!
//! Concurrent fan-out fetching of remote resources with per-resource failure
//! isolation.
//!
//! ## Design Philosophy
//!
//! fetch-fanout is designed to be:
//! - **Isolating** - One failing resource never aborts or corrupts the batch
//! - **Ordered** - Results come back fastest first, ties in submission order
//! - **Complete** - Every dispatched task is awaited; nothing is cancelled early
//! - **Library-first** - Reporting is left to the caller
//!
//! ## Pipeline
//!
//! - [`Dispatcher`] spawns one tokio task per [`Resource`] and hands back a [`TaskHandle`] each
//! - [`join`] waits for all handles and yields one [`Outcome`] per task, in submission order
//! - [`aggregate`] logs and drops failures, then sorts successes by elapsed time
//! - [`FanOut`] runs the three steps as a single batch
//!
//! ## Quick Start
//!
//! ```no_run
//! use fetch_fanout::{FanOut, FetchConfig, ResourceList, report};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Malformed URLs are rejected here, before anything is fetched
//!     let resources = ResourceList::parse([
//!         "https://www.rust-lang.org",
//!         "https://crates.io",
//!         "https://docs.rs",
//!     ])?;
//!
//!     let fan_out = FanOut::new(FetchConfig::default())?;
//!     let records = fan_out.retrieve(&resources).await;
//!
//!     report::write_report(&mut std::io::stdout(), &records)?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Outcome partitioning and ordering
pub mod aggregator;
/// Batch orchestration
pub mod batch;
/// Configuration types
pub mod config;
/// Task submission
pub mod dispatcher;
/// Error types
pub mod error;
/// Single-resource fetching and transports
pub mod fetcher;
/// Task joining
pub mod joiner;
/// Tagged success/failure outcome
pub mod outcome;
/// Result rendering
pub mod report;
/// Core types
pub mod types;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use aggregator::{Aggregate, Summary, aggregate, aggregate_with};
pub use batch::{BatchReport, FanOut, retrieve_urls};
pub use config::{FetchConfig, SortOrder};
pub use dispatcher::{Dispatcher, TaskHandle};
pub use error::{Error, FailureKind, FetchError, Result};
pub use fetcher::{Fetcher, HttpTransport, ResourceStream, Transport};
pub use joiner::join;
pub use outcome::Outcome;
pub use types::{FetchRecord, Resource, ResourceList, TaskId, TaskState};

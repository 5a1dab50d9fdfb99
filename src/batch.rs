//! Batch orchestration: dispatch, join and aggregate in one call

use std::sync::Arc;
use tokio::time::Instant;

use crate::aggregator::{self, Summary};
use crate::config::FetchConfig;
use crate::dispatcher::Dispatcher;
use crate::error::{FetchError, Result};
use crate::fetcher::{Fetcher, HttpTransport, Transport};
use crate::joiner;
use crate::types::{FetchRecord, ResourceList};

/// Everything a batch produced
#[derive(Clone, Debug)]
pub struct BatchReport {
    /// Successful records in the configured order
    pub records: Vec<FetchRecord>,
    /// Failures, in submission order
    pub failures: Vec<FetchError>,
    /// Counts and totals
    pub summary: Summary,
    /// Wall-clock milliseconds from dispatch to the last task finishing
    pub wall_clock_ms: u64,
}

/// Concurrent fan-out fetcher
///
/// Each call to [`retrieve`](Self::retrieve) is self-contained: it spawns one
/// task per resource, waits for all of them, and returns only the successes.
/// No state is shared between batches.
///
/// # Examples
///
/// ```no_run
/// use fetch_fanout::{FanOut, FetchConfig, ResourceList};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fan_out = FanOut::new(FetchConfig::default())?;
/// let resources = ResourceList::parse(["https://www.rust-lang.org", "https://crates.io"])?;
///
/// for record in fan_out.retrieve(&resources).await {
///     println!("{} took {}ms", record.resource(), record.elapsed_ms());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct FanOut {
    config: FetchConfig,
    dispatcher: Dispatcher,
}

impl FanOut {
    /// Create a fan-out fetcher using HTTP
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: FetchConfig) -> Result<Self> {
        config.validate()?;
        let transport = HttpTransport::new(&config)?;
        Self::with_transport(config, Arc::new(transport))
    }

    /// Create a fan-out fetcher over any transport
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_transport(config: FetchConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(Fetcher::new(transport));
        let dispatcher = Dispatcher::with_limit(fetcher, config.concurrency_limit());
        Ok(Self { config, dispatcher })
    }

    /// Active configuration
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch every resource and return the successful records
    ///
    /// Returns once every task has finished. Failures are logged and left out;
    /// an empty result is a normal outcome when nothing succeeded.
    pub async fn retrieve(&self, resources: &ResourceList) -> Vec<FetchRecord> {
        self.retrieve_report(resources).await.records
    }

    /// Fetch every resource and return records, failures and a summary
    pub async fn retrieve_report(&self, resources: &ResourceList) -> BatchReport {
        let start = Instant::now();

        let handles = self.dispatcher.dispatch(resources);
        let outcomes = joiner::join(handles).await;
        let wall_clock_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        let aggregate = aggregator::aggregate_with(outcomes, self.config.sort);
        let summary = aggregate.summary();

        tracing::info!(
            submitted = summary.submitted,
            succeeded = summary.succeeded,
            failed = summary.failed,
            wall_clock_ms,
            "batch complete"
        );

        BatchReport {
            records: aggregate.records,
            failures: aggregate.failures,
            summary,
            wall_clock_ms,
        }
    }
}

/// Validate raw URLs and fetch them over HTTP
///
/// Malformed identifiers are rejected before anything is dispatched.
///
/// # Errors
///
/// Returns [`Error::InvalidResource`](crate::Error::InvalidResource) for the
/// first malformed URL, or a configuration/client error. Failed fetches are
/// not errors.
pub async fn retrieve_urls<S: AsRef<str>>(
    urls: &[S],
    config: FetchConfig,
) -> Result<Vec<FetchRecord>> {
    let resources = ResourceList::parse(urls)?;
    let fan_out = FanOut::new(config)?;
    Ok(fan_out.retrieve(&resources).await)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SortOrder;
    use crate::error::{Error, FailureKind};
    use crate::test_helpers::{CapturedLogs, StubBehavior, StubTransport};
    use std::time::Duration;

    fn fan_out(stub: StubTransport) -> FanOut {
        FanOut::with_transport(FetchConfig::default(), Arc::new(stub)).unwrap()
    }

    fn urls(records: &[FetchRecord]) -> Vec<&str> {
        records.iter().map(|r| r.resource().as_str()).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_before_slow_and_failure_dropped() {
        let fan_out = fan_out(
            StubTransport::new()
                .with("https://a.test/", StubBehavior::ok(b"aaaa", 50))
                .with("https://b.test/", StubBehavior::ok(b"bb", 10))
                .with("https://c.test/", StubBehavior::ConnectError),
        );
        let resources =
            ResourceList::parse(["https://a.test/", "https://b.test/", "https://c.test/"]).unwrap();

        let report = fan_out.retrieve_report(&resources).await;

        assert_eq!(urls(&report.records), vec!["https://b.test/", "https://a.test/"]);
        assert!((10..15).contains(&report.records[0].elapsed_ms()));
        assert!((50..55).contains(&report.records[1].elapsed_ms()));
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].resource(), "https://c.test/");
        assert_eq!(report.failures[0].kind(), FailureKind::Connect);

        // Concurrent: bounded by the slowest fetch, not the sum
        assert!(report.wall_clock_ms >= 50);
        assert!(report.wall_clock_ms < 60, "took {}ms", report.wall_clock_ms);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wall_clock_tracks_max_latency() {
        let mut stub = StubTransport::new();
        let mut inputs = Vec::new();
        for i in 1..=10u64 {
            let url = format!("https://host{i}.test/");
            stub = stub.with(&url, StubBehavior::ok(b"x", i * 20));
            inputs.push(url);
        }
        let fan_out = fan_out(stub);
        let resources = ResourceList::parse(&inputs).unwrap();

        let start = tokio::time::Instant::now();
        let records = fan_out.retrieve(&resources).await;
        let elapsed = start.elapsed();

        assert_eq!(records.len(), 10);
        // Sum of latencies is 1100ms; max is 200ms
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_millis(300), "took {elapsed:?}");
    }

    #[tokio::test]
    async fn test_empty_input_returns_empty() {
        let stub = Arc::new(StubTransport::new());
        let fan_out = FanOut::with_transport(FetchConfig::default(), stub.clone()).unwrap();

        let report = fan_out.retrieve_report(&ResourceList::default()).await;
        assert!(report.records.is_empty());
        assert!(report.failures.is_empty());
        assert_eq!(report.summary.submitted, 0);
        assert_eq!(stub.opened(), 0);
    }

    #[tokio::test]
    async fn test_all_failed_returns_empty_with_every_failure() {
        let fan_out = fan_out(
            StubTransport::new()
                .with("https://reset.test/", StubBehavior::ReadError { delay_ms: 0 })
                .with("https://boom.test/", StubBehavior::Panic),
        );
        let resources = ResourceList::parse([
            "https://refused.test/",
            "https://reset.test/",
            "https://boom.test/",
        ])
        .unwrap();

        let report = fan_out.retrieve_report(&resources).await;
        assert!(report.records.is_empty());
        let failed: Vec<_> = report.failures.iter().map(|f| f.resource()).collect();
        assert_eq!(
            failed,
            vec!["https://refused.test/", "https://reset.test/", "https://boom.test/"]
        );
        assert_eq!(report.summary.connect_failures, 1);
        assert_eq!(report.summary.read_failures, 1);
        assert_eq!(report.summary.task_failures, 1);
    }

    #[tokio::test]
    async fn test_all_failed_batch_logs_each_resource() {
        let logs = CapturedLogs::default();
        let _guard = tracing::subscriber::set_default(logs.subscriber());

        let fan_out = fan_out(
            StubTransport::new()
                .with("https://reset.test/", StubBehavior::ReadError { delay_ms: 0 })
                .with("https://boom.test/", StubBehavior::Panic),
        );
        let urls = ["https://refused.test/", "https://reset.test/", "https://boom.test/"];
        let records = fan_out.retrieve(&ResourceList::parse(urls).unwrap()).await;
        assert!(records.is_empty());

        assert_eq!(logs.matching(&["WARN", "failed: "]).len(), urls.len());
        for url in urls {
            assert_eq!(logs.matching(&["WARN", "failed: ", url]).len(), 1, "{url}");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_one_failure_does_not_disturb_others() {
        let fan_out = fan_out(
            StubTransport::new()
                .with("https://a.test/", StubBehavior::ok(b"alpha", 5))
                .with("https://b.test/", StubBehavior::Panic)
                .with("https://c.test/", StubBehavior::ok(b"gamma", 15)),
        );
        let resources =
            ResourceList::parse(["https://a.test/", "https://b.test/", "https://c.test/"]).unwrap();

        let records = fan_out.retrieve(&resources).await;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].payload(), b"alpha");
        assert_eq!(records[1].payload(), b"gamma");
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_sort_order() {
        let config = FetchConfig {
            sort: SortOrder::Submission,
            ..Default::default()
        };
        let stub = StubTransport::new()
            .with("https://slow.test/", StubBehavior::ok(b"", 40))
            .with("https://fast.test/", StubBehavior::ok(b"", 1));
        let fan_out = FanOut::with_transport(config, Arc::new(stub)).unwrap();
        let resources = ResourceList::parse(["https://slow.test/", "https://fast.test/"]).unwrap();

        let records = fan_out.retrieve(&resources).await;
        assert_eq!(urls(&records), vec!["https://slow.test/", "https://fast.test/"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bounded_batch_still_returns_everything() {
        let config = FetchConfig {
            max_concurrent_fetches: Some(1),
            ..Default::default()
        };
        let stub = Arc::new(
            StubTransport::new()
                .with("https://a.test/", StubBehavior::ok(b"a", 10))
                .with("https://b.test/", StubBehavior::ok(b"b", 10))
                .with("https://c.test/", StubBehavior::ok(b"c", 10)),
        );
        let fan_out = FanOut::with_transport(config, stub.clone()).unwrap();
        let resources =
            ResourceList::parse(["https://a.test/", "https://b.test/", "https://c.test/"]).unwrap();

        let report = fan_out.retrieve_report(&resources).await;
        assert_eq!(report.records.len(), 3);
        assert_eq!(stub.peak_concurrent_reads(), 1);
        assert!(report.wall_clock_ms >= 30);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = FetchConfig {
            max_concurrent_fetches: Some(0),
            ..Default::default()
        };
        let err = FanOut::with_transport(config, Arc::new(StubTransport::new())).unwrap_err();
        match err {
            Error::Config { key, .. } => assert_eq!(key.as_deref(), Some("max_concurrent_fetches")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_retrieve_urls_rejects_malformed_before_dispatch() {
        let err = retrieve_urls(&["https://ok.test/", "::not a url::"], FetchConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidResource { .. }));
    }
}

//! Partitioning, ordering and summarizing batch outcomes

use serde::Serialize;

use crate::config::SortOrder;
use crate::error::{FailureKind, FetchError};
use crate::outcome::Outcome;
use crate::types::FetchRecord;

/// Successful records and the failures that were separated out
#[derive(Clone, Debug, Default)]
pub struct Aggregate {
    /// Successful fetches, in the requested order
    pub records: Vec<FetchRecord>,
    /// Failed fetches, in submission order
    pub failures: Vec<FetchError>,
}

impl Aggregate {
    /// Counts and totals over this aggregate
    pub fn summary(&self) -> Summary {
        let total_bytes: u64 = self
            .records
            .iter()
            .map(|r| r.payload().len() as u64)
            .sum();

        let count_kind =
            |kind: FailureKind| self.failures.iter().filter(|f| f.kind() == kind).count();

        Summary {
            submitted: self.records.len() + self.failures.len(),
            succeeded: self.records.len(),
            failed: self.failures.len(),
            connect_failures: count_kind(FailureKind::Connect),
            read_failures: count_kind(FailureKind::Read),
            task_failures: count_kind(FailureKind::Task),
            total_bytes,
            fastest_ms: self.records.iter().map(FetchRecord::elapsed_ms).min(),
            slowest_ms: self.records.iter().map(FetchRecord::elapsed_ms).max(),
        }
    }
}

/// Batch statistics
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Number of outcomes aggregated
    pub submitted: usize,
    /// Number of successful fetches
    pub succeeded: usize,
    /// Number of failed fetches
    pub failed: usize,
    /// Failures opening a resource
    pub connect_failures: usize,
    /// Failures reading an opened resource
    pub read_failures: usize,
    /// Tasks that never delivered a result
    pub task_failures: usize,
    /// Sum of all successful payload sizes
    pub total_bytes: u64,
    /// Shortest successful read, if any
    pub fastest_ms: Option<u64>,
    /// Longest successful read, if any
    pub slowest_ms: Option<u64>,
}

/// Drop and log failures, returning successes ordered by elapsed time
///
/// Records with equal elapsed time keep their submission order.
pub fn aggregate(outcomes: Vec<Outcome<FetchRecord>>) -> Vec<FetchRecord> {
    aggregate_with(outcomes, SortOrder::Elapsed).records
}

/// Partition outcomes and order the successes
///
/// Every failure is logged with its resource and message.
pub fn aggregate_with(outcomes: Vec<Outcome<FetchRecord>>, order: SortOrder) -> Aggregate {
    let mut aggregate = Aggregate::default();

    for outcome in outcomes {
        match outcome {
            Outcome::Success(record) => aggregate.records.push(record),
            Outcome::Failure(err) => {
                tracing::warn!(
                    resource = err.resource(),
                    kind = %err.kind(),
                    error = err.reason(),
                    "failed: {}",
                    err
                );
                aggregate.failures.push(err);
            }
        }
    }

    match order {
        // sort_by_key is stable, so ties keep submission order
        SortOrder::Elapsed => aggregate.records.sort_by_key(FetchRecord::elapsed_ms),
        SortOrder::Submission => {}
    }

    aggregate
}

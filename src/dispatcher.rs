//! Task submission: one concurrent fetch task per resource

use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::error::FetchError;
use crate::fetcher::Fetcher;
use crate::outcome::Outcome;
use crate::types::{FetchRecord, Resource, ResourceList, TaskId, TaskState};

/// Shared, lock-free view of a task's lifecycle state
#[derive(Clone, Debug)]
pub(crate) struct StateCell(Arc<AtomicU8>);

impl StateCell {
    fn new() -> Self {
        Self(Arc::new(AtomicU8::new(TaskState::Submitted.to_u8())))
    }

    pub(crate) fn get(&self) -> TaskState {
        TaskState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Move to `next` unless the task already reached a terminal state
    pub(crate) fn advance(&self, next: TaskState) {
        let _ = self
            .0
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                if TaskState::from_u8(current).is_terminal() {
                    None
                } else {
                    Some(next.to_u8())
                }
            });
    }
}

/// Handle to an in-flight fetch, consumed exactly once by [`join`](crate::join)
#[must_use = "dropping a TaskHandle loses the fetch outcome"]
#[derive(Debug)]
pub struct TaskHandle {
    pub(crate) id: TaskId,
    pub(crate) resource: Resource,
    pub(crate) state: StateCell,
    pub(crate) join_handle: JoinHandle<Outcome<FetchRecord>>,
}

impl TaskHandle {
    /// Position of this task in the submitted list
    pub fn id(&self) -> TaskId {
        self.id
    }

    /// Resource this task is fetching
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// Current lifecycle state
    pub fn state(&self) -> TaskState {
        self.state.get()
    }

    /// Whether the underlying task has stopped running
    pub fn is_finished(&self) -> bool {
        self.join_handle.is_finished()
    }
}

/// Spawns fetch tasks onto the tokio runtime
#[derive(Clone, Debug)]
pub struct Dispatcher {
    fetcher: Arc<Fetcher>,
    max_concurrent: Option<NonZeroUsize>,
    limit: Option<Arc<Semaphore>>,
}

impl Dispatcher {
    /// Create a dispatcher with no cap on concurrent fetches
    pub fn new(fetcher: Arc<Fetcher>) -> Self {
        Self {
            fetcher,
            max_concurrent: None,
            limit: None,
        }
    }

    /// Create a dispatcher allowing at most `max_concurrent` fetches in flight
    ///
    /// `None` means no cap.
    pub fn with_limit(fetcher: Arc<Fetcher>, max_concurrent: Option<NonZeroUsize>) -> Self {
        Self {
            fetcher,
            max_concurrent,
            limit: max_concurrent.map(|n| Arc::new(Semaphore::new(n.get()))),
        }
    }

    /// Submit one task per resource, returning handles in input order
    ///
    /// Submission never waits on a task. When a cap is configured, tasks over
    /// the cap are still spawned and wait inside the task for a permit.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, resources: &ResourceList) -> Vec<TaskHandle> {
        let handles: Vec<TaskHandle> = resources
            .iter()
            .enumerate()
            .map(|(index, resource)| self.spawn(TaskId(index), resource.clone()))
            .collect();

        tracing::info!(
            tasks = handles.len(),
            limit = ?self.max_concurrent,
            "{} tasks have been created",
            handles.len()
        );
        handles
    }

    fn spawn(&self, id: TaskId, resource: Resource) -> TaskHandle {
        let state = StateCell::new();
        let fetcher = self.fetcher.clone();
        let limit = self.limit.clone();
        let task_state = state.clone();
        let task_resource = resource.clone();

        let join_handle = tokio::spawn(async move {
            let _permit = match limit {
                Some(semaphore) => match semaphore.acquire_owned().await {
                    Ok(permit) => Some(permit),
                    Err(e) => {
                        task_state.advance(TaskState::Failed);
                        return Outcome::Failure(FetchError::task(&task_resource, e));
                    }
                },
                None => None,
            };

            task_state.advance(TaskState::Running);
            tracing::debug!(task = %id, resource = %task_resource, "task running");

            let outcome = fetcher.fetch(&task_resource).await;
            task_state.advance(if outcome.is_success() {
                TaskState::Succeeded
            } else {
                TaskState::Failed
            });
            outcome
        });

        TaskHandle {
            id,
            resource,
            state,
            join_handle,
        }
    }
}

//! Waiting for dispatched tasks and normalizing their results

use std::any::Any;
use tokio::task::JoinError;

use crate::dispatcher::TaskHandle;
use crate::error::FetchError;
use crate::outcome::Outcome;
use crate::types::{FetchRecord, Resource, TaskState};

/// Wait for every task and return one outcome per handle, in handle order
///
/// All handles are awaited; a failed task never short-circuits the rest and
/// never cancels its siblings. A task that panicked or was aborted becomes a
/// [`FetchError::Task`] failure, so callers only ever see [`Outcome`]s.
pub async fn join(handles: Vec<TaskHandle>) -> Vec<Outcome<FetchRecord>> {
    futures::future::join_all(handles.into_iter().map(join_one)).await
}

async fn join_one(handle: TaskHandle) -> Outcome<FetchRecord> {
    let TaskHandle {
        id,
        resource,
        state,
        join_handle,
    } = handle;

    match join_handle.await {
        Ok(outcome) => outcome,
        Err(e) => {
            state.advance(TaskState::Failed);
            let err = task_failure(&resource, e);
            tracing::error!(task = %id, resource = %resource, error = %err, "Fetch task did not complete");
            Outcome::Failure(err)
        }
    }
}

fn task_failure(resource: &Resource, e: JoinError) -> FetchError {
    if e.is_panic() {
        let payload = e.into_panic();
        FetchError::task(resource, format!("task panicked: {}", panic_message(&*payload)))
    } else if e.is_cancelled() {
        FetchError::task(resource, "task was cancelled")
    } else {
        FetchError::task(resource, e)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic payload"
    }
}

//! Core types for fetch-fanout

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

/// A validated remote resource identifier
///
/// Only absolute `http`/`https` URLs with a host are accepted. Anything else
/// is rejected by [`Resource::parse`] before a batch is dispatched.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Resource(url::Url);

impl Resource {
    /// Parse and validate a resource identifier
    pub fn parse(input: &str) -> Result<Self> {
        let url = url::Url::parse(input.trim()).map_err(|e| Error::InvalidResource {
            input: input.to_string(),
            reason: e.to_string(),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::InvalidResource {
                input: input.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        if url.host_str().is_none_or(str::is_empty) {
            return Err(Error::InvalidResource {
                input: input.to_string(),
                reason: "missing host".to_string(),
            });
        }

        Ok(Self(url))
    }

    /// The resource as a URL string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// The underlying URL
    pub fn url(&self) -> &url::Url {
        &self.0
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl std::str::FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for Resource {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Ordered, read-only list of resources to fetch
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceList(Vec<Resource>);

impl ResourceList {
    /// Validate every identifier, failing on the first malformed one
    pub fn parse<I, S>(inputs: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        inputs
            .into_iter()
            .map(|s| Resource::parse(s.as_ref()))
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate resources in submission order
    pub fn iter(&self) -> std::slice::Iter<'_, Resource> {
        self.0.iter()
    }

    /// Resources as a slice
    pub fn as_slice(&self) -> &[Resource] {
        &self.0
    }
}

impl From<Vec<Resource>> for ResourceList {
    fn from(resources: Vec<Resource>) -> Self {
        Self(resources)
    }
}

impl FromIterator<Resource> for ResourceList {
    fn from_iter<I: IntoIterator<Item = Resource>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ResourceList {
    type Item = &'a Resource;
    type IntoIter = std::slice::Iter<'a, Resource>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Successfully fetched resource content and its measured latency
///
/// Immutable once created: fields are only reachable through getters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FetchRecord {
    resource: Resource,
    payload: Vec<u8>,
    elapsed_ms: u64,
    started_at: DateTime<Utc>,
}

impl FetchRecord {
    /// Create a record for a completed fetch
    pub fn new(
        resource: Resource,
        payload: Vec<u8>,
        elapsed_ms: u64,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            resource,
            payload,
            elapsed_ms,
            started_at,
        }
    }

    /// The fetched resource
    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    /// The full content that was read
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Consume the record, returning the payload
    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Wall-clock milliseconds spent reading the content
    pub fn elapsed_ms(&self) -> u64 {
        self.elapsed_ms
    }

    /// When the read started
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Payload size in whole kilobytes (1 KB = 1024 bytes, rounded down)
    pub fn size_kb(&self) -> usize {
        self.payload.len() / 1024
    }
}

/// Identifier of a dispatched task: its position in the submitted list
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle of a single fetch task
///
/// `Submitted -> Running -> {Succeeded, Failed}`. Terminal states never change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskState {
    /// Spawned, not yet started
    Submitted,
    /// Fetch in progress
    Running,
    /// Fetch produced a record
    Succeeded,
    /// Fetch or task failed
    Failed,
}

impl TaskState {
    /// Whether this state is final
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Succeeded | TaskState::Failed)
    }

    /// Convert integer state code to TaskState
    pub fn from_u8(state: u8) -> Self {
        match state {
            0 => TaskState::Submitted,
            1 => TaskState::Running,
            2 => TaskState::Succeeded,
            _ => TaskState::Failed,
        }
    }

    /// Convert TaskState to integer state code
    pub fn to_u8(&self) -> u8 {
        match self {
            TaskState::Submitted => 0,
            TaskState::Running => 1,
            TaskState::Succeeded => 2,
            TaskState::Failed => 3,
        }
    }
}

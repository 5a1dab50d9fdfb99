//! Single-resource fetching
//!
//! [`Transport`] is the opaque "open a resource, read all of it" capability.
//! [`Fetcher`] wraps a transport with timing and logging and turns every
//! result into an [`Outcome`].

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::FetchConfig;
use crate::error::{FetchError, Result};
use crate::outcome::Outcome;
use crate::types::{FetchRecord, Resource};

/// An opened resource whose content can be read once
///
/// Implementations own their underlying connection and release it when
/// dropped, so every exit path of a fetch gives the connection back.
#[async_trait]
pub trait ResourceStream: Send {
    /// Read the remaining content to the end
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Read`] if the content cannot be read completely.
    /// No partial content is returned on failure.
    async fn read_all(&mut self) -> std::result::Result<Vec<u8>, FetchError>;
}

/// Capability to open remote resources
///
/// # Examples
///
/// ```no_run
/// use fetch_fanout::{FetchConfig, HttpTransport, Resource, Transport};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let transport = HttpTransport::new(&FetchConfig::default())?;
/// let resource = Resource::parse("https://www.rust-lang.org")?;
///
/// let mut stream = transport.open(&resource).await?;
/// let body = stream.read_all().await?;
/// println!("{} bytes", body.len());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a resource for reading
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Connect`] if the resource cannot be opened.
    async fn open(
        &self,
        resource: &Resource,
    ) -> std::result::Result<Box<dyn ResourceStream>, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// HTTP(S) transport backed by a shared `reqwest::Client`
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Option<Duration>,
}

impl HttpTransport {
    /// Build a transport from configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`](crate::Error::Network) if the HTTP client
    /// cannot be constructed.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            timeout: config.request_timeout,
        })
    }

    fn describe(&self, resource: &Resource, e: &reqwest::Error) -> String {
        if e.is_timeout() {
            match self.timeout {
                Some(t) => format!("timed out after {} seconds", t.as_secs()),
                None => "timed out".to_string(),
            }
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            tracing::debug!(resource = %resource, error = ?e, "HTTP request error");
            e.to_string()
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn open(
        &self,
        resource: &Resource,
    ) -> std::result::Result<Box<dyn ResourceStream>, FetchError> {
        let response = self
            .client
            .get(resource.url().clone())
            .send()
            .await
            .map_err(|e| FetchError::connect(resource, self.describe(resource, &e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::connect(resource, format!("HTTP error {}", status)));
        }

        Ok(Box::new(HttpStream {
            resource: resource.clone(),
            transport: self.clone(),
            response: Some(response),
        }))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Open HTTP response; the connection is returned to the pool on drop
struct HttpStream {
    resource: Resource,
    transport: HttpTransport,
    response: Option<reqwest::Response>,
}

#[async_trait]
impl ResourceStream for HttpStream {
    async fn read_all(&mut self) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self
            .response
            .take()
            .ok_or_else(|| FetchError::read(&self.resource, "stream already consumed"))?;

        let body = response.bytes().await.map_err(|e| {
            FetchError::read(&self.resource, self.transport.describe(&self.resource, &e))
        })?;

        Ok(body.to_vec())
    }
}

/// Fetches one resource and measures how long reading it took
#[derive(Clone)]
pub struct Fetcher {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("transport", &self.transport.name())
            .finish()
    }
}

impl Fetcher {
    /// Create a fetcher over the given transport
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Name of the underlying transport
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    /// Fetch the full content of one resource
    ///
    /// Logs `started` before opening the resource, then `finished` or a
    /// failure. The elapsed time covers only the read, measured from just
    /// before it starts to just after it completes. Failures carry no
    /// duration and no partial payload.
    pub async fn fetch(&self, resource: &Resource) -> Outcome<FetchRecord> {
        tracing::info!(resource = %resource, "started");

        let mut stream = match self.transport.open(resource).await {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!(resource = %resource, error = %e, "Failed to open resource");
                return Outcome::Failure(e);
            }
        };

        let started_at = Utc::now();
        let start = Instant::now();

        match stream.read_all().await {
            Ok(payload) => {
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                tracing::info!(
                    resource = %resource,
                    elapsed_ms,
                    bytes = payload.len(),
                    "finished"
                );
                Outcome::Success(FetchRecord::new(
                    resource.clone(),
                    payload,
                    elapsed_ms,
                    started_at,
                ))
            }
            Err(e) => {
                tracing::warn!(resource = %resource, error = %e, "Failed to read resource");
                Outcome::Failure(e)
            }
        }
    }
}

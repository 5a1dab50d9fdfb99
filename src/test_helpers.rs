//! Shared test helpers: an in-memory transport with scripted latency and failures

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::FetchError;
use crate::fetcher::{ResourceStream, Transport};
use crate::types::Resource;

/// Parse a resource, panicking on bad test input
pub(crate) fn resource(url: &str) -> Resource {
    Resource::parse(url).unwrap()
}

/// Scripted behavior for one stubbed resource
#[derive(Clone, Debug)]
pub(crate) enum StubBehavior {
    /// Read succeeds with `body` after `delay_ms`
    Ok { body: Vec<u8>, delay_ms: u64 },
    /// Opening fails immediately
    ConnectError,
    /// Opening succeeds, reading fails after `delay_ms`
    ReadError { delay_ms: u64 },
    /// Reading panics, taking the task down with it
    Panic,
}

impl StubBehavior {
    pub(crate) fn ok(body: &[u8], delay_ms: u64) -> Self {
        Self::Ok {
            body: body.to_vec(),
            delay_ms,
        }
    }
}

#[derive(Default)]
struct Counters {
    opened: AtomicUsize,
    open_streams: AtomicUsize,
    reading: AtomicUsize,
    peak_reading: AtomicUsize,
}

/// Transport answering from a fixed table; unknown resources fail to connect
#[derive(Default)]
pub(crate) struct StubTransport {
    behaviors: HashMap<String, StubBehavior>,
    counters: Arc<Counters>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with(mut self, url: &str, behavior: StubBehavior) -> Self {
        self.behaviors
            .insert(resource(url).as_str().to_string(), behavior);
        self
    }

    /// Total number of successful opens
    pub(crate) fn opened(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Streams opened but not yet dropped
    pub(crate) fn open_streams(&self) -> usize {
        self.counters.open_streams.load(Ordering::SeqCst)
    }

    /// Highest number of reads observed in flight at once
    pub(crate) fn peak_concurrent_reads(&self) -> usize {
        self.counters.peak_reading.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn open(
        &self,
        resource: &Resource,
    ) -> std::result::Result<Box<dyn ResourceStream>, FetchError> {
        let behavior = match self.behaviors.get(resource.as_str()) {
            Some(StubBehavior::ConnectError) | None => {
                return Err(FetchError::connect(resource, "connection refused"));
            }
            Some(b) => b.clone(),
        };

        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubStream {
            resource: resource.clone(),
            behavior,
            counters: self.counters.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

struct StubStream {
    resource: Resource,
    behavior: StubBehavior,
    counters: Arc<Counters>,
}

impl Drop for StubStream {
    fn drop(&mut self) {
        self.counters.open_streams.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Decrements the in-flight read counter even if the read panics
struct ReadGuard(Arc<Counters>);

impl ReadGuard {
    fn enter(counters: &Arc<Counters>) -> Self {
        let now = counters.reading.fetch_add(1, Ordering::SeqCst) + 1;
        counters.peak_reading.fetch_max(now, Ordering::SeqCst);
        Self(counters.clone())
    }
}

impl Drop for ReadGuard {
    fn drop(&mut self) {
        self.0.reading.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ResourceStream for StubStream {
    async fn read_all(&mut self) -> std::result::Result<Vec<u8>, FetchError> {
        let _guard = ReadGuard::enter(&self.counters);
        match &self.behavior {
            StubBehavior::Ok { body, delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(body.clone())
            }
            StubBehavior::ReadError { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Err(FetchError::read(&self.resource, "connection reset by peer"))
            }
            StubBehavior::Panic => panic!("stub read panicked for {}", self.resource),
            StubBehavior::ConnectError => unreachable!("connect errors never open a stream"),
        }
    }
}

/// In-memory sink for formatted log output
#[derive(Clone, Default)]
pub(crate) struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    /// A plain-text fmt subscriber writing into this sink
    pub(crate) fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync + 'static {
        let sink = self.clone();
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || sink.clone())
            .finish()
    }

    /// Captured lines, oldest first
    pub(crate) fn lines(&self) -> Vec<String> {
        let buf = self.0.lock().unwrap();
        String::from_utf8_lossy(&buf)
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Captured lines containing every one of `needles`
    pub(crate) fn matching(&self, needles: &[&str]) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| needles.iter().all(|n| line.contains(n)))
            .collect()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

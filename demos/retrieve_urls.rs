//! Retrieve a list of popular sites concurrently
//!
//! Fetches every site at once, logs failures, and prints the successful
//! fetches fastest first as `<url>, <ms>(ms) <kb>(KB)`.
//!
//! ```bash
//! RUST_LOG=info cargo run --example retrieve_urls
//! RUST_LOG=info cargo run --example retrieve_urls -- --json
//! ```

use fetch_fanout::{FanOut, FetchConfig, ResourceList, report};
use tracing_subscriber::EnvFilter;

const SITES: &[&str] = &[
    "https://www.google.com",
    "https://www.youtube.com",
    "https://www.yahoo.com",
    "https://www.github.com",
    "https://www.linkedin.com",
    "https://www.amazon.com",
    "https://www.bing.com",
    "https://www.reddit.com",
    "https://www.facebook.com",
    "https://www.ebay.com",
    "https://www.twitter.com",
    "https://www.cloudflare.com",
    "https://www.datadoghq.com",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let json = std::env::args().any(|arg| arg == "--json");

    // Reject malformed URLs up front
    let resources = ResourceList::parse(SITES)?;

    let fan_out = FanOut::new(FetchConfig::default())?;
    let batch = fan_out.retrieve_report(&resources).await;

    let mut stdout = std::io::stdout().lock();
    if json {
        report::write_json_report(&mut stdout, &batch.records, Some(&batch.summary))?;
    } else {
        report::write_report(&mut stdout, &batch.records)?;
        eprintln!(
            "{} of {} succeeded in {}ms",
            batch.summary.succeeded, batch.summary.submitted, batch.wall_clock_ms
        );
    }

    Ok(())
}

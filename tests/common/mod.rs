//! Common test utilities for fetch-fanout integration tests

use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Mount a `GET <route>` answering `status` with `body` after `delay_ms`
pub async fn mount_page(server: &MockServer, route: &str, status: u16, body: &[u8], delay_ms: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_bytes(body.to_vec())
                .set_delay(Duration::from_millis(delay_ms)),
        )
        .mount(server)
        .await;
}

/// Absolute URL for a route on the mock server
pub fn url(server: &MockServer, route: &str) -> String {
    format!("{}{}", server.uri(), route)
}

// src/monitor/prober.rs
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

/// A single bounded-latency liveness check.
#[async_trait]
pub trait Prober: Send + Sync {
    /// `true` only when the stream answered with a success status in time.
    async fn check(&self, url: &Url) -> bool;

    fn name(&self) -> &'static str;
}

/// Probes a stream with a `HEAD` request.
pub struct HttpProber {
    client: Client,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent("stream-monitor")
            .build()?;

        Ok(Self { client, timeout })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn check(&self, url: &Url) -> bool {
        let start = std::time::Instant::now();

        let result = timeout(self.timeout, self.client.head(url.clone()).send()).await;

        // The response is dropped at the end of each arm, releasing the connection.
        let live = match result {
            Ok(Ok(response)) => {
                let status = response.status();
                if status == StatusCode::OK {
                    true
                } else {
                    warn!(url = %url, status = %status, "Stream probe failed: unexpected status");
                    false
                }
            }
            Ok(Err(e)) => {
                warn!(url = %url, error = %e, "Stream probe failed: request error");
                false
            }
            Err(_) => {
                warn!(url = %url, timeout = ?self.timeout, "Stream probe failed: timeout");
                false
            }
        };

        debug!(
            url = %url,
            live,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Stream probe complete"
        );

        live
    }

    fn name(&self) -> &'static str {
        "http_head"
    }
}

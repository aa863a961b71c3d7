//! HTTP Prober
//!
//! Issues one GET per call and classifies the outcome into a
//! [`StatusSignal`]. Any HTTP status, including 4xx/5xx, is a valid
//! liveness signal; every transport-level failure becomes `0`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::domain::{Prober, StatusSignal};
use crate::error::Result;

/// User agent sent with every probe
pub const USER_AGENT: &str = concat!("http-status-exporter/", env!("CARGO_PKG_VERSION"));

/// Prober backed by a shared `reqwest` client.
///
/// The client pools connections across sweeps; a response whose body has
/// been drained (or dropped) returns its connection to the pool.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    /// Create a prober with its own HTTP client
    pub fn new() -> Result<Self> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Prober for HttpProber {
    #[instrument(skip(self))]
    async fn probe(&self, url: &str, timeout: Duration) -> StatusSignal {
        let started = Instant::now();

        // The request timeout covers connect, headers and body.
        let mut response = match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(
                    "Probe of {} failed after {:?}: {}, status code 000",
                    url,
                    started.elapsed(),
                    e
                );
                return StatusSignal::FAILURE;
            }
        };

        let signal = StatusSignal::from(response.status());

        // Drain the body chunk by chunk so the connection can be reused; a
        // body error does not change the status that was already received.
        loop {
            match response.chunk().await {
                Ok(Some(_)) => continue,
                Ok(None) => break,
                Err(e) => {
                    debug!("Discarding body of {} failed: {}", url, e);
                    break;
                }
            }
        }

        debug!("Probe of {} returned {} in {:?}", url, signal, started.elapsed());
        signal
    }
}

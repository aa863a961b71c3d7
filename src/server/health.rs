//! Health Server
//!
//! Liveness and readiness probes, served without authentication on a
//! separate listener.

use std::convert::Infallible;
use std::sync::Arc;

use bytes::Bytes;
use http_body_util::Full;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::error::Result;
use crate::metrics::MetricsState;

use super::accept_backoff;

/// Answers `/healthz`, `/livez` and `/readyz`
#[derive(Debug, Clone)]
pub struct HealthEndpoint {
    state: Arc<MetricsState>,
}

impl HealthEndpoint {
    pub fn new(state: Arc<MetricsState>) -> Self {
        Self { state }
    }

    /// Ready once the first sweep has been recorded
    pub fn is_ready(&self) -> bool {
        self.state.sweeps_completed() > 0
    }

    pub fn handle<B>(&self, req: &Request<B>) -> Response<Full<Bytes>> {
        let (status, body) = match req.uri().path() {
            "/healthz" | "/livez" => (StatusCode::OK, "ok"),
            "/readyz" if self.is_ready() => (StatusCode::OK, "ok"),
            "/readyz" => (StatusCode::SERVICE_UNAVAILABLE, "no sweep completed yet"),
            _ => (StatusCode::NOT_FOUND, "not found"),
        };

        let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
        *response.status_mut() = status;
        response
    }
}

/// Serve health probes on `listener` forever
pub async fn run_health_server(listener: TcpListener, endpoint: HealthEndpoint) -> Result<()> {
    info!("Health server listening on {}", listener.local_addr()?);

    loop {
        let (stream, _) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                accept_backoff("Health server", e).await;
                continue;
            }
        };

        let io = TokioIo::new(stream);
        let endpoint = endpoint.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<hyper::body::Incoming>| {
                let response = endpoint.handle(&req);
                async move { Ok::<_, Infallible>(response) }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!("Health server connection error: {}", e);
            }
        });
    }
}

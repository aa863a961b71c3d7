//! Metrics Endpoint
//!
//! Serves `/metrics` behind HTTP Basic auth. Each scrape reads a snapshot
//! of the Metrics State and renders it; scraping never triggers a probe.

mod auth;
mod health;

pub use auth::{basic_credentials, CHALLENGE};
pub use health::{run_health_server, HealthEndpoint};

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, WWW_AUTHENTICATE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::domain::CredentialCheck;
use crate::error::{Error, Result};
use crate::metrics::{self, MetricsState};

/// Path the scrape endpoint is served on
pub const METRICS_PATH: &str = "/metrics";

// =============================================================================
// Listen Address
// =============================================================================

/// Resolve a `host:port` listen address. A bare `:port` binds every
/// interface; hostnames resolve to their first address.
pub async fn resolve_listen_addr(addr: &str) -> Result<SocketAddr> {
    let normalized = if addr.starts_with(':') {
        format!("0.0.0.0{}", addr)
    } else {
        addr.to_string()
    };

    let invalid = |reason: String| Error::InvalidListenAddr {
        addr: addr.to_string(),
        reason,
    };

    let resolved = tokio::net::lookup_host(normalized.as_str())
        .await
        .map_err(|e| invalid(e.to_string()))?
        .next()
        .ok_or_else(|| invalid("no addresses resolved".to_string()));
    resolved
}

/// Resolve and bind a listen address
pub async fn bind(addr: &str) -> Result<TcpListener> {
    let socket_addr = resolve_listen_addr(addr).await?;
    TcpListener::bind(socket_addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.to_string(),
            source,
        })
}

// =============================================================================
// Endpoint
// =============================================================================

/// Request handler for the scrape endpoint
#[derive(Clone)]
pub struct MetricsEndpoint {
    state: Arc<MetricsState>,
    credentials: Arc<dyn CredentialCheck>,
}

impl MetricsEndpoint {
    /// Create an endpoint reading `state`, gated by `credentials`
    pub fn new(state: Arc<MetricsState>, credentials: Arc<dyn CredentialCheck>) -> Self {
        Self { state, credentials }
    }

    /// Route and answer one request
    pub fn handle<B>(&self, req: &Request<B>) -> Response<Full<Bytes>> {
        if req.uri().path() != METRICS_PATH {
            return text_response(StatusCode::NOT_FOUND, "not found");
        }

        if !self.authorized(req) {
            debug!("Rejected unauthenticated scrape");
            return unauthorized();
        }

        match metrics::render(&self.state.read_all()) {
            Ok(exposition) => Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, exposition.content_type)
                .body(Full::new(Bytes::from(exposition.body)))
                .unwrap_or_else(|_| internal_error()),
            Err(e) => {
                error!("Failed to render metrics: {}", e);
                internal_error()
            }
        }
    }

    fn authorized<B>(&self, req: &Request<B>) -> bool {
        basic_credentials(req.headers())
            .map(|(username, password)| self.credentials.verify(&username, &password))
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for MetricsEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsEndpoint")
            .field("entries", &self.state.len())
            .finish()
    }
}

fn text_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}

fn unauthorized() -> Response<Full<Bytes>> {
    let mut response = text_response(StatusCode::UNAUTHORIZED, "Unauthorized\n");
    response
        .headers_mut()
        .insert(WWW_AUTHENTICATE, hyper::header::HeaderValue::from_static(CHALLENGE));
    response
}

fn internal_error() -> Response<Full<Bytes>> {
    text_response(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}

// =============================================================================
// Server Loop
// =============================================================================

/// Pause after a failed accept before taking the next connection
pub(crate) const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// Log an accept failure and wait out [`ACCEPT_BACKOFF`].
///
/// Errors such as EMFILE persist until a descriptor frees up.
pub(crate) async fn accept_backoff(server: &str, e: std::io::Error) {
    warn!("{} accept error: {}, retrying in {:?}", server, e, ACCEPT_BACKOFF);
    tokio::time::sleep(ACCEPT_BACKOFF).await;
}

/// Accept connections forever, serving each on its own task
pub async fn serve(listener: TcpListener, endpoint: MetricsEndpoint) -> Result<()> {
    let local_addr = listener.local_addr()?;
    info!("Metrics server listening on {}", local_addr);

    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                accept_backoff("Metrics server", e).await;
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
                debug!("Metrics server connection error from {}: {}", peer, e);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Credentials;
    use crate::domain::{StatusSignal, TargetKey};
    use assert_matches::assert_matches;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use http_body_util::BodyExt;
    use hyper::header::AUTHORIZATION;

    fn endpoint() -> (MetricsEndpoint, Arc<MetricsState>) {
        let state = Arc::new(MetricsState::new());
        let credentials = Arc::new(Credentials::new("prom", "s3cret").unwrap());
        (MetricsEndpoint::new(Arc::clone(&state), credentials), state)
    }

    fn request(path: &str, auth: Option<(&str, &str)>) -> Request<()> {
        let mut builder = Request::get(path);
        if let Some((user, pass)) = auth {
            let encoded = STANDARD.encode(format!("{}:{}", user, pass));
            builder = builder.header(AUTHORIZATION, format!("Basic {}", encoded));
        }
        builder.body(()).unwrap()
    }

    async fn body(response: Response<Full<Bytes>>) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_authorized_scrape_lists_targets() {
        let (endpoint, state) = endpoint();
        state.write(TargetKey::new("http://a/", "1"), StatusSignal::from_code(200));
        state.write(TargetKey::new("http://b/", "2"), StatusSignal::FAILURE);

        let response = endpoint.handle(&request("/metrics", Some(("prom", "s3cret"))));

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()[CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain"));
        let text = body(response).await;
        assert!(text.contains(r#"http_status_code{tag="1",url="http://a/"} 200"#));
        assert!(text.contains(r#"http_status_code{tag="2",url="http://b/"} 0"#));
    }

    #[tokio::test]
    async fn test_missing_credentials_rejected() {
        let (endpoint, state) = endpoint();
        state.write(TargetKey::new("http://a/", ""), StatusSignal::from_code(200));

        let response = endpoint.handle(&request("/metrics", None));

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], CHALLENGE);
        assert!(!body(response).await.contains("http_status_code"));
    }

    #[tokio::test]
    async fn test_wrong_password_rejected() {
        let (endpoint, _) = endpoint();

        let response = endpoint.handle(&request("/metrics", Some(("prom", "guess"))));

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (endpoint, _) = endpoint();

        let response = endpoint.handle(&request("/", Some(("prom", "s3cret"))));

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_scrapes_are_idempotent() {
        let (endpoint, state) = endpoint();
        state.write(TargetKey::new("http://a/", ""), StatusSignal::from_code(301));

        let first = body(endpoint.handle(&request("/metrics", Some(("prom", "s3cret"))))).await;
        let second = body(endpoint.handle(&request("/metrics", Some(("prom", "s3cret"))))).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_pluggable_credential_check() {
        let state = Arc::new(MetricsState::new());
        let endpoint = MetricsEndpoint::new(state, Arc::new(|user: &str, _: &str| user == "any"));

        let response = endpoint.handle(&request("/metrics", Some(("any", "thing"))));
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_resolve_listen_addr() {
        assert_eq!(
            resolve_listen_addr(":9119").await.unwrap(),
            "0.0.0.0:9119".parse::<SocketAddr>().unwrap()
        );
        assert_eq!(
            resolve_listen_addr("127.0.0.1:8080").await.unwrap(),
            "127.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert_matches!(
            resolve_listen_addr("localhost").await,
            Err(Error::InvalidListenAddr { .. })
        );
    }

    #[tokio::test]
    async fn test_hostname_listen_addr_resolves() {
        let resolved = resolve_listen_addr("localhost:9119").await.unwrap();
        assert!(resolved.ip().is_loopback());
        assert_eq!(resolved.port(), 9119);

        let listener = bind("localhost:0").await.unwrap();
        assert!(listener.local_addr().unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_accept_failure_waits_before_retry() {
        let started = std::time::Instant::now();
        let e = std::io::Error::new(std::io::ErrorKind::Other, "too many open files");

        accept_backoff("Metrics server", e).await;

        assert!(started.elapsed() >= ACCEPT_BACKOFF);
    }

    #[tokio::test]
    async fn test_bind_conflict_is_error() {
        let listener = bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        assert_matches!(bind(&addr).await, Err(Error::Bind { .. }));
    }
}

//! HTTP Status Exporter
//!
//! Probes a list of URLs on a fixed interval and serves their status codes
//! as Prometheus gauges behind HTTP Basic auth.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      HTTP Status Exporter                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────┐       │
//! │  │    Probe     │───▶│   Metrics    │───▶│   Metrics    │       │
//! │  │  Scheduler   │    │    State     │    │   Endpoint   │       │
//! │  └──────────────┘    └──────────────┘    └──────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use http_status_exporter::error::Result;
use http_status_exporter::server::{self, HealthEndpoint, MetricsEndpoint};
use http_status_exporter::{Credentials, HttpProber, MetricsState, ProbeScheduler, TargetRegistry};

// =============================================================================
// CLI Arguments
// =============================================================================

/// HTTP Status Exporter - blackbox status-code probing for Prometheus
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Target configuration file (JSON, or YAML by extension)
    #[arg(long, env = "HTTP_STATUS_CONFIG", default_value = "url.json")]
    config: PathBuf,

    /// Credential file for the metrics endpoint
    #[arg(long, env = "HTTP_STATUS_AUTH", default_value = "auth.json")]
    auth: PathBuf,

    /// Metrics server listen address (":port" binds all interfaces)
    #[arg(long, env = "HTTP_STATUS_ADDR", default_value = ":9119")]
    addr: String,

    /// Optional health server listen address
    #[arg(long, env = "HEALTH_ADDR")]
    health_addr: Option<String>,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

/// Accepted values for `--log-level`
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args);

    if let Err(e) = run(args).await {
        if e.is_startup_fatal() {
            error!("Startup failed, not serving: {}", e);
        } else {
            error!("Exporter stopped: {}", e);
        }
        return Err(e);
    }

    info!("Exporter shutdown complete");
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let registry = TargetRegistry::load(&args.config)?;
    let credentials = Credentials::load(&args.auth)?;

    // Bind before spawning anything so a bad address stops startup.
    let listener = server::bind(&args.addr).await?;
    let health_listener = match &args.health_addr {
        Some(addr) => Some(server::bind(addr).await?),
        None => None,
    };

    let (targets, settings) = registry.into_parts();
    info!(
        "Listening on {}, probing {} targets every {} seconds with a {} second timeout",
        args.addr,
        targets.len(),
        settings.interval_seconds,
        settings.timeout_seconds
    );

    let state = Arc::new(MetricsState::new());
    let prober = HttpProber::new()?;
    let scheduler = ProbeScheduler::new(targets, settings, prober, Arc::clone(&state));

    tokio::spawn(async move {
        scheduler.run().await;
    });

    if let Some(listener) = health_listener {
        let health = HealthEndpoint::new(Arc::clone(&state));
        tokio::spawn(async move {
            if let Err(e) = server::run_health_server(listener, health).await {
                error!("Health server error: {}", e);
            }
        });
    }

    let endpoint = MetricsEndpoint::new(state, Arc::new(credentials));

    tokio::select! {
        result = server::serve(listener, endpoint) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down");
            Ok(())
        }
    }
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = Level::from(args.log_level);

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    for directive in ["hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse() {
            filter = filter.add_directive(directive);
        }
    }

    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .init();
    }
}

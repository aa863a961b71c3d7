//! HTTP Status Exporter
//!
//! A blackbox availability prober. A background scheduler periodically
//! issues one GET against each configured URL and records the resulting
//! status code (or `0` on any failure) per `(url, tag)`. The latest values
//! are served as the `http_status_code` gauge on an authenticated
//! Prometheus scrape endpoint.
//!
//! # Architecture
//!
//! ```text
//! TargetRegistry → ProbeScheduler → Prober → MetricsState → MetricsEndpoint → scraper
//! ```
//!
//! The scheduler is the only writer of [`MetricsState`]; scrapes only read
//! it and never trigger probes.
//!
//! # Modules
//!
//! - [`config`] - Target registry and credential loading
//! - [`domain`] - Value objects and port traits
//! - [`error`] - Error types
//! - [`metrics`] - Metrics State and scrape rendering
//! - [`prober`] - HTTP prober
//! - [`scheduler`] - Sweep/sleep loop
//! - [`server`] - Scrape and health endpoints

pub mod config;
pub mod domain;
pub mod error;
pub mod metrics;
pub mod prober;
pub mod scheduler;
pub mod server;

// Re-export commonly used types
pub use config::{Credentials, Settings, Target, TargetRegistry};
pub use domain::{CredentialCheck, Prober, StatusSignal, TargetKey};
pub use error::{Error, Result};
pub use metrics::MetricsState;
pub use prober::HttpProber;
pub use scheduler::{ProbeScheduler, SchedulerPhase, SweepReport};
pub use server::{HealthEndpoint, MetricsEndpoint};

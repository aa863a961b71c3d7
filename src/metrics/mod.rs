//! Metrics State and scrape rendering

mod exposition;
mod state;

pub use exposition::{render, Exposition, LABELS, METRIC_HELP, METRIC_NAME};
pub use state::MetricsState;

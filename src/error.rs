//! Error types for the HTTP status exporter

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the HTTP status exporter
///
/// Probe failures are deliberately absent: a failed probe is recorded as
/// a status signal of `0`, never surfaced as an error.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file could not be read
    #[error("Failed to read configuration file {}: {}", .path.display(), .source)]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {}: {}", .path.display(), .reason)]
    ConfigParse { path: PathBuf, reason: String },

    /// Global settings are out of range
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// A target entry is unusable
    #[error("Invalid target '{url}': {reason}")]
    InvalidTarget { url: String, reason: String },

    /// Credential file is unusable
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    // =========================================================================
    // Serving Errors
    // =========================================================================
    /// Listen address could not be parsed
    #[error("Invalid listen address '{addr}': {reason}")]
    InvalidListenAddr { addr: String, reason: String },

    /// Listener could not be bound
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Metrics registry or encoder failure
    #[error("Metrics rendering error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl Error {
    /// True for errors that must stop the process before serving starts
    pub fn is_startup_fatal(&self) -> bool {
        matches!(
            self,
            Error::ConfigRead { .. }
                | Error::ConfigParse { .. }
                | Error::InvalidSettings(_)
                | Error::InvalidTarget { .. }
                | Error::InvalidCredentials(_)
                | Error::InvalidListenAddr { .. }
                | Error::Bind { .. }
        )
    }
}

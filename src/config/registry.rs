//! Target Registry
//!
//! The list of URLs to probe plus the global timing policy.

use std::path::Path;
use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};

// =============================================================================
// Target
// =============================================================================

/// One URL to probe, with a descriptive tag used only as a metric label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// URL to issue the GET against
    pub url: String,

    /// Opaque label, typically the IP or hostname behind the URL
    #[serde(default, alias = "ip")]
    pub tag: String,
}

impl Target {
    /// Create a new target
    pub fn new(url: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tag: tag.into(),
        }
    }

    fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidTarget {
                url: self.url.clone(),
                reason: "url must not be empty".into(),
            });
        }

        let parsed = Url::parse(&self.url).map_err(|e| Error::InvalidTarget {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(Error::InvalidTarget {
                url: self.url.clone(),
                reason: format!("scheme must be http or https, got {}", other),
            }),
        }
    }
}

// =============================================================================
// Settings
// =============================================================================

fn default_concurrency() -> usize {
    1
}

/// Global timing policy shared by every target
///
/// Integers are signed so that negative values in the file surface as a
/// validation error rather than a parse error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Seconds to sleep after each completed sweep
    #[serde(rename = "update_freq", alias = "interval_seconds")]
    pub interval_seconds: i64,

    /// Per-request timeout in seconds
    #[serde(rename = "timeout", alias = "timeout_seconds")]
    pub timeout_seconds: i64,

    /// Maximum number of targets probed at once within a sweep
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Settings {
    /// Sleep between sweeps
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds.max(0) as u64)
    }

    /// Bound on a single probe
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.max(0) as u64)
    }

    fn validate(&self) -> Result<()> {
        if self.interval_seconds <= 0 {
            return Err(Error::InvalidSettings(format!(
                "update_freq must be a positive number of seconds, got {}",
                self.interval_seconds
            )));
        }
        if self.timeout_seconds <= 0 {
            return Err(Error::InvalidSettings(format!(
                "timeout must be a positive number of seconds, got {}",
                self.timeout_seconds
            )));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidSettings("concurrency must be at least 1".into()));
        }
        Ok(())
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Validated, immutable set of targets and settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRegistry {
    #[serde(rename = "urls", alias = "targets", default)]
    targets: Vec<Target>,

    settings: Settings,
}

impl TargetRegistry {
    /// Build a registry from parts, validating them
    pub fn new(targets: Vec<Target>, settings: Settings) -> Result<Self> {
        let registry = Self { targets, settings };
        registry.validate()?;
        Ok(registry)
    }

    /// Load and validate a registry from a JSON or YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let registry: TargetRegistry = super::read_file(path)?;
        registry.validate()?;

        info!(
            "Loaded {} targets from {} (interval {}s, timeout {}s)",
            registry.targets.len(),
            path.display(),
            registry.settings.interval_seconds,
            registry.settings.timeout_seconds
        );

        Ok(registry)
    }

    fn validate(&self) -> Result<()> {
        self.settings.validate()?;
        for target in &self.targets {
            target.validate()?;
        }
        if self.targets.is_empty() {
            warn!("Target list is empty, the exporter will serve no samples");
        }
        Ok(())
    }

    /// Targets in configuration order
    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Global settings
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Split into owned parts
    pub fn into_parts(self) -> (Vec<Target>, Settings) {
        (self.targets, self.settings)
    }
}

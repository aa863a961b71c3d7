//! Domain Ports
//!
//! Value objects shared by every component and the trait seams the
//! scheduler and the endpoint depend on. Infrastructure adapters
//! (`HttpProber`, `TokioSleeper`, `Credentials`) implement these traits.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Domain Layer                            │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                    Ports (Traits)                    │    │
//! │  │      Prober      │      Sleeper     │ CredentialCheck│    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Infrastructure Layer                       │
//! │  ┌─────────────────────────────────────────────────────┐    │
//! │  │                  Adapters (Impls)                    │    │
//! │  │    HttpProber    │   TokioSleeper   │  Credentials  │    │
//! │  └─────────────────────────────────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{Credentials, Target};

// =============================================================================
// Value Objects
// =============================================================================

/// Outcome of one probe: an HTTP status code, or `0` for any failure.
///
/// All failure causes (refused, timeout, DNS, TLS, malformed response)
/// collapse into the same sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusSignal(u16);

impl StatusSignal {
    /// Sentinel recorded when a probe fails
    pub const FAILURE: StatusSignal = StatusSignal(0);

    /// Classify a raw status code. Anything outside `[100, 599]` is not a
    /// valid HTTP status and is recorded as a failure.
    pub fn from_code(code: u16) -> Self {
        if (100..=599).contains(&code) {
            Self(code)
        } else {
            Self::FAILURE
        }
    }

    /// Numeric value as exported on the gauge
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Check if this signal is the failure sentinel
    pub fn is_failure(&self) -> bool {
        self.0 == 0
    }
}

impl From<reqwest::StatusCode> for StatusSignal {
    fn from(status: reqwest::StatusCode) -> Self {
        Self::from_code(status.as_u16())
    }
}

impl fmt::Display for StatusSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Failures print as "000", matching the probe log convention.
        write!(f, "{:03}", self.0)
    }
}

/// Metrics State key: the `(url, tag)` pair of a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetKey {
    pub url: String,
    pub tag: String,
}

impl TargetKey {
    pub fn new(url: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tag: tag.into(),
        }
    }
}

impl From<&Target> for TargetKey {
    fn from(target: &Target) -> Self {
        Self::new(target.url.clone(), target.tag.clone())
    }
}

impl fmt::Display for TargetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tag.is_empty() {
            write!(f, "{}", self.url)
        } else {
            write!(f, "{} ({})", self.url, self.tag)
        }
    }
}

// =============================================================================
// Prober Port
// =============================================================================

/// Port for issuing a single liveness probe.
///
/// Implementations make exactly one attempt and never fail: every error is
/// folded into [`StatusSignal::FAILURE`].
#[async_trait]
pub trait Prober: Send + Sync {
    /// Probe `url`, giving up after `timeout`.
    async fn probe(&self, url: &str, timeout: Duration) -> StatusSignal;
}

// =============================================================================
// Sleeper Port
// =============================================================================

/// Port for the scheduler's `SLEEPING` phase, so tests can substitute a
/// fake clock.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// =============================================================================
// Credential Port
// =============================================================================

/// Predicate deciding whether a username/password pair may scrape.
pub trait CredentialCheck: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

impl<F> CredentialCheck for F
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn verify(&self, username: &str, password: &str) -> bool {
        self(username, password)
    }
}

impl CredentialCheck for Credentials {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.username == username && self.password == password
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_failure_sentinel() {
        assert!(StatusSignal::FAILURE.is_failure());
        assert_eq!(StatusSignal::FAILURE.value(), 0);
        assert_eq!(StatusSignal::FAILURE.to_string(), "000");
    }

    #[test]
    fn test_error_codes_are_valid_signals() {
        let signal = StatusSignal::from(reqwest::StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(signal.value(), 503);
        assert!(!signal.is_failure());
        assert_eq!(signal.to_string(), "503");
    }

    #[test]
    fn test_target_key_display() {
        assert_eq!(TargetKey::new("http://a", "").to_string(), "http://a");
        assert_eq!(TargetKey::new("http://a", "10.0.0.1").to_string(), "http://a (10.0.0.1)");
    }

    #[test]
    fn test_target_key_from_target() {
        let target = Target::new("http://a", "edge");
        assert_eq!(TargetKey::from(&target), TargetKey::new("http://a", "edge"));
    }

    #[test]
    fn test_credentials_exact_match() {
        let credentials = Credentials::new("prom", "s3cret").unwrap();
        assert!(credentials.verify("prom", "s3cret"));
        assert!(!credentials.verify("prom", "S3cret"));
        assert!(!credentials.verify("Prom", "s3cret"));
        assert!(!credentials.verify("prom", ""));
    }

    #[test]
    fn test_closure_credential_check() {
        let check = |user: &str, _: &str| user == "admin";
        assert!(check.verify("admin", "anything"));
        assert!(!check.verify("guest", "anything"));
    }

    proptest! {
        #[test]
        fn prop_valid_codes_pass_through(code in 100u16..=599) {
            prop_assert_eq!(StatusSignal::from_code(code).value(), code);
        }

        #[test]
        fn prop_out_of_range_codes_fail(code in prop_oneof![0u16..100, 600u16..=u16::MAX]) {
            prop_assert!(StatusSignal::from_code(code).is_failure());
        }
    }
}

//! Domain Layer
//!
//! - **Ports** (`ports.rs`) - value objects and the trait seams for probing,
//!   sleeping and credential checks
//!
//! # Usage
//!
//! ```ignore
//! use http_status_exporter::domain::{Prober, StatusSignal};
//!
//! async fn check<P: Prober>(prober: &P) -> bool {
//!     !prober.probe("https://example.com", Duration::from_secs(5)).await.is_failure()
//! }
//! ```

pub mod ports;

pub use ports::{
    // Port traits
    CredentialCheck,
    Prober,
    Sleeper,
    // Value objects
    StatusSignal,
    TargetKey,
    TokioSleeper,
};

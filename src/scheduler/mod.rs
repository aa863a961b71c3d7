//! Probe Scheduler
//!
//! A perpetual loop alternating between two phases:
//!
//! ```text
//!        ┌──────────── all targets probed and written ───────────┐
//!        │                                                        ▼
//!   ┌──────────┐                                            ┌──────────┐
//!   │ SWEEPING │                                            │ SLEEPING │
//!   └──────────┘                                            └──────────┘
//!        ▲                                                        │
//!        └──────────────── interval elapsed ─────────────────────┘
//! ```
//!
//! The sleep starts after the sweep completes, so the effective period is
//! sweep duration plus interval. Per-target failures are recorded as `0`
//! and never end the loop.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::RwLock;
use tracing::{debug, info, instrument, warn};

use crate::config::{Settings, Target};
use crate::domain::{Prober, Sleeper, StatusSignal, TargetKey, TokioSleeper};
use crate::metrics::MetricsState;

// =============================================================================
// Phase
// =============================================================================

/// Current phase of the scheduler loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    /// Created but `run` not yet entered
    Idle,
    Sweeping,
    Sleeping,
}

impl fmt::Display for SchedulerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchedulerPhase::Idle => write!(f, "IDLE"),
            SchedulerPhase::Sweeping => write!(f, "SWEEPING"),
            SchedulerPhase::Sleeping => write!(f, "SLEEPING"),
        }
    }
}

// =============================================================================
// Sweep Report
// =============================================================================

/// Summary of one completed sweep
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Targets probed (and written)
    pub probed: usize,
    /// Targets whose signal was the failure sentinel
    pub failed: usize,
    /// Wall-clock duration of the sweep
    pub elapsed: Duration,
}

impl SweepReport {
    fn record(&mut self, signal: StatusSignal) {
        self.probed += 1;
        if signal.is_failure() {
            self.failed += 1;
        }
    }

    /// Targets that returned an HTTP status
    pub fn succeeded(&self) -> usize {
        self.probed - self.failed
    }
}

// =============================================================================
// Probe Scheduler
// =============================================================================

/// Owns the target list and drives the prober into the Metrics State
pub struct ProbeScheduler<P> {
    targets: Vec<Target>,
    settings: Settings,
    prober: P,
    state: Arc<MetricsState>,
    sleeper: Arc<dyn Sleeper>,
    phase: RwLock<SchedulerPhase>,
}

impl<P: Prober> ProbeScheduler<P> {
    /// Create a scheduler sleeping on the tokio timer
    pub fn new(
        targets: Vec<Target>,
        settings: Settings,
        prober: P,
        state: Arc<MetricsState>,
    ) -> Self {
        Self::with_sleeper(targets, settings, prober, state, Arc::new(TokioSleeper))
    }

    /// Create a scheduler with an injected sleeper
    pub fn with_sleeper(
        targets: Vec<Target>,
        settings: Settings,
        prober: P,
        state: Arc<MetricsState>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            targets,
            settings,
            prober,
            state,
            sleeper,
            phase: RwLock::new(SchedulerPhase::Idle),
        }
    }

    /// Current phase
    pub fn phase(&self) -> SchedulerPhase {
        *self.phase.read()
    }

    fn enter(&self, phase: SchedulerPhase) {
        *self.phase.write() = phase;
        debug!("Scheduler entering {}", phase);
    }

    /// Run forever: sweep, sleep, repeat
    pub async fn run(&self) {
        info!(
            "Starting probe scheduler for {} targets (interval {:?}, timeout {:?}, concurrency {})",
            self.targets.len(),
            self.settings.interval(),
            self.settings.timeout(),
            self.settings.concurrency
        );

        loop {
            self.cycle().await;
        }
    }

    /// One full SWEEPING → SLEEPING cycle
    pub async fn cycle(&self) -> SweepReport {
        let report = self.sweep().await;

        self.enter(SchedulerPhase::Sleeping);
        self.sleeper.sleep(self.settings.interval()).await;

        report
    }

    /// Probe every target once and record the results.
    ///
    /// With `concurrency == 1` targets are probed one at a time in
    /// configuration order; otherwise up to `concurrency` probes run at once
    /// and completion order is unspecified. Each write happens after its
    /// own probe returns.
    #[instrument(skip(self), fields(targets = self.targets.len()))]
    pub async fn sweep(&self) -> SweepReport {
        self.enter(SchedulerPhase::Sweeping);
        let started = Instant::now();

        let limit = self.settings.concurrency.max(1);
        let timeout = self.settings.timeout();
        let mut queue = self.targets.iter();
        let mut pending = FuturesUnordered::new();
        let mut report = SweepReport::default();

        loop {
            while pending.len() < limit {
                match queue.next() {
                    Some(target) => {
                        pending.push(self.probe_and_record(TargetKey::from(target), timeout))
                    }
                    None => break,
                }
            }

            match pending.next().await {
                Some(signal) => report.record(signal),
                None => break,
            }
        }

        report.elapsed = started.elapsed();
        self.state.record_sweep();

        if report.failed > 0 {
            warn!(
                "Sweep finished in {:?}: {} of {} targets failed",
                report.elapsed, report.failed, report.probed
            );
        } else {
            debug!(
                "Sweep finished in {:?}: {} targets probed",
                report.elapsed, report.probed
            );
        }

        report
    }

    fn probe_and_record(&self, key: TargetKey, timeout: Duration) -> BoxFuture<'_, StatusSignal> {
        async move {
            let signal = self.prober.probe(&key.url, timeout).await;
            self.state.write(key, signal);
            signal
        }
        .boxed()
    }
}

impl<P> fmt::Debug for ProbeScheduler<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeScheduler")
            .field("targets", &self.targets.len())
            .field("settings", &self.settings)
            .field("phase", &*self.phase.read())
            .finish()
    }
}

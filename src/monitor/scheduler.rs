//! Periodic sweep driver.
//!
//! At most one sweep (or single-target check) runs at a time. Ticks that land
//! while one is in flight are dropped, not queued. Pausing only stops new
//! sweeps from starting; an in-flight sweep always runs to completion.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::checker::{AvailabilityChecker, CheckError};
use super::clock::Clock;
use super::models::WatchedTarget;
use super::target_store::{TargetError, TargetStore};
use super::transition::{self, Transition};
use crate::notifications::config_store::ConfigStore;
use crate::notifications::service::{NotificationError, NotificationService};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SchedulerState {
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerSettings {
    pub interval: Duration,
    pub inter_check_delay: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            inter_check_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Error, Debug)]
pub enum TargetCheckError {
    #[error("Target not found: {0}")]
    NotFound(String),
    #[error("A sweep is already in progress")]
    Busy,
    #[error("Check failed: {0}")]
    Check(#[from] CheckError),
    #[error("Failed to record check result: {0}")]
    Storage(#[from] TargetError),
    #[error("Check task aborted: {0}")]
    Aborted(#[from] JoinError),
}

/// Result of checking one target.
#[derive(Debug)]
pub struct TargetCheck {
    pub target: WatchedTarget,
    pub transition: Transition,
    /// `None` when the transition was not notify-worthy.
    pub notification: Option<Result<(), NotificationError>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub started_at: Option<DateTime<Utc>>,
    pub targets: usize,
    pub checked: usize,
    pub check_failures: usize,
    pub storage_failures: usize,
    pub vanished: usize,
    pub notified: usize,
    pub notify_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum TickOutcome {
    Completed(SweepReport),
    SkippedPaused,
    SkippedBusy,
}

/// Answer to a manual trigger. The sweep itself runs in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum TriggerOutcome {
    Started,
    SkippedBusy,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerStatus {
    pub state: SchedulerState,
    pub sweeping: bool,
    pub interval_seconds: u64,
    pub last_sweep_at: Option<DateTime<Utc>>,
    pub next_sweep_at: Option<DateTime<Utc>>,
    pub last_report: Option<SweepReport>,
}

#[derive(Default)]
struct SweepTiming {
    last_sweep_at: Option<DateTime<Utc>>,
    next_sweep_at: Option<DateTime<Utc>>,
    last_report: Option<SweepReport>,
}

struct TimerHandle {
    join: JoinHandle<()>,
    shutdown_tx: oneshot::Sender<()>,
}

/// Clears the in-flight flag when the sweep ends, including on unwind.
struct SweepGuard<'a>(&'a AtomicBool);

impl Drop for SweepGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct Scheduler {
    targets: Arc<TargetStore>,
    config: Arc<ConfigStore>,
    checker: Arc<dyn AvailabilityChecker>,
    notifications: Arc<NotificationService>,
    clock: Arc<dyn Clock>,
    settings: SchedulerSettings,
    paused: AtomicBool,
    sweeping: AtomicBool,
    timing: Mutex<SweepTiming>,
    timer: Mutex<Option<TimerHandle>>,
}

impl Scheduler {
    pub fn new(
        targets: Arc<TargetStore>,
        config: Arc<ConfigStore>,
        checker: Arc<dyn AvailabilityChecker>,
        notifications: Arc<NotificationService>,
        clock: Arc<dyn Clock>,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            targets,
            config,
            checker,
            notifications,
            clock,
            settings,
            paused: AtomicBool::new(false),
            sweeping: AtomicBool::new(false),
            timing: Mutex::new(SweepTiming::default()),
            timer: Mutex::new(None),
        }
    }

    pub fn state(&self) -> SchedulerState {
        if self.paused.load(Ordering::Acquire) {
            SchedulerState::Paused
        } else {
            SchedulerState::Running
        }
    }

    pub fn pause(&self) {
        if !self.paused.swap(true, Ordering::AcqRel) {
            info!("Monitoring paused.");
        }
    }

    pub fn resume(&self) {
        if self.paused.swap(false, Ordering::AcqRel) {
            info!("Monitoring resumed.");
        }
    }

    pub fn status(&self) -> SchedulerStatus {
        let timing = self.timing.lock().unwrap_or_else(|e| e.into_inner());
        SchedulerStatus {
            state: self.state(),
            sweeping: self.sweeping.load(Ordering::Acquire),
            interval_seconds: self.settings.interval.as_secs(),
            last_sweep_at: timing.last_sweep_at,
            next_sweep_at: timing.next_sweep_at,
            last_report: timing.last_report.clone(),
        }
    }

    /// One timer tick: sweeps unless paused or a sweep is already running.
    pub async fn tick(&self) -> TickOutcome {
        if self.state() == SchedulerState::Paused {
            debug!("Tick skipped: monitoring paused.");
            return TickOutcome::SkippedPaused;
        }
        self.sweep_if_idle().await
    }

    /// Starts a sweep in the background regardless of the pause flag and
    /// returns without waiting for it. The finished report shows up in
    /// [`SchedulerStatus::last_report`].
    pub fn trigger_now(self: &Arc<Self>) -> TriggerOutcome {
        if !self.claim() {
            debug!("Manual sweep skipped: a sweep is already running.");
            return TriggerOutcome::SkippedBusy;
        }
        info!("Manual sweep requested.");
        let scheduler = Arc::clone(self);
        tokio::spawn(async move {
            let _guard = SweepGuard(&scheduler.sweeping);
            scheduler.sweep().await;
        });
        TriggerOutcome::Started
    }

    /// Checks a single target outside the timer, under the same single-flight guard.
    pub async fn check_target(&self, identity: &str) -> Result<TargetCheck, TargetCheckError> {
        let target = self
            .targets
            .get(identity)
            .ok_or_else(|| TargetCheckError::NotFound(identity.to_string()))?;
        let _guard = self.try_begin().ok_or(TargetCheckError::Busy)?;
        self.check_one(&target).await
    }

    /// Spawns the timer loop. The first tick fires one interval from now.
    pub fn start(self: &Arc<Self>) {
        let mut timer = self.timer.lock().unwrap_or_else(|e| e.into_inner());
        if timer.is_some() {
            warn!("Scheduler timer already running.");
            return;
        }
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let join = tokio::spawn(Arc::clone(self).run(shutdown_rx));
        *timer = Some(TimerHandle { join, shutdown_tx });
    }

    /// Stops the timer loop. A sweep already spawned by it still completes.
    pub async fn stop(&self) {
        let handle = self.timer.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(TimerHandle { join, shutdown_tx }) = handle {
            if shutdown_tx.send(()).is_err() {
                warn!("Scheduler timer already exited.");
            }
            if let Err(e) = join.await {
                error!(error = %e, "Scheduler timer task failed.");
            }
        }
    }

    async fn run(self: Arc<Self>, mut shutdown_rx: oneshot::Receiver<()>) {
        let period = self.settings.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.record_next_sweep();
        info!(interval_secs = period.as_secs(), "Scheduler started.");

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown_rx => {
                    info!("Scheduler stopped.");
                    break;
                }

                _ = ticker.tick() => {
                    self.record_next_sweep();
                    let scheduler = Arc::clone(&self);
                    tokio::spawn(async move {
                        if let TickOutcome::SkippedBusy = scheduler.tick().await {
                            debug!("Tick dropped: previous sweep still running.");
                        }
                    });
                }
            }
        }
    }

    fn record_next_sweep(&self) {
        let next = chrono::Duration::from_std(self.settings.interval)
            .ok()
            .map(|d| self.clock.now() + d);
        self.timing.lock().unwrap_or_else(|e| e.into_inner()).next_sweep_at = next;
    }

    fn claim(&self) -> bool {
        self.sweeping
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn try_begin(&self) -> Option<SweepGuard<'_>> {
        self.claim().then(|| SweepGuard(&self.sweeping))
    }

    async fn sweep_if_idle(&self) -> TickOutcome {
        match self.try_begin() {
            Some(_guard) => TickOutcome::Completed(self.sweep().await),
            None => TickOutcome::SkippedBusy,
        }
    }

    async fn sweep(&self) -> SweepReport {
        let started_at = self.clock.now();
        self.timing.lock().unwrap_or_else(|e| e.into_inner()).last_sweep_at = Some(started_at);

        let snapshot = self.targets.list();
        let mut report = SweepReport {
            started_at: Some(started_at),
            targets: snapshot.len(),
            ..Default::default()
        };
        info!(targets = snapshot.len(), "Sweep started.");

        for (index, target) in snapshot.iter().enumerate() {
            if index > 0 && !self.settings.inter_check_delay.is_zero() {
                tokio::time::sleep(self.settings.inter_check_delay).await;
            }

            match self.check_one(target).await {
                Ok(check) => {
                    report.checked += 1;
                    match check.notification {
                        Some(Ok(())) => report.notified += 1,
                        Some(Err(_)) => report.notify_failures += 1,
                        None => {}
                    }
                }
                Err(TargetCheckError::Check(e)) => {
                    warn!(identity = %target.identity, error = %e, "Availability check failed.");
                    report.check_failures += 1;
                }
                Err(TargetCheckError::NotFound(_)) => {
                    debug!(identity = %target.identity, "Target removed during sweep.");
                    report.vanished += 1;
                }
                Err(e) => {
                    error!(identity = %target.identity, error = %e, "Failed to record check.");
                    report.storage_failures += 1;
                }
            }
        }

        info!(
            checked = report.checked,
            check_failures = report.check_failures,
            notified = report.notified,
            notify_failures = report.notify_failures,
            "Sweep finished."
        );
        self.timing.lock().unwrap_or_else(|e| e.into_inner()).last_report = Some(report.clone());
        report
    }

    async fn check_one(&self, target: &WatchedTarget) -> Result<TargetCheck, TargetCheckError> {
        let verdict = self.checker.probe(target).await?;
        let now = self.clock.now();

        // The store writes to disk under its lock; keep that off the runtime threads.
        let store = Arc::clone(&self.targets);
        let identity = target.identity.clone();
        let (transition, updated) = tokio::task::spawn_blocking(move || {
            store.update(&identity, |t| {
                let transition = transition::apply(t, verdict, now);
                (transition, t.clone())
            })
        })
        .await??
        .ok_or_else(|| TargetCheckError::NotFound(target.identity.clone()))?;

        if transition.changed() {
            info!(
                identity = %updated.identity,
                from = %transition.previous,
                to = %transition.current,
                "Listing status changed."
            );
        }

        let notification = if transition.notify {
            warn!(identity = %updated.identity, "Listing became unavailable.");
            let result = self
                .notifications
                .notify(&updated, &self.config.current())
                .await;
            if let Err(e) = &result {
                warn!(identity = %updated.identity, error = %e, "Removal notification not delivered.");
            }
            Some(result)
        } else {
            None
        };

        Ok(TargetCheck {
            target: updated,
            transition,
            notification,
        })
    }
}

//! Auto-refresh timer
//!
//! Two states: `Idle` and `Armed`. Every re-evaluation cancels the running
//! timer before a new one is started, so at most one timer exists at a time.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::filters::RefreshInterval;

/// Observable state of the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Armed(RefreshInterval),
}

impl SchedulerState {
    pub fn is_armed(&self) -> bool {
        matches!(self, SchedulerState::Armed(_))
    }
}

type TickFn = Arc<dyn Fn() -> bool + Send + Sync>;

struct ArmedTimer {
    interval: RefreshInterval,
    cancellation_token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owned, cancellable periodic timer
///
/// The tick callback returns `false` once its target is gone, which ends the
/// timer task on its own.
pub struct RefreshScheduler {
    runtime: Handle,
    tick: TickFn,
    timer: Option<ArmedTimer>,
    arms: u64,
    closed: bool,
}

impl RefreshScheduler {
    pub fn new<F>(runtime: Handle, tick: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        Self {
            runtime,
            tick: Arc::new(tick),
            timer: None,
            arms: 0,
            closed: false,
        }
    }

    pub fn state(&self) -> SchedulerState {
        match &self.timer {
            Some(timer) => SchedulerState::Armed(timer.interval),
            None => SchedulerState::Idle,
        }
    }

    /// Number of timers started so far
    #[cfg(test)]
    fn arm_count(&self) -> u64 {
        self.arms
    }

    /// Cancel the running timer, then start a new one when `desired` is set
    pub fn reschedule(&mut self, desired: Option<RefreshInterval>) {
        self.disarm();

        let Some(interval) = desired else {
            return;
        };
        if self.closed {
            debug!("Refresh scheduler is shut down, not arming");
            return;
        }

        let cancellation_token = CancellationToken::new();
        let task_token = cancellation_token.clone();
        let tick = self.tick.clone();
        let period = interval.period();

        let handle = self.runtime.spawn(async move {
            // First tick one full period after arming
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = task_token.cancelled() => {
                        debug!("Refresh timer cancelled");
                        return;
                    }
                    _ = ticker.tick() => {
                        if !tick() {
                            debug!("Refresh target dropped, stopping timer");
                            return;
                        }
                    }
                }
            }
        });

        self.arms += 1;
        debug!("Refresh timer #{} armed every {}", self.arms, interval);
        self.timer = Some(ArmedTimer {
            interval,
            cancellation_token,
            handle,
        });
    }

    pub fn disarm(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancellation_token.cancel();
            timer.handle.abort();
            debug!("Refresh timer disarmed");
        }
    }

    /// Disarm for good; later reschedules stay idle
    pub fn shutdown(&mut self) {
        self.closed = true;
        self.disarm();
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.disarm();
    }
}

//! The run-wide stop signal.
//!
//! One [`StopSignal`] is shared by every actor and control loop of a world.
//! It is raised exactly once, records why, and is never cleared. Sleeps go
//! through [`StopSignal::wait_timeout`] so every thread wakes as soon as the
//! signal is raised instead of finishing its interval.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, OnceLock, PoisonError};
use std::time::{Duration, Instant};

use simsims_transitions::Halt;
use simsims_types::EndReason;
use tracing::info;

/// A once-only, waitable stop flag.
#[derive(Debug, Default)]
pub struct StopSignal {
    stopped: AtomicBool,
    reason: OnceLock<EndReason>,
    gate: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    /// A signal that has not been raised.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise the signal.
    ///
    /// Returns `true` for the call that actually raised it; later calls are
    /// ignored and keep the first reason.
    pub fn trigger(&self, reason: EndReason) -> bool {
        let mut raised = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if *raised {
            return false;
        }
        *raised = true;
        let _ = self.reason.set(reason);
        self.stopped.store(true, Ordering::Release);
        drop(raised);
        self.wake.notify_all();
        info!(%reason, "Stop signal raised");
        true
    }

    /// Whether the signal has been raised.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Why the run stopped, once it has.
    pub fn reason(&self) -> Option<EndReason> {
        self.reason.get().copied()
    }

    /// Block for up to `timeout`, returning early if the signal is raised.
    ///
    /// Returns whether the signal is raised.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            return self.wait_forever();
        };
        let mut raised = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        while !*raised {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            let (guard, _) = self
                .wake
                .wait_timeout(raised, remaining)
                .unwrap_or_else(PoisonError::into_inner);
            raised = guard;
        }
        *raised
    }

    fn wait_forever(&self) -> bool {
        let mut raised = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        while !*raised {
            raised = self
                .wake
                .wait(raised)
                .unwrap_or_else(PoisonError::into_inner);
        }
        true
    }
}

impl Halt for StopSignal {
    fn halted(&self) -> bool {
        self.is_stopped()
    }

    fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return self.is_stopped();
        }
        self.wait_timeout(duration)
    }
}

/// A cloneable handle for ending a run from outside the world.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    signal: Arc<StopSignal>,
}

impl ShutdownHandle {
    pub(crate) const fn new(signal: Arc<StopSignal>) -> Self {
        Self { signal }
    }

    /// Ask the world to stop. Returns `false` if it had already stopped.
    pub fn request_stop(&self) -> bool {
        self.signal.trigger(EndReason::ExternalStop)
    }

    /// Whether the run has stopped, for any reason.
    pub fn is_stopped(&self) -> bool {
        self.signal.is_stopped()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    #[test]
    fn first_trigger_wins() {
        let signal = StopSignal::new();
        assert!(!signal.is_stopped());
        assert!(signal.trigger(EndReason::BudgetElapsed));
        assert!(!signal.trigger(EndReason::BarracksEmpty));
        assert!(signal.is_stopped());
        assert_eq!(signal.reason(), Some(EndReason::BudgetElapsed));
    }

    #[test]
    fn wait_times_out_when_not_raised() {
        let signal = StopSignal::new();
        let start = Instant::now();
        assert!(!signal.wait_timeout(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn trigger_wakes_sleepers_early() {
        let signal = Arc::new(StopSignal::new());
        let sleeper = Arc::clone(&signal);
        let start = Instant::now();
        let handle = thread::spawn(move || sleeper.wait_timeout(Duration::from_secs(30)));
        thread::sleep(Duration::from_millis(20));
        signal.trigger(EndReason::ExternalStop);
        let woke = handle.join().unwrap_or(false);
        assert!(woke);
        assert!(start.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn handle_requests_external_stop() {
        let signal = Arc::new(StopSignal::new());
        let handle = ShutdownHandle::new(Arc::clone(&signal));
        assert!(handle.request_stop());
        assert!(!handle.request_stop());
        assert!(handle.is_stopped());
        assert_eq!(signal.reason(), Some(EndReason::ExternalStop));
    }

    #[test]
    fn zero_pause_reports_state_without_sleeping() {
        let signal = StopSignal::new();
        assert!(!signal.pause(Duration::ZERO));
        signal.trigger(EndReason::ExternalStop);
        assert!(signal.pause(Duration::ZERO));
    }
}

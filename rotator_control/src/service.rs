//! Shared rotator handle.
//!
//! [`RotatorService`] puts the [`Rotator`] behind an `Arc<Mutex<_>>`. Every
//! command and every monitor tick takes the lock for its full
//! read-modify-write, and the guard releases it on every exit path.
//! Clones share the same controller.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{error, info, warn};

use rotator_common::axis::{AxisMotion, Direction};
use rotator_common::consts::MONITOR_LABEL;
use rotator_common::rotator::error::{CommandError, InitError};
use rotator_common::rotator::state::ParkState;
use rotator_common::scheduler::{PeriodicScheduler, TaskPriority};
use rotator_common::store::SettingsStore;

use crate::rotator::{Rotator, RotatorStatus};
use crate::state::park::TransitionResult;

/// Lock-guarded rotator shared between command callers and the monitor task.
pub struct RotatorService<A: AxisMotion, S: SettingsStore> {
    inner: Arc<Mutex<Rotator<A, S>>>,
    monitor_period: Duration,
}

impl<A: AxisMotion, S: SettingsStore> Clone for RotatorService<A, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            monitor_period: self.monitor_period,
        }
    }
}

impl<A, S> RotatorService<A, S>
where
    A: AxisMotion + 'static,
    S: SettingsStore + 'static,
{
    /// Wrap a controller; the monitor runs every `monitor_period`.
    pub fn new(rotator: Rotator<A, S>, monitor_period: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(rotator)),
            monitor_period,
        }
    }

    /// Initialise the controller, start the monitor and restore the prior
    /// operating state.
    ///
    /// The lock is held until the startup unpark is done, so the first
    /// monitor tick always sees the restored state. `scheduler` must not
    /// run the callback from inside `add`.
    ///
    /// Returns every init flag raised. A fatal result (`DRIVER`) means the
    /// monitor was not registered.
    pub fn init(&self, scheduler: &mut dyn PeriodicScheduler) -> InitError {
        let mut rotator = self.inner.lock();
        let errors = rotator.init();
        if errors.is_fatal() {
            return errors;
        }

        info!(
            "Rotator, start monitor task (period {}ms)",
            self.monitor_period.as_millis()
        );
        let shared = Arc::clone(&self.inner);
        let registered = scheduler.add(
            self.monitor_period,
            Duration::ZERO,
            true,
            TaskPriority::Background,
            Box::new(move || shared.lock().monitor()),
            MONITOR_LABEL,
        );

        if registered {
            info!("Rotator, monitor task {MONITOR_LABEL} started");
        } else {
            rotator.record_init_error(InitError::MONITOR_TASK);
            error!("Rotator, monitor task {MONITOR_LABEL} FAILED to start");
        }

        if let Err(e) = rotator.unpark() {
            warn!("Rotator, startup unpark: {e}");
        }
        rotator.init_errors()
    }

    /// Run `f` with exclusive access to the controller.
    pub fn with<R>(&self, f: impl FnOnce(&mut Rotator<A, S>) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// Backlash compensation [steps].
    pub fn backlash(&self) -> i32 {
        self.inner.lock().backlash()
    }

    /// See [`Rotator::set_backlash`].
    pub fn set_backlash(&self, value: i32) -> Result<(), CommandError> {
        self.inner.lock().set_backlash(value)
    }

    /// See [`Rotator::slew`].
    pub fn slew(&self, direction: Direction) -> Result<(), CommandError> {
        self.inner.lock().slew(direction)
    }

    /// See [`Rotator::goto_target`].
    pub fn goto_target(&self, target: f64) -> Result<(), CommandError> {
        self.inner.lock().goto_target(target)
    }

    /// See [`Rotator::stop`].
    pub fn stop(&self) {
        self.inner.lock().stop();
    }

    /// See [`Rotator::park`].
    pub fn park(&self) -> Result<(), CommandError> {
        self.inner.lock().park()
    }

    /// See [`Rotator::unpark`].
    pub fn unpark(&self) -> Result<(), CommandError> {
        self.inner.lock().unpark()
    }

    /// See [`Rotator::report_park_fault`].
    pub fn report_park_fault(&self) -> TransitionResult {
        self.inner.lock().report_park_fault()
    }

    /// One monitor tick outside the scheduler (tests, manual stepping).
    pub fn monitor(&self) {
        self.inner.lock().monitor();
    }

    /// See [`Rotator::set_derotator_enabled`].
    pub fn set_derotator_enabled(&self, enabled: bool) {
        self.inner.lock().set_derotator_enabled(enabled);
    }

    /// See [`Rotator::set_derotator_reverse`].
    pub fn set_derotator_reverse(&self, reverse: bool) {
        self.inner.lock().set_derotator_reverse(reverse);
    }

    /// Current park state.
    pub fn park_state(&self) -> ParkState {
        self.inner.lock().park_state()
    }

    /// Status snapshot.
    pub fn status(&self) -> RotatorStatus {
        self.inner.lock().status()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

//! Periodic scheduler interface.
//!
//! The monitor is not self-timed: a scheduler owned by the surrounding
//! application calls it back at a fixed period until deregistered.

use std::time::Duration;

/// Callback invoked by the scheduler on every period.
pub type TaskCallback = Box<dyn FnMut() + Send + 'static>;

/// Priority tier of a periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum TaskPriority {
    /// Hard-deadline work (step generation, safety).
    Critical = 0,
    /// Control loops.
    High = 1,
    /// Communication and housekeeping.
    Normal = 2,
    /// Slow periodic supervision (rotator monitor).
    Background = 3,
}

/// Fixed-period task scheduler.
pub trait PeriodicScheduler {
    /// Register `callback` to run every `period`, first after `offset`.
    ///
    /// With `repeat == false` the callback runs once. Returns `false` if the
    /// task could not be registered.
    fn add(
        &mut self,
        period: Duration,
        offset: Duration,
        repeat: bool,
        priority: TaskPriority,
        callback: TaskCallback,
        label: &'static str,
    ) -> bool;
}

//! Thread-per-task periodic scheduler.
//!
//! Each registered task gets a named thread that sleeps to an absolute
//! deadline, runs the callback to completion and advances the deadline by
//! one period. A late tick is not made up: if the callback overruns, the
//! next deadline is re-anchored to now.
//!
//! `shutdown()` wakes every thread, stops them and joins them. It runs on
//! drop as well.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, warn};

use rotator_common::scheduler::{PeriodicScheduler, TaskCallback, TaskPriority};

/// Default cap on registered tasks.
pub const MAX_TASKS_DEFAULT: usize = 8;

// ─── Stop Signal ────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct StopSignal {
    stopped: Mutex<bool>,
    wake: Condvar,
}

impl StopSignal {
    /// Sleep until `deadline`. Returns `true` if stopped meanwhile.
    fn wait_until(&self, deadline: Instant) -> bool {
        let mut stopped = self.stopped.lock();
        while !*stopped {
            if self.wake.wait_until(&mut stopped, deadline).timed_out() {
                break;
            }
        }
        *stopped
    }

    fn stop(&self) {
        *self.stopped.lock() = true;
        self.wake.notify_all();
    }
}

// ─── Task Handle ────────────────────────────────────────────────────

/// Registered task.
#[derive(Debug)]
pub struct TaskInfo {
    /// Scheduler label.
    pub label: &'static str,
    /// Period between runs.
    pub period: Duration,
    /// Requested priority. Informational: tasks run on ordinary threads.
    pub priority: TaskPriority,
    thread: JoinHandle<()>,
}

// ─── Scheduler ──────────────────────────────────────────────────────

/// [`PeriodicScheduler`] backed by one OS thread per task.
#[derive(Debug)]
pub struct ThreadScheduler {
    tasks: Vec<TaskInfo>,
    signal: Arc<StopSignal>,
    max_tasks: usize,
}

impl Default for ThreadScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadScheduler {
    /// Scheduler accepting up to [`MAX_TASKS_DEFAULT`] tasks.
    pub fn new() -> Self {
        Self::with_capacity(MAX_TASKS_DEFAULT)
    }

    /// Scheduler accepting up to `max_tasks` tasks.
    pub fn with_capacity(max_tasks: usize) -> Self {
        Self {
            tasks: Vec::new(),
            signal: Arc::new(StopSignal::default()),
            max_tasks,
        }
    }

    /// Registered tasks.
    pub fn tasks(&self) -> &[TaskInfo] {
        &self.tasks
    }

    /// Stop and join every task. Idempotent.
    pub fn shutdown(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        self.signal.stop();
        for task in self.tasks.drain(..) {
            if task.thread.join().is_err() {
                error!("Task {} panicked", task.label);
            } else {
                debug!("Task {} stopped", task.label);
            }
        }
        info!("Scheduler shut down");
    }
}

impl PeriodicScheduler for ThreadScheduler {
    fn add(
        &mut self,
        period: Duration,
        offset: Duration,
        repeat: bool,
        priority: TaskPriority,
        mut callback: TaskCallback,
        label: &'static str,
    ) -> bool {
        if self.tasks.len() >= self.max_tasks {
            warn!("Task {label} refused: {} tasks registered", self.tasks.len());
            return false;
        }
        if period.is_zero() && repeat {
            warn!("Task {label} refused: zero period");
            return false;
        }

        let signal = Arc::clone(&self.signal);
        let spawned = thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                let mut deadline = Instant::now() + offset;
                loop {
                    if signal.wait_until(deadline) {
                        break;
                    }
                    callback();
                    if !repeat {
                        break;
                    }

                    deadline += period;
                    let now = Instant::now();
                    if deadline < now {
                        deadline = now + period;
                    }
                }
            });

        match spawned {
            Ok(thread) => {
                debug!("Task {label} started (period {period:?}, {priority:?})");
                self.tasks.push(TaskInfo {
                    label,
                    period,
                    priority,
                    thread,
                });
                true
            }
            Err(e) => {
                error!("Task {label} thread spawn failed: {e}");
                false
            }
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

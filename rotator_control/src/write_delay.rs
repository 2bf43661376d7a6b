//! Delayed position write.
//!
//! Persisting the coordinate after every small move would wear the store,
//! so the monitor keeps pushing a write deadline forward while the axis is
//! slewing or still sitting at the persisted coordinate. Once the axis has
//! been stationary somewhere else for longer than the delay, the deadline
//! passes and the coordinate is written.
//!
//! ```text
//! secs:        1  2  3  4  5  6  7  8  9  10
//! slewing:     ■  ■  ■  .  .  .  .  .  .  .
//! write_time:  6  7  8  8  8  8  8  8  8  8     (delay = 5)
//! due:         .  .  .  .  .  .  .  .  ■
//! ```

/// Second counter and write deadline.
#[derive(Debug, Clone)]
pub struct DelayedWrite {
    delay: u64,
    secs: u64,
    write_time: u64,
}

impl DelayedWrite {
    /// `delay` in monitor ticks (seconds). Zero disables delayed writes.
    pub const fn new(delay: u64) -> Self {
        Self {
            delay,
            secs: 0,
            write_time: delay,
        }
    }

    /// Advance the second counter. Returns the new count.
    #[inline]
    pub fn tick(&mut self) -> u64 {
        self.secs = self.secs.wrapping_add(1);
        self.secs
    }

    /// Push the deadline to `delay` seconds from now.
    #[inline]
    pub fn postpone(&mut self) {
        self.write_time = self.secs.saturating_add(self.delay);
    }

    /// Delayed writes configured.
    #[inline]
    pub const fn enabled(&self) -> bool {
        self.delay != 0
    }

    /// Deadline passed and writes are enabled.
    #[inline]
    pub const fn due(&self) -> bool {
        self.enabled() && self.secs > self.write_time
    }

    /// Seconds counted so far.
    #[inline]
    pub const fn secs(&self) -> u64 {
        self.secs
    }

    /// Current deadline.
    #[inline]
    pub const fn write_time(&self) -> u64 {
        self.write_time
    }

    /// Configured delay [s].
    #[inline]
    pub const fn delay(&self) -> u64 {
        self.delay
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

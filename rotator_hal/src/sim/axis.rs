//! Simulated rotator axis.
//!
//! `SimulatedAxis` integrates a single rotary axis with velocity and
//! acceleration limits:
//! - Goto: triangular/trapezoidal profile towards the target, snapped on arrival
//! - Slew: ramp to a constant rate, stops at the travel limits
//! - Stopping: abort deceleration to rest
//! - Idle: drifts at the base rate (field de-rotation)
//!
//! The instrument coordinate is `motor + index`; the step counter follows
//! the motor. Park positions are snapped to the step grid.

use parking_lot::{Mutex, MutexGuard};
use rotator_common::axis::{AxisError, AxisMotion, Direction};
use rotator_common::rotator::config::AxisConfig;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Velocity below which the axis counts as stopped [deg/s].
const STOP_VELOCITY: f64 = 1e-6;

/// Active motion of the simulated axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionMode {
    /// At rest (base rate drift only).
    Idle,
    /// Bounded move to the current target.
    Goto {
        /// Peak rate [deg/s].
        max_rate: f64,
        /// Acceleration [deg/s²].
        acceleration: f64,
    },
    /// Continuous motion.
    Slew {
        /// Direction of motion.
        direction: Direction,
        /// Cruise rate [deg/s].
        rate: f64,
    },
    /// Abort deceleration.
    Stopping,
}

/// Physics model of the rotator axis.
#[derive(Debug, Clone)]
pub struct SimulatedAxis {
    limit_min: f64,
    limit_max: f64,
    steps_per_degree: f64,
    /// Motor position relative to the step counter origin [deg].
    motor: f64,
    /// Instrument coordinate minus motor position [deg].
    index: f64,
    velocity: f64,
    target: f64,
    mode: MotionMode,
    enabled: bool,
    powered_down: bool,
    idle_time: f64,
    power_down_time: Option<Duration>,
    backlash_steps: i32,
    frequency_base: f64,
    frequency_max: f64,
    frequency_min: f64,
    frequency_slew: f64,
    acceleration_time: f64,
    abort_time: f64,
    synchronized: bool,
    initialized: bool,
    fail_init: bool,
    fault: bool,
}

impl SimulatedAxis {
    /// Create a disabled axis at coordinate 0.
    pub fn new(config: &AxisConfig) -> Self {
        Self {
            limit_min: config.limit_min,
            limit_max: config.limit_max,
            steps_per_degree: config.steps_per_degree,
            motor: 0.0,
            index: 0.0,
            velocity: 0.0,
            target: 0.0,
            mode: MotionMode::Idle,
            enabled: false,
            powered_down: false,
            idle_time: 0.0,
            power_down_time: None,
            backlash_steps: 0,
            frequency_base: 0.0,
            frequency_max: config.slew_rate,
            frequency_min: config.frequency_min,
            frequency_slew: config.slew_rate,
            acceleration_time: config.acceleration_time,
            abort_time: config.rapid_stop_time,
            synchronized: false,
            initialized: false,
            fail_init: false,
            fault: false,
        }
    }

    /// Advance the simulation by `dt`.
    pub fn update(&mut self, dt: Duration) {
        let dt = dt.as_secs_f64();
        if dt <= 0.0 {
            return;
        }

        if !self.enabled {
            self.velocity = 0.0;
            self.mode = MotionMode::Idle;
            return;
        }

        match self.mode {
            MotionMode::Idle => self.update_idle(dt),
            MotionMode::Goto {
                max_rate,
                acceleration,
            } => self.update_goto(dt, max_rate, acceleration),
            MotionMode::Slew { direction, rate } => self.update_slew(dt, direction.sign() * rate),
            MotionMode::Stopping => self.update_stopping(dt),
        }

        trace!(
            "Rotator axis: pos={:.4}, vel={:.4}, target={:.4}, mode={:?}",
            self.instrument(),
            self.velocity,
            self.target,
            self.mode
        );
    }

    fn update_idle(&mut self, dt: f64) {
        self.velocity = 0.0;
        if self.frequency_base != 0.0 {
            self.motor += self.frequency_base * dt;
            self.idle_time = 0.0;
            return;
        }

        self.idle_time += dt;
        if let Some(limit) = self.power_down_time {
            if !self.powered_down && self.idle_time >= limit.as_secs_f64() {
                self.powered_down = true;
                debug!("Rotator axis powered down after {:.1}s idle", self.idle_time);
            }
        }
    }

    fn update_goto(&mut self, dt: f64, max_rate: f64, acceleration: f64) {
        let tolerance = self.step_tolerance();
        let error = self.target - self.instrument();
        if error.abs() <= tolerance && self.velocity.abs() <= acceleration * dt {
            self.finish_goto();
            return;
        }

        // Triangular velocity profile
        let stopping_distance = self.velocity * self.velocity / (2.0 * acceleration);
        let desired_velocity = if error.abs() <= stopping_distance {
            error.signum() * (2.0 * acceleration * error.abs()).sqrt().min(max_rate)
        } else {
            error.signum() * max_rate
        };

        let max_change = acceleration * dt;
        self.velocity += (desired_velocity - self.velocity).clamp(-max_change, max_change);
        self.velocity = self.velocity.clamp(-max_rate, max_rate);
        self.motor += self.velocity * dt;

        let remaining = self.target - self.instrument();
        if remaining.signum() != error.signum() || remaining.abs() <= tolerance {
            self.finish_goto();
        }
    }

    fn finish_goto(&mut self) {
        self.motor = self.target - self.index;
        self.velocity = 0.0;
        self.mode = MotionMode::Idle;
        self.idle_time = 0.0;
        debug!("Rotator axis goto complete at {:.4}°", self.target);
    }

    fn update_slew(&mut self, dt: f64, desired_velocity: f64) {
        let acceleration = self.frequency_slew / self.acceleration_time;
        let max_change = acceleration * dt;
        self.velocity += (desired_velocity - self.velocity).clamp(-max_change, max_change);
        self.motor += self.velocity * dt;
        self.check_limits();
    }

    fn update_stopping(&mut self, dt: f64) {
        let deceleration = self.frequency_slew / self.abort_time * dt;
        if self.velocity > 0.0 {
            self.velocity = (self.velocity - deceleration).max(0.0);
        } else {
            self.velocity = (self.velocity + deceleration).min(0.0);
        }
        self.motor += self.velocity * dt;

        if self.velocity.abs() < STOP_VELOCITY {
            self.velocity = 0.0;
            self.mode = MotionMode::Idle;
            self.idle_time = 0.0;
        }
        self.check_limits();
    }

    /// Hard stop at the travel limits.
    fn check_limits(&mut self) {
        let instrument = self.instrument();
        let clamped = instrument.clamp(self.limit_min, self.limit_max);
        if clamped != instrument {
            self.motor = clamped - self.index;
            self.velocity = 0.0;
            self.mode = MotionMode::Idle;
            debug!("Rotator axis stopped at travel limit {:.3}°", clamped);
        }
    }

    /// Half a motor step [deg].
    fn step_tolerance(&self) -> f64 {
        0.5 / self.steps_per_degree
    }

    fn snap(&self, degrees: f64) -> f64 {
        (degrees * self.steps_per_degree).round() / self.steps_per_degree
    }

    fn to_steps(&self, degrees: f64) -> i64 {
        (degrees * self.steps_per_degree).round() as i64
    }

    fn instrument(&self) -> f64 {
        self.motor + self.index
    }

    fn check_motion_allowed(&self) -> Result<(), AxisError> {
        if !self.initialized {
            return Err(AxisError::NoController);
        }
        if self.fault {
            return Err(AxisError::Fault);
        }
        if !self.enabled {
            return Err(AxisError::Disabled);
        }
        Ok(())
    }

    /// Active motion.
    pub fn mode(&self) -> MotionMode {
        self.mode
    }

    /// Current velocity [deg/s].
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Whether the motor is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Whether the idle power-down has kicked in.
    pub fn is_powered_down(&self) -> bool {
        self.powered_down
    }

    /// Configured backlash compensation [steps].
    pub fn backlash_steps(&self) -> i32 {
        self.backlash_steps
    }

    /// Current base rate [deg/s].
    pub fn frequency_base(&self) -> f64 {
        self.frequency_base
    }

    /// Current goto target [deg].
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Make the next `init()` fail with [`AxisError::NoController`].
    pub fn set_fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    /// Latch or clear a mechanism fault. A faulted axis rejects motion.
    pub fn set_fault(&mut self, fault: bool) {
        self.fault = fault;
        if fault {
            self.velocity = 0.0;
            self.mode = MotionMode::Idle;
        }
    }
}

impl AxisMotion for SimulatedAxis {
    fn init(&mut self) -> Result<(), AxisError> {
        if self.fail_init {
            return Err(AxisError::NoController);
        }
        self.initialized = true;
        Ok(())
    }

    fn enable(&mut self, on: bool) {
        self.enabled = on;
        self.powered_down = false;
        self.idle_time = 0.0;
        if !on {
            self.velocity = 0.0;
            self.mode = MotionMode::Idle;
        }
    }

    fn instrument_coordinate(&self) -> f64 {
        self.instrument()
    }

    fn set_instrument_coordinate(&mut self, degrees: f64) {
        self.index = degrees - self.motor;
    }

    fn set_instrument_coordinate_park(&mut self, degrees: f64) {
        self.index = self.snap(degrees) - self.motor;
    }

    fn set_target_coordinate(&mut self, degrees: f64) {
        self.target = degrees;
    }

    fn set_target_coordinate_park(&mut self, degrees: f64) {
        self.target = self.snap(degrees);
    }

    fn is_slewing(&self) -> bool {
        self.mode != MotionMode::Idle
    }

    fn at_target(&self) -> bool {
        self.mode == MotionMode::Idle && (self.target - self.instrument()).abs() <= self.step_tolerance()
    }

    fn set_backlash_steps(&mut self, steps: i32) {
        self.backlash_steps = steps;
    }

    fn set_frequency_base(&mut self, rate: f64) {
        self.frequency_base = rate;
    }

    fn set_frequency_max(&mut self, rate: f64) {
        self.frequency_max = rate;
    }

    fn set_frequency_min(&mut self, rate: f64) {
        self.frequency_min = rate;
    }

    fn set_frequency_slew(&mut self, rate: f64) {
        self.frequency_slew = rate;
    }

    fn set_slew_acceleration_time(&mut self, seconds: f64) {
        self.acceleration_time = seconds;
    }

    fn set_slew_acceleration_time_abort(&mut self, seconds: f64) {
        self.abort_time = seconds;
    }

    fn auto_slew(&mut self, direction: Direction, rate: f64) -> Result<(), AxisError> {
        self.check_motion_allowed()?;
        if matches!(self.mode, MotionMode::Goto { .. } | MotionMode::Stopping) {
            return Err(AxisError::InMotion);
        }

        let instrument = self.instrument();
        match direction {
            Direction::Forward if instrument >= self.limit_max => {
                return Err(AxisError::LimitMax {
                    target: instrument,
                    limit: self.limit_max,
                });
            }
            Direction::Reverse if instrument <= self.limit_min => {
                return Err(AxisError::LimitMin {
                    target: instrument,
                    limit: self.limit_min,
                });
            }
            _ => {}
        }

        let rate = rate.clamp(self.frequency_min, self.frequency_max);
        self.powered_down = false;
        self.mode = MotionMode::Slew { direction, rate };
        debug!("Rotator axis slew {:?} at {:.3}°/s", direction, rate);
        Ok(())
    }

    fn auto_goto(&mut self, ramp: f64, max_rate: f64) -> Result<(), AxisError> {
        self.check_motion_allowed()?;
        if self.mode != MotionMode::Idle {
            return Err(AxisError::InMotion);
        }
        if self.target < self.limit_min {
            return Err(AxisError::LimitMin {
                target: self.target,
                limit: self.limit_min,
            });
        }
        if self.target > self.limit_max {
            return Err(AxisError::LimitMax {
                target: self.target,
                limit: self.limit_max,
            });
        }

        let max_rate = max_rate.clamp(self.frequency_min, self.frequency_max);
        // v² = 2·a·d over the ramp distance
        let acceleration = if ramp > 0.0 {
            max_rate * max_rate / (2.0 * ramp)
        } else {
            self.frequency_slew / self.acceleration_time
        };

        self.powered_down = false;
        self.mode = MotionMode::Goto {
            max_rate,
            acceleration,
        };
        debug!(
            "Rotator axis goto {:.4}° -> {:.4}° (peak {:.3}°/s)",
            self.instrument(),
            self.target,
            max_rate
        );
        Ok(())
    }

    fn auto_slew_stop(&mut self) {
        if self.mode != MotionMode::Idle {
            self.mode = MotionMode::Stopping;
        }
    }

    fn set_synchronized(&mut self, synchronized: bool) {
        self.synchronized = synchronized;
    }

    fn synchronized(&self) -> bool {
        self.synchronized
    }

    fn set_power_down_time(&mut self, time: Duration) {
        self.power_down_time = Some(time);
    }

    fn reset_position_steps(&mut self, steps: i64) {
        self.motor = steps as f64 / self.steps_per_degree;
        self.index = 0.0;
        self.target = self.motor;
        self.velocity = 0.0;
        self.mode = MotionMode::Idle;
    }

    fn instrument_coordinate_steps(&self) -> i64 {
        self.to_steps(self.instrument())
    }

    fn motor_position_steps(&self) -> i64 {
        self.to_steps(self.motor)
    }

    fn target_coordinate_steps(&self) -> i64 {
        self.to_steps(self.target)
    }
}

// ─── Shared Handle ──────────────────────────────────────────────────

/// Cloneable handle to a [`SimulatedAxis`].
///
/// The rotator owns one clone as its [`AxisMotion`]; a physics task (or a
/// test) keeps another to advance the simulation.
#[derive(Debug, Clone)]
pub struct SimAxisHandle {
    inner: Arc<Mutex<SimulatedAxis>>,
}

impl SimAxisHandle {
    /// Wrap an axis.
    pub fn new(axis: SimulatedAxis) -> Self {
        Self {
            inner: Arc::new(Mutex::new(axis)),
        }
    }

    /// Lock the underlying axis.
    pub fn lock(&self) -> MutexGuard<'_, SimulatedAxis> {
        self.inner.lock()
    }

    /// Advance the simulation by `dt`.
    pub fn update(&self, dt: Duration) {
        self.inner.lock().update(dt);
    }

    /// Advance the simulation in `step` increments until the axis is idle
    /// or `limit` has elapsed. Returns the simulated time spent.
    pub fn run_until_idle(&self, step: Duration, limit: Duration) -> Duration {
        let mut elapsed = Duration::ZERO;
        while elapsed < limit {
            let mut axis = self.inner.lock();
            if !axis.is_slewing() {
                break;
            }
            axis.update(step);
            elapsed += step;
        }
        elapsed
    }
}

impl AxisMotion for SimAxisHandle {
    fn init(&mut self) -> Result<(), AxisError> {
        self.inner.lock().init()
    }

    fn enable(&mut self, on: bool) {
        self.inner.lock().enable(on);
    }

    fn instrument_coordinate(&self) -> f64 {
        self.inner.lock().instrument_coordinate()
    }

    fn set_instrument_coordinate(&mut self, degrees: f64) {
        self.inner.lock().set_instrument_coordinate(degrees);
    }

    fn set_instrument_coordinate_park(&mut self, degrees: f64) {
        self.inner.lock().set_instrument_coordinate_park(degrees);
    }

    fn set_target_coordinate(&mut self, degrees: f64) {
        self.inner.lock().set_target_coordinate(degrees);
    }

    fn set_target_coordinate_park(&mut self, degrees: f64) {
        self.inner.lock().set_target_coordinate_park(degrees);
    }

    fn is_slewing(&self) -> bool {
        self.inner.lock().is_slewing()
    }

    fn at_target(&self) -> bool {
        self.inner.lock().at_target()
    }

    fn set_backlash_steps(&mut self, steps: i32) {
        self.inner.lock().set_backlash_steps(steps);
    }

    fn set_frequency_base(&mut self, rate: f64) {
        self.inner.lock().set_frequency_base(rate);
    }

    fn set_frequency_max(&mut self, rate: f64) {
        self.inner.lock().set_frequency_max(rate);
    }

    fn set_frequency_min(&mut self, rate: f64) {
        self.inner.lock().set_frequency_min(rate);
    }

    fn set_frequency_slew(&mut self, rate: f64) {
        self.inner.lock().set_frequency_slew(rate);
    }

    fn set_slew_acceleration_time(&mut self, seconds: f64) {
        self.inner.lock().set_slew_acceleration_time(seconds);
    }

    fn set_slew_acceleration_time_abort(&mut self, seconds: f64) {
        self.inner.lock().set_slew_acceleration_time_abort(seconds);
    }

    fn auto_slew(&mut self, direction: Direction, rate: f64) -> Result<(), AxisError> {
        self.inner.lock().auto_slew(direction, rate)
    }

    fn auto_goto(&mut self, ramp: f64, max_rate: f64) -> Result<(), AxisError> {
        self.inner.lock().auto_goto(ramp, max_rate)
    }

    fn auto_slew_stop(&mut self) {
        self.inner.lock().auto_slew_stop();
    }

    fn set_synchronized(&mut self, synchronized: bool) {
        self.inner.lock().set_synchronized(synchronized);
    }

    fn synchronized(&self) -> bool {
        self.inner.lock().synchronized()
    }

    fn set_power_down_time(&mut self, time: Duration) {
        self.inner.lock().set_power_down_time(time);
    }

    fn reset_position_steps(&mut self, steps: i64) {
        self.inner.lock().reset_position_steps(steps);
    }

    fn instrument_coordinate_steps(&self) -> i64 {
        self.inner.lock().instrument_coordinate_steps()
    }

    fn motor_position_steps(&self) -> i64 {
        self.inner.lock().motor_position_steps()
    }

    fn target_coordinate_steps(&self) -> i64 {
        self.inner.lock().target_coordinate_steps()
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

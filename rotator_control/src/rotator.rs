//! Rotator controller.
//!
//! [`Rotator`] owns the settings record, the park state machine, the
//! de-rotation flags and the delayed-write deadline. It drives an
//! [`AxisMotion`] and persists to a [`SettingsStore`]; mount pointing is
//! optional.
//!
//! ## Lifecycle
//!
//! 1. [`Rotator::init`] loads (or writes default) settings and configures the axis
//! 2. The caller registers [`Rotator::monitor`] at 1 Hz and calls [`Rotator::unpark`]
//!    (see [`crate::service::RotatorService::init`])
//! 3. Commands run on the caller's thread; the monitor advances park
//!    sequences, applies de-rotation and writes the coordinate when it settles
//!
//! The controller itself is not synchronized; `RotatorService` wraps it in
//! a mutex so every command and monitor tick is one critical section.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use rotator_common::axis::{AxisMotion, Direction};
use rotator_common::consts::BACKLASH_MAX;
use rotator_common::pointing::PointingSource;
use rotator_common::rotator::config::{AxisConfig, RotatorConfig, StoreConfig};
use rotator_common::rotator::error::{CommandError, InitError};
use rotator_common::rotator::settings::{ENCODED_LEN, RotatorSettings, SettingsError};
use rotator_common::rotator::state::ParkState;
use rotator_common::store::SettingsStore;

use crate::derotation::Derotator;
use crate::state::park::{ParkAction, ParkEvent, ParkStateMachine, TransitionResult, UnparkAction};
use crate::write_delay::DelayedWrite;

// ─── Status ─────────────────────────────────────────────────────────

/// Point-in-time snapshot of the controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RotatorStatus {
    /// Current park state.
    pub park_state: ParkState,
    /// Live instrument coordinate [deg].
    pub coordinate: f64,
    /// Persisted coordinate [deg].
    pub position: f64,
    /// Backlash compensation [steps].
    pub backlash: i32,
    /// De-rotation requested.
    pub derotator_enabled: bool,
    /// De-rotation sign reversed.
    pub derotator_reverse: bool,
    /// Axis slewing or in a goto.
    pub slewing: bool,
    /// Monitor ticks since start.
    pub secs: u64,
    /// Tick after which a pending position write falls due.
    pub write_time: u64,
    /// Failed store writes since start.
    pub persist_failures: u64,
    /// Flags raised during init.
    pub init_errors: InitError,
}

// ─── Rotator ────────────────────────────────────────────────────────

/// Single-axis rotator controller.
pub struct Rotator<A: AxisMotion, S: SettingsStore> {
    axis: A,
    store: S,
    pointing: Option<Arc<dyn PointingSource>>,
    axis_config: AxisConfig,
    store_config: StoreConfig,
    settings: RotatorSettings,
    park: ParkStateMachine,
    derotator: Derotator,
    write: DelayedWrite,
    strict: bool,
    /// Cleared when the declared record is too small to hold the settings.
    record_usable: bool,
    init_errors: InitError,
    persist_failures: u64,
}

impl<A: AxisMotion, S: SettingsStore> Rotator<A, S> {
    /// Create an uninitialised controller. Call [`Rotator::init`] next.
    pub fn new(axis: A, store: S, config: &RotatorConfig) -> Self {
        let settings = RotatorSettings::default();
        Self {
            axis,
            store,
            pointing: None,
            axis_config: config.axis.clone(),
            store_config: config.store.clone(),
            park: ParkStateMachine::new(settings.park_state),
            settings,
            derotator: Derotator::new(config.rotator.derotate, config.rotator.derotate_reverse),
            write: DelayedWrite::new(config.rotator.write_delay),
            strict: config.rotator.strict_parking(),
            record_usable: true,
            init_errors: InitError::empty(),
            persist_failures: 0,
        }
    }

    /// Attach a mount/site pointing source for de-rotation.
    pub fn with_pointing(mut self, pointing: Arc<dyn PointingSource>) -> Self {
        self.pointing = Some(pointing);
        self
    }

    // ─── Initialization ─────────────────────────────────────────────

    /// Load settings and configure the axis.
    ///
    /// Returns the accumulated init flags. With [`InitError::DRIVER`] set
    /// the axis is unusable and the caller must not start the monitor.
    pub fn init(&mut self) -> InitError {
        if self.store_config.record_size < ENCODED_LEN {
            self.init_errors |= InitError::NV;
            self.record_usable = false;
            error!(
                "Rotator, settings record size {} < {} bytes, using defaults",
                self.store_config.record_size, ENCODED_LEN
            );
        } else if self
            .store_config
            .base_address
            .checked_add(ENCODED_LEN)
            .is_none_or(|end| end > self.store.capacity())
        {
            self.init_errors |= InitError::NV;
            self.record_usable = false;
            error!(
                "Rotator, settings record at {} does not fit the {} byte store, using defaults",
                self.store_config.base_address,
                self.store.capacity()
            );
        }

        if self.record_usable {
            if !self.store.has_valid_key() {
                info!("Rotator, writing defaults to NV");
                if !self.persist() {
                    self.init_errors |= InitError::STORE;
                }
            }
            self.load_settings();
        }

        info!("Rotator, init axis");
        if let Err(e) = self.axis.init() {
            self.init_errors |= InitError::DRIVER;
            error!("Rotator, no motion controller ({e}), exiting init");
            return self.init_errors;
        }

        let axis = &self.axis_config;
        self.axis.reset_position_steps(0);
        self.axis.set_backlash_steps(self.settings.backlash);
        self.axis.set_frequency_max(axis.slew_rate);
        self.axis.set_frequency_min(axis.frequency_min);
        self.axis.set_frequency_slew(axis.slew_rate);
        self.axis.set_slew_acceleration_time(axis.acceleration_time);
        self.axis.set_slew_acceleration_time_abort(axis.rapid_stop_time);
        if axis.power_down {
            match Duration::try_from_secs_f64(axis.power_down_time) {
                Ok(time) => self.axis.set_power_down_time(time),
                Err(e) => warn!(
                    "Rotator, power_down_time {} unusable ({e}), power-down disabled",
                    axis.power_down_time
                ),
            }
        }

        if self.strict {
            info!("Rotator, strict parking, no delayed position writes");
        } else {
            debug!("Rotator, delayed position write after {}s", self.write.delay());
        }

        self.init_errors
    }

    fn load_settings(&mut self) {
        let mut record = [0u8; ENCODED_LEN];
        if let Err(e) = self
            .store
            .read_bytes(self.store_config.base_address, &mut record)
        {
            self.init_errors |= InitError::STORE;
            error!("Rotator, settings read failed ({e}), using defaults");
            return;
        }

        let mut settings = match RotatorSettings::decode(&record) {
            Ok(settings) => settings,
            Err(e) => {
                self.init_errors |= InitError::NV;
                error!("Rotator, {e}, using defaults");
                return;
            }
        };

        let repairs = settings.repair(self.axis_config.limit_min, self.axis_config.limit_max);
        for repair in &repairs {
            error!("Rotator, {repair}");
        }
        if !repairs.is_empty() {
            self.init_errors |= InitError::VALUE;
        }

        debug!(
            "Rotator, loaded settings: backlash={} position={:.4}° state={}",
            settings.backlash, settings.position, settings.park_state
        );
        if settings.park_state.is_transition() {
            warn!(
                "Rotator, restarted while {}, sequence was interrupted",
                settings.park_state
            );
        }
        self.park = ParkStateMachine::new(settings.park_state);
        self.settings = settings;
    }

    /// Add a flag raised outside [`Rotator::init`] (monitor registration).
    pub fn record_init_error(&mut self, flag: InitError) {
        self.init_errors |= flag;
    }

    // ─── Persistence ────────────────────────────────────────────────

    /// Write the settings record. Returns `false` on failure.
    ///
    /// Failures are logged and counted; in-memory state stays authoritative.
    fn persist(&mut self) -> bool {
        if !self.record_usable {
            trace!("Rotator, settings record unusable, write skipped");
            return true;
        }

        self.settings.park_state = self.park.state();
        let result = self
            .settings
            .encode()
            .map_err(|e: SettingsError| e.to_string())
            .and_then(|bytes| {
                self.store
                    .update_bytes(self.store_config.base_address, &bytes)
                    .map_err(|e| e.to_string())
            });

        match result {
            Ok(()) => true,
            Err(e) => {
                self.persist_failures += 1;
                error!("Rotator, settings write failed: {e}");
                false
            }
        }
    }

    fn goto_ramp(&self) -> (f64, f64) {
        (self.axis_config.goto_ramp(), self.axis_config.slew_rate)
    }

    // ─── Commands ───────────────────────────────────────────────────

    /// Backlash compensation [steps].
    pub fn backlash(&self) -> i32 {
        self.settings.backlash
    }

    /// Set backlash compensation [steps], `0..=BACKLASH_MAX`.
    pub fn set_backlash(&mut self, value: i32) -> Result<(), CommandError> {
        if !(0..=BACKLASH_MAX).contains(&value) {
            return Err(CommandError::ParamRange {
                value: i64::from(value),
                min: 0,
                max: i64::from(BACKLASH_MAX),
            });
        }
        self.park.check_motion()?;

        self.settings.backlash = value;
        self.persist();
        self.axis.set_backlash_steps(value);
        debug!("Rotator, backlash set to {value} steps");
        Ok(())
    }

    /// Start continuous motion at the slew rate.
    pub fn slew(&mut self, direction: Direction) -> Result<(), CommandError> {
        self.park.check_motion()?;

        self.axis.set_frequency_base(0.0);
        self.axis
            .auto_slew(direction, self.axis_config.slew_rate)?;
        Ok(())
    }

    /// Move to `target` [deg].
    pub fn goto_target(&mut self, target: f64) -> Result<(), CommandError> {
        self.park.check_motion()?;

        info!("Rotator, goto target coordinate {target:.4}°");
        self.axis.set_frequency_base(0.0);
        self.axis.set_target_coordinate(target);
        let (ramp, rate) = self.goto_ramp();
        self.axis.auto_goto(ramp, rate)?;
        Ok(())
    }

    /// Abort any slew or goto with the rapid-stop deceleration.
    pub fn stop(&mut self) {
        debug!("Rotator, stop");
        self.axis.auto_slew_stop();
    }

    /// Park at the current coordinate.
    pub fn park(&mut self) -> Result<(), CommandError> {
        if self.park.check_park()? == ParkAction::AlreadyParked {
            return Ok(());
        }

        info!("Rotator, parking");
        let derotator = self.derotator;
        self.derotator.enabled = false;
        self.axis.set_frequency_base(0.0);
        self.axis.set_backlash_steps(0);

        let position = self.axis.instrument_coordinate();
        self.axis.set_target_coordinate_park(position);
        let (ramp, rate) = self.goto_ramp();
        if let Err(e) = self.axis.auto_goto(ramp, rate) {
            self.derotator = derotator;
            self.axis.set_backlash_steps(self.settings.backlash);
            warn!("Rotator, park rejected: {e}");
            return Err(e.into());
        }

        self.settings.position = position;
        self.transition(ParkEvent::ParkStarted);
        Ok(())
    }

    /// Restore the operating state from the persisted position.
    pub fn unpark(&mut self) -> Result<(), CommandError> {
        let action = self.park.check_unpark(self.strict)?;

        self.axis.enable(true);
        let position = self.settings.position;
        info!("Rotator, unpark position {position:.4}°");

        if action == UnparkAction::Resync {
            self.axis.set_instrument_coordinate(position);
            self.persist();
            return Ok(());
        }

        self.axis.set_backlash_steps(0);
        self.axis.set_instrument_coordinate_park(position);
        self.axis.set_backlash_steps(self.settings.backlash);
        self.axis.set_target_coordinate(position);

        let (ramp, rate) = self.goto_ramp();
        if let Err(e) = self.axis.auto_goto(ramp, rate) {
            warn!("Rotator, unpark rejected: {e}");
            return Err(e.into());
        }

        self.transition(ParkEvent::UnparkStarted);
        Ok(())
    }

    /// Axis-level fault during a park or unpark sequence.
    ///
    /// Moves `Parking`/`Unparking` to `ParkFailed`; rejected elsewhere.
    pub fn report_park_fault(&mut self) -> TransitionResult {
        let from = self.park.state();
        let result = self.transition(ParkEvent::Fault);
        match result {
            TransitionResult::Ok(_) => {
                self.axis.auto_slew_stop();
                error!("Rotator, park fault while {from}, park failed");
            }
            TransitionResult::Rejected(reason) => {
                warn!("Rotator, park fault ignored: {reason}");
            }
        }
        result
    }

    fn transition(&mut self, event: ParkEvent) -> TransitionResult {
        let result = self.park.handle_event(event);
        if let TransitionResult::Ok(state) = result {
            debug!("Rotator, park state -> {state}");
            self.persist();
        }
        result
    }

    // ─── De-rotation ────────────────────────────────────────────────

    /// Enable or disable de-rotation. Disabling clears the base rate.
    pub fn set_derotator_enabled(&mut self, enabled: bool) {
        self.derotator.enabled = enabled;
        if !enabled {
            self.axis.set_frequency_base(0.0);
        }
        info!("Rotator, derotation {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Reverse the de-rotation sign.
    pub fn set_derotator_reverse(&mut self, reverse: bool) {
        self.derotator.reverse = reverse;
    }

    /// De-rotation requested.
    pub fn derotator_enabled(&self) -> bool {
        self.derotator.enabled
    }

    /// De-rotation sign reversed.
    pub fn derotator_reverse(&self) -> bool {
        self.derotator.reverse
    }

    // ─── Monitor ────────────────────────────────────────────────────

    /// One 1 Hz monitor tick. Called by the scheduler only.
    pub fn monitor(&mut self) {
        let secs = self.write.tick();

        let slewing = self.axis.is_slewing();
        if slewing || self.axis.instrument_coordinate() == self.settings.position {
            self.write.postpone();
        }
        if slewing {
            trace!("Rotator, monitor {secs}: slewing");
            return;
        }

        match self.park.state() {
            ParkState::Parking => {
                if self.axis.at_target() {
                    self.axis.enable(false);
                    self.transition(ParkEvent::ArrivedAtTarget);
                    info!("Rotator, parked at {:.4}°", self.settings.position);

                    let offset =
                        self.axis.instrument_coordinate_steps() - self.axis.motor_position_steps();
                    debug!(
                        "Rotator, park motor target {} position {}",
                        self.axis.target_coordinate_steps() - offset,
                        self.axis.motor_position_steps()
                    );
                }
            }
            ParkState::Unparking => {
                if self.axis.at_target() {
                    self.transition(ParkEvent::ArrivedAtTarget);
                    info!("Rotator, unparked at {:.4}°", self.settings.position);
                }
            }
            ParkState::Unparked => {
                if let Some(rate) = self.derotator.base_rate(self.pointing.as_deref()) {
                    self.axis.set_synchronized(true);
                    self.axis.set_frequency_base(rate);
                    trace!("Rotator, derotation rate {rate:.6}°/s");
                }

                if self.write.due() {
                    self.settings.position = self.axis.instrument_coordinate();
                    self.persist();
                    info!("Rotator, writing position {:.4}° to NV", self.settings.position);
                }
            }
            ParkState::Parked | ParkState::ParkFailed => {}
        }
    }

    // ─── Accessors ──────────────────────────────────────────────────

    /// Current park state.
    pub fn park_state(&self) -> ParkState {
        self.park.state()
    }

    /// In-memory settings record.
    pub fn settings(&self) -> RotatorSettings {
        RotatorSettings {
            park_state: self.park.state(),
            ..self.settings
        }
    }

    /// Flags raised during init.
    pub fn init_errors(&self) -> InitError {
        self.init_errors
    }

    /// Failed store writes since start.
    pub fn persist_failures(&self) -> u64 {
        self.persist_failures
    }

    /// Controlled axis.
    pub fn axis(&self) -> &A {
        &self.axis
    }

    /// Settings store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable settings store access.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Snapshot for operators and logs.
    pub fn status(&self) -> RotatorStatus {
        RotatorStatus {
            park_state: self.park.state(),
            coordinate: self.axis.instrument_coordinate(),
            position: self.settings.position,
            backlash: self.settings.backlash,
            derotator_enabled: self.derotator.enabled,
            derotator_reverse: self.derotator.reverse,
            slewing: self.axis.is_slewing(),
            secs: self.write.secs(),
            write_time: self.write.write_time(),
            persist_failures: self.persist_failures,
            init_errors: self.init_errors,
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

//! Park lifecycle transitions.
//!
//! Unparked → Parking → Parked → Unparking → Unparked, with ParkFailed as
//! a terminal sink reachable only through an axis fault report.
//!
//! Commands first ask a guard (`check_park`, `check_unpark`,
//! `check_motion`) what they are allowed to do, issue the axis request, and
//! only on acceptance feed the matching event into [`ParkStateMachine::handle_event`].
//! The monitor feeds `ArrivedAtTarget`.

use rotator_common::rotator::error::CommandError;
use rotator_common::rotator::state::ParkState;

/// Result of a ParkState transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionResult {
    /// Transition succeeded, carrying the new state.
    Ok(ParkState),
    /// Transition rejected, with the reason.
    Rejected(&'static str),
}

/// Event that can trigger a park-state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkEvent {
    /// Axis accepted the park goto.
    ParkStarted,
    /// Axis accepted the unpark goto.
    UnparkStarted,
    /// Axis stopped at its target.
    ArrivedAtTarget,
    /// Axis-level fault during a park or unpark sequence.
    Fault,
}

/// What `park()` should do in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParkAction {
    /// Already parked: succeed without side effects.
    AlreadyParked,
    /// Start the park sequence.
    Begin,
}

/// What `unpark()` should do in the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnparkAction {
    /// Never parked: restore the coordinate in place, no motion.
    Resync,
    /// Start the unpark sequence from the park datum.
    Begin,
}

/// Holder of the current park state.
#[derive(Debug, Clone)]
pub struct ParkStateMachine {
    state: ParkState,
}

impl ParkStateMachine {
    /// Start in `state` (as loaded from the settings store).
    pub const fn new(state: ParkState) -> Self {
        Self { state }
    }

    /// Current state.
    #[inline]
    pub const fn state(&self) -> ParkState {
        self.state
    }

    /// Attempt a transition given an event.
    pub fn handle_event(&mut self, event: ParkEvent) -> TransitionResult {
        use ParkEvent::*;
        use ParkState::*;

        let next = match (self.state, event) {
            (Unparked, ParkStarted) => Parking,
            (Parking, ArrivedAtTarget) => Parked,

            (Parked, UnparkStarted) => Unparking,
            (Unparking, ArrivedAtTarget) => Unparked,

            (Parking, Fault) | (Unparking, Fault) => ParkFailed,

            _ => return TransitionResult::Rejected(invalid_transition_reason(self.state, event)),
        };

        self.state = next;
        TransitionResult::Ok(next)
    }

    /// Gate for motion commands and backlash changes.
    #[inline]
    pub fn check_motion(&self) -> Result<(), CommandError> {
        if self.state.is_motion_blocked() {
            Err(CommandError::Parked)
        } else {
            Ok(())
        }
    }

    /// Guard for `park()`.
    pub fn check_park(&self) -> Result<ParkAction, CommandError> {
        match self.state {
            ParkState::Parked => Ok(ParkAction::AlreadyParked),
            ParkState::Parking | ParkState::Unparking | ParkState::ParkFailed => {
                Err(CommandError::ParkFailed)
            }
            ParkState::Unparked => Ok(ParkAction::Begin),
        }
    }

    /// Guard for `unpark()`. `strict` requires the rotator to be parked.
    pub fn check_unpark(&self, strict: bool) -> Result<UnparkAction, CommandError> {
        match self.state {
            ParkState::Parking | ParkState::Unparking | ParkState::ParkFailed => {
                Err(CommandError::ParkFailed)
            }
            ParkState::Unparked if strict => Err(CommandError::NotParked),
            ParkState::Unparked => Ok(UnparkAction::Resync),
            ParkState::Parked => Ok(UnparkAction::Begin),
        }
    }
}

fn invalid_transition_reason(state: ParkState, event: ParkEvent) -> &'static str {
    use ParkEvent::*;
    use ParkState::*;
    match (state, event) {
        (ParkFailed, _) => "ParkFailed: terminal, no transition allowed",
        (_, Fault) => "Fault only applies while parking or unparking",
        (_, ArrivedAtTarget) => "ArrivedAtTarget only applies while parking or unparking",
        (_, ParkStarted) => "ParkStarted only allowed from Unparked",
        (_, UnparkStarted) => "UnparkStarted only allowed from Parked",
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

//! Simulation collaborators.
//!
//! Software stand-ins for the rotator axis and the mount, for development
//! and testing without hardware.

mod axis;
mod mount;

pub use axis::{MotionMode, SimAxisHandle, SimulatedAxis};
pub use mount::{SIDEREAL_RATE_DEG_PER_S, SimulatedMount};

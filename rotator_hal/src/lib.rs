//! # Rotator HAL Library
//!
//! Reference implementations of the collaborators the rotator controller
//! drives. Used by the `rotator_control` binary and by the integration
//! tests; none of them talk to hardware.
//!
//! # Module Structure
//!
//! - [`sim`] - Simulated rotator axis and alt-azimuth mount
//! - [`store`] - In-memory and file-backed settings stores
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      rotator_control                         │
//! │   Rotator<A: AxisMotion, S: SettingsStore> + PointingSource  │
//! └──────┬────────────────────┬─────────────────────┬────────────┘
//!        ▼                    ▼                     ▼
//! ┌──────────────┐   ┌─────────────────┐   ┌─────────────────┐
//! │ SimAxisHandle│   │ MemoryStore /   │   │ SimulatedMount  │
//! │ (physics)    │   │ FileStore       │   │ (sidereal HA)   │
//! └──────────────┘   └─────────────────┘   └─────────────────┘
//! ```

#![warn(missing_docs)]

pub mod sim;
pub mod store;

pub use crate::sim::{SimAxisHandle, SimulatedAxis, SimulatedMount};
pub use crate::store::{FileStore, MemoryStore};

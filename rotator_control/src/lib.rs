//! # Rotator Control
//!
//! Controller for a single-axis telescope instrument rotator.
//!
//! ## Responsibilities
//!
//! - Park lifecycle: Unparked → Parking → Parked → Unparking → Unparked,
//!   persisted across power cycles
//! - 1 Hz monitor: completes park sequences, applies field de-rotation on
//!   alt-azimuth mounts, writes the coordinate once the axis has settled
//! - Command gating: motion is only accepted while unparked
//!
//! ## Modules
//!
//! - [`rotator`] - Controller core ([`rotator::Rotator`])
//! - [`service`] - Lock-guarded shared handle and monitor registration
//! - [`state`] - Park state machine
//! - [`derotation`] - Parallactic angle and rate
//! - [`write_delay`] - Delayed position write deadline
//! - [`scheduler`] - Thread-backed periodic scheduler
//! - [`config`] - TOML loading
//! - [`error`] - Startup errors

pub mod config;
pub mod derotation;
pub mod error;
pub mod rotator;
pub mod scheduler;
pub mod service;
pub mod state;
pub mod write_delay;

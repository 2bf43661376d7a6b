//! Rotator Common Library
//!
//! Shared constants, settings record, configuration loading and the
//! collaborator traits consumed by the rotator controller.
//!
//! # Module Structure
//!
//! - [`rotator`] - Park state, command/init errors, persisted settings, config
//! - [`axis`] - Axis motion interface (external motion controller contract)
//! - [`store`] - Durable settings store interface
//! - [`scheduler`] - Periodic scheduler interface
//! - [`pointing`] - Mount/site pointing source interface
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use rotator_common::prelude::*;
//!
//! assert!(!ParkState::Unparked.is_motion_blocked());
//! assert!(ParkState::Parked.is_motion_blocked());
//! ```

pub mod axis;
pub mod config;
pub mod consts;
pub mod pointing;
pub mod prelude;
pub mod rotator;
pub mod scheduler;
pub mod store;

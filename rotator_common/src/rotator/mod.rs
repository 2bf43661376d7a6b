//! Rotator shared types.
//!
//! Everything the controller and its callers agree on: park state enum,
//! command/init errors, persisted settings record and configuration.

pub mod config;
pub mod error;
pub mod settings;
pub mod state;

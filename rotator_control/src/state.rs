//! State machine module root.

pub mod park;

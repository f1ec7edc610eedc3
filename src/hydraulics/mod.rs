//! Hydraulic geometry of a cross-section at a trial water level.

pub mod sweep;

pub use sweep::*;

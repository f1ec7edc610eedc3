//! Multi-run consensus: seeded repeated runs and their reconciliation.

pub mod aggregate;
pub mod runner;

pub use aggregate::*;
pub use runner::*;

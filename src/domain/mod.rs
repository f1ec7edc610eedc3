//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the validated cross-section geometry (`CrossSectionProfile`)
//! - run configuration (`RunConfig` and its sections)
//! - per-run and per-cross-section outputs (`BankfullResult`, `ConsensusResult`)

pub mod profile;
pub mod types;

pub use profile::*;
pub use types::*;

//! `hydxs` library crate.
//!
//! The binary (`hydxs`) is a thin wrapper around this library so that:
//!
//! - the bankfull core is testable without spawning processes
//! - the core (`hydraulics`, `bankfull`, `consensus`) only works on in-memory
//!   profiles and never touches files
//! - ingest, trimming and exports stay swappable around it

pub mod app;
pub mod bankfull;
pub mod cli;
pub mod consensus;
pub mod domain;
pub mod error;
pub mod hydraulics;
pub mod io;
pub mod math;
pub mod preprocess;
pub mod report;
pub mod smoothing;

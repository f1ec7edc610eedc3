//! Mathematical utilities: smoothing spline and turning-point detection.

pub mod spline;
pub mod turning;

pub use spline::*;
pub use turning::*;

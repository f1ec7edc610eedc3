//! Error types.
//!
//! - `AppError`: what the binary reports (message + process exit code)
//! - `ProfileError`, `SmoothingError`, `EstimateError`: typed failures raised by the
//!   core. They are scoped to one cross-section (or one run) and never abort a
//!   multi-section pipeline on their own.

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// A cross-section that cannot be used for geometry.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProfileError {
    #[error("cross-section {id}: needs at least 3 distinct points, got {count}")]
    TooFewPoints { id: u32, count: usize },

    #[error("cross-section {id}: distance decreases at point {index} ({previous} -> {current})")]
    NonMonotonicDistance {
        id: u32,
        index: usize,
        previous: f64,
        current: f64,
    },

    #[error("cross-section {id}: non-finite distance or elevation at point {index}")]
    NonFinite { id: u32, index: usize },

    #[error("cross-section {id}: elevation relief {relief:.3} is too small to sweep (needs > {required:.3})")]
    FlatProfile { id: u32, relief: f64, required: f64 },
}

/// Failures of the curve smoothing service.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmoothingError {
    #[error("level and depth sequences differ in length ({levels} vs {depths})")]
    LengthMismatch { levels: usize, depths: usize },

    #[error("levels must be finite and strictly increasing (index {index})")]
    UnorderedLevels { index: usize },

    #[error("smoothing system is singular for spar={spar:.3}")]
    Singular { spar: f64 },
}

/// Failure of a single bankfull estimation attempt.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Smoothing(#[from] SmoothingError),

    #[error("cross-section {id}: no trial level produced a usable hydraulic sample")]
    NoSamples { id: u32 },

    #[error("cross-section {id}: no wetted region at level {level:.3}")]
    Dry { id: u32, level: f64 },
}

impl From<ProfileError> for AppError {
    fn from(err: ProfileError) -> Self {
        AppError::new(3, err.to_string())
    }
}

impl From<EstimateError> for AppError {
    fn from(err: EstimateError) -> Self {
        AppError::new(4, err.to_string())
    }
}

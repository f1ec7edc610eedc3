//! Bankfull estimation: trial levels, the single estimator, and retries.

pub mod estimator;
pub mod levels;
pub mod retry;

pub use estimator::*;
pub use levels::*;
pub use retry::*;

//! Boundary-aware retries around the single estimator.
//!
//! An estimate whose banks coincide with the first or last surveyed distance
//! means the channel runs off the surveyed extent. With a randomly drawn
//! smoothing parameter a fresh attempt can land on a different turning point,
//! so such estimates are retried up to `max_attempts` times.

use log::{debug, warn};
use rand::rngs::StdRng;

use crate::bankfull::estimator::BankfullEstimator;
use crate::domain::{BankfullEstimate, BankfullResult, RetryConfig, Validity};
use crate::smoothing::CurveSmoother;

pub struct RetryingEstimator<'a, S: CurveSmoother + ?Sized> {
    estimator: BankfullEstimator<'a, S>,
    config: &'a RetryConfig,
}

impl<'a, S: CurveSmoother + ?Sized> RetryingEstimator<'a, S> {
    pub fn new(estimator: BankfullEstimator<'a, S>, config: &'a RetryConfig) -> Self {
        Self { estimator, config }
    }

    /// Run estimation attempts until one stays inside the surveyed extent.
    ///
    /// Always terminates after at most `max_attempts` attempts (exactly one
    /// when boundary estimates are allowed).
    pub fn run(&self, run_index: usize, rng: &mut StdRng) -> BankfullResult {
        let profile = self.estimator.profile();
        let budget = if self.config.allow_boundary {
            1
        } else {
            self.config.max_attempts.max(1)
        };

        let mut last: Option<BankfullEstimate> = None;
        let mut error: Option<String> = None;
        let mut attempt_count = 0;

        while attempt_count < budget {
            attempt_count += 1;
            match self.estimator.estimate(rng) {
                Ok(estimate) => {
                    let at_boundary =
                        profile.touches_boundary(estimate.left_distance, estimate.right_distance);
                    if !at_boundary || self.config.allow_boundary {
                        return BankfullResult {
                            run_index,
                            estimate: Some(estimate),
                            attempt_count,
                            validity: Validity::Valid,
                            error,
                        };
                    }
                    debug!(
                        "cross-section {} run {run_index}: attempt {attempt_count} hit the surveyed extent",
                        profile.id()
                    );
                    last = Some(estimate);
                }
                Err(err) => {
                    debug!(
                        "cross-section {} run {run_index}: attempt {attempt_count} failed: {err}",
                        profile.id()
                    );
                    error = Some(err.to_string());
                }
            }
        }

        let validity = if last.is_some() {
            Validity::BoundaryHit
        } else {
            Validity::Failed
        };
        if validity == Validity::Failed {
            warn!(
                "cross-section {} run {run_index}: no estimate after {attempt_count} attempts",
                profile.id()
            );
        }

        BankfullResult {
            run_index,
            estimate: last,
            attempt_count,
            validity,
            error,
        }
    }
}

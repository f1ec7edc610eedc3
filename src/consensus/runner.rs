//! N independent seeded runs of the retrying estimator for one profile.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;

use crate::bankfull::{BankfullEstimator, RetryingEstimator};
use crate::consensus::aggregate::aggregate_runs;
use crate::domain::{
    BankfullResult, ConsensusMethod, CrossSectionOutcome, CrossSectionProfile, RunConfig,
};
use crate::error::EstimateError;
use crate::smoothing::CurveSmoother;

/// Seed of one run's RNG stream.
pub fn run_seed(base: u64, cross_section: u32, run_index: usize) -> u64 {
    let mut hasher = DefaultHasher::new();
    base.hash(&mut hasher);
    cross_section.hash(&mut hasher);
    run_index.hash(&mut hasher);
    hasher.finish()
}

/// Run every configured run on `profile` and reconcile them.
///
/// Fails only when the profile cannot be swept at all (e.g. too flat); per-run
/// problems end up in the run results instead.
pub fn run_cross_section<S: CurveSmoother + ?Sized>(
    profile: &CrossSectionProfile,
    config: &RunConfig,
    smoother: &S,
) -> Result<CrossSectionOutcome, EstimateError> {
    let id = profile.id();
    let estimator = BankfullEstimator::new(profile, &config.estimator, smoother)?;
    let retrying = RetryingEstimator::new(estimator, &config.retry);

    let runs: Vec<BankfullResult> = (1..=config.consensus.runs)
        .into_par_iter()
        .map(|run_index| {
            let mut rng = StdRng::seed_from_u64(run_seed(config.seed, id, run_index));
            retrying.run(run_index, &mut rng)
        })
        .collect();

    let consensus = aggregate_runs(id, &runs, &config.consensus);
    match consensus.method {
        ConsensusMethod::None => warn!(
            "cross-section {id}: no valid run out of {}; flagged for manual review",
            runs.len()
        ),
        method => info!(
            "cross-section {id}: bankfull {:.2} ({}, {}/{} runs agree)",
            consensus.bankfull_value.unwrap_or(f64::NAN),
            method.label(),
            consensus.agreement_count,
            consensus.valid_runs,
        ),
    }

    Ok(CrossSectionOutcome { id, runs, consensus })
}

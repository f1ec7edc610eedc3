//! Reconciling the runs of one cross-section into a single answer.
//!
//! Rules, applied to valid runs in run-index order after rounding:
//! 1. mode of the bankfull values (first encountered wins ties)
//! 2. agreement = runs within `window` of the mode
//! 3. enough agreement (`>= ceil(2N/3)` over all N runs, valid or not) keeps
//!    the mode; otherwise the values are split into 3 equal-width bins and the
//!    fullest (lowest on ties) wins

use crate::domain::{
    BankSource, BankfullResult, ConsensusConfig, ConsensusMethod, ConsensusResult,
};

/// Absolute slack on the agreement window, absorbing decimal rounding.
const WINDOW_SLACK: f64 = 1e-9;

const BIN_COUNT: usize = 3;

/// One valid run after rounding.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRun {
    pub run_index: usize,
    pub bankfull: f64,
    pub left: f64,
    pub right: f64,
    pub channel_count: usize,
}

pub fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

/// Valid runs, sorted by run index, with values rounded to `precision`.
pub fn rounded_runs(runs: &[BankfullResult], precision: u32) -> Vec<RoundedRun> {
    let mut out: Vec<RoundedRun> = runs
        .iter()
        .filter_map(|r| {
            r.accepted().map(|e| RoundedRun {
                run_index: r.run_index,
                bankfull: round_to(e.bankfull_level, precision),
                left: round_to(e.left_distance, precision),
                right: round_to(e.right_distance, precision),
                channel_count: e.channel_count,
            })
        })
        .collect();
    out.sort_by_key(|r| r.run_index);
    out
}

/// Most frequent value; ties go to the value seen first.
pub fn mode_of<T: Copy + PartialEq>(values: impl IntoIterator<Item = T>) -> Option<T> {
    let mut counts: Vec<(T, usize)> = Vec::new();
    for v in values {
        match counts.iter_mut().find(|(seen, _)| *seen == v) {
            Some((_, n)) => *n += 1,
            None => counts.push((v, 1)),
        }
    }
    let mut best: Option<(T, usize)> = None;
    for (v, n) in counts {
        if best.is_none_or(|(_, m)| n > m) {
            best = Some((v, n));
        }
    }
    best.map(|(v, _)| v)
}

pub fn agreement_count(values: &[f64], centre: f64, window: f64) -> usize {
    values
        .iter()
        .filter(|&&v| (v - centre).abs() <= window + WINDOW_SLACK)
        .count()
}

/// `ceil(2N/3)` for `N` runs in total.
pub fn agreement_threshold(total_runs: usize) -> usize {
    (2 * total_runs).div_ceil(3)
}

/// Bin index (0-based) of each value over `[min, max]` split into equal widths.
///
/// The last bin is closed on the right. A zero range puts everything in bin 0.
pub fn bin_indices(values: &[f64]) -> Vec<usize> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if !(max > min) {
        return vec![0; values.len()];
    }
    let width = (max - min) / BIN_COUNT as f64;
    let edges: Vec<f64> = (1..BIN_COUNT).map(|k| min + width * k as f64).collect();
    values
        .iter()
        .map(|&v| edges.iter().take_while(|&&e| v >= e).count())
        .collect()
}

/// Reconcile the runs of one cross-section.
pub fn aggregate_runs(
    cross_section: u32,
    runs: &[BankfullResult],
    config: &ConsensusConfig,
) -> ConsensusResult {
    let valid = rounded_runs(runs, config.precision);
    let Some(mode) = mode_of(valid.iter().map(|r| r.bankfull)) else {
        return ConsensusResult::none(cross_section, runs.len());
    };

    let values: Vec<f64> = valid.iter().map(|r| r.bankfull).collect();
    let agreement = agreement_count(&values, mode, config.window);

    let base = ConsensusResult {
        cross_section,
        agreement_count: agreement,
        valid_runs: valid.len(),
        total_runs: runs.len(),
        ..ConsensusResult::none(cross_section, runs.len())
    };

    if agreement >= agreement_threshold(runs.len()) {
        return with_run_banks(base, ConsensusMethod::Mode, mode, &valid);
    }

    let bins = bin_indices(&values);
    let winning = winning_bin(&bins);
    let members: Vec<&RoundedRun> = valid
        .iter()
        .zip(bins.iter())
        .filter(|&(_, &b)| b == winning)
        .map(|(r, _)| r)
        .collect();

    let mean = members.iter().map(|r| r.bankfull).sum::<f64>() / members.len() as f64;
    let bankfull = round_to(mean, config.precision);

    if valid.iter().any(|r| r.bankfull == bankfull) {
        return with_run_banks(base, ConsensusMethod::Binned, bankfull, &valid);
    }

    let n = members.len() as f64;
    ConsensusResult {
        bankfull_value: Some(bankfull),
        bank_left: Some(members.iter().map(|r| r.left).sum::<f64>() / n),
        bank_right: Some(members.iter().map(|r| r.right).sum::<f64>() / n),
        channel_count: mode_of(members.iter().map(|r| r.channel_count)),
        method: ConsensusMethod::Binned,
        bank_source: Some(BankSource::Interpolated),
        ..base
    }
}

fn winning_bin(bins: &[usize]) -> usize {
    let mut counts = [0usize; BIN_COUNT];
    for &b in bins {
        counts[b] += 1;
    }
    let mut best = 0;
    for (b, &n) in counts.iter().enumerate() {
        if n > counts[best] {
            best = b;
        }
    }
    best
}

/// Fill in value and banks from the first valid run matching `bankfull`.
fn with_run_banks(
    base: ConsensusResult,
    method: ConsensusMethod,
    bankfull: f64,
    valid: &[RoundedRun],
) -> ConsensusResult {
    let source = valid.iter().find(|r| r.bankfull == bankfull);
    ConsensusResult {
        bankfull_value: Some(bankfull),
        bank_left: source.map(|r| r.left),
        bank_right: source.map(|r| r.right),
        channel_count: source.map(|r| r.channel_count),
        method,
        bank_source: source.map(|r| BankSource::Run {
            run_index: r.run_index,
        }),
        ..base
    }
}

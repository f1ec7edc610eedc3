//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed between core stages without copying profiles around
//! - exported to CSV/JSON by the I/O layer
//! - compared exactly in tests (per-run outputs are plain values)

use std::collections::BTreeSet;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::domain::profile::{CrossSectionProfile, ProfilePoint};
use crate::error::{AppError, ProfileError};

/// Which wetted sub-region is authoritative when the water surface splits
/// into several disjoint regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelPolicy {
    /// The region containing the profile's global minimum (the thalweg).
    Thalweg,
    /// Reference behaviour: hydraulics over all regions combined, banks from
    /// the largest-area region. Only for reproducing older outputs.
    LargestArea,
}

/// Controls the level sweep and bankfull selection for one estimation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Number of evenly spaced trial levels.
    pub n_steps: usize,
    /// Minimum smoothed hydraulic depth a turning point needs to qualify.
    pub min_depth: f64,
    /// Offset from the profile's min/max elevation where the sweep starts/stops.
    pub edge_offset: f64,
    /// Height of the vertical walls added above the maximum elevation to close
    /// the cross-section.
    pub wall_margin: f64,
    pub channel_policy: ChannelPolicy,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            n_steps: 200,
            min_depth: 0.2,
            edge_offset: 0.1,
            wall_margin: 1.0,
            channel_policy: ChannelPolicy::Thalweg,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: usize,
    /// Accept the first estimate even when it touches the surveyed extent.
    pub allow_boundary: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            allow_boundary: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusConfig {
    /// Independent runs per cross-section (odd numbers avoid split modes).
    pub runs: usize,
    /// Half-width of the agreement window around the mode.
    pub window: f64,
    /// Decimal places per-run values are rounded to before reconciliation.
    pub precision: u32,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            runs: 11,
            window: 0.05,
            precision: 2,
        }
    }
}

/// How the smoothing parameter is chosen on each smoothing call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum SparPolicy {
    Fixed { spar: f64 },
    Random { min: f64, max: f64 },
}

impl Default for SparPolicy {
    fn default() -> Self {
        SparPolicy::Random { min: 0.5, max: 1.0 }
    }
}

/// Channel trimming around the surveyed centre marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimConfig {
    pub enabled: bool,
    /// Points either side of the centre marker searched for the channel minimum.
    pub window: usize,
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            window: 10,
        }
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub estimator: EstimatorConfig,
    pub retry: RetryConfig,
    pub consensus: ConsensusConfig,
    pub spar: SparPolicy,
    pub trim: TrimConfig,
    /// Base seed; each run derives its own stream from (seed, id, run index).
    pub seed: u64,
    pub first: u32,
    pub last: u32,
    pub exclude: BTreeSet<u32>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            estimator: EstimatorConfig::default(),
            retry: RetryConfig::default(),
            consensus: ConsensusConfig::default(),
            spar: SparPolicy::default(),
            trim: TrimConfig::default(),
            seed: 42,
            first: 1,
            last: u32::MAX,
            exclude: BTreeSet::new(),
        }
    }
}

impl RunConfig {
    /// Reject settings the core cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        let e = &self.estimator;
        if e.n_steps < 2 {
            return Err(AppError::new(2, "Level steps must be >= 2."));
        }
        if !(e.min_depth.is_finite() && e.min_depth >= 0.0) {
            return Err(AppError::new(2, "Minimum hydraulic depth must be finite and >= 0."));
        }
        if !(e.edge_offset.is_finite() && e.edge_offset > 0.0) {
            return Err(AppError::new(2, "Edge offset must be finite and > 0."));
        }
        if !(e.wall_margin.is_finite() && e.wall_margin > 0.0) {
            return Err(AppError::new(2, "Wall margin must be finite and > 0."));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::new(2, "Max attempts must be >= 1."));
        }
        if self.consensus.runs == 0 {
            return Err(AppError::new(2, "Run count must be >= 1."));
        }
        if !(self.consensus.window.is_finite() && self.consensus.window >= 0.0) {
            return Err(AppError::new(2, "Agreement window must be finite and >= 0."));
        }
        match self.spar {
            SparPolicy::Fixed { spar } => {
                if !(spar.is_finite() && (0.0..=1.5).contains(&spar)) {
                    return Err(AppError::new(2, format!("Invalid spar {spar} (must be within [0, 1.5]).")));
                }
            }
            SparPolicy::Random { min, max } => {
                if !(min.is_finite() && max.is_finite() && 0.0 <= min && min <= max && max <= 1.5) {
                    return Err(AppError::new(
                        2,
                        format!("Invalid spar range: min={min}, max={max} (need 0 <= min <= max <= 1.5)."),
                    ));
                }
            }
        }
        if self.first > self.last {
            return Err(AppError::new(
                2,
                format!("Invalid cross-section range: first={} > last={}.", self.first, self.last),
            ));
        }
        Ok(())
    }

    /// Whether the pipeline should process this id at all.
    pub fn selects(&self, id: u32) -> bool {
        id >= self.first && id <= self.last && !self.exclude.contains(&id)
    }
}

/// Hydraulic geometry at one trial water level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HydraulicLevelSample {
    pub water_level: f64,
    pub hydraulic_depth: f64,
    pub hydraulic_radius: f64,
    pub wetted_width: f64,
    pub wetted_area: f64,
    pub wetted_perimeter: f64,
}

/// How the bankfull level was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind")]
pub enum LevelSelection {
    /// A qualifying local maximum of the smoothed depth curve.
    TurningPoint { index: usize, rank: usize },
    /// The smoothed curve had no local maxima; highest level used.
    NoTurningPoint,
    /// Local maxima existed but none reached the minimum depth; highest level used.
    BelowThreshold,
}

/// Output of one bankfull estimation attempt.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BankfullEstimate {
    pub left_distance: f64,
    pub right_distance: f64,
    /// Water surface elevation at the selected level.
    pub bankfull_level: f64,
    /// Smoothed hydraulic depth at the selected level.
    pub hydraulic_depth: f64,
    pub channel_count: usize,
    pub smoothing_parameter: f64,
    pub selection: LevelSelection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Validity {
    Valid,
    /// Still touching the surveyed extent after every allowed attempt.
    BoundaryHit,
    /// No attempt produced an estimate.
    Failed,
}

/// One run of the retrying estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankfullResult {
    /// 1-based run index; the stable order used by consensus tie-breaks.
    pub run_index: usize,
    /// Last estimate produced (kept for boundary hits, for traceability).
    pub estimate: Option<BankfullEstimate>,
    pub attempt_count: usize,
    pub validity: Validity,
    /// Message of the last estimation error, if any attempt failed.
    pub error: Option<String>,
}

impl BankfullResult {
    /// The estimate, only when the run is valid.
    pub fn accepted(&self) -> Option<&BankfullEstimate> {
        match self.validity {
            Validity::Valid => self.estimate.as_ref(),
            Validity::BoundaryHit | Validity::Failed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusMethod {
    Mode,
    Binned,
    None,
}

impl ConsensusMethod {
    pub fn label(self) -> &'static str {
        match self {
            ConsensusMethod::Mode => "mode",
            ConsensusMethod::Binned => "binned",
            ConsensusMethod::None => "none",
        }
    }
}

/// Where the consensus bank extents came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum BankSource {
    /// Copied from this (1-based) run.
    Run { run_index: usize },
    /// Averaged over the runs of the winning bin.
    Interpolated,
}

/// Reconciled answer for one cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusResult {
    pub cross_section: u32,
    pub bankfull_value: Option<f64>,
    pub bank_left: Option<f64>,
    pub bank_right: Option<f64>,
    pub channel_count: Option<usize>,
    pub method: ConsensusMethod,
    pub agreement_count: usize,
    pub valid_runs: usize,
    pub total_runs: usize,
    pub bank_source: Option<BankSource>,
}

impl ConsensusResult {
    /// The "needs manual review" outcome: no run produced a usable estimate.
    pub fn none(cross_section: u32, total_runs: usize) -> Self {
        Self {
            cross_section,
            bankfull_value: None,
            bank_left: None,
            bank_right: None,
            channel_count: None,
            method: ConsensusMethod::None,
            agreement_count: 0,
            valid_runs: 0,
            total_runs,
            bank_source: None,
        }
    }

    /// Strictly between the consensus banks; always false without banks.
    pub fn contains(&self, distance: f64) -> bool {
        match (self.method, self.bank_left, self.bank_right) {
            (ConsensusMethod::None, _, _) => false,
            (_, Some(left), Some(right)) => left < distance && distance < right,
            _ => false,
        }
    }
}

/// A surveyed point of a cross-section, after distance calculation and trimming.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurveyPoint {
    pub order: i64,
    pub x: f64,
    pub y: f64,
    pub distance: f64,
    pub elevation: f64,
    /// Marks the surveyed river centre.
    pub centre: bool,
    /// Inside the trimmed channel extent handed to the estimator.
    pub in_channel: bool,
}

impl SurveyPoint {
    /// A point laid out directly along the section line (`x = distance`, `y = 0`).
    pub fn on_line(order: i64, distance: f64, elevation: f64) -> Self {
        Self {
            order,
            x: distance,
            y: 0.0,
            distance,
            elevation,
            centre: false,
            in_channel: true,
        }
    }
}

/// All original points of one cross-section, with trimming applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreparedCrossSection {
    pub id: u32,
    pub points: Vec<SurveyPoint>,
}

impl PreparedCrossSection {
    /// The geometry the estimator sees: in-channel points only.
    pub fn channel_profile(&self) -> Result<CrossSectionProfile, ProfileError> {
        let points = self
            .points
            .iter()
            .filter(|p| p.in_channel)
            .map(|p| ProfilePoint::new(p.order, p.distance, p.elevation))
            .collect();
        CrossSectionProfile::new(self.id, points)
    }
}

/// Runs and consensus of one processed cross-section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionOutcome {
    pub id: u32,
    pub runs: Vec<BankfullResult>,
    pub consensus: ConsensusResult,
}

/// A cross-section the pipeline could not process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedSection {
    pub id: u32,
    pub reason: String,
}

/// One original point with the consensus of its cross-section attached.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPoint {
    pub cross_section: u32,
    pub point: SurveyPoint,
    pub in_river: bool,
    pub bankfull: Option<f64>,
    pub bank_left: Option<f64>,
    pub bank_right: Option<f64>,
    pub count_at_bankfull: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        RunConfig::default().validate().unwrap();
    }

    #[test]
    fn validate_rejects_inverted_spar_range() {
        let config = RunConfig {
            spar: SparPolicy::Random { min: 0.9, max: 0.4 },
            ..RunConfig::default()
        };
        assert_eq!(config.validate().unwrap_err().exit_code(), 2);
    }

    #[test]
    fn selects_respects_range_and_exclusions() {
        let config = RunConfig {
            first: 2,
            last: 5,
            exclude: [3].into_iter().collect(),
            ..RunConfig::default()
        };
        assert!(!config.selects(1));
        assert!(config.selects(2));
        assert!(!config.selects(3));
        assert!(config.selects(5));
        assert!(!config.selects(6));
    }

    #[test]
    fn none_consensus_contains_nothing() {
        let c = ConsensusResult::none(1, 11);
        assert!(!c.contains(0.0));
        assert_eq!(c.agreement_count, 0);
    }

    #[test]
    fn contains_is_strict() {
        let c = ConsensusResult {
            bankfull_value: Some(1.0),
            bank_left: Some(2.0),
            bank_right: Some(4.0),
            channel_count: Some(1),
            method: ConsensusMethod::Mode,
            agreement_count: 11,
            valid_runs: 11,
            bank_source: Some(BankSource::Run { run_index: 1 }),
            ..ConsensusResult::none(1, 11)
        };
        assert!(!c.contains(2.0));
        assert!(c.contains(3.0));
        assert!(!c.contains(4.0));
    }

    #[test]
    fn accepted_only_for_valid_runs() {
        let estimate = BankfullEstimate {
            left_distance: 1.0,
            right_distance: 2.0,
            bankfull_level: 3.0,
            hydraulic_depth: 0.5,
            channel_count: 1,
            smoothing_parameter: 0.7,
            selection: LevelSelection::NoTurningPoint,
        };
        let mut run = BankfullResult {
            run_index: 1,
            estimate: Some(estimate),
            attempt_count: 3,
            validity: Validity::BoundaryHit,
            error: None,
        };
        assert!(run.accepted().is_none());
        run.validity = Validity::Valid;
        assert_eq!(run.accepted(), Some(&estimate));
    }
}

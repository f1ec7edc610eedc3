//! Single bankfull estimation for one profile.
//!
//! Given a profile:
//! - sweep the hydraulic geometry over evenly spaced trial levels (once per
//!   profile; the curve does not depend on the run)
//! - smooth the hydraulic-depth curve and take its local maxima
//! - pick the first (lowest) maximum deep enough to count as bankfull,
//!   falling back to the highest trial level
//! - read the bank extents and channel count off the wetted region there

use log::debug;
use rand::rngs::StdRng;

use crate::bankfull::levels::trial_levels;
use crate::domain::{BankfullEstimate, CrossSectionProfile, EstimatorConfig, LevelSelection};
use crate::error::EstimateError;
use crate::hydraulics::HydraulicSweep;
use crate::smoothing::{CurveSmoother, SmoothedCurve, SmoothingGrid};

/// Hydraulic depth as a function of water level (missing samples dropped).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DepthCurve {
    pub levels: Vec<f64>,
    pub depths: Vec<f64>,
    /// Hydraulic radius at each level (reported, not used for selection).
    pub radii: Vec<f64>,
}

pub struct BankfullEstimator<'a, S: CurveSmoother + ?Sized> {
    profile: &'a CrossSectionProfile,
    config: &'a EstimatorConfig,
    smoother: &'a S,
    sweep: HydraulicSweep<'a>,
    levels: Vec<f64>,
    curve: DepthCurve,
    grid: SmoothingGrid,
}

impl<'a, S: CurveSmoother + ?Sized> BankfullEstimator<'a, S> {
    pub fn new(
        profile: &'a CrossSectionProfile,
        config: &'a EstimatorConfig,
        smoother: &'a S,
    ) -> Result<Self, EstimateError> {
        let levels = trial_levels(profile, config.edge_offset, config.n_steps)?;
        let sweep = HydraulicSweep::new(profile, config.wall_margin, config.channel_policy);
        let curve = depth_curve(&sweep, &levels);
        let grid = SmoothingGrid::new(curve.levels.clone());
        Ok(Self {
            profile,
            config,
            smoother,
            sweep,
            levels,
            curve,
            grid,
        })
    }

    pub fn profile(&self) -> &'a CrossSectionProfile {
        self.profile
    }

    pub fn trial_levels(&self) -> &[f64] {
        &self.levels
    }

    pub fn depth_curve(&self) -> &DepthCurve {
        &self.curve
    }

    /// Run one estimation, drawing any smoothing randomness from `rng`.
    pub fn estimate(&self, rng: &mut StdRng) -> Result<BankfullEstimate, EstimateError> {
        let id = self.profile.id();
        let curve = &self.curve;
        if curve.levels.is_empty() {
            return Err(EstimateError::NoSamples { id });
        }

        let smoothed = self.smoother.smooth(&self.grid, &curve.depths, rng)?;
        let (level, hydraulic_depth, selection) = self.select_level(curve, &smoothed);

        let (region, channel_count) = self
            .sweep
            .channel(level)
            .ok_or(EstimateError::Dry { id, level })?;

        debug!(
            "cross-section {id}: spar={:.3} maxima={} level={level:.3} ({selection:?}) banks=[{:.3}, {:.3}] channels={channel_count}",
            smoothed.smoothing_parameter,
            smoothed.maxima.len(),
            region.left,
            region.right,
        );

        Ok(BankfullEstimate {
            left_distance: region.left,
            right_distance: region.right,
            bankfull_level: level,
            hydraulic_depth,
            channel_count,
            smoothing_parameter: smoothed.smoothing_parameter,
            selection,
        })
    }

    fn select_level(&self, curve: &DepthCurve, smoothed: &SmoothedCurve) -> (f64, f64, LevelSelection) {
        let qualifying = smoothed
            .maxima
            .iter()
            .find(|m| smoothed.smoothed.get(m.index).is_some_and(|&d| d >= self.config.min_depth));

        if let Some(m) = qualifying {
            return (
                curve.levels[m.index],
                smoothed.smoothed[m.index],
                LevelSelection::TurningPoint {
                    index: m.index,
                    rank: m.rank,
                },
            );
        }

        let selection = if smoothed.maxima.is_empty() {
            LevelSelection::NoTurningPoint
        } else {
            LevelSelection::BelowThreshold
        };
        // `levels` comes from `trial_levels`, which never returns an empty grid
        // for a profile that passed the relief check.
        let level = self.levels.last().copied().unwrap_or(self.profile.max_elevation());
        (level, fallback_depth(curve, smoothed, level), selection)
    }
}

/// Sweep every trial level. Degenerate levels are left out of the curve.
fn depth_curve(sweep: &HydraulicSweep<'_>, levels: &[f64]) -> DepthCurve {
    let mut curve = DepthCurve::default();
    for sample in levels.iter().filter_map(|&h| sweep.sample(h)) {
        curve.levels.push(sample.water_level);
        curve.depths.push(sample.hydraulic_depth);
        curve.radii.push(sample.hydraulic_radius);
    }
    curve
}

/// Smoothed depth at `level`, or NaN when that level produced no sample.
fn fallback_depth(curve: &DepthCurve, smoothed: &SmoothedCurve, level: f64) -> f64 {
    curve
        .levels
        .iter()
        .rposition(|&h| h == level)
        .and_then(|i| smoothed.smoothed.get(i).copied())
        .unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ChannelPolicy, ProfilePoint, SparPolicy};
    use crate::error::SmoothingError;
    use crate::math::TurningPoint;
    use crate::smoothing::SplineSmoother;
    use rand::SeedableRng;

    /// Returns the raw curve with maxima at fixed indices.
    struct FixedMaxima(Vec<usize>);

    impl CurveSmoother for FixedMaxima {
        fn smooth(
            &self,
            _grid: &SmoothingGrid,
            depths: &[f64],
            _rng: &mut StdRng,
        ) -> Result<SmoothedCurve, SmoothingError> {
            Ok(SmoothedCurve {
                smoothed: depths.to_vec(),
                maxima: self.0.iter().map(|&index| TurningPoint { index, rank: 1 }).collect(),
                smoothing_parameter: 0.5,
            })
        }
    }

    fn profile(raw: &[(f64, f64)]) -> CrossSectionProfile {
        let points = raw
            .iter()
            .enumerate()
            .map(|(i, &(d, z))| ProfilePoint::new(i as i64, d, z))
            .collect();
        CrossSectionProfile::new(1, points).unwrap()
    }

    fn v_profile() -> CrossSectionProfile {
        let raw: Vec<(f64, f64)> = (0..21)
            .map(|i| (i as f64, (i as f64 - 10.0).abs() * 0.5))
            .collect();
        profile(&raw)
    }

    /// Incised channel inside a floodplain: hydraulic depth peaks at the
    /// floodplain edge, then drops as the water spreads out.
    fn floodplain_profile() -> CrossSectionProfile {
        profile(&[
            (0.0, 3.0),
            (2.0, 2.1),
            (10.0, 2.0),
            (11.0, 0.0),
            (13.0, 0.0),
            (14.0, 2.0),
            (22.0, 2.1),
            (24.0, 3.0),
        ])
    }

    #[test]
    fn v_profile_falls_back_to_highest_level() {
        let p = v_profile();
        let config = EstimatorConfig::default();
        let smoother = SplineSmoother::new(SparPolicy::Fixed { spar: 0.7 });
        let est = BankfullEstimator::new(&p, &config, &smoother).unwrap();
        let r = est.estimate(&mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(r.selection, LevelSelection::NoTurningPoint);
        assert!((r.bankfull_level - 4.9).abs() < 1e-12);
        assert_eq!(r.channel_count, 1);
        assert!((r.left_distance - 0.2).abs() < 1e-9);
        assert!((r.right_distance - 19.8).abs() < 1e-9);
        assert!(!p.touches_boundary(r.left_distance, r.right_distance));
    }

    #[test]
    fn fixed_spar_is_idempotent() {
        let p = floodplain_profile();
        let config = EstimatorConfig::default();
        let smoother = SplineSmoother::new(SparPolicy::Fixed { spar: 0.4 });
        let est = BankfullEstimator::new(&p, &config, &smoother).unwrap();
        let a = est.estimate(&mut StdRng::seed_from_u64(1)).unwrap();
        let b = est.estimate(&mut StdRng::seed_from_u64(99)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn floodplain_edge_is_detected() {
        let p = floodplain_profile();
        let config = EstimatorConfig::default();
        let smoother = SplineSmoother::new(SparPolicy::Fixed { spar: 0.3 });
        let est = BankfullEstimator::new(&p, &config, &smoother).unwrap();
        let r = est.estimate(&mut StdRng::seed_from_u64(0)).unwrap();

        assert!(matches!(r.selection, LevelSelection::TurningPoint { .. }));
        assert!((r.bankfull_level - 2.0).abs() < 0.2, "level {}", r.bankfull_level);
        assert!(r.left_distance > 2.0 && r.right_distance < 22.0);
    }

    #[test]
    fn first_qualifying_maximum_wins() {
        let p = v_profile();
        let config = EstimatorConfig {
            min_depth: 0.5,
            ..EstimatorConfig::default()
        };
        // Index 10 is too shallow (depth ~ 0.17), 50 and 150 both qualify.
        let smoother = FixedMaxima(vec![10, 50, 150]);
        let est = BankfullEstimator::new(&p, &config, &smoother).unwrap();
        let r = est.estimate(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(r.selection, LevelSelection::TurningPoint { index: 50, rank: 1 });
        assert_eq!(r.bankfull_level, est.trial_levels()[50]);
    }

    #[test]
    fn shallow_maxima_fall_back() {
        let p = v_profile();
        let config = EstimatorConfig {
            min_depth: 10.0,
            ..EstimatorConfig::default()
        };
        let smoother = FixedMaxima(vec![20, 80]);
        let est = BankfullEstimator::new(&p, &config, &smoother).unwrap();
        let r = est.estimate(&mut StdRng::seed_from_u64(0)).unwrap();
        assert_eq!(r.selection, LevelSelection::BelowThreshold);
        assert_eq!(r.bankfull_level, *est.trial_levels().last().unwrap());
    }

    #[test]
    fn banks_follow_thalweg_in_multichannel_section() {
        // Left depression is wider; the thalweg is the narrow one on the right.
        let p = profile(&[
            (0.0, 4.0),
            (1.0, 1.5),
            (9.0, 1.5),
            (10.0, 3.0),
            (11.0, 0.0),
            (12.0, 3.0),
            (13.0, 4.0),
        ]);
        let config = EstimatorConfig::default();
        let levels = trial_levels(&p, config.edge_offset, config.n_steps).unwrap();
        let index = levels.iter().position(|&h| h > 2.5).unwrap();
        let smoother = FixedMaxima(vec![index]);
        let est = BankfullEstimator::new(&p, &config, &smoother).unwrap();
        let r = est.estimate(&mut StdRng::seed_from_u64(0)).unwrap();

        assert_eq!(r.channel_count, 2);
        assert!(r.left_distance > 10.0 && r.right_distance < 12.0);

        let reference = EstimatorConfig {
            channel_policy: ChannelPolicy::LargestArea,
            ..EstimatorConfig::default()
        };
        let est = BankfullEstimator::new(&p, &reference, &smoother).unwrap();
        let r = est.estimate(&mut StdRng::seed_from_u64(0)).unwrap();
        assert!(r.left_distance < 1.0 && r.right_distance < 10.0);
    }

    #[test]
    fn depth_curve_covers_every_trial_level() {
        let p = v_profile();
        let config = EstimatorConfig {
            n_steps: 50,
            ..EstimatorConfig::default()
        };
        let smoother = FixedMaxima(Vec::new());
        let est = BankfullEstimator::new(&p, &config, &smoother).unwrap();
        let curve = est.depth_curve();
        assert_eq!(curve.levels.len(), 50);
        // Hydraulic depth of a symmetric V is half the water depth.
        for (h, d) in curve.levels.iter().zip(curve.depths.iter()) {
            assert!((d - h / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn fallback_depth_belongs_to_the_fallback_level() {
        let curve = DepthCurve {
            levels: vec![1.0, 2.0, 3.0],
            depths: vec![0.5, 1.0, 1.5],
            radii: vec![0.4, 0.8, 1.2],
        };
        let smoothed = SmoothedCurve {
            smoothed: vec![0.6, 1.1, 1.4],
            maxima: Vec::new(),
            smoothing_parameter: 0.5,
        };
        assert_eq!(fallback_depth(&curve, &smoothed, 3.0), 1.4);
        // The top trial level was dropped from the curve: no depth to report.
        assert!(fallback_depth(&curve, &smoothed, 4.0).is_nan());
    }

    #[test]
    fn fallback_reports_smoothed_depth_at_the_highest_level() {
        let p = v_profile();
        let config = EstimatorConfig {
            min_depth: 10.0,
            ..EstimatorConfig::default()
        };
        let smoother = FixedMaxima(vec![20]);
        let est = BankfullEstimator::new(&p, &config, &smoother).unwrap();
        let r = est.estimate(&mut StdRng::seed_from_u64(0)).unwrap();
        // Raw depth of a symmetric V is half the water depth.
        assert!((r.hydraulic_depth - r.bankfull_level / 2.0).abs() < 1e-9);
    }
}

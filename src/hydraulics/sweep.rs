//! Wetted geometry of a cross-section at a trial water level.
//!
//! The cross-section is closed by vertical walls at both ends rising
//! `wall_margin` above the highest point, so everything below a level inside
//! the surveyed extent is bounded. Intersecting that shape with the half-plane
//! below the level is done by a single left-to-right sweep over the profile
//! segments:
//!
//! - a region opens where the terrain drops below the level (or at the left
//!   wall if the first point is already wet)
//! - it accumulates area `∫(h − z) dx` and terrain length (wetted perimeter)
//! - it closes where the terrain rises back to the level (or at the right wall)
//!
//! Crossings are found by linear interpolation along the segment. Each closed
//! interval is one disjoint wetted sub-region.

use crate::domain::{ChannelPolicy, CrossSectionProfile, HydraulicLevelSample, ProfilePoint};

/// One disjoint wetted sub-region below a water level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WetRegion {
    /// Distance where the waterline meets the terrain (or wall) on the left.
    pub left: f64,
    pub right: f64,
    pub area: f64,
    /// Length of terrain below the level.
    pub perimeter: f64,
    /// Lowest terrain vertex inside the region.
    pub min_elevation: f64,
}

impl WetRegion {
    pub fn waterline(&self) -> f64 {
        self.right - self.left
    }
}

/// Result of intersecting the closed cross-section with the space below a level.
#[derive(Debug, Clone, PartialEq)]
pub enum WetSection {
    Single(WetRegion),
    /// Two or more disjoint regions, ordered left to right.
    Multi(Vec<WetRegion>),
}

impl WetSection {
    fn from_regions(mut regions: Vec<WetRegion>) -> Option<Self> {
        match regions.len() {
            0 => None,
            1 => regions.pop().map(WetSection::Single),
            _ => Some(WetSection::Multi(regions)),
        }
    }

    pub fn regions(&self) -> &[WetRegion] {
        match self {
            WetSection::Single(region) => std::slice::from_ref(region),
            WetSection::Multi(regions) => regions,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.regions().len()
    }

    /// The region whose lowest vertex is the profile's global minimum.
    ///
    /// Exact comparison: both values are the same vertex elevation unchanged.
    pub fn thalweg(&self, min_elevation: f64) -> Option<&WetRegion> {
        self.regions().iter().find(|r| r.min_elevation == min_elevation)
    }

    /// Largest-area region; the first one wins on ties.
    pub fn largest(&self) -> &WetRegion {
        let regions = self.regions();
        let mut best = &regions[0];
        for r in &regions[1..] {
            if r.area > best.area {
                best = r;
            }
        }
        best
    }
}

/// Aggregate hydraulics used to form a level sample.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Wetted {
    area: f64,
    perimeter: f64,
    waterline: f64,
}

impl Wetted {
    fn of(region: &WetRegion) -> Self {
        Self {
            area: region.area,
            perimeter: region.perimeter,
            waterline: region.waterline(),
        }
    }

    fn combined(regions: &[WetRegion]) -> Self {
        regions.iter().fold(
            Wetted {
                area: 0.0,
                perimeter: 0.0,
                waterline: 0.0,
            },
            |acc, r| Wetted {
                area: acc.area + r.area,
                perimeter: acc.perimeter + r.perimeter,
                waterline: acc.waterline + r.waterline(),
            },
        )
    }
}

#[derive(Debug, Clone, Copy)]
struct RegionBuilder {
    left: f64,
    area: f64,
    perimeter: f64,
    min_elevation: f64,
}

impl RegionBuilder {
    fn open(left: f64) -> Self {
        Self {
            left,
            area: 0.0,
            perimeter: 0.0,
            min_elevation: f64::INFINITY,
        }
    }

    /// Add a segment lying entirely at or below `level`.
    fn add(&mut self, x0: f64, z0: f64, x1: f64, z1: f64, level: f64) {
        let dx = x1 - x0;
        self.area += 0.5 * ((level - z0) + (level - z1)) * dx;
        self.perimeter += dx.hypot(z1 - z0);
        self.min_elevation = self.min_elevation.min(z0).min(z1);
    }

    fn close(self, right: f64) -> WetRegion {
        WetRegion {
            left: self.left,
            right,
            area: self.area,
            perimeter: self.perimeter,
            min_elevation: self.min_elevation,
        }
    }
}

fn crossing(a: &ProfilePoint, b: &ProfilePoint, level: f64) -> f64 {
    let t = (level - a.elevation) / (b.elevation - a.elevation);
    a.distance + t * (b.distance - a.distance)
}

/// Sweep the profile and collect wetted regions below `level`, left to right.
fn sweep_regions(points: &[ProfilePoint], level: f64) -> Vec<WetRegion> {
    let mut regions = Vec::new();
    let mut open = points
        .first()
        .filter(|p| p.elevation < level)
        .map(|p| RegionBuilder::open(p.distance));

    for pair in points.windows(2) {
        let (a, b) = (&pair[0], &pair[1]);
        match (a.elevation < level, b.elevation < level) {
            (true, true) => {
                if let Some(region) = open.as_mut() {
                    region.add(a.distance, a.elevation, b.distance, b.elevation, level);
                }
            }
            (true, false) => {
                if let Some(mut region) = open.take() {
                    let x = crossing(a, b, level);
                    region.add(a.distance, a.elevation, x, level, level);
                    regions.push(region.close(x));
                }
            }
            (false, true) => {
                let x = crossing(a, b, level);
                let mut region = RegionBuilder::open(x);
                region.add(x, level, b.distance, b.elevation, level);
                open = Some(region);
            }
            (false, false) => {}
        }
    }

    if let (Some(region), Some(last)) = (open, points.last()) {
        regions.push(region.close(last.distance));
    }
    regions
}

/// Hydraulic sweep over one profile.
#[derive(Debug, Clone, Copy)]
pub struct HydraulicSweep<'a> {
    profile: &'a CrossSectionProfile,
    wall_margin: f64,
    policy: ChannelPolicy,
}

impl<'a> HydraulicSweep<'a> {
    pub fn new(profile: &'a CrossSectionProfile, wall_margin: f64, policy: ChannelPolicy) -> Self {
        Self {
            profile,
            wall_margin,
            policy,
        }
    }

    /// Whether `level` lies strictly inside the closed shape's vertical extent.
    pub fn in_range(&self, level: f64) -> bool {
        level.is_finite()
            && level > self.profile.min_elevation()
            && level < self.profile.max_elevation() + self.wall_margin
    }

    /// All disjoint wetted regions below `level`, or `None` outside the sweep range.
    pub fn wet_section(&self, level: f64) -> Option<WetSection> {
        if !self.in_range(level) {
            return None;
        }
        WetSection::from_regions(sweep_regions(self.profile.points(), level))
    }

    /// Hydraulic sample at `level`.
    ///
    /// Returns `None` for degenerate geometry (zero waterline or perimeter) and
    /// for levels outside the sweep range; callers treat that as a missing sample.
    pub fn sample(&self, level: f64) -> Option<HydraulicLevelSample> {
        let section = self.wet_section(level)?;
        let wetted = match self.policy {
            ChannelPolicy::Thalweg => Wetted::of(section.thalweg(self.profile.min_elevation())?),
            ChannelPolicy::LargestArea => Wetted::combined(section.regions()),
        };

        if !(wetted.waterline > 0.0 && wetted.perimeter > 0.0) {
            return None;
        }

        Some(HydraulicLevelSample {
            water_level: level,
            hydraulic_depth: wetted.area / wetted.waterline,
            hydraulic_radius: wetted.area / wetted.perimeter,
            wetted_width: wetted.waterline,
            wetted_area: wetted.area,
            wetted_perimeter: wetted.perimeter,
        })
    }

    /// The region that defines the bank extents at `level`, with the channel count.
    pub fn channel(&self, level: f64) -> Option<(WetRegion, usize)> {
        let section = self.wet_section(level)?;
        let region = match self.policy {
            ChannelPolicy::Thalweg => *section.thalweg(self.profile.min_elevation())?,
            ChannelPolicy::LargestArea => *section.largest(),
        };
        Some((region, section.channel_count()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(raw: &[(f64, f64)]) -> CrossSectionProfile {
        let points = raw
            .iter()
            .enumerate()
            .map(|(i, &(d, z))| ProfilePoint::new(i as i64, d, z))
            .collect();
        CrossSectionProfile::new(1, points).unwrap()
    }

    /// Wide shallow depression on the left, narrow deep thalweg on the right.
    fn two_depressions() -> CrossSectionProfile {
        profile(&[(0.0, 3.0), (1.0, 1.0), (9.0, 1.0), (10.0, 3.0), (11.0, 0.0), (12.0, 3.0)])
    }

    #[test]
    fn v_channel_matches_closed_form() {
        let p = profile(&[(0.0, 5.0), (5.0, 0.0), (10.0, 5.0)]);
        let sweep = HydraulicSweep::new(&p, 1.0, ChannelPolicy::Thalweg);
        let s = sweep.sample(2.0).unwrap();
        assert!((s.wetted_width - 4.0).abs() < 1e-12);
        assert!((s.wetted_area - 4.0).abs() < 1e-12);
        assert!((s.hydraulic_depth - 1.0).abs() < 1e-12);
        let perimeter = 2.0 * (2.0_f64 * 2.0 + 2.0 * 2.0).sqrt();
        assert!((s.wetted_perimeter - perimeter).abs() < 1e-12);
        assert!((s.hydraulic_radius - 4.0 / perimeter).abs() < 1e-12);
    }

    #[test]
    fn selects_thalweg_over_larger_depression() {
        let p = two_depressions();
        let sweep = HydraulicSweep::new(&p, 1.0, ChannelPolicy::Thalweg);

        let section = sweep.wet_section(2.0).unwrap();
        assert_eq!(section.channel_count(), 2);
        assert!(section.largest().left < 1.0, "left depression is larger by area");

        let s = sweep.sample(2.0).unwrap();
        assert!((s.wetted_width - 4.0 / 3.0).abs() < 1e-9);
        assert!((s.wetted_area - 4.0 / 3.0).abs() < 1e-9);

        let (region, count) = sweep.channel(2.0).unwrap();
        assert_eq!(count, 2);
        assert_eq!(region.min_elevation, p.min_elevation());
        assert!((region.left - (10.0 + 1.0 / 3.0)).abs() < 1e-9);
        assert!((region.right - (11.0 + 2.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn thalweg_region_always_contains_global_minimum() {
        let p = two_depressions();
        let sweep = HydraulicSweep::new(&p, 1.0, ChannelPolicy::Thalweg);
        for i in 1..60 {
            let level = i as f64 * 0.05;
            if let Some((region, _)) = sweep.channel(level) {
                assert_eq!(region.min_elevation, p.min_elevation(), "level {level}");
            }
        }
    }

    #[test]
    fn largest_area_policy_reproduces_reference_choice() {
        let p = two_depressions();
        let sweep = HydraulicSweep::new(&p, 1.0, ChannelPolicy::LargestArea);
        let (region, _) = sweep.channel(2.0).unwrap();
        assert!((region.left - 0.5).abs() < 1e-12);
        assert!((region.right - 9.5).abs() < 1e-12);

        let s = sweep.sample(2.0).unwrap();
        assert!((s.wetted_area - (8.5 + 4.0 / 3.0)).abs() < 1e-9);
    }

    #[test]
    fn wetted_area_is_monotonic_in_level() {
        let p = profile(&[(0.0, 4.0), (1.0, 2.5), (2.0, 1.0), (3.0, 0.2), (4.0, 0.9), (5.0, 2.7), (6.0, 4.2)]);
        let sweep = HydraulicSweep::new(&p, 1.0, ChannelPolicy::Thalweg);
        let mut previous = 0.0;
        for i in 1..100 {
            let level = 0.2 + i as f64 * 0.04;
            let s = sweep.sample(level).unwrap();
            assert!(s.wetted_area >= previous, "area decreased at {level}");
            previous = s.wetted_area;
        }
    }

    #[test]
    fn out_of_range_levels_are_missing() {
        let p = profile(&[(0.0, 5.0), (5.0, 0.0), (10.0, 5.0)]);
        let sweep = HydraulicSweep::new(&p, 1.0, ChannelPolicy::Thalweg);
        assert!(sweep.sample(0.0).is_none());
        assert!(sweep.sample(-1.0).is_none());
        assert!(sweep.sample(6.0).is_none());
        assert!(sweep.sample(f64::NAN).is_none());
    }

    #[test]
    fn level_above_terrain_fills_to_the_walls() {
        let p = profile(&[(0.0, 5.0), (5.0, 0.0), (10.0, 5.0)]);
        let sweep = HydraulicSweep::new(&p, 1.0, ChannelPolicy::Thalweg);
        let (region, count) = sweep.channel(5.5).unwrap();
        assert_eq!(count, 1);
        assert_eq!(region.left, p.left_bound());
        assert_eq!(region.right, p.right_bound());
        assert!(p.touches_boundary(region.left, region.right));
    }

    #[test]
    fn wet_first_point_opens_at_left_bound() {
        let p = profile(&[(0.0, 0.0), (2.0, 2.0), (4.0, 4.0)]);
        let sweep = HydraulicSweep::new(&p, 1.0, ChannelPolicy::Thalweg);
        let (region, _) = sweep.channel(1.0).unwrap();
        assert_eq!(region.left, 0.0);
        assert!((region.right - 1.0).abs() < 1e-12);
    }
}

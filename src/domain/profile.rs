//! Cross-section geometry as consumed by the core.
//!
//! A `CrossSectionProfile` is the validated, immutable `(distance, elevation)`
//! polyline of one cross-section. Every core component borrows it read-only.

use serde::{Deserialize, Serialize};

use crate::error::ProfileError;

/// One vertex of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfilePoint {
    pub order: i64,
    pub distance: f64,
    pub elevation: f64,
}

impl ProfilePoint {
    pub fn new(order: i64, distance: f64, elevation: f64) -> Self {
        Self {
            order,
            distance,
            elevation,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CrossSectionProfile {
    id: u32,
    points: Vec<ProfilePoint>,
    min_elevation: f64,
    max_elevation: f64,
}

impl CrossSectionProfile {
    /// Validate and build a profile.
    ///
    /// Points are ordered by `order`. Consecutive points sharing a distance are
    /// collapsed into one vertex carrying the lowest elevation of the group, so
    /// the thalweg survives; a decreasing distance is rejected.
    pub fn new(id: u32, mut points: Vec<ProfilePoint>) -> Result<Self, ProfileError> {
        points.sort_by_key(|p| p.order);

        for (index, p) in points.iter().enumerate() {
            if !(p.distance.is_finite() && p.elevation.is_finite()) {
                return Err(ProfileError::NonFinite { id, index });
            }
        }

        let mut collapsed: Vec<ProfilePoint> = Vec::with_capacity(points.len());
        for (index, p) in points.into_iter().enumerate() {
            let Some(last) = collapsed.last_mut() else {
                collapsed.push(p);
                continue;
            };
            if p.distance < last.distance {
                return Err(ProfileError::NonMonotonicDistance {
                    id,
                    index,
                    previous: last.distance,
                    current: p.distance,
                });
            }
            if p.distance == last.distance {
                last.elevation = last.elevation.min(p.elevation);
            } else {
                collapsed.push(p);
            }
        }

        if collapsed.len() < 3 {
            return Err(ProfileError::TooFewPoints {
                id,
                count: collapsed.len(),
            });
        }

        let (min_elevation, max_elevation) = collapsed.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(lo, hi), p| (lo.min(p.elevation), hi.max(p.elevation)),
        );

        Ok(Self {
            id,
            points: collapsed,
            min_elevation,
            max_elevation,
        })
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn points(&self) -> &[ProfilePoint] {
        &self.points
    }

    pub fn min_elevation(&self) -> f64 {
        self.min_elevation
    }

    pub fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    pub fn relief(&self) -> f64 {
        self.max_elevation - self.min_elevation
    }

    pub fn left_bound(&self) -> f64 {
        self.points[0].distance
    }

    pub fn right_bound(&self) -> f64 {
        self.points[self.points.len() - 1].distance
    }

    /// True when a bank pair coincides with the surveyed extent.
    ///
    /// Exact comparison: a wetted region that reaches an end of the profile
    /// reports that end's vertex distance unchanged.
    pub fn touches_boundary(&self, left: f64, right: f64) -> bool {
        left == self.left_bound() || right == self.right_bound()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pts(raw: &[(f64, f64)]) -> Vec<ProfilePoint> {
        raw.iter()
            .enumerate()
            .map(|(i, &(d, z))| ProfilePoint::new(i as i64, d, z))
            .collect()
    }

    #[test]
    fn derives_bounds_and_extremes() {
        let p = CrossSectionProfile::new(7, pts(&[(0.0, 3.0), (1.0, 0.5), (2.5, 4.0)])).unwrap();
        assert_eq!(p.id(), 7);
        assert_eq!(p.left_bound(), 0.0);
        assert_eq!(p.right_bound(), 2.5);
        assert_eq!(p.min_elevation(), 0.5);
        assert_eq!(p.max_elevation(), 4.0);
        assert!((p.relief() - 3.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_too_few_points() {
        let err = CrossSectionProfile::new(1, pts(&[(0.0, 1.0), (1.0, 0.0)])).unwrap_err();
        assert_eq!(err, ProfileError::TooFewPoints { id: 1, count: 2 });
    }

    #[test]
    fn rejects_decreasing_distance() {
        let err =
            CrossSectionProfile::new(2, pts(&[(0.0, 1.0), (2.0, 0.0), (1.0, 1.0)])).unwrap_err();
        assert!(matches!(err, ProfileError::NonMonotonicDistance { index: 2, .. }));
    }

    #[test]
    fn collapses_duplicate_distance_keeping_lowest() {
        let p = CrossSectionProfile::new(
            3,
            pts(&[(0.0, 2.0), (1.0, 1.0), (1.0, 0.2), (2.0, 2.0)]),
        )
        .unwrap();
        assert_eq!(p.points().len(), 3);
        assert_eq!(p.points()[1].elevation, 0.2);
        assert_eq!(p.min_elevation(), 0.2);
    }

    #[test]
    fn duplicates_can_leave_too_few_points() {
        let err = CrossSectionProfile::new(4, pts(&[(0.0, 2.0), (0.0, 1.0), (1.0, 2.0)])).unwrap_err();
        assert_eq!(err, ProfileError::TooFewPoints { id: 4, count: 2 });
    }

    #[test]
    fn sorts_by_order_before_validating() {
        let points = vec![
            ProfilePoint::new(2, 2.0, 3.0),
            ProfilePoint::new(0, 0.0, 3.0),
            ProfilePoint::new(1, 1.0, 0.0),
        ];
        let p = CrossSectionProfile::new(5, points).unwrap();
        assert_eq!(p.points()[1].elevation, 0.0);
    }

    #[test]
    fn rejects_non_finite() {
        let err =
            CrossSectionProfile::new(6, pts(&[(0.0, 1.0), (1.0, f64::NAN), (2.0, 1.0)])).unwrap_err();
        assert_eq!(err, ProfileError::NonFinite { id: 6, index: 1 });
    }
}

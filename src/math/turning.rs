//! Turning points of a sampled curve.
//!
//! A sample `i` is a local maximum when the curve strictly rises into it and
//! strictly falls out of it (`v[i] − v[i−1] > 0` and `v[i+1] − v[i] < 0`).
//! Plateaus therefore never produce a turning point. Minima are symmetric.

/// A local maximum and how far it dominates its neighbourhood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurningPoint {
    pub index: usize,
    /// Largest symmetric half-width over which the sample stays a strict peak
    /// over the clamped window endpoints.
    pub rank: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurningPoints {
    pub maxima: Vec<TurningPoint>,
    pub minima: Vec<usize>,
}

pub fn turning_points(values: &[f64]) -> TurningPoints {
    let mut out = TurningPoints::default();
    if values.len() < 3 {
        return out;
    }

    for i in 1..values.len() - 1 {
        let rise = values[i] - values[i - 1];
        let fall = values[i + 1] - values[i];
        if rise > 0.0 && fall < 0.0 {
            out.maxima.push(TurningPoint {
                index: i,
                rank: peak_rank(values, i),
            });
        } else if rise < 0.0 && fall > 0.0 {
            out.minima.push(i);
        }
    }
    out
}

fn peak_rank(values: &[f64], index: usize) -> usize {
    let mut rank = 1;
    while rank + 1 < values.len() && is_peak_at(values, index, rank + 1) {
        rank += 1;
    }
    rank
}

fn is_peak_at(values: &[f64], index: usize, dist: usize) -> bool {
    let left = index.saturating_sub(dist);
    let right = (index + dist).min(values.len() - 1);
    values[index] - values[left] > 0.0 && values[right] - values[index] < 0.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_strict_maxima_and_minima() {
        let v = [0.0, 1.0, 2.0, 1.5, 1.0, 1.8, 0.5];
        let tp = turning_points(&v);
        let idx: Vec<usize> = tp.maxima.iter().map(|m| m.index).collect();
        assert_eq!(idx, vec![2, 5]);
        assert_eq!(tp.minima, vec![4]);
    }

    #[test]
    fn plateau_is_not_a_turning_point() {
        let v = [0.0, 1.0, 1.0, 0.0];
        let tp = turning_points(&v);
        assert!(tp.maxima.is_empty());
    }

    #[test]
    fn monotone_curve_has_no_maxima() {
        let v: Vec<f64> = (0..20).map(|i| (i as f64).sqrt()).collect();
        assert!(turning_points(&v).maxima.is_empty());
    }

    #[test]
    fn rank_measures_dominance() {
        // Peak at 2 dominates up to distance 2; at distance 3 the right side
        // clamps to the last sample, which is higher.
        let v = [0.0, 1.0, 3.0, 1.0, 0.5, 4.0];
        let tp = turning_points(&v);
        assert_eq!(tp.maxima[0], TurningPoint { index: 2, rank: 2 });
    }

    #[test]
    fn short_curves_have_no_turning_points() {
        assert_eq!(turning_points(&[1.0, 2.0]), TurningPoints::default());
    }
}

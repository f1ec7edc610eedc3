//! Turning ingested rows into prepared cross-sections.
//!
//! `wrangle` orders the points of every cross-section and lays them out along
//! the section line; `trim_to_channel` marks the part of the section the
//! estimator should see.

use std::collections::BTreeMap;

use crate::domain::{PreparedCrossSection, SurveyPoint, TrimConfig};
use crate::io::ingest::SurveyRow;

/// Sort each cross-section by point order and compute the cumulative planar
/// distance from its first point. Every point starts out `in_channel`.
pub fn wrangle(sections: &BTreeMap<u32, Vec<SurveyRow>>) -> BTreeMap<u32, PreparedCrossSection> {
    sections
        .iter()
        .map(|(&id, rows)| {
            let mut rows = rows.clone();
            rows.sort_by_key(|r| r.order);

            let mut distance = 0.0;
            let mut points = Vec::with_capacity(rows.len());
            for (i, r) in rows.iter().enumerate() {
                if i > 0 {
                    let prev = &rows[i - 1];
                    distance += (r.x - prev.x).hypot(r.y - prev.y);
                }
                points.push(SurveyPoint {
                    order: r.order,
                    x: r.x,
                    y: r.y,
                    distance,
                    elevation: r.elevation,
                    centre: r.centre,
                    in_channel: true,
                });
            }
            (id, PreparedCrossSection { id, points })
        })
        .collect()
}

/// Cut points `(left, right)` of a cross-section, as point indices.
///
/// The channel minimum is searched within `window` points either side of the
/// first centre marker (the global minimum without a marker). The left cut is
/// the last point before the first channel-minimum point lying below that
/// minimum, the right cut the first such point after the last channel-minimum
/// point. They default to the first and last point.
pub fn channel_cuts(points: &[SurveyPoint], window: usize) -> Option<(usize, usize)> {
    if points.is_empty() {
        return None;
    }

    let min_of = |slice: &[SurveyPoint]| {
        slice
            .iter()
            .map(|p| p.elevation)
            .fold(f64::INFINITY, f64::min)
    };
    let channel_min = match points.iter().position(|p| p.centre) {
        Some(c) => {
            let lo = c.saturating_sub(window);
            let hi = (c + window + 1).min(points.len());
            min_of(&points[lo..hi])
        }
        None => min_of(points),
    };

    let first_min = points.iter().position(|p| p.elevation == channel_min)?;
    let last_min = points.iter().rposition(|p| p.elevation == channel_min)?;

    let left = points[..first_min]
        .iter()
        .rposition(|p| p.elevation < channel_min)
        .unwrap_or(0);
    let right = points[last_min..]
        .iter()
        .position(|p| p.elevation < channel_min)
        .map(|i| i + last_min)
        .unwrap_or(points.len() - 1);
    Some((left, right))
}

/// Mark `in_channel` strictly between the cut points. With trimming disabled
/// every point stays in the channel.
pub fn trim_to_channel(section: &mut PreparedCrossSection, config: &TrimConfig) {
    if !config.enabled {
        section.points.iter_mut().for_each(|p| p.in_channel = true);
        return;
    }
    let Some((left, right)) = channel_cuts(&section.points, config.window) else {
        return;
    };
    for (i, p) in section.points.iter_mut().enumerate() {
        p.in_channel = left < i && i < right;
    }
}

/// `wrangle` followed by `trim_to_channel` on every cross-section.
pub fn prepare(
    sections: &BTreeMap<u32, Vec<SurveyRow>>,
    config: &TrimConfig,
) -> BTreeMap<u32, PreparedCrossSection> {
    let mut prepared = wrangle(sections);
    for section in prepared.values_mut() {
        trim_to_channel(section, config);
    }
    prepared
}

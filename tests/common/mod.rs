//! Synthetic cross-sections shared by the integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;

use hydxs::domain::{PreparedCrossSection, RunConfig, SparPolicy, SurveyPoint};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Points laid out along the section line, all in the channel.
pub fn section(id: u32, raw: &[(f64, f64)]) -> PreparedCrossSection {
    let points = raw
        .iter()
        .enumerate()
        .map(|(i, &(d, z))| SurveyPoint::on_line(i as i64, d, z))
        .collect();
    PreparedCrossSection { id, points }
}

/// Symmetric V: 21 points, distance 0..20, elevation 5 at the ends and 0 in the middle.
pub fn v_points() -> Vec<(f64, f64)> {
    (0..21)
        .map(|i| (i as f64, (i as f64 - 10.0).abs() * 0.5))
        .collect()
}

/// Wide shallow depression on the left, narrow deeper thalweg on the right.
pub fn two_depressions() -> Vec<(f64, f64)> {
    vec![
        (0.0, 4.0),
        (1.0, 1.5),
        (9.0, 1.5),
        (10.0, 3.0),
        (11.0, 0.0),
        (12.0, 3.0),
        (13.0, 4.0),
    ]
}

/// Rises away from its lowest point at the left end, so every wetted region
/// starts on the surveyed boundary.
pub fn left_open() -> Vec<(f64, f64)> {
    (0..11).map(|i| (i as f64, i as f64 * 0.5)).collect()
}

pub fn sections(items: Vec<PreparedCrossSection>) -> BTreeMap<u32, PreparedCrossSection> {
    items.into_iter().map(|s| (s.id, s)).collect()
}

pub fn fixed_spar_config() -> RunConfig {
    RunConfig {
        spar: SparPolicy::Fixed { spar: 0.7 },
        ..RunConfig::default()
    }
}

/// A point table in the default column layout: a V with its centre marked,
/// the left-open slope and a two-point stub.
pub fn survey_csv() -> String {
    let mut out = String::from("x_sec_id,x_sec_order,POINT_X,POINT_Y,POINT_Z,RivCentre\n");
    for (i, (d, z)) in v_points().into_iter().enumerate() {
        let centre = if i == 10 { 1 } else { 0 };
        out.push_str(&format!("1,{},{d},0,{z},{centre}\n", i + 1));
    }
    for (i, (d, z)) in left_open().into_iter().enumerate() {
        out.push_str(&format!("2,{},0,{d},{z},0\n", i + 1));
    }
    out.push_str("3,1,0,0,1,0\n3,2,1,0,2,0\n");
    out
}

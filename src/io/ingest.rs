//! CSV ingest of surveyed cross-section points.
//!
//! Turns a point table (one row per surveyed point) into rows grouped by
//! cross-section id, ready for `preprocess::wrangle`.
//!
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - no geometry here: distances and trimming belong to `preprocess`

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::StringRecord;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Column names of the point table (matched case-insensitively).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurveyColumns {
    pub id: String,
    pub order: String,
    pub x: String,
    pub y: String,
    pub z: String,
    /// Optional: non-zero marks the surveyed river centre.
    pub centre: String,
}

impl Default for SurveyColumns {
    fn default() -> Self {
        Self {
            id: "x_sec_id".to_string(),
            order: "x_sec_order".to_string(),
            x: "POINT_X".to_string(),
            y: "POINT_Y".to_string(),
            z: "POINT_Z".to_string(),
            centre: "RivCentre".to_string(),
        }
    }
}

/// One parsed CSV row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurveyRow {
    pub cross_section: u32,
    pub order: i64,
    pub x: f64,
    pub y: f64,
    pub elevation: f64,
    pub centre: bool,
}

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub cross_section: Option<u32>,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct IngestedSurvey {
    pub sections: BTreeMap<u32, Vec<SurveyRow>>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
    pub rows_used: usize,
    /// Whether the centre-marker column was present at all.
    pub has_centre: bool,
}

struct ColumnIndex {
    id: usize,
    order: usize,
    x: usize,
    y: usize,
    z: usize,
    centre: Option<usize>,
}

pub fn load_survey_points(path: &Path, columns: &SurveyColumns) -> Result<IngestedSurvey, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open CSV '{}': {e}", path.display())))?;
    read_survey_points(file, columns)
}

/// Same as `load_survey_points`, over any reader.
pub fn read_survey_points<R: Read>(input: R, columns: &SurveyColumns) -> Result<IngestedSurvey, AppError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader
        .headers()
        .map_err(|e| AppError::new(2, format!("Failed to read CSV headers: {e}")))?
        .clone();
    let index = resolve_columns(&build_header_map(&headers), columns)?;

    let mut out = IngestedSurvey {
        has_centre: index.centre.is_some(),
        ..IngestedSurvey::default()
    };

    for (idx, result) in reader.records().enumerate() {
        // records() starts after the header line; CSV lines are 1-based.
        let line = idx + 2;
        out.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                out.row_errors.push(RowError {
                    line,
                    cross_section: None,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match parse_row(&record, &index, columns) {
            Ok(row) => {
                out.sections.entry(row.cross_section).or_default().push(row);
                out.rows_used += 1;
            }
            Err((cross_section, message)) => out.row_errors.push(RowError {
                line,
                cross_section,
                message,
            }),
        }
    }

    if out.rows_used == 0 {
        return Err(AppError::new(3, "No valid survey points in the input CSV."));
    }
    Ok(out)
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Spreadsheet exports often prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn resolve_columns(header_map: &HashMap<String, usize>, columns: &SurveyColumns) -> Result<ColumnIndex, AppError> {
    let required = |name: &str| -> Result<usize, AppError> {
        header_map
            .get(&normalize_header_name(name))
            .copied()
            .ok_or_else(|| AppError::new(2, format!("Missing required column: `{name}`")))
    };
    Ok(ColumnIndex {
        id: required(&columns.id)?,
        order: required(&columns.order)?,
        x: required(&columns.x)?,
        y: required(&columns.y)?,
        z: required(&columns.z)?,
        centre: header_map.get(&normalize_header_name(&columns.centre)).copied(),
    })
}

fn parse_row(
    record: &StringRecord,
    index: &ColumnIndex,
    columns: &SurveyColumns,
) -> Result<SurveyRow, (Option<u32>, String)> {
    let id_raw = get_required(record, index.id, &columns.id).map_err(|e| (None, e))?;
    let cross_section = parse_id(id_raw).map_err(|e| (None, e))?;
    let fail = |message: String| (Some(cross_section), message);

    let order_raw = get_required(record, index.order, &columns.order).map_err(fail)?;
    let order = parse_order(order_raw).map_err(fail)?;
    let x = parse_f64(record, index.x, &columns.x).map_err(fail)?;
    let y = parse_f64(record, index.y, &columns.y).map_err(fail)?;
    let elevation = parse_f64(record, index.z, &columns.z).map_err(fail)?;
    let centre = index
        .centre
        .and_then(|i| record.get(i))
        .map(parse_marker)
        .unwrap_or(false);

    Ok(SurveyRow {
        cross_section,
        order,
        x,
        y,
        elevation,
        centre,
    })
}

fn get_required<'a>(record: &'a StringRecord, idx: usize, name: &str) -> Result<&'a str, String> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| format!("Missing required value: `{name}`"))
}

fn parse_f64(record: &StringRecord, idx: usize, name: &str) -> Result<f64, String> {
    let s = get_required(record, idx, name)?;
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(format!("Invalid `{name}` value '{s}'.")),
    }
}

/// Ids are written as integers, sometimes with a trailing `.0` by GIS exports.
fn parse_id(s: &str) -> Result<u32, String> {
    if let Ok(v) = s.parse::<u32>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= 0.0 && v <= u32::MAX as f64 => Ok(v as u32),
        _ => Err(format!("Invalid cross-section id '{s}'.")),
    }
}

fn parse_order(s: &str) -> Result<i64, String> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v.abs() < i64::MAX as f64 => Ok(v as i64),
        _ => Err(format!("Invalid point order '{s}'.")),
    }
}

/// Empty, `0` and `false` are unmarked; anything else marks the centre.
fn parse_marker(s: &str) -> bool {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("false") {
        return false;
    }
    !matches!(s.parse::<f64>(), Ok(v) if v == 0.0)
}

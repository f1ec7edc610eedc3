//! CSV exports of per-run, consensus and per-point results.
//!
//! Column names follow the established HydXS output tables so downstream GIS
//! joins keep working. Missing values are written as empty fields.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::{AnnotatedPoint, BankfullResult, CrossSectionOutcome, Validity};
use crate::error::AppError;

/// `runs` value written for a run still touching the surveyed extent.
pub const BOUNDARY_HIT_RUNS: usize = 99;

pub const CONSENSUS_FILE: &str = "calculated_results.csv";
pub const POINTS_FILE: &str = "final_results.csv";

pub fn run_file_name(run_index: usize) -> String {
    format!("hydxs_run{run_index}.csv")
}

fn create(path: &Path) -> Result<BufWriter<File>, AppError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| AppError::new(4, format!("Failed to create '{}': {e}", path.display())))
}

fn write_err(path: &Path) -> impl Fn(std::io::Error) -> AppError + '_ {
    move |e| AppError::new(4, format!("Failed to write '{}': {e}", path.display()))
}

fn opt<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

fn opt_f(v: Option<f64>, decimals: usize) -> String {
    v.map(|v| format!("{v:.decimals$}")).unwrap_or_default()
}

/// Retries taken by a run, in the `runs` column convention.
pub fn retries_column(run: &BankfullResult) -> usize {
    match run.validity {
        Validity::BoundaryHit => BOUNDARY_HIT_RUNS,
        Validity::Valid | Validity::Failed => run.attempt_count.saturating_sub(1),
    }
}

/// One row of a per-run table: `(bankfull, left, right, channels, spar)`.
fn run_values(run: Option<&BankfullResult>) -> (Option<f64>, Option<f64>, Option<f64>, Option<usize>, Option<f64>) {
    let Some(run) = run else {
        return (None, None, None, None, None);
    };
    let spar = run.estimate.map(|e| e.smoothing_parameter);
    match run.accepted() {
        Some(e) => (
            Some(e.bankfull_level),
            Some(e.left_distance),
            Some(e.right_distance),
            Some(e.channel_count),
            spar,
        ),
        None => (None, None, None, None, spar),
    }
}

/// Write `hydxs_run{k}.csv` for k = 1..=runs into `dir`.
pub fn write_run_csvs(
    dir: &Path,
    sections: &[CrossSectionOutcome],
    runs: usize,
) -> Result<Vec<PathBuf>, AppError> {
    let mut written = Vec::with_capacity(runs);
    for k in 1..=runs {
        let path = dir.join(run_file_name(k));
        write_run_csv(&path, sections, k)?;
        written.push(path);
    }
    Ok(written)
}

fn write_run_csv(path: &Path, sections: &[CrossSectionOutcome], run_index: usize) -> Result<(), AppError> {
    let mut file = create(path)?;
    let err = write_err(path);

    writeln!(file, "CrossSection,BankFull,LeftDistance,RightDistance,nChannels,spar,runs").map_err(&err)?;
    for s in sections {
        let run = s.runs.iter().find(|r| r.run_index == run_index);
        let (bankfull, left, right, channels, spar) = run_values(run);
        writeln!(
            file,
            "{},{},{},{},{},{},{}",
            s.id,
            opt_f(bankfull, 4),
            opt_f(left, 4),
            opt_f(right, 4),
            opt(channels),
            opt_f(spar, 4),
            opt(run.map(retries_column)),
        )
        .map_err(&err)?;
    }
    file.flush().map_err(&err)?;
    Ok(())
}

/// Write the consensus table, one row per processed cross-section.
pub fn write_consensus_csv(
    path: &Path,
    sections: &[CrossSectionOutcome],
    runs: usize,
    precision: u32,
) -> Result<(), AppError> {
    let mut file = create(path)?;
    let err = write_err(path);
    let p = precision as usize;

    let mut header = String::from(
        "CrossSection,BankFull,LeftOutput,RightOutput,nChannels,CountatBankFull,BankFullType,ValidRuns",
    );
    for k in 1..=runs {
        header.push_str(&format!(",bankfull_{k},left_{k},right_{k}"));
    }
    writeln!(file, "{header}").map_err(&err)?;

    for s in sections {
        let c = &s.consensus;
        let mut row = format!(
            "{},{},{},{},{},{},{},{}",
            s.id,
            opt_f(c.bankfull_value, p),
            opt_f(c.bank_left, p),
            opt_f(c.bank_right, p),
            opt(c.channel_count),
            c.agreement_count,
            c.method.label(),
            c.valid_runs,
        );
        for k in 1..=runs {
            let (bankfull, left, right, _, _) = run_values(s.runs.iter().find(|r| r.run_index == k));
            row.push_str(&format!(
                ",{},{},{}",
                opt_f(bankfull, p),
                opt_f(left, p),
                opt_f(right, p)
            ));
        }
        writeln!(file, "{row}").map_err(&err)?;
    }
    file.flush().map_err(&err)?;
    Ok(())
}

/// Write every input point with its cross-section's consensus attached.
pub fn write_points_csv(path: &Path, points: &[AnnotatedPoint], precision: u32) -> Result<(), AppError> {
    let mut file = create(path)?;
    let err = write_err(path);
    let p = precision as usize;

    writeln!(
        file,
        "x_sec_id,x_sec_order,POINT_X,POINT_Y,POINT_Z,Distance,inXS,BankFull,LeftOutput,RightOutput,CountatBankFull,inRiver"
    )
    .map_err(&err)?;
    for a in points {
        let pt = &a.point;
        writeln!(
            file,
            "{},{},{},{},{},{:.4},{},{},{},{},{},{}",
            a.cross_section,
            pt.order,
            pt.x,
            pt.y,
            pt.elevation,
            pt.distance,
            pt.in_channel,
            opt_f(a.bankfull, p),
            opt_f(a.bank_left, p),
            opt_f(a.bank_right, p),
            a.count_at_bankfull,
            a.in_river,
        )
        .map_err(&err)?;
    }
    file.flush().map_err(&err)?;
    Ok(())
}

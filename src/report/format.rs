//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the geometry/consensus code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

use crate::app::pipeline::PipelineOutput;
use crate::domain::{
    BankSource, BankfullResult, ConsensusMethod, ConsensusResult, CrossSectionOutcome,
    LevelSelection, RunConfig, SparPolicy, Validity,
};
use crate::io::summary::IngestCounts;

/// Format the full run summary (input stats + settings + consensus breakdown).
pub fn format_run_summary(output: &PipelineOutput, config: &RunConfig, ingest: IngestCounts) -> String {
    let mut out = String::new();

    out.push_str("=== hydxs - bankfull detection ===\n");
    out.push_str(&format!(
        "Rows: read={} used={} errors={}\n",
        ingest.rows_read, ingest.rows_used, ingest.row_errors
    ));
    out.push_str(&format!(
        "Runs: {} per cross-section | attempts<={} | seed={}\n",
        config.consensus.runs, config.retry.max_attempts, config.seed
    ));
    out.push_str(&format!("Smoothing: {}\n", fmt_spar(config.spar)));
    out.push_str(&format!(
        "Sweep: steps={} min_depth={} offset={} policy={:?}\n",
        config.estimator.n_steps,
        config.estimator.min_depth,
        config.estimator.edge_offset,
        config.estimator.channel_policy,
    ));

    out.push_str("\nConsensus:\n");
    for method in [ConsensusMethod::Mode, ConsensusMethod::Binned, ConsensusMethod::None] {
        out.push_str(&format!(
            "  {:<7} {}\n",
            method.label(),
            output.method_count(method)
        ));
    }

    let review: Vec<String> = output
        .sections
        .iter()
        .filter(|s| s.consensus.method == ConsensusMethod::None)
        .map(|s| s.id.to_string())
        .collect();
    if !review.is_empty() {
        out.push_str(&format!("\nManual review ({}): {}\n", review.len(), review.join(", ")));
    }

    if !output.skipped.is_empty() {
        out.push_str(&format!("\nSkipped ({}):\n", output.skipped.len()));
        for s in &output.skipped {
            out.push_str(&format!("  {:>6}  {}\n", s.id, s.reason));
        }
    }

    out
}

/// Per-run table and consensus of one cross-section (`hydxs inspect`).
pub fn format_cross_section(outcome: &CrossSectionOutcome) -> String {
    let mut out = String::new();
    out.push_str(&format!("Cross-section {}\n", outcome.id));
    out.push_str(
        format!(
            "{:>4} {:>10} {:>10} {:>10} {:>4} {:>6} {:>3} {:<12} {:<14}\n",
            "run", "bankfull", "left", "right", "ch", "spar", "att", "validity", "selection"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<4} {:-<10} {:-<10} {:-<10} {:-<4} {:-<6} {:-<3} {:-<12} {:-<14}\n",
            "", "", "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');
    for run in &outcome.runs {
        out.push_str(format_run_row(run).trim_end());
        out.push('\n');
    }
    out.push('\n');
    out.push_str(&format_consensus(&outcome.consensus));
    out
}

fn format_run_row(run: &BankfullResult) -> String {
    let validity = match run.validity {
        Validity::Valid => "valid",
        Validity::BoundaryHit => "boundary-hit",
        Validity::Failed => "failed",
    };
    match &run.estimate {
        Some(e) => format!(
            "{:>4} {:>10.3} {:>10.3} {:>10.3} {:>4} {:>6.3} {:>3} {:<12} {:<14}\n",
            run.run_index,
            e.bankfull_level,
            e.left_distance,
            e.right_distance,
            e.channel_count,
            e.smoothing_parameter,
            run.attempt_count,
            validity,
            fmt_selection(e.selection),
        ),
        None => format!(
            "{:>4} {:>10} {:>10} {:>10} {:>4} {:>6} {:>3} {:<12} {}\n",
            run.run_index,
            "-",
            "-",
            "-",
            "-",
            "-",
            run.attempt_count,
            validity,
            run.error.as_deref().unwrap_or(""),
        ),
    }
}

pub fn format_consensus(c: &ConsensusResult) -> String {
    if c.method == ConsensusMethod::None {
        return format!(
            "Consensus: none (0 of {} runs valid) - flagged for manual review\n",
            c.total_runs
        );
    }
    let source = match c.bank_source {
        Some(BankSource::Run { run_index }) => format!("run {run_index}"),
        Some(BankSource::Interpolated) => "interpolated".to_string(),
        None => "-".to_string(),
    };
    format!(
        "Consensus: {} bankfull={} banks=[{}, {}] channels={} agreement={}/{} (valid {}) banks from {}\n",
        c.method.label(),
        fmt_opt(c.bankfull_value),
        fmt_opt(c.bank_left),
        fmt_opt(c.bank_right),
        c.channel_count.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string()),
        c.agreement_count,
        c.total_runs,
        c.valid_runs,
        source,
    )
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

fn fmt_spar(spar: SparPolicy) -> String {
    match spar {
        SparPolicy::Fixed { spar } => format!("fixed spar={spar}"),
        SparPolicy::Random { min, max } => format!("random spar in [{min}, {max}]"),
    }
}

fn fmt_selection(selection: LevelSelection) -> String {
    match selection {
        LevelSelection::TurningPoint { index, rank } => format!("tp#{index} r{rank}"),
        LevelSelection::NoTurningPoint => "fallback".to_string(),
        LevelSelection::BelowThreshold => "shallow".to_string(),
    }
}

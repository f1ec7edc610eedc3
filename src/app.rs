//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging / the thread pool
//! - ingests and prepares the survey
//! - runs the pipeline
//! - prints reports and writes the result tables

use std::collections::BTreeMap;

use clap::Parser;
use log::{LevelFilter, info, warn};

use crate::cli::{Command, EstimateArgs, InputArgs, InspectArgs, RunArgs};
use crate::domain::{
    ConsensusConfig, EstimatorConfig, PreparedCrossSection, RetryConfig, RunConfig, SparPolicy,
    TrimConfig,
};
use crate::error::AppError;
use crate::io::ingest::{IngestedSurvey, SurveyColumns, load_survey_points};
use crate::io::summary::IngestCounts;
use crate::smoothing::SplineSmoother;

pub mod pipeline;

/// Entry point for the `hydxs` binary.
pub fn run() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = crate::cli::Cli::parse();
    init_logging(cli.verbose);

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| AppError::new(2, format!("Failed to configure {threads} worker threads: {e}")))?;
    }

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Inspect(args) => handle_inspect(args),
    }
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    // A logger may already be installed when embedded (e.g. in tests).
    builder.try_init().ok();
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.estimate, args.first, args.last, &args.exclude);
    config.validate()?;

    let (ingest, prepared) = load_and_prepare(&args.input, &config.trim)?;
    let counts = ingest_counts(&ingest);

    let smoother = SplineSmoother::new(config.spar);
    let output = pipeline::run_pipeline(&prepared, &config, &smoother);
    if output.sections.is_empty() {
        return Err(AppError::new(
            3,
            format!(
                "No cross-section could be processed ({} selected ids skipped).",
                output.skipped.len()
            ),
        ));
    }

    println!("{}", crate::report::format_run_summary(&output, &config, counts));

    let dir = &args.output_dir;
    std::fs::create_dir_all(dir)
        .map_err(|e| AppError::new(4, format!("Failed to create output dir '{}': {e}", dir.display())))?;

    let run_files = crate::io::export::write_run_csvs(dir, &output.sections, config.consensus.runs)?;
    let consensus = dir.join(crate::io::export::CONSENSUS_FILE);
    crate::io::export::write_consensus_csv(
        &consensus,
        &output.sections,
        config.consensus.runs,
        config.consensus.precision,
    )?;
    let points = dir.join(crate::io::export::POINTS_FILE);
    crate::io::export::write_points_csv(&points, &output.points, config.consensus.precision)?;

    let summary_path = dir.join("summary.json");
    let summary = crate::io::summary::RunSummary::new(&args.input.input, &config, counts, &output);
    crate::io::summary::write_summary_json(&summary_path, &summary)?;

    info!(
        "wrote {} per-run tables, {}, {} and {}",
        run_files.len(),
        consensus.display(),
        points.display(),
        summary_path.display()
    );
    Ok(())
}

fn handle_inspect(args: InspectArgs) -> Result<(), AppError> {
    let config = config_from_args(&args.estimate, args.id, Some(args.id), &[]);
    config.validate()?;

    let (_, prepared) = load_and_prepare(&args.input, &config.trim)?;
    let section = prepared
        .get(&args.id)
        .ok_or_else(|| AppError::new(3, format!("Cross-section {} not found in the input.", args.id)))?;

    let profile = section.channel_profile()?;
    let smoother = SplineSmoother::new(config.spar);
    let outcome = crate::consensus::run_cross_section(&profile, &config, &smoother)?;

    println!("{}", crate::report::format_cross_section(&outcome));
    Ok(())
}

fn load_and_prepare(
    input: &InputArgs,
    trim: &TrimConfig,
) -> Result<(IngestedSurvey, BTreeMap<u32, PreparedCrossSection>), AppError> {
    let columns = columns_from_args(input);
    let ingest = load_survey_points(&input.input, &columns)?;
    for err in &ingest.row_errors {
        match err.cross_section {
            Some(id) => warn!("line {} (cross-section {id}): {}", err.line, err.message),
            None => warn!("line {}: {}", err.line, err.message),
        }
    }
    if trim.enabled && !ingest.has_centre {
        info!(
            "no `{}` column; trimming around each cross-section's lowest point",
            columns.centre
        );
    }
    let prepared = crate::preprocess::prepare(&ingest.sections, trim);
    Ok((ingest, prepared))
}

fn ingest_counts(ingest: &IngestedSurvey) -> IngestCounts {
    IngestCounts {
        rows_read: ingest.rows_read,
        rows_used: ingest.rows_used,
        row_errors: ingest.row_errors.len(),
    }
}

pub fn columns_from_args(args: &InputArgs) -> SurveyColumns {
    SurveyColumns {
        id: args.id_column.clone(),
        order: args.order_column.clone(),
        x: args.x_column.clone(),
        y: args.y_column.clone(),
        z: args.z_column.clone(),
        centre: args.centre_column.clone(),
    }
}

pub fn config_from_args(args: &EstimateArgs, first: u32, last: Option<u32>, exclude: &[u32]) -> RunConfig {
    RunConfig {
        estimator: EstimatorConfig {
            n_steps: args.steps,
            min_depth: args.min_depth,
            edge_offset: args.edge_offset,
            wall_margin: args.wall_margin,
            channel_policy: args.channel_policy,
        },
        retry: RetryConfig {
            max_attempts: args.max_attempts,
            allow_boundary: args.allow_boundary,
        },
        consensus: ConsensusConfig {
            runs: args.runs,
            window: args.window,
            precision: args.precision,
        },
        spar: match args.spar {
            Some(spar) => SparPolicy::Fixed { spar },
            None => SparPolicy::Random {
                min: args.spar_min,
                max: args.spar_max,
            },
        },
        trim: TrimConfig {
            enabled: !args.no_trim,
            window: args.trim_window,
        },
        seed: args.seed,
        first,
        last: last.unwrap_or(u32::MAX),
        exclude: exclude.iter().copied().collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;

    fn estimate_args(extra: &[&str]) -> EstimateArgs {
        let mut argv = vec!["hydxs", "run", "p.csv"];
        argv.extend_from_slice(extra);
        match Cli::try_parse_from(argv).unwrap().command {
            Command::Run(args) => args.estimate,
            Command::Inspect(_) => unreachable!(),
        }
    }

    #[test]
    fn defaults_match_run_config_defaults() {
        let config = config_from_args(&estimate_args(&[]), 1, None, &[]);
        let defaults = RunConfig::default();
        assert_eq!(config.estimator.n_steps, defaults.estimator.n_steps);
        assert_eq!(config.spar, defaults.spar);
        assert_eq!(config.consensus.runs, defaults.consensus.runs);
        assert_eq!(config.last, u32::MAX);
        config.validate().unwrap();
    }

    #[test]
    fn fixed_spar_and_flags_are_mapped() {
        let args = estimate_args(&["--spar", "0.7", "--no-trim", "--allow-boundary", "--channel-policy", "largest-area"]);
        let config = config_from_args(&args, 2, Some(9), &[4, 5]);
        assert_eq!(config.spar, SparPolicy::Fixed { spar: 0.7 });
        assert!(!config.trim.enabled);
        assert!(config.retry.allow_boundary);
        assert_eq!(config.estimator.channel_policy, crate::domain::ChannelPolicy::LargestArea);
        assert!(config.selects(2) && !config.selects(4) && !config.selects(10));
    }
}

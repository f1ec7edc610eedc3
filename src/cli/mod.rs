//! Command-line parsing for the bankfull detection tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! geometry and consensus code; `app` turns these arguments into a `RunConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::ChannelPolicy;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "hydxs", version, about = "Bankfull detection on surveyed river cross-sections")]
pub struct Cli {
    /// Log debug messages (overrides RUST_LOG).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Worker threads (default: all cores).
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process every selected cross-section and write the result tables.
    Run(RunArgs),
    /// Run a single cross-section and print each run and the consensus.
    Inspect(InspectArgs),
}

/// Input table and column names.
#[derive(Debug, Args, Clone)]
pub struct InputArgs {
    /// Point table (one row per surveyed point).
    #[arg(value_name = "CSV")]
    pub input: PathBuf,

    #[arg(long, default_value = "x_sec_id")]
    pub id_column: String,

    #[arg(long, default_value = "x_sec_order")]
    pub order_column: String,

    #[arg(long, default_value = "POINT_X")]
    pub x_column: String,

    #[arg(long, default_value = "POINT_Y")]
    pub y_column: String,

    #[arg(long, default_value = "POINT_Z")]
    pub z_column: String,

    /// Non-zero marks the surveyed river centre (optional column).
    #[arg(long, default_value = "RivCentre")]
    pub centre_column: String,
}

/// Estimation and consensus settings shared by `run` and `inspect`.
#[derive(Debug, Args, Clone)]
pub struct EstimateArgs {
    /// Independent runs per cross-section.
    #[arg(short = 'n', long, default_value_t = 11)]
    pub runs: usize,

    /// Base seed; every run derives its own stream from it.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Trial water levels per sweep.
    #[arg(long, default_value_t = 200)]
    pub steps: usize,

    /// Minimum smoothed hydraulic depth for a turning point to count.
    #[arg(long, default_value_t = 0.2)]
    pub min_depth: f64,

    /// Offset from the min/max elevation where the sweep starts/stops.
    #[arg(long, default_value_t = 0.1)]
    pub edge_offset: f64,

    /// Wall height added above the maximum elevation.
    #[arg(long, default_value_t = 1.0)]
    pub wall_margin: f64,

    /// Attempts per run while the banks touch the surveyed extent.
    #[arg(long, default_value_t = 3)]
    pub max_attempts: usize,

    /// Accept the first estimate even if it touches the surveyed extent.
    #[arg(long)]
    pub allow_boundary: bool,

    /// Which wetted region defines the banks when the water splits.
    #[arg(long, value_enum, default_value_t = ChannelPolicy::Thalweg)]
    pub channel_policy: ChannelPolicy,

    /// Fixed smoothing parameter (disables the random draw).
    #[arg(long, conflicts_with_all = ["spar_min", "spar_max"])]
    pub spar: Option<f64>,

    #[arg(long, default_value_t = 0.5)]
    pub spar_min: f64,

    #[arg(long, default_value_t = 1.0)]
    pub spar_max: f64,

    /// Agreement window around the mode.
    #[arg(long, default_value_t = 0.05)]
    pub window: f64,

    /// Decimal places per-run values are rounded to before reconciliation.
    #[arg(long, default_value_t = 2)]
    pub precision: u32,

    /// Keep every point instead of trimming to the channel around the centre.
    #[arg(long)]
    pub no_trim: bool,

    /// Points either side of the centre marker searched for the channel minimum.
    #[arg(long, default_value_t = 10)]
    pub trim_window: usize,
}

#[derive(Debug, Args, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub estimate: EstimateArgs,

    /// First cross-section id to process (inclusive).
    #[arg(long, default_value_t = 1)]
    pub first: u32,

    /// Last cross-section id to process (inclusive; default: all).
    #[arg(long)]
    pub last: Option<u32>,

    /// Cross-section ids to leave out (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub exclude: Vec<u32>,

    /// Directory the result tables are written to.
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,
}

#[derive(Debug, Args, Clone)]
pub struct InspectArgs {
    #[command(flatten)]
    pub input: InputArgs,

    #[command(flatten)]
    pub estimate: EstimateArgs,

    /// Cross-section id to inspect.
    #[arg(long)]
    pub id: u32,
}

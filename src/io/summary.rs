//! JSON run summary.
//!
//! A small machine-readable record of one `hydxs run`: when it ran, what it
//! ran with, and how the cross-sections came out.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use chrono::Local;
use serde::Serialize;

use crate::app::pipeline::PipelineOutput;
use crate::domain::{ConsensusMethod, RunConfig, SkippedSection};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize)]
pub struct MethodCounts {
    pub mode: usize,
    pub binned: usize,
    pub none: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub tool: String,
    pub version: String,
    pub generated_at: String,
    pub input: String,
    pub config: RunConfig,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: usize,
    pub cross_sections_processed: usize,
    pub methods: MethodCounts,
    /// Ids with a `none` consensus.
    pub manual_review: Vec<u32>,
    pub skipped: Vec<SkippedSection>,
}

/// Ingest counts carried into the summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct IngestCounts {
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: usize,
}

impl RunSummary {
    pub fn new(input: &Path, config: &RunConfig, ingest: IngestCounts, output: &PipelineOutput) -> Self {
        Self {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            generated_at: Local::now().to_rfc3339(),
            input: input.display().to_string(),
            config: config.clone(),
            rows_read: ingest.rows_read,
            rows_used: ingest.rows_used,
            row_errors: ingest.row_errors,
            cross_sections_processed: output.sections.len(),
            methods: MethodCounts {
                mode: output.method_count(ConsensusMethod::Mode),
                binned: output.method_count(ConsensusMethod::Binned),
                none: output.method_count(ConsensusMethod::None),
            },
            manual_review: output
                .sections
                .iter()
                .filter(|s| s.consensus.method == ConsensusMethod::None)
                .map(|s| s.id)
                .collect(),
            skipped: output.skipped.clone(),
        }
    }
}

pub fn write_summary_json(path: &Path, summary: &RunSummary) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(4, format!("Failed to create summary JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), summary)
        .map_err(|e| AppError::new(4, format!("Failed to write summary JSON: {e}")))?;
    Ok(())
}

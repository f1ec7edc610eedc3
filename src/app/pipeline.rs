//! Shared pipeline logic used by both `run` and `inspect`.
//!
//! prepared cross-sections -> channel profiles -> seeded runs -> consensus ->
//! per-point annotation
//!
//! Cross-sections are independent, so they are processed in parallel and
//! collected back in id order.

use std::collections::BTreeMap;

use log::{info, warn};
use rayon::prelude::*;

use crate::consensus::run_cross_section;
use crate::domain::{
    AnnotatedPoint, ConsensusMethod, ConsensusResult, CrossSectionOutcome, PreparedCrossSection,
    RunConfig, SkippedSection,
};
use crate::smoothing::CurveSmoother;

/// All computed outputs of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOutput {
    /// Processed cross-sections, ordered by id.
    pub sections: Vec<CrossSectionOutcome>,
    /// Selected cross-sections that could not be processed, ordered by id.
    pub skipped: Vec<SkippedSection>,
    /// Every input point, with the consensus of its cross-section attached.
    pub points: Vec<AnnotatedPoint>,
}

impl PipelineOutput {
    pub fn consensus_for(&self, id: u32) -> Option<&ConsensusResult> {
        self.sections
            .binary_search_by_key(&id, |s| s.id)
            .ok()
            .map(|i| &self.sections[i].consensus)
    }

    pub fn method_count(&self, method: ConsensusMethod) -> usize {
        self.sections
            .iter()
            .filter(|s| s.consensus.method == method)
            .count()
    }
}

enum SectionOutcome {
    Done(CrossSectionOutcome),
    Skipped(SkippedSection),
}

/// Run every selected cross-section and annotate all input points.
pub fn run_pipeline<S: CurveSmoother + ?Sized>(
    prepared: &BTreeMap<u32, PreparedCrossSection>,
    config: &RunConfig,
    smoother: &S,
) -> PipelineOutput {
    let selected: Vec<&PreparedCrossSection> = prepared
        .values()
        .filter(|s| config.selects(s.id))
        .collect();
    info!(
        "processing {} of {} cross-sections ({} runs each)",
        selected.len(),
        prepared.len(),
        config.consensus.runs
    );

    let outcomes: Vec<SectionOutcome> = selected
        .par_iter()
        .map(|section| process_section(section, config, smoother))
        .collect();

    let mut sections = Vec::new();
    let mut skipped = Vec::new();
    for outcome in outcomes {
        match outcome {
            SectionOutcome::Done(s) => sections.push(s),
            SectionOutcome::Skipped(s) => skipped.push(s),
        }
    }

    let points = annotate(prepared, &sections);
    PipelineOutput {
        sections,
        skipped,
        points,
    }
}

fn process_section<S: CurveSmoother + ?Sized>(
    section: &PreparedCrossSection,
    config: &RunConfig,
    smoother: &S,
) -> SectionOutcome {
    let skip = |reason: String| {
        warn!("skipping cross-section {}: {reason}", section.id);
        SectionOutcome::Skipped(SkippedSection {
            id: section.id,
            reason,
        })
    };

    let profile = match section.channel_profile() {
        Ok(p) => p,
        Err(err) => return skip(err.to_string()),
    };
    match run_cross_section(&profile, config, smoother) {
        Ok(outcome) => SectionOutcome::Done(outcome),
        Err(err) => skip(err.to_string()),
    }
}

/// Attach the consensus of each cross-section to its original points.
///
/// `in_river` holds strictly between the consensus banks; cross-sections
/// without a result (skipped, excluded, out of range, or `none`) are never in
/// the river and carry a zero count.
pub fn annotate(
    prepared: &BTreeMap<u32, PreparedCrossSection>,
    sections: &[CrossSectionOutcome],
) -> Vec<AnnotatedPoint> {
    let by_id: BTreeMap<u32, &ConsensusResult> =
        sections.iter().map(|s| (s.id, &s.consensus)).collect();

    prepared
        .values()
        .flat_map(|section| {
            let consensus = by_id.get(&section.id).copied();
            section.points.iter().map(move |&point| match consensus {
                Some(c) => AnnotatedPoint {
                    cross_section: section.id,
                    point,
                    in_river: c.contains(point.distance),
                    bankfull: c.bankfull_value,
                    bank_left: c.bank_left,
                    bank_right: c.bank_right,
                    count_at_bankfull: c.agreement_count,
                },
                None => AnnotatedPoint {
                    cross_section: section.id,
                    point,
                    in_river: false,
                    bankfull: None,
                    bank_left: None,
                    bank_right: None,
                    count_at_bankfull: 0,
                },
            })
        })
        .collect()
}

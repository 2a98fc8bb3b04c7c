use std::collections::{BTreeMap, BTreeSet};

use log::warn;

use crate::data::model::CandidateRow;
use crate::error::{PipelineError, Result};

/// Rescale confidence scores so every `peak_id` group sums to 100.
///
/// The grouping is rebuilt on every call. A group totalling exactly zero, or
/// whose total overflows to infinity, cannot be rescaled: each such group is
/// logged and reported together in a `DegenerateGroup` error.
pub fn renormalize_groups(
    rows: &[CandidateRow],
    stage: &'static str,
) -> Result<Vec<CandidateRow>> {
    if rows.is_empty() {
        return Err(PipelineError::EmptyInput { stage });
    }

    let mut totals: BTreeMap<&str, f64> = BTreeMap::new();
    for row in rows {
        *totals.entry(row.peak_id.as_str()).or_default() += row.confidence_score;
    }

    let degenerate: Vec<(&str, f64)> = totals
        .iter()
        .filter(|(_, total)| **total == 0.0 || !total.is_finite())
        .map(|(peak_id, total)| (*peak_id, *total))
        .collect();
    if !degenerate.is_empty() {
        for (peak_id, total) in &degenerate {
            warn!("{stage}: peak group {peak_id} has total confidence {total}, cannot rescale");
        }
        return Err(PipelineError::DegenerateGroup {
            stage,
            peak_ids: degenerate.iter().map(|(p, _)| p.to_string()).collect(),
        });
    }

    Ok(rows
        .iter()
        .map(|row| row.with_score(row.confidence_score / totals[row.peak_id.as_str()] * 100.0))
        .collect())
}

/// Log every peak group present in `before` that has no rows left in `after`.
pub fn warn_vanished_groups(before: &[CandidateRow], after: &[CandidateRow], stage: &str) {
    let kept: BTreeSet<&str> = after.iter().map(|r| r.peak_id.as_str()).collect();
    let vanished: BTreeSet<&str> = before
        .iter()
        .map(|r| r.peak_id.as_str())
        .filter(|p| !kept.contains(p))
        .collect();
    for peak_id in vanished {
        warn!("{stage}: every hit of peak group {peak_id} was filtered out");
    }
}

use log::debug;

use super::renormalize::{renormalize_groups, warn_vanished_groups};
use crate::data::model::CandidateRow;
use crate::error::Result;

const STAGE: &str = "confidence filter";

/// Drop candidates scoring at or below `cutoff`, then renormalize each peak
/// group to 100.
pub fn filter_confidence(candidates: &[CandidateRow], cutoff: f64) -> Result<Vec<CandidateRow>> {
    let kept: Vec<CandidateRow> = candidates
        .iter()
        .filter(|c| c.confidence_score > cutoff)
        .cloned()
        .collect();

    debug!(
        "{STAGE}: {} of {} candidates score above {cutoff}",
        kept.len(),
        candidates.len()
    );
    warn_vanished_groups(candidates, &kept, STAGE);
    renormalize_groups(&kept, STAGE)
}

use std::collections::HashSet;

use log::debug;

use super::renormalize::{renormalize_groups, warn_vanished_groups};
use crate::data::model::{CandidateRow, DesialylatedReferenceRow};
use crate::error::{PipelineError, Result};

const STAGE: &str = "peak reconciliation";

// ---------------------------------------------------------------------------
// ReferenceMasses – distinct experimental masses, sorted for lookup
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceMasses {
    sorted: Vec<f64>,
}

impl ReferenceMasses {
    /// Distinct masses of the reference rows. Non-finite masses are rejected.
    pub fn from_rows(rows: &[DesialylatedReferenceRow]) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if !row.measured_mass.is_finite() {
                return Err(PipelineError::malformed(
                    i,
                    format!("reference mass {} is not finite", row.measured_mass),
                ));
            }
        }
        Ok(Self::from_masses(rows.iter().map(|r| r.measured_mass)))
    }

    /// Caller guarantees the masses are finite.
    pub fn from_masses(masses: impl IntoIterator<Item = f64>) -> Self {
        let mut sorted: Vec<f64> = masses.into_iter().collect();
        sorted.sort_by(f64::total_cmp);
        sorted.dedup();
        ReferenceMasses { sorted }
    }

    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.sorted
    }

    /// Whether some reference mass `m` satisfies `|mass - m| < tolerance`.
    ///
    /// Only the two neighbours around the insertion point can be closest.
    pub fn has_match(&self, mass: f64, tolerance: f64) -> bool {
        let idx = self.sorted.partition_point(|&m| m < mass);
        let above = self.sorted.get(idx).is_some_and(|&m| m - mass < tolerance);
        let below = idx > 0 && mass - self.sorted[idx - 1] < tolerance;
        above || below
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Keep candidates whose computed mass lies within `tolerance` of a reference
/// mass, one copy per (`peak_id`, `hit_id`) with the first in input order
/// winning, then renormalize each peak group to 100.
pub fn reconcile(
    candidates: &[CandidateRow],
    reference: &ReferenceMasses,
    tolerance: f64,
) -> Result<Vec<CandidateRow>> {
    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    let matched: Vec<CandidateRow> = candidates
        .iter()
        .filter(|c| reference.has_match(c.computed_mass, tolerance))
        .filter(|c| seen.insert(c.key()))
        .cloned()
        .collect();

    debug!(
        "{STAGE}: {} of {} candidates within {tolerance} Da of {} reference masses",
        matched.len(),
        candidates.len(),
        reference.len()
    );
    warn_vanished_groups(candidates, &matched, STAGE);
    renormalize_groups(&matched, STAGE)
}

//! Core transformation: sialylated peak table → derived desialylated spectrum.
//!
//! ```text
//!   SialylatedPeakRow[]
//!          │
//!          ▼
//!   ┌──────────┐
//!   │ backcalc  │  strip sialic acid / acetyl masses → CandidateRow[]
//!   └──────────┘
//!          │
//!          ▼
//!   ┌───────────┐
//!   │ reconcile  │  (optional) keep rows near a reference mass, renormalize
//!   └───────────┘
//!          │
//!          ▼
//!   ┌────────────┐
//!   │ confidence  │  (optional) drop rows at/below cutoff, renormalize
//!   └────────────┘
//!          │
//!          ▼
//!   ┌─────────┐
//!   │ binning  │  equal-width histogram, midpoint masses, max → 100
//!   └─────────┘
//! ```
//!
//! Every stage is a pure function producing a new row set.

pub mod backcalc;
pub mod binning;
pub mod confidence;
pub mod reconcile;
pub mod renormalize;

use log::debug;

use crate::config::PipelineConfig;
use crate::data::model::{CandidateRow, SialylatedPeakRow, Spectrum};
use crate::error::Result;

pub use backcalc::back_calculate;
pub use binning::{bin_candidates, build_spectrum, rescale};
pub use confidence::filter_confidence;
pub use reconcile::{ReferenceMasses, reconcile};
pub use renormalize::renormalize_groups;

/// Run back-calculation and whichever filter stages `config` enables.
pub fn filtered_candidates(
    rows: &[SialylatedPeakRow],
    reference: &ReferenceMasses,
    config: &PipelineConfig,
) -> Result<Vec<CandidateRow>> {
    config.validate()?;

    let mut candidates = back_calculate(rows, &config.deltas)?;
    debug!("back-calculated {} candidates", candidates.len());

    if config.peak_filter_enabled {
        candidates = reconcile(&candidates, reference, config.mass_tolerance)?;
    }
    if config.confidence_filter_enabled {
        candidates = filter_confidence(&candidates, config.confidence_cutoff)?;
    }
    Ok(candidates)
}

/// Full pipeline run for one configuration.
pub fn run_pipeline(
    rows: &[SialylatedPeakRow],
    reference: &ReferenceMasses,
    config: &PipelineConfig,
) -> Result<Spectrum> {
    let candidates = filtered_candidates(rows, reference, config)?;
    build_spectrum(&candidates, config.mass_tolerance)
}

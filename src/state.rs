use std::collections::BTreeMap;

use log::{info, warn};
use rayon::prelude::*;

use crate::config::{PipelineConfig, Variant};
use crate::data::model::{DesialylatedReferenceRow, SialylatedPeakRow, Spectrum};
use crate::error::{PipelineError, Result};
use crate::pipeline::{ReferenceMasses, run_pipeline};

/// Outcome of one variant: a spectrum, or the error that aborted it.
pub type VariantOutcome = std::result::Result<Spectrum, PipelineError>;

// ---------------------------------------------------------------------------
// Analysis state
// ---------------------------------------------------------------------------

/// Loaded inputs and per-variant results, independent of any output format.
///
/// Inputs are never mutated once loaded, so variants can run concurrently.
#[derive(Debug, Clone)]
pub struct AnalysisState {
    pub sialylated: Vec<SialylatedPeakRow>,
    pub reference: Vec<DesialylatedReferenceRow>,
    reference_masses: ReferenceMasses,
    /// Filled by [`AnalysisState::run_all`].
    pub outcomes: BTreeMap<Variant, VariantOutcome>,
}

impl AnalysisState {
    pub fn new(
        sialylated: Vec<SialylatedPeakRow>,
        reference: Vec<DesialylatedReferenceRow>,
    ) -> Result<Self> {
        let reference_masses = ReferenceMasses::from_rows(&reference)?;
        info!(
            "{} sialylated hits, {} reference peaks ({} distinct masses)",
            sialylated.len(),
            reference.len(),
            reference_masses.len()
        );
        Ok(Self {
            sialylated,
            reference,
            reference_masses,
            outcomes: BTreeMap::new(),
        })
    }

    /// Run one variant with the numeric settings of `base`.
    pub fn run_variant(&self, variant: Variant, base: &PipelineConfig) -> VariantOutcome {
        let config = variant.config(base);
        let outcome = run_pipeline(&self.sialylated, &self.reference_masses, &config);
        match &outcome {
            Ok(spectrum) => info!("{variant}: {} spectrum points", spectrum.len()),
            Err(e) => warn!("{variant}: {e}"),
        }
        outcome
    }

    /// Run every variant, replacing previous outcomes.
    pub fn run_all(
        &mut self,
        base: &PipelineConfig,
        parallel: bool,
    ) -> &BTreeMap<Variant, VariantOutcome> {
        self.run_selected(&Variant::ALL, base, parallel)
    }

    /// Run the given variants, replacing previous outcomes.
    pub fn run_selected(
        &mut self,
        variants: &[Variant],
        base: &PipelineConfig,
        parallel: bool,
    ) -> &BTreeMap<Variant, VariantOutcome> {
        let outcomes: BTreeMap<Variant, VariantOutcome> = if parallel {
            variants
                .par_iter()
                .map(|&v| (v, self.run_variant(v, base)))
                .collect()
        } else {
            variants
                .iter()
                .map(|&v| (v, self.run_variant(v, base)))
                .collect()
        };
        self.outcomes = outcomes;
        &self.outcomes
    }

    /// Successful variants in variant order.
    pub fn spectra(&self) -> impl Iterator<Item = (Variant, &Spectrum)> {
        self.outcomes
            .iter()
            .filter_map(|(v, o)| o.as_ref().ok().map(|s| (*v, s)))
    }

    /// Failed variants in variant order.
    pub fn failures(&self) -> impl Iterator<Item = (Variant, &PipelineError)> {
        self.outcomes
            .iter()
            .filter_map(|(v, o)| o.as_ref().err().map(|e| (*v, e)))
    }
}

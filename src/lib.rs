//! Computational desialylation of annotated glycoprotein mass spectra.
//!
//! A sialylated peak list is converted into a derived desialylated spectrum
//! by subtracting sialic acid and acetyl masses, optionally reconciling the
//! result against an experimental reference and filtering by confidence,
//! then binning into (mass, relative intensity) points.

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod state;

pub use config::{ModificationDeltas, PipelineConfig, Variant};
pub use data::model::{
    Bin, CandidateRow, DesialylatedReferenceRow, SialylatedPeakRow, Spectrum, SpectrumPoint,
};
pub use error::{PipelineError, Result};
pub use pipeline::{ReferenceMasses, run_pipeline};
pub use state::AnalysisState;

//! Per-run pipeline configuration and the three named analysis variants.
//!
//! Settings can be loaded from a TOML file:
//!
//! ```toml
//! # desialo.toml
//! [pipeline]
//! mass_tolerance = 5.0
//! confidence_cutoff = 0.01
//!
//! [pipeline.deltas]
//! sialic_acid = 291.256
//! acetyl = 42.0106
//! ```

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Mass removed per sialic acid residue (Da).
pub const SIALIC_ACID_MASS_DELTA: f64 = 291.256;
/// Mass removed per acetyl group (Da).
pub const ACETYL_MASS_DELTA: f64 = 42.0106;

pub const DEFAULT_CONFIDENCE_CUTOFF: f64 = 0.01;
pub const DEFAULT_MASS_TOLERANCE: f64 = 5.0;

// ---------------------------------------------------------------------------
// Modification deltas
// ---------------------------------------------------------------------------

/// Per-modification mass deltas subtracted during back-calculation.
/// Override these for glycoprotein targets with different modifications.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModificationDeltas {
    pub sialic_acid: f64,
    pub acetyl: f64,
}

impl Default for ModificationDeltas {
    fn default() -> Self {
        Self {
            sialic_acid: SIALIC_ACID_MASS_DELTA,
            acetyl: ACETYL_MASS_DELTA,
        }
    }
}

// ---------------------------------------------------------------------------
// PipelineConfig
// ---------------------------------------------------------------------------

/// Toggles and numeric settings for a single pipeline invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub peak_filter_enabled: bool,
    pub confidence_filter_enabled: bool,
    /// Rows must score strictly above this to survive the confidence filter.
    pub confidence_cutoff: f64,
    /// Matching window (Da) and nominal bin width.
    pub mass_tolerance: f64,
    pub deltas: ModificationDeltas,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            peak_filter_enabled: false,
            confidence_filter_enabled: false,
            confidence_cutoff: DEFAULT_CONFIDENCE_CUTOFF,
            mass_tolerance: DEFAULT_MASS_TOLERANCE,
            deltas: ModificationDeltas::default(),
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.mass_tolerance.is_finite() || self.mass_tolerance <= 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "mass tolerance must be a positive number of Da, got {}",
                self.mass_tolerance
            )));
        }
        if !self.confidence_cutoff.is_finite() {
            return Err(PipelineError::InvalidConfig(format!(
                "confidence cutoff must be finite, got {}",
                self.confidence_cutoff
            )));
        }
        if !self.deltas.sialic_acid.is_finite() || !self.deltas.acetyl.is_finite() {
            return Err(PipelineError::InvalidConfig(
                "modification mass deltas must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// The three named analyses run downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Unfiltered,
    PeakFiltered,
    PeakAndConfidenceFiltered,
}

impl Variant {
    pub const ALL: [Variant; 3] = [
        Variant::Unfiltered,
        Variant::PeakFiltered,
        Variant::PeakAndConfidenceFiltered,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Variant::Unfiltered => "unfiltered",
            Variant::PeakFiltered => "peak_filtered",
            Variant::PeakAndConfidenceFiltered => "peak_and_confidence_filtered",
        }
    }

    /// Set this variant's toggles on top of `base`, keeping its numeric settings.
    pub fn config(self, base: &PipelineConfig) -> PipelineConfig {
        let (peak, confidence) = match self {
            Variant::Unfiltered => (false, false),
            Variant::PeakFiltered => (true, false),
            Variant::PeakAndConfidenceFiltered => (true, true),
        };
        PipelineConfig {
            peak_filter_enabled: peak,
            confidence_filter_enabled: confidence,
            ..*base
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Config file
// ---------------------------------------------------------------------------

/// Root of a `desialo.toml` file.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> anyhow::Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

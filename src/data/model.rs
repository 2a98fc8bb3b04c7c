use std::fmt;

use serde::Serialize;

// ---------------------------------------------------------------------------
// PeakKey – composite `<peak_id>-<hit_id>-<perm_id>` identifier
// ---------------------------------------------------------------------------

/// Identity of one annotation row. `perm_id` is optional (reference tables
/// usually omit it).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PeakKey {
    pub peak_id: String,
    pub hit_id: String,
    pub perm_id: Option<String>,
}

impl PeakKey {
    /// Split a composite identifier at its first two hyphens.
    ///
    /// Returns `None` when either of the required parts is missing or empty.
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.trim().splitn(3, '-');
        let peak_id = parts.next().filter(|p| !p.is_empty())?;
        let hit_id = parts.next().filter(|p| !p.is_empty())?;
        let perm_id = parts.next().filter(|p| !p.is_empty());
        Some(PeakKey {
            peak_id: peak_id.to_string(),
            hit_id: hit_id.to_string(),
            perm_id: perm_id.map(str::to_string),
        })
    }
}

impl fmt::Display for PeakKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.peak_id, self.hit_id)?;
        if let Some(perm) = &self.perm_id {
            write!(f, "-{perm}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Input rows
// ---------------------------------------------------------------------------

/// One annotation hit from the sialylated spectrum, as loaded.
///
/// Counts are kept signed and optional so that missing cells (treated as 0)
/// and negative counts (rejected) can both be seen by back-calculation.
#[derive(Debug, Clone, PartialEq)]
pub struct SialylatedPeakRow {
    pub peak_id: String,
    pub hit_id: String,
    pub perm_id: Option<String>,
    /// Measured mass in Da.
    pub measured_mass: f64,
    pub sialic_acid_count: Option<i64>,
    pub acetyl_count: Option<i64>,
    /// Relative-abundance-like score; only meaningful within its `peak_id`.
    pub confidence_score: f64,
}

/// One experimentally observed peak of the desialylated reference spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct DesialylatedReferenceRow {
    pub peak_id: String,
    pub hit_id: Option<String>,
    pub measured_mass: f64,
    /// Percent; used only when overlaying spectra.
    pub relative_intensity: f64,
}

// ---------------------------------------------------------------------------
// CandidateRow – a sialylated row after back-calculation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRow {
    pub peak_id: String,
    pub hit_id: String,
    pub perm_id: Option<String>,
    pub measured_mass: f64,
    pub sialic_acid_count: u32,
    pub acetyl_count: u32,
    /// Mass with sialic acid and acetyl contributions stripped.
    pub computed_mass: f64,
    pub confidence_score: f64,
}

impl CandidateRow {
    /// Identity used for deduplication.
    pub fn key(&self) -> (&str, &str) {
        (&self.peak_id, &self.hit_id)
    }

    /// Copy of this row with a new confidence score.
    pub fn with_score(&self, confidence_score: f64) -> Self {
        CandidateRow {
            confidence_score,
            ..self.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Bin / Spectrum – binner output
// ---------------------------------------------------------------------------

/// A populated mass interval. Boundaries are stored numerically at creation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bin {
    pub lower: f64,
    pub upper: f64,
    pub intensity: f64,
    /// Number of candidate rows that fell into this interval.
    pub rows: usize,
}

impl Bin {
    /// Representative mass: midpoint of the interval.
    pub fn mass(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectrumPoint {
    /// Da.
    pub mass: f64,
    /// Percent of the tallest point (0–100).
    pub intensity: f64,
}

/// A derived spectrum, ordered by mass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spectrum {
    pub points: Vec<SpectrumPoint>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn max_intensity(&self) -> Option<f64> {
        self.points.iter().map(|p| p.intensity).reduce(f64::max)
    }
}

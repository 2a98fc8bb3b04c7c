//! Histogram binning of candidate masses into a derived spectrum.
//!
//! The observed mass range `[min, max]` is cut into `n` equal-width
//! intervals, `n = round(range / tolerance)` (ties to even, at least 1).
//! Intervals are half-open `[lower, upper)` except the last, which also
//! contains `max`. Each populated interval becomes one spectrum point at its
//! midpoint, carrying the summed confidence of its rows; the tallest point is
//! then rescaled to exactly 100.

use std::collections::BTreeMap;

use log::debug;

use crate::data::model::{Bin, CandidateRow, Spectrum, SpectrumPoint};
use crate::error::{PipelineError, Result};

const STAGE: &str = "spectrum binning";

/// Number of equal-width bins for a mass range.
pub fn bin_count(range: f64, tolerance: f64) -> usize {
    let n = (range / tolerance).round_ties_even();
    if n.is_finite() && n >= 1.0 { n as usize } else { 1 }
}

/// Equal-width partition of `[min, max]`.
#[derive(Debug, Clone, Copy)]
struct Partition {
    min: f64,
    max: f64,
    n: usize,
}

impl Partition {
    fn edge(&self, i: usize) -> f64 {
        if i >= self.n {
            self.max
        } else {
            self.min + (self.max - self.min) * i as f64 / self.n as f64
        }
    }

    /// Interval index for a mass inside `[min, max]`, checked against the
    /// stored edges so rounding in the division cannot misplace a boundary value.
    fn index_of(&self, mass: f64) -> usize {
        let range = self.max - self.min;
        if range <= 0.0 {
            return 0;
        }
        let mut idx = (((mass - self.min) / range) * self.n as f64).floor() as usize;
        idx = idx.min(self.n - 1);
        while idx > 0 && mass < self.edge(idx) {
            idx -= 1;
        }
        while idx + 1 < self.n && mass >= self.edge(idx + 1) {
            idx += 1;
        }
        idx
    }
}

/// Assign candidates to bins and sum their confidence scores.
///
/// Returns the populated bins in mass order, before any rescaling.
pub fn bin_candidates(candidates: &[CandidateRow], tolerance: f64) -> Result<Vec<Bin>> {
    let (min, max) = candidates
        .iter()
        .map(|c| c.computed_mass)
        .fold(None, |acc: Option<(f64, f64)>, m| match acc {
            None => Some((m, m)),
            Some((lo, hi)) => Some((lo.min(m), hi.max(m))),
        })
        .ok_or(PipelineError::EmptyInput { stage: STAGE })?;

    let partition = Partition {
        min,
        max,
        n: bin_count(max - min, tolerance),
    };
    debug!(
        "{STAGE}: {} candidates over [{min:.4}, {max:.4}] into {} bins",
        candidates.len(),
        partition.n
    );

    let mut populated: BTreeMap<usize, (f64, usize)> = BTreeMap::new();
    for c in candidates {
        let slot = populated.entry(partition.index_of(c.computed_mass)).or_default();
        slot.0 += c.confidence_score;
        slot.1 += 1;
    }

    Ok(populated
        .into_iter()
        .map(|(idx, (intensity, rows))| Bin {
            lower: partition.edge(idx),
            upper: partition.edge(idx + 1),
            intensity,
            rows,
        })
        .collect())
}

/// Rescale bins so the tallest equals 100.
pub fn rescale(bins: &[Bin]) -> Result<Spectrum> {
    if bins.is_empty() {
        return Err(PipelineError::EmptyInput { stage: STAGE });
    }
    let max = bins.iter().map(|b| b.intensity).fold(0.0, f64::max);
    if !max.is_finite() {
        return Err(PipelineError::IntensityOverflow);
    }
    if max <= 0.0 {
        return Err(PipelineError::ZeroIntensity);
    }
    Ok(Spectrum {
        points: bins
            .iter()
            .map(|b| SpectrumPoint {
                mass: b.mass(),
                intensity: b.intensity / max * 100.0,
            })
            .collect(),
    })
}

/// Bin candidates and rescale to a derived spectrum.
pub fn build_spectrum(candidates: &[CandidateRow], tolerance: f64) -> Result<Spectrum> {
    rescale(&bin_candidates(candidates, tolerance)?)
}

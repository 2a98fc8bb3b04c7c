use crate::config::ModificationDeltas;
use crate::data::model::{CandidateRow, SialylatedPeakRow};
use crate::error::{PipelineError, Result};

/// Strip sialic acid and acetyl mass contributions from every row.
///
/// One candidate per input row, in input order. Missing counts count as 0.
/// Rows with a negative count, a non-finite mass, or a negative or
/// non-finite confidence score are rejected with `MalformedRow`.
pub fn back_calculate(
    rows: &[SialylatedPeakRow],
    deltas: &ModificationDeltas,
) -> Result<Vec<CandidateRow>> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| candidate(i, row, deltas))
        .collect()
}

fn candidate(
    index: usize,
    row: &SialylatedPeakRow,
    deltas: &ModificationDeltas,
) -> Result<CandidateRow> {
    if !row.measured_mass.is_finite() {
        return Err(PipelineError::malformed(
            index,
            format!("measured mass {} is not finite", row.measured_mass),
        ));
    }
    if !row.confidence_score.is_finite() || row.confidence_score < 0.0 {
        return Err(PipelineError::malformed(
            index,
            format!(
                "confidence score {} is not a finite non-negative number",
                row.confidence_score
            ),
        ));
    }
    let sialic_acid_count = modification_count(index, row.sialic_acid_count, "sialic acid")?;
    let acetyl_count = modification_count(index, row.acetyl_count, "acetyl")?;

    let computed_mass = row.measured_mass
        - deltas.sialic_acid * sialic_acid_count as f64
        - deltas.acetyl * acetyl_count as f64;

    Ok(CandidateRow {
        peak_id: row.peak_id.clone(),
        hit_id: row.hit_id.clone(),
        perm_id: row.perm_id.clone(),
        measured_mass: row.measured_mass,
        sialic_acid_count,
        acetyl_count,
        computed_mass,
        confidence_score: row.confidence_score,
    })
}

fn modification_count(index: usize, count: Option<i64>, what: &str) -> Result<u32> {
    let count = count.unwrap_or(0);
    u32::try_from(count).map_err(|_| {
        PipelineError::malformed(index, format!("{what} count {count} is out of range"))
    })
}

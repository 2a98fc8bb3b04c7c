//! Output tables consumed by plotting and reporting tools.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::config::{PipelineConfig, Variant};
use crate::data::model::SpectrumPoint;
use crate::state::AnalysisState;

/// Series name of the experimental reference in the mirror table.
pub const REFERENCE_SERIES: &str = "experimental";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpectrumRecord<'a> {
    pub variant: &'a str,
    pub mass: f64,
    pub intensity: f64,
}

/// One line of the overlay table. The reference is mirrored below the axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MirrorRecord<'a> {
    pub series: &'a str,
    pub mass: f64,
    pub intensity: f64,
}

/// `variant,mass,intensity` for every successful variant.
pub fn write_spectra_csv(path: &Path, state: &AnalysisState) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for (variant, spectrum) in state.spectra() {
        for p in &spectrum.points {
            writer.serialize(SpectrumRecord {
                variant: variant.name(),
                mass: p.mass,
                intensity: p.intensity,
            })?;
        }
    }
    writer.flush().context("writing spectra CSV")?;
    Ok(())
}

/// Reference peaks with negated intensity, followed by each computed
/// variant; every series sorted by mass.
pub fn mirror_table(state: &AnalysisState) -> Vec<MirrorRecord<'static>> {
    let mut reference: Vec<MirrorRecord<'static>> = state
        .reference
        .iter()
        .map(|r| MirrorRecord {
            series: REFERENCE_SERIES,
            mass: r.measured_mass,
            intensity: -r.relative_intensity,
        })
        .collect();
    reference.sort_by(|a, b| a.mass.total_cmp(&b.mass));

    let computed = state.spectra().flat_map(|(variant, spectrum)| {
        spectrum.points.iter().map(move |p| MirrorRecord {
            series: variant.name(),
            mass: p.mass,
            intensity: p.intensity,
        })
    });
    reference.extend(computed);
    reference
}

pub fn write_mirror_csv(path: &Path, state: &AnalysisState) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    for record in mirror_table(state) {
        writer.serialize(record)?;
    }
    writer.flush().context("writing mirror CSV")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// JSON run report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariantStatus {
    Ok,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct VariantReport {
    pub variant: Variant,
    pub status: VariantStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub point_count: usize,
    pub points: Vec<SpectrumPoint>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub config: PipelineConfig,
    pub sialylated_rows: usize,
    pub reference_rows: usize,
    pub variants: Vec<VariantReport>,
}

impl RunReport {
    pub fn new(state: &AnalysisState, config: &PipelineConfig) -> Self {
        let variants = state
            .outcomes
            .iter()
            .map(|(&variant, outcome)| match outcome {
                Ok(spectrum) => VariantReport {
                    variant,
                    status: VariantStatus::Ok,
                    error: None,
                    point_count: spectrum.len(),
                    points: spectrum.points.clone(),
                },
                Err(e) => VariantReport {
                    variant,
                    status: VariantStatus::Failed,
                    error: Some(e.to_string()),
                    point_count: 0,
                    points: Vec::new(),
                },
            })
            .collect();
        RunReport {
            config: *config,
            sialylated_rows: state.sialylated.len(),
            reference_rows: state.reference.len(),
            variants,
        }
    }
}

pub fn write_report_json(path: &Path, report: &RunReport) -> Result<()> {
    let text = serde_json::to_string_pretty(report).context("serializing run report")?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{DesialylatedReferenceRow, SialylatedPeakRow};

    fn state() -> AnalysisState {
        let sialylated = vec![
            SialylatedPeakRow {
                peak_id: "P1".into(),
                hit_id: "H1".into(),
                perm_id: None,
                measured_mass: 1000.0,
                sialic_acid_count: Some(1),
                acetyl_count: Some(0),
                confidence_score: 80.0,
            },
            SialylatedPeakRow {
                peak_id: "P1".into(),
                hit_id: "H2".into(),
                perm_id: None,
                measured_mass: 1005.0,
                sialic_acid_count: Some(0),
                acetyl_count: Some(0),
                confidence_score: 20.0,
            },
        ];
        let reference = vec![
            DesialylatedReferenceRow {
                peak_id: "R2".into(),
                hit_id: None,
                measured_mass: 1004.0,
                relative_intensity: 40.0,
            },
            DesialylatedReferenceRow {
                peak_id: "R1".into(),
                hit_id: None,
                measured_mass: 500.0,
                relative_intensity: 100.0,
            },
        ];
        let mut state = AnalysisState::new(sialylated, reference).unwrap();
        let base = PipelineConfig {
            confidence_cutoff: 100.0,
            ..Default::default()
        };
        state.run_all(&base, false);
        state
    }

    #[test]
    fn mirror_table_negates_reference() {
        let table = mirror_table(&state());
        assert_eq!(table[0].series, REFERENCE_SERIES);
        assert_eq!(table[0].mass, 500.0);
        assert_eq!(table[0].intensity, -100.0);
        assert_eq!(table[1].intensity, -40.0);
        assert!(table[2..].iter().all(|r| r.series != REFERENCE_SERIES && r.intensity >= 0.0));
        // unfiltered has two points, peak_filtered one, the third variant failed
        assert_eq!(table.len(), 2 + 2 + 1);
    }

    #[test]
    fn report_lists_failures_without_points() {
        let s = state();
        let report = RunReport::new(&s, &PipelineConfig::default());
        assert_eq!(report.variants.len(), 3);
        let failed = &report.variants[2];
        assert_eq!(failed.status, VariantStatus::Failed);
        assert!(failed.points.is_empty());
        assert!(failed.error.as_deref().unwrap().contains("confidence filter"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["variants"][0]["variant"], "unfiltered");
        assert_eq!(json["variants"][0]["status"], "ok");
        assert!(json["variants"][0].get("error").is_none());
    }

    #[test]
    fn writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let s = state();
        write_spectra_csv(&dir.path().join("spectra.csv"), &s).unwrap();
        write_mirror_csv(&dir.path().join("mirror.csv"), &s).unwrap();
        write_report_json(
            &dir.path().join("report.json"),
            &RunReport::new(&s, &PipelineConfig::default()),
        )
        .unwrap();

        let spectra = std::fs::read_to_string(dir.path().join("spectra.csv")).unwrap();
        let mut lines = spectra.lines();
        assert_eq!(lines.next(), Some("variant,mass,intensity"));
        assert_eq!(lines.count(), 3);
        let mirror = std::fs::read_to_string(dir.path().join("mirror.csv")).unwrap();
        assert!(mirror.starts_with("series,mass,intensity\nexperimental,500.0,-100.0"));
    }
}

//! Load peak tables from disk and run every analysis variant.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use desialo::config::{PipelineConfig, Variant};
use desialo::data::loader::{load_reference, load_sialylated};
use desialo::error::PipelineError;
use desialo::state::AnalysisState;

const SIALYLATED_CSV: &str = "\
ID,Mass,NeuAc,Acetyl,Hit Score (%)
1-1-1,1000.0,1,0,80
1-2-1,1005.0,0,,20
2-1-1,2624.5120,1,1,70
2-2-1,2624.5120,2,0,30
2-2-2,2624.5120,2,0,30
";

const REFERENCE_CSV: &str = "\
ID,Mass,Relative Intensity
10-1,1004.0,100
11-1,2291.2454,55
";

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn run(state: &mut AnalysisState, base: &PipelineConfig) {
    state.run_all(base, true);
}

#[test]
fn csv_tables_through_all_variants() {
    let dir = tempfile::tempdir().unwrap();
    let sialylated = load_sialylated(&write(dir.path(), "s.csv", SIALYLATED_CSV)).unwrap();
    let reference = load_reference(&write(dir.path(), "r.csv", REFERENCE_CSV)).unwrap();
    assert_eq!(sialylated.len(), 5);
    assert_eq!(sialylated[1].acetyl_count, None);

    let mut state = AnalysisState::new(sialylated, reference).unwrap();
    run(&mut state, &PipelineConfig::default());
    assert_eq!(state.failures().count(), 0);

    let unfiltered = state.outcomes[&Variant::Unfiltered].as_ref().unwrap();
    assert_eq!(unfiltered.max_intensity(), Some(100.0));

    // Peak 1 keeps only H2 (1005.0 ~ 1004.0). Peak 2 keeps H1 at
    // 2624.512 - 291.256 - 42.0106 = 2291.2454 and drops both perms of H2.
    let peak = state.outcomes[&Variant::PeakFiltered].as_ref().unwrap();
    assert_eq!(peak.len(), 2);
    assert!(peak.points.iter().all(|p| p.intensity == 100.0));
    // Points sit at bin midpoints, within half a bin width of the row mass.
    let half_width = (2291.2454 - 1005.0) / 257.0 / 2.0;
    assert!((peak.points[0].mass - (1005.0 + half_width)).abs() < 1e-6);
    assert!((peak.points[1].mass - (2291.2454 - half_width)).abs() < 1e-6);
}

#[test]
fn json_and_split_identifier_columns() {
    let dir = tempfile::tempdir().unwrap();
    let sialylated = write(
        dir.path(),
        "s.json",
        r#"[
            {"Peak ID": "P1", "Hit ID": "H1", "Measured Mass": 1000.0, "Sialic Acid": 1, "Score": 80},
            {"Peak ID": "P1", "Hit ID": "H2", "Measured Mass": 1005.0, "Sialic Acid": null, "Score": 20}
        ]"#,
    );
    let reference = write(
        dir.path(),
        "r.json",
        r#"[{"peak_id": "R1", "mass": 700.0, "intensity": 100}]"#,
    );
    let mut state = AnalysisState::new(
        load_sialylated(&sialylated).unwrap(),
        load_reference(&reference).unwrap(),
    )
    .unwrap();
    run(&mut state, &PipelineConfig::default());

    let unfiltered = state.outcomes[&Variant::Unfiltered].as_ref().unwrap();
    assert_eq!(unfiltered.len(), 2);
    assert_eq!(unfiltered.points[1].intensity, 25.0);

    // Neither 708.744 nor 1005.0 is within 5 Da of 700: group P1 is emptied.
    for variant in [Variant::PeakFiltered, Variant::PeakAndConfidenceFiltered] {
        assert_eq!(
            state.outcomes[&variant],
            Err(PipelineError::EmptyInput {
                stage: "peak reconciliation"
            })
        );
    }
}

#[test]
fn parquet_tables_load() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("s.parquet");
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Utf8, false),
        Field::new("mass", DataType::Float64, false),
        Field::new("neuac", DataType::Int64, true),
        Field::new("score", DataType::Float64, false),
    ]));
    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(vec!["1-1-1", "1-2-1"])),
        Arc::new(Float64Array::from(vec![1000.0, 1005.0])),
        Arc::new(Int64Array::from(vec![Some(1), None])),
        Arc::new(Float64Array::from(vec![80.0, 20.0])),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).unwrap();
    let mut writer = ArrowWriter::try_new(fs::File::create(&path).unwrap(), schema, None).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let rows = load_sialylated(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].sialic_acid_count, Some(1));
    assert_eq!(rows[1].sialic_acid_count, None);
    assert_eq!(rows[1].hit_id, "2");
}

#[test]
fn malformed_row_fails_every_variant() {
    let dir = tempfile::tempdir().unwrap();
    let sialylated = load_sialylated(&write(
        dir.path(),
        "s.csv",
        "id,mass,neuac,score\n1-1,1000,-1,50\n1-2,1005,0,50\n",
    ))
    .unwrap();
    let reference = load_reference(&write(dir.path(), "r.csv", REFERENCE_CSV)).unwrap();
    let mut state = AnalysisState::new(sialylated, reference).unwrap();
    run(&mut state, &PipelineConfig::default());
    assert_eq!(state.spectra().count(), 0);
    for (_, e) in state.failures() {
        assert!(matches!(e, PipelineError::MalformedRow { row: 0, .. }));
    }
}

//! Writes a synthetic pair of peak tables for trying the pipeline:
//! `sialylated_sample.parquet` and `desialylated_sample.parquet`.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use desialo::config::{ACETYL_MASS_DELTA, SIALIC_ACID_MASS_DELTA};

const HEXOSE: f64 = 162.0528;
const HEXNAC: f64 = 203.0794;
const FUCOSE: f64 = 146.0579;
/// Intact-protein backbone the glycoforms sit on.
const BACKBONE: f64 = 20_000.0;

/// Desialylated glycoform masses: backbone plus hexose/HexNAc/fucose ladders.
fn desialylated_glycoforms() -> Vec<f64> {
    let mut masses = Vec::new();
    for hexnac in 4..=6 {
        for hexose in 3..=7 {
            for fucose in 0..=1 {
                masses.push(
                    BACKBONE
                        + hexnac as f64 * HEXNAC
                        + hexose as f64 * HEXOSE
                        + fucose as f64 * FUCOSE,
                );
            }
        }
    }
    masses
}

struct SialylatedTable {
    ids: Vec<String>,
    masses: Vec<f64>,
    sialic_acid: Vec<i64>,
    acetyl: Vec<i64>,
    scores: Vec<f64>,
}

fn write_parquet(path: &Path, schema: Arc<Schema>, columns: Vec<ArrayRef>) -> Result<()> {
    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);
    let glycoforms = desialylated_glycoforms();

    // Each physical peak gets 1-3 candidate annotations; the first is the
    // true glycoform, the others are decoys whose stripped mass lands
    // elsewhere.
    let mut table = SialylatedTable {
        ids: Vec::new(),
        masses: Vec::new(),
        sialic_acid: Vec::new(),
        acetyl: Vec::new(),
        scores: Vec::new(),
    };
    let mut observed = Vec::new();
    for (peak, &base) in glycoforms.iter().enumerate() {
        if !rng.random_bool(0.7) {
            continue;
        }
        observed.push(base);
        let sialic: i64 = rng.random_range(0..=4);
        let acetyl: i64 = if rng.random_bool(0.3) { 1 } else { 0 };
        let measured = base
            + sialic as f64 * SIALIC_ACID_MASS_DELTA
            + acetyl as f64 * ACETYL_MASS_DELTA
            + rng.random_range(-0.8..0.8);

        let n_hits = rng.random_range(1..=3);
        let mut raw_scores: Vec<f64> = (0..n_hits).map(|_| rng.random_range(0.0..1.0)).collect();
        raw_scores[0] += 1.0;
        let total: f64 = raw_scores.iter().sum();

        for (hit, raw) in raw_scores.iter().enumerate() {
            let (s, a) = if hit == 0 {
                (sialic, acetyl)
            } else {
                ((sialic + hit as i64) % 5, (acetyl + 1) % 2)
            };
            table.ids.push(format!("{}-{}-1", peak + 1, hit + 1));
            table.masses.push(measured);
            table.sialic_acid.push(s);
            table.acetyl.push(a);
            table.scores.push(raw / total * 100.0);
        }
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("ID", DataType::Utf8, false),
        Field::new("Mass", DataType::Float64, false),
        Field::new("NeuAc", DataType::Int64, false),
        Field::new("Acetyl", DataType::Int64, false),
        Field::new("Hit Score", DataType::Float64, false),
    ]));
    let n_hits = table.ids.len();
    write_parquet(
        Path::new("sialylated_sample.parquet"),
        schema,
        vec![
            Arc::new(StringArray::from(table.ids)),
            Arc::new(Float64Array::from(table.masses)),
            Arc::new(Int64Array::from(table.sialic_acid)),
            Arc::new(Int64Array::from(table.acetyl)),
            Arc::new(Float64Array::from(table.scores)),
        ],
    )?;

    let intensities: Vec<f64> = observed.iter().map(|_| rng.random_range(5.0..100.0)).collect();
    let max = intensities.iter().copied().fold(0.0, f64::max);
    let schema = Arc::new(Schema::new(vec![
        Field::new("ID", DataType::Utf8, false),
        Field::new("Mass", DataType::Float64, false),
        Field::new("Relative Intensity", DataType::Float64, false),
    ]));
    write_parquet(
        Path::new("desialylated_sample.parquet"),
        schema,
        vec![
            Arc::new(StringArray::from(
                (1..=observed.len()).map(|i| format!("{i}-1")).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                observed.iter().map(|m| m + rng.random_range(-1.0..1.0)).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(
                intensities.iter().map(|i| i / max * 100.0).collect::<Vec<_>>(),
            )),
        ],
    )?;

    println!(
        "Wrote {n_hits} sialylated hits and {} reference peaks",
        observed.len()
    );
    Ok(())
}

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray,
    StringArray,
};
use arrow::datatypes::DataType;
use log::{debug, warn};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{DesialylatedReferenceRow, PeakKey, SialylatedPeakRow};
use super::table::{CellValue, RawTable, Record};

// Column aliases, already in normalized form.
const ID_COLUMNS: &[&str] = &["id", "identifier", "peak_hit_perm_id"];
const PEAK_ID_COLUMNS: &[&str] = &["peak_id", "peak"];
const HIT_ID_COLUMNS: &[&str] = &["hit_id", "hit"];
const PERM_ID_COLUMNS: &[&str] = &["perm_id", "perm", "permutation_id"];
const MASS_COLUMNS: &[&str] = &["measured_mass", "mass", "observed_mass"];
const SIALIC_ACID_COLUMNS: &[&str] = &["sialic_acid_count", "sialic_acid", "neuac"];
const ACETYL_COLUMNS: &[&str] = &["acetyl_count", "acetyl"];
const SCORE_COLUMNS: &[&str] = &["confidence_score", "score", "hit_score"];
const INTENSITY_COLUMNS: &[&str] = &["relative_intensity", "intensity", "relative_abundance"];

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load the annotated sialylated peak list.
pub fn load_sialylated(path: &Path) -> Result<Vec<SialylatedPeakRow>> {
    let table = load_table(path)?;
    sialylated_rows(&table).with_context(|| format!("reading {}", path.display()))
}

/// Load the experimental desialylated reference peak list.
pub fn load_reference(path: &Path) -> Result<Vec<DesialylatedReferenceRow>> {
    let table = load_table(path)?;
    reference_rows(&table).with_context(|| format!("reading {}", path.display()))
}

/// Load a table from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.tsv` – header row, one peak per line; cells kept as text
/// * `.json`         – `[{ "id": "12-3-1", "mass": 2301.9, ... }, ...]`
/// * `.parquet`      – flat scalar columns
pub fn load_table(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => load_delimited(path, b',')?,
        "tsv" => load_delimited(path, b'\t')?,
        "json" => load_json(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    if table.is_empty() {
        warn!("{} has no data rows", path.display());
    }
    debug!(
        "loaded {} rows with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// Typed row conversion
// ---------------------------------------------------------------------------

/// How a table identifies its rows.
enum Identity {
    Composite(&'static str),
    Split {
        peak: &'static str,
        hit: Option<&'static str>,
        perm: Option<&'static str>,
    },
}

type IdParts = (String, Option<String>, Option<String>);

impl Identity {
    fn resolve(table: &RawTable) -> Result<Identity> {
        if let Some(peak) = table.resolve(PEAK_ID_COLUMNS) {
            return Ok(Identity::Split {
                peak,
                hit: table.resolve(HIT_ID_COLUMNS),
                perm: table.resolve(PERM_ID_COLUMNS),
            });
        }
        match table.resolve(ID_COLUMNS) {
            Some(col) => Ok(Identity::Composite(col)),
            None => bail!("table has neither an 'id' nor a 'peak_id' column"),
        }
    }

    /// Peak id plus whatever hit/perm ids the table carries.
    fn parts(&self, record: &Record, row: usize) -> Result<IdParts> {
        match self {
            Identity::Composite(col) => {
                let raw = text_cell(record, col)
                    .with_context(|| format!("Row {row}: missing identifier"))?;
                let key = PeakKey::parse(&raw).with_context(|| {
                    format!("Row {row}: '{raw}' is not a <peak>-<hit>[-<perm>] identifier")
                })?;
                Ok((key.peak_id, Some(key.hit_id), key.perm_id))
            }
            Identity::Split { peak, hit, perm } => {
                let peak_id = text_cell(record, peak)
                    .with_context(|| format!("Row {row}: missing peak id"))?;
                Ok((
                    peak_id,
                    hit.and_then(|col| text_cell(record, col)),
                    perm.and_then(|col| text_cell(record, col)),
                ))
            }
        }
    }

    fn key(&self, record: &Record, row: usize) -> Result<PeakKey> {
        let (peak_id, hit_id, perm_id) = self.parts(record, row)?;
        let hit_id = hit_id.with_context(|| format!("Row {row}: missing hit id"))?;
        Ok(PeakKey {
            peak_id,
            hit_id,
            perm_id,
        })
    }
}

/// Convert a loaded table into sialylated rows.
///
/// Missing count columns or empty count cells load as `None`; the core
/// treats them as zero.
pub fn sialylated_rows(table: &RawTable) -> Result<Vec<SialylatedPeakRow>> {
    let identity = Identity::resolve(table)?;
    let mass_col = required_column(table, MASS_COLUMNS, "mass")?;
    let score_col = required_column(table, SCORE_COLUMNS, "confidence score")?;
    let sialic_col = table.resolve(SIALIC_ACID_COLUMNS);
    let acetyl_col = table.resolve(ACETYL_COLUMNS);

    table
        .records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let key = identity.key(record, row)?;
            Ok(SialylatedPeakRow {
                peak_id: key.peak_id,
                hit_id: key.hit_id,
                perm_id: key.perm_id,
                measured_mass: number_cell(record, mass_col, row)?,
                sialic_acid_count: count_cell(record, sialic_col, row)?,
                acetyl_count: count_cell(record, acetyl_col, row)?,
                confidence_score: number_cell(record, score_col, row)?,
            })
        })
        .collect()
}

/// Convert a loaded table into reference rows.
pub fn reference_rows(table: &RawTable) -> Result<Vec<DesialylatedReferenceRow>> {
    let mass_col = required_column(table, MASS_COLUMNS, "mass")?;
    let intensity_col = required_column(table, INTENSITY_COLUMNS, "relative intensity")?;

    let identity = Identity::resolve(table)?;

    table
        .records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            let (peak_id, hit_id, _) = identity.parts(record, row)?;
            Ok(DesialylatedReferenceRow {
                peak_id,
                hit_id,
                measured_mass: number_cell(record, mass_col, row)?,
                relative_intensity: number_cell(record, intensity_col, row)?,
            })
        })
        .collect()
}

fn required_column(
    table: &RawTable,
    aliases: &[&'static str],
    what: &str,
) -> Result<&'static str> {
    table
        .resolve(aliases)
        .with_context(|| format!("missing {what} column (expected one of {aliases:?})"))
}

fn text_cell(record: &Record, col: &str) -> Option<String> {
    record.get(col).and_then(CellValue::as_text)
}

fn number_cell(record: &Record, col: &str, row: usize) -> Result<f64> {
    let cell = record.get(col).unwrap_or(&CellValue::Null);
    cell.as_f64()
        .with_context(|| format!("Row {row}, {col}: '{cell}' is not a number"))
}

fn count_cell(record: &Record, col: Option<&str>, row: usize) -> Result<Option<i64>> {
    let Some(col) = col else {
        return Ok(None);
    };
    match record.get(col).filter(|cell| !cell.is_null()) {
        None => Ok(None),
        Some(cell) => cell
            .as_i64()
            .map(Some)
            .with_context(|| format!("Row {row}, {col}: '{cell}' is not an integer count")),
    }
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

fn load_delimited(path: &Path, delimiter: u8) -> Result<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(CellValue::from_text).collect());
    }

    Ok(RawTable::new(headers, rows))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "id": "12-3-1", "mass": 2301.94, "sialic_acid": 2, "acetyl": 0, "score": 61.5 },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let rows = records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let obj = rec
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;
            Ok(obj
                .iter()
                .map(|(key, val)| (key.clone(), json_to_cell(val)))
                .collect())
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RawTable::from_records(rows))
}

/// Numbers keep their JSON spelling, so a numeric `peak_id` of `1.0` is not
/// folded into `1`.
fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::Null => CellValue::Null,
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Number(n) => CellValue::from_text(&n.to_string()),
        JsonValue::String(s) => CellValue::from_text(s),
        nested => CellValue::String(nested.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per field.
///
/// Works with files written by both Pandas (`df.to_parquet()`) and Polars
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for row in 0..batch.num_rows() {
            rows.push(
                (0..batch.num_columns())
                    .map(|col| extract_cell(batch.column(col), row))
                    .collect(),
            );
        }
    }

    Ok(RawTable::new(columns, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    let cell = match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::LargeUtf8 => any
            .downcast_ref::<LargeStringArray>()
            .map(|a| CellValue::String(a.value(row).to_string())),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64)),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64)),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row))),
        _ => None,
    };
    cell.unwrap_or_else(|| CellValue::String(format!("{:?}", col.data_type())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(header: &[&str], rows: &[&[&str]]) -> RawTable {
        RawTable::new(
            header.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|c| CellValue::from_text(c)).collect())
                .collect(),
        )
    }

    #[test]
    fn reads_composite_ids_and_aliases() {
        let t = table(
            &["ID", "Mass", "NeuAc", "Acetyl", "Hit Score"],
            &[&["1-1-1", "2000.5", "2", "", "60"], &["1-2", "1990", "", "1", "40"]],
        );
        let rows = sialylated_rows(&t).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].peak_id, "1");
        assert_eq!(rows[0].perm_id.as_deref(), Some("1"));
        assert_eq!(rows[0].sialic_acid_count, Some(2));
        assert_eq!(rows[0].acetyl_count, None);
        assert_eq!(rows[1].hit_id, "2");
        assert_eq!(rows[1].sialic_acid_count, None);
        assert_eq!(rows[1].confidence_score, 40.0);
    }

    #[test]
    fn missing_count_columns_load_as_none() {
        let t = table(
            &["peak_id", "hit_id", "measured_mass", "confidence_score"],
            &[&["P1", "H1", "1000", "100"]],
        );
        let rows = sialylated_rows(&t).unwrap();
        assert_eq!(rows[0].sialic_acid_count, None);
        assert_eq!(rows[0].acetyl_count, None);
    }

    #[test]
    fn rejects_bad_cells() {
        let t = table(&["id", "mass", "score"], &[&["1-1", "heavy", "10"]]);
        assert!(sialylated_rows(&t).is_err());

        let t = table(&["id", "mass", "score", "neuac"], &[&["1-1", "10", "10", "1.5"]]);
        assert!(sialylated_rows(&t).is_err());

        let t = table(&["id", "mass", "score"], &[&["nohyphen", "10", "10"]]);
        assert!(sialylated_rows(&t).is_err());

        let t = table(&["id", "score"], &[&["1-1", "10"]]);
        assert!(sialylated_rows(&t).is_err());
    }

    #[test]
    fn reads_reference_rows() {
        let t = table(
            &["id", "Mass", "Relative Intensity"],
            &[&["3-1", "1500.2", "100"], &["4-1", "1720.9", "35.5"]],
        );
        let rows = reference_rows(&t).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].peak_id, "4");
        assert_eq!(rows[1].relative_intensity, 35.5);
    }

    #[test]
    fn rejects_unknown_extension() {
        assert!(load_table(Path::new("peaks.xlsx")).is_err());
        assert!(load_table(Path::new("peaks.txt")).is_err());
    }

    #[test]
    fn identifiers_keep_their_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.csv");
        std::fs::write(
            &path,
            "peak_id,hit_id,mass,score\n01,1,1000,10\n1,1,1001,20\n1.0,2,1002,30\n",
        )
        .unwrap();
        let rows = load_sialylated(&path).unwrap();
        let ids: Vec<_> = rows
            .iter()
            .map(|r| (r.peak_id.as_str(), r.hit_id.as_str()))
            .collect();
        assert_eq!(ids, vec![("01", "1"), ("1", "1"), ("1.0", "2")]);
        assert_eq!(rows[2].measured_mass, 1002.0);
    }

    #[test]
    fn json_numeric_identifiers_keep_their_spelling() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ids.json");
        std::fs::write(
            &path,
            r#"[{"peak_id": 1, "hit_id": 1, "mass": 1000, "neuac": 2.0, "score": 5},
                {"peak_id": 1.0, "hit_id": 1, "mass": 1000.5, "neuac": null, "score": 5}]"#,
        )
        .unwrap();
        let rows = load_sialylated(&path).unwrap();
        assert_eq!(rows[0].peak_id, "1");
        assert_eq!(rows[1].peak_id, "1.0");
        assert_eq!(rows[0].sialic_acid_count, Some(2));
        assert_eq!(rows[1].sialic_acid_count, None);
        assert_eq!(rows[1].measured_mass, 1000.5);
    }
}

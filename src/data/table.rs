use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell, before the typed row conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// A cell read from text (CSV, JSON numbers). The trimmed text is kept
    /// as written so identifiers like `01` and `1.0` stay distinct; numeric
    /// views parse it on demand. Blank text is `Null`.
    pub fn from_text(s: &str) -> CellValue {
        let s = s.trim();
        if s.is_empty() {
            CellValue::Null
        } else {
            CellValue::String(s.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer view. Floats are accepted only when they carry no fraction,
    /// since counts often come back as `2.0` from spreadsheet exports.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Integer(i) => Some(*i),
            CellValue::Float(v) => integral(*v),
            CellValue::String(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(integral))
            }
            _ => None,
        }
    }

    /// Text view for identifier columns.
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::String(s) if s.trim().is_empty() => None,
            CellValue::String(s) => Some(s.trim().to_string()),
            other => Some(other.to_string()),
        }
    }
}

fn integral(v: f64) -> Option<i64> {
    (v.is_finite() && v.fract() == 0.0).then_some(v as i64)
}

// ---------------------------------------------------------------------------
// Column names
// ---------------------------------------------------------------------------

/// Lowercase, collapse every run of non-alphanumeric characters to `_`, and
/// strip leading/trailing underscores: `"Hit Score (%)"` -> `"hit_score"`.
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.trim().chars() {
        if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            pending_sep = false;
            out.extend(ch.to_lowercase());
        } else {
            pending_sep = true;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// RawTable – loaded rows keyed by normalized column name
// ---------------------------------------------------------------------------

pub type Record = BTreeMap<String, CellValue>;

#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Normalized column names in file order.
    pub columns: Vec<String>,
    pub records: Vec<Record>,
}

impl RawTable {
    /// Build a table, normalizing every column name.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let columns: Vec<String> = columns.iter().map(|c| normalize_column_name(c)).collect();
        let records = rows
            .into_iter()
            .map(|row| columns.iter().cloned().zip(row).collect())
            .collect();
        RawTable { columns, records }
    }

    /// Build a table from per-row `(column, value)` pairs whose column sets may
    /// differ (JSON records). Columns are listed in first-seen order.
    pub fn from_records(rows: Vec<Vec<(String, CellValue)>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = Record::new();
            for (name, value) in row {
                let name = normalize_column_name(&name);
                if !columns.contains(&name) {
                    columns.push(name.clone());
                }
                record.insert(name, value);
            }
            records.push(record);
        }
        RawTable { columns, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// First of `aliases` that names a column of this table.
    pub fn resolve<'a>(&self, aliases: &[&'a str]) -> Option<&'a str> {
        aliases
            .iter()
            .copied()
            .find(|alias| self.columns.iter().any(|c| c == alias))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_column_names() {
        assert_eq!(normalize_column_name("Hit Score (%)"), "hit_score");
        assert_eq!(normalize_column_name("  Measured Mass "), "measured_mass");
        assert_eq!(normalize_column_name("NeuAc"), "neuac");
        assert_eq!(normalize_column_name("peak-id"), "peak_id");
        assert_eq!(normalize_column_name("__x__"), "x");
    }

    #[test]
    fn text_cells_keep_their_spelling() {
        assert!(CellValue::from_text("  ").is_null());
        assert_eq!(CellValue::from_text(" 01 ").as_text().as_deref(), Some("01"));
        assert_eq!(CellValue::from_text("1.0").as_text().as_deref(), Some("1.0"));
        assert_eq!(CellValue::from_text("3.5").as_f64(), Some(3.5));
        assert_eq!(CellValue::from_text("12-3-1").as_f64(), None);
    }

    #[test]
    fn integer_view_rejects_fractions() {
        assert_eq!(CellValue::Float(2.0).as_i64(), Some(2));
        assert_eq!(CellValue::Float(2.5).as_i64(), None);
        assert_eq!(CellValue::Null.as_i64(), None);
        assert_eq!(CellValue::from_text("2").as_i64(), Some(2));
        assert_eq!(CellValue::from_text("2.0").as_i64(), Some(2));
        assert_eq!(CellValue::from_text("2.5").as_i64(), None);
    }

    #[test]
    fn resolves_aliases_in_priority_order() {
        let table = RawTable::new(
            vec!["Mass".into(), "Measured Mass".into()],
            vec![vec![CellValue::Float(1.0), CellValue::Float(2.0)]],
        );
        assert_eq!(table.resolve(&["measured_mass", "mass"]), Some("measured_mass"));
        assert_eq!(table.resolve(&["observed_mass"]), None);
        assert_eq!(table.records[0]["mass"], CellValue::Float(1.0));
    }
}

use std::collections::BTreeSet;
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::DatasetError;

// ---------------------------------------------------------------------------
// CellValue – a single raw cell as handed over by a file parser
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value, before numeric coercion.
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
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the cell as a finite number.
    ///
    /// Strings go through [`parse_number_prefix`], so `"7.5 mg/kg"` reads as 7.5.
    /// Booleans are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) if v.is_finite() => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::String(s) => parse_number_prefix(s),
            _ => None,
        }
    }

    /// Numeric value of the cell; anything unparsable becomes 0.0.
    ///
    /// This is a deliberately lossy policy: garbage in becomes zero. Callers
    /// that need visibility count the cells where [`CellValue::as_number`]
    /// returned `None` (see [`Dataset::coerced_cells`]).
    pub fn coerce(&self) -> f64 {
        self.as_number().unwrap_or(0.0)
    }

    /// Whether the cell carries no content at all (null or empty text).
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

/// Parse the longest leading numeric prefix of `text`.
///
/// Leading whitespace is skipped; an optional sign, digits, an optional
/// fraction and an optional exponent are accepted. Trailing garbage is
/// ignored. Returns `None` when no digits are found or the value is not finite.
pub fn parse_number_prefix(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let len = bytes.len();
    let digits_from = |mut i: usize| {
        while i < len && bytes[i].is_ascii_digit() {
            i += 1;
        }
        i
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_end = digits_from(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if end < len && bytes[end] == b'.' {
        let frac_end = digits_from(end + 1);
        mantissa_digits += frac_end - (end + 1);
        if mantissa_digits > 0 {
            end = frac_end;
        }
    }
    if mantissa_digits == 0 {
        return None;
    }

    if end < len && matches!(bytes[end], b'e' | b'E') {
        let mut exp_start = end + 1;
        if exp_start < len && matches!(bytes[exp_start], b'+' | b'-') {
            exp_start += 1;
        }
        let exp_end = digits_from(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Lenient text → number conversion used for user edits: unparsable text is 0.
pub fn parse_lenient(text: &str) -> f64 {
    parse_number_prefix(text).unwrap_or(0.0)
}

// ---------------------------------------------------------------------------
// ParameterMap – ordered parameter name → value mapping
// ---------------------------------------------------------------------------

/// Parameter name → value, iterated in insertion (column) order.
///
/// Backs the weight vector, the sample input and the score vector. Serializes
/// as a JSON object with keys in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterMap {
    names: Vec<String>,
    values: Vec<f64>,
}

impl ParameterMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every name mapped to the same `value`.
    pub fn filled<S: AsRef<str>>(names: &[S], value: f64) -> Self {
        names
            .iter()
            .map(|n| (n.as_ref().to_string(), value))
            .collect()
    }

    /// Insert or overwrite `name`. Returns the previous value, if any.
    pub fn insert(&mut self, name: impl Into<String>, value: f64) -> Option<f64> {
        let name = name.into();
        match self.position(&name) {
            Some(i) => Some(std::mem::replace(&mut self.values[i], value)),
            None => {
                self.names.push(name);
                self.values.push(value);
                None
            }
        }
    }

    /// Overwrite an existing entry. Returns `false` when `name` is unknown.
    pub fn set(&mut self, name: &str, value: f64) -> bool {
        match self.position(name) {
            Some(i) => {
                self.values[i] = value;
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.position(name).map(|i| self.values[i])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for ParameterMap {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut map = ParameterMap::new();
        for (name, value) in iter {
            map.insert(name, value);
        }
        map
    }
}

impl Serialize for ParameterMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParameterMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ParameterMapVisitor;

        impl<'de> Visitor<'de> for ParameterMapVisitor {
            type Value = ParameterMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object mapping parameter names to numbers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut map = ParameterMap::new();
                while let Some((name, value)) = access.next_entry::<String, f64>()? {
                    map.insert(name, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(ParameterMapVisitor)
    }
}

// ---------------------------------------------------------------------------
// RawTable – parsed but not yet coerced
// ---------------------------------------------------------------------------

/// Header row plus raw cells, as produced by a file parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

// ---------------------------------------------------------------------------
// Dataset – the numeric matrix the analysis runs on
// ---------------------------------------------------------------------------

/// Named parameters (columns) and a rectangular table of numeric samples.
///
/// Every row holds exactly `headers.len()` values. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<f64>>,
    coerced_cells: usize,
}

impl Dataset {
    /// Coerce a raw table into a numeric dataset.
    ///
    /// Rows shorter than the header are padded with zeros (each padded cell
    /// counts as coerced); longer rows are truncated.
    pub fn from_raw(table: &RawTable) -> Result<Self, DatasetError> {
        check_headers(&table.headers)?;
        let width = table.headers.len();
        let mut coerced_cells = 0;

        let rows: Vec<Vec<f64>> = table
            .rows
            .iter()
            .map(|raw| {
                (0..width)
                    .map(|j| match raw.get(j).and_then(CellValue::as_number) {
                        Some(v) => v,
                        None => {
                            coerced_cells += 1;
                            0.0
                        }
                    })
                    .collect::<Vec<f64>>()
            })
            .collect();

        Ok(Dataset {
            headers: table.headers.clone(),
            rows,
            coerced_cells,
        })
    }

    /// Build a dataset from already-numeric rows (same padding rules).
    ///
    /// Padded cells and non-finite values become 0 and count as coerced.
    pub fn from_numeric(headers: Vec<String>, rows: Vec<Vec<f64>>) -> Result<Self, DatasetError> {
        check_headers(&headers)?;
        let width = headers.len();
        let mut coerced_cells = 0;
        let rows = rows
            .into_iter()
            .map(|mut row| {
                coerced_cells += width.saturating_sub(row.len());
                row.resize(width, 0.0);
                for v in row.iter_mut().filter(|v| !v.is_finite()) {
                    *v = 0.0;
                    coerced_cells += 1;
                }
                row
            })
            .collect();
        Ok(Dataset {
            headers,
            rows,
            coerced_cells,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Number of samples (rows).
    pub fn n_samples(&self) -> usize {
        self.rows.len()
    }

    /// Number of parameters (columns).
    pub fn n_parameters(&self) -> usize {
        self.headers.len()
    }

    /// Cells that were missing or unparsable and were read as 0.0.
    pub fn coerced_cells(&self) -> usize {
        self.coerced_cells
    }

    /// A sample with every parameter set to 0, in column order.
    pub fn blank_sample(&self) -> ParameterMap {
        ParameterMap::filled(&self.headers, 0.0)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary {
            parameters: self.n_parameters(),
            samples: self.n_samples(),
            data_points: self.n_parameters() * self.n_samples(),
            coerced_cells: self.coerced_cells,
            headers: self.headers.clone(),
        }
    }
}

fn check_headers(headers: &[String]) -> Result<(), DatasetError> {
    if headers.is_empty() {
        return Err(DatasetError::NoHeaders);
    }
    let mut seen = BTreeSet::new();
    for (i, h) in headers.iter().enumerate() {
        if h.trim().is_empty() {
            return Err(DatasetError::EmptyHeader(i));
        }
        if !seen.insert(h.as_str()) {
            return Err(DatasetError::DuplicateHeader(h.clone()));
        }
    }
    Ok(())
}

/// Counts shown before the analysis runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub parameters: usize,
    pub samples: usize,
    pub data_points: usize,
    pub coerced_cells: usize,
    pub headers: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(text: &str) -> CellValue {
        CellValue::String(text.to_string())
    }

    #[test]
    fn test_number_prefix() {
        assert_eq!(parse_number_prefix("6.5"), Some(6.5));
        assert_eq!(parse_number_prefix("  -2.25e1xyz"), Some(-22.5));
        assert_eq!(parse_number_prefix("7.5 mg/kg"), Some(7.5));
        assert_eq!(parse_number_prefix(".5"), Some(0.5));
        assert_eq!(parse_number_prefix("3e"), Some(3.0));
        assert_eq!(parse_number_prefix("abc"), None);
        assert_eq!(parse_number_prefix("."), None);
        assert_eq!(parse_number_prefix(""), None);
        assert_eq!(parse_number_prefix("1e999"), None);
    }

    #[test]
    fn test_coerce_cells() {
        assert_eq!(CellValue::Integer(3).coerce(), 3.0);
        assert_eq!(CellValue::Float(f64::NAN).coerce(), 0.0);
        assert_eq!(CellValue::Bool(true).coerce(), 0.0);
        assert_eq!(CellValue::Null.coerce(), 0.0);
        assert_eq!(s("n/a").coerce(), 0.0);
        assert_eq!(s("12").coerce(), 12.0);
        assert_eq!(parse_lenient("oops"), 0.0);
    }

    #[test]
    fn test_dataset_from_raw_pads_and_counts() {
        let table = RawTable {
            headers: vec!["pH".into(), "Nitrogen".into()],
            rows: vec![
                vec![s("6.8"), CellValue::Integer(240)],
                vec![s("bad")],
                vec![CellValue::Float(7.1), CellValue::Float(300.0), s("extra")],
            ],
        };
        let ds = Dataset::from_raw(&table).unwrap();
        assert_eq!(ds.rows(), &[vec![6.8, 240.0], vec![0.0, 0.0], vec![7.1, 300.0]]);
        assert_eq!(ds.coerced_cells(), 2);
        let summary = ds.summary();
        assert_eq!(summary.data_points, 6);
        assert_eq!(summary.samples, 3);
    }

    #[test]
    fn test_dataset_from_numeric_counts_replaced_cells() {
        let ds = Dataset::from_numeric(
            vec!["pH".into(), "Nitrogen".into()],
            vec![vec![6.5, f64::NAN], vec![7.0], vec![f64::INFINITY, 250.0, 9.0]],
        )
        .unwrap();
        assert_eq!(ds.rows(), &[vec![6.5, 0.0], vec![7.0, 0.0], vec![0.0, 250.0]]);
        assert_eq!(ds.coerced_cells(), 3);
        assert_eq!(ds.summary().coerced_cells, 3);
    }

    #[test]
    fn test_dataset_rejects_bad_headers() {
        let dup = RawTable {
            headers: vec!["a".into(), "a".into()],
            rows: vec![],
        };
        assert!(matches!(
            Dataset::from_raw(&dup),
            Err(DatasetError::DuplicateHeader(h)) if h == "a"
        ));
        let empty = RawTable {
            headers: vec!["a".into(), " ".into()],
            rows: vec![],
        };
        assert!(matches!(Dataset::from_raw(&empty), Err(DatasetError::EmptyHeader(1))));
        assert!(matches!(
            Dataset::from_numeric(vec![], vec![]),
            Err(DatasetError::NoHeaders)
        ));
    }

    #[test]
    fn test_parameter_map_order_and_json() {
        let mut map: ParameterMap = [("z", 1.0), ("a", 2.0)].into_iter().collect();
        assert_eq!(map.insert("z", 3.0), Some(1.0));
        assert!(!map.set("missing", 1.0));
        assert_eq!(map.names(), &["z".to_string(), "a".to_string()]);

        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"z":3.0,"a":2.0}"#);
        let back: ParameterMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}

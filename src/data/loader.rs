use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::filter::clean_table;
use super::model::{CellValue, RawTable};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a soil parameter table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with parameter names, one sample per record
/// * `.json`    – `[["pH", "Nitrogen"], [6.5, 240], ...]` or `[{ "pH": 6.5, ... }, ...]`
/// * `.parquet` – one flat scalar column per parameter
///
/// The returned table is already cleaned (see [`clean_table`]).
pub fn load_file(path: &Path) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (headers, rows) = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    debug!("parsed {} header cells and {} records", headers.len(), rows.len());
    let table = clean_table(headers, rows);
    info!(
        "Loaded {} rows with {} columns from {}",
        table.rows.len(),
        table.headers.len(),
        path.display()
    );
    Ok(table)
}

type ParsedTable = (Vec<String>, Vec<Vec<CellValue>>);

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with parameter names, then one record per sample.
/// Records may be ragged; cells are typed by [`guess_cell_type`].
fn load_csv(path: &Path) -> Result<ParsedTable> {
    let mut reader = csv::ReaderBuilder::new()
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
        rows.push(record.iter().map(guess_cell_type).collect::<Vec<_>>());
    }

    Ok((headers, rows))
}

fn guess_cell_type(s: &str) -> CellValue {
    let s = s.trim();
    if s.is_empty() {
        return CellValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Two layouts are accepted:
///
/// ```json
/// [["pH", "Nitrogen"], [6.5, 240], [7.1, "310"]]
/// ```
///
/// where the first array is the header row, or records-oriented:
///
/// ```json
/// [{ "pH": 6.5, "Nitrogen": 240 }, { "pH": 7.1, "Nitrogen": 310 }]
/// ```
///
/// For records the columns are the union of all keys, in first-seen order.
fn load_json(path: &Path) -> Result<ParsedTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;
    match records.first() {
        None => Ok((Vec::new(), Vec::new())),
        Some(JsonValue::Array(_)) => json_rows(records),
        Some(JsonValue::Object(_)) => json_records(records),
        Some(other) => bail!("Expected arrays or objects in JSON, found {other}"),
    }
}

fn json_rows(records: &[JsonValue]) -> Result<ParsedTable> {
    let mut arrays = records.iter().enumerate().map(|(i, rec)| {
        rec.as_array()
            .with_context(|| format!("Row {i} is not a JSON array"))
    });

    let headers: Vec<String> = match arrays.next() {
        Some(header) => header?.iter().map(json_header).collect(),
        None => Vec::new(),
    };
    let rows = arrays
        .map(|row| Ok(row?.iter().map(json_to_cell).collect::<Vec<_>>()))
        .collect::<Result<Vec<Vec<CellValue>>>>()?;

    Ok((headers, rows))
}

fn json_records(records: &[JsonValue]) -> Result<ParsedTable> {
    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .iter()
        .map(|obj| {
            headers
                .iter()
                .map(|h| obj.get(h).map(json_to_cell).unwrap_or(CellValue::Null))
                .collect::<Vec<_>>()
        })
        .collect();

    Ok((headers, rows))
}

fn json_header(val: &JsonValue) -> String {
    match val {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one scalar column per soil parameter.
///
/// Numeric, boolean and string columns are read cell by cell; any other
/// column type yields `Null` cells (and therefore zeros after coercion).
/// Works with files written by Pandas, Polars, or the `generate_sample` binary.
fn load_parquet(path: &Path) -> Result<ParsedTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
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
                batch
                    .columns()
                    .iter()
                    .map(|col| extract_cell(col, row))
                    .collect::<Vec<_>>(),
            );
        }
    }

    Ok((headers, rows))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|s| CellValue::String(s.value(row).to_string()))
            .unwrap_or(CellValue::Null),
        DataType::LargeUtf8 => CellValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| CellValue::Integer(a.value(row) as i64))
            .unwrap_or(CellValue::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| CellValue::Integer(a.value(row)))
            .unwrap_or(CellValue::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| CellValue::Float(a.value(row) as f64))
            .unwrap_or(CellValue::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| CellValue::Float(a.value(row)))
            .unwrap_or(CellValue::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| CellValue::Bool(a.value(row)))
            .unwrap_or(CellValue::Null),
        _ => CellValue::Null,
    }
}

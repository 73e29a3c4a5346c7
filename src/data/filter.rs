use super::model::{CellValue, RawTable};

// ---------------------------------------------------------------------------
// Table cleaning: which columns and rows survive an upload
// ---------------------------------------------------------------------------

/// Indices of columns whose header carries a name.
///
/// Header cells that are empty (or only whitespace) mark spreadsheet padding,
/// not parameters.
pub fn named_columns(headers: &[String]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| !h.trim().is_empty())
        .map(|(i, _)| i)
        .collect()
}

/// Return indices of rows that hold at least one non-blank cell.
///
/// A row passes when:
/// * Any of its cells is a number, a boolean or non-empty text → passes
/// * It is empty or every cell is null / empty text → fails
pub fn non_blank_rows(rows: &[Vec<CellValue>]) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| row.iter().any(|cell| !cell.is_blank()))
        .map(|(i, _)| i)
        .collect()
}

/// Turn a parser's header row and records into a [`RawTable`].
///
/// Unnamed columns are removed from the header and from every row, blank rows
/// are dropped, and each kept row is cut or padded (with `Null`) to the
/// header width.
pub fn clean_table(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> RawTable {
    let columns = named_columns(&headers);
    let keep = non_blank_rows(&rows);

    let headers = columns
        .iter()
        .map(|&j| headers[j].trim().to_string())
        .collect();

    let rows = keep
        .into_iter()
        .map(|i| {
            columns
                .iter()
                .map(|&j| rows[i].get(j).cloned().unwrap_or(CellValue::Null))
                .collect::<Vec<_>>()
        })
        .collect();

    RawTable { headers, rows }
}

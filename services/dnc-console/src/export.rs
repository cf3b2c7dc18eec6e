//! CSV export of the rows currently loaded in a table

use std::io::Write;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::record::{Column, Record};

/// Write `rows` as CSV: a header of column labels, then one line per row with
/// every field quoted. Derived columns are left out.
pub fn export_csv<W: Write>(rows: &[Record], columns: &[Column], writer: W) -> crate::Result<W> {
    let columns: Vec<&Column> = columns.iter().filter(|c| !c.derived).collect();
    if columns.is_empty() {
        return Ok(writer);
    }

    let mut header = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    header.write_record(columns.iter().map(|c| c.label.as_str()))?;
    let writer = header
        .into_inner()
        .map_err(|e| crate::DncError::Io(e.into_error()))?;

    let mut body = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(writer);
    for row in rows {
        body.write_record(columns.iter().map(|c| row.text(&c.field)))?;
    }
    body.into_inner()
        .map_err(|e| crate::DncError::Io(e.into_error()))
}

/// Normalise a user-supplied export name: non-empty, a bare file name, and
/// ending in `.csv`
pub fn export_file_name(name: &str) -> crate::Result<String> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || trimmed.contains(['/', '\\']);
    if invalid {
        return Err(crate::DncError::InvalidFileName(name.to_string()));
    }
    if trimmed.to_ascii_lowercase().ends_with(".csv") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}.csv", trimmed))
    }
}

/// Export into `directory/<name>.csv`, returning the written path
pub fn export_csv_file(
    rows: &[Record],
    columns: &[Column],
    directory: &Path,
    name: &str,
) -> crate::Result<PathBuf> {
    let path = directory.join(export_file_name(name)?);
    let buffer = export_csv(rows, columns, Vec::new())?;
    std::fs::write(&path, buffer)?;
    tracing::info!("Exported {} rows to {:?}", rows.len(), path);
    Ok(path)
}

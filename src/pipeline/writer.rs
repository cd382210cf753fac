//! Append one extracted record to the function's output table.
//!
//! Columns are the result keys in the order the service returned them,
//! followed by [`SOURCE_FILE_COLUMN`]. The header row is written only when
//! the table does not exist yet; later rows are appended as-is, so a run
//! whose keys differ from the existing header produces misaligned rows.
//! Records end in `\r\n`, matching tables written by earlier tooling.

use crate::error::Pdf2CsvError;
use crate::output::ExtractionResult;
use serde_json::Value;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

/// Provenance column holding the PDF's file name.
pub const SOURCE_FILE_COLUMN: &str = "Source File";

/// Append `result` plus the source file name as one row of `csv_path`.
///
/// # Errors
/// [`Pdf2CsvError::Io`] if the table cannot be opened,
/// [`Pdf2CsvError::CsvWriteFailed`] if the row cannot be written.
pub fn append_result(
    csv_path: &Path,
    source_file: &str,
    result: &ExtractionResult,
) -> Result<(), Pdf2CsvError> {
    let write_header = !csv_path.exists();

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(csv_path)
        .map_err(|source| Pdf2CsvError::Io {
            path: csv_path.to_path_buf(),
            source,
        })?;

    let csv_failed = |source: csv::Error| Pdf2CsvError::CsvWriteFailed {
        path: csv_path.to_path_buf(),
        source,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::CRLF)
        .from_writer(file);

    // The provenance column always wins over an identically named field.
    let fields: Vec<(&String, &Value)> = result
        .iter()
        .filter(|(key, _)| key.as_str() != SOURCE_FILE_COLUMN)
        .collect();

    if write_header {
        let header = fields
            .iter()
            .map(|(key, _)| key.as_str())
            .chain(std::iter::once(SOURCE_FILE_COLUMN));
        writer.write_record(header).map_err(csv_failed)?;
    }

    let row: Vec<String> = fields
        .iter()
        .map(|(_, value)| cell_text(value))
        .chain(std::iter::once(source_file.to_string()))
        .collect();
    writer.write_record(&row).map_err(csv_failed)?;
    writer.flush().map_err(|source| Pdf2CsvError::Io {
        path: csv_path.to_path_buf(),
        source,
    })?;

    debug!(
        "Appended {} field(s) for '{}' to {}",
        fields.len(),
        source_file,
        csv_path.display()
    );
    Ok(())
}

/// Strings are written verbatim, null as an empty cell, anything else as
/// its JSON text.
fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(value: Value) -> ExtractionResult {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn header_written_once_then_rows_appended() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("Invoice_Reader.csv");

        append_result(&csv_path, "first.pdf", &result(json!({"A": "1", "B": "2"}))).unwrap();
        append_result(&csv_path, "second.pdf", &result(json!({"A": "3", "B": "4"}))).unwrap();

        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text, "A,B,Source File\r\n1,2,first.pdf\r\n3,4,second.pdf\r\n");
    }

    #[test]
    fn column_order_follows_result_keys() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");

        append_result(&csv_path, "doc.pdf", &result(json!({"zeta": "z", "alpha": "a"}))).unwrap();

        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text.lines().next(), Some("zeta,alpha,Source File"));
    }

    #[test]
    fn non_string_values_and_quoting() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");

        append_result(
            &csv_path,
            "doc.pdf",
            &result(json!({
                "total": 12.5,
                "paid": true,
                "note": null,
                "items": ["a", "b"],
                "vendor": "Acme, Inc."
            })),
        )
        .unwrap();

        let mut reader = csv::Reader::from_path(&csv_path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["total", "paid", "note", "items", "vendor", "Source File"]
        );
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(
            row.iter().collect::<Vec<_>>(),
            ["12.5", "true", "", r#"["a","b"]"#, "Acme, Inc.", "doc.pdf"]
        );
    }

    #[test]
    fn source_file_key_from_service_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("out.csv");

        append_result(
            &csv_path,
            "real.pdf",
            &result(json!({"A": "1", "Source File": "made-up.pdf"})),
        )
        .unwrap();

        let text = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(text, "A,Source File\r\n1,real.pdf\r\n");
    }

    #[test]
    fn missing_directory_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("no-such-dir").join("out.csv");

        let err = append_result(&csv_path, "doc.pdf", &result(json!({"A": "1"}))).unwrap_err();
        assert!(matches!(err, Pdf2CsvError::Io { .. }));
    }
}

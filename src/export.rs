//! Writes a collection of profile records to a spreadsheet-compatible file.

use crate::error::ExportError;
use crate::models::{EXPORT_COLUMNS, ProfileRecord};
use rust_xlsxwriter::{Format, Workbook};
use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Worksheet name used by the Excel export.
const SHEET_NAME: &str = "Profiles";

/// Output file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ExportFormat {
    /// Comma-separated values with a header row. Opens directly in spreadsheets.
    Csv,
    /// Excel workbook with one "Profiles" sheet and a bold header row.
    Xlsx,
    /// Pretty-printed JSON array of objects keyed by column name.
    Json,
}

impl ExportFormat {
    /// Picks the format from the file extension, falling back when it is unknown.
    pub(crate) fn for_path(path: &Path, fallback: ExportFormat) -> ExportFormat {
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("csv") => ExportFormat::Csv,
            Some("xlsx") => ExportFormat::Xlsx,
            Some("json") => ExportFormat::Json,
            _ => fallback,
        }
    }
}

/// Writes every record as CSV. The header row is always written.
pub(crate) fn write_csv<W: Write>(writer: W, records: &[ProfileRecord]) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(EXPORT_COLUMNS)?;
    for record in records {
        csv_writer.write_record(record.to_row())?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Builds an Excel workbook with the same header and row order as the CSV export.
pub(crate) fn write_xlsx(records: &[ProfileRecord]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, title) in (0u16..).zip(EXPORT_COLUMNS) {
        worksheet.write_string_with_format(0, col, title, &header_format)?;
    }
    for (row, record) in (1u32..).zip(records) {
        for (col, value) in (0u16..).zip(record.to_row()) {
            worksheet.write_string(row, col, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

pub(crate) fn write_json<W: Write>(writer: W, records: &[ProfileRecord]) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

/// Serializes the whole collection to `path` in one pass.
///
/// # Returns
/// * The format that was used, so callers can report it.
pub(crate) fn export_records(
    path: &Path,
    records: &[ProfileRecord],
    fallback: ExportFormat,
) -> Result<ExportFormat, ExportError> {
    let format = ExportFormat::for_path(path, fallback);
    tracing::info!(target: "export", "Writing {} records to {} as {:?}", records.len(), path.display(), format);

    let mut buffer = Vec::new();
    match format {
        ExportFormat::Csv => write_csv(&mut buffer, records)?,
        ExportFormat::Xlsx => buffer = write_xlsx(records)?,
        ExportFormat::Json => write_json(&mut buffer, records)?,
    }
    fs::write(path, buffer)?;

    tracing::debug!(target: "export", "Finished writing {}", path.display());
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::{Reader, Xlsx, open_workbook};
    use std::path::PathBuf;

    fn record(name: &str, username: &str) -> ProfileRecord {
        ProfileRecord {
            name: name.to_string(),
            username: username.to_string(),
            followers: "1.2M".to_string(),
            likes: "50M".to_string(),
            profile_url: format!("https://www.tiktok.com/@{}", username),
        }
    }

    #[test]
    fn test_format_from_extension() {
        let csv = ExportFormat::Csv;
        assert_eq!(ExportFormat::for_path(&PathBuf::from("out.json"), csv), ExportFormat::Json);
        assert_eq!(ExportFormat::for_path(&PathBuf::from("OUT.JSON"), csv), ExportFormat::Json);
        assert_eq!(
            ExportFormat::for_path(&PathBuf::from("out.csv"), ExportFormat::Json),
            ExportFormat::Csv
        );
        assert_eq!(
            ExportFormat::for_path(&PathBuf::from("out.XLSX"), csv),
            ExportFormat::Xlsx
        );
        assert_eq!(
            ExportFormat::for_path(&PathBuf::from("out.txt"), ExportFormat::Json),
            ExportFormat::Json
        );
        assert_eq!(ExportFormat::for_path(&PathBuf::from("noext"), csv), ExportFormat::Csv);
    }

    #[test]
    fn test_empty_csv_has_only_header() {
        let mut out = Vec::new();
        write_csv(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Name,Username,Followers,Likes,Profile URL\n"
        );
    }

    #[test]
    fn test_csv_quotes_fields_with_commas() {
        let mut out = Vec::new();
        write_csv(&mut out, &[record("Smith, Jane", "jane")]).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "\"Smith, Jane\",jane,1.2M,50M,https://www.tiktok.com/@jane"
        );
    }

    #[test]
    fn test_export_records_keeps_insertion_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.csv");
        let records = vec![record("Bob", "bob"), record("Alice", "alice"), record("Bob", "bob")];

        let format = export_records(&path, &records, ExportFormat::Json).unwrap();
        assert_eq!(format, ExportFormat::Csv);

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(headers.iter().collect::<Vec<_>>(), EXPORT_COLUMNS);
        let usernames: Vec<String> = reader
            .records()
            .map(|r| r.unwrap()[1].to_string())
            .collect();
        assert_eq!(usernames, ["bob", "alice", "bob"]);
    }

    #[test]
    fn test_export_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.json");

        export_records(&path, &[record("Alice", "alice")], ExportFormat::Csv).unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            r#"[
  {
    "Name": "Alice",
    "Username": "alice",
    "Followers": "1.2M",
    "Likes": "50M",
    "Profile URL": "https://www.tiktok.com/@alice"
  }
]"#
        );
    }

    #[test]
    fn test_export_xlsx_matches_csv_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("profiles.xlsx");
        let records = vec![record("Smith, Jane", "jane"), record("Alice", "alice")];

        let format = export_records(&path, &records, ExportFormat::Csv).unwrap();
        assert_eq!(format, ExportFormat::Xlsx);

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], EXPORT_COLUMNS);
        assert_eq!(
            rows[1],
            ["Smith, Jane", "jane", "1.2M", "50M", "https://www.tiktok.com/@jane"]
        );
        assert_eq!(rows[2][1], "alice");
    }

    #[test]
    fn test_empty_xlsx_has_only_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.xlsx");
        export_records(&path, &[], ExportFormat::Csv).unwrap();

        let mut workbook: Xlsx<_> = open_workbook(&path).unwrap();
        let range = workbook.worksheet_range(SHEET_NAME).unwrap();
        assert_eq!(range.height(), 1);
        let header: Vec<String> = range.rows().next().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(header, EXPORT_COLUMNS);
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope").join("profiles.csv");
        let err = export_records(&path, &[], ExportFormat::Csv).unwrap_err();
        assert!(matches!(err, ExportError::Io(_)));
    }
}

//! Sheet-by-sheet JSON export of a whole workbook, with conversion statistics.
use crate::error::DirectoryError;
use crate::mapper::Record;
use crate::workbook::load_workbook;
use crate::workbook::Worksheet;
use chrono::Local;
use regex::Regex;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;
use std::path::Path;
use std::sync::OnceLock;

pub const STATS_FILE: &str = "conversion_stats.json";

/// Longest file stem produced from a sheet name, in characters.
const MAX_FILE_STEM: usize = 100;

/// Written in place of missing cells.
const MISSING_VALUE: &str = " ";

/// Summary written to `conversion_stats.json`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversionStats {
    /// Local time of the export, RFC 3339
    pub conversion_date: String,
    pub source_file: String,
    /// Per-sheet statistics keyed by sheet name, in workbook order
    #[serde(serialize_with = "by_sheet_name")]
    pub sheets: Vec<SheetStats>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SheetStats {
    #[serde(skip)]
    pub sheet_name: String,
    pub json_file: String,
    /// Rows below the header, blank rows included
    pub original_rows: usize,
    pub filtered_rows: usize,
    pub removed_rows: usize,
    pub columns: Vec<String>,
}

fn by_sheet_name<S: Serializer>(sheets: &[SheetStats], serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(sheets.len()))?;
    for sheet in sheets {
        map.serialize_entry(&sheet.sheet_name, sheet)?;
    }
    map.end()
}

/// Writes every sheet of the workbook at `path` to `<output_dir>/<sheet>.json`
/// plus a `conversion_stats.json` summary.
///
/// Only rows whose last column is filled are exported, and the first of them
/// (the header remains) is left out.
pub fn export_sheets<P: AsRef<Path>, Q: AsRef<Path>>(path: P, output_dir: Q) -> Result<ConversionStats, DirectoryError> {
    let path = path.as_ref();
    let output_dir = output_dir.as_ref();
    let workbook = load_workbook(path)?;
    std::fs::create_dir_all(output_dir).map_err(|source| DirectoryError::Storage {
        path: output_dir.to_path_buf(),
        source,
    })?;

    let mut sheets = Vec::with_capacity(workbook.sheets().len());
    for sheet in workbook.sheets() {
        let json_file = format!("{}.json", safe_file_stem(&sheet.name));
        let records = exported_records(sheet);
        write_json(&output_dir.join(&json_file), &records.iter().skip(1).collect::<Vec<_>>())?;

        let stats = SheetStats {
            sheet_name: sheet.name.to_owned(),
            json_file,
            original_rows: sheet.row_count,
            filtered_rows: records.len(),
            removed_rows: sheet.row_count.saturating_sub(records.len()),
            columns: sheet.labels.to_owned(),
        };
        log::info!("{}: {}/{} rows", stats.json_file, stats.filtered_rows, stats.original_rows);
        sheets.push(stats);
    }

    let stats = ConversionStats {
        conversion_date: Local::now().to_rfc3339(),
        source_file: path.display().to_string(),
        sheets,
    };
    write_json(&output_dir.join(STATS_FILE), &stats)?;
    log::info!("Exported {} sheets to '{}'", stats.sheets.len(), output_dir.display());
    Ok(stats)
}

/// Rows whose last column is non-empty, with missing cells spelled as a space.
fn exported_records(sheet: &Worksheet) -> Vec<Record> {
    sheet
        .rows
        .iter()
        .filter(|row| !row.last().is_empty())
        .map(|row| {
            let mut record = Record::default();
            for (label, value) in row.iter() {
                let value = if value.is_empty() { MISSING_VALUE } else { value };
                record.insert(label, value.to_owned());
            }
            record
        })
        .collect()
}

/// Keeps word characters, whitespace, `-` and `_`, trimmed and capped at 100 characters.
pub fn safe_file_stem(sheet_name: &str) -> String {
    static UNSAFE_CHARACTERS: OnceLock<Regex> = OnceLock::new();
    let pattern = UNSAFE_CHARACTERS.get_or_init(|| Regex::new(r"[^\w\s\-_]").expect("Hardcode regex pattern"));
    let cleaned = pattern.replace_all(sheet_name, "");
    let stem: String = cleaned.trim().chars().take(MAX_FILE_STEM).collect();
    if stem.is_empty() { "sheet".to_owned() } else { stem }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), DirectoryError> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| DirectoryError::Storage {
        path: path.to_path_buf(),
        source,
    })
}

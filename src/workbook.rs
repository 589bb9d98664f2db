//! # Workbook Loading
//!
//! Turns a spreadsheet file into [`Worksheet`]s of string rows. The first
//! physical row of each sheet (row 1, even when blank) supplies the column
//! labels:
//!
//! - a blank header cell gets the positional label `Unnamed: <index>`;
//! - a repeated label gets a `.<n>` suffix (`Name`, `Name.1`, ...).
//!
//! Every following row is a [`Row`] holding one value per label, with missing
//! cells read as the empty string.
use crate::error::DirectoryError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::sheet::Sheet;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

/// One data row: column label -> cell text, in column order.
///
/// Labels are shared by all rows of a sheet. Trailing empty values are not
/// stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    labels: Arc<[String]>,
    values: Vec<String>,
}

impl Row {
    pub fn new<I, L, V>(cells: I) -> Self
    where
        I: IntoIterator<Item = (L, V)>,
        L: Into<String>,
        V: Into<String>,
    {
        let (labels, values): (Vec<String>, Vec<String>) = cells
            .into_iter()
            .map(|(label, value)| (label.into(), value.into()))
            .unzip();
        Row::with_labels(labels.into(), values)
    }

    fn with_labels(labels: Arc<[String]>, mut values: Vec<String>) -> Self {
        values.truncate(labels.len());
        while values.last().is_some_and(|value| value.is_empty()) {
            values.pop();
        }
        Row { labels, values }
    }

    fn value(&self, index: usize) -> &str {
        self.values.get(index).map(String::as_str).unwrap_or("")
    }

    /// Value under `label`; an unknown label reads as `""`.
    pub fn get(&self, label: &str) -> &str {
        self.labels
            .iter()
            .position(|key| key == label)
            .map(|index| self.value(index))
            .unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(index, label)| (label.as_str(), self.value(index)))
    }

    /// Value of the rightmost column.
    pub fn last(&self) -> &str {
        self.labels.len().checked_sub(1).map(|index| self.value(index)).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// True when every value is empty.
    pub fn is_blank(&self) -> bool {
        self.values.iter().all(|value| value.is_empty())
    }
}

/// A named sheet: its column labels and data rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Worksheet {
    pub name: String,
    pub labels: Vec<String>,
    pub rows: Vec<Row>,
    /// Rows below the header in the source sheet, blank ones included
    pub row_count: usize,
}

impl Worksheet {
    /// Builds a worksheet from a text grid whose first row is the header.
    /// Short rows are padded with empty cells.
    pub fn from_grid(name: &str, grid: Vec<Vec<String>>) -> Self {
        let mut grid = grid.into_iter();
        let labels = grid.next().map(|header| to_labels(&header)).unwrap_or_default();
        let shared: Arc<[String]> = labels.as_slice().into();
        let rows: Vec<Row> = grid.map(|values| Row::with_labels(shared.clone(), values)).collect();
        Worksheet {
            name: name.to_owned(),
            row_count: rows.len(),
            labels,
            rows,
        }
    }

    /// Only rows holding cells are materialized; gaps count towards
    /// `row_count` and become empty rows unless `skip_empty_rows` is set.
    fn from_sheet(sheet: &Sheet, shared_strings: &[String], skip_empty_rows: bool) -> Self {
        let texts = |cells: &[&Cell]| -> Vec<String> {
            let mut values = vec![String::new(); cells.last().map(|cell| cell.col + 1).unwrap_or(0)];
            for cell in cells {
                values[cell.col] = cell.text(shared_strings);
            }
            values
        };

        let mut rows = sheet.rows();
        let mut header = match rows.first() {
            Some((0, cells)) => texts(cells),
            _ => Vec::new(),
        };
        if !header.is_empty() {
            rows.remove(0);
        }
        header.resize(sheet.width(), String::new());
        let labels = to_labels(&header);
        let shared: Arc<[String]> = labels.as_slice().into();

        let mut data = Vec::with_capacity(rows.len());
        let mut next = 1usize;
        for (index, cells) in rows {
            if !skip_empty_rows {
                data.extend((next..index).map(|_| Row::with_labels(shared.clone(), Vec::new())));
            }
            next = index + 1;
            let row = Row::with_labels(shared.clone(), texts(&cells));
            if !(skip_empty_rows && row.is_blank()) {
                data.push(row);
            }
        }
        Worksheet {
            name: sheet.name.to_owned(),
            labels,
            rows: data,
            row_count: sheet.height().saturating_sub(1),
        }
    }
}

/// Sheets of one workbook file, in workbook order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Workbook {
    sheets: Vec<Worksheet>,
}

impl Workbook {
    pub fn new(sheets: Vec<Worksheet>) -> Self {
        Workbook { sheets }
    }

    pub fn sheets(&self) -> &[Worksheet] {
        &self.sheets
    }

    /// Sheet with exactly this name.
    pub fn get(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }
}

/// Loads every sheet of a workbook, skipping fully blank rows.
///
/// # Errors
/// [`DirectoryError::SourceNotFound`] when `path` is not an existing file,
/// [`DirectoryError::UnreadableSource`] when it cannot be parsed.
pub fn load_workbook<P: AsRef<Path>>(path: P) -> Result<Workbook, DirectoryError> {
    let criteria = Criteria {
        skip_empty_rows: true,
        ..Criteria::default()
    };
    load_workbook_with(path, &criteria)
}

/// Loads the sheets of a workbook selected by `criteria`.
pub fn load_workbook_with<P: AsRef<Path>>(path: P, criteria: &Criteria) -> Result<Workbook, DirectoryError> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(DirectoryError::SourceNotFound { path: path.to_path_buf() });
    }
    let unreadable = |source| DirectoryError::UnreadableSource { path: path.to_path_buf(), source };

    let data = std::fs::read(path).map_err(|error| unreadable(error.into()))?;
    let file_name = path.display().to_string();
    let mut spreadsheet = open_spreadsheet(&file_name, data).map_err(unreadable)?;
    log::info!("Opened workbook '{}' with sheets {:?}", spreadsheet.name(), spreadsheet.sheet_names());

    let shared_strings = spreadsheet.load_shared_strings().map_err(unreadable)?;
    let sheets = spreadsheet.read_sheets(criteria).map_err(unreadable)?;
    let sheets: Vec<Worksheet> = sheets
        .iter()
        .map(|sheet| Worksheet::from_sheet(sheet, &shared_strings, criteria.skip_empty_rows))
        .collect();
    for sheet in &sheets {
        log::debug!("Sheet '{}': {} columns, {} rows", sheet.name, sheet.labels.len(), sheet.rows.len());
    }
    Ok(Workbook::new(sheets))
}

/// Column labels for a header row, named the way pandas names them.
fn to_labels(header: &[String]) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    header
        .iter()
        .enumerate()
        .map(|(index, value)| {
            let label = if value.trim().is_empty() {
                format!("Unnamed: {index}")
            } else {
                value.to_owned()
            };
            let count = seen.entry(label.clone()).or_insert(0);
            let label = if *count == 0 { label } else { format!("{label}.{count}") };
            *count += 1;
            label
        })
        .collect()
}

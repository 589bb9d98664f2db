/// Selects which sheets of a workbook are materialized.
#[derive(Clone, Debug, Default)]
pub struct Criteria {
    /// Exact, case-sensitive sheet names to read; `None` reads every sheet.
    pub sheet_names: Option<Vec<String>>,

    /// Drop rows whose cells are all empty.
    pub skip_empty_rows: bool,
}

impl Criteria {
    /// Criteria reading only the named sheets.
    pub fn sheets<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Criteria {
            sheet_names: Some(names.into_iter().map(Into::into).collect()),
            skip_empty_rows: false,
        }
    }

    /// Checks if a sheet name is selected.
    pub fn accept(&self, sheet_name: &str) -> bool {
        match &self.sheet_names {
            Some(names) => names.iter().any(|name| name == sheet_name),
            None => true,
        }
    }
}

use crate::config::Config;
use crate::error::DirectoryError;
use crate::mapper::map_records;
use crate::mapper::Record;
use crate::record::ClientServiceRecord;
use crate::record::DirectorySnapshot;
use crate::record::StaffRecord;
use crate::schema::Schema;
use crate::section::annotate;
use crate::section::SectionedRow;
use crate::spreadsheet::criteria::Criteria;
use crate::workbook::load_workbook_with;
use crate::workbook::Workbook;
use std::path::Path;

/// Runs the extraction pipeline for the staff and client-service schemas.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryBuilder {
    staff: Schema,
    client_service: Schema,
}

impl Default for DirectoryBuilder {
    fn default() -> Self {
        DirectoryBuilder::new(Schema::staff(), Schema::client_service())
    }
}

impl DirectoryBuilder {
    pub fn new(staff: Schema, client_service: Schema) -> Self {
        DirectoryBuilder { staff, client_service }
    }

    pub fn from_config(config: &Config) -> Self {
        DirectoryBuilder::new(config.staff.clone(), config.client_service.clone())
    }

    /// Loads the workbook at `path` once and extracts both record lists.
    ///
    /// Only the sheets named by the two schemas are read. A schema whose
    /// sheets are all missing contributes an empty list and a
    /// [`DirectoryError::SchemaMismatch`] in [`BuildOutcome::mismatches`].
    ///
    /// # Errors
    /// [`DirectoryError::SourceNotFound`] or [`DirectoryError::UnreadableSource`]
    /// when the workbook cannot be loaded; nothing is returned in that case.
    pub fn build<P: AsRef<Path>>(&self, path: P) -> Result<BuildOutcome, DirectoryError> {
        let sheet_names = self.staff.target_sheets
            .iter()
            .chain(&self.client_service.target_sheets)
            .cloned();
        let criteria = Criteria {
            skip_empty_rows: true,
            ..Criteria::sheets(sheet_names)
        };
        let workbook = load_workbook_with(path, &criteria)?;
        Ok(self.build_from(&workbook))
    }

    /// Extracts both record lists from an already loaded workbook.
    pub fn build_from(&self, workbook: &Workbook) -> BuildOutcome {
        let mut mismatches = Vec::new();
        let mut records = |schema: &Schema| {
            extract(workbook, schema).unwrap_or_else(|mismatch| {
                log::warn!("{mismatch}");
                mismatches.push(mismatch);
                Vec::new()
            })
        };
        let snapshot = DirectorySnapshot {
            staff: records(&self.staff).iter().map(StaffRecord::from).collect(),
            client_service: records(&self.client_service).iter().map(ClientServiceRecord::from).collect(),
        };
        log::info!(
            "Extracted {} staff and {} client service records",
            snapshot.staff.len(),
            snapshot.client_service.len()
        );
        BuildOutcome { snapshot, mismatches }
    }
}

/// Result of one build.
#[derive(Debug)]
pub struct BuildOutcome {
    pub snapshot: DirectorySnapshot,
    /// One [`DirectoryError::SchemaMismatch`] per schema that found none of its sheets
    pub mismatches: Vec<DirectoryError>,
}

/// Generic records of one schema, with pass-through columns kept.
///
/// # Errors
/// [`DirectoryError::SchemaMismatch`] when the workbook has none of the
/// schema's target sheets.
pub fn extract(workbook: &Workbook, schema: &Schema) -> Result<Vec<Record>, DirectoryError> {
    let sheets: Vec<_> = workbook.sheets().iter().filter(|sheet| schema.targets(&sheet.name)).collect();
    if sheets.is_empty() {
        return Err(DirectoryError::SchemaMismatch {
            schema: schema.name.to_owned(),
            sheets: schema.target_sheets.to_owned(),
        });
    }
    // Section labels do not carry over from one sheet to the next
    let rows: Vec<SectionedRow> = sheets
        .iter()
        .flat_map(|sheet| annotate(&sheet.rows, &schema.sections))
        .collect();
    Ok(map_records(&rows, schema))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbook::Worksheet;
    use pretty_assertions::assert_eq;

    fn sheet(name: &str, width: usize, rows: &[&[&str]]) -> Worksheet {
        let mut grid = vec![vec![String::new(); width]];
        grid.extend(rows.iter().map(|row| row.iter().map(|value| value.to_string()).collect()));
        Worksheet::from_grid(name, grid)
    }

    fn client_sheet() -> Worksheet {
        sheet("Клиентские службы", 7, &[
            &["кспд", "город", "Фамилия", "Имя", "Отчество", "Должность", "Место"],
            &["Клиентская служба в г. Пенза", "", "", "", "", "", ""],
            &["2101", "54321", "Петрова", "Анна", "Ивановна", "Специалист", "каб. 1"],
            &["", "", "", "", "", "", ""],
            &["Клиентская служба в г. Кузнецк", "", "", "", "", "", ""],
            &["2201", "23-45-67", "Сидоров", "Олег", "Петрович", "Начальник", "каб. 2"],
        ])
    }

    #[test]
    fn client_service_records_take_running_department() {
        let workbook = Workbook::new(vec![client_sheet()]);
        let outcome = DirectoryBuilder::default().build_from(&workbook);
        let snapshot = outcome.snapshot;

        assert!(snapshot.staff.is_empty());
        assert!(matches!(
            outcome.mismatches.as_slice(),
            [DirectoryError::SchemaMismatch { schema, .. }] if schema == "staff"
        ));
        assert_eq!(snapshot.client_service, vec![
            ClientServiceRecord {
                city_code: "5-43-21".to_owned(),
                internal_code: "2101".to_owned(),
                last_name: "Петрова".to_owned(),
                first_name: "Анна".to_owned(),
                patronymic: "Ивановна".to_owned(),
                position: "Специалист".to_owned(),
                department: "Клиентская служба в г. Пенза".to_owned(),
                location: "каб. 1".to_owned(),
            },
            ClientServiceRecord {
                city_code: "23-45-67".to_owned(),
                internal_code: "2201".to_owned(),
                last_name: "Сидоров".to_owned(),
                first_name: "Олег".to_owned(),
                patronymic: "Петрович".to_owned(),
                position: "Начальник".to_owned(),
                department: "Клиентская служба в г. Кузнецк".to_owned(),
                location: "каб. 2".to_owned(),
            },
        ]);
    }

    #[test]
    fn missing_sheet_yields_empty_list() {
        let workbook = Workbook::new(vec![sheet("Other", 2, &[&["a", "b"]])]);
        let outcome = DirectoryBuilder::default().build_from(&workbook);
        assert!(outcome.snapshot.is_empty());
        let schemas: Vec<&str> = outcome
            .mismatches
            .iter()
            .map(|mismatch| match mismatch {
                DirectoryError::SchemaMismatch { schema, .. } => schema.as_str(),
                _ => "",
            })
            .collect();
        assert_eq!(schemas, vec!["staff", "client_service"]);
    }

    #[test]
    fn schemas_read_all_their_target_sheets() {
        let mut staff = Schema::staff();
        staff.target_sheets.push("ОСФР 2".to_owned());
        let builder = DirectoryBuilder::new(staff, Schema::client_service());
        let row = |name: &'static str| ["", "", "", name, "", "", "", "", "здание"];
        let workbook = Workbook::new(vec![
            sheet("ОСФР", 9, &[&row("Шапка"), &row("Иванов")]),
            sheet("ОСФР 2", 9, &[&row("Петров")]),
        ]);

        let names: Vec<String> = builder.build_from(&workbook).snapshot.staff.into_iter().map(|record| record.last_name).collect();
        assert_eq!(names, vec!["Иванов", "Петров"]);
    }

    #[test]
    fn generic_extract_keeps_pass_through_columns() {
        let workbook = Workbook::new(vec![Worksheet::from_grid("ОСФР", vec![
            ["", "", "", "", "", "", "", "", "", "Примечание"].map(String::from).to_vec(),
            ["", "", "", "Иванов", "", "", "", "", "здание", "в отпуске"].map(String::from).to_vec(),
        ])]);
        let records = extract(&workbook, &Schema::staff()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("Примечание"), "в отпуске");
    }

    #[test]
    fn extract_reports_missing_sheets() {
        let workbook = Workbook::new(vec![sheet("ОСФР", 9, &[])]);
        assert!(extract(&workbook, &Schema::staff()).unwrap().is_empty());
        match extract(&workbook, &Schema::client_service()) {
            Err(DirectoryError::SchemaMismatch { schema, sheets }) => {
                assert_eq!(schema, "client_service");
                assert_eq!(sheets, vec!["Клиентские службы"]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

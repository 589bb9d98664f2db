//! Record schemas: which sheets a record kind comes from and how their
//! columns become fields.
use crate::section::SectionMode;
use serde::Deserialize;
use serde::Serialize;

pub const STAFF_SHEET: &str = "ОСФР";
pub const CLIENT_SERVICE_SHEET: &str = "Клиентские службы";
pub const CLIENT_SERVICE_MARKER: &str = "Клиентская служба";

/// Renames one raw column label to a field name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMapping {
    pub label: String,
    pub field: String,
}

impl ColumnMapping {
    pub fn new(label: &str, field: &str) -> Self {
        ColumnMapping {
            label: label.to_owned(),
            field: field.to_owned(),
        }
    }
}

/// Everything that distinguishes one record kind from another.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Name used in log messages
    pub name: String,
    /// Exact, case-sensitive sheet names to read
    pub target_sheets: Vec<String>,
    pub columns: Vec<ColumnMapping>,
    /// Raw label of the column that must be non-empty for a row to count as data
    pub required_column: String,
    /// Raw labels of columns holding phone numbers
    #[serde(default)]
    pub phone_columns: Vec<String>,
    #[serde(default)]
    pub sections: SectionMode,
    /// Field receiving the running section label
    #[serde(default)]
    pub section_field: Option<String>,
}

impl Schema {
    /// Organizational-unit staff on the `ОСФР` sheet. The department is an
    /// ordinary column.
    pub fn staff() -> Self {
        let fields = [
            "Городской номер",
            "Кор. тел.",
            "№ комн.",
            "ФАМИЛИЯ",
            "ИМЯ",
            "ОТЧЕСТВО",
            "ДОЛЖНОСТЬ",
            "Отдел",
            "Место расположения",
        ];
        Schema {
            name: "staff".to_owned(),
            target_sheets: vec![STAFF_SHEET.to_owned()],
            columns: positional(&fields),
            required_column: unnamed(8),
            phone_columns: vec![unnamed(0)],
            sections: SectionMode::Inline,
            section_field: None,
        }
    }

    /// Client-service staff on the `Клиентские службы` sheet. Departments are
    /// label rows in the first column.
    pub fn client_service() -> Self {
        let fields = ["кспд", "город", "Фамилия", "Имя", "Отчество", "Должность", "Место расположения"];
        Schema {
            name: "client_service".to_owned(),
            target_sheets: vec![CLIENT_SERVICE_SHEET.to_owned()],
            columns: positional(&fields),
            required_column: unnamed(6),
            phone_columns: vec![unnamed(1)],
            sections: SectionMode::RunningLabel {
                column: unnamed(0),
                marker: CLIENT_SERVICE_MARKER.to_owned(),
            },
            section_field: Some("отдел".to_owned()),
        }
    }

    /// Field name for a raw label; unmapped labels pass through unchanged.
    pub fn field_name<'a>(&'a self, label: &'a str) -> &'a str {
        self.columns
            .iter()
            .find(|mapping| mapping.label == label)
            .map(|mapping| mapping.field.as_str())
            .unwrap_or(label)
    }

    pub fn is_phone_column(&self, label: &str) -> bool {
        self.phone_columns.iter().any(|column| column == label)
    }

    pub fn targets(&self, sheet_name: &str) -> bool {
        self.target_sheets.iter().any(|target| target == sheet_name)
    }
}

fn unnamed(index: usize) -> String {
    format!("Unnamed: {index}")
}

fn positional(fields: &[&str]) -> Vec<ColumnMapping> {
    fields
        .iter()
        .enumerate()
        .map(|(index, field)| ColumnMapping::new(&unnamed(index), field))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn staff_maps_nine_positional_columns() {
        let schema = Schema::staff();
        assert_eq!(schema.columns.len(), 9);
        assert_eq!(schema.field_name("Unnamed: 0"), "Городской номер");
        assert_eq!(schema.field_name("Unnamed: 8"), "Место расположения");
        assert_eq!(schema.field_name("Примечание"), "Примечание");
        assert!(schema.is_phone_column("Unnamed: 0"));
        assert!(schema.targets("ОСФР"));
        assert!(!schema.targets("Клиентские службы"));
    }

    #[test]
    fn client_service_uses_running_labels() {
        let schema = Schema::client_service();
        assert_eq!(schema.field_name("Unnamed: 0"), "кспд");
        assert_eq!(schema.field_name("Unnamed: 1"), "город");
        assert_eq!(schema.required_column, "Unnamed: 6");
        assert_eq!(schema.section_field.as_deref(), Some("отдел"));
        assert!(matches!(schema.sections, SectionMode::RunningLabel { ref marker, .. } if marker == "Клиентская служба"));
    }
}

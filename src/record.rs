//! Typed directory entries and the snapshot produced by one build.
//!
//! Field names serialize under the keys of the directory's JSON files, so
//! snapshots written by earlier tools load unchanged.
use crate::mapper::Record;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;

/// An organizational-unit staff entry (`ОСФР` sheet).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaffRecord {
    #[serde(rename = "Городской номер")]
    pub external_phone: String,
    #[serde(rename = "Кор. тел.")]
    pub internal_phone: String,
    #[serde(rename = "№ комн.")]
    pub room: String,
    #[serde(rename = "ФАМИЛИЯ")]
    pub last_name: String,
    #[serde(rename = "ИМЯ")]
    pub first_name: String,
    #[serde(rename = "ОТЧЕСТВО")]
    pub patronymic: String,
    #[serde(rename = "ДОЛЖНОСТЬ")]
    pub position: String,
    #[serde(rename = "Отдел")]
    pub department: String,
    #[serde(rename = "Место расположения")]
    pub location: String,
}

impl From<&Record> for StaffRecord {
    fn from(record: &Record) -> Self {
        let field = |name: &str| record.get(name).to_owned();
        StaffRecord {
            external_phone: field("Городской номер"),
            internal_phone: field("Кор. тел."),
            room: field("№ комн."),
            last_name: field("ФАМИЛИЯ"),
            first_name: field("ИМЯ"),
            patronymic: field("ОТЧЕСТВО"),
            position: field("ДОЛЖНОСТЬ"),
            department: field("Отдел"),
            location: field("Место расположения"),
        }
    }
}

/// A client-service staff entry (`Клиентские службы` sheet).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientServiceRecord {
    #[serde(rename = "город")]
    pub city_code: String,
    #[serde(rename = "кспд")]
    pub internal_code: String,
    #[serde(rename = "Фамилия")]
    pub last_name: String,
    #[serde(rename = "Имя")]
    pub first_name: String,
    #[serde(rename = "Отчество")]
    pub patronymic: String,
    #[serde(rename = "Должность")]
    pub position: String,
    /// Label of the nearest section row above the entry
    #[serde(rename = "отдел", deserialize_with = "null_as_empty")]
    pub department: String,
    #[serde(rename = "Место расположения")]
    pub location: String,
}

impl From<&Record> for ClientServiceRecord {
    fn from(record: &Record) -> Self {
        let field = |name: &str| record.get(name).to_owned();
        ClientServiceRecord {
            city_code: field("город"),
            internal_code: field("кспд"),
            last_name: field("Фамилия"),
            first_name: field("Имя"),
            patronymic: field("Отчество"),
            position: field("Должность"),
            department: field("отдел"),
            location: field("Место расположения"),
        }
    }
}

/// Entries written before the first section label carry `null` departments.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Both record lists from one build of one workbook.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub staff: Vec<StaffRecord>,
    pub client_service: Vec<ClientServiceRecord>,
}

impl DirectorySnapshot {
    pub fn is_empty(&self) -> bool {
        self.staff.is_empty() && self.client_service.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn staff_serializes_in_directory_order() {
        let record = StaffRecord {
            external_phone: "12-34-56".to_owned(),
            last_name: "Иванов".to_owned(),
            ..StaffRecord::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.starts_with(r#"{"Городской номер":"12-34-56","Кор. тел.":"","№ комн.":"","ФАМИЛИЯ":"Иванов""#));
        assert!(json.ends_with(r#""Место расположения":""}"#));
    }

    #[test]
    fn client_service_reads_null_department_and_extra_keys() {
        let json = r#"{"отдел": null, "кспд": "101", "город": "5-43-21", "Фамилия": "Петрова", "Unnamed: 7": ""}"#;
        let record: ClientServiceRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record, ClientServiceRecord {
            internal_code: "101".to_owned(),
            city_code: "5-43-21".to_owned(),
            last_name: "Петрова".to_owned(),
            ..ClientServiceRecord::default()
        });
    }

    #[test]
    fn projects_generic_records() {
        let mut record = Record::default();
        record.insert("отдел", "Клиентская служба №1".to_owned());
        record.insert("Фамилия", "Петрова".to_owned());
        record.insert("Unnamed: 9", "ignored".to_owned());
        let typed = ClientServiceRecord::from(&record);
        assert_eq!(typed.department, "Клиентская служба №1");
        assert_eq!(typed.last_name, "Петрова");
        assert_eq!(typed.location, "");
    }
}

//! Conversion of raw sheet rows into named records.
use crate::phone::format_phone;
use crate::phone::is_bare_number;
use crate::schema::Schema;
use crate::section::SectionedRow;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;

/// Field name -> value pairs in output order. Serializes as a flat JSON object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Value of `field`, `""` when absent.
    pub fn get(&self, field: &str) -> &str {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
            .unwrap_or("")
    }

    /// Sets `field`, replacing an earlier value in place.
    pub fn insert(&mut self, field: &str, value: String) {
        match self.fields.iter_mut().find(|(name, _)| name == field) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((field.to_owned(), value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Maps annotated rows to records under `schema`.
///
/// A row counts only when the required column is non-empty after trimming.
/// Values are trimmed, bare-number phones are grouped, and the section field
/// (if any) comes first. When more than one row is accepted the first record
/// is dropped: it is the remains of the sheet's header block.
pub fn map_records(rows: &[SectionedRow], schema: &Schema) -> Vec<Record> {
    let mut records: Vec<Record> = rows
        .iter()
        .filter(|sectioned| !sectioned.row.get(&schema.required_column).trim().is_empty())
        .map(|sectioned| map_row(sectioned, schema))
        .collect();
    log::debug!("Schema '{}': {} of {} rows accepted", schema.name, records.len(), rows.len());
    if records.len() > 1 {
        records.remove(0);
    }
    records
}

fn map_row(sectioned: &SectionedRow, schema: &Schema) -> Record {
    let mut record = Record::default();
    if let Some(field) = &schema.section_field {
        record.insert(field, sectioned.section.clone().unwrap_or_default());
    }
    for (label, raw) in sectioned.row.iter() {
        let value = raw.trim();
        let value = if schema.is_phone_column(label) && is_bare_number(value) {
            format_phone(value)
        } else {
            value.to_owned()
        };
        record.insert(schema.field_name(label), value);
    }
    record
}

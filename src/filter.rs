//! Search over record lists: a case-insensitive text query across chosen
//! fields, combined with an exact department filter.
use crate::record::ClientServiceRecord;
use crate::record::StaffRecord;
use clap::ValueEnum;
use std::collections::HashSet;

/// Fields a query can look at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum Field {
    LastName,
    FirstName,
    Patronymic,
    /// City number (staff) or city code (client service)
    ExternalPhone,
    /// Internal number (staff) or internal code (client service)
    InternalPhone,
    Position,
    Department,
    Location,
}

/// Fields searched when a query names none.
pub const DEFAULT_SEARCH_FIELDS: [Field; 5] = [
    Field::LastName,
    Field::FirstName,
    Field::Patronymic,
    Field::ExternalPhone,
    Field::InternalPhone,
];

/// A record that can be searched field by field.
pub trait Entry {
    fn field(&self, field: Field) -> &str;
}

impl Entry for StaffRecord {
    fn field(&self, field: Field) -> &str {
        match field {
            Field::LastName => &self.last_name,
            Field::FirstName => &self.first_name,
            Field::Patronymic => &self.patronymic,
            Field::ExternalPhone => &self.external_phone,
            Field::InternalPhone => &self.internal_phone,
            Field::Position => &self.position,
            Field::Department => &self.department,
            Field::Location => &self.location,
        }
    }
}

impl Entry for ClientServiceRecord {
    fn field(&self, field: Field) -> &str {
        match field {
            Field::LastName => &self.last_name,
            Field::FirstName => &self.first_name,
            Field::Patronymic => &self.patronymic,
            Field::ExternalPhone => &self.city_code,
            Field::InternalPhone => &self.internal_code,
            Field::Position => &self.position,
            Field::Department => &self.department,
            Field::Location => &self.location,
        }
    }
}

type Predicate<'q, E> = Box<dyn Fn(&E) -> bool + 'q>;

/// Matches records whose `fields` contain `text`, ignoring case. Blank text matches everything.
pub fn text_in<'q, E: Entry + 'q>(fields: &'q [Field], text: &str) -> Predicate<'q, E> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return Box::new(|_: &E| true);
    }
    Box::new(move |entry: &E| {
        fields
            .iter()
            .any(|field| entry.field(*field).to_lowercase().contains(&needle))
    })
}

/// Matches records of exactly this department; `None` matches everything.
pub fn department_is<'q, E: Entry + 'q>(department: Option<&'q str>) -> Predicate<'q, E> {
    match department {
        Some(department) => Box::new(move |entry: &E| entry.field(Field::Department) == department),
        None => Box::new(|_: &E| true),
    }
}

pub fn all_of<'q, E: 'q>(predicates: Vec<Predicate<'q, E>>) -> Predicate<'q, E> {
    Box::new(move |entry: &E| predicates.iter().all(|predicate| predicate(entry)))
}

/// A text query plus an optional department.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    pub text: String,
    pub department: Option<String>,
    pub fields: Vec<Field>,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            text: String::new(),
            department: None,
            fields: DEFAULT_SEARCH_FIELDS.to_vec(),
        }
    }
}

impl Query {
    pub fn text(text: &str) -> Self {
        Query {
            text: text.to_owned(),
            ..Query::default()
        }
    }

    pub fn in_department(self, department: &str) -> Self {
        Query {
            department: Some(department.to_owned()),
            ..self
        }
    }

    pub fn predicate<E: Entry + 'static>(&self) -> Predicate<'_, E> {
        all_of(vec![
            text_in(&self.fields, &self.text),
            department_is(self.department.as_deref()),
        ])
    }

    /// Records matching the query, in their original order.
    pub fn apply<'r, E: Entry + 'static>(&self, records: &'r [E]) -> Vec<&'r E> {
        let predicate = self.predicate();
        records.iter().filter(|record| predicate(*record)).collect()
    }
}

/// Distinct non-empty departments in first-seen order.
pub fn departments<E: Entry>(records: &[E]) -> Vec<&str> {
    let mut seen = HashSet::new();
    records
        .iter()
        .map(|record| record.field(Field::Department))
        .filter(|department| !department.is_empty() && seen.insert(*department))
        .collect()
}

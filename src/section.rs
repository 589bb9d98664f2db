//! Section labels: the department a row belongs to.
//!
//! Some sheets carry the department as an ordinary column. Others announce it
//! with a label row ("Клиентская служба ...") that applies to every row below
//! it until the next label; [`annotate`] carries that label forward.
use crate::workbook::Row;
use serde::Deserialize;
use serde::Serialize;

/// How a schema finds the section of a row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SectionMode {
    /// The section is an ordinary column of every row.
    #[default]
    Inline,
    /// A row whose `column` contains `marker` starts a new section; its full
    /// text becomes the label of the rows that follow.
    RunningLabel { column: String, marker: String },
}

/// A data row with the section it falls under.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionedRow<'a> {
    /// `None` for inline sections and for rows before the first label.
    pub section: Option<String>,
    pub row: &'a Row,
}

/// Attaches sections to `rows` in order. Label rows themselves are consumed
/// and not returned.
pub fn annotate<'a>(rows: &'a [Row], mode: &SectionMode) -> Vec<SectionedRow<'a>> {
    match mode {
        SectionMode::Inline => rows.iter().map(|row| SectionedRow { section: None, row }).collect(),
        SectionMode::RunningLabel { column, marker } => {
            let (_, annotated) = rows.iter().fold(
                (None::<String>, Vec::with_capacity(rows.len())),
                |(label, mut annotated), row| {
                    let value = row.get(column);
                    if value.contains(marker.as_str()) {
                        (Some(value.to_owned()), annotated)
                    } else {
                        annotated.push(SectionedRow { section: label.clone(), row });
                        (label, annotated)
                    }
                },
            );
            annotated
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(first: &str, second: &str) -> Row {
        Row::new([("Unnamed: 0", first), ("Unnamed: 1", second)])
    }

    fn running_label() -> SectionMode {
        SectionMode::RunningLabel {
            column: "Unnamed: 0".to_owned(),
            marker: "Клиентская служба".to_owned(),
        }
    }

    fn sections<'a>(annotated: &'a [SectionedRow<'a>]) -> Vec<Option<&'a str>> {
        annotated.iter().map(|row| row.section.as_deref()).collect()
    }

    #[test]
    fn inline_rows_have_no_section() {
        let rows = vec![row("a", "1"), row("b", "2")];
        let annotated = annotate(&rows, &SectionMode::Inline);
        assert_eq!(sections(&annotated), vec![None, None]);
        assert_eq!(annotated[1].row, &rows[1]);
    }

    #[test]
    fn label_applies_until_superseded() {
        let rows = vec![
            row("", "before"),
            row("Клиентская служба в г. Пенза ", ""),
            row("", "first"),
            row("", "second"),
            row("Клиентская служба в г. Кузнецк", ""),
            row("", "third"),
        ];
        let annotated = annotate(&rows, &running_label());

        assert_eq!(sections(&annotated), vec![
            None,
            Some("Клиентская служба в г. Пенза "),
            Some("Клиентская служба в г. Пенза "),
            Some("Клиентская служба в г. Кузнецк"),
        ]);
        let values: Vec<&str> = annotated.iter().map(|row| row.row.get("Unnamed: 1")).collect();
        assert_eq!(values, vec!["before", "first", "second", "third"]);
    }

    #[test]
    fn marker_is_case_sensitive_substring() {
        let rows = vec![row("Отдел: Клиентская служба", ""), row("клиентская служба", "x")];
        let annotated = annotate(&rows, &running_label());
        assert_eq!(annotated.len(), 1);
        assert_eq!(annotated[0].section.as_deref(), Some("Отдел: Клиентская служба"));
    }

    #[test]
    fn deserializes_from_toml() {
        #[derive(Deserialize)]
        struct Holder {
            sections: SectionMode,
        }
        let holder: Holder = toml::from_str(
            r#"sections = { mode = "running_label", column = "Unnamed: 0", marker = "Клиентская служба" }"#,
        ).unwrap();
        assert_eq!(holder.sections, running_label());
    }
}

use crate::error::ReadError;
use crate::error::ResultMessage;
use crate::helpers::xml::XmlAttributeHelper;
use crate::helpers::xml::XmlNodeHelper;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlTextContextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::row_to_index;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Cursor;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");
const TAG_FORMAT_INDEX: QName = QName(b"xf");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

const PART_WORKBOOK: &str = "xl/workbook.xml";
const PART_WORKBOOK_RELATIONSHIPS: &str = "xl/_rels/workbook.xml.rels";
const PART_STYLES: &str = "xl/styles.xml";
const PART_SHARED_STRINGS: &str = "xl/sharedStrings.xml";

/// Excel 2007+ workbook held in memory as a zip package.
pub(crate) struct XlsxSpreadsheet {
    pub(crate) name: String,
    zip: ZipArchive<Cursor<Vec<u8>>>,
    number_formats: Vec<CellType>,
    /// (sheet name, zip path of the worksheet part)
    sheets: Vec<(String, String)>,
}

impl XlsxSpreadsheet {
    /// Opens the package and reads the sheet directory and cell styles.
    pub(crate) fn open(file_name: &str, data: Vec<u8>) -> Result<XlsxSpreadsheet, ReadError> {
        let mut zip = ZipArchive::new(Cursor::new(data))?;
        let (sheets, is_1904) = load_workbook(&mut zip)?;
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }
        let number_formats = load_number_formats(&mut zip, is_1904).with_prefix(PART_STYLES)?;
        Ok(XlsxSpreadsheet {
            name: file_name.to_owned(),
            zip,
            number_formats,
            sheets,
        })
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn name(&self) -> String {
        self.name.to_owned()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    fn load_shared_strings(&mut self) -> Result<Vec<String>, ReadError> {
        let mut shared_strings = Vec::<String>::new();
        let mut reader = match self.zip.xml_reader(PART_SHARED_STRINGS)? {
            Some(reader) => reader,
            None => return Ok(shared_strings),
        };
        match_xml_events!(reader => {
            Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
                shared_strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
            }
        });
        Ok(shared_strings)
    }

    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, ReadError> {
        let mut sheets = Vec::<Sheet>::new();
        for (sheet_name, zip_path) in &self.sheets {
            if !criteria.accept(sheet_name) {
                continue;
            }
            let mut reader = self.zip.xml_reader(zip_path)?
                .ok_or_else(|| SpreadsheetError::FileError(zip_path.to_owned()))?;
            let sheet = read_sheet(&mut reader, sheet_name, &self.number_formats)
                .with_prefix(&format!("Sheet '{sheet_name}'"))?;
            sheets.push(sheet);
        }
        Ok(sheets)
    }
}

/// Reads the cells of one worksheet part. Cells without an `r` reference
/// are placed after the previous cell of the same row.
fn read_sheet<R: BufRead>(reader: &mut XmlReader<R>, sheet_name: &str, number_formats: &[CellType]) -> Result<Sheet, ReadError> {
    let mut sheet = Sheet::new(sheet_name);
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut kind = CellType::default();
    let mut value = String::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_ROW => {
            if let Some(index) = event.get_attribute_value("r")?.and_then(|number| row_to_index(&number)) {
                row_count = index;
            }
            col_count = 0;
        }
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.get_attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count = col + 1;
            value.clear();
            kind = event.get_attribute_value("t")?.map(|t| {
                match t.as_ref() {
                    "inlineStr" | "str" => CellType::InlineString,
                    "s" => CellType::SharedString,
                    "d" => CellType::IsoDateTime,
                    "b" => CellType::Boolean,
                    "e" => CellType::Error,
                    _ => CellType::Number,
                }
            }).unwrap_or(CellType::Number);
            if kind == CellType::Number {
                if let Some(format_id) = event.get_attribute_value("s")? {
                    if !format_id.is_empty() {
                        let index = format_id.parse::<usize>()?;
                        kind = number_formats.get(index).copied().unwrap_or(CellType::Number);
                    }
                }
            }
        }
        Event::Start(event) if event.name() == TAG_INLINE_STRING => {
            value = read_string_value(&mut *reader, TAG_INLINE_STRING, false)?;
        }
        Event::Start(event) if event.name() == TAG_VALUE => {
            value = read_string_value(&mut *reader, TAG_VALUE, true)?;
        }
        Event::End(event) if event.name() == TAG_CELL => {
            // Error values read as blank cells
            if kind != CellType::Error && !value.is_empty() {
                sheet.push(Cell {
                    row,
                    col,
                    kind,
                    value: std::mem::take(&mut value),
                });
            }
        }
    });
    Ok(sheet)
}

/// Reads the sheet directory (name, part path) and the 1904 date flag.
fn load_workbook<RS: Read + Seek>(zip: &mut ZipArchive<RS>) -> Result<(Vec<(String, String)>, bool), ReadError> {
    let relationships = load_relationships(zip, PART_WORKBOOK_RELATIONSHIPS)?;
    let mut reader = zip.xml_reader(PART_WORKBOOK)?
        .ok_or_else(|| SpreadsheetError::FileError(PART_WORKBOOK.to_string()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.get_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.get_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(&*id) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.get_attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Resolves the cell type of each `cellXfs` style from styles.xml.
fn load_number_formats<RS: Read + Seek>(zip: &mut ZipArchive<RS>, is_1904: bool) -> Result<Vec<CellType>, ReadError> {
    let mut reader = match zip.xml_reader(PART_STYLES)? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.get_attribute_value("numFmtId")?;
            let format = event.get_attribute_value("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format, is_1904));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => break,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.get_attribute_value("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_else(|| "0".to_owned()));
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats, is_1904))
}

/// Collects the text of a string element up to `end_tag`, skipping phonetic runs.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, ReadError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_bytes_ref(&event)?,
    });
    Ok(text)
}

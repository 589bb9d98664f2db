use crate::error::ReadError;
use crate::error::ResultMessage;
use crate::error::ResultOptionChain;
use crate::helpers::biff8::Biff8Reader;
use crate::helpers::cfb::Cfb;
use crate::match_biff8_record;
use crate::spreadsheet::cell::to_error_value;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::excel::load_number_formats;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use either::Either;
use std::collections::HashMap;
use thiserror::Error;

// BIFF8 record types
const FORMULA: u16 = 6;
const EOF: u16 = 10;
const DATE1904: u16 = 34;
const FILE_PASS: u16 = 47;
const CODE_PAGE: u16 = 66;
const BOUND_SHEET8: u16 = 133;
const MUL_RK: u16 = 189;
const XF: u16 = 224;
const SST: u16 = 252;
const LABEL_SST: u16 = 253;
const NUMBER: u16 = 515;
const LABEL: u16 = 516;
const BOOL_ERR: u16 = 517;
const STRING: u16 = 519;
const ARRAY: u16 = 545;
const TABLE: u16 = 566;
const RK: u16 = 638;
const FORMAT: u16 = 1054;
const SHR_FMLA: u16 = 1212;
const BOF: u16 = 2057;

#[derive(Error, Debug)]
pub enum XlsError {
    #[error("Invalid Code page '{0}'")]
    CodePageError(u16),

    #[error("Invalid Formula value '{0}'")]
    FormulaValueError(u64),
}

/// Cell kind given directly, or an XF index to resolve through the number formats.
type CellKind = Either<CellType, usize>;

/// Excel 97-2003 workbook read from the BIFF8 stream of a compound file.
pub(crate) struct XlsSpreadsheet {
    pub(crate) name: String,
    reader: Biff8Reader,
    shared_strings: Vec<String>,
    number_formats: Vec<CellType>,
    /// (sheet name, stream offset of its BOF record)
    sheets: Vec<(String, usize)>,
}

impl XlsSpreadsheet {
    /// Reads the workbook globals: code page, date system, formats, shared strings and sheet directory.
    pub(crate) fn open(file_name: &str, cfb: &Cfb) -> Result<XlsSpreadsheet, ReadError> {
        let mut reader = cfb.read("Workbook")
            .ok_none_else(|| cfb.read("Book"))?
            .map(Biff8Reader::new)
            .ok_or_else(|| SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?;
        let mut is_1904 = false;
        let mut shared_strings = Vec::new();
        let mut custom_formats: HashMap<String, CellType> = HashMap::new();
        let mut format_indexes: Vec<String> = Vec::new();
        let mut sheets: Vec<(String, usize)> = Vec::new();
        match_biff8_record!(reader => {
            EOF => break,
            FILE_PASS => Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?,
            DATE1904 if reader.read_u16()? == 1 => is_1904 = true,
            CODE_PAGE => {
                let code_page = reader.read_u16()?;
                reader.encoding = codepage::to_encoding(code_page).ok_or(XlsError::CodePageError(code_page))?;
            }
            FORMAT => {
                let id = reader.read_u16()?;
                let format = reader.read_xl_unicode_string()?;
                custom_formats.insert(
                    id.to_string(),
                    CellType::parse_custom_number_format(&format, is_1904),
                );
            }
            XF => {
                reader.skip(2)?;
                let id = reader.read_u16()?;
                format_indexes.push(id.to_string());
            }
            SST => shared_strings = read_shared_string_table(&mut reader).with_prefix("Shared strings")?,
            BOUND_SHEET8 => {
                let pointer = reader.read_usize()?;
                reader.skip(1)?; // hsState
                let sheet_type = reader.read_u8()?;
                let sheet_name = reader.read_short_xl_unicode_string()?;
                // Macro, chart and VBA sheets hold no cell table
                if sheet_type == 0 {
                    sheets.push((sheet_name, pointer));
                }
            }
        });
        if sheets.is_empty() {
            Err(SpreadsheetError::SpreadsheetEmptyError(file_name.to_owned()))?
        }

        Ok(XlsSpreadsheet {
            name: file_name.to_owned(),
            reader,
            shared_strings,
            number_formats: load_number_formats(format_indexes, custom_formats, is_1904),
            sheets,
        })
    }

    fn kind_of(&self, kind: CellKind) -> CellType {
        match kind {
            Either::Left(kind) => kind,
            Either::Right(index) => self.number_formats.get(index).copied().unwrap_or(CellType::Number),
        }
    }

    fn read_sheet(&mut self, sheet_name: &str, pointer: usize) -> Result<Sheet, ReadError> {
        let mut sheet = Sheet::new(sheet_name);
        self.reader.goto(pointer);
        self.reader.next()?;
        while let Some(tag) = self.reader.next()? {
            match tag {
                BOF | EOF => break,
                MUL_RK => {
                    let row = self.reader.read_u16()? as usize;
                    let col_lower_bound = self.reader.read_u16()? as usize;
                    let col_upper_bound = self.reader.get_u16_back(2)? as usize;
                    for col in col_lower_bound..=col_upper_bound {
                        let index = self.reader.read_u16()? as usize;
                        let value = self.reader.read_rk_number()?;
                        let kind = self.kind_of(Either::Right(index));
                        sheet.push(Cell { row, col, kind, value });
                    }
                }
                BOOL_ERR | NUMBER | RK | LABEL_SST | LABEL | FORMULA => {
                    let row = self.reader.read_u16()? as usize;
                    let col = self.reader.read_u16()? as usize;
                    let (kind, value) = match tag {
                        BOOL_ERR => read_bool_or_error_cell(&mut self.reader)?,
                        NUMBER => read_number_cell(&mut self.reader)?,
                        RK => read_rk_cell(&mut self.reader)?,
                        LABEL_SST => read_label_sst_cell(&mut self.reader)?,
                        LABEL => read_label_cell(&mut self.reader)?,
                        _ => read_formula_cell(&mut self.reader)?,
                    };
                    let kind = self.kind_of(kind);
                    // Error values read as blank cells
                    if kind != CellType::Error && !value.is_empty() {
                        sheet.push(Cell { row, col, kind, value });
                    }
                }
                _ => (),
            }
        }
        Ok(sheet)
    }
}

impl Spreadsheet for XlsSpreadsheet {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// The SST record is part of the workbook globals, so the table is already loaded.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, ReadError> {
        Ok(self.shared_strings.clone())
    }

    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, ReadError> {
        let selected: Vec<(String, usize)> = self.sheets
            .iter()
            .filter(|(name, _)| criteria.accept(name))
            .cloned()
            .collect();
        let mut sheets = Vec::with_capacity(selected.len());
        for (sheet_name, pointer) in selected {
            let sheet = self.read_sheet(&sheet_name, pointer)
                .with_prefix(&format!("Sheet '{sheet_name}'"))?;
            sheets.push(sheet);
        }
        Ok(sheets)
    }
}

fn read_shared_string_table(reader: &mut Biff8Reader) -> Result<Vec<String>, ReadError> {
    reader.skip(4)?; // cstTotal
    let count = reader.read_usize()?;
    let mut shared_strings = Vec::with_capacity(count.min(65536));
    for _ in 0..count {
        shared_strings.push(reader.read_xl_unicode_rich_extended_string()?);
    }
    Ok(shared_strings)
}

fn read_bool_or_error_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ReadError> {
    reader.skip(2)?;
    let value = reader.read_u8()?;
    let flag = reader.read_u8()?;
    if flag == 0 {
        Ok((Either::Left(CellType::Boolean), value.to_string()))
    } else {
        Ok((Either::Left(CellType::Error), to_error_value(value).to_owned()))
    }
}

fn read_number_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ReadError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_f64()?;
    Ok((Either::Right(index), value.to_string()))
}

fn read_rk_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ReadError> {
    let index = reader.read_u16()? as usize;
    let value = reader.read_rk_number()?;
    Ok((Either::Right(index), value))
}

fn read_label_sst_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ReadError> {
    reader.skip(2)?;
    let value = reader.read_usize()?;
    Ok((Either::Left(CellType::SharedString), value.to_string()))
}

fn read_label_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ReadError> {
    reader.skip(2)?;
    let value = reader.read_xl_unicode_string()?;
    Ok((Either::Left(CellType::InlineString), value))
}

/// Reads the cached result of a FORMULA record. String results live in the
/// STRING record that follows, possibly after shared/array formula records.
fn read_formula_cell(reader: &mut Biff8Reader) -> Result<(CellKind, String), ReadError> {
    let index = reader.read_u16()? as usize;
    let formula = reader.read_u64()?;
    let is_number = (formula & 0xFFFF000000000000) != 0xFFFF000000000000;
    let flag = formula & 0xFF;
    if is_number {
        Ok((Either::Right(index), f64::from_bits(formula).to_string()))
    } else if flag == 0 {
        loop {
            match reader.next()? {
                Some(STRING) => {
                    let value = reader.read_xl_unicode_string()?;
                    return Ok((Either::Left(CellType::InlineString), value));
                }
                Some(SHR_FMLA | ARRAY | TABLE) => continue,
                _ => Err(XlsError::FormulaValueError(formula))?,
            }
        }
    } else if flag == 1 {
        let value = if (formula & 0xFF0000) > 0 { "1" } else { "0" };
        Ok((Either::Left(CellType::Boolean), value.to_owned()))
    } else if flag == 2 {
        let code = ((formula >> 16) & 0xFF) as u8;
        Ok((Either::Left(CellType::Error), to_error_value(code).to_owned()))
    } else if flag == 3 {
        Ok((Either::Left(CellType::InlineString), String::new()))
    } else {
        Err(XlsError::FormulaValueError(formula))?
    }
}

//! # Spreadsheet Reading
//!
//! Native readers for legacy Excel (`.xls`, an OLE compound file holding a
//! BIFF8 record stream) and Excel 2007+ (`.xlsx`/`.xlsm`, a zip package of XML
//! parts). Both expose the same [`Spreadsheet`] interface, producing raw
//! [`Sheet`]s of typed cells that the workbook layer turns into text rows.
use crate::error::ReadError;
use crate::helpers::cfb::Cfb;
use crate::spreadsheet::xls::XlsSpreadsheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use thiserror::Error;

pub(crate) mod cell;
pub(crate) mod criteria;
pub(crate) mod excel;
pub(crate) mod reference;
pub(crate) mod sheet;
pub(crate) mod xls;
pub(crate) mod xlsx;

use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::sheet::Sheet;

/// Structural problems of a workbook file.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Missing part '{0}' in workbook package")]
    FileError(String),

    #[error("Workbook '{0}' contains no sheets")]
    SpreadsheetEmptyError(String),

    #[error("Workbook '{0}' is password protected")]
    SpreadsheetPasswordProtectedError(String),

    #[error("Cannot detect spreadsheet format of '{0}'")]
    UnknownFormatError(String),
}

/// Zip local file header magic.
const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// A workbook opened for reading.
pub(crate) trait Spreadsheet {
    /// Name of the source file, used in messages
    fn name(&self) -> String;

    /// Names of all worksheets in workbook order.
    fn sheet_names(&self) -> Vec<String>;

    /// Loads the shared string table that `CellType::SharedString` values index into.
    fn load_shared_strings(&mut self) -> Result<Vec<String>, ReadError>;

    /// Reads the worksheets accepted by `criteria`, in workbook order.
    fn read_sheets(&mut self, criteria: &Criteria) -> Result<Vec<Sheet>, ReadError>;
}

/// Opens an in-memory workbook, detecting its format from the leading bytes.
///
/// # Arguments
/// * `file_name` - Source name used in error messages
/// * `data` - Complete file contents
///
/// # Errors
/// Fails for unknown formats, encrypted packages and workbooks without sheets.
pub(crate) fn open_spreadsheet(file_name: &str, data: Vec<u8>) -> Result<Box<dyn Spreadsheet>, ReadError> {
    if data.starts_with(ZIP_SIGNATURE) {
        Ok(Box::new(XlsxSpreadsheet::open(file_name, data)?))
    } else if Cfb::is_compound_file(&data) {
        let cfb = Cfb::new(data)?;
        if cfb.exists("EncryptedPackage") {
            // Encrypted xlsx packages are wrapped in a compound file
            Err(SpreadsheetError::SpreadsheetPasswordProtectedError(file_name.to_owned()))?
        }
        Ok(Box::new(XlsSpreadsheet::open(file_name, &cfb)?))
    } else {
        Err(SpreadsheetError::UnknownFormatError(file_name.to_owned()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_formats() {
        let result = open_spreadsheet("notes.txt", b"name,phone\n".to_vec());
        assert!(matches!(
            result,
            Err(ReadError::SpreadsheetError(SpreadsheetError::UnknownFormatError(_)))
        ));
    }

    #[test]
    fn rejects_truncated_zip() {
        assert!(open_spreadsheet("broken.xlsx", b"PK\x03\x04garbage".to_vec()).is_err());
    }
}

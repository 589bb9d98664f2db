use std::path::PathBuf;
use thiserror::Error;

/// Failure raised while decoding a workbook file.
/// Aggregates errors from the standard library, the container/XML crates and the reader helpers.
#[derive(Error, Debug)]
pub enum ReadError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    // Helper module errors
    #[error("{0}")]
    CfbHelperError(#[from] crate::helpers::cfb::CfbError),

    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    #[error("{0}")]
    Biff8HelperError(#[from] crate::helpers::biff8::Biff8Error),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    XlsError(#[from] crate::spreadsheet::xls::XlsError),
}

/// Errors surfaced to callers of the directory pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum DirectoryError {
    /// The source path does not name an existing file.
    #[error("Source file '{}' not found", path.display())]
    SourceNotFound { path: PathBuf },

    /// The file exists but is not a readable workbook.
    #[error("Cannot read workbook '{}': {source}", path.display())]
    UnreadableSource {
        path: PathBuf,
        #[source]
        source: ReadError,
    },

    /// No sheet of the workbook matches a schema's target names.
    /// The builder only logs this and returns an empty list for the schema.
    #[error("Workbook has no sheet named {sheets:?} for schema '{schema}'")]
    SchemaMismatch { schema: String, sheets: Vec<String> },

    #[error("Cannot access '{}': {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration '{}': {message}", path.display())]
    Config { path: PathBuf, message: String },
}

pub(crate) trait ResultOptionChain {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self;
}

impl<T, E> ResultOptionChain for Result<Option<T>, E> {
    fn ok_none_else<F>(self, f: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        match self {
            Ok(None) => f(),
            _ => self,
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, ReadError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| ReadError::WithContextError(format!("{}: {}", message, e)))
    }
}

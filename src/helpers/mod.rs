//! Low-level readers shared by the workbook formats: the OLE compound file
//! container and BIFF8 record stream of `.xls`, and the zip/XML parts of `.xlsx`.
pub(crate) mod biff8;
pub(crate) mod bytes;
pub(crate) mod cfb;
pub(crate) mod xml;
pub(crate) mod zip;

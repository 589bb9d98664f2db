//! # Staff Directory
//!
//! Extracts a clean phone directory from a hand-maintained spreadsheet. The
//! source workbook has inconsistent headers, department labels written into
//! data rows, and blank or merged cells. The output is two uniform record lists:
//!
//! - [`StaffRecord`]s of the organizational unit (sheet `ОСФР`);
//! - [`ClientServiceRecord`]s of the client services (sheet `Клиентские службы`).
//!
//! ## Pipeline
//!
//! 1. [`load_workbook`] reads `.xls` (BIFF8) or `.xlsx` files natively into
//!    sheets of string rows, labelling columns from the first row.
//! 2. [`annotate`] attaches section labels, either inline or carried down from
//!    label rows.
//! 3. [`map_records`] keeps rows with a filled required column, renames
//!    columns, formats phone numbers with [`format_phone`] and drops the
//!    header remains.
//! 4. [`DirectoryBuilder`] runs the steps for both [`Schema`]s and returns a
//!    [`DirectorySnapshot`], plus any schema whose sheets were missing.
//!
//! Around the pipeline sit [`SnapshotStore`] (JSON persistence), [`Query`]
//! (search and department filter) and [`export_sheets`] (per-sheet dump).
//!
//! ```no_run
//! use staff_directory::{DirectoryBuilder, Query, SnapshotStore};
//!
//! let snapshot = DirectoryBuilder::default().build("telef.xls")?.snapshot;
//! SnapshotStore::new("JSON").save(&snapshot)?;
//! for record in Query::text("иванов").apply(&snapshot.staff) {
//!     println!("{} {}", record.last_name, record.external_phone);
//! }
//! # Ok::<(), staff_directory::DirectoryError>(())
//! ```
mod builder;
mod config;
mod error;
mod export;
mod filter;
mod helpers;
mod mapper;
mod phone;
mod record;
mod schema;
mod section;
mod spreadsheet;
mod storage;
mod workbook;

pub use crate::builder::extract;
pub use crate::builder::BuildOutcome;
pub use crate::builder::DirectoryBuilder;
pub use crate::config::Config;
pub use crate::error::DirectoryError;
pub use crate::error::ReadError;
pub use crate::export::export_sheets;
pub use crate::export::safe_file_stem;
pub use crate::export::ConversionStats;
pub use crate::export::SheetStats;
pub use crate::filter::departments;
pub use crate::filter::Entry;
pub use crate::filter::Field;
pub use crate::filter::Query;
pub use crate::mapper::map_records;
pub use crate::mapper::Record;
pub use crate::phone::format_phone;
pub use crate::record::ClientServiceRecord;
pub use crate::record::DirectorySnapshot;
pub use crate::record::StaffRecord;
pub use crate::schema::ColumnMapping;
pub use crate::schema::Schema;
pub use crate::section::annotate;
pub use crate::section::SectionMode;
pub use crate::section::SectionedRow;
pub use crate::spreadsheet::criteria::Criteria;
pub use crate::storage::SnapshotStore;
pub use crate::workbook::load_workbook;
pub use crate::workbook::load_workbook_with;
pub use crate::workbook::Row;
pub use crate::workbook::Workbook;
pub use crate::workbook::Worksheet;

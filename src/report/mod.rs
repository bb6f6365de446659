//! Workbook export: projects a plan snapshot into a multi-sheet artifact.

pub mod workbook;

pub use workbook::{SHEET_FILES, write_workbook};

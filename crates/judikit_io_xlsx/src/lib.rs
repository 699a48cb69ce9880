//! `judikit_io_xlsx` v1:
//! Rust-side spreadsheet I/O kernel for quarterly report workbooks.
//!
//! Module layout:
//! - `conf`   : constants and default presets
//! - `spec`   : cell/format/report models
//! - `util`   : pure helper functions
//! - `reader` : `.xls`/`.xlsx` decoding into raw grids
//! - `writer` : pure-Rust workbook writer
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL};
pub use reader::{SpecSheetGrid, read_workbook_grids};
pub use spec::{
    EnumCellValue, SpecCellFormat, SpecSheetHorizontalMerge, SpecSheetWriteOptions,
    SpecXlsxReport, TypeRawGrid,
};
pub use util::{
    derive_horizontal_merge_tracker, plan_row_run_merges, sanitize_sheet_name,
};
pub use writer::XlsxWriter;

//! Fixed report layout schema and output naming constants.

/// Rows `[0, 19)` form the verbatim header block.
pub const N_HEADER_ROW_COUNT: usize = 19;
/// Row holding the column sub-headers.
pub const N_ROW_IDX_SUBHEADER: usize = N_HEADER_ROW_COUNT;
/// Minimum row count of a qualifying sheet.
pub const N_QUALIFYING_ROWS_MIN: usize = N_HEADER_ROW_COUNT + 1;
/// First-column marker of the total row.
pub const C_TOTAL_MARKER: &str = "Total";

/// Result sheets: styling starts at worksheet row 19 (1-based), the last
/// header row, which carries the column-group labels.
pub const N_ROW_IDX_RESULT_STYLED_START: usize = N_HEADER_ROW_COUNT - 1;
/// Result sheets: row scanned for column-group merges.
pub const N_ROW_IDX_RESULT_MERGE: usize = N_ROW_IDX_RESULT_STYLED_START;
/// Result sheets: first column of the merge scan.
pub const N_COL_IDX_RESULT_MERGE_START: usize = 0;

/// Canonical quarter words, in reporting order.
pub const TUP_QUARTER_WORDS: [&str; 4] = ["Primer", "Segundo", "Tercer", "Cuarto"];
/// Canonical quarter names, in reporting order.
pub const TUP_QUARTER_NAMES: [&str; 4] = [
    "Primer Trimestre",
    "Segundo Trimestre",
    "Tercer Trimestre",
    "Cuarto Trimestre",
];
/// Separator between a quarter name and its part number.
pub const C_PART_SEPARATOR: char = '_';
/// Quarter file name pattern: `<Word> Trimestre[_<n>]`.
pub const C_QUARTER_FILE_NAME_PATTERN: &str = r"^(\w+) Trimestre_?(\d+)?";

/// Default input file patterns (matched against base names).
pub const TUP_INPUT_PATTERNS_DEFAULT: [&str; 2] = ["*Trimestre*.xls", "*Trimestre*.xlsx"];
/// Suffix appended to the source file stem for per-file results.
pub const C_RESULT_FILE_SUFFIX: &str = "_results.xlsx";
/// Consolidated workbook file name.
pub const C_CONSOLIDATED_FILE_NAME: &str = "Consolidado.xlsx";
/// Timestamp format of the per-run output directory.
pub const C_RUN_DIR_TIME_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

//! Quarter keys, extraction models, run options and top-level error types.

use std::fmt;
use std::path::PathBuf;

use judikit_io_xlsx::{EnumCellValue, TypeRawGrid};

use crate::conf::TUP_INPUT_PATTERNS_DEFAULT;

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Behavior of the quarter key resolver on names outside the canonical pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumQuarterKeyMode {
    /// Unmatched names get key `(0, 0)` and sort first.
    #[default]
    Lenient,
    /// Unmatched names are an error.
    Strict,
}

/// Which quarters get a row in the aggregate-by-quarter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumQuarterAggregateRule {
    /// Only quarters with more than one contributing row.
    #[default]
    MultiPartOnly,
    /// Every quarter with at least one contributing row.
    AllQuarters,
}

/// Why a sheet was not extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumNotQualifiedReason {
    /// Fewer rows than the fixed layout needs.
    TooFewRows {
        /// Row count actually read.
        n_rows: usize,
    },
    /// No row carries the total marker in its first cell.
    MissingTotalRow,
}

impl fmt::Display for EnumNotQualifiedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooFewRows { n_rows } => write!(f, "too few rows ({n_rows})"),
            Self::MissingTotalRow => write!(f, "no \"Total\" row"),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region QuarterKey

/// Ordering key of one quarterly file: `(quarter_idx, part_idx)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SpecQuarterKey {
    /// `0` for "Primer" up to `3` for "Cuarto".
    pub quarter_idx: usize,
    /// Numeric part suffix; `0` when absent.
    pub part_idx: usize,
}

impl SpecQuarterKey {
    pub fn new(quarter_idx: usize, part_idx: usize) -> Self {
        Self {
            quarter_idx,
            part_idx,
        }
    }
}

impl fmt::Display for SpecQuarterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.quarter_idx, self.part_idx)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Extraction

/// The three regions sliced out of a qualifying sheet.
///
/// All rows share the width of `subheader_row`.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetRegions {
    /// Rows `[0, 19)` verbatim.
    pub header_rows: TypeRawGrid,
    /// Row 19 with its first cell blanked.
    pub subheader_row: Vec<EnumCellValue>,
    /// First row marked `"Total"`, first cell normalized to the marker.
    pub total_row: Vec<EnumCellValue>,
    /// Index of the total row in the source grid.
    pub total_row_idx: usize,
}

impl SpecSheetRegions {
    /// Common width of the three regions.
    pub fn width(&self) -> usize {
        self.subheader_row.len()
    }
}

/// Result of running the validator/extractor over one grid.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumExtractOutcome {
    Extracted(SpecSheetRegions),
    NotQualified(EnumNotQualifiedReason),
}

/// One extracted sheet tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecExtractedSheet {
    /// Source sheet name.
    pub sheet_name: String,
    /// Quarter key of the source file.
    pub quarter_key: SpecQuarterKey,
    pub regions: SpecSheetRegions,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region StructsAndErrors

/// Input options for `analyze_files` / `analyze_directory`.
#[derive(Debug, Clone)]
pub struct SpecAnalyzeOptions {
    /// Glob patterns applied to file basename (directory runs only).
    pub patterns_include_files: Vec<String>,
    /// Quarter key resolution behavior.
    pub rule_quarter_key: EnumQuarterKeyMode,
    /// Aggregate-by-quarter table behavior.
    pub rule_quarter_aggregate: EnumQuarterAggregateRule,
    /// Write results under a timestamped run subdirectory.
    pub if_timestamped_subdir: bool,
    /// Read and consolidate, but write no workbook.
    pub if_dry_run: bool,
}

impl Default for SpecAnalyzeOptions {
    fn default() -> Self {
        Self {
            patterns_include_files: TUP_INPUT_PATTERNS_DEFAULT
                .iter()
                .map(|p| p.to_string())
                .collect(),
            rule_quarter_key: EnumQuarterKeyMode::Lenient,
            rule_quarter_aggregate: EnumQuarterAggregateRule::MultiPartOnly,
            if_timestamped_subdir: true,
            if_dry_run: false,
        }
    }
}

/// One per-file or per-sheet failure recorded in a run report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAnalysisError {
    /// Source file or destination workbook path.
    pub path: PathBuf,
    /// Sheet the failure is scoped to, if any.
    pub sheet_name: Option<String>,
    /// User-facing error text.
    pub exception: String,
}

/// Errors of the resolver/aggregator/assembler and "top-level call failed"
/// errors of a run.
#[derive(Debug, Clone, PartialEq)]
pub enum StatsError {
    /// Leading word of a quarter file name is not a canonical quarter word.
    UnrecognizedQuarter {
        /// Name being resolved.
        name: String,
        /// Offending leading word.
        word: String,
    },
    /// Name does not follow `<Word> Trimestre[_<n>]` (strict mode only).
    QuarterPatternMismatch {
        /// Name being resolved.
        name: String,
    },
    /// A file or one of its sheets could not be decoded.
    ReadFailure {
        path: PathBuf,
        /// `None` when the whole file failed to open.
        sheet: Option<String>,
        message: String,
    },
    /// Non-numeric cell met while summing a quarter column.
    AggregationType {
        sheet: String,
        col_idx: usize,
        /// Label of the contributing row holding the cell.
        source_label: String,
        /// Offending cell text.
        value: String,
    },
    /// A workbook could not be persisted.
    WriteFailure { path: PathBuf, message: String },
    /// Invalid include pattern.
    InvalidPattern(String),
    /// Source path is not a directory.
    SourceNotDirectory(PathBuf),
    /// Destination directory initialization failed.
    DestinationInitFailed {
        /// Destination path that failed initialization.
        path: PathBuf,
        /// Underlying IO error text.
        message: String,
    },
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnrecognizedQuarter { name, word } => {
                write!(f, "Unrecognized quarter {word:?} in file name {name:?}")
            }
            Self::QuarterPatternMismatch { name } => write!(
                f,
                "File name {name:?} does not match \"<Quarter> Trimestre[_<n>]\""
            ),
            Self::ReadFailure {
                path,
                sheet: Some(sheet),
                message,
            } => write!(
                f,
                "Failed to read sheet {sheet:?} of {}: {message}",
                path.display()
            ),
            Self::ReadFailure {
                path,
                sheet: None,
                message,
            } => write!(f, "Failed to read {}: {message}", path.display()),
            Self::AggregationType {
                sheet,
                col_idx,
                source_label,
                value,
            } => write!(
                f,
                "Non-numeric value {value:?} in sheet {sheet:?}, column {col_idx}, row {source_label:?}"
            ),
            Self::WriteFailure { path, message } => {
                write!(f, "Failed to write {}: {message}", path.display())
            }
            Self::InvalidPattern(msg) => write!(f, "{msg}"),
            Self::SourceNotDirectory(path) => {
                write!(f, "Source is not a directory: {}", path.display())
            }
            Self::DestinationInitFailed { path, message } => {
                write!(
                    f,
                    "Failed to initialize destination {}: {message}",
                    path.display()
                )
            }
        }
    }
}

impl std::error::Error for StatsError {}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_key_orders_by_quarter_then_part() {
        let mut l_keys = vec![
            SpecQuarterKey::new(2, 0),
            SpecQuarterKey::new(0, 1),
            SpecQuarterKey::new(2, 1),
            SpecQuarterKey::new(0, 0),
        ];
        l_keys.sort();
        assert_eq!(
            l_keys,
            vec![
                SpecQuarterKey::new(0, 0),
                SpecQuarterKey::new(0, 1),
                SpecQuarterKey::new(2, 0),
                SpecQuarterKey::new(2, 1),
            ]
        );
    }

    #[test]
    fn test_analyze_options_default() {
        let options = SpecAnalyzeOptions::default();
        assert_eq!(
            options.patterns_include_files,
            vec!["*Trimestre*.xls".to_string(), "*Trimestre*.xlsx".to_string()]
        );
        assert_eq!(options.rule_quarter_key, EnumQuarterKeyMode::Lenient);
        assert_eq!(
            options.rule_quarter_aggregate,
            EnumQuarterAggregateRule::MultiPartOnly
        );
        assert!(options.if_timestamped_subdir);
        assert!(!options.if_dry_run);
    }

    #[test]
    fn test_stats_error_display_names_location() {
        let err = StatsError::AggregationType {
            sheet: "Civil".to_string(),
            col_idx: 3,
            source_label: "Tercer Trimestre_2".to_string(),
            value: "n/a".to_string(),
        };
        let txt = err.to_string();
        assert!(txt.contains("\"Civil\""));
        assert!(txt.contains("column 3"));
        assert!(txt.contains("Tercer Trimestre_2"));

        let err = StatsError::ReadFailure {
            path: PathBuf::from("a.xls"),
            sheet: None,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Failed to read a.xls: boom");
    }
}

//! `judikit_stats` v1:
//! Quarterly judicial-activity report consolidation kernel.
//!
//! Module layout:
//! - `conf`        : fixed report layout schema and naming constants
//! - `spec`        : keys/options/errors
//! - `quarter`     : quarter key resolution and ordering
//! - `extract`     : sheet validation and region extraction
//! - `consolidate` : per-sheet accumulation and quarter aggregation
//! - `assemble`    : result/consolidated workbook assembly
//! - `report`      : run-time report model
//! - `analyze`     : file-system run orchestration

pub mod analyze;
pub mod assemble;
pub mod conf;
pub mod consolidate;
pub mod extract;
pub mod quarter;
pub mod report;
pub mod spec;

pub use analyze::{analyze_directory, analyze_files};
pub use assemble::{
    SpecAssembledSheet, assemble_consolidated_sheet, assemble_consolidated_workbook,
    assemble_result_workbook, derive_result_grid,
};
pub use consolidate::{
    BuilderConsolidation, SpecConsolidatedRow, SpecConsolidatedSheet, derive_quarter_aggregates,
};
pub use extract::extract_sheet;
pub use quarter::{resolve_quarter_key, sort_file_names};
pub use report::{ReportAnalysis, ReportAnalysisBuilder};
pub use spec::{
    EnumExtractOutcome, EnumNotQualifiedReason, EnumQuarterAggregateRule, EnumQuarterKeyMode,
    SpecAnalysisError, SpecAnalyzeOptions, SpecExtractedSheet, SpecQuarterKey, SpecSheetRegions,
    StatsError,
};

//! Analysis run report model and mutable report builder.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::spec::SpecAnalysisError;

/// Aggregate counters and diagnostics for one analysis run.
#[derive(Debug, Default, Clone)]
pub struct ReportAnalysis {
    /// Input files selected for the run.
    pub cnt_files_matched: u64,
    /// Input files opened and scanned.
    pub cnt_files_processed: u64,
    /// Sheets read across all files.
    pub cnt_sheets_scanned: u64,
    /// Sheets that passed validation and were extracted.
    pub cnt_sheets_extracted: u64,
    /// Sheets skipped as not qualifying.
    pub cnt_sheets_skipped: u64,
    /// Workbooks persisted to disk; stays 0 on dry-run.
    pub cnt_workbooks_written: u64,
    /// Paths of persisted workbooks.
    pub files_written: Vec<PathBuf>,
    /// Non-fatal warnings collected during the run.
    pub warnings: Vec<String>,
    /// Per-file and per-sheet failures.
    pub errors: Vec<SpecAnalysisError>,
}

impl ReportAnalysis {
    /// Number of collected hard errors.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of collected warnings.
    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    /// Machine-readable counters.
    pub fn to_dict(&self) -> BTreeMap<String, u64> {
        let mut dict_counts = BTreeMap::new();
        dict_counts.insert("cnt_files_matched".to_string(), self.cnt_files_matched);
        dict_counts.insert("cnt_files_processed".to_string(), self.cnt_files_processed);
        dict_counts.insert("cnt_sheets_scanned".to_string(), self.cnt_sheets_scanned);
        dict_counts.insert("cnt_sheets_extracted".to_string(), self.cnt_sheets_extracted);
        dict_counts.insert("cnt_sheets_skipped".to_string(), self.cnt_sheets_skipped);
        dict_counts.insert(
            "cnt_workbooks_written".to_string(),
            self.cnt_workbooks_written,
        );
        dict_counts.insert("cnt_errors".to_string(), self.error_count() as u64);
        dict_counts.insert("cnt_warnings".to_string(), self.warning_count() as u64);
        dict_counts
    }

    /// Human-readable one-line summary.
    pub fn format(&self, prefix: &str) -> String {
        let dict_counts = self.to_dict();
        format!(
            "{prefix} files={}/{} sheets={}/{} skipped={} written={} errors={} warnings={}",
            dict_counts["cnt_files_processed"],
            dict_counts["cnt_files_matched"],
            dict_counts["cnt_sheets_extracted"],
            dict_counts["cnt_sheets_scanned"],
            dict_counts["cnt_sheets_skipped"],
            dict_counts["cnt_workbooks_written"],
            dict_counts["cnt_errors"],
            dict_counts["cnt_warnings"]
        )
    }
}

impl fmt::Display for ReportAnalysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format("[ANALYZE]"))
    }
}

/// Mutable accumulator for analysis statistics.
#[derive(Debug, Default, Clone)]
pub struct ReportAnalysisBuilder {
    /// See [`ReportAnalysis::cnt_files_matched`].
    pub cnt_files_matched: u64,
    /// See [`ReportAnalysis::cnt_files_processed`].
    pub cnt_files_processed: u64,
    /// See [`ReportAnalysis::cnt_sheets_scanned`].
    pub cnt_sheets_scanned: u64,
    /// See [`ReportAnalysis::cnt_sheets_extracted`].
    pub cnt_sheets_extracted: u64,
    /// See [`ReportAnalysis::cnt_sheets_skipped`].
    pub cnt_sheets_skipped: u64,
    /// See [`ReportAnalysis::cnt_workbooks_written`].
    pub cnt_workbooks_written: u64,
    /// See [`ReportAnalysis::files_written`].
    pub files_written: Vec<PathBuf>,
    /// See [`ReportAnalysis::warnings`].
    pub warnings: Vec<String>,
    /// See [`ReportAnalysis::errors`].
    pub errors: Vec<SpecAnalysisError>,
}

impl ReportAnalysisBuilder {
    /// Record the number of input files selected for the run.
    pub fn add_files_matched(&mut self, n_files: u64) {
        self.cnt_files_matched += n_files;
    }

    pub fn add_file_processed(&mut self) {
        self.cnt_files_processed += 1;
    }

    pub fn add_sheet_scanned(&mut self) {
        self.cnt_sheets_scanned += 1;
    }

    pub fn add_sheet_extracted(&mut self) {
        self.cnt_sheets_extracted += 1;
    }

    pub fn add_sheet_skipped(&mut self) {
        self.cnt_sheets_skipped += 1;
    }

    /// Record one persisted workbook.
    pub fn add_written(&mut self, path: PathBuf) {
        self.cnt_workbooks_written += 1;
        self.files_written.push(path);
    }

    /// Add warning message.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }

    /// Add one path-scoped (and optionally sheet-scoped) error.
    pub fn add_error(&mut self, path: PathBuf, sheet_name: Option<String>, exception: String) {
        self.errors.push(SpecAnalysisError {
            path,
            sheet_name,
            exception,
        });
    }

    /// Finalize builder into immutable report.
    pub fn build(self) -> ReportAnalysis {
        ReportAnalysis {
            cnt_files_matched: self.cnt_files_matched,
            cnt_files_processed: self.cnt_files_processed,
            cnt_sheets_scanned: self.cnt_sheets_scanned,
            cnt_sheets_extracted: self.cnt_sheets_extracted,
            cnt_sheets_skipped: self.cnt_sheets_skipped,
            cnt_workbooks_written: self.cnt_workbooks_written,
            files_written: self.files_written,
            warnings: self.warnings,
            errors: self.errors,
        }
    }
}

//! File-system run orchestration: read, extract, consolidate, write.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::Local;
use globset::{Glob, GlobSet, GlobSetBuilder};
use judikit_io_xlsx::{XlsxWriter, read_workbook_grids};
use tracing::{debug, info, warn};

use crate::assemble::{
    SpecAssembledSheet, assemble_consolidated_sheet, assemble_consolidated_workbook,
    assemble_result_workbook,
};
use crate::conf::{C_CONSOLIDATED_FILE_NAME, C_RESULT_FILE_SUFFIX, C_RUN_DIR_TIME_FORMAT};
use crate::consolidate::BuilderConsolidation;
use crate::extract::extract_sheet;
use crate::quarter::resolve_quarter_key;
use crate::report::{ReportAnalysis, ReportAnalysisBuilder};
use crate::spec::{
    EnumExtractOutcome, EnumQuarterKeyMode, SpecAnalyzeOptions, SpecExtractedSheet,
    SpecQuarterKey, StatsError,
};

/// Run state shared by the per-file steps.
struct SpecAnalyzeContext {
    path_dir_out: PathBuf,
    spec_options: SpecAnalyzeOptions,
    builder_consolidation: BuilderConsolidation,
    builder_report: ReportAnalysisBuilder,
    /// Per-file output paths already claimed in this run.
    set_paths_out_used: BTreeSet<PathBuf>,
}

/// Analyze every matching quarterly workbook directly under `dir_source`.
///
/// Regular files whose base name matches `patterns_include_files` are
/// selected (no recursion) and handed to [`analyze_files`].
pub fn analyze_directory<P, Q>(
    dir_source: P,
    dir_destination: Q,
    spec_options: SpecAnalyzeOptions,
) -> Result<ReportAnalysis, StatsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let path_dir_src = dir_source.as_ref().to_path_buf();
    if !path_dir_src.is_dir() {
        return Err(StatsError::SourceNotDirectory(path_dir_src));
    }
    let glob_set = compile_include_patterns(&spec_options.patterns_include_files)?;

    let entries = fs::read_dir(&path_dir_src).map_err(|e| StatsError::ReadFailure {
        path: path_dir_src.clone(),
        sheet: None,
        message: e.to_string(),
    })?;

    let mut builder_report = ReportAnalysisBuilder::default();
    let l_paths = select_input_files(
        entries.map(|entry| entry.map(|entry| entry.path())),
        glob_set.as_ref(),
        &mut builder_report,
    );
    debug!(dir = %path_dir_src.display(), count = l_paths.len(), "selected input files");

    run_analysis(&l_paths, dir_destination.as_ref(), spec_options, builder_report)
}

/// Analyze the given quarterly workbooks.
///
/// This function performs:
/// 1. Quarter key resolution (strict mode fails before any file is read).
/// 2. Ordering by `(quarter key, file name)`.
/// 3. Per file: read, extract qualifying sheets, write `<stem>_results.xlsx`
///    and feed the consolidation builder with the file stem as label.
/// 4. Assembly and write of `Consolidado.xlsx`.
///
/// Per-file and per-sheet failures are recorded in the returned report.
/// Returns [`StatsError`] only for setup failures.
pub fn analyze_files<P, Q>(
    paths: &[P],
    dir_destination: Q,
    spec_options: SpecAnalyzeOptions,
) -> Result<ReportAnalysis, StatsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    run_analysis(
        paths,
        dir_destination.as_ref(),
        spec_options,
        ReportAnalysisBuilder::default(),
    )
}

fn run_analysis<P: AsRef<Path>>(
    paths: &[P],
    dir_destination: &Path,
    spec_options: SpecAnalyzeOptions,
    mut builder_report: ReportAnalysisBuilder,
) -> Result<ReportAnalysis, StatsError> {
    let mut l_keyed: Vec<(SpecQuarterKey, String, PathBuf)> = Vec::with_capacity(paths.len());
    for path in paths {
        let path = path.as_ref();
        let c_name = derive_file_name(path);
        match resolve_quarter_key(&c_name, spec_options.rule_quarter_key) {
            Ok(key) => l_keyed.push((key, c_name, path.to_path_buf())),
            Err(e) if spec_options.rule_quarter_key == EnumQuarterKeyMode::Strict => {
                return Err(e);
            }
            Err(e) => {
                warn!(file = %c_name, error = %e, "skipping file");
                builder_report.add_error(path.to_path_buf(), None, e.to_string());
            }
        }
    }
    l_keyed.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    builder_report.add_files_matched(l_keyed.len() as u64);

    let path_dir_out = derive_run_output_dir(dir_destination, spec_options.if_timestamped_subdir);
    if !spec_options.if_dry_run {
        fs::create_dir_all(&path_dir_out).map_err(|e| StatsError::DestinationInitFailed {
            path: path_dir_out.clone(),
            message: e.to_string(),
        })?;
    }
    info!(
        files = l_keyed.len(),
        dir_out = %path_dir_out.display(),
        dry_run = spec_options.if_dry_run,
        "analysis started"
    );

    let mut spec_ctx = SpecAnalyzeContext {
        path_dir_out,
        spec_options,
        builder_consolidation: BuilderConsolidation::new(),
        builder_report,
        set_paths_out_used: BTreeSet::new(),
    };

    for (quarter_key, c_name, path) in &l_keyed {
        process_file(path, c_name, *quarter_key, &mut spec_ctx);
    }
    write_consolidated(&mut spec_ctx);

    let report = spec_ctx.builder_report.build();
    info!("{report}");
    Ok(report)
}

/// `<dir_destination>/<YYYY-MM-DD_HH-MM-SS>` or `dir_destination` itself.
pub fn derive_run_output_dir(dir_destination: &Path, if_timestamped_subdir: bool) -> PathBuf {
    if if_timestamped_subdir {
        dir_destination.join(Local::now().format(C_RUN_DIR_TIME_FORMAT).to_string())
    } else {
        dir_destination.to_path_buf()
    }
}

/// Keep regular files whose base name matches `glob_set`.
///
/// Entries that cannot be read are recorded as warnings and skipped.
fn select_input_files<I>(
    entries: I,
    glob_set: Option<&GlobSet>,
    builder_report: &mut ReportAnalysisBuilder,
) -> Vec<PathBuf>
where
    I: IntoIterator<Item = io::Result<PathBuf>>,
{
    let mut l_paths = Vec::new();
    for entry in entries {
        let path_entry = match entry {
            Ok(path_entry) => path_entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                builder_report.add_warning(format!("Unreadable directory entry skipped: {e}"));
                continue;
            }
        };
        if !path_entry.is_file() {
            continue;
        }
        let c_name = derive_file_name(&path_entry);
        if glob_set.is_none_or(|set| set.is_match(&c_name)) {
            l_paths.push(path_entry);
        }
    }
    l_paths
}

fn compile_include_patterns(patterns: &[String]) -> Result<Option<GlobSet>, StatsError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern).map_err(|e| {
            StatsError::InvalidPattern(format!("Invalid pattern in include: {e}"))
        })?;
        builder.add(glob);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| StatsError::InvalidPattern(format!("Invalid pattern in include: {e}")))
}

fn derive_file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn derive_source_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn process_file(
    path: &Path,
    c_name: &str,
    quarter_key: SpecQuarterKey,
    spec_ctx: &mut SpecAnalyzeContext,
) {
    info!(file = %c_name, key = %quarter_key, "processing file");

    let l_sheets = match read_workbook_grids(path) {
        Ok(l_sheets) => l_sheets,
        Err(message) => {
            let err = StatsError::ReadFailure {
                path: path.to_path_buf(),
                sheet: None,
                message,
            };
            warn!(file = %c_name, error = %err, "skipping unreadable file");
            spec_ctx
                .builder_report
                .add_error(path.to_path_buf(), None, err.to_string());
            return;
        }
    };
    spec_ctx.builder_report.add_file_processed();

    let mut l_extracted = Vec::new();
    for sheet in l_sheets {
        spec_ctx.builder_report.add_sheet_scanned();
        let grid = match sheet.grid {
            Ok(grid) => grid,
            Err(message) => {
                let err = StatsError::ReadFailure {
                    path: path.to_path_buf(),
                    sheet: Some(sheet.sheet_name.clone()),
                    message,
                };
                warn!(file = %c_name, sheet = %sheet.sheet_name, error = %err, "skipping unreadable sheet");
                spec_ctx.builder_report.add_error(
                    path.to_path_buf(),
                    Some(sheet.sheet_name),
                    err.to_string(),
                );
                continue;
            }
        };

        match extract_sheet(&grid) {
            EnumExtractOutcome::Extracted(regions) => {
                debug!(file = %c_name, sheet = %sheet.sheet_name, total_row_idx = regions.total_row_idx, "sheet extracted");
                spec_ctx.builder_report.add_sheet_extracted();
                l_extracted.push(SpecExtractedSheet {
                    sheet_name: sheet.sheet_name,
                    quarter_key,
                    regions,
                });
            }
            EnumExtractOutcome::NotQualified(reason) => {
                debug!(file = %c_name, sheet = %sheet.sheet_name, %reason, "sheet not qualified");
                spec_ctx.builder_report.add_sheet_skipped();
            }
        }
    }

    if l_extracted.is_empty() {
        warn!(file = %c_name, "no qualifying sheet");
        spec_ctx
            .builder_report
            .add_warning(format!("No qualifying sheet in {c_name}; no result workbook."));
        return;
    }

    let c_label = derive_source_label(path);
    for extracted in &l_extracted {
        spec_ctx.builder_consolidation.accumulate(extracted, &c_label);
    }

    let path_file_out = derive_result_path(&c_label, c_name, spec_ctx);
    let writer = assemble_result_workbook(path_file_out, &l_extracted);
    commit_workbook(writer, spec_ctx);
}

/// `<label>_results.xlsx`, or `<label>__N_results.xlsx` when an earlier
/// file of the run already claimed that name.
fn derive_result_path(c_label: &str, c_name: &str, spec_ctx: &mut SpecAnalyzeContext) -> PathBuf {
    let path_file_out = spec_ctx
        .path_dir_out
        .join(format!("{c_label}{C_RESULT_FILE_SUFFIX}"));
    if spec_ctx.set_paths_out_used.insert(path_file_out.clone()) {
        return path_file_out;
    }

    let mut n_idx = 2usize;
    loop {
        let candidate = spec_ctx
            .path_dir_out
            .join(format!("{c_label}__{n_idx}{C_RESULT_FILE_SUFFIX}"));
        if spec_ctx.set_paths_out_used.insert(candidate.clone()) {
            warn!(file = %c_name, path = %candidate.display(), "result name already used; renamed");
            spec_ctx.builder_report.add_warning(format!(
                "Result workbook {} already used; {c_name} written to {}.",
                path_file_out.display(),
                candidate.display()
            ));
            return candidate;
        }
        n_idx += 1;
    }
}

fn write_consolidated(spec_ctx: &mut SpecAnalyzeContext) {
    if spec_ctx.builder_consolidation.is_empty() {
        warn!("no qualifying sheet in any file; consolidated workbook skipped");
        spec_ctx.builder_report.add_warning(
            "No qualifying sheet in any file; consolidated workbook skipped.".to_string(),
        );
        return;
    }

    let path_file_out = spec_ctx.path_dir_out.join(C_CONSOLIDATED_FILE_NAME);
    let l_assembled: Vec<SpecAssembledSheet> = spec_ctx
        .builder_consolidation
        .sheets()
        .iter()
        .map(|sheet| {
            assemble_consolidated_sheet(sheet, spec_ctx.spec_options.rule_quarter_aggregate)
        })
        .collect();

    for assembled in &l_assembled {
        if let Some(err) = &assembled.aggregate_error {
            warn!(sheet = %assembled.sheet_name, error = %err, "aggregate table dropped");
            spec_ctx.builder_report.add_error(
                path_file_out.clone(),
                Some(assembled.sheet_name.clone()),
                err.to_string(),
            );
        }
    }

    let writer = assemble_consolidated_workbook(path_file_out, &l_assembled);
    commit_workbook(writer, spec_ctx);
}

fn commit_workbook(writer: Result<XlsxWriter, StatsError>, spec_ctx: &mut SpecAnalyzeContext) {
    let mut writer = match writer {
        Ok(writer) => writer,
        Err(err) => {
            record_write_failure(&err, spec_ctx);
            return;
        }
    };

    for report in writer.report() {
        for c_warning in report.warnings {
            spec_ctx
                .builder_report
                .add_warning(format!("{}: {c_warning}", writer.file_out().display()));
        }
    }

    let path_file_out = writer.file_out().to_path_buf();
    if spec_ctx.spec_options.if_dry_run {
        info!(path = %path_file_out.display(), "dry-run: workbook not written");
        return;
    }
    match writer.close() {
        Ok(()) => {
            info!(path = %path_file_out.display(), "workbook written");
            spec_ctx.builder_report.add_written(path_file_out);
        }
        Err(message) => {
            let err = StatsError::WriteFailure {
                path: path_file_out,
                message,
            };
            record_write_failure(&err, spec_ctx);
        }
    }
}

fn record_write_failure(err: &StatsError, spec_ctx: &mut SpecAnalyzeContext) {
    let path = match err {
        StatsError::WriteFailure { path, .. } => path.clone(),
        _ => spec_ctx.path_dir_out.clone(),
    };
    warn!(error = %err, "workbook not written");
    spec_ctx
        .builder_report
        .add_error(path, None, err.to_string());
}

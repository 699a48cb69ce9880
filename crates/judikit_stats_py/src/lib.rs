use std::collections::BTreeMap;

use judikit_io_xlsx::EnumCellValue;
use judikit_stats::{
    EnumExtractOutcome, EnumQuarterAggregateRule, EnumQuarterKeyMode, ReportAnalysis,
    SpecAnalysisError, SpecAnalyzeOptions, StatsError, analyze_directory, extract_sheet,
    resolve_quarter_key, sort_file_names,
};
use pyo3::exceptions::{PyNotADirectoryError, PyOSError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyBool, PyDict, PyFloat, PyList, PyString};

const N_BRIDGE_ABI_VERSION: u64 = 1;
const C_BRIDGE_CONTRACT_VERSION: &str = "judikit.stats.analyze.v1";
const C_BRIDGE_TRANSPORT: &str = "rust_native";

#[pyclass(name = "SpecAnalysisError")]
#[derive(Debug, Clone)]
struct PySpecAnalysisError {
    #[pyo3(get)]
    path: String,
    #[pyo3(get)]
    sheet_name: Option<String>,
    #[pyo3(get)]
    exception: String,
}

impl From<SpecAnalysisError> for PySpecAnalysisError {
    fn from(spec_error: SpecAnalysisError) -> Self {
        Self {
            path: spec_error.path.to_string_lossy().to_string(),
            sheet_name: spec_error.sheet_name,
            exception: spec_error.exception,
        }
    }
}

#[pyclass(name = "ReportAnalysis")]
#[derive(Debug, Clone)]
struct PyReportAnalysis {
    #[pyo3(get)]
    cnt_files_matched: u64,
    #[pyo3(get)]
    cnt_files_processed: u64,
    #[pyo3(get)]
    cnt_sheets_scanned: u64,
    #[pyo3(get)]
    cnt_sheets_extracted: u64,
    #[pyo3(get)]
    cnt_sheets_skipped: u64,
    #[pyo3(get)]
    cnt_workbooks_written: u64,
    #[pyo3(get)]
    files_written: Vec<String>,
    #[pyo3(get)]
    warnings: Vec<String>,
    #[pyo3(get)]
    errors: Vec<PySpecAnalysisError>,
    report: ReportAnalysis,
}

impl From<ReportAnalysis> for PyReportAnalysis {
    fn from(report: ReportAnalysis) -> Self {
        Self {
            cnt_files_matched: report.cnt_files_matched,
            cnt_files_processed: report.cnt_files_processed,
            cnt_sheets_scanned: report.cnt_sheets_scanned,
            cnt_sheets_extracted: report.cnt_sheets_extracted,
            cnt_sheets_skipped: report.cnt_sheets_skipped,
            cnt_workbooks_written: report.cnt_workbooks_written,
            files_written: report
                .files_written
                .iter()
                .map(|p| p.to_string_lossy().to_string())
                .collect(),
            warnings: report.warnings.clone(),
            errors: report
                .errors
                .iter()
                .cloned()
                .map(PySpecAnalysisError::from)
                .collect(),
            report,
        }
    }
}

#[pymethods]
impl PyReportAnalysis {
    #[getter]
    fn error_count(&self) -> usize {
        self.report.error_count()
    }

    #[getter]
    fn warning_count(&self) -> usize {
        self.report.warning_count()
    }

    fn to_dict(&self) -> BTreeMap<String, u64> {
        self.report.to_dict()
    }

    #[pyo3(signature = (prefix = "[ANALYZE]"))]
    fn format(&self, prefix: &str) -> String {
        self.report.format(prefix)
    }

    fn __str__(&self) -> String {
        self.report.to_string()
    }
}

fn parse_rule_quarter_key(value: &str) -> PyResult<EnumQuarterKeyMode> {
    match value {
        "lenient" => Ok(EnumQuarterKeyMode::Lenient),
        "strict" => Ok(EnumQuarterKeyMode::Strict),
        _ => Err(PyValueError::new_err(format!(
            "Invalid quarter key mode: `{value}`. Expected one of: ['lenient', 'strict']"
        ))),
    }
}

fn parse_rule_quarter_aggregate(value: &str) -> PyResult<EnumQuarterAggregateRule> {
    match value {
        "multi_part_only" => Ok(EnumQuarterAggregateRule::MultiPartOnly),
        "all_quarters" => Ok(EnumQuarterAggregateRule::AllQuarters),
        _ => Err(PyValueError::new_err(format!(
            "Invalid quarter aggregate rule: `{value}`. Expected one of: ['multi_part_only', 'all_quarters']"
        ))),
    }
}

fn derive_rule_quarter_key(if_strict: bool) -> EnumQuarterKeyMode {
    if if_strict {
        EnumQuarterKeyMode::Strict
    } else {
        EnumQuarterKeyMode::Lenient
    }
}

fn map_stats_error(exception: StatsError) -> PyErr {
    match exception {
        StatsError::SourceNotDirectory(_) => PyNotADirectoryError::new_err(exception.to_string()),
        StatsError::DestinationInitFailed { .. }
        | StatsError::ReadFailure { .. }
        | StatsError::WriteFailure { .. } => PyOSError::new_err(exception.to_string()),
        StatsError::UnrecognizedQuarter { .. }
        | StatsError::QuarterPatternMismatch { .. }
        | StatsError::AggregationType { .. }
        | StatsError::InvalidPattern(_) => PyValueError::new_err(exception.to_string()),
    }
}

fn parse_cell_value(obj: &Bound<'_, PyAny>) -> PyResult<EnumCellValue> {
    if obj.is_none() {
        return Ok(EnumCellValue::None);
    }
    if let Ok(val) = obj.downcast::<PyBool>() {
        return Ok(EnumCellValue::from(if val.is_true() { "True" } else { "False" }));
    }
    if obj.is_instance_of::<PyString>() {
        return Ok(EnumCellValue::String(obj.extract::<String>()?));
    }
    if let Ok(val) = obj.extract::<f64>() {
        return Ok(EnumCellValue::Number(val));
    }
    Ok(EnumCellValue::String(obj.str()?.extract::<String>()?))
}

fn derive_py_cell<'py>(py: Python<'py>, value: &EnumCellValue) -> Bound<'py, PyAny> {
    match value {
        EnumCellValue::None => py.None().into_bound(py),
        EnumCellValue::String(val) => PyString::new(py, val).into_any(),
        EnumCellValue::Number(val) => PyFloat::new(py, *val).into_any(),
    }
}

fn derive_py_row<'py>(py: Python<'py>, row: &[EnumCellValue]) -> PyResult<Bound<'py, PyList>> {
    PyList::new(py, row.iter().map(|value| derive_py_cell(py, value)))
}

#[pyfunction(name = "resolve_quarter_key")]
#[pyo3(signature = (name, strict = false))]
fn resolve_quarter_key_py(name: &str, strict: bool) -> PyResult<(usize, usize)> {
    let key = resolve_quarter_key(name, derive_rule_quarter_key(strict)).map_err(map_stats_error)?;
    Ok((key.quarter_idx, key.part_idx))
}

#[pyfunction(name = "sort_file_names")]
#[pyo3(signature = (names, strict = false))]
fn sort_file_names_py(names: Vec<String>, strict: bool) -> PyResult<Vec<String>> {
    sort_file_names(&names, derive_rule_quarter_key(strict)).map_err(map_stats_error)
}

/// Extract the report regions of a list-of-rows grid; `None` when the grid
/// does not qualify.
#[pyfunction(name = "extract_sheet")]
fn extract_sheet_py<'py>(
    py: Python<'py>,
    grid: Vec<Vec<Bound<'py, PyAny>>>,
) -> PyResult<Option<Bound<'py, PyDict>>> {
    let grid = grid
        .iter()
        .map(|row| row.iter().map(parse_cell_value).collect::<PyResult<Vec<_>>>())
        .collect::<PyResult<Vec<_>>>()?;

    let EnumExtractOutcome::Extracted(regions) = extract_sheet(&grid) else {
        return Ok(None);
    };

    let l_header_rows = regions
        .header_rows
        .iter()
        .map(|row| derive_py_row(py, row))
        .collect::<PyResult<Vec<_>>>()?;

    let dict_out = PyDict::new(py);
    dict_out.set_item("header_rows", PyList::new(py, l_header_rows)?)?;
    dict_out.set_item("subheader_row", derive_py_row(py, &regions.subheader_row)?)?;
    dict_out.set_item("total_row", derive_py_row(py, &regions.total_row)?)?;
    dict_out.set_item("total_row_idx", regions.total_row_idx)?;
    Ok(Some(dict_out))
}

#[pyfunction(name = "analyze_directory")]
#[pyo3(signature = (
    dir_source,
    dir_destination,
    patterns_include_files = None,
    rule_quarter_key = "lenient",
    rule_quarter_aggregate = "multi_part_only",
    if_timestamped_subdir = true,
    if_dry_run = false
))]
#[allow(clippy::too_many_arguments)]
fn analyze_directory_py(
    py: Python<'_>,
    dir_source: String,
    dir_destination: String,
    patterns_include_files: Option<Vec<String>>,
    rule_quarter_key: &str,
    rule_quarter_aggregate: &str,
    if_timestamped_subdir: bool,
    if_dry_run: bool,
) -> PyResult<PyReportAnalysis> {
    let spec_defaults = SpecAnalyzeOptions::default();
    let spec_options = SpecAnalyzeOptions {
        patterns_include_files: patterns_include_files
            .unwrap_or(spec_defaults.patterns_include_files),
        rule_quarter_key: parse_rule_quarter_key(rule_quarter_key)?,
        rule_quarter_aggregate: parse_rule_quarter_aggregate(rule_quarter_aggregate)?,
        if_timestamped_subdir,
        if_dry_run,
    };

    let report = py.allow_threads(|| analyze_directory(dir_source, dir_destination, spec_options));
    let report = report.map_err(map_stats_error)?;
    Ok(PyReportAnalysis::from(report))
}

#[pymodule]
fn _judikit_stats_rs(module: &Bound<'_, PyModule>) -> PyResult<()> {
    module.add_class::<PySpecAnalysisError>()?;
    module.add_class::<PyReportAnalysis>()?;
    module.add_function(wrap_pyfunction!(resolve_quarter_key_py, module)?)?;
    module.add_function(wrap_pyfunction!(sort_file_names_py, module)?)?;
    module.add_function(wrap_pyfunction!(extract_sheet_py, module)?)?;
    module.add_function(wrap_pyfunction!(analyze_directory_py, module)?)?;
    module.add("__bridge_abi__", N_BRIDGE_ABI_VERSION)?;
    module.add("__bridge_contract__", C_BRIDGE_CONTRACT_VERSION)?;
    module.add("__bridge_transport__", C_BRIDGE_TRANSPORT)?;
    Ok(())
}

//! XLSX writer kernel that turns raw grids into styled worksheets.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};

use crate::conf::{N_BORDER_THIN, N_LEN_EXCEL_SHEET_NAME_MAX};
use crate::spec::{EnumCellValue, SpecCellFormat, SpecSheetWriteOptions, SpecXlsxReport};
use crate::util::{
    derive_horizontal_merge_tracker, derive_non_finite_text, plan_row_run_merges,
    sanitize_sheet_name, validate_grid_limits,
};

/// Stateful workbook writer.
pub struct XlsxWriter {
    path_file_out: PathBuf,
    workbook: Workbook,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxReport>,
    if_closed: bool,
}

impl XlsxWriter {
    /// Create writer bound to output path.
    ///
    /// The workbook is buffered in memory until [`Self::close`] is called.
    pub fn new(path_file_out: PathBuf) -> Self {
        Self {
            path_file_out,
            workbook: Workbook::new(),
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        }
    }

    /// Output file path.
    pub fn file_out(&self) -> &Path {
        &self.path_file_out
    }

    /// Number of sheets written so far.
    pub fn sheet_count(&self) -> usize {
        self.set_sheet_names_existing.len()
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxReport> {
        self.l_reports.clone()
    }

    /// Flush workbook to disk. Idempotent.
    pub fn close(&mut self) -> Result<(), String> {
        if self.if_closed {
            return Ok(());
        }
        self.workbook
            .save(&self.path_file_out)
            .map_err(derive_xlsx_error_text)?;
        self.if_closed = true;
        Ok(())
    }

    /// Write one sheet from a raw grid; returns the sheet name actually used.
    pub fn write_sheet(
        &mut self,
        grid: &[Vec<EnumCellValue>],
        sheet_name: &str,
        options: &SpecSheetWriteOptions,
    ) -> Result<String, String> {
        if self.if_closed {
            return Err("Cannot write after close().".to_string());
        }
        validate_grid_limits(grid)?;

        let mut report = SpecXlsxReport::default();

        let c_sheet_name = sanitize_sheet_name(sheet_name, "_");
        if c_sheet_name != sheet_name {
            report.warn(format!(
                "Sheet name {sheet_name:?} sanitized to {c_sheet_name:?}."
            ));
        }
        let sheet_name_unique = self.derive_unique_sheet_name(&c_sheet_name);
        if sheet_name_unique != c_sheet_name {
            report.warn(format!(
                "Sheet name {c_sheet_name:?} already used; renamed to {sheet_name_unique:?}."
            ));
        }

        let worksheet = self.workbook.add_worksheet();
        worksheet
            .set_name(&sheet_name_unique)
            .map_err(derive_xlsx_error_text)?;

        write_grid(worksheet, grid, options)?;

        report.sheets.push(sheet_name_unique.clone());
        self.l_reports.push(report);
        Ok(sheet_name_unique)
    }

    /// Excel compares sheet names case-insensitively, so the used-name set
    /// holds lowercase keys.
    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if self.set_sheet_names_existing.insert(name.to_lowercase()) {
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if self.set_sheet_names_existing.insert(candidate.to_lowercase()) {
                return candidate;
            }
            n_idx += 1;
        }
    }
}

fn write_grid(
    worksheet: &mut Worksheet,
    grid: &[Vec<EnumCellValue>],
    options: &SpecSheetWriteOptions,
) -> Result<(), String> {
    let fmt_styled = derive_rust_xlsx_format(&options.fmt_styled);
    let fmt_plain = Format::new();
    let n_width = grid.iter().map(Vec::len).max().unwrap_or(0);

    let l_merges = options
        .row_idx_merge
        .and_then(|row_idx| {
            grid.get(row_idx)
                .map(|row| plan_row_run_merges(row, row_idx, options.col_idx_merge_start))
        })
        .unwrap_or_default();
    let set_merge_tracker = derive_horizontal_merge_tracker(&l_merges);

    for (row_idx, row_values) in grid.iter().enumerate() {
        let if_styled = row_idx >= options.row_idx_styled_start;
        let n_cols = if if_styled { n_width } else { row_values.len() };

        for col_idx in 0..n_cols {
            if set_merge_tracker.contains(&(row_idx, col_idx)) {
                continue;
            }
            let value = row_values.get(col_idx).unwrap_or(&EnumCellValue::None);
            write_cell(
                worksheet,
                row_idx,
                col_idx,
                value,
                if_styled.then_some(&fmt_styled),
            )?;
        }
    }

    for merge in &l_merges {
        let fmt_merge = if merge.row_idx >= options.row_idx_styled_start {
            &fmt_styled
        } else {
            &fmt_plain
        };
        worksheet
            .merge_range(
                cast_row_num(merge.row_idx)?,
                cast_col_num(merge.col_idx_start)?,
                cast_row_num(merge.row_idx)?,
                cast_col_num(merge.col_idx_end)?,
                "",
                fmt_merge,
            )
            .map_err(derive_xlsx_error_text)?;
        write_cell(
            worksheet,
            merge.row_idx,
            merge.col_idx_start,
            &merge.value,
            Some(fmt_merge),
        )?;
    }

    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: Option<&Format>,
) -> Result<(), String> {
    let n_row = cast_row_num(row_idx)?;
    let n_col = cast_col_num(col_idx)?;

    match (value, format) {
        (EnumCellValue::None, Some(format)) => {
            worksheet
                .write_blank(n_row, n_col, format)
                .map_err(derive_xlsx_error_text)?;
        }
        (EnumCellValue::None, None) => {}
        (EnumCellValue::String(val), Some(format)) => {
            worksheet
                .write_string_with_format(n_row, n_col, val, format)
                .map_err(derive_xlsx_error_text)?;
        }
        (EnumCellValue::String(val), None) => {
            worksheet
                .write_string(n_row, n_col, val)
                .map_err(derive_xlsx_error_text)?;
        }
        (EnumCellValue::Number(val), _) => {
            if let Some(c_text) = derive_non_finite_text(*val) {
                return write_cell(
                    worksheet,
                    row_idx,
                    col_idx,
                    &EnumCellValue::from(c_text),
                    format,
                );
            }
            match format {
                Some(format) => worksheet.write_number_with_format(n_row, n_col, *val, format),
                None => worksheet.write_number(n_row, n_col, *val),
            }
            .map_err(derive_xlsx_error_text)?;
        }
    }
    Ok(())
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }
    if spec.text_wrap.unwrap_or(false) {
        format = format.set_text_wrap();
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        N_BORDER_THIN => FormatBorder::Thin,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, String> {
    u32::try_from(value).map_err(|_| format!("row index overflow: {value}"))
}

fn cast_col_num(value: usize) -> Result<u16, String> {
    u16::try_from(value).map_err(|_| format!("column index overflow: {value}"))
}

fn derive_xlsx_error_text(err: XlsxError) -> String {
    format!("xlsx write error: {err}")
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::*;
    use crate::conf::{EnumFmtKey, derive_default_xlsx_format};
    use crate::reader::read_workbook_grids;

    struct TestDir {
        path: PathBuf,
    }

    impl TestDir {
        fn new() -> Self {
            let n = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos();
            let path = std::env::temp_dir().join(format!("judikit_xlsx_test_{n}"));
            std::fs::create_dir_all(&path).expect("create test dir");
            Self { path }
        }

        fn path(&self) -> &Path {
            &self.path
        }
    }

    impl Drop for TestDir {
        fn drop(&mut self) {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }

    fn sample_grid() -> Vec<Vec<EnumCellValue>> {
        vec![
            vec![EnumCellValue::from("title")],
            vec![
                EnumCellValue::from(""),
                EnumCellValue::from("A"),
                EnumCellValue::from("A"),
                EnumCellValue::from("B"),
            ],
            vec![
                EnumCellValue::from("Total"),
                EnumCellValue::Number(1.0),
                EnumCellValue::Number(2.0),
                EnumCellValue::Number(3.0),
            ],
        ]
    }

    #[test]
    fn writer_round_trip_keeps_values_and_merge_anchor() {
        let tmp = TestDir::new();
        let path_out = tmp.path().join("out.xlsx");

        let mut writer = XlsxWriter::new(path_out.clone());
        let options = SpecSheetWriteOptions {
            fmt_styled: derive_default_xlsx_format(EnumFmtKey::Grid),
            row_idx_styled_start: 1,
            row_idx_merge: Some(1),
            col_idx_merge_start: 1,
        };
        let c_name = writer
            .write_sheet(&sample_grid(), "Hoja1", &options)
            .expect("write sheet");
        assert_eq!(c_name, "Hoja1");
        writer.close().expect("close");

        let l_sheets = read_workbook_grids(&path_out).expect("read back");
        assert_eq!(l_sheets.len(), 1);
        assert_eq!(l_sheets[0].sheet_name, "Hoja1");
        let grid = l_sheets[0].grid.clone().expect("grid");
        assert_eq!(grid[0][0], EnumCellValue::from("title"));
        assert_eq!(grid[1][1], EnumCellValue::from("A"));
        assert!(grid[1][2].is_empty());
        assert_eq!(grid[1][3], EnumCellValue::from("B"));
        assert_eq!(grid[2][0], EnumCellValue::from("Total"));
        assert_eq!(grid[2][3], EnumCellValue::Number(3.0));
    }

    #[test]
    fn writer_renames_duplicate_and_illegal_sheet_names() {
        let tmp = TestDir::new();
        let mut writer = XlsxWriter::new(tmp.path().join("dup.xlsx"));
        let options = SpecSheetWriteOptions::default();

        let c_first = writer
            .write_sheet(&sample_grid(), "a/b", &options)
            .expect("first");
        let c_second = writer
            .write_sheet(&sample_grid(), "a/b", &options)
            .expect("second");
        assert_eq!(c_first, "a_b");
        assert_eq!(c_second, "a_b__2");
        assert_eq!(writer.sheet_count(), 2);
        assert_eq!(writer.report().len(), 2);
        assert!(!writer.report()[1].warnings.is_empty());
    }

    #[test]
    fn writer_renames_case_variant_sheet_names() {
        let tmp = TestDir::new();
        let path_out = tmp.path().join("case.xlsx");
        let mut writer = XlsxWriter::new(path_out.clone());
        let options = SpecSheetWriteOptions::default();

        let c_first = writer
            .write_sheet(&sample_grid(), "Civil", &options)
            .expect("first");
        let c_second = writer
            .write_sheet(&sample_grid(), "CIVIL", &options)
            .expect("second");
        assert_eq!(c_first, "Civil");
        assert_eq!(c_second, "CIVIL__2");
        assert!(!writer.report()[1].warnings.is_empty());
        writer.close().expect("case variants must not collide on save");

        let l_names: Vec<String> = read_workbook_grids(&path_out)
            .expect("read back")
            .into_iter()
            .map(|s| s.sheet_name)
            .collect();
        assert_eq!(l_names, vec!["Civil".to_string(), "CIVIL__2".to_string()]);
    }

    #[test]
    fn grid_preset_maps_to_centered_wrapped_thin_border_format() {
        let format = derive_rust_xlsx_format(&derive_default_xlsx_format(EnumFmtKey::Grid));
        let expected = Format::new()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_text_wrap();
        assert_eq!(format, expected);

        let format = derive_rust_xlsx_format(&derive_default_xlsx_format(EnumFmtKey::Wrap));
        let expected = Format::new()
            .set_border(FormatBorder::Thin)
            .set_text_wrap();
        assert_eq!(format, expected);
    }

    #[test]
    fn unknown_border_code_maps_to_no_border() {
        assert_eq!(derive_format_border(N_BORDER_THIN), FormatBorder::Thin);
        assert_eq!(derive_format_border(0), FormatBorder::None);
        assert_eq!(derive_format_border(9), FormatBorder::None);
    }

    #[test]
    fn writer_rejects_writes_after_close() {
        let tmp = TestDir::new();
        let mut writer = XlsxWriter::new(tmp.path().join("closed.xlsx"));
        writer
            .write_sheet(&sample_grid(), "S", &SpecSheetWriteOptions::default())
            .expect("write");
        writer.close().expect("close");
        writer.close().expect("close is idempotent");

        let err = writer
            .write_sheet(&sample_grid(), "T", &SpecSheetWriteOptions::default())
            .expect_err("must fail");
        assert!(err.contains("after close"));
    }

    #[test]
    fn writer_close_reports_unwritable_destination() {
        let tmp = TestDir::new();
        let path_out = tmp.path().join("missing_dir").join("out.xlsx");
        let mut writer = XlsxWriter::new(path_out);
        writer
            .write_sheet(&sample_grid(), "S", &SpecSheetWriteOptions::default())
            .expect("write");
        let err = writer.close().expect_err("must fail");
        assert!(err.starts_with("xlsx write error"));
    }
}

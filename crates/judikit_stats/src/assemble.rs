//! Result and consolidated workbook assembly.

use std::path::PathBuf;

use judikit_io_xlsx::conf::{EnumFmtKey, derive_default_xlsx_format};
use judikit_io_xlsx::{EnumCellValue, SpecSheetWriteOptions, TypeRawGrid, XlsxWriter};

use crate::conf::{
    N_COL_IDX_RESULT_MERGE_START, N_ROW_IDX_RESULT_MERGE, N_ROW_IDX_RESULT_STYLED_START,
};
use crate::consolidate::{SpecConsolidatedSheet, derive_quarter_aggregates};
use crate::spec::{EnumQuarterAggregateRule, SpecExtractedSheet, StatsError};

////////////////////////////////////////////////////////////////////////////////
// #region ResultWorkbook

/// `header_rows + [subheader_row, total_row]` of one extracted sheet.
pub fn derive_result_grid(extracted: &SpecExtractedSheet) -> TypeRawGrid {
    let regions = &extracted.regions;
    let mut grid = regions.header_rows.clone();
    grid.push(regions.subheader_row.clone());
    grid.push(regions.total_row.clone());
    grid
}

/// Centered, wrapped, bordered from the column-group row down, with
/// column-group labels merged.
pub fn derive_result_sheet_options() -> SpecSheetWriteOptions {
    SpecSheetWriteOptions {
        fmt_styled: derive_default_xlsx_format(EnumFmtKey::Grid),
        row_idx_styled_start: N_ROW_IDX_RESULT_STYLED_START,
        row_idx_merge: Some(N_ROW_IDX_RESULT_MERGE),
        col_idx_merge_start: N_COL_IDX_RESULT_MERGE_START,
    }
}

/// Buffer one sheet per extracted sheet, in the given order.
pub fn assemble_result_workbook(
    path_file_out: PathBuf,
    extracted: &[SpecExtractedSheet],
) -> Result<XlsxWriter, StatsError> {
    let mut writer = XlsxWriter::new(path_file_out.clone());
    let options = derive_result_sheet_options();
    for sheet in extracted {
        writer
            .write_sheet(&derive_result_grid(sheet), &sheet.sheet_name, &options)
            .map_err(|message| StatsError::WriteFailure {
                path: path_file_out.clone(),
                message,
            })?;
    }
    Ok(writer)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ConsolidatedWorkbook

/// One consolidated sheet laid out for writing.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecAssembledSheet {
    pub sheet_name: String,
    pub grid: TypeRawGrid,
    /// Set when the aggregate table was dropped.
    pub aggregate_error: Option<StatsError>,
}

/// Wrapped and bordered everywhere, no merges.
pub fn derive_consolidated_sheet_options() -> SpecSheetWriteOptions {
    SpecSheetWriteOptions {
        fmt_styled: derive_default_xlsx_format(EnumFmtKey::Wrap),
        row_idx_styled_start: 0,
        row_idx_merge: None,
        col_idx_merge_start: 0,
    }
}

/// Lay out one consolidated sheet.
///
/// Title row, then contributing rows in quarter order. When some label
/// carries a part suffix, a blank row follows, then the title row again and
/// the aggregate-by-quarter rows. An aggregation failure drops only that
/// second table.
pub fn assemble_consolidated_sheet(
    sheet: &SpecConsolidatedSheet,
    rule: EnumQuarterAggregateRule,
) -> SpecAssembledSheet {
    let mut grid: TypeRawGrid = vec![sheet.title_row.clone()];
    grid.extend(sheet.rows_sorted().into_iter().map(|row| row.values.clone()));

    let mut aggregate_error = None;
    if sheet.has_multiple_parts() {
        match derive_quarter_aggregates(sheet, rule) {
            Ok(l_aggregates) => {
                grid.push(Vec::<EnumCellValue>::new());
                grid.push(sheet.title_row.clone());
                grid.extend(l_aggregates);
            }
            Err(e) => aggregate_error = Some(e),
        }
    }

    SpecAssembledSheet {
        sheet_name: sheet.sheet_name.clone(),
        grid,
        aggregate_error,
    }
}

/// Buffer one sheet per assembled consolidated sheet.
pub fn assemble_consolidated_workbook(
    path_file_out: PathBuf,
    sheets: &[SpecAssembledSheet],
) -> Result<XlsxWriter, StatsError> {
    let mut writer = XlsxWriter::new(path_file_out.clone());
    let options = derive_consolidated_sheet_options();
    for sheet in sheets {
        writer
            .write_sheet(&sheet.grid, &sheet.sheet_name, &options)
            .map_err(|message| StatsError::WriteFailure {
                path: path_file_out.clone(),
                message,
            })?;
    }
    Ok(writer)
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consolidate::BuilderConsolidation;
    use crate::spec::{SpecQuarterKey, SpecSheetRegions};

    fn text_row(values: &[&str]) -> Vec<EnumCellValue> {
        values.iter().map(|v| EnumCellValue::from(*v)).collect()
    }

    fn extracted(sheet_name: &str, total: &[f64]) -> SpecExtractedSheet {
        let mut total_row = vec![EnumCellValue::from("Total")];
        total_row.extend(total.iter().copied().map(EnumCellValue::Number));
        SpecExtractedSheet {
            sheet_name: sheet_name.to_string(),
            quarter_key: SpecQuarterKey::default(),
            regions: SpecSheetRegions {
                header_rows: (0..19).map(|i| text_row(&[&format!("h{i}"), "", ""])).collect(),
                subheader_row: text_row(&["", "a", "b"]),
                total_row,
                total_row_idx: 25,
            },
        }
    }

    #[test]
    fn test_derive_result_grid_stacks_regions() {
        let grid = derive_result_grid(&extracted("S", &[1.0, 2.0]));
        assert_eq!(grid.len(), 21);
        assert_eq!(grid[19], text_row(&["", "a", "b"]));
        assert_eq!(grid[20][0], EnumCellValue::from("Total"));
    }

    #[test]
    fn test_result_sheet_options_style_and_merge_column_group_row() {
        let options = derive_result_sheet_options();
        assert_eq!(options.row_idx_styled_start, 18);
        assert_eq!(options.row_idx_merge, Some(18));
        assert_eq!(options.col_idx_merge_start, 0);
        assert_eq!(options.fmt_styled.border, Some(1));
        assert_eq!(options.fmt_styled.text_wrap, Some(true));
        assert_eq!(options.fmt_styled.align.as_deref(), Some("center"));

        let options = derive_consolidated_sheet_options();
        assert_eq!(options.row_idx_styled_start, 0);
        assert_eq!(options.row_idx_merge, None);
        assert_eq!(options.fmt_styled.align, None);
    }

    #[test]
    fn test_consolidated_sheet_single_part_has_no_second_table() {
        let mut builder = BuilderConsolidation::new();
        builder.accumulate(&extracted("S", &[3.0, 4.0]), "Segundo Trimestre");
        builder.accumulate(&extracted("S", &[1.0, 2.0]), "Primer Trimestre");

        let assembled = assemble_consolidated_sheet(
            builder.get("S").expect("sheet"),
            EnumQuarterAggregateRule::MultiPartOnly,
        );
        assert_eq!(assembled.grid.len(), 3);
        assert_eq!(assembled.grid[0], text_row(&["", "a", "b"]));
        assert_eq!(assembled.grid[1][3], EnumCellValue::from("Primer Trimestre"));
        assert_eq!(assembled.grid[2][3], EnumCellValue::from("Segundo Trimestre"));
        assert_eq!(assembled.aggregate_error, None);
    }

    #[test]
    fn test_consolidated_sheet_appends_aggregate_table_for_parts() {
        let mut builder = BuilderConsolidation::new();
        builder.accumulate(&extracted("S", &[10.0, 20.0]), "Tercer Trimestre_1");
        builder.accumulate(&extracted("S", &[30.0, 40.0]), "Tercer Trimestre_2");
        builder.accumulate(&extracted("S", &[5.0, 5.0]), "Primer Trimestre");

        let assembled = assemble_consolidated_sheet(
            builder.get("S").expect("sheet"),
            EnumQuarterAggregateRule::MultiPartOnly,
        );
        assert_eq!(assembled.grid.len(), 7);
        assert_eq!(assembled.grid[1][3], EnumCellValue::from("Primer Trimestre"));
        assert_eq!(assembled.grid[2][3], EnumCellValue::from("Tercer Trimestre_1"));
        assert_eq!(assembled.grid[3][3], EnumCellValue::from("Tercer Trimestre_2"));
        assert!(assembled.grid[4].is_empty());
        assert_eq!(assembled.grid[5], text_row(&["", "a", "b"]));
        assert_eq!(
            assembled.grid[6],
            vec![
                EnumCellValue::from("Total"),
                EnumCellValue::Number(40.0),
                EnumCellValue::Number(60.0),
                EnumCellValue::from("Tercer Trimestre"),
            ]
        );
    }

    #[test]
    fn test_consolidated_sheet_keeps_rows_when_aggregation_fails() {
        let mut builder = BuilderConsolidation::new();
        builder.accumulate(&extracted("S", &[1.0, 2.0]), "Primer Trimestre_1");
        let mut bad = extracted("S", &[1.0, 2.0]);
        bad.regions.total_row[1] = EnumCellValue::from("?");
        builder.accumulate(&bad, "Primer Trimestre_2");

        let assembled = assemble_consolidated_sheet(
            builder.get("S").expect("sheet"),
            EnumQuarterAggregateRule::MultiPartOnly,
        );
        assert_eq!(assembled.grid.len(), 3);
        assert!(matches!(
            assembled.aggregate_error,
            Some(StatsError::AggregationType { col_idx: 1, .. })
        ));
    }

    #[test]
    fn test_assemble_result_workbook_buffers_sheets_in_order() {
        let path = std::env::temp_dir().join("judikit_stats_unwritten.xlsx");
        let writer = assemble_result_workbook(
            path.clone(),
            &[extracted("Civil", &[1.0, 2.0]), extracted("Penal", &[3.0, 4.0])],
        )
        .expect("assemble");
        assert_eq!(writer.sheet_count(), 2);
        assert_eq!(writer.file_out(), path.as_path());
        let l_names: Vec<String> = writer
            .report()
            .into_iter()
            .flat_map(|r| r.sheets)
            .collect();
        assert_eq!(l_names, vec!["Civil".to_string(), "Penal".to_string()]);
    }
}

//! Sheet validation and region extraction over raw grids.

use judikit_io_xlsx::EnumCellValue;

use crate::conf::{C_TOTAL_MARKER, N_HEADER_ROW_COUNT, N_QUALIFYING_ROWS_MIN, N_ROW_IDX_SUBHEADER};
use crate::spec::{EnumExtractOutcome, EnumNotQualifiedReason, SpecSheetRegions};

/// Validate a raw grid against the fixed report layout and slice its regions.
///
/// A sheet qualifies when it has at least 20 rows and some row starts with
/// `"Total"`. The first such row wins, searching from the top. All regions
/// are truncated or padded to the width of row 19; the subheader row always
/// keeps its first cell (blanked) so the width is at least one.
pub fn extract_sheet(grid: &[Vec<EnumCellValue>]) -> EnumExtractOutcome {
    if grid.len() < N_QUALIFYING_ROWS_MIN {
        return EnumExtractOutcome::NotQualified(EnumNotQualifiedReason::TooFewRows {
            n_rows: grid.len(),
        });
    }
    let Some(total_row_idx) = find_total_row_idx(grid) else {
        return EnumExtractOutcome::NotQualified(EnumNotQualifiedReason::MissingTotalRow);
    };

    let n_width = usize::max(1, grid[N_ROW_IDX_SUBHEADER].len());

    let header_rows = grid[..N_HEADER_ROW_COUNT]
        .iter()
        .map(|row| fit_row(row, n_width))
        .collect();

    let mut subheader_row = fit_row(&grid[N_ROW_IDX_SUBHEADER], n_width);
    subheader_row[0] = EnumCellValue::from("");

    let mut total_row = fit_row(&grid[total_row_idx], n_width);
    total_row[0] = EnumCellValue::from(C_TOTAL_MARKER);

    EnumExtractOutcome::Extracted(SpecSheetRegions {
        header_rows,
        subheader_row,
        total_row,
        total_row_idx,
    })
}

fn find_total_row_idx(grid: &[Vec<EnumCellValue>]) -> Option<usize> {
    grid.iter()
        .position(|row| row.first().is_some_and(|c| c.is_text(C_TOTAL_MARKER)))
}

fn fit_row(row: &[EnumCellValue], n_width: usize) -> Vec<EnumCellValue> {
    let mut l_out: Vec<EnumCellValue> = row.iter().take(n_width).cloned().collect();
    l_out.resize(n_width, EnumCellValue::None);
    l_out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(values: &[&str]) -> Vec<EnumCellValue> {
        values.iter().map(|v| EnumCellValue::from(*v)).collect()
    }

    /// 19 header rows, a subheader at row 19, data rows and a total row.
    fn report_grid(n_extra_rows: usize) -> Vec<Vec<EnumCellValue>> {
        let mut grid: Vec<Vec<EnumCellValue>> = (0..N_HEADER_ROW_COUNT)
            .map(|i| text_row(&[&format!("h{i}"), "x", "y", "z"]))
            .collect();
        grid.push(text_row(&["Materia", "A", "A", "B"]));
        for i in 0..n_extra_rows {
            grid.push(vec![
                EnumCellValue::from(format!("row{i}")),
                EnumCellValue::Number(1.0),
                EnumCellValue::Number(2.0),
                EnumCellValue::Number(3.0),
            ]);
        }
        grid.push(vec![
            EnumCellValue::from("Total"),
            EnumCellValue::Number(10.0),
            EnumCellValue::Number(20.0),
            EnumCellValue::Number(30.0),
        ]);
        grid
    }

    fn expect_regions(outcome: EnumExtractOutcome) -> SpecSheetRegions {
        match outcome {
            EnumExtractOutcome::Extracted(regions) => regions,
            EnumExtractOutcome::NotQualified(reason) => panic!("not qualified: {reason}"),
        }
    }

    #[test]
    fn test_extract_sheet_rejects_19_rows_regardless_of_content() {
        let grid: Vec<Vec<EnumCellValue>> = (0..19).map(|_| text_row(&["Total", "1"])).collect();
        assert_eq!(
            extract_sheet(&grid),
            EnumExtractOutcome::NotQualified(EnumNotQualifiedReason::TooFewRows { n_rows: 19 })
        );
        assert_eq!(
            extract_sheet(&[]),
            EnumExtractOutcome::NotQualified(EnumNotQualifiedReason::TooFewRows { n_rows: 0 })
        );
    }

    #[test]
    fn test_extract_sheet_rejects_missing_total_row() {
        let mut grid = report_grid(2);
        let n_last = grid.len() - 1;
        grid[n_last][0] = EnumCellValue::from("Totales");
        assert_eq!(
            extract_sheet(&grid),
            EnumExtractOutcome::NotQualified(EnumNotQualifiedReason::MissingTotalRow)
        );
    }

    #[test]
    fn test_extract_sheet_regions_share_subheader_width() {
        let grid = report_grid(3);
        let regions = expect_regions(extract_sheet(&grid));

        assert_eq!(regions.header_rows.len(), 19);
        assert_eq!(regions.header_rows[0], text_row(&["h0", "x", "y", "z"]));
        assert_eq!(regions.subheader_row, text_row(&["", "A", "A", "B"]));
        assert_eq!(regions.total_row[0], EnumCellValue::from("Total"));
        assert_eq!(regions.total_row[3], EnumCellValue::Number(30.0));
        assert_eq!(regions.total_row_idx, 23);
        assert_eq!(regions.width(), 4);
        assert!(regions.header_rows.iter().all(|r| r.len() == 4));
        assert_eq!(regions.total_row.len(), 4);
    }

    #[test]
    fn test_extract_sheet_first_total_row_wins_from_top() {
        let mut grid: Vec<Vec<EnumCellValue>> = (0..20).map(|_| text_row(&["x", "1"])).collect();
        grid[0] = text_row(&["Total", "first"]);
        let regions = expect_regions(extract_sheet(&grid));
        assert_eq!(regions.total_row_idx, 0);
        assert_eq!(regions.total_row, text_row(&["Total", "first"]));

        let mut grid = report_grid(1);
        grid.push(text_row(&["Total", "later"]));
        let regions = expect_regions(extract_sheet(&grid));
        assert_eq!(regions.total_row_idx, 21);
    }

    #[test]
    fn test_extract_sheet_truncates_and_pads_to_subheader_width() {
        let mut grid = report_grid(0);
        grid[0] = text_row(&["wide", "1", "2", "3", "4", "5"]);
        grid[1] = text_row(&["short"]);
        grid[2] = Vec::new();
        grid[20].push(EnumCellValue::Number(99.0));

        let regions = expect_regions(extract_sheet(&grid));
        assert_eq!(regions.header_rows[0], text_row(&["wide", "1", "2", "3"]));
        assert_eq!(
            regions.header_rows[1],
            vec![
                EnumCellValue::from("short"),
                EnumCellValue::None,
                EnumCellValue::None,
                EnumCellValue::None,
            ]
        );
        assert_eq!(regions.header_rows[2], vec![EnumCellValue::None; 4]);
        assert_eq!(regions.total_row.len(), 4);
    }

    #[test]
    fn test_extract_sheet_empty_subheader_row_keeps_one_column() {
        let mut grid = report_grid(0);
        grid[N_ROW_IDX_SUBHEADER] = Vec::new();
        let regions = expect_regions(extract_sheet(&grid));
        assert_eq!(regions.subheader_row, text_row(&[""]));
        assert_eq!(regions.total_row, text_row(&["Total"]));
    }

    #[test]
    fn test_extract_sheet_total_marker_must_be_exact_text() {
        let mut grid = report_grid(0);
        let n_last = grid.len() - 1;
        grid[n_last][0] = EnumCellValue::from(" Total");
        assert_eq!(
            extract_sheet(&grid),
            EnumExtractOutcome::NotQualified(EnumNotQualifiedReason::MissingTotalRow)
        );
    }
}

//! Stateless helper utilities used by the reader/writer kernel.

use std::collections::BTreeSet;

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::{EnumCellValue, SpecSheetHorizontalMerge};

////////////////////////////////////////////////////////////////////////////////
// #region CellValueConversion

/// Text shown for `NaN`/`Inf`; `None` for finite values.
pub fn derive_non_finite_text(x: f64) -> Option<&'static str> {
    if x.is_nan() {
        return Some("NaN");
    }
    if x.is_infinite() {
        return Some(if x.is_sign_positive() { "Inf" } else { "-Inf" });
    }
    None
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

/// Reject grids that cannot fit in one worksheet.
pub fn validate_grid_limits(grid: &[Vec<EnumCellValue>]) -> Result<(), String> {
    if grid.len() > N_NROWS_EXCEL_MAX {
        return Err(format!(
            "Grid too tall: {} rows exceeds Excel limit {N_NROWS_EXCEL_MAX}.",
            grid.len()
        ));
    }
    let n_width = grid.iter().map(Vec::len).max().unwrap_or(0);
    if n_width > N_NCOLS_EXCEL_MAX {
        return Err(format!(
            "Grid too wide: {n_width} columns exceeds Excel limit {N_NCOLS_EXCEL_MAX}."
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region HeaderMergeUtils

/// Plan merges for runs of adjacent equal values in one row.
///
/// The scan starts at `col_idx_start`. A run is two or more adjacent cells
/// holding equal non-empty values; a run reaching the last cell is closed by
/// the row end. Empty cells never take part in a run.
pub fn plan_row_run_merges(
    row: &[EnumCellValue],
    row_idx: usize,
    col_idx_start: usize,
) -> Vec<SpecSheetHorizontalMerge> {
    let mut l_merges = Vec::new();
    let n_cols = row.len();

    let mut n_col_idx = col_idx_start;
    while n_col_idx < n_cols {
        let c_cell_val = &row[n_col_idx];
        if c_cell_val.is_empty() {
            n_col_idx += 1;
            continue;
        }

        let mut n_col_idx_end = n_col_idx + 1;
        while n_col_idx_end < n_cols && row[n_col_idx_end] == *c_cell_val {
            n_col_idx_end += 1;
        }

        if n_col_idx_end - n_col_idx > 1 {
            l_merges.push(SpecSheetHorizontalMerge {
                row_idx,
                col_idx_start: n_col_idx,
                col_idx_end: n_col_idx_end - 1,
                value: c_cell_val.clone(),
            });
        }
        n_col_idx = n_col_idx_end;
    }

    l_merges
}

/// Build lookup set of cells covered by a horizontal merge (excluding anchor).
pub fn derive_horizontal_merge_tracker(
    horizontal_merges: &[SpecSheetHorizontalMerge],
) -> BTreeSet<(usize, usize)> {
    let mut set_merged_cells = BTreeSet::new();

    for merge in horizontal_merges {
        for col_idx in (merge.col_idx_start + 1)..=merge.col_idx_end {
            set_merged_cells.insert((merge.row_idx, col_idx));
        }
    }

    set_merged_cells
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

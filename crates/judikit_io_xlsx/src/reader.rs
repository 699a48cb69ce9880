//! Workbook reader that decodes `.xls`/`.xlsx` sheets into raw grids.

use std::path::Path;

use calamine::{Data, Range, Reader, open_workbook_auto};

use crate::spec::{EnumCellValue, TypeRawGrid};

/// One decoded sheet; `grid` carries the per-sheet decode failure, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetGrid {
    /// Sheet name as stored in the workbook.
    pub sheet_name: String,
    /// Raw grid anchored at cell A1, or the decode error text.
    pub grid: Result<TypeRawGrid, String>,
}

/// Read every sheet of a workbook, in workbook order.
///
/// The engine is picked from the file extension. Failing to open the file is
/// an `Err` for the whole workbook; failing to decode one sheet only marks
/// that sheet.
pub fn read_workbook_grids(path: &Path) -> Result<Vec<SpecSheetGrid>, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|err| format!("Failed to open workbook {}: {err}", path.display()))?;

    let l_sheet_names = workbook.sheet_names();
    let mut l_sheets = Vec::with_capacity(l_sheet_names.len());
    for sheet_name in l_sheet_names {
        let grid = workbook
            .worksheet_range(&sheet_name)
            .map(|range| derive_grid_from_range(&range))
            .map_err(|err| format!("Failed to read sheet {sheet_name:?}: {err}"));
        l_sheets.push(SpecSheetGrid { sheet_name, grid });
    }

    Ok(l_sheets)
}

/// Materialize a used range as an A1-anchored grid.
///
/// Leading blank rows become empty rows; leading blank columns become
/// [`EnumCellValue::None`] cells.
pub fn derive_grid_from_range(range: &Range<Data>) -> TypeRawGrid {
    let Some((n_row_start, n_col_start)) = range.start() else {
        return vec![];
    };
    let n_row_start = n_row_start as usize;
    let n_col_start = n_col_start as usize;

    let mut l_grid: TypeRawGrid = vec![Vec::new(); n_row_start];
    for row in range.rows() {
        let mut l_row = vec![EnumCellValue::None; n_col_start];
        l_row.extend(row.iter().map(derive_cell_value_from_data));
        l_grid.push(l_row);
    }
    l_grid
}

fn derive_cell_value_from_data(value: &Data) -> EnumCellValue {
    match value {
        Data::Empty => EnumCellValue::None,
        Data::String(val) => EnumCellValue::String(val.clone()),
        Data::Float(val) => EnumCellValue::Number(*val),
        Data::Int(val) => EnumCellValue::Number(*val as f64),
        Data::Bool(val) => EnumCellValue::String(if *val { "True" } else { "False" }.to_string()),
        Data::DateTime(val) => EnumCellValue::Number(val.as_f64()),
        Data::DateTimeIso(val) | Data::DurationIso(val) => EnumCellValue::String(val.clone()),
        Data::Error(err) => EnumCellValue::String(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_cell_value_from_data_maps_scalars() {
        assert_eq!(derive_cell_value_from_data(&Data::Empty), EnumCellValue::None);
        assert_eq!(
            derive_cell_value_from_data(&Data::Int(7)),
            EnumCellValue::Number(7.0)
        );
        assert_eq!(
            derive_cell_value_from_data(&Data::Float(2.5)),
            EnumCellValue::Number(2.5)
        );
        assert_eq!(
            derive_cell_value_from_data(&Data::Bool(true)),
            EnumCellValue::from("True")
        );
        assert_eq!(
            derive_cell_value_from_data(&Data::String("Total".to_string())),
            EnumCellValue::from("Total")
        );
    }

    #[test]
    fn test_derive_grid_from_range_anchors_at_a1() {
        let mut range: Range<Data> = Range::new((2, 1), (3, 2));
        range.set_value((2, 1), Data::String("a".to_string()));
        range.set_value((3, 2), Data::Float(1.0));

        let grid = derive_grid_from_range(&range);
        assert_eq!(grid.len(), 4);
        assert!(grid[0].is_empty());
        assert!(grid[1].is_empty());
        assert_eq!(
            grid[2],
            vec![
                EnumCellValue::None,
                EnumCellValue::from("a"),
                EnumCellValue::None
            ]
        );
        assert_eq!(grid[3][2], EnumCellValue::Number(1.0));
    }

    #[test]
    fn test_derive_grid_from_empty_range() {
        let range: Range<Data> = Range::empty();
        assert!(derive_grid_from_range(&range).is_empty());
    }

    #[test]
    fn test_read_workbook_grids_reports_missing_file() {
        let path = std::env::temp_dir().join("judikit_missing_workbook_does_not_exist.xlsx");
        let err = read_workbook_grids(&path).expect_err("must fail");
        assert!(err.contains("Failed to open workbook"));
    }
}

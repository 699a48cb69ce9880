//! Per-sheet accumulation across files and aggregate-by-quarter sums.

use std::collections::BTreeMap;

use judikit_io_xlsx::EnumCellValue;

use crate::conf::{C_PART_SEPARATOR, C_TOTAL_MARKER, TUP_QUARTER_NAMES};
use crate::quarter::resolve_quarter_key;
use crate::spec::{
    EnumQuarterAggregateRule, EnumQuarterKeyMode, SpecExtractedSheet, SpecQuarterKey, StatsError,
};

////////////////////////////////////////////////////////////////////////////////
// #region Models

/// One contributing file's total row in a consolidated sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecConsolidatedRow {
    /// Total row values followed by the source label.
    pub values: Vec<EnumCellValue>,
    /// File name without extension.
    pub source_label: String,
    /// Display ordering key.
    pub quarter_key: SpecQuarterKey,
}

/// All rows collected for one sheet name.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecConsolidatedSheet {
    pub sheet_name: String,
    /// Subheader row of the first extraction that supplied this sheet.
    pub title_row: Vec<EnumCellValue>,
    /// Rows in processing order.
    pub rows: Vec<SpecConsolidatedRow>,
}

impl SpecConsolidatedSheet {
    /// `true` when some source label carries a part separator.
    pub fn has_multiple_parts(&self) -> bool {
        self.rows
            .iter()
            .any(|row| row.source_label.contains(C_PART_SEPARATOR))
    }

    /// Rows ordered by quarter key; ties keep processing order.
    pub fn rows_sorted(&self) -> Vec<&SpecConsolidatedRow> {
        let mut l_rows: Vec<&SpecConsolidatedRow> = self.rows.iter().collect();
        l_rows.sort_by_key(|row| row.quarter_key);
        l_rows
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Builder

/// Run-scoped accumulator of consolidated sheets, in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct BuilderConsolidation {
    l_sheets: Vec<SpecConsolidatedSheet>,
    dict_idx_by_name: BTreeMap<String, usize>,
}

impl BuilderConsolidation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one extracted sheet's total row under its sheet name.
    ///
    /// A new sheet name is seeded with the subheader row as its title; the
    /// title is never overwritten afterwards. Rows are never deduplicated.
    pub fn accumulate(&mut self, extracted: &SpecExtractedSheet, source_label: &str) {
        let n_idx = match self.dict_idx_by_name.get(&extracted.sheet_name) {
            Some(n_idx) => *n_idx,
            None => {
                self.l_sheets.push(SpecConsolidatedSheet {
                    sheet_name: extracted.sheet_name.clone(),
                    title_row: extracted.regions.subheader_row.clone(),
                    rows: Vec::new(),
                });
                let n_idx = self.l_sheets.len() - 1;
                self.dict_idx_by_name
                    .insert(extracted.sheet_name.clone(), n_idx);
                n_idx
            }
        };

        let quarter_key = resolve_quarter_key(source_label, EnumQuarterKeyMode::Lenient)
            .unwrap_or(extracted.quarter_key);

        let mut values = extracted.regions.total_row.clone();
        values.push(EnumCellValue::from(source_label));

        self.l_sheets[n_idx].rows.push(SpecConsolidatedRow {
            values,
            source_label: source_label.to_string(),
            quarter_key,
        });
    }

    pub fn get(&self, sheet_name: &str) -> Option<&SpecConsolidatedSheet> {
        self.dict_idx_by_name
            .get(sheet_name)
            .map(|n_idx| &self.l_sheets[*n_idx])
    }

    pub fn sheets(&self) -> &[SpecConsolidatedSheet] {
        &self.l_sheets
    }

    pub fn len(&self) -> usize {
        self.l_sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.l_sheets.is_empty()
    }

    pub fn build(self) -> Vec<SpecConsolidatedSheet> {
        self.l_sheets
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region QuarterAggregation

/// Build the aggregate-by-quarter rows of one consolidated sheet.
///
/// For each canonical quarter name, the rows whose label contains it are
/// summed column by column over `[1, width - 1)`, where `width` is the length
/// of the first selected row. The result row is `("Total", sums..., name)`.
/// A column with any empty or missing contributor yields an empty cell, never
/// a partial sum. Any other non-numeric cell fails the whole sheet's
/// aggregation.
pub fn derive_quarter_aggregates(
    sheet: &SpecConsolidatedSheet,
    rule: EnumQuarterAggregateRule,
) -> Result<Vec<Vec<EnumCellValue>>, StatsError> {
    let mut l_aggregates = Vec::new();

    for c_quarter_name in TUP_QUARTER_NAMES {
        let l_selected: Vec<&SpecConsolidatedRow> = sheet
            .rows
            .iter()
            .filter(|row| row.source_label.contains(c_quarter_name))
            .collect();

        let n_min_rows = match rule {
            EnumQuarterAggregateRule::MultiPartOnly => 2,
            EnumQuarterAggregateRule::AllQuarters => 1,
        };
        if l_selected.len() < n_min_rows {
            continue;
        }

        let n_width = l_selected[0].values.len();
        let mut l_row = vec![EnumCellValue::from(C_TOTAL_MARKER)];
        for col_idx in 1..n_width.saturating_sub(1) {
            l_row.push(sum_column(&sheet.sheet_name, &l_selected, col_idx)?);
        }
        l_row.push(EnumCellValue::from(c_quarter_name));
        l_aggregates.push(l_row);
    }

    Ok(l_aggregates)
}

fn sum_column(
    sheet_name: &str,
    rows: &[&SpecConsolidatedRow],
    col_idx: usize,
) -> Result<EnumCellValue, StatsError> {
    let mut n_sum = 0.0;
    let mut if_incomplete = false;

    for row in rows {
        // The trailing label is never summed.
        let n_data_width = row.values.len().saturating_sub(1);
        let cell = row.values[..n_data_width].get(col_idx);
        let Some(cell) = cell.filter(|cell| !cell.is_empty()) else {
            if_incomplete = true;
            continue;
        };
        let Some(n_val) = cell.as_f64() else {
            return Err(StatsError::AggregationType {
                sheet: sheet_name.to_string(),
                col_idx,
                source_label: row.source_label.clone(),
                value: cell.to_string(),
            });
        };
        n_sum += n_val;
    }

    if if_incomplete {
        return Ok(EnumCellValue::None);
    }
    Ok(EnumCellValue::Number(n_sum))
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

//! Shared XLSX specification models.

use std::fmt;

////////////////////////////////////////////////////////////////////////////////
// #region CellValues

/// Untyped cell value read from or written to a worksheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EnumCellValue {
    /// Missing/blank value.
    #[default]
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

/// Rows x columns of untyped cells; rows may have differing lengths.
pub type TypeRawGrid = Vec<Vec<EnumCellValue>>;

impl EnumCellValue {
    /// `true` for [`EnumCellValue::None`] and the empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::None => true,
            Self::String(s) => s.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Numeric payload, if any.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::None | Self::String(_) => None,
        }
    }

    /// `true` when the cell holds exactly `text`.
    pub fn is_text(&self, text: &str) -> bool {
        matches!(self, Self::String(s) if s == text)
    }
}

impl fmt::Display for EnumCellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => Ok(()),
            Self::String(s) => write!(f, "{s}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for EnumCellValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for EnumCellValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for EnumCellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,
    /// Text wrap.
    pub text_wrap: Option<bool>,
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            text_wrap: other.text_wrap.or(self.text_wrap),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetWriteSpecification

/// Horizontal merge plan item.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSheetHorizontalMerge {
    /// Row index where merge is applied.
    pub row_idx: usize,
    /// Start column index (inclusive).
    pub col_idx_start: usize,
    /// End column index (inclusive).
    pub col_idx_end: usize,
    /// Value shown by the merged cell.
    pub value: EnumCellValue,
}

/// Per-sheet write options.
///
/// Rows at or below `row_idx_styled_start` are padded to the sheet width and
/// every cell there receives `fmt_styled`; rows above are written verbatim
/// without a format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecSheetWriteOptions {
    /// Format for the styled block.
    pub fmt_styled: SpecCellFormat,
    /// First row of the styled block.
    pub row_idx_styled_start: usize,
    /// Row scanned for runs of equal adjacent values to merge.
    pub row_idx_merge: Option<usize>,
    /// First column considered by the merge scan.
    pub col_idx_merge_start: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Per-write call report.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxReport {
    /// Sheet names produced by the write call.
    pub sheets: Vec<String>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_value_emptiness_covers_none_and_empty_text() {
        assert!(EnumCellValue::None.is_empty());
        assert!(EnumCellValue::from("").is_empty());
        assert!(!EnumCellValue::from(" ").is_empty());
        assert!(!EnumCellValue::Number(0.0).is_empty());
    }

    #[test]
    fn cell_value_text_match_is_exact() {
        assert!(EnumCellValue::from("Total").is_text("Total"));
        assert!(!EnumCellValue::from("Total ").is_text("Total"));
        assert!(!EnumCellValue::from("total").is_text("Total"));
        assert!(!EnumCellValue::Number(1.0).is_text("1"));
    }

    #[test]
    fn format_merge_prefers_right_side() {
        let base = SpecCellFormat {
            border: Some(1),
            align: Some("left".to_string()),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            align: Some("center".to_string()),
            ..Default::default()
        });
        assert_eq!(merged.border, Some(1));
        assert_eq!(merged.align.as_deref(), Some("center"));
    }
}

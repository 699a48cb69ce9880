//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::SpecCellFormat;

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];
/// Border style code for a thin line.
pub const N_BORDER_THIN: i64 = 1;

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    /// Centered, wrapped, thin-bordered report body cell.
    Grid,
    /// Wrapped, thin-bordered cell with default alignment.
    Wrap,
}

impl EnumFmtKey {
    /// Preset map key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Wrap => "wrap",
        }
    }
}

/// Build default named format presets used by [`crate::writer::XlsxWriter`] callers.
pub fn derive_default_xlsx_formats() -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        border: Some(N_BORDER_THIN),
        text_wrap: Some(true),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(EnumFmtKey::Wrap.as_str().to_string(), cfg_base_fmt_spec.clone());
    dict_fmt.insert(
        EnumFmtKey::Grid.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        }),
    );

    dict_fmt
}

/// Fetch one default preset by key.
pub fn derive_default_xlsx_format(key: EnumFmtKey) -> SpecCellFormat {
    derive_default_xlsx_formats()
        .remove(key.as_str())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_preset_is_centered_wrapped_and_thin_bordered() {
        let fmt = derive_default_xlsx_format(EnumFmtKey::Grid);
        assert_eq!(fmt.align.as_deref(), Some("center"));
        assert_eq!(fmt.valign.as_deref(), Some("vcenter"));
        assert_eq!(fmt.text_wrap, Some(true));
        assert_eq!(fmt.border, Some(N_BORDER_THIN));
    }

    #[test]
    fn wrap_preset_keeps_default_alignment() {
        let fmt = derive_default_xlsx_format(EnumFmtKey::Wrap);
        assert_eq!(fmt.align, None);
        assert_eq!(fmt.valign, None);
        assert_eq!(fmt.text_wrap, Some(true));
        assert_eq!(fmt.border, Some(N_BORDER_THIN));
    }
}

//! XLSX constants and default preset factories.

use std::collections::BTreeMap;

use crate::spec::{SpecCellFormat, SpecReportStyle};

/// Excel worksheet maximum row count.
pub const N_NROWS_EXCEL_MAX: usize = 1_048_576;
/// Excel worksheet maximum column count.
pub const N_NCOLS_EXCEL_MAX: usize = 16_384;
/// Excel sheet name maximum length.
pub const N_LEN_EXCEL_SHEET_NAME_MAX: usize = 31;
/// Characters not allowed in sheet names.
pub const TUP_EXCEL_ILLEGAL: [&str; 7] = ["*", ":", "?", "/", "\\", "[", "]"];

/// Accent fill of title, header and total cells.
pub const N_COLOR_ACCENT: u32 = 0xA7C6E6;
/// Font color of accented cells.
pub const N_COLOR_FONT: u32 = 0x000000;
/// Thin border style code.
pub const N_BORDER_THIN: i64 = 1;

/// Standard spreadsheet MIME type.
pub const C_MIME_TYPE_XLSX: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Canonical format preset keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumFmtKey {
    /// Generic text cell.
    Text,
    /// Integer value cell.
    Integer,
    /// Decimal value cell.
    Decimal,
    /// Row label cell of the index columns.
    Index,
    /// Header row cell.
    Header,
    /// Merged title banner.
    Title,
    /// Total row cell overlay.
    Total,
}

impl EnumFmtKey {
    /// Preset map key.
    pub fn as_str(self) -> &'static str {
        match self {
            EnumFmtKey::Text => "text",
            EnumFmtKey::Integer => "integer",
            EnumFmtKey::Decimal => "decimal",
            EnumFmtKey::Index => "index",
            EnumFmtKey::Header => "header",
            EnumFmtKey::Title => "title",
            EnumFmtKey::Total => "total",
        }
    }
}

/// Build named format presets for a report style.
///
/// `text`, `integer`, `decimal` and `index` are complete cell formats;
/// `header`, `title` and `total` are overlays merged on top of them.
pub fn derive_default_xlsx_formats(style: &SpecReportStyle) -> BTreeMap<String, SpecCellFormat> {
    let cfg_base_fmt_spec = SpecCellFormat {
        border: Some(style.border),
        valign: Some("vcenter".to_string()),
        ..Default::default()
    };
    let cfg_accent_fmt_spec = SpecCellFormat {
        bold: Some(true),
        bg_color: Some(style.color_accent),
        font_color: Some(style.color_font),
        ..Default::default()
    };

    let mut dict_fmt = BTreeMap::new();
    dict_fmt.insert(
        EnumFmtKey::Text.as_str().to_string(),
        cfg_base_fmt_spec.clone(),
    );
    dict_fmt.insert(
        EnumFmtKey::Integer.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Decimal.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            num_format: Some("0.00".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Index.as_str().to_string(),
        cfg_base_fmt_spec.with_(SpecCellFormat {
            bold: Some(true),
            valign: Some("top".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Header.as_str().to_string(),
        cfg_accent_fmt_spec.with_(SpecCellFormat {
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Title.as_str().to_string(),
        cfg_accent_fmt_spec.with_(SpecCellFormat {
            align: Some("center".to_string()),
            valign: Some("vcenter".to_string()),
            ..Default::default()
        }),
    );
    dict_fmt.insert(
        EnumFmtKey::Total.as_str().to_string(),
        cfg_accent_fmt_spec,
    );

    dict_fmt
}

/// Look up one preset; missing keys are a programming error surfaced as layout error.
pub fn select_xlsx_format(
    dict_fmt: &BTreeMap<String, SpecCellFormat>,
    key: EnumFmtKey,
) -> Result<SpecCellFormat, String> {
    dict_fmt
        .get(key.as_str())
        .cloned()
        .ok_or_else(|| format!("Missing default format: {}", key.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_formats_cover_every_key() {
        let dict_fmt = derive_default_xlsx_formats(&SpecReportStyle::default());
        for key in [
            EnumFmtKey::Text,
            EnumFmtKey::Integer,
            EnumFmtKey::Decimal,
            EnumFmtKey::Index,
            EnumFmtKey::Header,
            EnumFmtKey::Title,
            EnumFmtKey::Total,
        ] {
            assert!(select_xlsx_format(&dict_fmt, key).is_ok(), "{key:?}");
        }
    }

    #[test]
    fn test_accent_overlays_carry_fill_and_bold() {
        let dict_fmt = derive_default_xlsx_formats(&SpecReportStyle::default());
        let fmt_total = select_xlsx_format(&dict_fmt, EnumFmtKey::Total).unwrap();
        assert_eq!(fmt_total.bg_color, Some(N_COLOR_ACCENT));
        assert_eq!(fmt_total.bold, Some(true));
        assert_eq!(fmt_total.border, None);

        let fmt_integer = select_xlsx_format(&dict_fmt, EnumFmtKey::Integer).unwrap();
        assert_eq!(fmt_integer.border, Some(N_BORDER_THIN));
        assert_eq!(fmt_integer.num_format.as_deref(), Some("0"));
    }
}

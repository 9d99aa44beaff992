//! Shared XLSX specification models.

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::conf::{N_BORDER_THIN, N_COLOR_ACCENT, N_COLOR_FONT};

////////////////////////////////////////////////////////////////////////////////
// #region CellFormatSpecification

/// Cell format specification; `None` fields inherit during [`SpecCellFormat::merge`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SpecCellFormat {
    /// Bold style.
    pub bold: Option<bool>,

    /// Horizontal alignment.
    pub align: Option<String>,
    /// Vertical alignment.
    pub valign: Option<String>,
    /// Border style for all sides.
    pub border: Option<i64>,

    /// Number format code.
    pub num_format: Option<String>,
    /// Background fill color (`0xRRGGBB`).
    pub bg_color: Option<u32>,
    /// Font color (`0xRRGGBB`).
    pub font_color: Option<u32>,
}

/// Normalized cell value during the write pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumCellValue {
    /// Missing/blank value.
    None,
    /// Text value.
    String(String),
    /// Numeric value.
    Number(f64),
}

impl EnumCellValue {
    /// True when the cell holds exactly `text`.
    pub fn is_text(&self, text: &str) -> bool {
        matches!(self, EnumCellValue::String(val) if val == text)
    }
}

impl SpecCellFormat {
    /// Return a new format by overlaying `patch` onto `self`.
    pub fn with_(&self, patch: SpecCellFormat) -> SpecCellFormat {
        self.merge(&patch)
    }

    /// Merge two formats with right-side non-`None` overwrite semantics.
    pub fn merge(&self, other: &SpecCellFormat) -> SpecCellFormat {
        SpecCellFormat {
            bold: other.bold.or(self.bold),
            align: other.align.clone().or_else(|| self.align.clone()),
            valign: other.valign.clone().or_else(|| self.valign.clone()),
            border: other.border.or(self.border),
            num_format: other.num_format.clone().or_else(|| self.num_format.clone()),
            bg_color: other.bg_color.or(self.bg_color),
            font_color: other.font_color.or(self.font_color),
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportStyle

/// Visual constants shared by every report sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecReportStyle {
    /// Fill of title, header and total cells.
    pub color_accent: u32,
    /// Font color of accented cells.
    pub color_font: u32,
    /// Border style code applied to every used cell.
    pub border: i64,
}

impl Default for SpecReportStyle {
    fn default() -> Self {
        Self {
            color_accent: N_COLOR_ACCENT,
            color_font: N_COLOR_FONT,
            border: N_BORDER_THIN,
        }
    }
}

/// Width of the merged title banner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumTitleSpan {
    /// Fixed number of columns.
    Fixed(usize),
    /// Number of value (non-index) columns plus the given offset.
    ColumnsPlus(usize),
}

impl EnumTitleSpan {
    /// Resolve against the number of value columns; never below one column.
    pub fn resolve(self, width_values: usize) -> usize {
        let n_width = match self {
            EnumTitleSpan::Fixed(n_width) => n_width,
            EnumTitleSpan::ColumnsPlus(n_offset) => width_values + n_offset,
        };
        usize::max(1, n_width)
    }
}

/// Per-sheet layout entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecSheetLayout {
    /// Sheet (and table) name.
    pub sheet_name: String,
    /// Banner text in the merged title row.
    pub title: String,
    /// Banner width rule.
    pub rule_title_span: EnumTitleSpan,
    /// Number of header cells (from column A) receiving the accent fill.
    pub width_header_fill: usize,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region WriteOptions

/// Autofit rule for column width inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumAutofitColumnsRule {
    /// Disable autofit.
    None,
    /// Infer width from header cells only.
    Header,
    /// Infer width from body cells only.
    Body,
    /// Infer width from both header and body cells (default).
    #[default]
    All,
}

/// Autofit policy for per-sheet write call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecAutofitCellsPolicy {
    /// Autofit width inference rule.
    pub rule_columns: EnumAutofitColumnsRule,
    /// Max body rows inspected when body-based inference is active.
    pub height_body_inferred_max: Option<usize>,
    /// Minimum final width.
    pub width_cell_min: usize,
    /// Maximum final width.
    pub width_cell_max: usize,
    /// Width padding added after inference.
    pub width_cell_padding: usize,
}

impl Default for SpecAutofitCellsPolicy {
    fn default() -> Self {
        Self {
            rule_columns: EnumAutofitColumnsRule::All,
            height_body_inferred_max: Some(20_000),
            width_cell_min: 8,
            width_cell_max: 60,
            width_cell_padding: 2,
        }
    }
}

/// Per-sheet call options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecXlsxSheetWriteOptions {
    /// Leading frame columns that hold row labels.
    pub width_index: usize,
    /// Merge repeated consecutive labels of the first index column.
    pub if_merge_index: bool,
    /// First-cell text marking a total row.
    pub label_total: String,
    /// Last-cell text marking a total row.
    pub label_grand_total: String,
}

impl Default for SpecXlsxSheetWriteOptions {
    fn default() -> Self {
        Self {
            width_index: 0,
            if_merge_index: false,
            label_total: "Total".to_string(),
            label_grand_total: "Grand Total".to_string(),
        }
    }
}

/// Reader options.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecReaderOptions {
    /// Sheet to read; first sheet when `None`.
    pub sheet_name: Option<String>,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region ReportSpecification

/// Result of one sheet write.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecXlsxSheetReport {
    /// Actual unique sheet name in workbook.
    pub sheet_name: String,
    /// Rows written, title and header included.
    pub height_used: usize,
    /// Columns covered by borders.
    pub width_used: usize,
    /// Zero-based sheet rows styled as total rows.
    pub rows_total: Vec<usize>,
    /// Non-fatal warnings.
    pub warnings: Vec<String>,
}

impl SpecXlsxSheetReport {
    /// Add a warning message.
    pub fn warn(&mut self, msg: impl AsRef<str>) {
        self.warnings.push(msg.as_ref().to_string());
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// XLSX read/write failures.
#[derive(Error, Debug)]
pub enum XlsxIoError {
    #[error("XLSX read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("XLSX write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    /// Uploaded workbook does not have the expected shape.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Table/layout combination cannot be rendered.
    #[error("Invalid layout: {0}")]
    InvalidLayout(String),

    #[error("Cannot write after close().")]
    Closed,
}

impl XlsxIoError {
    /// True for errors caused by the uploaded file.
    pub fn is_input_error(&self) -> bool {
        matches!(self, XlsxIoError::XlsxRead(_) | XlsxIoError::InvalidInput(_))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefers_right_side() {
        let base = SpecCellFormat {
            border: Some(1),
            bold: Some(false),
            ..Default::default()
        };
        let merged = base.with_(SpecCellFormat {
            bold: Some(true),
            bg_color: Some(0xA7C6E6),
            ..Default::default()
        });

        assert_eq!(merged.border, Some(1));
        assert_eq!(merged.bold, Some(true));
        assert_eq!(merged.bg_color, Some(0xA7C6E6));
    }

    #[test]
    fn test_title_span_resolution() {
        assert_eq!(EnumTitleSpan::Fixed(7).resolve(6), 7);
        assert_eq!(EnumTitleSpan::ColumnsPlus(2).resolve(6), 8);
        assert_eq!(EnumTitleSpan::ColumnsPlus(2).resolve(3), 5);
        assert_eq!(EnumTitleSpan::Fixed(0).resolve(3), 1);
    }
}

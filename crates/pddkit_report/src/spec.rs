//! Report options, result model and errors.

use std::collections::BTreeMap;

use pddkit_io_xlsx::{
    SpecAutofitCellsPolicy, SpecReaderOptions, SpecReportStyle, SpecSheetLayout,
    SpecXlsxSheetReport, XlsxIoError,
};
use pddkit_pivot::{PivotError, SpecPivotOptions};
use thiserror::Error;

use crate::conf::derive_default_sheet_layouts;

/// End-to-end options of one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecReportOptions {
    /// Aggregation policies.
    pub pivot: SpecPivotOptions,
    /// Upload reader options.
    pub reader: SpecReaderOptions,
    /// Report colors and border.
    pub style: SpecReportStyle,
    /// Layout per sheet name.
    pub layouts: BTreeMap<String, SpecSheetLayout>,
    /// Column autofit policy.
    pub policy_autofit: SpecAutofitCellsPolicy,
    /// Merge repeated `State` labels of two-level tables.
    pub if_merge_index: bool,
}

impl Default for SpecReportOptions {
    fn default() -> Self {
        Self {
            pivot: SpecPivotOptions::default(),
            reader: SpecReaderOptions::default(),
            style: SpecReportStyle::default(),
            layouts: derive_default_sheet_layouts(),
            policy_autofit: SpecAutofitCellsPolicy::default(),
            if_merge_index: true,
        }
    }
}

/// Generated workbook plus metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPivotReport {
    /// Workbook bytes.
    pub content: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    /// Per-sheet write reports in workbook order.
    pub sheets: Vec<SpecXlsxSheetReport>,
    /// Validation and write warnings.
    pub warnings: Vec<String>,
}

/// Pipeline failures.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Pivot(#[from] PivotError),

    #[error(transparent)]
    Xlsx(#[from] XlsxIoError),

    #[error("No sheet layout for table {0:?}")]
    MissingSheetLayout(String),
}

impl ReportError {
    /// True for errors the uploader can fix (bad workbook or schema).
    pub fn is_input_error(&self) -> bool {
        match self {
            ReportError::Pivot(err) => err.is_input_error(),
            ReportError::Xlsx(err) => err.is_input_error(),
            ReportError::MissingSheetLayout(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        let err = ReportError::from(PivotError::MissingColumns(vec!["Slab".to_string()]));
        assert!(err.is_input_error());
        assert!(err.to_string().contains("Slab"));

        let err = ReportError::from(XlsxIoError::InvalidLayout("x".to_string()));
        assert!(!err.is_input_error());

        assert!(!ReportError::MissingSheetLayout("t".to_string()).is_input_error());
    }
}

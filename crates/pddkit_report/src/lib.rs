//! `pddkit_report` v1:
//! Upload-to-report pipeline over `pddkit_pivot` and `pddkit_io_xlsx`.
//!
//! Modules:
//! - `conf`   : file name, MIME type and the per-sheet layout table
//! - `spec`   : report options, result model and errors
//! - `report` : pipeline entry points
pub mod conf;
pub mod report;
pub mod spec;

pub use conf::{C_FILE_NAME_REPORT, C_MIME_TYPE_XLSX, derive_default_sheet_layouts};
pub use report::{
    create_pivot_report_from_dataframe, create_pivot_report_from_tables,
    create_pivot_report_from_xlsx_bytes,
};
pub use spec::{ReportError, SpecPivotReport, SpecReportOptions};

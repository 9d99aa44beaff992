//! `pddkit_io_xlsx` v1:
//! Rust-side XLSX read/write kernel for pivot reports.
//!
//! Modules:
//! - `conf`   : Excel limits, report colors and default format presets
//! - `spec`   : specs/models/options and errors
//! - `util`   : pure helper functions
//! - `reader` : upload reader (workbook bytes -> DataFrame)
//! - `writer` : titled report writer (DataFrames -> workbook bytes)
pub mod conf;
pub mod reader;
pub mod spec;
pub mod util;
pub mod writer;

pub use conf::{
    C_MIME_TYPE_XLSX, EnumFmtKey, N_BORDER_THIN, N_COLOR_ACCENT, N_COLOR_FONT,
    N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL,
    derive_default_xlsx_formats, select_xlsx_format,
};
pub use reader::read_dataframe_from_xlsx_bytes;
pub use spec::{
    EnumAutofitColumnsRule, EnumCellValue, EnumTitleSpan, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecReaderOptions, SpecReportStyle, SpecSheetLayout, SpecXlsxSheetReport,
    SpecXlsxSheetWriteOptions, XlsxIoError,
};
pub use util::{
    derive_vertical_merge_tracker, derive_vertical_runs, is_total_row, sanitize_sheet_name,
};
pub use writer::XlsxReportWriter;

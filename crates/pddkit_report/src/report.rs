//! Upload-to-workbook pipeline.

use pddkit_io_xlsx::{
    SpecXlsxSheetWriteOptions, XlsxReportWriter, read_dataframe_from_xlsx_bytes,
};
use pddkit_pivot::{C_COL_GRAND_TOTAL, C_LABEL_TOTAL, SpecPivotTables, create_pivot_tables};
use polars::prelude::DataFrame;
use tracing::info;

use crate::conf::{C_FILE_NAME_REPORT, C_MIME_TYPE_XLSX};
use crate::spec::{ReportError, SpecPivotReport, SpecReportOptions};

/// Aggregate an in-memory upload frame and render the report workbook.
pub fn create_pivot_report_from_dataframe(
    df: &DataFrame,
    options: &SpecReportOptions,
) -> Result<SpecPivotReport, ReportError> {
    let tables = create_pivot_tables(df, &options.pivot)?;
    info!(
        rows = df.height(),
        tables = tables.tables.len(),
        warnings = tables.warnings.len(),
        "aggregated pivot tables"
    );
    create_pivot_report_from_tables(&tables, options)
}

/// Read an uploaded workbook and render the report workbook.
pub fn create_pivot_report_from_xlsx_bytes(
    bytes: &[u8],
    options: &SpecReportOptions,
) -> Result<SpecPivotReport, ReportError> {
    let df = read_dataframe_from_xlsx_bytes(bytes, &options.reader)?;
    info!(
        bytes = bytes.len(),
        rows = df.height(),
        cols = df.width(),
        "read upload"
    );
    create_pivot_report_from_dataframe(&df, options)
}

/// Render already built tables, one sheet per table in table order.
pub fn create_pivot_report_from_tables(
    tables: &SpecPivotTables,
    options: &SpecReportOptions,
) -> Result<SpecPivotReport, ReportError> {
    // Resolve every layout up front so a lookup failure never leaves a half-written workbook.
    let l_layouts = tables
        .tables
        .iter()
        .map(|table| {
            options
                .layouts
                .get(&table.name)
                .ok_or_else(|| ReportError::MissingSheetLayout(table.name.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut writer = XlsxReportWriter::new(&options.style, options.policy_autofit.clone())?;
    for (table, layout) in tables.tables.iter().zip(l_layouts) {
        let df_table = table.to_dataframe()?;
        let cfg_sheet_write_options = SpecXlsxSheetWriteOptions {
            width_index: table.width_index(),
            if_merge_index: options.if_merge_index,
            label_total: C_LABEL_TOTAL.to_string(),
            label_grand_total: C_COL_GRAND_TOTAL.to_string(),
        };
        writer.write_sheet(&df_table, layout, &cfg_sheet_write_options)?;
    }

    let content = writer.close_to_buffer()?;
    let sheets = writer.report();

    let mut warnings = tables.warnings.clone();
    for sheet in &sheets {
        warnings.extend(sheet.warnings.iter().cloned());
    }

    info!(
        sheets = sheets.len(),
        bytes = content.len(),
        warnings = warnings.len(),
        "wrote pivot report"
    );

    Ok(SpecPivotReport {
        content,
        file_name: C_FILE_NAME_REPORT.to_string(),
        mime_type: C_MIME_TYPE_XLSX.to_string(),
        sheets,
        warnings,
    })
}

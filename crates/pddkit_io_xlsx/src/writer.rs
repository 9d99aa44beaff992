//! XLSX report writer that renders titled pivot frames into workbook bytes.

use std::collections::{BTreeSet, HashMap};

use polars::prelude::{AnyValue, DataFrame};
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, Workbook, Worksheet};
use tracing::debug;

use crate::conf::{
    EnumFmtKey, N_LEN_EXCEL_SHEET_NAME_MAX, derive_default_xlsx_formats, select_xlsx_format,
};
use crate::spec::{
    EnumAutofitColumnsRule, EnumCellValue, SpecAutofitCellsPolicy, SpecCellFormat,
    SpecReportStyle, SpecSheetLayout, SpecXlsxSheetReport, SpecXlsxSheetWriteOptions,
    XlsxIoError,
};
use crate::util::{
    derive_vertical_merge_tracker, derive_vertical_runs, estimate_width_len, is_total_row,
    sanitize_sheet_name, validate_sheet_extent, validate_unique_columns,
};

/// Sheet row of the merged title banner.
const N_ROW_TITLE: usize = 0;
/// Sheet row of the column header.
const N_ROW_HEADER: usize = 1;

/// Resolved format presets of one writer.
struct SpecFormatPresets {
    fmt_text: SpecCellFormat,
    fmt_integer: SpecCellFormat,
    fmt_decimal: SpecCellFormat,
    fmt_index: SpecCellFormat,
    fmt_header: SpecCellFormat,
    fmt_title: SpecCellFormat,
    fmt_total: SpecCellFormat,
}

impl SpecFormatPresets {
    fn from_style(style: &SpecReportStyle) -> Result<Self, XlsxIoError> {
        let dict_fmt = derive_default_xlsx_formats(style);
        let select = |key| select_xlsx_format(&dict_fmt, key).map_err(XlsxIoError::InvalidLayout);
        Ok(Self {
            fmt_text: select(EnumFmtKey::Text)?,
            fmt_integer: select(EnumFmtKey::Integer)?,
            fmt_decimal: select(EnumFmtKey::Decimal)?,
            fmt_index: select(EnumFmtKey::Index)?,
            fmt_header: select(EnumFmtKey::Header)?,
            fmt_title: select(EnumFmtKey::Title)?,
            fmt_total: select(EnumFmtKey::Total)?,
        })
    }

    /// Complete format of the merged title banner.
    fn derive_title_format(&self) -> SpecCellFormat {
        self.fmt_text.merge(&self.fmt_title)
    }
}

/// Stateful workbook writer; the workbook stays in memory until
/// [`Self::close_to_buffer`].
pub struct XlsxReportWriter {
    workbook: Workbook,
    presets: SpecFormatPresets,
    policy_autofit: SpecAutofitCellsPolicy,
    dict_formats_cache: HashMap<SpecCellFormat, Format>,
    set_sheet_names_existing: BTreeSet<String>,
    l_reports: Vec<SpecXlsxSheetReport>,
    if_closed: bool,
}

impl XlsxReportWriter {
    /// Create writer bound to a report style and autofit policy.
    pub fn new(
        style: &SpecReportStyle,
        policy_autofit: SpecAutofitCellsPolicy,
    ) -> Result<Self, XlsxIoError> {
        validate_policy_autofit(&policy_autofit)?;
        Ok(Self {
            workbook: Workbook::new(),
            presets: SpecFormatPresets::from_style(style)?,
            policy_autofit,
            dict_formats_cache: HashMap::new(),
            set_sheet_names_existing: BTreeSet::new(),
            l_reports: Vec::new(),
            if_closed: false,
        })
    }

    /// Return immutable snapshot of per-sheet write reports.
    pub fn report(&self) -> Vec<SpecXlsxSheetReport> {
        self.l_reports.clone()
    }

    /// Serialize the workbook. The writer accepts no sheets afterwards.
    pub fn close_to_buffer(&mut self) -> Result<Vec<u8>, XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }
        let v_bytes = self.workbook.save_to_buffer()?;
        self.if_closed = true;
        Ok(v_bytes)
    }

    /// Write one titled sheet from a flattened pivot frame.
    ///
    /// Layout: title banner in row 0, column header in row 1, frame rows below.
    pub fn write_sheet(
        &mut self,
        df_data: &DataFrame,
        layout: &SpecSheetLayout,
        options: &SpecXlsxSheetWriteOptions,
    ) -> Result<(), XlsxIoError> {
        if self.if_closed {
            return Err(XlsxIoError::Closed);
        }

        let l_colnames_df: Vec<String> = df_data
            .get_column_names_str()
            .into_iter()
            .map(ToString::to_string)
            .collect();
        validate_unique_columns(&l_colnames_df).map_err(XlsxIoError::InvalidLayout)?;

        let n_width_df = l_colnames_df.len();
        if options.width_index > n_width_df {
            return Err(XlsxIoError::InvalidLayout(format!(
                "width_index={} exceeds frame width {n_width_df}.",
                options.width_index
            )));
        }

        let n_width_title = layout
            .rule_title_span
            .resolve(n_width_df - options.width_index);
        let n_width_used = [n_width_df, n_width_title, layout.width_header_fill]
            .into_iter()
            .max()
            .unwrap_or(n_width_df);

        let l_grid = derive_sheet_grid(df_data, &l_colnames_df, n_width_used)?;
        let l_cols = df_data.get_columns();
        let n_height_used = l_grid.len() + 1;
        validate_sheet_extent(n_height_used, n_width_used).map_err(XlsxIoError::InvalidLayout)?;

        let set_cols_idx_integer: BTreeSet<usize> = l_cols
            .iter()
            .enumerate()
            .filter(|(_, col)| col.dtype().is_integer())
            .map(|(n_idx, _)| n_idx)
            .collect();
        let l_fmt_body_by_col =
            derive_body_formats_by_col(df_data, &self.presets, options.width_index, n_width_used);

        // Repeated first-level labels over data rows; the trailing total row never merges.
        let l_vertical_runs = if options.if_merge_index && options.width_index >= 2 {
            let n_rows_data = df_data.height().saturating_sub(1);
            let l_labels: Vec<String> = l_grid[1..=n_rows_data]
                .iter()
                .map(|row| match &row[0] {
                    EnumCellValue::String(val) => val.clone(),
                    _ => String::new(),
                })
                .collect();
            derive_vertical_runs(&l_labels)
        } else {
            vec![]
        };
        let dict_vertical_merge_tracker = derive_vertical_merge_tracker(&l_vertical_runs);

        let mut report = SpecXlsxSheetReport {
            height_used: n_height_used,
            width_used: n_width_used,
            ..Default::default()
        };

        let sheet_name_unique =
            self.derive_unique_sheet_name(&sanitize_sheet_name(&layout.sheet_name, "_"));
        if sheet_name_unique != layout.sheet_name {
            report.warn(format!(
                "Sheet {:?} written as {sheet_name_unique:?}.",
                layout.sheet_name
            ));
        }

        let fmt_title = derive_cached_format(
            &mut self.dict_formats_cache,
            &self.presets.derive_title_format(),
        );
        let fmt_blank = derive_cached_format(&mut self.dict_formats_cache, &self.presets.fmt_text);

        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet_name_unique)?;

        write_title(
            worksheet,
            &layout.title,
            n_width_title,
            n_width_used,
            &fmt_title,
            &fmt_blank,
        )?;

        let (l_grid_formats, l_rows_total) = plan_grid_formats(
            &l_grid,
            &l_fmt_body_by_col,
            &self.presets,
            layout.width_header_fill,
            options,
        );
        report.rows_total = l_rows_total
            .into_iter()
            .map(|n_idx_grid| N_ROW_HEADER + n_idx_grid)
            .collect();

        for (n_idx_grid, row_values) in l_grid.iter().enumerate() {
            let n_row_sheet = N_ROW_HEADER + n_idx_grid;
            let if_header = n_idx_grid == 0;

            for (n_idx_col, value) in row_values.iter().enumerate() {
                let format = derive_cached_format(
                    &mut self.dict_formats_cache,
                    &l_grid_formats[n_idx_grid][n_idx_col],
                );

                // Body row index into `l_vertical_runs` coordinates (data rows start at 0).
                if n_idx_col == 0 && !if_header {
                    let n_idx_data = n_idx_grid - 1;
                    if dict_vertical_merge_tracker.contains_key(&n_idx_data) {
                        continue;
                    }
                    if let Some((_, n_end, c_text)) = l_vertical_runs
                        .iter()
                        .find(|(n_start, _, _)| *n_start == n_idx_data)
                    {
                        worksheet.merge_range(
                            cast_row_num(n_row_sheet)?,
                            0,
                            cast_row_num(N_ROW_HEADER + 1 + n_end)?,
                            0,
                            c_text,
                            &format,
                        )?;
                        continue;
                    }
                }

                write_cell_with_format(worksheet, n_row_sheet, n_idx_col, value, &format)?;
            }
        }

        if !matches!(
            self.policy_autofit.rule_columns,
            EnumAutofitColumnsRule::None
        ) {
            let l_widths =
                derive_column_widths(&l_grid, &set_cols_idx_integer, &self.policy_autofit);
            for (n_idx_col, n_width) in l_widths.into_iter().enumerate() {
                worksheet.set_column_width(cast_col_num(n_idx_col)?, n_width as f64)?;
            }
        }

        debug!(
            sheet = %sheet_name_unique,
            rows = n_height_used,
            cols = n_width_used,
            merged_runs = l_vertical_runs.len(),
            "wrote report sheet"
        );

        report.sheet_name = sheet_name_unique;
        self.l_reports.push(report);
        Ok(())
    }

    fn derive_unique_sheet_name(&mut self, name: &str) -> String {
        if !self.set_sheet_names_existing.contains(name) {
            self.set_sheet_names_existing.insert(name.to_string());
            return name.to_string();
        }

        let base_name: String = name
            .chars()
            .take(usize::max(1, N_LEN_EXCEL_SHEET_NAME_MAX - 3))
            .collect();

        let mut n_idx = 2usize;
        loop {
            let candidate: String = format!("{base_name}__{n_idx}")
                .chars()
                .take(N_LEN_EXCEL_SHEET_NAME_MAX)
                .collect();
            if !self.set_sheet_names_existing.contains(&candidate) {
                self.set_sheet_names_existing.insert(candidate.clone());
                return candidate;
            }
            n_idx += 1;
        }
    }
}

/// Header row then body rows, each padded with blanks to `width_used`.
fn derive_sheet_grid(
    df_data: &DataFrame,
    colnames: &[String],
    width_used: usize,
) -> Result<Vec<Vec<EnumCellValue>>, XlsxIoError> {
    let mut l_grid: Vec<Vec<EnumCellValue>> = Vec::with_capacity(df_data.height() + 1);
    let mut l_header_row: Vec<EnumCellValue> = colnames
        .iter()
        .map(|c_name| EnumCellValue::String(c_name.clone()))
        .collect();
    l_header_row.resize(width_used, EnumCellValue::None);
    l_grid.push(l_header_row);

    let l_cols = df_data.get_columns();
    for n_idx_row in 0..df_data.height() {
        let mut l_row = Vec::with_capacity(width_used);
        for col in l_cols {
            l_row.push(derive_cell_value_from_any_value(col.get(n_idx_row)?));
        }
        l_row.resize(width_used, EnumCellValue::None);
        l_grid.push(l_row);
    }
    Ok(l_grid)
}

/// Body format per used column: index, integer, decimal, or text.
fn derive_body_formats_by_col(
    df_data: &DataFrame,
    presets: &SpecFormatPresets,
    width_index: usize,
    width_used: usize,
) -> Vec<SpecCellFormat> {
    let l_cols = df_data.get_columns();
    (0..width_used)
        .map(|n_idx_col| {
            let dtype = l_cols.get(n_idx_col).map(|col| col.dtype());
            if n_idx_col < width_index {
                presets.fmt_index.clone()
            } else if dtype.is_some_and(|dtype| dtype.is_integer()) {
                presets.fmt_integer.clone()
            } else if dtype.is_some_and(|dtype| dtype.is_numeric()) {
                presets.fmt_decimal.clone()
            } else {
                presets.fmt_text.clone()
            }
        })
        .collect()
}

/// Resolve the format of every grid cell and collect the grid rows styled as totals.
///
/// Header cells left of `width_header_fill` take the header overlay; total rows
/// take the total overlay across the whole used width.
fn plan_grid_formats(
    grid: &[Vec<EnumCellValue>],
    fmt_body_by_col: &[SpecCellFormat],
    presets: &SpecFormatPresets,
    width_header_fill: usize,
    options: &SpecXlsxSheetWriteOptions,
) -> (Vec<Vec<SpecCellFormat>>, Vec<usize>) {
    let mut l_rows_total = Vec::new();
    let l_formats = grid
        .iter()
        .enumerate()
        .map(|(n_idx_grid, row_values)| {
            let if_header = n_idx_grid == 0;
            let if_total =
                is_total_row(row_values, &options.label_total, &options.label_grand_total);
            if if_total {
                l_rows_total.push(n_idx_grid);
            }

            (0..row_values.len())
                .map(|n_idx_col| {
                    let mut fmt_spec = if if_header {
                        presets.fmt_text.clone()
                    } else {
                        fmt_body_by_col[n_idx_col].clone()
                    };
                    if if_header && n_idx_col < width_header_fill {
                        fmt_spec = fmt_spec.merge(&presets.fmt_header);
                    }
                    if if_total {
                        fmt_spec = fmt_spec.merge(&presets.fmt_total);
                    }
                    fmt_spec
                })
                .collect()
        })
        .collect();
    (l_formats, l_rows_total)
}

fn validate_policy_autofit(policy_autofit: &SpecAutofitCellsPolicy) -> Result<(), XlsxIoError> {
    if policy_autofit.width_cell_min == 0 {
        return Err(XlsxIoError::InvalidLayout(
            "policy_autofit.width_cell_min must be >= 1.".to_string(),
        ));
    }
    if policy_autofit.width_cell_max < policy_autofit.width_cell_min {
        return Err(XlsxIoError::InvalidLayout(
            "policy_autofit.width_cell_max must be >= policy_autofit.width_cell_min.".to_string(),
        ));
    }
    Ok(())
}

/// Infer final column widths from the header/body grid.
fn derive_column_widths(
    grid: &[Vec<EnumCellValue>],
    set_cols_idx_integer: &BTreeSet<usize>,
    policy_autofit: &SpecAutofitCellsPolicy,
) -> Vec<usize> {
    let n_width = grid.first().map_or(0, Vec::len);
    let mut l_width_by_col_header = vec![0usize; n_width];
    let mut l_width_by_col_body = vec![0usize; n_width];

    if let Some(row_header) = grid.first() {
        for (n_idx_col, value) in row_header.iter().enumerate() {
            l_width_by_col_header[n_idx_col] = estimate_width_len(value, false);
        }
    }

    let n_rows_body_max = policy_autofit.height_body_inferred_max.unwrap_or(usize::MAX);
    for row in grid.iter().skip(1).take(n_rows_body_max) {
        for (n_idx_col, value) in row.iter().enumerate() {
            l_width_by_col_body[n_idx_col] = usize::max(
                l_width_by_col_body[n_idx_col],
                estimate_width_len(value, set_cols_idx_integer.contains(&n_idx_col)),
            );
        }
    }

    let n_min = usize::max(1, policy_autofit.width_cell_min);
    let n_max = usize::min(255, usize::max(n_min, policy_autofit.width_cell_max));
    let n_pad = policy_autofit.width_cell_padding;

    (0..n_width)
        .map(|n_idx_col| {
            let n_width_recorded = match policy_autofit.rule_columns {
                EnumAutofitColumnsRule::Header | EnumAutofitColumnsRule::None => {
                    l_width_by_col_header[n_idx_col]
                }
                EnumAutofitColumnsRule::Body => l_width_by_col_body[n_idx_col],
                EnumAutofitColumnsRule::All => usize::max(
                    l_width_by_col_header[n_idx_col],
                    l_width_by_col_body[n_idx_col],
                ),
            };
            usize::min(n_max, usize::max(n_min, n_width_recorded + n_pad))
        })
        .collect()
}

fn derive_cell_value_from_any_value(value: AnyValue<'_>) -> EnumCellValue {
    match value {
        AnyValue::Null => EnumCellValue::None,
        AnyValue::String(val) => EnumCellValue::String(val.to_string()),
        AnyValue::StringOwned(val) => EnumCellValue::String(val.to_string()),
        AnyValue::Boolean(val) => {
            EnumCellValue::String(if val { "True" } else { "False" }.to_string())
        }
        AnyValue::UInt8(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt16(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt32(val) => EnumCellValue::Number(val as f64),
        AnyValue::UInt64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int8(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int16(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int32(val) => EnumCellValue::Number(val as f64),
        AnyValue::Int64(val) => EnumCellValue::Number(val as f64),
        AnyValue::Float32(val) if val.is_finite() => EnumCellValue::Number(val as f64),
        AnyValue::Float64(val) if val.is_finite() => EnumCellValue::Number(val),
        AnyValue::Float32(_) | AnyValue::Float64(_) => EnumCellValue::None,
        _ => EnumCellValue::String(value.to_string()),
    }
}

fn write_title(
    worksheet: &mut Worksheet,
    title: &str,
    width_title: usize,
    width_used: usize,
    fmt_title: &Format,
    fmt_blank: &Format,
) -> Result<(), XlsxIoError> {
    let n_row = cast_row_num(N_ROW_TITLE)?;
    if width_title > 1 {
        worksheet.merge_range(
            n_row,
            0,
            n_row,
            cast_col_num(width_title - 1)?,
            title,
            fmt_title,
        )?;
    } else {
        worksheet.write_string_with_format(n_row, 0, title, fmt_title)?;
    }

    for n_idx_col in width_title..width_used {
        worksheet.write_blank(n_row, cast_col_num(n_idx_col)?, fmt_blank)?;
    }
    Ok(())
}

fn write_cell_with_format(
    worksheet: &mut Worksheet,
    row_idx: usize,
    col_idx: usize,
    value: &EnumCellValue,
    format: &Format,
) -> Result<(), XlsxIoError> {
    match value {
        EnumCellValue::None => {
            worksheet.write_blank(cast_row_num(row_idx)?, cast_col_num(col_idx)?, format)?;
        }
        EnumCellValue::String(val) => {
            worksheet.write_string_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                val,
                format,
            )?;
        }
        EnumCellValue::Number(val) => {
            worksheet.write_number_with_format(
                cast_row_num(row_idx)?,
                cast_col_num(col_idx)?,
                *val,
                format,
            )?;
        }
    }
    Ok(())
}

fn derive_cached_format(
    dict_formats_cache: &mut HashMap<SpecCellFormat, Format>,
    spec: &SpecCellFormat,
) -> Format {
    dict_formats_cache
        .entry(spec.clone())
        .or_insert_with(|| derive_rust_xlsx_format(spec))
        .clone()
}

fn derive_rust_xlsx_format(spec: &SpecCellFormat) -> Format {
    let mut format = Format::new();

    if spec.bold.unwrap_or(false) {
        format = format.set_bold();
    }

    if let Some(val) = &spec.align
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }
    if let Some(val) = &spec.valign
        && let Some(align) = derive_format_align(val)
    {
        format = format.set_align(align);
    }

    if let Some(val) = &spec.num_format {
        format = format.set_num_format(val.clone());
    }
    if let Some(val) = spec.bg_color {
        format = format.set_background_color(Color::RGB(val));
    }
    if let Some(val) = spec.font_color {
        format = format.set_font_color(Color::RGB(val));
    }

    if let Some(val) = spec.border {
        format = format.set_border(derive_format_border(val));
    }

    format
}

fn derive_format_border(border: i64) -> FormatBorder {
    match border {
        0 => FormatBorder::None,
        1 => FormatBorder::Thin,
        2 => FormatBorder::Medium,
        3 => FormatBorder::Dashed,
        4 => FormatBorder::Dotted,
        5 => FormatBorder::Thick,
        6 => FormatBorder::Double,
        7 => FormatBorder::Hair,
        _ => FormatBorder::None,
    }
}

fn derive_format_align(align: &str) -> Option<FormatAlign> {
    let value = align.trim().to_ascii_lowercase();
    match value.as_str() {
        "general" => Some(FormatAlign::General),
        "left" => Some(FormatAlign::Left),
        "center" => Some(FormatAlign::Center),
        "right" => Some(FormatAlign::Right),
        "top" => Some(FormatAlign::Top),
        "bottom" => Some(FormatAlign::Bottom),
        "vcenter" | "vertical_center" => Some(FormatAlign::VerticalCenter),
        _ => None,
    }
}

fn cast_row_num(value: usize) -> Result<u32, XlsxIoError> {
    u32::try_from(value)
        .map_err(|_| XlsxIoError::InvalidLayout(format!("row index overflow: {value}")))
}

fn cast_col_num(value: usize) -> Result<u16, XlsxIoError> {
    u16::try_from(value)
        .map_err(|_| XlsxIoError::InvalidLayout(format!("column index overflow: {value}")))
}

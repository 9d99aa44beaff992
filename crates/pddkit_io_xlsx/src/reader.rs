//! XLSX upload reader that turns the first (or a named) worksheet into a DataFrame.

use std::collections::BTreeSet;
use std::io::Cursor;

use calamine::{Data, Reader, Xlsx};
use polars::prelude::{Column, DataFrame, NamedFrom, Series};
use tracing::debug;

use crate::spec::{SpecReaderOptions, XlsxIoError};

/// Largest float that still converts losslessly to `i64`.
const N_FLOAT_EXACT_INT_MAX: f64 = 9_007_199_254_740_992.0;

/// Cell value after blank normalization.
#[derive(Debug, Clone, PartialEq)]
enum EnumRawCell {
    Null,
    Number(f64),
    Text(String),
}

/// Read an uploaded workbook held in memory.
///
/// The first row of the used range is the header. Fully blank rows are skipped.
/// Columns whose non-null cells are all numeric become `Int64` (all whole) or
/// `Float64`; every other column is `String`.
pub fn read_dataframe_from_xlsx_bytes(
    bytes: &[u8],
    options: &SpecReaderOptions,
) -> Result<DataFrame, XlsxIoError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes))?;
    let l_sheet_names = workbook.sheet_names().to_vec();

    let sheet_name = match &options.sheet_name {
        Some(name) => {
            if !l_sheet_names.iter().any(|c_name| c_name == name) {
                return Err(XlsxIoError::InvalidInput(format!(
                    "Sheet {name:?} not found; available: {l_sheet_names:?}."
                )));
            }
            name.clone()
        }
        None => l_sheet_names.first().cloned().ok_or_else(|| {
            XlsxIoError::InvalidInput("Workbook contains no sheets.".to_string())
        })?,
    };

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut rows = range.rows();

    let row_header = rows.next().ok_or_else(|| {
        XlsxIoError::InvalidInput(format!("Sheet {sheet_name:?} has no header row."))
    })?;
    let l_colnames = derive_header_names(row_header);

    let mut l_values_by_col: Vec<Vec<EnumRawCell>> = vec![Vec::new(); l_colnames.len()];
    let mut n_rows_skipped = 0usize;
    for row in rows {
        let l_cells: Vec<EnumRawCell> = row.iter().map(derive_raw_cell).collect();
        if l_cells.iter().all(|cell| *cell == EnumRawCell::Null) {
            n_rows_skipped += 1;
            continue;
        }
        for (n_idx_col, l_values) in l_values_by_col.iter_mut().enumerate() {
            l_values.push(l_cells.get(n_idx_col).cloned().unwrap_or(EnumRawCell::Null));
        }
    }

    let l_columns: Vec<Column> = l_colnames
        .iter()
        .zip(l_values_by_col)
        .map(|(c_name, l_values)| create_typed_column(c_name, l_values))
        .collect();
    let df = DataFrame::new(l_columns)?;

    debug!(
        sheet = %sheet_name,
        rows = df.height(),
        cols = df.width(),
        rows_skipped = n_rows_skipped,
        "read upload sheet"
    );
    Ok(df)
}

/// Header names with blanks filled as `Unnamed: {idx}` and repeats suffixed `.1`, `.2`, ...
fn derive_header_names(row: &[Data]) -> Vec<String> {
    let mut set_names_seen: BTreeSet<String> = BTreeSet::new();
    row.iter()
        .enumerate()
        .map(|(n_idx_col, cell)| {
            let c_name = match derive_raw_cell(cell) {
                EnumRawCell::Null => format!("Unnamed: {n_idx_col}"),
                EnumRawCell::Number(val) => derive_number_text(val),
                EnumRawCell::Text(val) => val,
            };
            let mut c_name_unique = c_name.clone();
            let mut n_dup = 0usize;
            while set_names_seen.contains(&c_name_unique) {
                n_dup += 1;
                c_name_unique = format!("{c_name}.{n_dup}");
            }
            set_names_seen.insert(c_name_unique.clone());
            c_name_unique
        })
        .collect()
}

fn derive_raw_cell(cell: &Data) -> EnumRawCell {
    match cell {
        Data::Empty => EnumRawCell::Null,
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
            let c_val = s.trim();
            if c_val.is_empty() {
                EnumRawCell::Null
            } else {
                EnumRawCell::Text(c_val.to_string())
            }
        }
        Data::Float(f) => EnumRawCell::Number(*f),
        Data::Int(i) => EnumRawCell::Number(*i as f64),
        Data::Bool(b) => EnumRawCell::Text(if *b { "TRUE" } else { "FALSE" }.to_string()),
        Data::DateTime(dt) => EnumRawCell::Number(dt.as_f64()),
        Data::Error(e) => EnumRawCell::Text(format!("{e:?}")),
    }
}

fn is_whole_number(val: f64) -> bool {
    val.is_finite() && val.fract() == 0.0 && val.abs() <= N_FLOAT_EXACT_INT_MAX
}

fn derive_number_text(val: f64) -> String {
    if is_whole_number(val) {
        (val as i64).to_string()
    } else {
        val.to_string()
    }
}

fn create_typed_column(name: &str, values: Vec<EnumRawCell>) -> Column {
    let if_numeric = values
        .iter()
        .all(|cell| !matches!(cell, EnumRawCell::Text(_)));
    let if_any_value = values.iter().any(|cell| *cell != EnumRawCell::Null);

    if if_numeric && if_any_value {
        let if_integer = values.iter().all(|cell| match cell {
            EnumRawCell::Number(val) => is_whole_number(*val),
            _ => true,
        });
        if if_integer {
            let l_values: Vec<Option<i64>> = values
                .iter()
                .map(|cell| match cell {
                    EnumRawCell::Number(val) => Some(*val as i64),
                    _ => None,
                })
                .collect();
            return Column::from(Series::new(name.into(), l_values));
        }
        let l_values: Vec<Option<f64>> = values
            .iter()
            .map(|cell| match cell {
                EnumRawCell::Number(val) => Some(*val),
                _ => None,
            })
            .collect();
        return Column::from(Series::new(name.into(), l_values));
    }

    let l_values: Vec<Option<String>> = values
        .into_iter()
        .map(|cell| match cell {
            EnumRawCell::Null => None,
            EnumRawCell::Number(val) => Some(derive_number_text(val)),
            EnumRawCell::Text(val) => Some(val),
        })
        .collect();
    Column::from(Series::new(name.into(), l_values))
}

//! Pivot specification models, options and errors.

use polars::prelude::{Column, DataFrame, NamedFrom, PolarsError, Series};
use thiserror::Error;

use crate::conf::{
    C_COL_CRITICAL_COUNT, C_COL_GRAND_TOTAL, C_COL_NON_CRITICAL_COUNT, C_COL_STATE_COUNT,
    C_LABEL_TOTAL,
};

////////////////////////////////////////////////////////////////////////////////
// #region EnumsInit

/// Policy for rows whose `State`, `Cluster` or `Slab` is blank or null.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnumMissingKeyPolicy {
    /// Fail validation on the first missing key (default).
    #[default]
    Reject,
    /// Group the row under the given literal label.
    Label(String),
}

/// Policy for `Slab` values outside the fixed bucket set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumUnknownSlabPolicy {
    /// Keep the row out of Slab tables and record a warning (default).
    #[default]
    Drop,
    /// Fail validation.
    Reject,
}

/// Numeric kind of a measure column, carried through to output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumMeasureKind {
    /// Integer dtype in the source frame.
    #[default]
    Integer,
    /// Any other numeric or parsed-text column.
    Float,
}

impl EnumMeasureKind {
    /// Integer only when both sides are integer.
    pub fn combine(self, other: EnumMeasureKind) -> EnumMeasureKind {
        match (self, other) {
            (EnumMeasureKind::Integer, EnumMeasureKind::Integer) => EnumMeasureKind::Integer,
            _ => EnumMeasureKind::Float,
        }
    }
}

/// Summable source measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnumMeasure {
    StateCount,
    Critical,
    NonCritical,
}

impl EnumMeasure {
    /// Source column name of this measure.
    pub fn column_name(self) -> &'static str {
        match self {
            EnumMeasure::StateCount => C_COL_STATE_COUNT,
            EnumMeasure::Critical => C_COL_CRITICAL_COUNT,
            EnumMeasure::NonCritical => C_COL_NON_CRITICAL_COUNT,
        }
    }

    /// Measure value of one record.
    pub fn value(self, record: &SpecSourceRecord) -> f64 {
        match self {
            EnumMeasure::StateCount => record.state_count,
            EnumMeasure::Critical => record.critical_count,
            EnumMeasure::NonCritical => record.non_critical_count,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Options

/// Validation options for the source frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SpecPivotOptions {
    /// Missing `State`/`Cluster`/`Slab` handling.
    pub rule_missing_key: EnumMissingKeyPolicy,
    /// Unknown `Slab` handling.
    pub rule_unknown_slab: EnumUnknownSlabPolicy,
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SourceModels

/// One validated input row.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecSourceRecord {
    /// Trimmed state key.
    pub state: String,
    /// Trimmed cluster key.
    pub cluster: String,
    /// Position in the fixed Slab order; `None` for dropped unknown buckets.
    pub slab_idx: Option<usize>,
    pub state_count: f64,
    pub critical_count: f64,
    pub non_critical_count: f64,
}

/// Validated source rows plus measure kinds.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecSourceFrame {
    pub records: Vec<SpecSourceRecord>,
    pub kind_state_count: EnumMeasureKind,
    pub kind_critical_count: EnumMeasureKind,
    pub kind_non_critical_count: EnumMeasureKind,
    /// Non-fatal validation warnings.
    pub warnings: Vec<String>,
}

impl SpecSourceFrame {
    /// Kind of the given measure column.
    pub fn kind_of(&self, measure: EnumMeasure) -> EnumMeasureKind {
        match measure {
            EnumMeasure::StateCount => self.kind_state_count,
            EnumMeasure::Critical => self.kind_critical_count,
            EnumMeasure::NonCritical => self.kind_non_critical_count,
        }
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region TableModels

/// One pivot row: 1-2 key levels and one value per column.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPivotRow {
    pub keys: Vec<String>,
    /// Values in `SpecPivotTable::column_names` order; last is `Grand Total`.
    pub values: Vec<f64>,
}

impl SpecPivotRow {
    /// Row-wise total (last value).
    pub fn grand_total(&self) -> f64 {
        self.values.last().copied().unwrap_or(0.0)
    }
}

/// Named derived table.
#[derive(Debug, Clone, PartialEq)]
pub struct SpecPivotTable {
    pub name: String,
    /// Display names of row-key levels (`State` or `State`, `Cluster`).
    pub index_names: Vec<String>,
    /// Value column names, ending with `Grand Total`.
    pub column_names: Vec<String>,
    pub rows: Vec<SpecPivotRow>,
    /// Column-wise sums keyed with `Total` on every level.
    pub total_row: SpecPivotRow,
    pub value_kind: EnumMeasureKind,
}

impl SpecPivotTable {
    /// Number of row-key levels.
    pub fn width_index(&self) -> usize {
        self.index_names.len()
    }

    /// Find a data row by its keys.
    pub fn find_row(&self, keys: &[&str]) -> Option<&SpecPivotRow> {
        self.rows.iter().find(|row| {
            row.keys.len() == keys.len() && row.keys.iter().zip(keys).all(|(a, b)| a == b)
        })
    }

    /// Value of `column_name` in `row`.
    pub fn value(&self, row: &SpecPivotRow, column_name: &str) -> Option<f64> {
        let n_idx = self.column_names.iter().position(|c| c == column_name)?;
        row.values.get(n_idx).copied()
    }

    /// Flatten to a frame: index columns, value columns, total row last.
    pub fn to_dataframe(&self) -> Result<DataFrame, PivotError> {
        let n_height = self.rows.len() + 1;
        let mut l_columns: Vec<Column> =
            Vec::with_capacity(self.index_names.len() + self.column_names.len());

        for (n_level, c_index_name) in self.index_names.iter().enumerate() {
            let mut l_keys = Vec::with_capacity(n_height);
            for row in self.rows.iter().chain(std::iter::once(&self.total_row)) {
                l_keys.push(row.keys.get(n_level).cloned().unwrap_or_default());
            }
            l_columns.push(Column::from(Series::new(c_index_name.as_str().into(), l_keys)));
        }

        for (n_idx_col, c_col_name) in self.column_names.iter().enumerate() {
            let l_values = self
                .rows
                .iter()
                .chain(std::iter::once(&self.total_row))
                .map(|row| row.values.get(n_idx_col).copied().unwrap_or(0.0));
            let series = match self.value_kind {
                EnumMeasureKind::Integer => Series::new(
                    c_col_name.as_str().into(),
                    l_values.map(|n| n.round() as i64).collect::<Vec<i64>>(),
                ),
                EnumMeasureKind::Float => {
                    Series::new(c_col_name.as_str().into(), l_values.collect::<Vec<f64>>())
                }
            };
            l_columns.push(Column::from(series));
        }

        Ok(DataFrame::new(l_columns)?)
    }
}

/// Build a table from ordered groups, appending `Grand Total` and the total row.
pub fn derive_pivot_table(
    name: &str,
    index_names: &[&str],
    column_names: &[&str],
    groups: Vec<(Vec<String>, Vec<f64>)>,
    value_kind: EnumMeasureKind,
) -> SpecPivotTable {
    let n_width = column_names.len() + 1;
    let mut l_total = vec![0.0; n_width];
    let mut l_rows = Vec::with_capacity(groups.len());

    for (keys, mut values) in groups {
        values.resize(column_names.len(), 0.0);
        let n_grand_total: f64 = values.iter().sum();
        values.push(n_grand_total);
        for (n_sum, n_value) in l_total.iter_mut().zip(&values) {
            *n_sum += n_value;
        }
        l_rows.push(SpecPivotRow { keys, values });
    }

    let mut l_column_names: Vec<String> = column_names.iter().map(ToString::to_string).collect();
    l_column_names.push(C_COL_GRAND_TOTAL.to_string());

    SpecPivotTable {
        name: name.to_string(),
        index_names: index_names.iter().map(ToString::to_string).collect(),
        column_names: l_column_names,
        rows: l_rows,
        total_row: SpecPivotRow {
            keys: vec![C_LABEL_TOTAL.to_string(); index_names.len()],
            values: l_total,
        },
        value_kind,
    }
}

/// The five tables of one run plus validation warnings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpecPivotTables {
    pub tables: Vec<SpecPivotTable>,
    pub warnings: Vec<String>,
}

impl SpecPivotTables {
    /// Look up a table by name.
    pub fn get(&self, name: &str) -> Option<&SpecPivotTable> {
        self.tables.iter().find(|table| table.name == name)
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Errors

/// Input validation and aggregation failures.
#[derive(Error, Debug)]
pub enum PivotError {
    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Missing value in key column {column:?} at row {row}")]
    MissingKey { column: String, row: usize },

    #[error("Unknown Slab value {value:?} at row {row}")]
    UnknownSlab { value: String, row: usize },

    #[error("Non-numeric value {value:?} in measure column {column:?} at row {row}")]
    InvalidMeasure {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

impl PivotError {
    /// True for errors caused by the uploaded data rather than the program.
    pub fn is_input_error(&self) -> bool {
        !matches!(self, PivotError::Polars(_))
    }
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_pivot_table_appends_grand_total_and_total_row() {
        let table = derive_pivot_table(
            "t",
            &["State"],
            &["a", "b"],
            vec![
                (vec!["A".to_string()], vec![1.0, 2.0]),
                (vec!["B".to_string()], vec![3.0]),
            ],
            EnumMeasureKind::Integer,
        );

        assert_eq!(table.column_names, vec!["a", "b", "Grand Total"]);
        assert_eq!(table.rows[0].values, vec![1.0, 2.0, 3.0]);
        assert_eq!(table.rows[1].values, vec![3.0, 0.0, 3.0]);
        assert_eq!(table.total_row.keys, vec!["Total"]);
        assert_eq!(table.total_row.values, vec![4.0, 2.0, 6.0]);
    }

    #[test]
    fn test_to_dataframe_keeps_total_row_last_and_integer_dtype() {
        let table = derive_pivot_table(
            "t",
            &["State", "Cluster"],
            &["a"],
            vec![(vec!["A".to_string(), "X".to_string()], vec![5.0])],
            EnumMeasureKind::Integer,
        );
        let df = table.to_dataframe().unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(
            df.get_column_names_str(),
            vec!["State", "Cluster", "a", "Grand Total"]
        );
        assert!(df.column("a").unwrap().dtype().is_integer());
        assert_eq!(df.column("State").unwrap().str().unwrap().get(1), Some("Total"));
    }

    #[test]
    fn test_measure_kind_combine() {
        assert_eq!(
            EnumMeasureKind::Integer.combine(EnumMeasureKind::Integer),
            EnumMeasureKind::Integer
        );
        assert_eq!(
            EnumMeasureKind::Integer.combine(EnumMeasureKind::Float),
            EnumMeasureKind::Float
        );
    }
}

//! Source validation and construction of the five PDD pivot tables.

use std::collections::BTreeMap;

use polars::prelude::{AnyValue, DataFrame};
use tracing::{debug, info, warn};

use crate::conf::{
    C_COL_CLUSTER, C_COL_CRITICAL_COUNT, C_COL_NON_CRITICAL_COUNT, C_COL_SLAB, C_COL_STATE,
    C_COL_STATE_COUNT, C_TABLE_CRITICAL_COUNT, C_TABLE_NON_CRITICAL_COUNT, C_TABLE_PDD_PENDING,
    C_TABLE_STATE_COUNT, C_TABLE_TOTAL_DISCREPANCY, TUP_SLAB_ORDER,
};
use crate::spec::{
    EnumMeasure, EnumMeasureKind, EnumMissingKeyPolicy, EnumUnknownSlabPolicy, PivotError,
    SpecPivotOptions, SpecPivotTable, SpecPivotTables, SpecSourceFrame, SpecSourceRecord,
    derive_pivot_table,
};
use crate::util::{
    derive_key_text_from_any_value, derive_measure_from_any_value, derive_slab_index,
    validate_required_columns,
};

const TUP_INDEX_STATE: [&str; 1] = [C_COL_STATE];
const TUP_INDEX_STATE_CLUSTER: [&str; 2] = [C_COL_STATE, C_COL_CLUSTER];

////////////////////////////////////////////////////////////////////////////////
// #region SourceValidation

/// Validate the raw frame and normalize it into source records.
///
/// Row numbers in errors and warnings are 1-based data rows (header excluded).
pub fn validate_source_frame(
    df: &DataFrame,
    options: &SpecPivotOptions,
) -> Result<SpecSourceFrame, PivotError> {
    let l_colnames_df: Vec<String> = df
        .get_column_names_str()
        .into_iter()
        .map(ToString::to_string)
        .collect();
    validate_required_columns(&l_colnames_df)?;

    let col_state = df.column(C_COL_STATE)?;
    let col_cluster = df.column(C_COL_CLUSTER)?;
    let col_slab = df.column(C_COL_SLAB)?;
    let col_state_count = df.column(C_COL_STATE_COUNT)?;
    let col_critical = df.column(C_COL_CRITICAL_COUNT)?;
    let col_non_critical = df.column(C_COL_NON_CRITICAL_COUNT)?;

    let mut dict_keys_labelled: BTreeMap<&'static str, usize> = BTreeMap::new();
    let mut dict_slabs_unknown: BTreeMap<String, usize> = BTreeMap::new();
    let mut l_records = Vec::with_capacity(df.height());

    for n_idx_row in 0..df.height() {
        let n_row = n_idx_row + 1;

        let state = resolve_key(
            col_state.get(n_idx_row)?,
            C_COL_STATE,
            n_row,
            &options.rule_missing_key,
            &mut dict_keys_labelled,
        )?;
        let cluster = resolve_key(
            col_cluster.get(n_idx_row)?,
            C_COL_CLUSTER,
            n_row,
            &options.rule_missing_key,
            &mut dict_keys_labelled,
        )?;
        let slab = resolve_key(
            col_slab.get(n_idx_row)?,
            C_COL_SLAB,
            n_row,
            &options.rule_missing_key,
            &mut dict_keys_labelled,
        )?;

        let slab_idx = match derive_slab_index(&slab) {
            Some(n_idx_slab) => Some(n_idx_slab),
            None => match options.rule_unknown_slab {
                EnumUnknownSlabPolicy::Reject => {
                    return Err(PivotError::UnknownSlab {
                        value: slab,
                        row: n_row,
                    });
                }
                EnumUnknownSlabPolicy::Drop => {
                    *dict_slabs_unknown.entry(slab).or_default() += 1;
                    None
                }
            },
        };

        l_records.push(SpecSourceRecord {
            state,
            cluster,
            slab_idx,
            state_count: resolve_measure(
                col_state_count.get(n_idx_row)?,
                C_COL_STATE_COUNT,
                n_row,
            )?,
            critical_count: resolve_measure(
                col_critical.get(n_idx_row)?,
                C_COL_CRITICAL_COUNT,
                n_row,
            )?,
            non_critical_count: resolve_measure(
                col_non_critical.get(n_idx_row)?,
                C_COL_NON_CRITICAL_COUNT,
                n_row,
            )?,
        });
    }

    let mut l_warnings = Vec::new();
    for (c_column, n_rows) in &dict_keys_labelled {
        let msg = format!("{n_rows} row(s) with missing {c_column:?} grouped under a label.");
        warn!("{msg}");
        l_warnings.push(msg);
    }
    for (c_slab, n_rows) in &dict_slabs_unknown {
        let msg = format!(
            "{n_rows} row(s) with unknown Slab {c_slab:?} left out of Slab tables (expected one of {}).",
            TUP_SLAB_ORDER.join(", ")
        );
        warn!("{msg}");
        l_warnings.push(msg);
    }

    info!(rows = l_records.len(), "validated PDD source frame");

    Ok(SpecSourceFrame {
        records: l_records,
        kind_state_count: derive_measure_kind(df, C_COL_STATE_COUNT)?,
        kind_critical_count: derive_measure_kind(df, C_COL_CRITICAL_COUNT)?,
        kind_non_critical_count: derive_measure_kind(df, C_COL_NON_CRITICAL_COUNT)?,
        warnings: l_warnings,
    })
}

fn resolve_key(
    value: AnyValue<'_>,
    column: &'static str,
    row: usize,
    rule_missing_key: &EnumMissingKeyPolicy,
    dict_keys_labelled: &mut BTreeMap<&'static str, usize>,
) -> Result<String, PivotError> {
    if let Some(c_key) = derive_key_text_from_any_value(value) {
        return Ok(c_key);
    }
    match rule_missing_key {
        EnumMissingKeyPolicy::Reject => Err(PivotError::MissingKey {
            column: column.to_string(),
            row,
        }),
        EnumMissingKeyPolicy::Label(c_label) => {
            *dict_keys_labelled.entry(column).or_default() += 1;
            Ok(c_label.clone())
        }
    }
}

fn resolve_measure(value: AnyValue<'_>, column: &str, row: usize) -> Result<f64, PivotError> {
    derive_measure_from_any_value(value).map_err(|c_value| PivotError::InvalidMeasure {
        column: column.to_string(),
        row,
        value: c_value,
    })
}

/// Integer dtype, or a column without a single value (header-only uploads), is `Integer`.
fn derive_measure_kind(df: &DataFrame, column: &str) -> Result<EnumMeasureKind, PivotError> {
    let col = df.column(column)?;
    Ok(if col.dtype().is_integer() || col.null_count() == col.len() {
        EnumMeasureKind::Integer
    } else {
        EnumMeasureKind::Float
    })
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region PivotTables

/// Validate `df` and build all five tables in workbook order.
pub fn create_pivot_tables(
    df: &DataFrame,
    options: &SpecPivotOptions,
) -> Result<SpecPivotTables, PivotError> {
    let source = validate_source_frame(df, options)?;
    Ok(create_pivot_tables_from_source(&source))
}

/// Build all five tables from an already validated source.
pub fn create_pivot_tables_from_source(source: &SpecSourceFrame) -> SpecPivotTables {
    let tables = vec![
        create_state_count_table(source),
        create_pdd_pending_table(source),
        create_total_discrepancy_table(source),
        create_critical_count_table(source),
        create_non_critical_count_table(source),
    ];
    for table in &tables {
        debug!(table = %table.name, rows = table.rows.len(), "built pivot table");
    }

    SpecPivotTables {
        tables,
        warnings: source.warnings.clone(),
    }
}

/// `State_Count` by `State` and Slab, sorted by `Grand Total` descending.
pub fn create_state_count_table(source: &SpecSourceFrame) -> SpecPivotTable {
    let mut table = aggregate_by_slab(
        C_TABLE_STATE_COUNT,
        source,
        &TUP_INDEX_STATE,
        EnumMeasure::StateCount,
    );
    // `sort_by` is stable: ties stay in key order.
    table
        .rows
        .sort_by(|a, b| b.grand_total().total_cmp(&a.grand_total()));
    table
}

/// `State_Count` by `(State, Cluster)` and Slab.
pub fn create_pdd_pending_table(source: &SpecSourceFrame) -> SpecPivotTable {
    aggregate_by_slab(
        C_TABLE_PDD_PENDING,
        source,
        &TUP_INDEX_STATE_CLUSTER,
        EnumMeasure::StateCount,
    )
}

/// `Critical Count` and `Non Critical Count` by `(State, Cluster)`.
pub fn create_total_discrepancy_table(source: &SpecSourceFrame) -> SpecPivotTable {
    aggregate_by_measures(
        C_TABLE_TOTAL_DISCREPANCY,
        source,
        &TUP_INDEX_STATE_CLUSTER,
        &[EnumMeasure::Critical, EnumMeasure::NonCritical],
    )
}

/// `Critical Count` by `(State, Cluster)` and Slab.
pub fn create_critical_count_table(source: &SpecSourceFrame) -> SpecPivotTable {
    aggregate_by_slab(
        C_TABLE_CRITICAL_COUNT,
        source,
        &TUP_INDEX_STATE_CLUSTER,
        EnumMeasure::Critical,
    )
}

/// `Non Critical Count` by `(State, Cluster)` and Slab.
pub fn create_non_critical_count_table(source: &SpecSourceFrame) -> SpecPivotTable {
    aggregate_by_slab(
        C_TABLE_NON_CRITICAL_COUNT,
        source,
        &TUP_INDEX_STATE_CLUSTER,
        EnumMeasure::NonCritical,
    )
}

fn derive_group_keys(record: &SpecSourceRecord, n_levels: usize) -> Vec<String> {
    if n_levels == 1 {
        vec![record.state.clone()]
    } else {
        vec![record.state.clone(), record.cluster.clone()]
    }
}

/// Sum one measure per group and Slab bucket, zero-filling absent buckets.
///
/// Records with a dropped Slab still register their group.
fn aggregate_by_slab(
    name: &str,
    source: &SpecSourceFrame,
    index_names: &[&str],
    measure: EnumMeasure,
) -> SpecPivotTable {
    let mut dict_groups: BTreeMap<Vec<String>, Vec<f64>> = BTreeMap::new();
    for record in &source.records {
        let l_values = dict_groups
            .entry(derive_group_keys(record, index_names.len()))
            .or_insert_with(|| vec![0.0; TUP_SLAB_ORDER.len()]);
        if let Some(n_idx_slab) = record.slab_idx {
            l_values[n_idx_slab] += measure.value(record);
        }
    }

    derive_pivot_table(
        name,
        index_names,
        &TUP_SLAB_ORDER,
        dict_groups.into_iter().collect(),
        source.kind_of(measure),
    )
}

/// Sum several measures per group, one column each.
fn aggregate_by_measures(
    name: &str,
    source: &SpecSourceFrame,
    index_names: &[&str],
    measures: &[EnumMeasure],
) -> SpecPivotTable {
    let mut dict_groups: BTreeMap<Vec<String>, Vec<f64>> = BTreeMap::new();
    for record in &source.records {
        let l_values = dict_groups
            .entry(derive_group_keys(record, index_names.len()))
            .or_insert_with(|| vec![0.0; measures.len()]);
        for (n_sum, measure) in l_values.iter_mut().zip(measures) {
            *n_sum += measure.value(record);
        }
    }

    let value_kind = measures
        .iter()
        .map(|measure| source.kind_of(*measure))
        .fold(EnumMeasureKind::Integer, EnumMeasureKind::combine);
    let l_column_names: Vec<&str> = measures.iter().map(|m| m.column_name()).collect();

    derive_pivot_table(
        name,
        index_names,
        &l_column_names,
        dict_groups.into_iter().collect(),
        value_kind,
    )
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

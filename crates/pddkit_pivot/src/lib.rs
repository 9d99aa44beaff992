//! `pddkit_pivot` v1:
//! Rust-side PDD pivot aggregation kernel.
//!
//! Modules:
//! - `conf`  : column names, Slab order and table names
//! - `spec`  : options, table models and errors
//! - `util`  : pure cell conversion helpers
//! - `pivot` : validation and table construction
pub mod conf;
pub mod pivot;
pub mod spec;
pub mod util;

pub use conf::{
    C_COL_CLUSTER, C_COL_CRITICAL_COUNT, C_COL_GRAND_TOTAL, C_COL_NON_CRITICAL_COUNT, C_COL_SLAB,
    C_COL_STATE, C_COL_STATE_COUNT, C_LABEL_TOTAL, C_TABLE_CRITICAL_COUNT,
    C_TABLE_NON_CRITICAL_COUNT, C_TABLE_PDD_PENDING, C_TABLE_STATE_COUNT,
    C_TABLE_TOTAL_DISCREPANCY, TUP_SLAB_ORDER, TUP_SOURCE_COLUMNS, TUP_TABLE_NAMES,
};
pub use pivot::{
    create_critical_count_table, create_non_critical_count_table, create_pdd_pending_table,
    create_pivot_tables, create_pivot_tables_from_source, create_state_count_table,
    create_total_discrepancy_table, validate_source_frame,
};
pub use spec::{
    EnumMeasure, EnumMeasureKind, EnumMissingKeyPolicy, EnumUnknownSlabPolicy, PivotError,
    SpecPivotOptions, SpecPivotRow, SpecPivotTable, SpecPivotTables, SpecSourceFrame,
    SpecSourceRecord,
};

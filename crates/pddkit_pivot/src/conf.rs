//! Pivot constants: source column names, Slab order and table names.

/// Source column: state key.
pub const C_COL_STATE: &str = "State";
/// Source column: cluster key.
pub const C_COL_CLUSTER: &str = "Cluster";
/// Source column: age bucket.
pub const C_COL_SLAB: &str = "Slab";
/// Source measure: pending document count.
pub const C_COL_STATE_COUNT: &str = "State_Count";
/// Source measure: critical discrepancy count.
pub const C_COL_CRITICAL_COUNT: &str = "Critical Count";
/// Source measure: non-critical discrepancy count.
pub const C_COL_NON_CRITICAL_COUNT: &str = "Non Critical Count";

/// Columns every source frame must carry.
pub const TUP_SOURCE_COLUMNS: [&str; 6] = [
    C_COL_STATE,
    C_COL_CLUSTER,
    C_COL_SLAB,
    C_COL_STATE_COUNT,
    C_COL_CRITICAL_COUNT,
    C_COL_NON_CRITICAL_COUNT,
];

/// Fixed Slab column order, oldest bucket first.
pub const TUP_SLAB_ORDER: [&str; 5] = [">365", ">180", ">90", ">60", "<=60"];

/// Row-wise sum column appended to every table.
pub const C_COL_GRAND_TOTAL: &str = "Grand Total";
/// Key label of the column-wise sum row.
pub const C_LABEL_TOTAL: &str = "Total";

pub const C_TABLE_STATE_COUNT: &str = "State_Count";
pub const C_TABLE_PDD_PENDING: &str = "PDD Pending";
pub const C_TABLE_TOTAL_DISCREPANCY: &str = "Total Discrepancy";
pub const C_TABLE_CRITICAL_COUNT: &str = "Critical Count";
pub const C_TABLE_NON_CRITICAL_COUNT: &str = "Non Critical Count";

/// Output table names in workbook order.
pub const TUP_TABLE_NAMES: [&str; 5] = [
    C_TABLE_STATE_COUNT,
    C_TABLE_PDD_PENDING,
    C_TABLE_TOTAL_DISCREPANCY,
    C_TABLE_CRITICAL_COUNT,
    C_TABLE_NON_CRITICAL_COUNT,
];

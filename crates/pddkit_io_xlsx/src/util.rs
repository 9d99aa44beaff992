//! Stateless helper utilities used by the XLSX reader and writer.

use std::collections::{BTreeMap, BTreeSet};

use crate::conf::{N_LEN_EXCEL_SHEET_NAME_MAX, N_NCOLS_EXCEL_MAX, N_NROWS_EXCEL_MAX, TUP_EXCEL_ILLEGAL};
use crate::spec::EnumCellValue;

////////////////////////////////////////////////////////////////////////////////
// #region DataFrameLikeUtils

/// Validate that `columns` has no duplicated names.
pub fn validate_unique_columns(columns: &[String]) -> Result<(), String> {
    if columns.len() == columns.iter().collect::<BTreeSet<_>>().len() {
        return Ok(());
    }

    let mut dict_pos: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (n_idx, c_name) in columns.iter().enumerate() {
        dict_pos.entry(c_name).or_default().push(n_idx);
    }

    let c_msg = dict_pos
        .iter()
        .filter_map(|(c_name, l_pos)| {
            if l_pos.len() > 1 {
                Some(format!(
                    "{c_name:?} x{} at indices {:?}",
                    l_pos.len(),
                    l_pos
                ))
            } else {
                None
            }
        })
        .collect::<Vec<_>>()
        .join("; ");

    Err(format!("Duplicate column names detected: {c_msg}"))
}

/// Validate that a `height` x `width` grid fits into one worksheet.
pub fn validate_sheet_extent(height: usize, width: usize) -> Result<(), String> {
    if height > N_NROWS_EXCEL_MAX {
        return Err(format!(
            "Sheet needs {height} rows; Excel allows {N_NROWS_EXCEL_MAX}."
        ));
    }
    if width > N_NCOLS_EXCEL_MAX {
        return Err(format!(
            "Sheet needs {width} columns; Excel allows {N_NCOLS_EXCEL_MAX}."
        ));
    }
    Ok(())
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region SheetNormalization

/// Replace invalid chars and trim to valid Excel sheet name.
pub fn sanitize_sheet_name(name: &str, replace_to: &str) -> String {
    let mut c_name = name.to_string();
    for c_illegal in TUP_EXCEL_ILLEGAL {
        c_name = c_name.replace(c_illegal, replace_to);
    }
    c_name = c_name.trim().to_string();
    if c_name.is_empty() {
        c_name = "Sheet".to_string();
    }

    c_name.chars().take(N_LEN_EXCEL_SHEET_NAME_MAX).collect()
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region RowStyling

/// A row is a total row when its first cell is `label_total` or its last
/// cell is `label_grand_total`.
pub fn is_total_row(row: &[EnumCellValue], label_total: &str, label_grand_total: &str) -> bool {
    let if_first = row.first().is_some_and(|cell| cell.is_text(label_total));
    let if_last = row.last().is_some_and(|cell| cell.is_text(label_grand_total));
    if_first || if_last
}

/// Generate contiguous runs `(row_start, row_end, text)` of repeated non-empty labels.
///
/// Only runs longer than one row are returned.
pub fn derive_vertical_runs(labels: &[String]) -> Vec<(usize, usize, String)> {
    let mut v_run_collection = Vec::new();
    let n_rows = labels.len();

    let mut n_row_idx_start = 0;
    while n_row_idx_start < n_rows {
        let c_val_cell_current = &labels[n_row_idx_start];
        if c_val_cell_current.is_empty() {
            n_row_idx_start += 1;
            continue;
        }

        let mut n_row_idx_next = n_row_idx_start + 1;
        while n_row_idx_next < n_rows && labels[n_row_idx_next] == *c_val_cell_current {
            n_row_idx_next += 1;
        }

        if n_row_idx_next - n_row_idx_start > 1 {
            v_run_collection.push((
                n_row_idx_start,
                n_row_idx_next - 1,
                c_val_cell_current.clone(),
            ));
        }

        n_row_idx_start = n_row_idx_next;
    }

    v_run_collection
}

/// Map each row covered by a run (excluding its anchor) to the anchor row.
pub fn derive_vertical_merge_tracker(
    runs: &[(usize, usize, String)],
) -> BTreeMap<usize, usize> {
    let mut dict_merged_rows_tracker = BTreeMap::new();
    for (row_start, row_end, _) in runs {
        for row_idx in (row_start + 1)..=*row_end {
            dict_merged_rows_tracker.insert(row_idx, *row_start);
        }
    }
    dict_merged_rows_tracker
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Autofit

/// Display width of a cell value.
pub fn estimate_width_len(value: &EnumCellValue, if_is_integer_col: bool) -> usize {
    match value {
        EnumCellValue::None => 0,
        EnumCellValue::String(s) => estimate_unicode_string_width(s),
        EnumCellValue::Number(n) => {
            if if_is_integer_col {
                (*n as i64).to_string().len()
            } else {
                format!("{n:.2}").len()
            }
        }
    }
}

fn estimate_unicode_string_width(s: &str) -> usize {
    let n_ascii = s.chars().filter(|chr| chr.is_ascii()).count();
    let n_non_ascii = s.chars().count().saturating_sub(n_ascii);
    n_ascii + (n_non_ascii as f64 * 1.6).round() as usize
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> EnumCellValue {
        EnumCellValue::String(s.to_string())
    }

    #[test]
    fn test_derive_vertical_runs_detects_only_contiguous_non_empty_runs() {
        let labels: Vec<String> = ["A", "A", "A", "", "B", "B", "C"]
            .iter()
            .map(ToString::to_string)
            .collect();

        assert_eq!(
            derive_vertical_runs(&labels),
            vec![(0, 2, "A".to_string()), (4, 5, "B".to_string())]
        );
    }

    #[test]
    fn test_derive_vertical_merge_tracker_points_to_anchor() {
        let runs = vec![(1, 3, "A".to_string())];
        let tracker = derive_vertical_merge_tracker(&runs);

        assert_eq!(tracker.get(&1), None);
        assert_eq!(tracker.get(&2), Some(&1));
        assert_eq!(tracker.get(&3), Some(&1));
    }

    #[test]
    fn test_is_total_row_checks_first_and_last_cell() {
        assert!(is_total_row(
            &[text("Total"), EnumCellValue::Number(1.0)],
            "Total",
            "Grand Total"
        ));
        assert!(is_total_row(
            &[text("State"), text(">365"), text("Grand Total")],
            "Total",
            "Grand Total"
        ));
        assert!(!is_total_row(
            &[text("Texas"), text("Total"), EnumCellValue::Number(1.0)],
            "Total",
            "Grand Total"
        ));
        assert!(!is_total_row(&[], "Total", "Grand Total"));
    }

    #[test]
    fn test_sanitize_sheet_name_replaces_illegal_chars() {
        assert_eq!(sanitize_sheet_name("a/b:c", "_"), "a_b_c");
        assert_eq!(sanitize_sheet_name("  ", "_"), "Sheet");
        assert_eq!(sanitize_sheet_name(&"x".repeat(40), "_").len(), 31);
    }

    #[test]
    fn test_validate_unique_columns_reports_duplicates() {
        let columns = vec!["a".to_string(), "b".to_string(), "a".to_string()];
        let err = validate_unique_columns(&columns).unwrap_err();
        assert!(err.contains("\"a\" x2"));
    }
}

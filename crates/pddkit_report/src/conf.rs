//! Report constants and the per-sheet layout table.

use std::collections::BTreeMap;

use pddkit_io_xlsx::{EnumTitleSpan, SpecSheetLayout};
use pddkit_pivot::{
    C_TABLE_CRITICAL_COUNT, C_TABLE_NON_CRITICAL_COUNT, C_TABLE_PDD_PENDING, C_TABLE_STATE_COUNT,
    C_TABLE_TOTAL_DISCREPANCY,
};

pub use pddkit_io_xlsx::C_MIME_TYPE_XLSX;

/// Download name of the generated workbook.
pub const C_FILE_NAME_REPORT: &str = "pivot_tables.xlsx";

/// `(sheet, title, title span, header fill width)` for every table.
const TUP_SHEET_LAYOUTS: [(&str, &str, EnumTitleSpan, usize); 5] = [
    (C_TABLE_STATE_COUNT, "PDD Pending", EnumTitleSpan::Fixed(7), 7),
    (C_TABLE_PDD_PENDING, "PDD Pending", EnumTitleSpan::ColumnsPlus(2), 8),
    (
        C_TABLE_TOTAL_DISCREPANCY,
        "Total Discrepancy",
        EnumTitleSpan::ColumnsPlus(2),
        5,
    ),
    (
        C_TABLE_CRITICAL_COUNT,
        "Critical Documents Pending",
        EnumTitleSpan::ColumnsPlus(2),
        8,
    ),
    (
        C_TABLE_NON_CRITICAL_COUNT,
        "Non Critical Documents Pending",
        EnumTitleSpan::ColumnsPlus(2),
        8,
    ),
];

/// Default layout table keyed by sheet name.
pub fn derive_default_sheet_layouts() -> BTreeMap<String, SpecSheetLayout> {
    TUP_SHEET_LAYOUTS
        .iter()
        .map(|(c_sheet, c_title, rule_title_span, n_width_header_fill)| {
            (
                c_sheet.to_string(),
                SpecSheetLayout {
                    sheet_name: c_sheet.to_string(),
                    title: c_title.to_string(),
                    rule_title_span: *rule_title_span,
                    width_header_fill: *n_width_header_fill,
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use pddkit_pivot::TUP_TABLE_NAMES;

    use super::*;

    #[test]
    fn test_every_table_has_a_layout() {
        let dict_layouts = derive_default_sheet_layouts();
        for c_table in TUP_TABLE_NAMES {
            assert!(dict_layouts.contains_key(c_table), "{c_table}");
        }
    }

    #[test]
    fn test_state_count_layout_uses_fixed_span() {
        let dict_layouts = derive_default_sheet_layouts();
        let layout = &dict_layouts[C_TABLE_STATE_COUNT];
        assert_eq!(layout.title, "PDD Pending");
        assert_eq!(layout.rule_title_span, EnumTitleSpan::Fixed(7));
        assert_eq!(layout.width_header_fill, 7);
        assert_eq!(dict_layouts[C_TABLE_TOTAL_DISCREPANCY].width_header_fill, 5);
    }
}

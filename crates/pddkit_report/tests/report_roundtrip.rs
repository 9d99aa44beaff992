use std::io::Cursor;

use calamine::{Data, Range, Reader, Xlsx};
use pddkit_report::{
    C_FILE_NAME_REPORT, ReportError, SpecReportOptions, create_pivot_report_from_xlsx_bytes,
};
use rust_xlsxwriter::Workbook;

const TUP_HEADER: [&str; 6] = [
    "State",
    "Cluster",
    "Slab",
    "State_Count",
    "Critical Count",
    "Non Critical Count",
];

fn create_upload_bytes(rows: &[(&str, &str, &str, f64, f64, f64)]) -> Vec<u8> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (n_col, c_name) in TUP_HEADER.iter().enumerate() {
        worksheet.write_string(0, n_col as u16, *c_name).unwrap();
    }
    for (n_idx, row) in rows.iter().enumerate() {
        let n_row = n_idx as u32 + 1;
        worksheet.write_string(n_row, 0, row.0).unwrap();
        worksheet.write_string(n_row, 1, row.1).unwrap();
        worksheet.write_string(n_row, 2, row.2).unwrap();
        worksheet.write_number(n_row, 3, row.3).unwrap();
        worksheet.write_number(n_row, 4, row.4).unwrap();
        worksheet.write_number(n_row, 5, row.5).unwrap();
    }
    workbook.save_to_buffer().unwrap()
}

fn read_sheet(content: &[u8], sheet_name: &str) -> Range<Data> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(content)).unwrap();
    workbook.worksheet_range(sheet_name).unwrap()
}

fn text(range: &Range<Data>, row: u32, col: u32) -> String {
    match range.get_value((row, col)) {
        Some(Data::String(val)) => val.clone(),
        other => panic!("expected text at ({row}, {col}), got {other:?}"),
    }
}

fn number(range: &Range<Data>, row: u32, col: u32) -> f64 {
    match range.get_value((row, col)) {
        Some(Data::Float(val)) => *val,
        Some(Data::Int(val)) => *val as f64,
        other => panic!("expected number at ({row}, {col}), got {other:?}"),
    }
}

#[test]
fn test_report_round_trips_through_calamine() {
    let v_upload = create_upload_bytes(&[
        ("A", "X", ">60", 5.0, 1.0, 2.0),
        ("A", "X", "<=60", 3.0, 0.0, 1.0),
    ]);
    let report = create_pivot_report_from_xlsx_bytes(&v_upload, &SpecReportOptions::default())
        .unwrap();
    assert_eq!(report.file_name, C_FILE_NAME_REPORT);

    let workbook: Xlsx<_> = Xlsx::new(Cursor::new(report.content.as_slice())).unwrap();
    assert_eq!(
        workbook.sheet_names(),
        vec![
            "State_Count",
            "PDD Pending",
            "Total Discrepancy",
            "Critical Count",
            "Non Critical Count",
        ]
    );

    let range = read_sheet(&report.content, "PDD Pending");
    assert_eq!(text(&range, 0, 0), "PDD Pending");
    let l_header: Vec<String> = (0..8).map(|n_col| text(&range, 1, n_col)).collect();
    assert_eq!(
        l_header,
        vec!["State", "Cluster", ">365", ">180", ">90", ">60", "<=60", "Grand Total"]
    );

    assert_eq!(text(&range, 2, 0), "A");
    assert_eq!(text(&range, 2, 1), "X");
    let l_values: Vec<f64> = (2..8).map(|n_col| number(&range, 2, n_col)).collect();
    assert_eq!(l_values, vec![0.0, 0.0, 0.0, 5.0, 3.0, 8.0]);

    assert_eq!(text(&range, 3, 0), "Total");
    let l_totals: Vec<f64> = (2..8).map(|n_col| number(&range, 3, n_col)).collect();
    assert_eq!(l_totals, l_values);

    let range = read_sheet(&report.content, "Total Discrepancy");
    assert_eq!(text(&range, 0, 0), "Total Discrepancy");
    assert_eq!(text(&range, 1, 4), "Grand Total");
    assert_eq!(number(&range, 2, 2), 1.0);
    assert_eq!(number(&range, 2, 3), 3.0);
    assert_eq!(number(&range, 2, 4), 4.0);

    let range = read_sheet(&report.content, "Critical Count");
    assert_eq!(text(&range, 0, 0), "Critical Documents Pending");
}

#[test]
fn test_state_count_sheet_is_sorted_and_titled() {
    let v_upload = create_upload_bytes(&[
        ("A", "X", ">60", 1.0, 0.0, 0.0),
        ("B", "X", ">365", 4.0, 0.0, 0.0),
        ("B", "Y", ">90", 2.0, 0.0, 0.0),
    ]);
    let report = create_pivot_report_from_xlsx_bytes(&v_upload, &Default::default()).unwrap();

    let range = read_sheet(&report.content, "State_Count");
    assert_eq!(text(&range, 0, 0), "PDD Pending");
    assert_eq!(text(&range, 1, 0), "State");
    assert_eq!(text(&range, 2, 0), "B");
    assert_eq!(number(&range, 2, 6), 6.0);
    assert_eq!(text(&range, 3, 0), "A");
    assert_eq!(text(&range, 4, 0), "Total");
    assert_eq!(number(&range, 4, 6), 7.0);
}

#[test]
fn test_repeated_state_labels_are_merged() {
    let v_upload = create_upload_bytes(&[
        ("A", "X", ">60", 1.0, 0.0, 0.0),
        ("A", "Y", ">60", 2.0, 0.0, 0.0),
    ]);
    let report = create_pivot_report_from_xlsx_bytes(&v_upload, &Default::default()).unwrap();

    let range = read_sheet(&report.content, "PDD Pending");
    assert_eq!(text(&range, 2, 0), "A");
    // Covered cell of the vertical merge carries no value.
    assert!(matches!(range.get_value((3, 0)), Some(Data::Empty) | None));
    assert_eq!(text(&range, 3, 1), "Y");
    assert_eq!(text(&range, 4, 0), "Total");
}

#[test]
fn test_empty_upload_yields_total_only_sheets() {
    let v_upload = create_upload_bytes(&[]);
    let report = create_pivot_report_from_xlsx_bytes(&v_upload, &Default::default()).unwrap();

    for sheet in &report.sheets {
        let range = read_sheet(&report.content, &sheet.sheet_name);
        assert_eq!(text(&range, 2, 0), "Total", "{}", sheet.sheet_name);
        assert_eq!(sheet.height_used, 3);
    }
}

#[test]
fn test_unknown_slab_is_reported_as_warning() {
    let v_upload = create_upload_bytes(&[
        ("A", "X", ">60", 5.0, 1.0, 2.0),
        ("A", "X", ">30", 9.0, 4.0, 4.0),
    ]);
    let report = create_pivot_report_from_xlsx_bytes(&v_upload, &Default::default()).unwrap();
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains(">30"));

    let range = read_sheet(&report.content, "Total Discrepancy");
    assert_eq!(number(&range, 2, 4), 11.0);
}

#[test]
fn test_garbage_upload_is_input_error() {
    let err = create_pivot_report_from_xlsx_bytes(b"plain text", &Default::default())
        .unwrap_err();
    assert!(matches!(err, ReportError::Xlsx(_)));
    assert!(err.is_input_error());
}

#[test]
fn test_title_banners_merge_across_layout_span() {
    let v_upload = create_upload_bytes(&[
        ("A", "X", ">60", 1.0, 0.0, 0.0),
        ("A", "Y", ">60", 2.0, 1.0, 0.0),
    ]);
    let report = create_pivot_report_from_xlsx_bytes(&v_upload, &Default::default()).unwrap();

    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(report.content.as_slice())).unwrap();
    workbook.load_merged_regions().unwrap();

    for (c_sheet, n_col_end) in [
        ("State_Count", 6),
        ("PDD Pending", 7),
        ("Total Discrepancy", 4),
        ("Critical Count", 7),
        ("Non Critical Count", 7),
    ] {
        let l_regions: Vec<((u32, u32), (u32, u32))> = workbook
            .merged_regions_by_sheet(c_sheet)
            .into_iter()
            .map(|(_, _, dims)| (dims.start, dims.end))
            .collect();
        assert!(
            l_regions.contains(&((0, 0), (0, n_col_end))),
            "{c_sheet}: {l_regions:?}"
        );
    }

    // Repeated `A` label merges over both data rows of two-level tables only.
    let l_regions: Vec<((u32, u32), (u32, u32))> = workbook
        .merged_regions_by_sheet("PDD Pending")
        .into_iter()
        .map(|(_, _, dims)| (dims.start, dims.end))
        .collect();
    assert!(l_regions.contains(&((2, 0), (3, 0))), "{l_regions:?}");
    assert_eq!(workbook.merged_regions_by_sheet("State_Count").len(), 1);
}

#[test]
fn test_stray_unheaded_column_is_ignored() {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    for (n_col, c_name) in TUP_HEADER.iter().enumerate() {
        worksheet.write_string(0, n_col as u16, *c_name).unwrap();
    }
    worksheet.write_string(1, 0, "A").unwrap();
    worksheet.write_string(1, 1, "X").unwrap();
    worksheet.write_string(1, 2, ">60").unwrap();
    worksheet.write_number(1, 3, 5.0).unwrap();
    worksheet.write_number(1, 4, 1.0).unwrap();
    worksheet.write_number(1, 5, 2.0).unwrap();
    worksheet.write_string(1, 7, "note").unwrap();
    let v_upload = workbook.save_to_buffer().unwrap();

    let report = create_pivot_report_from_xlsx_bytes(&v_upload, &Default::default()).unwrap();
    let range = read_sheet(&report.content, "PDD Pending");
    assert_eq!(number(&range, 2, 7), 5.0);
}


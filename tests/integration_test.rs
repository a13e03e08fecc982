//! Integration Tests for sverka
//!
//! Real `.xlsx` workbooks are generated in memory with `rust_xlsxwriter`
//! and reconciled through the public API.

use rust_xlsxwriter::*;
use std::io::Cursor;
use sverka::parser::WorkbookParser;
use sverka::{
    classify_and_parse, ComparisonMode, FileSide, InputLimits, Layout, OutputFormat, ParsedSheet,
    ReconcilerBuilder, Sheet, SheetSelector, SummaryLine,
};

/// A cell written into a fixture worksheet
#[derive(Clone, Copy)]
enum V<'a> {
    S(&'a str),
    N(f64),
    Blank,
}

// Helper module for generating test fixtures
mod fixtures {
    use super::*;

    /// Write rows into a worksheet, starting at A1
    pub fn write_rows(worksheet: &mut Worksheet, rows: &[Vec<V>]) -> Result<(), XlsxError> {
        for (row_idx, row) in rows.iter().enumerate() {
            for (col_idx, value) in row.iter().enumerate() {
                let (r, c) = (row_idx as u32, col_idx as u16);
                match value {
                    V::S(text) => {
                        worksheet.write_string(r, c, *text)?;
                    }
                    V::N(number) => {
                        worksheet.write_number(r, c, *number)?;
                    }
                    V::Blank => {}
                }
            }
        }
        Ok(())
    }

    /// Generate a single-sheet workbook
    pub fn workbook(rows: &[Vec<V>]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        write_rows(worksheet, rows)?;
        Ok(workbook.save_to_buffer()?)
    }

    /// Debit/credit export with one row per (date, amount)
    pub fn debit_credit(entries: &[(&str, f64)]) -> Result<Vec<u8>, XlsxError> {
        let mut rows = vec![
            vec![V::S("Акт звірки взаєморозрахунків")],
            vec![V::S("Дата"), V::S("Документ"), V::S("Дебет"), V::S("Кредит")],
        ];
        for &(date, amount) in entries {
            rows.push(vec![V::S(date), V::S("Оплата"), V::N(amount), V::Blank]);
        }
        rows.push(vec![V::S("Обороти за період"), V::Blank, V::N(0.0), V::N(0.0)]);
        workbook(&rows)
    }

    /// Dt/Kt export with zero fillers in the empty amount column
    pub fn dt_kt(entries: &[(&str, Vec<f64>)]) -> Result<Vec<u8>, XlsxError> {
        let mut rows = vec![vec![V::S("№"), V::S("Дата"), V::S("Дт"), V::S("Кт")]];
        for (index, (date, amounts)) in entries.iter().enumerate() {
            let mut row = vec![V::N((index + 1) as f64), V::S(*date)];
            row.extend(amounts.iter().map(|amount| V::N(*amount)));
            if amounts.len() < 2 {
                row.push(V::N(0.0));
            }
            rows.push(row);
        }
        workbook(&rows)
    }

    /// Product table ("Товар" / price / sum columns)
    pub fn products(entries: &[(&str, f64)]) -> Result<Vec<u8>, XlsxError> {
        let mut rows = vec![
            vec![V::S("Видаткова накладна № 7")],
            vec![
                V::S("№"),
                V::S("Товар"),
                V::S("Ціна без ПДВ"),
                V::S("Сума без ПДВ"),
            ],
        ];
        for (index, &(name, amount)) in entries.iter().enumerate() {
            rows.push(vec![
                V::N((index + 1) as f64),
                V::S(name),
                V::N(amount),
                V::N(amount),
            ]);
        }
        rows.push(vec![V::Blank, V::S("Разом"), V::Blank, V::N(0.0)]);
        workbook(&rows)
    }
}

fn read_first_sheet(bytes: Vec<u8>) -> Sheet {
    let mut parser = WorkbookParser::open(Cursor::new(bytes), &InputLimits::default()).unwrap();
    parser.read_sheet(&SheetSelector::Index(0)).unwrap()
}

fn unique_dates(count: usize, year: i32) -> Vec<String> {
    (0..count)
        .map(|i| format!("{:02}.{:02}.{}", i % 28 + 1, i / 28 + 1, year))
        .collect()
}

#[test]
fn test_identical_ledgers() {
    let entries = [("01.06.2024", 150.0), ("02.06.2024", 99.9), ("02.06.2024", 12.0)];
    let first = fixtures::debit_credit(&entries).unwrap();
    let second = fixtures::debit_credit(&entries).unwrap();

    let reconciler = ReconcilerBuilder::new().build().unwrap();
    let result = reconciler
        .reconcile(vec![Cursor::new(first), Cursor::new(second)])
        .unwrap();

    assert_eq!(result.mode, ComparisonMode::Ledger);
    assert!(result.is_identical());
    assert!(result.mismatches().unwrap().is_empty());
}

#[test]
fn test_extra_occurrence_reported() {
    let first = fixtures::workbook(&[
        vec![V::S("Дата"), V::S("Дебет"), V::S("Кредит")],
        vec![V::S("01.06.2024"), V::N(150.0)],
    ])
    .unwrap();
    let second = fixtures::workbook(&[
        vec![V::S("Дата"), V::S("Дебет"), V::S("Кредит")],
        vec![V::S("01.06.2024"), V::N(150.0), V::N(150.0)],
    ])
    .unwrap();

    let reconciler = ReconcilerBuilder::new().build().unwrap();
    let result = reconciler
        .reconcile(vec![Cursor::new(first), Cursor::new(second)])
        .unwrap();

    let lines: Vec<String> = result.summary.iter().map(|line| line.to_string()).collect();
    assert_eq!(lines[0], "Mismatch for key 01.06.2024");
    assert!(lines.contains(&"File 2 has 1 extra occurrence of 150.00".to_string()));
    assert_eq!(lines.last().unwrap(), "Difference: 150.00");

    let info = &result.mismatches().unwrap()["01.06.2024"];
    assert!(info.unique_rows(FileSide::First).is_empty());
    assert_eq!(
        info.unique_rows(FileSide::Second),
        &[vec!["150".to_string(), "150".to_string()]]
    );
}

#[test]
fn test_similar_product_names_merged() {
    let first = fixtures::products(&[("Крем Nivea Creme 100мл", 42.5), ("Мило дитяче", 10.0)])
        .unwrap();
    let second = fixtures::products(&[("крем nivea creme 100 мл", 45.0), ("Мило дитяче", 10.0)])
        .unwrap();

    let reconciler = ReconcilerBuilder::new().build().unwrap();
    let result = reconciler
        .reconcile(vec![Cursor::new(first), Cursor::new(second)])
        .unwrap();

    assert_eq!(result.mode, ComparisonMode::Products);
    let discrepancies = result.discrepancies().unwrap();
    assert_eq!(discrepancies.len(), 1);
    assert_eq!(discrepancies[0].product, "крем niveacreme 100мл");
    assert_eq!(discrepancies[0].amounts, vec!["42.50", "45.00"]);
    assert!((discrepancies[0].spread - 2.5).abs() < 1e-9);

    assert_eq!(
        result.summary.last(),
        Some(&SummaryLine::ProductSpread { amount: 2.5 })
    );
}

#[test]
fn test_low_key_overlap_skips_comparison() {
    let dates1 = unique_dates(50, 2024);
    let mut dates2 = unique_dates(48, 2023);
    dates2.push(dates1[0].clone());
    dates2.push(dates1[1].clone());

    let entries1: Vec<(&str, f64)> = dates1.iter().map(|d| (d.as_str(), 10.0)).collect();
    let entries2: Vec<(&str, f64)> = dates2.iter().map(|d| (d.as_str(), 10.0)).collect();
    let first = fixtures::debit_credit(&entries1).unwrap();
    let second = fixtures::debit_credit(&entries2).unwrap();

    let reconciler = ReconcilerBuilder::new().build().unwrap();
    let result = reconciler
        .reconcile(vec![Cursor::new(first), Cursor::new(second)])
        .unwrap();

    assert!(result.is_aborted());
    assert!(result.detail.is_none());
    assert_eq!(
        result.summary[0].to_string(),
        "Files have too few keys in common (4.0%), comparison skipped"
    );
    assert!(result
        .summary
        .contains(&SummaryLine::CommonKeys { count: 2 }));
}

#[test]
fn test_terminator_round_trip() {
    let bytes = fixtures::workbook(&[
        vec![V::S("Дата"), V::S("Дебет"), V::S("Кредит")],
        vec![V::S("Сальдо на 01.01.2024")],
        vec![V::S("02.01.2024"), V::N(100.0)],
        vec![V::S("03.01.2024"), V::Blank, V::N(50.0)],
        vec![V::S("04.01.2024"), V::N(75.5)],
        vec![V::S("Всього"), V::N(175.5), V::N(50.0)],
        vec![V::S("05.01.2024"), V::N(1.0)],
    ])
    .unwrap();

    match classify_and_parse(&read_first_sheet(bytes)) {
        ParsedSheet::Table { layout, table } => {
            assert_eq!(layout, Layout::DebitCredit);
            assert_eq!(table.row_count(), 3);
            assert!(!table.contains_key("01.01.2024"));
            assert!(!table.contains_key("05.01.2024"));
            assert_eq!(table.rows("04.01.2024"), &[vec!["75.5".to_string()]]);
        }
        ParsedSheet::UnknownLayout => panic!("Expected a ledger layout"),
    }
}

#[test]
fn test_dt_kt_drops_fillers_and_sequence_numbers() {
    let first = fixtures::dt_kt(&[("01.06.24", vec![150.0]), ("02.06.24", vec![20.0])]).unwrap();

    match classify_and_parse(&read_first_sheet(first)) {
        ParsedSheet::Table { layout, table } => {
            assert_eq!(layout, Layout::DtKt);
            assert_eq!(table.rows("01.06.2024"), &[vec!["150".to_string()]]);
            assert_eq!(table.rows("02.06.2024"), &[vec!["20".to_string()]]);
        }
        ParsedSheet::UnknownLayout => panic!("Expected Dt/Kt layout"),
    }
}

#[test]
fn test_mixed_layouts_reconcile() {
    let first = fixtures::debit_credit(&[("01.06.2024", 150.0), ("02.06.2024", 20.0)]).unwrap();
    let second =
        fixtures::dt_kt(&[("01.06.2024", vec![150.0]), ("02.06.2024", vec![25.0])]).unwrap();

    let reconciler = ReconcilerBuilder::new().build().unwrap();
    let result = reconciler
        .reconcile(vec![Cursor::new(first), Cursor::new(second)])
        .unwrap();

    let mismatches = result.mismatches().unwrap();
    assert_eq!(mismatches.len(), 1);
    assert!(mismatches.contains_key("02.06.2024"));
    assert!(result
        .summary
        .contains(&SummaryLine::Difference { amount: 5.0 }));
}

#[test]
fn test_prihod_rashod_with_balance_columns() {
    let bytes = fixtures::workbook(&[
        vec![
            V::S("Дата"),
            V::S("Нач. остаток"),
            V::S("Приход"),
            V::S("Расход"),
            V::S("Кон. остаток"),
        ],
        vec![V::S("01.06.2024"), V::N(1000.0), V::N(150.0), V::Blank, V::N(1150.0)],
    ])
    .unwrap();

    match classify_and_parse(&read_first_sheet(bytes)) {
        ParsedSheet::Table { layout, table } => {
            assert_eq!(layout, Layout::PrihodRashodWithBalance);
            assert_eq!(table.rows("01.06.2024"), &[vec!["150".to_string()]]);
        }
        ParsedSheet::UnknownLayout => panic!("Expected Приход/Расход layout"),
    }
}

#[test]
fn test_date_formatted_cells_become_keys() {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    let date_format = Format::new().set_num_format("dd.mm.yyyy");
    worksheet.write_string(0, 0, "Дата").unwrap();
    worksheet.write_string(0, 1, "Дебет").unwrap();
    worksheet.write_string(0, 2, "Кредит").unwrap();
    // 45444 = 2024-06-01
    worksheet
        .write_number_with_format(1, 0, 45444.0, &date_format)
        .unwrap();
    worksheet.write_number(1, 1, 150.0).unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    match classify_and_parse(&read_first_sheet(bytes)) {
        ParsedSheet::Table { table, .. } => {
            assert_eq!(table.rows("01.06.2024"), &[vec!["150".to_string()]]);
        }
        ParsedSheet::UnknownLayout => panic!("Expected a ledger layout"),
    }
}

#[test]
fn test_sheet_selection_by_name() {
    let mut workbook = Workbook::new();
    let cover = workbook.add_worksheet();
    cover.set_name("Титул").unwrap();
    cover.write_string(0, 0, "Акт звірки").unwrap();
    let act = workbook.add_worksheet();
    act.set_name("Акт").unwrap();
    fixtures::write_rows(
        act,
        &[
            vec![V::S("Дата"), V::S("Дебет"), V::S("Кредит")],
            vec![V::S("01.06.2024"), V::N(150.0)],
        ],
    )
    .unwrap();
    let bytes = workbook.save_to_buffer().unwrap();

    let mut parser = WorkbookParser::open(Cursor::new(bytes), &InputLimits::default()).unwrap();
    assert_eq!(parser.sheet_names(), vec!["Титул", "Акт"]);

    let sheet = parser
        .read_sheet(&SheetSelector::Name("Акт".to_string()))
        .unwrap();
    assert_eq!(sheet.name, "Акт");
    assert!(matches!(
        classify_and_parse(&sheet),
        ParsedSheet::Table {
            layout: Layout::DebitCredit,
            ..
        }
    ));
}

#[test]
fn test_render_formats() {
    let first = fixtures::debit_credit(&[("01.06.2024", 150.0)]).unwrap();
    let second = fixtures::debit_credit(&[("01.06.2024", 150.0), ("01.06.2024", 150.0)]).unwrap();

    let text = ReconcilerBuilder::new().build().unwrap();
    let result = text
        .reconcile(vec![Cursor::new(first), Cursor::new(second)])
        .unwrap();

    let plain = text.render_to_string(&result).unwrap();
    assert!(plain.starts_with("Mismatch for key 01.06.2024\n"));
    assert!(plain.contains("  File 2 has 1 extra occurrence of 150.00\n"));

    let markdown = ReconcilerBuilder::new()
        .with_output_format(OutputFormat::Markdown)
        .build()
        .unwrap();
    let report = markdown.render_to_string(&result).unwrap();
    assert!(report.starts_with("# Reconciliation report\n"));
    assert!(report.contains("- Mismatch for key 01.06.2024\n"));
    assert!(report.contains("### 01.06.2024"));
    assert!(report.contains("| File | Values"));

    let json = ReconcilerBuilder::new()
        .with_output_format(OutputFormat::Json)
        .build()
        .unwrap();
    let rendered = json.render_to_string(&result).unwrap();
    let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
    assert_eq!(value["mode"], "ledger");
    assert_eq!(value["summary"][0]["kind"], "key_mismatch");
    assert_eq!(value["summary"][0]["key"], "01.06.2024");
}

#[test]
fn test_render_identical_result() {
    let entries = [("01.06.2024", 150.0)];
    let first = fixtures::debit_credit(&entries).unwrap();
    let second = fixtures::debit_credit(&entries).unwrap();

    let reconciler = ReconcilerBuilder::new().build().unwrap();
    let result = reconciler
        .reconcile(vec![Cursor::new(first), Cursor::new(second)])
        .unwrap();
    assert_eq!(
        reconciler.render_to_string(&result).unwrap(),
        "No differences found\n"
    );
}

#[test]
fn test_reconcile_from_files() {
    use std::fs::File;
    use std::io::Write;
    use tempfile::NamedTempFile;

    let entries = [("01.06.2024", 150.0), ("03.06.2024", 80.0)];
    let mut file1 = NamedTempFile::new().unwrap();
    file1
        .write_all(&fixtures::debit_credit(&entries).unwrap())
        .unwrap();
    let mut file2 = NamedTempFile::new().unwrap();
    file2
        .write_all(&fixtures::debit_credit(&entries[..1]).unwrap())
        .unwrap();

    let reconciler = ReconcilerBuilder::new().build().unwrap();
    let inputs = vec![
        File::open(file1.path()).unwrap(),
        File::open(file2.path()).unwrap(),
    ];
    let result = reconciler.reconcile(inputs).unwrap();

    let mismatches = result.mismatches().unwrap();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(
        mismatches["03.06.2024"].unique_rows(FileSide::First),
        &[vec!["Оплата".to_string(), "80".to_string()]]
    );
}

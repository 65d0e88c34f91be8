mod common;

use common::xlsx;
use linch_office_edit::sheet::CellFormat;
use linch_office_edit::xml::S;
use linch_office_edit::{CellValue, EditorConfig, Error, Package, PartUri, Workbook};
use pretty_assertions::assert_eq;

fn sales() -> Workbook {
    Workbook::from_bytes(&xlsx(&[
        ("Sales", &[&["Region", "Total"], &["North 2024", "120"], &["South 2024", "80"]]),
        ("Notes", &[&["Reviewed 2024"]]),
    ]))
    .unwrap()
}

fn reopen(book: &mut Workbook) -> Workbook {
    Workbook::from_bytes(&book.to_bytes().unwrap()).unwrap()
}

#[test]
fn test_lists_sheets_with_extents() {
    let book = sales();
    let sheets = book.list_sheets();
    assert_eq!(sheets.len(), 2);
    assert_eq!(sheets[0].name, "Sales");
    assert_eq!((sheets[0].max_row, sheets[0].max_col), (3, 2));
    assert!(sheets[0].active);
    assert!(!sheets[1].active);
}

#[test]
fn test_reads_inline_and_numeric_cells() {
    let book = sales();
    assert_eq!(book.cell_value("Sales", "A2").unwrap().as_deref(), Some("North 2024"));
    assert_eq!(book.cell_value("Sales", "B2").unwrap().as_deref(), Some("120"));
    assert_eq!(book.cell_value("Sales", "Z99").unwrap(), None);
    assert!(matches!(book.cell_value("Sales", "2A"), Err(Error::InvalidCellRef(_))));
}

#[test]
fn test_update_cell_round_trips() {
    let mut book = sales();
    assert!(book.update_cell("Sales", "B3", &CellValue::Number(95.5)).unwrap());
    assert!(book.update_cell("Sales", "C1", &CellValue::Text("Owner".into())).unwrap());
    assert!(!book.update_cell("Missing", "A1", &CellValue::Bool(true)).unwrap());

    let book = reopen(&mut book);
    assert_eq!(book.cell_value("Sales", "B3").unwrap().as_deref(), Some("95.5"));
    assert_eq!(book.cell_value("Sales", "C1").unwrap().as_deref(), Some("Owner"));
    assert_eq!(book.list_sheets()[0].max_col, 3);
}

#[test]
fn test_replace_counts_cells_and_respects_sheet_filter() {
    let mut book = sales();
    assert_eq!(book.replace_text("2024", "2025", Some("Sales")), 2);
    assert_eq!(book.cell_value("Notes", "A1").unwrap().as_deref(), Some("Reviewed 2024"));

    assert_eq!(book.replace_text("2024", "2025", None), 1);
    assert_eq!(book.replace_text("2024", "2025", None), 0);
    assert_eq!(book.replace_text("x", "y", Some("Nope")), 0);
}

#[test]
fn test_find_reports_sheet_and_cell() {
    let book = sales();
    let hits = book.find_cells("2024", None);
    let cells: Vec<(String, String)> = hits.into_iter().map(|m| (m.sheet, m.cell)).collect();
    assert_eq!(
        cells,
        vec![
            ("Sales".to_string(), "A2".to_string()),
            ("Sales".to_string(), "A3".to_string()),
            ("Notes".to_string(), "A1".to_string()),
        ]
    );
    assert!(book.find_cells("2024", Some("Notes")).len() == 1);
    assert!(book.find_cells("", None).is_empty());
}

#[test]
fn test_add_row_appends_or_inserts() {
    let mut book = sales();
    book.add_row("Sales", &[CellValue::from("West"), CellValue::Number(10.0)], None)
        .unwrap();
    assert_eq!(book.cell_value("Sales", "A4").unwrap().as_deref(), Some("West"));

    book.add_row("Sales", &[CellValue::from("East")], Some(2)).unwrap();
    assert_eq!(book.cell_value("Sales", "A2").unwrap().as_deref(), Some("East"));
    assert_eq!(book.cell_value("Sales", "A3").unwrap().as_deref(), Some("North 2024"));
    assert_eq!(book.list_sheets()[0].max_row, 5);

    assert!(book.add_row("Sales", &[], Some(0)).is_err());
}

#[test]
fn test_delete_row_shifts_rows_up() {
    let mut book = sales();
    assert!(book.delete_row("Sales", 2).unwrap());
    assert_eq!(book.cell_value("Sales", "A2").unwrap().as_deref(), Some("South 2024"));
    assert_eq!(book.list_sheets()[0].max_row, 2);

    assert!(!book.delete_row("Sales", 10).unwrap());
    assert!(!book.delete_row("Sales", 0).unwrap());
}

#[test]
fn test_formula_is_stored_without_equals() {
    let mut book = sales();
    assert!(book.set_formula("Sales", "B4", "=SUM(B2:B3)").unwrap());
    assert_eq!(book.cell_value("Sales", "B4").unwrap().as_deref(), Some("=SUM(B2:B3)"));
    assert!(book.set_formula("Sales", "B5", "=").is_err());
}

#[test]
fn test_overwriting_shared_formula_master_keeps_dependents_valid() {
    let mut package = Package::from_bytes(&xlsx(&[("S", &[&["x"]])])).unwrap();
    let sheet = format!(
        r#"<worksheet xmlns="{S}"><sheetData><row r="1"><c r="A1"><f t="shared" ref="A1:A2" si="0">B1*2</f><v>2</v></c><c r="B1"><v>1</v></c></row><row r="2"><c r="A2"><f t="shared" si="0"/><v>4</v></c><c r="B2"><v>2</v></c></row></sheetData></worksheet>"#
    );
    package
        .part_mut(&PartUri::new("/xl/worksheets/sheet1.xml").unwrap())
        .unwrap()
        .set_data(sheet.into_bytes());
    let mut book = Workbook::from_package(package, EditorConfig::default()).unwrap();

    assert!(book.update_cell("S", "A1", &CellValue::Number(5.0)).unwrap());

    let book = reopen(&mut book);
    assert_eq!(book.cell_value("S", "A1").unwrap().as_deref(), Some("5"));
    assert_eq!(book.cell_value("S", "A2").unwrap().as_deref(), Some("=B2*2"));
    let formula = book
        .worksheet("S")
        .unwrap()
        .root()
        .find("f")
        .unwrap();
    assert_eq!(formula.attr("t"), None);
}

#[test]
fn test_format_creates_styles_part() {
    let mut book = sales();
    let format = CellFormat {
        bold: true,
        bg_color: Some("#FFFF00".into()),
        ..CellFormat::default()
    };
    assert!(book.set_format("Sales", "A1", &format).unwrap());

    let book = reopen(&mut book);
    assert!(book
        .package()
        .part_uris()
        .any(|u| u.to_string() == "/xl/styles.xml"));
    assert_eq!(book.cell_value("Sales", "A1").unwrap().as_deref(), Some("Region"));
}

#[test]
fn test_rejected_format_leaves_workbook_untouched() {
    let mut book = sales();
    for format in [
        CellFormat {
            bg_color: Some("zzz".into()),
            ..CellFormat::default()
        },
        CellFormat {
            alignment: Some("middle".into()),
            ..CellFormat::default()
        },
        CellFormat {
            font_size: 0.0,
            ..CellFormat::default()
        },
    ] {
        assert!(matches!(book.set_format("Sales", "A1", &format), Err(Error::InvalidArgument(_))));
    }

    let book = reopen(&mut book);
    assert!(!book
        .package()
        .part_uris()
        .any(|u| u.to_string() == "/xl/styles.xml"));
}

#[test]
fn test_sheets_can_be_added_and_deleted() {
    let mut book = sales();
    book.add_sheet("Summary", Some(0)).unwrap();
    assert_eq!(book.sheet_names(), vec!["Summary", "Sales", "Notes"]);

    assert!(matches!(book.add_sheet("sales", None), Err(Error::DuplicateSheet(_))));
    assert!(matches!(book.add_sheet("a/b", None), Err(Error::InvalidSheetName(_))));

    assert!(book.delete_sheet("Notes").unwrap());
    assert!(!book.delete_sheet("Notes").unwrap());

    let book = reopen(&mut book);
    assert_eq!(book.sheet_names(), vec!["Summary", "Sales"]);
}

#[test]
fn test_last_sheet_cannot_be_deleted() {
    let mut book = Workbook::from_bytes(&xlsx(&[("Only", &[&["x"]])])).unwrap();
    assert!(matches!(book.delete_sheet("Only"), Err(Error::LastSheet(_))));
    assert_eq!(book.sheet_count(), 1);
}

#[test]
fn test_view_is_clipped() {
    let book = sales();
    let view = book.view_sheet(None, 2).unwrap();
    assert_eq!(view.name, "Sales");
    assert_eq!(view.rows, vec![vec!["Region", "Total"], vec!["North 2024", "120"]]);
    assert_eq!(view.total_rows, 3);
    assert!(book.view_sheet(Some("Missing"), 10).is_none());
}

#[test]
fn test_saves_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "book.xlsx", &xlsx(&[("Data", &[&["old"]])]));

    let mut book = Workbook::open(&path).unwrap();
    book.replace_text("old", "new", None);
    book.save(&path).unwrap();

    let book = Workbook::open(&path).unwrap();
    assert_eq!(book.cell_value("Data", "A1").unwrap().as_deref(), Some("new"));
}

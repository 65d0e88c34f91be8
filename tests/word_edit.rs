mod common;

use common::{docx, para, table};
use linch_office_edit::word::{Alignment, BlockKind, ParagraphFormat};
use linch_office_edit::{Document, EditorConfig, Error};
use pretty_assertions::assert_eq;

fn report() -> Document {
    Document::from_bytes(&docx(&[
        para("Intro", Some("Heading1")),
        para("2024 Results", None),
        para("Summary", Some("Heading2")),
        para("Closing words", None),
    ]))
    .unwrap()
}

fn texts(doc: &Document) -> Vec<String> {
    doc.paragraphs().map(|p| p.text()).collect()
}

#[test]
fn test_replace_counts_occurrences() {
    let mut doc = report();
    assert_eq!(doc.replace_text("2024", "2025"), 1);
    assert_eq!(doc.paragraph(1).unwrap().text(), "2025 Results");

    assert_eq!(doc.replace_text("1999", "2000"), 0);
    assert_eq!(doc.replace_text("", "x"), 0);
}

#[test]
fn test_replace_reaches_table_cells() {
    let mut doc = Document::from_bytes(&docx(&[
        para("Totals 2024", None),
        table(&[&["Year", "2024"], &["2024 sum", "7"]]),
    ]))
    .unwrap();

    assert_eq!(doc.replace_text("2024", "2025"), 3);
    let grid = doc.table(0).unwrap().to_text_grid();
    assert_eq!(grid[0][1], "2025");
    assert_eq!(grid[1][0], "2025 sum");
}

#[test]
fn test_insert_after_places_paragraph_next_to_anchor() {
    let mut doc = report();
    let at = doc.insert_after("Results", "Revenue grew.", None).unwrap();
    assert_eq!(at, Some(2));
    assert_eq!(
        texts(&doc),
        vec!["Intro", "2024 Results", "Revenue grew.", "Summary", "Closing words"]
    );
}

#[test]
fn test_insert_after_missing_anchor_changes_nothing() {
    let mut doc = report();
    assert_eq!(doc.insert_after("Nowhere", "text", None).unwrap(), None);
    assert_eq!(doc.paragraph_count(), 4);
}

#[test]
fn test_insert_after_rejects_bad_heading_level() {
    let mut doc = report();
    let err = doc.insert_after("Intro", "x", Some(12)).unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
}

#[test]
fn test_inserted_heading_is_detected_as_heading() {
    let mut doc = report();
    doc.insert_after("Closing", "Appendix", Some(1)).unwrap();
    let last = doc.paragraphs().last().unwrap();
    assert_eq!(doc.block_kind(last), BlockKind::Heading(1));
}

#[test]
fn test_insert_after_heading_skips_body_paragraphs() {
    let mut doc = Document::from_bytes(&docx(&[
        para("Summary of work", None),
        para("Summary", Some("Heading2")),
        para("body", None),
    ]))
    .unwrap();

    let at = doc.insert_after_heading("Summary", "Key points", false, None).unwrap();
    assert_eq!(at, Some(2));
    assert_eq!(texts(&doc), vec!["Summary of work", "Summary", "Key points", "body"]);
}

#[test]
fn test_bullets_keep_their_order() {
    let mut doc = report();
    let items = vec!["first".to_string(), "second".to_string()];
    doc.insert_bullets("Summary", &items).unwrap();

    assert_eq!(
        texts(&doc),
        vec!["Intro", "2024 Results", "Summary", "• first", "• second", "Closing words"]
    );
}

#[test]
fn test_bullet_prefix_comes_from_config() {
    let config = EditorConfig {
        bullet_prefix: "- ".into(),
        ..EditorConfig::default()
    };
    let package = linch_office_edit::Package::from_bytes(&docx(&[para("Notes", Some("Heading1"))])).unwrap();
    let mut doc = Document::from_package(package, config).unwrap();
    doc.insert_bullets("Notes", &["one".to_string()]).unwrap();
    assert_eq!(doc.paragraph(1).unwrap().text(), "- one");
}

#[test]
fn test_empty_bullet_list_is_rejected() {
    let mut doc = report();
    assert!(doc.insert_bullets("Summary", &[]).is_err());
}

#[test]
fn test_delete_removes_first_match_only() {
    let mut doc = Document::from_bytes(&docx(&[
        para("draft one", None),
        para("keep", None),
        para("draft two", None),
    ]))
    .unwrap();

    assert!(doc.delete_paragraph("draft").unwrap());
    assert_eq!(texts(&doc), vec!["keep", "draft two"]);
    assert!(!doc.delete_paragraph("absent").unwrap());
}

#[test]
fn test_table_is_inserted_after_anchor() {
    let mut doc = report();
    let data: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    doc.insert_table(2, 2, &data, Some("Results")).unwrap();

    assert_eq!(doc.table_count(), 1);
    assert_eq!(
        doc.table(0).unwrap().to_text_grid(),
        vec![vec!["a", "b"], vec!["c", "d"]]
    );
    assert!(doc.insert_table(0, 3, &[], None).is_err());
}

#[test]
fn test_update_table_cell_in_and_out_of_range() {
    let mut doc = Document::from_bytes(&docx(&[table(&[&["Name", "Score"], &["Ann", "1"]])])).unwrap();

    assert!(doc.update_table_cell(0, 1, 1, "42"));
    assert_eq!(doc.table(0).unwrap().to_text_grid()[1][1], "42");

    assert!(!doc.update_table_cell(0, 5, 0, "x"));
    assert!(!doc.update_table_cell(3, 0, 0, "x"));
}

#[test]
fn test_page_break_paragraph_is_reported() {
    let mut doc = report();
    doc.insert_page_break(Some("Intro")).unwrap();
    let second = doc.paragraph(1).unwrap();
    assert_eq!(doc.block_kind(second), BlockKind::PageBreak);
}

#[test]
fn test_paragraph_format_touches_every_run() {
    let mut doc = report();
    let format = ParagraphFormat {
        font_size: Some(14.0),
        bold: Some(true),
        alignment: Some(Alignment::Center),
        ..ParagraphFormat::default()
    };
    assert!(doc.set_paragraph_format("Closing", &format).unwrap());

    let para = doc.paragraph(3).unwrap();
    for run in para.runs() {
        assert!(run.bold());
        assert_eq!(run.font_size_pt(), Some(14.0));
    }
}

#[test]
fn test_edits_survive_save_and_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = common::write(dir.path(), "report.docx", &docx(&[para("2024 Results", None)]));

    let mut doc = Document::open(&path).unwrap();
    doc.replace_text("2024", "2025");
    doc.insert_after("Results", "Revenue grew.", None).unwrap();
    doc.save(&path).unwrap();

    let reopened = Document::open(&path).unwrap();
    assert_eq!(texts(&reopened), vec!["2025 Results", "Revenue grew."]);
}

#[test]
fn test_image_is_embedded_as_media_part() {
    let dir = tempfile::tempdir().unwrap();
    let png = dir.path().join("dot.png");
    image::RgbImage::new(4, 2).save(&png).unwrap();

    let mut doc = report();
    let at = doc.insert_image(&png, 5.0, Some("Summary")).unwrap();
    assert_eq!(at, Some(3));

    let bytes = doc.to_bytes().unwrap();
    let package = linch_office_edit::Package::from_bytes(&bytes).unwrap();
    assert!(package.part_uris().any(|u| u.to_string() == "/word/media/image1.png"));
}

#[test]
fn test_missing_image_is_an_error() {
    let mut doc = report();
    let err = doc
        .insert_image(std::path::Path::new("/no/such/picture.png"), 5.0, None)
        .unwrap_err();
    assert!(matches!(err, Error::FileNotFound(_)));
}

#[test]
fn test_reverse_replacement_restores_text() {
    let mut doc = Document::from_bytes(&docx(&[para("cat and cat", None), para("catalog", None)])).unwrap();
    let before = texts(&doc);

    assert_eq!(doc.replace_text("cat", "dog"), 3);
    assert_eq!(doc.replace_text("dog", "cat"), 3);
    assert_eq!(texts(&doc), before);
}

#[test]
fn test_single_cell_update_leaves_neighbours() {
    let mut doc = Document::from_bytes(&docx(&[table(&[&["A", "B"], &["C", "D"]])])).unwrap();
    assert!(doc.update_table_cell(0, 0, 1, "Z"));
    assert_eq!(
        doc.table(0).unwrap().to_text_grid(),
        vec![vec!["A", "Z"], vec!["C", "D"]]
    );
}

#[test]
fn test_bullets_follow_heading_directly() {
    let mut doc = Document::from_bytes(&docx(&[
        para("Section 1", Some("Heading1")),
        para("Existing", None),
    ]))
    .unwrap();
    let items: Vec<String> = ["x", "y", "z"].iter().map(|s| s.to_string()).collect();
    assert_eq!(doc.insert_bullets("Section 1", &items).unwrap(), Some(1));
    assert_eq!(texts(&doc), vec!["Section 1", "• x", "• y", "• z", "Existing"]);
}

#[test]
fn test_new_document_uses_configured_fonts() {
    let mut config = EditorConfig::default();
    config.format.font_ascii = "Georgia".into();
    let mut doc = Document::new(config).unwrap();
    assert_eq!(doc.paragraph_count(), 0);

    let package = linch_office_edit::Package::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    let styles = package
        .part(&linch_office_edit::PartUri::new("/word/styles.xml").unwrap())
        .unwrap();
    assert!(styles.text().unwrap().contains("Georgia"));
}

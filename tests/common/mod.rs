//! In-memory DOCX/XLSX/PPTX builders for the integration tests

#![allow(dead_code)]

use linch_office_edit::opc::{rel_types, Package, Part, PartUri, PRESENTATION, SLIDE, WORD_DOCUMENT, WORD_STYLES, WORKBOOK, WORKSHEET};
use linch_office_edit::xml::{A, P, R, S, W};
use std::path::{Path, PathBuf};

const SLIDE_MASTER: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml";
const SLIDE_LAYOUT: &str = "application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn uri(path: &str) -> PartUri {
    PartUri::new(path).unwrap()
}

/// A paragraph in a test document: text plus an optional style id
pub fn para(text: &str, style: Option<&str>) -> String {
    let ppr = style
        .map(|s| format!(r#"<w:pPr><w:pStyle w:val="{s}"/></w:pPr>"#))
        .unwrap_or_default();
    format!(r#"<w:p>{ppr}<w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, escape(text))
}

/// A table whose cells hold one paragraph each
pub fn table(rows: &[&[&str]]) -> String {
    let mut xml = String::from("<w:tbl><w:tblPr/><w:tblGrid>");
    for _ in 0..rows.first().map_or(0, |r| r.len()) {
        xml.push_str(r#"<w:gridCol w:w="2000"/>"#);
    }
    xml.push_str("</w:tblGrid>");
    for row in rows {
        xml.push_str("<w:tr>");
        for cell in *row {
            xml.push_str(&format!("<w:tc>{}</w:tc>", para(cell, None)));
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// DOCX bytes with the given body blocks and a styles part defining
/// `Heading1`/`Heading2`
pub fn docx(blocks: &[String]) -> Vec<u8> {
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{W}" xmlns:r="{R}"><w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
        blocks.concat()
    );
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:styles xmlns:w="{W}"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/></w:style></w:styles>"#
    );

    let mut package = Package::new();
    let doc_uri = uri("/word/document.xml");
    let styles_uri = uri("/word/styles.xml");
    package.add_part(Part::new(doc_uri.clone(), WORD_DOCUMENT, document.into_bytes()));
    package.add_part(Part::new(styles_uri.clone(), WORD_STYLES, styles.into_bytes()));
    package.relationships_mut().add(rel_types::OFFICE_DOCUMENT, "word/document.xml");
    package.relate(&doc_uri, rel_types::STYLES, &styles_uri).unwrap();
    package.to_bytes().unwrap()
}

/// XLSX bytes with one sheet per `(name, rows)`; cells are inline strings
/// or numbers
pub fn xlsx(sheets: &[(&str, &[&[&str]])]) -> Vec<u8> {
    let mut package = Package::new();
    let book_uri = uri("/xl/workbook.xml");
    package.add_part(Part::new(book_uri.clone(), WORKBOOK, Vec::new()));
    package.relationships_mut().add(rel_types::OFFICE_DOCUMENT, "xl/workbook.xml");

    let mut entries = String::new();
    for (i, (name, rows)) in sheets.iter().enumerate() {
        let mut data = String::new();
        for (r, row) in rows.iter().enumerate() {
            data.push_str(&format!(r#"<row r="{}">"#, r + 1));
            for (c, value) in row.iter().enumerate() {
                let at = format!("{}{}", (b'A' + c as u8) as char, r + 1);
                if value.parse::<f64>().is_ok() {
                    data.push_str(&format!(r#"<c r="{at}"><v>{value}</v></c>"#));
                } else {
                    data.push_str(&format!(
                        r#"<c r="{at}" t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape(value)
                    ));
                }
            }
            data.push_str("</row>");
        }
        let sheet = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="{S}"><sheetData>{data}</sheetData></worksheet>"#
        );
        let sheet_uri = uri(&format!("/xl/worksheets/sheet{}.xml", i + 1));
        package.add_part(Part::new(sheet_uri.clone(), WORKSHEET, sheet.into_bytes()));
        let rel_id = package.relate(&book_uri, rel_types::WORKSHEET, &sheet_uri).unwrap();
        entries.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="{rel_id}"/>"#,
            escape(name),
            i + 1
        ));
    }

    let workbook = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="{S}" xmlns:r="{R}"><bookViews><workbookView activeTab="0"/></bookViews><sheets>{entries}</sheets></workbook>"#
    );
    package.part_mut(&book_uri).unwrap().set_data(workbook.into_bytes());
    package.to_bytes().unwrap()
}

fn title_shape(id: u32, text: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Title {id}"/><p:cNvSpPr/><p:nvPr><p:ph type="title"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/><a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>"#,
        escape(text)
    )
}

fn body_shape(id: u32, lines: &[&str]) -> String {
    let paragraphs: String = lines
        .iter()
        .map(|l| format!("<a:p><a:r><a:t>{}</a:t></a:r></a:p>", escape(l)))
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Content {id}"/><p:cNvSpPr/><p:nvPr><p:ph idx="1"/></p:nvPr></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#
    )
}

fn sp_tree(shapes: &str) -> String {
    format!(
        r#"<p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld>"#
    )
}

/// PPTX bytes with one slide per `(title, body lines)` and a master with
/// two layouts ("Title Slide", "Title and Content")
pub fn pptx(slides: &[(&str, &[&str])]) -> Vec<u8> {
    let mut package = Package::new();
    let pres_uri = uri("/ppt/presentation.xml");
    package.add_part(Part::new(pres_uri.clone(), PRESENTATION, Vec::new()));
    package.relationships_mut().add(rel_types::OFFICE_DOCUMENT, "ppt/presentation.xml");

    let master_uri = uri("/ppt/slideMasters/slideMaster1.xml");
    package.add_part(Part::new(master_uri.clone(), SLIDE_MASTER, Vec::new()));
    let master_rel = package.relate(&pres_uri, rel_types::SLIDE_MASTER, &master_uri).unwrap();

    let mut layout_ids = String::new();
    let mut layouts = Vec::new();
    for (i, name) in ["Title Slide", "Title and Content"].iter().enumerate() {
        let shapes = if i == 0 {
            title_shape(2, "Click to edit title")
        } else {
            format!(
                "{}{}{}",
                title_shape(2, "Click to edit title"),
                body_shape(3, &["Click to edit text"]),
                r#"<p:sp><p:nvSpPr><p:cNvPr id="4" name="Footer 3"/><p:cNvSpPr/><p:nvPr><p:ph type="ftr" idx="11"/></p:nvPr></p:nvSpPr><p:spPr/></p:sp>"#
            )
        };
        let layout = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldLayout xmlns:a="{A}" xmlns:r="{R}" xmlns:p="{P}"><p:cSld name="{name}"><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{shapes}</p:spTree></p:cSld></p:sldLayout>"#
        );
        let layout_uri = uri(&format!("/ppt/slideLayouts/slideLayout{}.xml", i + 1));
        package.add_part(Part::new(layout_uri.clone(), SLIDE_LAYOUT, layout.into_bytes()));
        package.relate(&layout_uri, rel_types::SLIDE_MASTER, &master_uri).unwrap();
        let rel_id = package.relate(&master_uri, rel_types::SLIDE_LAYOUT, &layout_uri).unwrap();
        layout_ids.push_str(&format!(r#"<p:sldLayoutId id="{}" r:id="{rel_id}"/>"#, 2147483649u32 + i as u32));
        layouts.push(layout_uri);
    }
    let master = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sldMaster xmlns:a="{A}" xmlns:r="{R}" xmlns:p="{P}">{}<p:sldLayoutIdLst>{layout_ids}</p:sldLayoutIdLst></p:sldMaster>"#,
        sp_tree("")
    );
    package.part_mut(&master_uri).unwrap().set_data(master.into_bytes());

    let mut slide_ids = String::new();
    for (i, (title, lines)) in slides.iter().enumerate() {
        let shapes = format!("{}{}", title_shape(2, title), body_shape(3, lines));
        let slide = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:sld xmlns:a="{A}" xmlns:r="{R}" xmlns:p="{P}">{}</p:sld>"#,
            sp_tree(&shapes)
        );
        let slide_uri = uri(&format!("/ppt/slides/slide{}.xml", i + 1));
        package.add_part(Part::new(slide_uri.clone(), SLIDE, slide.into_bytes()));
        package.relate(&slide_uri, rel_types::SLIDE_LAYOUT, &layouts[1]).unwrap();
        let rel_id = package.relate(&pres_uri, rel_types::SLIDE, &slide_uri).unwrap();
        slide_ids.push_str(&format!(r#"<p:sldId id="{}" r:id="{rel_id}"/>"#, 256 + i));
    }

    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:a="{A}" xmlns:r="{R}" xmlns:p="{P}"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="{master_rel}"/></p:sldMasterIdLst><p:sldIdLst>{slide_ids}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#
    );
    package.part_mut(&pres_uri).unwrap().set_data(presentation.into_bytes());
    package.to_bytes().unwrap()
}

/// Write `bytes` to `dir/name` and return the path
pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, bytes).unwrap();
    path
}

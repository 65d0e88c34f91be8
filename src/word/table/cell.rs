//! Table cell elements (w:tc)

use crate::error::Result;
use crate::word::body::{read_blocks, BlockContent};
use crate::word::{Paragraph, Run, Table};
use crate::xml::{collect_attrs, RawXmlElement};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Table cell (w:tc)
#[derive(Clone, Debug, Default)]
pub struct TableCell {
    /// Attributes of the w:tc tag
    pub attrs: Vec<(String, String)>,
    /// Cell properties (w:tcPr)
    pub properties: Option<RawXmlElement>,
    /// Cell content: paragraphs and nested tables
    pub content: Vec<BlockContent>,
}

impl TableCell {
    /// Empty cell with a fixed width in twips
    pub fn with_width(width: u32) -> Self {
        let tc_w = RawXmlElement::new("w:tcW")
            .with_attr("w:w", width.to_string())
            .with_attr("w:type", "dxa");
        TableCell {
            properties: Some(RawXmlElement::new("w:tcPr").with_child(tc_w)),
            content: vec![BlockContent::Paragraph(Paragraph::default())],
            ..Default::default()
        }
    }

    /// Parse from reader
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let (content, properties) = read_blocks(reader, b"tc", b"tcPr")?;
        Ok(TableCell {
            attrs: collect_attrs(start),
            properties,
            content,
        })
    }

    /// Paragraphs directly inside the cell
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(BlockContent::as_paragraph)
    }

    /// Paragraphs directly inside the cell, mutably
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.content.iter_mut().filter_map(BlockContent::as_paragraph_mut)
    }

    /// Tables nested in the cell
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.content.iter().filter_map(BlockContent::as_table)
    }

    /// Text of the cell's paragraphs, one per line
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Replace the cell content with a single paragraph of text.
    ///
    /// The first paragraph's properties and its first run's properties are
    /// carried over so the cell keeps its look.
    pub fn set_text(&mut self, text: &str) {
        let first = self.paragraphs().next();
        let para_props = first.and_then(|p| p.properties.clone());
        let run_props = first
            .and_then(|p| p.runs().first().and_then(|r| r.properties.clone()));

        let mut run = Run::new(text);
        run.properties = run_props;
        let mut para = Paragraph {
            properties: para_props,
            ..Default::default()
        };
        para.add_run(run);

        self.content = vec![BlockContent::Paragraph(para)];
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:tc");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }
        for block in &self.content {
            block.write_to(writer)?;
        }
        // A cell must end with a paragraph
        if !matches!(self.content.last(), Some(BlockContent::Paragraph(_))) {
            Paragraph::default().write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:tc")))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_cell(xml: &str) -> TableCell {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            if let Event::Start(e) = reader.read_event_into(&mut buf).unwrap() {
                return TableCell::from_reader(&mut reader, &e.into_owned()).unwrap();
            }
        }
    }

    #[test]
    fn test_set_text_keeps_formatting() {
        let mut cell = parse_cell(
            r#"<w:tc><w:tcPr><w:tcW w:w="100" w:type="dxa"/></w:tcPr><w:p><w:pPr><w:jc w:val="center"/></w:pPr><w:r><w:rPr><w:b/></w:rPr><w:t>old</w:t></w:r></w:p><w:p><w:r><w:t>more</w:t></w:r></w:p></w:tc>"#,
        );
        assert_eq!(cell.text(), "old\nmore");

        cell.set_text("new");

        assert_eq!(cell.text(), "new");
        let para = cell.paragraphs().next().unwrap();
        assert_eq!(para.properties.as_ref().unwrap().justification(), Some("center"));
        assert!(para.runs()[0].bold());
        assert!(cell.properties.is_some());
    }
}

//! Document body and block-level content

use crate::error::Result;
use crate::word::{Paragraph, Table};
use crate::xml::{RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Block-level content in a document body or table cell
#[derive(Clone, Debug)]
pub enum BlockContent {
    /// Paragraph
    Paragraph(Paragraph),
    /// Table
    Table(Table),
    /// Unknown element (preserved for round-trip)
    Unknown(RawXmlNode),
}

/// Document body (w:body)
#[derive(Clone, Debug, Default)]
pub struct Body {
    /// Block-level content
    pub content: Vec<BlockContent>,
    /// Section properties (last sectPr in body)
    pub section_properties: Option<RawXmlElement>,
}

impl BlockContent {
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            BlockContent::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_paragraph_mut(&mut self) -> Option<&mut Paragraph> {
        match self {
            BlockContent::Paragraph(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            BlockContent::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_table_mut(&mut self) -> Option<&mut Table> {
        match self {
            BlockContent::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            BlockContent::Paragraph(p) => p.write_to(writer),
            BlockContent::Table(t) => t.write_to(writer),
            BlockContent::Unknown(node) => node.write_to(writer),
        }
    }
}

/// Read block-level children until the end tag `end`; the element named
/// `props` (sectPr for a body, tcPr for a cell) is split out
pub(crate) fn read_blocks<R: BufRead>(
    reader: &mut Reader<R>,
    end: &[u8],
    props: &[u8],
) -> Result<(Vec<BlockContent>, Option<RawXmlElement>)> {
    let mut content = Vec::new();
    let mut properties = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let local = e.name().local_name();
                match local.as_ref() {
                    b"p" => content.push(BlockContent::Paragraph(Paragraph::from_reader(reader, &e)?)),
                    b"tbl" => content.push(BlockContent::Table(Table::from_reader(reader, &e)?)),
                    name if name == props => {
                        properties = Some(RawXmlElement::from_reader(reader, &e)?);
                    }
                    _ => {
                        let raw = RawXmlElement::from_reader(reader, &e)?;
                        content.push(BlockContent::Unknown(RawXmlNode::Element(raw)));
                    }
                }
            }
            Event::Empty(e) => {
                let local = e.name().local_name();
                match local.as_ref() {
                    b"p" => content.push(BlockContent::Paragraph(Paragraph::from_empty(&e))),
                    name if name == props => properties = Some(RawXmlElement::from_empty(&e)),
                    _ => {
                        let raw = RawXmlElement::from_empty(&e);
                        content.push(BlockContent::Unknown(RawXmlNode::Element(raw)));
                    }
                }
            }
            Event::End(e) => {
                if e.name().local_name().as_ref() == end {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok((content, properties))
}

impl Body {
    /// Parse body from XML reader (after w:body start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>) -> Result<Self> {
        let (content, section_properties) = read_blocks(reader, b"body", b"sectPr")?;
        Ok(Body {
            content,
            section_properties,
        })
    }

    /// Top-level paragraphs, in document order
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(BlockContent::as_paragraph)
    }

    /// Top-level paragraphs, mutably
    pub fn paragraphs_mut(&mut self) -> impl Iterator<Item = &mut Paragraph> {
        self.content.iter_mut().filter_map(BlockContent::as_paragraph_mut)
    }

    /// Top-level tables, in document order
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.content.iter().filter_map(BlockContent::as_table)
    }

    /// Top-level tables, mutably
    pub fn tables_mut(&mut self) -> impl Iterator<Item = &mut Table> {
        self.content.iter_mut().filter_map(BlockContent::as_table_mut)
    }

    /// Body index of the paragraph with the given ordinal
    pub fn paragraph_position(&self, ordinal: usize) -> Option<usize> {
        self.content
            .iter()
            .enumerate()
            .filter(|(_, block)| block.as_paragraph().is_some())
            .nth(ordinal)
            .map(|(index, _)| index)
    }

    /// Insert a block at a body index (clamped to the end)
    pub fn insert(&mut self, index: usize, block: BlockContent) {
        let index = index.min(self.content.len());
        self.content.insert(index, block);
    }

    /// Append a block at the end of the body
    pub fn push(&mut self, block: BlockContent) {
        self.content.push(block);
    }

    /// Remove the block at a body index
    pub fn remove(&mut self, index: usize) -> Option<BlockContent> {
        (index < self.content.len()).then(|| self.content.remove(index))
    }

    /// Text of the top-level paragraphs, one per line
    pub fn text(&self) -> String {
        self.paragraphs()
            .map(|p| p.text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("w:body")))?;

        for block in &self.content {
            block.write_to(writer)?;
        }
        if let Some(sect) = &self.section_properties {
            sect.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:body")))?;
        Ok(())
    }
}

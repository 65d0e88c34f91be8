//! Table row elements (w:tr)

use crate::error::Result;
use crate::xml::{collect_attrs, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

use super::cell::TableCell;

/// Table row (w:tr)
#[derive(Clone, Debug, Default)]
pub struct TableRow {
    /// Attributes of the w:tr tag
    pub attrs: Vec<(String, String)>,
    /// tblPrEx / trPr and anything else before the first cell
    pub properties: Vec<RawXmlNode>,
    /// Cells
    pub cells: Vec<TableCell>,
    /// Children after the first cell that are not cells
    pub unknown_children: Vec<RawXmlNode>,
}

impl TableRow {
    /// Create a new row with empty cells of the given width (twips)
    pub fn new(cell_count: usize, cell_width: u32) -> Self {
        TableRow {
            cells: (0..cell_count).map(|_| TableCell::with_width(cell_width)).collect(),
            ..Default::default()
        }
    }

    /// Parse from reader
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut row = TableRow {
            attrs: collect_attrs(start),
            ..Default::default()
        };
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    if e.name().local_name().as_ref() == b"tc" {
                        row.cells.push(TableCell::from_reader(reader, &e)?);
                    } else {
                        let raw = RawXmlElement::from_reader(reader, &e)?;
                        row.keep(RawXmlNode::Element(raw));
                    }
                }
                Event::Empty(e) => {
                    if e.name().local_name().as_ref() == b"tc" {
                        row.cells.push(TableCell::default());
                    } else {
                        row.keep(RawXmlNode::Element(RawXmlElement::from_empty(&e)));
                    }
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"tr" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(row)
    }

    fn keep(&mut self, node: RawXmlNode) {
        if self.cells.is_empty() {
            self.properties.push(node);
        } else {
            self.unknown_children.push(node);
        }
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:tr");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        for node in &self.properties {
            node.write_to(writer)?;
        }
        for cell in &self.cells {
            cell.write_to(writer)?;
        }
        for node in &self.unknown_children {
            node.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:tr")))?;
        Ok(())
    }
}

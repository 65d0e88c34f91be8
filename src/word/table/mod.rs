//! Table elements (w:tbl, w:tr, w:tc)

mod cell;
mod row;

pub use cell::TableCell;
pub use row::TableRow;

use crate::error::{Error, Result};
use crate::xml::{collect_attrs, get_attr, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Usable text width of an A4/Letter page with default margins, in twips
const TEXT_WIDTH_TWIPS: u32 = 9026;
/// Word refuses tables wider than this
pub const MAX_TABLE_COLUMNS: usize = 63;
/// Word's row limit for a single table
pub const MAX_TABLE_ROWS: usize = 32_767;

const BORDER_EDGES: &[&str] = &["top", "left", "bottom", "right", "insideH", "insideV"];

/// Grid column definition (w:gridCol)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridColumn {
    /// Width in twips
    pub width: Option<u32>,
}

/// Table element (w:tbl)
#[derive(Clone, Debug, Default)]
pub struct Table {
    /// Table properties (w:tblPr)
    pub properties: Option<RawXmlElement>,
    /// Table grid
    pub grid: Vec<GridColumn>,
    /// Table rows
    pub rows: Vec<TableRow>,
    /// Other children (bookmarks, custom XML), written after the rows
    pub unknown_children: Vec<RawXmlNode>,
}

impl Table {
    /// Reject tables Word cannot hold, before anything is allocated for them
    pub fn check_dimensions(rows: usize, cols: usize) -> Result<()> {
        if rows == 0 || cols == 0 || rows > MAX_TABLE_ROWS || cols > MAX_TABLE_COLUMNS {
            return Err(Error::InvalidArgument(format!(
                "table must be 1-{MAX_TABLE_ROWS} rows by 1-{MAX_TABLE_COLUMNS} columns, got {rows}x{cols}"
            )));
        }
        Ok(())
    }

    /// Create a new table with the specified number of rows and columns
    pub fn new(rows: usize, cols: usize) -> Self {
        let width = column_width(cols);
        Table {
            grid: vec![GridColumn { width: Some(width) }; cols],
            rows: (0..rows).map(|_| TableRow::new(cols, width)).collect(),
            ..Default::default()
        }
    }

    /// Create a table with the `TableGrid` style and single-line borders,
    /// filled row-major from `data`. Surplus values are dropped and missing
    /// ones leave the cell empty.
    pub fn with_data(rows: usize, cols: usize, data: &[String]) -> Self {
        let mut table = Table::new(rows, cols);
        table.properties = Some(grid_properties());

        for (i, value) in data.iter().take(rows * cols).enumerate() {
            if let Some(cell) = table.cell_mut(i / cols, i % cols) {
                cell.set_text(value.as_str());
            }
        }
        table
    }

    /// Parse from reader (after w:tbl start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, _start: &BytesStart) -> Result<Self> {
        let mut table = Table::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let local = e.name().local_name();

                    match local.as_ref() {
                        b"tblPr" => {
                            table.properties = Some(RawXmlElement::from_reader(reader, &e)?);
                        }
                        b"tblGrid" => {
                            table.grid = parse_table_grid(reader)?;
                        }
                        b"tr" => {
                            let row = TableRow::from_reader(reader, &e)?;
                            table.rows.push(row);
                        }
                        _ => {
                            let raw = RawXmlElement::from_reader(reader, &e)?;
                            table.unknown_children.push(RawXmlNode::Element(raw));
                        }
                    }
                }
                Event::Empty(e) => match e.name().local_name().as_ref() {
                    b"tblPr" => table.properties = Some(RawXmlElement::from_empty(&e)),
                    b"tblGrid" => {}
                    b"tr" => table.rows.push(TableRow {
                        attrs: collect_attrs(&e),
                        ..Default::default()
                    }),
                    _ => {
                        let raw = RawXmlElement::from_empty(&e);
                        table.unknown_children.push(RawXmlNode::Element(raw));
                    }
                },
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"tbl" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(table)
    }

    /// Get row count
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get column count (based on first row)
    pub fn column_count(&self) -> usize {
        self.rows.first().map(|r| r.cells.len()).unwrap_or(0)
    }

    /// Get cell at position
    pub fn cell(&self, row: usize, col: usize) -> Option<&TableCell> {
        self.rows.get(row)?.cells.get(col)
    }

    /// Get mutable cell at position
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row)?.cells.get_mut(col)
    }

    /// Cell texts, row by row
    pub fn to_text_grid(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| row.cells.iter().map(TableCell::text).collect())
            .collect()
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        writer.write_event(Event::Start(BytesStart::new("w:tbl")))?;

        if let Some(props) = &self.properties {
            props.write_to(writer)?;
        }

        if self.grid.is_empty() {
            writer.write_event(Event::Empty(BytesStart::new("w:tblGrid")))?;
        } else {
            writer.write_event(Event::Start(BytesStart::new("w:tblGrid")))?;
            for col in &self.grid {
                let mut start = BytesStart::new("w:gridCol");
                if let Some(w) = col.width {
                    start.push_attribute(("w:w", w.to_string().as_str()));
                }
                writer.write_event(Event::Empty(start))?;
            }
            writer.write_event(Event::End(BytesEnd::new("w:tblGrid")))?;
        }

        for row in &self.rows {
            row.write_to(writer)?;
        }
        for child in &self.unknown_children {
            child.write_to(writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new("w:tbl")))?;
        Ok(())
    }
}

fn grid_properties() -> RawXmlElement {
    let mut borders = RawXmlElement::new("w:tblBorders");
    for edge in BORDER_EDGES {
        borders.push_child(
            RawXmlElement::new(format!("w:{edge}"))
                .with_attr("w:val", "single")
                .with_attr("w:sz", "4")
                .with_attr("w:space", "0")
                .with_attr("w:color", "auto"),
        );
    }

    RawXmlElement::new("w:tblPr")
        .with_child(RawXmlElement::new("w:tblStyle").with_attr("w:val", "TableGrid"))
        .with_child(
            RawXmlElement::new("w:tblW")
                .with_attr("w:w", "0")
                .with_attr("w:type", "auto"),
        )
        .with_child(borders)
        .with_child(
            RawXmlElement::new("w:tblLook")
                .with_attr("w:val", "04A0")
                .with_attr("w:firstRow", "1")
                .with_attr("w:lastRow", "0")
                .with_attr("w:firstColumn", "1")
                .with_attr("w:lastColumn", "0")
                .with_attr("w:noHBand", "0")
                .with_attr("w:noVBand", "1"),
        )
}

/// Parse table grid columns
fn parse_table_grid<R: BufRead>(reader: &mut Reader<R>) -> Result<Vec<GridColumn>> {
    let mut grid = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Empty(e) | Event::Start(e) if e.name().local_name().as_ref() == b"gridCol" => {
                let width = get_attr(&e, "w:w").and_then(|w| w.parse().ok());
                grid.push(GridColumn { width });
            }
            Event::End(e) if e.name().local_name().as_ref() == b"tblGrid" => break,
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(grid)
}

/// Even share of the text width for each of `cols` columns
fn column_width(cols: usize) -> u32 {
    TEXT_WIDTH_TWIPS / u32::try_from(cols).unwrap_or(u32::MAX).max(1)
}

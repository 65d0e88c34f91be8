//! Relationships handling for OPC packages
//!
//! Parses and generates `.rels` files

use crate::error::{Error, Result};
use crate::xml::{collect_attrs, PR};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::Write;

/// Collection of relationships, in document order
#[derive(Clone, Debug)]
pub struct Relationships {
    items: Vec<Relationship>,
    /// Next auto-generated ID number
    next_id: u32,
}

impl Default for Relationships {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_id: 1,
        }
    }
}

/// A single relationship
#[derive(Clone, Debug, PartialEq)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Target mode
    pub target_mode: TargetMode,
}

/// Target mode for relationships
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TargetMode {
    /// Internal target (part within the package)
    #[default]
    Internal,
    /// External target (hyperlink, etc.)
    External,
}

impl Relationships {
    /// Create empty relationships
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from XML string
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut rels = Self::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => {
                    if e.name().local_name().as_ref() == b"Relationship" {
                        rels.items.push(parse_relationship(&e)?);
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        rels.update_next_id();
        Ok(rels)
    }

    /// Write to a writer
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new(writer);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut rels_elem = BytesStart::new("Relationships");
        rels_elem.push_attribute(("xmlns", PR));
        xml.write_event(Event::Start(rels_elem))?;

        for rel in &self.items {
            let mut rel_elem = BytesStart::new("Relationship");
            rel_elem.push_attribute(("Id", rel.id.as_str()));
            rel_elem.push_attribute(("Type", rel.rel_type.as_str()));
            rel_elem.push_attribute(("Target", rel.target.as_str()));

            if rel.target_mode == TargetMode::External {
                rel_elem.push_attribute(("TargetMode", "External"));
            }

            xml.write_event(Event::Empty(rel_elem))?;
        }

        xml.write_event(Event::End(BytesEnd::new("Relationships")))?;

        Ok(())
    }

    /// Get a relationship by ID
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// Get a relationship by type (returns first match)
    pub fn by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// Get all relationships of a given type
    pub fn all_by_type<'a>(&'a self, rel_type: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.items.iter().filter(move |r| r.rel_type == rel_type)
    }

    /// Add an internal relationship (auto-generates ID)
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let id = self.generate_id();
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: TargetMode::Internal,
        });
        id
    }

    /// Remove a relationship by ID
    pub fn remove(&mut self, id: &str) -> Option<Relationship> {
        let pos = self.items.iter().position(|r| r.id == id)?;
        Some(self.items.remove(pos))
    }

    /// Iterate over all relationships
    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.items.iter()
    }

    /// Number of relationships
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn generate_id(&mut self) -> String {
        // Skip ids a hand-written rels file may already use out of sequence
        loop {
            let id = format!("rId{}", self.next_id);
            self.next_id += 1;
            if self.get(&id).is_none() {
                return id;
            }
        }
    }

    fn update_next_id(&mut self) {
        let max_id = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        self.next_id = max_id + 1;
    }
}

fn parse_relationship(element: &BytesStart) -> Result<Relationship> {
    let mut id = None;
    let mut rel_type = None;
    let mut target = None;
    let mut target_mode = TargetMode::Internal;

    for (key, value) in collect_attrs(element) {
        match key.as_str() {
            "Id" => id = Some(value),
            "Type" => rel_type = Some(value),
            "Target" => target = Some(value),
            "TargetMode" if value == "External" => target_mode = TargetMode::External,
            _ => {}
        }
    }

    let missing = |attr: &str| Error::MissingAttribute {
        element: "Relationship".into(),
        attr: attr.into(),
    };

    Ok(Relationship {
        id: id.ok_or_else(|| missing("Id"))?,
        rel_type: rel_type.ok_or_else(|| missing("Type"))?,
        target: target.ok_or_else(|| missing("Target"))?,
        target_mode,
    })
}

/// Well-known relationship types
pub mod rel_types {
    pub const OFFICE_DOCUMENT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
    pub const STYLES: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
    pub const IMAGE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";
    pub const HYPERLINK: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink";
    pub const WORKSHEET: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
    pub const SHARED_STRINGS: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
    pub const CALC_CHAIN: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/calcChain";
    pub const SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";
    pub const SLIDE_LAYOUT: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout";
    pub const SLIDE_MASTER: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideMaster";
    pub const NOTES_SLIDE: &str =
        "http://schemas.openxmlformats.org/officeDocument/2006/relationships/notesSlide";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn to_xml(rels: &Relationships) -> String {
        let mut buf = Vec::new();
        rels.write_to(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_parse_relationships() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/hyperlink" Target="https://example.com/?a=1&amp;b=2" TargetMode="External"/>
</Relationships>"#;

        let rels = Relationships::from_xml(xml).unwrap();

        assert_eq!(rels.len(), 2);
        assert_eq!(rels.get("rId1").unwrap().target, "xl/workbook.xml");

        let r2 = rels.get("rId2").unwrap();
        assert_eq!(r2.target, "https://example.com/?a=1&b=2");
        assert_eq!(r2.target_mode, TargetMode::External);
    }

    #[test]
    fn test_order_is_stable_through_roundtrip() {
        let mut rels = Relationships::new();
        rels.add(rel_types::WORKSHEET, "worksheets/sheet1.xml");
        rels.add(rel_types::WORKSHEET, "worksheets/sheet2.xml");
        rels.add(rel_types::STYLES, "styles.xml");

        let rels2 = Relationships::from_xml(&to_xml(&rels)).unwrap();
        let targets: Vec<_> = rels2.iter().map(|r| r.target.as_str()).collect();
        assert_eq!(
            targets,
            vec!["worksheets/sheet1.xml", "worksheets/sheet2.xml", "styles.xml"]
        );
        assert_eq!(rels2.all_by_type(rel_types::WORKSHEET).count(), 2);
    }

    #[test]
    fn test_auto_id_continues_after_existing() {
        let xml = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId7" Type="t" Target="a.xml"/>
</Relationships>"#;
        let mut rels = Relationships::from_xml(xml).unwrap();
        assert_eq!(rels.add(rel_types::SLIDE, "slides/slide2.xml"), "rId8");
        assert!(rels.remove("rId7").is_some());
        assert_eq!(rels.len(), 1);
    }
}

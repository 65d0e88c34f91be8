//! Word documents: the WordprocessingML model and the editing operations
//! built on it

mod body;
mod image;
mod locate;
mod mutate;
mod paragraph;
mod replace;
mod run;
mod styles;
mod table;

pub use body::{BlockContent, Body};
pub use locate::{locate, Anchor, AnchorScope};
pub use mutate::{OutlineEntry, ParagraphFormat};
pub use paragraph::{
    heading_level_of_style, Alignment, BlockKind, Hyperlink, Paragraph, ParagraphContent,
    ParagraphProperties,
};
pub use replace::{replace_in_body, ReplaceScope};
pub use run::{BreakType, Run, RunContent, RunProperties};
pub use styles::StyleCatalog;
pub use table::{GridColumn, Table, TableCell, TableRow};

use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::opc::{rel_types, Package, Part, PartUri, WORD_DOCUMENT};
use crate::xml::{self, collect_attrs, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::Cursor;
use std::path::Path;

/// A DOCX document
#[derive(Debug)]
pub struct Document {
    /// Underlying OPC package
    package: Package,
    /// URI of the main document part
    main_uri: PartUri,
    /// Root element name and attributes (namespace declarations, mc:Ignorable)
    root: RawXmlElement,
    /// Children of the root before and after w:body (w:background, ...)
    before_body: Vec<RawXmlNode>,
    after_body: Vec<RawXmlNode>,
    /// Parsed document body
    body: Body,
    styles: StyleCatalog,
    config: EditorConfig,
}

impl Document {
    /// Open a document from a file path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, EditorConfig::default())
    }

    /// Open a document from a file path with an explicit configuration
    pub fn open_with<P: AsRef<Path>>(path: P, config: EditorConfig) -> Result<Self> {
        let package = Package::open(path)?;
        Self::from_package(package, config)
    }

    /// Open a document from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(bytes)?;
        Self::from_package(package, EditorConfig::default())
    }

    /// Create document from an OPC package
    pub fn from_package(package: Package, config: EditorConfig) -> Result<Self> {
        let main_uri = package.main_part_uri()?;
        let part = package
            .part(&main_uri)
            .ok_or_else(|| Error::MissingPart(main_uri.to_string()))?;
        let parsed = parse_document_xml(part.text()?)?;

        let styles = match package.related_by_type(&main_uri, rel_types::STYLES) {
            Some(uri) if package.contains(&uri) => StyleCatalog::from_xml(&package.read_xml(&uri)?),
            _ => StyleCatalog::default(),
        };

        log::debug!(
            "parsed {} with {} body blocks",
            main_uri,
            parsed.body.content.len()
        );

        Ok(Self {
            package,
            main_uri,
            root: parsed.root,
            before_body: parsed.before_body,
            after_body: parsed.after_body,
            body: parsed.body,
            styles,
            config,
        })
    }

    /// Create a new empty document whose default formatting comes from
    /// `config.format`
    pub fn new(config: EditorConfig) -> Result<Self> {
        let mut package = Package::new();
        let main_uri = PartUri::new("/word/document.xml")?;
        let mut root = RawXmlElement::new("w:document");
        for (attr, value) in xml::document_namespaces() {
            root.set_attr(attr, value);
        }

        package.add_part(Part::new(main_uri.clone(), WORD_DOCUMENT, Vec::new()));
        package
            .relationships_mut()
            .add(rel_types::OFFICE_DOCUMENT, "word/document.xml");

        let mut doc = Self {
            package,
            main_uri,
            root,
            before_body: Vec::new(),
            after_body: Vec::new(),
            body: Body::default(),
            styles: StyleCatalog::default(),
            config,
        };
        doc.create_styles_part()?;
        doc.flush()?;
        Ok(doc)
    }

    /// Save the document to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush()?;
        self.package.save(path)
    }

    /// Save the document to bytes
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    /// Write the body back into the main part, keeping its relationships
    fn flush(&mut self) -> Result<()> {
        let data = self.serialize()?;
        self.package
            .part_mut(&self.main_uri)
            .ok_or_else(|| Error::PartNotFound(self.main_uri.to_string()))?
            .set_data(data);
        Ok(())
    }

    fn serialize(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut start = BytesStart::new(self.root.name.as_str());
        for (key, value) in &self.root.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;

        for node in &self.before_body {
            node.write_to(&mut writer)?;
        }
        self.body.write_to(&mut writer)?;
        for node in &self.after_body {
            node.write_to(&mut writer)?;
        }

        writer.write_event(Event::End(BytesEnd::new(self.root.name.as_str())))?;
        Ok(writer.into_inner().into_inner())
    }

    /// Get all top-level paragraphs
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.body.paragraphs()
    }

    /// Get paragraph count
    pub fn paragraph_count(&self) -> usize {
        self.body.paragraphs().count()
    }

    /// Get paragraph by ordinal
    pub fn paragraph(&self, index: usize) -> Option<&Paragraph> {
        self.body.paragraphs().nth(index)
    }

    /// Get all top-level tables
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.body.tables()
    }

    /// Get table count
    pub fn table_count(&self) -> usize {
        self.body.tables().count()
    }

    /// Get table by index
    pub fn table(&self, index: usize) -> Option<&Table> {
        self.body.tables().nth(index)
    }

    /// Get all text in the document
    pub fn text(&self) -> String {
        self.body.text()
    }

    /// Heading level of a paragraph, resolving its style through styles.xml
    pub fn heading_level(&self, para: &Paragraph) -> Option<u8> {
        para.heading_level_with(|id| self.styles.heading_level(id))
    }

    /// Classify a paragraph, resolving its style through styles.xml
    pub fn block_kind(&self, para: &Paragraph) -> BlockKind {
        para.kind_with(|id| self.styles.heading_level(id))
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Body {
        &mut self.body
    }

    /// Get the underlying package
    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }
}

/// document.xml split around its body
struct DocumentXml {
    root: RawXmlElement,
    before_body: Vec<RawXmlNode>,
    after_body: Vec<RawXmlNode>,
    body: Body,
}

/// Parse document.xml content
fn parse_document_xml(xml: &str) -> Result<DocumentXml> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();
    let mut root: Option<RawXmlElement> = None;
    let mut body: Option<Body> = None;
    let mut before_body = Vec::new();
    let mut after_body = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if root.is_none() {
                    root = Some(RawXmlElement {
                        name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
                        attributes: collect_attrs(&e),
                        ..Default::default()
                    });
                } else if e.name().local_name().as_ref() == b"body" && body.is_none() {
                    body = Some(Body::from_reader(&mut reader)?);
                } else {
                    let raw = RawXmlNode::Element(RawXmlElement::from_reader(&mut reader, &e)?);
                    if body.is_none() {
                        before_body.push(raw);
                    } else {
                        after_body.push(raw);
                    }
                }
            }
            Event::Empty(e) if root.is_some() => {
                let raw = RawXmlNode::Element(RawXmlElement::from_empty(&e));
                if e.name().local_name().as_ref() == b"body" {
                    body = Some(Body::default());
                } else if body.is_none() {
                    before_body.push(raw);
                } else {
                    after_body.push(raw);
                }
            }
            Event::End(_) | Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    let mut root = root.ok_or_else(|| Error::InvalidDocument("empty document part".into()))?;
    let body = body.ok_or_else(|| Error::InvalidDocument("Missing w:body element".into()))?;

    // Inserted drawings need these prefixes bound
    for (attr, value) in xml::document_namespaces() {
        if root.attr(attr).is_none() {
            root.set_attr(attr, value);
        }
    }

    Ok(DocumentXml {
        root,
        before_body,
        after_body,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SIMPLE_DOC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006" mc:Ignorable="w14">
  <w:background w:color="FFFFFF"/>
  <w:body>
    <w:p>
      <w:r>
        <w:t>Hello, World!</w:t>
      </w:r>
    </w:p>
    <w:p>
      <w:pPr>
        <w:pStyle w:val="Heading1"/>
      </w:pPr>
      <w:r>
        <w:rPr>
          <w:b/>
        </w:rPr>
        <w:t>This is a heading</w:t>
      </w:r>
    </w:p>
  </w:body>
</w:document>"#;

    #[test]
    fn test_parse_simple_document() {
        let parsed = parse_document_xml(SIMPLE_DOC).unwrap();
        let paras: Vec<_> = parsed.body.paragraphs().collect();

        assert_eq!(paras.len(), 2);
        assert_eq!(paras[0].text(), "Hello, World!");
        assert_eq!(paras[1].text(), "This is a heading");
        assert_eq!(paras[1].style(), Some("Heading1"));
        assert!(paras[1].runs()[0].bold());
        assert_eq!(parsed.before_body.len(), 1);
    }

    #[test]
    fn test_root_attributes_are_kept_and_completed() {
        let parsed = parse_document_xml(SIMPLE_DOC).unwrap();

        assert_eq!(parsed.root.name, "w:document");
        assert_eq!(parsed.root.attr("mc:Ignorable"), Some("w14"));
        assert_eq!(parsed.root.attr("xmlns:wp"), Some(xml::WP));
    }

    #[test]
    fn test_missing_body() {
        let result = parse_document_xml("<w:document xmlns:w=\"x\"></w:document>");
        assert!(matches!(result, Err(Error::InvalidDocument(_))));
    }
}

//! Content Types handling for OPC packages
//!
//! Parses and generates `[Content_Types].xml`

use crate::error::{Error, Result};
use crate::opc::PartUri;
use crate::xml::CT;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeMap;
use std::io::Write;

/// Content types definition for an OPC package
#[derive(Clone, Debug, Default)]
pub struct ContentTypes {
    /// Default extension mappings (extension -> content type)
    defaults: BTreeMap<String, String>,
    /// Override mappings (part URI -> content type)
    overrides: BTreeMap<PartUri, String>,
}

impl ContentTypes {
    /// Create a new ContentTypes with standard defaults
    pub fn new() -> Self {
        let mut ct = Self::default();
        ct.add_default("rels", RELATIONSHIPS);
        ct.add_default("xml", XML);
        ct
    }

    /// Parse from XML string
    pub fn from_xml(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut ct = Self::default();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Empty(e) | Event::Start(e) => match e.name().local_name().as_ref() {
                    b"Default" => {
                        let ext = required_attr(&e, "Extension")?;
                        let content_type = required_attr(&e, "ContentType")?;
                        ct.defaults.insert(ext.to_lowercase(), content_type);
                    }
                    b"Override" => {
                        let part_name = required_attr(&e, "PartName")?;
                        let content_type = required_attr(&e, "ContentType")?;
                        ct.overrides.insert(PartUri::new(&part_name)?, content_type);
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(ct)
    }

    /// Write to a writer
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut xml = Writer::new(writer);

        xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;

        let mut types = BytesStart::new("Types");
        types.push_attribute(("xmlns", CT));
        xml.write_event(Event::Start(types))?;

        for (ext, content_type) in &self.defaults {
            let mut default = BytesStart::new("Default");
            default.push_attribute(("Extension", ext.as_str()));
            default.push_attribute(("ContentType", content_type.as_str()));
            xml.write_event(Event::Empty(default))?;
        }

        for (uri, content_type) in &self.overrides {
            let mut override_elem = BytesStart::new("Override");
            override_elem.push_attribute(("PartName", uri.as_str()));
            override_elem.push_attribute(("ContentType", content_type.as_str()));
            xml.write_event(Event::Empty(override_elem))?;
        }

        xml.write_event(Event::End(BytesEnd::new("Types")))?;

        Ok(())
    }

    /// Add a default extension mapping
    pub fn add_default(&mut self, extension: &str, content_type: &str) {
        self.defaults
            .insert(extension.to_lowercase(), content_type.to_string());
    }

    /// Whether an extension already has a default mapping
    pub fn has_default(&self, extension: &str) -> bool {
        self.defaults.contains_key(&extension.to_lowercase())
    }

    /// Add an override for a specific part
    pub fn add_override(&mut self, uri: &PartUri, content_type: &str) {
        self.overrides.insert(uri.clone(), content_type.to_string());
    }

    /// Get the content type for a part
    pub fn get(&self, uri: &PartUri) -> Option<&str> {
        if let Some(ct) = self.overrides.get(uri) {
            return Some(ct);
        }

        uri.extension()
            .and_then(|ext| self.defaults.get(&ext.to_lowercase()))
            .map(|s| s.as_str())
    }

    /// Remove an override
    pub fn remove_override(&mut self, uri: &PartUri) -> Option<String> {
        self.overrides.remove(uri)
    }
}

/// Content type for an image file extension, if it is one we embed
pub fn image_content_type(extension: &str) -> Option<&'static str> {
    match extension.to_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "bmp" => Some("image/bmp"),
        _ => None,
    }
}

fn required_attr(element: &BytesStart, name: &str) -> Result<String> {
    crate::xml::get_attr(element, name).ok_or_else(|| Error::MissingAttribute {
        element: String::from_utf8_lossy(element.name().as_ref()).to_string(),
        attr: name.to_string(),
    })
}

// Well-known content types
pub const RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const XML: &str = "application/xml";
pub const WORD_DOCUMENT: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml";
pub const WORD_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml";
pub const WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub const WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub const SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
pub const SHEET_STYLES: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub const PRESENTATION: &str =
    "application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml";
pub const SLIDE: &str = "application/vnd.openxmlformats-officedocument.presentationml.slide+xml";

#[cfg(test)]
mod tests {
    use super::*;

    fn to_xml(ct: &ContentTypes) -> String {
        let mut buf = Vec::new();
        ct.write_to(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_parse_content_types() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
</Types>"#;

        let ct = ContentTypes::from_xml(xml).unwrap();

        assert!(ct.has_default("RELS"));
        let wb = PartUri::new("/xl/workbook.xml").unwrap();
        assert_eq!(ct.get(&wb), Some(WORKBOOK));
        let other = PartUri::new("/xl/theme/theme1.xml").unwrap();
        assert_eq!(ct.get(&other), Some(XML));
    }

    #[test]
    fn test_roundtrip_and_remove() {
        let mut ct = ContentTypes::new();
        let slide = PartUri::new("/ppt/slides/slide1.xml").unwrap();
        ct.add_override(&slide, SLIDE);

        let mut ct2 = ContentTypes::from_xml(&to_xml(&ct)).unwrap();
        assert_eq!(ct2.get(&slide), Some(SLIDE));

        ct2.remove_override(&slide);
        assert_eq!(ct2.get(&slide), Some(XML));
    }

    #[test]
    fn test_image_content_type() {
        assert_eq!(image_content_type("JPG"), Some("image/jpeg"));
        assert_eq!(image_content_type("svg"), None);
    }
}

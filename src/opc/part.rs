//! A single entry of an office package: bytes, content type and the
//! relationships it owns

use crate::error::Result;
use crate::opc::{PartUri, Relationship, Relationships};
use crate::xml::{parse_xml, write_xml, RawXmlElement};

#[derive(Clone, Debug)]
pub struct Part {
    uri: PartUri,
    content_type: String,
    data: Vec<u8>,
    relationships: Option<Relationships>,
}

impl Part {
    pub fn new(uri: PartUri, content_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            uri,
            content_type: content_type.into(),
            data,
            relationships: None,
        }
    }

    pub fn uri(&self) -> &PartUri {
        &self.uri
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Raw bytes as stored in the zip
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Replace the bytes; relationships are kept
    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data = data;
    }

    /// Content of an XML part as text
    pub fn text(&self) -> Result<&str> {
        Ok(std::str::from_utf8(&self.data)?)
    }

    /// Parse the part into a raw element tree
    pub fn xml(&self) -> Result<RawXmlElement> {
        parse_xml(self.text()?)
    }

    /// Serialize `root` into the part
    pub fn set_xml(&mut self, root: &RawXmlElement) -> Result<()> {
        self.data = write_xml(root)?;
        Ok(())
    }

    /// Relationships owned by this part, if it has a `.rels` file
    pub fn relationships(&self) -> Option<&Relationships> {
        self.relationships.as_ref()
    }

    /// Relationships to write next to the part; empty sets are skipped
    pub(crate) fn relationships_to_write(&self) -> Option<&Relationships> {
        self.relationships.as_ref().filter(|rels| !rels.is_empty())
    }

    pub(crate) fn attach_relationships(&mut self, rels: Relationships) {
        self.relationships = Some(rels);
    }

    /// Add a relationship to `target` (already relative to this part) and
    /// return its new id
    pub fn relate(&mut self, rel_type: &str, target: &str) -> String {
        self.relationships
            .get_or_insert_with(Relationships::new)
            .add(rel_type, target)
    }

    /// Drop the relationship `rel_id`; parts without relationships are left as is
    pub fn unrelate(&mut self, rel_id: &str) -> Option<Relationship> {
        self.relationships.as_mut()?.remove(rel_id)
    }
}

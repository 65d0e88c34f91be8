//! Shared string table (xl/sharedStrings.xml)

use crate::error::Result;
use crate::opc::{rel_types, Package, Part, PartUri, SHARED_STRINGS};
use crate::xml::{RawXmlElement, S};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct SharedStrings {
    uri: Option<PartUri>,
    root: Option<RawXmlElement>,
    items: Vec<String>,
    lookup: HashMap<String, usize>,
    dirty: bool,
}

impl SharedStrings {
    /// Load the table the workbook points at; a workbook without one gets
    /// an empty table that is only written once a string is added
    pub fn load(package: &Package, workbook: &PartUri) -> Result<Self> {
        let Some(uri) = package.related_by_type(workbook, rel_types::SHARED_STRINGS) else {
            return Ok(Self::default());
        };
        if !package.contains(&uri) {
            return Ok(Self::default());
        }
        let root = package.read_xml(&uri)?;

        let items: Vec<String> = root.children_named("si").map(item_text).collect();
        let mut lookup = HashMap::new();
        for (i, text) in items.iter().enumerate() {
            lookup.entry(text.clone()).or_insert(i);
        }

        Ok(Self {
            uri: Some(uri),
            root: Some(root),
            items,
            lookup,
            dirty: false,
        })
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.items.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Index of `text`, appending it when it is not in the table yet
    pub fn intern(&mut self, text: &str) -> usize {
        if let Some(&index) = self.lookup.get(text) {
            return index;
        }
        let index = self.items.len();
        self.items.push(text.to_string());
        self.lookup.insert(text.to_string(), index);

        let root = self
            .root
            .get_or_insert_with(|| RawXmlElement::new("sst").with_attr("xmlns", S));
        let mut t = RawXmlElement::new(root.qualified("t"));
        if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
            t.set_attr("xml:space", "preserve");
        }
        t.set_text(text);
        let si = RawXmlElement::new(root.qualified("si")).with_child(t);
        root.push_child(si);

        self.dirty = true;
        index
    }

    /// Write the table back, creating the part when needed
    pub fn save(&mut self, package: &mut Package, workbook: &PartUri) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let Some(root) = self.root.as_mut() else {
            return Ok(());
        };
        // count is optional and would need a scan of every sheet to be exact
        root.remove_attr("count");
        root.set_attr("uniqueCount", self.items.len().to_string());

        let uri = match &self.uri {
            Some(uri) => uri.clone(),
            None => {
                let uri = PartUri::new("/xl/sharedStrings.xml")?;
                package.add_part(Part::new(uri.clone(), SHARED_STRINGS, Vec::new()));
                package.relate(workbook, rel_types::SHARED_STRINGS, &uri)?;
                self.uri = Some(uri.clone());
                uri
            }
        };
        package.write_xml(&uri, root)?;
        self.dirty = false;
        Ok(())
    }
}

/// Visible text of an `si` item: plain `t` plus rich-text runs, without
/// phonetic hints
fn item_text(si: &RawXmlElement) -> String {
    let mut text = String::new();
    for child in si.elements() {
        if child.is("t") {
            text.push_str(&child.text());
        } else if child.is("r") {
            if let Some(t) = child.child("t") {
                text.push_str(&t.text());
            }
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_xml;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_rich_text_and_phonetics() {
        let si = parse_xml("<si><r><t>Hel</t></r><r><rPr><b/></rPr><t>lo</t></r><rPh><t>x</t></rPh></si>").unwrap();
        assert_eq!(item_text(&si), "Hello");
    }

    #[test]
    fn test_intern_reuses_and_appends() {
        let mut strings = SharedStrings::default();
        assert_eq!(strings.intern("a"), 0);
        assert_eq!(strings.intern("b"), 1);
        assert_eq!(strings.intern("a"), 0);
        assert_eq!(strings.len(), 2);
        assert_eq!(strings.get(1), Some("b"));
    }
}

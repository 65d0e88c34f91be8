//! Raw XML node types for round-trip preservation
//!
//! Word keeps a typed model for the body, but spreadsheet and presentation
//! parts (and every Word element the typed model does not know) live in this
//! small owned tree. Children are addressed by local name so that prefixed
//! and unprefixed serializations (`x:row` vs `row`) are handled alike.

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::{BufRead, Cursor};

use crate::error::{Error, Result};
use crate::xml::{collect_attrs, local_name};

/// Elements whose whitespace-only text is significant
const TEXT_CONTAINERS: &[&str] = &["t", "v", "f", "instrText", "delText"];

/// Raw XML node for preserving unknown elements during round-trip
#[derive(Clone, Debug, PartialEq)]
pub enum RawXmlNode {
    /// Element node
    Element(RawXmlElement),
    /// Text node
    Text(String),
    /// Comment node
    Comment(String),
}

/// Raw XML element with attributes and children
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawXmlElement {
    /// Full element name (with prefix, e.g., "w:customXml")
    pub name: String,
    /// Attributes as (name, value) pairs, unescaped
    pub attributes: Vec<(String, String)>,
    /// Child nodes
    pub children: Vec<RawXmlNode>,
    /// Whether this was a self-closing element
    pub self_closing: bool,
}

impl RawXmlElement {
    /// Create a new empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Read a complete element from XML reader (starting after the start tag was read)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let name = String::from_utf8_lossy(start.name().as_ref()).to_string();
        let keep_whitespace = TEXT_CONTAINERS.contains(&local_name(&name));
        let mut children = Vec::new();
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => {
                    let child = Self::from_reader(reader, &e)?;
                    children.push(RawXmlNode::Element(child));
                }
                Event::Empty(e) => {
                    children.push(RawXmlNode::Element(Self::from_empty(&e)));
                }
                Event::Text(t) => {
                    let text = t.unescape()?.to_string();
                    if keep_whitespace || !text.trim().is_empty() {
                        push_text(&mut children, text);
                    }
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c.into_inner()).to_string();
                    push_text(&mut children, text);
                }
                Event::Comment(c) => {
                    children.push(RawXmlNode::Comment(String::from_utf8_lossy(&c).to_string()));
                }
                Event::End(e) => {
                    if e.name().as_ref() == name.as_bytes() {
                        break;
                    }
                }
                Event::Eof => return Err(Error::InvalidDocument(format!("unexpected EOF inside <{name}>"))),
                _ => {}
            }
            buf.clear();
        }

        Ok(Self {
            name,
            attributes: collect_attrs(start),
            children,
            self_closing: false,
        })
    }

    /// Create from empty element tag
    pub fn from_empty(e: &BytesStart) -> Self {
        Self {
            name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
            attributes: collect_attrs(e),
            children: Vec::new(),
            self_closing: true,
        }
    }

    /// Write element to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.children.is_empty() {
            writer.write_event(Event::Empty(start))?;
        } else {
            writer.write_event(Event::Start(start))?;
            for child in &self.children {
                child.write_to(writer)?;
            }
            writer.write_event(Event::End(BytesEnd::new(self.name.as_str())))?;
        }

        Ok(())
    }

    /// Add an attribute
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Add a child element
    pub fn with_child(mut self, child: RawXmlElement) -> Self {
        self.children.push(RawXmlNode::Element(child));
        self
    }

    /// Add a text child
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(RawXmlNode::Text(text.into()));
        self
    }

    /// Local part of the element name
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Whether this element has the given local name
    pub fn is(&self, local: &str) -> bool {
        self.local_name() == local
    }

    /// `local` qualified with this element's prefix (`w:p` + `r` -> `w:r`)
    pub fn qualified(&self, local: &str) -> String {
        match self.name.rsplit_once(':') {
            Some((prefix, _)) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    /// Prefix bound to `namespace` by an `xmlns:*` attribute on this element;
    /// binds `fallback` when there is none
    pub fn bind_prefix(&mut self, namespace: &str, fallback: &str) -> String {
        let bound = self.attributes.iter().find_map(|(k, v)| {
            if v == namespace {
                k.strip_prefix("xmlns:").map(str::to_string)
            } else {
                None
            }
        });
        match bound {
            Some(prefix) => prefix,
            None => {
                self.set_attr(format!("xmlns:{fallback}"), namespace);
                fallback.to_string()
            }
        }
    }

    /// Attribute value by qualified name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set (or replace) an attribute, keeping its position if present
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attributes.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.attributes.push((name, value)),
        }
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let pos = self.attributes.iter().position(|(k, _)| k == name)?;
        Some(self.attributes.remove(pos).1)
    }

    /// Child elements
    pub fn elements(&self) -> impl Iterator<Item = &RawXmlElement> {
        self.children.iter().filter_map(|c| match c {
            RawXmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Child elements, mutably
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut RawXmlElement> {
        self.children.iter_mut().filter_map(|c| match c {
            RawXmlNode::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Child elements with the given local name
    pub fn children_named<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a RawXmlElement> {
        self.elements().filter(move |e| e.is(local))
    }

    /// Child elements with the given local name, mutably
    pub fn children_named_mut<'a>(
        &'a mut self,
        local: &'a str,
    ) -> impl Iterator<Item = &'a mut RawXmlElement> {
        self.elements_mut().filter(move |e| e.is(local))
    }

    /// First child element with the given local name
    pub fn child(&self, local: &str) -> Option<&RawXmlElement> {
        self.elements().find(|e| e.is(local))
    }

    /// First child element with the given local name, mutably
    pub fn child_mut(&mut self, local: &str) -> Option<&mut RawXmlElement> {
        self.elements_mut().find(|e| e.is(local))
    }

    /// Follow a chain of local names down the tree
    pub fn path(&self, locals: &[&str]) -> Option<&RawXmlElement> {
        locals.iter().try_fold(self, |node, local| node.child(local))
    }

    /// Mutable variant of [`RawXmlElement::path`]
    pub fn path_mut(&mut self, locals: &[&str]) -> Option<&mut RawXmlElement> {
        let mut node = self;
        for local in locals {
            node = node.child_mut(local)?;
        }
        Some(node)
    }

    /// Child element with the given local name, created (appended) when missing
    pub fn ensure_child(&mut self, qualified: &str) -> &mut RawXmlElement {
        let local = local_name(qualified).to_string();
        let pos = self.children.iter().position(|c| match c {
            RawXmlNode::Element(e) => e.is(&local),
            _ => false,
        });
        let pos = match pos {
            Some(pos) => pos,
            None => {
                self.children.push(RawXmlNode::Element(RawXmlElement::new(qualified)));
                self.children.len() - 1
            }
        };
        match &mut self.children[pos] {
            RawXmlNode::Element(e) => e,
            _ => unreachable!("position points at an element"),
        }
    }

    /// Append a child element
    pub fn push_child(&mut self, child: RawXmlElement) {
        self.children.push(RawXmlNode::Element(child));
    }

    /// Insert a child element before the first child whose local name is in `before`,
    /// or append when none is present
    pub fn insert_child_before(&mut self, child: RawXmlElement, before: &[&str]) {
        let pos = self.children.iter().position(|c| match c {
            RawXmlNode::Element(e) => before.contains(&e.local_name()),
            _ => false,
        });
        match pos {
            Some(pos) => self.children.insert(pos, RawXmlNode::Element(child)),
            None => self.children.push(RawXmlNode::Element(child)),
        }
    }

    /// Put `child` where a schema sequence expects it.
    ///
    /// An existing child with the same local name is replaced in place;
    /// otherwise the child goes before the first sibling that `order` lists
    /// later. Siblings missing from `order` never move.
    pub fn put_ordered(&mut self, child: RawXmlElement, order: &[&str]) {
        let local = child.local_name().to_string();
        if let Some(slot) = self.elements_mut().find(|e| e.is(&local)) {
            *slot = child;
            return;
        }
        let rank = order.iter().position(|n| *n == local);
        let later: Vec<&str> = match rank {
            Some(rank) => order[rank + 1..].to_vec(),
            None => Vec::new(),
        };
        self.insert_child_before(child, &later);
    }

    /// Remove every child element with the given local name, returning how many went
    pub fn remove_children(&mut self, local: &str) -> usize {
        let before = self.children.len();
        self.children.retain(|c| match c {
            RawXmlNode::Element(e) => !e.is(local),
            _ => true,
        });
        before - self.children.len()
    }

    /// Concatenated text of all descendants
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                RawXmlNode::Text(t) => out.push_str(t),
                RawXmlNode::Element(e) => e.collect_text(out),
                RawXmlNode::Comment(_) => {}
            }
        }
    }

    /// Replace all children with a single text node
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![RawXmlNode::Text(text.into())];
        self.self_closing = false;
    }

    /// Visit this element and every descendant element, pre-order
    pub fn walk_mut(&mut self, f: &mut dyn FnMut(&mut RawXmlElement)) {
        f(self);
        for child in self.elements_mut() {
            child.walk_mut(f);
        }
    }

    /// Visit this element and every descendant element, pre-order
    pub fn walk(&self, f: &mut dyn FnMut(&RawXmlElement)) {
        f(self);
        for child in self.elements() {
            child.walk(f);
        }
    }

    /// First descendant (or self) with the given local name, pre-order
    pub fn find(&self, local: &str) -> Option<&RawXmlElement> {
        if self.is(local) {
            return Some(self);
        }
        self.elements().find_map(|e| e.find(local))
    }
}

impl RawXmlNode {
    /// Write node to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            RawXmlNode::Element(e) => e.write_to(writer),
            RawXmlNode::Text(t) => {
                writer.write_event(Event::Text(BytesText::new(t)))?;
                Ok(())
            }
            RawXmlNode::Comment(c) => {
                writer.write_event(Event::Comment(BytesText::from_escaped(c.as_str())))?;
                Ok(())
            }
        }
    }

    /// The element inside this node, if it is one
    pub fn as_element(&self) -> Option<&RawXmlElement> {
        match self {
            RawXmlNode::Element(e) => Some(e),
            _ => None,
        }
    }
}

fn push_text(children: &mut Vec<RawXmlNode>, text: String) {
    if let Some(RawXmlNode::Text(prev)) = children.last_mut() {
        prev.push_str(&text);
    } else {
        children.push(RawXmlNode::Text(text));
    }
}

/// Parse a whole XML part into its root element
pub fn parse_xml(xml: &str) -> Result<RawXmlElement> {
    let mut reader = Reader::from_str(xml);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => return RawXmlElement::from_reader(&mut reader, &e),
            Event::Empty(e) => return Ok(RawXmlElement::from_empty(&e)),
            Event::Eof => return Err(Error::InvalidDocument("no root element".into())),
            _ => {}
        }
        buf.clear();
    }
}

/// Serialize a root element as a standalone XML part
pub fn write_xml(root: &RawXmlElement) -> Result<Vec<u8>> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    root.write_to(&mut writer)?;
    Ok(writer.into_inner().into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_keeps_significant_whitespace_only() {
        let xml = "<root>\n  <t xml:space=\"preserve\"> </t>\n  <v>1</v>\n</root>";
        let root = parse_xml(xml).unwrap();

        assert_eq!(root.elements().count(), 2);
        assert_eq!(root.children.len(), 2);
        assert_eq!(root.child("t").unwrap().text(), " ");
    }

    #[test]
    fn test_write_escapes_text_and_attrs() {
        let root = RawXmlElement::new("a")
            .with_attr("title", "x < y & \"z\"")
            .with_text("1 < 2");
        let bytes = write_xml(&root).unwrap();
        let reparsed = parse_xml(std::str::from_utf8(&bytes).unwrap()).unwrap();

        assert_eq!(reparsed.attr("title"), Some("x < y & \"z\""));
        assert_eq!(reparsed.text(), "1 < 2");
    }

    #[test]
    fn test_path_and_ensure_child() {
        let mut root = parse_xml("<x:a xmlns:x=\"urn:x\"><x:b><x:c>hi</x:c></x:b></x:a>").unwrap();
        assert_eq!(root.path(&["b", "c"]).unwrap().text(), "hi");

        root.ensure_child("x:d").set_text("new");
        root.ensure_child("x:d").set_attr("k", "v");
        assert_eq!(root.children_named("d").count(), 1);
        assert_eq!(root.child("d").unwrap().attr("k"), Some("v"));
    }

    #[test]
    fn test_insert_child_before() {
        let mut root = parse_xml("<r><a/><c/></r>").unwrap();
        root.insert_child_before(RawXmlElement::new("b"), &["c"]);
        let names: Vec<_> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_put_ordered() {
        let order = ["a", "b", "c", "d"];
        let mut root = parse_xml("<r><a/><x/><d/></r>").unwrap();

        root.put_ordered(RawXmlElement::new("c"), &order);
        root.put_ordered(RawXmlElement::new("d").with_attr("v", "2"), &order);

        let names: Vec<_> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "x", "c", "d"]);
        assert_eq!(root.child("d").unwrap().attr("v"), Some("2"));
    }

    #[test]
    fn test_remove_children() {
        let mut root = parse_xml("<r><a/><b/><a/></r>").unwrap();
        assert_eq!(root.remove_children("a"), 2);
        assert_eq!(root.elements().count(), 1);
    }
}

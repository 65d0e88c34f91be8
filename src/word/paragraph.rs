//! Paragraph element (w:p)

use crate::error::Result;
use crate::word::Run;
use crate::xml::{collect_attrs, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Child order of `w:pPr` (CT_PPr)
const PPR_ORDER: &[&str] = &[
    "pStyle", "keepNext", "keepLines", "pageBreakBefore", "framePr", "widowControl", "numPr",
    "suppressLineNumbers", "pBdr", "shd", "tabs", "suppressAutoHyphens", "kinsoku", "wordWrap",
    "overflowPunct", "topLinePunct", "autoSpaceDE", "autoSpaceDN", "bidi", "adjustRightInd",
    "snapToGrid", "spacing", "ind", "contextualSpacing", "mirrorIndents", "suppressOverlap",
    "jc", "textDirection", "textAlignment", "textboxTightWrap", "outlineLvl", "divId",
    "cnfStyle", "rPr", "sectPr", "pPrChange",
];

/// Paragraph element (w:p)
#[derive(Clone, Debug, Default)]
pub struct Paragraph {
    /// Paragraph properties
    pub properties: Option<ParagraphProperties>,
    /// Paragraph content (runs, hyperlinks, etc.)
    pub content: Vec<ParagraphContent>,
    /// Attributes of the w:p tag (rsid*, w14:paraId, ...)
    pub attrs: Vec<(String, String)>,
}

/// Content within a paragraph
#[derive(Clone, Debug)]
pub enum ParagraphContent {
    /// Text run
    Run(Run),
    /// Hyperlink
    Hyperlink(Hyperlink),
    /// Bookmarks, fields, proofing marks and the like (preserved)
    Unknown(RawXmlNode),
}

/// Hyperlink element (w:hyperlink)
#[derive(Clone, Debug, Default)]
pub struct Hyperlink {
    /// Attributes (r:id, w:anchor, ...)
    pub attrs: Vec<(String, String)>,
    /// Runs and anything else inside the link, in order
    pub content: Vec<ParagraphContent>,
}

/// What a block-level paragraph represents
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Paragraph,
    /// Heading with level 1-9
    Heading(u8),
    /// Paragraph that only carries a page break
    PageBreak,
}

/// Paragraph properties (w:pPr), kept as the parsed element
#[derive(Clone, Debug)]
pub struct ParagraphProperties {
    raw: RawXmlElement,
}

impl Default for ParagraphProperties {
    fn default() -> Self {
        Self {
            raw: RawXmlElement::new("w:pPr"),
        }
    }
}

/// Horizontal paragraph alignment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

impl Alignment {
    /// Parse `left|center|right|justify` (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Some(Alignment::Left),
            "center" | "centre" => Some(Alignment::Center),
            "right" => Some(Alignment::Right),
            "justify" | "both" => Some(Alignment::Justify),
            _ => None,
        }
    }

    /// Value of `w:jc/@w:val`
    pub fn as_jc(self) -> &'static str {
        match self {
            Alignment::Left => "left",
            Alignment::Center => "center",
            Alignment::Right => "right",
            Alignment::Justify => "both",
        }
    }
}

/// Heading level encoded in a style id or name: `Heading2`, `heading 2`
pub fn heading_level_of_style(style: &str) -> Option<u8> {
    let compact: String = style.chars().filter(|c| !c.is_whitespace()).collect();
    let lower = compact.to_ascii_lowercase();
    let level: u8 = lower.strip_prefix("heading")?.parse().ok()?;
    (1..=9).contains(&level).then_some(level)
}

impl Paragraph {
    /// Parse paragraph from reader (after w:p start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut para = Paragraph {
            attrs: collect_attrs(start),
            ..Default::default()
        };
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().local_name().as_ref() {
                    b"pPr" => {
                        let raw = RawXmlElement::from_reader(reader, &e)?;
                        para.properties = Some(ParagraphProperties { raw });
                    }
                    _ => para.content.push(read_content(reader, &e)?),
                },
                Event::Empty(e) => match e.name().local_name().as_ref() {
                    b"pPr" => {
                        para.properties = Some(ParagraphProperties {
                            raw: RawXmlElement::from_empty(&e),
                        });
                    }
                    _ => para.content.push(empty_content(&e)),
                },
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"p" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(para)
    }

    /// Create from empty element
    pub fn from_empty(start: &BytesStart) -> Self {
        Paragraph {
            attrs: collect_attrs(start),
            ..Default::default()
        }
    }

    /// Create a plain paragraph holding one run
    pub fn new(text: impl Into<String>) -> Self {
        let mut para = Paragraph::default();
        para.add_run(Run::new(text));
        para
    }

    /// Create a heading paragraph (`HeadingN` style)
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        let mut para = Paragraph::new(text);
        para.set_style(&format!("Heading{level}"));
        para
    }

    /// Create a paragraph holding a page break
    pub fn page_break() -> Self {
        let mut para = Paragraph::default();
        para.add_run(Run::page_break());
        para
    }

    /// Get all text in this paragraph
    pub fn text(&self) -> String {
        self.runs().iter().map(|r| r.text()).collect()
    }

    /// All runs, including those inside hyperlinks
    pub fn runs(&self) -> Vec<&Run> {
        let mut runs = Vec::new();
        collect_runs(&self.content, &mut runs);
        runs
    }

    /// All runs, including those inside hyperlinks, mutably
    pub fn runs_mut(&mut self) -> Vec<&mut Run> {
        let mut runs = Vec::new();
        collect_runs_mut(&mut self.content, &mut runs);
        runs
    }

    /// Add a run
    pub fn add_run(&mut self, run: Run) {
        self.content.push(ParagraphContent::Run(run));
    }

    /// Style ID
    pub fn style(&self) -> Option<&str> {
        self.properties.as_ref()?.style()
    }

    /// Set style ID
    pub fn set_style(&mut self, style: &str) {
        self.properties_mut().set_style(style);
    }

    /// Properties, created when missing
    pub fn properties_mut(&mut self) -> &mut ParagraphProperties {
        self.properties.get_or_insert_with(Default::default)
    }

    /// Heading level from the style id or outline level
    pub fn heading_level(&self) -> Option<u8> {
        self.heading_level_with(|id| heading_level_of_style(id))
    }

    /// Heading level, resolving the style through `style_level`
    /// (e.g. a lookup of the style's display name)
    pub fn heading_level_with(&self, style_level: impl Fn(&str) -> Option<u8>) -> Option<u8> {
        let props = self.properties.as_ref()?;
        props
            .style()
            .and_then(style_level)
            .or_else(|| props.outline_level().map(|lvl| lvl + 1).filter(|l| *l <= 9))
    }

    /// Check if this is a heading
    pub fn is_heading(&self) -> bool {
        self.heading_level().is_some()
    }

    /// Classify the paragraph
    pub fn kind(&self) -> BlockKind {
        self.kind_with(|id| heading_level_of_style(id))
    }

    /// Classify the paragraph, resolving heading styles through `style_level`
    pub fn kind_with(&self, style_level: impl Fn(&str) -> Option<u8>) -> BlockKind {
        if let Some(level) = self.heading_level_with(style_level) {
            return BlockKind::Heading(level);
        }
        let runs = self.runs();
        if self.text().trim().is_empty() && runs.iter().any(|r| r.has_page_break()) {
            return BlockKind::PageBreak;
        }
        BlockKind::Paragraph
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:p");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }

        if self.properties.is_none() && self.content.is_empty() {
            writer.write_event(Event::Empty(start))?;
            return Ok(());
        }

        writer.write_event(Event::Start(start))?;
        if let Some(props) = &self.properties {
            props.raw.write_to(writer)?;
        }
        write_content(&self.content, writer)?;
        writer.write_event(Event::End(BytesEnd::new("w:p")))?;

        Ok(())
    }
}

impl ParagraphProperties {
    /// Style ID
    pub fn style(&self) -> Option<&str> {
        self.raw.child("pStyle")?.attr("w:val")
    }

    pub fn set_style(&mut self, style: &str) {
        let elem = RawXmlElement::new("w:pStyle").with_attr("w:val", style);
        self.raw.put_ordered(elem, PPR_ORDER);
    }

    /// Justification value (w:jc)
    pub fn justification(&self) -> Option<&str> {
        self.raw.child("jc")?.attr("w:val")
    }

    pub fn set_alignment(&mut self, alignment: Alignment) {
        let elem = RawXmlElement::new("w:jc").with_attr("w:val", alignment.as_jc());
        self.raw.put_ordered(elem, PPR_ORDER);
    }

    /// Outline level (0-based)
    pub fn outline_level(&self) -> Option<u8> {
        self.raw.child("outlineLvl")?.attr("w:val")?.parse().ok()
    }
}

impl Hyperlink {
    fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut link = Hyperlink {
            attrs: collect_attrs(start),
            content: Vec::new(),
        };
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => link.content.push(read_content(reader, &e)?),
                Event::Empty(e) => link.content.push(empty_content(&e)),
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"hyperlink" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(link)
    }

    /// Text of the link
    pub fn text(&self) -> String {
        let mut runs = Vec::new();
        collect_runs(&self.content, &mut runs);
        runs.iter().map(|r| r.text()).collect()
    }

    fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:hyperlink");
        for (key, value) in &self.attrs {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        writer.write_event(Event::Start(start))?;
        write_content(&self.content, writer)?;
        writer.write_event(Event::End(BytesEnd::new("w:hyperlink")))?;
        Ok(())
    }
}

fn read_content<R: BufRead>(reader: &mut Reader<R>, e: &BytesStart) -> Result<ParagraphContent> {
    Ok(match e.name().local_name().as_ref() {
        b"r" => ParagraphContent::Run(Run::from_reader(reader, e)?),
        b"hyperlink" => ParagraphContent::Hyperlink(Hyperlink::from_reader(reader, e)?),
        _ => ParagraphContent::Unknown(RawXmlNode::Element(RawXmlElement::from_reader(reader, e)?)),
    })
}

fn empty_content(e: &BytesStart) -> ParagraphContent {
    match e.name().local_name().as_ref() {
        b"r" => ParagraphContent::Run(Run::from_empty(e)),
        b"hyperlink" => ParagraphContent::Hyperlink(Hyperlink {
            attrs: collect_attrs(e),
            content: Vec::new(),
        }),
        _ => ParagraphContent::Unknown(RawXmlNode::Element(RawXmlElement::from_empty(e))),
    }
}

fn write_content<W: std::io::Write>(content: &[ParagraphContent], writer: &mut Writer<W>) -> Result<()> {
    for item in content {
        match item {
            ParagraphContent::Run(run) => run.write_to(writer)?,
            ParagraphContent::Hyperlink(link) => link.write_to(writer)?,
            ParagraphContent::Unknown(node) => node.write_to(writer)?,
        }
    }
    Ok(())
}

fn collect_runs<'a>(content: &'a [ParagraphContent], out: &mut Vec<&'a Run>) {
    for item in content {
        match item {
            ParagraphContent::Run(run) => out.push(run),
            ParagraphContent::Hyperlink(link) => collect_runs(&link.content, out),
            ParagraphContent::Unknown(_) => {}
        }
    }
}

fn collect_runs_mut<'a>(content: &'a mut [ParagraphContent], out: &mut Vec<&'a mut Run>) {
    for item in content {
        match item {
            ParagraphContent::Run(run) => out.push(run),
            ParagraphContent::Hyperlink(link) => collect_runs_mut(&mut link.content, out),
            ParagraphContent::Unknown(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_para(xml: &str) -> Paragraph {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            if let Event::Start(e) = reader.read_event_into(&mut buf).unwrap() {
                return Paragraph::from_reader(&mut reader, &e.into_owned()).unwrap();
            }
        }
    }

    fn write_para(para: &Paragraph) -> String {
        let mut writer = Writer::new(Vec::new());
        para.write_to(&mut writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_hyperlink_text_is_visible_and_preserved() {
        let xml = r#"<w:p><w:r><w:t xml:space="preserve">See </w:t></w:r><w:hyperlink r:id="rId5"><w:r><w:t>docs</w:t></w:r></w:hyperlink><w:bookmarkStart w:id="0" w:name="x"/></w:p>"#;
        let para = parse_para(xml);

        assert_eq!(para.text(), "See docs");
        assert_eq!(para.runs().len(), 2);
        assert_eq!(write_para(&para), xml);
    }

    #[test]
    fn test_kind() {
        assert_eq!(Paragraph::heading("Intro", 2).kind(), BlockKind::Heading(2));
        assert_eq!(Paragraph::page_break().kind(), BlockKind::PageBreak);
        assert_eq!(Paragraph::new("body").kind(), BlockKind::Paragraph);

        let outlined = parse_para(r#"<w:p><w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:r><w:t>T</w:t></w:r></w:p>"#);
        assert_eq!(outlined.kind(), BlockKind::Heading(1));
    }

    #[test]
    fn test_heading_level_of_style() {
        assert_eq!(heading_level_of_style("Heading3"), Some(3));
        assert_eq!(heading_level_of_style("heading 1"), Some(1));
        assert_eq!(heading_level_of_style("Heading10"), None);
        assert_eq!(heading_level_of_style("Title"), None);
    }

    #[test]
    fn test_style_inserted_before_existing_props() {
        let mut para = parse_para(r#"<w:p><w:pPr><w:jc w:val="left"/></w:pPr></w:p>"#);
        para.set_style("Heading1");
        para.properties_mut().set_alignment(Alignment::Center);

        assert_eq!(
            write_para(&para),
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/><w:jc w:val="center"/></w:pPr></w:p>"#
        );
    }
}

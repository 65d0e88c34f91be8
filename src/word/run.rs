//! Run element (w:r) - a contiguous run of text with uniform formatting

use crate::error::Result;
use crate::xml::{collect_attrs, get_attr, RawXmlElement, RawXmlNode};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::io::BufRead;

/// Child order of `w:rPr` (CT_RPr)
const RPR_ORDER: &[&str] = &[
    "rStyle", "rFonts", "b", "bCs", "i", "iCs", "caps", "smallCaps", "strike", "dstrike",
    "outline", "shadow", "emboss", "imprint", "noProof", "snapToGrid", "vanish", "webHidden",
    "color", "spacing", "w", "kern", "position", "sz", "szCs", "highlight", "u", "effect",
    "bdr", "shd", "fitText", "vertAlign", "rtl", "cs", "em", "lang", "eastAsianLayout",
    "specVanish", "oMath", "rPrChange",
];

/// Run element (w:r)
#[derive(Clone, Debug, Default)]
pub struct Run {
    /// Run properties
    pub properties: Option<RunProperties>,
    /// Run content, in document order
    pub content: Vec<RunContent>,
    /// Attributes of the w:r tag (rsid*)
    pub attrs: Vec<(String, String)>,
}

/// Content within a run
#[derive(Clone, Debug)]
pub enum RunContent {
    /// Text (w:t)
    Text(String),
    /// Tab (w:tab)
    Tab,
    /// Break (w:br)
    Break(BreakType),
    /// Carriage return (w:cr)
    CarriageReturn,
    /// Anything else (drawings, fields, ...), preserved
    Unknown(RawXmlNode),
}

/// Break type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BreakType {
    #[default]
    TextWrapping,
    Page,
    Column,
}

/// Run properties (w:rPr), kept as the parsed element so that children the
/// accessors do not know keep their place
#[derive(Clone, Debug)]
pub struct RunProperties {
    raw: RawXmlElement,
}

impl Default for RunProperties {
    fn default() -> Self {
        Self {
            raw: RawXmlElement::new("w:rPr"),
        }
    }
}

impl Run {
    /// Parse from reader (after w:r start tag)
    pub fn from_reader<R: BufRead>(reader: &mut Reader<R>, start: &BytesStart) -> Result<Self> {
        let mut run = Run {
            attrs: collect_attrs(start),
            ..Default::default()
        };
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf)? {
                Event::Start(e) => match e.name().local_name().as_ref() {
                    b"rPr" => {
                        let raw = RawXmlElement::from_reader(reader, &e)?;
                        run.properties = Some(RunProperties { raw });
                    }
                    b"t" => {
                        let text = read_text_content(reader)?;
                        run.content.push(RunContent::Text(text));
                    }
                    _ => {
                        let raw = RawXmlElement::from_reader(reader, &e)?;
                        run.content.push(RunContent::Unknown(RawXmlNode::Element(raw)));
                    }
                },
                Event::Empty(e) => {
                    let content = match e.name().local_name().as_ref() {
                        b"rPr" => {
                            run.properties = Some(RunProperties {
                                raw: RawXmlElement::from_empty(&e),
                            });
                            None
                        }
                        b"t" => Some(RunContent::Text(String::new())),
                        b"tab" => Some(RunContent::Tab),
                        b"cr" => Some(RunContent::CarriageReturn),
                        b"br" => Some(parse_break(&e)),
                        _ => Some(RunContent::Unknown(RawXmlNode::Element(
                            RawXmlElement::from_empty(&e),
                        ))),
                    };
                    run.content.extend(content);
                }
                Event::End(e) => {
                    if e.name().local_name().as_ref() == b"r" {
                        break;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();
        }

        Ok(run)
    }

    /// Create from empty element
    pub fn from_empty(start: &BytesStart) -> Self {
        Run {
            attrs: collect_attrs(start),
            ..Default::default()
        }
    }

    /// Create a new run with text
    pub fn new(text: impl Into<String>) -> Self {
        Run {
            content: vec![RunContent::Text(text.into())],
            ..Default::default()
        }
    }

    /// A run holding a single page break
    pub fn page_break() -> Self {
        Run {
            content: vec![RunContent::Break(BreakType::Page)],
            ..Default::default()
        }
    }

    /// Get all text in this run
    pub fn text(&self) -> String {
        let mut result = String::new();
        for content in &self.content {
            match content {
                RunContent::Text(t) => result.push_str(t),
                RunContent::Tab => result.push('\t'),
                RunContent::Break(BreakType::TextWrapping) | RunContent::CarriageReturn => {
                    result.push('\n')
                }
                _ => {}
            }
        }
        result
    }

    /// Whether the run carries a page break
    pub fn has_page_break(&self) -> bool {
        self.content
            .iter()
            .any(|c| matches!(c, RunContent::Break(BreakType::Page)))
    }

    /// Replace occurrences of `old` inside each text segment of the run.
    ///
    /// At most `limit` occurrences are replaced (leftmost first); `None`
    /// replaces all of them. Returns how many were replaced.
    pub fn replace_text(&mut self, old: &str, new: &str, limit: Option<usize>) -> usize {
        if old.is_empty() {
            return 0;
        }
        let mut replaced = 0;
        for content in &mut self.content {
            let RunContent::Text(text) = content else {
                continue;
            };
            let remaining = match limit {
                Some(limit) if replaced >= limit => break,
                Some(limit) => limit - replaced,
                None => usize::MAX,
            };
            let found = text.matches(old).count().min(remaining);
            if found > 0 {
                *text = text.replacen(old, new, found);
                replaced += found;
            }
        }
        replaced
    }

    /// Properties, created when missing
    pub fn properties_mut(&mut self) -> &mut RunProperties {
        self.properties.get_or_insert_with(Default::default)
    }

    /// Check if bold
    pub fn bold(&self) -> bool {
        self.properties.as_ref().map_or(false, RunProperties::bold)
    }

    /// Check if italic
    pub fn italic(&self) -> bool {
        self.properties.as_ref().map_or(false, RunProperties::italic)
    }

    /// Get font size in points (None if not specified)
    pub fn font_size_pt(&self) -> Option<f32> {
        self.properties.as_ref()?.font_size_pt()
    }

    /// Get color (RGB hex string)
    pub fn color(&self) -> Option<&str> {
        self.properties.as_ref()?.color()
    }

    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        let mut start = BytesStart::new("w:r");
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
        for content in &self.content {
            content.write_to(writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new("w:r")))?;

        Ok(())
    }
}

impl RunContent {
    /// Write to XML writer
    pub fn write_to<W: std::io::Write>(&self, writer: &mut Writer<W>) -> Result<()> {
        match self {
            RunContent::Text(text) => {
                let mut start = BytesStart::new("w:t");
                if needs_space_preserve(text) {
                    start.push_attribute(("xml:space", "preserve"));
                }
                writer.write_event(Event::Start(start))?;
                writer.write_event(Event::Text(BytesText::new(text)))?;
                writer.write_event(Event::End(BytesEnd::new("w:t")))?;
            }
            RunContent::Tab => {
                writer.write_event(Event::Empty(BytesStart::new("w:tab")))?;
            }
            RunContent::Break(break_type) => {
                let mut start = BytesStart::new("w:br");
                match break_type {
                    BreakType::Page => start.push_attribute(("w:type", "page")),
                    BreakType::Column => start.push_attribute(("w:type", "column")),
                    BreakType::TextWrapping => {}
                }
                writer.write_event(Event::Empty(start))?;
            }
            RunContent::CarriageReturn => {
                writer.write_event(Event::Empty(BytesStart::new("w:cr")))?;
            }
            RunContent::Unknown(node) => node.write_to(writer)?,
        }
        Ok(())
    }
}

impl RunProperties {
    fn toggle(&self, local: &str) -> bool {
        self.raw.child(local).map_or(false, |e| {
            !matches!(e.attr("w:val"), Some("0" | "false" | "off"))
        })
    }

    fn set_toggle(&mut self, qualified: &str, on: bool) {
        let mut elem = RawXmlElement::new(qualified);
        if !on {
            elem.set_attr("w:val", "0");
        }
        self.raw.put_ordered(elem, RPR_ORDER);
    }

    fn val(&self, local: &str) -> Option<&str> {
        self.raw.child(local)?.attr("w:val")
    }

    fn set_val(&mut self, qualified: &str, value: &str) {
        let elem = RawXmlElement::new(qualified).with_attr("w:val", value);
        self.raw.put_ordered(elem, RPR_ORDER);
    }

    /// Bold toggle
    pub fn bold(&self) -> bool {
        self.toggle("b")
    }

    /// Italic toggle
    pub fn italic(&self) -> bool {
        self.toggle("i")
    }

    /// Size in points (w:sz is in half-points)
    pub fn font_size_pt(&self) -> Option<f32> {
        self.val("sz")?.parse::<u32>().ok().map(|hp| hp as f32 / 2.0)
    }

    /// Color (RGB hex)
    pub fn color(&self) -> Option<&str> {
        self.val("color")
    }

    /// ASCII font name
    pub fn font_ascii(&self) -> Option<&str> {
        self.raw.child("rFonts")?.attr("w:ascii")
    }

    /// East-Asian font name
    pub fn font_east_asia(&self) -> Option<&str> {
        self.raw.child("rFonts")?.attr("w:eastAsia")
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.set_toggle("w:b", bold);
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.set_toggle("w:i", italic);
    }

    /// Set font size in points, for both regular and complex scripts
    pub fn set_font_size_pt(&mut self, size: f32) {
        let half_points = ((size * 2.0).round() as u32).to_string();
        self.set_val("w:sz", &half_points);
        self.set_val("w:szCs", &half_points);
    }

    pub fn set_color(&mut self, color: &str) {
        self.set_val("w:color", color);
    }

    /// Set the Latin and East-Asian fonts
    pub fn set_fonts(&mut self, ascii: &str, east_asia: &str) {
        let mut fonts = self.raw.child("rFonts").cloned().unwrap_or_else(|| RawXmlElement::new("w:rFonts"));
        fonts.set_attr("w:ascii", ascii);
        fonts.set_attr("w:hAnsi", ascii);
        fonts.set_attr("w:eastAsia", east_asia);
        self.raw.put_ordered(fonts, RPR_ORDER);
    }
}

fn parse_break(e: &BytesStart) -> RunContent {
    let attrs = collect_attrs(e);
    // Breaks carrying w:clear or other attributes are kept verbatim
    if attrs.iter().any(|(k, _)| k != "w:type") {
        return RunContent::Unknown(RawXmlNode::Element(RawXmlElement::from_empty(e)));
    }
    match get_attr(e, "w:type").as_deref() {
        Some("page") => RunContent::Break(BreakType::Page),
        Some("column") => RunContent::Break(BreakType::Column),
        _ => RunContent::Break(BreakType::TextWrapping),
    }
}

fn needs_space_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text.contains("  ")
}

/// Read text content from w:t element
fn read_text_content<R: BufRead>(reader: &mut Reader<R>) -> Result<String> {
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Text(t) => text.push_str(&t.unescape()?),
            Event::CData(c) => text.push_str(&String::from_utf8_lossy(&c)),
            Event::End(e) => {
                if e.name().local_name().as_ref() == b"t" {
                    break;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse_run(xml: &str) -> Run {
        let mut reader = Reader::from_str(xml);
        let mut buf = Vec::new();
        loop {
            if let Event::Start(e) = reader.read_event_into(&mut buf).unwrap() {
                return Run::from_reader(&mut reader, &e.into_owned()).unwrap();
            }
        }
    }

    fn write_run(run: &Run) -> String {
        let mut writer = Writer::new(Vec::new());
        run.write_to(&mut writer).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_parse_formatting() {
        let run = parse_run(
            r#"<w:r><w:rPr><w:b/><w:i w:val="0"/><w:sz w:val="28"/><w:color w:val="FF0000"/></w:rPr><w:t xml:space="preserve"> Formatted </w:t></w:r>"#,
        );

        assert!(run.bold());
        assert!(!run.italic());
        assert_eq!(run.font_size_pt(), Some(14.0));
        assert_eq!(run.color(), Some("FF0000"));
        assert_eq!(run.text(), " Formatted ");
    }

    #[test]
    fn test_replace_with_limit() {
        let mut run = Run::new("a-a-a");
        assert_eq!(run.replace_text("a", "b", Some(2)), 2);
        assert_eq!(run.text(), "b-b-a");
        assert_eq!(run.replace_text("a", "b", None), 1);
        assert_eq!(run.replace_text("zzz", "b", None), 0);
    }

    #[test]
    fn test_setters_keep_schema_order() {
        let mut run = parse_run(r#"<w:r><w:rPr><w:sz w:val="20"/></w:rPr><w:t>x</w:t></w:r>"#);
        let props = run.properties_mut();
        props.set_bold(true);
        props.set_fonts("Aptos", "Microsoft JhengHei");
        props.set_font_size_pt(12.0);

        assert_eq!(
            write_run(&run),
            r#"<w:r><w:rPr><w:rFonts w:ascii="Aptos" w:hAnsi="Aptos" w:eastAsia="Microsoft JhengHei"/><w:b/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr><w:t>x</w:t></w:r>"#
        );
    }

    #[test]
    fn test_page_break_and_escaping() {
        let run = parse_run(r#"<w:r><w:br w:type="page"/><w:t>a &amp; b</w:t></w:r>"#);
        assert!(run.has_page_break());
        assert_eq!(run.text(), "a & b");
        assert!(write_run(&run).contains("<w:t>a &amp; b</w:t>"));
    }
}

//! XML utilities and raw element preservation for round-trip support

mod namespace;
mod raw;

pub use namespace::*;
pub use raw::{parse_xml, write_xml, RawXmlElement, RawXmlNode};

use quick_xml::events::BytesStart;

/// Local part of a qualified name (`w:p` -> `p`)
pub fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

/// Collect all attributes of a start tag as unescaped `(name, value)` pairs
pub fn collect_attrs(element: &BytesStart) -> Vec<(String, String)> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .map(|a| {
            let key = String::from_utf8_lossy(a.key.as_ref()).to_string();
            let value = a
                .unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).to_string());
            (key, value)
        })
        .collect()
}

/// Helper to get attribute value from BytesStart
pub fn get_attr(element: &BytesStart, name: &str) -> Option<String> {
    element
        .attributes()
        .filter_map(|a| a.ok())
        .find(|a| a.key.as_ref() == name.as_bytes())
        .map(|a| {
            a.unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).to_string())
        })
}

/// Helper to get w:val attribute (common in OOXML)
pub fn get_w_val(element: &BytesStart) -> Option<String> {
    get_attr(element, "w:val").or_else(|| get_attr(element, "val"))
}

/// Parse a boolean value from OOXML (handles "1", "true", "on", or missing val)
pub fn parse_bool(element: &BytesStart) -> bool {
    match get_w_val(element) {
        None => true, // <w:b/>
        Some(v) => matches!(v.as_str(), "1" | "true" | "on"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quick_xml::events::Event;
    use quick_xml::Reader;

    #[test]
    fn test_raw_element_roundtrip() {
        let xml = r#"<w:custom foo="a &amp; b"><w:child>text</w:child></w:custom>"#;
        let mut reader = Reader::from_str(xml);

        let mut buf = Vec::new();
        if let Event::Start(e) = reader.read_event_into(&mut buf).unwrap() {
            let elem = RawXmlElement::from_reader(&mut reader, &e).unwrap();

            assert_eq!(elem.name, "w:custom");
            assert_eq!(elem.attr("foo"), Some("a & b"));
            assert_eq!(elem.children.len(), 1);
        }
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("w:p"), "p");
        assert_eq!(local_name("sheetData"), "sheetData");
    }

    #[test]
    fn test_namespace_constants() {
        assert!(W.contains("wordprocessingml"));
        assert!(S.contains("spreadsheetml"));
        assert!(P.contains("presentationml"));
    }
}

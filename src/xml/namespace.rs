//! XML namespaces used in OOXML

/// WordprocessingML main namespace
pub const W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
/// Relationships namespace
pub const R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
/// Drawing namespace
pub const WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
/// DrawingML main namespace
pub const A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
/// Pictures namespace
pub const PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
/// SpreadsheetML main namespace
pub const S: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
/// PresentationML main namespace
pub const P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
/// Content Types namespace
pub const CT: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
/// Package Relationships namespace
pub const PR: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

/// Namespace declarations every document.xml written by this crate carries.
///
/// Declarations already present on the parsed root element are kept as-is;
/// these are only added when missing so that inserted drawings resolve.
pub fn document_namespaces() -> Vec<(&'static str, &'static str)> {
    vec![
        ("xmlns:w", W),
        ("xmlns:r", R),
        ("xmlns:wp", WP),
        ("xmlns:a", A),
        ("xmlns:pic", PIC),
    ]
}

//! Open Packaging Convention (OPC) implementation
//!
//! This module handles the ZIP-based package format shared by DOCX, XLSX and
//! PPTX files.

mod content_types;
mod package;
mod part;
mod part_uri;
mod relationships;

pub use content_types::{
    image_content_type, ContentTypes, PRESENTATION, RELATIONSHIPS, SHARED_STRINGS,
    SHEET_STYLES, SLIDE, WORD_DOCUMENT, WORD_STYLES, WORKBOOK, WORKSHEET, XML,
};
pub use package::Package;
pub use part::Part;
pub use part_uri::PartUri;
pub use relationships::{rel_types, Relationship, Relationships, TargetMode};

//! Error types for linch-office-edit

use thiserror::Error;

/// Main error type
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML encoding error: {0}")]
    XmlEncoding(#[from] quick_xml::encoding::EncodingError),

    #[error("XML attribute error: {0}")]
    XmlAttr(#[from] quick_xml::events::attributes::AttrError),

    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Glob pattern error: {0}")]
    Glob(#[from] globset::Error),

    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Missing required part: {0}")]
    MissingPart(String),

    #[error("Invalid part URI: {0}")]
    InvalidPartUri(String),

    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    #[error("Missing attribute '{attr}' on element '{element}'")]
    MissingAttribute { element: String, attr: String },

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Part not found: {0}")]
    PartNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid cell reference: {0}")]
    InvalidCellRef(String),

    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    #[error("Sheet already exists: {0}")]
    DuplicateSheet(String),

    #[error("Cannot delete the only sheet: {0}")]
    LastSheet(String),

    #[error("Unsupported command: {0}")]
    UnsupportedCommand(String),

    #[error("Operation '{operation}' is not supported for {file_kind} files")]
    UnsupportedOperation {
        operation: String,
        file_kind: String,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

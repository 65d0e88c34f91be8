//! # linch-office-edit
//!
//! Scripted editing of Word (`.docx`), PowerPoint (`.pptx`) and Excel
//! (`.xlsx`) documents.
//!
//! ## Features
//!
//! - Find/replace across paragraphs, table cells, slides and sheets
//! - Insert paragraphs, headings, bullets, tables, images and page breaks
//!   right after an anchor paragraph
//! - Cell, row and sheet edits for workbooks; title, text, slide and font
//!   edits for presentations
//! - Batch runs over glob patterns and a JSON request/response surface
//! - Round-trip preservation (parts and elements the editor does not touch
//!   are written back unchanged)
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use linch_office_edit::Document;
//!
//! let mut doc = Document::open("report.docx")?;
//! doc.replace_text("2024", "2025");
//! doc.insert_after("Summary", "Figures are preliminary.", None)?;
//! doc.save("report.docx")?;
//! ```

pub mod api;
pub mod batch;
pub mod config;
pub mod error;
pub mod facade;
pub mod opc;
pub mod sheet;
pub mod slides;
pub mod word;
pub mod xml;

pub use batch::{BatchCommand, BatchJob, BatchReport};
pub use config::{EditorConfig, FormatDefaults};
pub use error::{Error, Result};
pub use facade::{Editor, FileKind, OfficeFile};
pub use opc::{Package, Part, PartUri};
pub use sheet::{CellFormat, CellRef, CellValue, Workbook};
pub use slides::Presentation;
pub use word::{Anchor, AnchorScope, Document, Paragraph, Run, Table};

//! One loaded Office file of any supported kind

use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::sheet::Workbook;
use crate::slides::Presentation;
use crate::word::Document;
use std::fmt;
use std::path::{Path, PathBuf};

/// Container types the editor handles, keyed by file extension
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FileKind {
    Word,
    Presentation,
    Spreadsheet,
}

impl FileKind {
    pub const ALL: [FileKind; 3] = [FileKind::Word, FileKind::Presentation, FileKind::Spreadsheet];

    /// Kind for a path's extension (case-insensitive)
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        Self::ALL.into_iter().find(|kind| kind.extension() == ext)
    }

    pub fn extension(self) -> &'static str {
        match self {
            FileKind::Word => "docx",
            FileKind::Presentation => "pptx",
            FileKind::Spreadsheet => "xlsx",
        }
    }

    /// Name used in API responses
    pub fn as_str(self) -> &'static str {
        match self {
            FileKind::Word => "word",
            FileKind::Presentation => "ppt",
            FileKind::Spreadsheet => "excel",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded document of one of the supported kinds
#[derive(Debug)]
pub enum Editor {
    Word(Document),
    Presentation(Presentation),
    Spreadsheet(Workbook),
}

impl Editor {
    /// Load `path` with the editor its extension selects. The extension is
    /// checked first, then that the file exists.
    pub fn open(path: &Path, config: EditorConfig) -> Result<Self> {
        let kind = FileKind::from_path(path)
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        log::debug!("opening {} as {kind}", path.display());

        Ok(match kind {
            FileKind::Word => Editor::Word(Document::open_with(path, config)?),
            FileKind::Presentation => Editor::Presentation(Presentation::open_with(path, config)?),
            FileKind::Spreadsheet => Editor::Spreadsheet(Workbook::open_with(path, config)?),
        })
    }

    pub fn file_kind(&self) -> FileKind {
        match self {
            Editor::Word(_) => FileKind::Word,
            Editor::Presentation(_) => FileKind::Presentation,
            Editor::Spreadsheet(_) => FileKind::Spreadsheet,
        }
    }

    /// Replace `old` everywhere; the count is occurrences for Word, runs for
    /// PowerPoint and cells for Excel
    pub fn replace_text(&mut self, old: &str, new: &str) -> usize {
        match self {
            Editor::Word(doc) => doc.replace_text(old, new),
            Editor::Presentation(pres) => pres.replace_text(old, new, None),
            Editor::Spreadsheet(book) => book.replace_text(old, new, None),
        }
    }

    /// Remove the first paragraph containing `search` (Word only)
    pub fn delete_paragraph(&mut self, search: &str) -> Result<bool> {
        match self {
            Editor::Word(doc) => doc.delete_paragraph(search),
            other => Err(other.unsupported("delete_paragraph")),
        }
    }

    pub fn save_to(&mut self, path: &Path) -> Result<()> {
        match self {
            Editor::Word(doc) => doc.save(path),
            Editor::Presentation(pres) => pres.save(path),
            Editor::Spreadsheet(book) => book.save(path),
        }
    }

    pub(crate) fn unsupported(&self, operation: &str) -> Error {
        Error::UnsupportedOperation {
            operation: operation.to_string(),
            file_kind: self.file_kind().to_string(),
        }
    }
}

/// An [`Editor`] together with the path it was loaded from
#[derive(Debug)]
pub struct OfficeFile {
    path: PathBuf,
    editor: Editor,
}

impl OfficeFile {
    pub fn open<P: AsRef<Path>>(path: P, config: EditorConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let editor = Editor::open(&path, config)?;
        Ok(Self { path, editor })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_kind(&self) -> FileKind {
        self.editor.file_kind()
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn replace_text(&mut self, old: &str, new: &str) -> usize {
        self.editor.replace_text(old, new)
    }

    /// Save to `output`, or over the loaded file. Returns the path written.
    pub fn save(&mut self, output: Option<&Path>) -> Result<PathBuf> {
        let target = output.unwrap_or(&self.path).to_path_buf();
        self.editor.save_to(&target)?;
        log::info!("saved {}", target.display());
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_path(Path::new("a/report.DOCX")), Some(FileKind::Word));
        assert_eq!(FileKind::from_path(Path::new("deck.pptx")), Some(FileKind::Presentation));
        assert_eq!(FileKind::from_path(Path::new("data.xlsx")), Some(FileKind::Spreadsheet));
        assert_eq!(FileKind::from_path(Path::new("old.doc")), None);
        assert_eq!(FileKind::from_path(Path::new("README")), None);
    }

    #[test]
    fn test_extension_checked_before_existence() {
        let err = Editor::open(Path::new("/nonexistent/notes.txt"), EditorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(_)));

        let err = Editor::open(Path::new("/nonexistent/notes.docx"), EditorConfig::default()).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}

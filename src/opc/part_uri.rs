//! Part URI handling for OPC packages

use crate::error::{Error, Result};
use std::fmt;

/// Represents a URI to a part within an OPC package.
///
/// Part URIs are always absolute paths starting with '/'.
/// Example: `/xl/worksheets/sheet1.xml`
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartUri {
    path: String,
}

impl PartUri {
    /// Create a new PartUri from a string.
    ///
    /// The path will be normalized (leading '/' ensured, no trailing '/').
    pub fn new(path: &str) -> Result<Self> {
        let path = path.trim();

        if path.is_empty() {
            return Err(Error::InvalidPartUri("empty path".into()));
        }

        let normalized = if path.starts_with('/') {
            path.to_string()
        } else {
            format!("/{}", path)
        };
        let normalized = normalized.trim_end_matches('/').to_string();

        if normalized.contains("//") {
            return Err(Error::InvalidPartUri(format!(
                "invalid path '{}': contains double slashes",
                path
            )));
        }

        Ok(Self { path: normalized })
    }

    /// Get the path as a string slice
    pub fn as_str(&self) -> &str {
        &self.path
    }

    /// Path inside the ZIP archive (no leading '/')
    pub fn zip_name(&self) -> &str {
        &self.path[1..]
    }

    /// Get the file name portion
    pub fn file_name(&self) -> Option<&str> {
        self.path.rsplit('/').next()
    }

    /// Get the file extension
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        let (_, ext) = name.rsplit_once('.')?;
        (!ext.is_empty()).then_some(ext)
    }

    /// Get the parent directory URI
    pub fn parent(&self) -> Option<PartUri> {
        let pos = self.path.rfind('/')?;
        if pos == 0 {
            None
        } else {
            Some(PartUri {
                path: self.path[..pos].to_string(),
            })
        }
    }

    /// Get the relationships URI for this part.
    ///
    /// For `/word/document.xml`, returns `/word/_rels/document.xml.rels`
    pub fn relationships_uri(&self) -> PartUri {
        let file_name = self.file_name().unwrap_or("");
        let parent = self.parent().map(|p| p.path).unwrap_or_default();

        PartUri {
            path: format!("{}/_rels/{}.rels", parent, file_name),
        }
    }

    /// Resolve a relationship target against this URI.
    ///
    /// For `/word/document.xml` and `../media/image1.png`, returns `/media/image1.png`
    pub fn resolve(&self, relative: &str) -> Result<PartUri> {
        if relative.starts_with('/') {
            return PartUri::new(relative);
        }

        let base_dir = self.parent().map(|p| p.path).unwrap_or_default();
        let mut parts: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();

        for segment in relative.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    parts.pop();
                }
                s => parts.push(s),
            }
        }

        PartUri::new(&format!("/{}", parts.join("/")))
    }

    /// Relationship target that points from this part to `target`.
    ///
    /// From `/ppt/slides/slide1.xml` to `/ppt/slideLayouts/slideLayout2.xml`
    /// gives `../slideLayouts/slideLayout2.xml`.
    pub fn relative_target(&self, target: &PartUri) -> String {
        let base_dir = self.parent().map(|p| p.path).unwrap_or_default();
        let from: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
        let to: Vec<&str> = target.path.split('/').filter(|s| !s.is_empty()).collect();

        let common = from
            .iter()
            .zip(to.iter())
            .take_while(|(a, b)| a == b)
            .count()
            .min(to.len().saturating_sub(1));

        let mut segments: Vec<&str> = vec![".."; from.len() - common];
        segments.extend_from_slice(&to[common..]);
        segments.join("/")
    }

    /// Check if this URI points to a relationships file
    pub fn is_relationships(&self) -> bool {
        self.path.contains("/_rels/") && self.path.ends_with(".rels")
    }
}

impl fmt::Display for PartUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

impl std::str::FromStr for PartUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PartUri::new(s)
    }
}

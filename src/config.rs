//! Editor configuration, loaded from TOML

use crate::error::Result;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub format: FormatDefaults,
    /// Glyph prepended to every inserted bullet item
    pub bullet_prefix: String,
    /// Level used for inserted headings when none is given
    pub default_heading_level: u8,
    /// Maximum characters shown per paragraph in listings
    pub preview_len: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            format: FormatDefaults::default(),
            bullet_prefix: "• ".to_string(),
            default_heading_level: 2,
            preview_len: 80,
        }
    }
}

/// Default character formatting written into new documents
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct FormatDefaults {
    pub font_ascii: String,
    pub font_east_asia: String,
    pub font_size_pt: f32,
}

impl Default for FormatDefaults {
    fn default() -> Self {
        Self {
            font_ascii: "Calibri".to_string(),
            font_east_asia: "Microsoft JhengHei".to_string(),
            font_size_pt: 11.0,
        }
    }
}

impl EditorConfig {
    /// Load config from a TOML file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Cut `text` to the preview length, marking the cut with `...`
    pub fn preview(&self, text: &str) -> String {
        if text.chars().count() <= self.preview_len {
            return text.to_string();
        }
        let cut: String = text.chars().take(self.preview_len).collect();
        format!("{cut}...")
    }
}

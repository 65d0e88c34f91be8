//! Structural edits: every operation resolves its anchor first and only
//! then splices into the body's block list

use super::{locate, Alignment, Anchor, AnchorScope, BlockContent, BlockKind, Document, Paragraph, Table};
use crate::error::{Error, Result};

/// One line of [`Document::outline`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Paragraph ordinal, usable as [`Anchor::Index`]
    pub index: usize,
    pub kind: BlockKind,
    pub preview: String,
}

/// Formatting applied by [`Document::set_paragraph_format`]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParagraphFormat {
    pub font_size: Option<f32>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub alignment: Option<Alignment>,
}

fn check_level(level: u8) -> Result<u8> {
    if (1..=9).contains(&level) {
        Ok(level)
    } else {
        Err(Error::InvalidArgument(format!("heading level must be 1-9, got {level}")))
    }
}

impl Document {
    /// Body index of the first block matching `anchor`
    pub fn locate(&self, anchor: &Anchor, scope: AnchorScope) -> Result<Option<usize>> {
        locate(&self.body, &self.styles, anchor, scope)
    }

    /// Insert `blocks` right after the anchor, or append them when no anchor
    /// is given. Returns the body index of the first inserted block.
    pub(super) fn splice_after(
        &mut self,
        anchor: Option<&str>,
        scope: AnchorScope,
        blocks: Vec<BlockContent>,
    ) -> Result<Option<usize>> {
        let at = match anchor {
            Some(text) => match self.locate(&Anchor::from(text), scope)? {
                Some(index) => index + 1,
                None => {
                    log::warn!("anchor not found: {text:?}");
                    return Ok(None);
                }
            },
            None => self.body.content.len(),
        };

        for (offset, block) in blocks.into_iter().enumerate() {
            self.body.insert(at + offset, block);
        }
        Ok(Some(at))
    }

    /// Build a paragraph or heading, registering the heading style
    fn new_block(&mut self, content: &str, heading_level: Option<u8>) -> Result<BlockContent> {
        let para = match heading_level {
            Some(level) => {
                self.ensure_style(&format!("Heading{level}"))?;
                Paragraph::heading(content, level)
            }
            None => Paragraph::new(content),
        };
        Ok(BlockContent::Paragraph(para))
    }

    /// Insert a paragraph (or a heading of `heading_level`) after the first
    /// paragraph containing `anchor`
    pub fn insert_after(
        &mut self,
        anchor: &str,
        content: &str,
        heading_level: Option<u8>,
    ) -> Result<Option<usize>> {
        let heading_level = heading_level.map(check_level).transpose()?;
        if self.locate(&Anchor::from(anchor), AnchorScope::AnyParagraph)?.is_none() {
            log::warn!("anchor not found: {anchor:?}");
            return Ok(None);
        }
        let block = self.new_block(content, heading_level)?;
        let inserted = self.splice_after(Some(anchor), AnchorScope::AnyParagraph, vec![block])?;
        log::info!("inserted paragraph after {anchor:?}");
        Ok(inserted)
    }

    /// Insert content after the first heading containing `heading`. With
    /// `as_heading` the content becomes a heading of `level` (default from
    /// the configuration).
    pub fn insert_after_heading(
        &mut self,
        heading: &str,
        content: &str,
        as_heading: bool,
        level: Option<u8>,
    ) -> Result<Option<usize>> {
        let level = check_level(level.unwrap_or(self.config.default_heading_level))?;
        if self.locate(&Anchor::from(heading), AnchorScope::HeadingsOnly)?.is_none() {
            log::warn!("heading not found: {heading:?}");
            return Ok(None);
        }
        let block = self.new_block(content, as_heading.then_some(level))?;
        let inserted = self.splice_after(Some(heading), AnchorScope::HeadingsOnly, vec![block])?;
        log::info!("inserted content after heading {heading:?}");
        Ok(inserted)
    }

    /// Insert bullet items, in order, right after the first heading
    /// containing `heading`
    pub fn insert_bullets(&mut self, heading: &str, items: &[String]) -> Result<Option<usize>> {
        if items.is_empty() {
            return Err(Error::InvalidArgument("bullet list must not be empty".into()));
        }
        let prefix = self.config.bullet_prefix.clone();
        let blocks = items
            .iter()
            .map(|item| BlockContent::Paragraph(Paragraph::new(format!("{prefix}{item}"))))
            .collect();

        let inserted = self.splice_after(Some(heading), AnchorScope::HeadingsOnly, blocks)?;
        if inserted.is_some() {
            log::info!("inserted {} bullet(s) after {heading:?}", items.len());
        }
        Ok(inserted)
    }

    /// Remove the first paragraph containing `search`
    pub fn delete_paragraph(&mut self, search: &str) -> Result<bool> {
        match self.locate(&Anchor::from(search), AnchorScope::AnyParagraph)? {
            Some(index) => {
                self.body.remove(index);
                log::info!("deleted paragraph containing {search:?}");
                Ok(true)
            }
            None => {
                log::warn!("no paragraph contains {search:?}");
                Ok(false)
            }
        }
    }

    /// Insert a `rows` x `cols` table filled row-major from `data`, after
    /// `anchor` or at the end of the document
    pub fn insert_table(
        &mut self,
        rows: usize,
        cols: usize,
        data: &[String],
        anchor: Option<&str>,
    ) -> Result<Option<usize>> {
        Table::check_dimensions(rows, cols)?;
        if let Some(text) = anchor {
            if self.locate(&Anchor::from(text), AnchorScope::AnyParagraph)?.is_none() {
                log::warn!("anchor not found: {text:?}");
                return Ok(None);
            }
        }
        self.ensure_style("TableGrid")?;

        let table = Table::with_data(rows, cols, data);
        let inserted = self.splice_after(anchor, AnchorScope::AnyParagraph, vec![BlockContent::Table(table)])?;
        log::info!("inserted {rows}x{cols} table");
        Ok(inserted)
    }

    /// Insert a page break paragraph after `anchor` or at the end
    pub fn insert_page_break(&mut self, anchor: Option<&str>) -> Result<Option<usize>> {
        let block = BlockContent::Paragraph(Paragraph::page_break());
        self.splice_after(anchor, AnchorScope::AnyParagraph, vec![block])
    }

    /// Replace the text of one table cell. Out-of-range indices leave the
    /// document unchanged and return `false`.
    pub fn update_table_cell(&mut self, table: usize, row: usize, col: usize, text: &str) -> bool {
        let cell = self
            .body
            .tables_mut()
            .nth(table)
            .and_then(|t| t.cell_mut(row, col));
        match cell {
            Some(cell) => {
                cell.set_text(text);
                log::info!("updated table {table} cell ({row}, {col})");
                true
            }
            None => {
                log::warn!("no cell ({row}, {col}) in table {table}");
                false
            }
        }
    }

    /// Apply run formatting (and alignment) to the first paragraph
    /// containing `search`
    pub fn set_paragraph_format(&mut self, search: &str, format: &ParagraphFormat) -> Result<bool> {
        let Some(index) = self.locate(&Anchor::from(search), AnchorScope::AnyParagraph)? else {
            log::warn!("no paragraph contains {search:?}");
            return Ok(false);
        };
        let Some(para) = self.body.content.get_mut(index).and_then(BlockContent::as_paragraph_mut) else {
            return Ok(false);
        };

        for run in para.runs_mut() {
            let props = run.properties_mut();
            if let Some(size) = format.font_size {
                props.set_font_size_pt(size);
            }
            if let Some(bold) = format.bold {
                props.set_bold(bold);
            }
            if let Some(italic) = format.italic {
                props.set_italic(italic);
            }
        }
        if let Some(alignment) = format.alignment {
            para.properties_mut().set_alignment(alignment);
        }
        Ok(true)
    }

    /// Headings, page breaks and non-blank paragraphs with their ordinals
    pub fn outline(&self) -> Vec<OutlineEntry> {
        self.body
            .paragraphs()
            .enumerate()
            .filter_map(|(index, para)| {
                let kind = self.block_kind(para);
                let text = para.text();
                if kind == BlockKind::Paragraph && text.trim().is_empty() {
                    return None;
                }
                Some(OutlineEntry {
                    index,
                    kind,
                    preview: self.config.preview(&text).replace('\n', " "),
                })
            })
            .collect()
    }
}

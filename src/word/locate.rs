//! Anchor lookup in the body's block list

use super::{Body, BlockContent, StyleCatalog};
use crate::error::{Error, Result};

/// How an anchor block is matched
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// First paragraph whose text contains the substring
    Contains(String),
    /// Paragraph with this ordinal (counting paragraphs only)
    Index(usize),
}

/// Which paragraphs may serve as anchors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AnchorScope {
    #[default]
    AnyParagraph,
    HeadingsOnly,
}

impl From<&str> for Anchor {
    fn from(text: &str) -> Self {
        Anchor::Contains(text.to_string())
    }
}

/// Body index of the first block matching `anchor`, scanning in document
/// order. `Ok(None)` means no block matched.
pub fn locate(
    body: &Body,
    styles: &StyleCatalog,
    anchor: &Anchor,
    scope: AnchorScope,
) -> Result<Option<usize>> {
    let is_candidate = |block: &BlockContent| match block {
        BlockContent::Paragraph(p) => match scope {
            AnchorScope::AnyParagraph => true,
            AnchorScope::HeadingsOnly => p.heading_level_with(|id| styles.heading_level(id)).is_some(),
        },
        _ => false,
    };

    match anchor {
        Anchor::Contains(needle) => {
            if needle.is_empty() {
                return Err(Error::InvalidArgument("anchor text must not be empty".into()));
            }
            Ok(body.content.iter().position(|block| {
                is_candidate(block)
                    && block
                        .as_paragraph()
                        .map_or(false, |p| p.text().contains(needle.as_str()))
            }))
        }
        Anchor::Index(ordinal) => Ok(body
            .content
            .iter()
            .enumerate()
            .filter(|(_, block)| block.as_paragraph().is_some())
            .nth(*ordinal)
            .filter(|(_, block)| is_candidate(block))
            .map(|(index, _)| index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word::{Paragraph, Table};
    use pretty_assertions::assert_eq;

    fn body() -> Body {
        Body {
            content: vec![
                BlockContent::Paragraph(Paragraph::new("Intro text")),
                BlockContent::Table(Table::new(1, 1)),
                BlockContent::Paragraph(Paragraph::heading("Section 1", 1)),
                BlockContent::Paragraph(Paragraph::new("Section 1 details")),
            ],
            section_properties: None,
        }
    }

    #[test]
    fn test_first_match_wins() {
        let styles = StyleCatalog::default();
        let anchor = Anchor::from("Section 1");

        assert_eq!(locate(&body(), &styles, &anchor, AnchorScope::AnyParagraph).unwrap(), Some(2));
        assert_eq!(
            locate(&body(), &styles, &Anchor::from("details"), AnchorScope::HeadingsOnly).unwrap(),
            None
        );
    }

    #[test]
    fn test_index_counts_paragraphs_only() {
        let styles = StyleCatalog::default();
        assert_eq!(locate(&body(), &styles, &Anchor::Index(1), AnchorScope::AnyParagraph).unwrap(), Some(2));
        assert_eq!(locate(&body(), &styles, &Anchor::Index(3), AnchorScope::AnyParagraph).unwrap(), None);
        assert_eq!(locate(&body(), &styles, &Anchor::Index(0), AnchorScope::HeadingsOnly).unwrap(), None);
    }

    #[test]
    fn test_empty_anchor_is_rejected() {
        let result = locate(&body(), &StyleCatalog::default(), &Anchor::from(""), AnchorScope::AnyParagraph);
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }
}

//! Style lookup and the styles the editor inserts (headings, table grid)

use super::paragraph::heading_level_of_style;
use super::Document;
use crate::error::Result;
use crate::opc::{rel_types, Part, PartUri, WORD_STYLES};
use crate::xml::{RawXmlElement, W};
use std::collections::HashMap;

/// Style ids mapped to display names, as read from styles.xml
#[derive(Clone, Debug, Default)]
pub struct StyleCatalog {
    names: HashMap<String, String>,
}

impl StyleCatalog {
    pub fn from_xml(root: &RawXmlElement) -> Self {
        let names = root
            .children_named("style")
            .filter_map(|style| {
                let id = style.attr("w:styleId")?;
                let name = style.child("name").and_then(|n| n.attr("w:val")).unwrap_or(id);
                Some((id.to_string(), name.to_string()))
            })
            .collect();
        Self { names }
    }

    pub fn contains(&self, style_id: &str) -> bool {
        self.names.contains_key(style_id)
    }

    /// Heading level of a style, from its display name (`heading 2`) or,
    /// for styles not in the catalog, from the id itself
    pub fn heading_level(&self, style_id: &str) -> Option<u8> {
        match self.names.get(style_id) {
            Some(name) => heading_level_of_style(name).or_else(|| heading_level_of_style(style_id)),
            None => heading_level_of_style(style_id),
        }
    }
}

impl Document {
    /// Make sure a style the editor references exists in styles.xml.
    /// Only `HeadingN` and `TableGrid` are known; other ids are left alone.
    pub(crate) fn ensure_style(&mut self, style_id: &str) -> Result<()> {
        if self.styles.contains(style_id) {
            return Ok(());
        }
        let Some(style) = builtin_style(style_id) else {
            return Ok(());
        };

        let uri = match self.package.related_by_type(&self.main_uri, rel_types::STYLES) {
            Some(uri) if self.package.contains(&uri) => uri,
            _ => self.create_styles_part()?,
        };
        let mut root = self.package.read_xml(&uri)?;
        root.push_child(style);
        self.package.write_xml(&uri, &root)?;
        self.styles = StyleCatalog::from_xml(&root);

        log::debug!("added style {style_id} to {uri}");
        Ok(())
    }

    /// Create /word/styles.xml from the configured format defaults
    pub(crate) fn create_styles_part(&mut self) -> Result<PartUri> {
        let mut uri = PartUri::new("/word/styles.xml")?;
        if self.package.contains(&uri) {
            uri = self.package.next_part_uri("/word/styles", "xml")?;
        }
        let root = default_styles(&self.config.format);

        self.package.add_part(Part::new(uri.clone(), WORD_STYLES, Vec::new()));
        self.package.write_xml(&uri, &root)?;
        self.package.relate(&self.main_uri, rel_types::STYLES, &uri)?;
        self.styles = StyleCatalog::from_xml(&root);
        Ok(uri)
    }
}

fn default_styles(format: &crate::config::FormatDefaults) -> RawXmlElement {
    let half_points = ((format.font_size_pt * 2.0).round() as u32).to_string();
    let r_pr = RawXmlElement::new("w:rPr")
        .with_child(
            RawXmlElement::new("w:rFonts")
                .with_attr("w:ascii", &format.font_ascii)
                .with_attr("w:hAnsi", &format.font_ascii)
                .with_attr("w:eastAsia", &format.font_east_asia)
                .with_attr("w:cs", &format.font_ascii),
        )
        .with_child(RawXmlElement::new("w:sz").with_attr("w:val", &half_points))
        .with_child(RawXmlElement::new("w:szCs").with_attr("w:val", &half_points));

    let normal = RawXmlElement::new("w:style")
        .with_attr("w:type", "paragraph")
        .with_attr("w:default", "1")
        .with_attr("w:styleId", "Normal")
        .with_child(RawXmlElement::new("w:name").with_attr("w:val", "Normal"))
        .with_child(RawXmlElement::new("w:qFormat"));

    RawXmlElement::new("w:styles")
        .with_attr("xmlns:w", W)
        .with_child(
            RawXmlElement::new("w:docDefaults")
                .with_child(RawXmlElement::new("w:rPrDefault").with_child(r_pr))
                .with_child(RawXmlElement::new("w:pPrDefault")),
        )
        .with_child(normal)
}

fn builtin_style(style_id: &str) -> Option<RawXmlElement> {
    if style_id == "TableGrid" {
        return Some(table_grid_style());
    }
    let level = heading_level_of_style(style_id)?;
    let size = match level {
        1 => "32",
        2 => "28",
        3 => "26",
        _ => "24",
    };

    Some(
        RawXmlElement::new("w:style")
            .with_attr("w:type", "paragraph")
            .with_attr("w:styleId", style_id)
            .with_child(RawXmlElement::new("w:name").with_attr("w:val", format!("heading {level}")))
            .with_child(RawXmlElement::new("w:basedOn").with_attr("w:val", "Normal"))
            .with_child(RawXmlElement::new("w:next").with_attr("w:val", "Normal"))
            .with_child(RawXmlElement::new("w:uiPriority").with_attr("w:val", "9"))
            .with_child(RawXmlElement::new("w:qFormat"))
            .with_child(
                RawXmlElement::new("w:pPr")
                    .with_child(RawXmlElement::new("w:keepNext"))
                    .with_child(
                        RawXmlElement::new("w:spacing")
                            .with_attr("w:before", "240")
                            .with_attr("w:after", "60"),
                    )
                    .with_child(
                        RawXmlElement::new("w:outlineLvl")
                            .with_attr("w:val", (level - 1).to_string()),
                    ),
            )
            .with_child(
                RawXmlElement::new("w:rPr")
                    .with_child(RawXmlElement::new("w:b"))
                    .with_child(RawXmlElement::new("w:sz").with_attr("w:val", size))
                    .with_child(RawXmlElement::new("w:szCs").with_attr("w:val", size)),
            ),
    )
}

fn table_grid_style() -> RawXmlElement {
    let mut borders = RawXmlElement::new("w:tblBorders");
    for edge in ["top", "left", "bottom", "right", "insideH", "insideV"] {
        borders.push_child(
            RawXmlElement::new(format!("w:{edge}"))
                .with_attr("w:val", "single")
                .with_attr("w:sz", "4")
                .with_attr("w:space", "0")
                .with_attr("w:color", "auto"),
        );
    }

    RawXmlElement::new("w:style")
        .with_attr("w:type", "table")
        .with_attr("w:styleId", "TableGrid")
        .with_child(RawXmlElement::new("w:name").with_attr("w:val", "Table Grid"))
        .with_child(RawXmlElement::new("w:basedOn").with_attr("w:val", "TableNormal"))
        .with_child(RawXmlElement::new("w:uiPriority").with_attr("w:val", "59"))
        .with_child(RawXmlElement::new("w:tblPr").with_child(borders))
}

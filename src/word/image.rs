//! Inline picture insertion

use super::{Anchor, AnchorScope, BlockContent, Body, Document, Paragraph, ParagraphContent, Run, RunContent};
use crate::error::{Error, Result};
use crate::opc::{image_content_type, rel_types, Part};
use crate::xml::{RawXmlElement, RawXmlNode, PIC};
use std::fs;
use std::path::Path;

/// EMUs per centimetre
const EMU_PER_CM: f64 = 360_000.0;

impl Document {
    /// Embed the image at `path` as an inline picture `width_cm` wide, in a
    /// new paragraph after `anchor` (or at the end). The height follows the
    /// image's aspect ratio.
    pub fn insert_image(
        &mut self,
        path: &Path,
        width_cm: f64,
        anchor: Option<&str>,
    ) -> Result<Option<usize>> {
        if !path.is_file() {
            return Err(Error::FileNotFound(path.display().to_string()));
        }
        if width_cm <= 0.0 {
            return Err(Error::InvalidArgument(format!("image width must be positive, got {width_cm}")));
        }
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let content_type = image_content_type(&ext)
            .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;

        if let Some(text) = anchor {
            if self.locate(&Anchor::from(text), AnchorScope::AnyParagraph)?.is_none() {
                log::warn!("anchor not found: {text:?}");
                return Ok(None);
            }
        }

        let (px_w, px_h) = image::image_dimensions(path)?;
        let cx = (width_cm * EMU_PER_CM).round() as u64;
        let cy = (cx as f64 * px_h as f64 / px_w.max(1) as f64).round() as u64;

        let media_uri = self.package.next_part_uri("/word/media/image", &ext)?;
        self.package
            .add_media_part(Part::new(media_uri.clone(), content_type, fs::read(path)?));
        let rel_id = self.package.relate(&self.main_uri, rel_types::IMAGE, &media_uri)?;

        let id = max_doc_pr_id(&self.body) + 1;
        let name = media_uri.file_name().unwrap_or("image").to_string();
        let mut run = Run::default();
        run.content.push(RunContent::Unknown(RawXmlNode::Element(drawing(
            id, &name, &rel_id, cx, cy,
        ))));
        let mut para = Paragraph::default();
        para.add_run(run);

        let inserted = self.splice_after(anchor, AnchorScope::AnyParagraph, vec![BlockContent::Paragraph(para)])?;
        log::info!("inserted image {} ({px_w}x{px_h} px) as {media_uri}", path.display());
        Ok(inserted)
    }
}

fn drawing(id: u32, name: &str, rel_id: &str, cx: u64, cy: u64) -> RawXmlElement {
    let (cx, cy) = (cx.to_string(), cy.to_string());

    let pic = RawXmlElement::new("pic:pic")
        .with_attr("xmlns:pic", PIC)
        .with_child(
            RawXmlElement::new("pic:nvPicPr")
                .with_child(
                    RawXmlElement::new("pic:cNvPr")
                        .with_attr("id", "0")
                        .with_attr("name", name),
                )
                .with_child(RawXmlElement::new("pic:cNvPicPr")),
        )
        .with_child(
            RawXmlElement::new("pic:blipFill")
                .with_child(RawXmlElement::new("a:blip").with_attr("r:embed", rel_id))
                .with_child(RawXmlElement::new("a:stretch").with_child(RawXmlElement::new("a:fillRect"))),
        )
        .with_child(
            RawXmlElement::new("pic:spPr")
                .with_child(
                    RawXmlElement::new("a:xfrm")
                        .with_child(RawXmlElement::new("a:off").with_attr("x", "0").with_attr("y", "0"))
                        .with_child(RawXmlElement::new("a:ext").with_attr("cx", &cx).with_attr("cy", &cy)),
                )
                .with_child(
                    RawXmlElement::new("a:prstGeom")
                        .with_attr("prst", "rect")
                        .with_child(RawXmlElement::new("a:avLst")),
                ),
        );

    let inline = RawXmlElement::new("wp:inline")
        .with_attr("distT", "0")
        .with_attr("distB", "0")
        .with_attr("distL", "0")
        .with_attr("distR", "0")
        .with_child(RawXmlElement::new("wp:extent").with_attr("cx", &cx).with_attr("cy", &cy))
        .with_child(
            RawXmlElement::new("wp:effectExtent")
                .with_attr("l", "0")
                .with_attr("t", "0")
                .with_attr("r", "0")
                .with_attr("b", "0"),
        )
        .with_child(
            RawXmlElement::new("wp:docPr")
                .with_attr("id", id.to_string())
                .with_attr("name", format!("Picture {id}")),
        )
        .with_child(
            RawXmlElement::new("wp:cNvGraphicFramePr").with_child(
                RawXmlElement::new("a:graphicFrameLocks").with_attr("noChangeAspect", "1"),
            ),
        )
        .with_child(
            RawXmlElement::new("a:graphic").with_child(
                RawXmlElement::new("a:graphicData")
                    .with_attr("uri", PIC)
                    .with_child(pic),
            ),
        );

    RawXmlElement::new("w:drawing").with_child(inline)
}

/// Largest `wp:docPr/@id` in use
fn max_doc_pr_id(body: &Body) -> u32 {
    let mut max = 0;
    let mut visit = |node: &RawXmlNode| {
        if let RawXmlNode::Element(e) = node {
            e.walk(&mut |el| {
                if el.is("docPr") {
                    if let Some(id) = el.attr("id").and_then(|v| v.parse::<u32>().ok()) {
                        max = max.max(id);
                    }
                }
            });
        }
    };
    visit_blocks(&body.content, &mut visit);
    max
}

fn visit_blocks(blocks: &[BlockContent], visit: &mut dyn FnMut(&RawXmlNode)) {
    for block in blocks {
        match block {
            BlockContent::Paragraph(p) => visit_paragraph(&p.content, visit),
            BlockContent::Table(t) => {
                for cell in t.rows.iter().flat_map(|r| r.cells.iter()) {
                    visit_blocks(&cell.content, visit);
                }
            }
            BlockContent::Unknown(node) => visit(node),
        }
    }
}

fn visit_paragraph(content: &[ParagraphContent], visit: &mut dyn FnMut(&RawXmlNode)) {
    for item in content {
        match item {
            ParagraphContent::Run(run) => {
                for c in &run.content {
                    if let RunContent::Unknown(node) = c {
                        visit(node);
                    }
                }
            }
            ParagraphContent::Hyperlink(link) => visit_paragraph(&link.content, visit),
            ParagraphContent::Unknown(node) => visit(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use crate::opc::rel_types;
    use pretty_assertions::assert_eq;

    fn write_png(dir: &Path, w: u32, h: u32) -> std::path::PathBuf {
        let path = dir.join("pic.png");
        image::RgbImage::new(w, h).save(&path).unwrap();
        path
    }

    #[test]
    fn test_insert_image_keeps_aspect_ratio() {
        let dir = tempfile::tempdir().unwrap();
        let png = write_png(dir.path(), 40, 20);
        let mut doc = Document::new(EditorConfig::default()).unwrap();
        doc.body_mut().push(BlockContent::Paragraph(Paragraph::new("Figure:")));

        assert_eq!(doc.insert_image(&png, 10.0, Some("Figure")).unwrap(), Some(1));
        assert_eq!(doc.insert_image(&png, 5.0, None).unwrap(), Some(2));

        let para = doc.paragraph(1).unwrap();
        let RunContent::Unknown(RawXmlNode::Element(drawing)) = &para.runs()[0].content[0] else {
            panic!("expected drawing");
        };
        let extent = drawing.path(&["inline", "extent"]).unwrap();
        assert_eq!(extent.attr("cx"), Some("3600000"));
        assert_eq!(extent.attr("cy"), Some("1800000"));
        assert_eq!(max_doc_pr_id(doc.body()), 2);

        let main = doc.main_uri.clone();
        let rels = doc.package().part_relationships(&main).unwrap();
        assert_eq!(rels.all_by_type(rel_types::IMAGE).count(), 2);
        assert!(doc.package().contains(&crate::opc::PartUri::new("/word/media/image2.png").unwrap()));
    }

    #[test]
    fn test_missing_image_is_an_error() {
        let mut doc = Document::new(EditorConfig::default()).unwrap();
        let result = doc.insert_image(Path::new("/nonexistent/x.png"), 5.0, None);
        assert!(matches!(result, Err(Error::FileNotFound(_))));
    }
}

//! PowerPoint presentations: slides, their shapes and the slide mutations

mod shape;

use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::opc::{rel_types, Package, Part, PartUri, SLIDE};
use crate::xml::{RawXmlElement, A, P, R};
use std::path::Path;

/// Layout used by `add_slide` when the requested one does not exist
/// (title and content in the stock masters)
pub const DEFAULT_LAYOUT_INDEX: usize = 1;
/// Body lines shown per slide by [`Presentation::list_slides`]
pub const MAX_PREVIEW_LINES: usize = 3;
/// Characters kept per preview line
pub const MAX_CONTENT_PREVIEW: usize = 60;
/// Characters of shape text shown by [`Presentation::slide_info`]
pub const MAX_TEXT_DISPLAY: usize = 200;
/// First id PowerPoint hands out in `sldIdLst`
const MIN_SLIDE_ID: u32 = 256;

const PRESENTATION_ORDER: &[&str] = &[
    "sldMasterIdLst", "notesMasterIdLst", "handoutMasterIdLst", "sldIdLst", "sldSz", "notesSz",
];
/// Placeholders a new slide does not inherit from its layout
const SKIPPED_PLACEHOLDERS: &[&str] = &["dt", "ftr", "sldNum"];

#[derive(Debug)]
struct SlideEntry {
    uri: PartUri,
    root: RawXmlElement,
    dirty: bool,
}

impl SlideEntry {
    fn tree(&self) -> Option<&RawXmlElement> {
        self.root.path(&["cSld", "spTree"])
    }

    fn tree_mut(&mut self) -> Option<&mut RawXmlElement> {
        self.root.path_mut(&["cSld", "spTree"])
    }

    fn title(&self) -> Option<String> {
        let tree = self.tree()?;
        let title = shape::shapes(tree).find(|s| shape::is_title(s))?;
        Some(shape::shape_text(title)).filter(|t| !t.is_empty())
    }
}

/// One line of [`Presentation::list_slides`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideSummary {
    pub number: usize,
    pub title: Option<String>,
    /// Leading non-empty body lines
    pub preview: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShapeSummary {
    pub index: usize,
    /// Element kind (`sp`, `pic`, `graphicFrame`, ...) plus the placeholder type
    pub kind: String,
    pub name: Option<String>,
    pub text: String,
}

/// Detail view of one slide
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlideInfo {
    pub number: usize,
    pub title: Option<String>,
    pub shape_count: usize,
    /// Shapes that carry text
    pub shapes: Vec<ShapeSummary>,
}

/// A PPTX presentation
#[derive(Debug)]
pub struct Presentation {
    package: Package,
    uri: PartUri,
    root: RawXmlElement,
    slides: Vec<SlideEntry>,
    config: EditorConfig,
}

impl Presentation {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, EditorConfig::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, config: EditorConfig) -> Result<Self> {
        Self::from_package(Package::open(path)?, config)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_package(Package::from_bytes(bytes)?, EditorConfig::default())
    }

    pub fn from_package(package: Package, config: EditorConfig) -> Result<Self> {
        let uri = package.main_part_uri()?;
        let root = package.read_xml(&uri)?;

        let mut slides = Vec::new();
        if let Some(list) = root.child("sldIdLst") {
            for id in list.children_named("sldId") {
                let rel_id = rel_id_attr(id).ok_or_else(|| Error::MissingAttribute {
                    element: "sldId".into(),
                    attr: "r:id".into(),
                })?;
                let slide_uri = package.related_uri(&uri, rel_id)?;
                let slide_root = package.read_xml(&slide_uri)?;
                slides.push(SlideEntry {
                    uri: slide_uri,
                    root: slide_root,
                    dirty: false,
                });
            }
        }

        log::debug!("opened presentation with {} slide(s)", slides.len());
        Ok(Self {
            package,
            uri,
            root,
            slides,
            config,
        })
    }

    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush()?;
        self.package.save(path)
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    fn flush(&mut self) -> Result<()> {
        for slide in &mut self.slides {
            if slide.dirty {
                self.package.write_xml(&slide.uri, &slide.root)?;
                slide.dirty = false;
            }
        }
        self.package.write_xml(&self.uri, &self.root)
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Title text of slide `number` (1-based)
    pub fn slide_title(&self, number: usize) -> Option<String> {
        self.slide(number)?.title()
    }

    /// All text on slide `number`, one shape per line group
    pub fn slide_text(&self, number: usize) -> Option<String> {
        let tree = self.slide(number)?.tree()?;
        let texts: Vec<String> = shape::shapes(tree)
            .map(shape::shape_text)
            .filter(|t| !t.is_empty())
            .collect();
        Some(texts.join("\n"))
    }

    fn slide(&self, number: usize) -> Option<&SlideEntry> {
        number.checked_sub(1).and_then(|i| self.slides.get(i))
    }

    /// Slide `number`, logging when it is out of range
    fn slide_mut(&mut self, number: usize) -> Option<&mut SlideEntry> {
        let count = self.slides.len();
        let slide = number.checked_sub(1).and_then(|i| self.slides.get_mut(i));
        if slide.is_none() {
            log::warn!("slide {number} does not exist (1..={count})");
        }
        slide
    }

    /// Replace `old` in every run of every slide, or only slide `number`.
    /// Returns the number of runs changed, table cells included.
    pub fn replace_text(&mut self, old: &str, new: &str, slide: Option<usize>) -> usize {
        if old.is_empty() {
            log::warn!("refusing to replace empty text");
            return 0;
        }
        let range = match slide {
            Some(number) => {
                if self.slide_mut(number).is_none() {
                    return 0;
                }
                number - 1..number
            }
            None => 0..self.slides.len(),
        };

        let mut changed = 0;
        for entry in &mut self.slides[range] {
            let Some(tree) = entry.tree_mut() else {
                continue;
            };
            let n = shape::replace_in_runs(tree, old, new);
            if n > 0 {
                entry.dirty = true;
                changed += n;
            }
        }

        if changed > 0 {
            log::info!("replaced {old:?} with {new:?} in {changed} run(s)");
        } else {
            log::warn!("text not found: {old:?}");
        }
        changed
    }

    /// Set the text of the slide's title placeholder
    pub fn update_slide_title(&mut self, number: usize, title: &str) -> Result<bool> {
        let Some(entry) = self.slide_mut(number) else {
            return Ok(false);
        };
        let body = entry
            .tree_mut()
            .and_then(|tree| tree.elements_mut().find(|s| shape::is_title(s)))
            .and_then(|title_shape| title_shape.child_mut("txBody"));
        let Some(body) = body else {
            log::warn!("slide {number} has no title placeholder");
            return Ok(false);
        };
        shape::set_body_text(body, title);
        entry.dirty = true;
        log::info!("slide {number} title set to {title:?}");
        Ok(true)
    }

    /// Append a paragraph to the first text shape that is not the title
    pub fn add_text_to_slide(&mut self, number: usize, text: &str) -> Result<bool> {
        let Some(entry) = self.slide_mut(number) else {
            return Ok(false);
        };
        let prefix = entry.root.bind_prefix(A, "a");
        let target = entry
            .tree_mut()
            .and_then(|tree| tree.elements_mut().find(|s| s.is("sp") && !shape::is_title(s)));
        let Some(target) = target else {
            log::warn!("slide {number} has no text shape besides the title");
            return Ok(false);
        };
        let body = shape::ensure_text_body(target, &prefix);
        shape::add_paragraph(body, text);
        entry.dirty = true;
        log::info!("added text to slide {number}");
        Ok(true)
    }

    /// Layout parts of the first slide master, in master order
    fn layouts(&self) -> Result<Vec<PartUri>> {
        let Some(master_id) = self.root.path(&["sldMasterIdLst", "sldMasterId"]) else {
            return Ok(Vec::new());
        };
        let rel_id = rel_id_attr(master_id).ok_or_else(|| Error::MissingAttribute {
            element: "sldMasterId".into(),
            attr: "r:id".into(),
        })?;
        let master_uri = self.package.related_uri(&self.uri, rel_id)?;
        let master = self.package.read_xml(&master_uri)?;

        let mut layouts = Vec::new();
        if let Some(list) = master.child("sldLayoutIdLst") {
            for id in list.children_named("sldLayoutId") {
                if let Some(rel_id) = rel_id_attr(id) {
                    layouts.push(self.package.related_uri(&master_uri, rel_id)?);
                }
            }
        }
        Ok(layouts)
    }

    /// Names of the available layouts, indexed as `add_slide` expects
    pub fn layout_names(&self) -> Result<Vec<String>> {
        self.layouts()?
            .iter()
            .map(|uri| {
                let layout = self.package.read_xml(uri)?;
                Ok(layout
                    .child("cSld")
                    .and_then(|c| c.attr("name"))
                    .unwrap_or_default()
                    .to_string())
            })
            .collect()
    }

    /// Append a slide built from layout `layout_index` and give it `title`.
    /// Returns the new slide's number.
    pub fn add_slide(&mut self, title: &str, layout_index: usize) -> Result<usize> {
        let layouts = self.layouts()?;
        let index = [layout_index, DEFAULT_LAYOUT_INDEX, 0]
            .into_iter()
            .find(|i| *i < layouts.len())
            .ok_or_else(|| Error::InvalidDocument("presentation has no slide layouts".into()))?;
        if index != layout_index {
            log::warn!("layout {layout_index} does not exist, using {index}");
        }
        let layout_uri = &layouts[index];
        let layout = self.package.read_xml(layout_uri)?;

        let mut root = new_slide(&layout);
        if let Some(body) = root
            .path_mut(&["cSld", "spTree"])
            .and_then(|tree| tree.elements_mut().find(|s| shape::is_title(s)))
            .and_then(|s| s.child_mut("txBody"))
        {
            shape::set_body_text(body, title);
        }

        let uri = self.package.next_part_uri("/ppt/slides/slide", "xml")?;
        self.package.add_part(Part::new(uri.clone(), SLIDE, Vec::new()));
        self.package.write_xml(&uri, &root)?;
        self.package.relate(&uri, rel_types::SLIDE_LAYOUT, layout_uri)?;
        let rel_id = self.package.relate(&self.uri, rel_types::SLIDE, &uri)?;

        let r = self.root.bind_prefix(R, "r");
        if self.root.child("sldIdLst").is_none() {
            let list = RawXmlElement::new(self.root.qualified("sldIdLst"));
            self.root.put_ordered(list, PRESENTATION_ORDER);
        }
        let id_name = self.root.qualified("sldId");
        let Some(list) = self.root.child_mut("sldIdLst") else {
            return Err(Error::InvalidDocument("sldIdLst missing".into()));
        };
        let next_id = list
            .children_named("sldId")
            .filter_map(|s| s.attr("id")?.parse::<u32>().ok())
            .max()
            .map_or(MIN_SLIDE_ID, |max| (max + 1).max(MIN_SLIDE_ID));
        list.push_child(
            RawXmlElement::new(id_name)
                .with_attr("id", next_id.to_string())
                .with_attr(format!("{r}:id"), rel_id),
        );

        self.slides.push(SlideEntry {
            uri,
            root,
            dirty: false,
        });
        let number = self.slides.len();
        log::info!("added slide {number}: {title:?}");
        Ok(number)
    }

    /// Remove slide `number` together with its notes page
    pub fn delete_slide(&mut self, number: usize) -> Result<bool> {
        if self.slide_mut(number).is_none() {
            return Ok(false);
        }
        let index = number - 1;
        let title = self.slides[index].title();
        let entry = self.slides.remove(index);

        if let Some(list) = self.root.child_mut("sldIdLst") {
            let mut seen = 0;
            let mut removed_rel = None;
            list.children.retain(|node| {
                let Some(id) = node.as_element().filter(|e| e.is("sldId")) else {
                    return true;
                };
                let keep = seen != index;
                if !keep {
                    removed_rel = rel_id_attr(id).map(str::to_string);
                }
                seen += 1;
                keep
            });
            if let Some(rel_id) = removed_rel {
                self.package.unrelate(&self.uri, &rel_id);
            }
        }
        if let Some(notes) = self.package.related_by_type(&entry.uri, rel_types::NOTES_SLIDE) {
            self.package.remove_part(&notes);
        }
        self.package.remove_part(&entry.uri);

        log::info!(
            "deleted slide {number}: {}",
            title.as_deref().unwrap_or("(untitled)")
        );
        Ok(true)
    }

    /// Set the latin font (and size in points) of every run on a slide
    pub fn set_font(&mut self, number: usize, font: &str, size_pt: Option<f32>) -> Result<bool> {
        if font.trim().is_empty() {
            return Err(Error::InvalidArgument("font name must not be empty".into()));
        }
        if size_pt.is_some_and(|s| s <= 0.0) {
            return Err(Error::InvalidArgument("font size must be positive".into()));
        }
        let Some(entry) = self.slide_mut(number) else {
            return Ok(false);
        };
        let prefix = entry.root.bind_prefix(A, "a");
        let Some(tree) = entry.tree_mut() else {
            return Ok(false);
        };
        let changed = shape::restyle_runs(tree, font, size_pt, &prefix);
        entry.dirty = true;
        log::info!("slide {number}: {changed} run(s) set to {font}");
        Ok(true)
    }

    pub fn list_slides(&self) -> Vec<SlideSummary> {
        self.slides
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let preview = entry
                    .tree()
                    .map(|tree| {
                        shape::shapes(tree)
                            .filter(|s| !shape::is_title(s))
                            .flat_map(|s| {
                                shape::shape_text(s)
                                    .lines()
                                    .map(str::trim)
                                    .filter(|l| !l.is_empty())
                                    .map(|l| l.chars().take(MAX_CONTENT_PREVIEW).collect())
                                    .collect::<Vec<String>>()
                            })
                            .take(MAX_PREVIEW_LINES)
                            .collect()
                    })
                    .unwrap_or_default();
                SlideSummary {
                    number: i + 1,
                    title: entry.title(),
                    preview,
                }
            })
            .collect()
    }

    pub fn slide_info(&self, number: usize) -> Option<SlideInfo> {
        let entry = self.slide(number)?;
        let tree = entry.tree()?;
        let all: Vec<&RawXmlElement> = shape::shapes(tree).collect();

        let shapes = all
            .iter()
            .enumerate()
            .filter_map(|(i, s)| {
                let text = shape::shape_text(s);
                if text.is_empty() {
                    return None;
                }
                let kind = match shape::placeholder_type(s) {
                    Some(ph) => format!("{} ({ph})", s.local_name()),
                    None => s.local_name().to_string(),
                };
                Some(ShapeSummary {
                    index: i + 1,
                    kind,
                    name: shape::shape_name(s).map(str::to_string),
                    text: text.chars().take(MAX_TEXT_DISPLAY).collect(),
                })
            })
            .collect();

        Some(SlideInfo {
            number,
            title: entry.title(),
            shape_count: all.len(),
            shapes,
        })
    }
}

fn rel_id_attr(element: &RawXmlElement) -> Option<&str> {
    element
        .attributes
        .iter()
        .find(|(k, _)| k.ends_with(":id"))
        .map(|(_, v)| v.as_str())
}

/// Empty slide carrying the layout's placeholders, without their text
fn new_slide(layout: &RawXmlElement) -> RawXmlElement {
    let mut tree = RawXmlElement::new("p:spTree")
        .with_child(
            RawXmlElement::new("p:nvGrpSpPr")
                .with_child(RawXmlElement::new("p:cNvPr").with_attr("id", "1").with_attr("name", ""))
                .with_child(RawXmlElement::new("p:cNvGrpSpPr"))
                .with_child(RawXmlElement::new("p:nvPr")),
        )
        .with_child(RawXmlElement::new("p:grpSpPr"));

    let placeholders = layout
        .path(&["cSld", "spTree"])
        .map(|t| shape::shapes(t).collect::<Vec<_>>())
        .unwrap_or_default();
    let mut next_id = 2;
    for source in placeholders {
        let Some(ph) = shape::placeholder(source) else {
            continue;
        };
        if !source.is("sp") || SKIPPED_PLACEHOLDERS.contains(&ph.attr("type").unwrap_or("body")) {
            continue;
        }
        let mut new_ph = RawXmlElement::new("p:ph");
        for (key, value) in &ph.attributes {
            new_ph.set_attr(key.clone(), value.clone());
        }
        let name = shape::shape_name(source).unwrap_or("Placeholder").to_string();

        tree.push_child(
            RawXmlElement::new("p:sp")
                .with_child(
                    RawXmlElement::new("p:nvSpPr")
                        .with_child(
                            RawXmlElement::new("p:cNvPr")
                                .with_attr("id", next_id.to_string())
                                .with_attr("name", name),
                        )
                        .with_child(
                            RawXmlElement::new("p:cNvSpPr").with_child(
                                RawXmlElement::new("a:spLocks").with_attr("noGrp", "1"),
                            ),
                        )
                        .with_child(RawXmlElement::new("p:nvPr").with_child(new_ph)),
                )
                .with_child(RawXmlElement::new("p:spPr"))
                .with_child(
                    RawXmlElement::new("p:txBody")
                        .with_child(RawXmlElement::new("a:bodyPr"))
                        .with_child(RawXmlElement::new("a:lstStyle"))
                        .with_child(RawXmlElement::new("a:p")),
                ),
        );
        next_id += 1;
    }

    RawXmlElement::new("p:sld")
        .with_attr("xmlns:a", A)
        .with_attr("xmlns:r", R)
        .with_attr("xmlns:p", P)
        .with_child(RawXmlElement::new("p:cSld").with_child(tree))
        .with_child(
            RawXmlElement::new("p:clrMapOvr")
                .with_child(RawXmlElement::new("a:masterClrMapping")),
        )
}

//! Cell formats (xl/styles.xml): fonts, fills and cellXfs records

use crate::error::{Error, Result};
use crate::opc::{rel_types, Package, Part, PartUri, SHEET_STYLES};
use crate::xml::{RawXmlElement, S};

const STYLESHEET_ORDER: &[&str] = &[
    "numFmts", "fonts", "fills", "borders", "cellStyleXfs", "cellXfs", "cellStyles", "dxfs",
    "tableStyles", "colors", "extLst",
];
const FONT_ORDER: &[&str] = &[
    "b", "i", "strike", "condense", "extend", "outline", "shadow", "u", "vertAlign", "sz",
    "color", "name", "family", "charset", "scheme",
];
const XF_ORDER: &[&str] = &["alignment", "protection", "extLst"];

/// Formatting applied by `set_format`
#[derive(Clone, Debug, PartialEq)]
pub struct CellFormat {
    pub bold: bool,
    pub italic: bool,
    pub font_size: f32,
    /// `RRGGBB` (a leading `#` is accepted)
    pub bg_color: Option<String>,
    /// Any `ST_HorizontalAlignment` name, see [`HorizontalAlignment`]
    pub alignment: Option<String>,
}

impl CellFormat {
    /// Check every field without touching the stylesheet
    pub fn validate(&self) -> Result<()> {
        self.resolve().map(|_| ())
    }

    fn resolve(&self) -> Result<(Option<String>, Option<HorizontalAlignment>)> {
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "font size must be positive: {}",
                self.font_size
            )));
        }
        let fill = self.bg_color.as_deref().map(argb).transpose()?;
        let horizontal = self
            .alignment
            .as_deref()
            .map(|name| {
                HorizontalAlignment::parse(name)
                    .ok_or_else(|| Error::InvalidArgument(format!("unknown alignment: {name}")))
            })
            .transpose()?;
        Ok((fill, horizontal))
    }
}

/// Values allowed in `<alignment horizontal="..">`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HorizontalAlignment {
    General,
    Left,
    Center,
    Right,
    Fill,
    Justify,
    CenterContinuous,
    Distributed,
}

impl HorizontalAlignment {
    /// Case-insensitive; `centre` and `justified` are accepted as aliases
    pub fn parse(name: &str) -> Option<Self> {
        let value = match name.trim().to_ascii_lowercase().as_str() {
            "general" => Self::General,
            "left" => Self::Left,
            "center" | "centre" => Self::Center,
            "right" => Self::Right,
            "fill" => Self::Fill,
            "justify" | "justified" => Self::Justify,
            "centercontinuous" => Self::CenterContinuous,
            "distributed" => Self::Distributed,
            _ => return None,
        };
        Some(value)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Fill => "fill",
            Self::Justify => "justify",
            Self::CenterContinuous => "centerContinuous",
            Self::Distributed => "distributed",
        }
    }
}

impl Default for CellFormat {
    fn default() -> Self {
        Self {
            bold: false,
            italic: false,
            font_size: 11.0,
            bg_color: None,
            alignment: None,
        }
    }
}

/// The workbook's stylesheet, loaded on first use
#[derive(Debug)]
pub struct StyleSheet {
    uri: PartUri,
    root: RawXmlElement,
    dirty: bool,
}

impl StyleSheet {
    /// Load styles.xml, creating a minimal stylesheet when the workbook has none
    pub fn load_or_create(package: &mut Package, workbook: &PartUri) -> Result<Self> {
        if let Some(uri) = package.related_by_type(workbook, rel_types::STYLES) {
            if package.contains(&uri) {
                let root = package.read_xml(&uri)?;
                return Ok(Self { uri, root, dirty: false });
            }
        }

        let uri = PartUri::new("/xl/styles.xml")?;
        package.add_part(Part::new(uri.clone(), SHEET_STYLES, Vec::new()));
        package.relate(workbook, rel_types::STYLES, &uri)?;
        log::debug!("created {uri}");
        Ok(Self {
            uri,
            root: minimal_stylesheet(),
            dirty: true,
        })
    }

    /// Append the records for `format`, based on the cell's current xf, and
    /// return the new xf index. Nothing is appended when `format` is invalid.
    pub fn add_format(&mut self, base_xf: usize, format: &CellFormat) -> Result<usize> {
        let (fill_rgb, horizontal) = format.resolve()?;
        let base = self
            .list("cellXfs")
            .and_then(|xfs| xfs.children_named("xf").nth(base_xf).cloned())
            .unwrap_or_else(|| self.qualified_new("xf").with_attr("numFmtId", "0"));

        let base_font: usize = base.attr("fontId").and_then(|v| v.parse().ok()).unwrap_or(0);
        let mut font = self
            .list("fonts")
            .and_then(|fonts| fonts.children_named("font").nth(base_font).cloned())
            .unwrap_or_else(|| self.qualified_new("font"));
        self.apply_font(&mut font, format);
        let font_id = self.append("fonts", font);

        let mut xf = base;
        xf.set_attr("fontId", font_id.to_string());
        xf.set_attr("applyFont", "1");

        if let Some(rgb) = fill_rgb {
            let fill = self.qualified_new("fill").with_child(
                self.qualified_new("patternFill")
                    .with_attr("patternType", "solid")
                    .with_child(self.qualified_new("fgColor").with_attr("rgb", &rgb))
                    .with_child(self.qualified_new("bgColor").with_attr("rgb", &rgb)),
            );
            let fill_id = self.append("fills", fill);
            xf.set_attr("fillId", fill_id.to_string());
            xf.set_attr("applyFill", "1");
        }

        if let Some(horizontal) = horizontal {
            let mut alignment = xf
                .child("alignment")
                .cloned()
                .unwrap_or_else(|| self.qualified_new("alignment"));
            alignment.set_attr("horizontal", horizontal.as_str());
            xf.put_ordered(alignment, XF_ORDER);
            xf.set_attr("applyAlignment", "1");
        }
        for attr in ["borderId", "fillId", "numFmtId"] {
            if xf.attr(attr).is_none() {
                xf.set_attr(attr, "0");
            }
        }

        self.dirty = true;
        Ok(self.append("cellXfs", xf))
    }

    pub fn save(&mut self, package: &mut Package) -> Result<()> {
        if self.dirty {
            package.write_xml(&self.uri, &self.root)?;
            self.dirty = false;
        }
        Ok(())
    }

    fn apply_font(&self, font: &mut RawXmlElement, format: &CellFormat) {
        for (local, on) in [("b", format.bold), ("i", format.italic)] {
            if on {
                font.put_ordered(self.qualified_new(local), FONT_ORDER);
            } else {
                font.remove_children(local);
            }
        }
        let size = format!("{}", format.font_size);
        font.put_ordered(self.qualified_new("sz").with_attr("val", size), FONT_ORDER);
    }

    fn list(&self, local: &str) -> Option<&RawXmlElement> {
        self.root.child(local)
    }

    /// Append `item` to a record list (created in schema order when missing),
    /// keeping its `count` attribute right, and return the item's index
    fn append(&mut self, list: &str, item: RawXmlElement) -> usize {
        if self.root.child(list).is_none() {
            let elem = self.qualified_new(list);
            self.root.put_ordered(elem, STYLESHEET_ORDER);
        }
        let Some(elem) = self.root.child_mut(list) else {
            return 0;
        };
        let index = elem.elements().count();
        elem.push_child(item);
        elem.set_attr("count", (index + 1).to_string());
        index
    }

    /// New element carrying the stylesheet's namespace prefix
    fn qualified_new(&self, local: &str) -> RawXmlElement {
        RawXmlElement::new(self.root.qualified(local))
    }
}

/// `RRGGBB` / `#RRGGBB` / `AARRGGBB` to the `AARRGGBB` form styles.xml stores
fn argb(color: &str) -> Result<String> {
    let hex = color.trim().trim_start_matches('#');
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::InvalidArgument(format!("invalid colour: {color}")));
    }
    match hex.len() {
        6 => Ok(format!("FF{}", hex.to_ascii_uppercase())),
        8 => Ok(hex.to_ascii_uppercase()),
        _ => Err(Error::InvalidArgument(format!("invalid colour: {color}"))),
    }
}

fn minimal_stylesheet() -> RawXmlElement {
    let font = RawXmlElement::new("font")
        .with_child(RawXmlElement::new("sz").with_attr("val", "11"))
        .with_child(RawXmlElement::new("name").with_attr("val", "Calibri"))
        .with_child(RawXmlElement::new("family").with_attr("val", "2"));
    let fill = |pattern: &str| {
        RawXmlElement::new("fill")
            .with_child(RawXmlElement::new("patternFill").with_attr("patternType", pattern))
    };
    let border = RawXmlElement::new("border")
        .with_child(RawXmlElement::new("left"))
        .with_child(RawXmlElement::new("right"))
        .with_child(RawXmlElement::new("top"))
        .with_child(RawXmlElement::new("bottom"))
        .with_child(RawXmlElement::new("diagonal"));
    let xf = || {
        RawXmlElement::new("xf")
            .with_attr("numFmtId", "0")
            .with_attr("fontId", "0")
            .with_attr("fillId", "0")
            .with_attr("borderId", "0")
    };

    RawXmlElement::new("styleSheet")
        .with_attr("xmlns", S)
        .with_child(RawXmlElement::new("fonts").with_attr("count", "1").with_child(font))
        .with_child(
            RawXmlElement::new("fills")
                .with_attr("count", "2")
                .with_child(fill("none"))
                .with_child(fill("gray125")),
        )
        .with_child(RawXmlElement::new("borders").with_attr("count", "1").with_child(border))
        .with_child(RawXmlElement::new("cellStyleXfs").with_attr("count", "1").with_child(xf()))
        .with_child(
            RawXmlElement::new("cellXfs")
                .with_attr("count", "1")
                .with_child(xf().with_attr("xfId", "0")),
        )
        .with_child(
            RawXmlElement::new("cellStyles").with_attr("count", "1").with_child(
                RawXmlElement::new("cellStyle")
                    .with_attr("name", "Normal")
                    .with_attr("xfId", "0")
                    .with_attr("builtinId", "0"),
            ),
        )
}

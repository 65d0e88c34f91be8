//! Excel workbooks: sheets, cells and the cell/sheet mutations

mod cell_ref;
mod shared_strings;
mod styles;
mod worksheet;

pub use cell_ref::{column_to_letters, CellRef};
pub use shared_strings::SharedStrings;
pub use styles::{CellFormat, HorizontalAlignment, StyleSheet};
pub use worksheet::{cell_display, cell_text, CellValue, Worksheet};

use crate::config::EditorConfig;
use crate::error::{Error, Result};
use crate::opc::{rel_types, Package, Part, PartUri, WORKSHEET};
use crate::xml::{RawXmlElement, RawXmlNode, R};
use std::path::Path;

/// Characters Excel refuses in sheet names
const FORBIDDEN_SHEET_CHARS: &[char] = &['[', ']', ':', '*', '?', '/', '\\'];
const MAX_SHEET_NAME_LEN: usize = 31;
/// Columns shown by [`Workbook::view_sheet`]
pub const MAX_COLS_DISPLAY: u32 = 5;
/// Rows shown by [`Workbook::view_sheet`] unless asked otherwise
pub const MAX_ROWS_DISPLAY: u32 = 10;

const WORKBOOK_ORDER: &[&str] = &[
    "fileVersion", "fileSharing", "workbookPr", "workbookProtection", "bookViews", "sheets",
    "functionGroups", "externalReferences", "definedNames", "calcPr",
];

#[derive(Debug)]
struct SheetEntry {
    name: String,
    uri: PartUri,
    sheet: Worksheet,
    dirty: bool,
}

/// Summary row of [`Workbook::list_sheets`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetInfo {
    pub index: usize,
    pub name: String,
    pub max_row: u32,
    pub max_col: u32,
    pub active: bool,
}

/// One hit of [`Workbook::find_cells`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellMatch {
    pub sheet: String,
    pub cell: String,
    pub value: String,
}

/// Top-left corner of a sheet, as returned by [`Workbook::view_sheet`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetView {
    pub name: String,
    pub rows: Vec<Vec<String>>,
    pub total_rows: u32,
    pub total_cols: u32,
}

/// An XLSX workbook
#[derive(Debug)]
pub struct Workbook {
    package: Package,
    uri: PartUri,
    root: RawXmlElement,
    sheets: Vec<SheetEntry>,
    strings: SharedStrings,
    styles: Option<StyleSheet>,
    config: EditorConfig,
}

/// Reject names Excel would refuse
pub fn validate_sheet_name(name: &str) -> Result<()> {
    let problem = if name.trim().is_empty() {
        Some("name is empty")
    } else if name.chars().count() > MAX_SHEET_NAME_LEN {
        Some("name is longer than 31 characters")
    } else if name.contains(FORBIDDEN_SHEET_CHARS) {
        Some("name contains one of []:*?/\\")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("name starts or ends with an apostrophe")
    } else {
        None
    };
    match problem {
        Some(problem) => Err(Error::InvalidSheetName(format!("{name:?}: {problem}"))),
        None => Ok(()),
    }
}

impl Workbook {
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

        let mut sheets = Vec::new();
        if let Some(list) = root.child("sheets") {
            for sheet in list.children_named("sheet") {
                let name = sheet
                    .attr("name")
                    .ok_or_else(|| Error::MissingAttribute {
                        element: "sheet".into(),
                        attr: "name".into(),
                    })?
                    .to_string();
                let rel_id = rel_id_attr(sheet).ok_or_else(|| Error::MissingAttribute {
                    element: "sheet".into(),
                    attr: "r:id".into(),
                })?;
                let sheet_uri = package.related_uri(&uri, rel_id)?;
                let sheet = Worksheet::new(package.read_xml(&sheet_uri)?);
                sheets.push(SheetEntry {
                    name,
                    uri: sheet_uri,
                    sheet,
                    dirty: false,
                });
            }
        }
        if sheets.is_empty() {
            return Err(Error::InvalidDocument("workbook has no sheets".into()));
        }
        let strings = SharedStrings::load(&package, &uri)?;

        log::debug!("opened workbook with {} sheet(s)", sheets.len());
        Ok(Self {
            package,
            uri,
            root,
            sheets,
            strings,
            styles: None,
            config,
        })
    }

    /// Save to a file
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.flush()?;
        self.package.save(path)
    }

    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        self.flush()?;
        self.package.to_bytes()
    }

    fn flush(&mut self) -> Result<()> {
        let mut touched = false;
        for entry in &mut self.sheets {
            if entry.dirty {
                entry.sheet.refresh_dimension();
                self.package.write_xml(&entry.uri, entry.sheet.root())?;
                entry.dirty = false;
                touched = true;
            }
        }
        if touched {
            self.drop_calc_chain();
        }
        self.strings.save(&mut self.package, &self.uri)?;
        if let Some(styles) = self.styles.as_mut() {
            styles.save(&mut self.package)?;
        }
        self.package.write_xml(&self.uri, &self.root)
    }

    /// The calculation chain goes stale once cells move; Excel rebuilds it
    fn drop_calc_chain(&mut self) {
        let Some(calc) = self.package.related_by_type(&self.uri, rel_types::CALC_CHAIN) else {
            return;
        };
        let rel_ids: Vec<String> = self
            .package
            .part_relationships(&self.uri)
            .map(|rels| rels.all_by_type(rel_types::CALC_CHAIN).map(|r| r.id.clone()).collect())
            .unwrap_or_default();
        for id in rel_ids {
            self.package.unrelate(&self.uri, &id);
        }
        self.package.remove_part(&calc);
        log::debug!("removed {calc}");
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|s| s.name.clone()).collect()
    }

    pub fn sheet_count(&self) -> usize {
        self.sheets.len()
    }

    pub fn worksheet(&self, name: &str) -> Option<&Worksheet> {
        self.sheets.iter().find(|s| s.name == name).map(|s| &s.sheet)
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    /// Mutable sheet entry, logging when the sheet does not exist
    fn entry_mut(&mut self, name: &str) -> Option<&mut SheetEntry> {
        let entry = self.sheets.iter_mut().find(|s| s.name == name);
        if entry.is_none() {
            log::warn!("sheet not found: {name:?}");
        }
        entry
    }

    fn active_index(&self) -> usize {
        self.root
            .path(&["bookViews", "workbookView"])
            .and_then(|v| v.attr("activeTab"))
            .and_then(|v| v.parse().ok())
            .filter(|i| *i < self.sheets.len())
            .unwrap_or(0)
    }

    /// Text of a cell as shown to users, or `None` when it is empty/absent
    pub fn cell_value(&self, sheet: &str, reference: &str) -> Result<Option<String>> {
        let at = CellRef::parse(reference)?;
        Ok(self
            .worksheet(sheet)
            .and_then(|ws| ws.cell(at))
            .map(|c| cell_display(c, &self.strings))
            .filter(|v| !v.is_empty()))
    }

    /// Set a cell's value. `Ok(false)` when the sheet does not exist.
    pub fn update_cell(&mut self, sheet: &str, reference: &str, value: &CellValue) -> Result<bool> {
        let at = CellRef::parse(reference)?;
        let Some(entry) = self.sheets.iter_mut().find(|s| s.name == sheet) else {
            log::warn!("sheet not found: {sheet:?}");
            return Ok(false);
        };
        entry.sheet.set_value(at, value, &mut self.strings);
        entry.dirty = true;
        log::info!("{sheet}!{at} = {value}");
        Ok(true)
    }

    /// Apply font, fill and alignment to a cell
    pub fn set_format(&mut self, sheet: &str, reference: &str, format: &CellFormat) -> Result<bool> {
        let at = CellRef::parse(reference)?;
        format.validate()?;
        let Some(index) = self.position(sheet) else {
            log::warn!("sheet not found: {sheet:?}");
            return Ok(false);
        };
        let base = self.sheets[index].sheet.style_of(at);

        if self.styles.is_none() {
            self.styles = Some(StyleSheet::load_or_create(&mut self.package, &self.uri)?);
        }
        let Some(styles) = self.styles.as_mut() else {
            return Ok(false);
        };
        let xf = styles.add_format(base, format)?;

        let entry = &mut self.sheets[index];
        entry.sheet.set_style(at, xf);
        entry.dirty = true;
        log::info!("formatted {sheet}!{at}");
        Ok(true)
    }

    /// Store a formula as text; a leading `=` is stripped. Excel evaluates
    /// it when the file is next opened.
    pub fn set_formula(&mut self, sheet: &str, reference: &str, formula: &str) -> Result<bool> {
        let at = CellRef::parse(reference)?;
        let body = formula.trim().trim_start_matches('=');
        if body.is_empty() {
            return Err(Error::InvalidArgument("formula must not be empty".into()));
        }
        let Some(entry) = self.entry_mut(sheet) else {
            return Ok(false);
        };
        entry.sheet.set_formula(at, body);
        entry.dirty = true;
        self.request_full_calc();
        log::info!("{sheet}!{at} = ={body}");
        Ok(true)
    }

    fn request_full_calc(&mut self) {
        if self.root.child("calcPr").is_none() {
            let name = self.root.qualified("calcPr");
            self.root.put_ordered(RawXmlElement::new(name), WORKBOOK_ORDER);
        }
        if let Some(calc) = self.root.child_mut("calcPr") {
            calc.set_attr("fullCalcOnLoad", "1");
        }
    }

    /// Write `data` into a row: appended after the last used row, or inserted
    /// at `position` (1-based) with the rows below shifted down
    pub fn add_row(&mut self, sheet: &str, data: &[CellValue], position: Option<u32>) -> Result<bool> {
        if position == Some(0) {
            return Err(Error::InvalidArgument("row numbers start at 1".into()));
        }
        let Some(entry) = self.sheets.iter_mut().find(|s| s.name == sheet) else {
            log::warn!("sheet not found: {sheet:?}");
            return Ok(false);
        };

        let row = match position {
            Some(row) => {
                entry.sheet.shift_rows_down(row);
                row
            }
            None => entry.sheet.max_row() + 1,
        };
        for (i, value) in data.iter().enumerate() {
            let at = CellRef::new(i as u32 + 1, row);
            entry.sheet.set_value(at, value, &mut self.strings);
        }
        entry.dirty = true;
        log::info!("added row {row} to {sheet}");
        Ok(true)
    }

    /// Delete row `position` (1..=max_row), shifting the rows below up
    pub fn delete_row(&mut self, sheet: &str, position: u32) -> Result<bool> {
        let Some(entry) = self.entry_mut(sheet) else {
            return Ok(false);
        };
        let max_row = entry.sheet.max_row();
        if position == 0 || position > max_row {
            log::warn!("row {position} is outside 1..={max_row} in {sheet}");
            return Ok(false);
        }
        entry.sheet.remove_row(position);
        entry.dirty = true;
        log::info!("deleted row {position} from {sheet}");
        Ok(true)
    }

    /// Add an empty sheet at `position` (0-based, default last)
    pub fn add_sheet(&mut self, name: &str, position: Option<usize>) -> Result<()> {
        validate_sheet_name(name)?;
        if self
            .sheets
            .iter()
            .any(|s| s.name.to_lowercase() == name.to_lowercase())
        {
            return Err(Error::DuplicateSheet(name.to_string()));
        }
        let index = position.unwrap_or(self.sheets.len()).min(self.sheets.len());

        let uri = self.package.next_part_uri("/xl/worksheets/sheet", "xml")?;
        let sheet = Worksheet::empty();
        self.package.add_part(Part::new(uri.clone(), WORKSHEET, Vec::new()));
        self.package.write_xml(&uri, sheet.root())?;
        let rel_id = self.package.relate(&self.uri, rel_types::WORKSHEET, &uri)?;

        let prefix = self.root.bind_prefix(R, "r");
        let sheet_id = self
            .root
            .child("sheets")
            .map(|list| {
                list.children_named("sheet")
                    .filter_map(|s| s.attr("sheetId")?.parse::<u32>().ok())
                    .max()
                    .unwrap_or(0)
            })
            .unwrap_or(0)
            + 1;
        let element = RawXmlElement::new(self.root.qualified("sheet"))
            .with_attr("name", name)
            .with_attr("sheetId", sheet_id.to_string())
            .with_attr(format!("{prefix}:id"), rel_id);

        let sheets_name = self.root.qualified("sheets");
        let list = self.root.ensure_child(&sheets_name);
        let child_pos = nth_child_index(list, "sheet", index);
        list.children.insert(child_pos, RawXmlNode::Element(element));

        self.shift_sheet_indices(|i| (i >= index).then_some(i + 1));
        self.sheets.insert(
            index,
            SheetEntry {
                name: name.to_string(),
                uri,
                sheet,
                dirty: false,
            },
        );
        log::info!("added sheet {name:?} at position {index}");
        Ok(())
    }

    /// Delete a sheet. `Ok(false)` when it does not exist; the only sheet
    /// cannot be deleted.
    pub fn delete_sheet(&mut self, name: &str) -> Result<bool> {
        let Some(index) = self.position(name) else {
            log::warn!("sheet not found: {name:?}");
            return Ok(false);
        };
        if self.sheets.len() == 1 {
            return Err(Error::LastSheet(name.to_string()));
        }

        let entry = self.sheets.remove(index);
        if let Some(list) = self.root.child_mut("sheets") {
            let child_pos = nth_child_index(list, "sheet", index);
            if let Some(RawXmlNode::Element(sheet)) = list.children.get(child_pos) {
                if let Some(rel_id) = rel_id_attr(sheet).map(str::to_string) {
                    self.package.unrelate(&self.uri, &rel_id);
                }
            }
            if child_pos < list.children.len() {
                list.children.remove(child_pos);
            }
        }
        self.package.remove_part(&entry.uri);

        // Names scoped to the removed sheet go with it
        if let Some(names) = self.root.child_mut("definedNames") {
            let scoped = index.to_string();
            names.children.retain(|n| match n {
                RawXmlNode::Element(e) => e.attr("localSheetId") != Some(scoped.as_str()),
                _ => true,
            });
        }
        if self.root.child("definedNames").map_or(false, |n| n.elements().next().is_none()) {
            self.root.remove_children("definedNames");
        }
        let count = self.sheets.len();
        self.shift_sheet_indices(|i| (i > index).then(|| i - 1));
        if let Some(view) = self.root.path_mut(&["bookViews", "workbookView"]) {
            for attr in ["activeTab", "firstSheet"] {
                if let Some(i) = view.attr(attr).and_then(|v| v.parse::<usize>().ok()) {
                    if i >= count {
                        view.set_attr(attr, (count - 1).to_string());
                    }
                }
            }
        }

        log::info!("deleted sheet {name:?}");
        Ok(true)
    }

    /// Renumber sheet-index references (defined names, active tab)
    fn shift_sheet_indices(&mut self, map: impl Fn(usize) -> Option<usize>) {
        if let Some(names) = self.root.child_mut("definedNames") {
            for name in names.elements_mut() {
                if let Some(new) = name
                    .attr("localSheetId")
                    .and_then(|v| v.parse::<usize>().ok())
                    .and_then(&map)
                {
                    name.set_attr("localSheetId", new.to_string());
                }
            }
        }
        if let Some(view) = self.root.path_mut(&["bookViews", "workbookView"]) {
            let active = view.attr("activeTab").and_then(|v| v.parse::<usize>().ok());
            if let Some(new) = active.and_then(&map) {
                view.set_attr("activeTab", new.to_string());
            }
        }
    }

    /// Replace `old` inside text cells of every sheet, or only `sheet`.
    /// Returns the number of cells changed.
    pub fn replace_text(&mut self, old: &str, new: &str, sheet: Option<&str>) -> usize {
        if old.is_empty() {
            log::warn!("refusing to replace empty text");
            return 0;
        }
        if let Some(name) = sheet {
            if self.position(name).is_none() {
                log::warn!("sheet not found: {name:?}");
                return 0;
            }
        }

        let mut changed = 0;
        for entry in &mut self.sheets {
            if sheet.map_or(false, |name| name != entry.name) {
                continue;
            }
            let hits: Vec<(CellRef, String)> = entry
                .sheet
                .cells()
                .filter_map(|(at, cell)| {
                    let text = cell_text(cell, &self.strings)?;
                    text.contains(old).then(|| (at, text.replace(old, new)))
                })
                .collect();
            for (at, text) in &hits {
                entry
                    .sheet
                    .set_value(*at, &CellValue::Text(text.clone()), &mut self.strings);
            }
            if !hits.is_empty() {
                entry.dirty = true;
                changed += hits.len();
            }
        }

        if changed > 0 {
            log::info!("replaced {old:?} with {new:?} in {changed} cell(s)");
        } else {
            log::warn!("text not found: {old:?}");
        }
        changed
    }

    /// Text cells containing `text`, in every sheet or only `sheet`
    pub fn find_cells(&self, text: &str, sheet: Option<&str>) -> Vec<CellMatch> {
        if text.is_empty() {
            return Vec::new();
        }
        self.sheets
            .iter()
            .filter(|entry| sheet.map_or(true, |name| name == entry.name))
            .flat_map(|entry| {
                entry.sheet.cells().filter_map(move |(at, cell)| {
                    let value = cell_text(cell, &self.strings)?;
                    value.contains(text).then(|| CellMatch {
                        sheet: entry.name.clone(),
                        cell: at.to_string(),
                        value,
                    })
                })
            })
            .collect()
    }

    pub fn list_sheets(&self) -> Vec<SheetInfo> {
        let active = self.active_index();
        self.sheets
            .iter()
            .enumerate()
            .map(|(index, entry)| SheetInfo {
                index,
                name: entry.name.clone(),
                max_row: entry.sheet.max_row(),
                max_col: entry.sheet.max_col(),
                active: index == active,
            })
            .collect()
    }

    /// First `max_rows` rows and [`MAX_COLS_DISPLAY`] columns of `sheet`
    /// (the active sheet when `None`)
    pub fn view_sheet(&self, sheet: Option<&str>, max_rows: u32) -> Option<SheetView> {
        let entry = match sheet {
            Some(name) => self.sheets.iter().find(|s| s.name == name)?,
            None => self.sheets.get(self.active_index())?,
        };
        let total_rows = entry.sheet.max_row();
        let total_cols = entry.sheet.max_col();

        let rows = (1..=total_rows.min(max_rows))
            .map(|row| {
                (1..=total_cols.min(MAX_COLS_DISPLAY))
                    .map(|col| {
                        entry
                            .sheet
                            .cell(CellRef::new(col, row))
                            .map(|c| cell_display(c, &self.strings))
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Some(SheetView {
            name: entry.name.clone(),
            rows,
            total_rows,
            total_cols,
        })
    }
}

fn rel_id_attr(sheet: &RawXmlElement) -> Option<&str> {
    sheet
        .attributes
        .iter()
        .find(|(k, _)| k.ends_with(":id"))
        .map(|(_, v)| v.as_str())
}

/// Child index of the `n`-th `local` element, or the slot after the last one
fn nth_child_index(parent: &RawXmlElement, local: &str, n: usize) -> usize {
    let mut seen = 0;
    let mut after_last = parent.children.len();
    for (i, node) in parent.children.iter().enumerate() {
        if let RawXmlNode::Element(e) = node {
            if e.is(local) {
                if seen == n {
                    return i;
                }
                seen += 1;
                after_last = i + 1;
            }
        }
    }
    after_last
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_sheet_name() {
        assert!(validate_sheet_name("Q1 Data").is_ok());
        for bad in ["", "   ", "a/b", "x[1]", "what?", "'quoted'", &"x".repeat(32)] {
            assert!(matches!(validate_sheet_name(bad), Err(Error::InvalidSheetName(_))), "{bad}");
        }
    }

    #[test]
    fn test_nth_child_index() {
        let list = crate::xml::parse_xml("<sheets><sheet/><x/><sheet/></sheets>").unwrap();
        assert_eq!(nth_child_index(&list, "sheet", 0), 0);
        assert_eq!(nth_child_index(&list, "sheet", 1), 2);
        assert_eq!(nth_child_index(&list, "sheet", 2), 3);
    }
}

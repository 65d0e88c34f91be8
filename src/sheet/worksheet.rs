//! Worksheet part: the sparse row/cell grid inside `sheetData`

use super::cell_ref::{shift_formula, CellRef};
use super::shared_strings::SharedStrings;
use crate::xml::{RawXmlElement, RawXmlNode};

const WORKSHEET_ORDER: &[&str] = &[
    "sheetPr", "dimension", "sheetViews", "sheetFormatPr", "cols", "sheetData",
];

/// Scalar cell value
#[derive(Clone, Debug, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
}

impl CellValue {
    /// Numbers and `TRUE`/`FALSE` become typed values; everything else is text
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if raw.is_empty() {
            return CellValue::Empty;
        }
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() && !trimmed.starts_with('+') {
                return CellValue::Number(n);
            }
        }
        match trimmed.to_ascii_uppercase().as_str() {
            "TRUE" => CellValue::Bool(true),
            "FALSE" => CellValue::Bool(false),
            _ => CellValue::Text(raw.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(text: &str) -> Self {
        CellValue::Text(text.to_string())
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(t) => f.write_str(t),
            CellValue::Number(n) => f.write_str(&format_number(*n)),
            CellValue::Bool(true) => f.write_str("TRUE"),
            CellValue::Bool(false) => f.write_str("FALSE"),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}

/// A parsed worksheet part
#[derive(Clone, Debug)]
pub struct Worksheet {
    root: RawXmlElement,
}

impl Worksheet {
    /// Wrap a worksheet root, filling in row and cell references that the
    /// file left implicit
    pub fn new(mut root: RawXmlElement) -> Self {
        if let Some(data) = root.child_mut("sheetData") {
            let mut row_num = 0;
            for row in data.children_named_mut("row") {
                row_num = row.attr("r").and_then(|r| r.parse().ok()).unwrap_or(row_num + 1);
                row.set_attr("r", row_num.to_string());
                let mut col = 0;
                for cell in row.children_named_mut("c") {
                    col = cell
                        .attr("r")
                        .and_then(|r| CellRef::parse(r).ok())
                        .map_or(col + 1, |c| c.col);
                    cell.set_attr("r", CellRef::new(col, row_num).to_string());
                }
            }
        }
        Self { root }
    }

    /// Empty worksheet as written for a new sheet
    pub fn empty() -> Self {
        Self {
            root: RawXmlElement::new("worksheet")
                .with_attr("xmlns", crate::xml::S)
                .with_attr("xmlns:r", crate::xml::R)
                .with_child(RawXmlElement::new("dimension").with_attr("ref", "A1"))
                .with_child(
                    RawXmlElement::new("sheetViews")
                        .with_child(RawXmlElement::new("sheetView").with_attr("workbookViewId", "0")),
                )
                .with_child(RawXmlElement::new("sheetFormatPr").with_attr("defaultRowHeight", "15"))
                .with_child(RawXmlElement::new("sheetData")),
        }
    }

    pub fn root(&self) -> &RawXmlElement {
        &self.root
    }

    fn qname(&self, local: &str) -> String {
        match self.root.name.rsplit_once(':') {
            Some((prefix, _)) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    fn sheet_data(&self) -> Option<&RawXmlElement> {
        self.root.child("sheetData")
    }

    fn sheet_data_mut(&mut self) -> &mut RawXmlElement {
        if self.root.child("sheetData").is_none() {
            let data = RawXmlElement::new(self.qname("sheetData"));
            self.root.put_ordered(data, WORKSHEET_ORDER);
        }
        self.root.ensure_child("sheetData")
    }

    fn rows(&self) -> impl Iterator<Item = &RawXmlElement> {
        self.sheet_data().into_iter().flat_map(|d| d.children_named("row"))
    }

    /// Last row number holding a cell (0 for an empty sheet)
    pub fn max_row(&self) -> u32 {
        self.rows()
            .filter(|row| row.child("c").is_some())
            .filter_map(row_number)
            .max()
            .unwrap_or(0)
    }

    /// Last column holding a cell (0 for an empty sheet)
    pub fn max_col(&self) -> u32 {
        self.cells().map(|(r, _)| r.col).max().unwrap_or(0)
    }

    /// All cells with their references, row by row
    pub fn cells(&self) -> impl Iterator<Item = (CellRef, &RawXmlElement)> {
        self.rows().flat_map(|row| {
            row.children_named("c")
                .filter_map(|c| Some((CellRef::parse(c.attr("r")?).ok()?, c)))
        })
    }

    pub fn cell(&self, at: CellRef) -> Option<&RawXmlElement> {
        self.cells().find(|(r, _)| *r == at).map(|(_, c)| c)
    }

    /// Cell element at `at`, creating the row and cell in sorted position
    pub fn cell_mut(&mut self, at: CellRef) -> &mut RawXmlElement {
        let row_name = self.qname("row");
        let cell_name = self.qname("c");
        let data = self.sheet_data_mut();

        let row_pos = position_or_insert(data, "row", at.row, row_number, || {
            RawXmlElement::new(row_name).with_attr("r", at.row.to_string())
        });
        let row = element_at(data, row_pos);

        let col_pos = position_or_insert(
            row,
            "c",
            at.col,
            |c| Some(CellRef::parse(c.attr("r")?).ok()?.col),
            || RawXmlElement::new(cell_name).with_attr("r", at.to_string()),
        );
        element_at(row, col_pos)
    }

    /// Store a value, keeping the cell's style
    pub fn set_value(&mut self, at: CellRef, value: &CellValue, strings: &mut SharedStrings) {
        let v_name = self.qname("v");
        self.unshare_formula(at);
        let cell = self.cell_mut(at);
        clear_content(cell);

        let (kind, text) = match value {
            CellValue::Empty => (None, None),
            CellValue::Text(t) => (Some("s"), Some(strings.intern(t).to_string())),
            CellValue::Number(_) => (None, Some(value.to_string())),
            CellValue::Bool(b) => (Some("b"), Some((if *b { "1" } else { "0" }).to_string())),
        };
        if let Some(kind) = kind {
            cell.set_attr("t", kind);
        }
        if let Some(text) = text {
            cell.push_child(RawXmlElement::new(v_name).with_text(text));
        }
    }

    /// Store a formula (without the leading `=`); the cached value is dropped
    pub fn set_formula(&mut self, at: CellRef, formula: &str) {
        let f_name = self.qname("f");
        self.unshare_formula(at);
        let cell = self.cell_mut(at);
        clear_content(cell);
        cell.push_child(RawXmlElement::new(f_name).with_text(formula));
    }

    /// When `at` holds the master of a shared formula, write the formula out
    /// into each dependent cell so the master can be overwritten or removed
    fn unshare_formula(&mut self, at: CellRef) {
        let Some((si, text)) = self
            .cell(at)
            .and_then(|c| c.child("f"))
            .filter(|f| f.attr("t") == Some("shared") && f.attr("ref").is_some())
            .and_then(|f| Some((f.attr("si")?.to_string(), f.text())))
        else {
            return;
        };

        let mut expanded = 0;
        for row in self.sheet_data_mut().children_named_mut("row") {
            for cell in row.children_named_mut("c") {
                let Some(here) = cell.attr("r").and_then(|r| CellRef::parse(r).ok()) else {
                    continue;
                };
                let Some(f) = cell.child_mut("f") else { continue };
                if here == at || f.attr("t") != Some("shared") || f.attr("si") != Some(si.as_str()) {
                    continue;
                }
                let rows = i64::from(here.row) - i64::from(at.row);
                let cols = i64::from(here.col) - i64::from(at.col);
                for attr in ["t", "si", "ref"] {
                    f.remove_attr(attr);
                }
                f.set_text(shift_formula(&text, rows, cols));
                expanded += 1;
            }
        }
        log::debug!("expanded shared formula {si} from {at} into {expanded} cells");
    }

    /// Point the cell at another style record
    pub fn set_style(&mut self, at: CellRef, xf: usize) {
        self.cell_mut(at).set_attr("s", xf.to_string());
    }

    /// Style record index of a cell (0 when unstyled)
    pub fn style_of(&self, at: CellRef) -> usize {
        self.cell(at)
            .and_then(|c| c.attr("s"))
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    /// Shift rows at or below `row` down by one, leaving `row` free
    pub fn shift_rows_down(&mut self, row: u32) {
        self.renumber_rows(|r| (r >= row).then_some(r + 1));
    }

    /// Remove `row` and shift the rows below it up. Returns whether the row
    /// existed.
    pub fn remove_row(&mut self, row: u32) -> bool {
        let masters: Vec<CellRef> = self.cells().map(|(at, _)| at).filter(|at| at.row == row).collect();
        for at in masters {
            self.unshare_formula(at);
        }
        let data = self.sheet_data_mut();
        let before = data.children.len();
        data.children.retain(|node| match node {
            RawXmlNode::Element(e) => !(e.is("row") && row_number(e) == Some(row)),
            _ => true,
        });
        let removed = data.children.len() != before;
        self.renumber_rows(|r| (r > row).then(|| r - 1));
        removed
    }

    fn renumber_rows(&mut self, map: impl Fn(u32) -> Option<u32>) {
        let data = self.sheet_data_mut();
        for row in data.children_named_mut("row") {
            let Some(new_row) = row_number(row).and_then(&map) else {
                continue;
            };
            row.set_attr("r", new_row.to_string());
            row.remove_attr("spans");
            for cell in row.children_named_mut("c") {
                if let Some(at) = cell.attr("r").and_then(|r| CellRef::parse(r).ok()) {
                    cell.set_attr("r", at.with_row(new_row).to_string());
                }
            }
        }
    }

    /// Rewrite `dimension` to the used range
    pub fn refresh_dimension(&mut self) {
        let (rows, cols) = (self.max_row(), self.max_col());
        let range = if rows == 0 || cols == 0 {
            "A1".to_string()
        } else {
            format!("A1:{}", CellRef::new(cols, rows))
        };
        let dimension = RawXmlElement::new(self.qname("dimension")).with_attr("ref", range);
        self.root.put_ordered(dimension, WORKSHEET_ORDER);
    }
}

/// Text of a string cell (shared, inline or formula string result)
pub fn cell_text(cell: &RawXmlElement, strings: &SharedStrings) -> Option<String> {
    if cell.child("f").is_some() {
        return None;
    }
    match cell.attr("t") {
        Some("s") => {
            let index: usize = cell.child("v")?.text().trim().parse().ok()?;
            strings.get(index).map(str::to_string)
        }
        Some("inlineStr") => Some(
            cell.child("is")?
                .elements()
                .map(|e| if e.is("t") { e.text() } else { e.child("t").map(|t| t.text()).unwrap_or_default() })
                .collect(),
        ),
        Some("str") => cell.child("v").map(|v| v.text()),
        _ => None,
    }
}

/// Value of a cell as shown in listings; formulas are shown as `=...`
pub fn cell_display(cell: &RawXmlElement, strings: &SharedStrings) -> String {
    if let Some(f) = cell.child("f") {
        return format!("={}", f.text());
    }
    if let Some(text) = cell_text(cell, strings) {
        return text;
    }
    let raw = cell.child("v").map(|v| v.text()).unwrap_or_default();
    match cell.attr("t") {
        Some("b") => (if raw.trim() == "1" { "TRUE" } else { "FALSE" }).to_string(),
        _ => raw,
    }
}

fn row_number(row: &RawXmlElement) -> Option<u32> {
    row.attr("r")?.parse().ok()
}

fn clear_content(cell: &mut RawXmlElement) {
    cell.remove_children("f");
    cell.remove_children("v");
    cell.remove_children("is");
    cell.remove_attr("t");
}

/// Child index of the `local` element whose key equals `key`, inserting a
/// new one before the first larger key when absent
fn position_or_insert(
    parent: &mut RawXmlElement,
    local: &str,
    key: u32,
    key_of: impl Fn(&RawXmlElement) -> Option<u32>,
    make: impl FnOnce() -> RawXmlElement,
) -> usize {
    let mut insert_at = parent.children.len();
    for (i, node) in parent.children.iter().enumerate() {
        let RawXmlNode::Element(e) = node else { continue };
        if !e.is(local) {
            continue;
        }
        match key_of(e) {
            Some(k) if k == key => return i,
            Some(k) if k > key => {
                insert_at = i;
                break;
            }
            _ => {}
        }
    }
    // Cells go before any trailing non-cell children (extLst)
    if insert_at == parent.children.len() {
        if let Some(last) = parent
            .children
            .iter()
            .rposition(|n| matches!(n, RawXmlNode::Element(e) if e.is(local)))
        {
            insert_at = last + 1;
        }
    }
    parent.children.insert(insert_at, RawXmlNode::Element(make()));
    parent.self_closing = false;
    insert_at
}

fn element_at(parent: &mut RawXmlElement, index: usize) -> &mut RawXmlElement {
    match &mut parent.children[index] {
        RawXmlNode::Element(e) => e,
        _ => unreachable!("index points at an element"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xml::parse_xml;
    use pretty_assertions::assert_eq;

    fn sheet(xml: &str) -> Worksheet {
        Worksheet::new(parse_xml(xml).unwrap())
    }

    fn refs(ws: &Worksheet) -> Vec<String> {
        ws.cells().map(|(r, _)| r.to_string()).collect()
    }

    #[test]
    fn test_implicit_references_are_filled_in() {
        let ws = sheet("<worksheet><sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row r=\"4\"><c r=\"C4\"/></row></sheetData></worksheet>");
        assert_eq!(refs(&ws), vec!["A1", "B1", "C4"]);
        assert_eq!(ws.max_row(), 4);
        assert_eq!(ws.max_col(), 3);
    }

    #[test]
    fn test_cell_mut_keeps_sorted_order() {
        let mut ws = sheet("<worksheet><sheetData><row r=\"2\"><c r=\"C2\"/></row></sheetData></worksheet>");
        let mut strings = SharedStrings::default();

        ws.set_value(CellRef::new(1, 2), &CellValue::Number(3.0), &mut strings);
        ws.set_value(CellRef::new(2, 1), &CellValue::from("x"), &mut strings);

        assert_eq!(refs(&ws), vec!["B1", "A2", "C2"]);
        let a2 = ws.cell(CellRef::new(1, 2)).unwrap();
        assert_eq!(cell_display(a2, &strings), "3");
        assert_eq!(cell_text(ws.cell(CellRef::new(2, 1)).unwrap(), &strings), Some("x".into()));
    }

    #[test]
    fn test_row_shifts() {
        let mut ws = sheet("<worksheet><sheetData><row r=\"1\" spans=\"1:1\"><c r=\"A1\"/></row><row r=\"2\"><c r=\"A2\"/></row><row r=\"3\"><c r=\"A3\"/></row></sheetData></worksheet>");

        ws.shift_rows_down(2);
        assert_eq!(refs(&ws), vec!["A1", "A3", "A4"]);

        assert!(ws.remove_row(3));
        assert_eq!(refs(&ws), vec!["A1", "A3"]);
        assert!(!ws.remove_row(9));
    }

    #[test]
    fn test_formula_replaces_value() {
        let mut ws = sheet("<worksheet><sheetData><row r=\"1\"><c r=\"A1\" s=\"3\" t=\"s\"><v>0</v></c></row></sheetData></worksheet>");
        ws.set_formula(CellRef::new(1, 1), "SUM(B1:B3)");

        let cell = ws.cell(CellRef::new(1, 1)).unwrap();
        assert_eq!(cell.attr("t"), None);
        assert_eq!(cell.attr("s"), Some("3"));
        assert_eq!(cell_display(cell, &SharedStrings::default()), "=SUM(B1:B3)");
    }

    const SHARED: &str = "<worksheet><sheetData><row r=\"1\"><c r=\"A1\"><f t=\"shared\" ref=\"A1:A3\" si=\"0\">B1*2</f><v>2</v></c></row><row r=\"2\"><c r=\"A2\"><f t=\"shared\" si=\"0\"/><v>4</v></c></row><row r=\"3\"><c r=\"A3\"><f t=\"shared\" si=\"0\"/><v>6</v></c></row></sheetData></worksheet>";

    fn display(ws: &Worksheet, reference: &str) -> String {
        let cell = ws.cell(CellRef::parse(reference).unwrap()).unwrap();
        cell_display(cell, &SharedStrings::default())
    }

    #[test]
    fn test_overwriting_shared_master_expands_dependents() {
        let mut ws = sheet(SHARED);
        ws.set_value(CellRef::new(1, 1), &CellValue::Number(5.0), &mut SharedStrings::default());

        assert_eq!(display(&ws, "A1"), "5");
        assert_eq!(display(&ws, "A2"), "=B2*2");
        assert_eq!(display(&ws, "A3"), "=B3*2");
        let f = ws.cell(CellRef::new(1, 3)).unwrap().child("f").unwrap();
        assert_eq!((f.attr("t"), f.attr("si")), (None, None));
    }

    #[test]
    fn test_dependent_overwrite_keeps_master() {
        let mut ws = sheet(SHARED);
        ws.set_formula(CellRef::new(1, 2), "C2");

        let master = ws.cell(CellRef::new(1, 1)).unwrap().child("f").unwrap();
        assert_eq!(master.attr("ref"), Some("A1:A3"));
        assert_eq!(display(&ws, "A2"), "=C2");
    }

    #[test]
    fn test_removing_master_row_expands_dependents() {
        let mut ws = sheet(SHARED);
        assert!(ws.remove_row(1));
        assert_eq!(display(&ws, "A1"), "=B2*2");
        assert_eq!(display(&ws, "A2"), "=B3*2");
    }

    #[test]
    fn test_infer() {
        assert_eq!(CellValue::infer("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::infer("1.5"), CellValue::Number(1.5));
        assert_eq!(CellValue::infer("true"), CellValue::Bool(true));
        assert_eq!(CellValue::infer("hello"), CellValue::Text("hello".into()));
        assert_eq!(CellValue::infer("+7"), CellValue::Text("+7".into()));
        assert_eq!(CellValue::infer(""), CellValue::Empty);
    }
}

//! Shapes on a slide and the DrawingML text inside them

use crate::xml::RawXmlElement;

const SHAPE_KINDS: &[&str] = &["sp", "grpSp", "graphicFrame", "pic", "cxnSp", "contentPart"];
const SP_ORDER: &[&str] = &["nvSpPr", "spPr", "style", "txBody", "extLst"];
const TX_BODY_ORDER: &[&str] = &["bodyPr", "lstStyle", "p"];
const RPR_ORDER: &[&str] = &[
    "ln", "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill", "effectLst",
    "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin", "ea", "cs", "sym",
    "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
];

/// Shape elements directly under `tree` (a `spTree` or `grpSp`)
pub(crate) fn shapes(tree: &RawXmlElement) -> impl Iterator<Item = &RawXmlElement> {
    tree.elements().filter(|e| SHAPE_KINDS.contains(&e.local_name()))
}

/// The `p:ph` element of a placeholder shape
pub(crate) fn placeholder(shape: &RawXmlElement) -> Option<&RawXmlElement> {
    let nv = shape.elements().find(|e| e.local_name().starts_with("nv"))?;
    nv.path(&["nvPr", "ph"])
}

/// Placeholder type; a `ph` without one is a body placeholder
pub(crate) fn placeholder_type(shape: &RawXmlElement) -> Option<&str> {
    placeholder(shape).map(|ph| ph.attr("type").unwrap_or("body"))
}

pub(crate) fn is_title(shape: &RawXmlElement) -> bool {
    matches!(placeholder_type(shape), Some("title" | "ctrTitle"))
}

/// Display name from `cNvPr`
pub(crate) fn shape_name(shape: &RawXmlElement) -> Option<&str> {
    let nv = shape.elements().find(|e| e.local_name().starts_with("nv"))?;
    nv.child("cNvPr")?.attr("name")
}

/// Text of one `a:p`: runs and fields, with line breaks as `\n`
pub(crate) fn paragraph_text(p: &RawXmlElement) -> String {
    let mut text = String::new();
    for child in p.elements() {
        match child.local_name() {
            "r" | "fld" => {
                if let Some(t) = child.child("t") {
                    text.push_str(&t.text());
                }
            }
            "br" => text.push('\n'),
            _ => {}
        }
    }
    text
}

/// Paragraphs of a text body joined by `\n`
pub(crate) fn body_text(tx_body: &RawXmlElement) -> String {
    tx_body
        .children_named("p")
        .map(paragraph_text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// All text a shape shows: its own text body, table cells, group members
pub(crate) fn shape_text(shape: &RawXmlElement) -> String {
    let mut parts = Vec::new();
    collect_text(shape, &mut parts);
    parts.join("\n")
}

fn collect_text(shape: &RawXmlElement, parts: &mut Vec<String>) {
    match shape.local_name() {
        "sp" => {
            if let Some(body) = shape.child("txBody") {
                parts.push(body_text(body));
            }
        }
        "grpSp" => {
            for member in shapes(shape) {
                collect_text(member, parts);
            }
        }
        "graphicFrame" => {
            if let Some(tbl) = shape.find("tbl") {
                for row in tbl.children_named("tr") {
                    let cells: Vec<String> = row
                        .children_named("tc")
                        .map(|tc| tc.child("txBody").map(body_text).unwrap_or_default())
                        .collect();
                    parts.push(cells.join("\t"));
                }
            }
        }
        _ => {}
    }
}

/// Replace the whole text of a body with one run, keeping the first
/// paragraph's properties and the first run's formatting
pub(crate) fn set_body_text(tx_body: &mut RawXmlElement, text: &str) {
    let first = tx_body.children_named("p").next().cloned();
    let mut p = RawXmlElement::new(tx_body.qualified("p"));
    let mut run_props = None;
    if let Some(first) = &first {
        if let Some(ppr) = first.child("pPr") {
            p.push_child(ppr.clone());
        }
        run_props = first
            .children_named("r")
            .next()
            .and_then(|r| r.child("rPr"))
            .cloned();
    }

    let lines: Vec<&str> = text.split('\n').collect();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            p.push_child(RawXmlElement::new(tx_body.qualified("br")));
        }
        p.push_child(new_run(tx_body, line, run_props.clone()));
    }
    if let Some(end) = first.as_ref().and_then(|f| f.child("endParaRPr")) {
        p.push_child(end.clone());
    }

    tx_body.remove_children("p");
    tx_body.put_ordered(p, TX_BODY_ORDER);
}

/// Append a paragraph holding `text` to a body
pub(crate) fn add_paragraph(tx_body: &mut RawXmlElement, text: &str) {
    let run = new_run(tx_body, text, None);
    let p = RawXmlElement::new(tx_body.qualified("p")).with_child(run);
    tx_body.push_child(p);
}

/// `a:r` carrying `text`; the drawing prefix is taken from the body's `bodyPr`
fn new_run(tx_body: &RawXmlElement, text: &str, props: Option<RawXmlElement>) -> RawXmlElement {
    let like = tx_body.child("bodyPr").unwrap_or(tx_body);
    let mut run = RawXmlElement::new(like.qualified("r"));
    if let Some(props) = props {
        run.push_child(props);
    }
    run.with_child(RawXmlElement::new(like.qualified("t")).with_text(text))
}

/// Text body of a shape, created for plain shapes that have none
pub(crate) fn ensure_text_body<'a>(shape: &'a mut RawXmlElement, drawing_prefix: &str) -> &'a mut RawXmlElement {
    if shape.child("txBody").is_none() {
        let body = RawXmlElement::new(shape.qualified("txBody"))
            .with_child(RawXmlElement::new(format!("{drawing_prefix}:bodyPr")))
            .with_child(RawXmlElement::new(format!("{drawing_prefix}:lstStyle")));
        shape.put_ordered(body, SP_ORDER);
    }
    shape.ensure_child("txBody")
}

/// Replace `old` inside every `a:r` under `root`; returns the number of runs changed
pub(crate) fn replace_in_runs(root: &mut RawXmlElement, old: &str, new: &str) -> usize {
    let mut changed = 0;
    root.walk_mut(&mut |e: &mut RawXmlElement| {
        if !e.is("r") {
            return;
        }
        if let Some(t) = e.child_mut("t") {
            let text = t.text();
            if text.contains(old) {
                t.set_text(text.replace(old, new));
                changed += 1;
            }
        }
    });
    changed
}

/// Set the latin typeface (and size in points) on every run under `root`
pub(crate) fn restyle_runs(
    root: &mut RawXmlElement,
    font: &str,
    size_pt: Option<f32>,
    drawing_prefix: &str,
) -> usize {
    let mut changed = 0;
    root.walk_mut(&mut |e: &mut RawXmlElement| {
        if !e.is("r") {
            return;
        }
        if e.child("rPr").is_none() {
            let props = RawXmlElement::new(format!("{drawing_prefix}:rPr"));
            e.children.insert(0, crate::xml::RawXmlNode::Element(props));
        }
        if let Some(props) = e.child_mut("rPr") {
            if let Some(size) = size_pt {
                props.set_attr("sz", ((size * 100.0).round() as u32).to_string());
            }
            match props.child_mut("latin") {
                Some(latin) => latin.set_attr("typeface", font),
                None => {
                    let latin = RawXmlElement::new(format!("{drawing_prefix}:latin"))
                        .with_attr("typeface", font);
                    props.put_ordered(latin, RPR_ORDER);
                }
            }
            changed += 1;
        }
    });
    changed
}

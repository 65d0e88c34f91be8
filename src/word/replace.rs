//! Scoped find/replace over run text

use super::{BlockContent, Body, Document, Paragraph, Table};

/// Which part of the body a replacement walks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReplaceScope {
    /// Top-level paragraphs, then tables
    #[default]
    All,
    Paragraphs,
    Tables,
}

/// Shared replacement budget
struct Budget(Option<usize>);

impl Budget {
    fn remaining(&self) -> Option<usize> {
        self.0
    }

    fn exhausted(&self) -> bool {
        self.0 == Some(0)
    }

    fn spend(&mut self, n: usize) {
        if let Some(left) = self.0.as_mut() {
            *left = left.saturating_sub(n);
        }
    }
}

/// Replace `old` with `new` inside the runs of `body`.
///
/// Matching is literal and per run; text split across runs is not matched.
/// With `max_count`, the walk stops once that many occurrences have been
/// replaced. Returns the number of occurrences replaced.
pub fn replace_in_body(
    body: &mut Body,
    old: &str,
    new: &str,
    max_count: Option<usize>,
    scope: ReplaceScope,
) -> usize {
    if old.is_empty() {
        log::warn!("refusing to replace empty text");
        return 0;
    }
    let mut budget = Budget(max_count);
    let mut replaced = 0;

    if matches!(scope, ReplaceScope::All | ReplaceScope::Paragraphs) {
        for para in body.paragraphs_mut() {
            replaced += replace_in_paragraph(para, old, new, &mut budget);
        }
    }
    if matches!(scope, ReplaceScope::All | ReplaceScope::Tables) {
        for table in body.tables_mut() {
            replaced += replace_in_table(table, old, new, &mut budget);
        }
    }
    replaced
}

fn replace_in_paragraph(para: &mut Paragraph, old: &str, new: &str, budget: &mut Budget) -> usize {
    let mut replaced = 0;
    for run in para.runs_mut() {
        if budget.exhausted() {
            break;
        }
        let n = run.replace_text(old, new, budget.remaining());
        budget.spend(n);
        replaced += n;
    }
    replaced
}

fn replace_in_table(table: &mut Table, old: &str, new: &str, budget: &mut Budget) -> usize {
    let mut replaced = 0;
    for cell in table.rows.iter_mut().flat_map(|row| row.cells.iter_mut()) {
        for block in &mut cell.content {
            if budget.exhausted() {
                return replaced;
            }
            replaced += match block {
                BlockContent::Paragraph(p) => replace_in_paragraph(p, old, new, budget),
                BlockContent::Table(t) => replace_in_table(t, old, new, budget),
                BlockContent::Unknown(_) => 0,
            };
        }
    }
    replaced
}

impl Document {
    /// Replace every occurrence of `old` in paragraphs and tables
    pub fn replace_text(&mut self, old: &str, new: &str) -> usize {
        self.replace_text_scoped(old, new, None, ReplaceScope::All)
    }

    /// Replace with a budget and scope; logs the outcome
    pub fn replace_text_scoped(
        &mut self,
        old: &str,
        new: &str,
        max_count: Option<usize>,
        scope: ReplaceScope,
    ) -> usize {
        let replaced = replace_in_body(&mut self.body, old, new, max_count, scope);
        if replaced > 0 {
            log::info!("replaced {replaced} occurrence(s) of {old:?} with {new:?}");
        } else if !old.is_empty() {
            log::warn!("text not found: {old:?}");
        }
        replaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn body() -> Body {
        let table = Table::with_data(1, 2, &["2024 total".to_string(), "2024".to_string()]);
        Body {
            content: vec![
                BlockContent::Paragraph(Paragraph::new("2024 and 2024")),
                BlockContent::Table(table),
                BlockContent::Paragraph(Paragraph::new("Summary 2024")),
            ],
            section_properties: None,
        }
    }

    #[test]
    fn test_paragraphs_before_tables() {
        let mut body = body();
        let n = replace_in_body(&mut body, "2024", "2025", Some(4), ReplaceScope::All);

        assert_eq!(n, 4);
        assert_eq!(body.text(), "2025 and 2025\nSummary 2025");
        let table = body.tables().next().unwrap();
        assert_eq!(table.cell(0, 0).unwrap().text(), "2025 total");
        assert_eq!(table.cell(0, 1).unwrap().text(), "2024");
    }

    #[test]
    fn test_scopes() {
        let mut body = body();
        assert_eq!(replace_in_body(&mut body, "2024", "x", None, ReplaceScope::Tables), 2);
        assert_eq!(body.text(), "2024 and 2024\nSummary 2024");
        assert_eq!(replace_in_body(&mut body, "2024", "x", None, ReplaceScope::Paragraphs), 3);
    }

    #[test]
    fn test_absent_and_empty() {
        let mut body = body();
        let before = body.text();
        assert_eq!(replace_in_body(&mut body, "1999", "x", None, ReplaceScope::All), 0);
        assert_eq!(replace_in_body(&mut body, "", "x", None, ReplaceScope::All), 0);
        assert_eq!(body.text(), before);
    }

    #[test]
    fn test_reverse_replacement_restores_text() {
        let mut body = body();
        let before = body.text();
        let n = replace_in_body(&mut body, "2024", "@@", None, ReplaceScope::All);
        assert_eq!(replace_in_body(&mut body, "@@", "2024", None, ReplaceScope::All), n);
        assert_eq!(body.text(), before);
    }
}

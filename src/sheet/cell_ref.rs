//! A1-style cell references

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Last column Excel supports (XFD)
const MAX_COLUMN: u32 = 16_384;
/// Last row Excel supports
const MAX_ROW: u32 = 1_048_576;

/// 1-based cell coordinates
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellRef {
    pub col: u32,
    pub row: u32,
}

impl CellRef {
    pub fn new(col: u32, row: u32) -> Self {
        Self { col, row }
    }

    /// Parse `B12` / `aa3` (`$` anchors are accepted and ignored)
    pub fn parse(reference: &str) -> Result<Self> {
        let invalid = || Error::InvalidCellRef(reference.to_string());
        let cleaned: String = reference.trim().chars().filter(|c| *c != '$').collect();
        let split = cleaned
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(invalid)?;
        let (letters, digits) = cleaned.split_at(split);

        if letters.is_empty() || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(invalid());
        }
        let col = letters_to_column(letters).ok_or_else(invalid)?;
        let row: u32 = digits.parse().map_err(|_| invalid())?;

        if row == 0 || row > MAX_ROW || col > MAX_COLUMN {
            return Err(invalid());
        }
        Ok(Self { col, row })
    }

    /// Same column, another row
    pub fn with_row(self, row: u32) -> Self {
        Self { row, ..self }
    }
}

/// Column letters for a 1-based column index (1 -> A, 27 -> AA)
pub fn column_to_letters(col: u32) -> String {
    let mut letters = String::new();
    let mut col = col;

    while col > 0 {
        col -= 1;
        let letter = ((col % 26) as u8 + b'A') as char;
        letters.insert(0, letter);
        col /= 26;
    }

    letters
}

fn letters_to_column(letters: &str) -> Option<u32> {
    letters.chars().try_fold(0u32, |acc, c| {
        let digit = c.to_ascii_uppercase() as u32 - 'A' as u32 + 1;
        acc.checked_mul(26)?.checked_add(digit)
    })
}

/// Move the relative A1 references in `formula` by `rows`/`cols`, the way a
/// shared formula is filled into its dependent cells. `$` anchored parts stay
/// put and references pushed off the sheet become `#REF!`.
pub fn shift_formula(formula: &str, rows: i64, cols: i64) -> String {
    let chars: Vec<char> = formula.chars().collect();
    let mut out = String::with_capacity(formula.len());
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        // string literals and quoted sheet names are copied untouched
        if c == '"' || c == '\'' {
            let end = closing_quote(&chars, i);
            out.extend(&chars[i..end]);
            i = end;
            continue;
        }
        if i == 0 || !is_name_char(chars[i - 1]) {
            if let Some((len, shifted)) = shift_reference(&chars[i..], rows, cols) {
                out.push_str(&shifted);
                i += len;
                continue;
            }
        }
        out.push(c);
        i += 1;
    }
    out
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '.' | '$')
}

/// Index just past the quote closing the one at `start`; doubled quotes are
/// escapes
fn closing_quote(chars: &[char], start: usize) -> usize {
    let quote = chars[start];
    let mut i = start + 1;
    while i < chars.len() {
        if chars[i] == quote {
            if chars.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return i + 1;
        }
        i += 1;
    }
    chars.len()
}

/// Shift the reference at the start of `chars`, returning how many chars it
/// spans and its new text
fn shift_reference(chars: &[char], rows: i64, cols: i64) -> Option<(usize, String)> {
    let col_fixed = chars.first() == Some(&'$');
    let mut i = usize::from(col_fixed);
    let letters_start = i;
    while chars.get(i).is_some_and(char::is_ascii_alphabetic) {
        i += 1;
    }
    let letters: String = chars[letters_start..i].iter().collect();
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let row_fixed = chars.get(i) == Some(&'$');
    i += usize::from(row_fixed);
    let digits_start = i;
    while chars.get(i).is_some_and(char::is_ascii_digit) {
        i += 1;
    }
    if i == digits_start || chars.get(i).is_some_and(|&c| is_name_char(c) || c == '(') {
        return None;
    }

    let col = letters_to_column(&letters)?;
    let row: u32 = chars[digits_start..i].iter().collect::<String>().parse().ok()?;
    if row == 0 || row > MAX_ROW || col > MAX_COLUMN {
        return None;
    }

    let new_col = i64::from(col) + if col_fixed { 0 } else { cols };
    let new_row = i64::from(row) + if row_fixed { 0 } else { rows };
    let (Ok(new_col), Ok(new_row)) = (u32::try_from(new_col), u32::try_from(new_row)) else {
        return Some((i, "#REF!".to_string()));
    };
    if new_col == 0 || new_col > MAX_COLUMN || new_row == 0 || new_row > MAX_ROW {
        return Some((i, "#REF!".to_string()));
    }
    let anchor = |fixed: bool| if fixed { "$" } else { "" };
    Some((
        i,
        format!(
            "{}{}{}{new_row}",
            anchor(col_fixed),
            column_to_letters(new_col),
            anchor(row_fixed)
        ),
    ))
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col), self.row)
    }
}

impl FromStr for CellRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse() {
        assert_eq!(CellRef::parse("B12").unwrap(), CellRef::new(2, 12));
        assert_eq!(CellRef::parse("aa3").unwrap(), CellRef::new(27, 3));
        assert_eq!(CellRef::parse("$C$4").unwrap(), CellRef::new(3, 4));
        assert_eq!(CellRef::parse("XFD1048576").unwrap().col, 16_384);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for bad in ["", "12", "A", "A0", "1A", "A1B", "XFE1", "A1048577"] {
            assert!(matches!(CellRef::parse(bad), Err(Error::InvalidCellRef(_))), "{bad}");
        }
    }

    #[test]
    fn test_shift_formula() {
        assert_eq!(shift_formula("B1*2", 1, 0), "B2*2");
        assert_eq!(shift_formula("SUM(A1:B2)+$C$1", 2, 1), "SUM(B3:C4)+$C$1");
        assert_eq!(shift_formula("$A1+A$1", 3, 3), "$A4+D$1");
        assert_eq!(shift_formula("Data!C3&\"A1\"", 1, 0), "Data!C4&\"A1\"");
        assert_eq!(shift_formula("'Q1 A1'!B2", 0, 1), "'Q1 A1'!C2");
        assert_eq!(shift_formula("LOG10(A1)", 1, 0), "LOG10(A2)");
        assert_eq!(shift_formula("A1-1", -1, 0), "#REF!-1");
    }

    #[test]
    fn test_display() {
        assert_eq!(CellRef::new(1, 1).to_string(), "A1");
        assert_eq!(CellRef::new(26, 5).to_string(), "Z5");
        assert_eq!(CellRef::new(703, 2).to_string(), "AAA2");
    }
}

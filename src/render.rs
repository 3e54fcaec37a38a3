//! Hosts block rendering.

use std::fmt::Write as _;
use std::net::IpAddr;

use crate::rules::RuleSet;

/// Spaces between the widest cell of a column and the next column.
const COLUMN_PADDING: usize = 2;

/// Renders `rules` as hosts lines pointing at `address`.
///
/// Each rule becomes `<address> <domain>\t# <owner>`, ordered by
/// case-insensitive domain, and the tab is expanded so the comments line
/// up:
///
/// ```text
/// 10.0.0.5 api.dev.local  # api
/// 10.0.0.5 web.local      # web
/// ```
///
/// Output is empty for an empty set, otherwise every line ends in `\n`.
#[must_use]
pub fn render(rules: &RuleSet, address: IpAddr) -> String {
    let mut raw = String::new();
    for rule in rules.sorted() {
        // Writing into a String cannot fail.
        let _ = writeln!(raw, "{address} {}\t# {}", rule.domain, rule.owner);
    }
    align_columns(&raw, COLUMN_PADDING)
}

/// Expands tab-terminated cells so each column is as wide as its widest
/// cell plus `padding`. Text after a line's last tab is left untouched.
///
/// Widths count `char`s, not bytes.
#[must_use]
pub fn align_columns(text: &str, padding: usize) -> String {
    let rows: Vec<Vec<&str>> = text.lines().map(|l| l.split('\t').collect()).collect();

    let mut widths: Vec<usize> = Vec::new();
    for row in &rows {
        // The last cell is not tab-terminated and does not form a column.
        for (col, cell) in row.iter().take(row.len().saturating_sub(1)).enumerate() {
            let width = cell.chars().count();
            match widths.get_mut(col) {
                Some(w) => *w = (*w).max(width),
                None => widths.push(width),
            }
        }
    }

    let mut out = String::with_capacity(text.len());
    for row in &rows {
        let last = row.len().saturating_sub(1);
        for (col, cell) in row.iter().enumerate() {
            if col == last {
                out.push_str(cell);
            } else {
                let width = widths[col] + padding;
                let _ = write!(out, "{cell:<width$}");
            }
        }
        out.push('\n');
    }
    out
}

//! Labelled-text CSV loading.
//!
//! Format:
//! - UTF-8, comma-separated, double-quoted fields may contain commas and
//!   `""` escapes
//! - With a header row, the text column is named `text` and the label
//!   column `label` or `sentiment` (case-insensitive)
//! - Without a header, the first column is the text and the last the label
//! - Labels are class names or class indices, resolved through a `LabelTable`

use std::path::Path;

use crate::data::labels::LabelTable;
use crate::error::{Error, Result};

/// One raw row: unnormalized text plus its class index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelledText {
    pub text: String,
    pub label: usize,
}

pub fn load_csv<P: AsRef<Path>>(path: P, labels: &LabelTable) -> Result<Vec<LabelledText>> {
    let data = std::fs::read_to_string(path)?;
    parse_csv(&data, labels)
}

pub fn parse_csv(data: &str, labels: &LabelTable) -> Result<Vec<LabelledText>> {
    let mut lines = data.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()).peekable();

    let first = lines.peek().map(|&(_, line)| parse_csv_row(line));
    let (text_col, label_col) = match first.as_deref().map(header_columns) {
        Some(Some(cols)) => {
            lines.next();
            cols
        }
        Some(None) => (0, None),
        None => return Err(Error::Input("CSV contains no rows".into())),
    };

    let mut rows = Vec::new();
    for (line_idx, line) in lines {
        let row_num = line_idx + 1;
        let cells = parse_csv_row(line);
        if cells.len() < 2 {
            return Err(Error::Input(format!(
                "row {row_num}: expected at least 2 columns (text, label), got {}", cells.len()
            )));
        }
        let label_col = label_col.unwrap_or(cells.len() - 1);
        let (Some(text), Some(label)) = (cells.get(text_col), cells.get(label_col)) else {
            return Err(Error::Input(format!("row {row_num}: missing text or label column")));
        };
        let label = labels.parse(label)
            .map_err(|e| Error::Input(format!("row {row_num}: {e}")))?;
        rows.push(LabelledText { text: text.clone(), label });
    }

    if rows.is_empty() {
        return Err(Error::Input("CSV contains no data rows".into()));
    }
    Ok(rows)
}

/// Recognizes a header row and returns `(text column, label column)`.
fn header_columns(cells: &[String]) -> Option<(usize, Option<usize>)> {
    let find = |names: &[&str]| {
        cells.iter().position(|c| names.iter().any(|n| c.trim().eq_ignore_ascii_case(n)))
    };
    let text = find(&["text", "tweet", "sentence"])?;
    let label = find(&["label", "sentiment", "class"])?;
    Some((text, Some(label)))
}

/// Splits one CSV line, honoring double quotes.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

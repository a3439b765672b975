//! Definition line generation.
//!
//! Each column becomes one computed-field definition for the downstream
//! consumer:
//!
//! ```text
//! F001_Name computed
//! substr( alltrim( split( Full_Record , chr( 009 ), 001 , chr( 34 ) ) ) , 1 , 5 )
//! ```
//!
//! The template is reproduced byte for byte, including the space before the
//! embedded newline.

use std::fmt;

use crate::progress::Progress;
use crate::stats::ColumnWidths;

/// One generated column definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionLine {
    /// 0-based column index.
    pub index: usize,
    /// Sanitized header text.
    pub header: String,
    /// Maximum trimmed width of the column.
    pub width: usize,
}

impl DefinitionLine {
    /// 1-based label, zero-padded to three digits.
    pub fn label(&self) -> String {
        format!("{:03}", self.index + 1)
    }
}

impl fmt::Display for DefinitionLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = self.label();
        write!(
            f,
            "F{label}_{} computed \nsubstr( alltrim( split( Full_Record , chr( 009 ), {label} , chr( 34 ) ) ) , 1 , {} )",
            self.header, self.width
        )
    }
}

/// Escape `"` as `\"` and replace spaces with underscores.
pub fn sanitize_header(header: &str) -> String {
    header.replace('"', "\\\"").replace(' ', "_")
}

/// Header text for column `index`, falling back to `COL<n>` past the header row.
fn column_name(headers: &[String], index: usize) -> String {
    match headers.get(index) {
        Some(h) => h.trim().to_string(),
        None => format!("COL{}", index + 1),
    }
}

/// Build one definition line per column, notifying `progress` after each.
///
/// The column count is the width table's length, which already covers the
/// header row and any longer data rows.
pub fn generate(
    headers: &[String],
    widths: &ColumnWidths,
    progress: &mut dyn Progress,
) -> Vec<DefinitionLine> {
    let total = widths.len().max(headers.len());
    let mut lines = Vec::with_capacity(total);

    for index in 0..total {
        lines.push(DefinitionLine {
            index,
            header: sanitize_header(&column_name(headers, index)),
            width: widths.get(index),
        });
        progress.step(index + 1, total);
    }

    lines
}

/// Join rendered lines with a single `\n`.
pub fn render_lines(lines: &[DefinitionLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

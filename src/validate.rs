//! Structural checks on raw records.

use std::fmt;

/// Why a field was flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Odd number of quote characters.
    UnbalancedQuotes,
    /// More than one raw CR/LF character.
    EmbeddedNewlines,
    /// Both of the above.
    UnbalancedQuotesAndNewlines,
}

impl ViolationKind {
    fn classify(quotes: usize, newlines: usize) -> Option<Self> {
        match (quotes % 2 == 1, newlines > 1) {
            (true, true) => Some(ViolationKind::UnbalancedQuotesAndNewlines),
            (true, false) => Some(ViolationKind::UnbalancedQuotes),
            (false, true) => Some(ViolationKind::EmbeddedNewlines),
            (false, false) => None,
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ViolationKind::UnbalancedQuotes => "unbalanced quotes",
            ViolationKind::EmbeddedNewlines => "embedded newlines",
            ViolationKind::UnbalancedQuotesAndNewlines => "unbalanced quotes and embedded newlines",
        };
        f.write_str(s)
    }
}

/// A malformed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// 1-based record number, header included.
    pub line: usize,
    /// 1-based column number counted on raw tabs.
    pub column: usize,
    pub kind: ViolationKind,
    /// Number of `"` characters in the field.
    pub quotes: usize,
    /// Number of `\n` plus `\r` characters in the field.
    pub newlines: usize,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Line {}, Column {}: quotes={}, newlines={}",
            self.line, self.column, self.quotes, self.newlines
        )
    }
}

/// Collects violations across a whole scan.
///
/// Records are checked on raw tab boundaries, ignoring quoting, so the
/// reported column matches the physical position in the file.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check one record. Returns true if every field is well-formed.
    pub fn check_record(&mut self, line: usize, record: &str) -> bool {
        let before = self.errors.len();

        for (idx, field) in record.split('\t').enumerate() {
            let bytes = field.as_bytes();
            let quotes = bytecount::count(bytes, b'"');
            let newlines = bytecount::count(bytes, b'\n') + bytecount::count(bytes, b'\r');

            if let Some(kind) = ViolationKind::classify(quotes, newlines) {
                self.errors.push(ValidationError {
                    line,
                    column: idx + 1,
                    kind,
                    quotes,
                    newlines,
                });
            }
        }

        self.errors.len() == before
    }

    /// Whether no violation has been recorded.
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Violations seen so far, in encounter order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_record() {
        let mut validator = Validator::new();
        assert!(validator.check_record(1, "a\t\"quoted\"\tb"));
        assert!(validator.is_clean());
    }

    #[test]
    fn test_odd_quotes() {
        let mut validator = Validator::new();
        assert!(!validator.check_record(3, "ok\tbad\"field\tok"));

        assert_eq!(
            validator.errors(),
            &[ValidationError {
                line: 3,
                column: 2,
                kind: ViolationKind::UnbalancedQuotes,
                quotes: 1,
                newlines: 0,
            }]
        );
    }

    #[test]
    fn test_two_newlines_with_even_quotes() {
        let mut validator = Validator::new();
        assert!(!validator.check_record(2, "\"a\nb\rc\"\tz"));

        let err = &validator.errors()[0];
        assert_eq!(err.kind, ViolationKind::EmbeddedNewlines);
        assert_eq!(err.quotes, 2);
        assert_eq!(err.newlines, 2);
    }

    #[test]
    fn test_single_newline_is_allowed() {
        let mut validator = Validator::new();
        assert!(validator.check_record(1, "a\nb\tc"));
    }

    #[test]
    fn test_both_checks_fail() {
        let mut validator = Validator::new();
        validator.check_record(1, "\"a\n\n");
        assert_eq!(
            validator.errors()[0].kind,
            ViolationKind::UnbalancedQuotesAndNewlines
        );
    }

    #[test]
    fn test_errors_accumulate_in_order() {
        let mut validator = Validator::new();
        validator.check_record(1, "\"\t\"");
        validator.check_record(2, "fine");
        validator.check_record(3, "x\t\t\"");

        let positions: Vec<(usize, usize)> = validator
            .errors()
            .iter()
            .map(|e| (e.line, e.column))
            .collect();
        assert_eq!(positions, vec![(1, 1), (1, 2), (3, 3)]);
    }

    #[test]
    fn test_display() {
        let err = ValidationError {
            line: 7,
            column: 2,
            kind: ViolationKind::UnbalancedQuotes,
            quotes: 3,
            newlines: 0,
        };
        assert_eq!(err.to_string(), "Line 7, Column 2: quotes=3, newlines=0");
    }
}

//! tsv-coldef: computed column definitions from tab-delimited tables
//!
//! Reads a CRLF-delimited, tab-separated table in bounded memory, checks every
//! field for structural problems, measures the widest trimmed value of each
//! column, and emits one computed-field definition line per column.
//!
//! # Quick Start
//!
//! ```no_run
//! use tsv_coldef::{Analyzer, ColdefError};
//!
//! let analyzer = Analyzer::new();
//! let mut progress = |current: usize, total: usize| eprintln!("{current}/{total}");
//!
//! match analyzer.analyze_path("export.tsv", &mut progress) {
//!     Ok(analysis) => println!("{}", analysis.render()),
//!     Err(ColdefError::StructuralViolation(errors)) => {
//!         for err in &errors {
//!             eprintln!("{err}");
//!         }
//!     }
//!     Err(e) => eprintln!("{e}"),
//! }
//! ```
//!
//! # Pipeline
//!
//! 1. The encoding is picked from a 64 KiB sample: a BOM wins, then strict
//!    UTF-8 validation, then chardetng, then UTF-8 as a fallback.
//! 2. The source is decoded as a stream and split on CRLF only. Every field is
//!    checked for an odd quote count and for more than one CR/LF character.
//! 3. Well-formed data records update the per-column maximum widths.
//! 4. If any violation was found the run stops with the full list; otherwise
//!    one definition line is generated per column.

mod analyzer;
mod encoding;
mod error;
mod generate;
mod progress;
mod reader;
mod report;
mod stats;
mod validate;

pub use analyzer::{Analysis, Analyzer, Scan};
pub use error::{ColdefError, Result};
pub use generate::{DefinitionLine, generate, render_lines, sanitize_header};
pub use progress::{NoProgress, Progress, WriteProgress};
pub use report::ErrorReport;
pub use stats::ColumnWidths;
pub use validate::{ValidationError, Validator, ViolationKind};

// Re-export for advanced usage
pub use encoding::{
    ChardetngGuesser, DEFAULT_SAMPLE_SIZE, DetectedEncoding, EncodingDetector, EncodingGuesser,
    Utf8Guesser, has_utf8_bom, is_utf8, utf16_bom,
};
pub use reader::{Records, field_reader, parse_fields};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_api() {
        let _analyzer = Analyzer::new();
        let _detector = EncodingDetector::new();
        let _widths = ColumnWidths::new(3);
        let _kind = ViolationKind::UnbalancedQuotes;
        let _progress = NoProgress;
    }

    #[test]
    fn test_analyze_simple_tsv() {
        let data = b"Name\tAge\r\nAlice\t30\r\nBob\t5\r\n";
        let analysis = Analyzer::new().analyze_bytes(data, &mut NoProgress).unwrap();

        assert_eq!(analysis.lines.len(), 2);
        assert_eq!(analysis.lines[0].width, 5);
        assert_eq!(analysis.lines[1].width, 2);
    }

    #[test]
    fn test_builder_pattern() {
        let mut analyzer = Analyzer::new();
        analyzer
            .sample_size(4096)
            .guessers(vec![Box::new(Utf8Guesser)])
            .encoding("utf-8")
            .unwrap();

        // Verify builder returns &mut Self for chaining
    }
}

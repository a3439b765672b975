//! The `Analyzer` builder and the detect → scan → generate pipeline.

use std::fs::{self, File};
use std::io::{self, Cursor, Read};
use std::path::Path;

use encoding_rs::Encoding;
use tracing::{debug, info, warn};

use crate::encoding::{DetectedEncoding, EncodingDetector, EncodingGuesser};
use crate::error::{ColdefError, Result};
use crate::generate::{DefinitionLine, generate, render_lines};
use crate::progress::Progress;
use crate::reader::{RECORD_END, Records, field_reader, parse_fields};
use crate::stats::ColumnWidths;
use crate::validate::{ValidationError, Validator};

/// Everything gathered in one streaming pass over a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scan {
    /// Parsed fields of the first record.
    pub headers: Vec<String>,
    /// Per-column maximum widths over the data records.
    pub widths: ColumnWidths,
    /// Every violation, in encounter order.
    pub errors: Vec<ValidationError>,
    /// Number of records read, header included.
    pub records: usize,
    /// Whether undecodable bytes were replaced.
    pub had_replacements: bool,
}

/// The result of a successful run.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Encoding the source was decoded with.
    pub encoding: DetectedEncoding,
    /// One definition per column.
    pub lines: Vec<DefinitionLine>,
    /// Number of records read, header included.
    pub records: usize,
    /// Whether undecodable bytes were replaced.
    pub had_replacements: bool,
}

impl Analysis {
    /// The generated text: lines joined by `\n`, no trailing newline.
    pub fn render(&self) -> String {
        render_lines(&self.lines)
    }

    /// Write the generated text to `path` as UTF-8.
    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.render()).map_err(|source| ColdefError::DestinationWrite {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Validates data records as they stream past and hands only the
/// well-formed ones to the field reader, each ended by [`RECORD_END`].
struct CheckedRecords<R> {
    records: Records<R>,
    validator: Validator,
    /// Number of the last record read, header included.
    line: usize,
    buf: Vec<u8>,
    pos: usize,
    /// Source error hidden behind the field reader's own error type.
    failure: Option<io::Error>,
}

impl<R: Read> CheckedRecords<R> {
    /// `records` must already be past the header, which `validator` has seen.
    fn new(records: Records<R>, validator: Validator) -> Self {
        Self {
            records,
            validator,
            line: 1,
            buf: Vec::new(),
            pos: 0,
            failure: None,
        }
    }
}

impl<R: Read> Read for CheckedRecords<R> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        while self.pos == self.buf.len() {
            self.buf.clear();
            self.pos = 0;
            match self.records.next_record() {
                Ok(Some(record)) => {
                    self.line += 1;
                    if self.validator.check_record(self.line, &record) {
                        self.buf.extend_from_slice(record.as_bytes());
                        self.buf.push(RECORD_END);
                    }
                }
                Ok(None) => return Ok(0),
                Err(e) => {
                    let err = io::Error::new(e.kind(), e.to_string());
                    self.failure = Some(e);
                    return Err(err);
                }
            }
        }

        let n = out.len().min(self.buf.len() - self.pos);
        out[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

/// Generates column definition lines from a tab-delimited table.
///
/// # Example
///
/// ```no_run
/// use tsv_coldef::{Analyzer, NoProgress};
///
/// let mut analyzer = Analyzer::new();
/// analyzer.sample_size(16 * 1024);
///
/// let analysis = analyzer.analyze_path("export.tsv", &mut NoProgress).unwrap();
/// println!("{}", analysis.render());
/// ```
#[derive(Debug, Default)]
pub struct Analyzer {
    detector: EncodingDetector,
    forced_encoding: Option<&'static Encoding>,
}

impl Analyzer {
    /// Create a new Analyzer with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of bytes sampled for encoding detection.
    pub fn sample_size(&mut self, sample_size: usize) -> &mut Self {
        self.detector.sample_size(sample_size);
        self
    }

    /// Replace the encoding guessers, tried in the given order.
    pub fn guessers(&mut self, guessers: Vec<Box<dyn EncodingGuesser>>) -> &mut Self {
        self.detector = EncodingDetector::with_guessers(guessers);
        self
    }

    /// Force a specific encoding by WHATWG label (skip detection).
    pub fn encoding(&mut self, label: &str) -> Result<&mut Self> {
        let encoding = Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| ColdefError::InvalidConfig(format!("unknown encoding '{label}'")))?;
        self.forced_encoding = Some(encoding);
        Ok(self)
    }

    /// Detect the encoding of the file at `path`. Never fails.
    pub fn detect_path<P: AsRef<Path>>(&self, path: P) -> DetectedEncoding {
        match self.forced_encoding {
            Some(encoding) => DetectedEncoding::new(encoding, false),
            None => self.detector.detect_path(path),
        }
    }

    /// Scan the file at `path`.
    pub fn scan_path<P: AsRef<Path>>(&self, path: P, encoding: DetectedEncoding) -> Result<Scan> {
        let path = path.as_ref();
        let unavailable = |source| ColdefError::SourceUnavailable {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(unavailable)?;
        match self.scan_reader(file, encoding) {
            Err(ColdefError::Io(e)) => Err(unavailable(e)),
            other => other,
        }
    }

    /// Validate every record and accumulate column widths in one pass.
    ///
    /// Violations never stop the scan; they are all returned in the [`Scan`].
    pub fn scan_reader<R: Read>(&self, reader: R, encoding: DetectedEncoding) -> Result<Scan> {
        let mut records = Records::new(reader, encoding.encoding);
        let mut validator = Validator::new();

        let Some(header) = records.next_record()? else {
            return Err(ColdefError::EmptySource);
        };
        let headers = if validator.check_record(1, &header) {
            parse_fields(&header)?
        } else {
            Vec::new()
        };
        let mut widths = ColumnWidths::new(headers.len());

        // One field reader serves every data record.
        let mut rows = field_reader(CheckedRecords::new(records, validator));
        let mut row = csv::StringRecord::new();
        loop {
            match rows.read_record(&mut row) {
                Ok(true) => widths.observe(&row),
                Ok(false) => break,
                Err(e) => {
                    return Err(match rows.get_mut().failure.take() {
                        Some(io_err) => ColdefError::Io(io_err),
                        None => ColdefError::Csv(e),
                    });
                }
            }
        }
        let checked = rows.into_inner();

        debug!(
            records = checked.line,
            columns = widths.len(),
            violations = checked.validator.errors().len(),
            "scan complete"
        );

        Ok(Scan {
            headers,
            widths,
            had_replacements: checked.records.had_replacements(),
            records: checked.line,
            errors: checked.validator.into_errors(),
        })
    }

    /// Run the whole pipeline on the file at `path`.
    pub fn analyze_path<P: AsRef<Path>>(
        &self,
        path: P,
        progress: &mut dyn Progress,
    ) -> Result<Analysis> {
        let path = path.as_ref();
        let encoding = self.detect_path(path);
        info!(path = %path.display(), encoding = %encoding, "analyzing");

        let scan = self.scan_path(path, encoding)?;
        self.finish(encoding, scan, progress)
    }

    /// Run the whole pipeline on a reader. Detection uses the first
    /// `sample_size` bytes, which are then replayed into the scan.
    pub fn analyze_reader<R: Read>(
        &self,
        mut reader: R,
        progress: &mut dyn Progress,
    ) -> Result<Analysis> {
        let (sample, is_eof) = self.detector.read_sample(&mut reader)?;
        let encoding = self.detect_sample(&sample, is_eof);
        let scan = self.scan_reader(Cursor::new(sample).chain(reader), encoding)?;
        self.finish(encoding, scan, progress)
    }

    /// Run the whole pipeline on in-memory data.
    pub fn analyze_bytes(&self, data: &[u8], progress: &mut dyn Progress) -> Result<Analysis> {
        let encoding = self.detect_sample(data, true);
        let scan = self.scan_reader(data, encoding)?;
        self.finish(encoding, scan, progress)
    }

    fn detect_sample(&self, sample: &[u8], is_eof: bool) -> DetectedEncoding {
        match self.forced_encoding {
            Some(encoding) => DetectedEncoding::new(encoding, false),
            None => self.detector.detect_bytes(sample, is_eof),
        }
    }

    fn finish(
        &self,
        encoding: DetectedEncoding,
        scan: Scan,
        progress: &mut dyn Progress,
    ) -> Result<Analysis> {
        if !scan.errors.is_empty() {
            info!(violations = scan.errors.len(), "structural violations found, skipping generation");
            return Err(ColdefError::StructuralViolation(scan.errors));
        }

        if scan.had_replacements {
            warn!(encoding = %encoding, "undecodable bytes were replaced while reading");
        }

        let lines = generate(&scan.headers, &scan.widths, progress);
        info!(columns = lines.len(), records = scan.records, "generated definition lines");

        Ok(Analysis {
            encoding,
            lines,
            records: scan.records,
            had_replacements: scan.had_replacements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::NoProgress;

    #[test]
    fn test_scan_widths_and_headers() {
        let data = b"Name\tAge\r\nAlice\t30\r\nBob\t5\r\n";
        let analyzer = Analyzer::new();

        let scan = analyzer
            .scan_reader(&data[..], DetectedEncoding::default())
            .unwrap();

        assert_eq!(scan.headers, vec!["Name", "Age"]);
        assert_eq!(scan.widths.as_slice(), &[5, 2]);
        assert_eq!(scan.records, 3);
        assert!(scan.errors.is_empty());
    }

    #[test]
    fn test_header_does_not_contribute_widths() {
        let data = b"AVeryLongHeader\r\nab\r\n";
        let scan = Analyzer::new()
            .scan_reader(&data[..], DetectedEncoding::default())
            .unwrap();
        assert_eq!(scan.widths.as_slice(), &[2]);
    }

    #[test]
    fn test_header_is_validated() {
        let data = b"Na\"me\tAge\r\nAlice\t30\r\n";
        let scan = Analyzer::new()
            .scan_reader(&data[..], DetectedEncoding::default())
            .unwrap();
        assert_eq!(scan.errors.len(), 1);
        assert_eq!((scan.errors[0].line, scan.errors[0].column), (1, 1));
    }

    #[test]
    fn test_scan_continues_past_violations() {
        let data = b"A\tB\r\n\"x\ty\r\nok\tfine\r\nz\t\"\r\n";
        let scan = Analyzer::new()
            .scan_reader(&data[..], DetectedEncoding::default())
            .unwrap();

        let positions: Vec<(usize, usize)> =
            scan.errors.iter().map(|e| (e.line, e.column)).collect();
        assert_eq!(positions, vec![(2, 1), (4, 2)]);
        assert_eq!(scan.records, 4);
    }

    #[test]
    fn test_mixed_records_share_one_field_reader() {
        let data = b"A\tB\r\nx\t\"say \"\"hi\"\"\"\r\n\r\nbad\"\t1\r\nline\nbreak\tzz\r\nlast\t7\r\n";
        let scan = Analyzer::new()
            .scan_reader(&data[..], DetectedEncoding::default())
            .unwrap();

        // blank line 3 adds nothing, line 4 is excluded
        assert_eq!(scan.widths.as_slice(), &[10, 8]);
        assert_eq!(scan.records, 6);
        let positions: Vec<(usize, usize)> =
            scan.errors.iter().map(|e| (e.line, e.column)).collect();
        assert_eq!(positions, vec![(4, 1)]);
    }

    #[test]
    fn test_source_failure_mid_scan_is_io_error() {
        struct FailsAfter<'a>(&'a [u8]);

        impl Read for FailsAfter<'_> {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if self.0.is_empty() {
                    return Err(io::Error::other("disk went away"));
                }
                self.0.read(buf)
            }
        }

        let err = Analyzer::new()
            .scan_reader(FailsAfter(b"A\r\nx\r\n"), DetectedEncoding::default())
            .unwrap_err();
        assert!(matches!(err, ColdefError::Io(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_empty_source() {
        let err = Analyzer::new()
            .analyze_bytes(b"", &mut NoProgress)
            .unwrap_err();
        assert!(matches!(err, ColdefError::EmptySource));
    }

    #[test]
    fn test_forced_encoding() {
        let mut analyzer = Analyzer::new();
        analyzer.encoding("latin1").unwrap();

        // "Ñame" in Windows-1252, header only
        let analysis = analyzer
            .analyze_bytes(&[0xD1, b'a', b'm', b'e'], &mut NoProgress)
            .unwrap();
        assert_eq!(analysis.encoding.name(), "windows-1252");
        assert_eq!(analysis.lines[0].header, "Ñame");
    }

    #[test]
    fn test_unknown_encoding_label() {
        let mut analyzer = Analyzer::new();
        let err = analyzer.encoding("klingon-8").unwrap_err();
        assert!(matches!(err, ColdefError::InvalidConfig(_)));
        assert_eq!(err.exit_code(), 7);
    }

    #[test]
    fn test_analyze_reader_replays_sample() {
        let mut data = b"Col\r\n".to_vec();
        for i in 0..100 {
            data.extend_from_slice(format!("value{i}\r\n").as_bytes());
        }

        let mut analyzer = Analyzer::new();
        analyzer.sample_size(8);
        let analysis = analyzer
            .analyze_reader(Cursor::new(data), &mut NoProgress)
            .unwrap();

        assert_eq!(analysis.records, 101);
        assert_eq!(analysis.lines[0].header, "Col");
        assert_eq!(analysis.lines[0].width, 7);
    }
}

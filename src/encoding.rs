//! Encoding detection using BOM sniffing, `simdutf8` validation and chardetng.

use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use tracing::{debug, warn};

/// Default number of bytes inspected when guessing an encoding.
pub const DEFAULT_SAMPLE_SIZE: usize = 64 * 1024;

/// Check if the given bytes are valid UTF-8.
///
/// Uses SIMD-accelerated validation for performance.
pub fn is_utf8(data: &[u8]) -> bool {
    simdutf8::basic::from_utf8(data).is_ok()
}

/// Check if the data starts with a UTF-8 BOM (Byte Order Mark).
///
/// The UTF-8 BOM is the byte sequence: EF BB BF
pub fn has_utf8_bom(data: &[u8]) -> bool {
    data.len() >= 3 && data[0] == 0xEF && data[1] == 0xBB && data[2] == 0xBF
}

/// Returns the UTF-16 flavour announced by a leading BOM, if any.
pub fn utf16_bom(data: &[u8]) -> Option<&'static Encoding> {
    if data.len() < 2 {
        return None;
    }
    match (data[0], data[1]) {
        (0xFF, 0xFE) => Some(UTF_16LE),
        (0xFE, 0xFF) => Some(UTF_16BE),
        _ => None,
    }
}

/// The encoding chosen for a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectedEncoding {
    /// Encoding used to decode the source.
    pub encoding: &'static Encoding,
    /// Whether the source starts with a byte order mark.
    pub has_bom: bool,
}

impl DetectedEncoding {
    /// Create a new `DetectedEncoding`.
    pub const fn new(encoding: &'static Encoding, has_bom: bool) -> Self {
        Self { encoding, has_bom }
    }

    /// Encoding name as reported to users: `utf-8-sig` and `utf-16` for
    /// BOM-marked sources, otherwise the lowercase WHATWG name.
    pub fn name(&self) -> String {
        if self.has_bom {
            if self.encoding == UTF_8 {
                return "utf-8-sig".to_string();
            }
            if self.encoding == UTF_16LE || self.encoding == UTF_16BE {
                return "utf-16".to_string();
            }
        }
        self.encoding.name().to_ascii_lowercase()
    }
}

impl Default for DetectedEncoding {
    fn default() -> Self {
        Self::new(UTF_8, false)
    }
}

impl fmt::Display for DetectedEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

/// A charset guessing strategy.
///
/// Returning `None` means "no opinion"; detection moves on to the next guesser.
pub trait EncodingGuesser: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Guess the encoding of `sample`. `is_eof` is true when the sample is the whole source.
    fn guess(&self, sample: &[u8], is_eof: bool) -> Option<&'static Encoding>;
}

/// Accepts samples that are valid UTF-8.
///
/// A multi-byte sequence cut off by the end of a partial sample is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Guesser;

impl EncodingGuesser for Utf8Guesser {
    fn name(&self) -> &'static str {
        "utf8-validator"
    }

    fn guess(&self, sample: &[u8], is_eof: bool) -> Option<&'static Encoding> {
        if is_utf8(sample) {
            return Some(UTF_8);
        }
        if is_eof {
            return None;
        }
        // Only the slower compat API can tell a cut-off tail from bad bytes.
        match simdutf8::compat::from_utf8(sample) {
            Err(e) if e.error_len().is_none() => Some(UTF_8),
            _ => None,
        }
    }
}

/// Statistical guess from chardetng.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChardetngGuesser;

impl EncodingGuesser for ChardetngGuesser {
    fn name(&self) -> &'static str {
        "chardetng"
    }

    fn guess(&self, sample: &[u8], is_eof: bool) -> Option<&'static Encoding> {
        if sample.is_empty() {
            return None;
        }
        let mut detector = chardetng::EncodingDetector::new();
        detector.feed(sample, is_eof);
        Some(detector.guess(None, true))
    }
}

/// Picks a text encoding for a source from a byte sample.
///
/// Detection never fails: a BOM wins, then each guesser is tried in order,
/// and UTF-8 is the fallback.
pub struct EncodingDetector {
    sample_size: usize,
    guessers: Vec<Box<dyn EncodingGuesser>>,
}

impl Default for EncodingDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EncodingDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.guessers.iter().map(|g| g.name()).collect();
        f.debug_struct("EncodingDetector")
            .field("sample_size", &self.sample_size)
            .field("guessers", &names)
            .finish()
    }
}

impl EncodingDetector {
    /// Create a detector with the default guessers (UTF-8 validation, then chardetng).
    pub fn new() -> Self {
        Self::with_guessers(vec![Box::new(Utf8Guesser), Box::new(ChardetngGuesser)])
    }

    /// Create a detector that tries `guessers` in the given order.
    pub fn with_guessers(guessers: Vec<Box<dyn EncodingGuesser>>) -> Self {
        Self {
            sample_size: DEFAULT_SAMPLE_SIZE,
            guessers,
        }
    }

    /// Set the number of bytes read for detection.
    pub fn sample_size(&mut self, sample_size: usize) -> &mut Self {
        self.sample_size = sample_size;
        self
    }

    /// Detect the encoding of the file at `path`.
    ///
    /// A file that cannot be read is reported as UTF-8; opening it for the
    /// scan surfaces the real error.
    pub fn detect_path<P: AsRef<Path>>(&self, path: P) -> DetectedEncoding {
        match File::open(path.as_ref()) {
            Ok(file) => self.detect_reader(file),
            Err(e) => {
                warn!(path = %path.as_ref().display(), error = %e, "could not sample file for encoding detection");
                DetectedEncoding::default()
            }
        }
    }

    /// Detect the encoding from the first `sample_size` bytes of `reader`.
    pub fn detect_reader<R: Read>(&self, mut reader: R) -> DetectedEncoding {
        match self.read_sample(&mut reader) {
            Ok((sample, is_eof)) => self.detect_bytes(&sample, is_eof),
            Err(e) => {
                warn!(error = %e, "failed to read encoding sample");
                DetectedEncoding::default()
            }
        }
    }

    /// Read up to `sample_size` bytes. The flag is true when the reader was exhausted.
    pub fn read_sample<R: Read>(&self, reader: &mut R) -> io::Result<(Vec<u8>, bool)> {
        let mut sample = Vec::with_capacity(self.sample_size.min(DEFAULT_SAMPLE_SIZE));
        reader
            .by_ref()
            .take(self.sample_size as u64)
            .read_to_end(&mut sample)?;
        let is_eof = sample.len() < self.sample_size;
        Ok((sample, is_eof))
    }

    /// Detect the encoding of a byte sample.
    pub fn detect_bytes(&self, sample: &[u8], is_eof: bool) -> DetectedEncoding {
        if has_utf8_bom(sample) {
            return DetectedEncoding::new(UTF_8, true);
        }
        if let Some(encoding) = utf16_bom(sample) {
            return DetectedEncoding::new(encoding, true);
        }

        for guesser in &self.guessers {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| guesser.guess(sample, is_eof)));
            match outcome {
                Ok(Some(encoding)) => {
                    debug!(guesser = guesser.name(), encoding = encoding.name(), "encoding guessed");
                    return DetectedEncoding::new(encoding, false);
                }
                Ok(None) => {}
                Err(_) => warn!(guesser = guesser.name(), "encoding guesser failed, skipping"),
            }
        }

        DetectedEncoding::default()
    }
}

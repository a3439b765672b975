//! Streaming decode of a source into CRLF-delimited records.

use std::io::{self, Read};

use encoding_rs::{CoderResult, Decoder, Encoding};

/// Number of raw bytes read from the source per refill.
const CHUNK_SIZE: usize = 64 * 1024;

/// Decodes a byte source and yields one record per CRLF-terminated line.
///
/// Only the two-character sequence CR LF ends a record; a lone CR or LF is
/// kept as field data. A trailing empty segment after the final CRLF is not
/// a record. Undecodable bytes are replaced with U+FFFD.
pub struct Records<R> {
    reader: R,
    decoder: Decoder,
    raw: Vec<u8>,
    pending: String,
    start: usize,
    /// Offset in `pending` up to which no CRLF starts.
    searched: usize,
    finished: bool,
    had_replacements: bool,
}

impl<R: Read> Records<R> {
    /// Create a record stream decoding `reader` with `encoding`.
    ///
    /// A BOM at the start of the source overrides `encoding` and is stripped.
    pub fn new(reader: R, encoding: &'static Encoding) -> Self {
        Self {
            reader,
            decoder: encoding.new_decoder(),
            raw: vec![0u8; CHUNK_SIZE],
            pending: String::new(),
            start: 0,
            searched: 0,
            finished: false,
            had_replacements: false,
        }
    }

    /// Whether any malformed input was replaced so far.
    pub fn had_replacements(&self) -> bool {
        self.had_replacements
    }

    /// Read the next record, or `None` at end of input.
    pub fn next_record(&mut self) -> io::Result<Option<String>> {
        loop {
            let from = self.searched.max(self.start);
            if let Some(idx) = self.pending[from..].find("\r\n") {
                let end = from + idx;
                let record = self.pending[self.start..end].to_string();
                self.start = end + 2;
                self.searched = self.start;
                return Ok(Some(record));
            }

            if self.finished {
                if self.start < self.pending.len() {
                    let record = self.pending[self.start..].to_string();
                    self.start = self.pending.len();
                    self.searched = self.start;
                    return Ok(Some(record));
                }
                return Ok(None);
            }

            // A trailing CR may pair with an LF from the next chunk.
            self.searched = if self.pending.ends_with('\r') {
                self.pending.len() - 1
            } else {
                self.pending.len()
            };
            self.pending.replace_range(..self.start, "");
            self.searched -= self.start;
            self.start = 0;
            self.fill()?;
        }
    }

    /// Decode the next chunk of raw bytes onto the pending buffer.
    fn fill(&mut self) -> io::Result<()> {
        let n = loop {
            match self.reader.read(&mut self.raw) {
                Ok(n) => break n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        };
        let last = n == 0;

        let mut input = &self.raw[..n];
        loop {
            let needed = self
                .decoder
                .max_utf8_buffer_length(input.len())
                .unwrap_or(input.len() * 3 + 16);
            self.pending.reserve(needed);

            let (result, read, replaced) =
                self.decoder.decode_to_string(input, &mut self.pending, last);
            self.had_replacements |= replaced;
            input = &input[read..];

            match result {
                CoderResult::InputEmpty => break,
                CoderResult::OutputFull => continue,
            }
        }

        self.finished = last;
        Ok(())
    }
}

impl<R: Read> Iterator for Records<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Builds a field reader over a stream of records, each ended by a `0xFF`
/// byte: tab-delimited, `"`-quoted, with a doubled quote as the escape.
///
/// `0xFF` never occurs in UTF-8, so CR and LF stay ordinary field bytes.
/// Empty records are skipped.
pub fn field_reader<R: Read>(source: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .quote(b'"')
        .double_quote(true)
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::Any(RECORD_END))
        .from_reader(source)
}

/// Terminator byte separating records fed to [`field_reader`].
pub const RECORD_END: u8 = 0xFF;

/// Parses the fields of a single record.
pub fn parse_fields(record: &str) -> csv::Result<Vec<String>> {
    let mut reader = field_reader(record.as_bytes());
    let mut fields = csv::StringRecord::new();
    if reader.read_record(&mut fields)? {
        Ok(fields.iter().map(std::string::ToString::to_string).collect())
    } else {
        Ok(Vec::new())
    }
}

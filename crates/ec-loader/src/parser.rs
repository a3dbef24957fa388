//! Raw hierarchy listing parser.
//!
//! A listing is a flat text file with one `code<delimiter>description`
//! entry per line, e.g.
//!
//! ```text
//! # EC classification, release 2024-05
//! 1.-.-.-	Oxidoreductases
//! 1.1.-.-	Acting on the CH-OH group of donors
//! 1.1.1.1	alcohol dehydrogenase
//! ```
//!
//! Blank lines and lines starting with the comment marker are skipped.
//!
//! The same reader handles replacement-history listings, one
//! `code<delimiter>note<delimiter>history` entry per line:
//!
//! ```text
//! 1.1.1.5	Now EC 1.1.1.303 and EC 1.1.1.304	Deleted entry 2013
//! ```

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::time::Instant;

use csv::{ByteRecord, FromUtf8Error, Reader, ReaderBuilder, StringRecord};
use ec_types::{EcCode, Replacement};
use tracing::debug;

use crate::markup::strip_markup;
use crate::types::{EcError, EcResult, ParseStats, ParserConfig};

/// One parsed line of a listing, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// The EC number.
    pub code: EcCode,
    /// Trimmed description; empty when the line has none.
    pub description: String,
    /// 1-based source line.
    pub line: u64,
}

impl RawRecord {
    /// Creates a record that did not come from a file.
    pub fn new(code: EcCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            line: 0,
        }
    }
}

/// A streaming parser for hierarchy listings.
///
/// Yields records in source order and stops at the first malformed line.
pub struct RecordParser<R: Read> {
    reader: Reader<R>,
    config: ParserConfig,
    stats: ParseStats,
}

impl RecordParser<BufReader<File>> {
    /// Creates a new parser from a file path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened.
    pub fn from_path<P: AsRef<Path>>(path: P, config: ParserConfig) -> EcResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EcError::io_error(path, e))?;
        Ok(Self::from_reader(BufReader::new(file), config))
    }
}

impl<R: Read> RecordParser<R> {
    /// Creates a new parser from a reader.
    pub fn from_reader(reader: R, config: ParserConfig) -> Self {
        let reader = ReaderBuilder::new()
            .delimiter(config.delimiter)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .trim(csv::Trim::None)
            .from_reader(reader);

        Self {
            reader,
            config,
            stats: ParseStats::default(),
        }
    }

    /// Returns the statistics collected so far.
    pub fn stats(&self) -> &ParseStats {
        &self.stats
    }

    /// Returns the parser configuration.
    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses every record, failing on the first malformed line.
    pub fn parse_all(mut self) -> EcResult<(Vec<RawRecord>, ParseStats)> {
        let started = Instant::now();
        let mut records = Vec::new();
        for record in self.by_ref() {
            records.push(record?);
        }

        let mut stats = self.stats;
        stats.parse_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            records = stats.records,
            skipped = stats.skipped_lines,
            "parsed hierarchy listing"
        );
        Ok((records, stats))
    }

    /// Parses every entry as replacement history, failing on the first
    /// malformed line.
    ///
    /// Lines with neither a note nor a history are dropped. A code listed
    /// twice is merged, later non-empty fields winning.
    pub fn parse_replacements(mut self) -> EcResult<(Vec<Replacement>, ParseStats)> {
        let started = Instant::now();
        let mut entries: Vec<Replacement> = Vec::new();
        let mut positions: HashMap<EcCode, usize> = HashMap::new();

        while let Some(record) = self.next_fields() {
            let entry = self.to_replacement(&record?)?;
            if entry.is_empty() {
                self.stats.skipped_lines += 1;
                continue;
            }
            self.stats.records += 1;
            match positions.get(&entry.code) {
                Some(&i) => entries[i].merge(entry),
                None => {
                    positions.insert(entry.code, entries.len());
                    entries.push(entry);
                }
            }
        }

        let mut stats = self.stats;
        stats.parse_time_ms = started.elapsed().as_millis() as u64;
        debug!(
            entries = entries.len(),
            skipped = stats.skipped_lines,
            "parsed replacement history"
        );
        Ok((entries, stats))
    }

    /// Reads the next non-skippable line as fields.
    fn next_fields(&mut self) -> Option<EcResult<StringRecord>> {
        loop {
            let mut raw = ByteRecord::new();
            match self.reader.read_byte_record(&mut raw) {
                Ok(true) => {
                    self.stats.lines_read += 1;
                    let record = match StringRecord::from_byte_record(raw) {
                        Ok(record) => record,
                        Err(e) => return Some(Err(self.invalid_utf8(e))),
                    };

                    if self.is_skippable(&record) {
                        self.stats.skipped_lines += 1;
                        continue;
                    }
                    return Some(Ok(record));
                }
                Ok(false) => return None, // End of input
                Err(e) => return Some(Err(e.into())),
            }
        }
    }

    fn invalid_utf8(&self, error: FromUtf8Error) -> EcError {
        let reason = format!("invalid UTF-8: {}", error.utf8_error());
        let raw = error.into_byte_record();
        let line = raw.position().map(|p| p.line()).unwrap_or(0);
        let value = raw
            .iter()
            .map(String::from_utf8_lossy)
            .collect::<Vec<_>>()
            .join(&char::from(self.config.delimiter).to_string());
        EcError::Parse {
            line,
            value,
            reason,
        }
    }

    fn parse_code(&self, record: &StringRecord) -> EcResult<(EcCode, u64)> {
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let code_field = record.get(0).unwrap_or("").trim_start_matches('\u{feff}');

        let code = code_field.parse::<EcCode>().map_err(|e| EcError::Parse {
            line,
            value: code_field.to_string(),
            reason: e.to_string(),
        })?;
        Ok((code, line))
    }

    fn clean(&self, text: &str) -> String {
        if self.config.strip_markup {
            strip_markup(text)
        } else {
            text.trim().to_string()
        }
    }

    fn to_replacement(&self, record: &StringRecord) -> EcResult<Replacement> {
        let (code, _) = self.parse_code(record)?;
        let note = self.clean(record.get(1).unwrap_or(""));

        // Anything after the second delimiter belongs to the history.
        let delimiter = char::from(self.config.delimiter).to_string();
        let history = record.iter().skip(2).collect::<Vec<_>>().join(&delimiter);
        Ok(Replacement::new(code, note, self.clean(&history)))
    }

    fn is_skippable(&self, record: &StringRecord) -> bool {
        let first = record.get(0).unwrap_or("").trim_start();
        if first.as_bytes().first() == Some(&self.config.comment) {
            return true;
        }
        record.iter().all(|f| f.trim().is_empty())
    }

    fn to_raw_record(&self, record: &StringRecord) -> EcResult<RawRecord> {
        let (code, line) = self.parse_code(record)?;

        // Anything after the first delimiter belongs to the description.
        let delimiter = char::from(self.config.delimiter).to_string();
        let raw = record.iter().skip(1).collect::<Vec<_>>().join(&delimiter);

        Ok(RawRecord {
            code,
            description: self.clean(&raw),
            line,
        })
    }
}

impl<R: Read> Iterator for RecordParser<R> {
    type Item = EcResult<RawRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let parsed = match self.next_fields()? {
            Ok(record) => self.to_raw_record(&record),
            Err(e) => Err(e),
        };
        if parsed.is_ok() {
            self.stats.records += 1;
        }
        Some(parsed)
    }
}

/// Parses an in-memory listing.
pub fn parse_records(text: &str, config: &ParserConfig) -> EcResult<Vec<RawRecord>> {
    let (records, _) = RecordParser::from_reader(text.as_bytes(), config.clone()).parse_all()?;
    Ok(records)
}

/// Parses an in-memory replacement-history listing.
pub fn parse_replacements(text: &str, config: &ParserConfig) -> EcResult<Vec<Replacement>> {
    let (entries, _) =
        RecordParser::from_reader(text.as_bytes(), config.clone()).parse_replacements()?;
    Ok(entries)
}

//! Shared error and configuration types for the loader.

use std::path::PathBuf;

use ec_types::EcCode;
use thiserror::Error;

/// A query named a code that is not in the index.
///
/// This is an expected outcome rather than a fault.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("EC number {code} not found")]
pub struct NotFound {
    /// The code that was looked up.
    pub code: EcCode,
}

/// Errors that can occur while building, caching or querying the hierarchy.
#[derive(Error, Debug)]
pub enum EcError {
    /// A source line does not match the EC number grammar.
    #[error("Parse error on line {line}: {reason} (value: {value:?})")]
    Parse {
        /// 1-based line number in the source listing.
        line: u64,
        /// The offending text.
        value: String,
        /// Why the line was rejected.
        reason: String,
    },

    /// The persisted cache artifact is unreadable or from another format version.
    #[error("Cache artifact is corrupt: {reason}")]
    CacheCorrupt {
        /// What was wrong with the artifact.
        reason: String,
    },

    /// The fetch collaborator failed and no usable cached artifact exists.
    #[error("Source unavailable: {source}")]
    SourceUnavailable {
        /// The transport error reported by the fetch collaborator.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Query against a code that is not present.
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// A node's parent is missing from a node set handed to the index.
    #[error("EC number {code} has no parent {parent} in the node set")]
    Orphan {
        /// The node without a parent.
        code: EcCode,
        /// The missing parent.
        parent: EcCode,
    },

    /// The same code appears twice in a node set handed to the index.
    #[error("EC number {code} appears more than once")]
    DuplicateCode {
        /// The repeated code.
        code: EcCode,
    },

    /// I/O error with path context.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// The file being read or written.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// CSV reader error.
    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error while writing the cache artifact.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EcError {
    /// Creates an I/O error with path context.
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates a cache corruption error.
    pub fn cache_corrupt(reason: impl Into<String>) -> Self {
        Self::CacheCorrupt {
            reason: reason.into(),
        }
    }

    /// Wraps a fetch failure.
    pub fn source_unavailable(source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::SourceUnavailable {
            source: source.into(),
        }
    }
}

/// Result type for loader operations.
pub type EcResult<T> = Result<T, EcError>;

/// Configuration for parsing a raw hierarchy listing.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Separator between the EC number and its description.
    pub delimiter: u8,
    /// Lines starting with this byte are skipped.
    pub comment: u8,
    /// Whether to remove HTML-like markup from descriptions.
    pub strip_markup: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: b'\t',
            comment: b'#',
            strip_markup: true,
        }
    }
}

impl ParserConfig {
    /// Creates a config for listings that separate fields with `delimiter`.
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter,
            ..Self::default()
        }
    }

    /// Creates a config that keeps descriptions exactly as written.
    pub fn verbatim() -> Self {
        Self {
            strip_markup: false,
            ..Self::default()
        }
    }
}

/// Statistics from parsing a listing.
#[derive(Debug, Clone, Default)]
pub struct ParseStats {
    /// Non-empty lines read, including skipped comment lines.
    pub lines_read: usize,
    /// Records produced.
    pub records: usize,
    /// Whitespace-only and comment lines skipped.
    pub skipped_lines: usize,
    /// Time taken to parse in milliseconds.
    pub parse_time_ms: u64,
}

impl ParseStats {
    /// Returns the percentage of lines that produced a record.
    pub fn record_rate(&self) -> f64 {
        if self.lines_read == 0 {
            0.0
        } else {
            (self.records as f64 / self.lines_read as f64) * 100.0
        }
    }
}

/// Statistics from repairing a parsed record set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairStats {
    /// Distinct codes read from the source.
    pub real: usize,
    /// Ancestor placeholders created.
    pub synthesized: usize,
    /// Source records that repeated an earlier code.
    pub duplicates: usize,
}

impl RepairStats {
    /// Returns the total node count after repair.
    pub fn total(&self) -> usize {
        self.real + self.synthesized
    }
}

//! Freshness-checked persistence of the built hierarchy.
//!
//! The cache keeps one artifact per key: a JSON document holding the
//! complete node set, any replacement history, the freshness token of the
//! listing it was built from, the fetch time and a format version.
//!
//! # Artifact Format
//!
//! ```text
//! {
//!   "format_version": 2,
//!   "freshness_token": "<opaque>",
//!   "fetched_at": "2024-05-01T12:00:00Z",
//!   "checksum": "<sha-256 of everything above and below>",
//!   "records": [
//!     {"code": "1.-.-.-", "description": "Oxidoreductases", "synthesized": false},
//!     ...
//!   ],
//!   "replacements": [
//!     {"code": "1.1.1.5", "note": "Now EC 1.1.1.303"},
//!     ...
//!   ]
//! }
//! ```
//!
//! # Example
//!
//! ```ignore
//! let manager = CacheManager::new(FsStorage::new("/var/cache/ec"));
//! let source = FileSource::new("enzclass.txt");
//! let index = manager.get_or_build(|| source.fetch(), Duration::days(7))?;
//! ```

use std::time::Instant;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use ec_types::{ClassificationNode, Replacement};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::fetch::FetchedSource;
use crate::index::HierarchyIndex;
use crate::parser::RecordParser;
use crate::repair::repair;
use crate::storage::CacheStorage;
use crate::types::{EcError, EcResult, ParserConfig};

/// Current artifact format version.
pub const FORMAT_VERSION: u32 = 2;

/// Default storage key for the artifact.
pub const DEFAULT_CACHE_KEY: &str = "enzyme-hierarchy.json";

/// The persisted form of a built hierarchy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheArtifact {
    /// Layout version; artifacts from other versions are discarded.
    pub format_version: u32,
    /// Token of the listing the records were built from.
    pub freshness_token: String,
    /// When the listing was fetched.
    pub fetched_at: DateTime<Utc>,
    /// SHA-256 over every other field.
    pub checksum: String,
    /// The complete, repaired node set in code order.
    pub records: Vec<ClassificationNode>,
    /// History for retired codes, in code order.
    #[serde(default)]
    pub replacements: Vec<Replacement>,
}

#[derive(Deserialize)]
struct VersionHeader {
    format_version: u32,
}

impl CacheArtifact {
    /// Captures an index for persistence.
    pub fn from_index(
        freshness_token: impl Into<String>,
        fetched_at: DateTime<Utc>,
        index: &HierarchyIndex,
    ) -> Self {
        let mut artifact = Self {
            format_version: FORMAT_VERSION,
            freshness_token: freshness_token.into(),
            fetched_at,
            checksum: String::new(),
            records: index.nodes().into_iter().cloned().collect(),
            replacements: index.replacements().into_iter().cloned().collect(),
        };
        artifact.checksum = artifact.compute_checksum();
        artifact
    }

    /// Serializes the artifact.
    pub fn to_bytes(&self) -> EcResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| EcError::Serialization(e.to_string()))
    }

    /// Deserializes an artifact, checking the format version first.
    ///
    /// # Errors
    /// Returns [`EcError::CacheCorrupt`] for unreadable bytes, an unknown
    /// format version or a checksum mismatch.
    pub fn from_bytes(bytes: &[u8]) -> EcResult<Self> {
        let header: VersionHeader = serde_json::from_slice(bytes)
            .map_err(|e| EcError::cache_corrupt(format!("unreadable artifact: {}", e)))?;
        if header.format_version != FORMAT_VERSION {
            return Err(EcError::cache_corrupt(format!(
                "unsupported format version {} (expected {})",
                header.format_version, FORMAT_VERSION
            )));
        }

        let artifact: Self = serde_json::from_slice(bytes)
            .map_err(|e| EcError::cache_corrupt(format!("malformed artifact: {}", e)))?;

        let computed = artifact.compute_checksum();
        if computed != artifact.checksum {
            return Err(EcError::cache_corrupt(format!(
                "checksum mismatch: expected {}, got {}",
                artifact.checksum, computed
            )));
        }
        Ok(artifact)
    }

    /// Rebuilds the index from the stored records.
    ///
    /// Structural problems (orphans, duplicates) are reported as corruption.
    pub fn to_index(&self) -> EcResult<HierarchyIndex> {
        let index = HierarchyIndex::from_nodes(self.records.iter().cloned())
            .map_err(|e| EcError::cache_corrupt(e.to_string()))?;
        Ok(index.with_replacements(self.replacements.iter().cloned()))
    }

    /// Returns how long ago the listing was fetched.
    ///
    /// Negative when `fetched_at` lies in the future.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    /// Hashes every field except the checksum itself.
    pub fn compute_checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.format_version.to_le_bytes());
        hasher.update(self.freshness_token.as_bytes());
        hasher.update([0u8]);
        hasher.update(
            self.fetched_at
                .to_rfc3339_opts(SecondsFormat::Nanos, true)
                .as_bytes(),
        );
        hasher.update([0u8]);

        for record in &self.records {
            hasher.update(record.code.to_string().as_bytes());
            hasher.update([0u8]);
            hasher.update(record.description.as_bytes());
            hasher.update([0, u8::from(record.synthesized), b'\n']);
        }
        for entry in &self.replacements {
            hasher.update(b"R");
            hasher.update(entry.code.to_string().as_bytes());
            for field in [&entry.note, &entry.history] {
                match field {
                    Some(text) => {
                        hasher.update([1u8]);
                        hasher.update(text.as_bytes());
                    }
                    None => hasher.update([0u8]),
                }
                hasher.update([0u8]);
            }
        }
        hex::encode(hasher.finalize())
    }
}

/// Configuration for the cache manager.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Storage key of the artifact.
    pub key: String,
    /// When false, any stored artifact is ignored and replaced.
    pub use_cache: bool,
    /// Token of the listing currently known to be fresh, if any.
    /// An artifact carrying this token is reused regardless of age.
    pub known_token: Option<String>,
    /// Artifacts with fewer records are treated as missing.
    pub min_records: usize,
    /// Parser settings used when rebuilding.
    pub parser: ParserConfig,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_CACHE_KEY.to_string(),
            use_cache: true,
            known_token: None,
            min_records: 0,
            parser: ParserConfig::default(),
        }
    }
}

impl CacheConfig {
    /// Sets the storage key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Enables or disables reuse of stored artifacts.
    pub fn with_use_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    /// Sets the currently known fresh token.
    pub fn with_known_token(mut self, token: impl Into<String>) -> Self {
        self.known_token = Some(token.into());
        self
    }

    /// Sets the minimum record count for a usable artifact.
    pub fn with_min_records(mut self, min_records: usize) -> Self {
        self.min_records = min_records;
        self
    }

    /// Sets the parser configuration.
    pub fn with_parser(mut self, parser: ParserConfig) -> Self {
        self.parser = parser;
        self
    }
}

/// Summary of a stored artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactInfo {
    /// Token of the listing the artifact was built from.
    pub freshness_token: String,
    /// When that listing was fetched.
    pub fetched_at: DateTime<Utc>,
    /// Number of stored nodes.
    pub record_count: usize,
    /// Number of stored replacement entries.
    pub replacement_count: usize,
}

impl From<&CacheArtifact> for ArtifactInfo {
    fn from(artifact: &CacheArtifact) -> Self {
        Self {
            freshness_token: artifact.freshness_token.clone(),
            fetched_at: artifact.fetched_at,
            record_count: artifact.records.len(),
            replacement_count: artifact.replacements.len(),
        }
    }
}

/// Decides between reusing the stored hierarchy and rebuilding it.
///
/// Failures reading the stored artifact never reach the caller; they are
/// logged and treated as a miss. The manager does not coordinate
/// concurrent builders: the last writer wins.
#[derive(Debug)]
pub struct CacheManager<S: CacheStorage> {
    storage: S,
    config: CacheConfig,
}

impl<S: CacheStorage> CacheManager<S> {
    /// Creates a manager with the default configuration.
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, CacheConfig::default())
    }

    /// Creates a manager with an explicit configuration.
    pub fn with_config(storage: S, config: CacheConfig) -> Self {
        Self { storage, config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns the underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Returns the stored index if it is fresh, otherwise fetches, rebuilds
    /// and persists a new one.
    ///
    /// An artifact is fresh when its token equals the configured known
    /// token or it was fetched no more than `max_age` ago. An artifact
    /// dated in the future is expired. If `fetch` fails, an expired but
    /// readable artifact is still returned.
    ///
    /// # Errors
    /// - [`EcError::SourceUnavailable`] if `fetch` fails and nothing usable is stored.
    /// - [`EcError::Parse`] if the fetched listing is malformed.
    pub fn get_or_build<F, E>(&self, fetch: F, max_age: Duration) -> EcResult<HierarchyIndex>
    where
        F: FnOnce() -> Result<FetchedSource, E>,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let mut stale = None;
        if let Some((info, index)) = self.load_usable() {
            if self.is_fresh(&info, max_age, Utc::now()) {
                info!(
                    token = %info.freshness_token,
                    nodes = index.len(),
                    "using cached EC hierarchy"
                );
                return Ok(index);
            }
            debug!(fetched_at = %info.fetched_at, "cached EC hierarchy expired");
            stale = Some(index);
        }

        let source = match fetch() {
            Ok(source) => source,
            Err(e) => {
                let error = EcError::source_unavailable(e);
                return match stale {
                    Some(index) => {
                        warn!(error = %error, "fetch failed, falling back to expired cache");
                        Ok(index)
                    }
                    None => Err(error),
                };
            }
        };

        self.rebuild(source)
    }

    /// Builds an index from a fetched listing and persists it.
    ///
    /// A failed write is logged; the built index is still returned.
    pub fn rebuild(&self, source: FetchedSource) -> EcResult<HierarchyIndex> {
        let started = Instant::now();
        let (records, parse_stats) =
            RecordParser::from_reader(source.content.as_bytes(), self.config.parser.clone())
                .parse_all()?;
        let replacements = match &source.history {
            Some(history) => {
                RecordParser::from_reader(history.as_bytes(), self.config.parser.clone())
                    .parse_replacements()?
                    .0
            }
            None => Vec::new(),
        };
        let (nodes, repair_stats) = repair(records);
        let index = HierarchyIndex::from_nodes(nodes)?.with_replacements(replacements);

        info!(
            records = parse_stats.records,
            synthesized = repair_stats.synthesized,
            duplicates = repair_stats.duplicates,
            nodes = index.len(),
            replacements = index.replacements().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "built EC hierarchy"
        );

        let artifact = CacheArtifact::from_index(source.freshness_token, Utc::now(), &index);
        if let Err(e) = self.persist(&artifact) {
            warn!(error = %e, key = %self.config.key, "could not persist EC hierarchy");
        }
        Ok(index)
    }

    /// Writes an artifact, replacing any previous one atomically.
    pub fn persist(&self, artifact: &CacheArtifact) -> EcResult<()> {
        self.storage.write(&self.config.key, &artifact.to_bytes()?)
    }

    /// Reads and validates the stored artifact.
    ///
    /// Returns `Ok(None)` when nothing is stored.
    pub fn load_artifact(&self) -> EcResult<Option<CacheArtifact>> {
        self.storage
            .read(&self.config.key)?
            .map(|bytes| CacheArtifact::from_bytes(&bytes))
            .transpose()
    }

    /// Describes the stored artifact without building an index.
    pub fn inspect(&self) -> EcResult<Option<ArtifactInfo>> {
        Ok(self.load_artifact()?.as_ref().map(ArtifactInfo::from))
    }

    /// Deletes the stored artifact.
    pub fn invalidate(&self) -> EcResult<()> {
        self.storage.remove(&self.config.key)
    }

    fn load_usable(&self) -> Option<(ArtifactInfo, HierarchyIndex)> {
        if !self.config.use_cache {
            debug!("cache disabled, rebuilding EC hierarchy");
            return None;
        }

        let artifact = match self.load_artifact() {
            Ok(Some(artifact)) => artifact,
            Ok(None) => {
                debug!(key = %self.config.key, "no cached EC hierarchy");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "discarding cached EC hierarchy");
                return None;
            }
        };

        if artifact.records.len() < self.config.min_records {
            warn!(
                records = artifact.records.len(),
                min_records = self.config.min_records,
                "cached EC hierarchy is too small, discarding"
            );
            return None;
        }

        match artifact.to_index() {
            Ok(index) => Some((ArtifactInfo::from(&artifact), index)),
            Err(e) => {
                warn!(error = %e, "discarding cached EC hierarchy");
                None
            }
        }
    }

    fn is_fresh(&self, info: &ArtifactInfo, max_age: Duration, now: DateTime<Utc>) -> bool {
        if self.config.known_token.as_deref() == Some(info.freshness_token.as_str()) {
            return true;
        }
        let age = now - info.fetched_at;
        if age < Duration::zero() {
            warn!(fetched_at = %info.fetched_at, "cached EC hierarchy is dated in the future");
            return false;
        }
        age <= max_age
    }
}

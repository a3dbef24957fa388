//! Fetch collaborator types.
//!
//! The cache manager takes any `FnOnce() -> Result<FetchedSource, E>` as
//! its fetch function. Transport, timeouts and retries belong to that
//! function; [`FileSource`] covers the common local-file case, including
//! a fallback copy of the listing and an optional replacement-history
//! listing.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::types::{EcError, EcResult};

/// Raw listing text plus the token identifying its version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedSource {
    /// The serialized hierarchy listing.
    pub content: String,
    /// Optional `code<delimiter>note<delimiter>history` listing of retired
    /// EC numbers.
    pub history: Option<String>,
    /// Opaque marker (version id, timestamp or content hash).
    pub freshness_token: String,
}

impl FetchedSource {
    /// Creates a source with an explicit freshness token.
    pub fn new(content: impl Into<String>, freshness_token: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            history: None,
            freshness_token: freshness_token.into(),
        }
    }

    /// Creates a source whose token is the SHA-256 of its content.
    pub fn from_content(content: impl Into<String>) -> Self {
        Self::from_listings(content, None)
    }

    /// Creates a source from a hierarchy listing and an optional history
    /// listing. The token fingerprints both.
    pub fn from_listings(content: impl Into<String>, history: Option<String>) -> Self {
        let content = content.into();
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        if let Some(history) = &history {
            hasher.update([0u8]);
            hasher.update(history.as_bytes());
        }

        Self {
            content,
            history,
            freshness_token: hex::encode(hasher.finalize()),
        }
    }

    /// Attaches a history listing, keeping the current token.
    pub fn with_history(mut self, history: impl Into<String>) -> Self {
        self.history = Some(history.into());
        self
    }
}

/// Returns the lowercase hex SHA-256 of `bytes`.
pub fn content_fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Reads a listing from a local file.
///
/// Fallback paths are tried in order when the primary file cannot be read.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    fallbacks: Vec<PathBuf>,
    history_path: Option<PathBuf>,
}

impl FileSource {
    /// Creates a source for the listing at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            fallbacks: Vec::new(),
            history_path: None,
        }
    }

    /// Adds a path to read when every earlier path fails.
    pub fn with_fallback(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallbacks.push(path.into());
        self
    }

    /// Reads replacement history from `path` alongside the listing.
    pub fn with_history(mut self, path: impl Into<PathBuf>) -> Self {
        self.history_path = Some(path.into());
        self
    }

    /// Returns the primary listing path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the fallback listing paths.
    pub fn fallbacks(&self) -> &[PathBuf] {
        &self.fallbacks
    }

    /// Reads the listing (and history, if configured) and fingerprints them.
    ///
    /// # Errors
    /// Returns the error for the last path tried if no listing path can be
    /// read, or the history read error.
    pub fn fetch(&self) -> EcResult<FetchedSource> {
        let content = self.read_listing()?;
        let history = match &self.history_path {
            Some(path) => Some(read_text(path)?),
            None => None,
        };
        Ok(FetchedSource::from_listings(content, history))
    }

    fn read_listing(&self) -> EcResult<String> {
        let mut last_error = None;
        for path in std::iter::once(&self.path).chain(&self.fallbacks) {
            match read_text(path) {
                Ok(content) => return Ok(content),
                Err(e) => {
                    warn!(error = %e, "could not read hierarchy listing, trying next source");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            EcError::io_error(&self.path, std::io::ErrorKind::NotFound.into())
        }))
    }
}

fn read_text(path: &Path) -> EcResult<String> {
    let content = fs::read_to_string(path).map_err(|e| EcError::io_error(path, e))?;
    debug!(path = %path.display(), bytes = content.len(), "read listing");
    Ok(content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_fingerprint_is_stable() {
        let a = FetchedSource::from_content("1.-.-.-\tOxidoreductases\n");
        let b = FetchedSource::from_content("1.-.-.-\tOxidoreductases\n");
        let c = FetchedSource::from_content("2.-.-.-\tTransferases\n");
        assert_eq!(a.freshness_token, b.freshness_token);
        assert_ne!(a.freshness_token, c.freshness_token);
        assert_eq!(a.freshness_token.len(), 64);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            content_fingerprint(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            FetchedSource::from_content("").freshness_token,
            content_fingerprint(b"")
        );
    }

    #[test]
    fn test_history_changes_token() {
        let plain = FetchedSource::from_listings("1.-.-.-\tOxidoreductases\n", None);
        let with_history = FetchedSource::from_listings(
            "1.-.-.-\tOxidoreductases\n",
            Some("1.1.1.5\tNow EC 1.1.1.303\t\n".to_string()),
        );
        assert_ne!(plain.freshness_token, with_history.freshness_token);
        assert!(with_history.history.is_some());
    }

    #[test]
    fn test_file_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("enzclass.txt");
        std::fs::write(&path, "3.-.-.-\tHydrolases\n").unwrap();

        let source = FileSource::new(&path).fetch().unwrap();
        assert_eq!(source.content, "3.-.-.-\tHydrolases\n");
        assert_eq!(source.freshness_token, content_fingerprint(b"3.-.-.-\tHydrolases\n"));
        assert!(source.history.is_none());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let result = FileSource::new(dir.path().join("missing.txt")).fetch();
        assert!(matches!(result, Err(EcError::Io { .. })));
    }

    #[test]
    fn test_fallback_used_when_primary_missing() {
        let dir = tempdir().unwrap();
        let fallback = dir.path().join("fallback.txt");
        std::fs::write(&fallback, "4.-.-.-\tLyases\n").unwrap();

        let source = FileSource::new(dir.path().join("missing.txt"))
            .with_fallback(&fallback)
            .fetch()
            .unwrap();
        assert_eq!(source.content, "4.-.-.-\tLyases\n");
    }

    #[test]
    fn test_primary_preferred_over_fallback() {
        let dir = tempdir().unwrap();
        let primary = dir.path().join("primary.txt");
        let fallback = dir.path().join("fallback.txt");
        std::fs::write(&primary, "5.-.-.-\tIsomerases\n").unwrap();
        std::fs::write(&fallback, "4.-.-.-\tLyases\n").unwrap();

        let source = FileSource::new(&primary).with_fallback(&fallback).fetch().unwrap();
        assert_eq!(source.content, "5.-.-.-\tIsomerases\n");
    }

    #[test]
    fn test_all_paths_missing_reports_last() {
        let dir = tempdir().unwrap();
        let last = dir.path().join("also-missing.txt");
        let err = FileSource::new(dir.path().join("missing.txt"))
            .with_fallback(&last)
            .fetch()
            .unwrap_err();
        match err {
            EcError::Io { path, .. } => assert_eq!(path, last),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_history_file() {
        let dir = tempdir().unwrap();
        let listing = dir.path().join("enzclass.txt");
        let history = dir.path().join("history.txt");
        std::fs::write(&listing, "1.-.-.-\tOxidoreductases\n").unwrap();
        std::fs::write(&history, "1.1.1.5\tNow EC 1.1.1.303\t\n").unwrap();

        let source = FileSource::new(&listing).with_history(&history).fetch().unwrap();
        assert_eq!(source.history.as_deref(), Some("1.1.1.5\tNow EC 1.1.1.303\t\n"));
    }
}

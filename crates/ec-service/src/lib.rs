//! # ec-service
//!
//! Environment-driven wiring around [`ec_loader`]: where the listing lives,
//! where the cache goes, and how old a cached hierarchy may get.

#![warn(missing_docs)]

use std::path::PathBuf;

use chrono::Duration;
use ec_loader::{CacheConfig, CacheManager, EcResult, FileSource, FsStorage, HierarchyIndex};
use ec_types::EcCode;

/// Default listing location.
pub const DEFAULT_SOURCE_PATH: &str = "data/enzclass.txt";
/// Default cache directory.
pub const DEFAULT_CACHE_DIR: &str = "cache/ec";
/// Default maximum cache age in hours.
pub const DEFAULT_MAX_AGE_HOURS: i64 = 24 * 7;

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Path of the raw listing (`EC_SOURCE_PATH`).
    pub source_path: PathBuf,
    /// Listing read when `source_path` fails (`EC_FALLBACK_PATH`).
    pub fallback_path: Option<PathBuf>,
    /// Replacement-history listing (`EC_HISTORY_PATH`).
    pub history_path: Option<PathBuf>,
    /// Cache directory (`EC_CACHE_DIR`).
    pub cache_dir: PathBuf,
    /// Maximum cache age in hours (`EC_MAX_AGE_HOURS`).
    pub max_age_hours: i64,
    /// Whether to reuse the cache (`EC_USE_CACHE`, `0`/`false` disables).
    pub use_cache: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            source_path: PathBuf::from(DEFAULT_SOURCE_PATH),
            fallback_path: None,
            history_path: None,
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            max_age_hours: DEFAULT_MAX_AGE_HOURS,
            use_cache: true,
        }
    }
}

impl ServiceConfig {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, falling back to defaults
    /// for missing or unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            source_path: lookup("EC_SOURCE_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.source_path),
            fallback_path: lookup("EC_FALLBACK_PATH").map(PathBuf::from),
            history_path: lookup("EC_HISTORY_PATH").map(PathBuf::from),
            cache_dir: lookup("EC_CACHE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.cache_dir),
            max_age_hours: lookup("EC_MAX_AGE_HOURS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|h: &i64| *h >= 0)
                .unwrap_or(defaults.max_age_hours),
            use_cache: lookup("EC_USE_CACHE")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no"))
                .unwrap_or(defaults.use_cache),
        }
    }

    /// Returns the maximum cache age.
    pub fn max_age(&self) -> Duration {
        Duration::hours(self.max_age_hours)
    }

    /// Loads the hierarchy through the cache.
    pub fn load_index(&self) -> EcResult<HierarchyIndex> {
        let config = CacheConfig::default().with_use_cache(self.use_cache);
        let manager = CacheManager::with_config(FsStorage::new(&self.cache_dir), config);
        manager.get_or_build(|| self.source().fetch(), self.max_age())
    }

    /// Returns the file source described by this configuration.
    pub fn source(&self) -> FileSource {
        let mut source = FileSource::new(&self.source_path);
        if let Some(path) = &self.fallback_path {
            source = source.with_fallback(path);
        }
        if let Some(path) = &self.history_path {
            source = source.with_history(path);
        }
        source
    }
}

/// Formats the lineage of a loosely written EC number, one node per line.
///
/// Returns `None` if the number does not resolve.
pub fn describe(index: &HierarchyIndex, raw: &str) -> Option<String> {
    let node = index.resolve(raw)?;
    let lineage = index.lineage(&node.code).ok()?;

    let lines: Vec<String> = lineage
        .iter()
        .enumerate()
        .map(|(depth, n)| {
            let label = if n.synthesized {
                "(no description)"
            } else {
                n.description.as_str()
            };
            format!("{}{:<10} {}", "  ".repeat(depth), n.code.compact(), label)
        })
        .collect();
    Some(lines.join("\n"))
}

/// Formats the history notes of a retired EC number.
///
/// Returns `None` if the number is not a known retired code.
pub fn describe_replaced(index: &HierarchyIndex, raw: &str) -> Option<String> {
    let code = EcCode::normalize(raw)?;
    let entry = index.replaced(&code)?;

    let mut lines = vec![format!("{} (retired)", code.compact())];
    lines.extend(entry.note.iter().map(|note| format!("  note: {}", note)));
    lines.extend(entry.history.iter().map(|history| format!("  history: {}", history)));
    Some(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ec_loader::ParserConfig;
    use ec_types::Replacement;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = ServiceConfig::from_lookup(|_| None);
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.max_age(), Duration::hours(168));
    }

    #[test]
    fn test_config_overrides() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("EC_SOURCE_PATH", "/srv/enzclass.txt"),
            ("EC_CACHE_DIR", "/tmp/ec"),
            ("EC_MAX_AGE_HOURS", "12"),
            ("EC_USE_CACHE", "false"),
        ]));
        assert_eq!(config.source_path, PathBuf::from("/srv/enzclass.txt"));
        assert_eq!(config.cache_dir, PathBuf::from("/tmp/ec"));
        assert_eq!(config.max_age_hours, 12);
        assert!(!config.use_cache);
        assert!(config.fallback_path.is_none());
    }

    #[test]
    fn test_config_fallback_and_history() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("EC_FALLBACK_PATH", "/srv/enzclass.bak"),
            ("EC_HISTORY_PATH", "/srv/history.txt"),
        ]));
        assert_eq!(config.fallback_path, Some(PathBuf::from("/srv/enzclass.bak")));
        assert_eq!(config.history_path, Some(PathBuf::from("/srv/history.txt")));

        let source = config.source();
        assert_eq!(source.path(), PathBuf::from(DEFAULT_SOURCE_PATH).as_path());
        assert_eq!(source.fallbacks(), &[PathBuf::from("/srv/enzclass.bak")]);
    }

    #[test]
    fn test_describe_replaced() {
        let index = HierarchyIndex::from_listing(
            "1.-.-.-\tOxidoreductases\n",
            &ParserConfig::default(),
        )
        .unwrap()
        .with_replacements([Replacement::new(
            "1.1.1.5".parse().unwrap(),
            "Now EC 1.1.1.303",
            "deleted 2013",
        )]);

        let text = describe_replaced(&index, "1.1.1.5").unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec![
                "1.1.1.5 (retired)",
                "  note: Now EC 1.1.1.303",
                "  history: deleted 2013"
            ]
        );
        assert!(describe_replaced(&index, "1.-.-.-").is_none());
    }

    #[test]
    fn test_config_ignores_bad_values() {
        let config = ServiceConfig::from_lookup(lookup_from(&[
            ("EC_MAX_AGE_HOURS", "soon"),
            ("EC_USE_CACHE", "yes"),
        ]));
        assert_eq!(config.max_age_hours, DEFAULT_MAX_AGE_HOURS);
        assert!(config.use_cache);

        let negative = ServiceConfig::from_lookup(lookup_from(&[("EC_MAX_AGE_HOURS", "-3")]));
        assert_eq!(negative.max_age_hours, DEFAULT_MAX_AGE_HOURS);
    }

    #[test]
    fn test_describe() {
        let index = HierarchyIndex::from_listing(
            "1.-.-.-\tOxidoreductases\n1.2.3.4\toxalate oxidase\n",
            &ParserConfig::default(),
        )
        .unwrap();

        let text = describe(&index, "1.2.3.4").unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("Oxidoreductases"));
        assert!(lines[1].contains("(no description)"));
        assert!(lines[3].trim_start().starts_with("1.2.3.4"));

        assert!(describe(&index, "9.9.9.9").is_none());
    }
}

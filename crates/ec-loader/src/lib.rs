//! # ec-loader
//!
//! Builds and caches a queryable index of the Enzyme Commission
//! classification hierarchy from a flat `code<TAB>description` listing.
//!
//! The build pipeline is parse → repair → index:
//!
//! - [`parser`] turns the listing into [`RawRecord`]s, rejecting malformed codes.
//! - [`repair`] synthesizes every ancestor implied by a deeper code.
//! - [`index`] groups nodes by parent for lookup and traversal, and keeps
//!   the history of retired codes.
//!
//! [`CacheManager::get_or_build`] ties the pipeline to a fetch function and
//! a persisted, freshness-checked artifact.
//!
//! ```ignore
//! use chrono::Duration;
//! use ec_loader::{CacheManager, FileSource, FsStorage};
//!
//! let manager = CacheManager::new(FsStorage::new("cache/ec"));
//! let source = FileSource::new("enzclass.txt");
//! let index = manager.get_or_build(|| source.fetch(), Duration::days(7))?;
//!
//! let code = "1.1.1.1".parse()?;
//! println!("{}", index.lookup(&code)?.description);
//! ```

#![warn(missing_docs)]

pub mod cache;
pub mod fetch;
pub mod index;
mod markup;
pub mod parser;
pub mod repair;
pub mod storage;
pub mod types;

pub use cache::{ArtifactInfo, CacheArtifact, CacheConfig, CacheManager, DEFAULT_CACHE_KEY, FORMAT_VERSION};
pub use fetch::{content_fingerprint, FetchedSource, FileSource};
pub use index::HierarchyIndex;
pub use markup::strip_markup;
pub use parser::{parse_records, parse_replacements, RawRecord, RecordParser};
pub use repair::{repair, HierarchyRepairer};
pub use storage::{CacheStorage, FsStorage, MemoryStorage};
pub use types::{EcError, EcResult, NotFound, ParseStats, ParserConfig, RepairStats};

// Re-export ec-types for convenience
pub use ec_types;

//! Structural repair of a parsed record set.
//!
//! Listings are often incomplete: a serial entry such as `1.1.1.1` may be
//! present without its sub-subclass `1.1.1.-` heading. The repairer
//! synthesizes every missing ancestor so each node has a full chain up to
//! the class level.

use std::collections::BTreeMap;

use ec_types::{ClassificationNode, EcCode};
use tracing::{debug, warn};

use crate::parser::RawRecord;
use crate::types::RepairStats;

/// Accumulates records and fills gaps in their ancestor chains.
///
/// Merge rules, independent of the order records arrive in:
/// - a record read from the source always replaces a placeholder;
/// - a placeholder is created once per code;
/// - between two source records for one code, a non-empty description
///   beats an empty one, otherwise the first wins.
#[derive(Debug, Default)]
pub struct HierarchyRepairer {
    nodes: BTreeMap<EcCode, ClassificationNode>,
    stats: RepairStats,
}

impl HierarchyRepairer {
    /// Creates an empty repairer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one source record and synthesizes any missing ancestors.
    pub fn add_record(&mut self, record: RawRecord) {
        let code = record.code;

        match self.nodes.get_mut(&code) {
            Some(existing) if existing.synthesized => {
                *existing = ClassificationNode::new(code, record.description);
                self.stats.synthesized -= 1;
                self.stats.real += 1;
            }
            Some(existing) => {
                self.stats.duplicates += 1;
                if !existing.has_description() && !record.description.is_empty() {
                    existing.description = record.description;
                } else if existing.description != record.description {
                    warn!(
                        code = %code,
                        line = record.line,
                        "duplicate EC number with a different description, keeping the first"
                    );
                }
            }
            None => {
                self.nodes
                    .insert(code, ClassificationNode::new(code, record.description));
                self.stats.real += 1;
            }
        }

        self.fill_ancestors(code);
    }

    /// Adds every record from an iterator.
    pub fn extend(&mut self, records: impl IntoIterator<Item = RawRecord>) {
        for record in records {
            self.add_record(record);
        }
    }

    /// Returns the statistics collected so far.
    pub fn stats(&self) -> &RepairStats {
        &self.stats
    }

    /// Returns the complete node set ordered by code.
    pub fn finish(self) -> (Vec<ClassificationNode>, RepairStats) {
        debug!(
            real = self.stats.real,
            synthesized = self.stats.synthesized,
            duplicates = self.stats.duplicates,
            "repaired hierarchy"
        );
        (self.nodes.into_values().collect(), self.stats)
    }

    // Every node already present has a complete chain, so the walk can
    // stop at the first ancestor found.
    fn fill_ancestors(&mut self, code: EcCode) {
        let mut current = code.parent();
        while let Some(ancestor) = current {
            if self.nodes.contains_key(&ancestor) {
                break;
            }
            self.nodes
                .insert(ancestor, ClassificationNode::placeholder(ancestor));
            self.stats.synthesized += 1;
            current = ancestor.parent();
        }
    }
}

/// Repairs a record set in one call.
pub fn repair(
    records: impl IntoIterator<Item = RawRecord>,
) -> (Vec<ClassificationNode>, RepairStats) {
    let mut repairer = HierarchyRepairer::new();
    repairer.extend(records);
    repairer.finish()
}

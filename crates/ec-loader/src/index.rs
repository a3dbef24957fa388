//! In-memory EC hierarchy index.
//!
//! Nodes are stored by code and grouped by parent code, so child lookup is
//! a single map access and ancestor lookup walks at most three parents.
//! The implicit root is the `None` parent key.
//!
//! ```ignore
//! let index = HierarchyIndex::from_listing(&text, &ParserConfig::default())?;
//!
//! let code: EcCode = "1.1.1.1".parse()?;
//! let node = index.lookup(&code)?;
//! for ancestor in index.ancestors(&code)? {
//!     println!("{} {}", ancestor.code, ancestor.description);
//! }
//! ```

use std::collections::{HashMap, VecDeque};

use ec_types::{ClassificationNode, EcCode, EcLevel, Replacement, TreeNode};

use crate::parser::{parse_records, RawRecord};
use crate::repair::repair;
use crate::types::{EcError, EcResult, NotFound, ParserConfig};

/// Immutable, queryable EC classification hierarchy.
///
/// Every node's ancestor chain is present. The index is never modified
/// after construction; a refresh builds a new one.
pub struct HierarchyIndex {
    /// Nodes indexed by code.
    nodes: HashMap<EcCode, ClassificationNode>,
    /// Child codes by parent code (`None` = root), sorted ascending.
    children: HashMap<Option<EcCode>, Vec<EcCode>>,
    /// Codes per level (index = depth - 1), sorted ascending.
    by_level: [Vec<EcCode>; 4],
    /// History notes for retired codes; keys need not be in `nodes`.
    replacements: HashMap<EcCode, Replacement>,
}

impl std::fmt::Debug for HierarchyIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchyIndex")
            .field("nodes", &self.nodes.len())
            .field("classes", &self.by_level[0].len())
            .field("subclasses", &self.by_level[1].len())
            .field("sub_subclasses", &self.by_level[2].len())
            .field("serials", &self.by_level[3].len())
            .field("replacements", &self.replacements.len())
            .finish()
    }
}

impl HierarchyIndex {
    /// Builds an index from a complete node set.
    ///
    /// # Errors
    /// Fails with [`EcError::DuplicateCode`] or [`EcError::Orphan`] if the
    /// set repeats a code or lacks an ancestor. Node sets produced by the
    /// repairer never do.
    pub fn from_nodes(nodes: impl IntoIterator<Item = ClassificationNode>) -> EcResult<Self> {
        let mut by_code = HashMap::new();
        let mut children: HashMap<Option<EcCode>, Vec<EcCode>> = HashMap::new();
        let mut by_level: [Vec<EcCode>; 4] = Default::default();

        for node in nodes {
            let code = node.code;
            if by_code.insert(code, node).is_some() {
                return Err(EcError::DuplicateCode { code });
            }
            children.entry(code.parent()).or_default().push(code);
            by_level[code.depth() - 1].push(code);
        }

        for code in by_code.keys() {
            if let Some(parent) = code.parent() {
                if !by_code.contains_key(&parent) {
                    return Err(EcError::Orphan {
                        code: *code,
                        parent,
                    });
                }
            }
        }

        for list in children.values_mut() {
            list.sort_unstable();
        }
        for list in by_level.iter_mut() {
            list.sort_unstable();
        }

        Ok(Self {
            nodes: by_code,
            children,
            by_level,
            replacements: HashMap::new(),
        })
    }

    /// Attaches replacement history, merging entries for the same code.
    pub fn with_replacements(mut self, entries: impl IntoIterator<Item = Replacement>) -> Self {
        for entry in entries {
            match self.replacements.get_mut(&entry.code) {
                Some(existing) => existing.merge(entry),
                None => {
                    self.replacements.insert(entry.code, entry);
                }
            }
        }
        self
    }

    /// Repairs parsed records and builds the index.
    pub fn from_records(records: impl IntoIterator<Item = RawRecord>) -> EcResult<Self> {
        let (nodes, _) = repair(records);
        Self::from_nodes(nodes)
    }

    /// Parses, repairs and indexes a raw listing.
    pub fn from_listing(text: &str, config: &ParserConfig) -> EcResult<Self> {
        Self::from_records(parse_records(text, config)?)
    }

    /// Looks up a node by exact code. No prefix or wildcard expansion.
    pub fn lookup(&self, code: &EcCode) -> Result<&ClassificationNode, NotFound> {
        self.nodes.get(code).ok_or(NotFound { code: *code })
    }

    /// Returns true if the code is present.
    pub fn contains(&self, code: &EcCode) -> bool {
        self.nodes.contains_key(code)
    }

    /// Normalizes a loosely written EC number and looks it up.
    ///
    /// `"1.2.-.-"`, `"1.2"` and `"1.2.."` all resolve to the subclass `1.2`.
    pub fn resolve(&self, raw: &str) -> Option<&ClassificationNode> {
        EcCode::normalize(raw).and_then(|code| self.nodes.get(&code))
    }

    /// Returns the ancestors of a node, class level first, excluding the node.
    pub fn ancestors(&self, code: &EcCode) -> Result<Vec<&ClassificationNode>, NotFound> {
        self.lookup(code)?;
        Ok(code
            .ancestors()
            .iter()
            .filter_map(|a| self.nodes.get(a))
            .collect())
    }

    /// Returns the ancestors followed by the node itself.
    pub fn lineage(&self, code: &EcCode) -> Result<Vec<&ClassificationNode>, NotFound> {
        let mut chain = self.ancestors(code)?;
        chain.push(self.lookup(code)?);
        Ok(chain)
    }

    /// Returns the direct children of a node, ordered by code.
    ///
    /// Empty for a leaf and for an absent code; use [`contains`](Self::contains)
    /// to tell them apart.
    pub fn children(&self, code: &EcCode) -> Vec<&ClassificationNode> {
        self.children_of(Some(*code))
    }

    /// Returns the class-level nodes, ordered by code.
    pub fn roots(&self) -> Vec<&ClassificationNode> {
        self.children_of(None)
    }

    /// Returns every node below `code`, breadth-first.
    pub fn descendants(&self, code: &EcCode) -> Vec<&ClassificationNode> {
        let mut result = Vec::new();
        let mut queue: VecDeque<EcCode> = VecDeque::from([*code]);

        while let Some(current) = queue.pop_front() {
            for child in self.children(&current) {
                queue.push_back(child.code);
                result.push(child);
            }
        }
        result
    }

    /// Returns every node at a level, ordered by code.
    pub fn all_at_level(&self, level: EcLevel) -> Vec<&ClassificationNode> {
        self.by_level[level.depth() - 1]
            .iter()
            .filter_map(|c| self.nodes.get(c))
            .collect()
    }

    /// Returns the number of nodes at a level.
    pub fn count_at_level(&self, level: EcLevel) -> usize {
        self.by_level[level.depth() - 1].len()
    }

    /// Returns every node ordered by code.
    pub fn nodes(&self) -> Vec<&ClassificationNode> {
        let mut nodes: Vec<&ClassificationNode> = self.nodes.values().collect();
        nodes.sort_unstable_by(|a, b| a.code.cmp(&b.code));
        nodes
    }

    /// Flattens the hierarchy breadth-first from each class, in code order.
    pub fn tree_nodes(&self) -> Vec<TreeNode> {
        let mut result = Vec::with_capacity(self.nodes.len());
        for root in self.roots() {
            result.push(TreeNode::from(root));
            result.extend(self.descendants(&root.code).into_iter().map(TreeNode::from));
        }
        result
    }

    /// Returns the history notes for a transferred or deleted code.
    ///
    /// Retired codes are usually absent from the hierarchy itself, so this
    /// does not require [`contains`](Self::contains) to hold.
    pub fn replaced(&self, code: &EcCode) -> Option<&Replacement> {
        self.replacements.get(code)
    }

    /// Returns every replacement entry ordered by code.
    pub fn replacements(&self) -> Vec<&Replacement> {
        let mut entries: Vec<&Replacement> = self.replacements.values().collect();
        entries.sort_unstable_by(|a, b| a.code.cmp(&b.code));
        entries
    }

    /// Returns the total number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the index holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of synthesized nodes.
    pub fn synthesized_count(&self) -> usize {
        self.nodes.values().filter(|n| n.synthesized).count()
    }

    fn children_of(&self, parent: Option<EcCode>) -> Vec<&ClassificationNode> {
        self.children
            .get(&parent)
            .map(|codes| codes.iter().filter_map(|c| self.nodes.get(c)).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> EcCode {
        s.parse().unwrap()
    }

    fn build(lines: &[(&str, &str)]) -> HierarchyIndex {
        HierarchyIndex::from_records(
            lines
                .iter()
                .map(|(c, d)| RawRecord::new(code(c), *d))
                .collect::<Vec<_>>(),
        )
        .unwrap()
    }

    fn codes(nodes: &[&ClassificationNode]) -> Vec<String> {
        nodes.iter().map(|n| n.code.to_string()).collect()
    }

    #[test]
    fn test_ancestors_of_lone_leaf() {
        let index = build(&[("1.1.1.1", "desc")]);

        let ancestors = index.ancestors(&code("1.1.1.1")).unwrap();
        assert_eq!(codes(&ancestors), vec!["1.-.-.-", "1.1.-.-", "1.1.1.-"]);
        assert!(ancestors.iter().all(|n| n.synthesized && n.description.is_empty()));

        let lineage = index.lineage(&code("1.1.1.1")).unwrap();
        assert_eq!(lineage.len(), 4);
        assert_eq!(lineage[3].description, "desc");
    }

    #[test]
    fn test_children_are_one_level_deeper() {
        let index = build(&[("1.1.1.1", "a"), ("1.1.2.1", "b")]);

        let children = index.children(&code("1.1.-.-"));
        assert_eq!(codes(&children), vec!["1.1.1.-", "1.1.2.-"]);
        assert!(index.children(&code("1.1.1.1")).is_empty());
        assert!(index.children(&code("9.9.-.-")).is_empty());
        assert!(!index.contains(&code("9.9.-.-")));
    }

    #[test]
    fn test_lookup_absent_is_not_found() {
        let index = build(&[("1.1.1.1", "a")]);
        let before = index.len();

        let err = index.lookup(&code("5.4.99.99")).unwrap_err();
        assert_eq!(err.code, code("5.4.99.99"));
        assert!(index.ancestors(&code("5.4.99.99")).is_err());
        assert_eq!(index.len(), before);
    }

    #[test]
    fn test_lookup_is_exact() {
        let index = build(&[("1.1.1.1", "a")]);
        assert!(index.lookup(&code("1.1.1.-")).is_ok());
        assert!(index.lookup(&code("1.1.1.2")).is_err());
    }

    #[test]
    fn test_all_at_level_numeric_order() {
        let index = build(&[("1.10.1.1", "x"), ("1.2.1.1", "y"), ("1.9.1.1", "z")]);
        let subclasses = index.all_at_level(EcLevel::Subclass);
        assert_eq!(codes(&subclasses), vec!["1.2.-.-", "1.9.-.-", "1.10.-.-"]);
        assert_eq!(index.count_at_level(EcLevel::Serial), 3);
        assert_eq!(index.count_at_level(EcLevel::Class), 1);
    }

    #[test]
    fn test_resolve_loose_codes() {
        let index = build(&[("1.2.3.4", "oxalate oxidase")]);
        assert_eq!(index.resolve("1.2.3.4").unwrap().description, "oxalate oxidase");
        for loose in ["1.-.-.-", "1.-", "1.2.-.-", "1.2.3.-", "1.2.."] {
            assert!(index.resolve(loose).is_some(), "{loose}");
        }
        assert!(index.resolve("garbage").is_none());
    }

    #[test]
    fn test_descendants_and_tree_nodes() {
        let index = build(&[
            ("2.-.-.-", "Transferases"),
            ("1.-.-.-", "Oxidoreductases"),
            ("1.1.1.1", "alcohol dehydrogenase"),
            ("1.2.3.4", "oxalate oxidase"),
        ]);

        let below = index.descendants(&code("1.-.-.-"));
        assert_eq!(
            codes(&below),
            vec!["1.1.-.-", "1.2.-.-", "1.1.1.-", "1.2.3.-", "1.1.1.1", "1.2.3.4"]
        );

        let tree = index.tree_nodes();
        assert_eq!(tree.len(), index.len());
        assert_eq!(tree[0].id, "1");
        assert_eq!(tree[0].depth, 0);
        assert_eq!(tree.last().unwrap().id, "2");
        let leaf = tree.iter().find(|t| t.id == "1.2.3.4").unwrap();
        assert_eq!(leaf.parents, vec!["1.2.3".to_string()]);
        assert_eq!(leaf.depth, 3);
    }

    #[test]
    fn test_from_nodes_rejects_orphans_and_duplicates() {
        let orphan = vec![ClassificationNode::new(code("1.1.-.-"), "no class")];
        assert!(matches!(
            HierarchyIndex::from_nodes(orphan),
            Err(EcError::Orphan { .. })
        ));

        let duplicate = vec![
            ClassificationNode::new(code("1.-.-.-"), "a"),
            ClassificationNode::new(code("1.-.-.-"), "b"),
        ];
        assert!(matches!(
            HierarchyIndex::from_nodes(duplicate),
            Err(EcError::DuplicateCode { .. })
        ));
    }

    #[test]
    fn test_every_node_has_complete_chain() {
        let index = build(&[("3.4.21.5", "thrombin"), ("7.6.2.16", "ABC-type putrescine transporter")]);
        for node in index.nodes() {
            for ancestor in node.code.ancestors() {
                assert!(index.contains(&ancestor));
            }
        }
        assert_eq!(index.synthesized_count(), 6);
    }

    #[test]
    fn test_from_listing_idempotent() {
        let text = "1.1.1.1\talcohol dehydrogenase\n1.-.-.-\tOxidoreductases\n2.7.1.1\thexokinase\n";
        let first = HierarchyIndex::from_listing(text, &ParserConfig::default()).unwrap();
        let second = HierarchyIndex::from_listing(text, &ParserConfig::default()).unwrap();
        assert_eq!(first.nodes(), second.nodes());
    }

    #[test]
    fn test_index_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HierarchyIndex>();
    }

    #[test]
    fn test_replaced_codes() {
        let index = build(&[("1.1.1.1", "alcohol dehydrogenase")]).with_replacements([
            Replacement::new(code("1.1.1.5"), "Now EC 1.1.1.303", ""),
            Replacement::new(code("1.1.1.5"), "", "deleted 2013"),
            Replacement::new(code("1.1.1.1"), "", "modified 1976"),
        ]);

        let retired = index.replaced(&code("1.1.1.5")).unwrap();
        assert_eq!(retired.note.as_deref(), Some("Now EC 1.1.1.303"));
        assert_eq!(retired.history.as_deref(), Some("deleted 2013"));
        assert!(!index.contains(&code("1.1.1.5")));

        assert!(index.replaced(&code("1.1.1.1")).is_some());
        assert!(index.replaced(&code("2.7.1.1")).is_none());

        let codes: Vec<String> = index.replacements().iter().map(|r| r.code.to_string()).collect();
        assert_eq!(codes, vec!["1.1.1.1", "1.1.1.5"]);
    }
}

//! Classification hierarchy node types.

use crate::{EcCode, EcLevel};

/// One entry in the EC classification hierarchy.
///
/// Nodes are either loaded from the source listing or synthesized to fill
/// a gap implied by a deeper entry. Synthesized nodes have an empty
/// description.
///
/// # Examples
///
/// ```
/// use ec_types::{ClassificationNode, EcCode, EcLevel};
///
/// let code: EcCode = "1.1.1.1".parse().unwrap();
/// let node = ClassificationNode::new(code, "alcohol dehydrogenase");
/// assert_eq!(node.level(), EcLevel::Serial);
/// assert!(!node.synthesized);
///
/// let gap = ClassificationNode::placeholder(code.parent().unwrap());
/// assert!(gap.synthesized);
/// assert!(gap.description.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ClassificationNode {
    /// The EC number of this node.
    pub code: EcCode,
    /// Human-readable label; may be empty.
    pub description: String,
    /// True if this node was inferred rather than read from the source.
    pub synthesized: bool,
}

impl ClassificationNode {
    /// Creates a node read from the source listing.
    pub fn new(code: EcCode, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            synthesized: false,
        }
    }

    /// Creates a synthesized placeholder with an empty description.
    pub fn placeholder(code: EcCode) -> Self {
        Self {
            code,
            description: String::new(),
            synthesized: true,
        }
    }

    /// Returns the level of this node, derived from its code.
    pub fn level(&self) -> EcLevel {
        self.code.level()
    }

    /// Returns the parent code, or `None` for a class node.
    pub fn parent_code(&self) -> Option<EcCode> {
        self.code.parent()
    }

    /// Returns true if the node has a non-empty description.
    pub fn has_description(&self) -> bool {
        !self.description.is_empty()
    }
}

/// A flattened hierarchy entry for tree exports.
///
/// Identifiers use the compact form (`1.2` rather than `1.2.-.-`).
/// `depth` is zero for class nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TreeNode {
    /// Compact EC number.
    pub id: String,
    /// Display name (the node description).
    pub name: String,
    /// Compact parent EC number; empty for class nodes.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Vec::is_empty")
    )]
    pub parents: Vec<String>,
    /// Distance from the class level.
    pub depth: usize,
}

impl From<&ClassificationNode> for TreeNode {
    fn from(node: &ClassificationNode) -> Self {
        Self {
            id: node.code.compact(),
            name: node.description.clone(),
            parents: node.parent_code().map(|p| p.compact()).into_iter().collect(),
            depth: node.code.depth() - 1,
        }
    }
}

/// History notes for an EC number that was transferred or deleted.
///
/// Either field may be missing; a note usually names the replacement
/// (`"Now EC 1.1.1.37"`) and the history records when the change was made.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Replacement {
    /// The retired EC number.
    pub code: EcCode,
    /// Free-text note, typically naming the replacement.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub note: Option<String>,
    /// Free-text change history.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub history: Option<String>,
}

impl Replacement {
    /// Creates an entry, treating empty strings as absent.
    pub fn new(code: EcCode, note: impl Into<String>, history: impl Into<String>) -> Self {
        Self {
            code,
            note: non_empty(note.into()),
            history: non_empty(history.into()),
        }
    }

    /// Returns true if neither a note nor a history is present.
    pub fn is_empty(&self) -> bool {
        self.note.is_none() && self.history.is_none()
    }

    /// Fills in fields from a later entry for the same code.
    ///
    /// Present fields of `other` win; absent ones keep the current value.
    pub fn merge(&mut self, other: Replacement) {
        if other.note.is_some() {
            self.note = other.note;
        }
        if other.history.is_some() {
            self.history = other.history;
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(s: &str) -> EcCode {
        s.parse().unwrap()
    }

    #[test]
    fn test_tree_node_from_class() {
        let node = ClassificationNode::new(code("3.-.-.-"), "Hydrolases");
        let tree = TreeNode::from(&node);
        assert_eq!(tree.id, "3");
        assert_eq!(tree.depth, 0);
        assert!(tree.parents.is_empty());
    }

    #[test]
    fn test_tree_node_from_serial() {
        let node = ClassificationNode::new(code("3.4.21.5"), "thrombin");
        let tree = TreeNode::from(&node);
        assert_eq!(tree.id, "3.4.21.5");
        assert_eq!(tree.parents, vec!["3.4.21".to_string()]);
        assert_eq!(tree.depth, 3);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_node_json_shape() {
        let node = ClassificationNode::placeholder(code("1.1.-.-"));
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(value["code"], "1.1.-.-");
        assert_eq!(value["description"], "");
        assert_eq!(value["synthesized"], true);

        let root = TreeNode::from(&ClassificationNode::new(code("1.-.-.-"), "Oxidoreductases"));
        let value = serde_json::to_value(&root).unwrap();
        assert!(value.get("parents").is_none());
    }

    #[test]
    fn test_replacement_empty_fields() {
        let entry = Replacement::new(code("1.1.1.5"), "Now EC 1.1.1.303", "");
        assert_eq!(entry.note.as_deref(), Some("Now EC 1.1.1.303"));
        assert!(entry.history.is_none());
        assert!(Replacement::new(code("1.1.1.5"), " ", "").is_empty());
    }

    #[test]
    fn test_replacement_merge_keeps_absent_fields() {
        let mut entry = Replacement::new(code("1.1.1.5"), "Now EC 1.1.1.303", "");
        entry.merge(Replacement::new(code("1.1.1.5"), "", "deleted 2013"));
        assert_eq!(entry.note.as_deref(), Some("Now EC 1.1.1.303"));
        assert_eq!(entry.history.as_deref(), Some("deleted 2013"));
    }
}

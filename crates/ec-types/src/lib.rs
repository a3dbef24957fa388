//! # ec-types
//!
//! Type definitions for the Enzyme Commission (EC) classification hierarchy.
//!
//! The EC scheme is a four-level numeric taxonomy
//! (class.subclass.sub-subclass.serial). This crate provides the code,
//! level, node and replacement-history types shared by the loader and its callers.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!   EC numbers serialize as their dotted string form.
//!
//! ## Usage
//!
//! ```rust
//! use ec_types::{ClassificationNode, EcCode, EcLevel};
//!
//! let code: EcCode = "3.4.21.5".parse().unwrap();
//! assert_eq!(code.level(), EcLevel::Serial);
//! assert_eq!(code.parent().unwrap().to_string(), "3.4.21.-");
//!
//! let node = ClassificationNode::new(code, "thrombin");
//! assert_eq!(node.level().depth(), 4);
//! ```

#![warn(missing_docs)]

mod code;
mod enums;
mod node;

// Re-export all public types at crate root
pub use code::{EcCode, EcCodeParseError, MAX_DEPTH, WILDCARD};
pub use enums::EcLevel;
pub use node::{ClassificationNode, Replacement, TreeNode};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        let code: EcCode = "1.1.1.1".parse().unwrap();
        let _level = EcLevel::Serial;
        let _node = ClassificationNode::new(code, "alcohol dehydrogenase");
        let _tree = TreeNode::from(&_node);
        assert_eq!(WILDCARD, "-");
        assert_eq!(MAX_DEPTH, 4);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let node = ClassificationNode::new("1.1.1.1".parse().unwrap(), "alcohol dehydrogenase");

        let json = serde_json::to_string(&node).unwrap();
        let parsed: ClassificationNode = serde_json::from_str(&json).unwrap();
        assert_eq!(node, parsed);
    }
}

//! Enzyme classification level enumeration.

use std::fmt;

/// Level of a node in the EC hierarchy.
///
/// The implicit root sits above `Class` and is never represented.
///
/// # Examples
///
/// ```
/// use ec_types::EcLevel;
///
/// assert_eq!(EcLevel::from_depth(3), Some(EcLevel::SubSubclass));
/// assert_eq!(EcLevel::Serial.depth(), 4);
/// assert_eq!(EcLevel::Class.child(), Some(EcLevel::Subclass));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EcLevel {
    /// First component, e.g. `1.-.-.-` (Oxidoreductases).
    Class,
    /// Second component, e.g. `1.1.-.-`.
    Subclass,
    /// Third component, e.g. `1.1.1.-`.
    SubSubclass,
    /// Fourth component, an individual enzyme entry.
    Serial,
}

impl EcLevel {
    /// All levels from least to most specific.
    pub const ALL: [EcLevel; 4] = [
        EcLevel::Class,
        EcLevel::Subclass,
        EcLevel::SubSubclass,
        EcLevel::Serial,
    ];

    /// Creates a level from its depth (1-4).
    ///
    /// Returns `None` for any other depth.
    pub fn from_depth(depth: usize) -> Option<Self> {
        depth
            .checked_sub(1)
            .and_then(|i| Self::ALL.get(i))
            .copied()
    }

    /// Returns the depth of this level (1-4).
    pub fn depth(self) -> usize {
        match self {
            Self::Class => 1,
            Self::Subclass => 2,
            Self::SubSubclass => 3,
            Self::Serial => 4,
        }
    }

    /// Returns the next more specific level.
    pub fn child(self) -> Option<Self> {
        Self::from_depth(self.depth() + 1)
    }

    /// Returns the next less specific level, or `None` for `Class`.
    pub fn parent(self) -> Option<Self> {
        Self::from_depth(self.depth() - 1)
    }

    /// Returns a human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Subclass => "subclass",
            Self::SubSubclass => "sub-subclass",
            Self::Serial => "serial",
        }
    }
}

impl fmt::Display for EcLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth_roundtrip() {
        for level in EcLevel::ALL {
            assert_eq!(EcLevel::from_depth(level.depth()), Some(level));
        }
        assert_eq!(EcLevel::from_depth(0), None);
        assert_eq!(EcLevel::from_depth(5), None);
    }

    #[test]
    fn test_neighbours() {
        assert_eq!(EcLevel::Class.parent(), None);
        assert_eq!(EcLevel::Serial.child(), None);
        assert_eq!(EcLevel::Serial.parent(), Some(EcLevel::SubSubclass));
    }
}

//! Enzyme Commission number type.
//!
//! An EC number has four dot-separated components (class, subclass,
//! sub-subclass, serial). Unassigned trailing components are written with
//! the wildcard marker `-`, so `1.1.-.-` is the subclass "1.1".

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::EcLevel;

/// Number of components in a fully written EC number.
pub const MAX_DEPTH: usize = 4;

/// Marker for an unassigned trailing component.
pub const WILDCARD: &str = "-";

/// Error type for EC number parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcCodeParseError {
    /// The code does not have exactly four components.
    WrongComponentCount(String),
    /// A component is neither a non-negative integer nor the wildcard.
    InvalidComponent {
        /// The full code being parsed.
        code: String,
        /// The offending component.
        component: String,
    },
    /// A concrete component follows a wildcard.
    InteriorWildcard(String),
    /// Every component is a wildcard (the implicit root is never listed).
    AllWildcard(String),
}

impl fmt::Display for EcCodeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongComponentCount(s) => {
                write!(f, "invalid EC number '{}': expected four dot-separated components", s)
            }
            Self::InvalidComponent { code, component } => {
                write!(f, "invalid EC number '{}': bad component '{}'", code, component)
            }
            Self::InteriorWildcard(s) => {
                write!(f, "invalid EC number '{}': wildcard followed by a number", s)
            }
            Self::AllWildcard(s) => write!(f, "invalid EC number '{}': no assigned components", s),
        }
    }
}

impl std::error::Error for EcCodeParseError {}

/// An Enzyme Commission number at any level of specificity.
///
/// Components past the code's level are wildcards. Codes compare
/// component-wise as integers, and a wildcard sorts after every concrete
/// value at the same position.
///
/// # Examples
///
/// ```
/// use ec_types::{EcCode, EcLevel};
///
/// let code: EcCode = "1.10.1.-".parse().unwrap();
/// assert_eq!(code.level(), EcLevel::SubSubclass);
/// assert_eq!(code.to_string(), "1.10.1.-");
/// assert_eq!(code.compact(), "1.10.1");
///
/// let earlier: EcCode = "1.2.1.1".parse().unwrap();
/// assert!(earlier < code);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EcCode {
    // Positions at or past `depth` are always zero.
    parts: [u32; MAX_DEPTH],
    depth: u8,
}

impl EcCode {
    /// Creates a code from its assigned components.
    ///
    /// Returns `None` unless 1 to 4 components are given.
    pub fn from_components(components: &[u32]) -> Option<Self> {
        if components.is_empty() || components.len() > MAX_DEPTH {
            return None;
        }
        let mut parts = [0u32; MAX_DEPTH];
        parts[..components.len()].copy_from_slice(components);
        Some(Self {
            parts,
            depth: components.len() as u8,
        })
    }

    /// Leniently normalizes a loosely written EC number.
    ///
    /// Takes the leading all-digit components and drops everything from the
    /// first wildcard, blank or otherwise non-numeric component onwards.
    ///
    /// ```
    /// use ec_types::EcCode;
    ///
    /// assert_eq!(EcCode::normalize("1.-.-.-").unwrap().compact(), "1");
    /// assert_eq!(EcCode::normalize("1.-").unwrap().compact(), "1");
    /// assert_eq!(EcCode::normalize("1.2..").unwrap().compact(), "1.2");
    /// assert!(EcCode::normalize("-.-.-.-").is_none());
    /// ```
    pub fn normalize(raw: &str) -> Option<Self> {
        let parts: Vec<u32> = raw
            .trim()
            .split('.')
            .map(str::trim)
            .take_while(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
            .take(MAX_DEPTH)
            .map_while(|f| f.parse().ok())
            .collect();
        Self::from_components(&parts)
    }

    /// Returns the level of this code.
    pub fn level(&self) -> EcLevel {
        match self.depth {
            1 => EcLevel::Class,
            2 => EcLevel::Subclass,
            3 => EcLevel::SubSubclass,
            _ => EcLevel::Serial,
        }
    }

    /// Returns the number of assigned components (1-4).
    pub fn depth(&self) -> usize {
        self.depth as usize
    }

    /// Returns the assigned components.
    pub fn components(&self) -> &[u32] {
        &self.parts[..self.depth()]
    }

    /// Returns the component at `index`, or `None` for a wildcard position.
    pub fn component(&self, index: usize) -> Option<u32> {
        self.components().get(index).copied()
    }

    /// Returns true if this is a fully specified (serial level) code.
    pub fn is_complete(&self) -> bool {
        self.depth() == MAX_DEPTH
    }

    /// Returns this code cut back to `depth` components.
    ///
    /// Returns `None` if `depth` is zero or deeper than this code.
    pub fn truncated(&self, depth: usize) -> Option<Self> {
        if depth == 0 || depth > self.depth() {
            return None;
        }
        Self::from_components(&self.parts[..depth])
    }

    /// Returns the parent code, or `None` for a class (level 1) code.
    ///
    /// The parent replaces the last assigned component with a wildcard.
    pub fn parent(&self) -> Option<Self> {
        self.truncated(self.depth().checked_sub(1)?)
    }

    /// Returns every ancestor from the class level down to (not including)
    /// this code.
    pub fn ancestors(&self) -> Vec<Self> {
        (1..self.depth()).filter_map(|d| self.truncated(d)).collect()
    }

    /// Returns true if `self` is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &EcCode) -> bool {
        self.depth < other.depth && other.truncated(self.depth()) == Some(*self)
    }

    /// Returns the wildcard-free form, e.g. `1.2` for `1.2.-.-`.
    pub fn compact(&self) -> String {
        self.components()
            .iter()
            .map(|p| p.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    fn sort_key(&self) -> [(bool, u32); MAX_DEPTH] {
        let mut key = [(true, 0); MAX_DEPTH];
        for (slot, part) in key.iter_mut().zip(self.components()) {
            *slot = (false, *part);
        }
        key
    }
}

impl Ord for EcCode {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sort_key().cmp(&other.sort_key())
    }
}

impl PartialOrd for EcCode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for EcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..MAX_DEPTH {
            if i > 0 {
                f.write_str(".")?;
            }
            match self.component(i) {
                Some(part) => write!(f, "{}", part)?,
                None => f.write_str(WILDCARD)?,
            }
        }
        Ok(())
    }
}

impl FromStr for EcCode {
    type Err = EcCodeParseError;

    /// Parses the strict four-component form, e.g. `1.1.1.1` or `1.1.-.-`.
    ///
    /// Whitespace around each component is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.trim().split('.').map(str::trim).collect();
        if fields.len() != MAX_DEPTH {
            return Err(EcCodeParseError::WrongComponentCount(s.to_string()));
        }

        let mut parts = Vec::with_capacity(MAX_DEPTH);
        let mut seen_wildcard = false;
        for field in fields {
            if field == WILDCARD {
                seen_wildcard = true;
                continue;
            }
            if seen_wildcard {
                return Err(EcCodeParseError::InteriorWildcard(s.to_string()));
            }
            let invalid = || EcCodeParseError::InvalidComponent {
                code: s.to_string(),
                component: field.to_string(),
            };
            if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            parts.push(field.parse::<u32>().map_err(|_| invalid())?);
        }

        Self::from_components(&parts).ok_or_else(|| EcCodeParseError::AllWildcard(s.to_string()))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for EcCode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for EcCode {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <String as serde::Deserialize>::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

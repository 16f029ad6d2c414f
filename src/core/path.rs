//! Structural field paths
//!
//! A [`FieldPath`] identifies a field's position in the value tree. String
//! segments name object properties and group labels; integer segments are
//! group instance ids.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One step in a [`FieldPath`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Property name or group label
    Key(String),
    /// Group instance id
    Index(u64),
}

impl PathSegment {
    pub fn as_key(&self) -> Option<&str> {
        match self {
            PathSegment::Key(k) => Some(k),
            PathSegment::Index(_) => None,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => write!(f, "{}", k),
            PathSegment::Index(i) => write!(f, "{}", i),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        PathSegment::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        PathSegment::Key(key)
    }
}

impl From<u64> for PathSegment {
    fn from(index: u64) -> Self {
        PathSegment::Index(index)
    }
}

/// Ordered sequence of segments from the form root to a field
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// The empty path (the form root)
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a segment, returning the extended path
    pub fn join(&self, segment: impl Into<PathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Last segment, if any
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// The last segment when it is a key (used as a title fallback)
    pub fn last_key(&self) -> Option<&str> {
        self.0.last().and_then(PathSegment::as_key)
    }

    /// True if `self` equals `prefix` or lies beneath it
    pub fn starts_with(&self, prefix: &FieldPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        let parts: Vec<String> = self.0.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", parts.join("/"))
    }
}

impl FromStr for FieldPath {
    type Err = std::convert::Infallible;

    /// Parse `a/b/0/c`; all-digit segments become instance indices
    ///
    /// Property names made only of digits need the tree to disambiguate;
    /// see [`FieldDescriptor::lookup`](crate::schema::compiler::FieldDescriptor::lookup).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments = s
            .split('/')
            .filter(|part| !part.is_empty())
            .map(|part| match part.parse::<u64>() {
                Ok(i) if part.chars().all(|c| c.is_ascii_digit()) => PathSegment::Index(i),
                _ => PathSegment::Key(part.to_string()),
            })
            .collect();
        Ok(Self(segments))
    }
}

impl<S: Into<PathSegment>> FromIterator<S> for FieldPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<PathSegment>> for FieldPath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let path: FieldPath = "dynamic/Address/0/street".parse().unwrap();
        assert_eq!(path.len(), 4);
        assert_eq!(path.segments()[2], PathSegment::Index(0));
        assert_eq!(path.to_string(), "dynamic/Address/0/street");
    }

    #[test]
    fn test_root_display() {
        assert_eq!(FieldPath::root().to_string(), "/");
        let parsed: FieldPath = "/".parse().unwrap();
        assert!(parsed.is_root());
    }

    #[test]
    fn test_join_and_prefix() {
        let slot = FieldPath::root().join("dynamic");
        let inst = slot.join("Address").join(3u64);
        assert!(inst.starts_with(&slot));
        assert!(!slot.starts_with(&inst));
        assert_eq!(inst.last(), Some(&PathSegment::Index(3)));
        assert_eq!(slot.last_key(), Some("dynamic"));
    }

    #[test]
    fn test_serializes_as_mixed_array() {
        let path: FieldPath = ["dynamic", "Address"].into_iter().collect();
        let path = path.join(1u64);
        let json = serde_json::to_value(&path).unwrap();
        assert_eq!(json, serde_json::json!(["dynamic", "Address", 1]));

        let back: FieldPath = serde_json::from_value(json).unwrap();
        assert_eq!(back, path);
    }
}

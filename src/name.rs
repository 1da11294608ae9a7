//! # Service names.
//!
//! [`ServiceName`] is a hierarchical, case-sensitive identifier for a service
//! within a [`Container`](crate::Container): a sequence of non-empty segments,
//! displayed dot-joined (`"net.http.listener"`).
//!
//! ## Rules
//! - Unique within a container among non-removed services.
//! - Immutable and cheap to clone (segments behind an `Arc`).
//! - Totally ordered (segment-wise), so diagnostics and stability reports are
//!   deterministic.

use std::fmt;
use std::sync::Arc;

/// Hierarchical service identifier.
///
/// ## Example
/// ```rust
/// use servisor::ServiceName;
///
/// let base = ServiceName::of("net");
/// let child = base.append("http");
/// assert_eq!(child.to_string(), "net.http");
/// assert_eq!(child, ServiceName::parse("net.http"));
/// assert!(base < child);
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServiceName {
    segments: Arc<[Box<str>]>,
}

impl ServiceName {
    /// Creates a single-segment name.
    pub fn of(segment: impl AsRef<str>) -> Self {
        Self {
            segments: Arc::from([Box::from(segment.as_ref())]),
        }
    }

    /// Creates a name from an ordered list of segments.
    ///
    /// Empty segments are skipped; an empty input yields the empty name.
    pub fn of_parts<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let segments: Vec<Box<str>> = parts
            .into_iter()
            .map(|s| Box::from(s.as_ref()))
            .filter(|s: &Box<str>| !s.is_empty())
            .collect();
        Self {
            segments: segments.into(),
        }
    }

    /// Parses a dot-joined name (`"a.b.c"`) into its segments.
    pub fn parse(name: impl AsRef<str>) -> Self {
        Self::of_parts(name.as_ref().split('.'))
    }

    /// Returns a new name with `segment` appended.
    pub fn append(&self, segment: impl AsRef<str>) -> Self {
        let mut segments: Vec<Box<str>> = self.segments.to_vec();
        segments.push(Box::from(segment.as_ref()));
        Self {
            segments: segments.into(),
        }
    }

    /// Returns the segments of this name, outermost first.
    pub fn segments(&self) -> &[Box<str>] {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true for the empty name (zero segments).
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns true if `self` is `other` or an ancestor of `other`.
    pub fn is_parent_of(&self, other: &ServiceName) -> bool {
        other.segments.len() >= self.segments.len()
            && other.segments[..self.segments.len()] == self.segments[..]
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(seg)?;
        }
        Ok(())
    }
}

impl fmt::Debug for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceName({self})")
    }
}

impl From<&str> for ServiceName {
    fn from(name: &str) -> Self {
        ServiceName::parse(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_joins_segments() {
        let name = ServiceName::of_parts(["a", "b", "c"]);
        assert_eq!(name.to_string(), "a.b.c");
    }

    #[test]
    fn test_parse_round_trip() {
        let name = ServiceName::parse("net.http.listener");
        assert_eq!(name.len(), 3);
        assert_eq!(name, ServiceName::of("net").append("http").append("listener"));
    }

    #[test]
    fn test_ordering_is_segment_wise() {
        let a = ServiceName::parse("a");
        let ab = ServiceName::parse("a.b");
        let b = ServiceName::parse("b");
        assert!(a < ab);
        assert!(ab < b);
    }

    #[test]
    fn test_case_sensitive() {
        assert_ne!(ServiceName::of("first"), ServiceName::of("First"));
    }

    #[test]
    fn test_is_parent_of() {
        let parent = ServiceName::parse("a.b");
        assert!(parent.is_parent_of(&ServiceName::parse("a.b.c")));
        assert!(parent.is_parent_of(&parent.clone()));
        assert!(!parent.is_parent_of(&ServiceName::parse("a.c")));
    }
}

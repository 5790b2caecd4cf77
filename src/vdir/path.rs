//! Segment-based virtual paths.

use std::fmt;
use std::str::FromStr;

use crate::{DspaceError, Result};

/// Separator used when rendering a path.
pub const SEPARATOR: char = '\\';

/// A path in the virtual directory, stored as its segments.
///
/// Parsing accepts both `\` and `/`; rendering always uses [`SEPARATOR`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// Parse a path string. Empty paths and empty segments are rejected.
    pub fn parse(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(DspaceError::InvalidPath("path is empty".to_string()));
        }

        let segments: Vec<String> = s.split(['\\', '/']).map(str::to_string).collect();
        if segments.iter().any(String::is_empty) {
            return Err(DspaceError::InvalidPath(format!(
                "path has an empty segment: {s}"
            )));
        }

        Ok(Self { segments })
    }

    /// Build a path from segments. Returns `None` if any segment is empty or
    /// contains a separator, or if there are no segments.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        let valid = !segments.is_empty()
            && segments
                .iter()
                .all(|s| !s.is_empty() && !s.contains(['\\', '/']));
        valid.then_some(Self { segments })
    }

    /// The segments of this path.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Last segment.
    pub fn name(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Path without its last segment, or `None` for a single-segment path.
    pub fn parent(&self) -> Option<Self> {
        if self.segments.len() < 2 {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Returns true if `prefix` is this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &VirtualPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Append a segment.
    pub fn join(&self, segment: &str) -> Result<Self> {
        let mut joined = self.clone();
        joined.segments.extend(Self::parse(segment)?.segments);
        Ok(joined)
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            f.write_str(segment)?;
        }
        Ok(())
    }
}

impl FromStr for VirtualPath {
    type Err = DspaceError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backslash() {
        let path = VirtualPath::parse(r"root\job-1\dir\a.txt").unwrap();
        assert_eq!(path.segments(), &["root", "job-1", "dir", "a.txt"]);
        assert_eq!(path.name(), "a.txt");
        assert_eq!(path.depth(), 4);
    }

    #[test]
    fn test_parse_mixed_separators_render_canonical() {
        let path = VirtualPath::parse("root/job-1\\dir").unwrap();
        assert_eq!(path.to_string(), r"root\job-1\dir");
    }

    #[test]
    fn test_parse_rejects_empty() {
        assert!(matches!(
            VirtualPath::parse(""),
            Err(DspaceError::InvalidPath(_))
        ));
        assert!(matches!(
            VirtualPath::parse(r"root\\a"),
            Err(DspaceError::InvalidPath(_))
        ));
        assert!(VirtualPath::parse("root/").is_err());
    }

    #[test]
    fn test_parent() {
        let path = VirtualPath::parse(r"root\job-1\dir").unwrap();
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), r"root\job-1");
        assert_eq!(parent.name(), "job-1");
        assert!(VirtualPath::parse("root").unwrap().parent().is_none());
    }

    #[test]
    fn test_starts_with_is_segment_wise() {
        let job = VirtualPath::parse(r"root\job-1").unwrap();
        let inside = VirtualPath::parse(r"root\job-1\a").unwrap();
        let sibling = VirtualPath::parse(r"root\job-10\a").unwrap();

        assert!(inside.starts_with(&job));
        assert!(job.starts_with(&job));
        assert!(!sibling.starts_with(&job));
        assert!(!job.starts_with(&inside));
    }

    #[test]
    fn test_join_and_from_segments() {
        let path = VirtualPath::parse("root").unwrap().join("job-1").unwrap();
        assert_eq!(path, VirtualPath::from_segments(["root", "job-1"]).unwrap());
        assert!(VirtualPath::from_segments(Vec::<String>::new()).is_none());
        assert!(VirtualPath::from_segments(["a/b"]).is_none());
    }

    #[test]
    fn test_from_str() {
        let path: VirtualPath = r"root\x".parse().unwrap();
        assert_eq!(path.name(), "x");
    }
}

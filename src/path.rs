//! Paths from the document root down to a node.
use std::fmt;
use serde::Serialize;

/// One step into a container: a compound key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TagPath(Vec<PathSegment>);

const SEPARATOR: &str = " > ";
const ELLIPSIS: &str = "...";

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "[{index}]"),
        }
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_owned())
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl TagPath {
    pub fn root() -> Self {
        Self::default()
    }
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }
    pub fn push(&mut self, segment: PathSegment) {
        self.0.push(segment);
    }
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.0.pop()
    }
    /// Segments leading to the parent container (empty for a root child).
    pub fn parent(&self) -> &[PathSegment] {
        match self.0.split_last() {
            Some((_, parent)) => parent,
            None => &[],
        }
    }
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }
    /// Render as `a > b > ... > y > z` once the path is longer than
    /// `head + tail` segments.
    pub fn truncated(&self, head: usize, tail: usize) -> String {
        if self.0.len() <= head + tail {
            return self.to_string();
        }
        let mut parts: Vec<String> = Vec::with_capacity(head + tail + 1);
        parts.extend(self.0[..head].iter().map(ToString::to_string));
        parts.push(ELLIPSIS.to_owned());
        parts.extend(self.0[self.0.len() - tail..].iter().map(ToString::to_string));
        parts.join(SEPARATOR)
    }
}

impl fmt::Display for TagPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(SEPARATOR)?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<PathSegment> for TagPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(segments: &[PathSegment]) -> TagPath {
        segments.iter().cloned().collect()
    }

    #[test]
    fn renders_keys_and_indices() {
        let p = path(&["Data".into(), "Entities".into(), PathSegment::Index(3), "Pos".into()]);
        assert_eq!(p.to_string(), "Data > Entities > [3] > Pos");
    }

    #[test]
    fn short_paths_are_not_truncated() {
        let p = path(&["a".into(), "b".into(), "c".into(), "d".into()]);
        assert_eq!(p.truncated(2, 2), "a > b > c > d");
    }

    #[test]
    fn long_paths_keep_head_and_tail() {
        let p = path(&["a".into(), "b".into(), "c".into(), PathSegment::Index(0), "e".into()]);
        assert_eq!(p.truncated(2, 2), "a > b > ... > [0] > e");
    }

    #[test]
    fn parent_and_last() {
        let p = path(&["a".into(), PathSegment::Index(1)]);
        assert_eq!(p.parent(), &[PathSegment::from("a")]);
        assert_eq!(p.last(), Some(&PathSegment::Index(1)));
        assert!(TagPath::root().parent().is_empty());
    }
}

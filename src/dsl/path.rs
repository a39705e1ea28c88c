//! Field paths: dotted, bracketed locators into a document.

use std::fmt;

/// Name of the pseudo-segment that may open a path (`META().key`).
pub const META_SEGMENT: &str = "META()";

/// One dotted component of a field path, with its array indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    name: String,
    indices: Vec<usize>,
}

impl PathSegment {
    pub fn new(name: impl Into<String>) -> Self {
        PathSegment {
            name: name.into(),
            indices: Vec::new(),
        }
    }

    pub fn with_indices(name: impl Into<String>, indices: Vec<usize>) -> Self {
        PathSegment {
            name: name.into(),
            indices,
        }
    }

    /// Raw identifier text, without quoting or indices.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub(crate) fn push_index(&mut self, index: usize) {
        self.indices.push(index);
    }

    /// Whether the name can be written without backticks. `META()` is only
    /// recognized at the start of a path.
    fn is_bare(&self, first: bool) -> bool {
        if self.name == META_SEGMENT {
            return first;
        }
        let mut chars = self.name.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_') && !is_keyword(&self.name)
    }

    fn write(&self, f: &mut fmt::Formatter<'_>, first: bool) -> fmt::Result {
        if self.is_bare(first) {
            f.write_str(&self.name)?;
        } else {
            f.write_str("`")?;
            for c in self.name.chars() {
                match c {
                    '`' => f.write_str("\\`")?,
                    '\\' => f.write_str("\\\\")?,
                    other => write!(f, "{other}")?,
                }
            }
            f.write_str("`")?;
        }
        for index in &self.indices {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

/// Written as the leading segment of a path.
impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write(f, true)
    }
}

/// A non-empty sequence of segments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Returns `None` for an empty segment list.
    pub fn new(segments: Vec<PathSegment>) -> Option<Self> {
        if segments.is_empty() {
            None
        } else {
            Some(FieldPath { segments })
        }
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            segment.write(f, i == 0)?;
        }
        Ok(())
    }
}

/// Words the parser reserves; a field with one of these names must be quoted.
pub(crate) fn is_keyword(word: &str) -> bool {
    const KEYWORDS: [&str; 8] = ["AND", "OR", "NOT", "IS", "NULL", "EXISTS", "TRUE", "FALSE"];
    KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_segment_display() {
        let seg = PathSegment::with_indices("arrayPath", vec![1, 2]);
        assert_eq!(seg.to_string(), "arrayPath[1][2]");
    }

    #[test]
    fn quoted_segment_display() {
        assert_eq!(PathSegment::new("onePath.Only").to_string(), "`onePath.Only`");
        assert_eq!(PathSegment::new("1Darray").to_string(), "`1Darray`");
        assert_eq!(PathSegment::new("a`b").to_string(), "`a\\`b`");
        assert_eq!(PathSegment::new("and").to_string(), "`and`");
    }

    #[test]
    fn path_display_joins_with_dots() {
        let path = FieldPath::new(vec![
            PathSegment::new(META_SEGMENT),
            PathSegment::new("multiword array"),
            PathSegment::with_indices("x", vec![0]),
        ])
        .unwrap();
        assert_eq!(path.to_string(), "META().`multiword array`.x[0]");
    }

    #[test]
    fn meta_is_quoted_past_the_first_segment() {
        let path = FieldPath::new(vec![PathSegment::new("a"), PathSegment::new(META_SEGMENT)]).unwrap();
        assert_eq!(path.to_string(), "a.`META()`");
    }

    #[test]
    fn empty_path_rejected() {
        assert!(FieldPath::new(Vec::new()).is_none());
    }
}

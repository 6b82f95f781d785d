use std::fmt::Display;

use thisisplural::Plural;

use crate::identifier::Identifier;

/// A parsed property path: an ordered chain of segments from root to leaf.
///
/// Depth equals segment count; an empty path never comes out of the parser.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Plural)]
pub struct PropertyPath(pub Vec<PathSegment>);

impl PropertyPath {
    /// Number of segments along the chain.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Render the first `n` segments, for error reporting against a
    /// partially-resolved path.
    pub fn prefix(&self, n: usize) -> String {
        render_segments(&self.0[..n.min(self.0.len())])
    }
}

/// One `name` or `name[index]` step of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    pub name: Identifier,
    pub index: Option<Index>,
}

impl PathSegment {
    pub fn plain(name: Identifier) -> Self {
        Self { name, index: None }
    }

    pub fn indexed(name: Identifier, index: Index) -> Self {
        Self {
            name,
            index: Some(index),
        }
    }

    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }
}

/// Bracket content of an indexed segment.
///
/// Literal indices keep their sign: negativity is a resolution-time error,
/// not a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Index {
    /// `[n]` - a literal element index.
    At(i64),
    /// `[]` or `[?]` - append to the end of the list on write.
    Append,
}

pub(crate) fn render_segments(segments: &[PathSegment]) -> String {
    use std::fmt::Write;
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if i != 0 {
            out.push('.');
        }
        let _ = write!(out, "{}", segment);
    }
    out
}

impl Display for PathSegment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        match self.index {
            Some(Index::At(n)) => write!(f, "[{}]", n),
            Some(Index::Append) => write!(f, "[]"),
            None => Ok(()),
        }
    }
}

impl Display for PropertyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", render_segments(&self.0))
    }
}

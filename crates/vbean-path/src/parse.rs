//! Parser for dot/bracket property expressions.
//!
//! Grammar (informal):
//!
//! ```text
//! path      := segment ('.' segment)*
//! segment   := name ('[' indexSpec ']')?
//! indexSpec := '' | '?' | integer
//! ```
//!
//! An empty or `?` index spec means "append on write"; index *legality*
//! (sign, bounds) is a resolution-time concern, so negative literals parse
//! here and fail later.

use thiserror::Error;

use crate::identifier::{Identifier, IdentifierError};
use crate::path::{Index, PathSegment, PropertyPath};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Empty path expression")]
    Empty,
    #[error("Empty segment at position {at}")]
    EmptySegment { at: usize },
    #[error("Invalid property name at position {at}: {source}")]
    InvalidName {
        at: usize,
        source: IdentifierError,
    },
    #[error("Unmatched bracket at position {at}")]
    UnmatchedBracket { at: usize },
    #[error("Unexpected characters after ']' at position {at}")]
    TrailingCharacters { at: usize },
    #[error("Index is not an integer at position {at}: {spec:?}")]
    InvalidIndex { at: usize, spec: String },
}

/// Parse a property expression into a [`PropertyPath`].
///
/// Pure function, no side effects. Positions in errors are segment indices
/// (0-based), not byte offsets.
pub fn parse_path(input: &str) -> Result<PropertyPath, PathError> {
    if input.is_empty() {
        return Err(PathError::Empty);
    }
    let mut segments = Vec::new();
    for (at, raw) in input.split('.').enumerate() {
        segments.push(parse_segment(raw, at)?);
    }
    Ok(PropertyPath(segments))
}

fn parse_segment(raw: &str, at: usize) -> Result<PathSegment, PathError> {
    if raw.is_empty() {
        return Err(PathError::EmptySegment { at });
    }
    let Some(open) = raw.find('[') else {
        let name = parse_name(raw, at)?;
        return Ok(PathSegment::plain(name));
    };
    let name = parse_name(&raw[..open], at)?;
    if !raw.ends_with(']') {
        return Err(PathError::UnmatchedBracket { at });
    }
    let body = &raw[open + 1..raw.len() - 1];
    if body.contains('[') || body.contains(']') {
        // "a[0][1]" style multi-brackets, or "a[0]x[1]" leftovers.
        return Err(PathError::TrailingCharacters { at });
    }
    let index = parse_index_spec(body, at)?;
    Ok(PathSegment::indexed(name, index))
}

fn parse_name(raw: &str, at: usize) -> Result<Identifier, PathError> {
    raw.parse()
        .map_err(|source| PathError::InvalidName { at, source })
}

fn parse_index_spec(body: &str, at: usize) -> Result<Index, PathError> {
    match body {
        "" | "?" => Ok(Index::Append),
        _ => body
            .parse::<i64>()
            .map(Index::At)
            .map_err(|_| PathError::InvalidIndex {
                at,
                spec: body.to_string(),
            }),
    }
}

impl std::str::FromStr for PropertyPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_path(s)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_name() -> impl Strategy<Value = String> {
        "[a-zA-Z_][a-zA-Z0-9_]{0,10}"
    }

    fn arb_segment() -> impl Strategy<Value = String> {
        (arb_name(), prop_oneof![
            Just(None),
            (0i64..1000).prop_map(Some),
        ])
        .prop_map(|(name, index)| match index {
            Some(n) => format!("{}[{}]", name, n),
            None => name,
        })
    }

    proptest! {
        /// Invariant: rendering a parsed path re-parses to an equal path.
        #[test]
        fn parse_render_roundtrip(segments in proptest::collection::vec(arb_segment(), 1..6)) {
            let expr = segments.join(".");
            let path = parse_path(&expr).expect("parse failed");
            let rendered = path.to_string();
            let reparsed = parse_path(&rendered).expect("reparse failed");
            prop_assert_eq!(path, reparsed);
            prop_assert_eq!(rendered, expr);
        }

        /// Invariant: depth equals the number of dot-separated segments.
        #[test]
        fn depth_matches_segment_count(segments in proptest::collection::vec(arb_segment(), 1..6)) {
            let expr = segments.join(".");
            let path = parse_path(&expr).expect("parse failed");
            prop_assert_eq!(path.depth(), segments.len());
        }
    }
}

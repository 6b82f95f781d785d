/// Property name type and parser.
pub mod identifier;

/// Data structure for representing a dot/bracket property path.
pub mod path;

/// Parser turning `"a.b[2].c"` style strings into a [`path::PropertyPath`].
pub mod parse;

pub use identifier::{Identifier, IdentifierError};
pub use parse::{PathError, parse_path};
pub use path::{Index, PathSegment, PropertyPath};

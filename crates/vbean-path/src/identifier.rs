use std::borrow::Cow;
use std::fmt::{self, Display};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static IDENTIFIER_PARSER: LazyLock<IdentifierParser> = LazyLock::new(IdentifierParser::init);

/// A parser and factory API for property-name identifiers.
/// Prefer using `Identifier::from_str` and `.parse()` methods.
pub struct IdentifierParser(Regex);

impl IdentifierParser {
    /// Initialize the parser. This internally compiles a regex, so don't call this in a hot path.
    pub fn init() -> Self {
        Self(Regex::new(r"^[\p{XID_Start}_][\p{XID_Continue}]*").unwrap())
    }

    pub fn parse(&self, s: &str) -> Result<Identifier, IdentifierError> {
        let Some(matches) = self.0.find(s) else {
            if let Some(c) = s.chars().next() {
                return Err(IdentifierError::InvalidChar {
                    at: 0,
                    invalid_char: c,
                });
            } else {
                return Err(IdentifierError::Empty);
            }
        };
        if matches.len() == s.len() {
            Ok(Identifier(Cow::Owned(matches.as_str().to_string())))
        } else {
            // matches.end() is a byte index, but we need a character index for the error.
            let char_index = matches.as_str().chars().count();
            let invalid_char = s[matches.end()..].chars().next().unwrap();
            Err(IdentifierError::InvalidChar {
                at: char_index,
                invalid_char,
            })
        }
    }
}

impl std::str::FromStr for Identifier {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IDENTIFIER_PARSER.parse(s)
    }
}

/// A validated property name: one segment of a property path, without
/// the `.`/`[`/`]` delimiters.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Identifier(Cow<'static, str>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("Empty identifier")]
    Empty,
    #[error("Invalid character for identifier: {invalid_char} at {at}")]
    InvalidChar {
        /// the problem index of the identifier in the string
        at: usize,
        /// the invalid character
        invalid_char: char,
    },
}

impl Identifier {
    /// Creates a new Identifier without validation.
    ///
    /// This function is intended for creating compile-time constants where the
    /// identifier string is known to be valid:
    /// - Must start with an XID_Start character or underscore
    /// - Can contain XID_Continue characters
    ///
    /// Note: This function is not marked `unsafe` because passing an invalid string
    /// does not cause memory unsafety - it only results in a logically invalid Identifier.
    pub const fn new_unchecked(s: &'static str) -> Self {
        Identifier(Cow::Borrowed(s))
    }

    pub fn into_string(self) -> String {
        self.0.into()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

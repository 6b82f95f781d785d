//! Error types for schema registration and resolution.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("Interface set is empty")]
    EmptyInterfaceSet,

    #[error("Unknown interface: {0}")]
    UnknownInterface(String),

    #[error("Interface already registered: {0}")]
    DuplicateInterface(String),

    #[error("Conflicting declarations for property {property} between {first} and {second}")]
    ConflictingProperty {
        property: String,
        first: String,
        second: String,
    },

    #[error("Supertype cycle through interface: {0}")]
    SupertypeCycle(String),
}

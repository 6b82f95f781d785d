//! Error taxonomy for bean operations.
//!
//! Every failure here is synchronous and non-retryable: these are
//! programming or schema errors, not transient faults. Bulk operations
//! validate a staged copy before committing, so a failed operation never
//! leaves a store partially updated.

use thiserror::Error;
use vbean_path::PathError;
use vbean_schema::SchemaError;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {path:?}")]
pub struct BeanError {
    pub kind: BeanErrorKind,
    /// The property expression (or its resolved prefix) the failure
    /// occurred at.
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BeanErrorKind {
    /// The path cannot be resolved against the runtime values encountered:
    /// missing value required for indexing, out-of-range index, wrong
    /// container kind, de-reference of a non-bean.
    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    /// A value fails validation against the schema, or the property does
    /// not exist at all.
    #[error("Invalid value for property {property}: {detail}")]
    InvalidPropertyValue { property: String, detail: String },

    /// The schema or delegate wiring cannot satisfy a structural
    /// requirement.
    #[error("Unsupported feature: {0}")]
    UnsupportedFeature(String),

    /// Caller-level contract violation.
    #[error("Illegal argument: {0}")]
    IllegalArgument(String),

    /// A mutating call against an immutable store.
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

impl BeanError {
    pub fn new(kind: BeanErrorKind, path: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
        }
    }

    pub fn invalid_expression(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(BeanErrorKind::InvalidExpression(reason.into()), path)
    }

    pub fn invalid_value(
        path: impl Into<String>,
        property: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::new(
            BeanErrorKind::InvalidPropertyValue {
                property: property.into(),
                detail: detail.into(),
            },
            path,
        )
    }

    pub fn unknown_property(path: impl Into<String>, property: impl Into<String>) -> Self {
        Self::invalid_value(path, property, "no such property")
    }

    pub fn unsupported_feature(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(BeanErrorKind::UnsupportedFeature(reason.into()), path)
    }

    pub fn illegal_argument(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(BeanErrorKind::IllegalArgument(reason.into()), path)
    }

    pub fn unsupported_operation(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(BeanErrorKind::UnsupportedOperation(reason.into()), path)
    }

    /// Map a parse failure onto the taxonomy: a malformed numeric index is
    /// a caller contract violation, everything else is an unresolvable
    /// expression.
    pub fn from_parse(expr: &str, err: PathError) -> Self {
        match err {
            PathError::InvalidIndex { .. } => Self::illegal_argument(expr, err.to_string()),
            _ => Self::invalid_expression(expr, err.to_string()),
        }
    }

    /// Map a schema resolution failure at bean construction time.
    pub fn from_schema(context: &str, err: SchemaError) -> Self {
        match err {
            SchemaError::ConflictingProperty { .. } | SchemaError::SupertypeCycle(_) => {
                Self::unsupported_feature(context, err.to_string())
            }
            _ => Self::illegal_argument(context, err.to_string()),
        }
    }
}

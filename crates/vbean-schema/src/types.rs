//! Declared-type vocabulary for property schemas.

/// The declared type of a property or list element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// No type constraint; accepts any runtime value.
    Any,
    Bool,
    Int,
    Float,
    Text,
    /// A nested virtual bean satisfying the named registered interface.
    /// This is the synthesizable case for auto-vivification.
    Bean(String),
}

impl ValueType {
    pub fn bean(name: impl Into<String>) -> Self {
        Self::Bean(name.into())
    }

    /// The interface name when this is a bean type.
    pub fn bean_interface(&self) -> Option<&str> {
        match self {
            Self::Bean(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Any => write!(f, "any"),
            Self::Bool => write!(f, "bool"),
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Text => write!(f, "text"),
            Self::Bean(name) => write!(f, "bean<{}>", name),
        }
    }
}

//! User-supplied behavioral overrides.
//!
//! A property delegate replaces get/set for one property; an interface
//! delegate implements the behavioral (non-property) methods of one
//! interface. Structural compatibility (scalar vs. indexed against the
//! property's declared shape) is enforced when a delegate is attached,
//! never when it is used.

use crate::error::BeanError;
use crate::value::Value;

/// Custom get/set for one non-indexed property.
pub trait ScalarPropertyDelegate {
    fn get(&self, property: &str) -> Result<Value, BeanError>;
    fn set(&mut self, property: &str, value: Value) -> Result<(), BeanError>;
}

/// Custom access for one indexed (list/array) property.
pub trait IndexedPropertyDelegate: ScalarPropertyDelegate {
    fn get_at(&self, property: &str, index: usize) -> Result<Value, BeanError>;
    fn set_at(&mut self, property: &str, index: usize, value: Value) -> Result<(), BeanError>;
}

/// The attachable unit: exactly one shape per property.
pub enum PropertyDelegate {
    Scalar(Box<dyn ScalarPropertyDelegate>),
    Indexed(Box<dyn IndexedPropertyDelegate>),
}

impl PropertyDelegate {
    pub fn scalar(delegate: impl ScalarPropertyDelegate + 'static) -> Self {
        Self::Scalar(Box::new(delegate))
    }

    pub fn indexed(delegate: impl IndexedPropertyDelegate + 'static) -> Self {
        Self::Indexed(Box::new(delegate))
    }

    pub fn is_indexed(&self) -> bool {
        matches!(self, Self::Indexed(_))
    }
}

impl std::fmt::Debug for PropertyDelegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Scalar(_) => write!(f, "PropertyDelegate::Scalar"),
            Self::Indexed(_) => write!(f, "PropertyDelegate::Indexed"),
        }
    }
}

/// Implements the behavioral methods of one interface on behalf of a bean.
pub trait InterfaceDelegate {
    fn invoke(&mut self, method: &str, args: Vec<Value>) -> Result<Value, BeanError>;
}

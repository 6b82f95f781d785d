//! Interface declarations and schema resolution for vbean.
//!
//! Interfaces are declared explicitly and registered once; resolution
//! aggregates an interface set (supertypes included) into an immutable
//! [`property::BeanSchema`] shared by every bean of the same
//! combination.

pub mod error;
pub mod interface;
pub mod property;
pub mod registry;
pub mod types;

pub use error::SchemaError;
pub use interface::{IndexedAccessorDef, InterfaceDef, MethodDef, PropertyDef};
pub use property::{BeanSchema, IndexedSchema, PropertySchema};
pub use registry::SchemaRegistry;
pub use types::ValueType;

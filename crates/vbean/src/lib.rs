//! Dynamic "virtual bean" objects.
//!
//! A bean is a schema-checked property bag addressed by dot/bracket path
//! expressions (`"address.lines[0]"`). Declare interfaces in a
//! [`SchemaRegistry`], mint instances through a [`BeanFactory`], and read
//! and write them through [`BeanHandle`]. Writes auto-vivify missing
//! intermediates; reads never create state.
//!
//! ```
//! use vbean::{BeanFactory, InterfaceDef, SchemaRegistry, Value, ValueType};
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(InterfaceDef::new("Address").property("city", ValueType::Text))
//!     .unwrap();
//! registry
//!     .register(
//!         InterfaceDef::new("Person")
//!             .property("name", ValueType::Text)
//!             .property("address", ValueType::bean("Address")),
//!     )
//!     .unwrap();
//!
//! let factory = BeanFactory::new(registry);
//! let person = factory.create(&["Person"]).unwrap();
//! person.put("address.city", "Lyon").unwrap();
//! assert_eq!(person.get("address.city").unwrap(), Value::Text("Lyon".into()));
//! ```

mod bean;
mod delegate;
mod error;
mod flatten;
mod list_builder;
mod resolver;
mod store;
mod value;

pub use bean::{BeanFactory, BeanHandle, Delegates};
pub use delegate::{
    IndexedPropertyDelegate, InterfaceDelegate, PropertyDelegate, ScalarPropertyDelegate,
};
pub use error::{BeanError, BeanErrorKind};
pub use value::{Value, ValueKind};

pub use vbean_path::{Identifier, Index, PathError, PathSegment, PropertyPath, parse_path};
pub use vbean_schema::{
    BeanSchema, IndexedAccessorDef, InterfaceDef, MethodDef, PropertyDef, PropertySchema,
    SchemaError, SchemaRegistry, ValueType,
};

//! Explicit interface declarations.
//!
//! Callers describe each property interface once at registration time;
//! the registry turns declarations into resolved [`crate::BeanSchema`]s.

use crate::types::ValueType;

/// Declaration of one property interface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InterfaceDef {
    pub name: String,
    /// Supertype interface names; their properties and methods are
    /// inherited transitively.
    pub extends: Vec<String>,
    /// Marker interfaces contribute no properties or methods, only a
    /// capability name.
    pub marker: bool,
    pub properties: Vec<PropertyDef>,
    /// Sibling single-index accessors: the conventional source of element
    /// types for indexed properties that carry no explicit annotation.
    pub indexed_accessors: Vec<IndexedAccessorDef>,
    /// Behavioral (non-property) methods. A bean supporting this interface
    /// must have an interface delegate attached for these.
    pub methods: Vec<MethodDef>,
}

/// Declaration of one property accessor/mutator pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: ValueType,
    pub indexed: bool,
    /// Explicit per-accessor element-type annotation. Takes precedence
    /// over any sibling indexed accessor.
    pub element: Option<ValueType>,
    pub read_only: bool,
    pub write_only: bool,
}

/// A sibling accessor taking a single integer argument; its return type
/// becomes the element type of the named indexed property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedAccessorDef {
    pub property: String,
    pub element: ValueType,
}

/// A behavioral method declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDef {
    pub name: String,
}

impl InterfaceDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn marker(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            marker: true,
            ..Default::default()
        }
    }

    pub fn extends(mut self, supertype: impl Into<String>) -> Self {
        self.extends.push(supertype.into());
        self
    }

    pub fn property(mut self, name: impl Into<String>, ty: ValueType) -> Self {
        self.properties.push(PropertyDef::scalar(name, ty));
        self
    }

    /// Add a fully specified property declaration, for attributed
    /// (read-only, write-only) accessors.
    pub fn property_def(mut self, def: PropertyDef) -> Self {
        self.properties.push(def);
        self
    }

    pub fn indexed_property(mut self, name: impl Into<String>, element: Option<ValueType>) -> Self {
        self.properties.push(PropertyDef::indexed(name, element));
        self
    }

    pub fn indexed_accessor(mut self, property: impl Into<String>, element: ValueType) -> Self {
        self.indexed_accessors.push(IndexedAccessorDef {
            property: property.into(),
            element,
        });
        self
    }

    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(MethodDef { name: name.into() });
        self
    }
}

impl PropertyDef {
    pub fn scalar(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed: false,
            element: None,
            read_only: false,
            write_only: false,
        }
    }

    pub fn indexed(name: impl Into<String>, element: Option<ValueType>) -> Self {
        Self {
            name: name.into(),
            ty: ValueType::Any,
            indexed: true,
            element,
            read_only: false,
            write_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn write_only(mut self) -> Self {
        self.write_only = true;
        self
    }
}

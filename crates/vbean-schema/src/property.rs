//! Resolved, immutable property metadata.

use indexmap::IndexMap;

use crate::types::ValueType;

/// Metadata for one property, aggregated across the interface set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySchema {
    pub name: String,
    /// Declared type: for indexed properties this is the container's
    /// conceptual type, element typing lives in [`IndexedSchema`].
    pub ty: ValueType,
    /// Present iff the property is list/array shaped.
    pub indexed: Option<IndexedSchema>,
    pub read_only: bool,
    pub write_only: bool,
}

/// Indexed-property metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedSchema {
    /// Element type, when discoverable. `None` means indexed operations
    /// that need it (auto-instantiating a missing element) fail fast with
    /// an unsupported-feature error.
    pub element: Option<ValueType>,
}

impl PropertySchema {
    pub fn is_indexed(&self) -> bool {
        self.indexed.is_some()
    }

    /// Element type of an indexed property, if declared or discoverable.
    pub fn element_type(&self) -> Option<&ValueType> {
        self.indexed.as_ref().and_then(|i| i.element.as_ref())
    }
}

/// The resolved schema for one interface-set combination.
///
/// Immutable once built; shared (`Arc`) by every bean instance created for
/// the same combination. Property iteration order is declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeanSchema {
    /// Every interface this schema satisfies, supertypes included.
    pub capabilities: Vec<String>,
    pub properties: IndexMap<String, PropertySchema>,
    /// Behavioral (non-property) method name -> owning interface name.
    pub methods: IndexMap<String, String>,
}

impl BeanSchema {
    pub fn property(&self, name: &str) -> Option<&PropertySchema> {
        self.properties.get(name)
    }

    /// Whether this schema satisfies the named interface.
    pub fn supports(&self, interface: &str) -> bool {
        self.capabilities.iter().any(|c| c == interface)
    }

    /// The interface owning the named behavioral method, if any.
    pub fn method_owner(&self, method: &str) -> Option<&str> {
        self.methods.get(method).map(String::as_str)
    }
}

//! The mutable property bag backing one bean instance.

use ahash::{AHashMap, AHashSet};
use indexmap::IndexMap;

use crate::delegate::{InterfaceDelegate, PropertyDelegate};
use crate::error::{BeanError, BeanErrorKind};
use crate::value::Value;

/// Per-instance state: a flat name-to-value map for top-level properties
/// (nesting is realized by bean-valued entries), attached delegates, and
/// the immutable flag.
///
/// `values` is insertion-ordered on purpose: flattened views and bulk
/// population are order-sensitive, and insertion order is the documented
/// contract.
pub(crate) struct ValueStore {
    pub values: IndexMap<String, Value>,
    pub property_delegates: AHashMap<String, PropertyDelegate>,
    pub interface_delegates: AHashMap<String, Box<dyn InterfaceDelegate>>,
    pub immutable: bool,
    /// Property names omitted from the rendered display (sensitive fields).
    pub display_omit: AHashSet<String>,
}

impl ValueStore {
    pub fn new() -> Self {
        Self {
            values: IndexMap::new(),
            property_delegates: AHashMap::new(),
            interface_delegates: AHashMap::new(),
            immutable: false,
            display_omit: AHashSet::new(),
        }
    }

    /// Guard for every mutating operation. Checked before any state change
    /// so a rejected call leaves nothing modified.
    pub fn ensure_mutable(&self, path: &str) -> Result<(), BeanError> {
        if self.immutable {
            Err(BeanError::new(
                BeanErrorKind::UnsupportedOperation(
                    "store is immutable".to_string(),
                ),
                path,
            ))
        } else {
            Ok(())
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

impl std::fmt::Debug for ValueStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueStore")
            .field("values", &self.values)
            .field("immutable", &self.immutable)
            .field("property_delegates", &self.property_delegates.len())
            .field("interface_delegates", &self.interface_delegates.len())
            .finish()
    }
}

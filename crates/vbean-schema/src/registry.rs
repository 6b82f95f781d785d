//! Interface registry and schema resolution.

use std::cell::RefCell;
use std::sync::Arc;

use ahash::AHashMap;
use indexmap::IndexMap;

use crate::error::SchemaError;
use crate::interface::InterfaceDef;
use crate::property::{BeanSchema, IndexedSchema, PropertySchema};

/// The set of known interfaces, plus a cache of resolved schemas.
///
/// Explicitly constructed and passed around; there is no global registry.
/// Resolution results are memoized per distinct interface-set combination
/// and shared via `Arc`, so repeated `describe` calls are cheap.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    interfaces: AHashMap<String, InterfaceDef>,
    cache: RefCell<AHashMap<Vec<String>, Arc<BeanSchema>>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an interface declaration. Names are unique.
    pub fn register(&mut self, def: InterfaceDef) -> Result<(), SchemaError> {
        if self.interfaces.contains_key(&def.name) {
            return Err(SchemaError::DuplicateInterface(def.name));
        }
        self.interfaces.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn interface(&self, name: &str) -> Option<&InterfaceDef> {
        self.interfaces.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.interfaces.contains_key(name)
    }

    /// Resolve the schema for an interface-set combination.
    ///
    /// Aggregates property metadata across all named interfaces and their
    /// transitive supertypes, skipping marker interfaces' (empty) bodies.
    /// The result is immutable and shared; the same combination (in any
    /// order) yields the same `Arc`.
    pub fn describe(&self, names: &[&str]) -> Result<Arc<BeanSchema>, SchemaError> {
        if names.is_empty() {
            return Err(SchemaError::EmptyInterfaceSet);
        }

        let mut key: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        key.sort();
        key.dedup();
        if let Some(schema) = self.cache.borrow().get(&key) {
            return Ok(Arc::clone(schema));
        }

        let schema = Arc::new(self.resolve(names)?);
        self.cache
            .borrow_mut()
            .insert(key, Arc::clone(&schema));
        Ok(schema)
    }

    fn resolve(&self, names: &[&str]) -> Result<BeanSchema, SchemaError> {
        let mut visited: Vec<&InterfaceDef> = Vec::new();
        let mut visiting: Vec<&str> = Vec::new();
        for name in names {
            self.collect(name, &mut visited, &mut visiting)?;
        }

        let mut properties: IndexMap<String, PropertySchema> = IndexMap::new();
        let mut owners: AHashMap<String, String> = AHashMap::new();
        let mut methods: IndexMap<String, String> = IndexMap::new();

        for def in &visited {
            if def.marker {
                continue;
            }
            for prop in &def.properties {
                let element = if prop.indexed {
                    prop.element
                        .clone()
                        .or_else(|| self.sibling_element(def, &prop.name, &visited))
                } else {
                    None
                };
                let record = PropertySchema {
                    name: prop.name.clone(),
                    ty: prop.ty.clone(),
                    indexed: prop.indexed.then(|| IndexedSchema { element }),
                    read_only: prop.read_only,
                    write_only: prop.write_only,
                };
                match properties.get(&prop.name) {
                    None => {
                        owners.insert(prop.name.clone(), def.name.clone());
                        properties.insert(prop.name.clone(), record);
                    }
                    // Identical redeclarations across interfaces dedupe
                    // silently; anything else is a conflict.
                    Some(existing) if *existing == record => {}
                    Some(_) => {
                        return Err(SchemaError::ConflictingProperty {
                            property: prop.name.clone(),
                            first: owners[&prop.name].clone(),
                            second: def.name.clone(),
                        });
                    }
                }
            }
            for method in &def.methods {
                methods
                    .entry(method.name.clone())
                    .or_insert_with(|| def.name.clone());
            }
        }

        Ok(BeanSchema {
            capabilities: visited.iter().map(|d| d.name.clone()).collect(),
            properties,
            methods,
        })
    }

    /// Depth-first collection of an interface and its supertypes, in
    /// declaration order, deduped, with cycle detection.
    fn collect<'a>(
        &'a self,
        name: &str,
        visited: &mut Vec<&'a InterfaceDef>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), SchemaError> {
        if visiting.contains(&name) {
            return Err(SchemaError::SupertypeCycle(name.to_string()));
        }
        if visited.iter().any(|d| d.name == name) {
            return Ok(());
        }
        let def = self
            .interfaces
            .get(name)
            .ok_or_else(|| SchemaError::UnknownInterface(name.to_string()))?;
        visiting.push(def.name.as_str());
        visited.push(def);
        for supertype in &def.extends {
            self.collect(supertype, visited, visiting)?;
        }
        visiting.pop();
        Ok(())
    }

    /// Element-type convention: a sibling single-index accessor in the
    /// declaring interface first, then anywhere else in the visited set.
    fn sibling_element(
        &self,
        declaring: &InterfaceDef,
        property: &str,
        visited: &[&InterfaceDef],
    ) -> Option<crate::types::ValueType> {
        declaring
            .indexed_accessors
            .iter()
            .chain(visited.iter().flat_map(|d| d.indexed_accessors.iter()))
            .find(|acc| acc.property == property)
            .map(|acc| acc.element.clone())
    }
}

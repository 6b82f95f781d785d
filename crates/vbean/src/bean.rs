//! The bean handle and the factory that mints it.
//!
//! A [`BeanHandle`] is a cheap clone of a shared, interior-mutable
//! instance. Nested beans are stored as handles, so structure sharing is
//! by reference: mutating a nested bean through one parent is visible
//! through every other holder.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use indexmap::IndexMap;

use vbean_path::parse_path;
use vbean_schema::{BeanSchema, SchemaRegistry, ValueType};

use crate::delegate::{InterfaceDelegate, PropertyDelegate};
use crate::error::BeanError;
use crate::flatten;
use crate::list_builder;
use crate::resolver;
use crate::store::ValueStore;
use crate::value::Value;

pub(crate) struct BeanInner {
    pub schema: Arc<BeanSchema>,
    pub registry: Rc<SchemaRegistry>,
    pub store: ValueStore,
}

/// Shared handle to one bean instance.
#[derive(Clone)]
pub struct BeanHandle(Rc<RefCell<BeanInner>>);

impl BeanHandle {
    pub(crate) fn from_parts(schema: Arc<BeanSchema>, registry: Rc<SchemaRegistry>) -> Self {
        Self(Rc::new(RefCell::new(BeanInner {
            schema,
            registry,
            store: ValueStore::new(),
        })))
    }

    pub(crate) fn inner(&self) -> &Rc<RefCell<BeanInner>> {
        &self.0
    }

    /// The resolved schema this instance was created against.
    pub fn schema(&self) -> Arc<BeanSchema> {
        self.0.borrow().schema.clone()
    }

    pub(crate) fn registry(&self) -> Rc<SchemaRegistry> {
        self.0.borrow().registry.clone()
    }

    /// Whether two handles refer to the same underlying instance.
    pub fn shares_state_with(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Evaluate a path expression and return the addressed value.
    /// Reading a property that was never written yields [`Value::Null`].
    pub fn get(&self, expr: &str) -> Result<Value, BeanError> {
        let path = parse_path(expr).map_err(|e| BeanError::from_parse(expr, e))?;
        resolver::get(self, &path)
    }

    /// Write through a path expression, auto-vivifying missing
    /// intermediates. The whole chain is validated against the schema
    /// before anything is mutated, so a failing put commits nothing.
    pub fn put(&self, expr: &str, value: impl Into<Value>) -> Result<(), BeanError> {
        let path = parse_path(expr).map_err(|e| BeanError::from_parse(expr, e))?;
        resolver::put(self, &path, value.into())
    }

    /// Whether the path resolves to a present entry. Never errors and
    /// never vivifies: unknown properties, broken chains and malformed
    /// expressions all answer `false`.
    pub fn contains_key(&self, expr: &str) -> bool {
        match parse_path(expr) {
            Ok(path) => resolver::contains(self, &path),
            Err(_) => false,
        }
    }

    /// Remove the entry the path's leaf names from its owning bean.
    /// Missing intermediates make this a no-op; an index on the leaf
    /// segment does not narrow the removal.
    pub fn remove(&self, expr: &str) -> Result<(), BeanError> {
        let path = parse_path(expr).map_err(|e| BeanError::from_parse(expr, e))?;
        resolver::remove(self, &path)
    }

    /// Drop every stored value. Schema, delegates and display settings
    /// stay in place.
    pub fn clear(&self) -> Result<(), BeanError> {
        let mut inner = self.0.borrow_mut();
        inner.store.ensure_mutable("")?;
        inner.store.values.clear();
        Ok(())
    }

    /// Bulk update, all-or-nothing. The update is staged against a scratch
    /// instance seeded with this bean's flattened view; only when every
    /// entry applies cleanly is the result swapped in. Entries apply in
    /// order and a key may repeat: every `prop[]` occurrence appends one
    /// element. Note that the rebuild re-instantiates nested beans, so
    /// reference sharing with outside holders does not survive a
    /// `put_all`.
    pub fn put_all(
        &self,
        entries: impl IntoIterator<Item = (String, Value)>,
    ) -> Result<(), BeanError> {
        self.0.borrow().store.ensure_mutable("")?;
        let mut combined: Vec<(String, Value)> =
            flatten::copy_values(self, true).into_iter().collect();
        let base = combined.len();
        combined.extend(entries);
        let count = combined.len() - base;
        let staged = {
            let inner = self.0.borrow();
            BeanHandle::from_parts(inner.schema.clone(), inner.registry.clone())
        };
        list_builder::populate(&staged, combined)?;
        let values = std::mem::take(&mut staged.0.borrow_mut().store.values);
        self.0.borrow_mut().store.values = values;
        tracing::debug!(entries = count, "bulk update applied");
        Ok(())
    }

    /// Map view of the stored properties. See
    /// [`flatten::copy_values`](crate::flatten) for the two shapes.
    pub fn copy_values(&self, flatten: bool) -> IndexMap<String, Value> {
        flatten::copy_values(self, flatten)
    }

    /// Structural copy sharing no state with this instance.
    pub fn deep_copy(&self) -> BeanHandle {
        flatten::deep_copy(self, false)
    }

    /// Structural copy with every store, nested ones included, frozen.
    pub fn immutable_copy(&self) -> BeanHandle {
        flatten::deep_copy(self, true)
    }

    pub fn is_immutable(&self) -> bool {
        self.0.borrow().store.immutable
    }

    /// Attach a delegate for one property. The delegate's shape must match
    /// the property's declared shape; the mismatch is rejected here, at
    /// attach time, never during access.
    pub fn attach_property_delegate(
        &self,
        property: &str,
        delegate: PropertyDelegate,
    ) -> Result<(), BeanError> {
        let schema = self.schema();
        let prop = schema.property(property).ok_or_else(|| {
            BeanError::illegal_argument(property, format!("no such property: {property}"))
        })?;
        if prop.is_indexed() != delegate.is_indexed() {
            return Err(BeanError::illegal_argument(
                property,
                format!(
                    "delegate shape mismatch for {property}: property is {}, delegate is {}",
                    shape(prop.is_indexed()),
                    shape(delegate.is_indexed()),
                ),
            ));
        }
        let mut inner = self.0.borrow_mut();
        inner.store.ensure_mutable(property)?;
        inner
            .store
            .property_delegates
            .insert(property.to_string(), delegate);
        tracing::debug!(property, "property delegate attached");
        Ok(())
    }

    pub fn detach_property_delegate(
        &self,
        property: &str,
    ) -> Result<Option<PropertyDelegate>, BeanError> {
        let mut inner = self.0.borrow_mut();
        inner.store.ensure_mutable(property)?;
        Ok(inner.store.property_delegates.remove(property))
    }

    /// Attach the implementation of one interface's behavioral methods.
    pub fn attach_interface_delegate(
        &self,
        interface: &str,
        delegate: Box<dyn InterfaceDelegate>,
    ) -> Result<(), BeanError> {
        let schema = self.schema();
        if !schema.supports(interface) {
            return Err(BeanError::illegal_argument(
                interface,
                format!("bean does not support interface {interface}"),
            ));
        }
        let mut inner = self.0.borrow_mut();
        inner.store.ensure_mutable(interface)?;
        inner
            .store
            .interface_delegates
            .insert(interface.to_string(), delegate);
        tracing::debug!(interface, "interface delegate attached");
        Ok(())
    }

    /// Exclude a property from the rendered display (sensitive fields).
    pub fn omit_from_display(&self, property: &str) {
        self.0
            .borrow_mut()
            .store
            .display_omit
            .insert(property.to_string());
    }

    /// Dynamic method dispatch. Accessor-shaped names (`getX`, `setX`,
    /// `isX` for a boolean property) matching a declared property route
    /// through the resolver; everything else goes to the interface
    /// delegate owning the method.
    pub fn call(&self, method: &str, mut args: Vec<Value>) -> Result<Value, BeanError> {
        let schema = self.schema();
        if let Some(accessor) = accessor_target(&schema, method) {
            return match accessor {
                Accessor::Get(name) => {
                    if !args.is_empty() {
                        return Err(BeanError::illegal_argument(
                            method,
                            "getter takes no arguments",
                        ));
                    }
                    self.get(&name)
                }
                Accessor::Set(name) => {
                    if args.len() != 1 {
                        return Err(BeanError::illegal_argument(
                            method,
                            "setter takes exactly one argument",
                        ));
                    }
                    self.put(&name, args.pop().unwrap())?;
                    Ok(Value::Null)
                }
            };
        }
        if let Some(owner) = schema.method_owner(method) {
            let mut inner = self.0.borrow_mut();
            let BeanInner { store, .. } = &mut *inner;
            let Some(delegate) = store.interface_delegates.get_mut(owner) else {
                return Err(BeanError::unsupported_feature(
                    method,
                    format!("no delegate registered for interface {owner}"),
                ));
            };
            return delegate.invoke(method, args);
        }
        Err(BeanError::unsupported_feature(
            method,
            format!("no method {method}"),
        ))
    }
}

fn shape(indexed: bool) -> &'static str {
    if indexed { "indexed" } else { "scalar" }
}

enum Accessor {
    Get(String),
    Set(String),
}

fn accessor_target(schema: &BeanSchema, method: &str) -> Option<Accessor> {
    if let Some(rest) = method.strip_prefix("get") {
        let name = decapitalize(rest)?;
        if schema.property(&name).is_some() {
            return Some(Accessor::Get(name));
        }
    } else if let Some(rest) = method.strip_prefix("set") {
        let name = decapitalize(rest)?;
        if schema.property(&name).is_some() {
            return Some(Accessor::Set(name));
        }
    } else if let Some(rest) = method.strip_prefix("is") {
        // `isX` only reads boolean properties.
        let name = decapitalize(rest)?;
        if schema
            .property(&name)
            .is_some_and(|p| matches!(p.ty, ValueType::Bool))
        {
            return Some(Accessor::Get(name));
        }
    }
    None
}

fn decapitalize(rest: &str) -> Option<String> {
    let mut chars = rest.chars();
    let first = chars.next()?;
    if !first.is_uppercase() {
        return None;
    }
    let mut name: String = first.to_lowercase().collect();
    name.push_str(chars.as_str());
    Some(name)
}

/// Instantiate an empty bean for one interface, used wherever a missing
/// intermediate must spring into existence during a write.
pub(crate) fn vivify(
    registry: &Rc<SchemaRegistry>,
    interface: &str,
    path: &str,
) -> Result<BeanHandle, BeanError> {
    let schema = registry
        .describe(&[interface])
        .map_err(|e| BeanError::from_schema(path, e))?;
    Ok(BeanHandle::from_parts(schema, registry.clone()))
}

impl fmt::Debug for BeanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.0.borrow();
        f.debug_struct("BeanHandle")
            .field("capabilities", &inner.schema.capabilities)
            .field("store", &inner.store)
            .finish()
    }
}

/// Structural equality over the flattened view: two beans are equal when
/// they expose the same flat entries, regardless of how the nesting was
/// built or in which order keys arrived.
impl PartialEq for BeanHandle {
    fn eq(&self, other: &Self) -> bool {
        self.shares_state_with(other)
            || flatten::copy_values(self, true) == flatten::copy_values(other, true)
    }
}

impl fmt::Display for BeanHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let omit = self.0.borrow().store.display_omit.clone();
        let flat = flatten::copy_values(self, true);
        write!(f, "{{")?;
        let mut first = true;
        for (key, value) in &flat {
            let root = key.split(['.', '[']).next().unwrap_or(key);
            if omit.contains(root) {
                continue;
            }
            if !first {
                write!(f, ", ")?;
            }
            first = false;
            write!(f, "{key}: {value}")?;
        }
        write!(f, "}}")
    }
}

/// Delegates handed to [`BeanFactory::create_with`], bundled so a bean can
/// come up with its behavior already in place.
#[derive(Default)]
pub struct Delegates {
    properties: Vec<(String, PropertyDelegate)>,
    interfaces: Vec<(String, Box<dyn InterfaceDelegate>)>,
}

impl Delegates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, delegate: PropertyDelegate) -> Self {
        self.properties.push((name.into(), delegate));
        self
    }

    pub fn interface(
        mut self,
        name: impl Into<String>,
        delegate: impl InterfaceDelegate + 'static,
    ) -> Self {
        self.interfaces.push((name.into(), Box::new(delegate)));
        self
    }
}

/// Creates bean instances against a shared interface registry.
pub struct BeanFactory {
    registry: Rc<SchemaRegistry>,
}

impl BeanFactory {
    pub fn new(registry: SchemaRegistry) -> Self {
        Self {
            registry: Rc::new(registry),
        }
    }

    /// An empty bean implementing the given interface combination.
    pub fn create(&self, interfaces: &[&str]) -> Result<BeanHandle, BeanError> {
        self.create_with(interfaces, std::iter::empty(), Delegates::new())
    }

    /// Full construction: resolve the schema, attach delegates, verify
    /// every behavioral method has an implementation, then apply the
    /// initial entries through bulk population. The entries are an
    /// ordered sequence; repeated `prop[]` keys append one element each.
    pub fn create_with(
        &self,
        interfaces: &[&str],
        initial: impl IntoIterator<Item = (String, Value)>,
        delegates: Delegates,
    ) -> Result<BeanHandle, BeanError> {
        if interfaces.is_empty() {
            return Err(BeanError::illegal_argument(
                "",
                "at least one interface is required",
            ));
        }
        let context = interfaces.join("+");
        let schema = self
            .registry
            .describe(interfaces)
            .map_err(|e| BeanError::from_schema(&context, e))?;
        let bean = BeanHandle::from_parts(schema.clone(), self.registry.clone());
        for (property, delegate) in delegates.properties {
            bean.attach_property_delegate(&property, delegate)?;
        }
        for (interface, delegate) in delegates.interfaces {
            bean.attach_interface_delegate(&interface, delegate)?;
        }
        {
            let inner = bean.inner().borrow();
            for (method, owner) in &schema.methods {
                if !inner.store.interface_delegates.contains_key(owner) {
                    return Err(BeanError::unsupported_feature(
                        &context,
                        format!(
                            "interface {owner} declares behavioral method {method} but no delegate was provided"
                        ),
                    ));
                }
            }
        }
        list_builder::populate(&bean, initial.into_iter().collect())?;
        tracing::debug!(interfaces = %context, "bean created");
        Ok(bean)
    }
}

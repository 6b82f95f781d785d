//! Path resolution and validation.
//!
//! Each operation is a recursive descent over the parsed path, with the
//! current bean as implicit context. Reads never create state; writes
//! auto-vivify missing intermediates (nested beans, list containers and
//! elements) once the whole chain has been pre-checked against the
//! schemas and the stored values, so a failing put commits nothing.

use std::rc::Rc;

use vbean_path::{Index, PathSegment, PropertyPath};
use vbean_schema::{PropertySchema, SchemaRegistry, ValueType};

use crate::bean::{BeanHandle, vivify};
use crate::delegate::PropertyDelegate;
use crate::error::BeanError;
use crate::value::{Value, coerce};

pub(crate) fn get(bean: &BeanHandle, path: &PropertyPath) -> Result<Value, BeanError> {
    ensure_non_empty(path)?;
    get_in(bean, path, 0)
}

pub(crate) fn put(bean: &BeanHandle, path: &PropertyPath, value: Value) -> Result<(), BeanError> {
    ensure_non_empty(path)?;
    precheck(bean, path, 0, &value)?;
    put_in(bean, path, 0, value)
}

pub(crate) fn contains(bean: &BeanHandle, path: &PropertyPath) -> bool {
    if path.segments().is_empty() {
        return false;
    }
    contains_in(bean, path, 0)
}

pub(crate) fn remove(bean: &BeanHandle, path: &PropertyPath) -> Result<(), BeanError> {
    ensure_non_empty(path)?;
    remove_in(bean, path, 0)
}

fn ensure_non_empty(path: &PropertyPath) -> Result<(), BeanError> {
    if path.segments().is_empty() {
        Err(BeanError::illegal_argument("", "empty property path"))
    } else {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// get
// ---------------------------------------------------------------------------

fn get_in(bean: &BeanHandle, path: &PropertyPath, depth: usize) -> Result<Value, BeanError> {
    let segment = &path.segments()[depth];
    let name = segment.name.as_str();
    let leaf = depth + 1 == path.depth();
    let here = path.prefix(depth + 1);

    let inner = bean.inner().borrow();
    let prop = inner
        .schema
        .property(name)
        .cloned()
        .ok_or_else(|| BeanError::unknown_property(&here, name))?;

    if leaf {
        if prop.write_only {
            return Err(BeanError::unsupported_feature(
                &here,
                format!("property {name} is write-only"),
            ));
        }
        if let Some(delegate) = inner.store.property_delegates.get(name) {
            return match (delegate, segment.index) {
                (PropertyDelegate::Indexed(d), Some(index)) => {
                    d.get_at(name, read_index(index, &here)?)
                }
                (PropertyDelegate::Indexed(d), None) => d.get(name),
                (PropertyDelegate::Scalar(d), None) => d.get(name),
                (PropertyDelegate::Scalar(d), Some(index)) => {
                    let raw = d.get(name)?;
                    require_bracket_value(&raw, name, &here)?;
                    deref(&raw, index, &here)
                }
            };
        }
        let raw = inner.store.get(name).cloned().unwrap_or(Value::Null);
        match segment.index {
            None => Ok(raw),
            Some(index) => {
                require_bracket_value(&raw, name, &here)?;
                deref(&raw, index, &here)
            }
        }
    } else {
        let raw = inner.store.get(name).cloned().unwrap_or(Value::Null);
        let target = match segment.index {
            None => raw,
            Some(index) => {
                require_bracket_value(&raw, name, &here)?;
                deref(&raw, index, &here)?
            }
        };
        drop(inner);
        match target {
            Value::Bean(child) => get_in(&child, path, depth + 1),
            other => Err(non_managed(&here, &other)),
        }
    }
}

/// The pre-index value of a bracketed segment must exist.
fn require_bracket_value(raw: &Value, name: &str, here: &str) -> Result<(), BeanError> {
    if raw.is_null() {
        Err(BeanError::invalid_expression(
            here,
            format!("property {name} requires bracket evaluation but its value is null"),
        ))
    } else {
        Ok(())
    }
}

/// A literal, non-negative index is required wherever an element is read.
fn read_index(index: Index, here: &str) -> Result<usize, BeanError> {
    match index {
        Index::At(n) if n >= 0 => Ok(n as usize),
        _ => Err(BeanError::invalid_expression(
            here,
            "requires a valid index",
        )),
    }
}

/// Bracket dereference: bounds-checked element read from a list or array.
fn deref(container: &Value, index: Index, here: &str) -> Result<Value, BeanError> {
    let i = read_index(index, here)?;
    let elements = container.as_elements().ok_or_else(|| {
        BeanError::invalid_expression(
            here,
            format!("bracket applied to a value of kind {}", container.kind()),
        )
    })?;
    elements.get(i).cloned().ok_or_else(|| {
        BeanError::invalid_expression(
            here,
            format!("index {} out of range (len {})", i, elements.len()),
        )
    })
}

fn non_managed(here: &str, value: &Value) -> BeanError {
    BeanError::invalid_expression(
        here,
        format!("cannot de-reference a non-managed value of kind {}", value.kind()),
    )
}

// ---------------------------------------------------------------------------
// put
// ---------------------------------------------------------------------------

/// Pre-flight walk performed before any mutation: follow the stored
/// chain exactly the way `put_in` will, checking property names, leaf
/// types, mutability, index bounds and vivifiability along the way.
/// Missing links are walked through scratch instances instead of being
/// committed, so a put that fails anywhere down the chain leaves the
/// bean and every intermediate untouched.
fn precheck(
    bean: &BeanHandle,
    path: &PropertyPath,
    depth: usize,
    value: &Value,
) -> Result<(), BeanError> {
    let segment = &path.segments()[depth];
    let name = segment.name.as_str();
    let leaf = depth + 1 == path.depth();
    let here = path.prefix(depth + 1);

    let registry = bean.registry();
    let inner = bean.inner().borrow();
    let prop = inner
        .schema
        .property(name)
        .cloned()
        .ok_or_else(|| BeanError::unknown_property(&here, name))?;

    if leaf {
        inner.store.ensure_mutable(&here)?;
        if prop.read_only {
            return Err(BeanError::unsupported_feature(
                &here,
                format!("property {name} is read-only"),
            ));
        }
        if inner.store.property_delegates.contains_key(name) {
            // Delegate dispatch never touches the store.
            return Ok(());
        }
        return match segment.index {
            None => validate_leaf(&prop, segment, value.clone(), &here).map(|_| ()),
            Some(index) => {
                let ty = prop.element_type().cloned().unwrap_or(ValueType::Any);
                coerce(value.clone(), &ty)
                    .map_err(|(expected, actual)| mismatch(&here, name, &expected, &actual))?;
                match inner.store.get(name) {
                    None | Some(Value::Null) => {
                        require_indexed(&prop, &here)?;
                        first_slot(index, &here)
                    }
                    Some(container) => writable_slot(container, index, &here),
                }
            }
        };
    }

    match segment.index {
        None => match inner.store.get(name).cloned() {
            Some(Value::Bean(child)) => {
                drop(inner);
                precheck(&child, path, depth + 1, value)
            }
            Some(Value::Null) | None => {
                inner.store.ensure_mutable(&here)?;
                let interface = prop.ty.bean_interface().ok_or_else(|| {
                    BeanError::unsupported_feature(
                        &here,
                        format!("cannot instantiate an intermediate of declared type {}", prop.ty),
                    )
                })?;
                let child = vivify(&registry, interface, &here)?;
                drop(inner);
                precheck(&child, path, depth + 1, value)
            }
            Some(other) => Err(non_managed(&here, &other)),
        },
        Some(index) => {
            let element_ty = prop.element_type().cloned();
            let slot = match inner.store.get(name).cloned() {
                None | Some(Value::Null) => {
                    require_indexed(&prop, &here)?;
                    first_slot(index, &here)?;
                    inner.store.ensure_mutable(&here)?;
                    None
                }
                Some(Value::List(xs)) => element_slot(&xs, true, index, &here)?,
                Some(Value::Array(xs)) => element_slot(&xs, false, index, &here)?,
                Some(other) => {
                    return Err(BeanError::invalid_expression(
                        &here,
                        format!("bracket applied to a value of kind {}", other.kind()),
                    ));
                }
            };
            let child = match slot {
                Some(Value::Bean(child)) => child,
                Some(other) => return Err(non_managed(&here, &other)),
                None => {
                    inner.store.ensure_mutable(&here)?;
                    vivify_element(&element_ty, &registry, &here)?
                }
            };
            drop(inner);
            precheck(&child, path, depth + 1, value)
        }
    }
}

/// Bracket access into a missing container: vivification produces an
/// empty list, so only an append or the first slot can be addressed.
fn first_slot(index: Index, here: &str) -> Result<(), BeanError> {
    match index {
        Index::Append | Index::At(0) => Ok(()),
        Index::At(n) if n < 0 => Err(BeanError::invalid_expression(here, "requires a valid index")),
        Index::At(n) => Err(BeanError::invalid_expression(
            here,
            format!("index {n} out of range (len 0)"),
        )),
    }
}

/// The bounds discipline of [`bracket_write`] without the write.
fn writable_slot(container: &Value, index: Index, here: &str) -> Result<(), BeanError> {
    let (growable, xs) = match container {
        Value::List(xs) => (true, xs),
        Value::Array(xs) => (false, xs),
        other => {
            return Err(BeanError::invalid_expression(
                here,
                format!("bracket applied to a value of kind {}", other.kind()),
            ));
        }
    };
    match index {
        Index::Append if growable => Ok(()),
        Index::Append => Err(BeanError::invalid_expression(
            here,
            "cannot append to a fixed-size array",
        )),
        Index::At(n) if n < 0 => Err(BeanError::invalid_expression(here, "requires a valid index")),
        Index::At(n) => {
            let i = n as usize;
            if i < xs.len() || (i == xs.len() && growable) {
                Ok(())
            } else {
                Err(BeanError::invalid_expression(
                    here,
                    format!("index {} out of range (len {})", i, xs.len()),
                ))
            }
        }
    }
}

/// The element a non-leaf bracket segment descends into, or `None` when
/// descent would vivify a fresh element in that slot.
fn element_slot(
    xs: &[Value],
    growable: bool,
    index: Index,
    here: &str,
) -> Result<Option<Value>, BeanError> {
    match index {
        Index::Append if growable => Ok(None),
        Index::Append => Err(BeanError::invalid_expression(
            here,
            "cannot append to a fixed-size array",
        )),
        Index::At(n) if n < 0 => Err(BeanError::invalid_expression(here, "requires a valid index")),
        Index::At(n) => {
            let i = n as usize;
            if i < xs.len() {
                match &xs[i] {
                    Value::Null => Ok(None),
                    other => Ok(Some(other.clone())),
                }
            } else if i == xs.len() && growable {
                Ok(None)
            } else {
                Err(BeanError::invalid_expression(
                    here,
                    format!("index {} out of range (len {})", i, xs.len()),
                ))
            }
        }
    }
}

fn require_indexed(prop: &PropertySchema, here: &str) -> Result<(), BeanError> {
    if prop.is_indexed() {
        Ok(())
    } else {
        Err(BeanError::invalid_expression(
            here,
            format!(
                "property {} requires bracket evaluation but its value is null",
                prop.name
            ),
        ))
    }
}

/// Validate and coerce a leaf value against the property's metadata.
fn validate_leaf(
    prop: &PropertySchema,
    segment: &PathSegment,
    value: Value,
    here: &str,
) -> Result<Value, BeanError> {
    let name = prop.name.as_str();
    if segment.is_indexed() {
        let ty = prop.element_type().cloned().unwrap_or(ValueType::Any);
        coerce(value, &ty)
            .map_err(|(expected, actual)| mismatch(here, name, &expected, &actual))
    } else if prop.is_indexed() {
        // Whole-container write.
        let ty = prop.element_type().cloned().unwrap_or(ValueType::Any);
        match value {
            Value::Null => Ok(Value::Null),
            Value::List(xs) => Ok(Value::List(coerce_elements(xs, &ty, name, here)?)),
            Value::Array(xs) => Ok(Value::Array(coerce_elements(xs, &ty, name, here)?)),
            other => Err(mismatch(here, name, "list or array", &other.kind().to_string())),
        }
    } else {
        coerce(value, &prop.ty)
            .map_err(|(expected, actual)| mismatch(here, name, &expected, &actual))
    }
}

fn coerce_elements(
    xs: Vec<Value>,
    ty: &ValueType,
    name: &str,
    here: &str,
) -> Result<Vec<Value>, BeanError> {
    xs.into_iter()
        .map(|x| coerce(x, ty).map_err(|(expected, actual)| mismatch(here, name, &expected, &actual)))
        .collect()
}

fn mismatch(here: &str, name: &str, expected: &str, actual: &str) -> BeanError {
    BeanError::invalid_value(here, name, format!("expected {expected}, got {actual}"))
}

fn immutable_err(here: &str) -> BeanError {
    BeanError::unsupported_operation(here, "store is immutable")
}

fn put_in(
    bean: &BeanHandle,
    path: &PropertyPath,
    depth: usize,
    value: Value,
) -> Result<(), BeanError> {
    let segment = &path.segments()[depth];
    let name = segment.name.as_str();
    let leaf = depth + 1 == path.depth();
    let here = path.prefix(depth + 1);

    let registry = bean.registry();
    let schema = bean.schema();
    let prop = schema
        .property(name)
        .cloned()
        .ok_or_else(|| BeanError::unknown_property(&here, name))?;

    if leaf {
        let mut inner = bean.inner().borrow_mut();
        inner.store.ensure_mutable(&here)?;
        if prop.read_only {
            return Err(BeanError::unsupported_feature(
                &here,
                format!("property {name} is read-only"),
            ));
        }
        if let Some(delegate) = inner.store.property_delegates.get_mut(name) {
            return match (delegate, segment.index) {
                (PropertyDelegate::Indexed(d), Some(index)) => {
                    let i = read_index(index, &here)?;
                    let ty = prop.element_type().cloned().unwrap_or(ValueType::Any);
                    let coerced = coerce(value, &ty)
                        .map_err(|(expected, actual)| mismatch(&here, name, &expected, &actual))?;
                    d.set_at(name, i, coerced)
                }
                (PropertyDelegate::Indexed(d), None) => d.set(name, value),
                (PropertyDelegate::Scalar(d), None) => d.set(name, value),
                (PropertyDelegate::Scalar(_), Some(_)) => Err(BeanError::invalid_expression(
                    &here,
                    format!("scalar delegate on {name} cannot serve an indexed access"),
                )),
            };
        }
        match segment.index {
            None => {
                let coerced = validate_leaf(&prop, segment, value, &here)?;
                inner.store.values.insert(name.to_string(), coerced);
                Ok(())
            }
            Some(index) => {
                let ty = prop.element_type().cloned().unwrap_or(ValueType::Any);
                let coerced = coerce(value, &ty)
                    .map_err(|(expected, actual)| mismatch(&here, name, &expected, &actual))?;
                let missing = matches!(inner.store.get(name), None | Some(Value::Null));
                if missing {
                    require_indexed(&prop, &here)?;
                    // Built aside so a failing write commits no container.
                    let mut fresh = Value::List(Vec::new());
                    bracket_write(&mut fresh, index, coerced, &here)?;
                    inner.store.values.insert(name.to_string(), fresh);
                    return Ok(());
                }
                let container = inner.store.values.get_mut(name).unwrap();
                bracket_write(container, index, coerced, &here)
            }
        }
    } else {
        let child = resolve_child_for_write(bean, &prop, segment, &registry, &here)?;
        put_in(&child, path, depth + 1, value)
    }
}

/// Bracket write: bounds discipline of a dereference, plus append
/// semantics. A literal index equal to a list's length appends; arrays
/// never grow.
fn bracket_write(
    container: &mut Value,
    index: Index,
    value: Value,
    here: &str,
) -> Result<(), BeanError> {
    let (growable, xs) = match container {
        Value::List(xs) => (true, xs),
        Value::Array(xs) => (false, xs),
        other => {
            return Err(BeanError::invalid_expression(
                here,
                format!("bracket applied to a value of kind {}", other.kind()),
            ));
        }
    };
    match index {
        Index::Append => {
            if !growable {
                return Err(BeanError::invalid_expression(
                    here,
                    "cannot append to a fixed-size array",
                ));
            }
            xs.push(value);
            Ok(())
        }
        Index::At(n) => {
            if n < 0 {
                return Err(BeanError::invalid_expression(here, "requires a valid index"));
            }
            let i = n as usize;
            if i < xs.len() {
                xs[i] = value;
                Ok(())
            } else if i == xs.len() && growable {
                xs.push(value);
                Ok(())
            } else {
                Err(BeanError::invalid_expression(
                    here,
                    format!("index {} out of range (len {})", i, xs.len()),
                ))
            }
        }
    }
}

/// Locate the nested bean a non-leaf segment descends into, auto-vivifying
/// missing intermediates (the nested bean itself, the list container, and
/// the addressed element).
fn resolve_child_for_write(
    bean: &BeanHandle,
    prop: &PropertySchema,
    segment: &PathSegment,
    registry: &Rc<SchemaRegistry>,
    here: &str,
) -> Result<BeanHandle, BeanError> {
    let name = prop.name.as_str();
    let mut inner = bean.inner().borrow_mut();
    let immutable = inner.store.immutable;

    match segment.index {
        None => match inner.store.get(name).cloned() {
            Some(Value::Bean(child)) => Ok(child),
            Some(Value::Null) | None => {
                if immutable {
                    return Err(immutable_err(here));
                }
                let interface = prop.ty.bean_interface().ok_or_else(|| {
                    BeanError::unsupported_feature(
                        here,
                        format!("cannot instantiate an intermediate of declared type {}", prop.ty),
                    )
                })?;
                let child = vivify(registry, interface, here)?;
                tracing::trace!(path = %here, interface, "auto-vivified nested bean");
                inner
                    .store
                    .values
                    .insert(name.to_string(), Value::Bean(child.clone()));
                Ok(child)
            }
            Some(other) => Err(non_managed(here, &other)),
        },
        Some(index) => {
            let element_ty = prop.element_type().cloned();
            let missing = matches!(inner.store.get(name), None | Some(Value::Null));
            if missing {
                if immutable {
                    return Err(immutable_err(here));
                }
                require_indexed(prop, here)?;
                first_slot(index, here)?;
                // Container and element come into existence together, and
                // only once the whole slot resolution has succeeded.
                let child = vivify_element(&element_ty, registry, here)?;
                inner
                    .store
                    .values
                    .insert(name.to_string(), Value::List(vec![Value::Bean(child.clone())]));
                return Ok(child);
            }
            let container = inner.store.values.get_mut(name).unwrap();
            let (growable, xs) = match container {
                Value::List(xs) => (true, xs),
                Value::Array(xs) => (false, xs),
                other => {
                    return Err(BeanError::invalid_expression(
                        here,
                        format!("bracket applied to a value of kind {}", other.kind()),
                    ));
                }
            };
            match index {
                Index::Append => {
                    if !growable {
                        return Err(BeanError::invalid_expression(
                            here,
                            "cannot append to a fixed-size array",
                        ));
                    }
                    if immutable {
                        return Err(immutable_err(here));
                    }
                    let child = vivify_element(&element_ty, registry, here)?;
                    xs.push(Value::Bean(child.clone()));
                    Ok(child)
                }
                Index::At(n) => {
                    if n < 0 {
                        return Err(BeanError::invalid_expression(here, "requires a valid index"));
                    }
                    let i = n as usize;
                    if i < xs.len() {
                        match &xs[i] {
                            Value::Bean(child) => Ok(child.clone()),
                            Value::Null => {
                                if immutable {
                                    return Err(immutable_err(here));
                                }
                                let child = vivify_element(&element_ty, registry, here)?;
                                xs[i] = Value::Bean(child.clone());
                                Ok(child)
                            }
                            other => Err(non_managed(here, other)),
                        }
                    } else if i == xs.len() && growable {
                        if immutable {
                            return Err(immutable_err(here));
                        }
                        let child = vivify_element(&element_ty, registry, here)?;
                        xs.push(Value::Bean(child.clone()));
                        Ok(child)
                    } else {
                        Err(BeanError::invalid_expression(
                            here,
                            format!("index {} out of range (len {})", i, xs.len()),
                        ))
                    }
                }
            }
        }
    }
}

fn vivify_element(
    element_ty: &Option<ValueType>,
    registry: &Rc<SchemaRegistry>,
    here: &str,
) -> Result<BeanHandle, BeanError> {
    match element_ty {
        None => Err(BeanError::unsupported_feature(
            here,
            "no element type metadata for auto-instantiation",
        )),
        Some(ValueType::Bean(interface)) => vivify(registry, interface, here),
        Some(other) => Err(BeanError::unsupported_feature(
            here,
            format!("cannot auto-instantiate an element of type {other}"),
        )),
    }
}

// ---------------------------------------------------------------------------
// contains / remove
// ---------------------------------------------------------------------------

fn contains_in(bean: &BeanHandle, path: &PropertyPath, depth: usize) -> bool {
    let segment = &path.segments()[depth];
    let name = segment.name.as_str();
    let leaf = depth + 1 == path.depth();

    let inner = bean.inner().borrow();
    if inner.schema.property(name).is_none() {
        return false;
    }
    let Some(raw) = inner.store.get(name).cloned() else {
        return false;
    };

    if leaf {
        match segment.index {
            None => true,
            Some(Index::At(n)) if n >= 0 => raw
                .as_elements()
                .is_some_and(|xs| (n as usize) < xs.len()),
            Some(_) => false,
        }
    } else {
        let target = match segment.index {
            None => raw,
            Some(Index::At(n)) if n >= 0 => {
                match raw.as_elements().and_then(|xs| xs.get(n as usize)).cloned() {
                    Some(element) => element,
                    None => return false,
                }
            }
            Some(_) => return false,
        };
        drop(inner);
        match target {
            Value::Bean(child) => contains_in(&child, path, depth + 1),
            _ => false,
        }
    }
}

fn remove_in(bean: &BeanHandle, path: &PropertyPath, depth: usize) -> Result<(), BeanError> {
    let segment = &path.segments()[depth];
    let name = segment.name.as_str();
    let leaf = depth + 1 == path.depth();
    let here = path.prefix(depth + 1);

    if leaf {
        // Removal only ever affects the leaf-owning store's top-level
        // entry; an index on the leaf does not narrow it.
        let mut inner = bean.inner().borrow_mut();
        inner.store.ensure_mutable(&here)?;
        inner.store.values.shift_remove(name);
        Ok(())
    } else {
        let inner = bean.inner().borrow();
        let Some(raw) = inner.store.get(name).cloned() else {
            return Ok(());
        };
        let target = match segment.index {
            None => raw,
            Some(Index::At(n)) if n >= 0 => {
                match raw.as_elements().and_then(|xs| xs.get(n as usize)).cloned() {
                    Some(element) => element,
                    None => return Ok(()),
                }
            }
            Some(_) => {
                return Err(BeanError::invalid_expression(&here, "requires a valid index"));
            }
        };
        drop(inner);
        match target {
            Value::Null => Ok(()),
            Value::Bean(child) => remove_in(&child, path, depth + 1),
            other => Err(non_managed(&here, &other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use vbean_schema::{InterfaceDef, PropertyDef, SchemaRegistry};

    use crate::bean::{BeanFactory, BeanHandle};
    use crate::error::BeanErrorKind;
    use crate::value::Value;

    use super::*;

    fn factory() -> BeanFactory {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                InterfaceDef::new("Address")
                    .property("city", ValueType::Text)
                    .property("zip", ValueType::Text),
            )
            .unwrap();
        registry
            .register(
                InterfaceDef::new("Line")
                    .property("sku", ValueType::Text)
                    .property("qty", ValueType::Int),
            )
            .unwrap();
        registry
            .register(
                InterfaceDef::new("Order")
                    .property("id", ValueType::Text)
                    .property("total", ValueType::Float)
                    .property("open", ValueType::Bool)
                    .property("notes", ValueType::Any)
                    .property("shipping", ValueType::bean("Address"))
                    .indexed_property("lines", Some(ValueType::bean("Line")))
                    .indexed_property("tags", Some(ValueType::Text))
                    .indexed_property("blob", None)
                    .property_def(PropertyDef::scalar("code", ValueType::Text).read_only())
                    .property_def(PropertyDef::scalar("secret", ValueType::Text).write_only()),
            )
            .unwrap();
        BeanFactory::new(registry)
    }

    fn order() -> BeanHandle {
        factory().create(&["Order"]).unwrap()
    }

    #[test]
    fn test_unset_property_reads_null() {
        let bean = order();
        assert_eq!(bean.get("id").unwrap(), Value::Null);
    }

    #[test]
    fn test_scalar_round_trip() {
        let bean = order();
        bean.put("id", "A-17").unwrap();
        assert_eq!(bean.get("id").unwrap(), Value::Text("A-17".into()));
    }

    #[test]
    fn test_unknown_property_rejected() {
        let bean = order();
        let err = bean.put("bogus", 1).unwrap_err();
        assert!(matches!(
            err.kind,
            BeanErrorKind::InvalidPropertyValue { .. }
        ));
        assert!(bean.get("bogus").is_err());
        assert!(!bean.contains_key("bogus"));
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let bean = order();
        let err = bean.put("open", "yes").unwrap_err();
        assert!(matches!(
            err.kind,
            BeanErrorKind::InvalidPropertyValue { .. }
        ));
    }

    #[test]
    fn test_int_widens_to_float() {
        let bean = order();
        bean.put("total", 4).unwrap();
        assert_eq!(bean.get("total").unwrap(), Value::Float(4.0));
    }

    #[test]
    fn test_any_property_accepts_containers() {
        let bean = order();
        bean.put("notes", Value::List(vec![Value::Int(1), Value::Text("x".into())]))
            .unwrap();
        assert_eq!(
            bean.get("notes").unwrap(),
            Value::List(vec![Value::Int(1), Value::Text("x".into())])
        );
    }

    #[test]
    fn test_nested_put_auto_vivifies() {
        let bean = order();
        bean.put("shipping.city", "Lyon").unwrap();
        assert_eq!(bean.get("shipping.city").unwrap(), Value::Text("Lyon".into()));
        assert!(matches!(bean.get("shipping").unwrap(), Value::Bean(_)));
    }

    #[test]
    fn test_failed_nested_put_vivifies_nothing() {
        let bean = order();
        let err = bean.put("shipping.bogus", 1).unwrap_err();
        assert!(matches!(
            err.kind,
            BeanErrorKind::InvalidPropertyValue { .. }
        ));
        // Pre-validation ran the whole chain before any mutation.
        assert!(!bean.contains_key("shipping"));
    }

    #[test]
    fn test_failed_put_commits_nothing() {
        let bean = order();

        // Out-of-range leaf write on a missing container.
        assert!(bean.put("tags[5]", "x").is_err());
        assert!(!bean.contains_key("tags"));
        assert_eq!(bean.get("tags").unwrap(), Value::Null);

        // Out-of-range element write leaves no container behind.
        assert!(bean.put("lines[5].sku", "S").is_err());
        assert!(!bean.contains_key("lines"));

        // Failure past a would-be-vivified element commits no element.
        assert!(bean.put("lines[0].sku[2]", "x").is_err());
        assert!(!bean.contains_key("lines"));

        // Failure below a would-be-vivified nested bean commits nothing.
        assert!(bean.put("shipping.city[5]", "x").is_err());
        assert!(!bean.contains_key("shipping"));
    }

    #[test]
    fn test_failed_put_leaves_existing_containers_alone() {
        let bean = order();
        bean.put("tags[]", "a").unwrap();
        bean.put("lines[0].sku", "S-1").unwrap();

        assert!(bean.put("tags[7]", "x").is_err());
        assert_eq!(bean.get("tags").unwrap(), Value::List(vec![Value::Text("a".into())]));

        assert!(bean.put("lines[7].qty", 1).is_err());
        assert_eq!(bean.get("lines[0].sku").unwrap(), Value::Text("S-1".into()));
        assert!(!bean.contains_key("lines[1]"));
    }

    #[test]
    fn test_get_never_vivifies() {
        let bean = order();
        let _ = bean.get("shipping.city");
        assert!(!bean.contains_key("shipping"));
    }

    #[test]
    fn test_append_and_literal_index() {
        let bean = order();
        bean.put("tags[]", "a").unwrap();
        bean.put("tags[]", "b").unwrap();
        assert_eq!(bean.get("tags[1]").unwrap(), Value::Text("b".into()));
        // A literal index equal to the length appends.
        bean.put("tags[2]", "c").unwrap();
        assert_eq!(
            bean.get("tags").unwrap(),
            Value::List(vec![
                Value::Text("a".into()),
                Value::Text("b".into()),
                Value::Text("c".into()),
            ])
        );
    }

    #[test]
    fn test_index_past_end_rejected() {
        let bean = order();
        bean.put("tags[]", "a").unwrap();
        let err = bean.put("tags[5]", "x").unwrap_err();
        assert!(matches!(err.kind, BeanErrorKind::InvalidExpression(_)));
    }

    #[test]
    fn test_negative_index_rejected() {
        let bean = order();
        bean.put("tags[]", "a").unwrap();
        assert!(bean.put("tags[-1]", "x").is_err());
        assert!(bean.get("tags[-1]").is_err());
    }

    #[test]
    fn test_bracket_read_on_null_rejected() {
        let bean = order();
        let err = bean.get("tags[0]").unwrap_err();
        assert!(matches!(err.kind, BeanErrorKind::InvalidExpression(_)));
    }

    #[test]
    fn test_bracket_read_out_of_range() {
        let bean = order();
        bean.put("tags[]", "a").unwrap();
        let err = bean.get("tags[3]").unwrap_err();
        assert!(matches!(err.kind, BeanErrorKind::InvalidExpression(_)));
    }

    #[test]
    fn test_append_index_not_readable() {
        let bean = order();
        bean.put("tags[]", "a").unwrap();
        assert!(bean.get("tags[]").is_err());
    }

    #[test]
    fn test_element_auto_vivification() {
        let bean = order();
        bean.put("lines[0].sku", "S-1").unwrap();
        bean.put("lines[].qty", 7).unwrap();
        assert_eq!(bean.get("lines[0].sku").unwrap(), Value::Text("S-1".into()));
        assert_eq!(bean.get("lines[1].qty").unwrap(), Value::Int(7));
    }

    #[test]
    fn test_element_vivification_needs_type_metadata() {
        let bean = order();
        let err = bean.put("blob[0].x", 1).unwrap_err();
        assert!(matches!(err.kind, BeanErrorKind::UnsupportedFeature(_)));
    }

    #[test]
    fn test_array_is_fixed_size() {
        let bean = order();
        bean.put("tags", Value::Array(vec![Value::Text("a".into()), Value::Null]))
            .unwrap();
        bean.put("tags[1]", "b").unwrap();
        assert!(bean.put("tags[]", "c").is_err());
        assert!(bean.put("tags[2]", "c").is_err());
    }

    #[test]
    fn test_dereference_through_scalar_rejected() {
        let bean = order();
        bean.put("id", "A").unwrap();
        assert!(bean.get("id.sub").is_err());
        assert!(bean.put("id.sub", 1).is_err());
        // Statically known from the declared type, even with no value set.
        assert!(bean.put("total.sub", 1).is_err());
    }

    #[test]
    fn test_read_only_and_write_only() {
        let bean = order();
        let err = bean.put("code", "x").unwrap_err();
        assert!(matches!(err.kind, BeanErrorKind::UnsupportedFeature(_)));
        assert_eq!(bean.get("code").unwrap(), Value::Null);

        bean.put("secret", "s").unwrap();
        let err = bean.get("secret").unwrap_err();
        assert!(matches!(err.kind, BeanErrorKind::UnsupportedFeature(_)));
    }

    #[test]
    fn test_contains_key() {
        let bean = order();
        assert!(!bean.contains_key("id"));
        bean.put("id", "A").unwrap();
        assert!(bean.contains_key("id"));
        // Explicit null is still a present entry.
        bean.put("id", Value::Null).unwrap();
        assert!(bean.contains_key("id"));

        bean.put("tags[]", "a").unwrap();
        assert!(bean.contains_key("tags[0]"));
        assert!(!bean.contains_key("tags[1]"));
        assert!(!bean.contains_key("tags[]"));

        bean.put("shipping.city", "Lyon").unwrap();
        assert!(bean.contains_key("shipping.city"));
        assert!(!bean.contains_key("shipping.zip"));
        // Malformed expressions answer false, never error.
        assert!(!bean.contains_key("shipping..city"));
    }

    #[test]
    fn test_remove() {
        let bean = order();
        bean.put("id", "A").unwrap();
        bean.remove("id").unwrap();
        assert!(!bean.contains_key("id"));
        assert_eq!(bean.get("id").unwrap(), Value::Null);

        // Missing intermediates make removal a no-op.
        bean.remove("shipping.city").unwrap();

        bean.put("shipping.city", "Lyon").unwrap();
        bean.remove("shipping.city").unwrap();
        assert!(!bean.contains_key("shipping.city"));
        assert!(bean.contains_key("shipping"));
    }

    #[test]
    fn test_remove_ignores_leaf_index() {
        let bean = order();
        bean.put("tags[]", "a").unwrap();
        bean.remove("tags[0]").unwrap();
        assert!(!bean.contains_key("tags"));
    }

    #[test]
    fn test_nested_beans_share_state() {
        let bean = order();
        bean.put("shipping.city", "Lyon").unwrap();
        let shipping = match bean.get("shipping").unwrap() {
            Value::Bean(b) => b,
            other => panic!("expected bean, got {other:?}"),
        };
        shipping.put("zip", "69000").unwrap();
        assert_eq!(bean.get("shipping.zip").unwrap(), Value::Text("69000".into()));
    }
}

//! Construction of indexed properties from flat key/value entries.
//!
//! `populate` drives bulk initialization: plain keys go straight through
//! the resolver, while keys whose first segment is bracketed (`tags[]`,
//! `rows[0].name`) are grouped per property and folded into a list in
//! encounter order. Entries are an ordered sequence, not a map, because
//! the append idiom repeats the same key: every `tags[]` occurrence adds
//! one element. Append entries with sub-paths accumulate into one element
//! bean until a sub-path repeats, which starts the next element.

use indexmap::IndexMap;

use vbean_path::{Index, PropertyPath, parse_path};
use vbean_schema::ValueType;

use crate::bean::{BeanHandle, vivify};
use crate::error::BeanError;
use crate::resolver;
use crate::value::{Value, coerce};

pub(crate) fn populate(
    bean: &BeanHandle,
    entries: Vec<(String, Value)>,
) -> Result<(), BeanError> {
    // Bracket-root keys are folded per property; everything else is a
    // direct put, applied in encounter order.
    let mut groups: IndexMap<String, Vec<(PropertyPath, Value)>> = IndexMap::new();
    for (key, value) in entries {
        let path = parse_path(&key).map_err(|e| BeanError::from_parse(&key, e))?;
        if path.segments()[0].is_indexed() {
            let name = path.segments()[0].name.as_str().to_string();
            groups.entry(name).or_default().push((path, value));
        } else {
            resolver::put(bean, &path, value)?;
        }
    }
    for (name, group) in groups {
        build_list(bean, &name, group)?;
    }
    Ok(())
}

/// Fold one property's bracket-root entries into a list, then store it.
fn build_list(
    bean: &BeanHandle,
    name: &str,
    group: Vec<(PropertyPath, Value)>,
) -> Result<(), BeanError> {
    let schema = bean.schema();
    let registry = bean.registry();
    let prop = schema
        .property(name)
        .ok_or_else(|| BeanError::unknown_property(name, name))?;
    if !prop.is_indexed() {
        return Err(BeanError::invalid_expression(
            name,
            format!("property {name} is not indexed"),
        ));
    }
    let element_ty = prop.element_type().cloned().unwrap_or(ValueType::Any);

    // The fold starts from the property's current elements: the batch
    // overlays the slots it names and appends after the existing tail,
    // leaving everything else in place.
    let existing = bean.inner().borrow().store.get(name).cloned();
    let (fixed, mut list) = match existing {
        Some(Value::Array(xs)) => (true, xs),
        Some(Value::List(xs)) => (false, xs),
        _ => (false, Vec::new()),
    };

    // Sub-keys of the element currently being accumulated via append
    // entries; flushed into a fresh element bean when complete.
    let mut pending: Option<Vec<(String, Value)>> = None;

    for (path, value) in group {
        let index = path.segments()[0].index.unwrap();
        let sub = sub_path(&path);
        let here = path.to_string();
        match (index, sub) {
            (Index::Append, None) => {
                flush(&mut pending, &mut list, &element_ty, &registry, &here)?;
                if fixed {
                    return Err(BeanError::invalid_expression(
                        &here,
                        "cannot append to a fixed-size array",
                    ));
                }
                list.push(coerce_element(value, &element_ty, name, &here)?);
            }
            (Index::Append, Some(sub)) => {
                if fixed {
                    return Err(BeanError::invalid_expression(
                        &here,
                        "cannot append to a fixed-size array",
                    ));
                }
                let key = sub.to_string();
                // A repeated sub-key means the current element is done.
                let repeat = pending
                    .as_ref()
                    .is_some_and(|fields| fields.iter().any(|(k, _)| *k == key));
                if repeat {
                    flush(&mut pending, &mut list, &element_ty, &registry, &here)?;
                }
                pending.get_or_insert_with(Vec::new).push((key, value));
            }
            (Index::At(n), sub) => {
                flush(&mut pending, &mut list, &element_ty, &registry, &here)?;
                if n < 0 {
                    return Err(BeanError::invalid_expression(&here, "requires a valid index"));
                }
                let i = n as usize;
                if fixed && i >= list.len() {
                    return Err(BeanError::invalid_expression(
                        &here,
                        format!("index {i} out of range (len {})", list.len()),
                    ));
                }
                match sub {
                    None => {
                        while list.len() < i {
                            list.push(Value::Null);
                        }
                        let coerced = coerce_element(value, &element_ty, name, &here)?;
                        if i < list.len() {
                            list[i] = coerced;
                        } else {
                            list.push(coerced);
                        }
                    }
                    Some(sub) => {
                        while list.len() <= i {
                            list.push(Value::Null);
                        }
                        let element = match &list[i] {
                            Value::Bean(element) => element.clone(),
                            Value::Null => {
                                let element = element_bean(&element_ty, &registry, &here)?;
                                list[i] = Value::Bean(element.clone());
                                element
                            }
                            other => {
                                return Err(BeanError::invalid_expression(
                                    &here,
                                    format!(
                                        "cannot de-reference a non-managed value of kind {}",
                                        other.kind()
                                    ),
                                ));
                            }
                        };
                        populate(&element, vec![(sub.to_string(), value)])?;
                    }
                }
            }
        }
    }
    let tail = format!("{name}[]");
    flush(&mut pending, &mut list, &element_ty, &registry, &tail)?;

    let rebuilt = if fixed { Value::Array(list) } else { Value::List(list) };
    let path = parse_path(name).map_err(|e| BeanError::from_parse(name, e))?;
    resolver::put(bean, &path, rebuilt)
}

/// The path past the first segment, or `None` for a whole-element entry.
fn sub_path(path: &PropertyPath) -> Option<PropertyPath> {
    if path.depth() > 1 {
        Some(PropertyPath(path.segments()[1..].to_vec()))
    } else {
        None
    }
}

fn coerce_element(
    value: Value,
    element_ty: &ValueType,
    name: &str,
    here: &str,
) -> Result<Value, BeanError> {
    coerce(value, element_ty).map_err(|(expected, actual)| {
        BeanError::invalid_value(here, name, format!("expected {expected}, got {actual}"))
    })
}

/// Instantiate a pending element bean from its accumulated sub-keys and
/// push it onto the list.
fn flush(
    pending: &mut Option<Vec<(String, Value)>>,
    list: &mut Vec<Value>,
    element_ty: &ValueType,
    registry: &std::rc::Rc<vbean_schema::SchemaRegistry>,
    here: &str,
) -> Result<(), BeanError> {
    if let Some(fields) = pending.take() {
        let element = element_bean(element_ty, registry, here)?;
        populate(&element, fields)?;
        list.push(Value::Bean(element));
    }
    Ok(())
}

fn element_bean(
    element_ty: &ValueType,
    registry: &std::rc::Rc<vbean_schema::SchemaRegistry>,
    here: &str,
) -> Result<BeanHandle, BeanError> {
    match element_ty {
        ValueType::Bean(interface) => vivify(registry, interface, here),
        other => Err(BeanError::unsupported_feature(
            here,
            format!("cannot auto-instantiate an element of type {other}"),
        )),
    }
}

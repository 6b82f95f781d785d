//! Map views and structural copies of a bean.

use indexmap::IndexMap;

use crate::bean::BeanHandle;
use crate::value::Value;

/// Map view of a bean's properties. The shallow form clones the top-level
/// entries as-is (nested beans stay shared handles); the flattened form
/// expands nested beans into dotted keys and bean-bearing containers into
/// bracketed keys, producing entries `populate` can rebuild from.
pub(crate) fn copy_values(bean: &BeanHandle, flatten: bool) -> IndexMap<String, Value> {
    let inner = bean.inner().borrow();
    if !flatten {
        return inner.store.values.clone();
    }
    let mut out = IndexMap::new();
    for (name, value) in &inner.store.values {
        flatten_value(&mut out, name.clone(), value);
    }
    out
}

fn flatten_value(out: &mut IndexMap<String, Value>, key: String, value: &Value) {
    match value {
        Value::Bean(bean) => {
            // An empty bean has no leaves to expand; keep its key so the
            // flat view rebuilds it instead of dropping it. The emitted
            // handle is a fresh copy, like every other rebuilt bean.
            if bean.inner().borrow().store.values.is_empty() {
                out.insert(key, Value::Bean(deep_copy(bean, false)));
                return;
            }
            let inner = bean.inner().borrow();
            for (name, nested) in &inner.store.values {
                flatten_value(out, format!("{key}.{name}"), nested);
            }
        }
        Value::List(xs) | Value::Array(xs)
            if xs.iter().any(|x| matches!(x, Value::Bean(_))) =>
        {
            // Bean-bearing containers expand element by element so nested
            // structure survives the flat view; bean-free containers stay
            // whole below.
            for (i, x) in xs.iter().enumerate() {
                flatten_value(out, format!("{key}[{i}]"), x);
            }
        }
        other => {
            out.insert(key, other.clone());
        }
    }
}

/// Recursive structural copy. Nested beans and container elements are
/// duplicated, so the copy shares no state with the source. Delegates are
/// not carried over; only the stored values travel.
pub(crate) fn deep_copy(bean: &BeanHandle, immutable: bool) -> BeanHandle {
    let inner = bean.inner().borrow();
    let copy = BeanHandle::from_parts(inner.schema.clone(), inner.registry.clone());
    {
        let mut copy_inner = copy.inner().borrow_mut();
        for (name, value) in &inner.store.values {
            copy_inner
                .store
                .values
                .insert(name.clone(), copy_value(value, immutable));
        }
        copy_inner.store.display_omit = inner.store.display_omit.clone();
        copy_inner.store.immutable = immutable;
    }
    copy
}

fn copy_value(value: &Value, immutable: bool) -> Value {
    match value {
        Value::Bean(bean) => Value::Bean(deep_copy(bean, immutable)),
        Value::List(xs) => Value::List(xs.iter().map(|x| copy_value(x, immutable)).collect()),
        Value::Array(xs) => Value::Array(xs.iter().map(|x| copy_value(x, immutable)).collect()),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use vbean_schema::{InterfaceDef, SchemaRegistry, ValueType};

    use crate::bean::BeanFactory;
    use crate::error::BeanErrorKind;

    use super::*;

    fn factory() -> BeanFactory {
        let mut registry = SchemaRegistry::new();
        registry
            .register(InterfaceDef::new("Child").property("name", ValueType::Text))
            .unwrap();
        registry
            .register(
                InterfaceDef::new("Parent")
                    .property("id", ValueType::Int)
                    .property("child", ValueType::bean("Child"))
                    .indexed_property("kids", Some(ValueType::bean("Child")))
                    .indexed_property("nums", Some(ValueType::Int)),
            )
            .unwrap();
        BeanFactory::new(registry)
    }

    #[test]
    fn test_shallow_view_shares_nested_handles() {
        let bean = factory().create(&["Parent"]).unwrap();
        bean.put("child.name", "a").unwrap();
        let view = copy_values(&bean, false);
        let shared = view["child"].as_bean().unwrap();
        shared.put("name", "b").unwrap();
        assert_eq!(bean.get("child.name").unwrap(), Value::Text("b".into()));
    }

    #[test]
    fn test_flatten_expands_nested_beans() {
        let bean = factory().create(&["Parent"]).unwrap();
        bean.put("id", 9).unwrap();
        bean.put("child.name", "a").unwrap();
        let flat = copy_values(&bean, true);
        assert_eq!(flat["id"], Value::Int(9));
        assert_eq!(flat["child.name"], Value::Text("a".into()));
        assert!(!flat.contains_key("child"));
    }

    #[test]
    fn test_flatten_keeps_bean_free_containers_whole() {
        let bean = factory().create(&["Parent"]).unwrap();
        bean.put("nums[]", 1).unwrap();
        bean.put("nums[]", 2).unwrap();
        let flat = copy_values(&bean, true);
        assert_eq!(flat["nums"], Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_flatten_expands_bean_bearing_containers() {
        let bean = factory().create(&["Parent"]).unwrap();
        bean.put("kids[0].name", "a").unwrap();
        bean.put("kids[1].name", "b").unwrap();
        let flat = copy_values(&bean, true);
        assert_eq!(flat["kids[0].name"], Value::Text("a".into()));
        assert_eq!(flat["kids[1].name"], Value::Text("b".into()));
        assert!(!flat.contains_key("kids"));
    }

    #[test]
    fn test_flatten_keeps_empty_nested_beans() {
        let factory = factory();
        let bean = factory.create(&["Parent"]).unwrap();
        let child = factory.create(&["Child"]).unwrap();
        bean.put("child", child.clone()).unwrap();
        bean.put("kids[0].name", "a").unwrap();
        bean.put("kids[1]", factory.create(&["Child"]).unwrap()).unwrap();

        let flat = copy_values(&bean, true);
        let empty = flat["child"].as_bean().unwrap();
        assert!(empty.copy_values(false).is_empty());
        // The flat view carries a fresh copy, never the live handle.
        assert!(!empty.shares_state_with(&child));
        assert_eq!(flat["kids[0].name"], Value::Text("a".into()));
        assert!(matches!(flat["kids[1]"], Value::Bean(_)));
    }

    #[test]
    fn test_empty_nested_bean_distinguishes_flat_views() {
        let factory = factory();
        let with_child = factory.create(&["Parent"]).unwrap();
        with_child.put("child", factory.create(&["Child"]).unwrap()).unwrap();
        let without = factory.create(&["Parent"]).unwrap();
        assert_ne!(with_child, without);
    }

    #[test]
    fn test_deep_copy_shares_nothing() {
        let bean = factory().create(&["Parent"]).unwrap();
        bean.put("child.name", "a").unwrap();
        bean.put("kids[0].name", "k").unwrap();

        let copy = deep_copy(&bean, false);
        copy.put("child.name", "changed").unwrap();
        copy.put("kids[0].name", "changed").unwrap();

        assert_eq!(bean.get("child.name").unwrap(), Value::Text("a".into()));
        assert_eq!(bean.get("kids[0].name").unwrap(), Value::Text("k".into()));
    }

    #[test]
    fn test_immutable_copy_is_frozen_transitively() {
        let bean = factory().create(&["Parent"]).unwrap();
        bean.put("child.name", "a").unwrap();

        let frozen = deep_copy(&bean, true);
        assert!(frozen.is_immutable());
        let err = frozen.put("id", 1).unwrap_err();
        assert!(matches!(err.kind, BeanErrorKind::UnsupportedOperation(_)));
        let err = frozen.put("child.name", "b").unwrap_err();
        assert!(matches!(err.kind, BeanErrorKind::UnsupportedOperation(_)));
        // Reads still work, and the source stays mutable.
        assert_eq!(frozen.get("child.name").unwrap(), Value::Text("a".into()));
        bean.put("id", 2).unwrap();
    }
}

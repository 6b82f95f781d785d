use vbean::{
    BeanFactory, BeanHandle, InterfaceDef, SchemaRegistry, Value, ValueType,
};

fn catalog_factory() -> BeanFactory {
    let mut registry = SchemaRegistry::new();
    registry
        .register(
            InterfaceDef::new("Dimension")
                .property("width", ValueType::Float)
                .property("height", ValueType::Float),
        )
        .unwrap();
    registry
        .register(
            InterfaceDef::new("Product")
                .property("sku", ValueType::Text)
                .property("price", ValueType::Float)
                .property("size", ValueType::bean("Dimension")),
        )
        .unwrap();
    registry
        .register(
            InterfaceDef::new("Catalog")
                .property("name", ValueType::Text)
                .indexed_property("products", Some(ValueType::bean("Product")))
                .indexed_property("labels", Some(ValueType::Text)),
        )
        .unwrap();
    BeanFactory::new(registry)
}

// Ordered pairs, not a map: the append idiom repeats keys.
fn entries(pairs: &[(&str, Value)]) -> Vec<(String, Value)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn builds_a_catalog_from_flat_entries() {
    let factory = catalog_factory();
    let catalog = factory
        .create_with(
            &["Catalog"],
            entries(&[
                ("name", Value::Text("spring".into())),
                ("labels[]", Value::Text("new".into())),
                ("labels[]", Value::Text("sale".into())),
                ("products[].sku", Value::Text("P-1".into())),
                ("products[].price", Value::Float(9.5)),
                ("products[].sku", Value::Text("P-2".into())),
                ("products[].price", Value::Float(12.0)),
                ("products[0].size.width", Value::Float(10.0)),
            ]),
            vbean::Delegates::new(),
        )
        .unwrap();

    assert_eq!(catalog.get("name").unwrap(), Value::Text("spring".into()));
    assert_eq!(
        catalog.get("labels").unwrap(),
        Value::List(vec![Value::Text("new".into()), Value::Text("sale".into())])
    );
    assert_eq!(catalog.get("products[0].sku").unwrap(), Value::Text("P-1".into()));
    assert_eq!(catalog.get("products[1].price").unwrap(), Value::Float(12.0));
    assert_eq!(
        catalog.get("products[0].size.width").unwrap(),
        Value::Float(10.0)
    );
}

#[test]
fn flattened_view_rebuilds_an_equal_bean() {
    let factory = catalog_factory();
    let catalog = factory.create(&["Catalog"]).unwrap();
    catalog.put("name", "spring").unwrap();
    catalog.put("labels[]", "new").unwrap();
    catalog.put("products[].sku", "P-1").unwrap();
    catalog.put("products[0].size.height", 4.5).unwrap();

    let flat = catalog.copy_values(true);
    let rebuilt = factory
        .create_with(&["Catalog"], flat, vbean::Delegates::new())
        .unwrap();
    assert_eq!(rebuilt, catalog);
    assert_eq!(
        rebuilt.get("products[0].size.height").unwrap(),
        Value::Float(4.5)
    );
}

#[test]
fn rebuilt_nested_beans_are_fresh_instances() {
    let factory = catalog_factory();
    let catalog = factory.create(&["Catalog"]).unwrap();
    catalog.put("products[0].sku", "P-1").unwrap();
    let product = catalog.get("products[0]").unwrap();
    let product = product.as_bean().unwrap();

    catalog
        .put_all(entries(&[("name", Value::Text("spring".into()))]))
        .unwrap();

    // The bulk rebuild re-instantiates nested structure.
    let after = catalog.get("products[0]").unwrap();
    let after = after.as_bean().unwrap();
    assert!(!after.shares_state_with(product));
    assert_eq!(after.get("sku").unwrap(), Value::Text("P-1".into()));
}

#[test]
fn bulk_updates_overlay_existing_lists() {
    let factory = catalog_factory();
    let catalog = factory.create(&["Catalog"]).unwrap();
    catalog.put("labels[]", "new").unwrap();
    catalog.put("labels[]", "sale").unwrap();

    catalog
        .put_all(entries(&[("labels[0]", Value::Text("spring".into()))]))
        .unwrap();

    assert_eq!(
        catalog.get("labels").unwrap(),
        Value::List(vec![Value::Text("spring".into()), Value::Text("sale".into())])
    );
}

#[test]
fn empty_nested_beans_survive_a_rebuild() {
    let factory = catalog_factory();
    let catalog = factory.create(&["Catalog"]).unwrap();
    catalog.put("products[0].sku", "P-1").unwrap();
    catalog
        .put("products[0].size", factory.create(&["Dimension"]).unwrap())
        .unwrap();
    catalog
        .put("products[1]", factory.create(&["Product"]).unwrap())
        .unwrap();

    catalog
        .put_all(entries(&[("name", Value::Text("spring".into()))]))
        .unwrap();

    assert_eq!(catalog.get("products[0].sku").unwrap(), Value::Text("P-1".into()));
    assert!(catalog.contains_key("products[0].size"));
    assert!(matches!(catalog.get("products[1]").unwrap(), Value::Bean(_)));
}

#[test]
fn shared_handles_observe_each_others_writes() {
    let factory = catalog_factory();
    let catalog = factory.create(&["Catalog"]).unwrap();
    catalog.put("products[0].sku", "P-1").unwrap();

    let view: BeanHandle = catalog
        .get("products[0]")
        .unwrap()
        .as_bean()
        .unwrap()
        .clone();
    view.put("price", 3.0).unwrap();
    assert_eq!(catalog.get("products[0].price").unwrap(), Value::Float(3.0));
}

#[test]
fn immutable_copies_reject_every_mutation_path() {
    let factory = catalog_factory();
    let catalog = factory.create(&["Catalog"]).unwrap();
    catalog.put("products[0].sku", "P-1").unwrap();

    let frozen = catalog.immutable_copy();
    assert!(frozen.put("name", "x").is_err());
    assert!(frozen.put("labels[]", "x").is_err());
    assert!(frozen.put("products[0].sku", "x").is_err());
    assert!(frozen.remove("products").is_err());
    assert!(frozen.clear().is_err());
    assert!(frozen.put_all(entries(&[("name", Value::Null)])).is_err());
    assert_eq!(frozen.get("products[0].sku").unwrap(), Value::Text("P-1".into()));
}

mod proptests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn appended_elements_keep_arrival_order(labels in proptest::collection::vec(".*", 0..16)) {
            let factory = catalog_factory();
            let catalog = factory.create(&["Catalog"]).unwrap();
            for label in &labels {
                catalog.put("labels[]", label.as_str()).unwrap();
            }
            let expected: Vec<Value> =
                labels.iter().map(|l| Value::Text(l.clone())).collect();
            if labels.is_empty() {
                prop_assert_eq!(catalog.get("labels").unwrap(), Value::Null);
            } else {
                prop_assert_eq!(catalog.get("labels").unwrap(), Value::List(expected));
            }
        }

        #[test]
        fn flatten_then_rebuild_round_trips(
            name in ".*",
            width in proptest::num::f64::NORMAL,
            sku in ".*",
        ) {
            let factory = catalog_factory();
            let catalog = factory.create(&["Catalog"]).unwrap();
            catalog.put("name", name.as_str()).unwrap();
            catalog.put("products[0].sku", sku.as_str()).unwrap();
            catalog.put("products[0].size.width", width).unwrap();

            let rebuilt = factory
                .create_with(&["Catalog"], catalog.copy_values(true), vbean::Delegates::new())
                .unwrap();
            prop_assert_eq!(&rebuilt, &catalog);
        }
    }
}

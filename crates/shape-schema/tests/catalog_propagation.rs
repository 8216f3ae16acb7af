use pretty_assertions::assert_eq;
use shape_core::{Key, Types, Value};
use shape_schema::{AfterWrite, AttributeOptions, KeyMode, Propagation, TypeCatalog};

fn base_with_child(propagation: Propagation) -> TypeCatalog {
    let mut catalog = TypeCatalog::new(propagation);
    catalog.declare("Base", KeyMode::Indifferent).unwrap();
    catalog
        .attribute("Base", "name", AttributeOptions::new().ty(Types::string()))
        .unwrap();
    catalog.subclass("Base", "Child").unwrap();
    catalog
}

#[test]
fn snapshot_keeps_subclass_at_declaration_state() {
    let mut catalog = base_with_child(Propagation::Snapshot);
    catalog.set_allow_dynamic_attributes("Base", true).unwrap();
    catalog
        .optional_attribute("Base", "late", AttributeOptions::new())
        .unwrap();

    let child = catalog.record_type("Child").unwrap();
    assert!(child.schema().has_attribute("name"));
    assert!(!child.schema().has_attribute("late"));
    assert!(!child.schema().allow_dynamic_attributes());

    let mut record = child.construct([("name", "Yoda")]).unwrap();
    assert!(record.set("extra", 1).unwrap_err().is_undeclared());

    let mut parent = catalog
        .record_type("Base")
        .unwrap()
        .construct([("name", "Yoda")])
        .unwrap();
    parent.set("extra", 1).unwrap();
}

#[test]
fn snapshot_child_changes_never_reach_parent() {
    let mut catalog = base_with_child(Propagation::Snapshot);
    catalog.remove_attribute("Child", "name").unwrap();

    assert!(catalog.schema("Base").unwrap().has_attribute("name"));
    assert!(!catalog.schema("Child").unwrap().has_attribute("name"));
}

#[test]
fn live_cascade_reaches_existing_descendants() {
    let mut catalog = base_with_child(Propagation::LiveCascade);
    catalog.subclass("Child", "Grandchild").unwrap();

    catalog.set_allow_dynamic_attributes("Base", true).unwrap();
    catalog
        .optional_attribute("Base", "age", AttributeOptions::new().ty(Types::int().coercible()))
        .unwrap();

    for name in ["Child", "Grandchild"] {
        let schema = catalog.schema(name).unwrap();
        assert!(schema.allow_dynamic_attributes(), "{name}");
        assert!(schema.has_attribute("age"), "{name}");
    }

    let mut record = catalog
        .record_type("Grandchild")
        .unwrap()
        .construct([("name", "Yoda"), ("age", "900")])
        .unwrap();
    assert_eq!(record.get("age"), Some(&Value::Int(900)));
    record.set("extra", true).unwrap();
}

#[test]
fn live_cascade_only_flows_downwards() {
    let mut catalog = base_with_child(Propagation::LiveCascade);
    catalog
        .update_attribute("Child", "name", AttributeOptions::new().required(false))
        .unwrap();

    assert!(catalog.schema("Base").unwrap().is_required("name"));
    assert!(!catalog.schema("Child").unwrap().is_required("name"));
}

#[test]
fn live_cascade_carries_callbacks_and_removals() {
    let mut catalog = base_with_child(Propagation::LiveCascade);
    catalog
        .optional_attribute("Base", "upper", AttributeOptions::new())
        .unwrap();
    catalog
        .after_write(
            "Base",
            AfterWrite::new(|record, written| {
                if written.is_none_or(|k| *k == Key::from("name")) {
                    let upper = record
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_uppercase);
                    if let Some(upper) = upper {
                        record.set("upper", upper)?;
                    }
                }
                Ok(())
            }),
        )
        .unwrap();

    let record = catalog
        .record_type("Child")
        .unwrap()
        .construct([("name", "yoda")])
        .unwrap();
    assert_eq!(record.get("upper"), Some(&Value::from("YODA")));

    catalog.remove_attribute("Base", "upper").unwrap();
    assert!(!catalog.schema("Child").unwrap().has_attribute("upper"));
}

#[test]
fn subclasses_declared_later_copy_current_state() {
    let mut catalog = TypeCatalog::new(Propagation::Snapshot);
    catalog.declare("Base", KeyMode::Strict).unwrap();
    catalog.set_allow_dynamic_attributes("Base", true).unwrap();
    catalog.subclass("Base", "Late").unwrap();

    assert!(catalog.schema("Late").unwrap().allow_dynamic_attributes());
    assert_eq!(catalog.descendants("Base"), &["Late".to_string()]);
}

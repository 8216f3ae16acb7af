use std::fs;

use pretty_assertions::assert_eq;
use shape_core::{SchemaError, Value};
use shape_schema::{KeyMode, Propagation, RegistryPolicy, SchemaManifest};
use tempfile::TempDir;

const USERS_TOML: &str = r#"
[[types]]
name = "User"
mode = "indifferent"

[[types.attributes]]
key = "name"
type = "string"

[[types.attributes]]
key = "role"
required = false
type = "string"
one_of = ["admin", "guest"]
default = "guest"

[[types.attributes]]
key = "age"
required = false
type = "int"
coercible = true
optional_type = true

[[types]]
name = "Admin"
parent = "User"
allow_dynamic_attributes = true

[[types.attributes]]
key = "role"
required = false
type = "string"
type_default = "admin"
"#;

#[test]
fn toml_manifest_builds_working_record_types() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("users.toml");
    fs::write(&path, USERS_TOML).unwrap();

    let catalog = SchemaManifest::load(&path)
        .unwrap()
        .into_catalog(Propagation::Snapshot, RegistryPolicy::default())
        .unwrap();
    assert_eq!(catalog.schema("User").unwrap().mode(), KeyMode::Indifferent);

    let user = catalog.record_type("User").unwrap();
    let record = user.construct([("name", "Yoda"), ("age", "900")]).unwrap();
    assert_eq!(record.get("role"), Some(&Value::from("guest")));
    assert_eq!(record.get("age"), Some(&Value::Int(900)));
    assert!(user.construct([("name", "Yoda"), ("role", "sith")]).is_err());
    assert!(user.empty().unwrap_err().is_missing_required());

    let mut admin = catalog
        .record_type("Admin")
        .unwrap()
        .construct([("name", "Mace")])
        .unwrap();
    assert_eq!(admin.get("role"), Some(&Value::from("admin")));
    admin.set("lightsaber", "purple").unwrap();
}

#[test]
fn json_manifest_is_detected_by_extension() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("schema.json");
    fs::write(
        &path,
        r#"{"types": [{"name": "Point", "attributes": [
            {"key": "x", "type": "float", "coercible": true},
            {"key": "y", "type": "float", "coercible": true}
        ]}]}"#,
    )
    .unwrap();

    let catalog = SchemaManifest::load(&path)
        .unwrap()
        .into_catalog(Propagation::Snapshot, RegistryPolicy::default())
        .unwrap();
    let point = catalog
        .record_type("Point")
        .unwrap()
        .construct([("x", Value::Int(1)), ("y", Value::from("2.5"))])
        .unwrap();
    assert_eq!(point.to_json(), serde_json::json!({"x": 1.0, "y": 2.5}));
}

#[test]
fn load_reports_path_on_failure() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.toml");
    fs::write(&path, "[[types]]\nmode = 3\n").unwrap();

    let SchemaError::InvalidManifest(message) = SchemaManifest::load(&path).unwrap_err() else {
        panic!("expected invalid manifest");
    };
    assert!(message.contains("broken.toml"), "{message}");

    let missing = dir.path().join("missing.toml");
    assert!(matches!(
        SchemaManifest::load(&missing),
        Err(SchemaError::InvalidManifest(_))
    ));
}

#[test]
fn manifests_extend_an_existing_catalog() {
    let mut catalog = SchemaManifest::from_toml_str(
        r#"
        [[types]]
        name = "Base"
        "#,
    )
    .unwrap()
    .into_catalog(Propagation::LiveCascade, RegistryPolicy::default())
    .unwrap();

    SchemaManifest::from_toml_str(
        r#"
        [[types]]
        name = "Child"
        parent = "Base"
        "#,
    )
    .unwrap()
    .register(&mut catalog)
    .unwrap();

    assert_eq!(catalog.parent("Child"), Some("Base"));
    let err = SchemaManifest::from_toml_str("[[types]]\nname = \"Base\"\n")
        .unwrap()
        .register(&mut catalog)
        .unwrap_err();
    assert_eq!(err, SchemaError::DuplicateRecordType("Base".into()));
}

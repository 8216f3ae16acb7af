//! Declarative schema manifests.
//!
//! A manifest describes record types in TOML or JSON:
//!
//! ```toml
//! [[types]]
//! name = "User"
//! mode = "indifferent"
//!
//! [[types.attributes]]
//! key = "name"
//! type = "string"
//! type_default = "Yoda"
//!
//! [[types]]
//! name = "Admin"
//! parent = "User"
//! allow_dynamic_attributes = true
//! ```
//!
//! Only data can be expressed here. Transforms, callbacks and derived defaults
//! are attached in code after loading.

use std::path::Path;

use serde::{Deserialize, Serialize};
use shape_core::{Primitive, SchemaError, Types, Value};

use crate::attribute::AttributeOptions;
use crate::catalog::{Propagation, TypeCatalog};
use crate::normalizer::KeyMode;
use crate::registry::RegistryPolicy;

/// Top-level manifest document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaManifest {
    #[serde(default)]
    pub types: Vec<TypeManifest>,
}

/// One record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeManifest {
    pub name: String,
    /// Key mode for root types. A subclass inherits its parent's mode.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<KeyMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_dynamic_attributes: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_nil_defaults: Option<bool>,
    #[serde(default)]
    pub attributes: Vec<AttributeManifest>,
}

/// One attribute of a record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeManifest {
    pub key: String,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<Primitive>,
    /// The type also accepts `nil`.
    #[serde(default)]
    pub optional_type: bool,
    #[serde(default)]
    pub coercible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<Vec<Value>>,
    /// Explicit literal default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Default carried by the type capability.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_default: Option<Value>,
}

const fn default_required() -> bool {
    true
}

impl AttributeManifest {
    fn has_type(&self) -> bool {
        self.ty.is_some()
            || self.optional_type
            || self.coercible
            || self.one_of.is_some()
            || self.type_default.is_some()
    }

    /// The type capability described by this entry, if any type setting is present.
    #[must_use]
    pub fn types(&self) -> Option<Types> {
        if !self.has_type() {
            return None;
        }
        let mut ty = Types::of(self.ty.unwrap_or(Primitive::Any));
        if self.optional_type {
            ty = ty.optional();
        }
        if self.coercible {
            ty = ty.coercible();
        }
        if let Some(allowed) = &self.one_of {
            ty = ty.one_of(allowed.iter().cloned());
        }
        if let Some(default) = &self.type_default {
            ty = ty.default(default.clone());
        }
        Some(ty)
    }

    /// Attribute options for this entry. Requiredness is applied by the caller.
    #[must_use]
    pub fn options(&self) -> AttributeOptions {
        let mut options = AttributeOptions::new();
        if let Some(ty) = self.types() {
            options = options.ty(ty);
        }
        if let Some(default) = &self.default {
            options = options.default(default.clone());
        }
        options
    }
}

impl SchemaManifest {
    /// # Errors
    ///
    /// `SchemaError::InvalidManifest` if the document does not parse.
    pub fn from_toml_str(source: &str) -> Result<Self, SchemaError> {
        toml::from_str(source).map_err(|e| SchemaError::InvalidManifest(e.to_string()))
    }

    /// # Errors
    ///
    /// `SchemaError::InvalidManifest` if the document does not parse.
    pub fn from_json_str(source: &str) -> Result<Self, SchemaError> {
        serde_json::from_str(source).map_err(|e| SchemaError::InvalidManifest(e.to_string()))
    }

    /// Read a manifest from disk. `.json` files are parsed as JSON, anything else as TOML.
    ///
    /// # Errors
    ///
    /// `SchemaError::InvalidManifest` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, SchemaError> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| SchemaError::InvalidManifest(format!("{}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let parsed = if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_toml_str(&source)
        };
        tracing::debug!(path = %path.display(), json = is_json, "loaded schema manifest");
        parsed.map_err(|e| match e {
            SchemaError::InvalidManifest(msg) => {
                SchemaError::InvalidManifest(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Give root types that name no mode the key mode `mode`.
    #[must_use]
    pub fn with_default_mode(mut self, mode: KeyMode) -> Self {
        for manifest in &mut self.types {
            if manifest.parent.is_none() && manifest.mode.is_none() {
                manifest.mode = Some(mode);
            }
        }
        self
    }

    /// Declare every type in `catalog`.
    ///
    /// Parents are declared before their children regardless of the order in the
    /// document.
    ///
    /// # Errors
    ///
    /// `UnknownRecordType` for a parent that is neither in the catalog nor in the
    /// manifest, `DuplicateRecordType`, `InvalidKeyType`, or `InvalidManifest` when
    /// a subclass names a mode different from its parent's.
    pub fn register(&self, catalog: &mut TypeCatalog) -> Result<(), SchemaError> {
        let mut pending: Vec<&TypeManifest> = self.types.iter().collect();
        while !pending.is_empty() {
            let before = pending.len();
            let mut deferred = Vec::new();
            for manifest in pending {
                let ready = manifest
                    .parent
                    .as_deref()
                    .is_none_or(|parent| catalog.contains(parent));
                if ready {
                    manifest.register(catalog)?;
                } else {
                    deferred.push(manifest);
                }
            }
            if deferred.len() == before {
                let parent = deferred[0].parent.clone().unwrap_or_default();
                return Err(SchemaError::UnknownRecordType(parent));
            }
            pending = deferred;
        }
        Ok(())
    }

    /// Build a fresh catalog holding every type in this manifest.
    ///
    /// # Errors
    ///
    /// As [`register`](Self::register).
    pub fn into_catalog(
        self,
        propagation: Propagation,
        policy: RegistryPolicy,
    ) -> Result<TypeCatalog, SchemaError> {
        let mut catalog = TypeCatalog::with_policy(propagation, policy);
        self.register(&mut catalog)?;
        Ok(catalog)
    }
}

impl TypeManifest {
    fn register(&self, catalog: &mut TypeCatalog) -> Result<(), SchemaError> {
        let name = self.name.as_str();
        match &self.parent {
            Some(parent) => {
                let inherited = catalog.subclass(parent, name)?.mode();
                if let Some(mode) = self.mode.filter(|mode| *mode != inherited) {
                    return Err(SchemaError::InvalidManifest(format!(
                        "{name}: mode {mode} differs from parent {parent} ({inherited})"
                    )));
                }
            }
            None => {
                catalog.declare(name, self.mode.unwrap_or_default())?;
            }
        }

        if let Some(allow) = self.allow_dynamic_attributes {
            catalog.set_allow_dynamic_attributes(name, allow)?;
        }
        if let Some(ignore) = self.ignore_nil_defaults {
            catalog.set_ignore_nil_defaults(name, ignore)?;
        }
        for attribute in &self.attributes {
            let options = attribute.options();
            if attribute.required {
                catalog.attribute(name, attribute.key.as_str(), options)?;
            } else {
                catalog.optional_attribute(name, attribute.key.as_str(), options)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn attribute_defaults() {
        let manifest = SchemaManifest::from_toml_str(
            r#"
            [[types]]
            name = "User"

            [[types.attributes]]
            key = "name"
            "#,
        )
        .unwrap();
        let attribute = &manifest.types[0].attributes[0];
        assert!(attribute.required);
        assert_eq!(attribute.types(), None);
        assert_eq!(manifest.types[0].mode, None);
    }

    #[test]
    fn type_settings_build_a_capability() {
        let attribute: AttributeManifest = serde_json::from_value(serde_json::json!({
            "key": "role",
            "type": "string",
            "optional_type": true,
            "one_of": ["admin", "guest"],
        }))
        .unwrap();
        let ty = attribute.types().unwrap();
        assert_eq!(ty.primitive(), Primitive::String);

        let any: AttributeManifest =
            serde_json::from_value(serde_json::json!({"key": "x", "coercible": true})).unwrap();
        assert_eq!(any.types().unwrap().primitive(), Primitive::Any);
    }

    #[test]
    fn unknown_type_name_is_rejected() {
        let err = SchemaManifest::from_json_str(
            r#"{"types": [{"name": "T", "attributes": [{"key": "a", "type": "decimal"}]}]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SchemaError::InvalidManifest(_)));
    }

    #[test]
    fn children_may_precede_parents() {
        let manifest = SchemaManifest::from_json_str(
            r#"{"types": [
                {"name": "Child", "parent": "Base"},
                {"name": "Base", "mode": "indifferent",
                 "attributes": [{"key": "id", "type": "int"}]}
            ]}"#,
        )
        .unwrap();
        let catalog = manifest
            .into_catalog(Propagation::Snapshot, RegistryPolicy::default())
            .unwrap();

        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["Base", "Child"]);
        let child = catalog.schema("Child").unwrap();
        assert_eq!(child.mode(), KeyMode::Indifferent);
        assert!(child.is_required("id"));
    }

    #[test]
    fn default_mode_fills_only_unset_roots() {
        let manifest = SchemaManifest::from_json_str(
            r#"{"types": [
                {"name": "A"},
                {"name": "B", "mode": "strict"},
                {"name": "C", "parent": "A"}
            ]}"#,
        )
        .unwrap()
        .with_default_mode(KeyMode::Indifferent);

        let modes: Vec<_> = manifest.types.iter().map(|t| t.mode).collect();
        assert_eq!(
            modes,
            vec![Some(KeyMode::Indifferent), Some(KeyMode::Strict), None]
        );
    }

    #[test]
    fn missing_parent_is_reported() {
        let manifest = SchemaManifest::from_json_str(
            r#"{"types": [{"name": "Orphan", "parent": "Ghost"}]}"#,
        )
        .unwrap();
        let err = manifest
            .into_catalog(Propagation::Snapshot, RegistryPolicy::default())
            .unwrap_err();
        assert_eq!(err, SchemaError::UnknownRecordType("Ghost".into()));
    }

    #[test]
    fn subclass_mode_must_match_parent() {
        let manifest = SchemaManifest::from_json_str(
            r#"{"types": [
                {"name": "Base", "mode": "strict"},
                {"name": "Child", "parent": "Base", "mode": "indifferent"}
            ]}"#,
        )
        .unwrap();
        assert!(matches!(
            manifest.into_catalog(Propagation::Snapshot, RegistryPolicy::default()),
            Err(SchemaError::InvalidManifest(_))
        ));
    }
}

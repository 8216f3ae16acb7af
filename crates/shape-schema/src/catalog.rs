//! Named record types, subclassing, and schema propagation.
//!
//! The catalog owns one [`SchemaRegistry`] per declared record type. Subclassing
//! copies the parent's registry at that moment and records the child's name on
//! the parent. Names are the only link between entries; the catalog never walks
//! them for ownership, only to re-apply a mutation when propagation is
//! [`Propagation::LiveCascade`].

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shape_core::{RawKey, SchemaError};

use crate::attribute::{AfterWrite, AttributeOptions};
use crate::normalizer::KeyMode;
use crate::record::RecordType;
use crate::registry::{RegistryPolicy, SchemaRegistry};

/// How mutations on a parent reach subclasses declared before them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Propagation {
    /// Subclasses keep the copy taken when they were declared.
    #[default]
    Snapshot,
    /// Every mutation is re-applied to all descendants, transitively.
    LiveCascade,
}

#[derive(Debug, Clone)]
struct Entry {
    schema: SchemaRegistry,
    parent: Option<String>,
    descendants: Vec<String>,
}

/// Registry of named record types.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    propagation: Propagation,
    policy: RegistryPolicy,
    entries: IndexMap<String, Entry>,
}

impl TypeCatalog {
    #[must_use]
    pub fn new(propagation: Propagation) -> Self {
        Self::with_policy(propagation, RegistryPolicy::default())
    }

    /// Catalog whose root types start from `policy`.
    #[must_use]
    pub fn with_policy(propagation: Propagation, policy: RegistryPolicy) -> Self {
        Self {
            propagation,
            policy,
            entries: IndexMap::new(),
        }
    }

    #[must_use]
    pub const fn propagation(&self) -> Propagation {
        self.propagation
    }

    /// Declare a root record type with an empty schema.
    ///
    /// # Errors
    ///
    /// `SchemaError::DuplicateRecordType` if `name` is taken.
    pub fn declare(
        &mut self,
        name: impl Into<String>,
        mode: KeyMode,
    ) -> Result<&mut SchemaRegistry, SchemaError> {
        let name = name.into();
        let schema = SchemaRegistry::with_policy(mode, self.policy);
        self.insert(name, schema, None)
    }

    /// Declare `name` as a subclass of `parent`, starting from a copy of the parent's schema.
    ///
    /// # Errors
    ///
    /// `SchemaError::UnknownRecordType` if `parent` is missing, or
    /// `SchemaError::DuplicateRecordType` if `name` is taken.
    pub fn subclass(
        &mut self,
        parent: &str,
        name: impl Into<String>,
    ) -> Result<&mut SchemaRegistry, SchemaError> {
        let name = name.into();
        let schema = self.entry(parent)?.schema.clone();
        if self.entries.contains_key(&name) {
            return Err(SchemaError::DuplicateRecordType(name));
        }
        if let Some(entry) = self.entries.get_mut(parent) {
            entry.descendants.push(name.clone());
        }
        tracing::debug!(parent, child = %name, "declared subclass");
        self.insert(name, schema, Some(parent.to_string()))
    }

    fn insert(
        &mut self,
        name: String,
        schema: SchemaRegistry,
        parent: Option<String>,
    ) -> Result<&mut SchemaRegistry, SchemaError> {
        if self.entries.contains_key(&name) {
            return Err(SchemaError::DuplicateRecordType(name));
        }
        let entry = self.entries.entry(name).or_insert(Entry {
            schema,
            parent,
            descendants: Vec::new(),
        });
        Ok(&mut entry.schema)
    }

    fn entry(&self, name: &str) -> Result<&Entry, SchemaError> {
        self.entries
            .get(name)
            .ok_or_else(|| SchemaError::UnknownRecordType(name.to_string()))
    }

    /// `name` followed by every tracked descendant, depth first.
    fn cascade_targets(&self, name: &str) -> Vec<String> {
        let mut targets = vec![name.to_string()];
        if self.propagation == Propagation::Snapshot {
            return targets;
        }
        let mut cursor = 0;
        while cursor < targets.len() {
            if let Some(entry) = self.entries.get(&targets[cursor]) {
                for child in &entry.descendants {
                    if !targets.contains(child) {
                        targets.push(child.clone());
                    }
                }
            }
            cursor += 1;
        }
        targets
    }

    /// Apply `op` to `name` and, under live cascade, to its descendants.
    fn mutate(
        &mut self,
        name: &str,
        op: impl Fn(&mut SchemaRegistry) -> Result<(), SchemaError>,
    ) -> Result<(), SchemaError> {
        self.entry(name)?;
        let targets = self.cascade_targets(name);
        if targets.len() > 1 {
            tracing::debug!(
                record_type = name,
                descendants = targets.len() - 1,
                "cascading schema change"
            );
        }
        for target in targets {
            // Stale descendant names are skipped.
            if let Some(entry) = self.entries.get_mut(&target) {
                op(&mut entry.schema)?;
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Mutators
    // -----------------------------------------------------------------------

    /// # Errors
    ///
    /// `UnknownRecordType` or `InvalidKeyType`.
    pub fn attribute(
        &mut self,
        name: &str,
        key: impl Into<RawKey>,
        options: AttributeOptions,
    ) -> Result<(), SchemaError> {
        let key = key.into();
        self.mutate(name, |schema| {
            schema.attribute(key.clone(), options.clone()).map(|_| ())
        })
    }

    /// # Errors
    ///
    /// `UnknownRecordType` or `InvalidKeyType`.
    pub fn optional_attribute(
        &mut self,
        name: &str,
        key: impl Into<RawKey>,
        options: AttributeOptions,
    ) -> Result<(), SchemaError> {
        let key = key.into();
        self.mutate(name, |schema| {
            schema
                .optional_attribute(key.clone(), options.clone())
                .map(|_| ())
        })
    }

    /// # Errors
    ///
    /// `UnknownRecordType` or `InvalidKeyType`.
    pub fn update_attribute(
        &mut self,
        name: &str,
        key: impl Into<RawKey>,
        options: AttributeOptions,
    ) -> Result<(), SchemaError> {
        let key = key.into();
        self.mutate(name, |schema| {
            schema
                .update_attribute(key.clone(), options.clone())
                .map(|_| ())
        })
    }

    /// # Errors
    ///
    /// `UnknownRecordType`.
    pub fn remove_attribute(
        &mut self,
        name: &str,
        key: impl Into<RawKey>,
    ) -> Result<(), SchemaError> {
        let key = key.into();
        self.mutate(name, |schema| {
            schema.remove_attribute(key.clone());
            Ok(())
        })
    }

    /// # Errors
    ///
    /// `UnknownRecordType`.
    pub fn after_write(&mut self, name: &str, callback: AfterWrite) -> Result<(), SchemaError> {
        self.mutate(name, |schema| {
            schema.after_write(callback.clone());
            Ok(())
        })
    }

    /// # Errors
    ///
    /// `UnknownRecordType`.
    pub fn set_allow_dynamic_attributes(
        &mut self,
        name: &str,
        allow: bool,
    ) -> Result<(), SchemaError> {
        self.mutate(name, |schema| {
            schema.set_allow_dynamic_attributes(allow);
            Ok(())
        })
    }

    /// # Errors
    ///
    /// `UnknownRecordType`.
    pub fn set_ignore_nil_defaults(
        &mut self,
        name: &str,
        ignore: bool,
    ) -> Result<(), SchemaError> {
        self.mutate(name, |schema| {
            schema.set_ignore_nil_defaults(ignore);
            Ok(())
        })
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn schema(&self, name: &str) -> Option<&SchemaRegistry> {
        self.entries.get(name).map(|entry| &entry.schema)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    #[must_use]
    pub fn parent(&self, name: &str) -> Option<&str> {
        self.entries.get(name)?.parent.as_deref()
    }

    #[must_use]
    pub fn descendants(&self, name: &str) -> &[String] {
        self.entries
            .get(name)
            .map_or(&[], |entry| entry.descendants.as_slice())
    }

    /// Declared names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Freeze the current schema of `name` into a record type.
    ///
    /// Later catalog mutations do not affect the returned type.
    ///
    /// # Errors
    ///
    /// `SchemaError::UnknownRecordType` if `name` is not declared.
    pub fn record_type(&self, name: &str) -> Result<Arc<RecordType>, SchemaError> {
        let entry = self.entry(name)?;
        Ok(RecordType::new(name, entry.schema.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn declare_rejects_duplicates() {
        let mut catalog = TypeCatalog::default();
        catalog.declare("User", KeyMode::Strict).unwrap();
        assert_eq!(
            catalog.declare("User", KeyMode::Strict).unwrap_err(),
            SchemaError::DuplicateRecordType("User".into())
        );
    }

    #[test]
    fn subclass_of_unknown_parent_fails() {
        let mut catalog = TypeCatalog::default();
        assert_eq!(
            catalog.subclass("Nope", "Child").unwrap_err(),
            SchemaError::UnknownRecordType("Nope".into())
        );
        assert!(catalog.is_empty());
    }

    #[test]
    fn subclass_tracks_parent_and_descendants() {
        let mut catalog = TypeCatalog::default();
        catalog.declare("Base", KeyMode::Indifferent).unwrap();
        catalog.subclass("Base", "Child").unwrap();
        catalog.subclass("Child", "Grandchild").unwrap();

        assert_eq!(catalog.parent("Grandchild"), Some("Child"));
        assert_eq!(catalog.descendants("Base"), &["Child".to_string()]);
        assert_eq!(
            catalog.schema("Grandchild").unwrap().mode(),
            KeyMode::Indifferent
        );
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["Base", "Child", "Grandchild"]
        );
    }

    #[test]
    fn root_types_start_from_catalog_policy() {
        let policy = RegistryPolicy {
            allow_dynamic_attributes: true,
            ignore_nil_defaults: false,
        };
        let mut catalog = TypeCatalog::with_policy(Propagation::Snapshot, policy);
        let schema = catalog.declare("Open", KeyMode::Strict).unwrap();
        assert!(schema.allow_dynamic_attributes());
        assert!(!schema.ignore_nil_defaults());
    }

    #[test]
    fn record_type_is_frozen() {
        let mut catalog = TypeCatalog::default();
        catalog.declare("User", KeyMode::Strict).unwrap();
        let frozen = catalog.record_type("User").unwrap();
        catalog
            .attribute("User", "name", AttributeOptions::new())
            .unwrap();

        assert!(!frozen.schema().has_attribute("name"));
        assert!(
            catalog
                .record_type("User")
                .unwrap()
                .schema()
                .has_attribute("name")
        );
        assert!(catalog.record_type("Ghost").is_err());
    }

    #[test]
    fn mutating_unknown_type_fails() {
        let mut catalog = TypeCatalog::default();
        assert!(matches!(
            catalog.set_allow_dynamic_attributes("Ghost", true),
            Err(SchemaError::UnknownRecordType(_))
        ));
    }
}

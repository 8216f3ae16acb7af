//! Per-record-type schema registry.
//!
//! A `SchemaRegistry` holds the ordered attribute definitions, the after-write
//! callbacks, and the two policy flags of one record type. It is mutated during
//! setup and then frozen inside a [`RecordType`](crate::RecordType).
//!
//! `Clone` is the subclassing copy: definitions are copied (literal defaults
//! included), closures are shared immutable `Arc`s, and later changes to either
//! registry never reach the other.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use shape_core::{Key, RawKey, SchemaError};

use crate::attribute::{AfterWrite, AttributeDefinition, AttributeOptions};
use crate::normalizer::{KeyMode, KeyNormalizer};

/// Policy flags a new registry starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryPolicy {
    /// Accept writes to undeclared keys.
    pub allow_dynamic_attributes: bool,
    /// Do not store `Nil` results of default resolution for optional attributes.
    pub ignore_nil_defaults: bool,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self {
            allow_dynamic_attributes: false,
            ignore_nil_defaults: true,
        }
    }
}

/// Attribute definitions, callbacks, and policy for one record type.
#[derive(Debug, Clone)]
pub struct SchemaRegistry {
    mode: KeyMode,
    attributes: IndexMap<Key, AttributeDefinition>,
    after_write: Vec<AfterWrite>,
    policy: RegistryPolicy,
}

impl SchemaRegistry {
    /// Empty registry with the default policy.
    #[must_use]
    pub fn new(mode: KeyMode) -> Self {
        Self::with_policy(mode, RegistryPolicy::default())
    }

    #[must_use]
    pub fn with_policy(mode: KeyMode, policy: RegistryPolicy) -> Self {
        Self {
            mode,
            attributes: IndexMap::new(),
            after_write: Vec::new(),
            policy,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> KeyMode {
        self.mode
    }

    #[must_use]
    pub fn normalizer(&self) -> &'static dyn KeyNormalizer {
        self.mode.normalizer()
    }

    // -----------------------------------------------------------------------
    // Registration
    // -----------------------------------------------------------------------

    /// Register a required attribute. Re-registering a key replaces its definition.
    ///
    /// # Errors
    ///
    /// `SchemaError::InvalidKeyType` if the key kind cannot name an attribute in this mode.
    pub fn attribute(
        &mut self,
        key: impl Into<RawKey>,
        options: AttributeOptions,
    ) -> Result<&mut Self, SchemaError> {
        self.register(key.into(), options.required(true), AttributeDefinition::default())
    }

    /// Register an optional attribute.
    ///
    /// # Errors
    ///
    /// `SchemaError::InvalidKeyType` if the key kind cannot name an attribute in this mode.
    pub fn optional_attribute(
        &mut self,
        key: impl Into<RawKey>,
        options: AttributeOptions,
    ) -> Result<&mut Self, SchemaError> {
        self.register(key.into(), options.required(false), AttributeDefinition::default())
    }

    /// Merge `options` onto the existing definition (or an empty one) and register it.
    ///
    /// # Errors
    ///
    /// `SchemaError::InvalidKeyType` if the key kind cannot name an attribute in this mode.
    pub fn update_attribute(
        &mut self,
        key: impl Into<RawKey>,
        options: AttributeOptions,
    ) -> Result<&mut Self, SchemaError> {
        let key = self.normalizer().attribute_key(key.into())?;
        let base = self.attributes.get(&key).cloned().unwrap_or_default();
        self.register(RawKey::Key(key), options, base)
    }

    fn register(
        &mut self,
        key: RawKey,
        options: AttributeOptions,
        base: AttributeDefinition,
    ) -> Result<&mut Self, SchemaError> {
        let key = self.normalizer().attribute_key(key)?;
        let definition = options.apply_to(base);
        let ty = definition.type_name();
        tracing::debug!(
            attribute = %key,
            required = definition.required,
            ty = ty.as_deref().unwrap_or("-"),
            "registered attribute"
        );
        self.attributes.insert(key, definition);
        Ok(self)
    }

    /// Remove an attribute definition, keeping the order of the others.
    pub fn remove_attribute(&mut self, key: impl Into<RawKey>) -> Option<AttributeDefinition> {
        let key = self.normalizer().attribute_key(key.into()).ok()?;
        let removed = self.attributes.shift_remove(&key);
        if removed.is_some() {
            tracing::debug!(attribute = %key, "removed attribute");
        }
        removed
    }

    /// Register a callback run after every write.
    pub fn after_write(&mut self, callback: AfterWrite) -> &mut Self {
        self.after_write.push(callback);
        self
    }

    pub fn set_allow_dynamic_attributes(&mut self, allow: bool) -> &mut Self {
        self.policy.allow_dynamic_attributes = allow;
        self
    }

    pub fn set_ignore_nil_defaults(&mut self, ignore: bool) -> &mut Self {
        self.policy.ignore_nil_defaults = ignore;
        self
    }

    // -----------------------------------------------------------------------
    // Introspection
    // -----------------------------------------------------------------------

    /// Whether `key` is declared. Keys are normalized with the registry's mode first.
    #[must_use]
    pub fn has_attribute(&self, key: impl Into<RawKey>) -> bool {
        self.lookup(key.into()).is_some()
    }

    /// Whether `key` is declared as required at the schema level.
    #[must_use]
    pub fn is_required(&self, key: impl Into<RawKey>) -> bool {
        self.lookup(key.into()).is_some_and(|def| def.required)
    }

    fn lookup(&self, key: RawKey) -> Option<&AttributeDefinition> {
        let key = self.normalizer().normalize_key(key).ok()?;
        self.attributes.get(&key)
    }

    /// Definition for an already-canonical key.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&AttributeDefinition> {
        self.attributes.get(key)
    }

    /// Declared attributes in declaration order.
    pub fn attributes(&self) -> impl Iterator<Item = (&Key, &AttributeDefinition)> {
        self.attributes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    #[must_use]
    pub fn after_write_callbacks(&self) -> &[AfterWrite] {
        &self.after_write
    }

    #[must_use]
    pub const fn allow_dynamic_attributes(&self) -> bool {
        self.policy.allow_dynamic_attributes
    }

    #[must_use]
    pub const fn ignore_nil_defaults(&self) -> bool {
        self.policy.ignore_nil_defaults
    }

    #[must_use]
    pub const fn policy(&self) -> RegistryPolicy {
        self.policy
    }
}

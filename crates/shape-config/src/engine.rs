//! Schema engine defaults.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shape_schema::{KeyMode, Propagation, RegistryPolicy, SchemaRegistry, TypeCatalog};

const fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Key mode for record types declared without an explicit one.
    #[serde(default)]
    pub key_mode: KeyMode,

    /// Whether new record types accept undeclared keys.
    #[serde(default)]
    pub allow_dynamic_attributes: bool,

    /// Whether `nil` defaults of optional attributes are dropped instead of stored.
    #[serde(default = "default_true")]
    pub ignore_nil_defaults: bool,

    /// How schema changes on a parent reach existing subclasses.
    #[serde(default)]
    pub propagation: Propagation,

    /// Manifest used when no schema is given on the command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            key_mode: KeyMode::default(),
            allow_dynamic_attributes: false,
            ignore_nil_defaults: default_true(),
            propagation: Propagation::default(),
            manifest: None,
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub const fn policy(&self) -> RegistryPolicy {
        RegistryPolicy {
            allow_dynamic_attributes: self.allow_dynamic_attributes,
            ignore_nil_defaults: self.ignore_nil_defaults,
        }
    }

    /// Empty catalog using the configured propagation and policy.
    #[must_use]
    pub fn catalog(&self) -> TypeCatalog {
        TypeCatalog::with_policy(self.propagation, self.policy())
    }

    /// Empty registry using the configured key mode and policy.
    #[must_use]
    pub fn registry(&self) -> SchemaRegistry {
        SchemaRegistry::with_policy(self.key_mode, self.policy())
    }
}

//! Error types for schema registration and record writes.
//!
//! Each family maps to one kind of violation. `RecordError` is the umbrella
//! returned by record operations; every family converts into it with `?`.
//! Nothing is retried or swallowed: errors surface at the point of violation.

use thiserror::Error;

/// Schema-definition errors (invalid declarations, conflicting default sources).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// Attribute declared with a key of a kind the mode does not accept.
    #[error("attribute key must be {expected}, got {got}")]
    InvalidKeyType { expected: &'static str, got: String },

    /// Both an explicit default and a type-provided default on one attribute.
    #[error("attribute '{key}' has both an explicit default and a type default")]
    ConflictingDefaults { key: String },

    /// Manifest referenced a type capability that does not exist.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// Catalog lookup for an undeclared record type.
    #[error("record type '{0}' is not declared")]
    UnknownRecordType(String),

    /// A record type with this name is already declared in the catalog.
    #[error("record type '{0}' is already declared")]
    DuplicateRecordType(String),

    /// Manifest could not be read or parsed.
    #[error("invalid manifest: {0}")]
    InvalidManifest(String),
}

/// Attribute-level violations found while writing or validating a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttributeError {
    #[error("the attribute '{key}' is required")]
    MissingRequired { key: String },

    #[error("the attribute '{key}' is not defined for {record_type}")]
    UndeclaredAttribute { key: String, record_type: String },
}

/// A key of a kind the active key mode cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("unsupported key kind '{kind}' in {mode} mode")]
    UnsupportedKeyKind {
        kind: &'static str,
        mode: &'static str,
    },
}

/// Raised by a type capability when a value fails coercion.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{type_name}: {message}")]
pub struct ConstraintError {
    /// Name of the type capability that rejected the value.
    pub type_name: String,
    /// Diagnostic from the capability.
    pub message: String,
}

impl ConstraintError {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// Errors from the generic path utilities.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// `bury` needs at least one path segment.
    #[error("path must contain at least one segment")]
    PathTooShort,

    /// An intermediate segment exists but is not a map.
    #[error("segment '{segment}' holds a {kind}, not a map")]
    Blocked { segment: String, kind: &'static str },

    /// Input to a tree walk was not a map or list.
    #[error("expected a map or list, got {0}")]
    NotAContainer(&'static str),
}

/// Umbrella error for record construction, writes, and callbacks.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Attribute(#[from] AttributeError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Constraint(#[from] ConstraintError),

    /// Construction input was not map-like.
    #[error("record input must be a map, got {0}")]
    InputNotMap(&'static str),

    /// Catch-all for errors raised from user callbacks.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RecordError {
    /// Whether this is a missing-required violation.
    #[must_use]
    pub const fn is_missing_required(&self) -> bool {
        matches!(self, Self::Attribute(AttributeError::MissingRequired { .. }))
    }

    /// Whether this is an undeclared-attribute violation.
    #[must_use]
    pub const fn is_undeclared(&self) -> bool {
        matches!(
            self,
            Self::Attribute(AttributeError::UndeclaredAttribute { .. })
        )
    }
}

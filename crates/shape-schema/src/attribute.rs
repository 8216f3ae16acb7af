//! Attribute definitions and the closures they carry.

use std::fmt;
use std::sync::Arc;

use shape_core::{ConstraintError, Key, RecordError, SchemaError, SharedType, TypeCapability, Value};

use crate::record::Record;

type ThunkFn = dyn Fn() -> Value + Send + Sync;
type DeriveFn = dyn Fn(&Record) -> Value + Send + Sync;
type TransformFn = dyn Fn(&Key, Value, &Record) -> Value + Send + Sync;
type AfterWriteFn = dyn Fn(&mut Record, Option<&Key>) -> Result<(), RecordError> + Send + Sync;

/// Which source a default comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultKind {
    Literal,
    Thunk,
    Derived,
}

/// An explicit attribute default.
///
/// Literals are cloned on every resolution, so no two records ever alias the
/// same default object.
#[derive(Clone)]
pub enum DefaultValue {
    /// Used as-is.
    Literal(Value),
    /// Zero-argument producer.
    Thunk(Arc<ThunkFn>),
    /// Computed from the in-progress record (sibling fields and earlier defaults).
    Derived(Arc<DeriveFn>),
}

impl DefaultValue {
    #[must_use]
    pub const fn kind(&self) -> DefaultKind {
        match self {
            Self::Literal(_) => DefaultKind::Literal,
            Self::Thunk(_) => DefaultKind::Thunk,
            Self::Derived(_) => DefaultKind::Derived,
        }
    }

    pub(crate) fn produce(&self, record: &Record) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Thunk(f) => f(),
            Self::Derived(f) => f(record),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Thunk(_) => f.write_str("Thunk(..)"),
            Self::Derived(_) => f.write_str("Derived(..)"),
        }
    }
}

/// Callback run after every write, and once with `None` when construction completes.
#[derive(Clone)]
pub struct AfterWrite(Arc<AfterWriteFn>);

impl AfterWrite {
    pub fn new(
        f: impl Fn(&mut Record, Option<&Key>) -> Result<(), RecordError> + Send + Sync + 'static,
    ) -> Self {
        Self(Arc::new(f))
    }

    pub(crate) fn call(&self, record: &mut Record, key: Option<&Key>) -> Result<(), RecordError> {
        (self.0)(record, key)
    }
}

impl fmt::Debug for AfterWrite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AfterWrite(..)")
    }
}

// ---------------------------------------------------------------------------
// AttributeDefinition
// ---------------------------------------------------------------------------

/// One declared key of a schema.
#[derive(Clone, Default)]
pub struct AttributeDefinition {
    pub required: bool,
    pub ty: Option<SharedType>,
    pub default: Option<DefaultValue>,
    pub transform: Option<Arc<TransformFn>>,
}

impl AttributeDefinition {
    /// Whether the type capability provides its own default.
    #[must_use]
    pub fn has_type_default(&self) -> bool {
        self.ty.as_ref().is_some_and(|ty| ty.has_default())
    }

    /// Resolve the default for an absent attribute.
    ///
    /// Returns `Ok(None)` when neither an explicit nor a type default exists.
    ///
    /// # Errors
    ///
    /// `SchemaError::ConflictingDefaults` when both sources are present, or the
    /// capability's `ConstraintError` if it fails to produce its default.
    pub fn resolve_default(
        &self,
        key: &Key,
        record: &Record,
    ) -> Result<Option<Value>, RecordError> {
        match (&self.default, self.has_type_default()) {
            (Some(_), true) => Err(SchemaError::ConflictingDefaults {
                key: key.to_string(),
            }
            .into()),
            (Some(default), false) => Ok(Some(default.produce(record))),
            (None, true) => {
                let ty = self.ty.as_ref().map(|ty| ty.coerce_undefined());
                Ok(ty.transpose()?)
            }
            (None, false) => Ok(None),
        }
    }

    /// Transform then coerce a candidate value.
    ///
    /// # Errors
    ///
    /// Passes through the type capability's `ConstraintError`.
    pub fn prepare(
        &self,
        key: &Key,
        value: Value,
        record: &Record,
    ) -> Result<Value, ConstraintError> {
        let value = match &self.transform {
            Some(transform) => transform(key, value, record),
            None => value,
        };
        match &self.ty {
            Some(ty) => ty.coerce(value),
            None => Ok(value),
        }
    }

    /// Name of the attached type capability, if any.
    #[must_use]
    pub fn type_name(&self) -> Option<String> {
        self.ty.as_ref().map(|ty| ty.name())
    }
}

impl fmt::Debug for AttributeDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeDefinition")
            .field("required", &self.required)
            .field("ty", &self.type_name())
            .field("default", &self.default)
            .field("transform", &self.transform.as_ref().map(|_| ".."))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// AttributeOptions
// ---------------------------------------------------------------------------

/// Partial attribute settings.
///
/// `attribute` / `optional_attribute` apply these onto an empty definition;
/// `update_attribute` applies them onto the existing one, so only the fields
/// set here change.
#[derive(Clone, Default)]
pub struct AttributeOptions {
    required: Option<bool>,
    ty: Option<SharedType>,
    default: Option<DefaultValue>,
    transform: Option<Arc<TransformFn>>,
}

impl AttributeOptions {
    #[must_use]
    pub fn new() -> Self {
        <Self as Default>::default()
    }

    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    #[must_use]
    pub fn ty(mut self, ty: impl TypeCapability + 'static) -> Self {
        self.ty = Some(Arc::new(ty));
        self
    }

    #[must_use]
    pub fn shared_ty(mut self, ty: SharedType) -> Self {
        self.ty = Some(ty);
        self
    }

    /// Literal default, cloned for every record.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Default produced by a zero-argument closure.
    #[must_use]
    pub fn default_with(mut self, f: impl Fn() -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Thunk(Arc::new(f)));
        self
    }

    /// Default computed from the record under construction.
    #[must_use]
    pub fn default_from(mut self, f: impl Fn(&Record) -> Value + Send + Sync + 'static) -> Self {
        self.default = Some(DefaultValue::Derived(Arc::new(f)));
        self
    }

    /// Transform applied to every written value, before type coercion.
    #[must_use]
    pub fn transform(
        mut self,
        f: impl Fn(&Key, Value, &Record) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Arc::new(f));
        self
    }

    /// Overlay the fields set here onto `definition`.
    #[must_use]
    pub fn apply_to(self, mut definition: AttributeDefinition) -> AttributeDefinition {
        if let Some(required) = self.required {
            definition.required = required;
        }
        if self.ty.is_some() {
            definition.ty = self.ty;
        }
        if self.default.is_some() {
            definition.default = self.default;
        }
        if self.transform.is_some() {
            definition.transform = self.transform;
        }
        definition
    }
}

impl fmt::Debug for AttributeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeOptions")
            .field("required", &self.required)
            .field("ty", &self.ty.as_ref().map(|ty| ty.name()))
            .field("default", &self.default)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shape_core::Types;

    #[test]
    fn apply_to_only_overrides_set_fields() {
        let base = AttributeOptions::new()
            .required(true)
            .ty(Types::string())
            .default("John")
            .apply_to(AttributeDefinition::default());

        let updated = AttributeOptions::new().required(false).apply_to(base);
        assert!(!updated.required);
        assert_eq!(updated.type_name().as_deref(), Some("string"));
        assert_eq!(updated.default.map(|d| d.kind()), Some(DefaultKind::Literal));
    }

    #[test]
    fn default_kinds_are_tagged() {
        let thunk = AttributeOptions::new()
            .default_with(|| Value::from(1))
            .apply_to(AttributeDefinition::default());
        assert_eq!(thunk.default.unwrap().kind(), DefaultKind::Thunk);

        let derived = AttributeOptions::new()
            .default_from(|_| Value::Nil)
            .apply_to(AttributeDefinition::default());
        assert_eq!(derived.default.unwrap().kind(), DefaultKind::Derived);
    }

    #[test]
    fn type_default_detection() {
        let with = AttributeOptions::new()
            .ty(Types::string().default("Yoda"))
            .apply_to(AttributeDefinition::default());
        assert!(with.has_type_default());

        let without = AttributeOptions::new()
            .ty(Types::string())
            .apply_to(AttributeDefinition::default());
        assert!(!without.has_type_default());
    }
}

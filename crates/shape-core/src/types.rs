//! Type capabilities: per-attribute validators and coercers.
//!
//! The attribute engine only sees the [`TypeCapability`] trait. [`Types`] is the
//! built-in implementation: a primitive kind plus `optional`, `coercible`,
//! `default` and `one_of` modifiers.
//!
//! ```
//! use shape_core::{TypeCapability, Types, Value};
//!
//! let age = Types::int().coercible();
//! assert_eq!(age.coerce(Value::from("42")).unwrap(), Value::Int(42));
//!
//! let name = Types::string().default("Yoda");
//! assert!(name.has_default());
//! assert_eq!(name.coerce_undefined().unwrap(), Value::from("Yoda"));
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{ConstraintError, SchemaError};
use crate::value::Value;

/// Validator/coercer attached to an attribute.
pub trait TypeCapability: fmt::Debug + Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> String;

    /// Whether this capability can produce a value for an absent input.
    fn has_default(&self) -> bool {
        false
    }

    /// Validate `value`, returning the (possibly converted) value.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintError` when the value does not satisfy the type.
    fn coerce(&self, value: Value) -> Result<Value, ConstraintError>;

    /// Produce the built-in default. Only called when `has_default()` is true.
    ///
    /// # Errors
    ///
    /// Returns `ConstraintError` when no default is available.
    fn coerce_undefined(&self) -> Result<Value, ConstraintError> {
        Err(ConstraintError::new(self.name(), "no default available"))
    }
}

/// Shared handle to a type capability.
pub type SharedType = Arc<dyn TypeCapability>;

// ---------------------------------------------------------------------------
// Primitive
// ---------------------------------------------------------------------------

/// Primitive kinds understood by the built-in [`Types`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Primitive {
    Any,
    Nil,
    Bool,
    Int,
    Float,
    String,
    Symbol,
    List,
    Map,
}

impl Primitive {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Nil => "nil",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::Symbol => "symbol",
            Self::List => "list",
            Self::Map => "map",
        }
    }

    /// Whether `value` already has this primitive's shape.
    #[must_use]
    pub const fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::Any, _)
                | (Self::Nil, Value::Nil)
                | (Self::Bool, Value::Bool(_))
                | (Self::Int, Value::Int(_))
                | (Self::Float, Value::Float(_))
                | (Self::String, Value::Str(_))
                | (Self::Symbol, Value::Symbol(_))
                | (Self::List, Value::List(_))
                | (Self::Map, Value::Map(_))
        )
    }

    /// Lenient conversion into this primitive. `None` when no conversion applies.
    #[allow(clippy::cast_precision_loss)]
    fn convert(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Int, Value::Str(s)) => s.trim().parse().ok().map(Value::Int),
            (Self::Int, Value::Float(f)) => float_to_int(*f).map(Value::Int),
            (Self::Float, Value::Int(i)) => Some(Value::Float(*i as f64)),
            (Self::Float, Value::Str(s)) => s.trim().parse().ok().map(Value::Float),
            (Self::String, Value::Symbol(s)) => Some(Value::Str(s.clone())),
            (Self::String, Value::Int(i)) => Some(Value::Str(i.to_string())),
            (Self::String, Value::Float(f)) => Some(Value::Str(f.to_string())),
            (Self::String, Value::Bool(b)) => Some(Value::Str(b.to_string())),
            (Self::Symbol, Value::Str(s)) => Some(Value::Symbol(s.clone())),
            (Self::Bool, Value::Str(s)) => match s.as_str() {
                "true" | "1" | "yes" | "on" => Some(Value::Bool(true)),
                "false" | "0" | "no" | "off" => Some(Value::Bool(false)),
                _ => None,
            },
            (Self::Bool, Value::Int(1)) => Some(Value::Bool(true)),
            (Self::Bool, Value::Int(0)) => Some(Value::Bool(false)),
            _ => None,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Primitive {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(Self::Any),
            "nil" => Ok(Self::Nil),
            "bool" | "boolean" => Ok(Self::Bool),
            "int" | "integer" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "string" => Ok(Self::String),
            "symbol" => Ok(Self::Symbol),
            "list" | "array" => Ok(Self::List),
            "map" | "hash" => Ok(Self::Map),
            other => Err(SchemaError::UnknownType(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Built-in type capability.
#[derive(Debug, Clone, PartialEq)]
pub struct Types {
    primitive: Primitive,
    optional: bool,
    coercible: bool,
    default: Option<Value>,
    allowed: Option<Vec<Value>>,
}

impl Types {
    #[must_use]
    pub const fn of(primitive: Primitive) -> Self {
        Self {
            primitive,
            optional: false,
            coercible: false,
            default: None,
            allowed: None,
        }
    }

    #[must_use]
    pub const fn any() -> Self {
        Self::of(Primitive::Any)
    }

    #[must_use]
    pub const fn nil() -> Self {
        Self::of(Primitive::Nil)
    }

    #[must_use]
    pub const fn bool() -> Self {
        Self::of(Primitive::Bool)
    }

    #[must_use]
    pub const fn int() -> Self {
        Self::of(Primitive::Int)
    }

    #[must_use]
    pub const fn float() -> Self {
        Self::of(Primitive::Float)
    }

    #[must_use]
    pub const fn string() -> Self {
        Self::of(Primitive::String)
    }

    #[must_use]
    pub const fn symbol() -> Self {
        Self::of(Primitive::Symbol)
    }

    #[must_use]
    pub const fn list() -> Self {
        Self::of(Primitive::List)
    }

    #[must_use]
    pub const fn map() -> Self {
        Self::of(Primitive::Map)
    }

    /// Accept `Nil` in addition to the primitive.
    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Convert compatible values (e.g. `"42"` into an int) instead of rejecting them.
    #[must_use]
    pub const fn coercible(mut self) -> Self {
        self.coercible = true;
        self
    }

    /// Provide a type-level default for absent attributes.
    #[must_use]
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restrict accepted values to an enumeration.
    #[must_use]
    pub fn one_of(mut self, values: impl IntoIterator<Item = impl Into<Value>>) -> Self {
        self.allowed = Some(values.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub const fn primitive(&self) -> Primitive {
        self.primitive
    }

    /// Wrap into a shared handle.
    #[must_use]
    pub fn shared(self) -> SharedType {
        Arc::new(self)
    }

    fn check_allowed(&self, value: Value) -> Result<Value, ConstraintError> {
        match &self.allowed {
            Some(allowed) if !value.is_nil() && !allowed.contains(&value) => Err(
                ConstraintError::new(self.name(), format!("{value:?} is not an allowed value")),
            ),
            _ => Ok(value),
        }
    }
}

impl TypeCapability for Types {
    fn name(&self) -> String {
        let mut name = String::new();
        if self.coercible {
            name.push_str("coercible.");
        }
        name.push_str(self.primitive.as_str());
        if self.optional {
            name.push('?');
        }
        name
    }

    fn has_default(&self) -> bool {
        self.default.is_some()
    }

    fn coerce(&self, value: Value) -> Result<Value, ConstraintError> {
        if value.is_nil() {
            return if self.optional || matches!(self.primitive, Primitive::Any | Primitive::Nil) {
                Ok(Value::Nil)
            } else {
                Err(ConstraintError::new(self.name(), "nil violates constraints"))
            };
        }

        if self.primitive.matches(&value) {
            return self.check_allowed(value);
        }

        if self.coercible {
            if let Some(converted) = self.primitive.convert(&value) {
                return self.check_allowed(converted);
            }
        }

        Err(ConstraintError::new(
            self.name(),
            format!("{} is not a {}", value.type_name(), self.primitive),
        ))
    }

    fn coerce_undefined(&self) -> Result<Value, ConstraintError> {
        self.default
            .clone()
            .ok_or_else(|| ConstraintError::new(self.name(), "no default available"))
    }
}

/// Truncate toward zero, or `None` when the result does not fit an `i64`.
#[allow(clippy::cast_possible_truncation)]
fn float_to_int(f: f64) -> Option<i64> {
    // 2^63; `i64::MAX as f64` rounds up to this.
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    let truncated = f.trunc();
    (truncated >= -BOUND && truncated < BOUND).then(|| truncated as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[test]
    fn strict_types_reject_mismatches() {
        let err = Types::string().coerce(Value::from(1)).unwrap_err();
        assert_eq!(err.type_name, "string");
        assert_eq!(err.message, "int is not a string");
    }

    #[test]
    fn nil_needs_optional() {
        assert!(Types::string().coerce(Value::Nil).is_err());
        assert_eq!(Types::string().optional().coerce(Value::Nil).unwrap(), Value::Nil);
        assert_eq!(Types::any().coerce(Value::Nil).unwrap(), Value::Nil);
    }

    #[rstest]
    #[case(Types::int(), Value::from("42"), Value::Int(42))]
    #[case(Types::int(), Value::from(2.9), Value::Int(2))]
    #[case(Types::float(), Value::from(3), Value::Float(3.0))]
    #[case(Types::string(), Value::sym("admin"), Value::from("admin"))]
    #[case(Types::symbol(), Value::from("admin"), Value::sym("admin"))]
    #[case(Types::bool(), Value::from("false"), Value::Bool(false))]
    fn coercible_types_convert(#[case] ty: Types, #[case] input: Value, #[case] expected: Value) {
        assert_eq!(ty.coercible().coerce(input).unwrap(), expected);
    }

    #[test]
    fn coercible_still_rejects_garbage() {
        assert!(Types::int().coercible().coerce(Value::from("forty")).is_err());
        assert!(Types::int().coercible().coerce(Value::from(1e300)).is_err());
        assert!(Types::int().coercible().coerce(Value::from(-1e19)).is_err());
        assert!(Types::int().coercible().coerce(Value::from(f64::NAN)).is_err());
        assert!(Types::map().coercible().coerce(Value::from(1)).is_err());
    }

    #[test]
    fn one_of_restricts_values() {
        let role = Types::string().one_of(["admin", "member"]);
        assert!(role.coerce(Value::from("admin")).is_ok());
        assert!(role.coerce(Value::from("root")).is_err());
    }

    #[test]
    fn default_is_exposed_through_coerce_undefined() {
        let ty = Types::map().default(Value::Map(crate::Map::new()));
        assert!(ty.has_default());
        assert_eq!(ty.coerce_undefined().unwrap(), Value::Map(crate::Map::new()));
        assert!(!Types::map().has_default());
        assert!(Types::map().coerce_undefined().is_err());
    }

    #[test]
    fn names_reflect_modifiers() {
        assert_eq!(Types::int().coercible().optional().name(), "coercible.int?");
    }

    #[test]
    fn primitive_parses_aliases() {
        assert_eq!("integer".parse::<Primitive>().unwrap(), Primitive::Int);
        assert_eq!("hash".parse::<Primitive>().unwrap(), Primitive::Map);
        assert!(matches!(
            "date".parse::<Primitive>(),
            Err(SchemaError::UnknownType(_))
        ));
    }
}

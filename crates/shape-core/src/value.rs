//! Value model for records.
//!
//! `Value` is a closed tagged variant. Maps are insertion-ordered and keyed by
//! [`Key`], so nested containers can carry symbol keys (strict mode) or string
//! keys (indifferent mode) without losing the distinction.

use std::fmt;
use std::hash::{Hash, Hasher};

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Insertion-ordered map used for record storage and nested map values.
pub type Map = IndexMap<Key, Value>;

// ---------------------------------------------------------------------------
// Key
// ---------------------------------------------------------------------------

/// A canonical atomic key.
///
/// These four kinds are the strict-mode whitelist. `Symbol("name")` and
/// `Str("name")` are distinct keys; indifferent mode collapses both to `Str`.
#[derive(Debug, Clone)]
pub enum Key {
    Symbol(String),
    Str(String),
    Int(i64),
    Float(f64),
}

impl Key {
    /// Build a symbol key.
    #[must_use]
    pub fn sym(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    /// Build a string key.
    #[must_use]
    pub fn string(name: impl Into<String>) -> Self {
        Self::Str(name.into())
    }

    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Symbol(_) => "symbol",
            Self::Str(_) => "string",
            Self::Int(_) => "integer",
            Self::Float(_) => "float",
        }
    }

    /// Borrow the textual payload of a symbol or string key.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Symbol(s) | Self::Str(s) => Some(s),
            Self::Int(_) | Self::Float(_) => None,
        }
    }

    /// The bare string form of the key, used for stringification and JSON output.
    #[must_use]
    pub fn canonical(&self) -> String {
        match self {
            Self::Symbol(s) | Self::Str(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
        }
    }
}

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Symbol(a), Self::Symbol(b)) | (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => false,
        }
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Symbol(s) | Self::Str(s) => s.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Symbol(s) => write!(f, ":{s}"),
            Self::Str(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Key {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

// Map keys always serialize as strings so JSON/TOML output never rejects them.
impl Serialize for Key {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.canonical())
    }
}

impl<'de> Deserialize<'de> for Key {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::Str)
    }
}

// ---------------------------------------------------------------------------
// RawKey
// ---------------------------------------------------------------------------

/// Any key a caller may hand to a record, before normalization.
///
/// Only the `Key` arm is accepted in strict mode. Indifferent mode also
/// stringifies `Bool`; `Nil` and `Composite` are rejected by both modes.
#[derive(Debug, Clone, PartialEq)]
pub enum RawKey {
    Key(Key),
    Bool(bool),
    Nil,
    Composite(Value),
}

impl RawKey {
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Key(key) => key.kind_name(),
            Self::Bool(_) => "boolean",
            Self::Nil => "nil",
            Self::Composite(value) => value.type_name(),
        }
    }
}

impl From<Key> for RawKey {
    fn from(value: Key) -> Self {
        Self::Key(value)
    }
}

impl From<&Key> for RawKey {
    fn from(value: &Key) -> Self {
        Self::Key(value.clone())
    }
}

impl From<&str> for RawKey {
    fn from(value: &str) -> Self {
        Self::Key(Key::from(value))
    }
}

impl From<String> for RawKey {
    fn from(value: String) -> Self {
        Self::Key(Key::Str(value))
    }
}

impl From<&String> for RawKey {
    fn from(value: &String) -> Self {
        Self::Key(Key::Str(value.clone()))
    }
}

impl From<i64> for RawKey {
    fn from(value: i64) -> Self {
        Self::Key(Key::Int(value))
    }
}

impl From<i32> for RawKey {
    fn from(value: i32) -> Self {
        Self::Key(Key::Int(i64::from(value)))
    }
}

impl From<f64> for RawKey {
    fn from(value: f64) -> Self {
        Self::Key(Key::Float(value))
    }
}

impl From<bool> for RawKey {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Value> for RawKey {
    fn from(value: Value) -> Self {
        match value {
            Value::Nil => Self::Nil,
            Value::Bool(b) => Self::Bool(b),
            Value::Int(i) => Self::Key(Key::Int(i)),
            Value::Float(f) => Self::Key(Key::Float(f)),
            Value::Str(s) => Self::Key(Key::Str(s)),
            Value::Symbol(s) => Self::Key(Key::Symbol(s)),
            composite @ (Value::List(_) | Value::Map(_)) => Self::Composite(composite),
        }
    }
}

// ---------------------------------------------------------------------------
// Value
// ---------------------------------------------------------------------------

/// Coarse classification used wherever behaviour depends on value shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Scalar,
    Container,
}

/// A record value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Symbol(String),
    List(Vec<Value>),
    Map(Map),
}

impl Value {
    /// Build a symbol value.
    #[must_use]
    pub fn sym(name: impl Into<String>) -> Self {
        Self::Symbol(name.into())
    }

    #[must_use]
    pub const fn is_nil(&self) -> bool {
        matches!(self, Self::Nil)
    }

    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::List(_) | Self::Map(_) => ValueKind::Container,
            _ => ValueKind::Scalar,
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Str(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Borrow the text of a string or symbol value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) | Self::Symbol(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&Vec<Self>> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key in a map value. Returns `None` for non-maps.
    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Self> {
        self.as_map().and_then(|map| map.get(key))
    }

    /// Follow a path of keys through nested maps.
    #[must_use]
    pub fn dig(&self, path: &[Key]) -> Option<&Self> {
        path.iter().try_fold(self, |current, key| current.get(key))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<Vec<Self>> for Value {
    fn from(value: Vec<Self>) -> Self {
        Self::List(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Nil, Into::into)
    }
}

impl From<serde_json::Value> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Nil,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Nil),
            serde_json::Value::String(s) => Self::Str(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(object) => Self::Map(
                object
                    .into_iter()
                    .map(|(k, v)| (Key::Str(k), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Map keys become their canonical strings. In strict mode `Key::Symbol("a")` and
/// `Key::Str("a")` collide on `"a"`; the later entry in map order wins.
impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Nil => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Int(i) => Self::from(i),
            Value::Float(f) => serde_json::Number::from_f64(f).map_or(Self::Null, Self::Number),
            Value::Str(s) | Value::Symbol(s) => Self::String(s),
            Value::List(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Value::Map(map) => Self::Object(
                map.into_iter()
                    .map(|(k, v)| (k.canonical(), Self::from(v)))
                    .collect(),
            ),
        }
    }
}

/// Symbols serialize as plain strings, so keys that differ only in kind produce
/// duplicate keys for the serializer. JSON readers keep the last one.
impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Nil => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Str(s) | Self::Symbol(s) => serializer.serialize_str(s),
            Self::List(items) => items.serialize(serializer),
            Self::Map(map) => map.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

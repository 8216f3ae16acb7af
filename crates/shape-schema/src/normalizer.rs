//! Key normalization policies.
//!
//! A record type picks one [`KeyMode`] when it is declared. Every incoming key
//! (on writes, reads, deletes and attribute declarations) goes through the
//! mode's [`KeyNormalizer`] before anything else happens.

use std::fmt;

use serde::{Deserialize, Serialize};
use shape_core::paths::stringify_keys;
use shape_core::{Key, KeyError, RawKey, SchemaError, Value};

/// Key policy selected per record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Keys must already be canonical atomic keys. No conversion.
    #[default]
    Strict,
    /// Any scalar key is converted to a string; nested maps are stringified too.
    Indifferent,
}

impl KeyMode {
    #[must_use]
    pub fn normalizer(self) -> &'static dyn KeyNormalizer {
        match self {
            Self::Strict => &StrictKeys,
            Self::Indifferent => &IndifferentKeys,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Indifferent => "indifferent",
        }
    }
}

impl fmt::Display for KeyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts incoming keys and values into canonical form.
pub trait KeyNormalizer: Send + Sync {
    fn mode(&self) -> KeyMode;

    /// Canonicalize a key for reads and writes.
    ///
    /// # Errors
    ///
    /// `KeyError::UnsupportedKeyKind` when the key kind is not accepted.
    fn normalize_key(&self, key: RawKey) -> Result<Key, KeyError>;

    /// Canonicalize a value before it is written.
    fn normalize_value(&self, value: Value) -> Value;

    /// Canonicalize a key used in an attribute declaration.
    ///
    /// # Errors
    ///
    /// `SchemaError::InvalidKeyType` when the key kind cannot name an attribute.
    fn attribute_key(&self, key: RawKey) -> Result<Key, SchemaError>;
}

fn unsupported(key: &RawKey, mode: KeyMode) -> KeyError {
    KeyError::UnsupportedKeyKind {
        kind: key.kind_name(),
        mode: mode.as_str(),
    }
}

/// Strict mode: the `Key` whitelist only.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictKeys;

impl KeyNormalizer for StrictKeys {
    fn mode(&self) -> KeyMode {
        KeyMode::Strict
    }

    fn normalize_key(&self, key: RawKey) -> Result<Key, KeyError> {
        match key {
            RawKey::Key(key) => Ok(key),
            other => Err(unsupported(&other, KeyMode::Strict)),
        }
    }

    fn normalize_value(&self, value: Value) -> Value {
        value
    }

    fn attribute_key(&self, key: RawKey) -> Result<Key, SchemaError> {
        match key {
            RawKey::Key(key) => Ok(key),
            other => Err(SchemaError::InvalidKeyType {
                expected: "a symbol, string, integer or float",
                got: other.kind_name().to_string(),
            }),
        }
    }
}

/// Indifferent mode: every key is a string.
#[derive(Debug, Clone, Copy, Default)]
pub struct IndifferentKeys;

impl KeyNormalizer for IndifferentKeys {
    fn mode(&self) -> KeyMode {
        KeyMode::Indifferent
    }

    fn normalize_key(&self, key: RawKey) -> Result<Key, KeyError> {
        match key {
            RawKey::Key(Key::Str(s)) => Ok(Key::Str(s)),
            RawKey::Key(other) => Ok(Key::Str(other.canonical())),
            RawKey::Bool(b) => Ok(Key::Str(b.to_string())),
            other @ (RawKey::Nil | RawKey::Composite(_)) => {
                Err(unsupported(&other, KeyMode::Indifferent))
            }
        }
    }

    fn normalize_value(&self, value: Value) -> Value {
        stringify_keys(value)
    }

    // Only string keys may be declared, even though symbols are accepted on writes.
    fn attribute_key(&self, key: RawKey) -> Result<Key, SchemaError> {
        match key {
            RawKey::Key(Key::Str(s)) => Ok(Key::Str(s)),
            other => Err(SchemaError::InvalidKeyType {
                expected: "a string",
                got: other.kind_name().to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use shape_core::Map;

    #[rstest]
    #[case(RawKey::from(Key::sym("name")))]
    #[case(RawKey::from("name"))]
    #[case(RawKey::from(7))]
    #[case(RawKey::from(1.5))]
    fn strict_accepts_whitelisted_keys_unchanged(#[case] raw: RawKey) {
        let RawKey::Key(expected) = raw.clone() else {
            unreachable!()
        };
        assert_eq!(StrictKeys.normalize_key(raw).unwrap(), expected);
    }

    #[rstest]
    #[case(RawKey::Nil)]
    #[case(RawKey::Bool(true))]
    #[case(RawKey::Composite(Value::Map(Map::new())))]
    fn strict_rejects_other_kinds(#[case] raw: RawKey) {
        assert!(matches!(
            StrictKeys.normalize_key(raw),
            Err(KeyError::UnsupportedKeyKind { mode: "strict", .. })
        ));
    }

    #[rstest]
    #[case(RawKey::from(Key::sym("name")), "name")]
    #[case(RawKey::from("name"), "name")]
    #[case(RawKey::from(7), "7")]
    #[case(RawKey::Bool(false), "false")]
    fn indifferent_stringifies(#[case] raw: RawKey, #[case] expected: &str) {
        assert_eq!(
            IndifferentKeys.normalize_key(raw).unwrap(),
            Key::from(expected)
        );
    }

    #[test]
    fn indifferent_rejects_nil_and_composites() {
        assert!(IndifferentKeys.normalize_key(RawKey::Nil).is_err());
        assert!(
            IndifferentKeys
                .normalize_key(RawKey::Composite(Value::List(vec![])))
                .is_err()
        );
    }

    #[test]
    fn indifferent_declarations_require_strings() {
        assert!(IndifferentKeys.attribute_key(RawKey::from("name")).is_ok());
        assert!(matches!(
            IndifferentKeys.attribute_key(RawKey::from(Key::sym("name"))),
            Err(SchemaError::InvalidKeyType { .. })
        ));
        assert!(StrictKeys.attribute_key(RawKey::from(Key::sym("name"))).is_ok());
        assert!(StrictKeys.attribute_key(RawKey::Nil).is_err());
    }

    #[test]
    fn indifferent_values_are_stringified_deeply() {
        let mut inner = Map::new();
        inner.insert(Key::sym("x"), Value::from(1));
        let value = IndifferentKeys.normalize_value(Value::List(vec![Value::Map(inner)]));

        assert_eq!(value.as_list().unwrap()[0].get(&Key::from("x")), Some(&Value::from(1)));
    }

    #[test]
    fn mode_selects_normalizer() {
        assert_eq!(KeyMode::Strict.normalizer().mode(), KeyMode::Strict);
        assert_eq!(KeyMode::Indifferent.normalizer().mode(), KeyMode::Indifferent);
    }
}

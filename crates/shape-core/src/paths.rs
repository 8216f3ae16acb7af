//! Deep key transforms and path helpers.
//!
//! These walk nested maps and lists without any schema awareness. Indifferent
//! key mode uses [`stringify_keys`]; the rest are general utilities for callers
//! shaping payloads before or after they pass through a record.

use crate::errors::PathError;
use crate::value::{Key, Map, Value};

/// Recursively convert every map key to `Key::Str`.
///
/// When two keys collapse to the same string the later value wins, keeping the
/// position of the first.
#[must_use]
pub fn stringify_keys(value: Value) -> Value {
    transform_keys(value, &|key| Key::Str(key.canonical()))
}

/// Recursively convert string map keys to `Key::Symbol`. Numeric keys are left alone.
#[must_use]
pub fn symbolize_keys(value: Value) -> Value {
    transform_keys(value, &|key| match key {
        Key::Str(s) => Key::Symbol(s),
        other => other,
    })
}

fn transform_keys(value: Value, f: &dyn Fn(Key) -> Key) -> Value {
    match value {
        Value::Map(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (f(k), transform_keys(v, f)))
                .collect(),
        ),
        Value::List(items) => {
            Value::List(items.into_iter().map(|v| transform_keys(v, f)).collect())
        }
        scalar => scalar,
    }
}

/// Set `value` at `path`, creating intermediate maps as needed.
///
/// # Errors
///
/// Returns `PathError::PathTooShort` for an empty path, or `PathError::Blocked`
/// when an intermediate segment already holds a non-map value.
pub fn bury(map: &mut Map, path: &[Key], value: Value) -> Result<(), PathError> {
    let (last, parents) = path.split_last().ok_or(PathError::PathTooShort)?;

    let mut current = map;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Map(Map::new()));
        if slot.is_nil() {
            *slot = Value::Map(Map::new());
        }
        current = match slot {
            Value::Map(inner) => inner,
            other => {
                return Err(PathError::Blocked {
                    segment: segment.to_string(),
                    kind: other.type_name(),
                });
            }
        };
    }

    current.insert(last.clone(), value);
    Ok(())
}

/// Kind of key produced by [`flatten_to_root`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlatKey {
    #[default]
    Symbol,
    Str,
}

/// Options for [`flatten_to_root`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Descend into lists, using indices as path segments.
    pub flatten_lists: bool,
    /// Separator placed between joined segments.
    pub join_with: String,
    /// Kind of the resulting keys.
    pub key_kind: FlatKey,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            flatten_lists: false,
            join_with: ".".to_string(),
            key_kind: FlatKey::Symbol,
        }
    }
}

impl FlattenOptions {
    fn key(&self, text: String) -> Key {
        match self.key_kind {
            FlatKey::Symbol => Key::Symbol(text),
            FlatKey::Str => Key::Str(text),
        }
    }
}

/// Flatten nested maps into a single-level map with joined keys.
///
/// # Errors
///
/// Returns `PathError::NotAContainer` if `value` is neither a map nor a list.
pub fn flatten_to_root(value: &Value, options: &FlattenOptions) -> Result<Map, PathError> {
    flatten_to_root_with(value, options, &|_| true)
}

/// Like [`flatten_to_root`], but `descend` is asked before entering each nested
/// map; returning `false` keeps that map as a leaf.
///
/// # Errors
///
/// Returns `PathError::NotAContainer` if `value` is neither a map nor a list.
pub fn flatten_to_root_with(
    value: &Value,
    options: &FlattenOptions,
    descend: &dyn Fn(&Map) -> bool,
) -> Result<Map, PathError> {
    let entries: Vec<(String, &Value)> = match value {
        Value::Map(map) => map.iter().map(|(k, v)| (k.canonical(), v)).collect(),
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        other => return Err(PathError::NotAContainer(other.type_name())),
    };

    let mut flat = Map::new();
    for (segment, child) in entries {
        let expandable = match child {
            Value::Map(inner) => !inner.is_empty() && descend(inner),
            Value::List(items) => options.flatten_lists && !items.is_empty(),
            _ => false,
        };

        if expandable {
            for (nested, leaf) in flatten_to_root_with(child, options, descend)? {
                let joined = format!("{segment}{}{}", options.join_with, nested.canonical());
                flat.insert(options.key(joined), leaf);
            }
        } else {
            flat.insert(options.key(segment), child.clone());
        }
    }
    Ok(flat)
}

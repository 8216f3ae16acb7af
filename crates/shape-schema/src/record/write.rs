//! The record write path.
//!
//! Order per write: normalize key -> required check -> declared check ->
//! transform -> type coercion -> store -> after-write callbacks. Any step may
//! fail; nothing already stored by an earlier write is rolled back.

use std::sync::Arc;

use shape_core::{AttributeError, Key, RawKey, RecordError, Value};

use super::{Record, WriteFlags};

impl Record {
    /// Write one key through the full write path.
    ///
    /// # Errors
    ///
    /// `KeyError` for rejected key kinds, `AttributeError` for missing required or
    /// undeclared attributes, `ConstraintError` from the type capability, or any
    /// error returned by an after-write callback.
    pub fn set(
        &mut self,
        key: impl Into<RawKey>,
        value: impl Into<Value>,
    ) -> Result<(), RecordError> {
        self.set_with(key, value, WriteFlags::default())
    }

    /// [`set`](Self::set) with explicit flags.
    ///
    /// # Errors
    ///
    /// Same as [`set`](Self::set), minus whatever `flags` skips.
    pub fn set_with(
        &mut self,
        key: impl Into<RawKey>,
        value: impl Into<Value>,
        flags: WriteFlags,
    ) -> Result<(), RecordError> {
        let normalizer = self.normalizer();
        let key = normalizer.normalize_key(key.into())?;
        let value = normalizer.normalize_value(value.into());
        self.write(key, value, flags)
    }

    /// Write a canonical key and value. Key normalization has already happened.
    pub(crate) fn write(
        &mut self,
        key: Key,
        value: Value,
        flags: WriteFlags,
    ) -> Result<(), RecordError> {
        let record_type = Arc::clone(&self.record_type);
        let schema = record_type.schema();

        if !flags.skip_validate && value.is_nil() && self.is_required(&key) {
            return Err(AttributeError::MissingRequired {
                key: key.to_string(),
            }
            .into());
        }

        let definition = schema.get(&key);
        if definition.is_none() && !schema.allow_dynamic_attributes() {
            return Err(AttributeError::UndeclaredAttribute {
                key: key.to_string(),
                record_type: record_type.name().to_string(),
            }
            .into());
        }

        let value = match definition {
            Some(definition) => definition.prepare(&key, value, self)?,
            None => value,
        };

        tracing::trace!(
            record_type = record_type.name(),
            attribute = %key,
            dynamic = definition.is_none(),
            "write"
        );
        self.values.insert(key.clone(), value);

        if !flags.skip_after_write {
            self.run_after_write(Some(&key))?;
        }
        Ok(())
    }

    /// Run every after-write callback in registration order.
    ///
    /// `None` signals that construction has finished.
    pub(crate) fn run_after_write(&mut self, key: Option<&Key>) -> Result<(), RecordError> {
        let record_type = Arc::clone(&self.record_type);
        let callbacks = record_type.schema().after_write_callbacks();
        if callbacks.is_empty() {
            return Ok(());
        }

        tracing::trace!(
            record_type = record_type.name(),
            attribute = ?key,
            callbacks = callbacks.len(),
            "after write"
        );
        for callback in callbacks {
            callback.call(self, key)?;
        }
        Ok(())
    }

    /// Write every pair through the write path, in order.
    ///
    /// # Errors
    ///
    /// Stops at the first failing write; earlier pairs stay stored.
    pub fn update<K, V>(
        &mut self,
        input: impl IntoIterator<Item = (K, V)>,
    ) -> Result<&mut Self, RecordError>
    where
        K: Into<RawKey>,
        V: Into<Value>,
    {
        self.update_with(input, |_, _, new| new)
    }

    /// Like [`update`](Self::update), but `resolve(key, old, new)` picks the value
    /// to write whenever the key is already present.
    ///
    /// # Errors
    ///
    /// Stops at the first failing write; earlier pairs stay stored.
    pub fn update_with<K, V, F>(
        &mut self,
        input: impl IntoIterator<Item = (K, V)>,
        mut resolve: F,
    ) -> Result<&mut Self, RecordError>
    where
        K: Into<RawKey>,
        V: Into<Value>,
        F: FnMut(&Key, &Value, Value) -> Value,
    {
        let normalizer = self.normalizer();
        for (key, value) in input {
            let key = normalizer.normalize_key(key.into())?;
            let value = normalizer.normalize_value(value.into());
            let value = match self.values.get(&key) {
                Some(old) => resolve(&key, old, value),
                None => value,
            };
            self.write(key, value, WriteFlags::default())?;
        }
        Ok(self)
    }

    /// Apply several inputs in sequence.
    ///
    /// # Errors
    ///
    /// Stops at the first failing write; earlier pairs stay stored.
    pub fn update_many<I, K, V>(
        &mut self,
        inputs: impl IntoIterator<Item = I>,
    ) -> Result<&mut Self, RecordError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<RawKey>,
        V: Into<Value>,
    {
        for input in inputs {
            self.update(input)?;
        }
        Ok(self)
    }

    /// Alias of [`update`](Self::update).
    ///
    /// # Errors
    ///
    /// Stops at the first failing write; earlier pairs stay stored.
    pub fn merge<K, V>(
        &mut self,
        input: impl IntoIterator<Item = (K, V)>,
    ) -> Result<&mut Self, RecordError>
    where
        K: Into<RawKey>,
        V: Into<Value>,
    {
        self.update(input)
    }

    /// Alias of [`update_with`](Self::update_with).
    ///
    /// # Errors
    ///
    /// Stops at the first failing write; earlier pairs stay stored.
    pub fn merge_with<K, V, F>(
        &mut self,
        input: impl IntoIterator<Item = (K, V)>,
        resolve: F,
    ) -> Result<&mut Self, RecordError>
    where
        K: Into<RawKey>,
        V: Into<Value>,
        F: FnMut(&Key, &Value, Value) -> Value,
    {
        self.update_with(input, resolve)
    }

    /// Remove a key. Requiredness is not checked; `validate_all` will catch it.
    pub fn delete(&mut self, key: impl Into<RawKey>) -> Option<Value> {
        let key = self.normalizer().normalize_key(key.into()).ok()?;
        self.values.shift_remove(&key)
    }
}

#[cfg(test)]
mod tests {
    use crate::attribute::{AfterWrite, AttributeOptions};
    use crate::normalizer::KeyMode;
    use crate::record::{RecordType, WriteFlags};
    use crate::registry::SchemaRegistry;
    use pretty_assertions::assert_eq;
    use shape_core::{Key, RecordError, Types, Value};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn schema() -> SchemaRegistry {
        let mut schema = SchemaRegistry::new(KeyMode::Strict);
        schema
            .optional_attribute("name", AttributeOptions::new().ty(Types::string().optional()))
            .unwrap()
            .optional_attribute("age", AttributeOptions::new().ty(Types::int().coercible()))
            .unwrap();
        schema
    }

    #[test]
    fn set_coerces_through_type() {
        let mut record = RecordType::new("T", schema()).empty().unwrap();
        record.set("age", "41").unwrap();
        assert_eq!(record.get("age"), Some(&Value::Int(41)));
    }

    #[test]
    fn constraint_errors_pass_through() {
        let mut record = RecordType::new("T", schema()).empty().unwrap();
        let err = record.set("name", 1).unwrap_err();
        let RecordError::Constraint(err) = err else {
            panic!("expected constraint error, got {err:?}");
        };
        assert_eq!(err.type_name, "string?");
        assert_eq!(record.get("name"), None);
    }

    #[test]
    fn rejected_key_kinds_fail_before_anything_else() {
        let mut record = RecordType::new("T", schema()).empty().unwrap();
        let err = record.set(true, 1).unwrap_err();
        assert!(matches!(err, RecordError::Key(_)));
    }

    #[test]
    fn update_keeps_prefix_on_failure() {
        let mut record = RecordType::new("T", schema()).empty().unwrap();
        let err = record
            .update([("name", Value::from("Yoda")), ("bogus", Value::from(1))])
            .unwrap_err();
        assert!(err.is_undeclared());
        assert_eq!(record.get("name"), Some(&Value::from("Yoda")));
    }

    #[test]
    fn update_with_resolves_only_existing_keys() {
        let mut record = RecordType::new("T", schema()).empty().unwrap();
        record.set("age", 10).unwrap();
        record
            .update_with(
                [("age", Value::from(5)), ("name", Value::from("Yoda"))],
                |_, old, new| Value::Int(old.as_i64().unwrap_or(0) + new.as_i64().unwrap_or(0)),
            )
            .unwrap();
        assert_eq!(record.get("age"), Some(&Value::Int(15)));
        assert_eq!(record.get("name"), Some(&Value::from("Yoda")));
    }

    #[test]
    fn update_many_applies_inputs_in_order() {
        let mut record = RecordType::new("T", schema()).empty().unwrap();
        record
            .update_many([vec![("age", 1)], vec![("age", 2)]])
            .unwrap();
        assert_eq!(record.get("age"), Some(&Value::Int(2)));
    }

    #[test]
    fn delete_removes_and_preserves_order() {
        let mut record = RecordType::new("T", schema())
            .construct([("name", Value::from("Yoda")), ("age", Value::from(900))])
            .unwrap();
        assert_eq!(record.delete("name"), Some(Value::from("Yoda")));
        assert_eq!(record.delete("name"), None);
        assert_eq!(record.keys().cloned().collect::<Vec<_>>(), vec![Key::from("age")]);
    }

    #[test]
    fn callbacks_see_each_written_key_unless_skipped() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut schema = schema();
        schema.after_write(AfterWrite::new(move |_, key| {
            if key.is_some() {
                seen.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }));

        let mut record = RecordType::new("T", schema).empty().unwrap();
        record.set("age", 1).unwrap();
        record
            .set_with(
                "age",
                2,
                WriteFlags {
                    skip_after_write: true,
                    ..WriteFlags::default()
                },
            )
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn skip_validate_allows_nil_for_required() {
        let mut schema = SchemaRegistry::new(KeyMode::Strict);
        schema.attribute("name", AttributeOptions::new()).unwrap();
        let mut record = RecordType::new("T", schema)
            .construct([("name", "Yoda")])
            .unwrap();

        assert!(record.set("name", Value::Nil).unwrap_err().is_missing_required());
        record
            .set_with(
                "name",
                Value::Nil,
                WriteFlags {
                    skip_validate: true,
                    ..WriteFlags::default()
                },
            )
            .unwrap();
        assert_eq!(record.get("name"), Some(&Value::Nil));
        assert!(record.validate_all().is_err());
    }
}

//! Record construction, default resolution, duplication, and the validation sweep.

use std::sync::Arc;

use indexmap::IndexSet;
use shape_core::{AttributeError, Key, Map, RawKey, RecordError, Value};

use super::{InitOptions, Record, RecordType, WriteFlags};

impl Record {
    /// Construct a record from key/value pairs.
    ///
    /// 1. run `pre_init`, if any, on the empty record
    /// 2. write every supplied pair with callbacks deferred
    /// 3. resolve defaults for absent attributes, in declaration order
    /// 4. run the after-write callbacks once with `None`
    /// 5. check every required attribute is present
    ///
    /// # Errors
    ///
    /// The first error from any step.
    pub fn new<K, V>(
        record_type: &Arc<RecordType>,
        input: impl IntoIterator<Item = (K, V)>,
        options: InitOptions,
    ) -> Result<Self, RecordError>
    where
        K: Into<RawKey>,
        V: Into<Value>,
    {
        let pairs = input
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::build(record_type, pairs, options)
    }

    /// Construct a record from a map value. `Nil` is treated as an empty map.
    ///
    /// # Errors
    ///
    /// `RecordError::InputNotMap` for any other value, otherwise as [`Record::new`].
    pub fn from_value(
        record_type: &Arc<RecordType>,
        input: Value,
        options: InitOptions,
    ) -> Result<Self, RecordError> {
        match input {
            Value::Map(map) => Self::new(record_type, map, options),
            Value::Nil => Self::new(record_type, Map::new(), options),
            other => Err(RecordError::InputNotMap(other.type_name())),
        }
    }

    fn build(
        record_type: &Arc<RecordType>,
        pairs: Vec<(RawKey, Value)>,
        options: InitOptions,
    ) -> Result<Self, RecordError> {
        let normalizer = record_type.schema().normalizer();
        let skip_required = options
            .skip_required_attrs
            .iter()
            .map(|key| normalizer.normalize_key(key.clone()))
            .collect::<Result<IndexSet<Key>, _>>()?;

        let mut record = Self {
            record_type: Arc::clone(record_type),
            values: Map::new(),
            skip_required,
            options,
        };

        if let Some(pre_init) = record.options.pre_init.clone() {
            pre_init(&mut record)?;
        }

        let mut supplied = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            supplied.push((normalizer.normalize_key(key)?, normalizer.normalize_value(value)));
        }
        for (key, value) in supplied {
            record.write(key, value, WriteFlags::DEFERRED)?;
        }

        record.apply_defaults()?;
        record.run_after_write(None)?;
        record.validate_all()?;

        tracing::debug!(
            record_type = record_type.name(),
            keys = record.values.len(),
            "constructed record"
        );
        Ok(record)
    }

    /// Fill every declared attribute that is still absent.
    ///
    /// Runs in declaration order, so a derived default can read values written by
    /// the caller and by earlier defaults in the same pass.
    fn apply_defaults(&mut self) -> Result<(), RecordError> {
        let record_type = Arc::clone(&self.record_type);
        let schema = record_type.schema();
        let normalizer = schema.normalizer();

        for (key, definition) in schema.attributes() {
            if self.values.contains_key(key) {
                continue;
            }

            let value = definition
                .resolve_default(key, self)?
                .map_or(Value::Nil, |value| normalizer.normalize_value(value));

            // A nil default for a required attribute goes through the write path and fails there.
            if value.is_nil() && schema.ignore_nil_defaults() && !self.is_required(key) {
                continue;
            }

            tracing::trace!(
                record_type = record_type.name(),
                attribute = %key,
                "applying default"
            );
            self.write(key.clone(), value, WriteFlags::DEFERRED)?;
        }
        Ok(())
    }

    /// Check every declared required attribute against its current value.
    ///
    /// # Errors
    ///
    /// `AttributeError::MissingRequired` for the first required attribute that is
    /// absent or `Nil`, in declaration order.
    pub fn validate_all(&self) -> Result<(), AttributeError> {
        for (key, _) in self.schema().attributes() {
            let missing = self.values.get(key).is_none_or(Value::is_nil);
            if missing && self.is_required(key) {
                tracing::debug!(
                    record_type = self.record_type.name(),
                    attribute = %key,
                    "required attribute missing"
                );
                return Err(AttributeError::MissingRequired {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Rebuild this record through construction.
    ///
    /// The current keys and values are written again with the saved
    /// [`InitOptions`]. Defaults are resolved only for attributes absent from
    /// this record, so a deleted attribute with a default gets it back and a
    /// deleted required attribute fails the sweep. Transforms run again on the
    /// stored values. For a raw storage copy use `clone()`.
    ///
    /// # Errors
    ///
    /// Any error construction can return.
    pub fn duplicate(&self) -> Result<Self, RecordError> {
        let pairs = self
            .values
            .iter()
            .map(|(key, value)| (RawKey::Key(key.clone()), value.clone()))
            .collect();
        Self::build(&self.record_type, pairs, self.options.clone())
    }
}

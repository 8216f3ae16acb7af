//! Schema-enforcing records.
//!
//! A [`RecordType`] pairs a name with a frozen [`SchemaRegistry`]. A [`Record`]
//! is an ordered `Key -> Value` map bound to one record type; every mutation
//! goes through the write path in `write.rs`, and construction (with default
//! resolution) lives in `construct.rs`.

mod construct;
mod write;

use std::fmt;
use std::sync::Arc;

use indexmap::IndexSet;
use serde::{Serialize, Serializer};
use shape_core::{Key, Map, RawKey, RecordError, Value};

use crate::registry::SchemaRegistry;

type PreInitFn = dyn Fn(&mut Record) -> Result<(), RecordError> + Send + Sync;

// ---------------------------------------------------------------------------
// RecordType
// ---------------------------------------------------------------------------

/// A named, frozen schema that records are constructed against.
#[derive(Debug)]
pub struct RecordType {
    name: String,
    schema: SchemaRegistry,
}

impl RecordType {
    #[must_use]
    pub fn new(name: impl Into<String>, schema: SchemaRegistry) -> Arc<Self> {
        Arc::new(Self {
            name: name.into(),
            schema,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn schema(&self) -> &SchemaRegistry {
        &self.schema
    }

    /// Construct a record with default options.
    ///
    /// # Errors
    ///
    /// Any error from the write path, default resolution, or the final validation sweep.
    pub fn construct<K, V>(
        self: &Arc<Self>,
        input: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Record, RecordError>
    where
        K: Into<RawKey>,
        V: Into<Value>,
    {
        Record::new(self, input, InitOptions::default())
    }

    /// Construct a record with explicit per-instance options.
    ///
    /// # Errors
    ///
    /// Any error from the write path, default resolution, or the final validation sweep.
    pub fn construct_with<K, V>(
        self: &Arc<Self>,
        input: impl IntoIterator<Item = (K, V)>,
        options: InitOptions,
    ) -> Result<Record, RecordError>
    where
        K: Into<RawKey>,
        V: Into<Value>,
    {
        Record::new(self, input, options)
    }

    /// Construct a record from no input at all.
    ///
    /// # Errors
    ///
    /// Fails when a required attribute has no default.
    pub fn empty(self: &Arc<Self>) -> Result<Record, RecordError> {
        Record::new(self, std::iter::empty::<(RawKey, Value)>(), InitOptions::default())
    }
}

// ---------------------------------------------------------------------------
// Options and flags
// ---------------------------------------------------------------------------

/// Per-instance construction options. Saved on the record and reused by
/// [`Record::duplicate`].
#[derive(Clone, Default)]
pub struct InitOptions {
    skip_required_attrs: Vec<RawKey>,
    pre_init: Option<Arc<PreInitFn>>,
}

impl InitOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Treat `key` as optional for this instance only.
    #[must_use]
    pub fn skip_required(mut self, key: impl Into<RawKey>) -> Self {
        self.skip_required_attrs.push(key.into());
        self
    }

    /// Run `f` on the empty record before any key is written.
    #[must_use]
    pub fn pre_init(
        mut self,
        f: impl Fn(&mut Record) -> Result<(), RecordError> + Send + Sync + 'static,
    ) -> Self {
        self.pre_init = Some(Arc::new(f));
        self
    }

    #[must_use]
    pub fn skip_required_attrs(&self) -> &[RawKey] {
        &self.skip_required_attrs
    }

    #[must_use]
    pub const fn has_pre_init(&self) -> bool {
        self.pre_init.is_some()
    }
}

impl fmt::Debug for InitOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitOptions")
            .field("skip_required_attrs", &self.skip_required_attrs)
            .field("pre_init", &self.pre_init.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Per-write switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteFlags {
    /// Skip the required check for this write.
    pub skip_validate: bool,
    /// Do not run after-write callbacks for this write.
    pub skip_after_write: bool,
}

impl WriteFlags {
    pub(crate) const DEFERRED: Self = Self {
        skip_validate: false,
        skip_after_write: true,
    };
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// An ordered map whose keys and values are governed by a [`RecordType`].
#[derive(Debug, Clone)]
pub struct Record {
    record_type: Arc<RecordType>,
    values: Map,
    skip_required: IndexSet<Key>,
    options: InitOptions,
}

impl Record {
    /// Stored value for `key`, or `None`. Never fails, even for keys the mode rejects.
    #[must_use]
    pub fn get(&self, key: impl Into<RawKey>) -> Option<&Value> {
        let key = self.normalizer().normalize_key(key.into()).ok()?;
        self.values.get(&key)
    }

    #[must_use]
    pub fn contains_key(&self, key: impl Into<RawKey>) -> bool {
        self.get(key).is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.values.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.values.iter()
    }

    /// Ordered copy of the stored keys and values.
    #[must_use]
    pub fn to_plain_map(&self) -> Map {
        self.values.clone()
    }

    /// Consume the record, keeping only its storage.
    #[must_use]
    pub fn into_map(self) -> Map {
        self.values
    }

    /// JSON rendering of the stored values. Keys become strings, so in strict mode a
    /// symbol key and a string key with the same name collapse to the later one.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        Value::Map(self.values.clone()).into()
    }

    #[must_use]
    pub fn record_type(&self) -> &Arc<RecordType> {
        &self.record_type
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRegistry {
        self.record_type.schema()
    }

    #[must_use]
    pub const fn init_options(&self) -> &InitOptions {
        &self.options
    }

    /// Keys exempted from the required check on this instance.
    pub fn skipped_required(&self) -> impl Iterator<Item = &Key> {
        self.skip_required.iter()
    }

    /// Required for this instance: required in the schema and not skipped.
    #[must_use]
    pub fn is_required(&self, key: &Key) -> bool {
        !self.skip_required.contains(key)
            && self.schema().get(key).is_some_and(|def| def.required)
    }

    fn normalizer(&self) -> &'static dyn crate::normalizer::KeyNormalizer {
        self.record_type.schema().normalizer()
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.record_type.name() == other.record_type.name() && self.values == other.values
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a Key, &'a Value);
    type IntoIter = indexmap::map::Iter<'a, Key, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

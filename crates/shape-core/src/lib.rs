//! # shape-core
//!
//! Foundational types shared by every shape crate.
//!
//! This crate provides:
//! - `Value`, the closed value model stored in records
//! - `Key` (canonical atomic key) and `RawKey` (any incoming key, before normalization)
//! - The error taxonomy raised by schema registration and record writes
//! - The `TypeCapability` trait plus a built-in `Types` family of validators/coercers
//! - Generic deep key-transform and path utilities (`paths`)
//!
//! Nothing here knows about schemas. `shape-schema` builds the attribute engine on top.

pub mod errors;
pub mod paths;
pub mod types;
pub mod value;

pub use errors::{AttributeError, ConstraintError, KeyError, PathError, RecordError, SchemaError};
pub use types::{Primitive, SharedType, TypeCapability, Types};
pub use value::{Key, Map, RawKey, Value, ValueKind};

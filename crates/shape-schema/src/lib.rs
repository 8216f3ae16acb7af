//! # shape-schema
//!
//! The attribute-schema engine: dictionaries with a declarative contract.
//!
//! This crate provides:
//! - `AttributeDefinition` / `AttributeOptions`: one declared key and its settings
//! - `SchemaRegistry`: ordered definitions, after-write callbacks and policy flags of one type
//! - `KeyMode` and the `KeyNormalizer` policies (strict symbols vs. indifferent strings)
//! - `RecordType` and `Record`: the map that enforces the contract on every write
//! - `TypeCatalog`: named record types, subclassing, and snapshot or live-cascade propagation
//! - `SchemaManifest`: declarative TOML/JSON schema files
//!
//! ## Write path
//!
//! Every write runs: key normalization -> required check -> declared check ->
//! transform -> type coercion -> store -> after-write callbacks. Construction
//! defers callbacks until all supplied values and defaults are in place, then
//! runs them once with `None` and finishes with a full validation sweep.
//!
//! ```
//! use shape_schema::{AttributeOptions, KeyMode, RecordType, SchemaRegistry};
//! use shape_core::{Types, Value};
//!
//! let mut schema = SchemaRegistry::new(KeyMode::Indifferent);
//! schema
//!     .attribute("name", AttributeOptions::new().ty(Types::string()))
//!     .unwrap()
//!     .optional_attribute("nickname", AttributeOptions::new().default_from(|r| {
//!         r.get("name").cloned().unwrap_or_default()
//!     }))
//!     .unwrap();
//!
//! let user = RecordType::new("User", schema);
//! let record = user.construct([("name", "John")]).unwrap();
//! assert_eq!(record.get("nickname"), Some(&Value::from("John")));
//! ```

pub mod attribute;
pub mod catalog;
pub mod manifest;
pub mod normalizer;
pub mod record;
pub mod registry;

pub use attribute::{AfterWrite, AttributeDefinition, AttributeOptions, DefaultKind, DefaultValue};
pub use catalog::{Propagation, TypeCatalog};
pub use manifest::{AttributeManifest, SchemaManifest, TypeManifest};
pub use normalizer::{IndifferentKeys, KeyMode, KeyNormalizer, StrictKeys};
pub use record::{InitOptions, Record, RecordType, WriteFlags};
pub use registry::{RegistryPolicy, SchemaRegistry};

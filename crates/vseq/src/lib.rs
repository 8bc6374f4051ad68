//! # vseq
//!
//! Schema-validated collections. A [`ValidatingSequence`] behaves like a
//! read-only slice plus a set of validating mutators; every element is,
//! at all times, a valid instance of the collection type's item schema.
//!
//! ## Crate layout
//!
//! - [`binding`]: collection types (`CollectionType`, `Sequence<S>`,
//!   `collection_type!`).
//! - [`sequence`]: the typed sequence container.
//! - [`mapping`]: the typed string-keyed container.
//! - [`dynamic`]: sequences bound to a JSON Schema document at runtime.
//! - [`participant`]: validation and description inside enclosing
//!   documents.
//!
//! Item schemas, violations, errors, and configuration live in
//! `vseq-core`; JSON Schema compilation and the schema registry live in
//! `vseq-schema`. Both are re-exported here.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use serde_json::json;
//! use vseq::{Input, ItemSchema, Sequence};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! impl ItemSchema for User {}
//!
//! let mut users = Sequence::<User>::construct_raw(vec![
//!     json!({"name": "Alice", "age": 30}),
//! ])
//! .unwrap();
//!
//! users.append(User { name: "Bob".into(), age: 40 }).unwrap();
//! assert!(users.append(Input::raw(json!({"name": "Eve", "age": 1}))).is_err());
//! assert_eq!(users.to_json().unwrap(), r#"[{"age":30,"name":"Alice"},{"age":40,"name":"Bob"}]"#);
//! ```

pub mod binding;
pub mod dynamic;
mod gate;
pub mod mapping;
pub mod participant;
pub mod sequence;
mod store;

pub use binding::{Bound, CollectionType, Mapping, Sequence};
pub use dynamic::{DynamicSequence, Record, SequenceSchema, SequenceSchemaBuilder};
pub use mapping::ValidatingMapping;
pub use participant::{SchemaParticipant, ValidationContext};
pub use sequence::ValidatingSequence;

pub use vseq_core::{
    CollectionConfig, CollectionError, Input, ItemSchema, Loc, LocSegment, Violation, ViolationKind,
    Violations,
};
pub use vseq_schema::{CompiledSchema, RegistryError, SchemaRegistry};

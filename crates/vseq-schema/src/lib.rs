//! # vseq-schema: Schema Engine Adapter
//!
//! Everything vseq knows about validating a single item lives here. The
//! containers in `vseq` never touch serde or `jsonschema` directly; they
//! call this crate once per element.
//!
//! ## Typed Items (`engine`)
//!
//! For a Rust type implementing [`vseq_core::ItemSchema`]:
//!
//! - [`engine::coerce`]: raw JSON → item: descriptor validation (all
//!   failing keywords reported), `serde_json::from_value`, then the
//!   item's own `check`.
//! - [`engine::check`]: re-validate an existing instance.
//! - [`engine::export`]: item → plain JSON.
//! - [`engine::describe`]: the item's descriptor, or a titled
//!   placeholder when the type supplies none.
//!
//! Compiled descriptors are cached per item type; binding happens once.
//!
//! ## Runtime Schemas (`registry`, `compiled`)
//!
//! [`SchemaRegistry`] holds JSON Schema documents by name, loaded from
//! values or from a directory of `*.schema.json` / `*.schema.yaml` files,
//! with cross-document `$ref` resolved locally. [`CompiledSchema`] is one
//! compiled document that reports located violations.
//!
//! ## Crate Policy
//!
//! - Depends only on `vseq-core` internally.
//! - Never performs network access: unresolved `$ref`s are answered from
//!   the registry or with a permissive schema.

pub mod compiled;
pub mod descriptor;
pub mod engine;
pub mod registry;

pub use compiled::CompiledSchema;
pub use descriptor::{mapping_descriptor, sequence_descriptor};
pub use engine::EngineError;
pub use registry::{RegistryError, SchemaRegistry};

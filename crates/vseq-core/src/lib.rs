#![deny(missing_docs)]

//! # vseq-core: Foundational Types for Validated Collections
//!
//! This crate is the leaf of the vseq workspace. It defines the vocabulary
//! shared by the schema engine adapter (`vseq-schema`) and the containers
//! (`vseq`): what an item schema is, how a mutation input is expressed,
//! where a validation failure happened, and how failures are reported.
//!
//! ## Key Design Principles
//!
//! 1. **Item schemas are serde types.** Coercion of raw JSON into a record
//!    is `serde::Deserialize`; export is `serde::Serialize`. The
//!    [`ItemSchema`] trait only adds a name, an optional JSON Schema
//!    descriptor, and a semantic `check`.
//!
//! 2. **Inputs say what they are.** A mutation receives an [`Input`]:
//!    either an already-built instance or a raw `serde_json::Value`. The
//!    strict/non-strict policy in [`CollectionConfig`] decides what the
//!    container does with raw values.
//!
//! 3. **Every failure is located.** A [`Violation`] carries a [`Loc`]
//!    (element index or mapping key, then field path) so that aggregated
//!    errors from bulk operations point at the offending element.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `vseq-*` crates (this is the leaf of the DAG).
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod config;
pub mod error;
pub mod schema;
pub mod violation;

// Re-export primary types for ergonomic imports.
pub use config::CollectionConfig;
pub use error::CollectionError;
pub use schema::{json_type_name, short_type_name, Input, ItemSchema};
pub use violation::{Loc, LocSegment, Violation, ViolationKind, Violations};

//! # Compiled Schemas
//!
//! A [`CompiledSchema`] is one JSON Schema document compiled by the
//! `jsonschema` crate (Draft 2020-12) together with the name it was bound
//! under. It is cheap to clone and shared between every collection bound
//! to it.

use std::fmt;
use std::sync::Arc;

use jsonschema::{ValidationOptions, Validator};
use serde_json::Value;
use vseq_core::{Loc, Violation, ViolationKind, Violations};

use crate::registry::RegistryError;

/// A compiled JSON Schema document.
#[derive(Clone)]
pub struct CompiledSchema {
    name: Arc<str>,
    document: Arc<Value>,
    validator: Arc<Validator>,
}

impl CompiledSchema {
    /// Compile a standalone document.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ValidatorBuildError` if the document is not
    /// a valid JSON Schema.
    pub fn compile(name: &str, document: &Value) -> Result<Self, RegistryError> {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);
        Self::compile_with(name, document, &opts)
    }

    pub(crate) fn compile_with(
        name: &str,
        document: &Value,
        opts: &ValidationOptions,
    ) -> Result<Self, RegistryError> {
        let validator = opts
            .build(document)
            .map_err(|e| RegistryError::ValidatorBuildError {
                schema_name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            name: Arc::from(name),
            document: Arc::new(document.clone()),
            validator: Arc::new(validator),
        })
    }

    /// Name the schema was compiled under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The source document.
    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Returns true if `instance` satisfies the schema.
    pub fn is_valid(&self, instance: &Value) -> bool {
        self.validator.is_valid(instance)
    }

    /// Every violation of `instance`, located by its instance path.
    pub fn violations(&self, instance: &Value) -> Violations {
        self.validator
            .iter_errors(instance)
            .map(|e| {
                let loc = Loc::from_json_pointer(&e.instance_path.to_string());
                Violation::new(ViolationKind::Schema, e.to_string())
                    .at(loc)
                    .with_input(e.instance.into_owned())
            })
            .collect()
    }

    /// Returns true if both handles share the same compiled validator.
    pub fn same_binding(&self, other: &CompiledSchema) -> bool {
        Arc::ptr_eq(&self.validator, &other.validator)
    }
}

impl fmt::Debug for CompiledSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledSchema")
            .field("name", &self.name)
            .field("document", &self.document)
            .finish_non_exhaustive()
    }
}

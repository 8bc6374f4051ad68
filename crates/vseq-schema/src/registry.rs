//! # Schema Registry
//!
//! Holds item schema documents by name for collections whose item schema
//! is only known at runtime. Documents are inserted as values or loaded
//! from a directory of `*.schema.json`, `*.schema.yaml` and
//! `*.schema.yml` files.
//!
//! ## Schema Resolution
//!
//! A document is registered under its file name (or the name given to
//! [`SchemaRegistry::insert`]) and under its own `$id`, if it has one.
//! Cross-document `$ref`s are resolved from those names by a local
//! retriever; the registry never performs network requests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use jsonschema::{Retrieve, Uri, ValidationOptions};
use serde_json::Value;
use thiserror::Error;
use vseq_core::Violations;

use crate::compiled::CompiledSchema;

/// Resolves `$ref`s against registered documents, by `$id` or by file name.
struct RegistryRefs(HashMap<String, Value>);

impl Retrieve for RegistryRefs {
    fn retrieve(&self, uri: &Uri<&str>) -> Result<Value, Box<dyn std::error::Error + Send + Sync>> {
        let uri = uri.as_str();
        let file_name = uri.rsplit('/').next().unwrap_or(uri);
        self.0
            .get(uri)
            .or_else(|| self.0.get(file_name))
            .cloned()
            .ok_or_else(|| format!("no registered schema for '{uri}'").into())
    }
}

/// Error while loading or using registry documents.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The document did not conform to the schema.
    #[error("validation failed against schema '{schema_name}':\n{violations}")]
    ValidationFailed {
        /// Name of the schema that was validated against.
        schema_name: String,
        /// Structured list of individual violations.
        violations: Violations,
    },

    /// No document is registered under this name.
    #[error("schema '{schema_name}' not found (registered: {registered})")]
    SchemaNotFound {
        /// Requested name.
        schema_name: String,
        /// Comma-separated registered names.
        registered: String,
    },

    /// A schema file could not be parsed.
    #[error("schema load error for '{schema_name}': {reason}")]
    SchemaLoadError {
        /// Schema filename or identifier.
        schema_name: String,
        /// Reason the schema could not be loaded.
        reason: String,
    },

    /// The compiled validator could not be built (e.g., invalid schema).
    #[error("validator build error for schema '{schema_name}': {reason}")]
    ValidatorBuildError {
        /// Schema filename or identifier.
        schema_name: String,
        /// Reason the validator could not be built.
        reason: String,
    },

    /// IO error reading a schema directory.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Item schema documents indexed by name.
#[derive(Debug, Default, Clone)]
pub struct SchemaRegistry {
    /// Directory the documents were loaded from, if any.
    source_dir: Option<PathBuf>,
    /// Map from schema name (e.g., "user.schema.json") to document.
    schemas: HashMap<String, Value>,
}

impl SchemaRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.schema.json`, `*.schema.yaml` and `*.schema.yml` file
    /// in `dir` (not recursive).
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SchemaLoadError` if the directory cannot be
    /// read or any matching file is not valid JSON/YAML.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let dir = dir.as_ref().to_path_buf();
        let mut schemas = HashMap::new();

        let entries = std::fs::read_dir(&dir).map_err(|e| RegistryError::SchemaLoadError {
            schema_name: dir.display().to_string(),
            reason: format!("cannot read schema directory: {e}"),
        })?;

        for entry in entries {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let is_json = name.ends_with(".schema.json");
            let is_yaml = name.ends_with(".schema.yaml") || name.ends_with(".schema.yml");
            if !is_json && !is_yaml {
                continue;
            }

            let content = std::fs::read_to_string(&path)?;
            let value: Value = if is_json {
                serde_json::from_str(&content).map_err(|e| {
                    tracing::warn!(path = %path.display(), error = %e, "schema file is not valid JSON");
                    RegistryError::SchemaLoadError {
                        schema_name: name.to_string(),
                        reason: format!("invalid JSON: {e}"),
                    }
                })?
            } else {
                serde_yaml::from_str(&content).map_err(|e| {
                    tracing::warn!(path = %path.display(), error = %e, "schema file is not valid YAML");
                    RegistryError::SchemaLoadError {
                        schema_name: name.to_string(),
                        reason: format!("invalid YAML: {e}"),
                    }
                })?
            };
            schemas.insert(name.to_string(), value);
        }

        tracing::debug!(dir = %dir.display(), schema_count = schemas.len(), "loaded item schemas");
        Ok(Self {
            source_dir: Some(dir),
            schemas,
        })
    }

    /// Register a document under `name`, returning any document it replaces.
    pub fn insert(&mut self, name: impl Into<String>, document: Value) -> Option<Value> {
        self.schemas.insert(name.into(), document)
    }

    /// Directory the registry was loaded from.
    pub fn source_dir(&self) -> Option<&Path> {
        self.source_dir.as_deref()
    }

    /// Returns the number of registered documents.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Returns the names of all registered documents, sorted alphabetically.
    pub fn schema_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(|s| s.as_str()).collect();
        names.sort();
        names
    }

    /// Look up a document by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schemas.get(name)
    }

    /// Build `ValidationOptions` whose retriever resolves every registered
    /// document by name and by `$id`.
    fn build_options(&self) -> ValidationOptions {
        let mut opts = jsonschema::options();
        opts.with_draft(jsonschema::Draft::Draft202012);

        let mut refs = HashMap::new();
        for (name, value) in &self.schemas {
            if let Some(id) = value.get("$id").and_then(Value::as_str) {
                refs.insert(id.to_string(), value.clone());
            }
            refs.insert(name.clone(), value.clone());
        }

        opts.with_retriever(RegistryRefs(refs));
        opts
    }

    /// Compile the document registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::SchemaNotFound` if no such document exists,
    /// `RegistryError::ValidatorBuildError` if it does not compile.
    pub fn compile(&self, name: &str) -> Result<CompiledSchema, RegistryError> {
        let document = self.schemas.get(name).ok_or_else(|| RegistryError::SchemaNotFound {
            schema_name: name.to_string(),
            registered: self.schema_names().join(", "),
        })?;
        CompiledSchema::compile_with(name, document, &self.build_options())
    }

    /// Validate a JSON value against the document registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::ValidationFailed` with every violation if
    /// the instance is invalid.
    pub fn validate_document(&self, instance: &Value, name: &str) -> Result<(), RegistryError> {
        let compiled = self.compile(name)?;
        let violations = compiled.violations(instance);
        if violations.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::ValidationFailed {
                schema_name: name.to_string(),
                violations,
            })
        }
    }
}

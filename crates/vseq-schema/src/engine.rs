//! # Typed Item Engine
//!
//! Drives serde and `jsonschema` for one typed item at a time. The
//! collection layer decides *when* to coerce (construction, non-strict
//! mutation) and when to only re-check an instance (strict mutation);
//! this module only knows *how*.
//!
//! ## Binding Cache
//!
//! An item type's JSON Schema descriptor is compiled the first time the
//! type is validated and kept for the life of the process, keyed by
//! `TypeId`. This is the only global state in the workspace. Types
//! without a descriptor are never cached and never compiled.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{OnceLock, PoisonError, RwLock};

use serde_json::{json, Value};
use thiserror::Error;
use vseq_core::{ItemSchema, Violation, ViolationKind, Violations};

use crate::compiled::CompiledSchema;

static BINDINGS: OnceLock<RwLock<HashMap<TypeId, CompiledSchema>>> = OnceLock::new();

/// Error from the engine for a single item.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The item type's descriptor could not be compiled.
    #[error("item schema '{schema}' cannot be bound: {reason}")]
    Binding {
        /// Item schema name.
        schema: String,
        /// Compiler message.
        reason: String,
    },

    /// The value was refused. Locations are relative to the item.
    #[error("invalid item:\n{0}")]
    Invalid(Violations),

    /// The item could not be exported to plain JSON.
    #[error("export failed: {0}")]
    Export(String),
}

/// Compiled descriptor of `S`, or `None` if `S` supplies none.
///
/// # Errors
///
/// Returns `EngineError::Binding` if the descriptor is not a valid JSON
/// Schema. Failed bindings are not cached.
pub fn bind<S: ItemSchema>() -> Result<Option<CompiledSchema>, EngineError> {
    let key = TypeId::of::<S>();
    let cache = BINDINGS.get_or_init(Default::default);

    if let Some(hit) = cache
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Ok(Some(hit.clone()));
    }

    let Some(document) = S::json_schema() else {
        return Ok(None);
    };

    let name = S::schema_name();
    let compiled = CompiledSchema::compile(&name, &document).map_err(|e| EngineError::Binding {
        schema: name.to_string(),
        reason: e.to_string(),
    })?;
    tracing::debug!(schema = %name, "bound item schema descriptor");

    let mut guard = cache.write().unwrap_or_else(PoisonError::into_inner);
    Ok(Some(guard.entry(key).or_insert(compiled).clone()))
}

/// Coerce raw JSON into an `S`.
///
/// Runs, in order: descriptor validation (every failing keyword is
/// reported), deserialization, and the item's own `check`. The first
/// stage that fails ends the pipeline.
///
/// # Errors
///
/// `EngineError::Binding` if the descriptor cannot be compiled,
/// `EngineError::Invalid` with item-relative violations otherwise.
pub fn coerce<S: ItemSchema>(raw: &Value) -> Result<S, EngineError> {
    if let Some(compiled) = bind::<S>()? {
        let violations = compiled.violations(raw);
        if !violations.is_empty() {
            return Err(EngineError::Invalid(violations));
        }
    }

    let item: S = serde_json::from_value(raw.clone()).map_err(|e| {
        EngineError::Invalid(
            Violation::new(ViolationKind::Coercion, e.to_string())
                .with_input(raw.clone())
                .into(),
        )
    })?;

    run_check(&item)?;
    Ok(item)
}

/// Re-validate an existing instance: its exported form against the
/// descriptor, then its own `check`.
///
/// # Errors
///
/// `EngineError::Binding` if the descriptor cannot be compiled,
/// `EngineError::Export` if the instance cannot be exported, and
/// `EngineError::Invalid` with item-relative violations otherwise.
pub fn check<S: ItemSchema>(item: &S) -> Result<(), EngineError> {
    if let Some(compiled) = bind::<S>()? {
        let violations = compiled.violations(&export(item)?);
        if !violations.is_empty() {
            return Err(EngineError::Invalid(violations));
        }
    }
    run_check(item)
}

fn run_check<S: ItemSchema>(item: &S) -> Result<(), EngineError> {
    match item.check() {
        Ok(()) => Ok(()),
        Err(violations) if violations.is_empty() => Err(EngineError::Invalid(
            Violation::new(ViolationKind::Check, format!("{} check failed", S::schema_name())).into(),
        )),
        Err(violations) => Err(EngineError::Invalid(violations)),
    }
}

/// Export an item to plain JSON.
///
/// # Errors
///
/// Returns `EngineError::Export` if serialization fails (e.g. a map with
/// non-string keys).
pub fn export<S: ItemSchema>(item: &S) -> Result<Value, EngineError> {
    serde_json::to_value(item).map_err(|e| EngineError::Export(e.to_string()))
}

/// The item's descriptor, or `{"title": <name>}` if it supplies none.
pub fn describe<S: ItemSchema>() -> Value {
    S::json_schema().unwrap_or_else(|| json!({ "title": S::schema_name() }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use vseq_core::Loc;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Robot {
        name: String,
        serial: u32,
    }

    impl ItemSchema for Robot {
        fn check(&self) -> Result<(), Violations> {
            if self.name.trim().is_empty() {
                return Err(Violation::field("name", "must not be blank").into());
            }
            Ok(())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Described {
        id: i64,
        tag: String,
    }

    impl ItemSchema for Described {
        fn json_schema() -> Option<Value> {
            Some(json!({
                "type": "object",
                "properties": {
                    "id": {"type": "integer", "minimum": 1},
                    "tag": {"type": "string", "minLength": 1}
                },
                "required": ["id", "tag"]
            }))
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Misdescribed {
        id: i64,
    }

    impl ItemSchema for Misdescribed {
        fn json_schema() -> Option<Value> {
            Some(json!({"type": "no-such-type"}))
        }
    }

    #[test]
    fn test_coerce_valid() {
        let robot: Robot = coerce(&json!({"name": "Bender", "serial": 2716057})).unwrap();
        assert_eq!(robot.serial, 2716057);
    }

    #[test]
    fn test_coerce_reports_serde_error() {
        let err = coerce::<Robot>(&json!({"name": "Bender"})).unwrap_err();
        match err {
            EngineError::Invalid(violations) => {
                assert_eq!(violations.len(), 1);
                let v = &violations.violations()[0];
                assert_eq!(v.kind, ViolationKind::Coercion);
                assert!(v.message.contains("serial"), "got: {}", v.message);
                assert_eq!(v.input, Some(json!({"name": "Bender"})));
            }
            other => panic!("Expected Invalid, got: {other}"),
        }
    }

    #[test]
    fn test_coerce_runs_check() {
        let err = coerce::<Robot>(&json!({"name": "  ", "serial": 1})).unwrap_err();
        match err {
            EngineError::Invalid(violations) => {
                assert_eq!(violations.violations()[0].loc, Loc::root().child("name"));
                assert_eq!(violations.violations()[0].kind, ViolationKind::Check);
            }
            other => panic!("Expected Invalid, got: {other}"),
        }
    }

    #[test]
    fn test_descriptor_reports_every_keyword() {
        let err = coerce::<Described>(&json!({"id": 0, "tag": ""})).unwrap_err();
        match err {
            EngineError::Invalid(violations) => {
                assert_eq!(violations.len(), 2, "got: {violations}");
                assert!(violations.violations().iter().all(|v| v.kind == ViolationKind::Schema));
            }
            other => panic!("Expected Invalid, got: {other}"),
        }
    }

    #[test]
    fn test_bind_is_cached() {
        let first = bind::<Described>().unwrap().unwrap();
        let second = bind::<Described>().unwrap().unwrap();
        assert!(first.same_binding(&second));
        assert!(bind::<Robot>().unwrap().is_none());
    }

    #[test]
    fn test_bad_descriptor_is_binding_error() {
        let err = coerce::<Misdescribed>(&json!({"id": 1})).unwrap_err();
        assert!(
            matches!(err, EngineError::Binding { ref schema, .. } if schema == "Misdescribed"),
            "Expected Binding, got: {err}"
        );
    }

    #[test]
    fn test_check_instance() {
        assert!(check(&Robot { name: "Flexo".into(), serial: 3370318 }).is_ok());
        assert!(check(&Robot { name: String::new(), serial: 1 }).is_err());
    }

    #[test]
    fn test_check_instance_against_descriptor() {
        assert!(check(&Described { id: 3, tag: "x".into() }).is_ok());
        match check(&Described { id: 0, tag: String::new() }).unwrap_err() {
            EngineError::Invalid(violations) => {
                assert_eq!(violations.len(), 2, "got: {violations}");
                assert!(violations.violations().iter().all(|v| v.kind == ViolationKind::Schema));
                assert!(violations.violations().iter().all(|v| v.input.is_some()));
            }
            other => panic!("Expected Invalid, got: {other}"),
        }
        assert!(matches!(
            check(&Misdescribed { id: 1 }),
            Err(EngineError::Binding { .. })
        ));
    }

    #[test]
    fn test_export_and_describe() {
        let robot = Robot { name: "Bender".into(), serial: 1 };
        assert_eq!(export(&robot).unwrap(), json!({"name": "Bender", "serial": 1}));
        assert_eq!(describe::<Robot>(), json!({"title": "Robot"}));
        assert_eq!(describe::<i64>(), json!({"type": "integer"}));
    }

    #[test]
    fn test_primitive_coercion_is_not_lenient() {
        assert_eq!(coerce::<i64>(&json!(5)).unwrap(), 5);
        assert!(coerce::<i64>(&json!("5")).is_err());
    }
}

//! Hooks that let a collection take part in validating and describing an
//! enclosing document.

use std::borrow::Cow;

use serde_json::Value;
use vseq_core::{CollectionError, Loc, LocSegment, Violation, ViolationKind};

/// Where in an enclosing document a value is being validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    loc: Loc,
}

impl ValidationContext {
    /// Validation of a standalone value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Validation of a value found at `loc`.
    pub fn at(loc: Loc) -> Self {
        Self { loc }
    }

    /// A context one segment deeper.
    pub fn child(&self, segment: impl Into<LocSegment>) -> Self {
        Self {
            loc: self.loc.child(segment),
        }
    }

    /// Location of the value being validated.
    pub fn loc(&self) -> &Loc {
        &self.loc
    }
}

/// A type that validates, exports, and describes itself as one field of a
/// larger schema-described document.
pub trait SchemaParticipant: Sized {
    /// Name used in errors.
    fn type_name() -> Cow<'static, str>;

    /// Validate (coercing) a raw value found at `ctx`. Violation locations
    /// are prefixed with the context location.
    fn validate_with(raw: &Value, ctx: &ValidationContext) -> Result<Self, CollectionError>;

    /// Plain, schema-free data: every element exported through its item
    /// schema.
    fn serialize_plain(&self) -> Result<Value, CollectionError>;

    /// JSON Schema style descriptor of the type.
    fn describe_type() -> Value;

    /// Validate a raw value at the document root.
    fn validate(raw: &Value) -> Result<Self, CollectionError> {
        Self::validate_with(raw, &ValidationContext::root())
    }

    /// Parse JSON text, then validate it.
    fn validate_json(text: &str) -> Result<Self, CollectionError> {
        let raw: Value = serde_json::from_str(text).map_err(|e| CollectionError::Validation {
            collection: Self::type_name().into_owned(),
            violations: Violation::new(ViolationKind::Shape, format!("invalid JSON: {e}")).into(),
        })?;
        Self::validate(&raw)
    }
}

/// Validation error for a value of the wrong JSON shape.
pub(crate) fn shape_error(collection: &str, ctx: &ValidationContext, expected: &str, raw: &Value) -> CollectionError {
    CollectionError::Validation {
        collection: collection.to_string(),
        violations: Violation::new(
            ViolationKind::Shape,
            format!("expected {expected}, got {}", vseq_core::json_type_name(raw)),
        )
        .at(ctx.loc().clone())
        .with_input(raw.clone())
        .into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_nesting() {
        let ctx = ValidationContext::root().child("users").child(2);
        assert_eq!(ctx.loc().to_string(), "users.2");
        assert!(ValidationContext::root().loc().is_root());
    }
}

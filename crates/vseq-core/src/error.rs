//! # Error Types: Collection Error Taxonomy
//!
//! Defines the single error type returned by every collection operation.
//! All errors use `thiserror` for derive-based `Display` and `Error`
//! implementations.
//!
//! ## Design
//!
//! - Binding errors mean the collection type itself is unusable: no item
//!   schema was bound, or the bound descriptor cannot be compiled.
//! - Validation errors carry every located violation of the failing call,
//!   never just the first.
//! - Assignment type errors are strict-mode refusals of raw data and name
//!   both the expected schema and the actual input type.
//! - Every failing call leaves the collection exactly as it was.

use thiserror::Error;

use crate::violation::{Loc, Violations};

/// Error returned by collection construction, mutation, and export.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollectionError {
    /// The collection type has no usable item schema.
    #[error("schema binding error for '{collection}': {reason}")]
    SchemaBinding {
        /// Name of the collection type.
        collection: String,
        /// Why the binding could not be established.
        reason: String,
    },

    /// One or more values failed item schema validation.
    #[error("{count} validation error(s) for '{collection}':\n{violations}", count = .violations.len())]
    Validation {
        /// Name of the collection type.
        collection: String,
        /// Every violation of the failing call, located from the container root.
        violations: Violations,
    },

    /// Strict assignment received a value that is not an item schema instance.
    #[error("assignment type error for '{collection}' at {loc}: expected an instance of {expected}, got {actual}")]
    AssignmentType {
        /// Name of the collection type.
        collection: String,
        /// Position the value was destined for.
        loc: Loc,
        /// Name of the bound item schema.
        expected: String,
        /// Type of the value actually received.
        actual: String,
    },

    /// A position was outside the collection.
    #[error("index {index} out of range for '{collection}' of length {len}")]
    IndexOutOfRange {
        /// Name of the collection type.
        collection: String,
        /// The requested position.
        index: usize,
        /// Length of the collection at the time of the call.
        len: usize,
    },

    /// A key was absent from a keyed collection.
    #[error("key '{key}' not found in '{collection}'")]
    KeyNotFound {
        /// Name of the collection type.
        collection: String,
        /// The requested key.
        key: String,
    },

    /// Exporting elements to plain data or text failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Collection configuration text could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CollectionError {
    /// Returns the violations of a [`CollectionError::Validation`].
    pub fn violations(&self) -> Option<&Violations> {
        match self {
            Self::Validation { violations, .. } => Some(violations),
            _ => None,
        }
    }

    /// Returns true for [`CollectionError::Validation`].
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true for [`CollectionError::AssignmentType`].
    pub fn is_assignment_type(&self) -> bool {
        matches!(self, Self::AssignmentType { .. })
    }

    /// Returns true for [`CollectionError::IndexOutOfRange`] and
    /// [`CollectionError::KeyNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::IndexOutOfRange { .. } | Self::KeyNotFound { .. })
    }

    /// Returns true for [`CollectionError::SchemaBinding`].
    pub fn is_schema_binding(&self) -> bool {
        matches!(self, Self::SchemaBinding { .. })
    }
}

impl From<serde_json::Error> for CollectionError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::violation::{Violation, ViolationKind};

    #[test]
    fn test_validation_display_counts_violations() {
        let violations: Violations = vec![
            Violation::new(ViolationKind::Coercion, "missing field `name`").at(Loc::root().child(0usize)),
            Violation::new(ViolationKind::Coercion, "invalid type").at(Loc::root().child(2usize)),
        ]
        .into_iter()
        .collect();
        let err = CollectionError::Validation {
            collection: "Users".into(),
            violations,
        };
        let display = err.to_string();
        assert!(display.starts_with("2 validation error(s) for 'Users'"));
        assert!(display.contains("missing field `name`"));
        assert_eq!(err.violations().map(|v| v.indices()), Some(vec![0, 2]));
        assert!(err.is_validation());
    }

    #[test]
    fn test_assignment_type_display() {
        let err = CollectionError::AssignmentType {
            collection: "Users".into(),
            loc: Loc::root().child(3usize),
            expected: "User".into(),
            actual: "object".into(),
        };
        let display = err.to_string();
        assert!(display.contains("at 3"));
        assert!(display.contains("expected an instance of User, got object"));
        assert!(err.is_assignment_type());
        assert!(err.violations().is_none());
    }

    #[test]
    fn test_not_found_variants() {
        let missing = CollectionError::KeyNotFound {
            collection: "Scores".into(),
            key: "zed".into(),
        };
        assert_eq!(missing.to_string(), "key 'zed' not found in 'Scores'");
        assert!(missing.is_not_found());
        let past_end = CollectionError::IndexOutOfRange {
            collection: "Scores".into(),
            index: 4,
            len: 2,
        };
        assert!(past_end.is_not_found());
        assert!(!past_end.is_validation());
    }
}

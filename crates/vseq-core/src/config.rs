//! # Collection Configuration
//!
//! `CollectionConfig` is attached to a collection type when the type is
//! declared and read on every mutating call. It is never changed per
//! instance.
//!
//! Configuration can be written as a `const` (the normal case for typed
//! collections) or parsed from JSON or YAML text with unknown keys
//! rejected.

use serde::{Deserialize, Serialize};

use crate::error::CollectionError;

/// Options controlling how a collection validates mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CollectionConfig {
    /// When true (the default), mutations only accept values that are
    /// already item schema instances and reject raw data with an
    /// assignment type error. When false, raw data is coerced through the
    /// item schema exactly as during construction.
    pub validate_assignment_strict: bool,
}

impl CollectionConfig {
    /// Build a config with an explicit strictness.
    pub const fn new(validate_assignment_strict: bool) -> Self {
        Self {
            validate_assignment_strict,
        }
    }

    /// Raw data is rejected on mutation (the default).
    pub const fn strict() -> Self {
        Self::new(true)
    }

    /// Raw data is coerced on mutation.
    pub const fn lenient() -> Self {
        Self::new(false)
    }

    /// Returns true if mutations reject raw data.
    pub const fn is_strict(&self) -> bool {
        self.validate_assignment_strict
    }

    /// Parse a config from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::Config` on malformed JSON or unknown keys.
    pub fn from_json_str(text: &str) -> Result<Self, CollectionError> {
        serde_json::from_str(text).map_err(|e| CollectionError::Config(format!("invalid JSON: {e}")))
    }

    /// Parse a config from YAML text.
    ///
    /// # Errors
    ///
    /// Returns `CollectionError::Config` on malformed YAML or unknown keys.
    pub fn from_yaml_str(text: &str) -> Result<Self, CollectionError> {
        serde_yaml::from_str(text).map_err(|e| CollectionError::Config(format!("invalid YAML: {e}")))
    }
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self::strict()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_strict() {
        assert!(CollectionConfig::default().is_strict());
        assert_eq!(CollectionConfig::default(), CollectionConfig::strict());
        assert!(!CollectionConfig::lenient().is_strict());
    }

    #[test]
    fn test_from_json() {
        let config = CollectionConfig::from_json_str(r#"{"validate_assignment_strict": false}"#).unwrap();
        assert_eq!(config, CollectionConfig::lenient());
    }

    #[test]
    fn test_missing_key_uses_default() {
        let config = CollectionConfig::from_json_str("{}").unwrap();
        assert!(config.is_strict());
    }

    #[test]
    fn test_from_yaml() {
        let config = CollectionConfig::from_yaml_str("validate_assignment_strict: false\n").unwrap();
        assert!(!config.is_strict());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = CollectionConfig::from_yaml_str("validate_assignment: true\n").unwrap_err();
        assert!(matches!(err, CollectionError::Config(_)), "got: {err}");
    }

    #[test]
    fn test_wrong_type_rejected() {
        let err = CollectionConfig::from_json_str(r#"{"validate_assignment_strict": "yes"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));
    }
}

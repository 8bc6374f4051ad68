//! Collection type descriptors, derived from an item descriptor.

use serde_json::{json, Value};

/// Descriptor of an ordered sequence of `item`.
pub fn sequence_descriptor(collection: &str, item: Value) -> Value {
    json!({
        "type": "array",
        "title": collection,
        "items": item,
    })
}

/// Descriptor of a string-keyed mapping to `item`.
pub fn mapping_descriptor(collection: &str, item: Value) -> Value {
    json!({
        "type": "object",
        "title": collection,
        "additionalProperties": item,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiled::CompiledSchema;

    #[test]
    fn test_sequence_descriptor_wraps_item() {
        let item = json!({"type": "integer"});
        let descriptor = sequence_descriptor("Scores", item.clone());
        assert_eq!(descriptor["type"], "array");
        assert_eq!(descriptor["title"], "Scores");
        assert_eq!(descriptor["items"], item);
    }

    #[test]
    fn test_descriptors_compile_and_validate() {
        let sequence = CompiledSchema::compile(
            "Scores",
            &sequence_descriptor("Scores", json!({"type": "integer"})),
        )
        .unwrap();
        assert!(sequence.is_valid(&json!([1, 2, 3])));
        assert_eq!(sequence.violations(&json!([1, "two"])).indices(), vec![1]);

        let mapping = CompiledSchema::compile(
            "Ranks",
            &mapping_descriptor("Ranks", json!({"type": "integer"})),
        )
        .unwrap();
        assert!(mapping.is_valid(&json!({"a": 1})));
        assert!(!mapping.is_valid(&json!({"a": "x"})));
    }
}

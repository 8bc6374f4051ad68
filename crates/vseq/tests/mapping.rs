//! Integration tests for keyed collections.

mod common;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use vseq::{collection_type, CollectionError, Input, ItemSchema, ValidatingMapping};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct User {
    name: String,
    age: i64,
}

impl ItemSchema for User {}

collection_type!(UsersMapping: User);
collection_type!(WeakUsersMapping: User, strict = false);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct HasUsersMapping {
    users: ValidatingMapping<UsersMapping>,
}

fn users_data(count: i64) -> BTreeMap<String, Value> {
    (0..count)
        .map(|i| (format!("User {i}"), json!({"name": format!("Name {i}"), "age": i})))
        .collect()
}

fn users(count: i64) -> ValidatingMapping<UsersMapping> {
    ValidatingMapping::construct(users_data(count).into_iter().map(|(k, v)| (k, Input::Raw(v)))).unwrap()
}

#[test]
fn test_length_and_lookup() {
    common::init_tracing();
    let users = users(2);
    assert_eq!(users.len(), 2);
    assert_eq!(users["User 1"], User { name: "Name 1".into(), age: 1 });
    assert!(users.get("Invalid key").is_none());
}

#[test]
#[should_panic]
fn test_index_with_missing_key_panics() {
    let users = users(1);
    let _ = &users["Invalid key"];
}

#[test]
fn test_strict_assignment() {
    let mut users = users(2);
    let previous = users
        .insert("User 0", User { name: "New name 0".into(), age: 1 })
        .unwrap();
    assert_eq!(previous.unwrap().name, "Name 0");
    assert_eq!(users["User 0"].name, "New name 0");

    let err = users
        .insert("User 1", Input::raw(json!({"name": "Raw", "age": 2})))
        .unwrap_err();
    match err {
        CollectionError::AssignmentType { loc, .. } => assert_eq!(loc.to_string(), "User 1"),
        other => panic!("Expected AssignmentType, got: {other}"),
    }
    assert_eq!(users["User 1"].name, "Name 1");
}

#[test]
fn test_weak_assignment_coerces() {
    let mut weak = ValidatingMapping::<WeakUsersMapping>::new();
    weak.insert("a", Input::raw(json!({"name": "A", "age": 3}))).unwrap();
    assert_eq!(weak["a"].age, 3);

    let err = weak.insert("b", Input::raw(json!({"name": "B"}))).unwrap_err();
    assert_eq!(err.violations().unwrap().keys(), vec!["b"]);
    assert!(!weak.contains_key("b"));
}

#[test]
fn test_delete_and_iterate_in_key_order() {
    let mut users = users(3);
    assert!(users.remove("User 1").is_some());
    assert!(users.remove("User 1").is_none());
    let keys: Vec<&str> = users.keys().collect();
    assert_eq!(keys, vec!["User 0", "User 2"]);
    let ages: Vec<i64> = users.values().map(|u| u.age).collect();
    assert_eq!(ages, vec![0, 2]);

    users.retain(|key, _| key != "User 0");
    assert_eq!(users.len(), 1);
}

#[test]
fn test_serialization_round_trip() {
    let users = users(2);
    let text = users.to_json().unwrap();
    let back = ValidatingMapping::<UsersMapping>::from_json(&text).unwrap();
    assert_eq!(back, users);

    let holder = HasUsersMapping { users };
    let value = serde_json::to_value(&holder).unwrap();
    assert_eq!(
        value,
        json!({"users": {
            "User 0": {"name": "Name 0", "age": 0},
            "User 1": {"name": "Name 1", "age": 1}
        }})
    );
    let parsed: HasUsersMapping = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, holder);
}

#[test]
fn test_record_field_rejects_invalid_values() {
    let err = serde_json::from_value::<HasUsersMapping>(json!({
        "users": {"ok": {"name": "A", "age": 1}, "bad": {"name": "B", "age": "old"}}
    }))
    .unwrap_err();
    assert!(err.to_string().contains("bad"), "got: {err}");
}

//! Collections used as fields of larger records and as items of other
//! collections.

mod common;

use serde::{Deserialize, Serialize};
use serde_json::json;
use vseq::{
    collection_type, ItemSchema, Loc, Mapping, SchemaParticipant, Sequence, ValidatingSequence,
    ValidationContext, ViolationKind,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Member {
    name: String,
    age: u32,
}

impl ItemSchema for Member {
    fn json_schema() -> Option<serde_json::Value> {
        Some(json!({
            "type": "object",
            "properties": {
                "name": {"type": "string", "minLength": 1},
                "age": {"type": "integer", "minimum": 0}
            },
            "required": ["name", "age"]
        }))
    }
}

collection_type!(Members: Member);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Team {
    users: ValidatingSequence<Members>,
    #[serde(default)]
    reserves: ValidatingSequence<Members>,
}

impl ItemSchema for Team {}

fn alice_and_bob() -> ValidatingSequence<Members> {
    ValidatingSequence::<Members>::construct_raw(vec![
        json!({"name": "Alice", "age": 30}),
        json!({"name": "Bob", "age": 40}),
    ])
    .unwrap()
}

fn member(name: &str, age: u32) -> Member {
    Member {
        name: name.to_string(),
        age,
    }
}

fn assert_still_valid(seq: &ValidatingSequence<Members>) {
    let plain = seq.to_plain().unwrap();
    assert_eq!(ValidatingSequence::<Members>::validate(&plain).unwrap(), *seq);
}

#[test]
fn test_from_items_checks_instances_against_descriptor() {
    common::init_tracing();
    let err = ValidatingSequence::<Members>::from_items([member("Alice", 30), member("", 2)]).unwrap_err();
    let violations = err.violations().unwrap();
    assert_eq!(violations.indices(), vec![1]);
    assert_eq!(violations.violations()[0].loc, Loc::root().child(1).child("name"));
    assert_eq!(violations.violations()[0].kind, ViolationKind::Schema);
}

#[test]
fn test_strict_append_checks_instance_against_descriptor() {
    let mut seq = alice_and_bob();
    let err = seq.append(member("", 2)).unwrap_err();
    assert!(err.is_validation(), "got: {err}");
    assert_eq!(err.violations().unwrap().indices(), vec![2]);
    assert_eq!(seq, alice_and_bob());
    assert_still_valid(&seq);

    assert!(seq.insert(0, member("", 3)).unwrap_err().is_validation());
    assert!(seq.set(1, member("", 4)).unwrap_err().is_validation());
    assert!(seq.extend([member("Carol", 5), member("", 6)]).unwrap_err().is_validation());
    assert_eq!(seq, alice_and_bob());
    assert_still_valid(&seq);
}

#[test]
fn test_set_range_checks_instances_against_descriptor() {
    let mut seq = alice_and_bob();
    let err = seq
        .set_range(0..1, [member("Carol", 5), member("", 6), member("Dan", 7)])
        .unwrap_err();
    assert_eq!(err.violations().unwrap().indices(), vec![1]);
    assert_eq!(seq, alice_and_bob());
    assert_still_valid(&seq);
}

#[test]
fn test_update_checks_edit_against_descriptor() {
    let mut seq = alice_and_bob();
    let err = seq.update(1, |m| m.name.clear()).unwrap_err();
    let violations = err.violations().unwrap();
    assert_eq!(violations.violations()[0].loc, Loc::root().child(1).child("name"));
    assert_eq!(violations.violations()[0].input, Some(json!("")));
    assert_eq!(seq, alice_and_bob());
    assert_still_valid(&seq);

    seq.update(1, |m| m.age = 41).unwrap();
    assert_eq!(seq[1].age, 41);
    assert_still_valid(&seq);
}

#[test]
fn test_mapping_insert_checks_instance_against_descriptor() {
    let mut staff = Mapping::<Member>::new();
    staff.insert("lead", member("Alice", 30)).unwrap();
    let err = staff.insert("intern", member("", 19)).unwrap_err();
    assert_eq!(err.violations().unwrap().keys(), vec!["intern"]);
    assert_eq!(staff.len(), 1);
}

#[test]
fn test_collection_as_record_field_serializes_plainly() {
    common::init_tracing();
    let team = Team {
        users: alice_and_bob(),
        reserves: ValidatingSequence::new(),
    };
    let value = serde_json::to_value(&team).unwrap();
    assert_eq!(
        value,
        json!({
            "users": [{"name": "Alice", "age": 30}, {"name": "Bob", "age": 40}],
            "reserves": []
        })
    );

    let back: Team = serde_json::from_value(value).unwrap();
    assert_eq!(back, team);
}

#[test]
fn test_invalid_nested_element_fails_record_deserialization() {
    let err = serde_json::from_value::<Team>(json!({
        "users": [{"name": "Alice", "age": 30}, {"name": "", "age": 40}]
    }))
    .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("Members"), "got: {message}");
    assert!(message.contains("1.name"), "got: {message}");
}

#[test]
fn test_missing_field_defaults_to_empty_but_null_is_refused() {
    let team: Team = serde_json::from_value(json!({"users": []})).unwrap();
    assert!(team.reserves.is_empty());

    let err = serde_json::from_value::<Team>(json!({"users": null})).unwrap_err();
    assert!(err.to_string().contains("expected array, got null"), "got: {err}");
}

#[test]
fn test_validate_with_prefixes_context_location() {
    let ctx = ValidationContext::root().child("teams").child(4);
    let err = ValidatingSequence::<Members>::validate_with(&json!([{"name": "Ann", "age": -1}]), &ctx)
        .unwrap_err();
    let violations = err.violations().unwrap();
    assert_eq!(
        violations.violations()[0].loc,
        Loc::root().child("teams").child(4).child(0).child("age")
    );
}

#[test]
fn test_sequence_of_records_holding_sequences() {
    let teams = Sequence::<Team>::construct_raw(vec![json!({
        "users": [{"name": "Alice", "age": 30}]
    })])
    .unwrap();
    assert_eq!(teams[0].users[0].name, "Alice");
    assert_eq!(
        teams.to_plain().unwrap(),
        json!([{"users": [{"name": "Alice", "age": 30}], "reserves": []}])
    );
}

#[test]
fn test_sequence_of_sequences_reports_inner_locations() {
    let err = Sequence::<Sequence<i64>>::construct_raw(vec![json!([1, 2]), json!([3, "four"])]).unwrap_err();
    let violations = err.violations().unwrap();
    assert_eq!(violations.indices(), vec![1]);
    assert!(violations
        .violations()
        .iter()
        .any(|v| v.loc == Loc::root().child(1).child(1)));
}

#[test]
fn test_descriptors_nest() {
    let descriptor = ValidatingSequence::<Members>::describe_type();
    assert_eq!(descriptor["type"], "array");
    assert_eq!(descriptor["title"], "Members");
    assert_eq!(descriptor["items"]["required"], json!(["name", "age"]));

    let nested = Mapping::<Sequence<u32>>::describe_type();
    assert_eq!(nested["type"], "object");
    assert_eq!(nested["additionalProperties"]["type"], "array");
    assert_eq!(nested["additionalProperties"]["items"]["type"], "integer");
}

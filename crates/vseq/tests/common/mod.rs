//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use vseq::{collection_type, ItemSchema, Violation, Violations};

/// Route `tracing` output to the test harness. Set `RUST_LOG=vseq=trace`
/// to see gate decisions.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub birth_date: NaiveDateTime,
}

impl ItemSchema for User {
    fn check(&self) -> Result<(), Violations> {
        if self.name.trim().is_empty() {
            return Err(Violation::field("name", "must not be blank").into());
        }
        Ok(())
    }
}

collection_type!(pub UserCollection: User);
collection_type!(pub WeakUserCollection: User, strict = false);

pub fn user_data() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Bender", "birth_date": "2010-04-01T12:59:59"}),
        json!({"id": 2, "name": "Balaganov", "birth_date": "2020-04-01T12:59:59"}),
    ]
}

pub fn user(raw: &Value) -> User {
    serde_json::from_value(raw.clone()).expect("fixture is a valid User")
}

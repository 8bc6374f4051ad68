//! # Item Schema Boundary
//!
//! The schema engine is serde: a raw `serde_json::Value` is coerced into an
//! item by `Deserialize` and exported back by `Serialize`. [`ItemSchema`]
//! adds what a collection needs on top of that: a display name, an
//! optional JSON Schema descriptor that every value entering a collection
//! must satisfy, and a semantic `check` run on every instance that enters
//! a collection.
//!
//! [`Input`] is what mutating operations receive. Keeping instances and
//! raw data apart in the type is what lets a strict collection refuse raw
//! data without inspecting it.

use std::borrow::Cow;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::violation::Violations;

/// A record type that collections can hold.
///
/// Implementors are ordinary serde types. The default methods make a bare
/// `impl ItemSchema for User {}` enough for most records.
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use vseq_core::{ItemSchema, Violation, Violations};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct User {
///     name: String,
///     age: u32,
/// }
///
/// impl ItemSchema for User {
///     fn check(&self) -> Result<(), Violations> {
///         if self.name.is_empty() {
///             return Err(Violation::field("name", "must not be empty").into());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait ItemSchema:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Name used in error messages and type descriptors.
    fn schema_name() -> Cow<'static, str> {
        Cow::Owned(short_type_name::<Self>())
    }

    /// JSON Schema descriptor of the plain form of this item.
    ///
    /// When present, raw input is validated against it before coercion so
    /// that every failing keyword is reported, not only the first serde
    /// error. Instances are exported and validated against it too.
    fn json_schema() -> Option<Value> {
        None
    }

    /// Semantic checks beyond what deserialization enforces.
    ///
    /// Locations in the returned violations are relative to the item.
    fn check(&self) -> Result<(), Violations> {
        Ok(())
    }
}

macro_rules! primitive_item_schema {
    ($($ty:ty => $json_type:literal),* $(,)?) => {
        $(
            impl ItemSchema for $ty {
                fn json_schema() -> Option<Value> {
                    Some(serde_json::json!({ "type": $json_type }))
                }
            }
        )*
    };
}

primitive_item_schema! {
    String => "string",
    bool => "boolean",
    i32 => "integer",
    i64 => "integer",
    u32 => "integer",
    u64 => "integer",
    f64 => "number",
}

/// A value offered to a collection.
#[derive(Debug, Clone, PartialEq)]
pub enum Input<T> {
    /// An already-built item.
    Instance(T),
    /// Raw data to be coerced through the item schema.
    Raw(Value),
}

impl<T> Input<T> {
    /// Wrap raw data.
    pub fn raw(value: Value) -> Self {
        Self::Raw(value)
    }

    /// Returns true for [`Input::Raw`].
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

impl<T> From<T> for Input<T> {
    fn from(item: T) -> Self {
        Self::Instance(item)
    }
}

/// JSON type name of a raw value, as used in assignment type errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Type name with module paths stripped, generics included.
///
/// `alloc::vec::Vec<my_crate::User>` becomes `Vec<User>`.
pub fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut token = String::new();
    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            token.push(ch);
        } else {
            out.push_str(token.rsplit("::").next().unwrap_or(&token));
            token.clear();
            out.push(ch);
        }
    }
    out.push_str(token.rsplit("::").next().unwrap_or(&token));
    out
}

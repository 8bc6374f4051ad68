//! # Validating Mapping
//!
//! `ValidatingMapping<T>` is the keyed counterpart of
//! [`ValidatingSequence`](crate::ValidatingSequence): string keys, values
//! that are always valid instances of `T::Item`, and the same
//! strict/coercing assignment policy. Keys iterate in sorted order.
//! Violations are located by key.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Index;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use vseq_core::{CollectionConfig, CollectionError, Input, Loc};
use vseq_schema::{engine, mapping_descriptor};

use crate::binding::CollectionType;
use crate::gate::{Mode, MutationGate, TypedGate};
use crate::participant::{shape_error, SchemaParticipant, ValidationContext};

/// A string-keyed, schema-validated mapping to `T::Item`.
pub struct ValidatingMapping<T: CollectionType> {
    entries: BTreeMap<String, T::Item>,
    _type: PhantomData<fn() -> T>,
}

impl<T: CollectionType> ValidatingMapping<T> {
    const GATE: TypedGate<T> = TypedGate::new();

    fn wrap(entries: BTreeMap<String, T::Item>) -> Self {
        Self {
            entries,
            _type: PhantomData,
        }
    }

    fn admit_entries<I, K, V>(inputs: I, base: &Loc, mode: Mode) -> Result<Vec<(String, T::Item)>, CollectionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Input<T::Item>>,
    {
        let (keys, located): (Vec<String>, Vec<_>) = inputs
            .into_iter()
            .map(|(key, value)| {
                let key: String = key.into();
                let input: Input<T::Item> = value.into();
                let loc = base.child(key.as_str());
                (key, (input, loc))
            })
            .unzip();
        let items = Self::GATE.admit_all(located, mode)?;
        Ok(keys.into_iter().zip(items).collect())
    }

    /// An empty mapping.
    pub fn new() -> Self {
        Self::wrap(BTreeMap::new())
    }

    /// Build a mapping, coercing raw values regardless of strictness.
    pub fn construct<I, K, V>(inputs: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Input<T::Item>>,
    {
        let entries = Self::admit_entries(inputs, &Loc::root(), Mode::Construct)?;
        tracing::debug!(collection = %T::name(), len = entries.len(), "constructed mapping");
        Ok(Self::wrap(entries.into_iter().collect()))
    }

    /// Parse a JSON object and validate every value.
    pub fn from_json(text: &str) -> Result<Self, CollectionError> {
        <Self as SchemaParticipant>::validate_json(text)
    }

    /// Name of the collection type.
    pub fn name(&self) -> Cow<'static, str> {
        T::name()
    }

    /// Assignment policy of the collection type.
    pub fn config(&self) -> CollectionConfig {
        T::CONFIG
    }

    /// Insert or replace the value under `key`, returning the previous one.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        input: impl Into<Input<T::Item>>,
    ) -> Result<Option<T::Item>, CollectionError> {
        let key = key.into();
        let item = Self::GATE.admit_one(input.into(), Loc::root().child(key.as_str()), Mode::Mutate)?;
        Ok(self.entries.insert(key, item))
    }

    /// Insert every entry, or none if any is refused. Later duplicates win.
    pub fn extend<I, K, V>(&mut self, inputs: I) -> Result<(), CollectionError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Input<T::Item>>,
    {
        let entries = Self::admit_entries(inputs, &Loc::root(), Mode::Mutate)?;
        self.entries.extend(entries);
        Ok(())
    }

    /// Edit a copy of the value under `key` and commit it only if valid.
    pub fn update<F>(&mut self, key: &str, edit: F) -> Result<(), CollectionError>
    where
        F: FnOnce(&mut T::Item),
    {
        let Some(current) = self.entries.get(key) else {
            return Err(CollectionError::KeyNotFound {
                collection: T::name().into_owned(),
                key: key.to_string(),
            });
        };
        let mut edited = current.clone();
        edit(&mut edited);
        let item = Self::GATE.admit_one(Input::Instance(edited), Loc::root().child(key), Mode::Mutate)?;
        self.entries.insert(key.to_string(), item);
        Ok(())
    }

    /// The value under `key`, if any.
    pub fn get(&self, key: &str) -> Option<&T::Item> {
        self.entries.get(key)
    }

    /// Returns true if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Remove and return the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<T::Item> {
        self.entries.remove(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the mapping has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keep only the entries for which `keep` returns true.
    pub fn retain<F: FnMut(&str, &T::Item) -> bool>(&mut self, mut keep: F) {
        self.entries.retain(|k, v| keep(k, v));
    }

    /// Entries in key order.
    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, T::Item> {
        self.entries.iter()
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Values in key order.
    pub fn values(&self) -> std::collections::btree_map::Values<'_, String, T::Item> {
        self.entries.values()
    }

    /// The backing map.
    pub fn as_map(&self) -> &BTreeMap<String, T::Item> {
        &self.entries
    }

    /// Unwrap into the backing map. The result is no longer validated.
    pub fn into_map(self) -> BTreeMap<String, T::Item> {
        self.entries
    }

    /// Plain JSON object of the exported values.
    pub fn to_plain(&self) -> Result<Value, CollectionError> {
        self.serialize_plain()
    }

    /// Compact JSON text of [`to_plain`](Self::to_plain).
    pub fn to_json(&self) -> Result<String, CollectionError> {
        Ok(serde_json::to_string(&self.to_plain()?)?)
    }

    /// Indented JSON text of [`to_plain`](Self::to_plain).
    pub fn to_json_pretty(&self) -> Result<String, CollectionError> {
        Ok(serde_json::to_string_pretty(&self.to_plain()?)?)
    }
}

impl<T: CollectionType> SchemaParticipant for ValidatingMapping<T> {
    fn type_name() -> Cow<'static, str> {
        T::name()
    }

    fn validate_with(raw: &Value, ctx: &ValidationContext) -> Result<Self, CollectionError> {
        let Value::Object(object) = raw else {
            return Err(shape_error(&T::name(), ctx, "object", raw));
        };
        let inputs = object
            .iter()
            .map(|(key, value)| (key.clone(), Input::Raw(value.clone())));
        let entries = Self::admit_entries(inputs, ctx.loc(), Mode::Construct)?;
        Ok(Self::wrap(entries.into_iter().collect()))
    }

    fn serialize_plain(&self) -> Result<Value, CollectionError> {
        let mut object = Map::new();
        for (key, item) in &self.entries {
            let exported = engine::export(item).map_err(|e| CollectionError::Serialization(e.to_string()))?;
            object.insert(key.clone(), exported);
        }
        Ok(Value::Object(object))
    }

    fn describe_type() -> Value {
        mapping_descriptor(&T::name(), engine::describe::<T::Item>())
    }
}

impl<T: CollectionType> Default for ValidatingMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CollectionType> Clone for ValidatingMapping<T> {
    fn clone(&self) -> Self {
        Self::wrap(self.entries.clone())
    }
}

impl<T: CollectionType> PartialEq for ValidatingMapping<T> {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl<T: CollectionType> fmt::Debug for ValidatingMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&T::name()).field(&self.entries).finish()
    }
}

impl<T: CollectionType> fmt::Display for ValidatingMapping<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", T::name(), self.entries)
    }
}

/// Panics if `key` is absent, as `BTreeMap` does. Use [`ValidatingMapping::get`]
/// for a fallible lookup.
impl<T: CollectionType> Index<&str> for ValidatingMapping<T> {
    type Output = T::Item;

    fn index(&self, key: &str) -> &T::Item {
        &self.entries[key]
    }
}

impl<'a, T: CollectionType> IntoIterator for &'a ValidatingMapping<T> {
    type Item = (&'a String, &'a T::Item);
    type IntoIter = std::collections::btree_map::Iter<'a, String, T::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl<T: CollectionType> Serialize for ValidatingMapping<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(&self.entries)
    }
}

impl<'de, T: CollectionType> Deserialize<'de> for ValidatingMapping<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        <Self as SchemaParticipant>::validate(&raw).map_err(D::Error::custom)
    }
}

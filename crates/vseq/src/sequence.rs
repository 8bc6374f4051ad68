//! # Validating Sequence
//!
//! `ValidatingSequence<T>` is an ordered container whose elements are, at
//! all times, valid instances of `T::Item`. It reads like a slice (it
//! derefs to `[T::Item]`) but offers no mutable element access: every
//! write goes through a method that validates first and commits only on
//! success.
//!
//! ## Strict and coercing assignment
//!
//! Construction (`construct`, `validate`, `Deserialize`) always coerces
//! raw data. Mutations (`append`, `insert`, `set`, `set_range`, `extend`,
//! `concat`, `update`) follow `T::CONFIG`: a strict type refuses raw data
//! with `CollectionError::AssignmentType`, a lenient one coerces it.
//!
//! ## Error locations
//!
//! Violations are located from the container root by the position the
//! value was destined for: `append` uses the current length, `insert` and
//! `set` the index, bulk calls the starting position plus the offset
//! within the input.

use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, AddAssign, Deref, RangeBounds};

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use vseq_core::{
    CollectionConfig, CollectionError, Input, ItemSchema, Loc, Violation, ViolationKind, Violations,
};
use vseq_schema::{engine, sequence_descriptor, EngineError};

use crate::binding::CollectionType;
use crate::gate::TypedGate;
use crate::participant::{shape_error, SchemaParticipant, ValidationContext};
use crate::store::Elements;

/// An ordered, schema-validated sequence of `T::Item`.
pub struct ValidatingSequence<T: CollectionType> {
    elements: Elements<T::Item>,
    _type: PhantomData<fn() -> T>,
}

impl<T: CollectionType> ValidatingSequence<T> {
    const GATE: TypedGate<T> = TypedGate::new();

    fn wrap(elements: Elements<T::Item>) -> Self {
        Self {
            elements,
            _type: PhantomData,
        }
    }

    /// An empty sequence.
    pub fn new() -> Self {
        Self::wrap(Elements::default())
    }

    /// Build a sequence from instances and/or raw values, coercing raw
    /// values regardless of strictness.
    ///
    /// # Errors
    ///
    /// `CollectionError::Validation` listing every failing element.
    pub fn construct<I>(inputs: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator,
        I::Item: Into<Input<T::Item>>,
    {
        let inputs = inputs.into_iter().map(Into::into);
        Elements::construct(&Self::GATE, inputs, &Loc::root()).map(Self::wrap)
    }

    /// Build a sequence from raw values only.
    pub fn construct_raw<I>(values: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = Value>,
    {
        Self::construct(values.into_iter().map(Input::Raw))
    }

    /// Build a sequence from existing instances. Each instance is still
    /// re-checked.
    pub fn from_items<I>(items: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = T::Item>,
    {
        Self::construct(items)
    }

    /// Parse a JSON array and validate it.
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

    /// The elements as a slice.
    pub fn as_slice(&self) -> &[T::Item] {
        self.elements.as_slice()
    }

    /// Unwrap into the backing vector. The result is no longer validated.
    pub fn into_vec(self) -> Vec<T::Item> {
        self.elements.into_vec()
    }

    /// Append one value at the end.
    pub fn append(&mut self, input: impl Into<Input<T::Item>>) -> Result<(), CollectionError> {
        self.elements.append(&Self::GATE, input.into())
    }

    /// Insert one value before `index`. `index == len()` appends.
    pub fn insert(&mut self, index: usize, input: impl Into<Input<T::Item>>) -> Result<(), CollectionError> {
        self.elements.insert(&Self::GATE, index, input.into())
    }

    /// Replace the element at `index`, returning the old one.
    pub fn set(&mut self, index: usize, input: impl Into<Input<T::Item>>) -> Result<T::Item, CollectionError> {
        self.elements.set(&Self::GATE, index, input.into())
    }

    /// Replace a range with any number of values, returning the removed
    /// elements.
    pub fn set_range<R, I>(&mut self, range: R, inputs: I) -> Result<Vec<T::Item>, CollectionError>
    where
        R: RangeBounds<usize>,
        I: IntoIterator,
        I::Item: Into<Input<T::Item>>,
    {
        self.elements
            .set_range(&Self::GATE, range, inputs.into_iter().map(Into::into))
    }

    /// Append every value, or none if any is refused.
    pub fn extend<I>(&mut self, inputs: I) -> Result<(), CollectionError>
    where
        I: IntoIterator,
        I::Item: Into<Input<T::Item>>,
    {
        self.elements
            .extend(&Self::GATE, inputs.into_iter().map(Into::into))
    }

    /// Append the elements of a sequence bound to another collection type
    /// with the same item schema. Elements are re-checked.
    pub fn concat<U>(&mut self, other: &ValidatingSequence<U>) -> Result<(), CollectionError>
    where
        U: CollectionType<Item = T::Item>,
    {
        self.extend(other.iter().cloned())
    }

    /// Edit a copy of the element at `index` and commit it only if it is
    /// still valid.
    pub fn update<F>(&mut self, index: usize, edit: F) -> Result<(), CollectionError>
    where
        F: FnOnce(&mut T::Item),
    {
        self.elements.update(&Self::GATE, index, edit)
    }

    /// Remove and return the element at `index`.
    ///
    /// # Errors
    ///
    /// `CollectionError::IndexOutOfRange` if `index >= len()`.
    pub fn remove(&mut self, index: usize) -> Result<T::Item, CollectionError> {
        self.elements
            .remove(index)
            .map_err(|e| e.into_error(&T::name()))
    }

    /// Remove and return the last element.
    pub fn pop(&mut self) -> Option<T::Item> {
        self.elements.pop()
    }

    /// Remove a range, returning the removed elements in order.
    pub fn remove_range<R: RangeBounds<usize>>(&mut self, range: R) -> Result<Vec<T::Item>, CollectionError> {
        self.elements
            .remove_range(range)
            .map_err(|e| e.into_error(&T::name()))
    }

    /// Keep the first `len` elements.
    pub fn truncate(&mut self, len: usize) {
        self.elements.truncate(len);
    }

    /// Remove every element.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Keep only the elements for which `keep` returns true.
    pub fn retain<F: FnMut(&T::Item) -> bool>(&mut self, keep: F) {
        self.elements.retain(keep);
    }

    /// Reverse the order of the elements in place.
    pub fn reverse(&mut self) {
        self.elements.reverse();
    }

    /// Stable sort with a comparator.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T::Item, &T::Item) -> std::cmp::Ordering,
    {
        self.elements.sort_by(compare);
    }

    /// Stable sort by a key.
    pub fn sort_by_key<K: Ord, F: FnMut(&T::Item) -> K>(&mut self, key: F) {
        self.elements.sort_by_key(key);
    }

    /// Swap two elements.
    ///
    /// # Errors
    ///
    /// `CollectionError::IndexOutOfRange` if either position is past the end.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), CollectionError> {
        self.elements.swap(a, b).map_err(|e| e.into_error(&T::name()))
    }

    /// A new sequence of the same type holding a copy of `range`.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Result<Self, CollectionError> {
        self.elements
            .slice(range)
            .map(Self::wrap)
            .map_err(|e| e.into_error(&T::name()))
    }

    /// Plain JSON array of the exported elements.
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

impl<T: CollectionType> SchemaParticipant for ValidatingSequence<T> {
    fn type_name() -> Cow<'static, str> {
        T::name()
    }

    fn validate_with(raw: &Value, ctx: &ValidationContext) -> Result<Self, CollectionError> {
        let Value::Array(values) = raw else {
            return Err(shape_error(&T::name(), ctx, "array", raw));
        };
        let inputs = values.iter().cloned().map(Input::Raw);
        Elements::construct(&Self::GATE, inputs, ctx.loc()).map(Self::wrap)
    }

    fn serialize_plain(&self) -> Result<Value, CollectionError> {
        let exported = self
            .iter()
            .map(|item| engine::export(item).map_err(|e| CollectionError::Serialization(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Value::Array(exported))
    }

    fn describe_type() -> Value {
        sequence_descriptor(&T::name(), engine::describe::<T::Item>())
    }
}

/// Nested collections: a sequence type is itself a valid item schema.
impl<T: CollectionType> ItemSchema for ValidatingSequence<T> {
    fn schema_name() -> Cow<'static, str> {
        T::name()
    }

    fn json_schema() -> Option<Value> {
        Some(<Self as SchemaParticipant>::describe_type())
    }

    fn check(&self) -> Result<(), Violations> {
        let mut violations = Violations::new();
        for (i, item) in self.iter().enumerate() {
            let found = match engine::check(item) {
                Ok(()) => continue,
                Err(EngineError::Invalid(found)) => found,
                Err(other) => Violation::new(ViolationKind::Check, other.to_string()).into(),
            };
            violations.append(found.prefixed(&Loc::root().child(i)));
        }
        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}

impl<T: CollectionType> Default for ValidatingSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: CollectionType> Clone for ValidatingSequence<T> {
    fn clone(&self) -> Self {
        Self::wrap(self.elements.clone())
    }
}

impl<T: CollectionType> PartialEq for ValidatingSequence<T> {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl<T: CollectionType> PartialEq<[T::Item]> for ValidatingSequence<T> {
    fn eq(&self, other: &[T::Item]) -> bool {
        self.as_slice() == other
    }
}

impl<T: CollectionType> PartialEq<Vec<T::Item>> for ValidatingSequence<T> {
    fn eq(&self, other: &Vec<T::Item>) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: CollectionType> fmt::Debug for ValidatingSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(&T::name()).field(&self.as_slice()).finish()
    }
}

impl<T: CollectionType> fmt::Display for ValidatingSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", T::name(), self.as_slice())
    }
}

impl<T: CollectionType> Deref for ValidatingSequence<T> {
    type Target = [T::Item];

    fn deref(&self) -> &[T::Item] {
        self.as_slice()
    }
}

impl<T: CollectionType> AsRef<[T::Item]> for ValidatingSequence<T> {
    fn as_ref(&self) -> &[T::Item] {
        self.as_slice()
    }
}

impl<T: CollectionType> IntoIterator for ValidatingSequence<T> {
    type Item = T::Item;
    type IntoIter = std::vec::IntoIter<T::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.into_vec().into_iter()
    }
}

impl<'a, T: CollectionType> IntoIterator for &'a ValidatingSequence<T> {
    type Item = &'a T::Item;
    type IntoIter = std::slice::Iter<'a, T::Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

/// Same-type concatenation. Both sides are already valid under the same
/// binding, so no element is re-validated.
impl<T: CollectionType> AddAssign for ValidatingSequence<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.elements.absorb(rhs.elements);
    }
}

impl<T: CollectionType> Add for ValidatingSequence<T> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<T: CollectionType> Serialize for ValidatingSequence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.as_slice())
    }
}

impl<'de, T: CollectionType> Deserialize<'de> for ValidatingSequence<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Value::deserialize(deserializer)?;
        <Self as SchemaParticipant>::validate(&raw).map_err(D::Error::custom)
    }
}

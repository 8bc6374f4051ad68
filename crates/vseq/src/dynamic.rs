//! # Runtime-Bound Sequences
//!
//! When the item schema is only known at runtime (a JSON Schema document
//! loaded from disk or received over the wire), a [`SequenceSchema`] plays
//! the role of the collection type. It is built once, shared behind an
//! `Arc`, and every [`DynamicSequence`] bound to it validates through the
//! same compiled validator.
//!
//! Elements are [`Record`]s: JSON values that remember which schema
//! admitted them. Strict assignment accepts only records admitted by the
//! same `SequenceSchema`; anything else is an `AssignmentType` error.
//!
//! ```
//! use serde_json::json;
//! use vseq::{DynamicSequence, Input, SequenceSchema};
//!
//! let schema = SequenceSchema::builder("Users")
//!     .item_schema(json!({
//!         "title": "User",
//!         "type": "object",
//!         "properties": {"name": {"type": "string"}},
//!         "required": ["name"]
//!     }))
//!     .build()
//!     .unwrap();
//!
//! let mut users = DynamicSequence::construct_raw(&schema, vec![json!({"name": "Alice"})]).unwrap();
//! let bob = schema.record(json!({"name": "Bob"})).unwrap();
//! users.append(bob).unwrap();
//! assert!(users.append(Input::raw(json!({"name": "Eve"}))).is_err());
//! assert_eq!(users.len(), 2);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::ops::{Deref, RangeBounds};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;
use vseq_core::{CollectionConfig, CollectionError, Input, Loc};
use vseq_schema::{sequence_descriptor, CompiledSchema, RegistryError, SchemaRegistry};

use crate::gate::{Mode, MutationGate, Rejection};
use crate::participant::{shape_error, ValidationContext};
use crate::store::Elements;

static NEXT_SCHEMA_ID: AtomicU64 = AtomicU64::new(1);

/// A JSON value admitted by a [`SequenceSchema`].
#[derive(Debug, Clone)]
pub struct Record {
    value: Value,
    schema_id: u64,
    schema_name: Arc<str>,
}

impl Record {
    /// The admitted JSON value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Unwrap into the JSON value.
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Name of the item schema that admitted this record.
    pub fn schema_name(&self) -> &str {
        &self.schema_name
    }

    /// Field lookup on an object record.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.value.get(field)
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.schema_name == other.schema_name && self.value == other.value
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

/// A runtime collection type: name, compiled item schema, configuration.
#[derive(Debug)]
pub struct SequenceSchema {
    id: u64,
    name: String,
    item: CompiledSchema,
    item_name: Arc<str>,
    config: CollectionConfig,
}

/// Builder for [`SequenceSchema`].
#[derive(Debug)]
pub struct SequenceSchemaBuilder {
    name: String,
    item: Option<Result<CompiledSchema, RegistryError>>,
    config: CollectionConfig,
}

impl SequenceSchemaBuilder {
    /// Bind an inline JSON Schema document. Its `title`, if any, names
    /// the item schema.
    pub fn item_schema(mut self, document: Value) -> Self {
        let item_name = document
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}.item", self.name));
        self.item = Some(CompiledSchema::compile(&item_name, &document));
        self
    }

    /// Bind a schema held by `registry`, resolving its `$ref`s against the
    /// registry's other documents.
    pub fn item_from_registry(mut self, registry: &SchemaRegistry, name: &str) -> Self {
        self.item = Some(registry.compile(name));
        self
    }

    /// Set the assignment policy.
    pub fn config(mut self, config: CollectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Shorthand for a policy with only `validate_assignment_strict` set.
    pub fn strict(self, strict: bool) -> Self {
        self.config(CollectionConfig::new(strict))
    }

    /// # Errors
    ///
    /// `CollectionError::SchemaBinding` if no item schema was bound, the
    /// registry does not hold it, or it does not compile.
    pub fn build(self) -> Result<Arc<SequenceSchema>, CollectionError> {
        let binding_error = |reason: String| CollectionError::SchemaBinding {
            collection: self.name.clone(),
            reason,
        };
        let item = match self.item {
            None => return Err(binding_error("no item schema bound".to_string())),
            Some(Err(e)) => return Err(binding_error(e.to_string())),
            Some(Ok(compiled)) => compiled,
        };
        let id = NEXT_SCHEMA_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(collection = %self.name, item = %item.name(), id, "bound sequence schema");
        Ok(Arc::new(SequenceSchema {
            id,
            item_name: Arc::from(item.name()),
            name: self.name,
            item,
            config: self.config,
        }))
    }
}

impl SequenceSchema {
    /// Start a schema for sequences named `name`.
    pub fn builder(name: impl Into<String>) -> SequenceSchemaBuilder {
        SequenceSchemaBuilder {
            name: name.into(),
            item: None,
            config: CollectionConfig::default(),
        }
    }

    /// Name of the collection type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the bound item schema.
    pub fn item_name(&self) -> &str {
        &self.item_name
    }

    /// The bound item schema document.
    pub fn item_schema(&self) -> &Value {
        self.item.document()
    }

    /// Assignment policy of the collection type.
    pub fn config(&self) -> CollectionConfig {
        self.config
    }

    /// Validate one raw value into a record bound to this schema.
    pub fn record(&self, raw: Value) -> Result<Record, CollectionError> {
        self.admit_one(Input::Raw(raw), Loc::root(), Mode::Construct)
    }

    /// Descriptor of sequences bound to this schema.
    pub fn describe_type(&self) -> Value {
        sequence_descriptor(&self.name, self.item.document().clone())
    }
}

impl MutationGate for SequenceSchema {
    type Item = Record;

    fn collection(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.name.as_str())
    }

    fn expected(&self) -> Cow<'_, str> {
        Cow::Borrowed(&*self.item_name)
    }

    fn config(&self) -> CollectionConfig {
        self.config
    }

    fn accept_instance(&self, record: Record) -> Result<Record, Rejection> {
        if record.schema_id == self.id {
            return Ok(record);
        }
        Err(Rejection::Mismatch {
            actual: format!("Record[{}]", record.schema_name),
            raw: Some(record.value),
        })
    }

    fn coerce_raw(&self, raw: &Value) -> Result<Record, Rejection> {
        let violations = self.item.violations(raw);
        if !violations.is_empty() {
            return Err(Rejection::Invalid(violations));
        }
        Ok(Record {
            value: raw.clone(),
            schema_id: self.id,
            schema_name: Arc::clone(&self.item_name),
        })
    }
}

/// A sequence whose item schema was bound at runtime.
#[derive(Clone)]
pub struct DynamicSequence {
    schema: Arc<SequenceSchema>,
    elements: Elements<Record>,
}

impl DynamicSequence {
    /// An empty sequence bound to `schema`.
    pub fn new(schema: &Arc<SequenceSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            elements: Elements::default(),
        }
    }

    /// Build a sequence, coercing raw values regardless of strictness.
    pub fn construct<I>(schema: &Arc<SequenceSchema>, inputs: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator,
        I::Item: Into<Input<Record>>,
    {
        Self::construct_at(schema, inputs.into_iter().map(Into::into), &Loc::root())
    }

    /// Build a sequence from raw values only.
    pub fn construct_raw<I>(schema: &Arc<SequenceSchema>, values: I) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = Value>,
    {
        Self::construct(schema, values.into_iter().map(Input::Raw))
    }

    fn construct_at<I>(schema: &Arc<SequenceSchema>, inputs: I, base: &Loc) -> Result<Self, CollectionError>
    where
        I: IntoIterator<Item = Input<Record>>,
    {
        let elements = Elements::construct(schema.as_ref(), inputs, base)?;
        Ok(Self {
            schema: Arc::clone(schema),
            elements,
        })
    }

    /// Validate a raw JSON array found at `ctx`.
    pub fn validate_with(
        schema: &Arc<SequenceSchema>,
        raw: &Value,
        ctx: &ValidationContext,
    ) -> Result<Self, CollectionError> {
        let Value::Array(values) = raw else {
            return Err(shape_error(schema.name(), ctx, "array", raw));
        };
        Self::construct_at(schema, values.iter().cloned().map(Input::Raw), ctx.loc())
    }

    /// Validate a plain JSON array into a sequence bound to `schema`.
    pub fn validate(schema: &Arc<SequenceSchema>, raw: &Value) -> Result<Self, CollectionError> {
        Self::validate_with(schema, raw, &ValidationContext::root())
    }

    /// Parse JSON text and validate it as in [`validate`](Self::validate).
    pub fn validate_json(schema: &Arc<SequenceSchema>, text: &str) -> Result<Self, CollectionError> {
        let raw: Value = serde_json::from_str(text).map_err(|e| CollectionError::Validation {
            collection: schema.name().to_string(),
            violations: vseq_core::Violation::new(vseq_core::ViolationKind::Shape, format!("invalid JSON: {e}"))
                .into(),
        })?;
        Self::validate(schema, &raw)
    }

    /// The schema this sequence is bound to.
    pub fn schema(&self) -> &Arc<SequenceSchema> {
        &self.schema
    }

    /// Name of the bound collection type.
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Assignment policy of the bound schema.
    pub fn config(&self) -> CollectionConfig {
        self.schema.config()
    }

    /// The records as a slice.
    pub fn as_slice(&self) -> &[Record] {
        self.elements.as_slice()
    }

    /// Unwrap into the backing vector.
    pub fn into_vec(self) -> Vec<Record> {
        self.elements.into_vec()
    }

    /// Append one value at the end.
    pub fn append(&mut self, input: impl Into<Input<Record>>) -> Result<(), CollectionError> {
        self.elements.append(self.schema.as_ref(), input.into())
    }

    /// Insert one value before `index`.
    pub fn insert(&mut self, index: usize, input: impl Into<Input<Record>>) -> Result<(), CollectionError> {
        self.elements.insert(self.schema.as_ref(), index, input.into())
    }

    /// Replace the record at `index`, returning the old one.
    pub fn set(&mut self, index: usize, input: impl Into<Input<Record>>) -> Result<Record, CollectionError> {
        self.elements.set(self.schema.as_ref(), index, input.into())
    }

    /// Replace a range with any number of values.
    pub fn set_range<R, I>(&mut self, range: R, inputs: I) -> Result<Vec<Record>, CollectionError>
    where
        R: RangeBounds<usize>,
        I: IntoIterator,
        I::Item: Into<Input<Record>>,
    {
        self.elements
            .set_range(self.schema.as_ref(), range, inputs.into_iter().map(Into::into))
    }

    /// Append every value, or none if any is refused.
    pub fn extend<I>(&mut self, inputs: I) -> Result<(), CollectionError>
    where
        I: IntoIterator,
        I::Item: Into<Input<Record>>,
    {
        self.elements
            .extend(self.schema.as_ref(), inputs.into_iter().map(Into::into))
    }

    /// Append the records of another sequence. Records admitted by a
    /// different schema are foreign: refused when strict, re-validated
    /// otherwise.
    pub fn concat(&mut self, other: &DynamicSequence) -> Result<(), CollectionError> {
        self.extend(other.iter().cloned())
    }

    /// Edit a copy of the record's value at `index` and commit it only if
    /// it still satisfies the item schema.
    pub fn update<F>(&mut self, index: usize, edit: F) -> Result<(), CollectionError>
    where
        F: FnOnce(&mut Value),
    {
        let Some(current) = self.elements.as_slice().get(index) else {
            return Err(CollectionError::IndexOutOfRange {
                collection: self.schema.name().to_string(),
                index,
                len: self.elements.len(),
            });
        };
        let mut edited = current.value.clone();
        edit(&mut edited);
        let record = self
            .schema
            .admit_one(Input::Raw(edited), Loc::root().child(index), Mode::Construct)?;
        self.elements.set(self.schema.as_ref(), index, Input::Instance(record))?;
        Ok(())
    }

    /// Remove and return the record at `index`.
    pub fn remove(&mut self, index: usize) -> Result<Record, CollectionError> {
        self.elements
            .remove(index)
            .map_err(|e| e.into_error(self.schema.name()))
    }

    /// Remove and return the last record.
    pub fn pop(&mut self) -> Option<Record> {
        self.elements.pop()
    }

    /// Remove a range, returning the removed records.
    pub fn remove_range<R: RangeBounds<usize>>(&mut self, range: R) -> Result<Vec<Record>, CollectionError> {
        self.elements
            .remove_range(range)
            .map_err(|e| e.into_error(self.schema.name()))
    }

    /// Keep the first `len` records.
    pub fn truncate(&mut self, len: usize) {
        self.elements.truncate(len);
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.elements.clear();
    }

    /// Keep only the records for which `keep` returns true.
    pub fn retain<F: FnMut(&Record) -> bool>(&mut self, keep: F) {
        self.elements.retain(keep);
    }

    /// Reverse the order of the records in place.
    pub fn reverse(&mut self) {
        self.elements.reverse();
    }

    /// Stable sort with a comparator.
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&Record, &Record) -> std::cmp::Ordering,
    {
        self.elements.sort_by(compare);
    }

    /// Stable sort by a key.
    pub fn sort_by_key<K: Ord, F: FnMut(&Record) -> K>(&mut self, key: F) {
        self.elements.sort_by_key(key);
    }

    /// Swap two records.
    pub fn swap(&mut self, a: usize, b: usize) -> Result<(), CollectionError> {
        self.elements
            .swap(a, b)
            .map_err(|e| e.into_error(self.schema.name()))
    }

    /// A new sequence on the same schema holding a copy of `range`.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> Result<Self, CollectionError> {
        let elements = self
            .elements
            .slice(range)
            .map_err(|e| e.into_error(self.schema.name()))?;
        Ok(Self {
            schema: Arc::clone(&self.schema),
            elements,
        })
    }

    /// Plain JSON array of the record values.
    pub fn to_plain(&self) -> Value {
        Value::Array(self.iter().map(|r| r.value.clone()).collect())
    }

    /// Compact JSON text of [`to_plain`](Self::to_plain).
    pub fn to_json(&self) -> Result<String, CollectionError> {
        Ok(serde_json::to_string(&self.to_plain())?)
    }

    /// Indented JSON text of [`to_plain`](Self::to_plain).
    pub fn to_json_pretty(&self) -> Result<String, CollectionError> {
        Ok(serde_json::to_string_pretty(&self.to_plain())?)
    }
}

impl PartialEq for DynamicSequence {
    fn eq(&self, other: &Self) -> bool {
        self.elements == other.elements
    }
}

impl Deref for DynamicSequence {
    type Target = [Record];

    fn deref(&self) -> &[Record] {
        self.as_slice()
    }
}

impl<'a> IntoIterator for &'a DynamicSequence {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.as_slice().iter()
    }
}

impl fmt::Debug for DynamicSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple(self.schema.name()).field(&self.as_slice()).finish()
    }
}

impl fmt::Display for DynamicSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.schema.name(), self.to_plain())
    }
}

impl Serialize for DynamicSequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.as_slice())
    }
}

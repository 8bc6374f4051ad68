//! # Mutation Gate
//!
//! Every value entering a collection passes through a gate. The gate
//! decides, per input, whether to accept an existing instance, coerce raw
//! data through the item schema, or refuse.
//!
//! Two modes exist:
//!
//! - **Construct**: raw data is always coerced. Used by constructors and
//!   by `validate`/`Deserialize`.
//! - **Mutate**: raw data is coerced only when the collection type is not
//!   strict. Under strict assignment any raw input is an
//!   `AssignmentType` error.
//!
//! Bulk calls admit every input before reporting. A strict type refusal
//! wins over schema violations; otherwise all violations of the call are
//! returned together, each located from the container root.

use std::borrow::Cow;
use std::marker::PhantomData;

use serde_json::Value;
use vseq_core::{
    json_type_name, CollectionConfig, CollectionError, Input, Loc, Violation, ViolationKind,
    Violations,
};
use vseq_schema::{engine, EngineError};

use crate::binding::CollectionType;

/// Why a single input was refused.
#[derive(Debug)]
pub(crate) enum Rejection {
    /// Refused by the item schema. Locations are item-relative.
    Invalid(Violations),
    /// Not an instance of the bound item schema. `raw` carries the plain
    /// data of a foreign instance so that a coercing gate can retry.
    Mismatch { actual: String, raw: Option<Value> },
    /// The item schema itself could not be bound.
    Binding(String),
}

impl From<EngineError> for Rejection {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Invalid(violations) => Rejection::Invalid(violations),
            EngineError::Binding { .. } => Rejection::Binding(err.to_string()),
            EngineError::Export(message) => {
                Rejection::Invalid(Violation::new(ViolationKind::Coercion, message).into())
            }
        }
    }
}

/// Whether raw data may be coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Construct,
    Mutate,
}

/// The validation seam shared by typed and runtime-bound collections.
pub(crate) trait MutationGate {
    type Item;

    fn collection(&self) -> Cow<'_, str>;

    fn expected(&self) -> Cow<'_, str>;

    fn config(&self) -> CollectionConfig;

    /// Re-check a value that claims to be an item instance.
    fn accept_instance(&self, item: Self::Item) -> Result<Self::Item, Rejection>;

    /// Coerce raw data into an item instance.
    fn coerce_raw(&self, raw: &Value) -> Result<Self::Item, Rejection>;

    fn admit(&self, input: Input<Self::Item>, mode: Mode) -> Result<Self::Item, Rejection> {
        let strict = mode == Mode::Mutate && self.config().is_strict();
        match input {
            Input::Instance(item) => match self.accept_instance(item) {
                Err(Rejection::Mismatch { raw: Some(raw), .. }) if !strict => self.coerce_raw(&raw),
                other => other,
            },
            Input::Raw(raw) if strict => Err(Rejection::Mismatch {
                actual: json_type_name(&raw).to_string(),
                raw: None,
            }),
            Input::Raw(raw) => self.coerce_raw(&raw),
        }
    }

    /// Admit every located input or none of them.
    fn admit_all<I>(&self, inputs: I, mode: Mode) -> Result<Vec<Self::Item>, CollectionError>
    where
        I: IntoIterator<Item = (Input<Self::Item>, Loc)>,
    {
        let mut admitted = Vec::new();
        let mut violations = Violations::new();
        let mut mismatch: Option<(Loc, String)> = None;

        for (input, loc) in inputs {
            match self.admit(input, mode) {
                Ok(item) => admitted.push(item),
                Err(Rejection::Invalid(found)) => {
                    tracing::trace!(
                        collection = %self.collection(),
                        loc = %loc,
                        count = found.len(),
                        "value refused by item schema"
                    );
                    violations.append(found.prefixed(&loc));
                }
                Err(Rejection::Mismatch { actual, .. }) => {
                    if mismatch.is_none() {
                        mismatch = Some((loc, actual));
                    }
                }
                Err(Rejection::Binding(reason)) => {
                    return Err(CollectionError::SchemaBinding {
                        collection: self.collection().into_owned(),
                        reason,
                    });
                }
            }
        }

        if let Some((loc, actual)) = mismatch {
            tracing::debug!(
                collection = %self.collection(),
                loc = %loc,
                actual = %actual,
                "strict assignment refused raw value"
            );
            return Err(CollectionError::AssignmentType {
                collection: self.collection().into_owned(),
                loc,
                expected: self.expected().into_owned(),
                actual,
            });
        }

        if !violations.is_empty() {
            return Err(CollectionError::Validation {
                collection: self.collection().into_owned(),
                violations,
            });
        }

        Ok(admitted)
    }

    fn admit_one(
        &self,
        input: Input<Self::Item>,
        loc: Loc,
        mode: Mode,
    ) -> Result<Self::Item, CollectionError> {
        let mut admitted = self.admit_all(std::iter::once((input, loc)), mode)?;
        admitted.pop().ok_or_else(|| CollectionError::Validation {
            collection: self.collection().into_owned(),
            violations: Violations::new(),
        })
    }
}

/// Gate for a compile-time collection type.
pub(crate) struct TypedGate<T>(PhantomData<fn() -> T>);

impl<T: CollectionType> TypedGate<T> {
    pub(crate) const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: CollectionType> MutationGate for TypedGate<T> {
    type Item = T::Item;

    fn collection(&self) -> Cow<'_, str> {
        T::name()
    }

    fn expected(&self) -> Cow<'_, str> {
        <T::Item as vseq_core::ItemSchema>::schema_name()
    }

    fn config(&self) -> CollectionConfig {
        T::CONFIG
    }

    fn accept_instance(&self, item: T::Item) -> Result<T::Item, Rejection> {
        engine::check(&item)?;
        Ok(item)
    }

    fn coerce_raw(&self, raw: &Value) -> Result<T::Item, Rejection> {
        Ok(engine::coerce::<T::Item>(raw)?)
    }
}

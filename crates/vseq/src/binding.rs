//! # Collection Type Factory
//!
//! A collection type is a zero-sized Rust type that binds an item schema
//! and a [`CollectionConfig`] once, at declaration. Every container
//! instance of that type shares the binding; nothing about it can change
//! per instance.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use vseq::{collection_type, ItemSchema, Sequence, ValidatingSequence};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! pub struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! impl ItemSchema for User {}
//!
//! // Default binding: strict assignment.
//! type Users = Sequence<User>;
//!
//! // Named binding with coercing assignment.
//! collection_type!(pub WeakUsers: User, strict = false);
//!
//! let users = Users::new();
//! let weak = ValidatingSequence::<WeakUsers>::new();
//! assert!(users.config().is_strict());
//! assert!(!weak.config().is_strict());
//! assert_eq!(weak.name(), "WeakUsers");
//! ```
//!
//! Item schemas are bound at compile time, so a typed collection can never
//! be used unbound. Runtime-bound collections go through
//! [`SequenceSchema`](crate::SequenceSchema), whose builder reports
//! `CollectionError::SchemaBinding` when no item schema was supplied.

use std::borrow::Cow;
use std::marker::PhantomData;

use vseq_core::{CollectionConfig, ItemSchema};

use crate::mapping::ValidatingMapping;
use crate::sequence::ValidatingSequence;

/// A declared collection type: an item schema plus its configuration.
pub trait CollectionType: 'static {
    /// The item schema every element must satisfy.
    type Item: ItemSchema;

    /// Configuration fixed at declaration.
    const CONFIG: CollectionConfig = CollectionConfig::strict();

    /// Name used in errors, `Display` output, and descriptors.
    fn name() -> Cow<'static, str> {
        Cow::Owned(format!("Collection[{}]", Self::Item::schema_name()))
    }
}

/// The generic binding of `S` with the default (strict) configuration.
pub struct Bound<S>(PhantomData<fn() -> S>);

impl<S: ItemSchema> CollectionType for Bound<S> {
    type Item = S;
}

/// A sequence of `S` with the default configuration.
pub type Sequence<S> = ValidatingSequence<Bound<S>>;

/// A mapping to `S` with the default configuration.
pub type Mapping<S> = ValidatingMapping<Bound<S>>;

/// Declare a named collection type.
///
/// ```
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// # pub struct Ship { name: String }
/// # impl vseq::ItemSchema for Ship {}
/// vseq::collection_type! {
///     /// The fleet, coerced from raw records on assignment.
///     pub Fleet: Ship, strict = false
/// }
/// # use vseq::CollectionType;
/// # assert!(!Fleet::CONFIG.is_strict());
/// ```
#[macro_export]
macro_rules! collection_type {
    (@config) => {
        $crate::CollectionConfig::strict()
    };
    (@config $strict:expr) => {
        $crate::CollectionConfig::new($strict)
    };
    ($(#[$meta:meta])* $vis:vis $name:ident : $item:ty $(, strict = $strict:expr)? $(,)?) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        $vis struct $name;

        impl $crate::CollectionType for $name {
            type Item = $item;
            const CONFIG: $crate::CollectionConfig = $crate::collection_type!(@config $($strict)?);

            fn name() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(stringify!($name))
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Part {
        sku: String,
    }

    impl ItemSchema for Part {}

    crate::collection_type!(Parts: Part);
    crate::collection_type!(LooseParts: Part, strict = false);

    #[test]
    fn test_bound_uses_default_config_and_derived_name() {
        assert!(<Bound<Part> as CollectionType>::CONFIG.is_strict());
        assert_eq!(<Bound<Part> as CollectionType>::name(), "Collection[Part]");
    }

    #[test]
    fn test_macro_declared_types() {
        assert!(Parts::CONFIG.is_strict());
        assert!(!LooseParts::CONFIG.is_strict());
        assert_eq!(Parts::name(), "Parts");
        assert_eq!(LooseParts::name(), "LooseParts");
    }
}

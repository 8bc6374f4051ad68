//! # Violations: Located Validation Failures
//!
//! A [`Violation`] is one reason a value was refused by the schema engine,
//! anchored at a [`Loc`]: the path from the container root to the
//! offending value. Locations start with the element position (an index
//! for sequences, a key for mappings) followed by the field path reported
//! by the engine.
//!
//! Bulk operations aggregate violations from every element into a single
//! [`Violations`] list so the caller sees all failures of one call at once.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step of a location path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocSegment {
    /// Position inside a sequence.
    Index(usize),
    /// Key inside a mapping or field name inside a record.
    Key(String),
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => write!(f, "{k}"),
        }
    }
}

impl From<usize> for LocSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl From<&str> for LocSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for LocSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

/// Path from a container root to a value inside it.
///
/// The empty path is the root itself and displays as `(root)`. Other
/// paths display as dot-separated segments, e.g. `1.birth_date`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Loc(Vec<LocSegment>);

impl Loc {
    /// The root location (empty path).
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Returns true if this is the root location.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the segments of this path, outermost first.
    pub fn segments(&self) -> &[LocSegment] {
        &self.0
    }

    /// Returns the outermost segment, if any.
    pub fn first(&self) -> Option<&LocSegment> {
        self.0.first()
    }

    /// Returns a new location one step below this one.
    pub fn child(&self, segment: impl Into<LocSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        Self(segments)
    }

    /// Returns this path re-rooted under `prefix`.
    pub fn prefixed(self, prefix: &Loc) -> Self {
        if prefix.is_root() {
            return self;
        }
        let mut segments = prefix.0.clone();
        segments.extend(self.0);
        Self(segments)
    }

    /// Parse a JSON Pointer (RFC 6901), as reported by JSON Schema
    /// validators, into a location.
    ///
    /// Segments made only of ASCII digits become [`LocSegment::Index`];
    /// everything else becomes [`LocSegment::Key`] with `~1` and `~0`
    /// unescaped.
    pub fn from_json_pointer(pointer: &str) -> Self {
        let segments = pointer
            .split('/')
            .skip(1)
            .map(|raw| {
                if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
                    if let Ok(index) = raw.parse::<usize>() {
                        return LocSegment::Index(index);
                    }
                }
                LocSegment::Key(raw.replace("~1", "/").replace("~0", "~"))
            })
            .collect();
        Self(segments)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl FromIterator<LocSegment> for Loc {
    fn from_iter<I: IntoIterator<Item = LocSegment>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Which stage of the engine refused a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Deserialization into the item type failed.
    Coercion,
    /// A JSON Schema keyword of the item descriptor failed.
    Schema,
    /// The item's own semantic check failed.
    Check,
    /// The container-level shape was wrong (e.g. not an array).
    Shape,
}

impl ViolationKind {
    /// Stable snake_case name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Coercion => "coercion",
            Self::Schema => "schema",
            Self::Check => "check",
            Self::Shape => "shape",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation violation with structured context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Location of the violating value relative to the container root.
    pub loc: Loc,
    /// Engine stage that produced the violation.
    pub kind: ViolationKind,
    /// Human-readable description of the violation.
    pub message: String,
    /// The refused input, when it is cheap to keep.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
}

impl Violation {
    /// A violation at the root location.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            loc: Loc::root(),
            kind,
            message: message.into(),
            input: None,
        }
    }

    /// Shorthand for a [`ViolationKind::Check`] violation on a field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::new(ViolationKind::Check, message).at(Loc::root().child(field))
    }

    /// Replace the location.
    pub fn at(mut self, loc: Loc) -> Self {
        self.loc = loc;
        self
    }

    /// Attach the refused input.
    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "  {}: {} [{}]", self.loc, self.message, self.kind)
    }
}

/// Collection of validation violations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Returns true if there are no violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Returns a slice of all violations.
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Violation> {
        self.violations
    }

    /// Append one violation.
    pub fn push(&mut self, violation: Violation) {
        self.violations.push(violation);
    }

    /// Append every violation of `other`.
    pub fn append(&mut self, other: Violations) {
        self.violations.extend(other.violations);
    }

    /// Re-root every violation under `prefix`.
    pub fn prefixed(self, prefix: &Loc) -> Self {
        Self {
            violations: self
                .violations
                .into_iter()
                .map(|v| {
                    let loc = v.loc.clone().prefixed(prefix);
                    v.at(loc)
                })
                .collect(),
        }
    }

    /// Sorted, de-duplicated element indices named by the outermost
    /// location segment of each violation.
    pub fn indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .violations
            .iter()
            .filter_map(|v| match v.loc.first() {
                Some(LocSegment::Index(i)) => Some(*i),
                _ => None,
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Sorted, de-duplicated mapping keys named by the outermost location
    /// segment of each violation.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .violations
            .iter()
            .filter_map(|v| match v.loc.first() {
                Some(LocSegment::Key(k)) => Some(k.as_str()),
                _ => None,
            })
            .collect();
        keys.sort_unstable();
        keys.dedup();
        keys
    }
}

impl From<Violation> for Violations {
    fn from(violation: Violation) -> Self {
        Self {
            violations: vec![violation],
        }
    }
}

impl FromIterator<Violation> for Violations {
    fn from_iter<I: IntoIterator<Item = Violation>>(iter: I) -> Self {
        Self {
            violations: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl fmt::Display for Violations {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, v) in self.violations.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{v}")?;
        }
        Ok(())
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn segment() -> impl Strategy<Value = LocSegment> {
        prop_oneof![
            (0usize..10_000).prop_map(LocSegment::Index),
            "[a-z_/~]{1,12}".prop_map(LocSegment::Key),
        ]
    }

    fn pointer(loc: &Loc) -> String {
        loc.segments()
            .iter()
            .map(|s| match s {
                LocSegment::Index(i) => format!("/{i}"),
                LocSegment::Key(k) => format!("/{}", k.replace('~', "~0").replace('/', "~1")),
            })
            .collect()
    }

    proptest! {
        /// Escaped JSON Pointers parse back into the same location.
        #[test]
        fn json_pointer_round_trip(segments in prop::collection::vec(segment(), 0..6)) {
            let loc: Loc = segments.into_iter().collect();
            prop_assert_eq!(Loc::from_json_pointer(&pointer(&loc)), loc);
        }

        /// Prefixing keeps the inner path as a suffix.
        #[test]
        fn prefixed_keeps_suffix(
            outer in prop::collection::vec(segment(), 0..4),
            inner in prop::collection::vec(segment(), 0..4),
        ) {
            let prefix: Loc = outer.iter().cloned().collect();
            let loc: Loc = inner.iter().cloned().collect();
            let joined = loc.prefixed(&prefix);
            prop_assert_eq!(joined.segments().len(), outer.len() + inner.len());
            prop_assert_eq!(&joined.segments()[outer.len()..], inner.as_slice());
        }
    }
}

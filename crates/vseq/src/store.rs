//! Element storage shared by the typed and runtime-bound sequences.
//!
//! `Elements` owns the backing `Vec` and is the only code that writes to
//! it. Operations that introduce values take a gate and commit only after
//! the gate admitted every input; operations that only remove or reorder
//! existing (already valid) elements take none.

use std::cmp::Ordering;
use std::ops::{Bound, RangeBounds};

use vseq_core::{CollectionError, Input, Loc};

use crate::gate::{Mode, MutationGate};

/// A position outside the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OutOfRange {
    pub(crate) index: usize,
    pub(crate) len: usize,
}

impl OutOfRange {
    pub(crate) fn into_error(self, collection: &str) -> CollectionError {
        CollectionError::IndexOutOfRange {
            collection: collection.to_string(),
            index: self.index,
            len: self.len,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Elements<I> {
    items: Vec<I>,
}

impl<I> Default for Elements<I> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<I> Elements<I> {
    /// Wrap items that were admitted elsewhere.
    pub(crate) fn from_admitted(items: Vec<I>) -> Self {
        Self { items }
    }

    /// Admit `inputs` in construction mode, locating each under `base`.
    pub(crate) fn construct<G, It>(gate: &G, inputs: It, base: &Loc) -> Result<Self, CollectionError>
    where
        G: MutationGate<Item = I>,
        It: IntoIterator<Item = Input<I>>,
    {
        let located = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| (input, base.child(i)));
        let items = gate.admit_all(located, Mode::Construct)?;
        tracing::debug!(collection = %gate.collection(), len = items.len(), "constructed sequence");
        Ok(Self { items })
    }

    pub(crate) fn as_slice(&self) -> &[I] {
        &self.items
    }

    pub(crate) fn into_vec(self) -> Vec<I> {
        self.items
    }

    pub(crate) fn len(&self) -> usize {
        self.items.len()
    }

    fn out_of_range(&self, index: usize) -> OutOfRange {
        OutOfRange {
            index,
            len: self.items.len(),
        }
    }

    fn resolve<R: RangeBounds<usize>>(&self, range: R) -> Result<(usize, usize), OutOfRange> {
        let len = self.items.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        };
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        };
        if end > len {
            return Err(self.out_of_range(end));
        }
        if start > end {
            return Err(self.out_of_range(start));
        }
        Ok((start, end))
    }

    pub(crate) fn append<G>(&mut self, gate: &G, input: Input<I>) -> Result<(), CollectionError>
    where
        G: MutationGate<Item = I>,
    {
        let loc = Loc::root().child(self.items.len());
        let item = gate.admit_one(input, loc, Mode::Mutate)?;
        self.items.push(item);
        Ok(())
    }

    pub(crate) fn insert<G>(&mut self, gate: &G, index: usize, input: Input<I>) -> Result<(), CollectionError>
    where
        G: MutationGate<Item = I>,
    {
        if index > self.items.len() {
            return Err(self.out_of_range(index).into_error(&gate.collection()));
        }
        let item = gate.admit_one(input, Loc::root().child(index), Mode::Mutate)?;
        self.items.insert(index, item);
        Ok(())
    }

    pub(crate) fn set<G>(&mut self, gate: &G, index: usize, input: Input<I>) -> Result<I, CollectionError>
    where
        G: MutationGate<Item = I>,
    {
        if index >= self.items.len() {
            return Err(self.out_of_range(index).into_error(&gate.collection()));
        }
        let item = gate.admit_one(input, Loc::root().child(index), Mode::Mutate)?;
        Ok(std::mem::replace(&mut self.items[index], item))
    }

    /// Replace `range` with `inputs`. The range and replacement may differ
    /// in length.
    pub(crate) fn set_range<G, R, It>(&mut self, gate: &G, range: R, inputs: It) -> Result<Vec<I>, CollectionError>
    where
        G: MutationGate<Item = I>,
        R: RangeBounds<usize>,
        It: IntoIterator<Item = Input<I>>,
    {
        let (start, end) = self
            .resolve(range)
            .map_err(|e| e.into_error(&gate.collection()))?;
        let located = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| (input, Loc::root().child(start + i)));
        let admitted = gate.admit_all(located, Mode::Mutate)?;
        Ok(self.items.splice(start..end, admitted).collect())
    }

    pub(crate) fn extend<G, It>(&mut self, gate: &G, inputs: It) -> Result<(), CollectionError>
    where
        G: MutationGate<Item = I>,
        It: IntoIterator<Item = Input<I>>,
    {
        let base = self.items.len();
        let located = inputs
            .into_iter()
            .enumerate()
            .map(|(i, input)| (input, Loc::root().child(base + i)));
        let admitted = gate.admit_all(located, Mode::Mutate)?;
        tracing::trace!(collection = %gate.collection(), added = admitted.len(), "extended sequence");
        self.items.extend(admitted);
        Ok(())
    }

    /// Append items already admitted by an identical binding.
    pub(crate) fn absorb(&mut self, other: Elements<I>) {
        self.items.extend(other.items);
    }

    /// Edit a copy of the element at `index` and admit the result.
    pub(crate) fn update<G, F>(&mut self, gate: &G, index: usize, edit: F) -> Result<(), CollectionError>
    where
        G: MutationGate<Item = I>,
        F: FnOnce(&mut I),
        I: Clone,
    {
        let Some(current) = self.items.get(index) else {
            return Err(self.out_of_range(index).into_error(&gate.collection()));
        };
        let mut edited = current.clone();
        edit(&mut edited);
        let item = gate.admit_one(Input::Instance(edited), Loc::root().child(index), Mode::Mutate)?;
        self.items[index] = item;
        Ok(())
    }

    pub(crate) fn remove(&mut self, index: usize) -> Result<I, OutOfRange> {
        if index >= self.items.len() {
            return Err(self.out_of_range(index));
        }
        Ok(self.items.remove(index))
    }

    pub(crate) fn pop(&mut self) -> Option<I> {
        self.items.pop()
    }

    pub(crate) fn remove_range<R: RangeBounds<usize>>(&mut self, range: R) -> Result<Vec<I>, OutOfRange> {
        let (start, end) = self.resolve(range)?;
        Ok(self.items.drain(start..end).collect())
    }

    pub(crate) fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    pub(crate) fn clear(&mut self) {
        self.items.clear();
    }

    pub(crate) fn retain<F: FnMut(&I) -> bool>(&mut self, keep: F) {
        self.items.retain(keep);
    }

    pub(crate) fn reverse(&mut self) {
        self.items.reverse();
    }

    pub(crate) fn sort_by<F: FnMut(&I, &I) -> Ordering>(&mut self, compare: F) {
        self.items.sort_by(compare);
    }

    pub(crate) fn sort_by_key<K: Ord, F: FnMut(&I) -> K>(&mut self, key: F) {
        self.items.sort_by_key(key);
    }

    pub(crate) fn swap(&mut self, a: usize, b: usize) -> Result<(), OutOfRange> {
        let len = self.items.len();
        if a >= len {
            return Err(self.out_of_range(a));
        }
        if b >= len {
            return Err(self.out_of_range(b));
        }
        self.items.swap(a, b);
        Ok(())
    }

    pub(crate) fn slice<R: RangeBounds<usize>>(&self, range: R) -> Result<Self, OutOfRange>
    where
        I: Clone,
    {
        let (start, end) = self.resolve(range)?;
        Ok(Self::from_admitted(self.items[start..end].to_vec()))
    }
}

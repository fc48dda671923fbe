//! Generic set reconciliation
//!
//! Partitions two ordered collections into the items only present on the
//! "after" side (added) and the items only present on the "before" side
//! (removed). Comparison is all-pairs: asset collections are small and the
//! equality predicates are structural comparisons that do not hash.

use serde::Serialize;

/// Result of reconciling an "after" collection against a "before" one.
///
/// Items keep the order of the input collection they came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
}

impl<T> Default for Diff<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<T> Diff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len()
    }

    /// Map both sides through `f`, keeping order.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Diff<U> {
        Diff {
            added: self.added.into_iter().map(&mut f).collect(),
            removed: self.removed.into_iter().map(&mut f).collect(),
        }
    }
}

/// Reconcile `after` against `before` with an equality predicate.
///
/// The predicate is always called as `equals(after_item, before_item)`.
/// Duplicates are independent items: every occurrence of a value that has
/// no match on the other side is reported.
pub fn diff_by<T, F>(after: &[T], before: &[T], equals: F) -> Diff<T>
where
    T: Clone,
    F: Fn(&T, &T) -> bool,
{
    let added = after
        .iter()
        .filter(|a| !before.iter().any(|b| equals(a, b)))
        .cloned()
        .collect();

    let removed = before
        .iter()
        .filter(|b| !after.iter().any(|a| equals(a, b)))
        .cloned()
        .collect();

    Diff { added, removed }
}

/// Reconcile with `PartialEq`.
pub fn diff<T: Clone + PartialEq>(after: &[T], before: &[T]) -> Diff<T> {
    diff_by(after, before, |a, b| a == b)
}

type Equals<'a, T> = Box<dyn Fn(&T, &T) -> bool + 'a>;
type Prepare<'a, T> = Box<dyn Fn(&mut T) + 'a>;
type DropWhen<'a, T> = Box<dyn Fn(&T) -> bool + 'a>;

/// Configurable reconciler.
///
/// `prepare` normalizes a copy of every item before comparison (the
/// normalized copies are what the result contains); `drop` removes items
/// from both sides before they are compared at all.
pub struct Reconciler<'a, T> {
    equals: Equals<'a, T>,
    prepare: Option<Prepare<'a, T>>,
    drop: Option<DropWhen<'a, T>>,
}

impl<'a, T: Clone + PartialEq + 'a> Default for Reconciler<'a, T> {
    fn default() -> Self {
        Self::new(|a: &T, b: &T| a == b)
    }
}

impl<'a, T: Clone> Reconciler<'a, T> {
    pub fn new(equals: impl Fn(&T, &T) -> bool + 'a) -> Self {
        Self {
            equals: Box::new(equals),
            prepare: None,
            drop: None,
        }
    }

    pub fn with_prepare(mut self, prepare: impl Fn(&mut T) + 'a) -> Self {
        self.prepare = Some(Box::new(prepare));
        self
    }

    pub fn with_drop(mut self, drop: impl Fn(&T) -> bool + 'a) -> Self {
        self.drop = Some(Box::new(drop));
        self
    }

    /// Items left after `drop`, each passed through `prepare`.
    pub(crate) fn normalize(&self, items: &[T]) -> Vec<T> {
        items
            .iter()
            .filter(|item| !self.drop.as_ref().is_some_and(|drop| drop(item)))
            .cloned()
            .map(|mut item| {
                if let Some(prepare) = &self.prepare {
                    prepare(&mut item);
                }
                item
            })
            .collect()
    }

    pub(crate) fn equals(&self, after: &T, before: &T) -> bool {
        (self.equals)(after, before)
    }

    pub fn diff(&self, after: &[T], before: &[T]) -> Diff<T> {
        let after = self.normalize(after);
        let before = self.normalize(before);
        diff_by(&after, &before, |a, b| (self.equals)(a, b))
    }
}

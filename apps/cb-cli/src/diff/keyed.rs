//! Key-based reconciliation
//!
//! Records with a declared unique key are matched one-to-one by that key
//! instead of by all-pairs equality. Matched pairs whose other fields
//! differ are handled according to a [`FieldPolicy`].

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use serde::Serialize;

use super::set::{Diff, Reconciler};
use crate::error::{CliError, CliResult};
use crate::models::{Column, Index, IndexType, PermissionEntry, Role};

/// A record with a unique key inside its collection.
pub trait Keyed {
    type Key: Eq + Hash + Clone + Debug;

    fn key(&self) -> Self::Key;
}

impl Keyed for Column {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// Indexes are unique per (name, type): changing only the type is a
/// different index.
impl Keyed for Index {
    type Key = (String, IndexType);

    fn key(&self) -> (String, IndexType) {
        (self.name.clone(), self.index_type)
    }
}

impl Keyed for PermissionEntry {
    type Key = String;

    fn key(&self) -> String {
        self.identity().to_string()
    }
}

impl Keyed for Role {
    type Key = String;

    fn key(&self) -> String {
        self.name.clone()
    }
}

/// What to do with key-matched pairs whose remaining fields differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldPolicy {
    /// Matched keys are never reported.
    #[default]
    Ignore,
    /// Differing pairs are reported in `changed`.
    Report,
    /// Differing pairs are reported as one removal plus one addition.
    Replace,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Changed<T> {
    pub before: T,
    pub after: T,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyedDiff<T> {
    pub added: Vec<T>,
    pub removed: Vec<T>,
    pub changed: Vec<Changed<T>>,
}

impl<T> Default for KeyedDiff<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            removed: Vec::new(),
            changed: Vec::new(),
        }
    }
}

impl<T> KeyedDiff<T> {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.changed.is_empty()
    }

    /// Drop the `changed` list.
    pub fn into_diff(self) -> Diff<T> {
        Diff {
            added: self.added,
            removed: self.removed,
        }
    }
}

fn index_by_key<'a, T: Keyed>(
    items: &'a [T],
    side: &str,
) -> CliResult<HashMap<T::Key, &'a T>> {
    let mut index = HashMap::with_capacity(items.len());
    for item in items {
        let key = item.key();
        if index.insert(key.clone(), item).is_some() {
            return Err(CliError::DataIntegrity(format!(
                "duplicate key {key:?} in {side} records"
            )));
        }
    }
    Ok(index)
}

/// Reconcile `after` against `before` by key.
///
/// Fails with [`CliError::DataIntegrity`] when either side holds two
/// records with the same key.
pub fn diff_keyed<T>(after: &[T], before: &[T], policy: FieldPolicy) -> CliResult<KeyedDiff<T>>
where
    T: Keyed + Clone + PartialEq,
{
    diff_keyed_by(after, before, policy, |a, b| a == b)
}

/// Like [`diff_keyed`], with a custom comparison for matched pairs.
pub fn diff_keyed_by<T, F>(
    after: &[T],
    before: &[T],
    policy: FieldPolicy,
    same: F,
) -> CliResult<KeyedDiff<T>>
where
    T: Keyed + Clone,
    F: Fn(&T, &T) -> bool,
{
    let after_index = index_by_key(after, "local")?;
    let before_index = index_by_key(before, "remote")?;

    let mut result = KeyedDiff::default();
    let mut replaced: HashSet<T::Key> = HashSet::new();

    for item in after {
        let key = item.key();
        match before_index.get(&key) {
            None => result.added.push(item.clone()),
            Some(existing) if !same(item, existing) => match policy {
                FieldPolicy::Ignore => {}
                FieldPolicy::Report => result.changed.push(Changed {
                    before: (*existing).clone(),
                    after: item.clone(),
                }),
                FieldPolicy::Replace => {
                    result.added.push(item.clone());
                    replaced.insert(key);
                }
            },
            Some(_) => {}
        }
    }

    for item in before {
        let key = item.key();
        if !after_index.contains_key(&key) || replaced.contains(&key) {
            result.removed.push(item.clone());
        }
    }

    Ok(result)
}

impl<T: Keyed + Clone> Reconciler<'_, T> {
    /// Key-matched reconciliation with this reconciler's hooks.
    ///
    /// Both sides go through `drop` and `prepare` first; the equality
    /// predicate decides whether a key-matched pair differs.
    pub fn diff_keyed(
        &self,
        after: &[T],
        before: &[T],
        policy: FieldPolicy,
    ) -> CliResult<KeyedDiff<T>> {
        let after = self.normalize(after);
        let before = self.normalize(before);
        diff_keyed_by(&after, &before, policy, |a, b| self.equals(a, b))
    }
}

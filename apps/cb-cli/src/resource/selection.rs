//! Which local resources a command operates on

use std::collections::{BTreeMap, BTreeSet};

use super::path::ResourceId;
use crate::models::AssetKind;

/// Outcome of a selection decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inclusion {
    Exclude,
    Include,
    /// Collection definition without its `items`.
    SchemaOnly,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct KindFilter {
    all: bool,
    names: BTreeSet<String>,
}

/// Per-kind selection built from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionPolicy {
    all_assets: bool,
    kinds: BTreeMap<AssetKind, KindFilter>,
    all_collection_schemas: bool,
    collection_schemas: BTreeSet<String>,
}

impl SelectionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select every asset of every kind.
    pub fn everything() -> Self {
        Self {
            all_assets: true,
            ..Self::default()
        }
    }

    pub fn with_all(mut self, kind: AssetKind) -> Self {
        self.kinds.entry(kind).or_default().all = true;
        self
    }

    pub fn with_name(mut self, kind: AssetKind, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.kinds.entry(kind).or_default().names.insert(name);
        }
        self
    }

    pub fn with_all_collection_schemas(mut self) -> Self {
        self.all_collection_schemas = true;
        self
    }

    pub fn with_collection_schema(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !name.is_empty() {
            self.collection_schemas.insert(name);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        !self.all_assets
            && !self.all_collection_schemas
            && self.collection_schemas.is_empty()
            && self.kinds.values().all(|f| !f.all && f.names.is_empty())
    }

    pub fn selects_all(&self) -> bool {
        self.all_assets
    }

    /// Whether the named asset of `kind` is selected.
    pub fn includes(&self, kind: AssetKind, name: &str) -> bool {
        if self.all_assets {
            return true;
        }
        self.kinds
            .get(&kind)
            .is_some_and(|f| f.all || f.names.contains(name))
    }

    /// Kinds with at least one selected asset, in pipeline order.
    pub fn selected_kinds(&self) -> Vec<AssetKind> {
        AssetKind::ALL
            .into_iter()
            .filter(|kind| {
                self.all_assets
                    || self
                        .kinds
                        .get(kind)
                        .is_some_and(|f| f.all || !f.names.is_empty())
                    || (*kind == AssetKind::Collection && self.has_schema_selection())
            })
            .collect()
    }

    /// Explicitly named assets of `kind`.
    pub fn names(&self, kind: AssetKind) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .kinds
            .get(&kind)
            .map(|f| f.names.iter().map(String::as_str).collect())
            .unwrap_or_default();
        if kind == AssetKind::Collection {
            names.extend(self.collection_schemas.iter().map(String::as_str));
        }
        names
    }

    fn has_schema_selection(&self) -> bool {
        self.all_collection_schemas || !self.collection_schemas.is_empty()
    }

    fn schema_only(&self, name: &str) -> bool {
        self.all_collection_schemas || self.collection_schemas.contains(name)
    }

    /// Decide whether a classified file takes part in the run.
    ///
    /// Schema-only collection selection is checked before full selection
    /// and wins over it. Attached files follow their owning asset.
    pub fn decide(&self, resource: &ResourceId) -> Inclusion {
        let Some(kind) = resource.kind() else {
            return Inclusion::Include;
        };

        if kind == AssetKind::Collection && self.schema_only(resource.name()) {
            return Inclusion::SchemaOnly;
        }

        let selected = match resource {
            ResourceId::LegacyUsers => {
                self.all_assets || self.kinds.get(&kind).is_some_and(|f| f.all)
            }
            _ => self.includes(kind, resource.name()),
        };

        if selected {
            Inclusion::Include
        } else {
            Inclusion::Exclude
        }
    }
}

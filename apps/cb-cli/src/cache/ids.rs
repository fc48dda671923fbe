//! Name → id mapping caches for id-addressed assets

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::config::{ConfigPaths, IdCacheKind};
use crate::error::{CliError, CliResult};
use crate::models::AssetKind;

/// One name → id map, optionally backed by a JSON file.
#[derive(Debug, Clone)]
pub struct IdCache {
    kind: IdCacheKind,
    path: Option<PathBuf>,
    entries: BTreeMap<String, String>,
}

impl IdCache {
    pub fn in_memory(kind: IdCacheKind) -> Self {
        Self {
            kind,
            path: None,
            entries: BTreeMap::new(),
        }
    }

    /// Load a cache file. Missing files are empty; corrupted files are
    /// reported and reset.
    pub fn load(paths: &ConfigPaths, kind: IdCacheKind) -> Self {
        let path = paths.cache_file(kind);
        let entries = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Id cache is corrupted, starting empty"
                    );
                    BTreeMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Failed to read id cache");
                BTreeMap::new()
            }
        };

        Self {
            kind,
            path: Some(path),
            entries,
        }
    }

    pub fn kind(&self) -> IdCacheKind {
        self.kind
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn persist(&self) -> CliResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(&self.entries)?;
        fs::write(path, contents).map_err(|e| {
            CliError::Io(format!("Failed to write id cache {}: {}", path.display(), e))
        })
    }

    /// Record a mapping and write the file.
    pub fn insert(&mut self, name: &str, id: &str) -> CliResult<()> {
        if self.get(name) == Some(id) {
            return Ok(());
        }
        self.entries.insert(name.to_string(), id.to_string());
        self.persist()
    }

    /// Drop a mapping and write the file.
    pub fn remove(&mut self, name: &str) -> CliResult<()> {
        if self.entries.remove(name).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// The three id caches of a project.
#[derive(Debug, Clone)]
pub struct IdCaches {
    collections: IdCache,
    users: IdCache,
    roles: IdCache,
}

fn cache_kind(kind: AssetKind) -> Option<IdCacheKind> {
    match kind {
        AssetKind::Collection => Some(IdCacheKind::Collections),
        AssetKind::User => Some(IdCacheKind::Users),
        AssetKind::Role => Some(IdCacheKind::Roles),
        _ => None,
    }
}

impl IdCaches {
    pub fn load(paths: &ConfigPaths) -> Self {
        Self {
            collections: IdCache::load(paths, IdCacheKind::Collections),
            users: IdCache::load(paths, IdCacheKind::Users),
            roles: IdCache::load(paths, IdCacheKind::Roles),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            collections: IdCache::in_memory(IdCacheKind::Collections),
            users: IdCache::in_memory(IdCacheKind::Users),
            roles: IdCache::in_memory(IdCacheKind::Roles),
        }
    }

    fn cache(&self, kind: IdCacheKind) -> &IdCache {
        match kind {
            IdCacheKind::Collections => &self.collections,
            IdCacheKind::Users => &self.users,
            IdCacheKind::Roles => &self.roles,
        }
    }

    fn cache_mut(&mut self, kind: IdCacheKind) -> &mut IdCache {
        match kind {
            IdCacheKind::Collections => &mut self.collections,
            IdCacheKind::Users => &mut self.users,
            IdCacheKind::Roles => &mut self.roles,
        }
    }

    /// Cached id of an asset; `None` for kinds addressed by name.
    pub fn id_of(&self, kind: AssetKind, name: &str) -> Option<&str> {
        cache_kind(kind).and_then(|k| self.cache(k).get(name))
    }

    /// Record the id of an asset after a successful remote call.
    pub fn record(&mut self, kind: AssetKind, name: &str, id: &str) -> CliResult<()> {
        match cache_kind(kind) {
            Some(k) if !id.is_empty() => self.cache_mut(k).insert(name, id),
            _ => Ok(()),
        }
    }

    pub fn forget(&mut self, kind: AssetKind, name: &str) -> CliResult<()> {
        match cache_kind(kind) {
            Some(k) => self.cache_mut(k).remove(name),
            None => Ok(()),
        }
    }
}

//! Typed view of the selected local assets

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde_json::Value;

use super::path::{CodeFile, ResourceId};
use super::selection::{Inclusion, SelectionPolicy};
use super::walker::AssetWalker;
use crate::error::{CliError, CliResult};
use crate::models::{Asset, AssetKind, Service};

/// One loaded asset and the file it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleEntry {
    pub asset: Asset,
    pub path: String,
}

/// A selected file that is not itself an asset definition (bucket-set
/// files, portal configuration parts, adaptor and file-store files,
/// source maps).
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub resource: ResourceId,
    pub path: String,
}

/// Selected local assets, typed.
///
/// Malformed files do not abort loading: they are collected in
/// [`LocalBundle::errors`] and block any plan built from the bundle.
#[derive(Debug, Clone, Default)]
pub struct LocalBundle {
    entries: Vec<BundleEntry>,
    attachments: Vec<Attachment>,
    errors: Vec<String>,
}

#[derive(Default)]
struct Loader {
    bundle: LocalBundle,
    sources: HashMap<(AssetKind, String), (String, String)>,
    roles: HashMap<(AssetKind, String), (String, Vec<String>)>,
}

impl LocalBundle {
    /// Load every selected asset under `root`.
    pub fn load(root: &Path, policy: &SelectionPolicy) -> CliResult<LocalBundle> {
        let mut loader = Loader::default();

        AssetWalker::new(root).walk(|file| {
            let inclusion = policy.decide(file.resource);
            if inclusion == Inclusion::Exclude {
                return Ok(());
            }
            let contents = fs::read(file.path)?;
            loader.add(file.resource, file.relative, &contents, inclusion);
            Ok(())
        })?;

        let bundle = loader.finish();
        tracing::debug!(
            assets = bundle.entries.len(),
            attachments = bundle.attachments.len(),
            errors = bundle.errors.len(),
            "Loaded local bundle"
        );
        Ok(bundle)
    }

    /// Build a bundle from already typed assets.
    pub fn from_assets(assets: impl IntoIterator<Item = Asset>) -> LocalBundle {
        let entries = assets
            .into_iter()
            .map(|asset| BundleEntry {
                path: super::path::asset_path(asset.kind(), asset.name()),
                asset,
            })
            .collect();
        LocalBundle {
            entries,
            ..LocalBundle::default()
        }
    }

    /// A copy holding only the kinds `keep` accepts. Errors are kept.
    pub fn filtered(&self, keep: impl Fn(AssetKind) -> bool) -> LocalBundle {
        LocalBundle {
            entries: self
                .entries
                .iter()
                .filter(|e| keep(e.asset.kind()))
                .cloned()
                .collect(),
            attachments: self
                .attachments
                .iter()
                .filter(|a| a.resource.kind().is_some_and(&keep))
                .cloned()
                .collect(),
            errors: self.errors.clone(),
        }
    }

    pub fn entries(&self) -> &[BundleEntry] {
        &self.entries
    }

    pub fn assets(&self) -> impl Iterator<Item = &Asset> {
        self.entries.iter().map(|e| &e.asset)
    }

    pub fn assets_of(&self, kind: AssetKind) -> impl Iterator<Item = &Asset> {
        self.assets().filter(move |a| a.kind() == kind)
    }

    pub fn get(&self, kind: AssetKind, name: &str) -> Option<&Asset> {
        self.assets_of(kind).find(|a| a.name() == name)
    }

    pub fn attachments(&self) -> &[Attachment] {
        &self.attachments
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Kinds present in the bundle, in pipeline order.
    pub fn kinds(&self) -> Vec<AssetKind> {
        let mut kinds: Vec<AssetKind> = self.assets().map(Asset::kind).collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }

    /// Fail when the bundle holds malformed files.
    pub fn ensure_valid(&self) -> CliResult<()> {
        match self.errors.first() {
            None => Ok(()),
            Some(first) if self.errors.len() == 1 => Err(CliError::Validation(first.clone())),
            Some(first) => Err(CliError::Validation(format!(
                "{first} (and {} more)",
                self.errors.len() - 1
            ))),
        }
    }
}

impl Loader {
    fn add(&mut self, resource: &ResourceId, relative: &str, contents: &[u8], inclusion: Inclusion) {
        match resource {
            ResourceId::SystemMeta => {}
            ResourceId::LegacyUsers => self.add_legacy_users(relative, contents),
            ResourceId::Service { name, file: CodeFile::Source }
            | ResourceId::Library { name, file: CodeFile::Source } => {
                if let Some(kind) = resource.kind() {
                    self.sources.insert(
                        (kind, name.clone()),
                        (
                            relative.to_string(),
                            String::from_utf8_lossy(contents).into_owned(),
                        ),
                    );
                }
            }
            ResourceId::UserRoles(name) | ResourceId::DeviceRoles(name) => {
                match serde_json::from_slice::<Vec<String>>(contents) {
                    Ok(roles) => {
                        if let Some(kind) = resource.kind() {
                            self.roles
                                .insert((kind, name.clone()), (relative.to_string(), roles));
                        }
                    }
                    Err(e) => self
                        .bundle
                        .errors
                        .push(format!("{relative}: expected a list of role names: {e}")),
                }
            }
            _ if !resource.is_definition() => self.bundle.attachments.push(Attachment {
                resource: resource.clone(),
                path: relative.to_string(),
            }),
            _ => self.add_definition(resource, relative, contents, inclusion),
        }
    }

    fn add_definition(
        &mut self,
        resource: &ResourceId,
        relative: &str,
        contents: &[u8],
        inclusion: Inclusion,
    ) {
        let Some(kind) = resource.kind() else {
            return;
        };

        let parsed = serde_json::from_slice::<Value>(contents)
            .map_err(CliError::from)
            .and_then(|value| Asset::from_wire(kind, value));

        match parsed {
            Ok(mut asset) => {
                if !kind.is_schema() && asset.name() != resource.name() {
                    self.bundle.errors.push(format!(
                        "{relative}: file declares {kind} '{}' but is stored as '{}'",
                        asset.name(),
                        resource.name()
                    ));
                    return;
                }
                if let (Asset::Collection(collection), Inclusion::SchemaOnly) =
                    (&mut asset, inclusion)
                {
                    collection.items.clear();
                }
                self.bundle.entries.push(BundleEntry {
                    asset,
                    path: relative.to_string(),
                });
            }
            Err(e) => self.bundle.errors.push(format!("{relative}: {e}")),
        }
    }

    fn add_legacy_users(&mut self, relative: &str, contents: &[u8]) {
        let users = match serde_json::from_slice::<Vec<Value>>(contents) {
            Ok(users) => users,
            Err(e) => {
                self.bundle.errors.push(format!("{relative}: {e}"));
                return;
            }
        };
        for value in users {
            match Asset::from_wire(AssetKind::User, value) {
                Ok(asset) => self.bundle.entries.push(BundleEntry {
                    asset,
                    path: relative.to_string(),
                }),
                Err(e) => self.bundle.errors.push(format!("{relative}: {e}")),
            }
        }
    }

    fn finish(mut self) -> LocalBundle {
        for entry in &mut self.bundle.entries {
            let key = (entry.asset.kind(), entry.asset.name().to_string());
            if let Some((_, code)) = self.sources.remove(&key) {
                match &mut entry.asset {
                    Asset::Service(service) => service.code = code,
                    Asset::Library(library) => library.code = code,
                    _ => {}
                }
            }
            if let Some((_, roles)) = self.roles.remove(&key) {
                match &mut entry.asset {
                    Asset::User(user) => user.roles = Some(roles),
                    Asset::Device(device) => device.roles = Some(roles),
                    _ => {}
                }
            }
        }

        // A service checked in as source only still gets pushed.
        let mut orphans: Vec<_> = self.sources.into_iter().collect();
        orphans.sort_by(|a, b| a.1 .0.cmp(&b.1 .0));
        for ((kind, name), (path, code)) in orphans {
            match kind {
                AssetKind::Service => self.bundle.entries.push(BundleEntry {
                    asset: Asset::Service(Service {
                        name,
                        code,
                        dependencies: String::new(),
                        parameters: Vec::new(),
                        extra: Default::default(),
                    }),
                    path,
                }),
                _ => self
                    .bundle
                    .errors
                    .push(format!("{path}: {kind} '{name}' has no {name}.json definition")),
            }
        }

        let mut dangling: Vec<_> = self.roles.into_values().map(|(path, _)| path).collect();
        dangling.sort();
        for path in dangling {
            self.bundle
                .errors
                .push(format!("{path}: role assignment for an asset that does not exist locally"));
        }

        self.bundle
    }
}

//! Apply local assets to the remote system
//!
//! For every asset: fetch it remotely; when it does not exist ask before
//! creating it; when it does, compute the smallest set of mutations
//! (column add/drop, index add/drop, role membership add/remove,
//! permission rewrite, whole-asset update) and issue only those.

use std::time::Instant;

use serde_json::Value;

use super::libraries::library_order;
use super::permissions::{dedupe_role, permissions_differ};
use crate::api::{AssetClient, AssetRef};
use crate::batch::{ApplyItem, ApplyOutcome, ApplyReport};
use crate::cache::IdCaches;
use crate::diff::columns::{
    COLLECTION_DEFAULT_COLUMNS, DEVICE_DEFAULT_COLUMNS, USER_DEFAULT_COLUMNS,
};
use crate::diff::{changed_fields, diff, diff_columns, diff_keyed, DefaultColumns, FieldPolicy};
use crate::error::{CliError, CliResult};
use crate::interactive::Prompter;
use crate::models::{Asset, AssetKind, Collection, Column, Library};
use crate::plan::{ChangePlan, UploadResponse};
use crate::resource::{Archive, LocalBundle};

/// How failures of one asset affect the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// One named asset; its failure is the command's failure.
    Single,
    /// Every selected asset; failures are collected and the run goes on.
    Bulk,
}

/// Default columns of each schema-bearing kind.
pub fn default_columns(kind: AssetKind) -> DefaultColumns {
    match kind {
        AssetKind::Collection => DefaultColumns::fixed(COLLECTION_DEFAULT_COLUMNS),
        AssetKind::UserSchema => DefaultColumns::fixed(USER_DEFAULT_COLUMNS),
        AssetKind::DeviceSchema => DefaultColumns::fixed(DEVICE_DEFAULT_COLUMNS),
        _ => DefaultColumns::Dynamic,
    }
}

pub struct Orchestrator<'a> {
    client: &'a dyn AssetClient,
    prompter: &'a dyn Prompter,
    caches: &'a mut IdCaches,
    mode: RunMode,
    auto_approve: bool,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        client: &'a dyn AssetClient,
        prompter: &'a dyn Prompter,
        caches: &'a mut IdCaches,
        mode: RunMode,
    ) -> Self {
        Self {
            client,
            prompter,
            caches,
            mode,
            auto_approve: false,
        }
    }

    /// Create missing assets without asking.
    pub fn with_auto_approve(mut self, auto_approve: bool) -> Self {
        self.auto_approve = auto_approve;
        self
    }

    fn target_for(&self, asset: &Asset) -> AssetRef {
        let kind = asset.kind();
        let id = asset
            .remote_id()
            .or_else(|| self.caches.id_of(kind, asset.name()))
            .map(str::to_string);
        AssetRef::new(kind, asset.name()).with_id(id)
    }

    /// Reconcile one asset.
    pub async fn reconcile_asset(&mut self, asset: &Asset) -> CliResult<ApplyItem> {
        let target = self.target_for(asset);
        tracing::info!(kind = %target.kind, name = %target.name, "Reconciling");

        match self.client.get(&target).await {
            Ok(remote) => self.update_existing(asset, target, remote).await,
            Err(e) if e.is_not_found() => self.create_missing(asset).await,
            Err(e) => Err(e),
        }
    }

    async fn create_missing(&mut self, asset: &Asset) -> CliResult<ApplyItem> {
        let (kind, name) = (asset.kind(), asset.name());
        let approved = self.auto_approve
            || self
                .prompter
                .confirm(&format!("Create new {kind} named '{name}'?"), false)?;
        if !approved {
            tracing::info!(%kind, name, "Creation declined");
            return Ok(ApplyItem::skipped(kind, name, "creation declined"));
        }

        let payload = match asset {
            Asset::Role(role) => {
                let mut role = role.clone();
                let dropped = dedupe_role(&mut role);
                if dropped > 0 {
                    tracing::warn!(role = %role.name, dropped, "Removed duplicate permission entries");
                }
                Asset::Role(role)
            }
            _ => asset.clone(),
        };
        let id = self.client.create(&payload).await?;
        let mut mutations = 1;
        if let Some(id) = &id {
            self.caches.record(kind, name, id)?;
        }
        let target = AssetRef::new(kind, name).with_id(id);

        // Parts the create payload does not carry.
        match asset {
            Asset::Collection(local) => {
                mutations += self.sync_collection(local, &target).await?;
            }
            Asset::User(user) => {
                if let Some(roles) = &user.roles {
                    mutations += self.sync_roles(&target, roles, &[]).await?;
                }
            }
            Asset::Device(device) => {
                if let Some(roles) = &device.roles {
                    mutations += self.sync_roles(&target, roles, &[]).await?;
                }
            }
            _ => {}
        }

        tracing::info!(%kind, name, mutations, "Created");
        Ok(ApplyItem::new(kind, name, ApplyOutcome::Created).with_mutations(mutations))
    }

    async fn update_existing(
        &mut self,
        asset: &Asset,
        mut target: AssetRef,
        remote: Asset,
    ) -> CliResult<ApplyItem> {
        let kind = asset.kind();
        if let Some(id) = remote.remote_id() {
            target.id = Some(id.to_string());
        }

        let mutations = match (asset, &remote) {
            (Asset::Collection(local), _) => self.sync_collection(local, &target).await?,
            (
                Asset::UserSchema(local) | Asset::DeviceSchema(local) | Asset::EdgeSchema(local),
                Asset::UserSchema(existing)
                | Asset::DeviceSchema(existing)
                | Asset::EdgeSchema(existing),
            ) => {
                self.sync_columns(&target, &local.columns, &existing.columns)
                    .await?
            }
            (Asset::Role(local), Asset::Role(existing)) => {
                let mut local = local.clone();
                let dropped = dedupe_role(&mut local);
                if dropped > 0 {
                    tracing::warn!(role = %local.name, dropped, "Removed duplicate permission entries");
                }
                if permissions_differ(&local, existing) || local.description != existing.description {
                    local.id = existing.id.clone();
                    self.client.update(&target, &Asset::Role(local)).await?;
                    1
                } else {
                    0
                }
            }
            (Asset::User(local), Asset::User(existing)) => {
                let mut count = self.update_if_changed(&target, asset, &remote).await?;
                if let Some(roles) = &local.roles {
                    let current = existing.roles.clone().unwrap_or_default();
                    count += self.sync_roles(&target, roles, &current).await?;
                }
                count
            }
            (Asset::Device(local), Asset::Device(existing)) => {
                let mut count = self.update_if_changed(&target, asset, &remote).await?;
                if let Some(roles) = &local.roles {
                    let current = existing.roles.clone().unwrap_or_default();
                    count += self.sync_roles(&target, roles, &current).await?;
                }
                count
            }
            _ => self.update_if_changed(&target, asset, &remote).await?,
        };

        if let Some(id) = &target.id {
            self.caches.record(kind, asset.name(), id)?;
        }

        let outcome = if mutations > 0 {
            ApplyOutcome::Updated
        } else {
            ApplyOutcome::Unchanged
        };
        tracing::info!(%kind, name = asset.name(), mutations, %outcome, "Reconciled");
        Ok(ApplyItem::new(kind, asset.name(), outcome).with_mutations(mutations))
    }

    /// Full update when any locally present top-level field differs.
    async fn update_if_changed(
        &self,
        target: &AssetRef,
        local: &Asset,
        remote: &Asset,
    ) -> CliResult<usize> {
        let changes = changed_fields(&local.to_wire()?, &remote.to_wire()?);
        if changes.is_empty() {
            return Ok(0);
        }
        tracing::debug!(
            target = %target,
            fields = ?changes.iter().map(|c| c.path.as_str()).collect::<Vec<_>>(),
            "Fields changed"
        );
        self.client.update(target, local).await?;
        Ok(1)
    }

    async fn sync_columns(
        &self,
        target: &AssetRef,
        local: &[Column],
        remote: &[Column],
    ) -> CliResult<usize> {
        let delta = diff_columns(local, remote, &default_columns(target.kind))?;
        for column in &delta.removed {
            self.client.drop_column(target, &column.name).await?;
        }
        for column in &delta.added {
            self.client.add_column(target, column).await?;
        }
        Ok(delta.len())
    }

    async fn sync_collection(&self, local: &Collection, target: &AssetRef) -> CliResult<usize> {
        let remote_columns = self.client.columns(target).await?;
        let mut mutations = self
            .sync_columns(target, &local.schema, &remote_columns)
            .await?;

        let remote_indexes = self.client.indexes(target).await?;
        let delta = diff_keyed(&local.indexes, &remote_indexes, FieldPolicy::Ignore)?;
        for index in &delta.removed {
            self.client.drop_index(target, index).await?;
        }
        for index in &delta.added {
            self.client.create_index(target, index).await?;
        }
        mutations += delta.added.len() + delta.removed.len();
        Ok(mutations)
    }

    async fn sync_roles(
        &self,
        target: &AssetRef,
        local: &[String],
        remote: &[String],
    ) -> CliResult<usize> {
        let delta = diff(local, remote);
        if delta.is_empty() {
            return Ok(0);
        }
        tracing::debug!(
            target = %target,
            add = ?delta.added,
            remove = ?delta.removed,
            "Role membership changed"
        );
        match target.kind {
            AssetKind::User => {
                self.client
                    .update_user_roles(target, &delta.added, &delta.removed)
                    .await?
            }
            _ => {
                self.client
                    .update_device_roles(target, &delta.added, &delta.removed)
                    .await?
            }
        }
        Ok(1)
    }

    /// Reconcile every asset of the bundle in pipeline order.
    ///
    /// Libraries go in dependency postorder. In bulk mode a failing asset
    /// is recorded and the run continues.
    pub async fn reconcile_all(&mut self, bundle: &LocalBundle) -> CliResult<ApplyReport> {
        let started = Instant::now();
        let mut report = ApplyReport::new();

        for kind in bundle.kinds() {
            let assets: Vec<&Asset> = if kind == AssetKind::Library {
                let libraries: Vec<&Library> = bundle
                    .assets_of(kind)
                    .filter_map(|a| match a {
                        Asset::Library(lib) => Some(lib),
                        _ => None,
                    })
                    .collect();
                let ordered = library_order(&libraries)?;
                ordered
                    .into_iter()
                    .filter_map(|lib| bundle.get(AssetKind::Library, &lib.name))
                    .collect()
            } else {
                bundle.assets_of(kind).collect()
            };

            for asset in assets {
                match self.reconcile_asset(asset).await {
                    Ok(item) => report.record(item),
                    Err(e) if self.mode == RunMode::Bulk => {
                        tracing::warn!(
                            kind = %asset.kind(),
                            name = asset.name(),
                            error = %e,
                            "Asset failed; continuing"
                        );
                        report.record(ApplyItem::failed(asset.kind(), asset.name(), e.to_string()));
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        report.set_duration(started.elapsed().as_millis() as u64);
        Ok(report)
    }

    /// Apply a server-computed plan by uploading the same archive.
    pub async fn apply_upload(&mut self, archive: &Archive, plan: &ChangePlan) -> CliResult<ApplyReport> {
        let started = Instant::now();
        let response: UploadResponse = self.client.upload(&archive.bytes).await?;
        let mut report = response.into_report(plan);
        self.refresh_ids(&report).await;
        report.set_duration(started.elapsed().as_millis() as u64);
        Ok(report)
    }

    /// Record ids of successfully uploaded id-addressed assets.
    async fn refresh_ids(&mut self, report: &ApplyReport) {
        let kinds: Vec<AssetKind> = AssetKind::ALL
            .into_iter()
            .filter(|k| k.is_id_addressed())
            .filter(|k| report.successful_items().any(|i| i.kind == *k))
            .collect();

        for kind in kinds {
            let remote = match self.client.list(kind).await {
                Ok(remote) => remote,
                Err(e) => {
                    tracing::warn!(%kind, error = %e, "Could not refresh id cache");
                    continue;
                }
            };
            for item in report.successful_items().filter(|i| i.kind == kind) {
                let id = remote
                    .iter()
                    .find(|a| a.name() == item.name)
                    .and_then(Asset::remote_id);
                if let Some(id) = id {
                    if let Err(e) = self.caches.record(kind, &item.name, id) {
                        tracing::warn!(%kind, name = %item.name, error = %e, "Could not write id cache");
                    }
                }
            }
        }
    }

    /// Delete one remote asset, after confirmation.
    pub async fn delete_asset(&mut self, target: &AssetRef) -> CliResult<ApplyItem> {
        let mut target = target.clone();
        if target.id.is_none() {
            target.id = self.caches.id_of(target.kind, &target.name).map(str::to_string);
        }
        let approved = self.auto_approve
            || self
                .prompter
                .confirm(&format!("Delete {target} from the remote system?"), false)?;
        if !approved {
            return Ok(ApplyItem::skipped(target.kind, target.name.as_str(), "deletion declined"));
        }

        match self.client.delete(&target).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                return Err(CliError::NotFound(target.to_string()));
            }
            Err(e) => return Err(e),
        }
        self.caches.forget(target.kind, &target.name)?;
        Ok(ApplyItem::new(target.kind, target.name.as_str(), ApplyOutcome::Deleted).with_mutations(1))
    }
}

/// Remote assets not present locally, for reporting by `diff`.
pub fn remote_only<'b>(local: &LocalBundle, remote: &'b [Asset]) -> Vec<&'b Asset> {
    remote
        .iter()
        .filter(|r| local.get(r.kind(), r.name()).is_none())
        .collect()
}

/// Field-level comparison used by the local plan.
pub fn needs_update(local: &Asset, remote: &Asset) -> CliResult<bool> {
    Ok(match (local, remote) {
        (Asset::Role(l), Asset::Role(r)) => {
            let mut l = l.clone();
            dedupe_role(&mut l);
            permissions_differ(&l, r) || l.description != r.description
        }
        (Asset::User(l), Asset::User(r)) => {
            let roles_differ = match &l.roles {
                Some(roles) => !diff(roles, &r.roles.clone().unwrap_or_default()).is_empty(),
                None => false,
            };
            roles_differ || !changed_fields(&local.to_wire()?, &remote.to_wire()?).is_empty()
        }
        (Asset::Device(l), Asset::Device(r)) => {
            let roles_differ = match &l.roles {
                Some(roles) => !diff(roles, &r.roles.clone().unwrap_or_default()).is_empty(),
                None => false,
            };
            roles_differ || !changed_fields(&local.to_wire()?, &remote.to_wire()?).is_empty()
        }
        // Schemas and collections are compared column by column.
        (Asset::UserSchema(_) | Asset::DeviceSchema(_) | Asset::EdgeSchema(_), _) => false,
        (Asset::Collection(_), _) => false,
        _ => {
            let local_wire: Value = local.to_wire()?;
            !changed_fields(&local_wire, &remote.to_wire()?).is_empty()
        }
    })
}

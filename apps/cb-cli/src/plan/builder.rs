//! Change-set construction
//!
//! Remotes with unified upload support compute the delta themselves from a
//! dry-run upload of the push archive. Older remotes get a plan computed
//! here from the remote lists, and can only take code services and
//! libraries.

use std::path::PathBuf;

use super::{ChangePlan, UNIFIED_UPLOAD_VERSION};
use crate::api::{AssetClient, AssetRef};
use crate::diff::{diff_columns, diff_keyed, FieldPolicy};
use crate::error::{CliError, CliResult};
use crate::interactive::Prompter;
use crate::models::Asset;
use crate::reconcile::{default_columns, needs_update};
use crate::resource::{Archive, ArchiveBuilder, LocalBundle, SelectionPolicy};

/// Where the delta of a plan was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Dry-run upload evaluated by the remote
    ServerDelta,
    /// Per-kind diff against remote lists, code kinds only
    Legacy,
}

/// A plan together with what is needed to apply it.
#[derive(Debug)]
pub struct BuiltPlan {
    pub plan: ChangePlan,
    pub strategy: Strategy,
    pub upload_version: u32,
    /// Archive submitted for the dry run; re-used for the apply.
    pub archive: Option<Archive>,
    /// Assets the legacy apply reconciles one by one.
    pub bundle: LocalBundle,
}

pub struct ChangeSetBuilder<'a> {
    client: &'a dyn AssetClient,
    prompter: &'a dyn Prompter,
    root: PathBuf,
    policy: &'a SelectionPolicy,
}

impl<'a> ChangeSetBuilder<'a> {
    pub fn new(
        client: &'a dyn AssetClient,
        prompter: &'a dyn Prompter,
        root: impl Into<PathBuf>,
        policy: &'a SelectionPolicy,
    ) -> Self {
        Self {
            client,
            prompter,
            root: root.into(),
            policy,
        }
    }

    /// Build the plan of a push.
    pub async fn build(&self) -> CliResult<BuiltPlan> {
        let bundle = LocalBundle::load(&self.root, self.policy)?;
        let upload_version = self.client.upload_version().await?;
        tracing::debug!(upload_version, assets = bundle.len(), "Building plan");

        if upload_version >= UNIFIED_UPLOAD_VERSION {
            let archive = ArchiveBuilder::new(&self.root, self.policy, self.prompter).build()?;
            let mut plan = if archive.is_empty() {
                ChangePlan::new()
            } else {
                self.client.dry_run_upload(&archive.bytes).await?.into_plan()
            };
            for error in bundle.errors() {
                plan.error(error.clone());
            }
            return Ok(BuiltPlan {
                plan,
                strategy: Strategy::ServerDelta,
                upload_version,
                archive: Some(archive),
                bundle,
            });
        }

        let mut plan = ChangePlan::new();
        for kind in bundle.kinds().into_iter().filter(|k| !k.is_code()) {
            plan.warn(format!(
                "{} skipped: remote upload version {upload_version} only supports \
                 code services and libraries (unified push requires {UNIFIED_UPLOAD_VERSION})",
                kind.section_title()
            ));
        }
        let code = bundle.filtered(|k| k.is_code());
        plan.merge(build_local_plan(self.client, &code).await?);

        Ok(BuiltPlan {
            plan,
            strategy: Strategy::Legacy,
            upload_version,
            archive: None,
            bundle: code,
        })
    }

    /// Local diff of every selected kind, regardless of remote version.
    pub async fn build_local(&self) -> CliResult<(ChangePlan, LocalBundle)> {
        let bundle = LocalBundle::load(&self.root, self.policy)?;
        let plan = build_local_plan(self.client, &bundle).await?;
        Ok((plan, bundle))
    }
}

/// Compare a bundle against the remote lists and plan the delta.
///
/// Local data problems (malformed files, duplicate keys) become plan
/// errors; remote failures abort.
pub async fn build_local_plan(client: &dyn AssetClient, bundle: &LocalBundle) -> CliResult<ChangePlan> {
    let mut plan = ChangePlan::new();
    for error in bundle.errors() {
        plan.error(error.clone());
    }

    for kind in bundle.kinds() {
        let remote = client.list(kind).await?;
        tracing::debug!(%kind, remote = remote.len(), "Comparing kind");

        for asset in bundle.assets_of(kind) {
            let existing = remote.iter().find(|r| r.name() == asset.name());
            match plan_asset(client, &mut plan, asset, existing).await {
                Ok(()) => {}
                Err(CliError::DataIntegrity(msg)) | Err(CliError::Validation(msg)) => {
                    plan.error(format!("{kind} '{}': {msg}", asset.name()));
                }
                Err(e) => return Err(e),
            }
        }
    }
    Ok(plan)
}

async fn plan_asset(
    client: &dyn AssetClient,
    plan: &mut ChangePlan,
    asset: &Asset,
    existing: Option<&Asset>,
) -> CliResult<()> {
    let kind = asset.kind();
    let Some(existing) = existing else {
        if kind.is_schema() {
            // The platform always has the table; every user column is new.
            let delta = diff_columns(asset.columns().unwrap_or_default(), &[], &default_columns(kind))?;
            for column in delta.added {
                plan.add_column(kind, column.name);
            }
        } else {
            plan.add_create(kind, asset.name());
        }
        return Ok(());
    };

    match (asset, existing) {
        (Asset::Collection(local), Asset::Collection(_)) => {
            let target = AssetRef::of(existing);
            let remote_columns = client.columns(&target).await?;
            let columns = diff_columns(&local.schema, &remote_columns, &default_columns(kind))?;
            for column in &columns.added {
                plan.add_column(kind, format!("{}.{}", local.name, column.name));
            }
            for column in &columns.removed {
                plan.remove_column(kind, format!("{}.{}", local.name, column.name));
            }

            let remote_indexes = client.indexes(&target).await?;
            let indexes = diff_keyed(&local.indexes, &remote_indexes, FieldPolicy::Ignore)?;
            if !indexes.is_empty() {
                plan.add_update(kind, local.name.as_str());
            }
        }
        (Asset::UserSchema(_) | Asset::DeviceSchema(_) | Asset::EdgeSchema(_), _) => {
            let local = asset.columns().unwrap_or_default();
            let remote = existing.columns().unwrap_or_default();
            let delta = diff_columns(local, remote, &default_columns(kind))?;
            for column in delta.added {
                plan.add_column(kind, column.name);
            }
            for column in delta.removed {
                plan.remove_column(kind, column.name);
            }
        }
        (Asset::User(user), _) if user.roles.is_some() => {
            // Lists omit role membership; fetch the full record.
            let full = client.get(&AssetRef::of(existing)).await?;
            if needs_update(asset, &full)? {
                plan.add_update(kind, asset.name());
            }
        }
        (Asset::Device(device), _) if device.roles.is_some() => {
            let full = client.get(&AssetRef::of(existing)).await?;
            if needs_update(asset, &full)? {
                plan.add_update(kind, asset.name());
            }
        }
        _ => {
            if needs_update(asset, existing)? {
                plan.add_update(kind, asset.name());
            }
        }
    }
    Ok(())
}

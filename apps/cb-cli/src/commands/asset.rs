//! Single-asset commands: create, update, delete
//!
//! These bypass the plan and reconcile one named asset directly.

use clap::Args;

use crate::api::{AssetClient, AssetRef};
use crate::batch::{ApplyItem, ApplyOutcome};
use crate::cache::IdCaches;
use crate::error::{CliError, CliResult};
use crate::interactive::{prompter_for, Prompter};
use crate::models::{Asset, AssetKind, SCHEMA_NAME};
use crate::output::{print_info, print_success};
use crate::plan::UNIFIED_UPLOAD_VERSION;
use crate::reconcile::{Orchestrator, RunMode};
use crate::resource::{LocalBundle, SelectionPolicy};
use crate::session::{Session, SessionOptions};

/// Identifies one asset on the command line
#[derive(Args, Debug, Clone)]
pub struct AssetArgs {
    #[arg(long, value_enum)]
    pub kind: AssetKind,

    /// Asset name (email for users; ignored for schemas)
    #[arg(long, default_value = "")]
    pub name: String,
}

impl AssetArgs {
    fn name(&self) -> CliResult<&str> {
        if self.kind.is_schema() {
            return Ok(SCHEMA_NAME);
        }
        if self.name.is_empty() {
            return Err(CliError::Validation(format!("--name is required for {}", self.kind)));
        }
        Ok(&self.name)
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[command(flatten)]
    pub asset: AssetArgs,

    /// Create without asking
    #[arg(long)]
    pub auto_approve: bool,
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[command(flatten)]
    pub asset: AssetArgs,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    #[command(flatten)]
    pub asset: AssetArgs,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Which single-asset operation to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SingleOp {
    /// The asset must not exist remotely yet
    Create,
    /// The asset must already exist remotely
    Update,
}

/// Local definition of one asset.
pub fn load_local(root: &std::path::Path, kind: AssetKind, name: &str) -> CliResult<Asset> {
    let policy = if kind.is_schema() {
        SelectionPolicy::new().with_all(kind)
    } else {
        SelectionPolicy::new().with_name(kind, name)
    };
    let bundle = LocalBundle::load(root, &policy)?;
    bundle.ensure_valid()?;
    bundle
        .get(kind, name)
        .cloned()
        .ok_or_else(|| CliError::Validation(format!("No local definition of {kind} '{name}'")))
}

/// Reconcile one local asset, checking first that it does or does not
/// exist remotely as `op` requires.
///
/// Remotes below the unified upload version only accept code services
/// and libraries; other kinds fail with [`CliError::Unsupported`].
pub async fn reconcile_one(
    client: &dyn AssetClient,
    prompter: &dyn Prompter,
    caches: &mut IdCaches,
    asset: &Asset,
    op: SingleOp,
    auto_approve: bool,
) -> CliResult<ApplyItem> {
    if !asset.kind().is_code() {
        let found = client.upload_version().await?;
        if found < UNIFIED_UPLOAD_VERSION {
            return Err(CliError::Unsupported {
                feature: format!("{} changes", asset.kind()),
                found,
                required: UNIFIED_UPLOAD_VERSION,
            });
        }
    }

    let target = AssetRef::new(asset.kind(), asset.name())
        .with_id(caches.id_of(asset.kind(), asset.name()));
    let exists = match client.get(&target).await {
        Ok(_) => true,
        Err(e) if e.is_not_found() => false,
        Err(e) => return Err(e),
    };
    match (op, exists) {
        (SingleOp::Create, true) if !asset.kind().is_schema() => {
            return Err(CliError::Conflict(format!(
                "{target} already exists; use 'cb-cli update'"
            )));
        }
        (SingleOp::Update, false) => {
            return Err(CliError::NotFound(format!(
                "{target} on the remote; use 'cb-cli create'"
            )));
        }
        _ => {}
    }

    let mut orchestrator =
        Orchestrator::new(client, prompter, caches, RunMode::Single).with_auto_approve(auto_approve);
    orchestrator.reconcile_asset(asset).await
}

fn print_item(item: &ApplyItem) {
    match &item.outcome {
        ApplyOutcome::Unchanged => {
            print_info(&format!("{} '{}' is already up to date", item.kind, item.name))
        }
        ApplyOutcome::Skipped => print_info(&format!(
            "{} '{}' skipped: {}",
            item.kind,
            item.name,
            item.error.as_deref().unwrap_or("declined")
        )),
        outcome => print_success(&format!(
            "{} '{}' {outcome} ({} remote change(s))",
            item.kind, item.name, item.mutations
        )),
    }
}

pub async fn execute_create(args: CreateArgs, options: &SessionOptions) -> CliResult<()> {
    let session = Session::open(options)?;
    let asset = load_local(session.root(), args.asset.kind, args.asset.name()?)?;
    let prompter = prompter_for(args.auto_approve);
    let mut caches = session.caches();

    let item = reconcile_one(
        &session.client,
        prompter.as_ref(),
        &mut caches,
        &asset,
        SingleOp::Create,
        args.auto_approve,
    )
    .await?;
    print_item(&item);
    Ok(())
}

pub async fn execute_update(args: UpdateArgs, options: &SessionOptions) -> CliResult<()> {
    let session = Session::open(options)?;
    let asset = load_local(session.root(), args.asset.kind, args.asset.name()?)?;
    let prompter = prompter_for(false);
    let mut caches = session.caches();

    let item = reconcile_one(
        &session.client,
        prompter.as_ref(),
        &mut caches,
        &asset,
        SingleOp::Update,
        false,
    )
    .await?;
    print_item(&item);
    Ok(())
}

pub async fn execute_delete(args: DeleteArgs, options: &SessionOptions) -> CliResult<()> {
    let kind = args.asset.kind;
    if kind.is_schema() {
        return Err(CliError::Validation(format!("{kind} cannot be deleted")));
    }
    let name = args.asset.name()?.to_string();
    let session = Session::open(options)?;
    let prompter = prompter_for(args.yes);
    let mut caches = session.caches();

    let mut orchestrator = Orchestrator::new(&session.client, prompter.as_ref(), &mut caches, RunMode::Single)
        .with_auto_approve(args.yes);
    let item = orchestrator.delete_asset(&AssetRef::new(kind, name)).await?;
    print_item(&item);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_schema_name_is_implicit() {
        let args = AssetArgs {
            kind: AssetKind::UserSchema,
            name: String::new(),
        };
        assert_eq!(args.name().unwrap(), SCHEMA_NAME);

        let args = AssetArgs {
            kind: AssetKind::Role,
            name: String::new(),
        };
        assert!(args.name().is_err());
    }

    #[test]
    fn test_load_local_finds_named_asset() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("roles")).unwrap();
        fs::write(
            dir.path().join("roles/Operator.json"),
            r#"{"Name": "Operator", "Description": "ops", "Permissions": {}}"#,
        )
        .unwrap();

        let asset = load_local(dir.path(), AssetKind::Role, "Operator").unwrap();
        assert_eq!(asset.name(), "Operator");
        assert!(load_local(dir.path(), AssetKind::Role, "Missing").is_err());
    }
}

//! Diff command - compare local assets against the remote system
//!
//! Exit codes:
//! - 0: No changes
//! - 1: Changes found
//! - 4: Plan blocked by local errors

use clap::Args;

use super::selection::SelectionArgs;
use crate::api::AssetClient;
use crate::error::{CliError, CliResult};
use crate::interactive::NonInteractive;
use crate::plan::{
    render_plan, should_use_color, ChangePlan, ChangeSetBuilder, OutputFormat, EXIT_CHANGES_FOUND,
};
use crate::reconcile::remote_only;
use crate::resource::{LocalBundle, SelectionPolicy};
use crate::session::{Session, SessionOptions};

/// Compare local assets with the remote system
#[derive(Args, Debug)]
pub struct DiffArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Also list selected remote assets that do not exist locally
    #[arg(long)]
    pub show_remote_only: bool,
}

/// Execute the diff command
pub async fn execute(args: DiffArgs, options: &SessionOptions) -> CliResult<()> {
    let policy = args.selection.to_policy()?;
    let session = Session::open(options)?;

    let plan = local_diff(&session.client, session.root(), &policy, args.show_remote_only).await?;
    print!(
        "{}",
        render_plan(&plan, args.output, should_use_color(args.no_color))?
    );

    if plan.is_blocked() {
        return Err(CliError::PlanBlocked(plan.errors.len()));
    }
    if plan.exit_code() == EXIT_CHANGES_FOUND {
        std::process::exit(EXIT_CHANGES_FOUND);
    }
    Ok(())
}

/// Plan of the selected local assets against the remote lists.
pub async fn local_diff(
    client: &dyn AssetClient,
    root: &std::path::Path,
    policy: &SelectionPolicy,
    show_remote_only: bool,
) -> CliResult<ChangePlan> {
    // No secrets are needed: nothing is archived.
    let prompter = NonInteractive;
    let (mut plan, bundle) = ChangeSetBuilder::new(client, &prompter, root, policy)
        .build_local()
        .await?;

    if show_remote_only {
        for note in remote_only_notes(client, &bundle, policy).await? {
            plan.warn(note);
        }
    }
    Ok(plan)
}

async fn remote_only_notes(
    client: &dyn AssetClient,
    bundle: &LocalBundle,
    policy: &SelectionPolicy,
) -> CliResult<Vec<String>> {
    let mut notes = Vec::new();
    for kind in policy.selected_kinds().into_iter().filter(|k| !k.is_schema()) {
        let remote = client.list(kind).await?;
        for asset in remote_only(bundle, &remote) {
            if policy.includes(kind, asset.name()) {
                notes.push(format!("{kind} '{}' exists only on the remote", asset.name()));
            }
        }
    }
    Ok(notes)
}

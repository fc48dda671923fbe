//! Push command - plan, review and apply local assets to the remote

use clap::Args;

use super::selection::SelectionArgs;
use crate::api::AssetClient;
use crate::batch::ApplyReport;
use crate::cache::IdCaches;
use crate::error::{CliError, CliResult};
use crate::interactive::{prompter_for, require_interactive, Prompter};
use crate::output::{print_info, print_report, print_success, print_warning};
use crate::plan::builder::{BuiltPlan, Strategy};
use crate::plan::{render_plan, should_use_color, ChangeSetBuilder, OutputFormat, PlanState};
use crate::reconcile::{Orchestrator, RunMode};
use crate::resource::SelectionPolicy;
use crate::session::{Session, SessionOptions};

/// Push local assets to the remote system
#[derive(Args, Debug)]
pub struct PushArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Apply without asking for confirmation (including creations)
    #[arg(long)]
    pub auto_approve: bool,

    /// Show the plan and stop
    #[arg(long)]
    pub dry_run: bool,

    /// Plan and report format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Table)]
    pub output: OutputFormat,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

/// Execute the push command
pub async fn execute(args: PushArgs, options: &SessionOptions) -> CliResult<()> {
    let policy = args.selection.to_policy()?;
    let session = Session::open(options)?;
    let prompter = prompter_for(args.auto_approve);
    let mut caches = session.caches();

    let outcome = run_push(
        &session.client,
        prompter.as_ref(),
        &mut caches,
        &PushRun {
            root: session.root(),
            policy: &policy,
            remote_name: &session.remote_name,
            auto_approve: args.auto_approve,
            dry_run: args.dry_run,
            require_terminal: true,
            format: args.output,
            use_color: should_use_color(args.no_color),
        },
    )
    .await?;

    match outcome {
        PushOutcome::NoChanges | PushOutcome::DryRun | PushOutcome::Declined => Ok(()),
        PushOutcome::Applied(report) => {
            let report = report.into_result()?;
            if args.output == OutputFormat::Table {
                print_success(&format!(
                    "Pushed to '{}': {} asset(s) changed",
                    session.remote_name,
                    report.changed_count()
                ));
            }
            Ok(())
        }
    }
}

/// Inputs of one push run that do not come from the session.
pub struct PushRun<'a> {
    pub root: &'a std::path::Path,
    pub policy: &'a SelectionPolicy,
    pub remote_name: &'a str,
    pub auto_approve: bool,
    pub dry_run: bool,
    /// Refuse to ask for confirmation without a terminal.
    pub require_terminal: bool,
    pub format: OutputFormat,
    pub use_color: bool,
}

#[derive(Debug)]
pub enum PushOutcome {
    NoChanges,
    DryRun,
    Declined,
    Applied(ApplyReport),
}

/// Build, show, confirm and apply a plan.
///
/// A blocked plan is returned as [`CliError::PlanBlocked`] after it has
/// been rendered.
pub async fn run_push(
    client: &dyn AssetClient,
    prompter: &dyn Prompter,
    caches: &mut IdCaches,
    run: &PushRun<'_>,
) -> CliResult<PushOutcome> {
    let built = ChangeSetBuilder::new(client, prompter, run.root, run.policy)
        .build()
        .await?;
    if built.strategy == Strategy::Legacy && run.format == OutputFormat::Table {
        print_warning(&format!(
            "Remote '{}' reports upload version {}; using per-asset push",
            run.remote_name, built.upload_version
        ));
    }
    print!("{}", render_plan(&built.plan, run.format, run.use_color)?);

    let state = PlanState::from_plan(&built.plan);
    match state {
        PlanState::Done => return Ok(PushOutcome::NoChanges),
        PlanState::Blocked => return Err(CliError::PlanBlocked(built.plan.errors.len())),
        _ => {}
    }
    if run.dry_run {
        if run.format == OutputFormat::Table {
            print_info("Dry run: nothing was applied.");
        }
        return Ok(PushOutcome::DryRun);
    }

    if !run.auto_approve {
        if run.require_terminal {
            require_interactive()?;
        }
        let question = format!(
            "Apply {} change(s) to remote '{}'?",
            built.plan.total_changes(),
            run.remote_name
        );
        if !prompter.confirm(&question, false)? {
            println!("Cancelled.");
            return Ok(PushOutcome::Declined);
        }
    }
    let state = state.confirm()?.begin_apply()?;

    let report = apply(client, prompter, caches, run.auto_approve, &built).await?;
    let state = state.finish(&report)?;
    tracing::info!(%state, changed = report.changed_count(), failed = report.failure_count, "Push finished");

    print_report(&report, run.format, run.use_color)?;
    Ok(PushOutcome::Applied(report))
}

async fn apply(
    client: &dyn AssetClient,
    prompter: &dyn Prompter,
    caches: &mut IdCaches,
    auto_approve: bool,
    built: &BuiltPlan,
) -> CliResult<ApplyReport> {
    let mut orchestrator =
        Orchestrator::new(client, prompter, caches, RunMode::Bulk).with_auto_approve(auto_approve);

    match (&built.strategy, &built.archive) {
        (Strategy::ServerDelta, Some(archive)) => orchestrator.apply_upload(archive, &built.plan).await,
        (Strategy::ServerDelta, None) => Err(CliError::Archive(
            "server-computed plan has no archive to upload".into(),
        )),
        (Strategy::Legacy, _) => orchestrator.reconcile_all(&built.bundle).await,
    }
}

//! cb-cli - Command-line interface for platform asset synchronization
//!
//! This CLI enables developers to:
//! - Initialize a project bound to a remote system
//! - Review the changes a push would make
//! - Push local assets and pull remote ones
//! - Import collection items

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cb_cli::commands;
use cb_cli::error::CliResult;
use cb_cli::logging::{self, LogLevel};
use cb_cli::session::SessionOptions;

/// cb-cli - Platform asset synchronization
#[derive(Parser)]
#[command(name = "cb-cli")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(long, global = true, env = "CB_CLI_ROOT")]
    root: Option<PathBuf>,

    /// Remote to use instead of the current one
    #[arg(long, global = true)]
    remote: Option<String>,

    /// Show progress details
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Show debug output including request summaries
    #[arg(long, global = true)]
    debug: bool,

    /// Show full request and response bodies (secrets redacted)
    #[arg(long, global = true)]
    trace: bool,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bind this directory to a remote system
    Init(commands::init::InitArgs),

    /// Manage named remotes
    Remote(commands::remote::RemoteArgs),

    /// Push local assets to the remote system
    Push(commands::push::PushArgs),

    /// Download remote assets into the local tree
    Pull(commands::pull::PullArgs),

    /// Compare local assets with the remote system
    Diff(commands::diff::DiffArgs),

    /// Upload the items of a local collection
    Import(commands::import::ImportArgs),

    /// Create one asset on the remote
    Create(commands::asset::CreateArgs),

    /// Update one existing remote asset
    Update(commands::asset::UpdateArgs),

    /// Delete one remote asset
    Delete(commands::asset::DeleteArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init(LogLevel::from_flags_and_env(
        cli.verbose,
        cli.debug,
        cli.trace,
        cli.quiet,
        |key| std::env::var(key).ok(),
    ));

    match run(cli).await {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let options = SessionOptions {
        root: cli.root.clone(),
        remote: cli.remote,
    };
    match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.root).await,
        Commands::Remote(args) => commands::remote::execute(args, cli.root).await,
        Commands::Push(args) => commands::push::execute(args, &options).await,
        Commands::Pull(args) => commands::pull::execute(args, &options).await,
        Commands::Diff(args) => commands::diff::execute(args, &options).await,
        Commands::Import(args) => commands::import::execute(args, &options).await,
        Commands::Create(args) => commands::asset::execute_create(args, &options).await,
        Commands::Update(args) => commands::asset::execute_update(args, &options).await,
        Commands::Delete(args) => commands::asset::execute_delete(args, &options).await,
    }
}

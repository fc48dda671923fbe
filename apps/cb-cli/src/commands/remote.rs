//! Remote command - manage the registry of remote systems

use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::{ConfigPaths, Remote, Remotes};
use crate::error::CliResult;
use crate::output::{print_info, print_success};

#[derive(Args, Debug)]
pub struct RemoteArgs {
    #[command(subcommand)]
    pub command: RemoteCommands,
}

#[derive(Subcommand, Debug)]
pub enum RemoteCommands {
    /// List configured remotes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add or replace a remote
    Put(PutArgs),
    /// Remove a remote
    Remove { name: String },
    /// Make a remote the default for push, pull and diff
    SetCurrent { name: String },
}

#[derive(Args, Debug)]
pub struct PutArgs {
    pub name: String,

    #[arg(long)]
    pub platform_url: String,

    #[arg(long, default_value = "")]
    pub messaging_url: String,

    #[arg(long)]
    pub system_key: String,

    #[arg(long, env = "CB_CLI_SYSTEM_SECRET", hide_env_values = true)]
    pub system_secret: String,

    #[arg(long, env = "CB_CLI_DEV_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Also make it the current remote
    #[arg(long)]
    pub current: bool,
}

#[derive(Serialize)]
struct RemoteEntry<'a> {
    name: &'a str,
    platform_url: &'a str,
    system_key: &'a str,
    current: bool,
}

pub async fn execute(args: RemoteArgs, root: Option<PathBuf>) -> CliResult<()> {
    let paths = ConfigPaths::new(root)?;
    let mut remotes = Remotes::load(&paths.remotes_file)?;

    match args.command {
        RemoteCommands::List { json } => {
            print!("{}", render_list(&remotes, json)?);
        }
        RemoteCommands::Put(put) => {
            remotes.put(
                &put.name,
                Remote {
                    platform_url: put.platform_url,
                    messaging_url: put.messaging_url,
                    system_key: put.system_key,
                    system_secret: put.system_secret,
                    token: put.token,
                },
            )?;
            if put.current {
                remotes.set_current(&put.name)?;
            }
            remotes.save(&paths.remotes_file)?;
            print_success(&format!("Saved remote '{}'", put.name));
        }
        RemoteCommands::Remove { name } => {
            let was_current = remotes.current_name() == Some(name.as_str());
            remotes.remove(&name)?;
            remotes.save(&paths.remotes_file)?;
            print_success(&format!("Removed remote '{name}'"));
            if was_current {
                print_info("No current remote is set. Use 'cb-cli remote set-current <name>'.");
            }
        }
        RemoteCommands::SetCurrent { name } => {
            remotes.set_current(&name)?;
            remotes.save(&paths.remotes_file)?;
            print_success(&format!("Current remote is now '{name}'"));
        }
    }
    Ok(())
}

fn render_list(remotes: &Remotes, json: bool) -> CliResult<String> {
    if json {
        let entries: Vec<RemoteEntry<'_>> = remotes
            .list()
            .map(|(name, remote, current)| RemoteEntry {
                name,
                platform_url: &remote.platform_url,
                system_key: &remote.system_key,
                current,
            })
            .collect();
        return Ok(serde_json::to_string_pretty(&entries)? + "\n");
    }

    if remotes.is_empty() {
        return Ok("No remotes configured.\n".to_string());
    }
    let mut out = String::new();
    for (name, remote, current) in remotes.list() {
        let marker = if current { "*" } else { " " };
        out.push_str(&format!(
            "{marker} {name:<16} {:<40} {}\n",
            remote.platform_url, remote.system_key
        ));
    }
    Ok(out)
}

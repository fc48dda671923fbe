//! Init command - create a project tree bound to a remote system

use clap::Args;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

use crate::config::{validate_remote_name, ConfigPaths, Remote, Remotes};
use crate::error::{CliError, CliResult};
use crate::models::{AssetKind, SystemMeta};
use crate::output::{print_info, print_key_value, print_next_steps, print_success};

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    #[arg(long)]
    pub platform_url: String,

    #[arg(long)]
    pub system_key: String,

    #[arg(long, env = "CB_CLI_SYSTEM_SECRET", hide_env_values = true)]
    pub system_secret: String,

    /// Developer token sent with every request
    #[arg(long, env = "CB_CLI_DEV_TOKEN", hide_env_values = true)]
    pub token: String,

    #[arg(long, default_value = "")]
    pub messaging_url: String,

    /// System name written to system.json
    #[arg(long)]
    pub name: Option<String>,

    /// Name under which the remote is registered
    #[arg(long, default_value = "default")]
    pub remote_name: String,

    /// Overwrite an existing system.json
    #[arg(long)]
    pub force: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct InitOutput {
    root: String,
    system_key: String,
    remote: String,
    directories: Vec<String>,
}

/// Directories created for a fresh project.
fn project_dirs() -> Vec<&'static str> {
    let mut dirs: Vec<&str> = AssetKind::ALL.iter().map(AssetKind::dir).collect();
    dirs.extend(["users/roles", "devices/roles", "bucket-set-files", "file-stores-files"]);
    dirs.sort_unstable();
    dirs.dedup();
    dirs
}

/// Execute the init command
pub async fn execute(args: InitArgs, root: Option<PathBuf>) -> CliResult<()> {
    validate_remote_name(&args.remote_name)?;
    if args.platform_url.trim().is_empty() || args.system_key.trim().is_empty() {
        return Err(CliError::Validation(
            "--platform-url and --system-key must not be empty".into(),
        ));
    }

    let paths = ConfigPaths::new(root)?;
    if paths.is_initialized() && !args.force {
        return Err(CliError::Validation(format!(
            "{} already exists. Use --force to overwrite it, or 'cb-cli remote put' to add a remote.",
            paths.system_file.display()
        )));
    }

    let directories = init_project(&paths, &args)?;
    tracing::info!(root = %paths.root.display(), remote = %args.remote_name, "Project initialized");

    if args.json {
        let output = InitOutput {
            root: paths.root.display().to_string(),
            system_key: args.system_key.clone(),
            remote: args.remote_name.clone(),
            directories,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    print_success(&format!("Initialized project in {}", paths.root.display()));
    print_key_value("System key", &args.system_key);
    print_key_value("Remote", &args.remote_name);
    print_key_value("Platform", &args.platform_url);
    print_info(&format!("Created {} asset directories", directories.len()));
    print_next_steps(&[
        "Pull the current system: cb-cli pull --all".to_string(),
        "Preview local edits: cb-cli diff --all".to_string(),
        "Push them: cb-cli push --all".to_string(),
    ]);
    Ok(())
}

/// Write system.json and the remote registry and create the asset
/// directories. Returns the directories created.
pub fn init_project(paths: &ConfigPaths, args: &InitArgs) -> CliResult<Vec<String>> {
    let system = SystemMeta {
        name: args.name.clone().unwrap_or_else(|| args.system_key.clone()),
        description: String::new(),
        system_key: args.system_key.clone(),
        system_secret: args.system_secret.clone(),
        platform_url: args.platform_url.clone(),
        messaging_url: args.messaging_url.clone(),
    };
    fs::create_dir_all(&paths.root)?;
    system.save(&paths.system_file)?;

    paths.ensure_state_dir()?;
    let mut remotes = Remotes::load(&paths.remotes_file)?;
    remotes.put(
        &args.remote_name,
        Remote {
            platform_url: args.platform_url.clone(),
            messaging_url: args.messaging_url.clone(),
            system_key: args.system_key.clone(),
            system_secret: args.system_secret.clone(),
            token: args.token.clone(),
        },
    )?;
    remotes.set_current(&args.remote_name)?;
    remotes.save(&paths.remotes_file)?;

    let mut created = Vec::new();
    for dir in project_dirs() {
        let path = paths.resolve(dir);
        if !path.exists() {
            fs::create_dir_all(&path)?;
            created.push(dir.to_string());
        }
    }
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args() -> InitArgs {
        InitArgs {
            platform_url: "https://platform.example.com".into(),
            system_key: "abc123".into(),
            system_secret: "shh".into(),
            token: "tok".into(),
            messaging_url: String::new(),
            name: Some("Demo".into()),
            remote_name: "dev".into(),
            force: false,
            json: false,
        }
    }

    #[test]
    fn test_project_dirs_cover_every_kind() {
        let dirs = project_dirs();
        for kind in AssetKind::ALL {
            assert!(dirs.contains(&kind.dir()), "{kind}");
        }
        assert!(dirs.contains(&"users/roles"));
    }

    #[test]
    fn test_init_project_writes_layout() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::at(dir.path());
        let created = init_project(&paths, &args()).unwrap();

        assert!(created.contains(&"code/services".to_string()));
        assert!(dir.path().join("data").is_dir());
        let system = SystemMeta::load(&paths.system_file).unwrap();
        assert_eq!(system.name, "Demo");
        assert_eq!(system.system_key, "abc123");

        let remotes = Remotes::load(&paths.remotes_file).unwrap();
        assert_eq!(remotes.current_name(), Some("dev"));
        assert_eq!(remotes.get("dev").unwrap().token, "tok");
    }

    #[test]
    fn test_init_project_keeps_other_remotes() {
        let dir = TempDir::new().unwrap();
        let paths = ConfigPaths::at(dir.path());
        init_project(&paths, &args()).unwrap();

        let mut second = args();
        second.remote_name = "prod".into();
        let created = init_project(&paths, &second).unwrap();
        assert!(created.is_empty());

        let remotes = Remotes::load(&paths.remotes_file).unwrap();
        assert_eq!(remotes.list().count(), 2);
        assert_eq!(remotes.current_name(), Some("prod"));
    }
}

//! Per-invocation context
//!
//! Everything a command needs about "where" and "against what" is
//! resolved once here and passed down explicitly.

use std::path::PathBuf;

use crate::api::{HttpClient, RetryPolicy};
use crate::cache::IdCaches;
use crate::config::{Config, ConfigPaths, Remote, Remotes};
use crate::error::{CliError, CliResult};
use crate::models::SystemMeta;

/// Options shared by every command that talks to a remote.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub root: Option<PathBuf>,
    pub remote: Option<String>,
}

pub struct Session {
    pub paths: ConfigPaths,
    pub config: Config,
    pub system: SystemMeta,
    pub remote_name: String,
    pub remote: Remote,
    pub client: HttpClient,
}

impl Session {
    /// Resolve the project, its configuration and the selected remote.
    pub fn open(options: &SessionOptions) -> CliResult<Self> {
        let paths = ConfigPaths::new(options.root.clone())?;
        if !paths.is_initialized() {
            return Err(CliError::Config(format!(
                "{} is not a project root (no system.json). Run 'cb-cli init' first.",
                paths.root.display()
            )));
        }
        let config = Config::load(&paths)?;
        let system = SystemMeta::load(&paths.system_file)?;
        let remotes = Remotes::load(&paths.remotes_file)?;
        let (remote_name, remote) = remotes.resolve(options.remote.as_deref())?;

        if !system.system_key.is_empty() && system.system_key != remote.system_key {
            tracing::warn!(
                remote = %remote_name,
                "system.json names a different system key than the selected remote; using the remote's"
            );
        }

        let client = HttpClient::new(&remote, &config)?;
        tracing::debug!(
            root = %paths.root.display(),
            remote = %remote_name,
            platform_url = %remote.platform_url,
            "Session opened"
        );

        Ok(Self {
            paths,
            config,
            system,
            remote_name,
            remote,
            client,
        })
    }

    /// Id caches of this project, read from disk.
    pub fn caches(&self) -> IdCaches {
        IdCaches::load(&self.paths)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config.retry)
    }

    pub fn root(&self) -> &std::path::Path {
        self.paths.root()
    }
}

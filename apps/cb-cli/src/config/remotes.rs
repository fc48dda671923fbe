//! Registry of remote systems a project can push to

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

use crate::error::{CliError, CliResult};

static REMOTE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z][a-z0-9_-]*[a-z0-9]$").expect("remote name pattern is valid")
});

pub fn validate_remote_name(name: &str) -> CliResult<()> {
    if REMOTE_NAME.is_match(name) {
        Ok(())
    } else {
        Err(CliError::Validation(format!(
            "Invalid remote name '{name}': use lowercase letters, digits, '-' or '_', \
             starting with a letter and ending with a letter or digit"
        )))
    }
}

/// Connection details of one remote system
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remote {
    #[serde(rename = "PlatformURL")]
    pub platform_url: String,
    #[serde(rename = "MessagingURL", default)]
    pub messaging_url: String,
    #[serde(rename = "SystemKey")]
    pub system_key: String,
    #[serde(rename = "SystemSecret")]
    pub system_secret: String,
    #[serde(rename = "Token")]
    pub token: String,
}

impl fmt::Debug for Remote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Remote")
            .field("platform_url", &self.platform_url)
            .field("messaging_url", &self.messaging_url)
            .field("system_key", &self.system_key)
            .field("system_secret", &"[REDACTED]")
            .field("token", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Remotes {
    #[serde(default)]
    remotes: BTreeMap<String, Remote>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    current: Option<String>,
}

impl Remotes {
    /// Load the registry; a missing file is an empty registry.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .map_err(|e| CliError::Config(format!("Invalid {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> CliResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Remotes in name order with a flag marking the current one.
    pub fn list(&self) -> impl Iterator<Item = (&str, &Remote, bool)> {
        self.remotes.iter().map(move |(name, remote)| {
            (
                name.as_str(),
                remote,
                self.current.as_deref() == Some(name.as_str()),
            )
        })
    }

    pub fn get(&self, name: &str) -> Option<&Remote> {
        self.remotes.get(name)
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }

    /// Add or replace a remote. The first remote becomes current.
    pub fn put(&mut self, name: &str, remote: Remote) -> CliResult<()> {
        validate_remote_name(name)?;
        self.remotes.insert(name.to_string(), remote);
        if self.current.is_none() {
            self.current = Some(name.to_string());
        }
        Ok(())
    }

    /// Remove a remote; removing the current remote clears `current`.
    pub fn remove(&mut self, name: &str) -> CliResult<Remote> {
        let removed = self
            .remotes
            .remove(name)
            .ok_or_else(|| CliError::NotFound(format!("remote '{name}'")))?;
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
        Ok(removed)
    }

    pub fn set_current(&mut self, name: &str) -> CliResult<()> {
        if !self.remotes.contains_key(name) {
            return Err(CliError::Validation(format!(
                "Unknown remote '{name}'. Run 'cb-cli remote list' to see configured remotes."
            )));
        }
        self.current = Some(name.to_string());
        Ok(())
    }

    /// The explicitly requested remote, or the current one.
    pub fn resolve(&self, requested: Option<&str>) -> CliResult<(String, Remote)> {
        let name = match requested {
            Some(name) => name,
            None => self.current.as_deref().ok_or(CliError::NoRemote)?,
        };
        self.remotes
            .get(name)
            .map(|remote| (name.to_string(), remote.clone()))
            .ok_or_else(|| CliError::NotFound(format!("remote '{name}'")))
    }
}

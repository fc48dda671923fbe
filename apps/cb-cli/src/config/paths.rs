//! Project-relative configuration paths

use crate::error::{CliError, CliResult};
use std::path::{Path, PathBuf};

/// Environment variable overriding the project root
pub const ROOT_ENV: &str = "CB_CLI_ROOT";

/// Hidden per-project state directory
pub const STATE_DIR: &str = ".cb-cli";

/// Id-mapping caches kept in the state directory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdCacheKind {
    /// Collection name → collection id
    Collections,
    /// User email → user id
    Users,
    /// Role name → role id
    Roles,
}

impl IdCacheKind {
    pub const ALL: [IdCacheKind; 3] = [
        IdCacheKind::Collections,
        IdCacheKind::Users,
        IdCacheKind::Roles,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            IdCacheKind::Collections => "map-collections.json",
            IdCacheKind::Users => "map-users.json",
            IdCacheKind::Roles => "map-roles.json",
        }
    }
}

/// Configuration paths for one project tree
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    /// Project root holding `system.json` and the asset directories
    pub root: PathBuf,
    /// Path to system.json
    pub system_file: PathBuf,
    /// Hidden state directory (`.cb-cli/`)
    pub state_dir: PathBuf,
    /// Path to remotes.json
    pub remotes_file: PathBuf,
    /// Path to config.json
    pub config_file: PathBuf,
}

impl ConfigPaths {
    /// Resolve the project root: explicit flag, then `CB_CLI_ROOT`, then the
    /// current directory.
    pub fn new(root_override: Option<PathBuf>) -> CliResult<Self> {
        let root = match root_override {
            Some(root) => root,
            None => match std::env::var(ROOT_ENV) {
                Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
                _ => std::env::current_dir().map_err(|e| {
                    CliError::Config(format!("Could not determine current directory: {e}"))
                })?,
            },
        };
        Ok(Self::at(root))
    }

    /// Paths for a known root.
    pub fn at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_dir = root.join(STATE_DIR);
        Self {
            system_file: root.join(crate::resource::path::SYSTEM_FILE),
            remotes_file: state_dir.join("remotes.json"),
            config_file: state_dir.join("config.json"),
            state_dir,
            root,
        }
    }

    pub fn cache_file(&self, kind: IdCacheKind) -> PathBuf {
        self.state_dir.join(kind.file_name())
    }

    /// Absolute path of a slash-delimited project-relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        relative
            .split('/')
            .filter(|s| !s.is_empty())
            .fold(self.root.clone(), |path, segment| path.join(segment))
    }

    pub fn is_initialized(&self) -> bool {
        self.system_file.exists()
    }

    /// Ensure the state directory exists
    pub fn ensure_state_dir(&self) -> CliResult<()> {
        if !self.state_dir.exists() {
            std::fs::create_dir_all(&self.state_dir)?;
        }
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_under_root() {
        let paths = ConfigPaths::at("/work/demo");
        assert_eq!(paths.system_file, PathBuf::from("/work/demo/system.json"));
        assert_eq!(paths.remotes_file, PathBuf::from("/work/demo/.cb-cli/remotes.json"));
        assert_eq!(
            paths.cache_file(IdCacheKind::Users),
            PathBuf::from("/work/demo/.cb-cli/map-users.json")
        );
    }

    #[test]
    fn test_explicit_root_wins() {
        let paths = ConfigPaths::new(Some(PathBuf::from("/explicit"))).unwrap();
        assert_eq!(paths.root, PathBuf::from("/explicit"));
    }

    #[test]
    fn test_resolve_relative() {
        let paths = ConfigPaths::at("/work");
        assert_eq!(
            paths.resolve("code/services/a/a.js"),
            PathBuf::from("/work/code/services/a/a.js")
        );
    }

    #[test]
    fn test_ensure_state_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let paths = ConfigPaths::at(dir.path());
        assert!(!paths.is_initialized());
        paths.ensure_state_dir().unwrap();
        assert!(paths.state_dir.is_dir());
    }
}

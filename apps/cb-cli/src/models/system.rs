//! System metadata stored in `system.json`

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{CliError, CliResult};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemMeta {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub system_key: String,
    #[serde(default)]
    pub system_secret: String,
    #[serde(default)]
    pub platform_url: String,
    #[serde(default)]
    pub messaging_url: String,
}

impl SystemMeta {
    /// Load `system.json` from the given path.
    pub fn load(path: &Path) -> CliResult<Self> {
        if !path.exists() {
            return Err(CliError::Config(format!(
                "{} not found. Run 'cb-cli init' in the project root first.",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CliError::Validation(format!("Invalid {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> CliResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_missing_system_json() {
        let dir = TempDir::new().unwrap();
        let err = SystemMeta::load(&dir.path().join("system.json")).unwrap_err();
        assert!(err.to_string().contains("cb-cli init"));
    }

    #[test]
    fn test_save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("system.json");
        let meta = SystemMeta {
            name: "demo".into(),
            system_key: "abc".into(),
            platform_url: "https://platform.example.com".into(),
            ..Default::default()
        };
        meta.save(&path).unwrap();
        assert_eq!(SystemMeta::load(&path).unwrap(), meta);
    }
}

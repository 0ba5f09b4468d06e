//! CLI configuration: one TOML file covering database, remote endpoint
//! and engine tunables.

use anyhow::{Context, Result};
use dossier_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DossierConfig {
    /// Path to the SQLite database.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the storage API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token; DOSSIER_REMOTE_TOKEN overrides the file value.
    #[serde(default)]
    pub token: String,
}

fn default_database_path() -> String {
    dossier_logging::dossier_home()
        .join("dossier.sqlite3")
        .to_string_lossy()
        .to_string()
}

fn default_base_url() -> String {
    "https://storage.invalid/api/2".to_string()
}

impl Default for DossierConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            remote: RemoteConfig::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
        }
    }
}

impl DossierConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn default_path() -> PathBuf {
        dossier_logging::dossier_home().join("dossier.toml")
    }
}

impl RemoteConfig {
    /// Token with the environment override applied.
    pub fn resolved_token(&self) -> String {
        std::env::var("DOSSIER_REMOTE_TOKEN").unwrap_or_else(|_| self.token.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = DossierConfig::load(Path::new("/nonexistent/dossier.toml")).unwrap();
        assert!(config.database_path.ends_with("dossier.sqlite3"));
        assert_eq!(config.engine.remote_root, "/CASES");
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dossier.toml");
        std::fs::write(
            &path,
            "database_path = \"/tmp/test.sqlite3\"\n\n[engine]\npoll_interval_secs = 60\n",
        )
        .unwrap();

        let config = DossierConfig::load(&path).unwrap();
        assert_eq!(config.database_path, "/tmp/test.sqlite3");
        assert_eq!(config.engine.poll_interval_secs, 60);
        assert_eq!(config.engine.remote_root, "/CASES");
    }
}

//! Configuration Management
//!
//! Handles persistent configuration storage for tfharvest.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Refreshes in flight when neither the CLI nor the config says otherwise
pub const DEFAULT_CONCURRENCY: usize = 8;

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Snapshot used to refresh resources
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
    /// Maximum refreshes in flight
    #[serde(default)]
    pub concurrency: Option<usize>,
    /// Filter expressions applied when none are given on the command line
    #[serde(default)]
    pub filters: Vec<String>,
}

impl Config {
    /// Get the config file path
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("tfharvest").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_else(|e| {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<()> {
        let Some(path) = Self::config_path() else {
            return Ok(());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get effective snapshot (CLI > config)
    pub fn effective_snapshot(&self, cli: Option<&Path>) -> Option<PathBuf> {
        cli.map(Path::to_path_buf)
            .or_else(|| self.snapshot_path.clone())
    }

    /// Get effective concurrency (CLI > config > default)
    pub fn effective_concurrency(&self, cli: Option<usize>) -> usize {
        cli.or(self.concurrency)
            .unwrap_or(DEFAULT_CONCURRENCY)
            .max(1)
    }

    /// Get effective filters (CLI > config)
    pub fn effective_filters(&self, cli: &[String]) -> Vec<String> {
        if cli.is_empty() {
            self.filters.clone()
        } else {
            cli.to_vec()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            snapshot_path: Some(PathBuf::from("/tmp/states.json")),
            concurrency: Some(4),
            filters: vec!["Name=services".to_string()],
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_missing_or_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(Config::load_from(&path), Config::default());

        std::fs::write(&path, "not json").unwrap();
        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let config = Config {
            snapshot_path: Some(PathBuf::from("config.json")),
            concurrency: Some(2),
            filters: vec!["Name=a".to_string()],
        };

        assert_eq!(config.effective_concurrency(Some(16)), 16);
        assert_eq!(config.effective_concurrency(None), 2);
        assert_eq!(Config::default().effective_concurrency(None), DEFAULT_CONCURRENCY);
        assert_eq!(Config::default().effective_concurrency(Some(0)), 1);

        assert_eq!(
            config.effective_snapshot(Some(Path::new("cli.json"))),
            Some(PathBuf::from("cli.json"))
        );
        assert_eq!(config.effective_snapshot(None), Some(PathBuf::from("config.json")));

        assert_eq!(config.effective_filters(&[]), vec!["Name=a".to_string()]);
        assert_eq!(
            config.effective_filters(&["Name=b".to_string()]),
            vec!["Name=b".to_string()]
        );
    }
}

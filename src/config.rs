//! TOML configuration
//! Per-field serde defaults; a missing file yields the default config.

use crate::utils::MS_PER_DAY;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Command prefix, e.g. "+" for "+points"
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Points database location; platform config dir when unset
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// How many entries the leaderboard shows
    #[serde(default = "default_leaderboard_size")]
    pub leaderboard_size: usize,
    /// Entries untouched for this many days are eligible for cleanup
    #[serde(default = "default_stale_after_days")]
    pub stale_after_days: u64,
}

fn default_prefix() -> String {
    "+".to_string()
}
fn default_leaderboard_size() -> usize {
    10
}
fn default_stale_after_days() -> u64 {
    30
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            data_dir: None,
            leaderboard_size: default_leaderboard_size(),
            stale_after_days: default_stale_after_days(),
        }
    }
}

impl BotConfig {
    /// Load config from a TOML file; a missing file yields defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save config to a TOML file, creating parent directories as needed
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Staleness threshold in milliseconds
    pub fn stale_after_ms(&self) -> u64 {
        self.stale_after_days * MS_PER_DAY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = BotConfig::load(Path::new("/nonexistent/guild-points.toml")).unwrap();
        assert_eq!(config.prefix, "+");
        assert_eq!(config.leaderboard_size, 10);
        assert_eq!(config.stale_after_days, 30);
        assert_eq!(config.stale_after_ms(), 2_592_000_000);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: BotConfig = toml::from_str("prefix = \"!\"").unwrap();
        assert_eq!(config.prefix, "!");
        assert_eq!(config.leaderboard_size, 10);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = BotConfig::default();
        config.stale_after_days = 7;
        config.save(&path).unwrap();

        let loaded = BotConfig::load(&path).unwrap();
        assert_eq!(loaded.stale_after_days, 7);
    }
}

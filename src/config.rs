//! Configuration file support for practice
//!
//! Reads from .practice/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration structure
#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Storage backend settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Burst timer settings
    #[serde(default)]
    pub burst: BurstConfig,

    /// Home view settings
    #[serde(default)]
    pub home: HomeConfig,

    /// Web server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

/// Which persistence backend the data directory uses
#[derive(Debug, Deserialize, Serialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per collection (`practice_items.json`, `practice_logs.json`)
    #[default]
    Json,
    /// `practice.db` through Diesel
    Sqlite,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Default: json
    #[serde(default)]
    pub backend: Backend,

    /// Write the sample items when the item collection is empty
    /// Default: true
    #[serde(default = "default_true")]
    pub seed_on_empty: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct BurstConfig {
    /// Countdown length. Default: 300 (5:00)
    #[serde(default = "default_duration_secs")]
    pub duration_secs: u32,

    /// Minutes logged when a burst is completed without ever being started
    /// Default: 5
    #[serde(default = "default_fallback_minutes")]
    pub fallback_minutes: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HomeConfig {
    /// How many recently practiced items the home view lists. Default: 5
    #[serde(default = "default_recent_limit")]
    pub recent_limit: usize,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ServeConfig {
    /// Default: 3000
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_true() -> bool {
    true
}

fn default_duration_secs() -> u32 {
    300
}

fn default_fallback_minutes() -> u32 {
    5
}

fn default_recent_limit() -> usize {
    5
}

fn default_port() -> u16 {
    3000
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            seed_on_empty: true,
        }
    }
}

impl Default for BurstConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration_secs(),
            fallback_minutes: default_fallback_minutes(),
        }
    }
}

impl Default for HomeConfig {
    fn default() -> Self {
        Self {
            recent_limit: default_recent_limit(),
        }
    }
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self { port: default_port() }
    }
}

impl Config {
    /// Load config from .practice/config.toml
    /// Returns default config if file doesn't exist
    pub fn load() -> Self {
        match Self::find_config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Load a specific config file, falling back to defaults when it is
    /// missing or unreadable
    pub fn load_from(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(_) => return Self::default(),
        };
        match toml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Ignoring invalid config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Find config.toml: the data directory override first, then walk up the
    /// directory tree
    fn find_config_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var("PRACTICE_DATA_DIR") {
            let config_path = PathBuf::from(dir).join("config.toml");
            return config_path.exists().then_some(config_path);
        }

        let current_dir = std::env::current_dir().ok()?;
        let mut dir = current_dir.as_path();

        loop {
            let config_path = dir.join(".practice").join("config.toml");
            if config_path.exists() {
                return Some(config_path);
            }

            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }
        None
    }

    /// Default config file contents written by `practice init`
    pub fn template() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

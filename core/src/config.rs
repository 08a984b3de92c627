//! Persisted user configuration.
//!
//! Stored as JSON at `~/.portscope/config.json`. A missing file yields the
//! defaults; unknown keys are ignored.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::dashboard::{Keymap, Shortcut};
use crate::domain::{TypeClassifier, TypePreset};
use crate::error::{Error, Result};

/// Configuration data stored in JSON format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Dashboard auto-refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,

    /// How long a detection snapshot is reused, in milliseconds.
    #[serde(default = "default_freshness_window_ms")]
    pub freshness_window_ms: u64,

    /// Ask before killing a process on an unexpected port.
    #[serde(default = "default_true")]
    pub confirm_unexpected_kills: bool,

    /// Replaces the built-in classification rules when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_presets: Option<Vec<TypePreset>>,

    /// Shortcut name to key names, e.g. `"Kill": ["x", "delete"]`.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub key_bindings: HashMap<String, Vec<String>>,
}

fn default_refresh_interval() -> u64 {
    2
}

fn default_freshness_window_ms() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval: default_refresh_interval(),
            freshness_window_ms: default_freshness_window_ms(),
            confirm_unexpected_kills: true,
            type_presets: None,
            key_bindings: HashMap::new(),
        }
    }
}

impl Config {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }

    pub fn freshness_window(&self) -> Duration {
        Duration::from_millis(self.freshness_window_ms)
    }

    /// Classifier built from the configured presets, or the built-in table.
    pub fn classifier(&self) -> TypeClassifier {
        match &self.type_presets {
            Some(presets) => TypeClassifier::new(presets.clone()),
            None => TypeClassifier::default(),
        }
    }

    /// Default bindings with the configured overrides applied.
    ///
    /// An override replaces every default key of the named shortcut.
    /// Unknown shortcut names are rejected.
    pub fn keymap(&self) -> Result<Keymap> {
        let mut keymap = Keymap::default();
        let mut names: Vec<&String> = self.key_bindings.keys().collect();
        names.sort();

        for name in names {
            let shortcut: Shortcut = name.parse()?;
            keymap.rebind(shortcut, &self.key_bindings[name]);
        }

        Ok(keymap)
    }
}

/// Configuration store for reading and writing the config file.
pub struct ConfigStore {
    /// Path to the configuration file.
    config_path: PathBuf,
}

impl ConfigStore {
    /// Create a new config store with the default path.
    ///
    /// Default path: `~/.portscope/config.json`
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;

        Ok(Self {
            config_path: home.join(".portscope").join("config.json"),
        })
    }

    /// Create a config store with a custom path.
    pub fn with_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Directory holding the config file (and the dashboard log).
    pub fn config_dir(&self) -> PathBuf {
        self.config_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Load configuration from disk.
    ///
    /// Returns default config if the file doesn't exist.
    pub async fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .map_err(config_io("read"))?;

        serde_json::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
    }

    /// Write `config` through a sibling temp file renamed over the target.
    pub async fn save(&self, config: &Config) -> Result<()> {
        fs::create_dir_all(self.config_dir())
            .await
            .map_err(config_io("create the directory for"))?;

        let content = serde_json::to_string_pretty(config)?;
        let staging = self.config_path.with_extension("json.tmp");

        let mut file = fs::File::create(&staging)
            .await
            .map_err(config_io("stage"))?;
        file.write_all(content.as_bytes())
            .await
            .map_err(config_io("write"))?;
        file.sync_all().await.map_err(config_io("sync"))?;

        fs::rename(&staging, &self.config_path)
            .await
            .map_err(config_io("replace"))
    }

    /// Write the default configuration. An existing file is kept unless
    /// `overwrite` is set; returns whether anything was written.
    pub async fn init(&self, overwrite: bool) -> Result<bool> {
        if self.config_path.exists() && !overwrite {
            return Ok(false);
        }
        self.save(&Config::default()).await?;
        Ok(true)
    }
}

fn config_io(action: &'static str) -> impl Fn(std::io::Error) -> Error {
    move |e| Error::Config(format!("Failed to {} config: {}", action, e))
}

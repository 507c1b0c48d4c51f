//! Runtime configuration
//!
//! Read from `config.json` in the data directory; every field is optional.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    CONFIG_FILE, DATA_DIR_NAME, DEFAULT_HISTORY_LIMIT, DEFAULT_TIMEOUT_SECS, HOME_ENV_VAR, LOG_FILE,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Where store records and logs live; not part of the file itself
    #[serde(skip)]
    pub data_dir: PathBuf,
    pub history_limit: usize,
    /// `None` disables the executor timeout
    pub request_timeout_secs: Option<u64>,
    pub log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: default_data_dir(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            request_timeout_secs: Some(DEFAULT_TIMEOUT_SECS),
            log_file: LOG_FILE.to_string(),
        }
    }
}

impl Config {
    /// Load from the default data directory
    pub fn load() -> Result<Self> {
        Self::load_from(&default_data_dir())
    }

    /// Load `config.json` from `dir`, falling back to defaults when absent
    pub fn load_from(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        let mut config = if path.exists() {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file `{}`", path.display()))?;
            serde_json::from_str::<Config>(&raw)
                .with_context(|| format!("Failed to parse config file `{}`", path.display()))?
        } else {
            Config::default()
        };
        config.data_dir = dir.to_path_buf();
        Ok(config)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// `$JARVIS_HOME`, else `~/.jarvis`
pub fn default_data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DATA_DIR_NAME)
}

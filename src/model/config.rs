use serde::{Deserialize, Serialize};

/// Configuration from config.toml. Every field has a default, so a missing
/// or empty file is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub reset: ResetConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Document file name, relative to the data directory (or absolute)
    #[serde(default = "default_file")]
    pub file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            file: default_file(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetConfig {
    /// Backstop poll for the daily reset check
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Also wake at the next local midnight
    #[serde(default = "default_true")]
    pub midnight_timer: bool,
}

impl Default for ResetConfig {
    fn default() -> Self {
        ResetConfig {
            poll_interval_secs: default_poll_interval_secs(),
            midnight_timer: true,
        }
    }
}

/// How the `default` group looks when a document is seeded or repaired
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_group_name")]
    pub group_name: String,
    #[serde(default = "default_group_color")]
    pub group_color: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            group_name: default_group_name(),
            group_color: default_group_color(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_file() -> String {
    "tasks.json".to_string()
}

fn default_poll_interval_secs() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

fn default_group_name() -> String {
    "Daily".to_string()
}

fn default_group_color() -> String {
    "hsl(var(--primary))".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

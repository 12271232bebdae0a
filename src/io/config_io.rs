use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::Config;

const CONFIG_FILE: &str = "config.toml";

/// Written by `dl init`. Mirrors the defaults in `model::config`.
const CONFIG_TEMPLATE: &str = r#"# daylist configuration. Every setting is optional.

[storage]
# Task document, relative to this directory
file = "tasks.json"

[reset]
# How often to check whether a new day has started
poll_interval_secs = 3600
# Also wake up right after local midnight
midnight_timer = true

[defaults]
# Name and color of the group that always exists
group_name = "Daily"
group_color = "hsl(var(--primary))"

[log]
# error, warn, info, debug or trace (DAYLIST_LOG overrides)
level = "info"
"#;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse config.toml: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Where daylist keeps its files.
///
/// In order: an explicit override (the -C flag), `DAYLIST_DIR`,
/// `$XDG_DATA_HOME/daylist`, `$HOME/.local/share/daylist`.
pub fn resolve_data_dir(explicit: Option<&Path>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir.to_path_buf();
    }
    if let Ok(dir) = std::env::var("DAYLIST_DIR")
        && !dir.is_empty()
    {
        return PathBuf::from(dir);
    }
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local").join("share"))
        .join("daylist")
}

fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/"))
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

/// Read config.toml from the data dir. A missing file means defaults.
pub fn read_config(data_dir: &Path) -> Result<Config, ConfigError> {
    let path = config_path(data_dir);
    let text = match fs::read_to_string(&path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(ConfigError::ReadError { path, source: e }),
    };
    Ok(toml::from_str(&text)?)
}

/// Create the data dir and a commented config.toml. Leaves an existing
/// config alone unless `force` is set. Returns whether a file was written.
pub fn write_default_config(data_dir: &Path, force: bool) -> Result<bool, ConfigError> {
    fs::create_dir_all(data_dir)?;
    let path = config_path(data_dir);
    if path.exists() && !force {
        return Ok(false);
    }
    fs::write(&path, CONFIG_TEMPLATE)?;
    Ok(true)
}

/// Absolute path of the task document for this config.
pub fn document_path(data_dir: &Path, config: &Config) -> PathBuf {
    data_dir.join(&config.storage.file)
}

use std::env;
use std::path::{Path, PathBuf};

pub const LOG_FILE: &str = "interactions.db";
pub const CONFIG_FILE: &str = "mirror.toml";

/// `~/.mirror`, falling back to the working directory without a home.
pub fn default_data_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".mirror")
}

pub fn log_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LOG_FILE)
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILE)
}

// Markline platform paths for Linux
// Config: ~/.config/markline
// Data:   ~/.local/share/markline

use std::env;
use std::path::PathBuf;

fn home_dir() -> PathBuf {
    PathBuf::from(env::var("HOME").unwrap_or_else(|_| String::from("/tmp")))
}

/// Uses `$XDG_CONFIG_HOME/markline` if set, otherwise `~/.config/markline`.
pub fn get_config_dir() -> PathBuf {
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("markline"),
        _ => home_dir().join(".config").join("markline"),
    }
}

/// Uses `$XDG_DATA_HOME/markline` if set, otherwise `~/.local/share/markline`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("markline"),
        _ => home_dir().join(".local").join("share").join("markline"),
    }
}

// Markline platform abstraction
// Selects the per-OS config and data directories at compile time.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific configuration directory for Markline.
///
/// - **Linux**: `~/.config/markline` (or `$XDG_CONFIG_HOME/markline`)
/// - **macOS**: `~/Library/Application Support/Markline`
/// - **Windows**: `%APPDATA%/Markline`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the platform-specific data directory for Markline.
///
/// - **Linux**: `~/.local/share/markline` (or `$XDG_DATA_HOME/markline`)
/// - **macOS**: `~/Library/Application Support/Markline`
/// - **Windows**: `%APPDATA%/Markline`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

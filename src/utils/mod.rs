//! Utility module for mpv-object
//!
//! This module provides common utilities used throughout the crate:
//! - Error handling with custom error types
//! - Configuration management
//! - Media locator parsing
//! - Common helper functions

pub mod config;
pub mod error;

// Re-export commonly used items
pub use config::{Config, GeneralConfig, PlaybackConfig, ScreenshotConfig, SubtitleConfig};
pub use error::{MpvError, Result};

use std::path::Path;
use url::Url;

/// Load the layered configuration
///
/// Loads configuration from:
/// 1. Default values
/// 2. System configuration file
/// 3. User configuration file
/// 4. Environment variables
///
/// # Returns
///
/// Returns the loaded configuration or an error if loading fails
pub fn load_config() -> Result<Config> {
    Config::load()
}

/// Turn user input into a media locator
///
/// Anything with a URL scheme is taken as a URL. Everything else is a file
/// path, resolved against the working directory when relative.
///
/// # Returns
///
/// `None` for empty input or a path that cannot be expressed as a URL
pub fn parse_locator(source: &str) -> Option<Url> {
    let source = source.trim();
    if source.is_empty() {
        return None;
    }
    // A one-letter scheme is a Windows drive letter, not a URL
    if let Ok(url) = Url::parse(source) {
        if url.scheme().len() > 1 {
            return Some(url);
        }
    }
    let path = Path::new(source);
    if path.is_absolute() {
        Url::from_file_path(path).ok()
    } else {
        let cwd = std::env::current_dir().ok()?;
        Url::from_file_path(cwd.join(path)).ok()
    }
}

/// The argument `loadfile` expects: a plain path for local files, the URL
/// text otherwise
pub fn loadfile_target(url: &Url) -> String {
    if url.scheme() == "file" {
        if let Ok(path) = url.to_file_path() {
            return path.to_string_lossy().into_owned();
        }
    }
    url.as_str().to_string()
}

/// Format a duration for display
///
/// # Arguments
///
/// * `duration` - Duration to format
///
/// # Returns
///
/// Formatted string in the format "HH:MM:SS" or "MM:SS" for durations under an hour
pub fn format_duration(duration: std::time::Duration) -> String {
    let total_secs = duration.as_secs();
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Clamp a value between min and max
///
/// Unlike `Ord::clamp` this never panics; when `min > max` the result is
/// `min`.
pub fn clamp<T: PartialOrd>(value: T, min: T, max: T) -> T {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

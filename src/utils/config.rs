//! Configuration management for mpv-object
//!
//! This module handles loading and managing the player configuration
//! from config files and environment variables.

use crate::player::{CallType, LogLevel};
use crate::utils::error::{IntoMpvError, MpvError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Options applied to mpv before playback
    pub playback: PlaybackConfig,

    /// Subtitle and external file settings
    pub subtitles: SubtitleConfig,

    /// Screenshot settings
    pub screenshot: ScreenshotConfig,
}

/// General configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Filter for this crate's own logging, in env_logger syntax
    pub log_filter: String,

    /// Verbosity of mpv's log messages
    pub mpv_log_level: LogLevel,

    /// How commands and property writes reach mpv
    pub call_type: CallType,
}

/// Playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Initial volume (0 - 100)
    pub volume: i64,

    pub mute: bool,

    /// Playback speed multiplier
    pub speed: f64,

    /// Hardware decoding API, e.g. "auto-safe" or "vaapi"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hwdec: Option<String>,

    /// Precise seeking; unset keeps mpv's default
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hr_seek: Option<bool>,

    /// Resolve web URLs through youtube-dl
    pub ytdl: bool,

    pub load_scripts: bool,
    pub deinterlace: bool,
    pub audio_exclusive: bool,

    /// mpv profile applied at startup
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// Subtitle configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubtitleConfig {
    /// External subtitle loading: "no", "exact", "fuzzy" or "all"
    pub sub_auto: String,

    /// Code page for text subtitles
    pub sub_codepage: String,

    /// External audio loading, same values as `sub_auto`
    pub audio_file_auto: String,
}

/// Screenshot configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    /// Image format: jpg, png, webp, ...
    pub format: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    /// File name template
    pub template: String,

    /// PNG compression (0 - 9)
    pub png_compression: i64,

    /// JPEG quality (0 - 100)
    pub jpeg_quality: i64,

    pub tag_colorspace: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            mpv_log_level: LogLevel::Off,
            call_type: CallType::Synchronous,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            volume: 100,
            mute: false,
            speed: 1.0,
            hwdec: None,
            hr_seek: None,
            ytdl: true,
            load_scripts: true,
            deinterlace: false,
            audio_exclusive: false,
            profile: None,
        }
    }
}

impl Default for SubtitleConfig {
    fn default() -> Self {
        Self {
            sub_auto: "exact".to_string(),
            sub_codepage: "auto".to_string(),
            audio_file_auto: "no".to_string(),
        }
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            format: "jpg".to_string(),
            directory: None,
            template: "mpv-shot%n".to_string(),
            png_compression: 7,
            jpeg_quality: 90,
            tag_colorspace: false,
        }
    }
}

const LOG_FILTER_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];
const SCREENSHOT_FORMATS: [&str; 6] = ["jpg", "jpeg", "png", "webp", "jxl", "avif"];
const AUTO_LOAD_MODES: [&str; 4] = ["no", "exact", "fuzzy", "all"];

impl Config {
    /// Load configuration from various sources
    ///
    /// Configuration is loaded in the following order (later sources override earlier):
    /// 1. Default values
    /// 2. System config file (/etc/mpv-object/config.toml on Linux)
    /// 3. User config file (~/.config/mpv-object/config.toml on Linux)
    /// 4. Environment variables (MPV_OBJECT_* prefix)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        for path in [Self::system_config_path(), Self::user_config_path()]
            .into_iter()
            .flatten()
        {
            if path.exists() {
                config.merge_from_file(&path)?;
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    /// Load defaults overlaid with a single file
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = Self::default();
        config.merge_from_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the user config file
    pub fn save(&self) -> Result<()> {
        let path = Self::user_config_path()
            .ok_or_else(|| MpvError::Config("Cannot determine user config path".to_string()))?;
        self.save_to(&path)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).config_err("Failed to create config directory")?;
        }

        let toml = toml::to_string_pretty(self).config_err("Failed to serialize config")?;
        std::fs::write(path, toml).config_err("Failed to write config file")?;

        Ok(())
    }

    /// Overlay the keys present in a TOML file onto this configuration
    fn merge_from_file(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)?;
        self.merge_from_str(&contents)
    }

    fn merge_from_str(&mut self, contents: &str) -> Result<()> {
        let overlay: toml::Table =
            toml::from_str(contents).config_err("Failed to parse config file")?;

        let mut base = match toml::Value::try_from(&*self).config_err("Failed to serialize config")? {
            toml::Value::Table(table) => table,
            _ => return Err(MpvError::Internal("config did not serialize to a table".to_string())),
        };
        merge_tables(&mut base, overlay);

        *self = toml::Value::Table(base)
            .try_into()
            .config_err("Invalid config value")?;
        Ok(())
    }

    /// Apply environment variable overrides
    ///
    /// `lookup` maps a variable name to its value.
    fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(filter) = lookup("MPV_OBJECT_LOG") {
            self.general.log_filter = filter;
        }

        if let Some(level) = lookup("MPV_OBJECT_MPV_LOG_LEVEL") {
            self.general.mpv_log_level = LogLevel::from_name(&level)
                .ok_or_else(|| MpvError::Config("Invalid MPV_OBJECT_MPV_LOG_LEVEL".to_string()))?;
        }

        if let Some(call_type) = lookup("MPV_OBJECT_CALL_TYPE") {
            self.general.call_type = match call_type.to_ascii_lowercase().as_str() {
                "sync" | "synchronous" => CallType::Synchronous,
                "async" | "asynchronous" => CallType::Asynchronous,
                _ => return Err(MpvError::Config("Invalid MPV_OBJECT_CALL_TYPE".to_string())),
            };
        }

        if let Some(volume) = lookup("MPV_OBJECT_VOLUME") {
            self.playback.volume = volume
                .trim()
                .parse()
                .map_err(|_| MpvError::Config("Invalid MPV_OBJECT_VOLUME".to_string()))?;
        }

        if let Some(hwdec) = lookup("MPV_OBJECT_HWDEC") {
            self.playback.hwdec = Some(hwdec);
        }

        if let Some(directory) = lookup("MPV_OBJECT_SCREENSHOT_DIR") {
            self.screenshot.directory = Some(PathBuf::from(directory));
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        for directive in self.general.log_filter.split(',').filter(|d| !d.trim().is_empty()) {
            let level = directive.rsplit('=').next().unwrap_or(directive).trim();
            // A bare module name is a valid directive too
            let is_module = !directive.contains('=') && !LOG_FILTER_LEVELS.contains(&level);
            if !is_module && !LOG_FILTER_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
                return Err(MpvError::Config(format!(
                    "Invalid log level '{}', must be one of: {:?}",
                    level, LOG_FILTER_LEVELS
                )));
            }
        }

        if !(0..=100).contains(&self.playback.volume) {
            return Err(MpvError::Config("Volume must be between 0 and 100".to_string()));
        }

        if !(self.playback.speed > 0.0 && self.playback.speed <= 100.0) {
            return Err(MpvError::Config("Speed must be in (0, 100]".to_string()));
        }

        if !(0..=9).contains(&self.screenshot.png_compression) {
            return Err(MpvError::Config("PNG compression must be between 0 and 9".to_string()));
        }

        if !(0..=100).contains(&self.screenshot.jpeg_quality) {
            return Err(MpvError::Config("JPEG quality must be between 0 and 100".to_string()));
        }

        if !SCREENSHOT_FORMATS.contains(&self.screenshot.format.as_str()) {
            return Err(MpvError::Config(format!(
                "Invalid screenshot format '{}', must be one of: {:?}",
                self.screenshot.format, SCREENSHOT_FORMATS
            )));
        }

        for (key, mode) in [
            ("sub_auto", &self.subtitles.sub_auto),
            ("audio_file_auto", &self.subtitles.audio_file_auto),
        ] {
            if !AUTO_LOAD_MODES.contains(&mode.as_str()) {
                return Err(MpvError::Config(format!("Invalid {} '{}'", key, mode)));
            }
        }

        Ok(())
    }

    /// Get system config file path
    fn system_config_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        return Some(PathBuf::from("/etc/mpv-object/config.toml"));

        #[cfg(target_os = "windows")]
        return std::env::var("PROGRAMDATA")
            .ok()
            .map(|p| PathBuf::from(p).join("mpv-object").join("config.toml"));

        #[cfg(target_os = "macos")]
        return Some(PathBuf::from(
            "/Library/Application Support/mpv-object/config.toml",
        ));

        #[allow(unreachable_code)]
        None
    }

    /// Get user config file path
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("mpv-object").join("config.toml"))
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, other values replace
fn merge_tables(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

//! Player facade module for mpv-object
//!
//! This module exposes libmpv's playback state and controls as typed
//! accessors, imperative operations and change notifications. All state
//! lives on the owning thread; native wakeups reach it through the task
//! queue in [`dispatch`].

mod dispatch;
mod events;
mod object;
mod properties;
mod tracks;

pub use dispatch::{HostWaker, Notifier, Task, TaskQueue};
pub use object::{MpvObject, SignalSubscription};
pub use properties::{observed_properties, signal_for_property, OBSERVED_PROPERTIES};
pub use tracks::{
    AudioDevice, AudioTrackDetails, Chapter, MediaTracks, Metadata, TrackInfo, TrackKind,
    VideoTrackDetails,
};

use crate::mpv::NativeLogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of the current file, driven by native file events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MediaStatus {
    /// Nothing loaded yet, or stalled
    #[default]
    Unknown,
    Loading,
    Loaded,
    Buffering,
    Buffered,
    End,
}

impl MediaStatus {
    /// Whether a file is open and its headers were read
    pub fn is_loaded(self) -> bool {
        matches!(
            self,
            MediaStatus::Loaded | MediaStatus::Buffering | MediaStatus::Buffered
        )
    }
}

/// Playback state as seen by the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    /// Derive the state from mpv's `idle-active` and `pause` flags.
    ///
    /// Stopped wins over Paused, which wins over Playing.
    pub fn derive(idle: bool, paused: bool) -> Self {
        if idle {
            PlaybackState::Stopped
        } else if paused {
            PlaybackState::Paused
        } else {
            PlaybackState::Playing
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// How commands and property writes are dispatched to mpv
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallType {
    /// Block until mpv has applied the request
    #[default]
    Synchronous,
    /// Queue the request; replies are discarded
    Asynchronous,
}

/// Verbosity of mpv's own logging as exposed to the UI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Debug,
    Warning,
    Critical,
    Fatal,
    Info,
}

impl LogLevel {
    /// Native tier for this level. Debug maps to `v` to keep the volume sane.
    pub fn as_native(self) -> NativeLogLevel {
        match self {
            LogLevel::Off => NativeLogLevel::None,
            LogLevel::Debug => NativeLogLevel::V,
            LogLevel::Warning => NativeLogLevel::Warn,
            LogLevel::Critical => NativeLogLevel::Error,
            LogLevel::Fatal => NativeLogLevel::Fatal,
            LogLevel::Info => NativeLogLevel::Info,
        }
    }

    /// Read the level back from an `msg-level` value such as `all=warn`.
    ///
    /// Only the last `=` segment counts. Unknown names read as Debug.
    pub fn from_msg_level(msg_level: &str) -> Self {
        let level = msg_level
            .rsplit_once('=')
            .map_or(msg_level, |(_, level)| level)
            .trim();
        match level {
            "" | "no" | "off" => LogLevel::Off,
            "v" | "debug" | "trace" => LogLevel::Debug,
            "warn" => LogLevel::Warning,
            "error" => LogLevel::Critical,
            "fatal" => LogLevel::Fatal,
            "info" => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "off" | "no" => Some(LogLevel::Off),
            "debug" | "v" => Some(LogLevel::Debug),
            "warning" | "warn" => Some(LogLevel::Warning),
            "critical" | "error" => Some(LogLevel::Critical),
            "fatal" => Some(LogLevel::Fatal),
            "info" => Some(LogLevel::Info),
            _ => None,
        }
    }
}

/// Seek target interpretation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekMode {
    /// Offset in seconds from the current position
    Relative,
    /// Position in seconds
    Absolute,
    /// Position in percent of the duration
    AbsolutePercent,
}

impl SeekMode {
    /// Flag passed to mpv's `seek` command
    pub fn as_str(self) -> &'static str {
        match self {
            SeekMode::Relative => "relative",
            SeekMode::Absolute => "absolute",
            SeekMode::AbsolutePercent => "absolute-percent",
        }
    }
}

/// Displayed video size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct VideoSize {
    pub width: i64,
    pub height: i64,
}

impl VideoSize {
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Swap the dimensions for a quarter-turn rotation
    pub fn rotated(self, degrees: i64) -> Self {
        if degrees == 90 || degrees == 270 {
            Self {
                width: self.height,
                height: self.width,
            }
        } else {
            self
        }
    }
}

/// Change notifications emitted by [`MpvObject`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signal {
    SourceChanged,
    MediaStatusChanged,
    PlaybackStateChanged,
    LogLevelChanged,
    CallTypeChanged,
    Playing,
    Paused,
    Stopped,
    Loaded,
    VideoSizeChanged,
    /// The render context exists and frames can be drawn
    InitFinished,
    /// A new frame should be rendered
    UpdateRequested,
    /// mpv is shutting down; further requests fail
    Shutdown,

    DurationChanged,
    PositionChanged,
    VolumeChanged,
    MuteChanged,
    SeekableChanged,
    MediaTitleChanged,
    HwdecChanged,
    VidChanged,
    AidChanged,
    SidChanged,
    VideoRotateChanged,
    VideoAspectChanged,
    SpeedChanged,
    DeinterlaceChanged,
    AudioExclusiveChanged,
    AudioFileAutoChanged,
    SubAutoChanged,
    SubCodepageChanged,
    VoChanged,
    AoChanged,
    ScreenshotFormatChanged,
    ScreenshotPngCompressionChanged,
    ScreenshotTemplateChanged,
    ScreenshotDirectoryChanged,
    ScreenshotTagColorspaceChanged,
    ScreenshotJpegQualityChanged,
    ProfileChanged,
    HrSeekChanged,
    YtdlChanged,
    LoadScriptsChanged,
    PathChanged,
    FileNameChanged,
    FileFormatChanged,
    FileSizeChanged,
    VideoBitrateChanged,
    AudioBitrateChanged,
    AudioDeviceListChanged,
    VideoFormatChanged,
    MediaTracksChanged,
    ChaptersChanged,
    MetadataChanged,
    AvsyncChanged,
    PercentPosChanged,
    EstimatedVfFpsChanged,
}

//! Events delivered by libmpv's client event queue

use crate::mpv::MpvValue;
use std::fmt;

/// Verbosity tiers of libmpv's log messages (`mpv_log_level`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NativeLogLevel {
    None,
    Fatal,
    Error,
    Warn,
    Info,
    /// Verbose; quieter than debug
    V,
    Debug,
    Trace,
}

impl NativeLogLevel {
    /// Name as accepted by `mpv_request_log_messages` and `--msg-level`
    pub fn as_str(self) -> &'static str {
        match self {
            NativeLogLevel::None => "no",
            NativeLogLevel::Fatal => "fatal",
            NativeLogLevel::Error => "error",
            NativeLogLevel::Warn => "warn",
            NativeLogLevel::Info => "info",
            NativeLogLevel::V => "v",
            NativeLogLevel::Debug => "debug",
            NativeLogLevel::Trace => "trace",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "no" | "off" => Some(NativeLogLevel::None),
            "fatal" => Some(NativeLogLevel::Fatal),
            "error" => Some(NativeLogLevel::Error),
            "warn" => Some(NativeLogLevel::Warn),
            "info" => Some(NativeLogLevel::Info),
            "v" => Some(NativeLogLevel::V),
            "debug" => Some(NativeLogLevel::Debug),
            "trace" => Some(NativeLogLevel::Trace),
            _ => None,
        }
    }

    /// Numeric value used by the C API
    pub fn as_raw(self) -> i32 {
        match self {
            NativeLogLevel::None => 0,
            NativeLogLevel::Fatal => 10,
            NativeLogLevel::Error => 20,
            NativeLogLevel::Warn => 30,
            NativeLogLevel::Info => 40,
            NativeLogLevel::V => 50,
            NativeLogLevel::Debug => 60,
            NativeLogLevel::Trace => 70,
        }
    }

    pub fn from_raw(raw: i32) -> Self {
        match raw {
            i32::MIN..=0 => NativeLogLevel::None,
            1..=10 => NativeLogLevel::Fatal,
            11..=20 => NativeLogLevel::Error,
            21..=30 => NativeLogLevel::Warn,
            31..=40 => NativeLogLevel::Info,
            41..=50 => NativeLogLevel::V,
            51..=60 => NativeLogLevel::Debug,
            _ => NativeLogLevel::Trace,
        }
    }
}

impl fmt::Display for NativeLogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message from mpv's logging system
#[derive(Debug, Clone, PartialEq)]
pub struct LogMessage {
    /// Module prefix, e.g. "cplayer" or "vo/gpu"
    pub prefix: String,
    pub level: NativeLogLevel,
    /// Message text, usually terminated by a newline
    pub text: String,
}

/// Why a file stopped playing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndFileReason {
    Eof,
    Stop,
    Quit,
    Error,
    Redirect,
    Unknown,
}

impl EndFileReason {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => EndFileReason::Eof,
            2 => EndFileReason::Stop,
            3 => EndFileReason::Quit,
            4 => EndFileReason::Error,
            5 => EndFileReason::Redirect,
            _ => EndFileReason::Unknown,
        }
    }
}

/// Events drained from the native queue
#[derive(Debug, Clone, PartialEq)]
pub enum MpvEvent {
    /// The queue is empty (or the wait timed out)
    None,
    Shutdown,
    LogMessage(LogMessage),
    GetPropertyReply {
        reply_userdata: u64,
        error: i32,
        name: String,
        value: MpvValue,
    },
    SetPropertyReply {
        reply_userdata: u64,
        error: i32,
    },
    CommandReply {
        reply_userdata: u64,
        error: i32,
        result: MpvValue,
    },
    StartFile {
        playlist_entry_id: i64,
    },
    EndFile {
        reason: EndFileReason,
        error: i32,
    },
    FileLoaded,
    Idle,
    ClientMessage(Vec<String>),
    VideoReconfig,
    AudioReconfig,
    Seek,
    PlaybackRestart,
    PropertyChange {
        reply_userdata: u64,
        name: String,
        value: MpvValue,
    },
    QueueOverflow,
    Hook {
        name: String,
        id: u64,
    },
    /// An event id this crate does not know
    Unknown(i32),
}

impl MpvEvent {
    /// Event name as printed by `mpv_event_name`
    pub fn name(&self) -> &'static str {
        match self {
            MpvEvent::None => "none",
            MpvEvent::Shutdown => "shutdown",
            MpvEvent::LogMessage(_) => "log-message",
            MpvEvent::GetPropertyReply { .. } => "get-property-reply",
            MpvEvent::SetPropertyReply { .. } => "set-property-reply",
            MpvEvent::CommandReply { .. } => "command-reply",
            MpvEvent::StartFile { .. } => "start-file",
            MpvEvent::EndFile { .. } => "end-file",
            MpvEvent::FileLoaded => "file-loaded",
            MpvEvent::Idle => "idle",
            MpvEvent::ClientMessage(_) => "client-message",
            MpvEvent::VideoReconfig => "video-reconfig",
            MpvEvent::AudioReconfig => "audio-reconfig",
            MpvEvent::Seek => "seek",
            MpvEvent::PlaybackRestart => "playback-restart",
            MpvEvent::PropertyChange { .. } => "property-change",
            MpvEvent::QueueOverflow => "event-queue-overflow",
            MpvEvent::Hook { .. } => "hook",
            MpvEvent::Unknown(_) => "unknown",
        }
    }

    /// Events too frequent to be worth a debug line each
    pub fn is_quiet(&self) -> bool {
        matches!(
            self,
            MpvEvent::LogMessage(_)
                | MpvEvent::GetPropertyReply { .. }
                | MpvEvent::SetPropertyReply { .. }
                | MpvEvent::CommandReply { .. }
                | MpvEvent::PropertyChange { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_names() {
        for level in [
            NativeLogLevel::None,
            NativeLogLevel::Fatal,
            NativeLogLevel::Error,
            NativeLogLevel::Warn,
            NativeLogLevel::Info,
            NativeLogLevel::V,
            NativeLogLevel::Debug,
            NativeLogLevel::Trace,
        ] {
            assert_eq!(NativeLogLevel::from_name(level.as_str()), Some(level));
            assert_eq!(NativeLogLevel::from_raw(level.as_raw()), level);
        }
        assert_eq!(NativeLogLevel::from_name("off"), Some(NativeLogLevel::None));
        assert_eq!(NativeLogLevel::from_name("loud"), None);
    }

    #[test]
    fn test_log_level_order() {
        assert!(NativeLogLevel::V < NativeLogLevel::Debug);
        assert!(NativeLogLevel::Warn < NativeLogLevel::Info);
    }

    #[test]
    fn test_end_file_reason() {
        assert_eq!(EndFileReason::from_raw(0), EndFileReason::Eof);
        assert_eq!(EndFileReason::from_raw(4), EndFileReason::Error);
        assert_eq!(EndFileReason::from_raw(1), EndFileReason::Unknown);
    }

    #[test]
    fn test_quiet_events() {
        assert!(MpvEvent::CommandReply {
            reply_userdata: 0,
            error: 0,
            result: MpvValue::None
        }
        .is_quiet());
        assert!(!MpvEvent::FileLoaded.is_quiet());
        assert_eq!(MpvEvent::QueueOverflow.name(), "event-queue-overflow");
    }
}

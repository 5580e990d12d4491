//! Properties the facade observes and the notifications they drive

use super::Signal;
use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Every property observed at construction, with the notification a change
/// raises. Entries without a notification are handled by the event drain.
pub const OBSERVED_PROPERTIES: &[(&str, Option<Signal>)] = &[
    ("idle-active", Some(Signal::PlaybackStateChanged)),
    ("pause", Some(Signal::PlaybackStateChanged)),
    ("paused-for-cache", None),
    ("duration", Some(Signal::DurationChanged)),
    ("time-pos", Some(Signal::PositionChanged)),
    ("percent-pos", Some(Signal::PercentPosChanged)),
    ("volume", Some(Signal::VolumeChanged)),
    ("mute", Some(Signal::MuteChanged)),
    ("seekable", Some(Signal::SeekableChanged)),
    ("media-title", Some(Signal::MediaTitleChanged)),
    ("hwdec-current", Some(Signal::HwdecChanged)),
    ("vid", Some(Signal::VidChanged)),
    ("aid", Some(Signal::AidChanged)),
    ("sid", Some(Signal::SidChanged)),
    ("video-out-params/rotate", Some(Signal::VideoRotateChanged)),
    ("video-out-params/aspect", Some(Signal::VideoAspectChanged)),
    ("speed", Some(Signal::SpeedChanged)),
    ("deinterlace", Some(Signal::DeinterlaceChanged)),
    ("audio-exclusive", Some(Signal::AudioExclusiveChanged)),
    ("audio-file-auto", Some(Signal::AudioFileAutoChanged)),
    ("sub-auto", Some(Signal::SubAutoChanged)),
    ("sub-codepage", Some(Signal::SubCodepageChanged)),
    ("vo", Some(Signal::VoChanged)),
    ("ao", Some(Signal::AoChanged)),
    ("screenshot-format", Some(Signal::ScreenshotFormatChanged)),
    ("screenshot-png-compression", Some(Signal::ScreenshotPngCompressionChanged)),
    ("screenshot-template", Some(Signal::ScreenshotTemplateChanged)),
    ("screenshot-directory", Some(Signal::ScreenshotDirectoryChanged)),
    ("screenshot-tag-colorspace", Some(Signal::ScreenshotTagColorspaceChanged)),
    ("screenshot-jpeg-quality", Some(Signal::ScreenshotJpegQualityChanged)),
    ("profile", Some(Signal::ProfileChanged)),
    ("hr-seek", Some(Signal::HrSeekChanged)),
    ("ytdl", Some(Signal::YtdlChanged)),
    ("load-scripts", Some(Signal::LoadScriptsChanged)),
    ("path", Some(Signal::PathChanged)),
    ("filename", Some(Signal::FileNameChanged)),
    ("file-format", Some(Signal::FileFormatChanged)),
    ("file-size", Some(Signal::FileSizeChanged)),
    ("video-bitrate", Some(Signal::VideoBitrateChanged)),
    ("audio-bitrate", Some(Signal::AudioBitrateChanged)),
    ("audio-device-list", Some(Signal::AudioDeviceListChanged)),
    ("video-format", Some(Signal::VideoFormatChanged)),
    ("track-list", Some(Signal::MediaTracksChanged)),
    ("chapter-list", Some(Signal::ChaptersChanged)),
    ("metadata", Some(Signal::MetadataChanged)),
    ("avsync", Some(Signal::AvsyncChanged)),
    ("estimated-vf-fps", Some(Signal::EstimatedVfFpsChanged)),
];

static SIGNALS: Lazy<HashMap<&'static str, Option<Signal>>> =
    Lazy::new(|| OBSERVED_PROPERTIES.iter().copied().collect());

/// Properties that change many times per second; their changes are not logged
static LOG_BLACKLIST: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "time-pos",
        "percent-pos",
        "avsync",
        "estimated-vf-fps",
        "video-bitrate",
        "audio-bitrate",
    ]
    .into_iter()
    .collect()
});

/// Names of all observed properties
pub fn observed_properties() -> impl Iterator<Item = &'static str> {
    OBSERVED_PROPERTIES.iter().map(|(name, _)| *name)
}

/// Notification for a change of `name`.
///
/// `None` for unobserved properties and for observed ones that raise
/// nothing directly.
pub fn signal_for_property(name: &str) -> Option<Signal> {
    SIGNALS.get(name).copied().flatten()
}

pub(crate) fn is_observed(name: &str) -> bool {
    SIGNALS.contains_key(name)
}

pub(crate) fn is_log_blacklisted(name: &str) -> bool {
    LOG_BLACKLIST.contains(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_has_unique_names() {
        let names: HashSet<_> = observed_properties().collect();
        assert_eq!(names.len(), OBSERVED_PROPERTIES.len());
    }

    #[test]
    fn test_signal_lookup() {
        assert_eq!(signal_for_property("volume"), Some(Signal::VolumeChanged));
        assert_eq!(signal_for_property("idle-active"), Some(Signal::PlaybackStateChanged));
        assert_eq!(signal_for_property("paused-for-cache"), None);
        assert!(is_observed("paused-for-cache"));
        assert_eq!(signal_for_property("msg-level"), None);
        assert!(!is_observed("msg-level"));
    }

    #[test]
    fn test_blacklist() {
        assert!(is_log_blacklisted("time-pos"));
        assert!(!is_log_blacklisted("volume"));
        // Every blacklisted name is an observed property
        assert!(LOG_BLACKLIST.iter().all(|name| is_observed(name)));
    }
}

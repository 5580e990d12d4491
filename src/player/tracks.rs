//! Snapshots of mpv's list properties
//!
//! `track-list`, `chapter-list`, `audio-device-list` and `metadata` come back
//! as node trees. These types project them into plain structures for the UI.
//! They are rebuilt on every access and never cached.

use crate::mpv::MpvValue;
use serde::Serialize;
use std::collections::BTreeMap;

/// Tag values keyed by tag name
pub type Metadata = BTreeMap<String, MpvValue>;

/// Track type as reported in `track-list`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Video,
    Audio,
    Sub,
}

impl TrackKind {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "video" => Some(TrackKind::Video),
            "audio" => Some(TrackKind::Audio),
            "sub" => Some(TrackKind::Sub),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct VideoTrackDetails {
    pub albumart: bool,
    pub demux_w: i64,
    pub demux_h: i64,
    pub demux_fps: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AudioTrackDetails {
    pub demux_channel_count: i64,
    pub demux_channels: String,
    pub demux_samplerate: i64,
}

/// One entry of `track-list`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TrackInfo {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: TrackKind,
    pub src_id: i64,
    /// Track title, falling back to the language or a placeholder
    pub title: String,
    pub lang: String,
    pub default: bool,
    pub forced: bool,
    pub codec: String,
    pub external: bool,
    pub external_filename: String,
    pub selected: bool,
    pub decoder_desc: String,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub video: Option<VideoTrackDetails>,
    #[serde(flatten, skip_serializing_if = "Option::is_none")]
    pub audio: Option<AudioTrackDetails>,
}

impl TrackInfo {
    /// Project one `track-list` entry. Entries of other types are skipped.
    pub fn from_node(node: &MpvValue) -> Option<Self> {
        let kind = TrackKind::from_name(&node.get("type").to_text())?;
        let lang = node.get("lang").to_text();
        let external = node.get("external").to_bool();

        let video = (kind == TrackKind::Video).then(|| VideoTrackDetails {
            albumart: node.get("albumart").to_bool(),
            demux_w: node.get("demux-w").to_i64(),
            demux_h: node.get("demux-h").to_i64(),
            demux_fps: node.get("demux-fps").to_f64(),
        });
        let audio = (kind == TrackKind::Audio).then(|| AudioTrackDetails {
            demux_channel_count: node.get("demux-channel-count").to_i64(),
            demux_channels: node.get("demux-channels").to_text(),
            demux_samplerate: node.get("demux-samplerate").to_i64(),
        });

        Some(Self {
            id: node.get("id").to_i64(),
            kind,
            src_id: node.get("src-id").to_i64(),
            title: display_title(&node.get("title").to_text(), &lang, external),
            lang,
            default: node.get("default").to_bool(),
            forced: node.get("forced").to_bool(),
            codec: node.get("codec").to_text(),
            external,
            external_filename: node.get("external-filename").to_text(),
            selected: node.get("selected").to_bool(),
            decoder_desc: node.get("decoder-desc").to_text(),
            video,
            audio,
        })
    }
}

fn display_title(title: &str, lang: &str, external: bool) -> String {
    if !title.is_empty() {
        title.to_string()
    } else if !lang.is_empty() && lang != "und" {
        lang.to_string()
    } else if external {
        "[untitled]".to_string()
    } else {
        "[internal]".to_string()
    }
}

/// Tracks of the current file, split by type
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct MediaTracks {
    pub video_channels: Vec<TrackInfo>,
    pub audio_tracks: Vec<TrackInfo>,
    pub subtitle_streams: Vec<TrackInfo>,
}

impl MediaTracks {
    pub fn from_track_list(list: &MpvValue) -> Self {
        let mut tracks = Self::default();
        for track in list.as_list().iter().filter_map(TrackInfo::from_node) {
            match track.kind {
                TrackKind::Video => tracks.video_channels.push(track),
                TrackKind::Audio => tracks.audio_tracks.push(track),
                TrackKind::Sub => tracks.subtitle_streams.push(track),
            }
        }
        tracks
    }

    pub fn is_empty(&self) -> bool {
        self.video_channels.is_empty()
            && self.audio_tracks.is_empty()
            && self.subtitle_streams.is_empty()
    }

    /// The selected track of each type, if any
    pub fn selected(&self, kind: TrackKind) -> Option<&TrackInfo> {
        let tracks = match kind {
            TrackKind::Video => &self.video_channels,
            TrackKind::Audio => &self.audio_tracks,
            TrackKind::Sub => &self.subtitle_streams,
        };
        tracks.iter().find(|track| track.selected)
    }
}

/// One entry of `chapter-list`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Chapter {
    pub title: String,
    /// Start time in seconds
    pub time: f64,
}

impl Chapter {
    pub fn list_from(list: &MpvValue) -> Vec<Self> {
        list.as_list()
            .iter()
            .map(|chapter| Chapter {
                title: chapter.get("title").to_text(),
                time: chapter.get("time").to_f64(),
            })
            .collect()
    }
}

/// One entry of `audio-device-list`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AudioDevice {
    pub name: String,
    pub description: String,
}

impl AudioDevice {
    pub fn list_from(list: &MpvValue) -> Vec<Self> {
        list.as_list()
            .iter()
            .map(|device| AudioDevice {
                name: device.get("name").to_text(),
                description: device.get("description").to_text(),
            })
            .collect()
    }
}

pub(crate) fn metadata_from(value: &MpvValue) -> Metadata {
    value.as_map().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpv::map;

    fn sample_track_list() -> MpvValue {
        MpvValue::List(vec![
            map([
                ("id", MpvValue::Int64(1)),
                ("type", "video".into()),
                ("src-id", MpvValue::Int64(0)),
                ("codec", "h264".into()),
                ("selected", true.into()),
                ("demux-w", MpvValue::Int64(1920)),
                ("demux-h", MpvValue::Int64(1080)),
                ("demux-fps", MpvValue::Double(23.976)),
            ]),
            map([
                ("id", MpvValue::Int64(1)),
                ("type", "audio".into()),
                ("lang", "eng".into()),
                ("demux-channel-count", MpvValue::Int64(6)),
                ("demux-channels", "5.1".into()),
                ("demux-samplerate", MpvValue::Int64(48000)),
            ]),
            map([
                ("id", MpvValue::Int64(1)),
                ("type", "sub".into()),
                ("lang", "und".into()),
                ("external", true.into()),
                ("external-filename", "/tmp/movie.srt".into()),
            ]),
            map([("id", MpvValue::Int64(9)), ("type", "attachment".into())]),
        ])
    }

    #[test]
    fn test_track_projection() {
        let tracks = MediaTracks::from_track_list(&sample_track_list());
        assert_eq!(tracks.video_channels.len(), 1);
        assert_eq!(tracks.audio_tracks.len(), 1);
        assert_eq!(tracks.subtitle_streams.len(), 1);

        let video = &tracks.video_channels[0];
        assert_eq!(video.title, "[internal]");
        let details = video.video.as_ref().unwrap();
        assert_eq!(details.demux_w, 1920);
        assert!(video.audio.is_none());

        let audio = &tracks.audio_tracks[0];
        assert_eq!(audio.title, "eng");
        assert_eq!(audio.audio.as_ref().unwrap().demux_channels, "5.1");

        let sub = &tracks.subtitle_streams[0];
        assert_eq!(sub.title, "[untitled]");
        assert_eq!(sub.external_filename, "/tmp/movie.srt");

        assert_eq!(tracks.selected(TrackKind::Video).map(|t| t.id), Some(1));
        assert!(tracks.selected(TrackKind::Audio).is_none());
    }

    #[test]
    fn test_title_fallback() {
        assert_eq!(display_title("Commentary", "eng", false), "Commentary");
        assert_eq!(display_title("", "jpn", true), "jpn");
        assert_eq!(display_title("", "und", false), "[internal]");
        assert_eq!(display_title("", "", true), "[untitled]");
    }

    #[test]
    fn test_non_list_is_empty() {
        assert!(MediaTracks::from_track_list(&MpvValue::None).is_empty());
        assert!(Chapter::list_from(&MpvValue::from("junk")).is_empty());
        assert!(metadata_from(&MpvValue::None).is_empty());
    }

    #[test]
    fn test_chapters_and_devices() {
        let chapters = Chapter::list_from(&MpvValue::List(vec![
            map([("title", MpvValue::from("Intro")), ("time", MpvValue::Double(0.0))]),
            map([("title", MpvValue::from("Part 1")), ("time", MpvValue::Double(95.5))]),
        ]));
        assert_eq!(chapters[1].title, "Part 1");
        assert_eq!(chapters[1].time, 95.5);

        let devices = AudioDevice::list_from(&MpvValue::List(vec![map([
            ("name", "auto"),
            ("description", "Autoselect device"),
        ])]));
        assert_eq!(devices[0].name, "auto");
    }

    #[test]
    fn test_track_serialization() {
        let tracks = MediaTracks::from_track_list(&sample_track_list());
        let json = serde_json::to_value(&tracks.audio_tracks[0]).unwrap();
        assert_eq!(json["type"], "audio");
        assert_eq!(json["demux-samplerate"], 48000);
        assert!(json.get("demux-w").is_none());

        let json = serde_json::to_value(&tracks.subtitle_streams[0]).unwrap();
        assert_eq!(json["external-filename"], "/tmp/movie.srt");
    }
}

//! The control facade over a libmpv core
//!
//! [`MpvObject`] owns the native handle together with the task queue of the
//! owning thread. Getters translate mpv's loosely typed properties into
//! typed values with defaults and clamping; setters and operations validate
//! input, skip redundant writes and report success as a plain `bool`.

use super::dispatch::{Notifier, Task, TaskQueue};
use super::properties::observed_properties;
use super::tracks::{metadata_from, AudioDevice, Chapter, MediaTracks, Metadata};
use super::{CallType, LogLevel, MediaStatus, PlaybackState, SeekMode, Signal, VideoSize};
use crate::mpv::{MpvHandle, MpvValue, NativeLogLevel};
use crate::render::{GraphicsContext, MpvRenderer};
use crate::utils::config::Config;
use crate::utils::error::Result;
use crate::utils::{clamp, loadfile_target, parse_locator};
use log::{debug, info, trace, warn};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::{Arc, Weak};
use std::time::Duration;
use url::Url;

/// Aspect ratio reported while nothing is loaded
const DEFAULT_ASPECT: f64 = 1.7777;

/// Built-in input handling turned off at construction; the host owns input
const INPUT_OPTIONS: [&str; 4] = [
    "input-default-bindings",
    "input-vo-keyboard",
    "input-cursor",
    "cursor-autohide",
];

type SignalCallback = Arc<dyn Fn(Signal) + Send + Sync + 'static>;

#[derive(Default)]
struct Subscribers {
    next_id: u64,
    entries: Vec<(u64, SignalCallback)>,
}

/// Keeps a signal callback registered; dropping it unsubscribes
pub struct SignalSubscription {
    id: u64,
    subscribers: Weak<RwLock<Subscribers>>,
}

impl Drop for SignalSubscription {
    fn drop(&mut self) {
        if let Some(subscribers) = self.subscribers.upgrade() {
            subscribers.write().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

/// Typed, reactive view of one mpv core
///
/// Lives on the owning thread. Native wakeups are queued on the object's
/// [`TaskQueue`] and take effect when the host calls
/// [`MpvObject::process_pending`].
pub struct MpvObject {
    pub(super) handle: Arc<dyn MpvHandle>,
    tasks: TaskQueue,
    pub(super) current_source: Option<Url>,
    pub(super) media_status: MediaStatus,
    call_type: CallType,
    pub(super) shutdown: bool,
    subscribers: Arc<RwLock<Subscribers>>,
}

impl MpvObject {
    /// Wrap a freshly created core and initialize it
    ///
    /// Disables mpv's own input handling, observes every property in
    /// [`super::OBSERVED_PROPERTIES`], installs the wakeup callback and
    /// finally initializes the core.
    ///
    /// # Arguments
    ///
    /// * `handle` - A created but not yet initialized core
    ///
    /// # Returns
    ///
    /// Returns the facade or the initialization error
    pub fn new(handle: Arc<dyn MpvHandle>) -> Result<Self> {
        let tasks = TaskQueue::new();
        let object = Self {
            handle,
            tasks,
            current_source: None,
            media_status: MediaStatus::Unknown,
            call_type: CallType::Synchronous,
            shutdown: false,
            subscribers: Arc::new(RwLock::new(Subscribers::default())),
        };

        for option in INPUT_OPTIONS {
            object.write_property(option, &MpvValue::Flag(false));
        }

        for name in observed_properties() {
            debug!("Observing a property from mpv: {}", name);
            if let Err(e) = object.handle.observe_property(name, 0) {
                warn!("Failed to observe a property from mpv: {}", e);
            }
        }

        let notifier = object.tasks.notifier();
        object
            .handle
            .set_wakeup_callback(Some(Box::new(move || notifier.mpv_wakeup())));

        object.handle.initialize()?;
        info!("mpv core initialized");

        Ok(object)
    }

    /// The shared native handle
    pub fn handle(&self) -> Arc<dyn MpvHandle> {
        Arc::clone(&self.handle)
    }

    /// Sender for the owning thread's task queue
    pub fn notifier(&self) -> Notifier {
        self.tasks.notifier()
    }

    /// Create the render bridge for a host surface
    ///
    /// Marks the surface's GL context and scene graph as persistent so the
    /// render context survives the surface being hidden.
    pub fn create_renderer(&self, graphics: &mut dyn GraphicsContext) -> MpvRenderer {
        graphics.set_persistent_context(true);
        graphics.set_persistent_scene_graph(true);
        MpvRenderer::new(Arc::clone(&self.handle), self.tasks.notifier())
    }

    /// Register a callback for every emitted [`Signal`]
    pub fn subscribe<F>(&self, callback: F) -> SignalSubscription
    where
        F: Fn(Signal) + Send + Sync + 'static,
    {
        let mut subscribers = self.subscribers.write();
        let id = subscribers.next_id;
        subscribers.next_id += 1;
        subscribers.entries.push((id, Arc::new(callback)));

        SignalSubscription {
            id,
            subscribers: Arc::downgrade(&self.subscribers),
        }
    }

    pub(super) fn emit(&self, signal: Signal) {
        trace!("Emitting {:?}", signal);
        let callbacks: Vec<SignalCallback> = self
            .subscribers
            .read()
            .entries
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(signal);
        }
    }

    /// Run every queued task without waiting
    ///
    /// # Returns
    ///
    /// Number of tasks handled
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(task) = self.tasks.try_next() {
            self.run_task(task);
            handled += 1;
        }
        handled
    }

    /// Wait up to `timeout` for a task, then run everything queued
    pub fn process_pending_timeout(&mut self, timeout: Duration) -> usize {
        match self.tasks.next_timeout(timeout) {
            Some(task) => {
                self.run_task(task);
                1 + self.process_pending()
            }
            None => 0,
        }
    }

    fn run_task(&mut self, task: Task) {
        match task {
            Task::MpvEvents => self.handle_mpv_events(),
            Task::Update => self.emit(Signal::UpdateRequested),
            Task::InitFinished => self.emit(Signal::InitFinished),
        }
    }

    /// Read a property
    ///
    /// Returns `None` when the query fails or yields no value.
    pub fn get_property(&self, name: &str) -> Option<MpvValue> {
        if self.shutdown {
            return None;
        }
        match self.handle.get_property(name) {
            Ok(value) if !value.is_none() => Some(value),
            Ok(_) => {
                warn!("Failed to query a property from mpv: {} has no value", name);
                None
            }
            Err(e) => {
                warn!("Failed to query a property from mpv: {}", e);
                None
            }
        }
    }

    /// Write a property unless it already holds `value`
    ///
    /// # Returns
    ///
    /// `true` if a write was issued and accepted
    pub fn set_property(&self, name: &str, value: impl Into<MpvValue>) -> bool {
        let value = value.into();
        if let Some(current) = self.get_property(name) {
            if current.loosely_equals(&value) {
                return false;
            }
        }
        self.write_property(name, &value)
    }

    /// Write a property without the read-back check
    pub(super) fn write_property(&self, name: &str, value: &MpvValue) -> bool {
        if self.shutdown || name.is_empty() || value.is_none() {
            return false;
        }
        debug!("Setting a property for mpv: {} to: {}", name, value);
        let result = match self.call_type {
            CallType::Asynchronous => self.handle.set_property_async(name, value, 0),
            CallType::Synchronous => self.handle.set_property(name, value),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to set a property for mpv: {}", e);
                false
            }
        }
    }

    /// Run a command; the first argument must be a non-empty command name
    ///
    /// In asynchronous mode this returns once the command is queued and the
    /// reply is not reported back.
    pub fn command(&self, args: &[MpvValue]) -> bool {
        match args.first() {
            Some(MpvValue::String(name)) if !name.is_empty() => {}
            _ => return false,
        }
        if self.shutdown {
            return false;
        }
        debug!("Sending a command to mpv: {}", MpvValue::List(args.to_vec()));
        let result = match self.call_type {
            CallType::Asynchronous => self.handle.command_async(args, 0),
            CallType::Synchronous => self.handle.command(args).map(|_| ()),
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to execute a command for mpv: {}", e);
                false
            }
        }
    }

    fn value(&self, name: &str) -> MpvValue {
        self.get_property(name).unwrap_or_default()
    }

    /// Read a media property, or nothing while stopped
    fn media_value(&self, name: &str) -> Option<MpvValue> {
        if self.is_stopped() {
            None
        } else {
            Some(self.value(name))
        }
    }

    pub fn playback_state(&self) -> PlaybackState {
        if self.shutdown {
            return PlaybackState::Stopped;
        }
        PlaybackState::derive(self.value("idle-active").to_bool(), self.value("pause").to_bool())
    }

    pub fn media_status(&self) -> MediaStatus {
        self.media_status
    }

    pub fn is_loaded(&self) -> bool {
        self.media_status.is_loaded()
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state() == PlaybackState::Playing
    }

    pub fn is_paused(&self) -> bool {
        self.playback_state() == PlaybackState::Paused
    }

    pub fn is_stopped(&self) -> bool {
        self.playback_state() == PlaybackState::Stopped
    }

    /// Whether the core has announced shutdown
    pub fn is_shut_down(&self) -> bool {
        self.shutdown
    }

    pub fn call_type(&self) -> CallType {
        self.call_type
    }

    pub fn set_call_type(&mut self, call_type: CallType) -> bool {
        if self.call_type == call_type {
            return false;
        }
        self.call_type = call_type;
        self.emit(Signal::CallTypeChanged);
        true
    }

    /// The level `msg-level` is set to for `all`
    ///
    /// mpv reports `msg-level` as a map of module to level; a plain
    /// `all=<level>` string is accepted too.
    pub fn log_level(&self) -> LogLevel {
        let msg_level = self.value("msg-level");
        let level = match msg_level.as_map() {
            Some(levels) => levels.get("all").map(MpvValue::to_text).unwrap_or_default(),
            None => msg_level.to_text(),
        };
        LogLevel::from_msg_level(&level)
    }

    /// Change mpv's log verbosity
    ///
    /// Sets `terminal` and `msg-level` and subscribes to log messages at
    /// the matching tier. Notifies only when all three succeed.
    pub fn set_log_level(&self, level: LogLevel) -> bool {
        if self.shutdown || level == self.log_level() {
            return false;
        }
        let native = level.as_native();
        let terminal = self.write_property("terminal", &MpvValue::Flag(native != NativeLogLevel::None));
        let msg_level = self.write_property("msg-level", &MpvValue::from(format!("all={}", native)));
        let subscribed = match self.handle.request_log_messages(native) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to request log messages from mpv: {}", e);
                false
            }
        };
        if terminal && msg_level && subscribed {
            self.emit(Signal::LogLevelChanged);
            true
        } else {
            warn!("Failed to set log level.");
            false
        }
    }

    /// Switch playback state through [`Self::play`], [`Self::pause`] or
    /// [`Self::stop`]. Nothing happens while stopped.
    pub fn set_playback_state(&mut self, state: PlaybackState) -> bool {
        let current = self.playback_state();
        if current == PlaybackState::Stopped || current == state {
            return false;
        }
        let result = match state {
            PlaybackState::Stopped => self.stop(),
            PlaybackState::Paused => self.pause(),
            PlaybackState::Playing => self.play(),
        };
        if result {
            self.emit(Signal::PlaybackStateChanged);
        }
        result
    }

    /// The loaded locator; `None` while stopped
    pub fn source(&self) -> Option<Url> {
        if self.is_stopped() {
            None
        } else {
            self.current_source.clone()
        }
    }

    /// Load a file or URL
    ///
    /// Does nothing for an invalid locator or the source already playing.
    pub fn set_source(&mut self, source: &str) -> bool {
        let Some(url) = parse_locator(source) else {
            return false;
        };
        if self.current_source.as_ref() == Some(&url) {
            return false;
        }
        let target = loadfile_target(&url);
        if !self.command(&["loadfile".into(), target.into()]) {
            return false;
        }
        info!("Loading {}", url);
        self.current_source = Some(url);
        self.emit(Signal::SourceChanged);
        true
    }

    /// Load `source` unless it is current, then make sure it plays
    ///
    /// # Returns
    ///
    /// Whether `source` was a valid locator
    pub fn open(&mut self, source: &str) -> bool {
        if self.shutdown {
            return false;
        }
        let Some(url) = parse_locator(source) else {
            return false;
        };
        if self.current_source.as_ref() != Some(&url) {
            self.set_source(source);
        }
        if !self.is_playing() {
            self.play();
        }
        true
    }

    /// Resume playback; only valid while paused with a source set
    pub fn play(&self) -> bool {
        if !self.is_paused() || self.current_source.is_none() {
            return false;
        }
        let result = self.write_property("pause", &MpvValue::Flag(false));
        if result {
            self.emit(Signal::Playing);
        }
        result
    }

    /// Resume `source` if it is the current one, otherwise open it
    pub fn play_source(&mut self, source: &str) -> bool {
        let Some(url) = parse_locator(source) else {
            return false;
        };
        if self.current_source.as_ref() == Some(&url) && !self.is_playing() {
            self.play()
        } else {
            self.open(source)
        }
    }

    /// Pause playback; only valid while playing
    pub fn pause(&self) -> bool {
        if !self.is_playing() {
            return false;
        }
        let result = self.write_property("pause", &MpvValue::Flag(true));
        if result {
            self.emit(Signal::Paused);
        }
        result
    }

    /// Stop playback and unload the file
    ///
    /// The current source is cleared as soon as the stop command succeeds,
    /// before mpv confirms the unload.
    pub fn stop(&mut self) -> bool {
        if self.is_stopped() {
            return false;
        }
        let result = self.command(&["stop".into()]);
        if result {
            self.current_source = None;
            self.emit(Signal::Stopped);
        }
        result
    }

    /// Seek, clamping the target to the playable range
    ///
    /// # Arguments
    ///
    /// * `value` - Seconds, or percent for [`SeekMode::AbsolutePercent`]
    /// * `mode` - How `value` is interpreted
    pub fn seek(&self, value: i64, mode: SeekMode) -> bool {
        if self.is_stopped() {
            return false;
        }
        let target = match mode {
            SeekMode::AbsolutePercent => clamp(value, 0, 100),
            SeekMode::Absolute => clamp(value, 0, self.duration()),
            SeekMode::Relative => {
                let position = self.position();
                clamp(value, -position, self.duration() - position)
            }
        };
        self.command(&["seek".into(), target.into(), mode.as_str().into()])
    }

    /// Seek to `position` seconds unless already there
    pub fn seek_absolute(&self, position: i64) -> bool {
        if self.is_stopped() || position == self.position() {
            return false;
        }
        self.seek(position, SeekMode::Absolute)
    }

    /// Seek by `offset` seconds; zero does nothing
    pub fn seek_relative(&self, offset: i64) -> bool {
        if self.is_stopped() || offset == 0 {
            return false;
        }
        self.seek(offset, SeekMode::Relative)
    }

    /// Seek to `percent` of the duration; the target is clamped to 0..=100
    /// before it is compared with the current percentage
    pub fn seek_percent(&self, percent: i64) -> bool {
        let percent = clamp(percent, 0, 100);
        if self.is_stopped() || percent == self.percent_pos() {
            return false;
        }
        self.seek(percent, SeekMode::AbsolutePercent)
    }

    /// Take a screenshot, subtitles included
    pub fn screenshot(&self) -> bool {
        if self.is_stopped() {
            return false;
        }
        self.command(&["screenshot".into(), "subtitles".into()])
    }

    /// Save a screenshot, subtitles included, to `path`
    pub fn screenshot_to_file(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();
        if self.is_stopped() || path.as_os_str().is_empty() {
            return false;
        }
        self.command(&[
            "screenshot-to-file".into(),
            path.to_string_lossy().into_owned().into(),
            "subtitles".into(),
        ])
    }

    /// Duration in seconds
    pub fn duration(&self) -> i64 {
        self.media_value("duration").map_or(0, |v| v.to_i64().max(0))
    }

    /// Position in seconds, within `0..=duration`
    pub fn position(&self) -> i64 {
        if self.is_stopped() {
            return 0;
        }
        let duration = self.value("duration").to_i64().max(0);
        clamp(self.value("time-pos").to_i64(), 0, duration)
    }

    /// Seek to an absolute position in seconds
    pub fn set_position(&self, position: i64) -> bool {
        if self.is_stopped() {
            return false;
        }
        let position = clamp(position, 0, self.duration());
        if position == self.position() {
            return false;
        }
        self.seek(position, SeekMode::Absolute)
    }

    pub fn percent_pos(&self) -> i64 {
        self.media_value("percent-pos")
            .map_or(0, |v| clamp(v.to_i64(), 0, 100))
    }

    pub fn set_percent_pos(&self, percent: i64) -> bool {
        if self.is_stopped() {
            return false;
        }
        let percent = clamp(percent, 0, 100);
        if percent == self.percent_pos() {
            return false;
        }
        self.write_property("percent-pos", &percent.into())
    }

    pub fn file_name(&self) -> String {
        self.media_text("filename")
    }

    pub fn path(&self) -> String {
        self.media_text("path")
    }

    pub fn file_format(&self) -> String {
        self.media_text("file-format")
    }

    /// File size in bytes
    pub fn file_size(&self) -> i64 {
        self.media_value("file-size").map_or(0, |v| v.to_i64().max(0))
    }

    pub fn media_title(&self) -> String {
        self.media_text("media-title")
    }

    pub fn video_format(&self) -> String {
        self.media_text("video-format")
    }

    pub fn seekable(&self) -> bool {
        self.media_value("seekable").is_some_and(|v| v.to_bool())
    }

    /// Display size, swapped for quarter-turn rotations
    pub fn video_size(&self) -> VideoSize {
        if self.is_stopped() {
            return VideoSize::default();
        }
        let size = VideoSize {
            width: self.value("video-out-params/dw").to_i64().max(0),
            height: self.value("video-out-params/dh").to_i64().max(0),
        };
        size.rotated(self.video_rotate())
    }

    /// Rotation in degrees, always within `0..360`
    pub fn video_rotate(&self) -> i64 {
        self.media_value("video-out-params/rotate")
            .map_or(0, |v| v.to_i64().rem_euclid(360))
    }

    pub fn set_video_rotate(&self, degrees: i64) -> bool {
        if self.is_stopped() {
            return false;
        }
        let degrees = degrees.rem_euclid(360);
        if degrees == self.video_rotate() {
            return false;
        }
        self.write_property("video-rotate", &degrees.into())
    }

    pub fn video_aspect(&self) -> f64 {
        self.media_value("video-out-params/aspect")
            .map_or(DEFAULT_ASPECT, |v| v.to_f64().max(0.0))
    }

    pub fn set_video_aspect(&self, aspect: f64) -> bool {
        if self.is_stopped() {
            return false;
        }
        let aspect = aspect.max(0.0);
        if aspect == self.video_aspect() {
            return false;
        }
        self.write_property("video-aspect-override", &aspect.into())
    }

    pub fn vid(&self) -> i64 {
        self.media_value("vid").map_or(0, |v| v.to_i64())
    }

    pub fn aid(&self) -> i64 {
        self.media_value("aid").map_or(0, |v| v.to_i64())
    }

    pub fn sid(&self) -> i64 {
        self.media_value("sid").map_or(0, |v| v.to_i64())
    }

    pub fn set_vid(&self, id: i64) -> bool {
        self.set_track("vid", id, self.vid())
    }

    pub fn set_aid(&self, id: i64) -> bool {
        self.set_track("aid", id, self.aid())
    }

    pub fn set_sid(&self, id: i64) -> bool {
        self.set_track("sid", id, self.sid())
    }

    fn set_track(&self, name: &str, id: i64, current: i64) -> bool {
        let id = id.max(0);
        if self.is_stopped() || id == current {
            return false;
        }
        self.write_property(name, &id.into())
    }

    pub fn video_bitrate(&self) -> f64 {
        self.media_value("video-bitrate").map_or(0.0, |v| v.to_f64().max(0.0))
    }

    pub fn audio_bitrate(&self) -> f64 {
        self.media_value("audio-bitrate").map_or(0.0, |v| v.to_f64().max(0.0))
    }

    /// Audio/video desynchronisation in seconds; may be negative
    pub fn avsync(&self) -> f64 {
        self.media_value("avsync").map_or(0.0, |v| v.to_f64())
    }

    pub fn estimated_vf_fps(&self) -> f64 {
        self.media_value("estimated-vf-fps")
            .map_or(0.0, |v| v.to_f64().max(0.0))
    }

    pub fn media_tracks(&self) -> MediaTracks {
        self.media_value("track-list")
            .map(|list| MediaTracks::from_track_list(&list))
            .unwrap_or_default()
    }

    pub fn chapters(&self) -> Vec<Chapter> {
        self.media_value("chapter-list")
            .map(|list| Chapter::list_from(&list))
            .unwrap_or_default()
    }

    pub fn metadata(&self) -> Metadata {
        self.media_value("metadata")
            .map(|value| metadata_from(&value))
            .unwrap_or_default()
    }

    fn media_text(&self, name: &str) -> String {
        self.media_value(name).map(|v| v.to_text()).unwrap_or_default()
    }

    /// Volume within `0..=100`
    pub fn volume(&self) -> i64 {
        clamp(self.value("volume").to_i64(), 0, 100)
    }

    /// Set the volume, clamped to `0..=100`
    pub fn set_volume(&self, volume: i64) -> bool {
        let volume = clamp(volume, 0, 100);
        if volume == self.volume() {
            return false;
        }
        self.write_property("volume", &volume.into())
    }

    pub fn mute(&self) -> bool {
        self.value("mute").to_bool()
    }

    pub fn set_mute(&self, mute: bool) -> bool {
        self.set_flag("mute", mute, self.mute())
    }

    pub fn speed(&self) -> f64 {
        self.value("speed").to_f64().max(0.0)
    }

    pub fn set_speed(&self, speed: f64) -> bool {
        if self.is_stopped() {
            return false;
        }
        let speed = speed.max(0.0);
        if speed == self.speed() {
            return false;
        }
        self.write_property("speed", &speed.into())
    }

    /// The hardware decoder in use; empty when decoding in software
    pub fn hwdec(&self) -> String {
        self.text("hwdec-current")
    }

    pub fn set_hwdec(&self, hwdec: &str) -> bool {
        self.set_text("hwdec", hwdec, &self.hwdec())
    }

    pub fn deinterlace(&self) -> bool {
        self.value("deinterlace").to_bool()
    }

    pub fn set_deinterlace(&self, enabled: bool) -> bool {
        self.set_flag("deinterlace", enabled, self.deinterlace())
    }

    pub fn audio_exclusive(&self) -> bool {
        self.value("audio-exclusive").to_bool()
    }

    pub fn set_audio_exclusive(&self, enabled: bool) -> bool {
        self.set_flag("audio-exclusive", enabled, self.audio_exclusive())
    }

    pub fn audio_file_auto(&self) -> String {
        self.text("audio-file-auto")
    }

    pub fn set_audio_file_auto(&self, mode: &str) -> bool {
        self.set_text("audio-file-auto", mode, &self.audio_file_auto())
    }

    pub fn sub_auto(&self) -> String {
        self.text("sub-auto")
    }

    pub fn set_sub_auto(&self, mode: &str) -> bool {
        self.set_text("sub-auto", mode, &self.sub_auto())
    }

    /// Subtitle code page, without the `+` force marker
    pub fn sub_codepage(&self) -> String {
        let codepage = self.text("sub-codepage");
        match codepage.strip_prefix('+') {
            Some(stripped) => stripped.to_string(),
            None => codepage,
        }
    }

    /// Set the subtitle code page; `cp*` code pages are forced with `+`
    pub fn set_sub_codepage(&self, codepage: &str) -> bool {
        let bare = codepage.strip_prefix('+').unwrap_or(codepage);
        if bare.is_empty() || bare == self.sub_codepage() {
            return false;
        }
        self.write_property("sub-codepage", &codepage_value(codepage).into())
    }

    pub fn vo(&self) -> String {
        self.text("vo")
    }

    pub fn set_vo(&self, vo: &str) -> bool {
        self.set_text("vo", vo, &self.vo())
    }

    pub fn ao(&self) -> String {
        self.text("ao")
    }

    pub fn set_ao(&self, ao: &str) -> bool {
        self.set_text("ao", ao, &self.ao())
    }

    pub fn audio_device_list(&self) -> Vec<AudioDevice> {
        AudioDevice::list_from(&self.value("audio-device-list"))
    }

    pub fn screenshot_format(&self) -> String {
        self.text("screenshot-format")
    }

    pub fn set_screenshot_format(&self, format: &str) -> bool {
        self.set_text("screenshot-format", format, &self.screenshot_format())
    }

    pub fn screenshot_tag_colorspace(&self) -> bool {
        self.value("screenshot-tag-colorspace").to_bool()
    }

    pub fn set_screenshot_tag_colorspace(&self, enabled: bool) -> bool {
        self.set_flag("screenshot-tag-colorspace", enabled, self.screenshot_tag_colorspace())
    }

    /// PNG compression level within `0..=9`
    pub fn screenshot_png_compression(&self) -> i64 {
        clamp(self.value("screenshot-png-compression").to_i64(), 0, 9)
    }

    pub fn set_screenshot_png_compression(&self, level: i64) -> bool {
        let level = clamp(level, 0, 9);
        if level == self.screenshot_png_compression() {
            return false;
        }
        self.write_property("screenshot-png-compression", &level.into())
    }

    /// JPEG quality within `0..=100`
    pub fn screenshot_jpeg_quality(&self) -> i64 {
        clamp(self.value("screenshot-jpeg-quality").to_i64(), 0, 100)
    }

    pub fn set_screenshot_jpeg_quality(&self, quality: i64) -> bool {
        let quality = clamp(quality, 0, 100);
        if quality == self.screenshot_jpeg_quality() {
            return false;
        }
        self.write_property("screenshot-jpeg-quality", &quality.into())
    }

    pub fn screenshot_template(&self) -> String {
        self.text("screenshot-template")
    }

    pub fn set_screenshot_template(&self, template: &str) -> bool {
        self.set_text("screenshot-template", template, &self.screenshot_template())
    }

    pub fn screenshot_directory(&self) -> String {
        self.text("screenshot-directory")
    }

    pub fn set_screenshot_directory(&self, directory: &str) -> bool {
        self.set_text("screenshot-directory", directory, &self.screenshot_directory())
    }

    pub fn profile(&self) -> String {
        self.text("profile")
    }

    /// Apply an mpv profile by name
    pub fn set_profile(&self, profile: &str) -> bool {
        if profile.is_empty() || profile == self.profile() {
            return false;
        }
        self.command(&["apply-profile".into(), profile.into()])
    }

    pub fn hr_seek(&self) -> bool {
        self.value("hr-seek").to_bool()
    }

    pub fn set_hr_seek(&self, enabled: bool) -> bool {
        if enabled == self.hr_seek() {
            return false;
        }
        self.write_property("hr-seek", &MpvValue::from(if enabled { "yes" } else { "no" }))
    }

    pub fn ytdl(&self) -> bool {
        self.value("ytdl").to_bool()
    }

    pub fn set_ytdl(&self, enabled: bool) -> bool {
        self.set_flag("ytdl", enabled, self.ytdl())
    }

    pub fn load_scripts(&self) -> bool {
        self.value("load-scripts").to_bool()
    }

    pub fn set_load_scripts(&self, enabled: bool) -> bool {
        self.set_flag("load-scripts", enabled, self.load_scripts())
    }

    pub fn mpv_version(&self) -> String {
        self.text("mpv-version")
    }

    pub fn mpv_configuration(&self) -> String {
        self.text("mpv-configuration")
    }

    pub fn ffmpeg_version(&self) -> String {
        self.text("ffmpeg-version")
    }

    fn text(&self, name: &str) -> String {
        self.value(name).to_text()
    }

    fn set_flag(&self, name: &str, value: bool, current: bool) -> bool {
        if value == current {
            return false;
        }
        self.write_property(name, &value.into())
    }

    fn set_text(&self, name: &str, value: &str, current: &str) -> bool {
        if value.is_empty() || value == current {
            return false;
        }
        self.write_property(name, &value.into())
    }

    /// Push a configuration into the core
    ///
    /// Options are written directly, without the stopped-state rules of the
    /// typed setters, and only when they differ from the current value.
    ///
    /// # Returns
    ///
    /// Number of settings that changed
    pub fn apply_config(&mut self, config: &Config) -> usize {
        let mut changed = 0;
        if self.set_call_type(config.general.call_type) {
            changed += 1;
        }
        if self.set_log_level(config.general.mpv_log_level) {
            changed += 1;
        }

        let playback = &config.playback;
        let subtitles = &config.subtitles;
        let screenshot = &config.screenshot;
        let mut options: Vec<(&str, MpvValue)> = vec![
            ("volume", clamp(playback.volume, 0, 100).into()),
            ("mute", playback.mute.into()),
            ("speed", playback.speed.max(0.01).into()),
            ("ytdl", playback.ytdl.into()),
            ("load-scripts", playback.load_scripts.into()),
            ("deinterlace", playback.deinterlace.into()),
            ("audio-exclusive", playback.audio_exclusive.into()),
            ("sub-auto", subtitles.sub_auto.as_str().into()),
            ("sub-codepage", codepage_value(&subtitles.sub_codepage).into()),
            ("audio-file-auto", subtitles.audio_file_auto.as_str().into()),
            ("screenshot-format", screenshot.format.as_str().into()),
            ("screenshot-template", screenshot.template.as_str().into()),
            ("screenshot-png-compression", clamp(screenshot.png_compression, 0, 9).into()),
            ("screenshot-jpeg-quality", clamp(screenshot.jpeg_quality, 0, 100).into()),
            ("screenshot-tag-colorspace", screenshot.tag_colorspace.into()),
        ];
        if let Some(hwdec) = &playback.hwdec {
            options.push(("hwdec", hwdec.as_str().into()));
        }
        if let Some(hr_seek) = playback.hr_seek {
            options.push(("hr-seek", (if hr_seek { "yes" } else { "no" }).into()));
        }
        if let Some(directory) = &screenshot.directory {
            options.push((
                "screenshot-directory",
                directory.to_string_lossy().into_owned().into(),
            ));
        }

        for (name, value) in options {
            if self.set_property(name, value) {
                changed += 1;
            }
        }

        if let Some(profile) = &playback.profile {
            if self.set_profile(profile) {
                changed += 1;
            }
        }

        debug!("Applied configuration, {} settings changed", changed);
        changed
    }
}

impl Drop for MpvObject {
    fn drop(&mut self) {
        self.handle.set_wakeup_callback(None);
    }
}

/// Force `cp*` code pages with a leading `+`
fn codepage_value(codepage: &str) -> String {
    if codepage.starts_with("cp") {
        format!("+{}", codepage)
    } else {
        codepage.to_string()
    }
}

//! Draining libmpv's event queue on the owning thread

use super::object::MpvObject;
use super::properties::{is_log_blacklisted, signal_for_property};
use super::{MediaStatus, PlaybackState, Signal};
use crate::mpv::{EndFileReason, LogMessage, MpvEvent, MpvValue, NativeLogLevel};
use crate::utils::error::error_name;
use log::{debug, error, info, warn};
use std::time::Duration;

/// How long a single `wait_event` may block while draining
const EVENT_WAIT: Duration = Duration::from_millis(5);

impl MpvObject {
    /// Handle every queued native event until the queue is empty
    pub(super) fn handle_mpv_events(&mut self) {
        while !self.shutdown {
            let event = self.handle.wait_event(EVENT_WAIT);
            if matches!(event, MpvEvent::None) {
                break;
            }
            if !event.is_quiet() {
                debug!("[libmpv] Event received from mpv: {}", event.name());
            }

            match event {
                MpvEvent::Shutdown => {
                    info!("mpv core is shutting down");
                    self.shutdown = true;
                    self.emit(Signal::Shutdown);
                }
                MpvEvent::LogMessage(message) => route_log_message(&message),
                MpvEvent::GetPropertyReply { error, name, .. } if error < 0 => {
                    warn!(
                        "Asynchronous read of {} failed: {}",
                        name,
                        error_name(error)
                    );
                }
                MpvEvent::SetPropertyReply { error, .. } if error < 0 => {
                    warn!("Asynchronous property write failed: {}", error_name(error));
                }
                MpvEvent::CommandReply { error, .. } if error < 0 => {
                    warn!("Asynchronous command failed: {}", error_name(error));
                }
                MpvEvent::StartFile { .. } => self.set_media_status(MediaStatus::Loading),
                MpvEvent::EndFile { reason, error } => {
                    if reason == EndFileReason::Error {
                        warn!("Playback ended with an error: {}", error_name(error));
                    }
                    // A file replaced by loadfile ends with Stop; keep the new source
                    if matches!(reason, EndFileReason::Eof | EndFileReason::Error) {
                        self.current_source = None;
                    }
                    self.set_media_status(MediaStatus::End);
                    self.playback_state_change_event();
                }
                MpvEvent::FileLoaded => {
                    self.set_media_status(MediaStatus::Loaded);
                    self.emit(Signal::Loaded);
                    self.playback_state_change_event();
                }
                MpvEvent::Idle => self.playback_state_change_event(),
                MpvEvent::VideoReconfig => self.emit(Signal::VideoSizeChanged),
                MpvEvent::ClientMessage(args) => {
                    debug!("[libmpv] Client message: {}", args.join(" "));
                }
                MpvEvent::PropertyChange { name, value, .. } => {
                    self.property_changed(&name, &value)
                }
                MpvEvent::QueueOverflow => {
                    warn!("mpv event queue overflowed, some events were dropped");
                }
                _ => {}
            }
        }
    }

    fn set_media_status(&mut self, status: MediaStatus) {
        if self.media_status == status {
            return;
        }
        self.media_status = status;
        self.emit(Signal::MediaStatusChanged);
    }

    /// Announce the current playback state after a file or idle transition
    fn playback_state_change_event(&self) {
        match self.playback_state() {
            PlaybackState::Playing => self.emit(Signal::Playing),
            PlaybackState::Paused => self.emit(Signal::Paused),
            PlaybackState::Stopped => self.emit(Signal::Stopped),
        }
        self.emit(Signal::PlaybackStateChanged);
    }

    fn property_changed(&mut self, name: &str, value: &MpvValue) {
        if !is_log_blacklisted(name) {
            debug!("[libmpv] Property changed from mpv: {}", name);
        }
        if name == "paused-for-cache" {
            self.cache_state_changed(value);
        }
        if let Some(signal) = signal_for_property(name) {
            self.emit(signal);
        }
    }

    /// Track cache stalls while a file is loaded
    ///
    /// Buffering starts when playback pauses for the cache and ends with
    /// Buffered once it resumes.
    fn cache_state_changed(&mut self, value: &MpvValue) {
        let stalled = if value.is_none() {
            self.get_property("paused-for-cache")
                .is_some_and(|v| v.to_bool())
        } else {
            value.to_bool()
        };
        match self.media_status {
            MediaStatus::Loaded | MediaStatus::Buffered if stalled => {
                self.set_media_status(MediaStatus::Buffering)
            }
            MediaStatus::Buffering if !stalled => self.set_media_status(MediaStatus::Buffered),
            _ => {}
        }
    }
}

/// Forward a libmpv log line to the `log` facade under the `libmpv` target
fn route_log_message(message: &LogMessage) {
    let text = message.text.trim_end();
    match message.level {
        NativeLogLevel::Fatal => {
            error!(target: "libmpv", "[{}] {}", message.prefix, text);
            panic!("fatal error from libmpv: [{}] {}", message.prefix, text);
        }
        NativeLogLevel::Error => error!(target: "libmpv", "[{}] {}", message.prefix, text),
        NativeLogLevel::Warn => warn!(target: "libmpv", "[{}] {}", message.prefix, text),
        NativeLogLevel::Info => info!(target: "libmpv", "[{}] {}", message.prefix, text),
        NativeLogLevel::V | NativeLogLevel::Debug | NativeLogLevel::Trace | NativeLogLevel::None => {
            debug!(target: "libmpv", "[{}] {}", message.prefix, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mpv::mock::MockMpv;
    use crate::player::SignalSubscription;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn setup() -> (Arc<MockMpv>, MpvObject, Arc<Mutex<Vec<Signal>>>, SignalSubscription) {
        let mock = MockMpv::shared();
        let object = MpvObject::new(mock.clone()).unwrap();
        let signals = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&signals);
        let subscription = object.subscribe(move |signal| sink.lock().push(signal));
        (mock, object, signals, subscription)
    }

    #[test]
    fn test_file_lifecycle() {
        let (mock, mut object, signals, _sub) = setup();
        mock.simulate_file_loaded("/media/a.mkv", 60.0);
        object.process_pending();

        assert_eq!(object.media_status(), MediaStatus::Loaded);
        {
            let signals = signals.lock();
            let loaded = signals.iter().position(|s| *s == Signal::Loaded).unwrap();
            assert_eq!(signals[loaded + 1], Signal::Playing);
            assert_eq!(signals[loaded + 2], Signal::PlaybackStateChanged);
            assert!(signals.contains(&Signal::DurationChanged));
            assert!(signals.contains(&Signal::PathChanged));
            assert_eq!(
                signals
                    .iter()
                    .filter(|s| **s == Signal::MediaStatusChanged)
                    .count(),
                2
            );
        }

        signals.lock().clear();
        mock.simulate_end_file(EndFileReason::Eof);
        object.process_pending();
        assert_eq!(object.media_status(), MediaStatus::End);
        let signals = signals.lock();
        assert!(signals.contains(&Signal::MediaStatusChanged));
        assert!(signals.contains(&Signal::Stopped));
    }

    #[test]
    fn test_file_loaded_notifies_once() {
        let (mock, mut object, signals, _sub) = setup();
        mock.set("idle-active", false);
        object.process_pending();
        signals.lock().clear();

        mock.push_event(MpvEvent::FileLoaded);
        object.process_pending();

        let signals = signals.lock();
        assert_eq!(signals.iter().filter(|s| **s == Signal::Loaded).count(), 1);
        assert_eq!(
            signals
                .iter()
                .filter(|s| **s == Signal::PlaybackStateChanged)
                .count(),
            1
        );
        assert_eq!(
            signals.as_slice(),
            &[
                Signal::MediaStatusChanged,
                Signal::Loaded,
                Signal::Playing,
                Signal::PlaybackStateChanged
            ]
        );
    }

    #[test]
    fn test_end_of_file_forgets_source() {
        let (mock, mut object, _signals, _sub) = setup();
        assert!(object.open("/media/a.mkv"));
        mock.simulate_file_loaded("/media/a.mkv", 60.0);
        object.process_pending();

        // Switching files ends the old one with Stop
        mock.push_event(MpvEvent::EndFile {
            reason: EndFileReason::Stop,
            error: 0,
        });
        object.process_pending();
        assert!(object.current_source.is_some());

        mock.simulate_end_file(EndFileReason::Eof);
        object.process_pending();
        assert!(object.current_source.is_none());

        mock.clear_calls();
        assert!(object.open("/media/a.mkv"));
        assert_eq!(mock.commands().len(), 1);
    }

    #[test]
    fn test_buffering() {
        let (mock, mut object, _signals, _sub) = setup();

        // Ignored until a file is loaded
        mock.set("paused-for-cache", true);
        object.process_pending();
        assert_eq!(object.media_status(), MediaStatus::Unknown);

        mock.set("paused-for-cache", false);
        mock.simulate_file_loaded("/media/a.mkv", 60.0);
        object.process_pending();
        assert_eq!(object.media_status(), MediaStatus::Loaded);

        mock.set("paused-for-cache", true);
        object.process_pending();
        assert_eq!(object.media_status(), MediaStatus::Buffering);

        mock.set("paused-for-cache", false);
        object.process_pending();
        assert_eq!(object.media_status(), MediaStatus::Buffered);
    }

    #[test]
    fn test_buffering_queries_missing_value() {
        let (mock, mut object, _signals, _sub) = setup();
        mock.set("paused-for-cache", true);
        mock.simulate_file_loaded("/media/a.mkv", 60.0);
        object.process_pending();
        assert_eq!(object.media_status(), MediaStatus::Loaded);

        mock.push_event(MpvEvent::PropertyChange {
            reply_userdata: 0,
            name: "paused-for-cache".to_string(),
            value: MpvValue::None,
        });
        object.process_pending();
        assert_eq!(object.media_status(), MediaStatus::Buffering);
    }

    #[test]
    fn test_shutdown_stops_drain() {
        let (mock, mut object, signals, _sub) = setup();
        mock.simulate_shutdown();
        mock.push_event(MpvEvent::Idle);
        object.process_pending();

        assert!(object.is_shut_down());
        assert_eq!(signals.lock().as_slice(), &[Signal::Shutdown]);
        assert_eq!(mock.pending_events(), 1);
    }

    #[test]
    fn test_video_reconfig_and_untracked_properties() {
        let (mock, mut object, signals, _sub) = setup();
        mock.push_event(MpvEvent::VideoReconfig);
        mock.push_event(MpvEvent::PropertyChange {
            reply_userdata: 0,
            name: "something-else".to_string(),
            value: MpvValue::Int64(1),
        });
        mock.push_event(MpvEvent::PlaybackRestart);
        object.process_pending();
        assert_eq!(signals.lock().as_slice(), &[Signal::VideoSizeChanged]);
    }

    #[test]
    fn test_log_messages_routed() {
        route_log_message(&LogMessage {
            prefix: "cplayer".to_string(),
            level: NativeLogLevel::Warn,
            text: "something odd\n".to_string(),
        });
    }

    #[test]
    #[should_panic(expected = "fatal error from libmpv")]
    fn test_fatal_log_message_panics() {
        route_log_message(&LogMessage {
            prefix: "vo".to_string(),
            level: NativeLogLevel::Fatal,
            text: "cannot continue\n".to_string(),
        });
    }
}

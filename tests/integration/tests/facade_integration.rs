//! Integration tests for the control facade
//!
//! These tests drive [`MpvObject`] against the in-memory core through whole
//! playback sessions:
//! - Opening, pausing, seeking and stopping
//! - Signal delivery through the task queue
//! - Track, chapter and metadata snapshots
//! - Shutdown handling

use anyhow::Result;
use mpv_object::mpv::{map, EndFileReason, MpvValue};
use mpv_object::player::{MediaTracks, TrackKind};
use mpv_object::{CallType, MediaStatus, PlaybackState, SeekMode, Signal};
use mpv_object_integration_tests::perf_test::PerfMeasure;
use mpv_object_integration_tests::{TestFixture, TestPlayer};
use std::thread;
use std::time::Duration;
use url::Url;

#[test]
fn test_initial_state() -> Result<()> {
    let player = TestPlayer::new()?;

    assert_eq!(player.object.playback_state(), PlaybackState::Stopped);
    assert_eq!(player.object.media_status(), MediaStatus::Unknown);
    assert_eq!(player.object.call_type(), CallType::Synchronous);
    assert!(player.object.source().is_none());
    assert_eq!(player.object.volume(), 100);
    assert_eq!(player.object.mpv_version(), "mpv 0.38.0");
    assert!(player.take_signals().is_empty());

    Ok(())
}

#[test]
fn test_playback_session() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut player = TestPlayer::new()?;

    player.load(&fixture.media_files.video, 120.0)?;
    let signals = player.take_signals();
    assert_eq!(TestPlayer::count(&signals, Signal::SourceChanged), 1);
    assert_eq!(TestPlayer::count(&signals, Signal::Loaded), 1);
    assert!(player.object.is_playing());
    assert_eq!(player.object.duration(), 120);
    assert_eq!(player.object.file_name(), "test video.mkv");

    let expected = Url::from_file_path(&fixture.media_files.video).unwrap();
    assert_eq!(player.object.source(), Some(expected));

    // Pause, seek, resume
    assert!(player.object.pause());
    assert!(player.object.seek(30, SeekMode::Absolute));
    player.mpv.set("time-pos", 30.0);
    assert_eq!(player.object.position(), 30);
    assert!(player.object.play());

    let signals = player.settle();
    assert!(signals.contains(&Signal::Paused));
    assert!(signals.contains(&Signal::Playing));
    assert!(signals.contains(&Signal::PositionChanged));

    // Stop and unload
    assert!(player.object.stop());
    player.mpv.simulate_end_file(EndFileReason::Stop);
    let signals = player.settle();
    assert!(signals.contains(&Signal::Stopped));
    assert_eq!(player.object.media_status(), MediaStatus::End);
    assert_eq!(player.object.playback_state(), PlaybackState::Stopped);
    assert_eq!(player.object.position(), 0);
    assert!(player.object.source().is_none());

    Ok(())
}

#[test]
fn test_reopen_after_end_of_file() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut player = TestPlayer::new()?;

    player.load(&fixture.media_files.audio, 10.0)?;
    player.mpv.simulate_end_file(EndFileReason::Eof);
    player.settle();
    player.mpv.clear_calls();

    // The same source loads again once playback has ended
    let source = fixture.media_files.audio.to_string_lossy().into_owned();
    assert!(player.object.open(&source));
    assert_eq!(player.mpv.commands().len(), 1);
    assert_eq!(player.mpv.commands()[0][0], MpvValue::from("loadfile"));

    Ok(())
}

#[test]
fn test_signals_only_on_change() -> Result<()> {
    let mut player = TestPlayer::new()?;

    assert!(player.object.set_volume(40));
    assert!(!player.object.set_volume(40));
    assert!(player.object.set_mute(true));
    assert!(!player.object.set_mute(true));

    let signals = player.settle();
    assert_eq!(TestPlayer::count(&signals, Signal::VolumeChanged), 1);
    assert_eq!(TestPlayer::count(&signals, Signal::MuteChanged), 1);
    assert_eq!(player.mpv.writes("volume"), vec![MpvValue::Int64(40)]);

    Ok(())
}

#[test]
fn test_wakeups_from_other_threads() -> Result<()> {
    let mut player = TestPlayer::new()?;

    let handles: Vec<_> = (0..4_i32)
        .map(|i| {
            let mpv = player.mpv.clone();
            thread::spawn(move || {
                for step in 0..25_i32 {
                    mpv.set("volume", f64::from(i * 25 + step));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    // However many wakeups arrived, one drain empties the queue
    assert_eq!(player.object.process_pending_timeout(Duration::from_millis(100)), 1);
    assert_eq!(player.mpv.pending_events(), 0);
    assert!(!player.take_signals().is_empty());

    Ok(())
}

#[test]
fn test_track_snapshot() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut player = TestPlayer::new()?;
    player.load(&fixture.media_files.video, 60.0)?;

    player.mpv.set(
        "track-list",
        MpvValue::List(vec![
            map([
                ("id", MpvValue::Int64(1)),
                ("type", "video".into()),
                ("codec", "hevc".into()),
                ("selected", true.into()),
                ("demux-w", MpvValue::Int64(3840)),
                ("demux-h", MpvValue::Int64(2160)),
            ]),
            map([
                ("id", MpvValue::Int64(1)),
                ("type", "audio".into()),
                ("title", "Stereo".into()),
                ("selected", true.into()),
            ]),
            map([
                ("id", MpvValue::Int64(1)),
                ("type", "sub".into()),
                ("external", true.into()),
                (
                    "external-filename",
                    fixture.media_files.subtitles.to_string_lossy().into_owned().into(),
                ),
            ]),
        ]),
    );
    let signals = player.settle();
    assert!(signals.contains(&Signal::MediaTracksChanged));

    let tracks: MediaTracks = player.object.media_tracks();
    assert_eq!(tracks.video_channels[0].codec, "hevc");
    assert_eq!(tracks.selected(TrackKind::Audio).map(|t| t.title.as_str()), Some("Stereo"));
    assert_eq!(tracks.subtitle_streams[0].title, "[untitled]");

    let json = serde_json::to_value(&tracks)?;
    assert_eq!(json["video_channels"][0]["demux-w"], 3840);

    Ok(())
}

#[test]
fn test_chapters_and_metadata() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut player = TestPlayer::new()?;
    player.load(&fixture.media_files.audio, 300.0)?;

    player.mpv.set(
        "chapter-list",
        MpvValue::List(vec![
            map([("title", MpvValue::from("Opening")), ("time", MpvValue::Double(0.0))]),
            map([("title", MpvValue::from("Finale")), ("time", MpvValue::Double(240.0))]),
        ]),
    );
    player
        .mpv
        .set("metadata", map([("artist", "Someone"), ("album", "Something")]));
    let signals = player.settle();
    assert!(signals.contains(&Signal::ChaptersChanged));
    assert!(signals.contains(&Signal::MetadataChanged));

    let chapters = player.object.chapters();
    assert_eq!(chapters.len(), 2);
    assert_eq!(chapters[1].time, 240.0);
    assert_eq!(
        player.object.metadata().get("artist"),
        Some(&MpvValue::from("Someone"))
    );

    Ok(())
}

#[test]
fn test_asynchronous_session() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut player = TestPlayer::new()?;
    assert!(player.object.set_call_type(CallType::Asynchronous));

    player.load(&fixture.media_files.video, 60.0)?;
    assert!(player.object.is_playing());
    assert!(player.object.set_speed(1.5));
    player.settle();

    assert_eq!(player.object.speed(), 1.5);
    assert_eq!(player.mpv.pending_events(), 0);

    Ok(())
}

#[test]
fn test_core_shutdown() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut player = TestPlayer::new()?;
    player.load(&fixture.media_files.video, 60.0)?;
    player.take_signals();

    player.mpv.simulate_shutdown();
    let signals = player.settle();
    assert_eq!(signals, vec![Signal::Shutdown]);
    assert!(player.object.is_shut_down());
    assert_eq!(player.object.playback_state(), PlaybackState::Stopped);
    assert!(!player.object.screenshot());
    assert!(!player.object.set_volume(10));

    Ok(())
}

#[test]
fn test_drain_throughput() -> Result<()> {
    let mut player = TestPlayer::new()?;
    let mut perf = PerfMeasure::new("drain 1000 property changes");

    for round in 0..5_i32 {
        for step in 0..1000_i32 {
            player.mpv.set("avsync", f64::from(round * 1000 + step) / 1000.0);
        }
        perf.start();
        player.object.process_pending();
        perf.stop();
        assert_eq!(player.mpv.pending_events(), 0);
    }

    perf.report();
    assert!(perf.average() < Duration::from_secs(1));

    Ok(())
}

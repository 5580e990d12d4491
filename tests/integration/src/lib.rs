//! Integration test utilities for mpv-object
//!
//! This module provides common utilities for integration testing including:
//! - A facade wired to the in-memory core, with signal recording
//! - A headless graphics surface for the render bridge
//! - Temporary media and configuration files

use anyhow::Result;
use mpv_object::mpv::mock::MockMpv;
use mpv_object::render::{Framebuffer, GraphicsContext, ProcAddressFn, RawDisplayHandle};
use mpv_object::{MpvObject, Signal, SignalSubscription};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Test fixture for integration tests
pub struct TestFixture {
    pub temp_dir: TempDir,
    pub media_files: MediaFiles,
}

/// Collection of test media files
///
/// The in-memory core never opens them; they exist so locators resolve to
/// real paths.
pub struct MediaFiles {
    pub video: PathBuf,
    pub audio: PathBuf,
    pub subtitles: PathBuf,
}

impl TestFixture {
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let media_files = MediaFiles::generate(&temp_dir)?;

        Ok(Self {
            temp_dir,
            media_files,
        })
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write a configuration file into the temporary directory
    pub fn write_config(&self, contents: &str) -> Result<PathBuf> {
        let path = self.path().join("config.toml");
        std::fs::write(&path, contents)?;
        Ok(path)
    }
}

impl MediaFiles {
    fn generate(dir: &TempDir) -> Result<Self> {
        let video = dir.path().join("test video.mkv");
        let audio = dir.path().join("test_audio.flac");
        let subtitles = dir.path().join("test video.srt");
        std::fs::write(&video, b"mkv")?;
        std::fs::write(&audio, b"flac")?;
        std::fs::write(&subtitles, b"1\n00:00:00,000 --> 00:00:01,000\nhi\n")?;

        Ok(Self {
            video,
            audio,
            subtitles,
        })
    }
}

/// A facade over [`MockMpv`] that records every signal it emits
pub struct TestPlayer {
    pub mpv: Arc<MockMpv>,
    pub object: MpvObject,
    signals: Arc<Mutex<Vec<Signal>>>,
    _subscription: SignalSubscription,
}

impl TestPlayer {
    pub fn new() -> Result<Self> {
        let mpv = MockMpv::shared();
        let object = MpvObject::new(mpv.clone())?;
        let signals = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&signals);
        let subscription = object.subscribe(move |signal| sink.lock().push(signal));

        Ok(Self {
            mpv,
            object,
            signals,
            _subscription: subscription,
        })
    }

    /// Open `path` and let the core load it
    pub fn load(&mut self, path: &Path, duration: f64) -> Result<()> {
        let source = path.to_string_lossy();
        anyhow::ensure!(self.object.open(&source), "open failed for {}", source);
        self.mpv.simulate_file_loaded(&source, duration);
        self.object.process_pending();
        Ok(())
    }

    /// Drain queued tasks and return the signals emitted so far
    pub fn settle(&mut self) -> Vec<Signal> {
        self.object.process_pending();
        self.take_signals()
    }

    pub fn take_signals(&self) -> Vec<Signal> {
        std::mem::take(&mut *self.signals.lock())
    }

    pub fn count(signals: &[Signal], signal: Signal) -> usize {
        signals.iter().filter(|s| **s == signal).count()
    }
}

/// Graphics surface without a GL context
#[derive(Default)]
pub struct HeadlessSurface {
    pub platform: String,
    pub display: Option<RawDisplayHandle>,
    pub persistent_context: bool,
    pub persistent_scene_graph: bool,
    pub state_resets: usize,
    pub framebuffers: Vec<Framebuffer>,
}

impl HeadlessSurface {
    pub fn new(platform: &str) -> Self {
        Self {
            platform: platform.to_string(),
            ..Self::default()
        }
    }
}

impl GraphicsContext for HeadlessSurface {
    fn proc_address_resolver(&self) -> ProcAddressFn {
        Arc::new(|_name: &str| std::ptr::null_mut())
    }

    fn platform_name(&self) -> String {
        self.platform.clone()
    }

    fn display_handle(&self) -> Option<RawDisplayHandle> {
        self.display
    }

    fn set_persistent_context(&mut self, persistent: bool) {
        self.persistent_context = persistent;
    }

    fn set_persistent_scene_graph(&mut self, persistent: bool) {
        self.persistent_scene_graph = persistent;
    }

    fn create_framebuffer(&mut self, width: i32, height: i32) -> mpv_object::Result<Framebuffer> {
        let handle = u32::try_from(self.framebuffers.len() + 1).unwrap_or(u32::MAX);
        let framebuffer = Framebuffer::new(handle, width, height);
        self.framebuffers.push(framebuffer);
        Ok(framebuffer)
    }

    fn reset_state(&mut self) {
        self.state_resets += 1;
    }
}

/// Performance measurement utilities
pub mod perf_test {
    use std::time::{Duration, Instant};

    pub struct PerfMeasure {
        name: String,
        start: Instant,
        measurements: Vec<Duration>,
    }

    impl PerfMeasure {
        pub fn new(name: &str) -> Self {
            Self {
                name: name.to_string(),
                start: Instant::now(),
                measurements: Vec::new(),
            }
        }

        pub fn start(&mut self) {
            self.start = Instant::now();
        }

        pub fn stop(&mut self) {
            self.measurements.push(self.start.elapsed());
        }

        pub fn average(&self) -> Duration {
            if self.measurements.is_empty() {
                return Duration::ZERO;
            }
            let sum: Duration = self.measurements.iter().sum();
            sum / self.measurements.len() as u32
        }

        pub fn report(&self) {
            println!("Performance Report: {}", self.name);
            println!("  Samples: {}", self.measurements.len());
            println!("  Average: {:?}", self.average());
        }
    }
}

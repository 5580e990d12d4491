//! In-memory stand-in for libmpv
//!
//! [`MockMpv`] implements [`MpvHandle`] over a plain property map and an
//! event queue. It records every call so tests can assert on exactly what
//! reached the native side, and it raises property-change events and
//! wakeups the way the real core does.

use crate::mpv::{MpvEvent, MpvHandle, MpvValue, NativeLogLevel, WakeupCallback};
use crate::render::{Framebuffer, RenderContext, RenderInitParams, UpdateCallback};
use crate::utils::error::{MpvError, Result};
use log::debug;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

/// A call that reached the mock
#[derive(Debug, Clone, PartialEq)]
pub enum MockCall {
    Initialize,
    GetProperty(String),
    SetProperty {
        name: String,
        value: MpvValue,
        asynchronous: bool,
    },
    Command {
        args: Vec<MpvValue>,
        asynchronous: bool,
    },
    Observe(String),
    RequestLogMessages(NativeLogLevel),
    CreateRenderContext {
        has_display: bool,
    },
}

type SharedCallback = Arc<dyn Fn() + Send + Sync + 'static>;

struct MockState {
    initialized: bool,
    shutdown: bool,
    properties: HashMap<String, MpvValue>,
    observed: HashSet<String>,
    calls: Vec<MockCall>,
    events: VecDeque<MpvEvent>,
    failing_properties: HashSet<String>,
    failing_commands: HashSet<String>,
    fail_render_context: bool,
}

#[derive(Default)]
struct RenderLog {
    renders: Vec<(Framebuffer, bool)>,
    update: Option<SharedCallback>,
    created: usize,
    alive: usize,
}

/// Mock native handle
pub struct MockMpv {
    state: Mutex<MockState>,
    wakeup: Mutex<Option<SharedCallback>>,
    render: Arc<Mutex<RenderLog>>,
}

impl MockMpv {
    /// Create a mock in the state of a freshly created, idle core
    pub fn new() -> Self {
        let properties = [
            ("idle-active", MpvValue::Flag(true)),
            ("pause", MpvValue::Flag(false)),
            ("volume", MpvValue::Double(100.0)),
            ("mute", MpvValue::Flag(false)),
            ("speed", MpvValue::Double(1.0)),
            ("terminal", MpvValue::Flag(false)),
            ("msg-level", MpvValue::Map(BTreeMap::new())),
            ("hwdec", MpvValue::from("no")),
            ("hwdec-current", MpvValue::from("")),
            ("deinterlace", MpvValue::Flag(false)),
            ("audio-exclusive", MpvValue::Flag(false)),
            ("audio-file-auto", MpvValue::from("no")),
            ("sub-auto", MpvValue::from("exact")),
            ("sub-codepage", MpvValue::from("auto")),
            ("vo", MpvValue::from("libmpv")),
            ("ao", MpvValue::from("")),
            ("screenshot-format", MpvValue::from("jpg")),
            ("screenshot-tag-colorspace", MpvValue::Flag(false)),
            ("screenshot-png-compression", MpvValue::Int64(7)),
            ("screenshot-jpeg-quality", MpvValue::Int64(90)),
            ("screenshot-template", MpvValue::from("mpv-shot%n")),
            ("screenshot-directory", MpvValue::from("")),
            ("profile", MpvValue::from("")),
            ("hr-seek", MpvValue::from("default")),
            ("ytdl", MpvValue::Flag(true)),
            ("load-scripts", MpvValue::Flag(true)),
            ("mpv-version", MpvValue::from("mpv 0.38.0")),
            ("mpv-configuration", MpvValue::from("-Dlibmpv=true")),
            ("ffmpeg-version", MpvValue::from("6.1.1")),
            ("audio-device-list", MpvValue::List(Vec::new())),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            state: Mutex::new(MockState {
                initialized: false,
                shutdown: false,
                properties,
                observed: HashSet::new(),
                calls: Vec::new(),
                events: VecDeque::new(),
                failing_properties: HashSet::new(),
                failing_commands: HashSet::new(),
                fail_render_context: false,
            }),
            wakeup: Mutex::new(None),
            render: Arc::new(Mutex::new(RenderLog::default())),
        }
    }

    /// Create a shared mock, ready to hand to the facade
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    fn wake(&self) {
        let callback = self.wakeup.lock().clone();
        if let Some(callback) = callback {
            callback();
        }
    }

    /// Store a property value and queue a change event if it is observed.
    /// Returns whether a wakeup is due.
    fn store(state: &mut MockState, name: &str, value: MpvValue) -> bool {
        let changed = state.properties.get(name) != Some(&value);
        state.properties.insert(name.to_string(), value.clone());
        if changed && state.observed.contains(name) {
            state.events.push_back(MpvEvent::PropertyChange {
                reply_userdata: 0,
                name: name.to_string(),
                value,
            });
            return true;
        }
        false
    }

    /// Change a property as if the core did it
    pub fn set(&self, name: &str, value: impl Into<MpvValue>) {
        let wake = Self::store(&mut self.state.lock(), name, value.into());
        if wake {
            self.wake();
        }
    }

    /// Remove a property so queries for it fail
    pub fn unset(&self, name: &str) {
        self.state.lock().properties.remove(name);
    }

    /// Queue an event and wake the client
    pub fn push_event(&self, event: MpvEvent) {
        self.state.lock().events.push_back(event);
        self.wake();
    }

    /// Play through the start of a file: start-file, properties, file-loaded
    pub fn simulate_file_loaded(&self, path: &str, duration: f64) {
        self.push_event(MpvEvent::StartFile {
            playlist_entry_id: 1,
        });
        let file_name = path.rsplit('/').next().unwrap_or(path).to_string();
        self.set("path", path);
        self.set("filename", file_name.as_str());
        self.set("media-title", file_name.as_str());
        self.set("duration", duration);
        self.set("time-pos", 0.0);
        self.set("percent-pos", 0.0);
        self.set("seekable", true);
        self.set("idle-active", false);
        self.push_event(MpvEvent::FileLoaded);
    }

    /// Unload the current file and go idle
    pub fn simulate_end_file(&self, reason: crate::mpv::EndFileReason) {
        self.set("idle-active", true);
        self.push_event(MpvEvent::EndFile { reason, error: 0 });
        self.push_event(MpvEvent::Idle);
    }

    /// Announce shutdown; every later request fails
    pub fn simulate_shutdown(&self) {
        {
            let mut state = self.state.lock();
            state.shutdown = true;
            state.events.push_back(MpvEvent::Shutdown);
        }
        self.wake();
    }

    /// Make reads and writes of `name` fail
    pub fn fail_property(&self, name: &str) {
        self.state.lock().failing_properties.insert(name.to_string());
    }

    /// Make the command `name` fail
    pub fn fail_command(&self, name: &str) {
        self.state.lock().failing_commands.insert(name.to_string());
    }

    pub fn fail_render_context(&self, fail: bool) {
        self.state.lock().fail_render_context = fail;
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Current stored value of a property
    pub fn property(&self, name: &str) -> Option<MpvValue> {
        self.state.lock().properties.get(name).cloned()
    }

    /// Values written to `name`, in order
    pub fn writes(&self, name: &str) -> Vec<MpvValue> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::SetProperty { name: n, value, .. } if n == name => Some(value.clone()),
                _ => None,
            })
            .collect()
    }

    /// Argument lists of every command, in order
    pub fn commands(&self) -> Vec<Vec<MpvValue>> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                MockCall::Command { args, .. } => Some(args.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether `name` was read since the last [`MockMpv::clear_calls`]
    pub fn was_queried(&self, name: &str) -> bool {
        self.state
            .lock()
            .calls
            .iter()
            .any(|call| matches!(call, MockCall::GetProperty(n) if n == name))
    }

    pub fn observed(&self) -> HashSet<String> {
        self.state.lock().observed.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.lock().initialized
    }

    pub fn has_wakeup_callback(&self) -> bool {
        self.wakeup.lock().is_some()
    }

    pub fn pending_events(&self) -> usize {
        self.state.lock().events.len()
    }

    /// Frames rendered through any render context: target and flip flag
    pub fn renders(&self) -> Vec<(Framebuffer, bool)> {
        self.render.lock().renders.clone()
    }

    pub fn render_contexts_created(&self) -> usize {
        self.render.lock().created
    }

    pub fn render_contexts_alive(&self) -> usize {
        self.render.lock().alive
    }

    /// Fire the render context's update callback as the render thread would
    pub fn request_redraw(&self) -> bool {
        let callback = self.render.lock().update.clone();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }

    fn check_alive(state: &MockState) -> Result<()> {
        if state.shutdown {
            Err(MpvError::Shutdown)
        } else {
            Ok(())
        }
    }

    /// Key/value list options such as `msg-level` read back as maps
    fn as_stored(name: &str, value: &MpvValue) -> MpvValue {
        match (name, value) {
            ("msg-level", MpvValue::String(text)) => MpvValue::Map(
                text.split(',')
                    .filter_map(|entry| entry.split_once('='))
                    .map(|(module, level)| (module.trim().to_string(), MpvValue::from(level.trim())))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    fn command_name(args: &[MpvValue]) -> String {
        args.first().map(MpvValue::to_text).unwrap_or_default()
    }
}

impl Default for MockMpv {
    fn default() -> Self {
        Self::new()
    }
}

impl MpvHandle for MockMpv {
    fn initialize(&self) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_alive(&state)?;
        if state.initialized {
            return Err(MpvError::native("initialize", -4));
        }
        state.initialized = true;
        state.calls.push(MockCall::Initialize);
        Ok(())
    }

    fn get_property(&self, name: &str) -> Result<MpvValue> {
        let mut state = self.state.lock();
        Self::check_alive(&state)?;
        state.calls.push(MockCall::GetProperty(name.to_string()));
        if state.failing_properties.contains(name) {
            return Err(MpvError::native(format!("get property {}", name), -11));
        }
        state
            .properties
            .get(name)
            .cloned()
            .ok_or_else(|| MpvError::native(format!("get property {}", name), -10))
    }

    fn set_property(&self, name: &str, value: &MpvValue) -> Result<()> {
        let wake = {
            let mut state = self.state.lock();
            Self::check_alive(&state)?;
            state.calls.push(MockCall::SetProperty {
                name: name.to_string(),
                value: value.clone(),
                asynchronous: false,
            });
            if state.failing_properties.contains(name) {
                return Err(MpvError::native(format!("set property {}", name), -11));
            }
            Self::store(&mut state, name, Self::as_stored(name, value))
        };
        if wake {
            self.wake();
        }
        Ok(())
    }

    fn set_property_async(&self, name: &str, value: &MpvValue, reply_userdata: u64) -> Result<()> {
        {
            let mut state = self.state.lock();
            Self::check_alive(&state)?;
            state.calls.push(MockCall::SetProperty {
                name: name.to_string(),
                value: value.clone(),
                asynchronous: true,
            });
            let error = if state.failing_properties.contains(name) {
                -11
            } else {
                Self::store(&mut state, name, Self::as_stored(name, value));
                0
            };
            state.events.push_back(MpvEvent::SetPropertyReply {
                reply_userdata,
                error,
            });
        }
        self.wake();
        Ok(())
    }

    fn command(&self, args: &[MpvValue]) -> Result<MpvValue> {
        let mut state = self.state.lock();
        Self::check_alive(&state)?;
        state.calls.push(MockCall::Command {
            args: args.to_vec(),
            asynchronous: false,
        });
        let name = Self::command_name(args);
        if state.failing_commands.contains(&name) {
            return Err(MpvError::native(format!("command {}", name), -12));
        }
        Ok(MpvValue::None)
    }

    fn command_async(&self, args: &[MpvValue], reply_userdata: u64) -> Result<()> {
        {
            let mut state = self.state.lock();
            Self::check_alive(&state)?;
            state.calls.push(MockCall::Command {
                args: args.to_vec(),
                asynchronous: true,
            });
            let name = Self::command_name(args);
            let error = if state.failing_commands.contains(&name) { -12 } else { 0 };
            state.events.push_back(MpvEvent::CommandReply {
                reply_userdata,
                error,
                result: MpvValue::None,
            });
        }
        self.wake();
        Ok(())
    }

    fn observe_property(&self, name: &str, _reply_userdata: u64) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_alive(&state)?;
        state.calls.push(MockCall::Observe(name.to_string()));
        state.observed.insert(name.to_string());
        Ok(())
    }

    fn request_log_messages(&self, min_level: NativeLogLevel) -> Result<()> {
        let mut state = self.state.lock();
        Self::check_alive(&state)?;
        state.calls.push(MockCall::RequestLogMessages(min_level));
        Ok(())
    }

    fn wait_event(&self, _timeout: Duration) -> MpvEvent {
        self.state.lock().events.pop_front().unwrap_or(MpvEvent::None)
    }

    fn set_wakeup_callback(&self, callback: Option<WakeupCallback>) {
        *self.wakeup.lock() = callback.map(SharedCallback::from);
    }

    fn create_render_context(&self, params: RenderInitParams) -> Result<Box<dyn RenderContext>> {
        {
            let mut state = self.state.lock();
            Self::check_alive(&state)?;
            state.calls.push(MockCall::CreateRenderContext {
                has_display: params.display.is_some(),
            });
            if state.fail_render_context {
                return Err(MpvError::native("create render context", -18));
            }
        }
        // Resolve one symbol the way libmpv does while probing the context
        let _ = (params.proc_address)("glGetString");

        let mut log = self.render.lock();
        log.created += 1;
        log.alive += 1;
        debug!("Mock render context created ({} alive)", log.alive);
        Ok(Box::new(MockRenderContext {
            log: Arc::clone(&self.render),
        }))
    }
}

/// Render context handed out by [`MockMpv`]
struct MockRenderContext {
    log: Arc<Mutex<RenderLog>>,
}

impl RenderContext for MockRenderContext {
    fn set_update_callback(&mut self, callback: Option<UpdateCallback>) {
        self.log.lock().update = callback.map(SharedCallback::from);
    }

    fn render(&mut self, target: &Framebuffer, flip_y: bool) -> Result<()> {
        self.log.lock().renders.push((*target, flip_y));
        Ok(())
    }
}

impl Drop for MockRenderContext {
    fn drop(&mut self) {
        let mut log = self.log.lock();
        log.update = None;
        log.alive = log.alive.saturating_sub(1);
    }
}

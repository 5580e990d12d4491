//! mpv-object
//!
//! A reactive control facade over libmpv plus a bridge that renders mpv's
//! video output into a host's OpenGL framebuffer.
//!
//! - [`mpv`]: the native boundary ([`mpv::MpvHandle`]) with the libmpv
//!   backend behind the `libmpv` feature and an in-memory mock
//! - [`player`]: [`MpvObject`], typed properties, signals and the task queue
//! - [`render`]: [`MpvRenderer`] and the host graphics traits
//! - [`utils`]: errors, configuration and locator helpers

pub mod mpv;
pub mod player;
pub mod render;
pub mod utils;

pub use mpv::{MpvEvent, MpvHandle, MpvValue};
pub use player::{
    CallType, LogLevel, MediaStatus, MpvObject, Notifier, PlaybackState, SeekMode, Signal,
    SignalSubscription,
};
pub use render::{Framebuffer, GraphicsContext, MpvRenderer, RendererState};
pub use utils::{Config, MpvError, Result};

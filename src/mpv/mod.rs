//! Native handle module for mpv-object
//!
//! This module defines the boundary to libmpv. Everything the facade and the
//! render bridge need from the native library goes through the [`MpvHandle`]
//! trait, so the control logic runs unchanged against the real library
//! (feature `libmpv`) or against the in-memory `mock::MockMpv` (feature
//! `mock`).

mod event;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod value;

#[cfg(feature = "libmpv")]
mod ffi;
#[cfg(feature = "libmpv")]
mod libmpv;

pub use event::{EndFileReason, LogMessage, MpvEvent, NativeLogLevel};
pub use value::{map, MpvValue};

#[cfg(feature = "libmpv")]
pub use libmpv::LibMpv;

use crate::render::{RenderContext, RenderInitParams};
use crate::utils::error::Result;
use std::time::Duration;

/// Callback invoked by the native library when new events are queued.
///
/// It may run on any thread, possibly reentrantly from inside an API call,
/// so it must return quickly and must not call back into the handle.
pub type WakeupCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// Handle trait defining the capabilities used from the native library
pub trait MpvHandle: Send + Sync {
    /// Start the core after pre-initialization options have been set
    fn initialize(&self) -> Result<()>;

    /// Read a property as a value tree
    ///
    /// # Arguments
    ///
    /// * `name` - Property name, sub-properties separated by `/`
    fn get_property(&self, name: &str) -> Result<MpvValue>;

    /// Write a property and wait for the core to apply it
    fn set_property(&self, name: &str, value: &MpvValue) -> Result<()>;

    /// Write a property without waiting; the outcome arrives as a
    /// [`MpvEvent::SetPropertyReply`] carrying `reply_userdata`
    fn set_property_async(&self, name: &str, value: &MpvValue, reply_userdata: u64)
        -> Result<()>;

    /// Run a command; the first argument is the command name
    ///
    /// # Returns
    ///
    /// Returns the command result or an error
    fn command(&self, args: &[MpvValue]) -> Result<MpvValue>;

    /// Queue a command; the outcome arrives as a [`MpvEvent::CommandReply`]
    fn command_async(&self, args: &[MpvValue], reply_userdata: u64) -> Result<()>;

    /// Ask for [`MpvEvent::PropertyChange`] events for `name`
    fn observe_property(&self, name: &str, reply_userdata: u64) -> Result<()>;

    /// Subscribe to log messages at `min_level` and above
    fn request_log_messages(&self, min_level: NativeLogLevel) -> Result<()>;

    /// Take the next event, waiting at most `timeout`
    ///
    /// Returns [`MpvEvent::None`] when nothing arrived in time.
    fn wait_event(&self, timeout: Duration) -> MpvEvent;

    /// Install or clear the wakeup notifier
    fn set_wakeup_callback(&self, callback: Option<WakeupCallback>);

    /// Create a render context bound to this core
    fn create_render_context(&self, params: RenderInitParams) -> Result<Box<dyn RenderContext>>;
}

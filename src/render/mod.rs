//! Render module for mpv-object
//!
//! This module bridges libmpv's OpenGL render API into a host-owned
//! framebuffer. The host graphics surface is reached through
//! [`GraphicsContext`]; the native render context through [`RenderContext`].

mod bridge;

pub use bridge::{MpvRenderer, RendererState};
pub use raw_window_handle::RawDisplayHandle;

use crate::utils::error::Result;
use std::ffi::c_void;
use std::fmt;
use std::sync::Arc;

/// Resolves an OpenGL entry point by name in the context current on the
/// calling thread; null when unknown or when no context is current
pub type ProcAddressFn = Arc<dyn Fn(&str) -> *mut c_void + Send + Sync + 'static>;

/// Redraw request from the native renderer; may run on any thread
pub type UpdateCallback = Box<dyn Fn() + Send + Sync + 'static>;

/// A host framebuffer object the video is drawn into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Framebuffer {
    /// GL framebuffer name; 0 is the default framebuffer
    pub handle: u32,
    pub width: i32,
    pub height: i32,
    /// Internal texture format, 0 if unknown
    pub internal_format: i32,
}

impl Framebuffer {
    pub fn new(handle: u32, width: i32, height: i32) -> Self {
        Self {
            handle,
            width,
            height,
            internal_format: 0,
        }
    }
}

/// Parameters for creating a native OpenGL render context
pub struct RenderInitParams {
    /// Render API name; libmpv only knows "opengl" here
    pub api_type: &'static str,
    pub proc_address: ProcAddressFn,
    /// Native display connection for X11 or Wayland hosts
    pub display: Option<RawDisplayHandle>,
}

impl RenderInitParams {
    pub fn opengl(proc_address: ProcAddressFn) -> Self {
        Self {
            api_type: "opengl",
            proc_address,
            display: None,
        }
    }
}

impl fmt::Debug for RenderInitParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderInitParams")
            .field("api_type", &self.api_type)
            .field("display", &self.display)
            .finish_non_exhaustive()
    }
}

/// Native render context created from a [`crate::mpv::MpvHandle`]
pub trait RenderContext: Send {
    /// Install or clear the redraw notifier
    fn set_update_callback(&mut self, callback: Option<UpdateCallback>);

    /// Draw the current video frame into `target`
    ///
    /// # Arguments
    ///
    /// * `target` - Framebuffer to draw into
    /// * `flip_y` - Whether to flip the image vertically
    fn render(&mut self, target: &Framebuffer, flip_y: bool) -> Result<()>;
}

/// Host graphics surface the renderer draws into
pub trait GraphicsContext {
    /// Entry point resolver bound to the currently active GL context
    fn proc_address_resolver(&self) -> ProcAddressFn;

    /// Windowing backend name, e.g. "xcb", "wayland", "windows"
    fn platform_name(&self) -> String;

    /// Native display connection, when the platform has one
    fn display_handle(&self) -> Option<RawDisplayHandle>;

    /// Keep the GL context alive while the surface is hidden
    fn set_persistent_context(&mut self, persistent: bool);

    /// Keep scene graph resources alive while the surface is hidden
    fn set_persistent_scene_graph(&mut self, persistent: bool);

    /// Allocate a framebuffer of the given size
    fn create_framebuffer(&mut self, width: i32, height: i32) -> Result<Framebuffer>;

    /// Restore the GL state the host's own rendering expects
    fn reset_state(&mut self);
}

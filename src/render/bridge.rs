//! OpenGL render bridge
//!
//! [`MpvRenderer`] draws mpv's video output into a framebuffer owned by the
//! host's graphics surface. The native render context is created lazily on
//! the first framebuffer request, while the host's GL context is current.

use super::{Framebuffer, GraphicsContext, RenderContext, RenderInitParams};
use crate::mpv::MpvHandle;
use crate::player::Notifier;
use crate::utils::error::{IntoMpvError, MpvError, Result};
use log::{debug, error, info};
use raw_window_handle::RawDisplayHandle;
use std::sync::Arc;

/// Lifecycle of the native render context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    Uninitialized,
    Initialized,
}

/// Draws mpv frames into host framebuffers
pub struct MpvRenderer {
    handle: Arc<dyn MpvHandle>,
    notifier: Notifier,
    context: Option<Box<dyn RenderContext>>,
    framebuffer: Option<Framebuffer>,
    flip_y: bool,
}

impl MpvRenderer {
    /// Create an uninitialized bridge; see [`crate::player::MpvObject::create_renderer`]
    pub fn new(handle: Arc<dyn MpvHandle>, notifier: Notifier) -> Self {
        Self {
            handle,
            notifier,
            context: None,
            framebuffer: None,
            flip_y: true,
        }
    }

    pub fn state(&self) -> RendererState {
        if self.context.is_some() {
            RendererState::Initialized
        } else {
            RendererState::Uninitialized
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.state() == RendererState::Initialized
    }

    /// Whether frames are flipped vertically; on by default for FBO targets
    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    pub fn set_flip_y(&mut self, flip_y: bool) {
        self.flip_y = flip_y;
    }

    /// The framebuffer handed out by the last [`Self::create_framebuffer`]
    pub fn framebuffer(&self) -> Option<Framebuffer> {
        self.framebuffer
    }

    /// Allocate the framebuffer to render into
    ///
    /// The first call also creates mpv's render context, so the host's GL
    /// context must be current.
    ///
    /// # Arguments
    ///
    /// * `graphics` - The host surface
    /// * `width` - Framebuffer width in pixels
    /// * `height` - Framebuffer height in pixels
    ///
    /// # Panics
    ///
    /// In debug builds, when the render context cannot be created
    pub fn create_framebuffer(
        &mut self,
        graphics: &mut dyn GraphicsContext,
        width: i32,
        height: i32,
    ) -> Result<Framebuffer> {
        if self.context.is_none() {
            self.initialize(graphics)?;
        }
        let framebuffer = graphics.create_framebuffer(width, height)?;
        debug!(
            "Render target {}x{} (fbo {})",
            framebuffer.width, framebuffer.height, framebuffer.handle
        );
        self.framebuffer = Some(framebuffer);
        Ok(framebuffer)
    }

    fn initialize(&mut self, graphics: &mut dyn GraphicsContext) -> Result<()> {
        let mut params = RenderInitParams::opengl(graphics.proc_address_resolver());
        params.display = platform_display(&graphics.platform_name(), graphics.display_handle());

        let mut context = match self.handle.create_render_context(params) {
            Ok(context) => context,
            Err(e) => {
                error!("Failed to create mpv render context: {}", e);
                if cfg!(debug_assertions) {
                    panic!("failed to create mpv render context: {}", e);
                }
                return Err(e).renderer_err("failed to create mpv render context");
            }
        };

        let notifier = self.notifier.clone();
        context.set_update_callback(Some(Box::new(move || notifier.request_update())));
        self.context = Some(context);
        info!("mpv render context created");

        self.notifier.init_finished();
        Ok(())
    }

    /// Render the current frame into the last created framebuffer
    pub fn render(&mut self, graphics: &mut dyn GraphicsContext) -> Result<()> {
        let target = self
            .framebuffer
            .ok_or_else(|| MpvError::Renderer("no framebuffer to render into".to_string()))?;
        self.render_to(graphics, &target)
    }

    /// Render the current frame into `target`
    ///
    /// Host GL state is reset before and after mpv draws.
    pub fn render_to(&mut self, graphics: &mut dyn GraphicsContext, target: &Framebuffer) -> Result<()> {
        let Some(context) = self.context.as_mut() else {
            return Err(MpvError::Renderer(
                "render context is not initialized".to_string(),
            ));
        };
        graphics.reset_state();
        let result = context.render(target, self.flip_y);
        graphics.reset_state();
        result
    }
}

impl Drop for MpvRenderer {
    fn drop(&mut self) {
        if let Some(mut context) = self.context.take() {
            context.set_update_callback(None);
            debug!("mpv render context released");
        }
    }
}

/// Pick the display connection libmpv needs on Linux X11 and Wayland hosts
fn platform_display(platform: &str, display: Option<RawDisplayHandle>) -> Option<RawDisplayHandle> {
    if !cfg!(target_os = "linux") {
        return None;
    }
    match display? {
        RawDisplayHandle::Xlib(handle) if platform.contains("xcb") => {
            Some(RawDisplayHandle::Xlib(handle))
        }
        RawDisplayHandle::Wayland(handle) if platform.contains("wayland") => {
            Some(RawDisplayHandle::Wayland(handle))
        }
        _ => None,
    }
}

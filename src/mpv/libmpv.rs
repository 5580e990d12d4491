//! libmpv backend
//!
//! [`LibMpv`] implements [`MpvHandle`] on top of the C client API. Values
//! cross the boundary as `mpv_node` trees; callbacks are boxed closures
//! reached through `extern "C"` trampolines.

use super::ffi::*;
use super::{EndFileReason, LogMessage, MpvEvent, MpvHandle, MpvValue, NativeLogLevel, WakeupCallback};
use crate::render::{
    Framebuffer, ProcAddressFn, RenderContext, RenderInitParams, UpdateCallback,
};
use crate::utils::error::{MpvError, Result};
use log::{debug, info};
use parking_lot::Mutex;
use raw_window_handle::RawDisplayHandle;
use std::collections::BTreeMap;
use std::ffi::{CStr, CString};
use std::os::raw::{c_char, c_int, c_void};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use std::sync::Arc;
use std::time::Duration;

/// Owns the `mpv_handle`; destroyed after the last render context is gone
struct Core {
    ptr: NonNull<mpv_handle>,
}

// The client API is thread-safe; every call takes mpv's own locks.
unsafe impl Send for Core {}
unsafe impl Sync for Core {}

impl Core {
    fn as_ptr(&self) -> *mut mpv_handle {
        self.ptr.as_ptr()
    }
}

impl Drop for Core {
    fn drop(&mut self) {
        info!("Destroying mpv core");
        unsafe { mpv_terminate_destroy(self.ptr.as_ptr()) };
    }
}

/// A libmpv client handle
pub struct LibMpv {
    core: Arc<Core>,
    wakeup: Mutex<Option<Box<WakeupCallback>>>,
    /// `mpv_wait_event` must not run concurrently on one handle
    events: Mutex<()>,
}

impl LibMpv {
    /// Create an uninitialized core
    pub fn new() -> Result<Self> {
        let ptr = NonNull::new(unsafe { mpv_create() })
            .ok_or_else(|| MpvError::Internal("mpv_create returned null".to_string()))?;
        debug!("mpv core created");
        Ok(Self {
            core: Arc::new(Core { ptr }),
            wakeup: Mutex::new(None),
            events: Mutex::new(()),
        })
    }

    fn ptr(&self) -> *mut mpv_handle {
        self.core.as_ptr()
    }
}

impl Drop for LibMpv {
    fn drop(&mut self) {
        unsafe { mpv_set_wakeup_callback(self.ptr(), None, ptr::null_mut()) };
        self.wakeup.lock().take();
    }
}

fn check<S: Into<String>>(code: c_int, context: S) -> Result<()> {
    if code < 0 {
        Err(MpvError::native(context, code))
    } else {
        Ok(())
    }
}

impl MpvHandle for LibMpv {
    fn initialize(&self) -> Result<()> {
        check(unsafe { mpv_initialize(self.ptr()) }, "initialize")
    }

    fn get_property(&self, name: &str) -> Result<MpvValue> {
        let c_name = CString::new(name)?;
        let mut node = none_node();
        let code = unsafe {
            mpv_get_property(
                self.ptr(),
                c_name.as_ptr(),
                MPV_FORMAT_NODE,
                &mut node as *mut mpv_node as *mut c_void,
            )
        };
        check(code, format!("get property {}", name))?;
        let value = unsafe { value_from_node(&node) };
        unsafe { mpv_free_node_contents(&mut node) };
        Ok(value)
    }

    fn set_property(&self, name: &str, value: &MpvValue) -> Result<()> {
        let c_name = CString::new(name)?;
        let mut owned = OwnedNode::new(value)?;
        let code = unsafe {
            mpv_set_property(self.ptr(), c_name.as_ptr(), MPV_FORMAT_NODE, owned.as_mut_ptr())
        };
        check(code, format!("set property {}", name))
    }

    fn set_property_async(&self, name: &str, value: &MpvValue, reply_userdata: u64) -> Result<()> {
        let c_name = CString::new(name)?;
        let mut owned = OwnedNode::new(value)?;
        let code = unsafe {
            mpv_set_property_async(
                self.ptr(),
                reply_userdata,
                c_name.as_ptr(),
                MPV_FORMAT_NODE,
                owned.as_mut_ptr(),
            )
        };
        check(code, format!("set property {}", name))
    }

    fn command(&self, args: &[MpvValue]) -> Result<MpvValue> {
        let mut owned = OwnedNode::new(&MpvValue::List(args.to_vec()))?;
        let mut result = none_node();
        let code = unsafe { mpv_command_node(self.ptr(), &mut owned.node, &mut result) };
        check(code, format!("command {}", command_name(args)))?;
        let value = unsafe { value_from_node(&result) };
        unsafe { mpv_free_node_contents(&mut result) };
        Ok(value)
    }

    fn command_async(&self, args: &[MpvValue], reply_userdata: u64) -> Result<()> {
        let mut owned = OwnedNode::new(&MpvValue::List(args.to_vec()))?;
        let code = unsafe { mpv_command_node_async(self.ptr(), reply_userdata, &mut owned.node) };
        check(code, format!("command {}", command_name(args)))
    }

    fn observe_property(&self, name: &str, reply_userdata: u64) -> Result<()> {
        let c_name = CString::new(name)?;
        let code = unsafe {
            mpv_observe_property(self.ptr(), reply_userdata, c_name.as_ptr(), MPV_FORMAT_NONE)
        };
        check(code, format!("observe property {}", name))
    }

    fn request_log_messages(&self, min_level: NativeLogLevel) -> Result<()> {
        let level = CString::new(min_level.as_str())?;
        check(
            unsafe { mpv_request_log_messages(self.ptr(), level.as_ptr()) },
            "request log messages",
        )
    }

    fn wait_event(&self, timeout: Duration) -> MpvEvent {
        let _guard = self.events.lock();
        let event = unsafe { mpv_wait_event(self.ptr(), timeout.as_secs_f64()) };
        if event.is_null() {
            return MpvEvent::None;
        }
        unsafe { event_from_raw(&*event) }
    }

    fn set_wakeup_callback(&self, callback: Option<WakeupCallback>) {
        let mut slot = self.wakeup.lock();
        match callback {
            Some(callback) => {
                let boxed = Box::new(callback);
                let ctx = &*boxed as *const WakeupCallback as *mut c_void;
                unsafe { mpv_set_wakeup_callback(self.ptr(), Some(callback_trampoline), ctx) };
                *slot = Some(boxed);
            }
            None => {
                unsafe { mpv_set_wakeup_callback(self.ptr(), None, ptr::null_mut()) };
                *slot = None;
            }
        }
    }

    fn create_render_context(&self, params: RenderInitParams) -> Result<Box<dyn RenderContext>> {
        let api_type = CString::new(params.api_type)?;
        let resolver: Box<ProcAddressFn> = Box::new(params.proc_address);
        let mut init_params = mpv_opengl_init_params {
            get_proc_address: Some(proc_address_trampoline),
            get_proc_address_ctx: &*resolver as *const ProcAddressFn as *mut c_void,
        };

        let mut raw = vec![
            render_param(MPV_RENDER_PARAM_API_TYPE, api_type.as_ptr() as *mut c_void),
            render_param(
                MPV_RENDER_PARAM_OPENGL_INIT_PARAMS,
                &mut init_params as *mut mpv_opengl_init_params as *mut c_void,
            ),
        ];
        match params.display {
            Some(RawDisplayHandle::Xlib(handle)) => {
                if let Some(display) = handle.display {
                    raw.push(render_param(MPV_RENDER_PARAM_X11_DISPLAY, display.as_ptr()));
                }
            }
            Some(RawDisplayHandle::Wayland(handle)) => {
                raw.push(render_param(MPV_RENDER_PARAM_WL_DISPLAY, handle.display.as_ptr()));
            }
            _ => {}
        }
        raw.push(render_param(MPV_RENDER_PARAM_INVALID, ptr::null_mut()));

        let mut ctx: *mut mpv_render_context = ptr::null_mut();
        let code = unsafe { mpv_render_context_create(&mut ctx, self.ptr(), raw.as_mut_ptr()) };
        check(code, "create render context")?;
        let ctx = NonNull::new(ctx)
            .ok_or_else(|| MpvError::Renderer("mpv returned a null render context".to_string()))?;

        Ok(Box::new(LibMpvRenderContext {
            ctx,
            update: None,
            _resolver: resolver,
            _core: Arc::clone(&self.core),
        }))
    }
}

/// OpenGL render context bound to a [`LibMpv`] core
struct LibMpvRenderContext {
    ctx: NonNull<mpv_render_context>,
    update: Option<Box<UpdateCallback>>,
    _resolver: Box<ProcAddressFn>,
    _core: Arc<Core>,
}

// Only used from the render thread; the pointer is never shared.
unsafe impl Send for LibMpvRenderContext {}

impl RenderContext for LibMpvRenderContext {
    fn set_update_callback(&mut self, callback: Option<UpdateCallback>) {
        match callback {
            Some(callback) => {
                let boxed = Box::new(callback);
                let ctx = &*boxed as *const UpdateCallback as *mut c_void;
                unsafe {
                    mpv_render_context_set_update_callback(
                        self.ctx.as_ptr(),
                        Some(callback_trampoline),
                        ctx,
                    )
                };
                self.update = Some(boxed);
            }
            None => {
                unsafe {
                    mpv_render_context_set_update_callback(self.ctx.as_ptr(), None, ptr::null_mut())
                };
                self.update = None;
            }
        }
    }

    fn render(&mut self, target: &Framebuffer, flip_y: bool) -> Result<()> {
        let fbo = c_int::try_from(target.handle)
            .map_err(|_| MpvError::InvalidInput(format!("framebuffer handle {}", target.handle)))?;
        let mut fbo = mpv_opengl_fbo {
            fbo,
            w: target.width,
            h: target.height,
            internal_format: target.internal_format,
        };
        let mut flip: c_int = c_int::from(flip_y);
        let mut params = [
            render_param(
                MPV_RENDER_PARAM_OPENGL_FBO,
                &mut fbo as *mut mpv_opengl_fbo as *mut c_void,
            ),
            render_param(MPV_RENDER_PARAM_FLIP_Y, &mut flip as *mut c_int as *mut c_void),
            render_param(MPV_RENDER_PARAM_INVALID, ptr::null_mut()),
        ];
        check(
            unsafe { mpv_render_context_render(self.ctx.as_ptr(), params.as_mut_ptr()) },
            "render",
        )
    }
}

impl Drop for LibMpvRenderContext {
    fn drop(&mut self) {
        unsafe {
            mpv_render_context_set_update_callback(self.ctx.as_ptr(), None, ptr::null_mut());
            mpv_render_context_free(self.ctx.as_ptr());
        }
        self.update = None;
    }
}

fn render_param(type_: mpv_render_param_type, data: *mut c_void) -> mpv_render_param {
    mpv_render_param { type_, data }
}

unsafe extern "C" fn callback_trampoline(ctx: *mut c_void) {
    if ctx.is_null() {
        return;
    }
    let callback = &*(ctx as *const Box<dyn Fn() + Send + Sync>);
    let _ = catch_unwind(AssertUnwindSafe(|| callback()));
}

unsafe extern "C" fn proc_address_trampoline(ctx: *mut c_void, name: *const c_char) -> *mut c_void {
    if ctx.is_null() || name.is_null() {
        return ptr::null_mut();
    }
    let resolver = &*(ctx as *const ProcAddressFn);
    let name = CStr::from_ptr(name).to_string_lossy();
    catch_unwind(AssertUnwindSafe(|| resolver(&name))).unwrap_or(ptr::null_mut())
}

fn command_name(args: &[MpvValue]) -> String {
    args.first().map(MpvValue::to_text).unwrap_or_default()
}

fn none_node() -> mpv_node {
    mpv_node {
        u: mpv_node_u { int64: 0 },
        format: MPV_FORMAT_NONE,
    }
}

/// An `mpv_node` tree together with the allocations it points into
struct OwnedNode {
    node: mpv_node,
    strings: Vec<CString>,
    arrays: Vec<Vec<mpv_node>>,
    keys: Vec<Vec<*mut c_char>>,
    lists: Vec<Box<mpv_node_list>>,
}

impl OwnedNode {
    fn new(value: &MpvValue) -> Result<Self> {
        let mut owned = Self {
            node: none_node(),
            strings: Vec::new(),
            arrays: Vec::new(),
            keys: Vec::new(),
            lists: Vec::new(),
        };
        owned.node = owned.build(value)?;
        Ok(owned)
    }

    fn as_mut_ptr(&mut self) -> *mut c_void {
        &mut self.node as *mut mpv_node as *mut c_void
    }

    fn string(&mut self, text: &str) -> Result<*mut c_char> {
        let c_text = CString::new(text)?;
        let ptr = c_text.as_ptr() as *mut c_char;
        self.strings.push(c_text);
        Ok(ptr)
    }

    fn list(&mut self, mut values: Vec<mpv_node>, keys: Option<Vec<*mut c_char>>) -> Result<*mut mpv_node_list> {
        let num = c_int::try_from(values.len())
            .map_err(|_| MpvError::InvalidInput("node list too long".to_string()))?;
        let keys_ptr = match keys {
            Some(mut keys) => {
                let ptr = keys.as_mut_ptr();
                self.keys.push(keys);
                ptr
            }
            None => ptr::null_mut(),
        };
        let mut list = Box::new(mpv_node_list {
            num,
            values: values.as_mut_ptr(),
            keys: keys_ptr,
        });
        self.arrays.push(values);
        let ptr = &mut *list as *mut mpv_node_list;
        self.lists.push(list);
        Ok(ptr)
    }

    fn build(&mut self, value: &MpvValue) -> Result<mpv_node> {
        let node = match value {
            MpvValue::None => none_node(),
            MpvValue::Flag(flag) => mpv_node {
                u: mpv_node_u {
                    flag: c_int::from(*flag),
                },
                format: MPV_FORMAT_FLAG,
            },
            MpvValue::Int64(int64) => mpv_node {
                u: mpv_node_u { int64: *int64 },
                format: MPV_FORMAT_INT64,
            },
            MpvValue::Double(double) => mpv_node {
                u: mpv_node_u { double_: *double },
                format: MPV_FORMAT_DOUBLE,
            },
            MpvValue::String(text) => mpv_node {
                u: mpv_node_u {
                    string: self.string(text)?,
                },
                format: MPV_FORMAT_STRING,
            },
            MpvValue::List(items) => {
                let values = items
                    .iter()
                    .map(|item| self.build(item))
                    .collect::<Result<Vec<_>>>()?;
                mpv_node {
                    u: mpv_node_u {
                        list: self.list(values, None)?,
                    },
                    format: MPV_FORMAT_NODE_ARRAY,
                }
            }
            MpvValue::Map(map) => {
                let mut values = Vec::with_capacity(map.len());
                let mut keys = Vec::with_capacity(map.len());
                for (key, item) in map {
                    keys.push(self.string(key)?);
                    values.push(self.build(item)?);
                }
                mpv_node {
                    u: mpv_node_u {
                        list: self.list(values, Some(keys))?,
                    },
                    format: MPV_FORMAT_NODE_MAP,
                }
            }
        };
        Ok(node)
    }
}

unsafe fn text_from(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

/// Copy a node tree owned by libmpv into an [`MpvValue`]
unsafe fn value_from_node(node: &mpv_node) -> MpvValue {
    match node.format {
        MPV_FORMAT_STRING => MpvValue::String(text_from(node.u.string)),
        MPV_FORMAT_FLAG => MpvValue::Flag(node.u.flag != 0),
        MPV_FORMAT_INT64 => MpvValue::Int64(node.u.int64),
        MPV_FORMAT_DOUBLE => MpvValue::Double(node.u.double_),
        MPV_FORMAT_NODE_ARRAY => {
            MpvValue::List(node_slice(node.u.list).iter().map(|n| value_from_node(n)).collect())
        }
        MPV_FORMAT_NODE_MAP => {
            let list = node.u.list;
            let values = node_slice(list);
            let mut map = BTreeMap::new();
            if !values.is_empty() && !(*list).keys.is_null() {
                let keys = std::slice::from_raw_parts((*list).keys, values.len());
                for (key, value) in keys.iter().zip(values) {
                    map.insert(text_from(*key), value_from_node(value));
                }
            }
            MpvValue::Map(map)
        }
        // Byte arrays only come from the screenshot-raw command
        MPV_FORMAT_BYTE_ARRAY | MPV_FORMAT_NONE => MpvValue::None,
        _ => MpvValue::None,
    }
}

unsafe fn node_slice<'a>(list: *const mpv_node_list) -> &'a [mpv_node] {
    if list.is_null() || (*list).num <= 0 || (*list).values.is_null() {
        return &[];
    }
    std::slice::from_raw_parts((*list).values, (*list).num as usize)
}

unsafe fn property_value(property: &mpv_event_property) -> MpvValue {
    if property.data.is_null() {
        return MpvValue::None;
    }
    match property.format {
        MPV_FORMAT_NODE => value_from_node(&*(property.data as *const mpv_node)),
        MPV_FORMAT_FLAG => MpvValue::Flag(*(property.data as *const c_int) != 0),
        MPV_FORMAT_INT64 => MpvValue::Int64(*(property.data as *const i64)),
        MPV_FORMAT_DOUBLE => MpvValue::Double(*(property.data as *const f64)),
        MPV_FORMAT_STRING => MpvValue::String(text_from(*(property.data as *const *const c_char))),
        _ => MpvValue::None,
    }
}

unsafe fn event_from_raw(event: &mpv_event) -> MpvEvent {
    let data = event.data;
    match event.event_id {
        MPV_EVENT_NONE => MpvEvent::None,
        MPV_EVENT_SHUTDOWN => MpvEvent::Shutdown,
        MPV_EVENT_LOG_MESSAGE if !data.is_null() => {
            let message = &*(data as *const mpv_event_log_message);
            MpvEvent::LogMessage(LogMessage {
                prefix: text_from(message.prefix),
                level: NativeLogLevel::from_raw(message.log_level),
                text: text_from(message.text),
            })
        }
        MPV_EVENT_GET_PROPERTY_REPLY => {
            let (name, value) = if data.is_null() {
                (String::new(), MpvValue::None)
            } else {
                let property = &*(data as *const mpv_event_property);
                (text_from(property.name), property_value(property))
            };
            MpvEvent::GetPropertyReply {
                reply_userdata: event.reply_userdata,
                error: event.error,
                name,
                value,
            }
        }
        MPV_EVENT_SET_PROPERTY_REPLY => MpvEvent::SetPropertyReply {
            reply_userdata: event.reply_userdata,
            error: event.error,
        },
        MPV_EVENT_COMMAND_REPLY => {
            let result = if data.is_null() {
                MpvValue::None
            } else {
                value_from_node(&(*(data as *const mpv_event_command)).result)
            };
            MpvEvent::CommandReply {
                reply_userdata: event.reply_userdata,
                error: event.error,
                result,
            }
        }
        MPV_EVENT_START_FILE => MpvEvent::StartFile {
            playlist_entry_id: if data.is_null() {
                0
            } else {
                (*(data as *const mpv_event_start_file)).playlist_entry_id
            },
        },
        MPV_EVENT_END_FILE => {
            let (reason, error) = if data.is_null() {
                (EndFileReason::Unknown, 0)
            } else {
                let end = &*(data as *const mpv_event_end_file);
                (EndFileReason::from_raw(end.reason), end.error)
            };
            MpvEvent::EndFile { reason, error }
        }
        MPV_EVENT_FILE_LOADED => MpvEvent::FileLoaded,
        MPV_EVENT_IDLE => MpvEvent::Idle,
        MPV_EVENT_CLIENT_MESSAGE => {
            let mut args = Vec::new();
            if !data.is_null() {
                let message = &*(data as *const mpv_event_client_message);
                if message.num_args > 0 && !message.args.is_null() {
                    let raw = std::slice::from_raw_parts(message.args, message.num_args as usize);
                    args.extend(raw.iter().map(|arg| text_from(*arg)));
                }
            }
            MpvEvent::ClientMessage(args)
        }
        MPV_EVENT_VIDEO_RECONFIG => MpvEvent::VideoReconfig,
        MPV_EVENT_AUDIO_RECONFIG => MpvEvent::AudioReconfig,
        MPV_EVENT_SEEK => MpvEvent::Seek,
        MPV_EVENT_PLAYBACK_RESTART => MpvEvent::PlaybackRestart,
        MPV_EVENT_PROPERTY_CHANGE if !data.is_null() => {
            let property = &*(data as *const mpv_event_property);
            MpvEvent::PropertyChange {
                reply_userdata: event.reply_userdata,
                name: text_from(property.name),
                value: property_value(property),
            }
        }
        MPV_EVENT_QUEUE_OVERFLOW => MpvEvent::QueueOverflow,
        MPV_EVENT_HOOK if !data.is_null() => {
            let hook = &*(data as *const mpv_event_hook);
            MpvEvent::Hook {
                name: text_from(hook.name),
                id: hook.id,
            }
        }
        other => MpvEvent::Unknown(other),
    }
}

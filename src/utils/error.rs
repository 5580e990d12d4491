//! Error types for mpv-object
//!
//! This module defines the error type shared by the native backends, the
//! control facade and the render bridge. We use thiserror for the library
//! error type and anyhow for application-level error handling in the binary.

use thiserror::Error;

/// Main error type for mpv-object
#[derive(Error, Debug)]
pub enum MpvError {
    /// A libmpv call returned a negative error code
    #[error("{context}: {} ({code})", describe(.code))]
    Native {
        /// What was being attempted, e.g. "set property volume"
        context: String,
        /// The raw libmpv error code
        code: i32,
    },

    /// The core announced shutdown; no further requests are served
    #[error("mpv core is shutting down")]
    Shutdown,

    /// Render context errors
    #[error("Renderer error: {0}")]
    Renderer(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("File error: {0}")]
    FileIO(#[from] std::io::Error),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error for unexpected situations
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MpvError {
    /// Create a native error from a libmpv return code
    pub fn native<S: Into<String>>(context: S, code: i32) -> Self {
        MpvError::Native {
            context: context.into(),
            code,
        }
    }

    /// The libmpv error code, if this error came from the native library
    pub fn code(&self) -> Option<i32> {
        match self {
            MpvError::Native { code, .. } => Some(*code),
            _ => None,
        }
    }
}

impl From<std::ffi::NulError> for MpvError {
    fn from(err: std::ffi::NulError) -> Self {
        MpvError::InvalidInput(format!("string contains a NUL byte: {}", err))
    }
}

/// Convenience type alias for Results in mpv-object
pub type Result<T> = std::result::Result<T, MpvError>;

/// Human readable name of a libmpv error code (`mpv_error` in client.h)
pub fn error_name(code: i32) -> &'static str {
    match code {
        0 => "success",
        -1 => "event queue full",
        -2 => "memory allocation failed",
        -3 => "core not initialized",
        -4 => "invalid parameter",
        -5 => "option not found",
        -6 => "unsupported format for accessing option",
        -7 => "error setting option",
        -8 => "property not found",
        -9 => "unsupported format for accessing property",
        -10 => "property unavailable",
        -11 => "error accessing property",
        -12 => "error running command",
        -13 => "loading failed",
        -14 => "audio output initialization failed",
        -15 => "video output initialization failed",
        -16 => "no audio or video data played",
        -17 => "unrecognized file format",
        -18 => "not supported",
        -19 => "operation not implemented",
        -20 => "something happened",
        _ => "unknown error",
    }
}

fn describe(code: &i32) -> &'static str {
    error_name(*code)
}

/// Extension trait for converting other errors to MpvError
pub trait IntoMpvError<T> {
    /// Convert this error into a MpvError with the given context
    fn renderer_err(self, context: &str) -> Result<T>;
    fn config_err(self, context: &str) -> Result<T>;
}

impl<T, E: std::fmt::Display> IntoMpvError<T> for std::result::Result<T, E> {
    fn renderer_err(self, context: &str) -> Result<T> {
        self.map_err(|e| MpvError::Renderer(format!("{}: {}", context, e)))
    }

    fn config_err(self, context: &str) -> Result<T> {
        self.map_err(|e| MpvError::Config(format!("{}: {}", context, e)))
    }
}

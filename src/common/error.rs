//! Error types for the call tracer
//!
//! Protocol errors carry the raw debugger text that triggered them so a
//! failed session can be diagnosed from the report alone.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the call tracer
#[derive(Error, Debug)]
pub enum Error {
    // === Breakpoint Specifier Errors ===
    #[error("Unbalanced parentheses in breakpoint specifier '{spec}' at offset {position}")]
    UnbalancedParentheses { spec: String, position: usize },

    #[error("Malformed breakpoint specifier '{spec}': {reason}")]
    MalformedSpecifier { spec: String, reason: String },

    // === Breakpoint Registration Errors ===
    #[error("Failed to set breakpoint at {location}: {reason}")]
    BreakpointFailed { location: String, reason: String },

    #[error("Invalid exclude pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    // === Debugger Process Errors ===
    #[error("Debugger '{0}' not found. Install gdb or pass --gdb <path>")]
    DebuggerNotFound(String),

    #[error("Debugger failed to start: {0}")]
    DebuggerStartFailed(String),

    #[error("Debugger exited unexpectedly. Last output:\n{partial}")]
    DebuggerExited { partial: String },

    // === Protocol Errors ===
    #[error("No prompt from debugger within {secs} seconds. Partial output:\n{partial}")]
    ProtocolTimeout { secs: u64, partial: String },

    #[error("Unrecognized debugger response:\n{0}")]
    UnrecognizedResponse(String),

    #[error("Return value '{0}' reported while no call is open")]
    UnexpectedReturn(String),

    // === Stack Bookkeeping Errors ===
    #[error("Call #{node} returned at depth {depth} but its caller #{parent} is at depth {parent_depth}")]
    InvalidNextFrame {
        node: u64,
        parent: u64,
        depth: usize,
        parent_depth: usize,
    },

    #[error("Breakpoint {breakpoint} hit at depth {reported}, shallower than open call #{node} at depth {current}")]
    InvalidBacktrace {
        breakpoint: u32,
        node: u64,
        current: usize,
        reported: usize,
    },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a breakpoint failed error
    pub fn breakpoint_failed(location: &str, reason: &str) -> Self {
        Self::BreakpointFailed {
            location: location.to_string(),
            reason: reason.trim().to_string(),
        }
    }

    /// Create a malformed specifier error
    pub fn malformed(spec: &str, reason: &str) -> Self {
        Self::MalformedSpecifier {
            spec: spec.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error means the session text protocol is out of sync.
    ///
    /// None of these are retried: the debugger's state no longer matches the
    /// call tree, so any further command would build on a wrong model.
    pub fn is_protocol_fatal(&self) -> bool {
        matches!(
            self,
            Error::ProtocolTimeout { .. }
                | Error::UnrecognizedResponse(_)
                | Error::UnexpectedReturn(_)
                | Error::InvalidNextFrame { .. }
                | Error::InvalidBacktrace { .. }
                | Error::DebuggerExited { .. }
        )
    }

    /// Short machine-readable code, used in JSON reports
    pub fn code(&self) -> &'static str {
        match self {
            Error::UnbalancedParentheses { .. } | Error::MalformedSpecifier { .. } => {
                "MALFORMED_SPECIFIER"
            }
            Error::BreakpointFailed { .. } => "BREAKPOINT_FAILED",
            Error::InvalidPattern { .. } => "INVALID_PATTERN",
            Error::DebuggerNotFound(_) | Error::DebuggerStartFailed(_) => "DEBUGGER_START_FAILED",
            Error::DebuggerExited { .. } => "DEBUGGER_EXITED",
            Error::ProtocolTimeout { .. } => "PROTOCOL_TIMEOUT",
            Error::UnrecognizedResponse(_) => "UNRECOGNIZED_RESPONSE",
            Error::UnexpectedReturn(_) => "UNEXPECTED_RETURN",
            Error::InvalidNextFrame { .. } => "INVALID_NEXT_FRAME",
            Error::InvalidBacktrace { .. } => "INVALID_BACKTRACE",
            Error::Config(_) | Error::ConfigParse(_) => "CONFIG",
            _ => "INTERNAL_ERROR",
        }
    }
}

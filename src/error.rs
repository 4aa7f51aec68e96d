//! Error types for remcon
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using RemconError
pub type Result<T> = std::result::Result<T, RemconError>;

/// Unified error type for remcon operations
#[derive(Debug, Error)]
pub enum RemconError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Framing Errors (fatal to the connection)
    // -------------------------------------------------------------------------
    /// Peer closed the stream in the middle of a frame. A frame read either
    /// yields every declared byte or fails here; a short read is never
    /// returned as a complete frame.
    #[error("connection closed mid-frame: expected {expected} bytes, received {received}")]
    ConnectionClosed { expected: usize, received: usize },

    /// Declared frame length exceeds the configured maximum. Raised before
    /// any payload allocation.
    #[error("frame too large: declared {length} bytes (max {max})")]
    FrameTooLarge { length: u32, max: u32 },

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed envelope or status line that cannot be interpreted.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Unknown command token or malformed argument. Recoverable: the
    /// dispatcher answers with a generic-error response and keeps the
    /// session alive.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// The peer reported a failure status for a request (client side).
    #[error("server returned {code}: {message}")]
    Remote { code: &'static str, message: String },

    // -------------------------------------------------------------------------
    // Operation Errors
    // -------------------------------------------------------------------------
    #[error("screenshot capture failed: {0}")]
    Screenshot(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

//! Response definitions
//!
//! Represents responses to clients.
//!
//! A response travels inside a frame as ASCII text `CC|MSG` where `CC` is a
//! 2-character status code and `MSG` is free text. Two commands follow the
//! response with a streamed frame sequence; the listing stream is announced
//! by an exact marker message (see [`Response::LISTING_START`]).

use crate::error::{RemconError, Result};

/// Response status codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    NotFound,
    PermissionDenied,
    Error,
}

impl Status {
    /// 2-character wire code
    pub fn code(self) -> &'static str {
        match self {
            Status::Success => "00",
            Status::NotFound => "02",
            Status::PermissionDenied => "08",
            Status::Error => "09",
        }
    }

    /// Parse a 2-character wire code
    pub fn from_code(code: &str) -> Result<Status> {
        match code {
            "00" => Ok(Status::Success),
            "02" => Ok(Status::NotFound),
            "08" => Ok(Status::PermissionDenied),
            "09" => Ok(Status::Error),
            _ => Err(RemconError::Protocol(format!(
                "unknown response status: {:?}",
                code
            ))),
        }
    }
}

/// A response to send to the client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Human-readable message
    pub message: String,
}

impl Response {
    /// Marker message announcing a file-transfer stream
    pub const TRANSFER_START: &'static str = "Starting file transfer";

    /// Marker message announcing a directory-listing stream
    ///
    /// The listing follow-up frames are sent only after this exact text; a
    /// success response with any other message (notably
    /// [`Response::EMPTY_DIR`]) has no follow-up frames. The success code is
    /// reused for both shapes and only the message text distinguishes them,
    /// a fragile corner of the wire protocol kept for compatibility.
    pub const LISTING_START: &'static str = "Directory listing starts";

    /// Message for listing an existing directory with no entries
    pub const EMPTY_DIR: &'static str = "Directory is empty";

    /// Create a SUCCESS response
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    /// Create a NOT_FOUND response
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: Status::NotFound,
            message: message.into(),
        }
    }

    /// Create a PERMISSION_DENIED response
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self {
            status: Status::PermissionDenied,
            message: message.into(),
        }
    }

    /// Create a generic ERROR response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
        }
    }

    /// Encode as the `CC|MSG` envelope carried inside a frame
    pub fn encode(&self) -> Vec<u8> {
        format!("{}|{}", self.status.code(), self.message).into_bytes()
    }

    /// Parse a response envelope
    pub fn parse(payload: &[u8]) -> Result<Response> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| RemconError::Protocol("response is not valid UTF-8".to_string()))?;

        let (code, message) = text
            .split_once('|')
            .ok_or_else(|| RemconError::Protocol(format!("response without delimiter: {:?}", text)))?;

        Ok(Response {
            status: Status::from_code(code)?,
            message: message.to_string(),
        })
    }

    /// True if the status is SUCCESS
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

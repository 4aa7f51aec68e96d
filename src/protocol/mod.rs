//! Protocol Module
//!
//! Defines the wire protocol for client-server communication.
//!
//! ## Protocol Format
//!
//! Every message is one frame:
//! ```text
//! ┌──────────────┬─────────────────────────────┐
//! │ Length (4)   │         Payload             │
//! └──────────────┴─────────────────────────────┘
//! ```
//! Length is big-endian unsigned 32-bit; a zero-length frame terminates a
//! streamed sequence.
//!
//! ### Requests
//! ASCII text `CMD|ARG`, split on the first `|`:
//! - `TSCR` - capture a screenshot
//! - `SNDF` - send (download) a file
//! - `SDIR` - directory listing
//! - `DELT` - delete a file
//! - `COPY` - copy a file (`ARG` is `src dst`)
//! - `EXCT` - execute a program
//! - `EXIT` - terminate the session
//!
//! ### Responses
//! ASCII text `CC|MSG`:
//! - `00` - SUCCESS
//! - `02` - NOT_FOUND
//! - `08` - PERMISSION_DENIED
//! - `09` - ERROR
//!
//! ### Streaming follow-ups
//! - `SNDF`: after `00|Starting file transfer`, binary chunk frames
//!   (each at most [`MAX_CHUNK_SIZE`] bytes), then one empty frame.
//! - `SDIR`: after `00|Directory listing starts`, one frame per entry name,
//!   then one empty frame. A success response with any other message has no
//!   follow-up frames.

mod command;
mod response;

pub mod framing;

pub use command::Command;
pub use framing::{
    read_frame, write_frame, write_terminator, LEN_PREFIX_SIZE, MAX_CHUNK_SIZE, MAX_FRAME_SIZE,
};
pub use response::{Response, Status};

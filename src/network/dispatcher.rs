//! Connection Dispatcher
//!
//! The per-connection command loop: reads one framed request, routes it to
//! the matching operation, answers with a framed response, and drives the
//! streaming sub-protocols for directory listings and file transfers.
//!
//! The dispatcher is generic over the byte stream and the operations
//! collaborator, so the whole state machine runs against in-memory streams
//! in tests. TCP specifics live in [`super::Connection`].
//!
//! ## Error tiers
//! - Framing/transport failures (truncated frame, oversize length, socket
//!   error) are fatal: `run` returns the error and the connection dies.
//! - Handler failures (missing file, permission error, launch failure) are
//!   converted to a status-code response and the session continues.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crate::error::{RemconError, Result};
use crate::ops::Operations;
use crate::protocol::{
    read_frame, write_frame, write_terminator, Command, Response, MAX_CHUNK_SIZE,
};

/// Whether the session continues after a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionControl {
    Continue,
    Close,
}

/// Drives one session over a pair of byte streams
pub struct Dispatcher<R, W, O> {
    reader: R,
    writer: W,
    ops: O,

    /// Peer label for logging
    peer: String,
}

impl<R: Read, W: Write, O: Operations> Dispatcher<R, W, O> {
    /// Create a dispatcher over the given streams and collaborator
    pub fn new(reader: R, writer: W, ops: O, peer: impl Into<String>) -> Self {
        Self {
            reader,
            writer,
            ops,
            peer: peer.into(),
        }
    }

    /// Run the command loop until EXIT, client disconnect, or a fatal error
    ///
    /// Requests are strictly sequential: the next frame is not read until
    /// the current request's response, including any streamed follow-up
    /// frames, has been fully written.
    pub fn run(&mut self) -> Result<()> {
        loop {
            let payload = match read_frame(&mut self.reader)? {
                Some(payload) => payload,
                None => {
                    tracing::debug!("client {} disconnected", self.peer);
                    return Ok(());
                }
            };

            match self.handle_request(&payload)? {
                SessionControl::Continue => {}
                SessionControl::Close => {
                    tracing::debug!("client {} ended the session", self.peer);
                    return Ok(());
                }
            }
        }
    }

    /// Decode and execute one request
    fn handle_request(&mut self, payload: &[u8]) -> Result<SessionControl> {
        let command = match Command::parse(payload) {
            Ok(command) => command,
            Err(e) => {
                // Unknown token or malformed argument: report and keep the
                // session alive.
                tracing::warn!("bad request from {}: {}", self.peer, e);
                self.send_response(&Response::error(e.to_string()))?;
                return Ok(SessionControl::Continue);
            }
        };

        tracing::trace!("request from {}: {} ({:?})", self.peer, command.tag(), command);

        match command {
            Command::Screenshot { dest } => self.screenshot(&dest),
            Command::FetchFile { path } => self.fetch_file(&path),
            Command::ListDir { path } => self.list_dir(&path),
            Command::Delete { path } => self.delete(&path),
            Command::Copy { src, dst } => self.copy(&src, &dst),
            Command::Execute { command } => self.execute(&command),
            Command::Exit => {
                self.send_response(&Response::success("Disconnected"))?;
                Ok(SessionControl::Close)
            }
        }
    }

    // =========================================================================
    // Simple commands: one response frame each
    // =========================================================================

    fn screenshot(&mut self, dest: &str) -> Result<SessionControl> {
        let response = match self.ops.capture_screenshot(Path::new(dest)) {
            Ok(()) => Response::success(format!("Screenshot saved at {}", dest)),
            Err(e) => failure_response(e, "File not found", "Failed to save screenshot"),
        };
        self.send_response(&response)?;
        Ok(SessionControl::Continue)
    }

    fn delete(&mut self, path: &str) -> Result<SessionControl> {
        let response = match self.ops.delete_file(Path::new(path)) {
            Ok(()) => Response::success(format!("File {} deleted", path)),
            Err(e) => failure_response(e, "File not found", "Failed to delete file"),
        };
        self.send_response(&response)?;
        Ok(SessionControl::Continue)
    }

    fn copy(&mut self, src: &str, dst: &str) -> Result<SessionControl> {
        let response = match self.ops.copy_file(Path::new(src), Path::new(dst)) {
            Ok(()) => Response::success(format!("File copied from {} to {}", src, dst)),
            Err(e) => failure_response(e, "File not found", "Failed to copy file"),
        };
        self.send_response(&response)?;
        Ok(SessionControl::Continue)
    }

    fn execute(&mut self, command: &str) -> Result<SessionControl> {
        let response = match self.ops.run_program(command) {
            Ok(note) => Response::success(format!("Program {} executed: {}", command, note)),
            Err(e) => failure_response(e, "Program not found", "Failed to execute program"),
        };
        self.send_response(&response)?;
        Ok(SessionControl::Continue)
    }

    // =========================================================================
    // Streaming commands
    // =========================================================================

    /// SNDF: stream a file back in chunk frames
    ///
    /// Missing file: one NOT_FOUND response, no follow-up frames. Otherwise:
    /// the transfer-start response, chunk frames of at most
    /// [`MAX_CHUNK_SIZE`] bytes, and one empty terminator frame. Once the
    /// transfer header is on the wire there is no in-band failure channel,
    /// so a read error mid-stream is fatal to the connection and the client
    /// treats the missing terminator as a failed transfer.
    fn fetch_file(&mut self, path: &str) -> Result<SessionControl> {
        let mut file = match self.ops.open_file(Path::new(path)) {
            Ok(file) => file,
            Err(e) => {
                let response = failure_response(e, "File not found", "File sending failed");
                self.send_response(&response)?;
                return Ok(SessionControl::Continue);
            }
        };

        self.send_response(&Response::success(Response::TRANSFER_START))?;

        let mut chunk = vec![0u8; MAX_CHUNK_SIZE];
        let mut sent: u64 = 0;
        loop {
            let filled = fill_chunk(&mut file, &mut chunk)?;
            if filled == 0 {
                break;
            }
            write_frame(&mut self.writer, &chunk[..filled])?;
            sent += filled as u64;
        }
        write_terminator(&mut self.writer)?;

        tracing::debug!("sent {} ({} bytes) to {}", path, sent, self.peer);
        Ok(SessionControl::Continue)
    }

    /// SDIR: stream the entry names of a directory
    ///
    /// Missing directory: NOT_FOUND, no follow-up. Existing but empty: a
    /// success response with no follow-up frames. Non-empty: the
    /// listing-start marker, one frame per name, and a terminator. The
    /// success code is shared between the last two shapes; only the marker
    /// text tells the client to expect follow-up frames.
    fn list_dir(&mut self, path: &str) -> Result<SessionControl> {
        let names = match self.ops.list_directory(Path::new(path)) {
            Ok(names) => names,
            Err(e) => {
                let response = failure_response(e, "Directory not found", "Failed to read directory");
                self.send_response(&response)?;
                return Ok(SessionControl::Continue);
            }
        };

        if names.is_empty() {
            self.send_response(&Response::success(Response::EMPTY_DIR))?;
            return Ok(SessionControl::Continue);
        }

        self.send_response(&Response::success(Response::LISTING_START))?;
        for name in &names {
            write_frame(&mut self.writer, name.as_bytes())?;
        }
        write_terminator(&mut self.writer)?;

        tracing::debug!("listed {} ({} entries) for {}", path, names.len(), self.peer);
        Ok(SessionControl::Continue)
    }

    /// Send one response frame
    fn send_response(&mut self, response: &Response) -> Result<()> {
        write_frame(&mut self.writer, &response.encode())
    }
}

/// Map a handler failure to its wire response
///
/// Not-found and permission-denied I/O errors get their dedicated status
/// codes; everything else becomes a generic error carrying the context.
fn failure_response(err: RemconError, not_found: &str, context: &str) -> Response {
    if let RemconError::Io(e) = &err {
        match e.kind() {
            ErrorKind::NotFound => return Response::not_found(not_found),
            ErrorKind::PermissionDenied => return Response::permission_denied("Permission denied"),
            _ => {}
        }
    }
    Response::error(format!("{}: {}", context, err))
}

/// Fill `buf` from the reader, looping over short reads; 0 means EOF
///
/// Chunk frames are full-size except the last, regardless of how the
/// underlying reader fragments its reads.
fn fill_chunk<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

//! Frame layer
//!
//! Length-prefixed message delimiting over a byte stream.
//!
//! ## Wire Format
//!
//! ```text
//! ┌──────────────┬─────────────────────────────┐
//! │ Length (4)   │         Payload             │
//! └──────────────┴─────────────────────────────┘
//! ```
//!
//! Length is a big-endian unsigned 32-bit integer counting payload bytes.
//! A zero-length frame is valid and serves as the end-of-stream terminator
//! in the directory-listing and file-transfer sub-protocols.

use std::io::{ErrorKind, Read, Write};

use bytes::{Bytes, BytesMut};

use crate::error::{RemconError, Result};

/// Size of the length prefix
pub const LEN_PREFIX_SIZE: usize = 4;

/// Maximum accepted frame payload (64 MB)
///
/// A declared length above this is rejected before any allocation, bounding
/// memory use against a corrupted or hostile peer.
pub const MAX_FRAME_SIZE: u32 = 64 * 1024 * 1024;

/// Maximum payload of a single file-transfer chunk frame
pub const MAX_CHUNK_SIZE: usize = 65534;

/// Write one frame: 4-byte big-endian length followed by the payload
///
/// Flushes the writer so the frame is on the wire when this returns.
pub fn write_frame<W: Write>(writer: &mut W, payload: &[u8]) -> Result<()> {
    let length = u32::try_from(payload.len()).map_err(|_| {
        RemconError::Protocol(format!(
            "payload of {} bytes does not fit the 32-bit length prefix",
            payload.len()
        ))
    })?;

    writer.write_all(&length.to_be_bytes())?;
    writer.write_all(payload)?;
    writer.flush()?;
    Ok(())
}

/// Write the zero-length terminator frame
pub fn write_terminator<W: Write>(writer: &mut W) -> Result<()> {
    write_frame(writer, &[])
}

/// Read one frame from the stream
///
/// Returns:
/// - `Ok(None)` if the peer closed the stream cleanly at a frame boundary
///   (zero header bytes were available): the normal disconnect signal.
/// - `Ok(Some(payload))` for a complete frame; the payload is empty for a
///   zero-length terminator frame.
/// - `Err(ConnectionClosed)` if the stream ended inside a frame (partial
///   length prefix or partial payload).
/// - `Err(FrameTooLarge)` if the declared length exceeds [`MAX_FRAME_SIZE`].
///
/// Both the prefix and the payload are accumulated in a loop until exactly
/// the required count has been read: a transport read that returns fewer
/// bytes than requested never produces a truncated frame.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Bytes>> {
    let mut prefix = [0u8; LEN_PREFIX_SIZE];
    match read_full(reader, &mut prefix)? {
        FillOutcome::Complete => {}
        FillOutcome::Empty => return Ok(None),
        FillOutcome::Truncated { received } => {
            return Err(RemconError::ConnectionClosed {
                expected: LEN_PREFIX_SIZE,
                received,
            });
        }
    }

    let length = u32::from_be_bytes(prefix);
    if length == 0 {
        return Ok(Some(Bytes::new()));
    }
    if length > MAX_FRAME_SIZE {
        return Err(RemconError::FrameTooLarge {
            length,
            max: MAX_FRAME_SIZE,
        });
    }

    let mut payload = BytesMut::zeroed(length as usize);
    match read_full(reader, &mut payload)? {
        FillOutcome::Complete => Ok(Some(payload.freeze())),
        // Empty here still means the peer vanished after the prefix.
        FillOutcome::Empty => Err(RemconError::ConnectionClosed {
            expected: length as usize,
            received: 0,
        }),
        FillOutcome::Truncated { received } => Err(RemconError::ConnectionClosed {
            expected: length as usize,
            received,
        }),
    }
}

/// Outcome of filling a buffer from the stream
enum FillOutcome {
    /// Buffer completely filled
    Complete,
    /// Stream ended before the first byte
    Empty,
    /// Stream ended after some bytes
    Truncated { received: usize },
}

/// Read until `buf` is full, the stream ends, or an I/O error occurs
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<FillOutcome> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(FillOutcome::Empty),
            Ok(0) => return Ok(FillOutcome::Truncated { received: filled }),
            Ok(n) => filled += n,
            Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(FillOutcome::Complete)
}

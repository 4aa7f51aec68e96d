//! Protocol client
//!
//! The mirror image of the connection dispatcher: sends one command per
//! request, reads the response, and drives the streaming sub-protocols from
//! the receiving side.
//!
//! Downloads are written chunk by chunk into a caller-supplied sink, never
//! accumulated in memory. A connection that closes before the terminator
//! frame is a failed operation, not a partial result.

use std::io::{BufReader, BufWriter, Write};
use std::net::{TcpStream, ToSocketAddrs};

use crate::error::{RemconError, Result};
use crate::protocol::{read_frame, write_frame, Command, Response, LEN_PREFIX_SIZE};

/// Client end of a remote-control session
pub struct Client {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
}

impl Client {
    /// Connect to a server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;

        let read_stream = stream.try_clone()?;
        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
        })
    }

    // =========================================================================
    // Simple commands
    // =========================================================================

    /// Ask the server to capture a screenshot at `dest` (a server-side path)
    pub fn screenshot(&mut self, dest: &str) -> Result<String> {
        ensure_encodable(dest)?;
        let response = self.request(&Command::Screenshot {
            dest: dest.to_string(),
        })?;
        expect_success(response)
    }

    /// Delete a file on the server
    pub fn delete_file(&mut self, path: &str) -> Result<String> {
        ensure_encodable(path)?;
        let response = self.request(&Command::Delete {
            path: path.to_string(),
        })?;
        expect_success(response)
    }

    /// Copy a file on the server
    ///
    /// The wire encoding joins `src` and `dst` with a space and splits on
    /// the first one, so a source path containing a space cannot be carried
    /// and is rejected here rather than silently mis-split.
    pub fn copy_file(&mut self, src: &str, dst: &str) -> Result<String> {
        ensure_encodable(src)?;
        ensure_encodable(dst)?;
        if src.contains(' ') {
            return Err(RemconError::InvalidCommand(
                "COPY source path cannot contain a space".to_string(),
            ));
        }
        let response = self.request(&Command::Copy {
            src: src.to_string(),
            dst: dst.to_string(),
        })?;
        expect_success(response)
    }

    /// Run a program or shell command on the server
    pub fn execute(&mut self, command: &str) -> Result<String> {
        ensure_encodable(command)?;
        let response = self.request(&Command::Execute {
            command: command.to_string(),
        })?;
        expect_success(response)
    }

    /// End the session; consumes the client and closes the socket
    pub fn exit(mut self) -> Result<String> {
        let response = self.request(&Command::Exit)?;
        expect_success(response)
    }

    // =========================================================================
    // Streaming commands
    // =========================================================================

    /// Download a file from the server, writing chunks straight into `sink`
    ///
    /// Returns the number of payload bytes written. The transfer only
    /// succeeds once the empty terminator frame arrives; a connection that
    /// ends earlier yields an error and whatever reached the sink must be
    /// discarded by the caller.
    pub fn fetch_file<W: Write>(&mut self, remote: &str, sink: &mut W) -> Result<u64> {
        ensure_encodable(remote)?;
        let response = self.request(&Command::FetchFile {
            path: remote.to_string(),
        })?;
        if !response.is_success() {
            return Err(remote_failure(response));
        }

        let mut total: u64 = 0;
        loop {
            let chunk = self.read_stream_frame()?;
            if chunk.is_empty() {
                break;
            }
            sink.write_all(&chunk)?;
            total += chunk.len() as u64;
        }
        sink.flush()?;

        tracing::debug!("fetched {} ({} bytes)", remote, total);
        Ok(total)
    }

    /// List a directory on the server
    ///
    /// Follow-up frames are only read after the exact listing-start marker.
    /// A success response with any other message (the empty-directory case)
    /// is complete as-is and yields an empty listing.
    pub fn list_dir(&mut self, path: &str) -> Result<Vec<String>> {
        ensure_encodable(path)?;
        let response = self.request(&Command::ListDir {
            path: path.to_string(),
        })?;
        if !response.is_success() {
            return Err(remote_failure(response));
        }
        if response.message != Response::LISTING_START {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        loop {
            let frame = self.read_stream_frame()?;
            if frame.is_empty() {
                break;
            }
            names.push(String::from_utf8_lossy(&frame).into_owned());
        }
        Ok(names)
    }

    // =========================================================================
    // Wire plumbing
    // =========================================================================

    /// Send one command and read its response frame
    fn request(&mut self, command: &Command) -> Result<Response> {
        write_frame(&mut self.writer, &command.encode())?;

        match read_frame(&mut self.reader)? {
            Some(payload) => Response::parse(&payload),
            None => Err(RemconError::ConnectionClosed {
                expected: LEN_PREFIX_SIZE,
                received: 0,
            }),
        }
    }

    /// Read one follow-up frame of a streamed sequence
    ///
    /// A clean close here means the terminator never arrived: the operation
    /// failed.
    fn read_stream_frame(&mut self) -> Result<bytes::Bytes> {
        read_frame(&mut self.reader)?.ok_or(RemconError::ConnectionClosed {
            expected: LEN_PREFIX_SIZE,
            received: 0,
        })
    }
}

/// Reject arguments the pipe-delimited envelope cannot carry
fn ensure_encodable(argument: &str) -> Result<()> {
    if argument.contains('|') {
        return Err(RemconError::InvalidCommand(
            "arguments cannot contain '|'".to_string(),
        ));
    }
    Ok(())
}

/// Turn a success response into its message, anything else into an error
fn expect_success(response: Response) -> Result<String> {
    if response.is_success() {
        Ok(response.message)
    } else {
        Err(remote_failure(response))
    }
}

fn remote_failure(response: Response) -> RemconError {
    RemconError::Remote {
        code: response.status.code(),
        message: response.message,
    }
}

//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{RemconError, Result};
use crate::network::Dispatcher;
use crate::ops::Operations;

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Host operations invoked by the dispatcher
    ops: Arc<dyn Operations>,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O; timeouts are applied separately via
    /// [`Connection::set_timeouts`].
    pub fn new(stream: TcpStream, ops: Arc<dyn Operations>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Accepted sockets can inherit the listener's non-blocking flag on
        // some platforms; frame reads require blocking mode.
        stream.set_nonblocking(false)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            ops,
            peer_addr,
        })
    }

    /// Configure connection timeouts (0 disables)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Runs the dispatcher loop over the socket. Returns when the client
    /// sends EXIT, disconnects, or a fatal protocol/transport error occurs.
    /// The socket is closed on every exit path when the buffered halves
    /// drop with `self`.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        let mut dispatcher = Dispatcher::new(
            &mut self.reader,
            &mut self.writer,
            Arc::clone(&self.ops),
            self.peer_addr.clone(),
        );

        match dispatcher.run() {
            Ok(()) => Ok(()),
            Err(RemconError::Io(ref e)) if is_benign_disconnect(e.kind()) => {
                // Client went away between or during frames; not a server
                // error.
                tracing::debug!("client {} dropped the connection: {}", self.peer_addr, e);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("session with {} failed: {}", self.peer_addr, e);
                Err(e)
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

/// I/O endings that mean "the peer left", not "the server broke"
///
/// WouldBlock/TimedOut cover read-timeout expiry (Unix and Windows report
/// it differently).
fn is_benign_disconnect(kind: std::io::ErrorKind) -> bool {
    matches!(
        kind,
        std::io::ErrorKind::UnexpectedEof
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::WouldBlock
            | std::io::ErrorKind::TimedOut
    )
}

//! TCP Server
//!
//! Accepts connections and dispatches to per-connection threads.
//!
//! One thread per accepted connection; connections share no mutable state,
//! so the only synchronization is the worker-handle list and the shutdown
//! flag. The accept loop is non-blocking so the shutdown flag is polled
//! between accepts.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;

use crate::config::Config;
use crate::error::{RemconError, Result};
use crate::network::Connection;
use crate::ops::Operations;

/// Sleep between accept polls while idle
const ACCEPT_BACKOFF: Duration = Duration::from_millis(25);

/// Sleep after a failed accept before retrying
const ERROR_BACKOFF: Duration = Duration::from_millis(150);

/// TCP server for the remote-control protocol
pub struct Server {
    config: Config,

    /// Host operations handed to every connection
    ops: Arc<dyn Operations>,

    /// Bound listener, populated by [`Server::bind`]
    listener: Option<TcpListener>,

    /// Cooperative shutdown flag, polled by the accept loop
    shutdown: Arc<AtomicBool>,

    /// Live connection count, bounded by `config.max_connections`
    active: Arc<AtomicUsize>,

    /// Handles of spawned connection threads
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl Server {
    /// Create a new server with the given config and operations
    pub fn new(config: Config, ops: Arc<dyn Operations>) -> Self {
        Self {
            config,
            ops,
            listener: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            active: Arc::new(AtomicUsize::new(0)),
            workers: Mutex::new(Vec::new()),
        }
    }

    /// Bind the listen address and return the local address
    ///
    /// Separate from [`Server::run`] so callers (and tests binding port 0)
    /// can learn the address before the accept loop starts. Idempotent.
    pub fn bind(&mut self) -> Result<SocketAddr> {
        if self.listener.is_none() {
            let listener = TcpListener::bind(&self.config.listen_addr)?;
            listener.set_nonblocking(true)?;
            self.listener = Some(listener);
        }
        match &self.listener {
            Some(listener) => Ok(listener.local_addr()?),
            None => Err(RemconError::Config("listener missing after bind".to_string())),
        }
    }

    /// Handle for requesting shutdown from another thread
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Signal the server to stop accepting and wind down
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Start the server (blocking)
    ///
    /// Accepts until the shutdown flag is set, then joins the in-flight
    /// connection threads (active sessions run to completion).
    pub fn run(&mut self) -> Result<()> {
        let addr = self.bind()?;
        let listener = match self.listener.take() {
            Some(listener) => listener,
            None => return Err(RemconError::Config("server is not bound".to_string())),
        };

        tracing::info!("listening on {}", addr);

        while !self.shutdown.load(Ordering::Relaxed) {
            match listener.accept() {
                Ok((stream, peer)) => self.spawn_connection(stream, peer),
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    self.reap_finished();
                    thread::sleep(ACCEPT_BACKOFF);
                }
                Err(e) => {
                    tracing::warn!("accept failed: {} (continuing)", e);
                    thread::sleep(ERROR_BACKOFF);
                }
            }
        }

        tracing::info!("shutdown requested, waiting for {} active connection(s)", self.active.load(Ordering::Relaxed));
        self.join_all();
        tracing::info!("server stopped");
        Ok(())
    }

    /// Hand an accepted socket to its own thread
    fn spawn_connection(&self, stream: TcpStream, peer: SocketAddr) {
        if self.active.load(Ordering::Relaxed) >= self.config.max_connections {
            // No in-band "busy" signal exists in the protocol; dropping the
            // socket lets the client fail fast instead of hanging unaccepted.
            tracing::warn!(
                "connection limit ({}) reached, dropping {}",
                self.config.max_connections,
                peer
            );
            return;
        }

        tracing::info!("accepted connection from {}", peer);
        self.active.fetch_add(1, Ordering::Relaxed);

        let ops = Arc::clone(&self.ops);
        let active = Arc::clone(&self.active);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let handle = thread::spawn(move || {
            let result = Connection::new(stream, ops).and_then(|mut connection| {
                connection.set_timeouts(read_ms, write_ms)?;
                connection.handle()
            });
            if let Err(e) = result {
                // Connection::handle already logged the details.
                tracing::debug!("connection {} closed with error: {}", peer, e);
            }
            active.fetch_sub(1, Ordering::Relaxed);
        });

        self.workers.lock().push(handle);
    }

    /// Join finished connection threads, keeping live ones
    fn reap_finished(&self) {
        let mut workers = self.workers.lock();
        let mut index = 0;
        while index < workers.len() {
            if workers[index].is_finished() {
                let handle = workers.swap_remove(index);
                let _ = handle.join();
            } else {
                index += 1;
            }
        }
    }

    /// Join every remaining connection thread
    fn join_all(&self) {
        let handles: Vec<_> = std::mem::take(&mut *self.workers.lock());
        for handle in handles {
            let _ = handle.join();
        }
    }
}

//! # remcon
//!
//! A remote-control server and client speaking a length-prefixed TCP
//! protocol with:
//! - Self-delimiting frames (4-byte big-endian length prefix)
//! - Pipe-delimited command/response envelopes
//! - Streamed directory listings and chunked file transfers
//! - One thread per connection, strictly sequential requests
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      TCP Server                             │
//! │            (accept loop, thread per client)                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                 Connection Dispatcher                       │
//! │        (frame ⇄ envelope, command state machine)            │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌──────────────┐
//!   │   Framer    │          │  Operations  │
//!   │ (wire I/O)  │          │ (fs/process/ │
//!   └─────────────┘          │  screenshot) │
//!                            └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod client;
pub mod network;
pub mod ops;
pub mod protocol;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use client::Client;
pub use config::Config;
pub use error::{RemconError, Result};
pub use network::Server;
pub use ops::{HostOps, Operations};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of remcon
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

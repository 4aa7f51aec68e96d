//! Command definitions
//!
//! Represents commands from clients.
//!
//! Commands travel inside a frame as ASCII text `CMD|ARG`. The token is a
//! fixed 4-character uppercase word from a closed set; the argument is
//! everything after the *first* `|`, so arguments may themselves contain
//! `|` characters. Paths are not escaped: a literal `|` in a path (or, for
//! COPY, a space inside the source path) cannot be represented and callers
//! reject such inputs up front.

use crate::error::{RemconError, Result};

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Capture a screenshot on the server and save it at `dest`
    Screenshot { dest: String },

    /// Download a file from the server (streamed back in chunk frames)
    FetchFile { path: String },

    /// List the entries of a directory on the server
    ListDir { path: String },

    /// Delete a file on the server
    Delete { path: String },

    /// Copy a file on the server; argument is `src dst`, split on the
    /// first space
    Copy { src: String, dst: String },

    /// Run a program or shell command on the server
    Execute { command: String },

    /// Terminate the session
    Exit,
}

impl Command {
    /// Wire token for this command
    pub fn tag(&self) -> &'static str {
        match self {
            Command::Screenshot { .. } => "TSCR",
            Command::FetchFile { .. } => "SNDF",
            Command::ListDir { .. } => "SDIR",
            Command::Delete { .. } => "DELT",
            Command::Copy { .. } => "COPY",
            Command::Execute { .. } => "EXCT",
            Command::Exit => "EXIT",
        }
    }

    /// Encode as the `CMD|ARG` envelope carried inside a frame
    pub fn encode(&self) -> Vec<u8> {
        let argument = match self {
            Command::Screenshot { dest } => dest.as_str(),
            Command::FetchFile { path }
            | Command::ListDir { path }
            | Command::Delete { path } => path.as_str(),
            Command::Copy { src, dst } => {
                return format!("{}|{} {}", self.tag(), src, dst).into_bytes();
            }
            Command::Execute { command } => command.as_str(),
            Command::Exit => "",
        };
        format!("{}|{}", self.tag(), argument).into_bytes()
    }

    /// Parse a request envelope
    ///
    /// Splits on the first `|` only. A missing `|` is treated as an empty
    /// argument (the client sends `EXIT|`, but bare `EXIT` is accepted).
    /// Errors here are recoverable at the session level: the dispatcher
    /// answers with a generic-error response and keeps reading.
    pub fn parse(payload: &[u8]) -> Result<Command> {
        let text = std::str::from_utf8(payload)
            .map_err(|_| RemconError::InvalidCommand("request is not valid UTF-8".to_string()))?;

        let (tag, argument) = match text.split_once('|') {
            Some((tag, argument)) => (tag, argument),
            None => (text, ""),
        };

        match tag {
            "TSCR" => Ok(Command::Screenshot {
                dest: argument.to_string(),
            }),
            "SNDF" => Ok(Command::FetchFile {
                path: argument.to_string(),
            }),
            "SDIR" => Ok(Command::ListDir {
                path: argument.to_string(),
            }),
            "DELT" => Ok(Command::Delete {
                path: argument.to_string(),
            }),
            "COPY" => match argument.split_once(' ') {
                Some((src, dst)) => Ok(Command::Copy {
                    src: src.to_string(),
                    dst: dst.to_string(),
                }),
                None => Err(RemconError::InvalidCommand(
                    "COPY expects 'src dst' separated by a space".to_string(),
                )),
            },
            "EXCT" => Ok(Command::Execute {
                command: argument.to_string(),
            }),
            "EXIT" => Ok(Command::Exit),
            _ => Err(RemconError::InvalidCommand(format!(
                "unknown command token: {:?}",
                tag
            ))),
        }
    }
}

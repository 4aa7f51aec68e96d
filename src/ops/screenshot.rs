//! Screenshot collaborator
//!
//! Captures the server's screen by shelling out to the platform's capture
//! utility. The first tool from the per-OS candidate list that runs and
//! exits successfully wins; if none is available the operation fails and
//! the dispatcher reports a generic error for the request.

use std::path::Path;
use std::process::Command;

use crate::error::{RemconError, Result};

#[cfg(target_os = "macos")]
const CAPTURE_TOOLS: &[&[&str]] = &[&["screencapture", "-x"]];

#[cfg(all(unix, not(target_os = "macos")))]
const CAPTURE_TOOLS: &[&[&str]] = &[
    &["gnome-screenshot", "-f"],
    &["scrot"],
    &["grim"],
    &["import", "-window", "root"],
];

#[cfg(windows)]
const CAPTURE_TOOLS: &[&[&str]] = &[];

/// Capture a screenshot of the whole screen into `dest`
pub fn capture(dest: &Path) -> Result<()> {
    for tool in CAPTURE_TOOLS {
        let Some((program, args)) = tool.split_first() else {
            continue;
        };

        let outcome = Command::new(program).args(args.iter()).arg(dest).status();
        match outcome {
            Ok(status) if status.success() => return Ok(()),
            Ok(status) => {
                tracing::debug!("capture tool {} failed with {}", program, status);
            }
            Err(e) => {
                tracing::debug!("capture tool {} unavailable: {}", program, e);
            }
        }
    }

    Err(RemconError::Screenshot(
        "no working screen-capture tool on this host".to_string(),
    ))
}

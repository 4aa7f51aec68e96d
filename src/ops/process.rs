//! Program execution collaborator
//!
//! Runs the requested command line through the platform shell and waits for
//! it to exit. The session is strictly sequential, so blocking here is
//! intentional: the next request is not read until the program finishes.

use std::process::Command;

use crate::error::Result;

/// Run a program or shell command, blocking until it exits
///
/// The exit status is reported in the returned note; a nonzero exit is not
/// an operation failure (only failing to launch is).
pub fn run_program(command: &str) -> Result<String> {
    let status = shell_command(command).status()?;

    if status.success() {
        Ok("exited successfully".to_string())
    } else {
        Ok(format!("finished with {}", status))
    }
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

//! Operations Module
//!
//! The collaborator seam between the protocol core and the host OS.
//!
//! The dispatcher never touches the filesystem or process table directly;
//! it calls through the [`Operations`] trait and turns each outcome into a
//! status-code response. [`HostOps`] is the real implementation over OS
//! services; tests may substitute their own.

mod fs;
mod process;
mod screenshot;

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Host-side operations invoked by the connection dispatcher
///
/// Failures are reported through [`crate::RemconError`]; the dispatcher maps
/// `io::ErrorKind::NotFound` and `io::ErrorKind::PermissionDenied` to their
/// dedicated status codes and everything else to a generic error.
pub trait Operations: Send + Sync {
    /// Capture a screenshot and save it at `dest`
    fn capture_screenshot(&self, dest: &Path) -> Result<()>;

    /// List the entry names (basenames only) of a directory
    fn list_directory(&self, path: &Path) -> Result<Vec<String>>;

    /// Delete a single file
    fn delete_file(&self, path: &Path) -> Result<()>;

    /// Copy a file from `src` to `dst`
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()>;

    /// Run a program or shell command, blocking until it exits
    ///
    /// Returns a short human-readable completion note (the exit status). A
    /// program that runs and exits nonzero is still a completed operation.
    fn run_program(&self, command: &str) -> Result<String>;

    /// Open a file for sequential chunked reading
    ///
    /// Fails with a not-found error if `path` is missing or not a regular
    /// file. The returned reader is consumed incrementally so large files
    /// are never materialized in memory.
    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + Send>>;
}

impl<O: Operations + ?Sized> Operations for Arc<O> {
    fn capture_screenshot(&self, dest: &Path) -> Result<()> {
        (**self).capture_screenshot(dest)
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<String>> {
        (**self).list_directory(path)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        (**self).delete_file(path)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        (**self).copy_file(src, dst)
    }

    fn run_program(&self, command: &str) -> Result<String> {
        (**self).run_program(command)
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        (**self).open_file(path)
    }
}

/// [`Operations`] implementation over the local host
#[derive(Debug, Default, Clone, Copy)]
pub struct HostOps;

impl Operations for HostOps {
    fn capture_screenshot(&self, dest: &Path) -> Result<()> {
        screenshot::capture(dest)
    }

    fn list_directory(&self, path: &Path) -> Result<Vec<String>> {
        fs::list_directory(path)
    }

    fn delete_file(&self, path: &Path) -> Result<()> {
        fs::delete_file(path)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<()> {
        fs::copy_file(src, dst)
    }

    fn run_program(&self, command: &str) -> Result<String> {
        process::run_program(command)
    }

    fn open_file(&self, path: &Path) -> Result<Box<dyn Read + Send>> {
        fs::open_file(path)
    }
}

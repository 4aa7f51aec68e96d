//! Filesystem collaborators
//!
//! Thin wrappers over `std::fs` used by the dispatcher. Error
//! discrimination (not-found vs. permission-denied vs. other) rides on
//! `io::ErrorKind`, which the dispatcher maps to wire status codes.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::Path;

use crate::error::Result;

/// List the entry names of a directory, sorted
///
/// Returns basenames only, never full paths. Missing directory surfaces as
/// `io::ErrorKind::NotFound` from `read_dir`.
pub fn list_directory(path: &Path) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(path)? {
        let entry = entry?;
        names.push(entry.file_name().to_string_lossy().into_owned());
    }
    // Deterministic order on the wire regardless of OS enumeration order.
    names.sort();
    Ok(names)
}

/// Delete a regular file
pub fn delete_file(path: &Path) -> Result<()> {
    fs::remove_file(path)?;
    Ok(())
}

/// Copy a file, overwriting the destination
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    fs::copy(src, dst)?;
    Ok(())
}

/// Open a regular file for sequential reading
///
/// A path that exists but is not a regular file (e.g. a directory) is
/// reported as not-found, matching the transfer protocol's "File not found"
/// behavior.
pub fn open_file(path: &Path) -> Result<Box<dyn Read + Send>> {
    let metadata = fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file").into());
    }
    let file = File::open(path)?;
    Ok(Box::new(file))
}

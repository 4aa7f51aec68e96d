//! Dispatcher Tests
//!
//! Drives the per-connection state machine over in-memory streams: requests
//! are pre-encoded into the input buffer and the response frames are parsed
//! back out of the output buffer.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use remcon::error::Result;
use remcon::network::Dispatcher;
use remcon::ops::{HostOps, Operations};
use remcon::protocol::{read_frame, write_frame, Command, Response, Status, MAX_CHUNK_SIZE};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// Append one request frame to the session input
fn push_request(input: &mut Vec<u8>, command: &Command) {
    write_frame(input, &command.encode()).unwrap();
}

/// Append one raw request payload (for malformed envelopes)
fn push_raw(input: &mut Vec<u8>, payload: &[u8]) {
    write_frame(input, payload).unwrap();
}

/// Run a full session over in-memory streams and return the output bytes
fn run_session_with<O: Operations>(input: Vec<u8>, ops: O) -> Vec<u8> {
    let mut output = Vec::new();
    let mut dispatcher = Dispatcher::new(Cursor::new(input), &mut output, ops, "test");
    dispatcher.run().unwrap();
    output
}

fn run_session(input: Vec<u8>) -> Vec<u8> {
    run_session_with(input, HostOps)
}

/// Split the session output back into frames
fn output_frames(bytes: &[u8]) -> Vec<Vec<u8>> {
    let mut cursor = Cursor::new(bytes);
    let mut frames = Vec::new();
    while let Some(frame) = read_frame(&mut cursor).unwrap() {
        frames.push(frame.to_vec());
    }
    frames
}

fn parse_response(frame: &[u8]) -> Response {
    Response::parse(frame).unwrap()
}

fn temp_path(dir: &TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn path_string(path: &Path) -> String {
    path.to_str().unwrap().to_string()
}

// =============================================================================
// Directory Listing (SDIR)
// =============================================================================

#[test]
fn test_sdir_empty_directory_has_no_follow_up() {
    let dir = TempDir::new().unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::ListDir {
            path: path_string(dir.path()),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 1, "empty directory must not stream frames");

    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.message, Response::EMPTY_DIR);
}

#[test]
fn test_sdir_listing_streams_names_and_terminator() {
    let dir = TempDir::new().unwrap();
    std::fs::write(temp_path(&dir, "a.txt"), b"a").unwrap();
    std::fs::write(temp_path(&dir, "b.txt"), b"b").unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::ListDir {
            path: path_string(dir.path()),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 4);

    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.message, Response::LISTING_START);

    assert_eq!(frames[1], b"a.txt");
    assert_eq!(frames[2], b"b.txt");
    assert!(frames[3].is_empty(), "listing must end with a terminator");
}

#[test]
fn test_sdir_missing_directory() {
    let dir = TempDir::new().unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::ListDir {
            path: path_string(&temp_path(&dir, "does-not-exist")),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 1);

    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::NotFound);
    assert_eq!(response.message, "Directory not found");
}

// =============================================================================
// File Transfer (SNDF)
// =============================================================================

#[test]
fn test_sndf_missing_file_has_no_follow_up() {
    let dir = TempDir::new().unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::FetchFile {
            path: path_string(&temp_path(&dir, "missing.bin")),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 1, "missing file must not stream frames");

    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::NotFound);
    assert_eq!(response.message, "File not found");
}

#[test]
fn test_sndf_chunking_and_reassembly() {
    let dir = TempDir::new().unwrap();
    let file_path = temp_path(&dir, "payload.bin");

    // Two full chunks plus one extra byte.
    let content: Vec<u8> = (0..2 * MAX_CHUNK_SIZE + 1).map(|i| (i % 251) as u8).collect();
    std::fs::write(&file_path, &content).unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::FetchFile {
            path: path_string(&file_path),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 5, "header + 3 chunks + terminator");

    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.message, Response::TRANSFER_START);

    assert_eq!(frames[1].len(), MAX_CHUNK_SIZE);
    assert_eq!(frames[2].len(), MAX_CHUNK_SIZE);
    assert_eq!(frames[3].len(), 1);
    assert!(frames[4].is_empty());

    let reassembled: Vec<u8> = frames[1..4].concat();
    assert_eq!(reassembled, content);
}

#[test]
fn test_sndf_small_file() {
    let dir = TempDir::new().unwrap();
    let file_path = temp_path(&dir, "small.txt");
    std::fs::write(&file_path, b"hello world").unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::FetchFile {
            path: path_string(&file_path),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[1], b"hello world");
    assert!(frames[2].is_empty());
}

#[test]
fn test_sndf_empty_file_sends_bare_terminator() {
    let dir = TempDir::new().unwrap();
    let file_path = temp_path(&dir, "empty.bin");
    std::fs::write(&file_path, b"").unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::FetchFile {
            path: path_string(&file_path),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 2, "transfer header + terminator only");
    assert_eq!(parse_response(&frames[0]).message, Response::TRANSFER_START);
    assert!(frames[1].is_empty());
}

#[test]
fn test_sndf_directory_path_is_not_found() {
    let dir = TempDir::new().unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::FetchFile {
            path: path_string(dir.path()),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 1);
    assert_eq!(parse_response(&frames[0]).status, Status::NotFound);
}

// =============================================================================
// Simple Commands
// =============================================================================

#[test]
fn test_delete_existing_file() {
    let dir = TempDir::new().unwrap();
    let file_path = temp_path(&dir, "victim.txt");
    std::fs::write(&file_path, b"bye").unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Delete {
            path: path_string(&file_path),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(parse_response(&frames[0]).status, Status::Success);
    assert!(!file_path.exists());
}

#[test]
fn test_delete_missing_file() {
    let dir = TempDir::new().unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Delete {
            path: path_string(&temp_path(&dir, "missing.txt")),
        },
    );

    let frames = output_frames(&run_session(input));
    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::NotFound);
    assert_eq!(response.message, "File not found");
}

#[test]
fn test_delete_permission_denied_maps_to_dedicated_status() {
    struct DeniedOps;

    impl Operations for DeniedOps {
        fn capture_screenshot(&self, _dest: &Path) -> Result<()> {
            panic!("unexpected capture_screenshot call")
        }

        fn list_directory(&self, _path: &Path) -> Result<Vec<String>> {
            panic!("unexpected list_directory call")
        }

        fn delete_file(&self, _path: &Path) -> Result<()> {
            Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into())
        }

        fn copy_file(&self, _src: &Path, _dst: &Path) -> Result<()> {
            panic!("unexpected copy_file call")
        }

        fn run_program(&self, _command: &str) -> Result<String> {
            panic!("unexpected run_program call")
        }

        fn open_file(&self, _path: &Path) -> Result<Box<dyn std::io::Read + Send>> {
            panic!("unexpected open_file call")
        }
    }

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Delete {
            path: "/etc/protected.txt".to_string(),
        },
    );

    let frames = output_frames(&run_session_with(input, DeniedOps));
    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::PermissionDenied);
    assert_eq!(response.message, "Permission denied");
}

#[test]
fn test_copy_file() {
    let dir = TempDir::new().unwrap();
    let src = temp_path(&dir, "src.txt");
    let dst = temp_path(&dir, "dst.txt");
    std::fs::write(&src, b"contents").unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Copy {
            src: path_string(&src),
            dst: path_string(&dst),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(parse_response(&frames[0]).status, Status::Success);
    assert_eq!(std::fs::read(&dst).unwrap(), b"contents");
}

#[test]
fn test_copy_missing_source() {
    let dir = TempDir::new().unwrap();

    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Copy {
            src: path_string(&temp_path(&dir, "missing.txt")),
            dst: path_string(&temp_path(&dir, "dst.txt")),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(parse_response(&frames[0]).status, Status::NotFound);
}

#[cfg(unix)]
#[test]
fn test_execute_program() {
    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Execute {
            command: "true".to_string(),
        },
    );

    let frames = output_frames(&run_session(input));
    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::Success);
    assert!(response.message.contains("executed"));
}

#[cfg(unix)]
#[test]
fn test_execute_nonzero_exit_is_still_a_completed_operation() {
    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Execute {
            command: "exit 3".to_string(),
        },
    );

    let frames = output_frames(&run_session(input));
    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::Success);
    assert!(response.message.contains('3'));
}

// =============================================================================
// Malformed Requests and Session Control
// =============================================================================

#[test]
fn test_copy_malformed_argument_is_generic_error() {
    let mut input = Vec::new();
    push_raw(&mut input, b"COPY|no-space-here");
    push_request(&mut input, &Command::Exit);

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 2, "dispatcher must survive the bad request");

    assert_eq!(parse_response(&frames[0]).status, Status::Error);
    assert_eq!(parse_response(&frames[1]).status, Status::Success);
}

#[test]
fn test_unknown_command_is_generic_error() {
    let mut input = Vec::new();
    push_raw(&mut input, b"ABCD|whatever");
    push_request(&mut input, &Command::Exit);

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 2);
    assert_eq!(parse_response(&frames[0]).status, Status::Error);
}

#[test]
fn test_non_utf8_request_is_generic_error() {
    let mut input = Vec::new();
    push_raw(&mut input, &[0xC3, 0x28, 0xA0]);
    push_request(&mut input, &Command::Exit);

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 2);
    assert_eq!(parse_response(&frames[0]).status, Status::Error);
}

#[test]
fn test_exit_stops_the_session() {
    let dir = TempDir::new().unwrap();
    let file_path = temp_path(&dir, "survivor.txt");
    std::fs::write(&file_path, b"still here").unwrap();

    let mut input = Vec::new();
    push_request(&mut input, &Command::Exit);
    push_request(
        &mut input,
        &Command::Delete {
            path: path_string(&file_path),
        },
    );

    let frames = output_frames(&run_session(input));
    assert_eq!(frames.len(), 1, "no frames may follow the EXIT response");

    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.message, "Disconnected");

    // The command after EXIT was never executed.
    assert!(file_path.exists());
}

// =============================================================================
// Collaborator Error Mapping
// =============================================================================

/// Stub collaborator for paths the real host cannot exercise portably
struct ScriptedOps {
    screenshot_ok: bool,
}

impl Operations for ScriptedOps {
    fn capture_screenshot(&self, _dest: &Path) -> Result<()> {
        if self.screenshot_ok {
            Ok(())
        } else {
            Err(remcon::RemconError::Screenshot("no tool".to_string()))
        }
    }

    fn list_directory(&self, _path: &Path) -> Result<Vec<String>> {
        panic!("unexpected list_directory call")
    }

    fn delete_file(&self, _path: &Path) -> Result<()> {
        panic!("unexpected delete_file call")
    }

    fn copy_file(&self, _src: &Path, _dst: &Path) -> Result<()> {
        panic!("unexpected copy_file call")
    }

    fn run_program(&self, _command: &str) -> Result<String> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "spawn failed").into())
    }

    fn open_file(&self, _path: &Path) -> Result<Box<dyn std::io::Read + Send>> {
        panic!("unexpected open_file call")
    }
}

#[test]
fn test_screenshot_success_response() {
    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Screenshot {
            dest: "/tmp/shot.png".to_string(),
        },
    );

    let frames = output_frames(&run_session_with(input, ScriptedOps { screenshot_ok: true }));
    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::Success);
    assert_eq!(response.message, "Screenshot saved at /tmp/shot.png");
}

#[test]
fn test_screenshot_failure_is_generic_error() {
    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Screenshot {
            dest: "/tmp/shot.png".to_string(),
        },
    );
    push_request(&mut input, &Command::Exit);

    let frames = output_frames(&run_session_with(input, ScriptedOps { screenshot_ok: false }));
    assert_eq!(frames.len(), 2, "handler failure must not kill the session");
    assert_eq!(parse_response(&frames[0]).status, Status::Error);
}

#[test]
fn test_launch_failure_is_generic_error() {
    let mut input = Vec::new();
    push_request(
        &mut input,
        &Command::Execute {
            command: "whatever".to_string(),
        },
    );

    let frames = output_frames(&run_session_with(input, ScriptedOps { screenshot_ok: true }));
    let response = parse_response(&frames[0]);
    assert_eq!(response.status, Status::Error);
    assert!(response.message.contains("Failed to execute program"));
}

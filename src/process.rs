//! Subprocess execution with a wall-clock limit.
//!
//! Output pipes are drained on background threads so a chatty child never
//! blocks on a full pipe buffer. When the deadline passes the child is
//! killed and reaped before [`ProcessError::Timeout`] is returned.

use std::io::{Read, Write};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// How long to wait for output pipes after the child has exited or been
/// killed. Grandchildren (e.g. `git-remote-https`) can keep a pipe open.
const PIPE_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} timed out after {timeout_secs}s")]
    Timeout {
        program: String,
        timeout_secs: u64,
        stderr: String,
    },

    #[error("Failed waiting for {program}: {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}

/// Run `cmd` to completion, killing it once `timeout` has elapsed.
///
/// `stdin` is written to the child's standard input and then closed; when
/// `None` the child's stdin is attached to the null device.
pub fn run_with_timeout(
    cmd: &mut Command,
    stdin: Option<&[u8]>,
    timeout: Duration,
) -> Result<CommandOutput, ProcessError> {
    let program = cmd.get_program().to_string_lossy().into_owned();

    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    debug!(program = %program, timeout_secs = timeout.as_secs(), "Spawning subprocess");

    let mut child = cmd.spawn().map_err(|source| ProcessError::Spawn {
        program: program.clone(),
        source,
    })?;

    if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
        let input = input.to_vec();
        thread::spawn(move || {
            // A child that exits without reading its input closes the pipe;
            // that is not an error for the caller.
            let _ = pipe.write_all(&input);
        });
    }

    let stdout_rx = drain(child.stdout.take());
    let stderr_rx = drain(child.stderr.take());

    let deadline = Instant::now() + timeout;
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if Instant::now() >= deadline => {
                warn!(program = %program, timeout_secs = timeout.as_secs(), "Killing subprocess after timeout");
                let _ = child.kill();
                let _ = child.wait();
                let stderr = collect(&stderr_rx);
                return Err(ProcessError::Timeout {
                    program,
                    timeout_secs: timeout.as_secs(),
                    stderr: String::from_utf8_lossy(&stderr).into_owned(),
                });
            }
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(source) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(ProcessError::Wait { program, source });
            }
        }
    };

    Ok(CommandOutput {
        status,
        stdout: collect(&stdout_rx),
        stderr: collect(&stderr_rx),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    if let Some(mut pipe) = pipe {
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(buf);
        });
    }
    rx
}

fn collect(rx: &mpsc::Receiver<Vec<u8>>) -> Vec<u8> {
    rx.recv_timeout(PIPE_GRACE).unwrap_or_default()
}

/// Shorten captured output to at most `max_bytes` bytes, keeping the tail
/// where tools usually print the actual error. Cuts on a char boundary.
pub fn truncate_tail(text: &str, max_bytes: usize) -> String {
    let text = text.trim();
    if text.len() <= max_bytes {
        return text.to_string();
    }
    let mut start = text.len() - max_bytes;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    format!("...{}", &text[start..])
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_successful_command_captures_output() {
        let output = run_with_timeout(
            Command::new("sh").args(["-c", "echo out; echo err >&2"]),
            None,
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(output.success());
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "out");
        assert_eq!(output.stderr_lossy().trim(), "err");
    }

    #[test]
    fn test_nonzero_exit_is_not_an_error() {
        let output = run_with_timeout(
            Command::new("sh").args(["-c", "echo boom >&2; exit 3"]),
            None,
            Duration::from_secs(10),
        )
        .unwrap();
        assert!(!output.success());
        assert_eq!(output.status.code(), Some(3));
        assert!(output.stderr_lossy().contains("boom"));
    }

    #[test]
    fn test_timeout_kills_child() {
        let started = Instant::now();
        let err = run_with_timeout(
            Command::new("sh").args(["-c", "echo waiting >&2; exec sleep 30"]),
            None,
            Duration::from_millis(300),
        )
        .unwrap_err();
        assert!(started.elapsed() < Duration::from_secs(10));
        match err {
            ProcessError::Timeout { timeout_secs, .. } => assert_eq!(timeout_secs, 0),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[test]
    fn test_stdin_is_forwarded() {
        let output = run_with_timeout(
            &mut Command::new("cat"),
            Some(b"<?php echo 1;"),
            Duration::from_secs(10),
        )
        .unwrap();
        assert_eq!(output.stdout, b"<?php echo 1;");
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let err = run_with_timeout(
            &mut Command::new("definitely-not-a-real-binary-4821"),
            None,
            Duration::from_secs(1),
        )
        .unwrap_err();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn test_truncate_tail() {
        assert_eq!(truncate_tail("  short  ", 10), "short");
        assert_eq!(truncate_tail("abcdefghij", 4), "...ghij");
        // 3 bytes land inside the second-to-last "é"
        assert_eq!(truncate_tail("ééééé", 3), "...é");
    }
}

//! The sampling boundary: tool lookup, bounded command execution, and
//! pseudo-file reads.
//!
//! Samplers only talk to the machine through [`Host`], so they can be
//! exercised against scripted output in tests.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::constants::CHILD_POLL_MS;

/// Why a command produced no usable output.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("{0}: command not found")]
    NotFound(String),
    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} timed out after {}s", .after.as_secs_f32())]
    Timeout { program: String, after: Duration },
    #[error("{program} exited with {status}")]
    Exit { program: String, status: String },
}

/// Everything a sampler needs from the machine.
pub trait Host {
    /// Whether `name` resolves to an executable (not executed).
    fn tool_available(&self, name: &str) -> bool;

    /// Run `argv` and return combined stdout+stderr, or an error on
    /// spawn failure, non-zero exit, or timeout.
    fn run(&self, argv: &[&str], timeout: Duration) -> Result<String, CommandError>;

    /// Read a (pseudo-)file such as `/proc/net/dev`.
    fn read_file(&self, path: &str) -> Option<String>;
}

/// Whether `command` is on `PATH` (or is an existing path itself).
pub fn command_exists(command: &str) -> bool {
    if command.is_empty() {
        return false;
    }
    if command.contains('/') {
        return Path::new(command).exists();
    }
    let Some(paths) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&paths).any(|dir| dir.join(command).is_file())
}

/// [`Host`] backed by the local machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHost;

impl Host for SystemHost {
    fn tool_available(&self, name: &str) -> bool {
        command_exists(name)
    }

    fn run(&self, argv: &[&str], timeout: Duration) -> Result<String, CommandError> {
        let (program, args) = argv.split_first().ok_or(CommandError::Empty)?;
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => CommandError::NotFound(program.to_string()),
                _ => CommandError::Spawn {
                    program: program.to_string(),
                    source: e,
                },
            })?;
        wait_with_timeout(program, child, timeout)
    }

    fn read_file(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

/// Read a pipe to EOF on a helper thread while the child is polled.
///
/// On timeout the thread is not joined. It exits once every holder of the
/// pipe's write end is gone, which for a killed child with a surviving
/// grandchild is when the grandchild exits.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> std::thread::JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        buf
    })
}

fn wait_with_timeout(
    program: &str,
    mut child: Child,
    timeout: Duration,
) -> Result<String, CommandError> {
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let start = Instant::now();
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if start.elapsed() >= timeout => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Timeout {
                    program: program.to_string(),
                    after: timeout,
                });
            }
            Ok(None) => std::thread::sleep(Duration::from_millis(CHILD_POLL_MS)),
            Err(e) => {
                return Err(CommandError::Spawn {
                    program: program.to_string(),
                    source: e,
                })
            }
        }
    };

    let mut out = stdout.join().unwrap_or_default();
    out.extend(stderr.join().unwrap_or_default());
    if !status.success() {
        return Err(CommandError::Exit {
            program: program.to_string(),
            status: status.to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_command_does_not_exist() {
        assert!(!command_exists(""));
    }

    #[test]
    fn absolute_path_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let tool = dir.path().join("mytool");
        std::fs::write(&tool, "#!/bin/sh\n").unwrap();
        assert!(command_exists(tool.to_str().unwrap()));
        assert!(!command_exists(dir.path().join("absent").to_str().unwrap()));
    }

    #[test]
    fn run_empty_argv_is_error() {
        let err = SystemHost.run(&[], Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, CommandError::Empty));
    }

    #[test]
    fn run_missing_program_is_not_found() {
        let err = SystemHost
            .run(&["perfmon-definitely-not-installed"], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn run_combines_stdout_and_stderr() {
        let out = SystemHost
            .run(&["sh", "-c", "echo out; echo err 1>&2"], Duration::from_secs(5))
            .unwrap();
        assert!(out.contains("out"));
        assert!(out.contains("err"));
    }

    #[cfg(unix)]
    #[test]
    fn run_times_out() {
        let err = SystemHost
            .run(&["sleep", "5"], Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn run_timeout_does_not_wait_for_grandchild() {
        let start = Instant::now();
        let err = SystemHost
            .run(&["sh", "-c", "sleep 5 & sleep 5"], Duration::from_millis(100))
            .unwrap_err();
        assert!(matches!(err, CommandError::Timeout { .. }));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[cfg(unix)]
    #[test]
    fn run_nonzero_exit_is_error() {
        let err = SystemHost
            .run(&["sh", "-c", "exit 3"], Duration::from_secs(5))
            .unwrap_err();
        assert!(matches!(err, CommandError::Exit { .. }));
    }
}

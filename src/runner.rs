//! Shell command execution for resources

use declarative::{CancelToken, TaskError};
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

/// How often a cancellable command polls for exit or cancellation
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Captured result of a shell command
#[derive(Debug)]
pub struct ShellOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl ShellOutput {
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

fn shell(script: &str, dir: Option<&Path>) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(script).stdin(Stdio::null());
    if let Some(dir) = dir {
        cmd.current_dir(dir);
    }
    cmd
}

/// A shell outside the terminal's foreground process group
///
/// A terminal Ctrl-C is delivered to the whole foreground group; a child in
/// its own group only stops when converge itself decides to stop it.
fn detached_shell(script: &str, dir: Option<&Path>) -> Command {
    #[allow(unused_mut)]
    let mut cmd = shell(script, dir);
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }
    cmd
}

/// Run a script with `sh -c` to completion and capture its output
///
/// The child runs in its own process group, so terminal interrupts reach
/// converge (which cancels the run) but not the running script.
pub fn run_shell(script: &str, dir: Option<&Path>) -> Result<ShellOutput, TaskError> {
    let output = detached_shell(script, dir)
        .output()
        .map_err(|e| TaskError::io(format!("Failed to execute: sh -c {:?}", script), e))?;

    Ok(ShellOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
    })
}

/// Run a script with `sh -c`, killing it if `cancel` fires
///
/// Only for commands that are safe to interrupt (read-only probes).
pub fn run_shell_cancellable(
    script: &str,
    dir: Option<&Path>,
    cancel: &CancelToken,
) -> Result<ShellOutput, TaskError> {
    cancel.check()?;

    let mut child = shell(script, dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| TaskError::io(format!("Failed to execute: sh -c {:?}", script), e))?;

    // Drain pipes on their own threads so a chatty child cannot block on a full pipe
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = loop {
        if cancel.is_cancelled() {
            kill(&mut child);
            return Err(TaskError::Cancelled);
        }
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                kill(&mut child);
                return Err(TaskError::io(format!("Failed to wait for: sh -c {:?}", script), e));
            }
        }
    };

    Ok(ShellOutput {
        status,
        stdout: stdout.join().unwrap_or_default(),
        stderr: stderr.join().unwrap_or_default(),
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut buf);
        }
        String::from_utf8_lossy(&buf).to_string()
    })
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        log::debug!("Failed to kill child {}: {}", child.id(), e);
    }
    let _ = child.wait();
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_run_shell_captures_output() {
        let out = run_shell("echo hello; echo oops >&2; exit 3", None).unwrap();
        assert!(!out.success());
        assert_eq!(out.status.code(), Some(3));
        assert_eq!(out.stdout.trim(), "hello");
        assert_eq!(out.stderr.trim(), "oops");
    }

    #[test]
    fn test_run_shell_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = run_shell("pwd", Some(dir.path())).unwrap();
        let reported = std::path::PathBuf::from(out.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_run_shell_child_has_own_process_group() {
        let mut child = detached_shell("sleep 0.2", None).spawn().unwrap();
        let pid = child.id() as libc::pid_t;

        // SAFETY: plain queries on our own process and a live child
        let (child_group, our_group) = unsafe { (libc::getpgid(pid), libc::getpgrp()) };
        child.wait().unwrap();

        assert_eq!(child_group, pid);
        assert_ne!(child_group, our_group);
    }

    #[test]
    fn test_cancellable_completes() {
        let out = run_shell_cancellable("printf converged", None, &CancelToken::new()).unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "converged");
    }

    #[test]
    fn test_cancellable_is_killed_on_cancel() {
        let cancel = CancelToken::new();
        let trigger = cancel.clone();
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            trigger.cancel();
        });

        let started = Instant::now();
        let err = run_shell_cancellable("sleep 10", None, &cancel).unwrap_err();
        handle.join().unwrap();

        assert!(err.is_cancelled());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cancellable_refuses_after_cancel() {
        let cancel = CancelToken::new();
        cancel.cancel();
        let err = run_shell_cancellable("true", None, &cancel).unwrap_err();
        assert!(err.is_cancelled());
    }
}

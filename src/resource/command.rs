//! Command resource - converges with shell snippets

use declarative::{CancelToken, Status, Task, TaskError};
use std::path::{Path, PathBuf};

use crate::runner::{run_shell, run_shell_cancellable};

/// A pair of shell snippets: a probe and a fix
///
/// `check` exiting 0 means the system is already converged; its trimmed
/// stdout is reported as the current state. `apply` must make a later
/// `check` exit 0.
#[derive(Debug, Clone)]
pub struct Command {
    pub check: String,
    pub apply: String,
    /// Working directory for both snippets
    pub dir: Option<PathBuf>,
}

impl Command {
    pub fn new(check: impl Into<String>, apply: impl Into<String>) -> Self {
        Self {
            check: check.into(),
            apply: apply.into(),
            dir: None,
        }
    }

    pub fn in_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = Some(dir.as_ref().to_path_buf());
        self
    }
}

impl Task for Command {
    fn check(&self, cancel: &CancelToken) -> Result<Status, TaskError> {
        let out = run_shell_cancellable(&self.check, self.dir.as_deref(), cancel)?;
        Ok(Status {
            current: out.stdout.trim().to_string(),
            will_change: !out.success(),
        })
    }

    fn apply(&self, cancel: &CancelToken) -> Result<(), TaskError> {
        cancel.check()?;

        // Runs to completion in its own process group; Ctrl-C only cancels the run
        let out = run_shell(&self.apply, self.dir.as_deref())?;
        if !out.success() {
            let stderr = out.stderr.trim();
            return Err(TaskError::failed(if stderr.is_empty() {
                format!("apply command failed ({})", out.status)
            } else {
                format!("apply command failed ({}): {}", out.status, stderr)
            }));
        }
        Ok(())
    }
}

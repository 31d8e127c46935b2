//! Template resource - renders content into a file

use declarative::{CancelToken, Status, Task, TaskError};
use std::fs::{self, Metadata, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

/// Permission bits for newly created files when no mode is configured
pub const DEFAULT_MODE: u32 = 0o600;

/// A file whose content should match a rendered template
#[derive(Debug, Clone)]
pub struct Template {
    /// Path of the managed file
    pub destination: PathBuf,
    /// Desired file content
    pub content: String,
    /// Explicit permission bits; when unset, existing files keep theirs
    pub mode: Option<u32>,
}

impl Template {
    pub fn new(destination: impl AsRef<Path>, content: impl Into<String>) -> Self {
        Self {
            destination: destination.as_ref().to_path_buf(),
            content: content.into(),
            mode: None,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Metadata of the destination, or None if it does not exist
    fn stat(&self) -> Result<Option<Metadata>, TaskError> {
        match fs::metadata(&self.destination) {
            Ok(meta) if meta.is_dir() => Err(TaskError::failed(format!(
                "cannot template {:?}, is a directory",
                self.destination
            ))),
            Ok(meta) => Ok(Some(meta)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TaskError::io(
                format!("Failed to stat {}", self.destination.display()),
                e,
            )),
        }
    }

    #[cfg(unix)]
    fn mode_differs(&self, meta: &Metadata) -> bool {
        self.mode
            .is_some_and(|mode| meta.permissions().mode() & 0o7777 != mode)
    }

    #[cfg(not(unix))]
    fn mode_differs(&self, _meta: &Metadata) -> bool {
        false
    }

    /// Rewrite an existing file in place, keeping its permissions
    fn update(&self) -> Result<(), TaskError> {
        fs::write(&self.destination, &self.content).map_err(|e| {
            TaskError::io(format!("Failed to write {}", self.destination.display()), e)
        })?;
        if let Some(mode) = self.mode {
            self.set_mode(mode)?;
        }
        Ok(())
    }

    /// Create a new file with the configured or default mode
    fn create(&self) -> Result<(), TaskError> {
        let mode = self.mode.unwrap_or(DEFAULT_MODE);

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(mode);

        let mut file = options.open(&self.destination).map_err(|e| {
            TaskError::io(format!("Failed to create {}", self.destination.display()), e)
        })?;
        file.write_all(self.content.as_bytes()).map_err(|e| {
            TaskError::io(format!("Failed to write {}", self.destination.display()), e)
        })?;

        // The open mode is filtered by the umask; pin the exact bits
        self.set_mode(mode)
    }

    #[cfg(unix)]
    fn set_mode(&self, mode: u32) -> Result<(), TaskError> {
        fs::set_permissions(&self.destination, fs::Permissions::from_mode(mode)).map_err(|e| {
            TaskError::io(
                format!("Failed to set mode {:o} on {}", mode, self.destination.display()),
                e,
            )
        })
    }

    #[cfg(not(unix))]
    fn set_mode(&self, _mode: u32) -> Result<(), TaskError> {
        Ok(())
    }
}

impl Task for Template {
    fn check(&self, cancel: &CancelToken) -> Result<Status, TaskError> {
        cancel.check()?;

        let Some(meta) = self.stat()? else {
            return Ok(Status::changes(""));
        };

        let bytes = fs::read(&self.destination).map_err(|e| {
            TaskError::io(format!("Failed to read {}", self.destination.display()), e)
        })?;
        let current = String::from_utf8_lossy(&bytes).to_string();

        let will_change = current != self.content || self.mode_differs(&meta);
        Ok(Status {
            current,
            will_change,
        })
    }

    fn apply(&self, cancel: &CancelToken) -> Result<(), TaskError> {
        cancel.check()?;

        match self.stat()? {
            Some(_) => self.update(),
            None => self.create(),
        }
    }
}

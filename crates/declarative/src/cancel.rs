//! Run-wide cancellation token

use crate::error::TaskError;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A cancellation flag shared by every check and apply in one run.
///
/// Created once per invocation and passed explicitly to every task.
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation.
    ///
    /// Returns `true` only for the call that actually flipped the flag.
    /// Only performs a single atomic swap, so it may be called from a
    /// signal handler.
    pub fn cancel(&self) -> bool {
        !self.cancelled.swap(true, Ordering::SeqCst)
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return [`TaskError::Cancelled`] if the token has been triggered.
    ///
    /// Tasks call this before starting work and between blocking steps.
    pub fn check(&self) -> Result<(), TaskError> {
        if self.is_cancelled() {
            Err(TaskError::Cancelled)
        } else {
            Ok(())
        }
    }
}

//! Scripted tasks for engine tests

use crate::cancel::CancelToken;
use crate::error::TaskError;
use crate::task::{BoxedTask, Status, Task};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier, Mutex};

/// Ordered record of task events shared by all tasks in a test
#[derive(Debug, Clone, Default)]
pub(crate) struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    fn push(&self, event: String) {
        self.0.lock().unwrap().push(event);
    }

    pub(crate) fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.events()
            .iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    pub(crate) fn checked(&self) -> Vec<String> {
        self.with_prefix("check:")
    }

    /// Nodes whose apply was invoked
    pub(crate) fn applied(&self) -> Vec<String> {
        self.with_prefix("apply:")
    }

    pub(crate) fn position(&self, event: &str) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

/// A task whose behavior is fixed up front
#[derive(Debug)]
pub(crate) struct Scripted {
    name: String,
    log: EventLog,
    pending: AtomicBool,
    check_error: Option<String>,
    apply_error: Option<String>,
    barrier: Option<Arc<Barrier>>,
    cancel_during_apply: bool,
}

impl Scripted {
    fn new(name: &str, log: &EventLog, pending: bool) -> Self {
        Self {
            name: name.to_string(),
            log: log.clone(),
            pending: AtomicBool::new(pending),
            check_error: None,
            apply_error: None,
            barrier: None,
            cancel_during_apply: false,
        }
    }

    /// Out of date until applied
    pub(crate) fn changing(name: &str, log: &EventLog) -> Self {
        Self::new(name, log, true)
    }

    /// Already in its desired state
    pub(crate) fn converged(name: &str, log: &EventLog) -> Self {
        Self::new(name, log, false)
    }

    pub(crate) fn check_error(mut self, message: &str) -> Self {
        self.check_error = Some(message.to_string());
        self
    }

    pub(crate) fn apply_error(mut self, message: &str) -> Self {
        self.apply_error = Some(message.to_string());
        self
    }

    /// Block inside apply until every party of `barrier` has arrived
    pub(crate) fn wait_on(mut self, barrier: &Arc<Barrier>) -> Self {
        self.barrier = Some(Arc::clone(barrier));
        self
    }

    /// Trigger the run's cancel token from inside apply
    pub(crate) fn cancel_during_apply(mut self) -> Self {
        self.cancel_during_apply = true;
        self
    }

    pub(crate) fn boxed(self) -> BoxedTask {
        Box::new(self)
    }

    fn state(&self) -> &'static str {
        if self.pending.load(Ordering::SeqCst) {
            "old"
        } else {
            "new"
        }
    }
}

impl Task for Scripted {
    fn check(&self, cancel: &CancelToken) -> Result<Status, TaskError> {
        cancel.check()?;
        self.log.push(format!("check:{}", self.name));

        if let Some(message) = &self.check_error {
            return Err(TaskError::failed(message.clone()));
        }

        Ok(Status {
            current: self.state().to_string(),
            will_change: self.pending.load(Ordering::SeqCst),
        })
    }

    fn apply(&self, cancel: &CancelToken) -> Result<(), TaskError> {
        cancel.check()?;
        self.log.push(format!("apply:{}", self.name));

        if let Some(barrier) = &self.barrier {
            barrier.wait();
        }
        if self.cancel_during_apply {
            cancel.cancel();
        }

        let outcome = match &self.apply_error {
            Some(message) => Err(TaskError::failed(message.clone())),
            None => {
                self.pending.store(false, Ordering::SeqCst);
                Ok(())
            }
        };
        self.log.push(format!("done:{}", self.name));
        outcome
    }
}

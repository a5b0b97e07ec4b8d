//! # Execution Signal
//!
//! Wakes the association execution loop after a refresh.

use super::collaborators::ExecutionSignal;
use std::sync::Arc;
use tokio::sync::Notify;

/// Execution wake-up backed by [`tokio::sync::Notify`].
///
/// A signal raised while nobody is waiting is kept, so the execution loop
/// never misses a refresh that happened between two of its waits.
#[derive(Debug, Clone, Default)]
pub struct NotifyExecutionSignal {
    notify: Arc<Notify>,
}

impl NotifyExecutionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait until the next `execute()` call
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}

impl ExecutionSignal for NotifyExecutionSignal {
    fn execute(&self) {
        self.notify.notify_one();
    }
}

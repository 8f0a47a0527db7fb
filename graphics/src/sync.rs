//! Fence-based CPU/GPU synchronization.

use std::sync::Arc;

use crate::backend::Backend;
use crate::command::Command;
use crate::error::GraphicsError;

/// Submission gate over the backend's monotonic fence.
///
/// Every successful submission signals the next value in a strictly
/// increasing sequence starting at 1. A failed submission consumes no
/// value.
pub struct SyncGate {
    backend: Arc<dyn Backend>,
    next_value: u64,
}

impl SyncGate {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self {
            backend,
            next_value: 1,
        }
    }

    /// Submit a command stream; returns the fence value it will signal.
    pub fn submit(&mut self, commands: &[Command]) -> Result<u64, GraphicsError> {
        let value = self.next_value;
        self.backend.submit(commands, value)?;
        self.next_value += 1;
        Ok(value)
    }

    /// Fence value of the most recent successful submission, 0 if none.
    pub fn last_submitted(&self) -> u64 {
        self.next_value - 1
    }

    /// Highest fence value the device has signalled.
    pub fn completed_value(&self) -> u64 {
        self.backend.completed_value()
    }

    /// Block until `value` has been signalled. Returns immediately if it
    /// already has.
    pub fn wait_for_retirement(&self, value: u64) {
        if self.backend.completed_value() < value {
            self.backend.wait(value);
        }
    }

    /// Block until every submission so far has retired. Called before
    /// tearing down resources the device may still be using.
    pub fn drain(&self) {
        let last = self.last_submitted();
        if last > 0 {
            self.wait_for_retirement(last);
        }
    }
}

impl std::fmt::Debug for SyncGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncGate")
            .field("next_value", &self.next_value)
            .field("completed", &self.backend.completed_value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::HeadlessBackend;

    #[test]
    fn fence_values_are_strictly_increasing() {
        let backend: Arc<dyn Backend> = Arc::new(HeadlessBackend::new());
        let mut gate = SyncGate::new(backend.clone());

        assert_eq!(gate.last_submitted(), 0);
        assert_eq!(gate.submit(&[]).unwrap(), 1);
        assert_eq!(gate.submit(&[]).unwrap(), 2);
        assert_eq!(gate.submit(&[]).unwrap(), 3);
        assert_eq!(gate.completed_value(), 3);
    }

    #[test]
    fn wait_returns_once_the_value_retires() {
        let headless = Arc::new(HeadlessBackend::with_manual_retirement());
        let backend: Arc<dyn Backend> = headless.clone();
        let mut gate = SyncGate::new(backend);

        let value = gate.submit(&[]).unwrap();
        assert_eq!(gate.completed_value(), 0);

        let waiter = {
            let headless = headless.clone();
            std::thread::spawn(move || {
                std::thread::sleep(std::time::Duration::from_millis(20));
                headless.retire_to(value);
            })
        };
        gate.wait_for_retirement(value);
        assert_eq!(gate.completed_value(), value);
        waiter.join().unwrap();
    }

    #[test]
    fn drain_with_no_submissions_is_a_no_op() {
        let backend: Arc<dyn Backend> = Arc::new(HeadlessBackend::with_manual_retirement());
        let gate = SyncGate::new(backend);
        gate.drain();
    }
}

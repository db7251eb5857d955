use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, Semaphore};
use tokio::time;

/// Result of a timed `PortQueue::pop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Claim {
    Task(u16),
    /// Nothing became available before the timeout.
    Empty,
}

/// FIFO queue of ports with a counted completion barrier.
///
/// - `available` holds one permit per queued port, so a waiting `pop` can
///   never miss a push.
/// - `outstanding` counts pushed tasks not yet acknowledged with `mark_done`;
///   `wait_until_all_acknowledged` resolves when it reaches zero.
#[derive(Debug)]
pub struct PortQueue {
    tasks: Mutex<VecDeque<u16>>,
    available: Semaphore,
    outstanding: watch::Sender<usize>,
}

impl PortQueue {
    pub fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            available: Semaphore::new(0),
            outstanding: watch::Sender::new(0),
        }
    }

    pub fn push(&self, port: u16) {
        self.outstanding.send_modify(|n| *n += 1);
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(port);
        self.available.add_permits(1);
    }

    /// Wait up to `timeout` for a task.
    pub async fn pop(&self, timeout: Duration) -> Claim {
        match time::timeout(timeout, self.available.acquire()).await {
            Ok(Ok(permit)) => {
                permit.forget();
                let port = self
                    .tasks
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                port.map_or(Claim::Empty, Claim::Task)
            }
            _ => Claim::Empty,
        }
    }

    /// Acknowledge one claimed task.
    pub fn mark_done(&self) {
        self.outstanding.send_modify(|n| {
            if *n == 0 {
                tracing::warn!("mark_done called with no outstanding tasks");
            }
            *n = n.saturating_sub(1);
        });
    }

    /// Resolve once every pushed task has been acknowledged.
    pub async fn wait_until_all_acknowledged(&self) {
        let mut rx = self.outstanding.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }

    /// Tasks pushed but not yet acknowledged.
    pub fn outstanding(&self) -> usize {
        *self.outstanding.borrow()
    }

    /// Tasks waiting to be claimed.
    pub fn len(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PortQueue {
    fn default() -> Self {
        Self::new()
    }
}

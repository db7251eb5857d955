use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

/// Open ports found by the workers.
#[derive(Debug, Default)]
pub struct ResultCollector {
    open: Mutex<BTreeSet<u16>>,
}

impl ResultCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_open(&self, port: u16) {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(port);
    }

    /// Ascending, duplicate-free copy. Call once no worker is writing.
    pub fn snapshot(&self) -> Vec<u16> {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.open
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use crate::range::PortRange;
use crate::target::Target;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Final result of one scan.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub target: Target,
    pub range: PortRange,
    /// Ascending, duplicate-free.
    pub open_ports: Vec<u16>,
    pub ports_scanned: u64,
    pub workers: usize,
    /// False when a fatal worker error or cancellation cut the scan short.
    pub completed: bool,
    pub fault: Option<String>,
    pub started_at: String,
    pub duration: Duration,
}

impl Report {
    pub fn open_count(&self) -> usize {
        self.open_ports.len()
    }
}

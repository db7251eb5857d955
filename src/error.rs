use std::io;

use thiserror::Error;

/// Errors that abort a scan before any worker is started.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("hostname {host:?} could not be resolved: {reason}")]
    Resolution { host: String, reason: String },

    #[error("invalid port range {start}-{end} (expected 1 <= start <= end <= 65535)")]
    InvalidRange { start: u32, end: u32 },
}

/// Transport failure of a single connect probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Recoverable: the port is skipped and the scan goes on.
    #[error("transport error: {0}")]
    Transport(#[source] io::Error),

    /// The local host ran out of sockets, buffers or ephemeral ports.
    #[error("local resources exhausted: {0}")]
    ResourceExhausted(#[source] io::Error),
}

impl ProbeError {
    /// Whether this error must stop the whole worker pool.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProbeError::ResourceExhausted(_))
    }
}

/// A worker hit a condition no other worker can make progress past.
#[derive(Debug, Error)]
#[error("worker {worker} stopped the scan at port {port}: {source}")]
pub struct PoolFatalError {
    pub worker: usize,
    pub port: u16,
    #[source]
    pub source: ProbeError,
}

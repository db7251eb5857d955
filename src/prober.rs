use crate::error::ProbeError;
use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time;

/// Classified result of one connect probe.
#[derive(Debug)]
pub enum ScanOutcome {
    Open,
    ClosedOrFiltered,
    Error(ProbeError),
}

impl ScanOutcome {
    pub fn is_open(&self) -> bool {
        matches!(self, ScanOutcome::Open)
    }
}

/// One probe against one address. Implementations must bound their own run time.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, addr: SocketAddr) -> ScanOutcome;
}

/// TCP connect probe bounded by `connect_timeout`.
#[derive(Debug, Clone)]
pub struct TcpProber {
    connect_timeout: Duration,
}

impl TcpProber {
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, addr: SocketAddr) -> ScanOutcome {
        // Dropping either the stream or the timed-out connect future closes the socket.
        match time::timeout(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(_stream)) => ScanOutcome::Open,
            Ok(Err(e)) => classify_io_error(e),
            Err(_elapsed) => ScanOutcome::ClosedOrFiltered,
        }
    }
}

/// Map a failed connect to an outcome.
///
/// - refused, reset, timed out, unreachable: `ClosedOrFiltered`
/// - out of descriptors, buffers, memory or local addresses: fatal `ResourceExhausted`
/// - anything else: recoverable `Transport`
pub fn classify_io_error(err: io::Error) -> ScanOutcome {
    if is_exhaustion(&err) {
        return ScanOutcome::Error(ProbeError::ResourceExhausted(err));
    }
    if is_unreachable(&err) {
        return ScanOutcome::ClosedOrFiltered;
    }
    ScanOutcome::Error(ProbeError::Transport(err))
}

fn is_unreachable(err: &io::Error) -> bool {
    use io::ErrorKind::*;
    if matches!(
        err.kind(),
        ConnectionRefused | ConnectionReset | ConnectionAborted | TimedOut
    ) {
        return true;
    }
    #[cfg(unix)]
    if let Some(code) = err.raw_os_error() {
        return matches!(
            code,
            libc::EHOSTUNREACH | libc::ENETUNREACH | libc::EHOSTDOWN | libc::ENETDOWN
        );
    }
    false
}

fn is_exhaustion(err: &io::Error) -> bool {
    if err.kind() == io::ErrorKind::OutOfMemory {
        return true;
    }
    #[cfg(unix)]
    if let Some(code) = err.raw_os_error() {
        return matches!(
            code,
            libc::EMFILE | libc::ENFILE | libc::ENOBUFS | libc::ENOMEM | libc::EADDRNOTAVAIL
        );
    }
    false
}

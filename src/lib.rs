//! Library crate for port-sweep-rs: a worker-pool TCP connect scanner for one host.
pub mod collector;
pub mod config;
pub mod error;
pub mod pool;
pub mod prober;
pub mod queue;
pub mod range;
pub mod scanner;
pub mod target;
pub mod types;

pub use config::ScanConfig;
pub use error::{PoolFatalError, ProbeError, ScanError};
pub use range::PortRange;
pub use scanner::Scanner;
pub use types::Report;

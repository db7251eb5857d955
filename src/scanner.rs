use crate::collector::ResultCollector;
use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::pool::{WorkerContext, WorkerPool};
use crate::prober::{Prober, TcpProber};
use crate::queue::PortQueue;
use crate::range::PortRange;
use crate::target::{Resolve, SystemResolver};
use crate::types::Report;
use ::time::{format_description::well_known, OffsetDateTime};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs a worker-pool TCP connect scan against one host.
///
/// - Validates the range, then resolves the host exactly once.
/// - Seeds every port into a shared queue drained by a fixed worker pool.
/// - Returns when all ports are acknowledged, or early when a worker hits a
///   fatal error or the caller cancels, with `completed == false`.
#[derive(Clone)]
pub struct Scanner {
    config: ScanConfig,
    resolver: Arc<dyn Resolve>,
    prober: Arc<dyn Prober>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        let prober = TcpProber::new(config.connect_timeout());
        Self {
            config,
            resolver: Arc::new(SystemResolver),
            prober: Arc::new(prober),
        }
    }

    pub fn with_resolver(mut self, resolver: impl Resolve + 'static) -> Self {
        self.resolver = Arc::new(resolver);
        self
    }

    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = prober;
        self
    }

    pub async fn run(&self, host: &str, start: u32, end: u32) -> Result<Report, ScanError> {
        self.run_with_cancel(host, start, end, CancellationToken::new())
            .await
    }

    /// Variant that accepts a `CancellationToken` to allow external cancellation.
    pub async fn run_with_cancel(
        &self,
        host: &str,
        start: u32,
        end: u32,
        cancel: CancellationToken,
    ) -> Result<Report, ScanError> {
        // Checked before resolution so a bad range causes no network traffic.
        let range = PortRange::new(start, end)?;
        let target = self.resolver.resolve(host).await?;
        info!(host = %target.hostname, ip = %target.ip, %range, "scanning target");

        let started_at = now_iso_like();
        let clock = Instant::now();
        let queue = Arc::new(PortQueue::new());
        let collector = Arc::new(ResultCollector::new());
        let stop = cancel.child_token();

        let pool = WorkerPool::spawn(
            self.config.pool_size(),
            WorkerContext {
                ip: target.ip,
                queue: queue.clone(),
                collector: collector.clone(),
                prober: self.prober.clone(),
                stop: stop.clone(),
                poll_interval: self.config.poll_interval(),
            },
        );
        let workers = pool.size();

        for port in range.iter() {
            queue.push(port);
        }

        tokio::select! {
            _ = queue.wait_until_all_acknowledged() => {}
            _ = stop.cancelled() => {}
        }
        let summary = pool.shutdown().await;
        let duration = clock.elapsed();

        let fault = summary.fault.or_else(|| {
            (cancel.is_cancelled() && queue.outstanding() > 0)
                .then(|| "scan cancelled".to_string())
        });
        let completed = fault.is_none();
        let open_ports = collector.snapshot();

        if completed {
            info!(open = open_ports.len(), ?duration, "scan completed");
        } else {
            warn!(
                open = open_ports.len(),
                scanned = summary.probed,
                remaining = queue.outstanding(),
                "scan incomplete"
            );
        }

        Ok(Report {
            target,
            range,
            open_ports,
            ports_scanned: summary.probed,
            workers,
            completed,
            fault,
            started_at,
            duration,
        })
    }
}

fn now_iso_like() -> String {
    let now = OffsetDateTime::now_utc();
    now.format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

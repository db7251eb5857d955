use crate::collector::ResultCollector;
use crate::config::MAX_WORKERS;
use crate::error::PoolFatalError;
use crate::prober::{Prober, ScanOutcome};
use crate::queue::{Claim, PortQueue};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace, warn};

/// Handles shared by every worker of one scan.
#[derive(Clone)]
pub struct WorkerContext {
    pub ip: IpAddr,
    pub queue: Arc<PortQueue>,
    pub collector: Arc<ResultCollector>,
    pub prober: Arc<dyn Prober>,
    pub stop: CancellationToken,
    pub poll_interval: Duration,
}

/// What the pool reports after every worker has exited.
#[derive(Debug, Default)]
pub struct PoolSummary {
    /// Probes that ran to an outcome.
    pub probed: u64,
    /// First fatal condition observed, if any.
    pub fault: Option<String>,
}

/// Fixed set of workers draining one `PortQueue`.
pub struct WorkerPool {
    set: JoinSet<Result<u64, PoolFatalError>>,
    stop: CancellationToken,
    size: usize,
}

impl WorkerPool {
    /// Start `size` workers, clamped to `1..=MAX_WORKERS`.
    pub fn spawn(size: usize, ctx: WorkerContext) -> Self {
        let size = size.clamp(1, MAX_WORKERS);
        let stop = ctx.stop.clone();
        let mut set = JoinSet::new();
        for id in 0..size {
            set.spawn(run_worker(id, ctx.clone()));
        }
        debug!(workers = size, "worker pool started");
        Self { set, stop, size }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Set the stop signal and wait for every worker to exit.
    pub async fn shutdown(mut self) -> PoolSummary {
        self.stop.cancel();
        let mut summary = PoolSummary::default();
        while let Some(res) = self.set.join_next().await {
            match res {
                Ok(Ok(probed)) => summary.probed += probed,
                Ok(Err(fatal)) => {
                    // The fatal probe ran to an outcome too.
                    summary.probed += 1;
                    summary.fault.get_or_insert_with(|| fatal.to_string());
                }
                Err(join_err) => {
                    error!(error = %join_err, "worker task failed");
                    summary
                        .fault
                        .get_or_insert_with(|| format!("worker task failed: {join_err}"));
                }
            }
        }
        summary
    }
}

/// Claim, probe and record until the stop signal is set.
async fn run_worker(id: usize, ctx: WorkerContext) -> Result<u64, PoolFatalError> {
    let mut probed = 0u64;
    loop {
        let port = tokio::select! {
            biased;
            _ = ctx.stop.cancelled() => break,
            claim = ctx.queue.pop(ctx.poll_interval) => match claim {
                Claim::Task(port) => port,
                Claim::Empty => continue,
            },
        };

        let outcome = ctx.prober.probe(SocketAddr::new(ctx.ip, port)).await;
        match outcome {
            ScanOutcome::Open => {
                debug!(worker = id, port, "open");
                ctx.collector.record_open(port);
            }
            ScanOutcome::ClosedOrFiltered => trace!(worker = id, port, "closed or filtered"),
            ScanOutcome::Error(source) if source.is_fatal() => {
                let fatal = PoolFatalError {
                    worker: id,
                    port,
                    source,
                };
                error!(error = %fatal, "stopping scan");
                ctx.stop.cancel();
                ctx.queue.mark_done();
                return Err(fatal);
            }
            ScanOutcome::Error(err) => warn!(worker = id, port, error = %err, "probe failed"),
        }
        probed += 1;
        ctx.queue.mark_done();
    }
    trace!(worker = id, probed, "worker stopped");
    Ok(probed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct EvenOpen {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Prober for EvenOpen {
        async fn probe(&self, addr: SocketAddr) -> ScanOutcome {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if addr.port() % 2 == 0 {
                ScanOutcome::Open
            } else {
                ScanOutcome::ClosedOrFiltered
            }
        }
    }

    fn context(prober: Arc<dyn Prober>) -> WorkerContext {
        WorkerContext {
            ip: IpAddr::from([127, 0, 0, 1]),
            queue: Arc::new(PortQueue::new()),
            collector: Arc::new(ResultCollector::new()),
            prober,
            stop: CancellationToken::new(),
            poll_interval: Duration::from_millis(10),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn drains_queue_and_stops_cleanly() {
        let prober = Arc::new(EvenOpen {
            calls: AtomicUsize::new(0),
        });
        let ctx = context(prober.clone());
        let pool = WorkerPool::spawn(3, ctx.clone());
        for p in 1..=10 {
            ctx.queue.push(p);
        }
        ctx.queue.wait_until_all_acknowledged().await;
        let summary = pool.shutdown().await;

        assert_eq!(summary.probed, 10);
        assert!(summary.fault.is_none());
        assert_eq!(prober.calls.load(Ordering::SeqCst), 10);
        assert_eq!(ctx.collector.snapshot(), vec![2, 4, 6, 8, 10]);
    }

    #[tokio::test]
    async fn idle_pool_exits_on_stop() {
        let prober = Arc::new(EvenOpen {
            calls: AtomicUsize::new(0),
        });
        let pool = WorkerPool::spawn(8, context(prober));
        assert_eq!(pool.size(), 8);
        let summary = pool.shutdown().await;
        assert_eq!(summary.probed, 0);
    }

    #[tokio::test]
    async fn stopped_pool_claims_nothing() {
        let prober = Arc::new(EvenOpen {
            calls: AtomicUsize::new(0),
        });
        let ctx = context(prober.clone());
        ctx.stop.cancel();
        for p in 1..=5 {
            ctx.queue.push(p);
        }
        let summary = WorkerPool::spawn(2, ctx.clone()).shutdown().await;
        assert_eq!(summary.probed, 0);
        assert_eq!(ctx.queue.len(), 5);
        assert_eq!(prober.calls.load(Ordering::SeqCst), 0);
    }
}

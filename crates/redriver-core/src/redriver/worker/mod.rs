use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::config::{RedriverConfig, RetryConfig};
use crate::redriver::command::{CycleStats, RedriverCommand};
use crate::redriver::metrics::Metrics;
use crate::sink::{DeadLetterSink, EngineSink};
use crate::storage::Store;

mod cycle;
mod recovery;

/// Single-threaded poller/dispatcher core. Owns no shared mutable state —
/// coordination with concurrent redriver instances happens entirely
/// through the store's claim CAS.
pub(super) struct Worker {
    store: Arc<dyn Store>,
    engine: Arc<dyn EngineSink>,
    dead_letters: Arc<dyn DeadLetterSink>,
    inbound: Receiver<RedriverCommand>,
    poll_interval: Duration,
    batch_size: usize,
    claim_timeout_ms: u64,
    retry: RetryConfig,
    running: bool,
    metrics: Metrics,
}

/// Current wall-clock time as epoch milliseconds.
pub(super) fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

impl Worker {
    pub(super) fn new(
        store: Arc<dyn Store>,
        engine: Arc<dyn EngineSink>,
        dead_letters: Arc<dyn DeadLetterSink>,
        inbound: Receiver<RedriverCommand>,
        config: &RedriverConfig,
    ) -> Self {
        Self {
            store,
            engine,
            dead_letters,
            inbound,
            poll_interval: Duration::from_millis(config.poller.poll_interval_ms),
            batch_size: config.poller.batch_size,
            claim_timeout_ms: config.poller.claim_timeout_ms,
            retry: config.retry.clone(),
            running: true,
            metrics: Metrics::new(),
        }
    }

    /// Run the poller event loop. Blocks the current thread until a
    /// `Shutdown` command is received or the inbound channel disconnects.
    ///
    /// The fixed poll period is implemented as a deadline on the command
    /// receive: commands are handled as they arrive, and when the deadline
    /// passes one tick (claim sweep + poll-and-dispatch cycle) runs. An
    /// in-flight tick always drains before shutdown completes.
    pub(super) fn run(&mut self) {
        info!("redriver poller started");
        self.recover();

        let mut next_poll = Instant::now() + self.poll_interval;
        while self.running {
            let timeout = next_poll.saturating_duration_since(Instant::now());
            match self.inbound.recv_timeout(timeout) {
                Ok(cmd) => self.handle_command(cmd),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    self.tick();
                    next_poll = Instant::now() + self.poll_interval;
                }
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    info!("inbound channel disconnected, shutting down");
                    self.running = false;
                }
            }
        }

        info!("redriver poller stopped");
    }

    fn handle_command(&mut self, cmd: RedriverCommand) {
        match cmd {
            RedriverCommand::PollNow { reply } => {
                debug!("manual poll requested");
                let stats = self.tick();
                let _ = reply.send(stats);
            }
            RedriverCommand::Shutdown => {
                info!("shutdown command received");
                self.running = false;
            }
        }
    }

    /// One timer tick: sweep expired claims, then run a poll-and-dispatch
    /// cycle against the current wall clock.
    fn tick(&mut self) -> CycleStats {
        self.tick_at(now_ms())
    }

    pub(crate) fn tick_at(&mut self, now_ms: u64) -> CycleStats {
        let started = Instant::now();
        let mut stats = CycleStats::default();

        stats.reclaimed_claims = self.reclaim_expired_claims(now_ms);
        self.run_cycle(now_ms, &mut stats);

        self.metrics
            .record_cycle(&stats, started.elapsed().as_secs_f64() * 1_000.0);

        if stats.redriven > 0
            || stats.dead_lettered > 0
            || stats.reclaimed_claims > 0
            || stats.store_errors > 0
        {
            info!(
                scanned = stats.scanned,
                redriven = stats.redriven,
                dead_lettered = stats.dead_lettered,
                conflicts = stats.conflicts,
                emission_failures = stats.emission_failures,
                reclaimed_claims = stats.reclaimed_claims,
                store_errors = stats.store_errors,
                "poll cycle complete"
            );
        }
        stats
    }
}

#[cfg(test)]
mod tests;

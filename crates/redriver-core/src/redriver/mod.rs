pub mod command;
mod metrics;
mod worker;

use std::sync::Arc;
use std::thread;

use tracing::info;

use crate::config::RedriverConfig;
use crate::error::{RedriverError, RedriverResult};
use crate::sink::{DeadLetterSink, EngineSink};
use crate::storage::Store;

pub use command::{CycleStats, RedriverCommand};

use worker::Worker;

/// The redriver owns the poller thread and the inbound command channel.
/// Callers interact through `poll_now()` / `shutdown()`; the worker runs
/// the periodic poll-and-dispatch loop on a dedicated OS thread. Multiple
/// redriver instances may point at the same shared store — correctness
/// rests on the store's claim CAS, not on being the only instance.
pub struct Redriver {
    command_tx: crossbeam_channel::Sender<RedriverCommand>,
    worker_thread: Option<thread::JoinHandle<()>>,
}

impl Redriver {
    /// Create a new redriver, spawning the poller on a dedicated OS thread.
    #[tracing::instrument(skip_all, fields(poll_interval_ms = config.poller.poll_interval_ms))]
    pub fn new(
        config: RedriverConfig,
        store: Arc<dyn Store>,
        engine: Arc<dyn EngineSink>,
        dead_letters: Arc<dyn DeadLetterSink>,
    ) -> RedriverResult<Self> {
        let (tx, rx) = crossbeam_channel::bounded::<RedriverCommand>(
            config.poller.command_channel_capacity,
        );

        let handle = thread::Builder::new()
            .name("redriver-poller".to_string())
            .spawn(move || {
                let mut worker = Worker::new(store, engine, dead_letters, rx, &config);
                worker.run();
            })
            .map_err(|e| RedriverError::WorkerSpawn(e.to_string()))?;

        info!("redriver started");

        Ok(Self {
            command_tx: tx,
            worker_thread: Some(handle),
        })
    }

    /// Run one poll-and-dispatch cycle immediately and wait for its stats.
    pub fn poll_now(&self) -> RedriverResult<CycleStats> {
        let (reply_tx, reply_rx) = tokio::sync::oneshot::channel();
        self.send_command(RedriverCommand::PollNow { reply: reply_tx })?;
        reply_rx
            .blocking_recv()
            .map_err(|_| RedriverError::ReplyDropped)
    }

    /// Send a command to the poller. Returns an error if the channel is
    /// full or disconnected.
    pub fn send_command(&self, cmd: RedriverCommand) -> RedriverResult<()> {
        self.command_tx.try_send(cmd).map_err(|e| match e {
            crossbeam_channel::TrySendError::Full(_) => RedriverError::ChannelFull,
            crossbeam_channel::TrySendError::Disconnected(_) => {
                RedriverError::ChannelDisconnected
            }
        })
    }

    /// Initiate graceful shutdown: the in-flight cycle drains, no new cycle
    /// starts, and the poller thread is joined.
    pub fn shutdown(mut self) -> RedriverResult<()> {
        info!("initiating redriver shutdown");

        // Send shutdown command (ignore error if channel already closed)
        let _ = self.command_tx.send(RedriverCommand::Shutdown);

        if let Some(handle) = self.worker_thread.take() {
            handle.join().map_err(|_| RedriverError::WorkerPanicked)?;
        }

        info!("redriver shutdown complete");
        Ok(())
    }
}

impl Drop for Redriver {
    fn drop(&mut self) {
        // If shutdown wasn't called explicitly, attempt to stop the poller
        if self.worker_thread.is_some() {
            let _ = self.command_tx.send(RedriverCommand::Shutdown);
            if let Some(handle) = self.worker_thread.take() {
                let _ = handle.join();
            }
        }
    }
}

use super::*;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::config::{PollerConfig, RedriverConfig, RetryConfig};
use crate::error::{NotifyError, SubmitError};
use crate::policy::BackoffSchedule;
use crate::sink::{DeadLetterNotice, DeadLetterSink, EngineSink};

/// Fixed "now" used by the tests; cycles are driven via `tick_at` so no
/// test depends on the wall clock.
pub(super) const NOW: u64 = 1_000_000_000_000;

/// Recording engine sink. Set `fail` to make every submit error.
pub(super) struct FakeEngine {
    pub(super) submissions: Mutex<Vec<Uuid>>,
    pub(super) fail: AtomicBool,
}

impl FakeEngine {
    pub(super) fn new() -> Arc<Self> {
        Arc::new(Self {
            submissions: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        })
    }

    pub(super) fn submitted(&self) -> Vec<Uuid> {
        self.submissions.lock().unwrap().clone()
    }
}

impl EngineSink for FakeEngine {
    fn submit(&self, message_id: &Uuid) -> Result<(), SubmitError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SubmitError::Unavailable("engine down".to_string()));
        }
        self.submissions.lock().unwrap().push(*message_id);
        Ok(())
    }
}

/// Recording dead-letter sink.
pub(super) struct FakeDeadLetterSink {
    pub(super) notices: Mutex<Vec<DeadLetterNotice>>,
}

impl FakeDeadLetterSink {
    pub(super) fn new() -> Arc<Self> {
        Arc::new(Self {
            notices: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn received(&self) -> Vec<DeadLetterNotice> {
        self.notices.lock().unwrap().clone()
    }
}

impl DeadLetterSink for FakeDeadLetterSink {
    fn notify(&self, notice: &DeadLetterNotice) -> Result<(), NotifyError> {
        self.notices.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Config used across the worker tests: fixed 10s backoff, 3 retries.
pub(super) fn test_config() -> RedriverConfig {
    RedriverConfig {
        poller: PollerConfig {
            poll_interval_ms: 60_000,
            batch_size: 100,
            claim_timeout_ms: 30_000,
            command_channel_capacity: 64,
        },
        retry: RetryConfig {
            max_retries: 3,
            count_emission_failures: false,
            backoff: BackoffSchedule::Fixed { delay_ms: 10_000 },
        },
    }
}

pub(super) fn test_setup() -> (
    Worker,
    Arc<RocksDbStore>,
    Arc<FakeEngine>,
    Arc<FakeDeadLetterSink>,
    tempfile::TempDir,
) {
    test_setup_with_config(test_config())
}

pub(super) fn test_setup_with_config(
    config: RedriverConfig,
) -> (
    Worker,
    Arc<RocksDbStore>,
    Arc<FakeEngine>,
    Arc<FakeDeadLetterSink>,
    tempfile::TempDir,
) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
    let (worker, engine, dead_letters) = worker_on(Arc::clone(&store), &config);
    (worker, store, engine, dead_letters, dir)
}

/// A worker sharing an existing store — how a second redriver instance
/// against the same store is simulated.
pub(super) fn worker_on(
    store: Arc<RocksDbStore>,
    config: &RedriverConfig,
) -> (Worker, Arc<FakeEngine>, Arc<FakeDeadLetterSink>) {
    let engine = FakeEngine::new();
    let dead_letters = FakeDeadLetterSink::new();
    let (_tx, rx) = crossbeam_channel::bounded(config.poller.command_channel_capacity);
    let worker = Worker::new(
        store,
        Arc::clone(&engine) as Arc<dyn EngineSink>,
        Arc::clone(&dead_letters) as Arc<dyn DeadLetterSink>,
        rx,
        config,
    );
    (worker, engine, dead_letters)
}

/// A pending message due `overdue_ms` before `NOW`, with the given retry
/// count, already persisted.
pub(super) fn schedule_overdue(
    store: &RocksDbStore,
    overdue_ms: u64,
    retry_count: u32,
) -> ScheduledMessage {
    let mut msg = ScheduledMessage::new(ScheduledMessage::new_id(), NOW - overdue_ms);
    msg.retry_count = retry_count;
    store.schedule(&msg).unwrap();
    msg
}

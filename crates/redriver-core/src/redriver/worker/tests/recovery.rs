use super::*;

#[test]
fn expired_claim_is_released_and_redriven() {
    let (mut worker, store, engine, _dead_letters, _dir) = test_setup();

    // A peer claimed the message and died; its 30s deadline passes
    let msg = schedule_overdue(&store, 5_000, 0);
    assert!(store.claim(&msg.id, msg.scheduled_at, NOW + 30_000).unwrap());

    // Before the deadline: nothing to reclaim, nothing due
    let stats = worker.tick_at(NOW + 29_999);
    assert_eq!(stats, CycleStats::default());

    // After the deadline: the sweep releases the claim and the same tick's
    // cycle redrives the message
    let stats = worker.tick_at(NOW + 30_000);
    assert_eq!(stats.reclaimed_claims, 1);
    assert_eq!(stats.redriven, 1);
    assert_eq!(engine.submitted(), vec![msg.id]);

    let updated = store.get(&msg.id).unwrap().unwrap();
    assert_eq!(updated.status, MessageStatus::Pending);
    assert_eq!(updated.retry_count, 1);
}

#[test]
fn crash_between_submit_and_persist_is_redriven_again() {
    let (mut worker, store, engine, _dead_letters, _dir) = test_setup();

    // Simulate an instance that claimed, submitted, then died before
    // update_after_redrive: the message is still claimed, retry untouched.
    let msg = schedule_overdue(&store, 5_000, 0);
    assert!(store.claim(&msg.id, msg.scheduled_at, NOW + 30_000).unwrap());

    let stats = worker.tick_at(NOW + 31_000);
    assert_eq!(stats.reclaimed_claims, 1);
    assert_eq!(stats.redriven, 1, "at-least-once: the attempt repeats");
    assert_eq!(engine.submitted(), vec![msg.id]);
}

#[test]
fn recover_sweeps_stale_claims_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
    let config = test_config();

    // Claim left behind by a previous process, long expired
    let msg = schedule_overdue(&store, 120_000, 0);
    assert!(store
        .claim(&msg.id, msg.scheduled_at, NOW - 60_000)
        .unwrap());

    let (mut worker, _engine, _dls) = worker_on(Arc::clone(&store), &config);
    worker.recover();

    let recovered = store.get(&msg.id).unwrap().unwrap();
    assert_eq!(recovered.status, MessageStatus::Pending);
    assert_eq!(recovered.scheduled_at, msg.scheduled_at);
    assert_eq!(recovered.retry_count, 0);
}

#[test]
fn recover_leaves_live_claims_alone() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
    let config = test_config();

    let msg = schedule_overdue(&store, 5_000, 0);
    let far_future = now_ms() + 600_000;
    assert!(store.claim(&msg.id, msg.scheduled_at, far_future).unwrap());

    let (mut worker, _engine, _dls) = worker_on(Arc::clone(&store), &config);
    worker.recover();

    let untouched = store.get(&msg.id).unwrap().unwrap();
    assert_eq!(untouched.status, MessageStatus::Claimed);
    assert_eq!(untouched.claim_deadline, Some(far_future));
}

#[test]
fn failed_scan_is_survived() {
    // A store whose scans fail must only be logged — the worker carries on
    // and a later cycle recovers.
    struct FailingStore;

    impl Store for FailingStore {
        fn schedule(&self, _m: &ScheduledMessage) -> crate::error::StoreResult<()> {
            Ok(())
        }
        fn get(&self, _id: &Uuid) -> crate::error::StoreResult<Option<ScheduledMessage>> {
            Ok(None)
        }
        fn remove(&self, _id: &Uuid) -> crate::error::StoreResult<()> {
            Ok(())
        }
        fn find_due(
            &self,
            _now_ms: u64,
            _limit: usize,
        ) -> crate::error::StoreResult<Vec<ScheduledMessage>> {
            Err(crate::error::StoreError::RocksDb("io error".to_string()))
        }
        fn find_expired_claims(&self, _now_ms: u64) -> crate::error::StoreResult<Vec<Uuid>> {
            Err(crate::error::StoreError::RocksDb("io error".to_string()))
        }
        fn list_dead(&self, _limit: usize) -> crate::error::StoreResult<Vec<ScheduledMessage>> {
            Ok(Vec::new())
        }
        fn claim(
            &self,
            _id: &Uuid,
            _expected: u64,
            _deadline: u64,
        ) -> crate::error::StoreResult<bool> {
            Ok(false)
        }
        fn update_after_redrive(
            &self,
            _id: &Uuid,
            _rc: u32,
            _at: u64,
            _ts: u64,
        ) -> crate::error::StoreResult<()> {
            Ok(())
        }
        fn release_claim(&self, _id: &Uuid) -> crate::error::StoreResult<()> {
            Ok(())
        }
        fn mark_dead(&self, _id: &Uuid) -> crate::error::StoreResult<()> {
            Ok(())
        }
    }

    let config = test_config();
    let engine = FakeEngine::new();
    let dead_letters = FakeDeadLetterSink::new();
    let (_tx, rx) = crossbeam_channel::bounded(config.poller.command_channel_capacity);
    let mut worker = Worker::new(
        Arc::new(FailingStore),
        engine as Arc<dyn crate::sink::EngineSink>,
        dead_letters as Arc<dyn crate::sink::DeadLetterSink>,
        rx,
        &config,
    );

    let stats = worker.tick_at(NOW);
    assert_eq!(stats.store_errors, 1);
    assert_eq!(stats.reclaimed_claims, 0);
}

use super::*;

use std::sync::Arc;

/// Two redriver instances share one store and both poll the same due
/// message. Exactly one claim wins; the loser skips without error and the
/// message is redriven once.
#[test]
fn concurrent_instances_redrive_a_message_once() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
    let config = test_config();
    let (mut first, engine_a, _dls_a) = worker_on(Arc::clone(&store), &config);
    let (mut second, engine_b, _dls_b) = worker_on(Arc::clone(&store), &config);

    let msg = schedule_overdue(&store, 5_000, 0);

    // Both instances run a full cycle at the same instant. The first to
    // dispatch claims and reschedules; the second either finds nothing due
    // (scan after reschedule) or loses the claim CAS (scan before).
    let stats_a = first.tick_at(NOW);
    let stats_b = second.tick_at(NOW);

    assert_eq!(stats_a.redriven + stats_b.redriven, 1);
    assert_eq!(engine_a.submitted().len() + engine_b.submitted().len(), 1);

    let updated = store.get(&msg.id).unwrap().unwrap();
    assert_eq!(updated.retry_count, 1, "exactly one attempt recorded");
    assert_eq!(updated.scheduled_at, NOW + 10_000);
}

/// The sharper interleaving: both pollers scan (and see the message)
/// before either dispatches. The loser's claim must fail the CAS because
/// status and scheduled_at both moved.
#[test]
fn stale_candidate_loses_the_claim_race() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
    let config = test_config();
    let (mut loser, engine, _dls) = worker_on(Arc::clone(&store), &config);

    let msg = schedule_overdue(&store, 5_000, 0);

    // Both instances read the candidate...
    let candidates_winner = store.find_due(NOW, 100).unwrap();
    let candidates_loser = store.find_due(NOW, 100).unwrap();
    assert_eq!(candidates_winner.len(), 1);
    assert_eq!(candidates_loser.len(), 1);

    // ...the winner claims and completes its redrive...
    assert!(store.claim(&msg.id, msg.scheduled_at, NOW + 30_000).unwrap());
    store
        .update_after_redrive(&msg.id, 1, NOW + 10_000, NOW)
        .unwrap();

    // ...then the loser dispatches its stale candidate list. The message
    // is Pending again, but scheduled_at changed, so the CAS must reject.
    let mut stats = CycleStats::default();
    for candidate in &candidates_loser {
        loser.dispatch_one(candidate, NOW, &mut stats);
    }
    assert_eq!(stats.conflicts, 1);
    assert_eq!(stats.redriven, 0);
    assert!(engine.submitted().is_empty());

    let updated = store.get(&msg.id).unwrap().unwrap();
    assert_eq!(updated.retry_count, 1, "no double redrive");
    assert_eq!(updated.scheduled_at, NOW + 10_000);
}

/// A claim held by a live peer makes the candidate invisible to other
/// pollers entirely.
#[test]
fn claimed_message_is_invisible_to_other_pollers() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(RocksDbStore::open(dir.path()).unwrap());
    let config = test_config();
    let (mut other, engine, _dls) = worker_on(Arc::clone(&store), &config);

    let msg = schedule_overdue(&store, 5_000, 0);
    assert!(store.claim(&msg.id, msg.scheduled_at, NOW + 30_000).unwrap());

    let stats = other.tick_at(NOW);
    assert_eq!(stats, CycleStats::default());
    assert!(engine.submitted().is_empty());
}

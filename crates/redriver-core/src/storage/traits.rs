use uuid::Uuid;

use crate::error::StoreResult;
use crate::message::ScheduledMessage;

/// Store contract for all scheduled-message persistence. Implementations
/// must be thread-safe, and `claim` must be atomic with respect to every
/// other writer sharing the store: concurrent redriver instances rely on
/// it as their mutual-exclusion primitive (conditional update / row lock
/// in a relational backend, mutex-serialized compare-and-set here).
pub trait Store: Send + Sync {
    // --- Engine-side lifecycle ---

    /// Insert (or overwrite) a pending message and its due-index entry.
    /// Called by the workflow engine when it schedules deferred work.
    fn schedule(&self, message: &ScheduledMessage) -> StoreResult<()>;

    /// Fetch a message by id.
    fn get(&self, id: &Uuid) -> StoreResult<Option<ScheduledMessage>>;

    /// Delete a message and all its index entries. This is how the engine
    /// signals COMPLETE — completion is deletion, not a status.
    fn remove(&self, id: &Uuid) -> StoreResult<()>;

    // --- Poller reads ---

    /// All `Pending` messages with `scheduled_at <= now_ms`, ascending by
    /// `scheduled_at` (most-overdue first), at most `limit`. Read-only.
    fn find_due(&self, now_ms: u64, limit: usize) -> StoreResult<Vec<ScheduledMessage>>;

    /// Ids of claims whose deadline elapsed at or before `now_ms`,
    /// ordered by deadline (earliest first).
    fn find_expired_claims(&self, now_ms: u64) -> StoreResult<Vec<Uuid>>;

    /// Dead-lettered messages, up to `limit`. Operator inspection surface.
    fn list_dead(&self, limit: usize) -> StoreResult<Vec<ScheduledMessage>>;

    // --- Dispatcher transitions ---

    /// Optimistic claim: `Pending` → `Claimed` iff the current status is
    /// `Pending` and `scheduled_at` still equals `expected_scheduled_at`
    /// (the value the poller read). Returns `false` on any mismatch — a
    /// concurrent claim or completed work — never an error for a lost race.
    fn claim(
        &self,
        id: &Uuid,
        expected_scheduled_at: u64,
        claim_deadline_ms: u64,
    ) -> StoreResult<bool>;

    /// Record a successful redrive: `Claimed` → `Pending` with
    /// `retry_count = new_retry_count`, `scheduled_at = new_scheduled_at`
    /// (strictly in the future) and `last_redriven_at = redriven_at_ms`.
    fn update_after_redrive(
        &self,
        id: &Uuid,
        new_retry_count: u32,
        new_scheduled_at: u64,
        redriven_at_ms: u64,
    ) -> StoreResult<()>;

    /// Roll a claim back: `Claimed` → `Pending` with `scheduled_at` and
    /// `retry_count` unchanged. Idempotent for already-pending messages;
    /// an error for `Dead` (terminal).
    fn release_claim(&self, id: &Uuid) -> StoreResult<()>;

    /// `Claimed` → `Dead`. Terminal: no later call may resurrect the
    /// message.
    fn mark_dead(&self, id: &Uuid) -> StoreResult<()>;
}

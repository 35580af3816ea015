use super::*;

use crate::message::ScheduledMessage;
use crate::policy::{decide, RedriveDecision};
use crate::sink::DeadLetterNotice;

impl Worker {
    /// One poll-and-dispatch cycle: scan for due candidates (read-only),
    /// then dispatch each under its own claim. A failed scan is logged and
    /// the next cycle recovers — never fatal.
    pub(super) fn run_cycle(&mut self, now_ms: u64, stats: &mut CycleStats) {
        let candidates = match self.store.find_due(now_ms, self.batch_size) {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "due-message scan failed, retrying next cycle");
                stats.store_errors += 1;
                return;
            }
        };

        stats.scanned += candidates.len() as u64;
        for message in candidates {
            self.dispatch_one(&message, now_ms, stats);
        }
    }

    /// Dispatch a single candidate: claim, decide, then redrive or
    /// dead-letter. Claim conflicts are expected (a concurrent instance got
    /// there first, or the work completed) and skipped silently; transient
    /// store errors skip only this message.
    pub(super) fn dispatch_one(
        &mut self,
        message: &ScheduledMessage,
        now_ms: u64,
        stats: &mut CycleStats,
    ) {
        let claim_deadline = now_ms + self.claim_timeout_ms;
        match self
            .store
            .claim(&message.id, message.scheduled_at, claim_deadline)
        {
            Ok(true) => {}
            Ok(false) => {
                debug!(id = %message.id, "claim conflict, skipping");
                stats.conflicts += 1;
                return;
            }
            Err(e) => {
                warn!(id = %message.id, error = %e, "claim failed, skipping");
                stats.store_errors += 1;
                return;
            }
        }

        match decide(message.retry_count, self.retry.max_retries, &self.retry.backoff) {
            RedriveDecision::Redrive { delay_ms } => {
                self.redrive(message, now_ms, delay_ms, stats);
            }
            RedriveDecision::DeadLetter => {
                self.dead_letter(message, stats);
            }
        }
    }

    /// Re-submit to the engine, then persist the reschedule. On emission
    /// failure the claim is rolled back so the message stays pending at its
    /// original due time — unless failed emissions are configured to
    /// consume a retry attempt.
    fn redrive(
        &mut self,
        message: &ScheduledMessage,
        now_ms: u64,
        delay_ms: u64,
        stats: &mut CycleStats,
    ) {
        let new_scheduled_at = now_ms + delay_ms;

        match self.engine.submit(&message.id) {
            Ok(()) => {
                if let Err(e) = self.store.update_after_redrive(
                    &message.id,
                    message.retry_count + 1,
                    new_scheduled_at,
                    now_ms,
                ) {
                    // The redrive happened; if this claim now lingers, the
                    // deadline sweep releases it and a later cycle retries.
                    warn!(id = %message.id, error = %e, "failed to persist redrive");
                    stats.store_errors += 1;
                    return;
                }
                debug!(
                    id = %message.id,
                    retry_count = message.retry_count + 1,
                    scheduled_at = new_scheduled_at,
                    "message redriven"
                );
                stats.redriven += 1;
            }
            Err(e) => {
                warn!(id = %message.id, error = %e, "engine emission failed");
                let rollback = if self.retry.count_emission_failures {
                    // The failed emission consumes an attempt: persisted
                    // exactly like a successful redrive.
                    self.store.update_after_redrive(
                        &message.id,
                        message.retry_count + 1,
                        new_scheduled_at,
                        now_ms,
                    )
                } else {
                    self.store.release_claim(&message.id)
                };
                match rollback {
                    Ok(()) => stats.emission_failures += 1,
                    Err(e) => {
                        warn!(id = %message.id, error = %e, "failed to release claim");
                        stats.store_errors += 1;
                    }
                }
            }
        }
    }

    /// Retry budget exhausted: terminal transition, then alert. A failed
    /// notification never un-deadletters the message.
    fn dead_letter(&mut self, message: &ScheduledMessage, stats: &mut CycleStats) {
        if let Err(e) = self.store.mark_dead(&message.id) {
            warn!(id = %message.id, error = %e, "failed to dead-letter message");
            stats.store_errors += 1;
            return;
        }

        let notice = DeadLetterNotice {
            message_id: message.id,
            retry_count: message.retry_count,
            scheduled_at: message.scheduled_at,
        };
        if let Err(e) = self.dead_letters.notify(&notice) {
            warn!(id = %message.id, error = %e, "dead-letter notification failed");
        }
        info!(
            id = %message.id,
            retry_count = message.retry_count,
            "message dead-lettered, retries exhausted"
        );
        stats.dead_lettered += 1;
    }
}

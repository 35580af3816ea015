use super::*;

impl Worker {
    /// Sweep claims whose deadline has elapsed and release them back to
    /// pending. Covers a peer instance that crashed mid-dispatch and a
    /// dispatch that died between engine submit and the reschedule write.
    /// Returns the number of claims released.
    pub(super) fn reclaim_expired_claims(&mut self, now_ms: u64) -> u64 {
        let expired = match self.store.find_expired_claims(now_ms) {
            Ok(expired) => expired,
            Err(e) => {
                warn!(error = %e, "failed to scan expired claims");
                return 0;
            }
        };

        let mut reclaimed = 0u64;
        for id in &expired {
            match self.store.release_claim(id) {
                Ok(()) => {
                    debug!(%id, "released expired claim");
                    reclaimed += 1;
                }
                Err(e) => {
                    warn!(%id, error = %e, "failed to release expired claim");
                }
            }
        }

        if reclaimed > 0 {
            info!(reclaimed, "released expired claims");
        }
        reclaimed
    }

    /// Recover after a crash or restart: run the expired-claim sweep
    /// immediately instead of waiting for the first timer tick. Claims left
    /// by a crashed instance become eligible as their deadlines pass; live
    /// peers' claims are left alone. The claim timeout must exceed the
    /// worst-case claim-to-update window of a healthy dispatch, otherwise
    /// the sweep could release a claim that is still being worked.
    pub(super) fn recover(&mut self) {
        let released = self.reclaim_expired_claims(now_ms());
        if released > 0 {
            info!(released, "recovery: stale claims released");
        }
    }
}

/// Commands sent from caller threads to the poller worker.
///
/// Variants that expect a response carry a `tokio::sync::oneshot::Sender`
/// for the reply; fire-and-forget commands omit it.
pub enum RedriverCommand {
    /// Run one poll-and-dispatch cycle immediately instead of waiting for
    /// the next timer tick. Ops and test surface.
    PollNow {
        reply: tokio::sync::oneshot::Sender<CycleStats>,
    },
    Shutdown,
}

/// Outcome counters for a single poll-and-dispatch cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Due candidates returned by the scan.
    pub scanned: u64,
    /// Messages successfully submitted and rescheduled.
    pub redriven: u64,
    /// Messages that exhausted their retry budget this cycle.
    pub dead_lettered: u64,
    /// Claims lost to a concurrent instance or completed work. Expected,
    /// not errors.
    pub conflicts: u64,
    /// Engine emissions that failed (claim rolled back, or the attempt
    /// counted when so configured).
    pub emission_failures: u64,
    /// Expired claims swept back to pending before the scan.
    pub reclaimed_claims: u64,
    /// Messages skipped because of a transient store error.
    pub store_errors: u64,
}

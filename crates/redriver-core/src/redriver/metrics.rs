use opentelemetry::metrics::{Counter, Histogram, Meter};

/// Core OTel metrics for the redriver. Created once during worker init and
/// recorded on each cycle. If no meter provider is configured (OTel
/// disabled), the instruments are no-op.
pub(crate) struct Metrics {
    pub messages_redriven: Counter<u64>,
    pub messages_dead_lettered: Counter<u64>,
    pub claim_conflicts: Counter<u64>,
    pub emission_failures: Counter<u64>,
    pub claims_reclaimed: Counter<u64>,
    pub poll_cycles: Counter<u64>,
    pub cycle_duration_ms: Histogram<f64>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub(crate) fn new() -> Self {
        let meter = opentelemetry::global::meter("redriver");
        Self::from_meter(&meter)
    }

    fn from_meter(meter: &Meter) -> Self {
        Self {
            messages_redriven: meter
                .u64_counter("redriver.messages.redriven")
                .with_description("Total messages re-submitted to the engine")
                .build(),
            messages_dead_lettered: meter
                .u64_counter("redriver.messages.dead_lettered")
                .with_description("Total messages that exhausted their retry budget")
                .build(),
            claim_conflicts: meter
                .u64_counter("redriver.claims.conflicts")
                .with_description("Claims lost to a concurrent redriver instance")
                .build(),
            emission_failures: meter
                .u64_counter("redriver.engine.emission_failures")
                .with_description("Engine submissions that failed and released the claim")
                .build(),
            claims_reclaimed: meter
                .u64_counter("redriver.claims.reclaimed")
                .with_description("Expired claims swept back to pending")
                .build(),
            poll_cycles: meter
                .u64_counter("redriver.poll.cycles")
                .with_description("Poll-and-dispatch cycles completed")
                .build(),
            cycle_duration_ms: meter
                .f64_histogram("redriver.poll.cycle_duration_ms")
                .with_description("Wall-clock duration of a poll cycle in milliseconds")
                .build(),
        }
    }

    pub(crate) fn record_cycle(&self, stats: &super::command::CycleStats, elapsed_ms: f64) {
        self.poll_cycles.add(1, &[]);
        self.cycle_duration_ms.record(elapsed_ms, &[]);
        self.messages_redriven.add(stats.redriven, &[]);
        self.messages_dead_lettered.add(stats.dead_lettered, &[]);
        self.claim_conflicts.add(stats.conflicts, &[]);
        self.emission_failures.add(stats.emission_failures, &[]);
        self.claims_reclaimed.add(stats.reclaimed_claims, &[]);
    }
}

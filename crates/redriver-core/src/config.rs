use serde::Deserialize;

use crate::policy::BackoffSchedule;

/// Top-level redriver configuration, deserializable from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RedriverConfig {
    pub poller: PollerConfig,
    pub retry: RetryConfig,
}

/// Poller configuration (scan period, batch bound, claim lifetime).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Fixed period between poll cycles, in milliseconds.
    pub poll_interval_ms: u64,
    /// Maximum candidates dispatched per cycle. Caps work per tick so a
    /// large backlog drains over several cycles instead of one long one.
    pub batch_size: usize,
    /// How long a claim may be held before the deadline sweep releases it.
    /// Bounds the damage of an instance crashing mid-dispatch.
    pub claim_timeout_ms: u64,
    pub command_channel_capacity: usize,
}

/// Retry configuration: budget and backoff.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Redrive attempts before a message is dead-lettered.
    pub max_retries: u32,
    /// When true, a failed engine emission consumes a retry attempt
    /// (the message is rescheduled per the backoff instead of staying due
    /// at its original time). Default false: transient engine outages do
    /// not burn the retry budget.
    pub count_emission_failures: bool,
    pub backoff: BackoffSchedule,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 5_000,
            batch_size: 100,
            claim_timeout_ms: 30_000,
            command_channel_capacity: 64,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            count_emission_failures: false,
            backoff: BackoffSchedule::default(),
        }
    }
}

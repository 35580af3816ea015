use serde::Deserialize;

/// Backoff schedule mapping a retry count to the delay before the next
/// redrive attempt. Configured under `[retry.backoff]`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum BackoffSchedule {
    /// Constant delay regardless of retry count.
    Fixed { delay_ms: u64 },
    /// `initial * multiplier^retry_count`, capped at `max_delay_ms`.
    Exponential {
        initial_delay_ms: u64,
        multiplier: f64,
        max_delay_ms: u64,
    },
}

impl Default for BackoffSchedule {
    fn default() -> Self {
        BackoffSchedule::Exponential {
            initial_delay_ms: 1_000,
            multiplier: 2.0,
            max_delay_ms: 60_000,
        }
    }
}

impl BackoffSchedule {
    /// Delay before the attempt that would become `retry_count + 1`.
    pub fn delay_ms(&self, retry_count: u32) -> u64 {
        match self {
            BackoffSchedule::Fixed { delay_ms } => *delay_ms,
            BackoffSchedule::Exponential {
                initial_delay_ms,
                multiplier,
                max_delay_ms,
            } => {
                let scaled = (*initial_delay_ms as f64) * multiplier.powi(retry_count as i32);
                if scaled >= *max_delay_ms as f64 {
                    *max_delay_ms
                } else {
                    scaled as u64
                }
            }
        }
    }
}

/// Outcome of the retry decision for one overdue message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedriveDecision {
    /// Redrive now and reschedule `delay_ms` into the future.
    Redrive { delay_ms: u64 },
    /// Retry budget exhausted — transition to `Dead` and alert.
    DeadLetter,
}

/// Pure decision function: no store access, no clock, no side effects.
/// Deterministic for a given (retry_count, max_retries, schedule) triple
/// so it can be tested in isolation.
pub fn decide(
    retry_count: u32,
    max_retries: u32,
    schedule: &BackoffSchedule,
) -> RedriveDecision {
    if retry_count >= max_retries {
        RedriveDecision::DeadLetter
    } else {
        RedriveDecision::Redrive {
            delay_ms: schedule.delay_ms(retry_count),
        }
    }
}

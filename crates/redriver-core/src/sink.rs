use tracing::warn;
use uuid::Uuid;

use crate::error::{NotifyError, SubmitError};

/// Hand a message back into the workflow engine's execution pipeline.
///
/// Implementations must be thread-safe: `submit` is called from the poller
/// thread while the handle may live elsewhere. Any failure is treated as
/// retryable — the claim is released and the message stays eligible.
pub trait EngineSink: Send + Sync {
    fn submit(&self, message_id: &Uuid) -> Result<(), SubmitError>;
}

/// Notification emitted when a message exhausts its retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterNotice {
    pub message_id: Uuid,
    pub retry_count: u32,
    /// The message's final scheduled time, epoch milliseconds.
    pub scheduled_at: u64,
}

/// Alerting/ops channel for dead-lettered messages.
pub trait DeadLetterSink: Send + Sync {
    fn notify(&self, notice: &DeadLetterNotice) -> Result<(), NotifyError>;
}

/// Default dead-letter sink: surfaces notices in the log stream at warn
/// level. Used when no dedicated alerting channel is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDeadLetterSink;

impl DeadLetterSink for LogDeadLetterSink {
    fn notify(&self, notice: &DeadLetterNotice) -> Result<(), NotifyError> {
        warn!(
            message_id = %notice.message_id,
            retry_count = notice.retry_count,
            scheduled_at = notice.scheduled_at,
            "message dead-lettered"
        );
        Ok(())
    }
}

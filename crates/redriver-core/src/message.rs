use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a scheduled message as seen by the redriver.
///
/// `Dead` is terminal — the store refuses any transition out of it.
/// A successful redrive is not a status of its own: it is the
/// `Claimed` → `Pending` transition with `scheduled_at` advanced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    Pending,
    Claimed,
    Dead,
}

/// A workflow engine event awaiting execution. This is the redriver's view
/// of the record: identity, due time and retry bookkeeping — what the
/// message means to the engine is opaque here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScheduledMessage {
    pub id: Uuid,
    /// Epoch milliseconds after which the message is due.
    pub scheduled_at: u64,
    /// Redrive attempts already made.
    pub retry_count: u32,
    pub status: MessageStatus,
    /// Epoch milliseconds of the most recent redrive, if any.
    pub last_redriven_at: Option<u64>,
    /// Epoch milliseconds at which an outstanding claim expires.
    /// `Some` exactly while status is `Claimed`.
    pub claim_deadline: Option<u64>,
}

impl ScheduledMessage {
    /// Generate a new UUIDv7 message ID.
    pub fn new_id() -> Uuid {
        Uuid::now_v7()
    }

    /// A fresh pending message, as the workflow engine creates it.
    pub fn new(id: Uuid, scheduled_at: u64) -> Self {
        Self {
            id,
            scheduled_at,
            retry_count: 0,
            status: MessageStatus::Pending,
            last_redriven_at: None,
            claim_deadline: None,
        }
    }
}

/// Low-level store errors (RocksDB, serialization, integrity).
/// This is the error type for the `Store` trait — store operations can only
/// fail with infrastructure or integrity errors, never business outcomes:
/// a lost claim race is `Ok(false)`, not an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("rocksdb error: {0}")]
    RocksDb(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("corrupt data: {0}")]
    CorruptData(String),

    /// A transition the state machine forbids, e.g. resurrecting a
    /// dead-lettered message.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        StoreError::RocksDb(err.into_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Engine emission failures. Both variants are retryable from the
/// redriver's perspective: the claim is released and the message stays
/// eligible for a future cycle.
#[derive(Debug, thiserror::Error)]
pub enum SubmitError {
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    #[error("engine rejected message: {0}")]
    Rejected(String),
}

/// Dead-letter notification failures. Never blocks terminality — the
/// worker logs and moves on.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("dead-letter notification failed: {0}")]
    Delivery(String),
}

/// Errors surfaced by the `Redriver` handle.
#[derive(Debug, thiserror::Error)]
pub enum RedriverError {
    #[error("failed to spawn poller thread: {0}")]
    WorkerSpawn(String),

    #[error("command channel full")]
    ChannelFull,

    #[error("command channel disconnected")]
    ChannelDisconnected,

    #[error("poller thread panicked")]
    WorkerPanicked,

    /// The worker dropped the reply channel before answering — only
    /// happens if it is shutting down.
    #[error("poller dropped the reply")]
    ReplyDropped,
}

pub type RedriverResult<T> = std::result::Result<T, RedriverError>;

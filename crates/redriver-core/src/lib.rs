pub mod config;
pub mod error;
pub mod message;
pub mod policy;
pub mod redriver;
pub mod sink;
pub mod storage;
pub mod telemetry;

pub use config::RedriverConfig;
pub use error::{NotifyError, RedriverError, StoreError, StoreResult, SubmitError};
pub use message::{MessageStatus, ScheduledMessage};
pub use policy::{decide, BackoffSchedule, RedriveDecision};
pub use redriver::{CycleStats, Redriver, RedriverCommand};
pub use sink::{DeadLetterNotice, DeadLetterSink, EngineSink, LogDeadLetterSink};
pub use storage::{RocksDbStore, Store};

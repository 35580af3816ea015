use super::*;
use crate::message::{MessageStatus, ScheduledMessage};
use crate::storage::RocksDbStore;
use uuid::Uuid;

mod common;
use common::*;

mod concurrency;
mod recovery;

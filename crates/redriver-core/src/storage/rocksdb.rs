use std::path::Path;
use std::sync::{Arc, Mutex};

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, IteratorMode, MultiThreaded,
    Options, WriteBatch,
};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::message::{MessageStatus, ScheduledMessage};
use crate::storage::keys;
use crate::storage::traits::Store;

const CF_MESSAGES: &str = "messages";
const CF_DUE_INDEX: &str = "due_index";
const CF_CLAIMS: &str = "claims";

/// All column family names (excluding `default` which RocksDB creates automatically).
const COLUMN_FAMILIES: &[&str] = &[CF_MESSAGES, CF_DUE_INDEX, CF_CLAIMS];

type DB = DBWithThreadMode<MultiThreaded>;

/// RocksDB-backed store implementation.
///
/// Every state transition is a single `WriteBatch`, so the message row and
/// its index entries move together or not at all. Read-modify-write
/// sequences serialize on `write_lock` — that is what makes `claim` a real
/// compare-and-set for every writer sharing this store handle. Plain reads
/// (`get`, `find_due`, scans) take no lock.
pub struct RocksDbStore {
    db: DB,
    write_lock: Mutex<()>,
}

impl RocksDbStore {
    /// Open or create a RocksDB database at the given path with all column families.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;
        Ok(Self {
            db,
            write_lock: Mutex::new(()),
        })
    }

    fn cf(&self, name: &str) -> StoreResult<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::RocksDb(format!("column family not found: {name}")))
    }

    fn get_inner(&self, id: &Uuid) -> StoreResult<Option<ScheduledMessage>> {
        let cf = self.cf(CF_MESSAGES)?;
        match self.db.get_cf(&cf, keys::message_key(id))? {
            Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
            None => Ok(None),
        }
    }

    /// Batch ops deleting whatever index entries the current message state
    /// implies (a due entry while pending, a claim entry while claimed).
    fn delete_index_entries(
        &self,
        batch: &mut WriteBatch,
        message: &ScheduledMessage,
    ) -> StoreResult<()> {
        match message.status {
            MessageStatus::Pending => {
                let due_cf = self.cf(CF_DUE_INDEX)?;
                batch.delete_cf(&due_cf, keys::due_key(message.scheduled_at, &message.id));
            }
            MessageStatus::Claimed => {
                let deadline = message.claim_deadline.ok_or_else(|| {
                    StoreError::CorruptData(format!(
                        "claimed message {} has no claim deadline",
                        message.id
                    ))
                })?;
                let claims_cf = self.cf(CF_CLAIMS)?;
                batch.delete_cf(&claims_cf, keys::claim_key(deadline, &message.id));
            }
            MessageStatus::Dead => {}
        }
        Ok(())
    }

    fn put_with_due_entry(
        &self,
        batch: &mut WriteBatch,
        message: &ScheduledMessage,
    ) -> StoreResult<()> {
        let msg_cf = self.cf(CF_MESSAGES)?;
        let due_cf = self.cf(CF_DUE_INDEX)?;
        let value = serde_json::to_vec(message)?;
        batch.put_cf(&msg_cf, keys::message_key(&message.id), &value);
        batch.put_cf(&due_cf, keys::due_key(message.scheduled_at, &message.id), b"");
        Ok(())
    }
}

impl Store for RocksDbStore {
    fn schedule(&self, message: &ScheduledMessage) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let mut batch = WriteBatch::default();
        if let Some(existing) = self.get_inner(&message.id)? {
            if existing.status == MessageStatus::Dead {
                return Err(StoreError::InvalidTransition(format!(
                    "message {} is dead-lettered and cannot be rescheduled",
                    message.id
                )));
            }
            self.delete_index_entries(&mut batch, &existing)?;
        }

        let mut message = message.clone();
        message.status = MessageStatus::Pending;
        message.claim_deadline = None;
        self.put_with_due_entry(&mut batch, &message)?;

        self.db.write(batch)?;
        Ok(())
    }

    fn get(&self, id: &Uuid) -> StoreResult<Option<ScheduledMessage>> {
        self.get_inner(id)
    }

    fn remove(&self, id: &Uuid) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let Some(existing) = self.get_inner(id)? else {
            return Ok(());
        };

        let mut batch = WriteBatch::default();
        self.delete_index_entries(&mut batch, &existing)?;
        let msg_cf = self.cf(CF_MESSAGES)?;
        batch.delete_cf(&msg_cf, keys::message_key(id));
        self.db.write(batch)?;
        Ok(())
    }

    fn find_due(&self, now_ms: u64, limit: usize) -> StoreResult<Vec<ScheduledMessage>> {
        let due_cf = self.cf(CF_DUE_INDEX)?;
        let upper = keys::index_upper_bound(now_ms);

        let mut results = Vec::new();
        for item in self.db.iterator_cf(&due_cf, IteratorMode::Start) {
            let (key, _) = item?;
            if key.as_ref() > upper.as_slice() || results.len() >= limit {
                break;
            }
            let Some((_, id)) = keys::parse_index_key(&key) else {
                return Err(StoreError::CorruptData(
                    "malformed due_index key".to_string(),
                ));
            };
            // An index entry implies a pending message; skip anything else
            // rather than failing the whole scan.
            match self.get_inner(&id)? {
                Some(msg) if msg.status == MessageStatus::Pending => results.push(msg),
                _ => {}
            }
        }
        Ok(results)
    }

    fn find_expired_claims(&self, now_ms: u64) -> StoreResult<Vec<Uuid>> {
        let claims_cf = self.cf(CF_CLAIMS)?;
        let upper = keys::index_upper_bound(now_ms);

        let mut results = Vec::new();
        for item in self.db.iterator_cf(&claims_cf, IteratorMode::Start) {
            let (key, _) = item?;
            if key.as_ref() > upper.as_slice() {
                break;
            }
            let Some((_, id)) = keys::parse_index_key(&key) else {
                return Err(StoreError::CorruptData("malformed claims key".to_string()));
            };
            results.push(id);
        }
        Ok(results)
    }

    fn list_dead(&self, limit: usize) -> StoreResult<Vec<ScheduledMessage>> {
        let msg_cf = self.cf(CF_MESSAGES)?;
        let mut results = Vec::new();
        for item in self.db.iterator_cf(&msg_cf, IteratorMode::Start) {
            if results.len() >= limit {
                break;
            }
            let (_, value) = item?;
            let msg: ScheduledMessage = serde_json::from_slice(&value)?;
            if msg.status == MessageStatus::Dead {
                results.push(msg);
            }
        }
        Ok(results)
    }

    fn claim(
        &self,
        id: &Uuid,
        expected_scheduled_at: u64,
        claim_deadline_ms: u64,
    ) -> StoreResult<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let Some(existing) = self.get_inner(id)? else {
            return Ok(false);
        };
        if existing.status != MessageStatus::Pending
            || existing.scheduled_at != expected_scheduled_at
        {
            return Ok(false);
        }

        let mut claimed = existing.clone();
        claimed.status = MessageStatus::Claimed;
        claimed.claim_deadline = Some(claim_deadline_ms);

        let msg_cf = self.cf(CF_MESSAGES)?;
        let due_cf = self.cf(CF_DUE_INDEX)?;
        let claims_cf = self.cf(CF_CLAIMS)?;
        let value = serde_json::to_vec(&claimed)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&msg_cf, keys::message_key(id), &value);
        batch.delete_cf(&due_cf, keys::due_key(existing.scheduled_at, id));
        batch.put_cf(&claims_cf, keys::claim_key(claim_deadline_ms, id), b"");
        self.db.write(batch)?;
        Ok(true)
    }

    fn update_after_redrive(
        &self,
        id: &Uuid,
        new_retry_count: u32,
        new_scheduled_at: u64,
        redriven_at_ms: u64,
    ) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        // The engine may have completed (removed) the message while the
        // claim was held; completion wins and there is nothing to update.
        let Some(existing) = self.get_inner(id)? else {
            return Ok(());
        };
        if existing.status != MessageStatus::Claimed {
            return Err(StoreError::InvalidTransition(format!(
                "update_after_redrive on message {id} requires a held claim"
            )));
        }

        let mut batch = WriteBatch::default();
        self.delete_index_entries(&mut batch, &existing)?;

        let mut updated = existing;
        updated.status = MessageStatus::Pending;
        updated.retry_count = new_retry_count;
        updated.scheduled_at = new_scheduled_at;
        updated.last_redriven_at = Some(redriven_at_ms);
        updated.claim_deadline = None;
        self.put_with_due_entry(&mut batch, &updated)?;

        self.db.write(batch)?;
        Ok(())
    }

    fn release_claim(&self, id: &Uuid) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let Some(existing) = self.get_inner(id)? else {
            return Ok(());
        };
        match existing.status {
            // Already released — idempotent on repeated rollback paths.
            MessageStatus::Pending => Ok(()),
            MessageStatus::Dead => Err(StoreError::InvalidTransition(format!(
                "message {id} is dead-lettered and cannot be released"
            ))),
            MessageStatus::Claimed => {
                let mut batch = WriteBatch::default();
                self.delete_index_entries(&mut batch, &existing)?;

                let mut released = existing;
                released.status = MessageStatus::Pending;
                released.claim_deadline = None;
                self.put_with_due_entry(&mut batch, &released)?;

                self.db.write(batch)?;
                Ok(())
            }
        }
    }

    fn mark_dead(&self, id: &Uuid) -> StoreResult<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());

        let Some(existing) = self.get_inner(id)? else {
            return Ok(());
        };
        match existing.status {
            MessageStatus::Dead => Ok(()),
            MessageStatus::Pending => Err(StoreError::InvalidTransition(format!(
                "mark_dead on message {id} requires a held claim"
            ))),
            MessageStatus::Claimed => {
                let mut batch = WriteBatch::default();
                self.delete_index_entries(&mut batch, &existing)?;

                let mut dead = existing;
                dead.status = MessageStatus::Dead;
                dead.claim_deadline = None;
                let msg_cf = self.cf(CF_MESSAGES)?;
                batch.put_cf(&msg_cf, keys::message_key(id), serde_json::to_vec(&dead)?);

                self.db.write(batch)?;
                Ok(())
            }
        }
    }
}

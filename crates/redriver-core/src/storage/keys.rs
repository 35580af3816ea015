//! Key encoding for RocksDB column families.
//!
//! Messages are keyed by their raw 16-byte UUID. The `due_index` and
//! `claims` column families use timestamp-first composite keys so a
//! forward iteration visits entries in chronological order:
//! `{timestamp_ms BE}{:}{uuid}`. Big-endian encoding makes lexicographic
//! order equal numeric order.

const SEPARATOR: u8 = b':';

/// Byte length of an index key: 8-byte timestamp + separator + 16-byte UUID.
const INDEX_KEY_LEN: usize = 8 + 1 + 16;

/// Message CF key: the raw UUID bytes.
pub fn message_key(id: &uuid::Uuid) -> [u8; 16] {
    *id.as_bytes()
}

/// Due-index key: `{scheduled_at_ms}:{msg_id}`. Exists iff the message is
/// pending; a forward scan yields the most-overdue messages first.
pub fn due_key(scheduled_at_ms: u64, id: &uuid::Uuid) -> Vec<u8> {
    index_key(scheduled_at_ms, id)
}

/// Claim-index key: `{claim_deadline_ms}:{msg_id}`. Exists iff the message
/// is claimed; a forward scan yields the earliest-expiring claims first.
pub fn claim_key(claim_deadline_ms: u64, id: &uuid::Uuid) -> Vec<u8> {
    index_key(claim_deadline_ms, id)
}

fn index_key(ts_ms: u64, id: &uuid::Uuid) -> Vec<u8> {
    let mut key = Vec::with_capacity(INDEX_KEY_LEN);
    key.extend_from_slice(&ts_ms.to_be_bytes());
    key.push(SEPARATOR);
    key.extend_from_slice(id.as_bytes());
    key
}

/// Upper bound for scanning index entries with timestamp <= `ts_ms`.
/// 0xFF padding after the timestamp sorts after any real key at `ts_ms`.
pub fn index_upper_bound(ts_ms: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(INDEX_KEY_LEN);
    key.extend_from_slice(&ts_ms.to_be_bytes());
    key.extend_from_slice(&[0xFF; INDEX_KEY_LEN - 8]);
    key
}

/// Decode `(timestamp_ms, msg_id)` from an index key. `None` if the key
/// is malformed.
pub fn parse_index_key(key: &[u8]) -> Option<(u64, uuid::Uuid)> {
    if key.len() != INDEX_KEY_LEN || key[8] != SEPARATOR {
        return None;
    }
    let ts_bytes: [u8; 8] = key[..8].try_into().ok()?;
    let id_bytes: [u8; 16] = key[9..].try_into().ok()?;
    Some((u64::from_be_bytes(ts_bytes), uuid::Uuid::from_bytes(id_bytes)))
}

//! Snapshot Codec
//!
//! Binary encoding of the full entry mapping.
//!
//! # Format
//!
//! ```text
//! magic (4 bytes): "TTLC"
//! version (1 byte): 1
//! records (variable): bincode-serialized Vec<SnapshotRecord>
//! ```

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cache::{CacheEntry, CacheStore};
use crate::error::{CacheError, Result};
use crate::snapshot::ValueRegistry;

/// Snapshot magic bytes
pub const MAGIC: &[u8; 4] = b"TTLC";
/// Current snapshot format version
pub const VERSION: u8 = 1;
/// Magic plus version byte
const HEADER_LEN: usize = 5;

/// One persisted entry.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotRecord {
    key: String,
    tag: String,
    /// Unix nanoseconds, None = never expires
    expires_at: Option<i64>,
    payload: Vec<u8>,
}

// == Encode ==
/// Writes every stored entry of `store` to `writer`.
///
/// Fails with `Encoding` before writing anything if a value's type is not
/// registered.
pub fn encode_store<W: Write>(
    store: &CacheStore,
    registry: &ValueRegistry,
    mut writer: W,
) -> Result<()> {
    let mut records = Vec::with_capacity(store.len());

    for (key, entry) in store.iter() {
        let (tag, payload) = registry
            .encode(&entry.value)
            .map_err(|e| CacheError::Encoding(format!("key `{}`: {}", key, e)))?
            .ok_or_else(|| {
                CacheError::Encoding(format!(
                    "key `{}`: value type `{}` is not registered",
                    key,
                    entry.value.type_name()
                ))
            })?;

        records.push(SnapshotRecord {
            key: key.clone(),
            tag,
            expires_at: entry.expires_at,
            payload,
        });
    }

    writer.write_all(MAGIC)?;
    writer.write_all(&[VERSION])?;
    bincode::serialize_into(&mut writer, &records).map_err(encode_error)?;
    writer.flush()?;

    debug!(count = records.len(), "Snapshot encoded");
    Ok(())
}

// == Decode ==
/// Reads a whole snapshot from `reader`.
///
/// The stream is read to its end before decoding, so a length prefix larger
/// than the input fails with `Decoding` instead of allocating.
///
/// Every record is decoded before anything is returned, so a bad stream
/// never yields a partial result.
pub fn decode_entries<R: Read>(
    registry: &ValueRegistry,
    mut reader: R,
) -> Result<Vec<(String, CacheEntry)>> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    if bytes.len() < HEADER_LEN {
        return Err(CacheError::Decoding(
            "snapshot is shorter than its header".to_string(),
        ));
    }
    if &bytes[0..4] != MAGIC {
        return Err(CacheError::Decoding("invalid magic bytes".to_string()));
    }
    if bytes[4] != VERSION {
        return Err(CacheError::Decoding(format!(
            "unsupported snapshot version {} (expected {})",
            bytes[4], VERSION
        )));
    }

    let records: Vec<SnapshotRecord> =
        bincode::deserialize(&bytes[HEADER_LEN..]).map_err(decode_error)?;

    let mut entries = Vec::with_capacity(records.len());
    for record in records {
        let value = registry
            .decode(&record.tag, &record.payload)
            .map_err(|e| CacheError::Decoding(format!("key `{}`: {}", record.key, e)))?
            .ok_or_else(|| {
                CacheError::Decoding(format!(
                    "key `{}`: unknown value tag `{}`",
                    record.key, record.tag
                ))
            })?;
        entries.push((
            record.key,
            CacheEntry::with_expiration(value, record.expires_at),
        ));
    }

    debug!(count = entries.len(), "Snapshot decoded");
    Ok(entries)
}

fn encode_error(err: bincode::Error) -> CacheError {
    match *err {
        bincode::ErrorKind::Io(e) => CacheError::Io(e),
        other => CacheError::Encoding(other.to_string()),
    }
}

fn decode_error(err: bincode::Error) -> CacheError {
    match *err {
        bincode::ErrorKind::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            CacheError::Decoding("snapshot is truncated".to_string())
        }
        bincode::ErrorKind::Io(e) => CacheError::Io(e),
        other => CacheError::Decoding(other.to_string()),
    }
}

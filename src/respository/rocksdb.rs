use crate::types::AppError;
use rocksdb::{Direction, IteratorMode, Options, WriteBatch, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

pub const BLOCK_HEAD_KEY: &str = "block_head";

// Heights are zero padded so lexical key order is height order.
pub fn local_block_key(height: u64) -> String {
    format!("block:{:020}", height)
}

pub fn unscan_prefix(height: u64) -> String {
    format!("unscan:{:020}:", height)
}

pub fn unscan_key(height: u64, id: &str) -> String {
    format!("{}{}", unscan_prefix(height), id)
}

/// Open RocksDB database
pub fn open_rocksdb(path: &Path) -> Result<DB, AppError> {
    let mut opts = Options::default();
    opts.create_if_missing(true);

    DB::open(&opts, path).map_err(|e| {
        AppError::Initialization(format!("Failed to open RocksDB at '{}': {}", path.display(), e))
    })
}

pub fn put_json<T: Serialize>(db: &DB, key: &str, value: &T) -> Result<(), AppError> {
    let bytes = serde_json::to_vec(value)?;
    db.put(key.as_bytes(), bytes)
        .map_err(|e| AppError::Database(format!("RocksDB put failed: {}", e)))
}

pub fn get_json<T: DeserializeOwned>(db: &DB, key: &str) -> Result<Option<T>, AppError> {
    match db.get(key.as_bytes()) {
        Ok(Some(value)) => Ok(Some(serde_json::from_slice(&value)?)),
        Ok(None) => Ok(None),
        Err(e) => Err(AppError::Database(format!("RocksDB get failed: {}", e))),
    }
}

/// Every value whose key starts with `prefix`, in key order.
pub fn scan_prefix<T: DeserializeOwned>(db: &DB, prefix: &str) -> Result<Vec<(String, T)>, AppError> {
    let mut out = Vec::new();
    let iter = db.iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));
    for item in iter {
        let (key, value) = item.map_err(|e| AppError::Database(format!("RocksDB iterate failed: {}", e)))?;
        if !key.starts_with(prefix.as_bytes()) {
            break;
        }
        let key = String::from_utf8(key.to_vec())
            .map_err(|e| AppError::Database(format!("Invalid UTF-8 key: {}", e)))?;
        out.push((key, serde_json::from_slice(&value)?));
    }
    Ok(out)
}

pub fn delete_prefix(db: &DB, prefix: &str) -> Result<usize, AppError> {
    let mut batch = WriteBatch::default();
    let mut count = 0;

    let iter = db.iterator(IteratorMode::From(prefix.as_bytes(), Direction::Forward));
    for item in iter {
        let (key, _) = item.map_err(|e| AppError::Database(format!("RocksDB iterate failed: {}", e)))?;
        if !key.starts_with(prefix.as_bytes()) {
            break;
        }
        batch.delete(&key);
        count += 1;
    }

    db.write(batch)
        .map_err(|e| AppError::Database(format!("RocksDB batch write failed: {}", e)))?;

    Ok(count)
}

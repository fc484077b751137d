use crate::coin::metaverse::model::BlockHeader;
use crate::respository::r#trait::{Repository, UnscanRecord};
use crate::respository::rocksdb::{
    delete_prefix, get_json, local_block_key, put_json, scan_prefix, unscan_key, unscan_prefix,
    BLOCK_HEAD_KEY,
};
use crate::types::AppError;
use async_trait::async_trait;
use log::debug;
use rocksdb::DB;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Serialize, Deserialize)]
struct BlockHead {
    height: u64,
    hash: String,
}

/// RocksDB-backed checkpoint store, JSON values.
#[derive(Clone)]
pub struct RocksDBRepository {
    db: Arc<DB>,
}

impl RocksDBRepository {
    pub fn new(db: Arc<DB>) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DB {
        &self.db
    }
}

#[async_trait]
impl Repository for RocksDBRepository {
    async fn get_local_block_head(&self) -> Result<(u64, String), AppError> {
        let head: Option<BlockHead> = get_json(&self.db, BLOCK_HEAD_KEY)?;
        Ok(head.map(|h| (h.height, h.hash)).unwrap_or((0, String::new())))
    }

    async fn save_local_block_head(&self, height: u64, hash: &str) -> Result<(), AppError> {
        put_json(&self.db, BLOCK_HEAD_KEY, &BlockHead { height, hash: hash.to_string() })
    }

    async fn save_unscan_record(&self, record: UnscanRecord) -> Result<(), AppError> {
        put_json(&self.db, &unscan_key(record.block_height, &record.id), &record)
    }

    async fn get_unscan_records(&self) -> Result<Vec<UnscanRecord>, AppError> {
        let records: Vec<(String, UnscanRecord)> = scan_prefix(&self.db, "unscan:")?;
        Ok(records.into_iter().map(|(_, r)| r).collect())
    }

    async fn delete_unscan_record(&self, height: u64) -> Result<(), AppError> {
        let removed = delete_prefix(&self.db, &unscan_prefix(height))?;
        debug!("[RocksDB] removed {} unscan records at height {}", removed, height);
        Ok(())
    }

    async fn save_local_block(&self, header: &BlockHeader) -> Result<(), AppError> {
        put_json(&self.db, &local_block_key(header.height), header)
    }

    async fn get_local_block(&self, height: u64) -> Result<Option<BlockHeader>, AppError> {
        get_json(&self.db, &local_block_key(height))
    }
}

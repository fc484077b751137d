use crate::coin::metaverse::model::BlockHeader;
use crate::respository::r#trait::{Repository, UnscanRecord};
use crate::types::AppError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-process checkpoint store. Nothing survives a restart.
#[derive(Clone, Default)]
pub struct MemoryRepository {
    block_head: Arc<RwLock<Option<(u64, String)>>>,

    // height -> header
    local_blocks: Arc<RwLock<HashMap<u64, BlockHeader>>>,

    // record id -> record, ordered so reads are stable
    unscan_records: Arc<RwLock<BTreeMap<String, UnscanRecord>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn get_local_block_head(&self) -> Result<(u64, String), AppError> {
        let head = self.block_head.read().await;
        Ok(head.clone().unwrap_or((0, String::new())))
    }

    async fn save_local_block_head(&self, height: u64, hash: &str) -> Result<(), AppError> {
        let mut head = self.block_head.write().await;
        *head = Some((height, hash.to_string()));
        Ok(())
    }

    async fn save_unscan_record(&self, record: UnscanRecord) -> Result<(), AppError> {
        let mut records = self.unscan_records.write().await;
        records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_unscan_records(&self) -> Result<Vec<UnscanRecord>, AppError> {
        let records = self.unscan_records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn delete_unscan_record(&self, height: u64) -> Result<(), AppError> {
        let mut records = self.unscan_records.write().await;
        records.retain(|_, r| r.block_height != height);
        Ok(())
    }

    async fn save_local_block(&self, header: &BlockHeader) -> Result<(), AppError> {
        let mut blocks = self.local_blocks.write().await;
        blocks.insert(header.height, header.clone());
        Ok(())
    }

    async fn get_local_block(&self, height: u64) -> Result<Option<BlockHeader>, AppError> {
        let blocks = self.local_blocks.read().await;
        Ok(blocks.get(&height).cloned())
    }
}

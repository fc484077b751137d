use crate::coin::metaverse::model::BlockHeader;
use crate::config::Settings;
use crate::respository::r#trait::UnscanRecord;
use crate::respository::{MemoryRepository, Repository};
use crate::types::AppError;
use async_trait::async_trait;
use log::info;
use std::sync::Arc;

#[cfg(feature = "rocksdb-backend")]
use crate::respository::{open_rocksdb, RocksDBRepository};

/// Repository selected at startup from `[repository]` settings.
pub enum RepositoryWrapper {
    Memory(Arc<MemoryRepository>),
    #[cfg(feature = "rocksdb-backend")]
    RocksDB(Arc<RocksDBRepository>),
}

impl RepositoryWrapper {
    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        if settings.repository.memory_db {
            info!("[Repository] using in-memory checkpoint store");
            return Ok(RepositoryWrapper::Memory(Arc::new(MemoryRepository::new())));
        }

        #[cfg(feature = "rocksdb-backend")]
        {
            let path = settings.rocksdb_path();
            std::fs::create_dir_all(&path)?;
            let db = open_rocksdb(&path)?;
            info!("[Repository] using RocksDB at {}", path.display());
            Ok(RepositoryWrapper::RocksDB(Arc::new(RocksDBRepository::new(Arc::new(db)))))
        }

        #[cfg(not(feature = "rocksdb-backend"))]
        {
            Err(AppError::Initialization(
                "persistent repository requires the `rocksdb-backend` feature; set repository.memory_db = true".to_string(),
            ))
        }
    }
}

#[async_trait]
impl Repository for RepositoryWrapper {
    async fn get_local_block_head(&self) -> Result<(u64, String), AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.get_local_block_head().await,
            #[cfg(feature = "rocksdb-backend")]
            RepositoryWrapper::RocksDB(r) => r.get_local_block_head().await,
        }
    }

    async fn save_local_block_head(&self, height: u64, hash: &str) -> Result<(), AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.save_local_block_head(height, hash).await,
            #[cfg(feature = "rocksdb-backend")]
            RepositoryWrapper::RocksDB(r) => r.save_local_block_head(height, hash).await,
        }
    }

    async fn save_unscan_record(&self, record: UnscanRecord) -> Result<(), AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.save_unscan_record(record).await,
            #[cfg(feature = "rocksdb-backend")]
            RepositoryWrapper::RocksDB(r) => r.save_unscan_record(record).await,
        }
    }

    async fn get_unscan_records(&self) -> Result<Vec<UnscanRecord>, AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.get_unscan_records().await,
            #[cfg(feature = "rocksdb-backend")]
            RepositoryWrapper::RocksDB(r) => r.get_unscan_records().await,
        }
    }

    async fn delete_unscan_record(&self, height: u64) -> Result<(), AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.delete_unscan_record(height).await,
            #[cfg(feature = "rocksdb-backend")]
            RepositoryWrapper::RocksDB(r) => r.delete_unscan_record(height).await,
        }
    }

    async fn save_local_block(&self, header: &BlockHeader) -> Result<(), AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.save_local_block(header).await,
            #[cfg(feature = "rocksdb-backend")]
            RepositoryWrapper::RocksDB(r) => r.save_local_block(header).await,
        }
    }

    async fn get_local_block(&self, height: u64) -> Result<Option<BlockHeader>, AppError> {
        match self {
            RepositoryWrapper::Memory(r) => r.get_local_block(height).await,
            #[cfg(feature = "rocksdb-backend")]
            RepositoryWrapper::RocksDB(r) => r.get_local_block(height).await,
        }
    }
}

use crate::coin::metaverse::model::BlockHeader;
use crate::types::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscanReason {
    FetchFailed,
    ExtractFailed,
    NotifyFailed,
}

impl fmt::Display for UnscanReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnscanReason::FetchFailed => "fetch_failed",
            UnscanReason::ExtractFailed => "extract_failed",
            UnscanReason::NotifyFailed => "notify_failed",
        };
        f.write_str(s)
    }
}

/// A height (and optionally one transaction) that must be scanned again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnscanRecord {
    /// Same height, txid and symbol always give the same id.
    pub id: String,
    pub block_height: u64,
    /// Empty when the whole height is affected.
    pub tx_id: String,
    pub kind: UnscanReason,
    pub reason: String,
    pub symbol: String,
}

impl UnscanRecord {
    pub fn new(block_height: u64, tx_id: &str, kind: UnscanReason, reason: &str, symbol: &str) -> Self {
        let plain = format!("{}_{}_{}", symbol, block_height, tx_id);
        Self {
            id: hex::encode(Sha256::digest(plain.as_bytes())),
            block_height,
            tx_id: tx_id.to_string(),
            kind,
            reason: reason.to_string(),
            symbol: symbol.to_string(),
        }
    }
}

/// Checkpoint store: scan head, recently scanned headers and the failure ledger.
#[async_trait]
pub trait Repository: Send + Sync {
    /// `(0, "")` when nothing was saved yet.
    async fn get_local_block_head(&self) -> Result<(u64, String), AppError>;

    async fn save_local_block_head(&self, height: u64, hash: &str) -> Result<(), AppError>;

    /// Overwrites a record with the same id.
    async fn save_unscan_record(&self, record: UnscanRecord) -> Result<(), AppError>;

    async fn get_unscan_records(&self) -> Result<Vec<UnscanRecord>, AppError>;

    /// Removes every record at `height`.
    async fn delete_unscan_record(&self, height: u64) -> Result<(), AppError>;

    async fn save_local_block(&self, header: &BlockHeader) -> Result<(), AppError>;

    async fn get_local_block(&self, height: u64) -> Result<Option<BlockHeader>, AppError>;
}

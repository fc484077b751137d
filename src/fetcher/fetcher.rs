/**
* filename : interface
* author : HAMA
* date: 2025. 4. 6.
* description: chain data source used by the scanner and decoders
**/

use async_trait::async_trait;
use serde_json::Value;

use crate::coin::metaverse::model::{AddressAsset, Block, BlockHeader, EtpBalance, Transaction};
use crate::coin::metaverse::RawTxRequest;
use crate::types::AppError;

#[async_trait]
pub trait BlockFetcher: Send + Sync {
  /// Latest header when `height` is `None`.
  async fn get_block_header(&self, height: Option<u64>) -> Result<BlockHeader, AppError>;
  async fn get_block(&self, height: u64) -> Result<Block, AppError>;
  async fn get_transaction(&self, txid: &str) -> Result<Transaction, AppError>;
  async fn get_address_balance(&self, address: &str) -> Result<EtpBalance, AppError>;
  /// Never fails on a node-side error; an unknown asset yields a zero balance.
  async fn get_address_asset(&self, address: &str, symbol: &str) -> Result<AddressAsset, AppError>;
  async fn create_raw_transaction(&self, request: &RawTxRequest) -> Result<String, AppError>;
  async fn decode_raw_transaction(&self, raw_hex: &str) -> Result<Transaction, AppError>;
  async fn submit_raw_transaction(&self, raw_hex: &str) -> Result<String, AppError>;
  async fn get_info(&self) -> Result<Value, AppError>;
  fn chain_name(&self) -> &str;
}

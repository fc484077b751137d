use async_trait::async_trait;
use log::debug;
use serde_json::Value;

use crate::coin::metaverse::model::{AddressAsset, Block, BlockHeader, EtpBalance, Transaction};
use crate::coin::metaverse::{MetaverseClient, RawTxRequest};
use crate::fetcher::fetcher::BlockFetcher;
use crate::types::AppError;

pub struct MetaverseFetcher {
  pub client: MetaverseClient,
  pub symbol: String,
}

impl MetaverseFetcher {
  pub fn new(client: MetaverseClient, symbol: impl Into<String>) -> Self {
    Self {
      client,
      symbol: symbol.into(),
    }
  }
}

#[async_trait]
impl BlockFetcher for MetaverseFetcher {
  async fn get_block_header(&self, height: Option<u64>) -> Result<BlockHeader, AppError> {
    let raw = self.client.get_block_header(height).await?;
    Ok(raw.into_header(&self.symbol))
  }

  async fn get_block(&self, height: u64) -> Result<Block, AppError> {
    let raw = self.client.get_block_by_height(height).await?;
    Ok(Block::from(raw))
  }

  async fn get_transaction(&self, txid: &str) -> Result<Transaction, AppError> {
    let raw = self.client.get_transaction(txid).await?;
    Ok(Transaction::from(raw))
  }

  async fn get_address_balance(&self, address: &str) -> Result<EtpBalance, AppError> {
    self.client.get_address_etp(address).await
  }

  async fn get_address_asset(&self, address: &str, symbol: &str) -> Result<AddressAsset, AppError> {
    match self.client.get_address_asset(address, symbol).await {
      Ok(assets) => Ok(
        assets
          .into_iter()
          .next()
          .unwrap_or_else(|| AddressAsset::zero(address, symbol)),
      ),
      Err(e) => {
        debug!("[{}] getaddressasset {} {} failed: {}", self.symbol, address, symbol, e);
        Ok(AddressAsset::zero(address, symbol))
      }
    }
  }

  async fn create_raw_transaction(&self, request: &RawTxRequest) -> Result<String, AppError> {
    self.client.create_raw_tx(request).await
  }

  async fn decode_raw_transaction(&self, raw_hex: &str) -> Result<Transaction, AppError> {
    let raw = self.client.decode_raw_tx(raw_hex).await?;
    Ok(Transaction::from(raw))
  }

  async fn submit_raw_transaction(&self, raw_hex: &str) -> Result<String, AppError> {
    self.client.send_raw_tx(raw_hex).await
  }

  async fn get_info(&self) -> Result<Value, AppError> {
    self.client.get_info().await
  }

  fn chain_name(&self) -> &str {
    &self.symbol
  }
}

/**
* filename : manager
* author : HAMA
* date: 2025. 4. 6.
* description: Wires the node client, decoders and block scanner for one chain.
**/

use log::info;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::analyzer::types::BalanceModelType;
use crate::coin::metaverse::MetaverseClient;
use crate::config::ChainConfig;
use crate::decoder::{AddressDecoder, ContractDecoder, TransactionDecoder};
use crate::fetcher::fetcher::BlockFetcher;
use crate::fetcher::metaverse_fetcher::MetaverseFetcher;
use crate::respository::Repository;
use crate::scanner::{BlockScanner, ScannerOptions};
use crate::types::AppError;

pub const FULL_NAME: &str = "metaverse";
pub const CURVE_TYPE: &str = "secp256k1";
pub const DECIMALS: u32 = 8;

pub struct WalletManager {
  pub config: ChainConfig,
  pub fetcher: Arc<dyn BlockFetcher>,
  pub decoder: AddressDecoder,
  pub tx_decoder: TransactionDecoder,
  pub contract_decoder: ContractDecoder,
  pub blockscanner: Arc<BlockScanner>,
}

impl WalletManager {
  pub fn new(config: ChainConfig, repository: Arc<dyn Repository>) -> Result<Self, AppError> {
    let timeout = config.rpc_timeout_secs.map(Duration::from_secs);
    let client = MetaverseClient::with_timeout(config.server_api.clone(), timeout)?;
    let fetcher: Arc<dyn BlockFetcher> = Arc::new(MetaverseFetcher::new(client, config.symbol.clone()));
    Ok(Self::with_fetcher(config, fetcher, repository))
  }

  /// Builds the manager over any node backend.
  pub fn with_fetcher(config: ChainConfig, fetcher: Arc<dyn BlockFetcher>, repository: Arc<dyn Repository>) -> Self {
    let blockscanner = Arc::new(BlockScanner::new(
      config.symbol.clone(),
      DECIMALS,
      fetcher.clone(),
      repository,
      ScannerOptions::from(&config),
    ));
    let tx_decoder = TransactionDecoder::new(
      fetcher.clone(),
      blockscanner.extractor(),
      config.min_fees(DECIMALS),
    );

    info!(
      "[Manager] {} wallet ready (testnet: {}, node: {})",
      config.symbol, config.is_test_net, config.server_api
    );

    Self {
      decoder: AddressDecoder::new(config.is_test_net),
      contract_decoder: ContractDecoder::new(fetcher.clone()),
      tx_decoder,
      fetcher,
      blockscanner,
      config,
    }
  }

  pub fn symbol(&self) -> &str {
    &self.config.symbol
  }

  pub fn full_name(&self) -> &str {
    FULL_NAME
  }

  pub fn decimal(&self) -> u32 {
    DECIMALS
  }

  pub fn curve_type(&self) -> &str {
    CURVE_TYPE
  }

  pub fn balance_model_type(&self) -> BalanceModelType {
    BalanceModelType::Address
  }

  /// Raw `getinfo` from the node.
  pub async fn get_info(&self) -> Result<Value, AppError> {
    self.fetcher.get_info().await
  }
}

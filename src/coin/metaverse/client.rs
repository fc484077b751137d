/**
* author : HAMA
* date: 2025. 4. 5.
* description: mvsd JSON-RPC v3 client
**/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::coin::coin_trait::BlockchainClient;
use crate::coin::metaverse::model::{AddressAsset, EtpBalance, RawBlock, RawTransaction};
use crate::types::AppError;

/// Parameters of `createrawtx`. `fee` is already in satoshi.
#[derive(Debug, Clone, Default)]
pub struct RawTxRequest {
  pub senders: Vec<String>,
  /// (address, amount)
  pub receivers: Vec<(String, String)>,
  pub change: Option<String>,
  pub fee: String,
  /// `Some` for an asset transfer (type 3), `None` for ETP (type 0).
  pub symbol: Option<String>,
}

impl RawTxRequest {
  pub fn to_params(&self) -> Value {
    let receivers: Vec<String> = self
      .receivers
      .iter()
      .map(|(addr, amount)| format!("{}:{}", addr, amount))
      .collect();

    let mut request = json!({
      "senders": self.senders,
      "receivers": receivers,
      "fee": self.fee,
    });

    if let Some(change) = self.change.as_ref().filter(|c| !c.is_empty()) {
      request["mychange"] = json!(change);
    }

    match &self.symbol {
      Some(symbol) => {
        request["symbol"] = json!(symbol);
        request["type"] = json!(3);
      }
      None => {
        request["type"] = json!(0);
      }
    }

    json!([request])
  }
}

#[derive(Clone)]
pub struct MetaverseClient {
  client: Client,
  api_url: String,
}

impl MetaverseClient {
  pub fn new(api_url: String) -> Self {
    Self {
      client: Client::new(),
      api_url,
    }
  }

  pub fn with_timeout(api_url: String, timeout: Option<Duration>) -> Result<Self, AppError> {
    let mut builder = Client::builder();
    if let Some(timeout) = timeout {
      builder = builder.timeout(timeout);
    }
    Ok(Self {
      client: builder.build()?,
      api_url,
    })
  }

  pub async fn get_info(&self) -> Result<Value, AppError> {
    self.call("getinfo", json!([])).await
  }

  /// Latest header when `height` is `None`.
  pub async fn get_block_header(&self, height: Option<u64>) -> Result<RawBlock, AppError> {
    let params = match height {
      Some(h) => json!([{ "height": h }]),
      None => json!([]),
    };
    self.call("getblockheader", params).await
  }

  pub async fn get_block_by_height(&self, height: u64) -> Result<RawBlock, AppError> {
    self.call("getblock", json!([height])).await
  }

  pub async fn get_transaction(&self, txid: &str) -> Result<RawTransaction, AppError> {
    self.call("gettx", json!([txid])).await
  }

  pub async fn get_address_etp(&self, address: &str) -> Result<EtpBalance, AppError> {
    self.call("getaddressetp", json!([address])).await
  }

  pub async fn get_address_asset(
    &self,
    address: &str,
    symbol: &str,
  ) -> Result<Vec<AddressAsset>, AppError> {
    self
      .call("getaddressasset", json!([address, { "symbol": symbol }]))
      .await
  }

  pub async fn create_raw_tx(&self, request: &RawTxRequest) -> Result<String, AppError> {
    self.call("createrawtx", request.to_params()).await
  }

  pub async fn decode_raw_tx(&self, raw_hex: &str) -> Result<RawTransaction, AppError> {
    self.call("decoderawtx", json!([raw_hex])).await
  }

  /// Returns the broadcast transaction id.
  pub async fn send_raw_tx(&self, raw_hex: &str) -> Result<String, AppError> {
    let result: Value = self.call("sendrawtx", json!([raw_hex])).await?;
    match result {
      Value::String(txid) => Ok(txid),
      Value::Object(ref obj) => obj
        .get("hash")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AppError::Decode(format!("unexpected sendrawtx result: {}", result))),
      other => Err(AppError::Decode(format!("unexpected sendrawtx result: {}", other))),
    }
  }
}

#[async_trait]
impl BlockchainClient for MetaverseClient {
  fn get_http_client(&self) -> &Client {
    &self.client
  }

  fn get_api_url(&self) -> &str {
    &self.api_url
  }
}

/**
* filename : coin_trait
* author : HAMA
* date: 2025. 4. 7.
* description: JSON-RPC 2.0 plumbing shared by node clients
**/

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::types::AppError;

#[derive(Debug, Deserialize)]
pub struct RpcError {
  #[serde(default)]
  pub code: i64,
  #[serde(default)]
  pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
  #[serde(default)]
  pub result: Option<Value>,
  #[serde(default)]
  pub error: Option<RpcError>,
}

impl RpcResponse {
  /// An `error` object wins over any result; a missing or null result is an error too.
  pub fn into_result<T: DeserializeOwned>(self) -> Result<T, AppError> {
    if let Some(err) = self.error {
      return Err(AppError::Rpc { code: err.code, message: err.message });
    }
    match self.result {
      Some(value) if !value.is_null() => Ok(serde_json::from_value(value)?),
      _ => Err(AppError::EmptyResponse),
    }
  }
}

#[async_trait]
pub trait BlockchainClient: Clone + Send + Sync {
  fn get_http_client(&self) -> &Client;
  fn get_api_url(&self) -> &str;

  async fn call<T>(&self, method: &str, params: Value) -> Result<T, AppError>
  where
    T: DeserializeOwned + Send,
  {
    let client = self.get_http_client();
    let url = self.get_api_url();

    let payload = json!({
      "jsonrpc": "2.0",
      "id": "1",
      "method": method,
      "params": params,
    });
    debug!("[RPC] {} {}", method, payload["params"]);

    let response = client
      .post(url)
      .header("Content-Type", "application/json")
      .json(&payload)
      .send()
      .await?
      .json::<RpcResponse>()
      .await?;

    response.into_result()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn error_object_maps_to_rpc_error() {
    let resp: RpcResponse =
      serde_json::from_str(r#"{"id":"1","error":{"code":1000,"message":"bad"}}"#).unwrap();
    match resp.into_result::<Value>() {
      Err(AppError::Rpc { code, message }) => {
        assert_eq!(code, 1000);
        assert_eq!(message, "bad");
      }
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn missing_result_is_empty_response() {
    let resp: RpcResponse = serde_json::from_str(r#"{"id":"1"}"#).unwrap();
    assert!(matches!(resp.into_result::<Value>(), Err(AppError::EmptyResponse)));

    let resp: RpcResponse = serde_json::from_str(r#"{"id":"1","result":null,"error":null}"#).unwrap();
    assert!(matches!(resp.into_result::<Value>(), Err(AppError::EmptyResponse)));
  }
}

/**
* filename : model
* author : HAMA
* date: 2025. 4. 7.
* description: mvsd JSON-RPC payloads and the chain types built from them
**/

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Previous-output hash carried by coinbase inputs.
pub const COINBASE_TXID: &str =
  "0000000000000000000000000000000000000000000000000000000000000000";

pub const ATTACHMENT_ETP: &str = "etp";
pub const ATTACHMENT_ASSET_TRANSFER: &str = "asset-transfer";

// mvsd reports numbers either as JSON numbers or as strings, depending on
// the RPC version. Everything below accepts both and treats null as empty.

fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Option::<Value>::deserialize(deserializer)? {
    Some(Value::String(s)) => s,
    Some(Value::Number(n)) => n.to_string(),
    Some(Value::Bool(b)) => b.to_string(),
    _ => String::new(),
  })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Option::<Value>::deserialize(deserializer)? {
    Some(Value::Number(n)) => n
      .as_u64()
      .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
      .unwrap_or(0),
    Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
    _ => 0,
  })
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(match Option::<Value>::deserialize(deserializer)? {
    Some(Value::Number(n)) => n
      .as_i64()
      .or_else(|| n.as_f64().map(|f| f as i64))
      .unwrap_or(0),
    Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
    _ => 0,
  })
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
  D: Deserializer<'de>,
{
  lenient_u64(deserializer).map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}

// ====== Wire models ======

/// `getblock` / `getblockheader` result. Headers simply have no transactions.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawBlock {
  #[serde(default, deserialize_with = "lenient_u64")]
  pub number: u64,
  #[serde(default, deserialize_with = "lenient_string")]
  pub hash: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub merkle_tree_hash: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub previous_block_hash: String,
  #[serde(default, deserialize_with = "lenient_u64")]
  pub version: u64,
  #[serde(default, deserialize_with = "lenient_u64")]
  pub timestamp: u64,
  #[serde(default)]
  pub transactions: Vec<RawTransaction>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawTransaction {
  #[serde(default, deserialize_with = "lenient_string")]
  pub hash: String,
  #[serde(default, deserialize_with = "lenient_u64")]
  pub version: u64,
  #[serde(default, deserialize_with = "lenient_i64")]
  pub lock_time: i64,
  #[serde(default, deserialize_with = "lenient_u64")]
  pub height: u64,
  #[serde(default)]
  pub inputs: Vec<RawInput>,
  #[serde(default)]
  pub outputs: Vec<RawOutput>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawInput {
  #[serde(default, deserialize_with = "lenient_string")]
  pub address: String,
  #[serde(default)]
  pub previous_output: RawPreviousOutput,
  #[serde(default, deserialize_with = "lenient_string")]
  pub script: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawPreviousOutput {
  #[serde(default, deserialize_with = "lenient_string")]
  pub hash: String,
  #[serde(default, deserialize_with = "lenient_u64")]
  pub index: u64,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOutput {
  #[serde(default, deserialize_with = "lenient_u64")]
  pub index: u64,
  #[serde(default, deserialize_with = "lenient_string")]
  pub address: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub value: String,
  #[serde(default)]
  pub attachment: RawAttachment,
  #[serde(default, deserialize_with = "lenient_i64")]
  pub locked_height_range: i64,
  #[serde(default, deserialize_with = "lenient_string")]
  pub script: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAttachment {
  #[serde(rename = "type", default, deserialize_with = "lenient_string")]
  pub kind: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub symbol: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub quantity: String,
}

/// `getaddressetp` result, all amounts in satoshi.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct EtpBalance {
  #[serde(default, deserialize_with = "lenient_string")]
  pub address: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub available: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub confirmed: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub frozen: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub received: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub unspent: String,
}

/// One entry of the `getaddressasset` result array.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
pub struct AddressAsset {
  #[serde(default, deserialize_with = "lenient_string")]
  pub address: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub symbol: String,
  #[serde(default, deserialize_with = "lenient_u32")]
  pub decimal_number: u32,
  #[serde(default, deserialize_with = "lenient_string")]
  pub quantity: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub locked_quantity: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub issuer: String,
  #[serde(default, deserialize_with = "lenient_string")]
  pub status: String,
}

impl AddressAsset {
  pub fn zero(address: &str, symbol: &str) -> Self {
    Self {
      address: address.to_string(),
      symbol: symbol.to_string(),
      quantity: "0".to_string(),
      locked_quantity: "0".to_string(),
      ..Default::default()
    }
  }
}

// ====== Chain types ======

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BlockHeader {
  pub hash: String,
  pub merkle_root: String,
  pub previous_block_hash: String,
  pub height: u64,
  pub version: u64,
  pub time: u64,
  /// Set when the header is broadcast because it was rolled back.
  pub fork: bool,
  pub symbol: String,
}

#[derive(Debug, Clone, Default)]
pub struct Block {
  pub hash: String,
  pub merkle_root: String,
  pub previous_block_hash: String,
  pub height: u64,
  pub version: u64,
  pub time: u64,
  pub transactions: Vec<Transaction>,
}

impl Block {
  pub fn header(&self, symbol: &str) -> BlockHeader {
    BlockHeader {
      hash: self.hash.clone(),
      merkle_root: self.merkle_root.clone(),
      previous_block_hash: self.previous_block_hash.clone(),
      height: self.height,
      version: self.version,
      time: self.time,
      fork: false,
      symbol: symbol.to_string(),
    }
  }
}

impl From<RawBlock> for Block {
  fn from(raw: RawBlock) -> Self {
    let transactions = raw
      .transactions
      .into_iter()
      .map(|tx| {
        let mut tx = Transaction::from(tx);
        tx.block_hash = raw.hash.clone();
        tx.block_height = raw.number;
        tx.block_time = raw.timestamp as i64;
        tx
      })
      .collect();

    Block {
      hash: raw.hash,
      merkle_root: raw.merkle_tree_hash,
      previous_block_hash: raw.previous_block_hash,
      height: raw.number,
      version: raw.version,
      time: raw.timestamp,
      transactions,
    }
  }
}

impl RawBlock {
  pub fn into_header(self, symbol: &str) -> BlockHeader {
    BlockHeader {
      hash: self.hash,
      merkle_root: self.merkle_tree_hash,
      previous_block_hash: self.previous_block_hash,
      height: self.number,
      version: self.version,
      time: self.timestamp,
      fork: false,
      symbol: symbol.to_string(),
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AssetAttachment {
  pub symbol: String,
  pub quantity: String,
}

#[derive(Debug, Clone, Default)]
pub struct Transaction {
  pub txid: String,
  pub version: u64,
  pub lock_time: i64,
  pub block_hash: String,
  pub block_height: u64,
  pub block_time: i64,
  pub is_coinbase: bool,
  pub vins: Vec<Vin>,
  pub vouts: Vec<Vout>,
}

impl From<RawTransaction> for Transaction {
  fn from(raw: RawTransaction) -> Self {
    let vins: Vec<Vin> = raw
      .inputs
      .into_iter()
      .enumerate()
      .map(|(n, input)| Vin::from_raw(n as u64, input))
      .collect();
    let vouts = raw.outputs.into_iter().map(Vout::from).collect();

    Transaction {
      txid: raw.hash,
      version: raw.version,
      lock_time: raw.lock_time,
      block_hash: String::new(),
      block_height: raw.height,
      block_time: 0,
      is_coinbase: vins.iter().any(|v| v.is_coinbase),
      vins,
      vouts,
    }
  }
}

#[derive(Debug, Clone, Default)]
pub struct Vin {
  pub is_coinbase: bool,
  /// previous transaction id
  pub txid: String,
  /// previous output index
  pub vout: u64,
  pub n: u64,
  pub addr: String,
  pub value: String,
  pub asset_attachment: Option<AssetAttachment>,
  pub is_token: bool,
  pub lock_script: String,
}

impl Vin {
  fn from_raw(n: u64, raw: RawInput) -> Self {
    Vin {
      is_coinbase: raw.previous_output.hash == COINBASE_TXID,
      txid: raw.previous_output.hash,
      vout: raw.previous_output.index,
      n,
      addr: raw.address,
      value: String::new(),
      asset_attachment: None,
      is_token: false,
      lock_script: raw.script,
    }
  }

  pub fn needs_resolution(&self) -> bool {
    !self.is_coinbase && (self.addr.is_empty() || self.value.is_empty())
  }

  /// Copies what the spent output says about this input.
  pub fn fill_from(&mut self, prev: &Vout) {
    self.addr = prev.addr.clone();
    self.value = prev.value.clone();
    self.is_token = prev.is_token;
    self.asset_attachment = prev.asset_attachment.clone();
  }
}

#[derive(Debug, Clone, Default)]
pub struct Vout {
  pub n: u64,
  pub addr: String,
  /// native amount in satoshi
  pub value: String,
  pub output_type: String,
  pub asset_attachment: Option<AssetAttachment>,
  pub is_token: bool,
  pub locked_height_range: i64,
  pub lock_script: String,
}

impl From<RawOutput> for Vout {
  fn from(raw: RawOutput) -> Self {
    let is_token = raw.attachment.kind == ATTACHMENT_ASSET_TRANSFER;
    let asset_attachment = is_token.then(|| AssetAttachment {
      symbol: raw.attachment.symbol.clone(),
      quantity: raw.attachment.quantity.clone(),
    });

    Vout {
      n: raw.index,
      addr: raw.address,
      value: raw.value,
      output_type: raw.attachment.kind,
      asset_attachment,
      is_token,
      locked_height_range: raw.locked_height_range,
      lock_script: raw.script,
    }
  }
}

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use etp_scanner::analyzer::types::{ScanTarget, ScanTargetFunc, TxExtractData};
use etp_scanner::coin::metaverse::model::{
  AddressAsset, AssetAttachment, Block, BlockHeader, EtpBalance, Transaction, Vin, Vout, COINBASE_TXID,
};
use etp_scanner::coin::metaverse::RawTxRequest;
use etp_scanner::fetcher::fetcher::BlockFetcher;
use etp_scanner::notification::BlockScanNotificationObject;
use etp_scanner::types::AppError;

pub const MINER: &str = "MMinerAddressxxxxxxxxxxxxxxxxxxxx";
pub const ALICE: &str = "MAliceAddressxxxxxxxxxxxxxxxxxxxx";
pub const BOB: &str = "MBobAddressxxxxxxxxxxxxxxxxxxxxxx";

pub fn block_hash(height: u64, branch: &str) -> String {
  format!("{}{:04}", branch, height)
}

pub fn coinbase(txid: &str, to: &str, value: &str) -> Transaction {
  Transaction {
    txid: txid.to_string(),
    is_coinbase: true,
    vins: vec![Vin {
      is_coinbase: true,
      txid: COINBASE_TXID.to_string(),
      vout: u32::MAX as u64,
      ..Default::default()
    }],
    vouts: vec![native_out(0, to, value)],
    ..Default::default()
  }
}

pub fn native_out(n: u64, addr: &str, value: &str) -> Vout {
  Vout {
    n,
    addr: addr.to_string(),
    value: value.to_string(),
    output_type: "etp".to_string(),
    ..Default::default()
  }
}

pub fn asset_out(n: u64, addr: &str, symbol: &str, quantity: &str) -> Vout {
  Vout {
    n,
    addr: addr.to_string(),
    value: "0".to_string(),
    output_type: "asset-transfer".to_string(),
    asset_attachment: Some(AssetAttachment {
      symbol: symbol.to_string(),
      quantity: quantity.to_string(),
    }),
    is_token: true,
    ..Default::default()
  }
}

/// An input that still has to be resolved from `prev_txid:vout`.
pub fn spend(n: u64, prev_txid: &str, vout: u64) -> Vin {
  Vin {
    txid: prev_txid.to_string(),
    vout,
    n,
    ..Default::default()
  }
}

pub fn transfer(txid: &str, vins: Vec<Vin>, vouts: Vec<Vout>) -> Transaction {
  Transaction {
    txid: txid.to_string(),
    vins,
    vouts,
    ..Default::default()
  }
}

pub fn make_block(height: u64, hash: &str, prev: &str, mut txs: Vec<Transaction>) -> Block {
  for tx in txs.iter_mut() {
    tx.block_hash = hash.to_string();
    tx.block_height = height;
    tx.block_time = 1_600_000_000 + height as i64;
  }
  Block {
    hash: hash.to_string(),
    merkle_root: format!("merkle-{}", hash),
    previous_block_hash: prev.to_string(),
    height,
    version: 1,
    time: 1_600_000_000 + height,
    transactions: txs,
  }
}

/// Watches the given addresses, each under its own address as source key.
pub fn watching(addresses: &[&str]) -> ScanTargetFunc {
  let set: HashSet<String> = addresses.iter().map(|a| a.to_string()).collect();
  Arc::new(move |target: &ScanTarget| set.get(&target.address).cloned())
}

#[derive(Default)]
struct ChainState {
  blocks: BTreeMap<u64, Block>,
  txs: HashMap<String, Transaction>,
  // remaining failures per height
  block_failures: HashMap<u64, usize>,
  missing_txs: HashSet<String>,
  balances: HashMap<String, EtpBalance>,
  assets: HashMap<(String, String), AddressAsset>,
  created: Vec<RawTxRequest>,
  submitted: Vec<String>,
}

/// In-memory chain with failure injection.
#[derive(Default)]
pub struct MockChain {
  state: Mutex<ChainState>,
  tx_delay: Option<Duration>,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl MockChain {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_tx_delay(delay: Duration) -> Self {
    Self {
      tx_delay: Some(delay),
      ..Default::default()
    }
  }

  /// Blocks `0..=tip` on branch "a", each holding a coinbase to `MINER`.
  pub fn linear(tip: u64) -> Self {
    let chain = Self::new();
    chain.extend("a", 0, tip, "");
    chain
  }

  /// Adds blocks `from..=to` on `branch`, linking the first to `prev`
  /// (or to the stored block below it when `prev` is empty).
  pub fn extend(&self, branch: &str, from: u64, to: u64, prev: &str) {
    let mut prev = if prev.is_empty() && from > 0 {
      self.hash_at(from - 1).unwrap_or_default()
    } else {
      prev.to_string()
    };
    for height in from..=to {
      let hash = block_hash(height, branch);
      let cb = coinbase(&format!("cb-{}", hash), MINER, "300000000");
      self.put_block(make_block(height, &hash, &prev, vec![cb]));
      prev = hash;
    }
  }

  pub fn put_block(&self, block: Block) {
    let mut state = self.state.lock().unwrap();
    for tx in &block.transactions {
      state.txs.insert(tx.txid.clone(), tx.clone());
    }
    state.blocks.insert(block.height, block);
  }

  /// Drops every block at or above `height`.
  pub fn truncate(&self, height: u64) {
    let mut state = self.state.lock().unwrap();
    state.blocks.retain(|h, _| *h < height);
  }

  pub fn put_tx(&self, tx: Transaction) {
    self.state.lock().unwrap().txs.insert(tx.txid.clone(), tx);
  }

  pub fn hash_at(&self, height: u64) -> Option<String> {
    self.state.lock().unwrap().blocks.get(&height).map(|b| b.hash.clone())
  }

  pub fn fail_block(&self, height: u64, times: usize) {
    self.state.lock().unwrap().block_failures.insert(height, times);
  }

  pub fn heal_block(&self, height: u64) {
    self.state.lock().unwrap().block_failures.remove(&height);
  }

  pub fn hide_tx(&self, txid: &str) {
    self.state.lock().unwrap().missing_txs.insert(txid.to_string());
  }

  pub fn reveal_tx(&self, txid: &str) {
    self.state.lock().unwrap().missing_txs.remove(txid);
  }

  pub fn set_balance(&self, address: &str, available: &str) {
    self.state.lock().unwrap().balances.insert(
      address.to_string(),
      EtpBalance {
        address: address.to_string(),
        available: available.to_string(),
        confirmed: available.to_string(),
        ..Default::default()
      },
    );
  }

  pub fn set_asset(&self, address: &str, symbol: &str, quantity: &str) {
    self.state.lock().unwrap().assets.insert(
      (address.to_string(), symbol.to_string()),
      AddressAsset {
        address: address.to_string(),
        symbol: symbol.to_string(),
        quantity: quantity.to_string(),
        locked_quantity: "0".to_string(),
        ..Default::default()
      },
    );
  }

  pub fn created(&self) -> Vec<RawTxRequest> {
    self.state.lock().unwrap().created.clone()
  }

  pub fn submitted(&self) -> Vec<String> {
    self.state.lock().unwrap().submitted.clone()
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl BlockFetcher for MockChain {
  async fn get_block_header(&self, height: Option<u64>) -> Result<BlockHeader, AppError> {
    let state = self.state.lock().unwrap();
    let block = match height {
      Some(h) => state.blocks.get(&h),
      None => state.blocks.values().next_back(),
    };
    block.map(|b| b.header("ETP")).ok_or(AppError::EmptyResponse)
  }

  async fn get_block(&self, height: u64) -> Result<Block, AppError> {
    let mut state = self.state.lock().unwrap();
    if let Some(remaining) = state.block_failures.get_mut(&height) {
      if *remaining > 0 {
        *remaining -= 1;
        return Err(AppError::Client(format!("block {} unavailable", height)));
      }
    }
    state.blocks.get(&height).cloned().ok_or(AppError::EmptyResponse)
  }

  async fn get_transaction(&self, txid: &str) -> Result<Transaction, AppError> {
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    if let Some(delay) = self.tx_delay {
      tokio::time::sleep(delay).await;
    }
    self.in_flight.fetch_sub(1, Ordering::SeqCst);

    let state = self.state.lock().unwrap();
    if state.missing_txs.contains(txid) {
      return Err(AppError::Rpc {
        code: 5101,
        message: format!("transaction {} not found", txid),
      });
    }
    state.txs.get(txid).cloned().ok_or(AppError::EmptyResponse)
  }

  async fn get_address_balance(&self, address: &str) -> Result<EtpBalance, AppError> {
    let state = self.state.lock().unwrap();
    state
      .balances
      .get(address)
      .cloned()
      .ok_or_else(|| AppError::Client(format!("no balance for {}", address)))
  }

  async fn get_address_asset(&self, address: &str, symbol: &str) -> Result<AddressAsset, AppError> {
    let state = self.state.lock().unwrap();
    Ok(state
      .assets
      .get(&(address.to_string(), symbol.to_string()))
      .cloned()
      .unwrap_or_else(|| AddressAsset::zero(address, symbol)))
  }

  async fn create_raw_transaction(&self, request: &RawTxRequest) -> Result<String, AppError> {
    self.state.lock().unwrap().created.push(request.clone());
    Ok("0100raw".to_string())
  }

  async fn decode_raw_transaction(&self, raw_hex: &str) -> Result<Transaction, AppError> {
    let state = self.state.lock().unwrap();
    state
      .txs
      .get(raw_hex)
      .cloned()
      .ok_or_else(|| AppError::Decode(format!("can not decode {}", raw_hex)))
  }

  async fn submit_raw_transaction(&self, raw_hex: &str) -> Result<String, AppError> {
    self.state.lock().unwrap().submitted.push(raw_hex.to_string());
    Ok(format!("txid-of-{}", raw_hex))
  }

  async fn get_info(&self) -> Result<Value, AppError> {
    Ok(json!({ "height": self.state.lock().unwrap().blocks.len() }))
  }

  fn chain_name(&self) -> &str {
    "ETP"
  }
}

/// Remembers everything it is told. Extract-data delivery can be made to fail.
#[derive(Default)]
pub struct RecordingObserver {
  pub headers: Mutex<Vec<BlockHeader>>,
  pub extracted: Mutex<Vec<(String, TxExtractData)>>,
  fail_extract: AtomicBool,
}

impl RecordingObserver {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn set_failing(&self, failing: bool) {
    self.fail_extract.store(failing, Ordering::SeqCst);
  }

  pub fn header_heights(&self) -> Vec<(u64, bool)> {
    self.headers.lock().unwrap().iter().map(|h| (h.height, h.fork)).collect()
  }

  pub fn extracted_txids(&self) -> Vec<String> {
    self
      .extracted
      .lock()
      .unwrap()
      .iter()
      .map(|(_, d)| d.transaction.tx_id.clone())
      .collect()
  }
}

#[async_trait]
impl BlockScanNotificationObject for RecordingObserver {
  async fn block_scan_notify(&self, header: &BlockHeader) -> Result<(), AppError> {
    self.headers.lock().unwrap().push(header.clone());
    Ok(())
  }

  async fn block_extract_data_notify(&self, source_key: &str, data: &TxExtractData) -> Result<(), AppError> {
    if self.fail_extract.load(Ordering::SeqCst) {
      return Err(AppError::Notify("listener unavailable".to_string()));
    }
    self.extracted.lock().unwrap().push((source_key.to_string(), data.clone()));
    Ok(())
  }
}

use log::{debug, warn};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::analyzer::types::{
  Coin, ExtractResult, ScanTarget, ScanTargetFunc, TransactionSummary, TxExtractData, TxInput,
  TxOutput, TxStatus,
};
use crate::analyzer::utils::{
  amount_to_string, gen_contract_id, gen_transaction_wxid, gen_tx_input_sid, gen_tx_output_sid,
  parse_amount, shift,
};
use crate::coin::metaverse::model::{Transaction, Vout};
use crate::fetcher::fetcher::BlockFetcher;
use crate::types::AppError;

// asset symbol -> source key -> entries
type Partition<T> = HashMap<String, HashMap<String, Vec<T>>>;
// asset symbol -> "addr:amount"
type Parties = HashMap<String, Vec<String>>;

fn unix_now() -> i64 {
  SystemTime::now()
    .duration_since(UNIX_EPOCH)
    .map(|d| d.as_secs() as i64)
    .unwrap_or(0)
}

/// Turns a chain transaction into per-asset, per-owner records.
pub struct TransactionExtractor {
  fetcher: Arc<dyn BlockFetcher>,
  symbol: String,
  decimals: u32,
}

impl TransactionExtractor {
  pub fn new(fetcher: Arc<dyn BlockFetcher>, symbol: impl Into<String>, decimals: u32) -> Self {
    Self {
      fetcher,
      symbol: symbol.into(),
      decimals,
    }
  }

  pub fn symbol(&self) -> &str {
    &self.symbol
  }

  pub fn decimals(&self) -> u32 {
    self.decimals
  }

  // node values are integer units
  fn to_coins(&self, raw: &str) -> Decimal {
    let units = parse_amount(raw);
    shift(units, -(self.decimals.min(i32::MAX as u32) as i32)).unwrap_or_else(|e| {
      warn!("[Extractor] can not convert {} units: {}", raw, e);
      Decimal::ZERO
    })
  }

  /// Never fails: problems are reported through `ExtractResult::success`.
  pub async fn extract_transaction(
    &self,
    block_height: u64,
    block_hash: &str,
    trx: Option<Transaction>,
    scan_target: &ScanTargetFunc,
  ) -> ExtractResult {
    let mut trx = match trx {
      Some(trx) => trx,
      None => return ExtractResult::new("", block_height),
    };

    let mut result = ExtractResult::new(&trx.txid, block_height);

    if trx.block_hash.is_empty() {
      trx.block_hash = block_hash.to_string();
    }
    if trx.block_height == 0 {
      trx.block_height = block_height;
    }

    if let Err(e) = self.fill_inputs(&mut trx).await {
      warn!("[Extractor] tx {} at height {}: input lookup failed: {}", trx.txid, block_height, e);
      return result;
    }

    self.extract_into(&trx, &mut result, scan_target);
    result.success = true;
    result
  }

  /// Completes inputs from the outputs they spend. A missing output index
  /// leaves the input as it is.
  pub async fn fill_inputs(&self, trx: &mut Transaction) -> Result<(), AppError> {
    let mut previous: HashMap<String, Vec<Vout>> = HashMap::new();

    for input in trx.vins.iter_mut().filter(|v| v.needs_resolution()) {
      if !previous.contains_key(&input.txid) {
        let prev = self.fetcher.get_transaction(&input.txid).await?;
        previous.insert(input.txid.clone(), prev.vouts);
      }

      match previous.get(&input.txid).and_then(|vouts| vouts.get(input.vout as usize)) {
        Some(out) => input.fill_from(out),
        None => debug!(
          "[Extractor] tx {} input {} spends missing output {}:{}",
          trx.txid, input.n, input.txid, input.vout
        ),
      }
    }
    Ok(())
  }

  fn watched(&self, scan_target: &ScanTargetFunc, address: &str) -> Option<String> {
    scan_target(&ScanTarget::address(address, &self.symbol))
  }

  fn coin_for(&self, token: Option<&str>) -> Coin {
    match token {
      Some(asset) => Coin::token(&self.symbol, asset),
      None => Coin::native(&self.symbol),
    }
  }

  fn extract_inputs(
    &self,
    trx: &Transaction,
    scan_target: &ScanTargetFunc,
    create_at: i64,
  ) -> (Partition<TxInput>, Parties, Decimal) {
    let mut partition: Partition<TxInput> = HashMap::new();
    let mut from: Parties = HashMap::new();
    let mut total = Decimal::ZERO;

    for (i, vin) in trx.vins.iter().enumerate() {
      if vin.is_coinbase {
        continue;
      }

      let amount = self.to_coins(&vin.value);
      let token = vin.asset_attachment.as_ref().filter(|_| vin.is_token);
      let (asset, amount_str) = match token {
        Some(att) => (att.symbol.clone(), att.quantity.clone()),
        None => (self.symbol.clone(), amount_to_string(amount)),
      };

      if let Some(source_key) = self.watched(scan_target, &vin.addr) {
        let coin = self.coin_for(token.map(|a| a.symbol.as_str()));
        let input = TxInput {
          sid: gen_tx_input_sid(&vin.txid, &self.symbol, &coin.contract_id, i as u64),
          source_tx_id: vin.txid.clone(),
          source_index: vin.vout,
          tx_id: trx.txid.clone(),
          address: vin.addr.clone(),
          amount: amount_str.clone(),
          coin,
          index: vin.n,
          create_at,
          block_height: trx.block_height,
          block_hash: trx.block_hash.clone(),
        };
        partition
          .entry(asset.clone())
          .or_default()
          .entry(source_key)
          .or_default()
          .push(input);
      }

      from
        .entry(asset)
        .or_default()
        .push(format!("{}:{}", vin.addr, amount_str));
      total += amount;
    }

    (partition, from, total)
  }

  fn extract_outputs(
    &self,
    trx: &Transaction,
    scan_target: &ScanTargetFunc,
    create_at: i64,
  ) -> (Partition<TxOutput>, Parties, Decimal) {
    let mut partition: Partition<TxOutput> = HashMap::new();
    let mut to: Parties = HashMap::new();
    let mut total = Decimal::ZERO;

    for vout in &trx.vouts {
      let amount = self.to_coins(&vout.value);
      let token = vout.asset_attachment.as_ref().filter(|_| vout.is_token);
      let (asset, amount_str) = match token {
        Some(att) => (att.symbol.clone(), att.quantity.clone()),
        None => (self.symbol.clone(), amount_to_string(amount)),
      };

      if let Some(source_key) = self.watched(scan_target, &vout.addr) {
        let coin = self.coin_for(token.map(|a| a.symbol.as_str()));
        let output = TxOutput {
          sid: gen_tx_output_sid(&trx.txid, &self.symbol, &coin.contract_id, vout.n),
          tx_id: trx.txid.clone(),
          address: vout.addr.clone(),
          amount: amount_str.clone(),
          coin,
          index: vout.n,
          create_at,
          block_height: trx.block_height,
          block_hash: trx.block_hash.clone(),
        };
        partition
          .entry(asset.clone())
          .or_default()
          .entry(source_key)
          .or_default()
          .push(output);
      }

      to.entry(asset)
        .or_default()
        .push(format!("{}:{}", vout.addr, amount_str));
      total += amount;
    }

    (partition, to, total)
  }

  fn summary(&self, trx: &Transaction, asset: &str, from: &Parties, to: &Parties, fees: Decimal) -> TransactionSummary {
    let native = asset == self.symbol;
    let coin = if native { self.coin_for(None) } else { self.coin_for(Some(asset)) };
    let wx_id = gen_transaction_wxid(&trx.txid, &coin.symbol, &coin.contract_id);

    TransactionSummary {
      wx_id,
      tx_id: trx.txid.clone(),
      coin,
      from: from.get(asset).cloned().unwrap_or_default(),
      to: to.get(asset).cloned().unwrap_or_default(),
      fees: if native { amount_to_string(fees) } else { "0".to_string() },
      decimal: if native { self.decimals } else { 0 },
      block_hash: trx.block_hash.clone(),
      block_height: trx.block_height,
      confirm_time: trx.block_time,
      status: TxStatus::Success,
      ..Default::default()
    }
  }

  fn extract_into(&self, trx: &Transaction, result: &mut ExtractResult, scan_target: &ScanTargetFunc) {
    let create_at = unix_now();
    let (inputs, from, total_spent) = self.extract_inputs(trx, scan_target, create_at);
    let (outputs, to, total_received) = self.extract_outputs(trx, scan_target, create_at);
    let fees = total_spent - total_received;

    for (asset, by_source) in inputs {
      for (source_key, tx_inputs) in by_source {
        let data = result
          .extract_data
          .entry(asset.clone())
          .or_default()
          .entry(source_key)
          .or_insert_with(|| TxExtractData {
            transaction: self.summary(trx, &asset, &from, &to, fees),
            ..Default::default()
          });
        data.tx_inputs = tx_inputs;
      }
    }

    for (asset, by_source) in outputs {
      for (source_key, tx_outputs) in by_source {
        let data = result
          .extract_data
          .entry(asset.clone())
          .or_default()
          .entry(source_key)
          .or_insert_with(|| TxExtractData {
            transaction: self.summary(trx, &asset, &from, &to, fees),
            ..Default::default()
          });
        data.tx_outputs = tx_outputs;
      }
    }
  }

  /// Contract id of an asset carried by this chain.
  pub fn contract_id(&self, asset_symbol: &str) -> String {
    gen_contract_id(&self.symbol, asset_symbol)
  }
}

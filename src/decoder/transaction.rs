use log::info;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::analyzer::extractor::TransactionExtractor;
use crate::analyzer::types::{Coin, TransactionSummary, TxStatus};
use crate::analyzer::utils::{amount_to_string, gen_transaction_wxid, parse_amount, parse_units};
use crate::coin::metaverse::model::Transaction;
use crate::coin::metaverse::RawTxRequest;
use crate::fetcher::fetcher::BlockFetcher;
use crate::types::AppError;

/// A transfer to be assembled by the node. Native amounts are in whole
/// coins; asset quantities are passed through unchanged.
#[derive(Debug, Clone, Default)]
pub struct TransferRequest {
  pub senders: Vec<String>,
  pub receivers: Vec<(String, String)>,
  pub change: Option<String>,
  /// `None` for ETP
  pub asset: Option<String>,
}

/// Relays raw transactions through the node. Signing and UTXO selection
/// happen elsewhere.
pub struct TransactionDecoder {
  fetcher: Arc<dyn BlockFetcher>,
  extractor: Arc<TransactionExtractor>,
  min_fees: Decimal,
}

impl TransactionDecoder {
  pub fn new(fetcher: Arc<dyn BlockFetcher>, extractor: Arc<TransactionExtractor>, min_fees: Decimal) -> Self {
    Self {
      fetcher,
      extractor,
      min_fees,
    }
  }

  fn decimals(&self) -> u32 {
    self.extractor.decimals()
  }

  fn to_units(&self, amount: &str) -> Result<String, AppError> {
    parse_units(parse_amount(amount), self.decimals())
  }

  /// Fee in satoshi.
  pub fn fee_units(&self) -> Result<String, AppError> {
    parse_units(self.min_fees, self.decimals())
  }

  pub async fn create_raw_transaction(&self, transfer: &TransferRequest) -> Result<String, AppError> {
    if transfer.senders.is_empty() || transfer.receivers.is_empty() {
      return Err(AppError::Decode("transfer needs at least one sender and one receiver".to_string()));
    }

    let receivers = transfer
      .receivers
      .iter()
      .map(|(addr, amount)| {
        let amount = match transfer.asset {
          Some(_) => amount.clone(),
          None => self.to_units(amount)?,
        };
        Ok((addr.clone(), amount))
      })
      .collect::<Result<Vec<_>, AppError>>()?;

    let request = RawTxRequest {
      senders: transfer.senders.clone(),
      receivers,
      change: transfer.change.clone(),
      fee: self.fee_units()?,
      symbol: transfer.asset.clone(),
    };

    self.fetcher.create_raw_transaction(&request).await
  }

  /// Decodes `raw_hex` and resolves its inputs. Any failed input lookup
  /// fails the whole call.
  pub async fn decode_raw_transaction(&self, raw_hex: &str) -> Result<Transaction, AppError> {
    let mut trx = self.fetcher.decode_raw_transaction(raw_hex).await?;
    self.fill_transaction_inputs(&mut trx).await?;
    Ok(trx)
  }

  pub async fn fill_transaction_inputs(&self, trx: &mut Transaction) -> Result<(), AppError> {
    self.extractor.fill_inputs(trx).await
  }

  pub async fn submit_raw_transaction(
    &self,
    raw_hex: &str,
    asset: Option<&str>,
  ) -> Result<TransactionSummary, AppError> {
    if raw_hex.trim().is_empty() {
      return Err(AppError::Decode("raw transaction is empty".to_string()));
    }

    let tx_id = self.fetcher.submit_raw_transaction(raw_hex).await?;
    info!("[Decoder] submitted transaction {}", tx_id);

    let symbol = self.extractor.symbol();
    let coin = match asset {
      Some(asset) => Coin::token(symbol, asset),
      None => Coin::native(symbol),
    };
    let submit_time = SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .map(|d| d.as_secs() as i64)
      .unwrap_or(0);

    Ok(TransactionSummary {
      wx_id: gen_transaction_wxid(&tx_id, &coin.symbol, &coin.contract_id),
      tx_id,
      decimal: if asset.is_some() { 0 } else { self.decimals() },
      fees: amount_to_string(self.min_fees),
      coin,
      submit_time,
      status: TxStatus::Success,
      ..Default::default()
    })
  }
}

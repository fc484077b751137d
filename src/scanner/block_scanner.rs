use log::{error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, RwLock};

use crate::analyzer::batch::BatchExtractor;
use crate::analyzer::extractor::TransactionExtractor;
use crate::analyzer::types::{no_scan_target, Balance, ScanTargetFunc, TxExtractData};
use crate::analyzer::utils::format_units;
use crate::coin::metaverse::model::BlockHeader;
use crate::config::ChainConfig;
use crate::fetcher::fetcher::BlockFetcher;
use crate::notification::{ObserverRef, Observers};
use crate::respository::{Repository, UnscanReason, UnscanRecord};
use crate::scanner::retry::{RetryPolicy, RetryTracker};
use crate::types::AppError;

/// How far the scan head moves back when the chain no longer links to it.
pub const FORK_ROLLBACK_DEPTH: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ScanState {
  Idle = 0,
  Scanning = 1,
  Paused = 2,
  ResolvingFork = 3,
}

impl From<u8> for ScanState {
  fn from(v: u8) -> Self {
    match v {
      1 => ScanState::Scanning,
      2 => ScanState::Paused,
      3 => ScanState::ResolvingFork,
      _ => ScanState::Idle,
    }
  }
}

/// Run/pause switch shared between the scanner, its runner and shutdown.
#[derive(Debug, Default)]
pub struct ScanControl {
  scanning: AtomicBool,
  state: AtomicU8,
}

impl ScanControl {
  pub fn run(&self) {
    self.scanning.store(true, Ordering::SeqCst);
  }

  pub fn pause(&self) {
    self.scanning.store(false, Ordering::SeqCst);
    self.set_state(ScanState::Paused);
  }

  pub fn is_scanning(&self) -> bool {
    self.scanning.load(Ordering::SeqCst)
  }

  pub fn state(&self) -> ScanState {
    ScanState::from(self.state.load(Ordering::SeqCst))
  }

  fn set_state(&self, state: ScanState) {
    self.state.store(state as u8, Ordering::SeqCst);
  }
}

#[derive(Debug, Clone)]
pub struct ScannerOptions {
  pub max_extracting_size: usize,
  pub rescan_last_block_count: u64,
  pub retry: RetryPolicy,
}

impl Default for ScannerOptions {
  fn default() -> Self {
    Self {
      max_extracting_size: crate::config::DEFAULT_MAX_EXTRACTING_SIZE,
      rescan_last_block_count: 0,
      retry: RetryPolicy::Immediate,
    }
  }
}

impl From<&ChainConfig> for ScannerOptions {
  fn from(config: &ChainConfig) -> Self {
    Self {
      max_extracting_size: config.max_extracting_size,
      rescan_last_block_count: config.rescan_last_block_count,
      retry: config.retry.clone(),
    }
  }
}

pub struct BlockScanner {
  pub(super) symbol: String,
  pub(super) fetcher: Arc<dyn BlockFetcher>,
  pub(super) repository: Arc<dyn Repository>,
  pub(super) observers: Arc<Observers>,
  pub(super) extractor: Arc<TransactionExtractor>,
  pub(super) batch: BatchExtractor,
  pub(super) retry: RetryTracker,
  control: Arc<ScanControl>,
  scan_target: RwLock<ScanTargetFunc>,
  rescan_last_block_count: u64,
  // one scan pass at a time
  task_lock: tokio::sync::Mutex<()>,
}

impl BlockScanner {
  pub fn new(
    symbol: impl Into<String>,
    decimals: u32,
    fetcher: Arc<dyn BlockFetcher>,
    repository: Arc<dyn Repository>,
    options: ScannerOptions,
  ) -> Self {
    let symbol = symbol.into();
    let observers = Arc::new(Observers::new());
    let extractor = Arc::new(TransactionExtractor::new(fetcher.clone(), symbol.clone(), decimals));
    let batch = BatchExtractor::new(
      extractor.clone(),
      repository.clone(),
      observers.clone(),
      options.max_extracting_size,
    );

    Self {
      symbol,
      fetcher,
      repository,
      observers,
      extractor,
      batch,
      retry: RetryTracker::new(options.retry),
      control: Arc::new(ScanControl::default()),
      scan_target: RwLock::new(no_scan_target()),
      rescan_last_block_count: options.rescan_last_block_count,
      task_lock: tokio::sync::Mutex::new(()),
    }
  }

  // ====== host surface ======

  pub fn symbol(&self) -> &str {
    &self.symbol
  }

  pub fn set_block_scan_target_func(&self, scan_target: ScanTargetFunc) {
    let mut current = self.scan_target.write().unwrap_or_else(|e| e.into_inner());
    *current = scan_target;
  }

  pub fn scan_target(&self) -> ScanTargetFunc {
    self.scan_target.read().unwrap_or_else(|e| e.into_inner()).clone()
  }

  pub async fn add_observer(&self, obj: ObserverRef) {
    self.observers.add_observer(obj).await;
  }

  pub async fn remove_observer(&self, obj: &ObserverRef) {
    self.observers.remove_observer(obj).await;
  }

  pub fn observers(&self) -> Arc<Observers> {
    self.observers.clone()
  }

  pub fn extractor(&self) -> Arc<TransactionExtractor> {
    self.extractor.clone()
  }

  pub fn control(&self) -> Arc<ScanControl> {
    self.control.clone()
  }

  pub fn run(&self) {
    self.control.run();
  }

  pub fn pause(&self) {
    self.control.pause();
  }

  pub fn is_scanning(&self) -> bool {
    self.control.is_scanning()
  }

  pub fn state(&self) -> ScanState {
    self.control.state()
  }

  pub fn support_blockchain_dai(&self) -> bool {
    true
  }

  /// The next pass starts at `height`.
  pub async fn set_rescan_block_height(&self, height: u64) -> Result<(), AppError> {
    if height == 0 {
      return Err(AppError::Block("block height to rescan must be greater than 0".to_string()));
    }
    let previous = height - 1;
    let header = self.fetcher.get_block_header(Some(previous)).await?;
    self.repository.save_local_block_head(previous, &header.hash).await
  }

  pub async fn get_current_block_header(&self) -> Result<BlockHeader, AppError> {
    self.fetcher.get_block_header(None).await
  }

  pub async fn get_global_max_block_height(&self) -> u64 {
    match self.fetcher.get_block_header(None).await {
      Ok(header) => header.height,
      Err(e) => {
        info!("[Scanner] get global max block height error: {}", e);
        0
      }
    }
  }

  pub async fn get_scanned_block_height(&self) -> u64 {
    self
      .repository
      .get_local_block_head()
      .await
      .map(|(height, _)| height)
      .unwrap_or(0)
  }

  /// Extracts one transaction against `scan_target`, grouped by source key.
  pub async fn extract_transaction_data(
    &self,
    txid: &str,
    scan_target: &ScanTargetFunc,
  ) -> Result<HashMap<String, Vec<TxExtractData>>, AppError> {
    let trx = self.fetcher.get_transaction(txid).await?;
    let header = self.fetcher.get_block_header(Some(trx.block_height)).await?;

    let result = self
      .extractor
      .extract_transaction(header.height, &header.hash, Some(trx), scan_target)
      .await;
    if !result.success {
      return Err(AppError::Extract(format!("extract transaction {} failed", txid)));
    }

    let mut by_source: HashMap<String, Vec<TxExtractData>> = HashMap::new();
    for (_, extract_data) in result.extract_data {
      for (source_key, data) in extract_data {
        by_source.entry(source_key).or_default().push(data);
      }
    }
    Ok(by_source)
  }

  /// Lookup failures give a zero balance for that address.
  pub async fn get_balance_by_address(&self, addresses: &[String]) -> Vec<Balance> {
    let mut balances = Vec::with_capacity(addresses.len());
    for address in addresses {
      let mut balance = Balance::zero(&self.symbol, address);
      match self.fetcher.get_address_balance(address).await {
        Ok(etp) => match format_units(&etp.available, self.extractor.decimals()) {
          Ok(available) => {
            balance.balance = available.clone();
            balance.confirm_balance = available;
          }
          Err(e) => warn!("[Scanner] balance of {} unreadable: {}", address, e),
        },
        Err(e) => warn!("[Scanner] balance of {} unavailable: {}", address, e),
      }
      balances.push(balance);
    }
    balances
  }

  // ====== scanning ======

  /// Scans from the saved head to the chain tip, then re-scans the tail
  /// and retries failed heights.
  pub async fn scan_block_task(&self) {
    let _guard = self.task_lock.lock().await;

    let (local_height, local_hash) = match self.repository.get_local_block_head().await {
      Ok(head) => head,
      Err(e) => {
        info!("[Scanner] can not get local block head: {}", e);
        return;
      }
    };

    let mut current_height = local_height;
    let mut current_hash = local_hash;

    loop {
      if !self.control.is_scanning() {
        self.control.set_state(ScanState::Paused);
        return;
      }
      self.control.set_state(ScanState::Scanning);

      let max_height = match self.fetcher.get_block_header(None).await {
        Ok(header) => header.height,
        Err(e) => {
          info!("[Scanner] can not get rpc-server block height: {}", e);
          break;
        }
      };

      if current_height >= max_height {
        info!("[Scanner] scanned full chain data, current height: {}", max_height);
        break;
      }

      current_height += 1;
      info!("[Scanner] scanning height: {} ...", current_height);

      let block = match self.fetcher.get_block(current_height).await {
        Ok(block) => block,
        Err(e) => {
          info!("[Scanner] can not get block {}: {}", current_height, e);
          self
            .save_unscan_record(current_height, UnscanReason::FetchFailed, &e.to_string())
            .await;
          continue;
        }
      };

      if current_hash != block.previous_block_hash {
        self.control.set_state(ScanState::ResolvingFork);
        let fork_height = current_height - 1;

        info!("[Scanner] block has been fork on height: {}", current_height);
        info!("[Scanner] block height: {} local hash = {}", fork_height, current_hash);
        info!("[Scanner] block height: {} mainnet hash = {}", fork_height, block.previous_block_hash);

        let fork_block = match self.repository.get_local_block(fork_height).await {
          Ok(found) => found,
          Err(e) => {
            warn!("[Scanner] can not load local block {}: {}", fork_height, e);
            None
          }
        };

        if let Err(e) = self.repository.delete_unscan_record(fork_height).await {
          warn!("[Scanner] can not delete unscan records at height {}: {}", fork_height, e);
        }

        current_height = current_height.saturating_sub(FORK_ROLLBACK_DEPTH).max(1);

        let local_block = match self.local_or_remote_header(current_height).await {
          Some(header) => header,
          None => break,
        };

        current_hash = local_block.hash.clone();
        info!("[Scanner] rescan block on height: {}, hash: {}", current_height, current_hash);

        if let Err(e) = self
          .repository
          .save_local_block_head(local_block.height, &local_block.hash)
          .await
        {
          error!("[Scanner] can not save block head {}: {}", local_block.height, e);
        }

        if let Some(mut fork_header) = fork_block {
          fork_header.fork = true;
          self.observers.notify_new_block(&fork_header).await;
        }
      } else {
        let header = block.header(&self.symbol);

        if let Err(e) = self
          .batch
          .batch_extract_transaction(block.height, &block.hash, block.transactions, self.scan_target())
          .await
        {
          info!("[Scanner] height {} extraction incomplete: {}", current_height, e);
        }

        current_hash = header.hash.clone();

        if let Err(e) = self.repository.save_local_block_head(current_height, &current_hash).await {
          error!("[Scanner] can not save block head {}: {}", current_height, e);
        }
        if let Err(e) = self.repository.save_local_block(&header).await {
          error!("[Scanner] can not save local block {}: {}", current_height, e);
        }

        self.observers.notify_new_block(&header).await;
      }
    }

    let first = current_height.saturating_sub(self.rescan_last_block_count);
    for height in first..current_height {
      let _ = self.scan_block_inner(height).await;
    }

    self.rescan_failed_record().await;

    if self.control.is_scanning() {
      self.control.set_state(ScanState::Idle);
    }
  }

  /// Extracts one height outside the scan loop and announces its header.
  pub async fn scan_block(&self, height: u64) -> Result<(), AppError> {
    let header = self.scan_block_inner(height).await?;
    self.observers.notify_new_block(&header).await;
    Ok(())
  }

  async fn scan_block_inner(&self, height: u64) -> Result<BlockHeader, AppError> {
    let block = match self.fetcher.get_block(height).await {
      Ok(block) => block,
      Err(e) => {
        info!("[Scanner] can not get block {}: {}", height, e);
        self
          .save_unscan_record(height, UnscanReason::FetchFailed, &e.to_string())
          .await;
        return Err(e);
      }
    };

    info!("[Scanner] scanning height: {} ...", block.height);
    let header = block.header(&self.symbol);

    if let Err(e) = self
      .batch
      .batch_extract_transaction(block.height, &block.hash, block.transactions, self.scan_target())
      .await
    {
      info!("[Scanner] height {} extraction incomplete: {}", height, e);
    }

    Ok(header)
  }

  async fn local_or_remote_header(&self, height: u64) -> Option<BlockHeader> {
    match self.repository.get_local_block(height).await {
      Ok(Some(header)) => return Some(header),
      Ok(None) => {}
      Err(e) => error!("[Scanner] can not get local block {}: {}", height, e),
    }

    info!("[Scanner] prev block height: {}", height);
    match self.fetcher.get_block_header(Some(height)).await {
      Ok(header) => Some(header),
      Err(e) => {
        error!("[Scanner] can not get prev block {}: {}", height, e);
        None
      }
    }
  }

  async fn save_unscan_record(&self, height: u64, kind: UnscanReason, reason: &str) {
    let record = UnscanRecord::new(height, "", kind, reason, &self.symbol);
    if let Err(e) = self.repository.save_unscan_record(record).await {
      error!("[Scanner] can not save unscan record for height {}: {}", height, e);
    }
    info!("[Scanner] block height: {} extract failed", height);
  }
}

use log::{debug, error, info, warn};
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::analyzer::extractor::TransactionExtractor;
use crate::analyzer::types::{ExtractResult, ScanTargetFunc};
use crate::coin::metaverse::model::Transaction;
use crate::notification::Observers;
use crate::respository::{Repository, UnscanReason, UnscanRecord};
use crate::types::{AppError, ExtractResultReceiver, ExtractResultSender};

/// Extracts a block's transactions on a bounded worker pool and forwards the
/// results to the observers from a single consumer.
pub struct BatchExtractor {
  extractor: Arc<TransactionExtractor>,
  repository: Arc<dyn Repository>,
  observers: Arc<Observers>,
  // shared by every batch of this scanner
  workers: Arc<Semaphore>,
}

impl BatchExtractor {
  pub fn new(
    extractor: Arc<TransactionExtractor>,
    repository: Arc<dyn Repository>,
    observers: Arc<Observers>,
    max_extracting_size: usize,
  ) -> Self {
    Self {
      extractor,
      repository,
      observers,
      workers: Arc::new(Semaphore::new(max_extracting_size.max(1))),
    }
  }

  pub fn available_workers(&self) -> usize {
    self.workers.available_permits()
  }

  pub async fn batch_extract_transaction(
    &self,
    block_height: u64,
    block_hash: &str,
    txs: Vec<Transaction>,
    scan_target: ScanTargetFunc,
  ) -> Result<(), AppError> {
    if txs.is_empty() {
      return Err(AppError::Block(format!("block {} has no transactions", block_height)));
    }

    let should_done = txs.len();
    let (producer, worker): (ExtractResultSender, ExtractResultReceiver) = mpsc::unbounded_channel();

    let dispatcher = tokio::spawn(dispatch(
      self.extractor.clone(),
      self.workers.clone(),
      producer,
      block_height,
      block_hash.to_string(),
      txs,
      scan_target,
    ));

    let failed = self.consume(worker, block_height, should_done).await;

    if let Err(e) = dispatcher.await {
      error!("[Batch] dispatcher for height {} aborted: {}", block_height, e);
    }

    if failed > 0 {
      return Err(AppError::Extract(format!(
        "{} of {} transactions failed at height {}",
        failed, should_done, block_height
      )));
    }
    Ok(())
  }

  async fn consume(&self, mut worker: ExtractResultReceiver, block_height: u64, should_done: usize) -> usize {
    let mut done = 0usize;
    let mut failed = 0usize;

    while done < should_done {
      let gets = match worker.recv().await {
        Some(gets) => gets,
        None => break,
      };

      if gets.success {
        if let Err(e) = self.observers.notify_extract_data(gets.block_height, &gets.extract_data).await {
          warn!("[Batch] notify tx {} at height {} failed: {}", gets.tx_id, gets.block_height, e);
          self
            .record(gets.block_height, "", UnscanReason::NotifyFailed, &e.to_string())
            .await;
          failed += 1;
        }
      } else {
        warn!("[Batch] extract tx {} at height {} failed", gets.tx_id, gets.block_height);
        self
          .record(gets.block_height, &gets.tx_id, UnscanReason::ExtractFailed, "transaction extraction failed")
          .await;
        failed += 1;
      }
      done += 1;
    }

    if done < should_done {
      let missing = should_done - done;
      error!("[Batch] {} workers at height {} ended without a result", missing, block_height);
      self
        .record(block_height, "", UnscanReason::ExtractFailed, "extraction worker ended without a result")
        .await;
      failed += missing;
    }

    info!("[Batch] height {} done: {} transactions, {} failed", block_height, should_done, failed);
    failed
  }

  async fn record(&self, block_height: u64, tx_id: &str, kind: UnscanReason, reason: &str) {
    let record = UnscanRecord::new(block_height, tx_id, kind, reason, self.extractor.symbol());
    if let Err(e) = self.repository.save_unscan_record(record).await {
      error!("[Batch] could not save unscan record for height {}: {}", block_height, e);
    }
  }
}

// Spawns one worker per transaction, never more than the semaphore allows
// at a time. A worker gives its permit back before sending its result.
async fn dispatch(
  extractor: Arc<TransactionExtractor>,
  workers: Arc<Semaphore>,
  producer: ExtractResultSender,
  block_height: u64,
  block_hash: String,
  txs: Vec<Transaction>,
  scan_target: ScanTargetFunc,
) {
  for tx in txs {
    let permit = match workers.clone().acquire_owned().await {
      Ok(permit) => permit,
      Err(_) => break,
    };

    let extractor = extractor.clone();
    let sender = producer.clone();
    let target = scan_target.clone();
    let hash = block_hash.clone();

    tokio::spawn(async move {
      let result: ExtractResult = extractor.extract_transaction(block_height, &hash, Some(tx), &target).await;
      drop(permit);
      if let Err(e) = sender.send(result) {
        debug!("[Batch] block {} result dropped, consumer gone: {}", block_height, e.0.tx_id);
      }
    });
  }
}

use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::Duration;

use crate::respository::UnscanRecord;
use crate::scanner::block_scanner::BlockScanner;

/// How long the retry pass waits before re-scanning a failed height.
///
/// ```toml
/// [chain.retry]
/// kind = "exponential"
/// base_ms = 500
/// max_ms = 60000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetryPolicy {
  #[default]
  Immediate,
  Fixed { delay_ms: u64 },
  Exponential { base_ms: u64, max_ms: u64 },
}

impl RetryPolicy {
  /// `attempt` counts earlier failed retries of the same height.
  pub fn delay(&self, attempt: u32) -> Duration {
    match *self {
      RetryPolicy::Immediate => Duration::ZERO,
      RetryPolicy::Fixed { delay_ms } => Duration::from_millis(delay_ms),
      RetryPolicy::Exponential { base_ms, max_ms } => {
        let factor = 1u64.checked_shl(attempt.min(63)).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
      }
    }
  }
}

/// Per-height attempt counters, kept for the lifetime of the scanner.
#[derive(Debug, Default)]
pub struct RetryTracker {
  policy: RetryPolicy,
  attempts: Mutex<HashMap<u64, u32>>,
}

impl RetryTracker {
  pub fn new(policy: RetryPolicy) -> Self {
    Self {
      policy,
      attempts: Mutex::new(HashMap::new()),
    }
  }

  pub fn attempts(&self, height: u64) -> u32 {
    let attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
    attempts.get(&height).copied().unwrap_or(0)
  }

  pub fn next_delay(&self, height: u64) -> Duration {
    self.policy.delay(self.attempts(height))
  }

  pub fn failed(&self, height: u64) {
    let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
    *attempts.entry(height).or_insert(0) += 1;
  }

  pub fn succeeded(&self, height: u64) {
    let mut attempts = self.attempts.lock().unwrap_or_else(|e| e.into_inner());
    attempts.remove(&height);
  }
}

/// height -> failed txids, ascending. Height 0 is never retried.
pub fn group_by_height(records: &[UnscanRecord]) -> BTreeMap<u64, Vec<String>> {
  let mut by_height: BTreeMap<u64, Vec<String>> = BTreeMap::new();
  for record in records.iter().filter(|r| r.block_height > 0) {
    let txids = by_height.entry(record.block_height).or_default();
    if !record.tx_id.is_empty() {
      txids.push(record.tx_id.clone());
    }
  }
  by_height
}

impl BlockScanner {
  /// Re-extracts every height that has unscan records. A height's records
  /// are removed only after its whole block extracted cleanly.
  pub async fn rescan_failed_record(&self) {
    let records = match self.repository.get_unscan_records().await {
      Ok(records) => records,
      Err(e) => {
        warn!("[Scanner] can not read unscan records: {}", e);
        Vec::new()
      }
    };

    for height in group_by_height(&records).into_keys() {
      let delay = self.retry.next_delay(height);
      if !delay.is_zero() {
        tokio::time::sleep(delay).await;
      }

      info!("[Scanner] rescanning failed height {} (attempt {})", height, self.retry.attempts(height) + 1);

      let block = match self.fetcher.get_block(height).await {
        Ok(block) => block,
        Err(e) => {
          warn!("[Scanner] rescan height {}: can not get block: {}", height, e);
          self.retry.failed(height);
          continue;
        }
      };

      let hash = block.hash.clone();
      if let Err(e) = self
        .batch
        .batch_extract_transaction(height, &hash, block.transactions, self.scan_target())
        .await
      {
        warn!("[Scanner] rescan height {} still failing: {}", height, e);
        self.retry.failed(height);
        continue;
      }

      if let Err(e) = self.repository.delete_unscan_record(height).await {
        warn!("[Scanner] can not delete unscan records at height {}: {}", height, e);
        continue;
      }
      self.retry.succeeded(height);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::respository::UnscanReason;

  #[test]
  fn exponential_delay_is_capped() {
    let policy = RetryPolicy::Exponential { base_ms: 100, max_ms: 1000 };
    assert_eq!(policy.delay(0), Duration::from_millis(100));
    assert_eq!(policy.delay(3), Duration::from_millis(800));
    assert_eq!(policy.delay(4), Duration::from_millis(1000));
    assert_eq!(policy.delay(200), Duration::from_millis(1000));
    assert_eq!(RetryPolicy::Immediate.delay(5), Duration::ZERO);
  }

  #[test]
  fn policy_is_tagged_by_kind() {
    #[derive(Deserialize)]
    struct Wrap {
      retry: RetryPolicy,
    }
    let w: Wrap = serde_json::from_str(r#"{"retry":{"kind":"fixed","delay_ms":250}}"#).unwrap();
    assert_eq!(w.retry, RetryPolicy::Fixed { delay_ms: 250 });
  }

  #[test]
  fn groups_skip_height_zero_and_sort() {
    let records = vec![
      UnscanRecord::new(9, "b", UnscanReason::ExtractFailed, "", "ETP"),
      UnscanRecord::new(0, "", UnscanReason::FetchFailed, "", "ETP"),
      UnscanRecord::new(4, "", UnscanReason::FetchFailed, "", "ETP"),
      UnscanRecord::new(9, "a", UnscanReason::ExtractFailed, "", "ETP"),
    ];
    let grouped = group_by_height(&records);
    assert_eq!(grouped.keys().copied().collect::<Vec<_>>(), vec![4, 9]);
    assert_eq!(grouped[&9].len(), 2);
    assert!(grouped[&4].is_empty());
  }

  #[test]
  fn tracker_counts_and_resets() {
    let tracker = RetryTracker::new(RetryPolicy::Fixed { delay_ms: 5 });
    tracker.failed(3);
    tracker.failed(3);
    assert_eq!(tracker.attempts(3), 2);
    tracker.succeeded(3);
    assert_eq!(tracker.attempts(3), 0);
  }
}

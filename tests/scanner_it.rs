mod common;

use common::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use etp_scanner::fetcher::fetcher::BlockFetcher;
use etp_scanner::respository::{MemoryRepository, Repository, UnscanReason};
use etp_scanner::scanner::{BlockScanner, ScanState, ScannerOptions};
use etp_scanner::shutdown::stop_scanning;
use etp_scanner::tasks::spawn_scanner;

struct Harness {
  chain: Arc<MockChain>,
  repo: Arc<MemoryRepository>,
  observer: Arc<RecordingObserver>,
  scanner: Arc<BlockScanner>,
}

async fn harness_with(chain: MockChain, options: ScannerOptions) -> Harness {
  let chain = Arc::new(chain);
  let fetcher: Arc<dyn BlockFetcher> = chain.clone();
  let repo = Arc::new(MemoryRepository::new());
  let scanner = Arc::new(BlockScanner::new("ETP", 8, fetcher, repo.clone(), options));
  let observer = RecordingObserver::new();
  scanner.add_observer(observer.clone()).await;
  scanner.set_block_scan_target_func(watching(&[MINER, ALICE]));

  Harness {
    chain,
    repo,
    observer,
    scanner,
  }
}

async fn harness(chain: MockChain) -> Harness {
  harness_with(chain, ScannerOptions::default()).await
}

/// Positions the head just below height 1 and switches scanning on.
async fn start_at_genesis(h: &Harness) {
  h.scanner.set_rescan_block_height(1).await.unwrap();
  h.scanner.run();
}

#[tokio::test]
async fn scans_linear_chain_to_tip() {
  let h = harness(MockChain::linear(5)).await;
  start_at_genesis(&h).await;

  h.scanner.scan_block_task().await;

  assert_eq!(
    h.observer.header_heights(),
    vec![(1, false), (2, false), (3, false), (4, false), (5, false)]
  );
  assert_eq!(h.repo.get_local_block_head().await.unwrap(), (5, block_hash(5, "a")));
  assert_eq!(h.scanner.get_scanned_block_height().await, 5);
  assert_eq!(h.repo.get_local_block(3).await.unwrap().unwrap().hash, block_hash(3, "a"));
  assert_eq!(h.observer.extracted_txids().len(), 5);
  assert_eq!(h.scanner.state(), ScanState::Idle);
  assert!(h.repo.get_unscan_records().await.unwrap().is_empty());
}

#[tokio::test]
async fn paused_scanner_leaves_checkpoint_alone() {
  let h = harness(MockChain::linear(3)).await;
  h.scanner.set_rescan_block_height(1).await.unwrap();

  h.scanner.scan_block_task().await;
  assert!(h.observer.header_heights().is_empty());
  assert_eq!(h.scanner.get_scanned_block_height().await, 0);

  h.scanner.run();
  assert!(h.scanner.is_scanning());
  h.scanner.pause();
  assert!(!h.scanner.is_scanning());
  assert_eq!(h.scanner.state(), ScanState::Paused);
}

#[tokio::test]
async fn fork_rolls_back_and_announces_replaced_blocks() {
  let h = harness(MockChain::linear(5)).await;
  start_at_genesis(&h).await;
  h.scanner.scan_block_task().await;

  // blocks 4 and 5 are replaced and the new branch grows to 6
  h.chain.truncate(4);
  h.chain.extend("b", 4, 6, &block_hash(3, "a"));

  h.observer.headers.lock().unwrap().clear();
  h.scanner.scan_block_task().await;

  assert_eq!(
    h.observer.header_heights(),
    vec![(5, true), (4, true), (4, false), (5, false), (6, false)]
  );
  let headers = h.observer.headers.lock().unwrap().clone();
  assert_eq!(headers[0].hash, block_hash(5, "a"));
  assert_eq!(headers[1].hash, block_hash(4, "a"));
  assert_eq!(headers[2].hash, block_hash(4, "b"));

  assert_eq!(h.repo.get_local_block_head().await.unwrap(), (6, block_hash(6, "b")));
  assert_eq!(h.repo.get_local_block(5).await.unwrap().unwrap().hash, block_hash(5, "b"));
}

#[tokio::test]
async fn unknown_head_rolls_forward_from_height_one() {
  let h = harness(MockChain::linear(3)).await;
  h.scanner.run();

  // empty checkpoint never links to block 1
  h.scanner.scan_block_task().await;

  assert_eq!(h.observer.header_heights(), vec![(2, false), (3, false)]);
  assert_eq!(h.repo.get_local_block_head().await.unwrap(), (3, block_hash(3, "a")));
}

#[tokio::test]
async fn failed_fetch_at_tip_is_recorded_and_retried() {
  let h = harness(MockChain::linear(3)).await;
  h.chain.fail_block(3, usize::MAX);
  start_at_genesis(&h).await;

  h.scanner.scan_block_task().await;

  assert_eq!(h.observer.header_heights(), vec![(1, false), (2, false)]);
  assert_eq!(h.repo.get_local_block_head().await.unwrap(), (2, block_hash(2, "a")));
  let records = h.repo.get_unscan_records().await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].block_height, 3);
  assert_eq!(records[0].kind, UnscanReason::FetchFailed);

  h.chain.heal_block(3);
  h.scanner.rescan_failed_record().await;

  assert!(h.repo.get_unscan_records().await.unwrap().is_empty());
  assert!(h.observer.extracted_txids().contains(&format!("cb-{}", block_hash(3, "a"))));
}

#[tokio::test]
async fn retry_passes_over_unreachable_height_keep_the_same_records() {
  let h = harness(MockChain::linear(3)).await;
  h.chain.fail_block(3, usize::MAX);
  start_at_genesis(&h).await;
  h.scanner.scan_block_task().await;

  let recorded = h.repo.get_unscan_records().await.unwrap();
  assert_eq!(recorded.len(), 1);

  h.scanner.rescan_failed_record().await;
  let after_first = h.repo.get_unscan_records().await.unwrap();
  h.scanner.rescan_failed_record().await;
  let after_second = h.repo.get_unscan_records().await.unwrap();

  assert_eq!(after_first, recorded);
  assert_eq!(after_second, after_first);
  assert!(!h.observer.extracted_txids().contains(&format!("cb-{}", block_hash(3, "a"))));
}

#[tokio::test]
async fn skipped_height_is_picked_up_after_rollback() {
  let h = harness(MockChain::linear(5)).await;
  h.chain.fail_block(3, 1);
  start_at_genesis(&h).await;

  h.scanner.scan_block_task().await;

  assert_eq!(
    h.observer.header_heights(),
    vec![(1, false), (2, false), (3, false), (4, false), (5, false)]
  );
  assert!(h.repo.get_unscan_records().await.unwrap().is_empty());
  assert_eq!(h.scanner.get_scanned_block_height().await, 5);
}

#[tokio::test]
async fn retry_pass_clears_records_once_delivery_works() {
  let h = harness(MockChain::linear(3)).await;
  h.observer.set_failing(true);
  start_at_genesis(&h).await;

  h.scanner.scan_block_task().await;

  // the checkpoint still advances; the failures are kept for retry
  assert_eq!(h.scanner.get_scanned_block_height().await, 3);
  let mut heights: Vec<u64> = h
    .repo
    .get_unscan_records()
    .await
    .unwrap()
    .iter()
    .map(|r| r.block_height)
    .collect();
  heights.sort();
  assert_eq!(heights, vec![1, 2, 3]);

  h.scanner.rescan_failed_record().await;
  assert_eq!(h.repo.get_unscan_records().await.unwrap().len(), 3);

  h.observer.set_failing(false);
  h.scanner.rescan_failed_record().await;
  assert!(h.repo.get_unscan_records().await.unwrap().is_empty());
  assert_eq!(h.observer.extracted_txids().len(), 3);

  h.scanner.rescan_failed_record().await;
  assert_eq!(h.observer.extracted_txids().len(), 3);
}

#[tokio::test]
async fn tail_is_extracted_again_after_catching_up() {
  let options = ScannerOptions {
    rescan_last_block_count: 2,
    ..Default::default()
  };
  let h = harness_with(MockChain::linear(4), options).await;
  start_at_genesis(&h).await;

  h.scanner.scan_block_task().await;

  let txids = h.observer.extracted_txids();
  assert_eq!(txids.len(), 6);
  assert_eq!(txids.iter().filter(|t| **t == format!("cb-{}", block_hash(3, "a"))).count(), 2);
  assert_eq!(h.observer.header_heights().len(), 4);
}

#[tokio::test]
async fn rescan_height_moves_the_checkpoint() {
  let h = harness(MockChain::linear(6)).await;

  assert!(h.scanner.set_rescan_block_height(0).await.is_err());

  h.scanner.set_rescan_block_height(4).await.unwrap();
  assert_eq!(h.repo.get_local_block_head().await.unwrap(), (3, block_hash(3, "a")));

  h.scanner.run();
  h.scanner.scan_block_task().await;
  assert_eq!(h.observer.header_heights(), vec![(4, false), (5, false), (6, false)]);
}

#[tokio::test]
async fn single_height_scan() {
  let h = harness(MockChain::linear(3)).await;

  h.scanner.scan_block(2).await.unwrap();
  assert_eq!(h.observer.header_heights(), vec![(2, false)]);
  assert_eq!(h.observer.extracted_txids(), vec![format!("cb-{}", block_hash(2, "a"))]);

  assert!(h.scanner.scan_block(9).await.is_err());
  let records = h.repo.get_unscan_records().await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].block_height, 9);
}

#[tokio::test]
async fn chain_heights_and_headers() {
  let h = harness(MockChain::linear(7)).await;
  assert_eq!(h.scanner.get_global_max_block_height().await, 7);
  assert_eq!(h.scanner.get_current_block_header().await.unwrap().hash, block_hash(7, "a"));

  let empty = harness(MockChain::new()).await;
  assert_eq!(empty.scanner.get_global_max_block_height().await, 0);
  assert!(empty.scanner.get_current_block_header().await.is_err());
}

#[tokio::test]
async fn extracts_single_transaction_by_id() {
  let h = harness(MockChain::linear(1)).await;
  h.chain.put_tx(transfer("p1", vec![], vec![native_out(0, BOB, "200000000")]));
  let tx = transfer(
    "t1",
    vec![spend(0, "p1", 0)],
    vec![native_out(0, ALICE, "150000000"), native_out(1, BOB, "49990000")],
  );
  h.chain.put_block(make_block(2, &block_hash(2, "a"), &block_hash(1, "a"), vec![tx]));

  let by_source = h
    .scanner
    .extract_transaction_data("t1", &watching(&[ALICE, BOB]))
    .await
    .unwrap();

  assert_eq!(by_source.len(), 2);
  let alice = &by_source[ALICE][0];
  assert_eq!(alice.tx_outputs[0].amount, "1.5");
  assert_eq!(alice.transaction.block_hash, block_hash(2, "a"));
  assert_eq!(by_source[BOB][0].tx_inputs[0].amount, "2");

  assert!(h.scanner.extract_transaction_data("nope", &watching(&[ALICE])).await.is_err());
}

#[tokio::test]
async fn balances_fall_back_to_zero() {
  let h = harness(MockChain::new()).await;
  h.chain.set_balance(ALICE, "150000000");

  let balances = h
    .scanner
    .get_balance_by_address(&[ALICE.to_string(), BOB.to_string()])
    .await;

  assert_eq!(balances.len(), 2);
  assert_eq!(balances[0].balance, "1.5");
  assert_eq!(balances[0].confirm_balance, "1.5");
  assert_eq!(balances[1].address, BOB);
  assert_eq!(balances[1].balance, "0");
}

#[tokio::test]
async fn runner_scans_until_stopped() {
  let h = harness(MockChain::linear(3)).await;
  start_at_genesis(&h).await;

  let (stop_tx, stop_rx) = watch::channel(false);
  let handle = spawn_scanner(h.scanner.clone(), 1, stop_rx);

  let mut waited = 0;
  while h.scanner.get_scanned_block_height().await < 3 && waited < 200 {
    tokio::time::sleep(Duration::from_millis(10)).await;
    waited += 1;
  }
  assert_eq!(h.scanner.get_scanned_block_height().await, 3);

  stop_scanning(&h.scanner.control(), &stop_tx);
  tokio::time::timeout(Duration::from_secs(2), handle)
    .await
    .expect("runner did not stop")
    .unwrap();
  assert!(!h.scanner.is_scanning());
}

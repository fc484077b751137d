/**
* filename : runner
* author : HAMA
* date: 2025. 4. 6.
* description: Periodic driver for the block scanner.
**/

use crate::scanner::BlockScanner;

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Runs one scan pass per tick while the scanner is switched on. Returns when
/// `stop` flips to true or its sender is dropped.
pub async fn run_scanner(
  scanner: Arc<BlockScanner>,
  interval_duration: Duration,
  mut stop: watch::Receiver<bool>,
) {
  let mut tick = interval(interval_duration);
  tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
  info!(
    "[{} Runner] Starting with interval {:?}",
    scanner.symbol(),
    interval_duration
  );

  loop {
    tokio::select! {
      _ = tick.tick() => {
        if !scanner.is_scanning() {
          debug!("[{} Runner] paused, skipping tick", scanner.symbol());
          continue;
        }
        scanner.scan_block_task().await;
      }
      changed = stop.changed() => {
        if changed.is_err() || *stop.borrow() {
          break;
        }
      }
    }
  }

  warn!("[{} Runner] Loop exited.", scanner.symbol());
}

/**
* filename : tasks
* author : HAMA
* date: 2025. 4. 6.
* description: 
**/
use std::{sync::Arc, time::Duration};
use tokio::{sync::watch, task::JoinHandle};

use crate::fetcher::runner::run_scanner;
use crate::scanner::BlockScanner;

pub fn spawn_scanner(
  scanner: Arc<BlockScanner>,
  interval_secs: u64,
  stop: watch::Receiver<bool>,
) -> JoinHandle<()> {
  tokio::spawn(run_scanner(
    scanner,
    Duration::from_secs(interval_secs.max(1)),
    stop,
  ))
}

// src/main.rs
/**
* author : HAMA
* date: 2025. 4. 6.
* description: Entry point for the ETP block scanning service.
**/

use etp_scanner::analyzer::watchlist::WatchList;
use etp_scanner::config::Settings;
use etp_scanner::manager::WalletManager;
use etp_scanner::notification::LogObserver;
use etp_scanner::respository::RepositoryWrapper;
use etp_scanner::shutdown::{shutdown_signal, stop_scanning};
use etp_scanner::tasks::spawn_scanner;
use etp_scanner::types::AppError;

use log::{info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // 1. Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("Application starting...");

    // 2. Load configuration
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "./config.toml".to_string());
    let settings = Settings::from_path(&config_path)?;
    info!("Configuration loaded from {}.", config_path);

    // 3. Open the checkpoint store
    let repository = Arc::new(RepositoryWrapper::from_settings(&settings)?);

    // 4. Build the wallet manager
    let manager = WalletManager::new(settings.chain.clone(), repository)?;
    let scanner = manager.blockscanner.clone();

    // 5. Register observers
    scanner.add_observer(Arc::new(LogObserver::new(manager.symbol()))).await;

    #[cfg(feature = "sqs")]
    if let Some(queue_url) = settings.notification.sqs_queue_url.clone() {
        let sqs = etp_scanner::notification::SqsObserver::new(
            queue_url,
            settings.notification.aws_region.clone(),
        )
        .await;
        scanner.add_observer(Arc::new(sqs)).await;
        info!("SQS observer registered.");
    }

    // 6. Load watched addresses
    match &settings.repository.watch_address_file {
        Some(path) => {
            let list = WatchList::from_file(Path::new(path))?;
            scanner.set_block_scan_target_func(list.into_scan_target_func());
        }
        None => warn!("No watch_address_file configured; no transaction will match."),
    }

    // 7. Start scanning
    let (stop_tx, stop_rx) = watch::channel(false);
    scanner.run();
    let scanner_handle = spawn_scanner(scanner.clone(), settings.chain.interval_secs, stop_rx);

    // 8. Wait for shutdown signal
    shutdown_signal().await;
    info!("Shutdown signal received. Waiting for tasks to finish...");
    stop_scanning(&scanner.control(), &stop_tx);

    // 9. Gracefully wait
    let _ = scanner_handle.await;

    info!("Application exited cleanly.");
    Ok(())
}

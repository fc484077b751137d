use log::{debug, warn};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::analyzer::types::ExtractData;
use crate::coin::metaverse::model::BlockHeader;
use crate::notification::observer::BlockScanNotificationObject;
use crate::types::AppError;

pub type ObserverRef = Arc<dyn BlockScanNotificationObject>;

fn same_observer(a: &ObserverRef, b: &ObserverRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Registered observers. Broadcasts iterate over a snapshot so callbacks
/// never run under the lock.
#[derive(Default)]
pub struct Observers {
    inner: RwLock<Vec<ObserverRef>>,
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adding the same observer twice keeps one registration.
    pub async fn add_observer(&self, obj: ObserverRef) {
        let mut inner = self.inner.write().await;
        if !inner.iter().any(|o| same_observer(o, &obj)) {
            inner.push(obj);
        }
    }

    pub async fn remove_observer(&self, obj: &ObserverRef) {
        let mut inner = self.inner.write().await;
        inner.retain(|o| !same_observer(o, obj));
    }

    pub async fn snapshot(&self) -> Vec<ObserverRef> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Header delivery failures are logged, never returned.
    pub async fn notify_new_block(&self, header: &BlockHeader) {
        for observer in self.snapshot().await {
            if let Err(e) = observer.block_scan_notify(header).await {
                warn!("[Notifier] header #{} delivery failed: {}", header.height, e);
            }
        }
    }

    /// Delivers every (asset, source key) entry to every observer.
    pub async fn notify_extract_data(
        &self,
        block_height: u64,
        extract_data: &HashMap<String, ExtractData>,
    ) -> Result<(), AppError> {
        let observers = self.snapshot().await;
        let mut failed = 0usize;

        for (asset, by_source) in extract_data {
            for (source_key, data) in by_source {
                for observer in &observers {
                    if let Err(e) = observer.block_extract_data_notify(source_key, data).await {
                        warn!(
                            "[Notifier] tx {} ({}) for {} delivery failed: {}",
                            data.transaction.tx_id, asset, source_key, e
                        );
                        failed += 1;
                    }
                }
                debug!("[Notifier] tx {} ({}) delivered for {}", data.transaction.tx_id, asset, source_key);
            }
        }

        if failed > 0 {
            return Err(AppError::Notify(format!(
                "{} extract data deliveries failed at height {}",
                failed, block_height
            )));
        }
        Ok(())
    }
}

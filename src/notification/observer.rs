use async_trait::async_trait;
use log::info;

use crate::analyzer::types::TxExtractData;
use crate::coin::metaverse::model::BlockHeader;
use crate::types::AppError;

/// Receives scan events. Implementations must tolerate repeated delivery
/// of the same block or transaction.
#[async_trait]
pub trait BlockScanNotificationObject: Send + Sync {
    async fn block_scan_notify(&self, header: &BlockHeader) -> Result<(), AppError>;

    async fn block_extract_data_notify(
        &self,
        source_key: &str,
        data: &TxExtractData,
    ) -> Result<(), AppError>;
}

/// Writes every event to the log.
pub struct LogObserver {
    symbol: String,
}

impl LogObserver {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self { symbol: symbol.into() }
    }
}

#[async_trait]
impl BlockScanNotificationObject for LogObserver {
    async fn block_scan_notify(&self, header: &BlockHeader) -> Result<(), AppError> {
        if header.fork {
            info!("[Notifier] {} fork header #{} {}", self.symbol, header.height, header.hash);
        } else {
            info!("[Notifier] {} new header #{} {}", self.symbol, header.height, header.hash);
        }
        Ok(())
    }

    async fn block_extract_data_notify(
        &self,
        source_key: &str,
        data: &TxExtractData,
    ) -> Result<(), AppError> {
        let tx = &data.transaction;
        info!(
            "[Notifier] {} tx {} for {} coin={} contract={} inputs={} outputs={} fees={}",
            self.symbol,
            tx.tx_id,
            source_key,
            tx.coin.symbol,
            tx.coin.contract_id,
            data.tx_inputs.len(),
            data.tx_outputs.len(),
            tx.fees
        );
        Ok(())
    }
}

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client as SqsClient;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::analyzer::types::{TxExtractData, TxInput, TxOutput};
use crate::coin::metaverse::model::BlockHeader;
use crate::notification::observer::BlockScanNotificationObject;
use crate::types::AppError;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ScanEvent {
    BlockScanned {
        chain: String,
        height: u64,
        hash: String,
        fork: bool,
    },
    TransactionExtracted {
        chain: String,
        source_key: String,
        tx_id: String,
        wx_id: String,
        contract_id: String,
        block_height: u64,
        block_hash: String,
        fees: String,
        inputs: Vec<TxInput>,
        outputs: Vec<TxOutput>,
    },
}

/// Publishes scan events as JSON messages on an SQS queue.
pub struct SqsObserver {
    client: SqsClient,
    queue_url: String,
}

impl SqsObserver {
    pub async fn new(queue_url: String, region: String) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region))
            .load()
            .await;

        Self {
            client: SqsClient::new(&config),
            queue_url,
        }
    }

    pub async fn send_event(&self, event: &ScanEvent) -> Result<(), AppError> {
        let message_body = serde_json::to_string(event)?;

        debug!("[SQS] sending {}", message_body);

        self.client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message_body)
            .send()
            .await
            .map_err(|e| AppError::Notify(format!("Failed to send SQS message: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl BlockScanNotificationObject for SqsObserver {
    async fn block_scan_notify(&self, header: &BlockHeader) -> Result<(), AppError> {
        self.send_event(&ScanEvent::BlockScanned {
            chain: header.symbol.clone(),
            height: header.height,
            hash: header.hash.clone(),
            fork: header.fork,
        })
        .await
    }

    async fn block_extract_data_notify(
        &self,
        source_key: &str,
        data: &TxExtractData,
    ) -> Result<(), AppError> {
        let tx = &data.transaction;
        self.send_event(&ScanEvent::TransactionExtracted {
            chain: tx.coin.symbol.clone(),
            source_key: source_key.to_string(),
            tx_id: tx.tx_id.clone(),
            wx_id: tx.wx_id.clone(),
            contract_id: tx.coin.contract_id.clone(),
            block_height: tx.block_height,
            block_hash: tx.block_hash.clone(),
            fees: tx.fees.clone(),
            inputs: data.tx_inputs.clone(),
            outputs: data.tx_outputs.clone(),
        })
        .await?;
        info!("[SQS] tx {} published for {}", tx.tx_id, source_key);
        Ok(())
    }
}

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::analyzer::utils::gen_contract_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BalanceModelType {
    Address,
    Account,
}

/// What the membership predicate is asked about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub address: String,
    pub alias: String,
    pub symbol: String,
    pub balance_model_type: BalanceModelType,
}

impl ScanTarget {
    pub fn address(address: &str, symbol: &str) -> Self {
        Self {
            address: address.to_string(),
            alias: String::new(),
            symbol: symbol.to_string(),
            balance_model_type: BalanceModelType::Address,
        }
    }
}

/// Membership predicate: `Some(source_key)` when the address is watched.
pub type ScanTargetFunc = Arc<dyn Fn(&ScanTarget) -> Option<String> + Send + Sync>;

/// Predicate that watches nothing.
pub fn no_scan_target() -> ScanTargetFunc {
    Arc::new(|_: &ScanTarget| None)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SmartContract {
    pub contract_id: String,
    pub symbol: String,
    /// contract address; for ETP assets this is the asset symbol
    pub address: String,
    pub token: String,
    pub name: String,
    pub decimals: u32,
}

impl SmartContract {
    pub fn asset(chain_symbol: &str, asset_symbol: &str, decimals: u32) -> Self {
        Self {
            contract_id: gen_contract_id(chain_symbol, asset_symbol),
            symbol: chain_symbol.to_string(),
            address: asset_symbol.to_string(),
            token: asset_symbol.to_string(),
            name: asset_symbol.to_string(),
            decimals,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Coin {
    pub symbol: String,
    pub is_contract: bool,
    pub contract_id: String,
    pub contract: Option<SmartContract>,
}

impl Coin {
    pub fn native(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            ..Default::default()
        }
    }

    pub fn token(chain_symbol: &str, asset_symbol: &str) -> Self {
        let contract = SmartContract::asset(chain_symbol, asset_symbol, 0);
        Self {
            symbol: chain_symbol.to_string(),
            is_contract: true,
            contract_id: contract.contract_id.clone(),
            contract: Some(contract),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TxInput {
    pub sid: String,
    pub source_tx_id: String,
    pub source_index: u64,
    pub tx_id: String,
    pub address: String,
    pub amount: String,
    pub coin: Coin,
    pub index: u64,
    pub create_at: i64,
    pub block_height: u64,
    pub block_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TxOutput {
    pub sid: String,
    pub tx_id: String,
    pub address: String,
    pub amount: String,
    pub coin: Coin,
    pub index: u64,
    pub create_at: i64,
    pub block_height: u64,
    pub block_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    #[default]
    Success,
    Fail,
}

/// Wallet-level view of one transaction for one asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TransactionSummary {
    pub wx_id: String,
    pub tx_id: String,
    pub account_id: String,
    pub coin: Coin,
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub amount: String,
    pub fees: String,
    pub decimal: u32,
    pub block_hash: String,
    pub block_height: u64,
    pub confirm_time: i64,
    pub submit_time: i64,
    pub status: TxStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TxExtractData {
    pub tx_inputs: Vec<TxInput>,
    pub tx_outputs: Vec<TxOutput>,
    pub transaction: TransactionSummary,
}

/// source key -> data
pub type ExtractData = HashMap<String, TxExtractData>;

#[derive(Debug, Clone, Default)]
pub struct ExtractResult {
    pub tx_id: String,
    pub block_height: u64,
    pub success: bool,
    /// asset symbol -> source key -> data
    pub extract_data: HashMap<String, ExtractData>,
}

impl ExtractResult {
    pub fn new(tx_id: &str, block_height: u64) -> Self {
        Self {
            tx_id: tx_id.to_string(),
            block_height,
            success: false,
            extract_data: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Balance {
    pub symbol: String,
    pub address: String,
    pub balance: String,
    pub confirm_balance: String,
    pub unconfirm_balance: String,
}

impl Balance {
    pub fn zero(symbol: &str, address: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            address: address.to_string(),
            balance: "0".to_string(),
            confirm_balance: "0".to_string(),
            unconfirm_balance: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TokenBalance {
    pub contract: SmartContract,
    pub balance: Balance,
}

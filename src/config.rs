use crate::scanner::retry::RetryPolicy;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_SYMBOL: &str = "ETP";
pub const DEFAULT_MAX_EXTRACTING_SIZE: usize = 10;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
  #[serde(default)]
  pub chain: ChainConfig,
  #[serde(default)]
  pub repository: RepositorySettings,
  #[serde(default)]
  pub notification: NotificationSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChainConfig {
  #[serde(default = "default_symbol")]
  pub symbol: String,
  // JSON-RPC endpoint of the mvsd node
  #[serde(default)]
  pub server_api: String,
  #[serde(default)]
  pub is_test_net: bool,
  #[serde(default = "default_min_fees")]
  pub min_fees: String,
  #[serde(default = "default_data_dir")]
  pub data_dir: String,
  #[serde(default = "default_interval_secs")]
  pub interval_secs: u64,
  #[serde(default)]
  pub rescan_last_block_count: u64,
  #[serde(default = "default_max_extracting_size")]
  pub max_extracting_size: usize,
  #[serde(default)]
  pub retry: RetryPolicy,
  #[serde(default)]
  pub rpc_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RepositorySettings {
  #[serde(default)]
  pub memory_db: bool,
  #[serde(default)]
  pub rocksdb_path: Option<String>,
  // one watched address per line, optionally "address,source_key"
  #[serde(default)]
  pub watch_address_file: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct NotificationSettings {
  #[serde(default)]
  pub sqs_queue_url: Option<String>,
  #[serde(default = "default_aws_region")]
  pub aws_region: String,
}

fn default_symbol() -> String {
  DEFAULT_SYMBOL.to_string()
}

fn default_min_fees() -> String {
  "0".to_string()
}

fn default_data_dir() -> String {
  "data".to_string()
}

fn default_interval_secs() -> u64 {
  10
}

fn default_max_extracting_size() -> usize {
  DEFAULT_MAX_EXTRACTING_SIZE
}

fn default_aws_region() -> String {
  "ap-northeast-2".to_string()
}

impl Default for ChainConfig {
  fn default() -> Self {
    Self {
      symbol: default_symbol(),
      server_api: String::new(),
      is_test_net: false,
      min_fees: default_min_fees(),
      data_dir: default_data_dir(),
      interval_secs: default_interval_secs(),
      rescan_last_block_count: 0,
      max_extracting_size: default_max_extracting_size(),
      retry: RetryPolicy::default(),
      rpc_timeout_secs: None,
    }
  }
}

impl ChainConfig {
  /// Minimum fee in whole coins, rounded to the chain precision.
  pub fn min_fees(&self, decimals: u32) -> Decimal {
    Decimal::from_str(self.min_fees.trim())
      .unwrap_or(Decimal::ZERO)
      .round_dp_with_strategy(decimals, RoundingStrategy::MidpointAwayFromZero)
  }

  /// `<data_dir>/<symbol>/db`
  pub fn db_path(&self) -> PathBuf {
    let data_dir = if self.data_dir.is_empty() { "data" } else { &self.data_dir };
    PathBuf::from(data_dir)
      .join(self.symbol.to_lowercase())
      .join("db")
  }
}

impl Settings {
  pub fn new() -> Result<Self, config::ConfigError> {
    Self::from_path("./config.toml")
  }

  pub fn from_path(path: &str) -> Result<Self, config::ConfigError> {
    let env_prefix = "APP"; // e.g. APP_CHAIN__SERVER_API=http://127.0.0.1:8820/rpc/v3

    let builder = config::Config::builder()
      .add_source(config::File::with_name(path).required(true))
      .add_source(
        config::Environment::with_prefix(env_prefix)
          .prefix_separator("_")
          .separator("__"),
      );

    let settings: Settings = builder.build()?.try_deserialize()?;

    if settings.chain.server_api.is_empty() {
      return Err(config::ConfigError::Message(
        "chain.server_api must be set".to_string(),
      ));
    }
    if Decimal::from_str(settings.chain.min_fees.trim()).is_err() {
      return Err(config::ConfigError::Message(format!(
        "chain.min_fees is not a decimal: {:?}",
        settings.chain.min_fees
      )));
    }
    if settings.chain.max_extracting_size == 0 {
      return Err(config::ConfigError::Message(
        "chain.max_extracting_size must be greater than 0".to_string(),
      ));
    }

    Ok(settings)
  }

  pub fn rocksdb_path(&self) -> PathBuf {
    match &self.repository.rocksdb_path {
      Some(path) => PathBuf::from(path),
      None => self.chain.db_path(),
    }
  }
}

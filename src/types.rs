use crate::analyzer::types::ExtractResult;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

// ====== Channel aliases ======
pub type ExtractResultSender = UnboundedSender<ExtractResult>;
pub type ExtractResultReceiver = UnboundedReceiver<ExtractResult>;

// ====== Unified Error Type ======
#[derive(Debug, thiserror::Error)]
pub enum AppError {
  #[error("API Client error: {0}")]
  Client(String),

  #[error("RPC error {code}: {message}")]
  Rpc { code: i64, message: String },

  #[error("RPC response is empty")]
  EmptyResponse,

  #[error("Channel send error: {0}")]
  SendError(String),

  #[error("Task join error: {0}")]
  JoinError(#[from] tokio::task::JoinError),

  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Extraction error: {0}")]
  Extract(String),

  #[error("Notification error: {0}")]
  Notify(String),

  #[error("Decode error: {0}")]
  Decode(String),

  #[error("Initialization error: {0}")]
  Initialization(String),

  #[error("Database error: {0}")]
  Database(String),

  #[error("Block error: {0}")]
  Block(String),
}

// ====== Error Conversions (From impls) ======

impl From<reqwest::Error> for AppError {
  fn from(err: reqwest::Error) -> Self {
    AppError::Client(format!("Reqwest error: {}", err))
  }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AppError {
  fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
    AppError::SendError(format!("Channel send failed: {}", err))
  }
}

impl From<std::io::Error> for AppError {
  fn from(err: std::io::Error) -> Self {
    AppError::Initialization(format!("IO error: {}", err))
  }
}

impl From<serde_json::Error> for AppError {
  fn from(err: serde_json::Error) -> Self {
    AppError::Decode(format!("JSON parse error: {}", err))
  }
}

impl From<rust_decimal::Error> for AppError {
  fn from(err: rust_decimal::Error) -> Self {
    AppError::Decode(format!("Decimal parse error: {}", err))
  }
}

impl From<config::ConfigError> for AppError {
  fn from(err: config::ConfigError) -> Self {
    AppError::Config(err.to_string())
  }
}

//! Metaverse (ETP) wallet adapter: node client, block scanner, transaction
//! extraction and observer notification.

pub mod analyzer;
pub mod coin;
pub mod config;
pub mod decoder;
pub mod fetcher;
pub mod manager;
pub mod notification;
pub mod respository;
pub mod scanner;
pub mod shutdown;
pub mod tasks;
pub mod types;

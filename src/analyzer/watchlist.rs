use log::{info, warn};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::analyzer::types::{ScanTarget, ScanTargetFunc};
use crate::types::AppError;

/// Watched addresses and the source key each one reports under.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    addresses: HashMap<String, String>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    /// One `address[,source_key]` per line; the address is its own key when
    /// none is given. Blank lines and `#` comments are skipped.
    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        let reader = BufReader::new(File::open(path)?);
        let mut list = WatchList::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.splitn(2, ',').map(str::trim);
            match parts.next() {
                Some(address) if !address.is_empty() => {
                    let key = parts.next().filter(|k| !k.is_empty()).unwrap_or(address);
                    list.insert(address, key);
                }
                _ => warn!("[WatchList] {}:{} ignored: {}", path.display(), lineno + 1, line),
            }
        }

        info!("[WatchList] loaded {} addresses from {}", list.len(), path.display());
        Ok(list)
    }

    pub fn insert(&mut self, address: &str, source_key: &str) {
        self.addresses.insert(address.to_string(), source_key.to_string());
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn lookup(&self, target: &ScanTarget) -> Option<String> {
        if target.address.is_empty() {
            return None;
        }
        self.addresses.get(&target.address).cloned()
    }

    pub fn into_scan_target_func(self) -> ScanTargetFunc {
        let list = Arc::new(self);
        Arc::new(move |target: &ScanTarget| list.lookup(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_keys_comments_and_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# watched").unwrap();
        writeln!(file, "MUsTC2PCF52yNvAeGNXJUKy9CfLVHV9yYj, wallet-1").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "MFwMxszPyEPfJK6J5FaKGvjFDf7GLi7ZDu").unwrap();

        let list = WatchList::from_file(file.path()).unwrap();
        assert_eq!(list.len(), 2);

        let func = list.into_scan_target_func();
        assert_eq!(
            func(&ScanTarget::address("MUsTC2PCF52yNvAeGNXJUKy9CfLVHV9yYj", "ETP")),
            Some("wallet-1".to_string())
        );
        assert_eq!(
            func(&ScanTarget::address("MFwMxszPyEPfJK6J5FaKGvjFDf7GLi7ZDu", "ETP")),
            Some("MFwMxszPyEPfJK6J5FaKGvjFDf7GLi7ZDu".to_string())
        );
        assert_eq!(func(&ScanTarget::address("", "ETP")), None);
    }
}

pub mod block_scanner;
pub mod retry;

pub use block_scanner::{BlockScanner, ScanControl, ScanState, ScannerOptions};
pub use retry::RetryPolicy;

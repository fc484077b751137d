pub mod batch;
pub mod extractor;
pub mod types;
pub mod utils;
pub mod watchlist;

pub use batch::BatchExtractor;
pub use extractor::TransactionExtractor;

pub mod observer;
pub mod observers;
#[cfg(feature = "sqs")]
pub mod sqs_client;

pub use observer::{BlockScanNotificationObject, LogObserver};
pub use observers::{ObserverRef, Observers};
#[cfg(feature = "sqs")]
pub use sqs_client::SqsObserver;

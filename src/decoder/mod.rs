pub mod address;
pub mod contract;
pub mod transaction;

pub use address::{AddressDecoder, AddressKind};
pub use contract::ContractDecoder;
pub use transaction::{TransactionDecoder, TransferRequest};

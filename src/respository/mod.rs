#[cfg(feature = "rocksdb-backend")]
mod rocksdb;
mod r#trait;
mod memory;
#[cfg(feature = "rocksdb-backend")]
mod rocksdb_repo;
mod wrapper;

// Repository trait
pub use r#trait::{Repository, UnscanReason, UnscanRecord};

// Repository implementations
pub use memory::MemoryRepository;
#[cfg(feature = "rocksdb-backend")]
pub use rocksdb_repo::RocksDBRepository;
pub use wrapper::RepositoryWrapper;

#[cfg(feature = "rocksdb-backend")]
pub use self::rocksdb::open_rocksdb;

pub mod clock;
pub mod in_memory;
pub mod rates;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;

pub mod keys;
pub mod rocksdb;
pub mod traits;

pub use self::rocksdb::RocksDbStore;
pub use traits::Store;

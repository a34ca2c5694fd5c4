pub mod base;
pub mod disk;

pub use base::{StorageBackend, StorageError, StorageItem};
pub use disk::DiskStorage;

// Export public modules
pub mod common;
pub mod storage;

// Re-export key items for convenient access
pub use common::types::{AccessType, FrameId, Lsn, PageId, INVALID_PAGE_ID, PAGE_SIZE};
pub use storage::buffer::{BufferPoolError, BufferPoolManager, LruKReplacer};
pub use storage::disk::{DiskManager, DiskManagerError};
pub use storage::log::{LogManager, LogManagerError};

use thiserror::Error;

use crate::storage::disk::DiskManagerError;
use crate::storage::log::LogManagerError;

#[derive(Error, Debug)]
pub enum BufferPoolError {
    #[error("no free frame and no evictable page")]
    PoolExhausted,

    #[error("disk manager error: {0}")]
    Disk(#[from] DiskManagerError),

    #[error("WAL error: {0}")]
    Wal(#[from] LogManagerError),
}

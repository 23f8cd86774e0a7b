use std::sync::Arc;

use anyhow::Result;
use tempfile::NamedTempFile;

use ferrodb::storage::buffer::BufferPoolManager;
use ferrodb::storage::disk::DiskManager;
use ferrodb::storage::log::LogManager;

// Create a temporary database file for testing
#[allow(dead_code)]
pub fn create_temp_db_file() -> Result<(NamedTempFile, String)> {
    let file = NamedTempFile::new()?;
    let path = file.path().to_str().unwrap().to_string();
    Ok((file, path))
}

// Create a buffer pool manager over a temporary database file. The disk
// manager is returned too so tests can inspect the file directly.
#[allow(dead_code)]
pub fn create_test_buffer_pool(
    pool_size: usize,
    replacer_k: usize,
) -> Result<(Arc<BufferPoolManager>, Arc<DiskManager>, NamedTempFile)> {
    let (file, path) = create_temp_db_file()?;
    let disk_manager = Arc::new(DiskManager::new(path)?);
    let buffer_pool = Arc::new(BufferPoolManager::new(
        pool_size,
        replacer_k,
        Arc::clone(&disk_manager),
        None,
    ));
    Ok((buffer_pool, disk_manager, file))
}

// Same, with a write-ahead log attached.
#[allow(dead_code)]
pub fn create_test_buffer_pool_with_wal(
    pool_size: usize,
    replacer_k: usize,
) -> Result<(
    Arc<BufferPoolManager>,
    Arc<DiskManager>,
    Arc<LogManager>,
    NamedTempFile,
    NamedTempFile,
)> {
    let (db_file, db_path) = create_temp_db_file()?;
    let (log_file, log_path) = create_temp_db_file()?;
    let disk_manager = Arc::new(DiskManager::new(db_path)?);
    let log_manager = Arc::new(LogManager::new(log_path)?);
    let buffer_pool = Arc::new(BufferPoolManager::new(
        pool_size,
        replacer_k,
        Arc::clone(&disk_manager),
        Some(Arc::clone(&log_manager)),
    ));
    Ok((buffer_pool, disk_manager, log_manager, db_file, log_file))
}

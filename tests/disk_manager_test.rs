use anyhow::Result;

use ferrodb::storage::disk::{DiskManager, DiskManagerError};
use ferrodb::PAGE_SIZE;

mod common;
use common::create_temp_db_file;

#[test]
fn test_write_read_round_trip() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk = DiskManager::new(path)?;

    let mut page = [0u8; PAGE_SIZE];
    page[0..11].copy_from_slice(b"hello pages");
    disk.write_page(3, &page)?;

    let mut readback = [0u8; PAGE_SIZE];
    disk.read_page(3, &mut readback)?;
    assert_eq!(page, readback);

    Ok(())
}

#[test]
fn test_read_past_end_is_zeroed() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk = DiskManager::new(path)?;

    let mut buf = [0xFFu8; PAGE_SIZE];
    disk.read_page(9, &mut buf)?;
    assert!(buf.iter().all(|&b| b == 0));

    Ok(())
}

#[test]
fn test_pages_do_not_overlap() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk = DiskManager::new(path)?;

    disk.write_page(0, &[0x11; PAGE_SIZE])?;
    disk.write_page(1, &[0x22; PAGE_SIZE])?;

    let mut buf = [0u8; PAGE_SIZE];
    disk.read_page(0, &mut buf)?;
    assert!(buf.iter().all(|&b| b == 0x11));
    disk.read_page(1, &mut buf)?;
    assert!(buf.iter().all(|&b| b == 0x22));

    Ok(())
}

#[test]
fn test_negative_page_id_is_rejected() -> Result<()> {
    let (_file, path) = create_temp_db_file()?;
    let disk = DiskManager::new(path)?;

    let mut buf = [0u8; PAGE_SIZE];
    assert!(matches!(
        disk.read_page(-1, &mut buf),
        Err(DiskManagerError::InvalidPageId(-1))
    ));
    assert!(matches!(
        disk.write_page(-1, &buf),
        Err(DiskManagerError::InvalidPageId(-1))
    ));

    Ok(())
}

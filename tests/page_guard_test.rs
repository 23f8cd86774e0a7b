use anyhow::Result;

use ferrodb::storage::buffer::PageGuard;
use ferrodb::{AccessType, PAGE_SIZE};

mod common;
use common::create_test_buffer_pool;

#[test]
fn test_guard_drop_releases_pin() -> Result<()> {
    let (buffer_pool, _disk, _temp_file) = create_test_buffer_pool(10, 2)?;

    let (page_id, guard) = buffer_pool.new_page_guarded()?;
    assert_eq!(buffer_pool.pin_count(page_id), Some(1));
    assert_eq!(buffer_pool.evictable_count(), 0);

    drop(guard);
    assert_eq!(buffer_pool.pin_count(page_id), Some(0));
    assert_eq!(buffer_pool.evictable_count(), 1);

    Ok(())
}

#[test]
fn test_nested_guards_stack_pins() -> Result<()> {
    let (buffer_pool, _disk, _temp_file) = create_test_buffer_pool(10, 2)?;

    let (page_id, outer) = buffer_pool.new_page_guarded()?;
    let inner = buffer_pool.fetch_page_basic(page_id)?;
    assert_eq!(buffer_pool.pin_count(page_id), Some(2));

    drop(inner);
    assert_eq!(buffer_pool.pin_count(page_id), Some(1));
    drop(outer);
    assert_eq!(buffer_pool.pin_count(page_id), Some(0));

    Ok(())
}

#[test]
fn test_basic_guard_data_mut_marks_dirty() -> Result<()> {
    let (buffer_pool, disk, _temp_file) = create_test_buffer_pool(2, 2)?;

    let (page_id, mut guard) = buffer_pool.new_page_guarded()?;
    guard.data_mut()[10] = 0xCD;
    drop(guard);

    // Force the page out; the write must survive on disk.
    let (keep, _) = buffer_pool.new_page()?;
    let (other, _) = buffer_pool.new_page()?;
    assert!(!buffer_pool.is_resident(page_id));
    buffer_pool.unpin_page(keep, false, AccessType::Unknown);
    buffer_pool.unpin_page(other, false, AccessType::Unknown);

    let mut buf = [0u8; PAGE_SIZE];
    disk.read_page(page_id, &mut buf)?;
    assert_eq!(buf[10], 0xCD);

    Ok(())
}

#[test]
fn test_read_guards_are_shared() -> Result<()> {
    let (buffer_pool, _disk, _temp_file) = create_test_buffer_pool(10, 2)?;

    let (page_id, guard) = buffer_pool.new_page_guarded()?;
    drop(guard);

    let first = buffer_pool.fetch_page_read(page_id)?;
    let second = buffer_pool.fetch_page_read(page_id)?;
    assert_eq!(buffer_pool.pin_count(page_id), Some(2));
    assert_eq!(first.data()[0], second.data()[0]);

    drop(first);
    drop(second);
    assert_eq!(buffer_pool.pin_count(page_id), Some(0));

    Ok(())
}

#[test]
fn test_write_guard_round_trip() -> Result<()> {
    let (buffer_pool, _disk, _temp_file) = create_test_buffer_pool(10, 2)?;

    let (page_id, guard) = buffer_pool.new_page_guarded()?;
    drop(guard);

    {
        let mut guard = buffer_pool.fetch_page_write(page_id)?;
        guard.data_mut()[0..4].copy_from_slice(b"abcd");
        assert_eq!(&guard.data()[0..4], b"abcd");
    }

    let guard = buffer_pool.fetch_page_read(page_id)?;
    assert_eq!(&guard.data()[0..4], b"abcd");

    Ok(())
}

// Guards transfer their pin on move; the single release happens when the
// final owner goes out of scope.
fn pass_through(guard: PageGuard<'_>) -> PageGuard<'_> {
    guard
}

#[test]
fn test_guard_is_movable() -> Result<()> {
    let (buffer_pool, _disk, _temp_file) = create_test_buffer_pool(10, 2)?;

    let (page_id, guard) = buffer_pool.new_page_guarded()?;
    let moved = pass_through(guard);
    assert_eq!(moved.page_id(), page_id);
    assert_eq!(moved.data()[0], 0);
    assert_eq!(buffer_pool.pin_count(page_id), Some(1));

    drop(moved);
    assert_eq!(buffer_pool.pin_count(page_id), Some(0));

    Ok(())
}

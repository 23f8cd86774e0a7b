use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use byteorder::{ByteOrder, LittleEndian};
use parking_lot::Mutex;
use thiserror::Error;

use crate::common::types::Lsn;

#[derive(Error, Debug)]
pub enum LogManagerError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    #[error("Invalid log file format")]
    InvalidFormat,
}

/// Write-ahead log sink.
///
/// Records are appended to an in-memory tail and persisted by `flush`.
/// The buffer pool calls `flush_till_lsn` before writing out a page whose
/// contents are covered by a log record, keeping the log ahead of the
/// data file. Recovery from the log is a separate concern and not handled
/// here.
pub struct LogManager {
    log_file: Mutex<File>,
    /// Records appended but not yet persisted.
    tail: Mutex<Vec<u8>>,
    next_lsn: AtomicU64,
    flushed_lsn: AtomicU64,
}

impl LogManager {
    /// Magic number for log files: "FWAL" in ASCII
    const MAGIC: u32 = 0x4657_414C;

    /// Current log file format version
    const VERSION: u32 = 1;

    /// Size of the file header in bytes
    const HEADER_SIZE: usize = 16;

    /// Open (or create) the log file at `log_path`. A fresh file gets a
    /// header stamped; an existing one has its header verified.
    pub fn new(log_path: impl AsRef<Path>) -> Result<Self, LogManagerError> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(log_path)?;

        if file.metadata()?.len() == 0 {
            let mut header = [0u8; Self::HEADER_SIZE];
            LittleEndian::write_u32(&mut header[0..4], Self::MAGIC);
            LittleEndian::write_u32(&mut header[4..8], Self::VERSION);
            LittleEndian::write_u64(&mut header[8..16], 1);
            file.write_all(&header)?;
            file.flush()?;
        } else {
            let mut header = [0u8; Self::HEADER_SIZE];
            file.seek(SeekFrom::Start(0))?;
            file.read_exact(&mut header)?;
            if LittleEndian::read_u32(&header[0..4]) != Self::MAGIC {
                return Err(LogManagerError::InvalidFormat);
            }
        }
        file.seek(SeekFrom::End(0))?;

        Ok(Self {
            log_file: Mutex::new(file),
            tail: Mutex::new(Vec::new()),
            next_lsn: AtomicU64::new(1),
            flushed_lsn: AtomicU64::new(0),
        })
    }

    /// Append a record to the log tail, returning its LSN. The record is
    /// framed as LSN + payload length + payload in the file image.
    pub fn append(&self, payload: &[u8]) -> Lsn {
        let mut tail = self.tail.lock();
        let lsn = self.next_lsn.fetch_add(1, Ordering::SeqCst);

        let mut frame = [0u8; 12];
        LittleEndian::write_u64(&mut frame[0..8], lsn);
        LittleEndian::write_u32(&mut frame[8..12], payload.len() as u32);
        tail.extend_from_slice(&frame);
        tail.extend_from_slice(payload);
        lsn
    }

    /// Persist every appended record.
    pub fn flush(&self) -> Result<(), LogManagerError> {
        let mut tail = self.tail.lock();
        if tail.is_empty() {
            return Ok(());
        }
        let durable_to = self.next_lsn.load(Ordering::SeqCst) - 1;

        let mut file = self.log_file.lock();
        file.write_all(&tail)?;
        file.flush()?;
        tail.clear();

        self.flushed_lsn.store(durable_to, Ordering::SeqCst);
        Ok(())
    }

    /// Ensure every record up to and including `lsn` is persisted.
    pub fn flush_till_lsn(&self, lsn: Lsn) -> Result<(), LogManagerError> {
        if self.flushed_lsn.load(Ordering::SeqCst) >= lsn {
            return Ok(());
        }
        self.flush()
    }

    /// LSN of the last record known durable.
    pub fn flushed_lsn(&self) -> Lsn {
        self.flushed_lsn.load(Ordering::SeqCst)
    }

    /// LSN the next appended record will receive.
    pub fn next_lsn(&self) -> Lsn {
        self.next_lsn.load(Ordering::SeqCst)
    }
}

//! Capture file I/O
//!
//! A capture is a flat run of fixed-size records with no header:
//!
//! ```text
//! [ timestamp_ns: u64 BE ][ wire message: 64 bytes ]   x N
//! ```
//!
//! Records are read back in file order, which is taken to be timestamp
//! order.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::constants::CAPTURE_RECORD_SIZE;
use crate::core::errors::CaptureError;
use crate::core::message::Message;
use crate::core::wire::{self, WIRE_SIZE};

/// One message with its capture-relative timestamp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapturedMessage {
    pub timestamp_ns: u64,
    pub message: Message,
}

impl CapturedMessage {
    pub fn new(timestamp_ns: u64, message: Message) -> Self {
        Self {
            timestamp_ns,
            message,
        }
    }

    /// Serialize to one capture record
    pub fn encode(&self) -> [u8; CAPTURE_RECORD_SIZE] {
        let mut record = [0u8; CAPTURE_RECORD_SIZE];
        record[..8].copy_from_slice(&self.timestamp_ns.to_be_bytes());
        record[8..].copy_from_slice(&wire::encode(&self.message));
        record
    }

    /// Parse one capture record
    pub fn decode(record: &[u8; CAPTURE_RECORD_SIZE]) -> Self {
        let (ts, body) = record.split_at(8);
        let mut ts_bytes = [0u8; 8];
        ts_bytes.copy_from_slice(ts);
        let mut msg_bytes = [0u8; WIRE_SIZE];
        msg_bytes.copy_from_slice(body);
        Self {
            timestamp_ns: u64::from_be_bytes(ts_bytes),
            message: wire::decode_record(&msg_bytes),
        }
    }
}

/// Buffered sequential capture writer
pub struct CaptureWriter {
    path: PathBuf,
    writer: BufWriter<File>,
    written: usize,
}

impl CaptureWriter {
    /// Create (or truncate) a capture file
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, CaptureError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| CaptureError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            written: 0,
        })
    }

    pub fn write(&mut self, record: &CapturedMessage) -> Result<(), CaptureError> {
        self.writer
            .write_all(&record.encode())
            .map_err(|source| self.io_error(source))?;
        self.written += 1;
        Ok(())
    }

    /// Flush and close, returning the number of records written
    pub fn finish(mut self) -> Result<usize, CaptureError> {
        self.writer.flush().map_err(|source| self.io_error(source))?;
        debug!(path = %self.path.display(), records = self.written, "Capture file written");
        Ok(self.written)
    }

    fn io_error(&self, source: std::io::Error) -> CaptureError {
        CaptureError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

/// Write a whole capture in one call
pub fn write_capture<P: AsRef<Path>>(
    path: P,
    records: &[CapturedMessage],
) -> Result<usize, CaptureError> {
    let mut writer = CaptureWriter::create(path)?;
    for record in records {
        writer.write(record)?;
    }
    writer.finish()
}

/// Read every record of a capture file, without field validation
///
/// Fails with [`CaptureError::Truncated`] if the file is not a whole number
/// of records.
pub fn read_capture<P: AsRef<Path>>(path: P) -> Result<Vec<CapturedMessage>, CaptureError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if bytes.len() % CAPTURE_RECORD_SIZE != 0 {
        return Err(CaptureError::Truncated {
            len: bytes.len() as u64,
            record_size: CAPTURE_RECORD_SIZE,
        });
    }

    Ok(bytes
        .chunks_exact(CAPTURE_RECORD_SIZE)
        .map(|chunk| {
            let mut record = [0u8; CAPTURE_RECORD_SIZE];
            record.copy_from_slice(chunk);
            CapturedMessage::decode(&record)
        })
        .collect())
}

/// Read a capture and validate every record
///
/// The first invalid record fails the whole load; no partial list is
/// returned.
pub fn load_validated<P: AsRef<Path>>(path: P) -> Result<Vec<CapturedMessage>, CaptureError> {
    let path = path.as_ref();
    let records = read_capture(path)?;

    if let Some((index, reason)) = records
        .iter()
        .enumerate()
        .find_map(|(i, r)| r.message.validate().err().map(|e| (i, e)))
    {
        return Err(CaptureError::InvalidRecord { index, reason });
    }

    info!(path = %path.display(), records = records.len(), "Loaded capture file");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::MessageValidationError;
    use crate::testing::helpers::{add_order, captured};

    #[test]
    fn test_record_layout() {
        let record = CapturedMessage::new(0x0102_0304_0506_0708, add_order("AAPL", 150.0, 100, 1));
        let bytes = record.encode();
        assert_eq!(bytes.len(), 72);
        assert_eq!(&bytes[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(bytes[8], b'A');
        assert_eq!(CapturedMessage::decode(&bytes), record);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.itch");
        let records = captured(&[0, 500, 1_000]);

        assert_eq!(write_capture(&path, &records).unwrap(), 3);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 3 * 72);
        assert_eq!(load_validated(&path).unwrap(), records);
    }

    #[test]
    fn test_empty_file_is_empty_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.itch");
        std::fs::write(&path, []).unwrap();
        assert!(read_capture(&path).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.itch");
        let mut bytes = CapturedMessage::new(0, add_order("AAPL", 1.0, 1, 1))
            .encode()
            .to_vec();
        bytes.extend_from_slice(&[0u8; 10]);
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(
            read_capture(&path),
            Err(CaptureError::Truncated { len: 82, record_size: 72 })
        ));
    }

    #[test]
    fn test_invalid_record_reports_index() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.itch");
        let mut records = captured(&[0, 1, 2]);
        records[2].message.size = 0;
        write_capture(&path, &records).unwrap();

        match load_validated(&path) {
            Err(CaptureError::InvalidRecord { index, reason }) => {
                assert_eq!(index, 2);
                assert_eq!(reason, MessageValidationError::ZeroSize { size: 0 });
            }
            other => panic!("expected InvalidRecord, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            read_capture("/nonexistent/capture.itch"),
            Err(CaptureError::Io { .. })
        ));
    }
}

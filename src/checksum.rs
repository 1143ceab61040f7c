//! CRC32 hashing and the checksum record stream
//!
//! All CRC32 work goes through these functions so that the encoder and the
//! scanner can never disagree on how a block is hashed. The checksum file is
//! a headerless run of little-endian u32 records, N data records followed by
//! R parity records for each section.

use crate::domain::Crc32Value;
use std::io::{self, BufReader, ErrorKind, Read};

/// Buffer size for the checksum stream reader
const CRC_BUFFER_CAPACITY: usize = 64 * 1024;

// ============================================================================
// CRC32 Hashing
// ============================================================================

/// Compute CRC32 checksum of data
///
/// Uses the IEEE polynomial (same as Ethernet, PKZIP)
#[inline]
pub fn compute_crc32(data: &[u8]) -> Crc32Value {
    Crc32Value::new(crc32fast::hash(data))
}

/// Compute one CRC32 per block, preserving order
pub fn compute_block_crcs<B: AsRef<[u8]>>(blocks: &[B]) -> Vec<Crc32Value> {
    blocks.iter().map(|b| compute_crc32(b.as_ref())).collect()
}

// ============================================================================
// Checksum record stream
// ============================================================================

/// Sequential reader for the checksum file
pub struct ChecksumReader<R: Read> {
    reader: BufReader<R>,
    records_read: u64,
}

impl<R: Read> ChecksumReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::with_capacity(CRC_BUFFER_CAPACITY, inner),
            records_read: 0,
        }
    }

    /// Fill `out` with the next records
    ///
    /// Returns how many records were read; fewer than `out.len()` means the
    /// stream ended. A trailing partial record counts as not read.
    pub fn read_next(&mut self, out: &mut [Crc32Value]) -> io::Result<usize> {
        let mut record = [0u8; 4];
        for (i, slot) in out.iter_mut().enumerate() {
            match self.reader.read_exact(&mut record) {
                Ok(()) => {
                    *slot = Crc32Value::from_le_bytes(record);
                    self.records_read += 1;
                }
                Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(i),
                Err(e) => return Err(e),
            }
        }
        Ok(out.len())
    }

    /// Total records consumed so far
    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn crc32_matches_ieee_check_value() {
        assert_eq!(compute_crc32(b"123456789"), 0xCBF4_3926u32);
    }

    #[test]
    fn block_crcs_keep_order() {
        let blocks = vec![vec![0u8; 8], vec![1u8; 8]];
        let crcs = compute_block_crcs(&blocks);
        assert_eq!(crcs.len(), 2);
        assert_eq!(crcs[0], compute_crc32(&[0u8; 8]));
        assert_eq!(crcs[1], compute_crc32(&[1u8; 8]));
    }

    #[test]
    fn reader_stops_at_partial_record() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&7u32.to_le_bytes());
        bytes.extend_from_slice(&9u32.to_le_bytes());
        bytes.extend_from_slice(&[1, 2]);

        let mut reader = ChecksumReader::new(Cursor::new(bytes));
        let mut out = [Crc32Value::new(0); 3];
        assert_eq!(reader.read_next(&mut out).unwrap(), 2);
        assert_eq!(out[0], 7u32);
        assert_eq!(out[1], 9u32);
        assert_eq!(reader.records_read(), 2);
        assert_eq!(reader.read_next(&mut out).unwrap(), 0);
    }
}

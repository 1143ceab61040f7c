//! Writer for the ECC and checksum companion files

use super::WRITE_BUFFER_CAPACITY;
use crate::domain::Crc32Value;
use crate::error::Result;
use crate::metadata::Metadata;
use std::io::{self, BufWriter, Write};

/// Persists the header, parity payloads and per-block CRC records
///
/// Both outputs are buffered; call [`finish`](Self::finish) to flush them
/// and get the underlying writers back (e.g. to `sync_all` a file).
pub struct BlockWriter<E: Write, C: Write> {
    ecc: BufWriter<E>,
    crc: BufWriter<C>,
    sections_written: u64,
}

impl<E: Write, C: Write> BlockWriter<E, C> {
    pub fn new(ecc: E, crc: C) -> Self {
        Self {
            ecc: BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, ecc),
            crc: BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, crc),
            sections_written: 0,
        }
    }

    pub fn write_metadata(&mut self, meta: &Metadata) -> Result<()> {
        meta.write_to(&mut self.ecc)
    }

    /// Append one section's parity blocks, in order, with no separators
    pub fn write_parity<B: AsRef<[u8]>>(&mut self, parity: &[B]) -> io::Result<()> {
        for block in parity {
            self.ecc.write_all(block.as_ref())?;
        }
        self.sections_written += 1;
        Ok(())
    }

    /// Append CRC records as little-endian u32 values
    pub fn write_checksums(&mut self, crcs: &[Crc32Value]) -> io::Result<()> {
        for crc in crcs {
            self.crc.write_all(&crc.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn sections_written(&self) -> u64 {
        self.sections_written
    }

    /// Flush both outputs and return the inner writers
    pub fn finish(self) -> io::Result<(E, C)> {
        let ecc = self.ecc.into_inner().map_err(|e| e.into_error())?;
        let crc = self.crc.into_inner().map_err(|e| e.into_error())?;
        Ok((ecc, crc))
    }
}

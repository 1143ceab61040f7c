//! ECC file header and stripe layout
//!
//! The header is written verbatim as the first [`HEADER_LEN`] bytes of the
//! ECC file. Everything else about the layout (section count, expected
//! companion file lengths) is derived from it.

use crate::config::ProtectConfig;
use crate::error::{EccError, Result};
use binrw::{BinRead, BinWrite};
use std::io::{Cursor, Read, Seek, Write};

/// Serialized size of [`Metadata`] in bytes
pub const HEADER_LEN: u64 = 32;

/// Upper bound on N + R imposed by the GF(2^8) codec
pub const MAX_TOTAL_BLOCKS: usize = 256;

/// Size of each CRC record in the checksum file
pub const CRC_RECORD_LEN: u64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, BinRead, BinWrite)]
#[brw(little)]
pub struct Metadata {
    pub file_size: u64,     // Length of the protected file in bytes
    pub block_size: u32,    // Size of every data and parity block
    pub num_data: u16,      // N: data blocks per section
    pub num_recovery: u16,  // R: parity blocks per section
    pub reserved: [u8; 16], // Unused padding, always zero on write
}

impl Metadata {
    pub fn new(file_size: u64, block_size: u32, num_data: u16, num_recovery: u16) -> Self {
        Metadata {
            file_size,
            block_size,
            num_data,
            num_recovery,
            reserved: [0u8; 16],
        }
    }

    /// Build the header for a file of `file_size` bytes protected with `config`
    pub fn from_config(file_size: u64, config: &ProtectConfig) -> Self {
        Metadata::new(
            file_size,
            config.block_size,
            config.num_data,
            config.num_recovery,
        )
    }

    /// Reject layouts no stream can be encoded or decoded with
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(EccError::Metadata("block size must be positive".into()));
        }
        if self.num_data == 0 {
            return Err(EccError::Metadata("at least one data block is required".into()));
        }
        if self.num_recovery == 0 {
            return Err(EccError::Metadata(
                "at least one recovery block is required".into(),
            ));
        }
        if self.total_blocks() > MAX_TOTAL_BLOCKS {
            return Err(EccError::Metadata(format!(
                "{} data + {} recovery blocks exceeds the limit of {}",
                self.num_data, self.num_recovery, MAX_TOTAL_BLOCKS
            )));
        }
        Ok(())
    }

    /// Read and validate the header from the start of an ECC stream
    pub fn read_from<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let meta = Metadata::read(reader)
            .map_err(|e| EccError::Metadata(format!("failed to read ECC header: {e}")))?;
        meta.validate()?;
        Ok(meta)
    }

    /// Header for a scan or repair pass
    ///
    /// With an override the caller has already consumed the header and `ecc`
    /// is expected to sit right after it; otherwise the header is read here.
    pub fn resolve<R: Read + Seek>(override_meta: Option<&Metadata>, ecc: &mut R) -> Result<Self> {
        match override_meta {
            Some(meta) => {
                meta.validate()?;
                Ok(*meta)
            }
            None => Metadata::read_from(ecc),
        }
    }

    /// Write the header to an ECC stream
    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.to_bytes()?)?;
        Ok(())
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buffer = Cursor::new(Vec::with_capacity(HEADER_LEN as usize));
        self.write(&mut buffer)
            .map_err(|e| EccError::Metadata(format!("failed to serialize ECC header: {e}")))?;
        Ok(buffer.into_inner())
    }

    pub fn block_len(&self) -> usize {
        self.block_size as usize
    }

    pub fn data_blocks(&self) -> usize {
        self.num_data as usize
    }

    pub fn parity_blocks(&self) -> usize {
        self.num_recovery as usize
    }

    /// N + R
    pub fn total_blocks(&self) -> usize {
        self.data_blocks() + self.parity_blocks()
    }

    /// Bytes of file data covered by one section
    pub fn section_data_bytes(&self) -> u64 {
        self.block_size as u64 * self.num_data as u64
    }

    /// Number of sections, the last one possibly zero-padded
    pub fn num_sections(&self) -> usize {
        let per_section = self.section_data_bytes();
        if per_section == 0 {
            return 0;
        }
        self.file_size.div_ceil(per_section) as usize
    }

    /// Number of data blocks holding file bytes
    pub fn data_block_count(&self) -> u64 {
        if self.block_size == 0 {
            return 0;
        }
        self.file_size.div_ceil(self.block_size as u64)
    }

    /// Length the ECC file must have for this header
    pub fn expected_ecc_len(&self) -> u64 {
        HEADER_LEN + self.num_sections() as u64 * self.num_recovery as u64 * self.block_size as u64
    }

    /// Length the checksum file must have for this header
    pub fn expected_crc_len(&self) -> u64 {
        self.num_sections() as u64 * self.total_blocks() as u64 * CRC_RECORD_LEN
    }
}

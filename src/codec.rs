//! Erasure codec capability
//!
//! The engine never does finite-field arithmetic itself; it hands a full
//! stripe of N + R equally sized blocks to an [`ErasureCodec`]. The default
//! implementation wraps the GF(2^8) Reed-Solomon codec from
//! `reed-solomon-erasure`, which caps N + R at 256.

use crate::error::{EccError, Result};
use crate::metadata::{Metadata, MAX_TOTAL_BLOCKS};
use reed_solomon_erasure::galois_8::ReedSolomon;
use thiserror::Error;

/// Failure reported by a codec operation
#[derive(Debug, Error)]
#[error("{0}")]
pub struct CodecError(pub String);

/// Encode / verify / reconstruct over one stripe
///
/// Slices passed in always hold `data_blocks() + parity_blocks()` entries,
/// data first, all of the same length.
pub trait ErasureCodec {
    /// N
    fn data_blocks(&self) -> usize;

    /// R
    fn parity_blocks(&self) -> usize;

    /// Compute the parity entries from the data entries, in place
    fn encode(&self, blocks: &mut [Vec<u8>]) -> std::result::Result<(), CodecError>;

    /// Whether the parity entries are consistent with the data entries
    fn verify(&self, blocks: &[Vec<u8>]) -> std::result::Result<bool, CodecError>;

    /// Fill every `None` entry; fails when more than R entries are missing
    fn reconstruct(&self, blocks: &mut [Option<Vec<u8>>]) -> std::result::Result<(), CodecError>;
}

/// Reed-Solomon over GF(2^8)
pub struct ReedSolomonCodec {
    rs: ReedSolomon,
    data_blocks: usize,
    parity_blocks: usize,
}

impl ReedSolomonCodec {
    /// Create a codec for `data_blocks` + `parity_blocks`
    pub fn new(data_blocks: usize, parity_blocks: usize) -> Result<Self> {
        let invalid = |reason: String| EccError::Codec {
            data: data_blocks,
            parity: parity_blocks,
            reason,
        };

        if data_blocks == 0 || parity_blocks == 0 {
            return Err(invalid("need at least one data and one parity block".into()));
        }
        if data_blocks + parity_blocks > MAX_TOTAL_BLOCKS {
            return Err(invalid(format!("more than {MAX_TOTAL_BLOCKS} blocks")));
        }

        let rs = ReedSolomon::new(data_blocks, parity_blocks).map_err(|e| invalid(e.to_string()))?;

        Ok(Self {
            rs,
            data_blocks,
            parity_blocks,
        })
    }

    /// Codec matching the stripe shape in an ECC header
    pub fn for_metadata(meta: &Metadata) -> Result<Self> {
        Self::new(meta.data_blocks(), meta.parity_blocks())
    }
}

impl ErasureCodec for ReedSolomonCodec {
    fn data_blocks(&self) -> usize {
        self.data_blocks
    }

    fn parity_blocks(&self) -> usize {
        self.parity_blocks
    }

    fn encode(&self, blocks: &mut [Vec<u8>]) -> std::result::Result<(), CodecError> {
        self.rs
            .encode(blocks)
            .map_err(|e| CodecError(format!("Reed-Solomon encoding failed: {e}")))
    }

    fn verify(&self, blocks: &[Vec<u8>]) -> std::result::Result<bool, CodecError> {
        self.rs
            .verify(blocks)
            .map_err(|e| CodecError(format!("Reed-Solomon verification failed: {e}")))
    }

    fn reconstruct(&self, blocks: &mut [Option<Vec<u8>>]) -> std::result::Result<(), CodecError> {
        self.rs
            .reconstruct(blocks)
            .map_err(|e| CodecError(format!("Reed-Solomon reconstruction failed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stripe(codec: &ReedSolomonCodec, len: usize) -> Vec<Vec<u8>> {
        let mut blocks: Vec<Vec<u8>> = (0..codec.data_blocks())
            .map(|i| (0..len).map(|j| (i * 31 + j) as u8).collect())
            .collect();
        blocks.extend((0..codec.parity_blocks()).map(|_| vec![0u8; len]));
        blocks
    }

    #[test]
    fn rejects_out_of_range_shapes() {
        assert!(ReedSolomonCodec::new(0, 1).is_err());
        assert!(ReedSolomonCodec::new(10, 0).is_err());
        assert!(ReedSolomonCodec::new(250, 7).is_err());
        assert!(ReedSolomonCodec::new(250, 6).is_ok());
    }

    #[test]
    fn encode_then_reconstruct_up_to_r_erasures() {
        let codec = ReedSolomonCodec::new(4, 2).unwrap();
        let mut blocks = stripe(&codec, 64);
        codec.encode(&mut blocks).unwrap();
        assert!(codec.verify(&blocks).unwrap());

        let mut damaged: Vec<Option<Vec<u8>>> = blocks.iter().cloned().map(Some).collect();
        damaged[1] = None;
        damaged[4] = None;
        codec.reconstruct(&mut damaged).unwrap();

        let restored: Vec<Vec<u8>> = damaged.into_iter().map(|b| b.unwrap()).collect();
        assert_eq!(restored, blocks);
    }

    #[test]
    fn too_many_erasures_fail() {
        let codec = ReedSolomonCodec::new(4, 1).unwrap();
        let mut blocks = stripe(&codec, 16);
        codec.encode(&mut blocks).unwrap();

        let mut damaged: Vec<Option<Vec<u8>>> = blocks.into_iter().map(Some).collect();
        damaged[0] = None;
        damaged[2] = None;
        assert!(codec.reconstruct(&mut damaged).is_err());
    }

    #[test]
    fn verify_detects_tampering() {
        let codec = ReedSolomonCodec::new(3, 1).unwrap();
        let mut blocks = stripe(&codec, 16);
        codec.encode(&mut blocks).unwrap();
        blocks[0][5] ^= 0xFF;
        assert!(!codec.verify(&blocks).unwrap());
    }
}

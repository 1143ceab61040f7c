//! Per-call staging buffers for one section
//!
//! A [`Stripe`] owns N + R block buffers that are reused from section to
//! section, plus a tag per slot saying where its bytes came from. Slots past
//! the end of a stream are zero-filled in their own buffer rather than
//! pointing at a shared zero block, and erased slots are only ever handed to
//! the codec as `None`.

use crate::codec::{CodecError, ErasureCodec};
use crate::domain::BlockKind;
use crate::metadata::Metadata;

/// Where a slot's bytes came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    /// Read from a stream or produced by the codec
    Present,
    /// Past the end of the stream; the buffer holds zeros
    ZeroFilled,
    /// Erased; excluded from reconstruction input
    Missing,
}

pub struct Stripe {
    blocks: Vec<Vec<u8>>,
    states: Vec<SlotState>,
    num_data: usize,
}

impl Stripe {
    pub fn new(num_data: usize, num_parity: usize, block_size: usize) -> Self {
        let total = num_data + num_parity;
        Self {
            blocks: vec![vec![0u8; block_size]; total],
            states: vec![SlotState::ZeroFilled; total],
            num_data,
        }
    }

    pub fn for_metadata(meta: &Metadata) -> Self {
        Self::new(meta.data_blocks(), meta.parity_blocks(), meta.block_len())
    }

    pub fn num_data(&self) -> usize {
        self.num_data
    }

    pub fn num_parity(&self) -> usize {
        self.blocks.len() - self.num_data
    }

    /// Slot position of a section-relative block offset
    pub fn slot(&self, kind: BlockKind, offset: usize) -> usize {
        match kind {
            BlockKind::Data => offset,
            BlockKind::Parity => self.num_data + offset,
        }
    }

    pub fn blocks(&self) -> &[Vec<u8>] {
        &self.blocks
    }

    pub fn data(&self) -> &[Vec<u8>] {
        &self.blocks[..self.num_data]
    }

    pub fn data_mut(&mut self) -> &mut [Vec<u8>] {
        &mut self.blocks[..self.num_data]
    }

    pub fn parity(&self) -> &[Vec<u8>] {
        &self.blocks[self.num_data..]
    }

    pub fn parity_mut(&mut self) -> &mut [Vec<u8>] {
        &mut self.blocks[self.num_data..]
    }

    pub fn state(&self, slot: usize) -> SlotState {
        self.states[slot]
    }

    /// Record that the first `count` data slots were read; zero the rest
    pub fn settle_data(&mut self, count: usize) {
        self.settle(0, self.num_data, count);
    }

    /// Record that the first `count` parity slots were read; zero the rest
    pub fn settle_parity(&mut self, count: usize) {
        self.settle(self.num_data, self.blocks.len(), count);
    }

    fn settle(&mut self, start: usize, end: usize, count: usize) {
        for slot in start..end {
            if slot - start < count {
                self.states[slot] = SlotState::Present;
            } else {
                self.blocks[slot].fill(0);
                self.states[slot] = SlotState::ZeroFilled;
            }
        }
    }

    /// Erase a slot ahead of [`reconstruct`](Self::reconstruct)
    pub fn mark_missing(&mut self, slot: usize) {
        self.states[slot] = SlotState::Missing;
    }

    pub fn missing_count(&self) -> usize {
        self.states
            .iter()
            .filter(|s| **s == SlotState::Missing)
            .count()
    }

    /// Fill the parity slots from the data slots
    pub fn encode(&mut self, codec: &dyn ErasureCodec) -> Result<(), CodecError> {
        codec.encode(&mut self.blocks)?;
        let num_data = self.num_data;
        self.states[num_data..].fill(SlotState::Present);
        Ok(())
    }

    pub fn verify(&self, codec: &dyn ErasureCodec) -> Result<bool, CodecError> {
        codec.verify(&self.blocks)
    }

    /// Rebuild every `Missing` slot
    ///
    /// The staged buffers are only replaced once the codec succeeds, so a
    /// failed reconstruction leaves the section exactly as it was read.
    pub fn reconstruct(&mut self, codec: &dyn ErasureCodec) -> Result<(), CodecError> {
        let mut shards: Vec<Option<Vec<u8>>> = self
            .blocks
            .iter()
            .zip(&self.states)
            .map(|(block, state)| match state {
                SlotState::Missing => None,
                _ => Some(block.clone()),
            })
            .collect();

        codec.reconstruct(&mut shards)?;

        for (slot, shard) in shards.into_iter().enumerate() {
            if self.states[slot] != SlotState::Missing {
                continue;
            }
            match shard {
                Some(rebuilt) if rebuilt.len() == self.blocks[slot].len() => {
                    self.blocks[slot] = rebuilt;
                    self.states[slot] = SlotState::Present;
                }
                _ => return Err(CodecError(format!("slot {slot} was not rebuilt"))),
            }
        }
        Ok(())
    }
}

//! Fixed-size block reader with zero padding on the final short block

use log::warn;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// Outcome of one [`ChunkedReader::read_next`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadBatch {
    /// Index of the last non-empty buffer + 1
    pub count: usize,
    /// Nothing at all could be read
    pub end_of_stream: bool,
}

impl ReadBatch {
    fn end() -> Self {
        Self {
            count: 0,
            end_of_stream: true,
        }
    }
}

/// Reads a stream as consecutive blocks, one batch of buffers at a time
///
/// The block size is the length of the buffers handed to
/// [`read_next`](Self::read_next); every buffer is either filled completely,
/// zero-padded after a short final read, or left untouched.
pub struct ChunkedReader<R: Read + Seek> {
    inner: R,
    blocks_read: u64,
}

impl<R: Read + Seek> ChunkedReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            blocks_read: 0,
        }
    }

    /// Read up to `buffers.len()` blocks
    ///
    /// - A short read zero-pads the rest of that buffer and ends the batch.
    /// - Failing on the first buffer (EOF or I/O error) reports end of stream.
    /// - An I/O error after at least one full buffer returns the partial batch;
    ///   buffers from `count` onward are not modified and the caller is
    ///   expected to zero them.
    pub fn read_next(&mut self, buffers: &mut [Vec<u8>]) -> ReadBatch {
        let mut count = 0;

        for (i, buffer) in buffers.iter_mut().enumerate() {
            match fill_buffer(&mut self.inner, buffer) {
                Ok(0) => break,
                Ok(filled) if filled < buffer.len() => {
                    buffer[filled..].fill(0);
                    count = i + 1;
                    break;
                }
                Ok(_) => count = i + 1,
                Err(e) => {
                    warn!("Read error after {} blocks: {}", self.blocks_read, e);
                    break;
                }
            }
        }

        if count == 0 {
            return ReadBatch::end();
        }

        self.blocks_read += count as u64;
        ReadBatch {
            count,
            end_of_stream: false,
        }
    }

    /// Advance the stream by `block_count` blocks without reading them
    pub fn skip_next(&mut self, block_count: usize, block_size: usize) -> io::Result<()> {
        let distance = block_count as i64 * block_size as i64;
        self.inner.seek(SeekFrom::Current(distance))?;
        self.blocks_read += block_count as u64;
        Ok(())
    }

    /// Blocks consumed so far, skipped ones included
    pub fn blocks_read(&self) -> u64 {
        self.blocks_read
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

/// Read until `buffer` is full or the stream ends, returning bytes filled
fn fill_buffer<R: Read>(reader: &mut R, buffer: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buffer.len() {
        match reader.read(&mut buffer[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

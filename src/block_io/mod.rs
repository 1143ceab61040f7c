//! Sequential block I/O shared by encode, scan and repair
//!
//! All three operations walk their streams strictly in section order, so the
//! readers here only ever move forward: either by reading a batch of blocks
//! or by skipping over blocks that are not needed.

mod reader;
mod writer;

pub use reader::{ChunkedReader, ReadBatch};
pub use writer::BlockWriter;

/// Buffer size for buffered ECC/CRC output (1MB)
pub const WRITE_BUFFER_CAPACITY: usize = 1024 * 1024;

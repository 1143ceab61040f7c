//! Core domain types for stripe coordinates and checksums
//!
//! Two coordinate systems exist for a block: the *global* index used by the
//! CLI (counting data blocks, or parity blocks, from the start of their file)
//! and the *section-relative* offset used by damage descriptors. These
//! newtypes keep the two apart so that a global index can never be used
//! where a section offset is expected.
//!
//! ## Type Safety Benefits
//!
//! - **SectionIndex**: Prevents mixing stripe numbers with block indices
//! - **GlobalBlockIndex**: Only convertible to a section offset through an explicit width
//! - **Crc32Value**: Prevents mixing CRC checksums with sizes/counts/other u32 values

/// Index of one stripe (N data blocks + R parity blocks) within the protected file
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SectionIndex(usize);

impl SectionIndex {
    pub fn new(index: usize) -> Self {
        SectionIndex(index)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }

    /// The section that follows this one
    pub fn next(&self) -> Self {
        SectionIndex(self.0 + 1)
    }
}

impl From<usize> for SectionIndex {
    fn from(index: usize) -> Self {
        SectionIndex::new(index)
    }
}

impl std::fmt::Display for SectionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which half of a stripe a block belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Data,
    Parity,
}

/// Type-safe wrapper for global block indices
///
/// Data blocks and parity blocks are numbered independently: global data
/// block `k` lives in section `k / N`, global parity block `k` in section
/// `k / R`. The width is therefore always supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GlobalBlockIndex(u64);

impl GlobalBlockIndex {
    pub fn new(index: u64) -> Self {
        GlobalBlockIndex(index)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Split into (section, section-relative offset) for a stripe of `width` blocks
    pub fn split(&self, width: usize) -> (SectionIndex, usize) {
        let width = width as u64;
        (
            SectionIndex((self.0 / width) as usize),
            (self.0 % width) as usize,
        )
    }

    /// Inverse of [`split`](Self::split)
    pub fn join(section: SectionIndex, offset: usize, width: usize) -> Self {
        GlobalBlockIndex(section.0 as u64 * width as u64 + offset as u64)
    }
}

impl From<u64> for GlobalBlockIndex {
    fn from(index: u64) -> Self {
        GlobalBlockIndex::new(index)
    }
}

impl std::fmt::Display for GlobalBlockIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type-safe wrapper for CRC32 checksum values
/// Prevents mixing CRC values with other u32 values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crc32Value(u32);

impl Crc32Value {
    pub fn new(value: u32) -> Self {
        Crc32Value(value)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    pub fn to_le_bytes(&self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Crc32Value(u32::from_le_bytes(bytes))
    }
}

impl From<u32> for Crc32Value {
    fn from(value: u32) -> Self {
        Crc32Value::new(value)
    }
}

impl PartialEq<u32> for Crc32Value {
    fn eq(&self, other: &u32) -> bool {
        self.0 == *other
    }
}

impl PartialEq<Crc32Value> for u32 {
    fn eq(&self, other: &Crc32Value) -> bool {
        *self == other.0
    }
}

impl std::fmt::Display for Crc32Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

//! Block-level Reed-Solomon protection for single files
//!
//! A data file is split into sections of N data blocks. Each section gets R
//! parity blocks (stored in an ECC file behind a 32-byte header) and N + R
//! CRC-32 records (stored in a checksum file). [`scan_file`] finds blocks
//! whose checksums no longer match and [`fast_repair`] rebuilds them.

pub mod args;
pub mod block_io;
pub mod checksum;
pub mod codec;
pub mod config;
pub mod damage;
pub mod domain;
pub mod encoder;
pub mod error;
pub mod metadata;
pub mod repair;
pub mod reporters;
pub mod scanner;
pub mod stripe;

pub use args::parse_args;
pub use codec::{ErasureCodec, ReedSolomonCodec};
pub use config::ProtectConfig;
pub use damage::{
    csv_to_damage, damage_to_csv, format_index_list, parse_index_list, DamageDescriptor,
    ListParseError,
};
pub use domain::{BlockKind, Crc32Value, GlobalBlockIndex, SectionIndex};
pub use encoder::{encode, encode_with_codec, EncodeSummary};
pub use error::{EccError, Result};
pub use metadata::{Metadata, HEADER_LEN};
pub use repair::{fast_repair, fast_repair_with_codec, RepairReport, SectionFailure};
pub use scanner::{scan_file, ScanReport, StreamFault};

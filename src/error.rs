//! Error types for encode, scan and repair operations

use crate::damage::ListParseError;
use crate::domain::SectionIndex;
use thiserror::Error;

/// Errors that abort an encode, scan or repair pass
///
/// Per-section outcomes that do not abort a pass (irreparable sections,
/// codec inconsistencies after reconstruction) are reported as values in
/// [`RepairReport`](crate::repair::RepairReport) instead.
#[derive(Debug, Error)]
pub enum EccError {
    /// ECC header could not be read or describes an impossible layout
    #[error("Invalid ECC metadata: {0}")]
    Metadata(String),

    /// Caller-supplied configuration is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Erasure codec could not be constructed for the requested stripe shape
    #[error("Cannot create erasure codec for {data}+{parity} blocks: {reason}")]
    Codec {
        data: usize,
        parity: usize,
        reason: String,
    },

    /// Codec produced parity that does not verify against its own input
    #[error("Codec self-check failed at section {section}: {reason}")]
    CodecInconsistency {
        section: SectionIndex,
        reason: String,
    },

    /// A stream ended earlier than its paired stream or parity data was short
    #[error("Stream error at section {section}: {reason}")]
    FatalStream {
        section: SectionIndex,
        reason: String,
    },

    /// Damage descriptors handed to the repair engine are malformed
    #[error("Invalid damage list: {0}")]
    InvalidDamage(String),

    /// Bracketed damage index list failed to parse
    #[error("Malformed damage index list: {0}")]
    ListParse(#[from] ListParseError),

    /// I/O error occurred (catch-all for reads/writes on the three streams)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Type alias for Result with EccError
pub type Result<T> = std::result::Result<T, EccError>;

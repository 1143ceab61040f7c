//! Data types for repair operations

use crate::domain::SectionIndex;
use thiserror::Error;

/// Why a damaged section could not be repaired
///
/// These never abort the pass; the section's data is written out exactly as
/// it was read and the next section is processed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SectionFailure {
    /// More blocks damaged than the section has parity blocks
    #[error("section {section}: {damaged} damaged blocks exceed the {recoverable} recoverable")]
    Irreparable {
        section: SectionIndex,
        damaged: usize,
        recoverable: usize,
    },
    /// Reconstruction failed or its result did not verify
    #[error("section {section}: reconstruction inconsistent: {reason}")]
    CodecInconsistency {
        section: SectionIndex,
        reason: String,
    },
}

impl SectionFailure {
    pub fn section(&self) -> SectionIndex {
        match self {
            SectionFailure::Irreparable { section, .. }
            | SectionFailure::CodecInconsistency { section, .. } => *section,
        }
    }
}

/// Result of a repair pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairReport {
    /// Sections whose data blocks were reconstructed and verified
    pub repaired: Vec<SectionIndex>,
    pub failures: Vec<SectionFailure>,
    /// Always equal to the header's file size once the pass completes
    pub bytes_written: u64,
}

impl RepairReport {
    /// Returns true if no damaged section was left unrepaired
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failed_sections(&self) -> Vec<SectionIndex> {
        self.failures.iter().map(SectionFailure::section).collect()
    }
}

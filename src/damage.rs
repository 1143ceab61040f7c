//! Damage descriptors and their compact textual form
//!
//! The scanner reports damage per section with section-relative block
//! offsets. Users see (and type) global block indices instead, as bracketed
//! lists such as `[1,15,69]`: one list for data blocks and one for parity
//! blocks. This module converts between the two.

use crate::domain::{BlockKind, GlobalBlockIndex, SectionIndex};
use crate::error::{EccError, Result};
use crate::metadata::Metadata;
use std::fmt::Write as _;
use thiserror::Error;

/// Blocks of one section that failed checksum verification
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DamageDescriptor {
    pub section: SectionIndex,
    /// Section-relative data block offsets, `0..N`
    pub data_damage: Vec<usize>,
    /// Section-relative parity block offsets, `0..R`
    pub ecc_damage: Vec<usize>,
}

impl DamageDescriptor {
    pub fn new(section: SectionIndex) -> Self {
        Self {
            section,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data_damage.is_empty() && self.ecc_damage.is_empty()
    }

    /// Total damaged blocks recorded for the section
    pub fn damaged_blocks(&self) -> usize {
        self.data_damage.len() + self.ecc_damage.len()
    }

    fn push(&mut self, kind: BlockKind, offset: usize) {
        match kind {
            BlockKind::Data => self.data_damage.push(offset),
            BlockKind::Parity => self.ecc_damage.push(offset),
        }
    }
}

/// Check descriptors before they drive a repair
///
/// Sections must be strictly increasing, every descriptor non-empty, and
/// offsets inside the stripe.
pub fn validate_descriptors(damages: &[DamageDescriptor], meta: &Metadata) -> Result<()> {
    let mut previous: Option<SectionIndex> = None;
    for desc in damages {
        if previous.is_some_and(|p| desc.section <= p) {
            return Err(EccError::InvalidDamage(format!(
                "section {} is out of order or repeated",
                desc.section
            )));
        }
        if desc.is_empty() {
            return Err(EccError::InvalidDamage(format!(
                "section {} lists no damaged blocks",
                desc.section
            )));
        }
        if let Some(bad) = desc.data_damage.iter().find(|&&d| d >= meta.data_blocks()) {
            return Err(EccError::InvalidDamage(format!(
                "data block offset {bad} in section {} exceeds stripe width {}",
                desc.section,
                meta.data_blocks()
            )));
        }
        if let Some(bad) = desc.ecc_damage.iter().find(|&&d| d >= meta.parity_blocks()) {
            return Err(EccError::InvalidDamage(format!(
                "parity block offset {bad} in section {} exceeds level {}",
                desc.section,
                meta.parity_blocks()
            )));
        }
        previous = Some(desc.section);
    }
    Ok(())
}

// ============================================================================
// Global indices <-> descriptors
// ============================================================================

/// Group sorted global indices into per-section descriptors
///
/// Both lists are walked together by implied section; when the next data
/// entry and the next parity entry fall in the same section the data entry
/// is taken first.
pub fn csv_to_damage(
    meta: &Metadata,
    data_indices: &[u64],
    ecc_indices: &[u64],
) -> Vec<DamageDescriptor> {
    let data_width = meta.data_blocks();
    let ecc_width = meta.parity_blocks();

    let locate = |index: u64, width: usize| GlobalBlockIndex::new(index).split(width);

    let mut damages: Vec<DamageDescriptor> = Vec::new();
    let mut current: Option<DamageDescriptor> = None;
    let (mut d, mut e) = (0, 0);

    while d < data_indices.len() || e < ecc_indices.len() {
        let next_data = data_indices.get(d).map(|&i| locate(i, data_width));
        let next_ecc = ecc_indices.get(e).map(|&i| locate(i, ecc_width));

        let (kind, (section, offset)) = match (next_data, next_ecc) {
            (Some(data), Some(ecc)) if data.0 <= ecc.0 => (BlockKind::Data, data),
            (Some(_), Some(ecc)) => (BlockKind::Parity, ecc),
            (Some(data), None) => (BlockKind::Data, data),
            (None, Some(ecc)) => (BlockKind::Parity, ecc),
            (None, None) => break,
        };
        match kind {
            BlockKind::Data => d += 1,
            BlockKind::Parity => e += 1,
        }

        match current.as_mut() {
            Some(desc) if desc.section == section => desc.push(kind, offset),
            _ => {
                damages.extend(current.take());
                let mut desc = DamageDescriptor::new(section);
                desc.push(kind, offset);
                current = Some(desc);
            }
        }
    }

    damages.extend(current);
    damages
}

/// Expand descriptors back to comma-joined global indices (data, parity)
pub fn damage_to_csv(damages: &[DamageDescriptor], meta: &Metadata) -> (String, String) {
    let (data, ecc) = damage_to_indices(damages, meta);
    (join_indices(&data), join_indices(&ecc))
}

/// Expand descriptors back to global indices (data, parity)
pub fn damage_to_indices(damages: &[DamageDescriptor], meta: &Metadata) -> (Vec<u64>, Vec<u64>) {
    let mut data = Vec::new();
    let mut ecc = Vec::new();
    for desc in damages {
        data.extend(desc.data_damage.iter().map(|&offset| {
            GlobalBlockIndex::join(desc.section, offset, meta.data_blocks()).as_u64()
        }));
        ecc.extend(desc.ecc_damage.iter().map(|&offset| {
            GlobalBlockIndex::join(desc.section, offset, meta.parity_blocks()).as_u64()
        }));
    }
    (data, ecc)
}

fn join_indices(indices: &[u64]) -> String {
    let mut out = String::new();
    for (i, index) in indices.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let _ = write!(out, "{index}");
    }
    out
}

// ============================================================================
// Bracketed list syntax
// ============================================================================

/// Why a bracketed index list was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListParseError {
    #[error("empty input")]
    Empty,

    #[error("list must be enclosed in '[' and ']'")]
    MissingBrackets,

    #[error("empty element at position {0}")]
    EmptyElement(usize),

    #[error("negative block index {0}")]
    Negative(String),

    #[error("'{0}' is not a block index")]
    NotANumber(String),
}

/// Parse `[1, 15, 69]` into block indices
///
/// Whitespace around numbers is ignored and `[]` is an empty list. Anything
/// else that is not a comma-separated run of non-negative integers is
/// rejected.
pub fn parse_index_list(text: &str) -> std::result::Result<Vec<u64>, ListParseError> {
    if text.is_empty() {
        return Err(ListParseError::Empty);
    }

    let inner = text
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or(ListParseError::MissingBrackets)?;

    if inner.is_empty() {
        return Ok(Vec::new());
    }

    inner
        .split(',')
        .enumerate()
        .map(|(position, token)| {
            let token = token.trim();
            if token.is_empty() {
                return Err(ListParseError::EmptyElement(position));
            }
            match token.parse::<i64>() {
                Ok(value) if value < 0 => Err(ListParseError::Negative(token.to_string())),
                Ok(value) => Ok(value as u64),
                Err(_) => Err(ListParseError::NotANumber(token.to_string())),
            }
        })
        .collect()
}

/// Render indices in the syntax [`parse_index_list`] accepts
pub fn format_index_list(indices: &[u64]) -> String {
    format!("[{}]", join_indices(indices))
}

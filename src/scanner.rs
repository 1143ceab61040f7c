//! Locating damaged blocks by recomputing checksums
//!
//! The data, ECC and checksum streams are walked in lock-step, one section at
//! a time. Every data and parity block is hashed and compared with its stored
//! CRC record; mismatches become [`DamageDescriptor`]s.

use crate::block_io::ChunkedReader;
use crate::checksum::{compute_crc32, ChecksumReader};
use crate::damage::{damage_to_indices, DamageDescriptor};
use crate::domain::{Crc32Value, GlobalBlockIndex, SectionIndex};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::stripe::Stripe;
use log::{debug, warn};
use std::io::{Read, Seek};

/// Stream-level problem found while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamFault {
    /// One block stream ended before the other; the scan kept going
    Desynchronized {
        section: SectionIndex,
        data_ended: bool,
    },
    /// Fewer than R parity blocks were available; the scan stopped
    ShortParity {
        section: SectionIndex,
        blocks_read: usize,
        expected: usize,
    },
    /// The checksum stream ran out; the scan stopped
    ShortChecksums {
        section: SectionIndex,
        records_read: usize,
        expected: usize,
    },
}

impl std::fmt::Display for StreamFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamFault::Desynchronized {
                section,
                data_ended: true,
            } => write!(f, "data file ended before the ECC file at section {section}"),
            StreamFault::Desynchronized { section, .. } => {
                write!(f, "ECC file ended before the data file at section {section}")
            }
            StreamFault::ShortParity {
                section,
                blocks_read,
                expected,
            } => write!(
                f,
                "insufficient parity data at section {section}: read {blocks_read} of {expected} blocks"
            ),
            StreamFault::ShortChecksums {
                section,
                records_read,
                expected,
            } => write!(
                f,
                "checksum file ended at section {section}: read {records_read} of {expected} records"
            ),
        }
    }
}

/// Result of a scan pass
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    /// One entry per damaged section, strictly increasing
    pub damages: Vec<DamageDescriptor>,
    pub faults: Vec<StreamFault>,
    pub sections_scanned: usize,
}

impl ScanReport {
    /// Any stream fault makes the damage list untrustworthy for repair
    pub fn is_fatal(&self) -> bool {
        !self.faults.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.damages.is_empty() && self.faults.is_empty()
    }

    /// Damaged blocks as global (data, parity) indices
    pub fn damaged_indices(&self, meta: &Metadata) -> (Vec<u64>, Vec<u64>) {
        damage_to_indices(&self.damages, meta)
    }
}

/// Scan `data` against its ECC and checksum companions
///
/// `metadata_override` skips reading the header from `ecc`; the stream must
/// then already be positioned after it. A header that cannot be read is an
/// error; stream faults are reported in the returned [`ScanReport`].
pub fn scan_file<D, E, C>(
    metadata_override: Option<&Metadata>,
    data: D,
    mut ecc: E,
    crc: C,
) -> Result<ScanReport>
where
    D: Read + Seek,
    E: Read + Seek,
    C: Read,
{
    let meta = Metadata::resolve(metadata_override, &mut ecc)?;
    let num_data = meta.data_blocks();
    let num_parity = meta.parity_blocks();

    let mut data_reader = ChunkedReader::new(data);
    let mut ecc_reader = ChunkedReader::new(ecc);
    let mut crc_reader = ChecksumReader::new(crc);

    let mut stripe = Stripe::for_metadata(&meta);
    let mut expected = vec![Crc32Value::new(0); meta.total_blocks()];
    let mut report = ScanReport::default();
    let mut section = SectionIndex::new(0);

    loop {
        let data_batch = data_reader.read_next(stripe.data_mut());
        let ecc_batch = ecc_reader.read_next(stripe.parity_mut());

        if data_batch.end_of_stream && ecc_batch.end_of_stream {
            break;
        }

        if data_batch.end_of_stream != ecc_batch.end_of_stream
            && !report
                .faults
                .iter()
                .any(|f| matches!(f, StreamFault::Desynchronized { .. }))
        {
            let fault = StreamFault::Desynchronized {
                section,
                data_ended: data_batch.end_of_stream,
            };
            warn!("File read error: {}", fault);
            report.faults.push(fault);
        }

        stripe.settle_data(data_batch.count);

        if ecc_batch.count < num_parity {
            let fault = StreamFault::ShortParity {
                section,
                blocks_read: ecc_batch.count,
                expected: num_parity,
            };
            warn!("ECC read error: {}", fault);
            report.faults.push(fault);
            break;
        }
        stripe.settle_parity(num_parity);

        let records = match crc_reader.read_next(&mut expected) {
            Ok(records) => records,
            Err(e) => {
                warn!("Checksum read error at section {}: {}", section, e);
                0
            }
        };
        if records < expected.len() {
            let fault = StreamFault::ShortChecksums {
                section,
                records_read: records,
                expected: expected.len(),
            };
            warn!("Checksum read error: {}", fault);
            report.faults.push(fault);
            break;
        }

        let mut damage = DamageDescriptor::new(section);

        for (offset, block) in stripe.data().iter().enumerate() {
            let actual = compute_crc32(block);
            if actual != expected[offset] {
                warn!(
                    "Data block {} damaged, has crc {}, expected {}",
                    GlobalBlockIndex::join(section, offset, num_data),
                    actual,
                    expected[offset]
                );
                damage.data_damage.push(offset);
            }
        }

        for (offset, block) in stripe.parity().iter().enumerate() {
            let actual = compute_crc32(block);
            if actual != expected[num_data + offset] {
                warn!(
                    "ECC block {} damaged, has crc {}, expected {}",
                    GlobalBlockIndex::join(section, offset, num_parity),
                    actual,
                    expected[num_data + offset]
                );
                damage.ecc_damage.push(offset);
            }
        }

        if !damage.is_empty() {
            report.damages.push(damage);
        }
        section = section.next();
    }

    report.sections_scanned = section.as_usize();
    if report.sections_scanned != meta.num_sections() {
        debug!(
            "Scanned {} sections, header describes {}",
            report.sections_scanned,
            meta.num_sections()
        );
    }

    Ok(report)
}

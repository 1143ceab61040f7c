//! Rewriting a data file with damaged blocks reconstructed
//!
//! Repair consumes the damage descriptors produced by a scan (or typed in by
//! hand) and streams the data file section by section into a fresh output.
//! Only sections named by a descriptor touch the ECC stream; every other
//! section skips over its parity blocks. Whatever happens to a section, its
//! data blocks are written out, so the output always has the length recorded
//! in the header.

mod types;

pub use types::{RepairReport, SectionFailure};

use crate::block_io::{ChunkedReader, WRITE_BUFFER_CAPACITY};
use crate::codec::{ErasureCodec, ReedSolomonCodec};
use crate::damage::{validate_descriptors, DamageDescriptor};
use crate::domain::{BlockKind, SectionIndex};
use crate::error::{EccError, Result};
use crate::metadata::Metadata;
use crate::stripe::Stripe;
use log::{debug, info, warn};
use std::collections::BTreeSet;
use std::io::{BufWriter, Read, Seek, Write};

/// Repair `data` into `output` using a Reed-Solomon codec sized from the header
///
/// `metadata_override` skips reading the header from `ecc`, which must then
/// already be positioned right after it.
pub fn fast_repair<W, D, E>(
    metadata_override: Option<&Metadata>,
    output: W,
    data: D,
    mut ecc: E,
    damages: &[DamageDescriptor],
) -> Result<RepairReport>
where
    W: Write,
    D: Read + Seek,
    E: Read + Seek,
{
    let meta = Metadata::resolve(metadata_override, &mut ecc)?;
    let codec = ReedSolomonCodec::for_metadata(&meta)?;
    repair_stream(&meta, &codec, output, data, ecc, damages)
}

/// Repair with a caller-supplied codec
pub fn fast_repair_with_codec<W, D, E>(
    metadata_override: Option<&Metadata>,
    codec: &dyn ErasureCodec,
    output: W,
    data: D,
    mut ecc: E,
    damages: &[DamageDescriptor],
) -> Result<RepairReport>
where
    W: Write,
    D: Read + Seek,
    E: Read + Seek,
{
    let meta = Metadata::resolve(metadata_override, &mut ecc)?;
    repair_stream(&meta, codec, output, data, ecc, damages)
}

fn repair_stream<W, D, E>(
    meta: &Metadata,
    codec: &dyn ErasureCodec,
    output: W,
    data: D,
    ecc: E,
    damages: &[DamageDescriptor],
) -> Result<RepairReport>
where
    W: Write,
    D: Read + Seek,
    E: Read + Seek,
{
    validate_descriptors(damages, meta)?;
    if codec.data_blocks() != meta.data_blocks() || codec.parity_blocks() != meta.parity_blocks() {
        return Err(EccError::Codec {
            data: codec.data_blocks(),
            parity: codec.parity_blocks(),
            reason: format!(
                "codec shape does not match header ({}+{})",
                meta.num_data, meta.num_recovery
            ),
        });
    }

    let num_sections = meta.num_sections();
    for stale in damages
        .iter()
        .filter(|d| d.section.as_usize() >= num_sections)
    {
        warn!(
            "Ignoring damage for section {}; the file only has {} sections",
            stale.section, num_sections
        );
    }

    let block_size = meta.block_len();
    let num_parity = meta.parity_blocks();

    let mut data_reader = ChunkedReader::new(data);
    let mut ecc_reader = ChunkedReader::new(ecc);
    let mut out = BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, output);

    let mut stripe = Stripe::for_metadata(meta);
    let mut pending = damages.iter().peekable();
    let mut report = RepairReport::default();
    let mut remaining = meta.file_size;
    let mut data_short = false;

    debug!(
        "Repairing {} sections with {} damaged",
        num_sections,
        damages.len()
    );

    for s in 0..num_sections {
        let section = SectionIndex::new(s);

        let batch = data_reader.read_next(stripe.data_mut());
        let blocks_expected = remaining
            .div_ceil(block_size as u64)
            .min(meta.data_blocks() as u64) as usize;
        if batch.count < blocks_expected && !data_short {
            warn!(
                "Data file ends early at section {}; missing blocks are treated as zeros",
                section
            );
            data_short = true;
        }
        stripe.settle_data(batch.count);

        match pending.next_if(|d| d.section == section) {
            Some(damage) => {
                let ecc_batch = ecc_reader.read_next(stripe.parity_mut());
                if ecc_batch.count < num_parity {
                    return Err(EccError::FatalStream {
                        section,
                        reason: format!(
                            "read {} of {} parity blocks",
                            ecc_batch.count, num_parity
                        ),
                    });
                }
                stripe.settle_parity(num_parity);
                repair_section(&mut stripe, codec, damage, &mut report);
            }
            None => ecc_reader.skip_next(num_parity, block_size)?,
        }

        remaining -= write_section(&mut out, stripe.data(), remaining)?;
    }

    out.flush()?;
    report.bytes_written = meta.file_size - remaining;

    info!(
        "Repair finished: {} sections repaired, {} failed",
        report.repaired.len(),
        report.failures.len()
    );
    Ok(report)
}

/// Rebuild the damaged blocks of one staged section
///
/// On any failure the staged data blocks are left as they were read.
fn repair_section(
    stripe: &mut Stripe,
    codec: &dyn ErasureCodec,
    damage: &DamageDescriptor,
    report: &mut RepairReport,
) {
    let section = damage.section;
    if damage.data_damage.is_empty() {
        debug!("Section {} has only parity damage, nothing to rebuild", section);
        return;
    }

    let data_slots: BTreeSet<usize> = damage.data_damage.iter().copied().collect();
    let ecc_slots: BTreeSet<usize> = damage.ecc_damage.iter().copied().collect();
    let damaged = data_slots.len() + ecc_slots.len();
    let recoverable = stripe.num_parity();

    if damaged > recoverable {
        warn!(
            "Too many errors in section {} ({} damaged, {} recoverable), leaving it untouched",
            section, damaged, recoverable
        );
        report.failures.push(SectionFailure::Irreparable {
            section,
            damaged,
            recoverable,
        });
        return;
    }

    let as_read = stripe.data().to_vec();
    for &offset in &data_slots {
        stripe.mark_missing(stripe.slot(BlockKind::Data, offset));
    }
    for &offset in &ecc_slots {
        stripe.mark_missing(stripe.slot(BlockKind::Parity, offset));
    }

    let outcome = stripe
        .reconstruct(codec)
        .and_then(|()| stripe.verify(codec))
        .map_err(|e| e.to_string())
        .and_then(|valid| {
            if valid {
                Ok(())
            } else {
                Err("rebuilt stripe does not verify".to_string())
            }
        });

    match outcome {
        Ok(()) => {
            info!("Repaired section {}", section);
            report.repaired.push(section);
        }
        Err(reason) => {
            warn!("Could not repair section {}: {}", section, reason);
            stripe.data_mut().clone_from_slice(&as_read);
            report
                .failures
                .push(SectionFailure::CodecInconsistency { section, reason });
        }
    }
}

/// Write staged data blocks, stopping after `remaining` bytes
fn write_section<W: Write>(out: &mut W, blocks: &[Vec<u8>], remaining: u64) -> Result<u64> {
    let mut written = 0u64;
    for block in blocks {
        let left = remaining - written;
        if left == 0 {
            break;
        }
        let take = (block.len() as u64).min(left) as usize;
        out.write_all(&block[..take])?;
        written += take as u64;
    }
    Ok(written)
}

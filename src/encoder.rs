//! Producing the ECC and checksum companions for a data file

use crate::block_io::{BlockWriter, ChunkedReader};
use crate::checksum::compute_block_crcs;
use crate::codec::{ErasureCodec, ReedSolomonCodec};
use crate::domain::SectionIndex;
use crate::error::{EccError, Result};
use crate::metadata::Metadata;
use crate::stripe::Stripe;
use log::{debug, info};
use std::io::{Read, Seek, Write};

/// What an encode pass produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSummary {
    pub sections: usize,
    pub data_blocks_read: u64,
}

/// Encode `data` into `ecc_out` / `crc_out` with a Reed-Solomon codec sized from `meta`
///
/// Returns the flushed output writers alongside the summary so callers can
/// persist them (e.g. `File::sync_all`).
pub fn encode<R, E, C>(
    meta: &Metadata,
    data: R,
    ecc_out: E,
    crc_out: C,
) -> Result<(EncodeSummary, E, C)>
where
    R: Read + Seek,
    E: Write,
    C: Write,
{
    meta.validate()?;
    let codec = ReedSolomonCodec::for_metadata(meta)?;
    encode_with_codec(meta, &codec, data, ecc_out, crc_out)
}

/// Encode with a caller-supplied codec
///
/// Any write failure aborts immediately; whatever was already written stays
/// in the outputs.
pub fn encode_with_codec<R, E, C>(
    meta: &Metadata,
    codec: &dyn ErasureCodec,
    data: R,
    ecc_out: E,
    crc_out: C,
) -> Result<(EncodeSummary, E, C)>
where
    R: Read + Seek,
    E: Write,
    C: Write,
{
    meta.validate()?;
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

    let mut writer = BlockWriter::new(ecc_out, crc_out);
    writer.write_metadata(meta)?;

    let mut reader = ChunkedReader::new(data);
    let mut stripe = Stripe::for_metadata(meta);
    let mut section = SectionIndex::new(0);

    debug!(
        "Encoding {} bytes as {} sections of {}+{} blocks ({} bytes each)",
        meta.file_size,
        meta.num_sections(),
        meta.num_data,
        meta.num_recovery,
        meta.block_size
    );

    loop {
        let batch = reader.read_next(stripe.data_mut());
        if batch.end_of_stream {
            break;
        }
        stripe.settle_data(batch.count);

        stripe
            .encode(codec)
            .map_err(|e| EccError::CodecInconsistency {
                section,
                reason: e.to_string(),
            })?;

        // Guards against codec defects, not storage corruption
        match stripe.verify(codec) {
            Ok(true) => {}
            Ok(false) => {
                return Err(EccError::CodecInconsistency {
                    section,
                    reason: "freshly encoded parity does not verify".to_string(),
                })
            }
            Err(e) => {
                return Err(EccError::CodecInconsistency {
                    section,
                    reason: e.to_string(),
                })
            }
        }

        writer.write_parity(stripe.parity())?;
        writer.write_checksums(&compute_block_crcs(stripe.blocks()))?;
        section = section.next();
    }

    let sections = writer.sections_written() as usize;
    let (ecc_out, crc_out) = writer.finish()?;

    info!(
        "Encoded {} sections ({} data blocks read)",
        sections,
        reader.blocks_read()
    );

    Ok((
        EncodeSummary {
            sections,
            data_blocks_read: reader.blocks_read(),
        },
        ecc_out,
        crc_out,
    ))
}

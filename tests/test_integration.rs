//! End-to-end encode -> corrupt -> scan -> repair tests on real files

use eccguard::metadata::HEADER_LEN;
use eccguard::{
    encode, fast_repair, scan_file, DamageDescriptor, Metadata, ProtectConfig, SectionFailure,
    SectionIndex, StreamFault,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const BLOCK: u64 = 4096;

struct Fixture {
    _dir: TempDir,
    data: PathBuf,
    ecc: PathBuf,
    crc: PathBuf,
    out: PathBuf,
    original: Vec<u8>,
}

/// Write `size` random bytes and protect them with `level` parity blocks per section
fn protected_file(size: usize, level: u16, seed: u64) -> Fixture {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("payload.bin");
    let ecc = dir.path().join("payload.bin.ecc");
    let crc = dir.path().join("payload.bin.ecc.crc");
    let out = dir.path().join("repaired.bin");

    let mut rng = StdRng::seed_from_u64(seed);
    let mut original = vec![0u8; size];
    rng.fill(&mut original[..]);
    fs::write(&data, &original).unwrap();

    let config = ProtectConfig::new(BLOCK as u32, 10, level);
    let meta = Metadata::from_config(size as u64, &config);
    let (_, ecc_file, crc_file) = encode(
        &meta,
        BufReader::new(File::open(&data).unwrap()),
        File::create(&ecc).unwrap(),
        File::create(&crc).unwrap(),
    )
    .unwrap();
    ecc_file.sync_all().unwrap();
    crc_file.sync_all().unwrap();

    Fixture {
        _dir: dir,
        data,
        ecc,
        crc,
        out,
        original,
    }
}

fn flip_byte(path: &Path, offset: u64) {
    let mut file = OpenOptions::new().read(true).write(true).open(path).unwrap();
    let current = fs::read(path).unwrap()[offset as usize];
    file.seek(SeekFrom::Start(offset)).unwrap();
    file.write_all(&[!current]).unwrap();
}

fn open(path: &Path) -> BufReader<File> {
    BufReader::new(File::open(path).unwrap())
}

fn scan(fx: &Fixture) -> eccguard::ScanReport {
    scan_file(None, open(&fx.data), open(&fx.ecc), open(&fx.crc)).unwrap()
}

fn repair(fx: &Fixture, damages: &[DamageDescriptor]) -> eccguard::RepairReport {
    let mut out = File::create(&fx.out).unwrap();
    fast_repair(None, &mut out, open(&fx.data), open(&fx.ecc), damages).unwrap()
}

// =============================================================================
// Clean round trips
// =============================================================================

#[test]
fn untouched_files_scan_clean_for_assorted_sizes() {
    for (seed, size) in [103usize, 40_960, 409_600, 409_603, 409_600 + 4096]
        .into_iter()
        .enumerate()
    {
        let fx = protected_file(size, 1, seed as u64);
        let report = scan(&fx);
        assert!(report.is_clean(), "size {size}: {:?}", report);

        let meta = Metadata::read_from(&mut open(&fx.ecc)).unwrap();
        assert_eq!(fs::metadata(&fx.ecc).unwrap().len(), meta.expected_ecc_len());
        assert_eq!(fs::metadata(&fx.crc).unwrap().len(), meta.expected_crc_len());
        assert_eq!(report.sections_scanned, meta.num_sections());
    }
}

#[test]
fn repair_without_damage_copies_file_exactly() {
    let fx = protected_file(409_603, 2, 11);
    let report = repair(&fx, &[]);
    assert!(report.is_success());
    assert!(report.repaired.is_empty());
    assert_eq!(fs::read(&fx.out).unwrap(), fx.original);
}

// =============================================================================
// Data damage
// =============================================================================

#[test]
fn small_file_single_byte_flip() {
    let fx = protected_file(103, 1, 7);
    flip_byte(&fx.data, 100);

    let report = scan(&fx);
    assert_eq!(
        report.damages,
        vec![DamageDescriptor {
            section: SectionIndex::new(0),
            data_damage: vec![0],
            ecc_damage: vec![],
        }]
    );

    let result = repair(&fx, &report.damages);
    assert!(result.is_success());
    assert_eq!(result.repaired, vec![SectionIndex::new(0)]);
    assert_eq!(fs::read(&fx.out).unwrap(), fx.original);
}

#[test]
fn flips_within_one_block_are_one_damaged_block() {
    let fx = protected_file(409_603, 1, 3);
    for offset in [36_978, 36_999, 40_000] {
        flip_byte(&fx.data, offset);
    }

    let report = scan(&fx);
    assert_eq!(report.damages.len(), 1);
    assert_eq!(report.damages[0].data_damage, vec![9]);

    let result = repair(&fx, &report.damages);
    assert!(result.is_success());
    assert_eq!(fs::read(&fx.out).unwrap(), fx.original);
}

#[test]
fn damage_in_several_sections_is_repaired_independently() {
    let fx = protected_file(409_600 + 4096, 1, 5);
    for offset in [36_978, 368_640, 368_840, 409_700] {
        flip_byte(&fx.data, offset);
    }

    let report = scan(&fx);
    let sections: Vec<usize> = report.damages.iter().map(|d| d.section.as_usize()).collect();
    assert_eq!(sections, vec![0, 9, 10]);

    let result = repair(&fx, &report.damages);
    assert!(result.is_success());
    assert_eq!(result.repaired.len(), 3);
    assert_eq!(fs::read(&fx.out).unwrap(), fx.original);
}

#[test]
fn random_damage_up_to_level_is_always_repaired() {
    let level = 3u16;
    let fx = protected_file(250_000, level, 99);
    let mut rng = StdRng::seed_from_u64(1234);
    let section_bytes = 10 * BLOCK;

    // Damage `level` distinct blocks inside section 2
    let mut blocks: Vec<u64> = Vec::new();
    while blocks.len() < level as usize {
        let block = rng.random_range(0..10u64);
        if !blocks.contains(&block) {
            blocks.push(block);
        }
    }
    for block in &blocks {
        let offset = 2 * section_bytes + block * BLOCK + rng.random_range(0..BLOCK);
        flip_byte(&fx.data, offset);
    }

    let report = scan(&fx);
    assert_eq!(report.damages.len(), 1);
    assert_eq!(report.damages[0].data_damage.len(), level as usize);

    let result = repair(&fx, &report.damages);
    assert!(result.is_success());
    assert_eq!(fs::read(&fx.out).unwrap(), fx.original);
}

#[test]
fn too_many_damaged_blocks_leave_section_untouched() {
    let fx = protected_file(409_600, 1, 21);
    flip_byte(&fx.data, 100); // section 0, block 0
    flip_byte(&fx.data, 5000); // section 0, block 1
    flip_byte(&fx.data, 200_000); // section 4, block 8
    let damaged = fs::read(&fx.data).unwrap();

    let report = scan(&fx);
    assert_eq!(report.damages.len(), 2);

    let result = repair(&fx, &report.damages);
    assert!(!result.is_success());
    assert_eq!(result.repaired, vec![SectionIndex::new(4)]);
    assert!(matches!(
        result.failures.as_slice(),
        [SectionFailure::Irreparable { section, damaged: 2, recoverable: 1 }]
            if section.as_usize() == 0
    ));

    let out = fs::read(&fx.out).unwrap();
    let section_bytes = (10 * BLOCK) as usize;
    assert_eq!(&out[..section_bytes], &damaged[..section_bytes]);
    assert_eq!(&out[section_bytes..], &fx.original[section_bytes..]);
}

// =============================================================================
// ECC damage
// =============================================================================

#[test]
fn ecc_only_damage_needs_no_repair() {
    let fx = protected_file(409_603, 1, 8);
    for offset in [1, 128, 3096, 8192, 8200, 11_111] {
        flip_byte(&fx.ecc, HEADER_LEN + offset);
    }

    let report = scan(&fx);
    assert!(!report.is_fatal());
    let meta = Metadata::read_from(&mut open(&fx.ecc)).unwrap();
    let (data, ecc) = report.damaged_indices(&meta);
    assert!(data.is_empty());
    assert_eq!(ecc, vec![0, 2]);

    let result = repair(&fx, &report.damages);
    assert!(result.is_success());
    assert!(result.repaired.is_empty());
    assert_eq!(fs::read(&fx.out).unwrap(), fx.original);
}

#[test]
fn data_and_parity_damage_together_within_level() {
    let fx = protected_file(409_600, 2, 13);
    flip_byte(&fx.data, 3 * 10 * BLOCK + 17);
    flip_byte(&fx.ecc, HEADER_LEN + (3 * 2 + 1) * BLOCK + 5);

    let report = scan(&fx);
    assert_eq!(
        report.damages,
        vec![DamageDescriptor {
            section: SectionIndex::new(3),
            data_damage: vec![0],
            ecc_damage: vec![1],
        }]
    );

    let result = repair(&fx, &report.damages);
    assert!(result.is_success());
    assert_eq!(result.repaired, vec![SectionIndex::new(3)]);
    assert_eq!(fs::read(&fx.out).unwrap(), fx.original);
}

// =============================================================================
// Truncation and stream faults
// =============================================================================

#[test]
fn output_length_matches_header_for_partial_last_block() {
    // 3 full sections plus a single partial block
    let size = 3 * 10 * BLOCK as usize + 1234;
    let fx = protected_file(size, 1, 4);
    flip_byte(&fx.data, size as u64 - 1);

    let report = scan(&fx);
    assert_eq!(report.damages.len(), 1);
    assert_eq!(report.damages[0].section, SectionIndex::new(3));

    let result = repair(&fx, &report.damages);
    assert!(result.is_success());
    assert_eq!(result.bytes_written, size as u64);
    assert_eq!(fs::metadata(&fx.out).unwrap().len(), size as u64);
    assert_eq!(fs::read(&fx.out).unwrap(), fx.original);
}

#[test]
fn truncated_data_file_is_reported_as_desynchronized() {
    let fx = protected_file(409_600, 1, 17);
    let file = OpenOptions::new().write(true).open(&fx.data).unwrap();
    file.set_len(100_000).unwrap();

    let report = scan(&fx);
    assert!(report.is_fatal());
    assert!(report
        .faults
        .iter()
        .any(|f| matches!(f, StreamFault::Desynchronized { data_ended: true, .. })));
    // Section 2 holds the cut, sections 3.. read nothing at all
    assert!(report.damages.len() > 1);
    assert_eq!(report.damages[0].section, SectionIndex::new(2));
}

#[test]
fn truncated_ecc_file_is_fatal() {
    let fx = protected_file(409_600, 1, 19);
    let file = OpenOptions::new().write(true).open(&fx.ecc).unwrap();
    file.set_len(HEADER_LEN + 4 * BLOCK + 10).unwrap();

    let report = scan(&fx);
    assert!(report.is_fatal());
    assert!(matches!(
        report.faults.last(),
        Some(StreamFault::ShortParity { .. })
    ));
}

#[test]
fn corrupt_header_is_an_error() {
    let fx = protected_file(40_960, 1, 23);
    // zero the recovery count field
    let mut ecc = fs::read(&fx.ecc).unwrap();
    ecc[14] = 0;
    ecc[15] = 0;
    fs::write(&fx.ecc, &ecc).unwrap();

    let result = scan_file(None, open(&fx.data), open(&fx.ecc), open(&fx.crc));
    assert!(matches!(result, Err(eccguard::EccError::Metadata(_))));
}

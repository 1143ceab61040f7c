//! Console reporter
//!
//! Damaged blocks are printed as bracketed global index lists so a scan's
//! output can be pasted straight into `repair --data-damage`.

use super::{EncodeReporter, RepairReporter, Reporter, ScanReporter};
use crate::damage::format_index_list;
use crate::encoder::EncodeSummary;
use crate::metadata::Metadata;
use crate::repair::RepairReport;
use crate::scanner::ScanReport;
use std::path::Path;

#[derive(Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for ConsoleReporter {
    fn report_error(&self, error: &str) {
        eprintln!("Error: {}", error);
    }

    fn report_complete(&self, message: &str) {
        println!("{}", message);
    }
}

fn print_layout(meta: &Metadata) {
    println!(
        "The file is {} bytes in {} sections of {} data + {} ECC blocks.",
        meta.file_size,
        meta.num_sections(),
        meta.num_data,
        meta.num_recovery
    );
    println!("The block size used was {} bytes.", meta.block_size);
}

impl EncodeReporter for ConsoleReporter {
    fn report_encode_start(&self, data: &Path, meta: &Metadata) {
        println!("Protecting: \"{}\"", data.display());
        print_layout(meta);
    }

    fn report_encode_results(&self, summary: &EncodeSummary, ecc: &Path, crc: &Path) {
        println!(
            "Encoded {} sections ({} data blocks).",
            summary.sections, summary.data_blocks_read
        );
        println!("ECC file: \"{}\"", ecc.display());
        println!("Checksum file: \"{}\"", crc.display());
    }
}

impl ScanReporter for ConsoleReporter {
    fn report_scan_start(&self, data: &Path, meta: &Metadata) {
        println!("Scanning: \"{}\"", data.display());
        print_layout(meta);
    }

    fn report_scan_results(&self, report: &ScanReport, meta: &Metadata) {
        for fault in &report.faults {
            eprintln!("Stream fault: {}", fault);
        }

        if report.damages.is_empty() {
            if report.is_fatal() {
                println!("No damaged blocks found before the scan stopped.");
            } else {
                println!("All {} sections are intact.", report.sections_scanned);
            }
            return;
        }

        let (data, ecc) = report.damaged_indices(meta);
        println!(
            "{} of {} sections are damaged.",
            report.damages.len(),
            report.sections_scanned
        );
        println!("Damaged data blocks: {}", format_index_list(&data));
        println!("Damaged ECC blocks: {}", format_index_list(&ecc));
    }
}

impl RepairReporter for ConsoleReporter {
    fn report_repair_start(&self, data: &Path, output: &Path, damaged_sections: usize) {
        println!(
            "Repairing \"{}\" into \"{}\" ({} damaged sections).",
            data.display(),
            output.display(),
            damaged_sections
        );
    }

    fn report_repair_results(&self, report: &RepairReport) {
        for failure in &report.failures {
            eprintln!("Repair failed for {}", failure);
        }
        if report.is_success() {
            println!(
                "Repair complete: {} sections repaired, {} bytes written.",
                report.repaired.len(),
                report.bytes_written
            );
        } else {
            println!(
                "Repair is not possible for {} sections ({} repaired).",
                report.failures.len(),
                report.repaired.len()
            );
        }
    }
}

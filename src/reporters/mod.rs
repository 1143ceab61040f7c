//! Progress and output reporting for encode, scan and repair
//!
//! The library returns plain report values; these traits turn them into user
//! facing output so the binary can swap console output for silence.

mod console;
mod silent;

pub use console::ConsoleReporter;
pub use silent::SilentReporter;

use crate::encoder::EncodeSummary;
use crate::metadata::Metadata;
use crate::repair::RepairReport;
use crate::scanner::ScanReport;
use std::path::Path;

/// Base trait for all reporters
pub trait Reporter {
    /// Report an error that occurred during operation
    fn report_error(&self, error: &str);

    /// Report successful completion of an operation
    fn report_complete(&self, message: &str);
}

pub trait EncodeReporter: Reporter {
    /// Report the layout about to be written
    fn report_encode_start(&self, data: &Path, meta: &Metadata);

    fn report_encode_results(&self, summary: &EncodeSummary, ecc: &Path, crc: &Path);
}

pub trait ScanReporter: Reporter {
    fn report_scan_start(&self, data: &Path, meta: &Metadata);

    /// Report damaged blocks and stream faults
    fn report_scan_results(&self, report: &ScanReport, meta: &Metadata);
}

pub trait RepairReporter: Reporter {
    /// Report starting repair with the number of sections named as damaged
    fn report_repair_start(&self, data: &Path, output: &Path, damaged_sections: usize);

    fn report_repair_results(&self, report: &RepairReport);
}

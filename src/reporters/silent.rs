//! Silent reporter for tests and `--quiet`

use super::{EncodeReporter, RepairReporter, Reporter, ScanReporter};
use crate::encoder::EncodeSummary;
use crate::metadata::Metadata;
use crate::repair::RepairReport;
use crate::scanner::ScanReport;
use std::path::Path;

#[derive(Default)]
pub struct SilentReporter;

impl SilentReporter {
    pub fn new() -> Self {
        Self
    }
}

impl Reporter for SilentReporter {
    fn report_error(&self, _error: &str) {}
    fn report_complete(&self, _message: &str) {}
}

impl EncodeReporter for SilentReporter {
    fn report_encode_start(&self, _data: &Path, _meta: &Metadata) {}
    fn report_encode_results(&self, _summary: &EncodeSummary, _ecc: &Path, _crc: &Path) {}
}

impl ScanReporter for SilentReporter {
    fn report_scan_start(&self, _data: &Path, _meta: &Metadata) {}
    fn report_scan_results(&self, _report: &ScanReport, _meta: &Metadata) {}
}

impl RepairReporter for SilentReporter {
    fn report_repair_start(&self, _data: &Path, _output: &Path, _damaged_sections: usize) {}
    fn report_repair_results(&self, _report: &RepairReport) {}
}

//! eccguard - protect, scan and repair single files
//!
//! Exit codes: `scan` returns 0 when clean, 1 when damage was found and 2
//! when the streams could not be scanned; `repair` returns 0 on success and
//! 1 otherwise.

use anyhow::{Context, Result};
use eccguard::args::StreamPaths;
use eccguard::damage::{csv_to_damage, parse_index_list};
use eccguard::metadata::Metadata;
use eccguard::reporters::{
    ConsoleReporter, EncodeReporter, RepairReporter, ScanReporter, SilentReporter,
};
use eccguard::{encode, fast_repair, scan_file, ProtectConfig, ScanReport};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = eccguard::parse_args();

    match matches.subcommand() {
        Some(("encode", sub_matches)) => handle_encode(sub_matches),
        Some(("scan", sub_matches)) => handle_scan(sub_matches),
        Some(("repair", sub_matches)) => handle_repair(sub_matches),
        Some((cmd, _)) => {
            eprintln!("Unknown command: {}", cmd);
            std::process::exit(1);
        }
        None => {
            eprintln!("Error: No command specified");
            eprintln!("\nUse 'eccguard --help' for usage information");
            std::process::exit(1);
        }
    }
}

fn open(path: &Path) -> Result<BufReader<File>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(BufReader::new(file))
}

fn create(path: &Path) -> Result<File> {
    File::create(path).with_context(|| format!("Failed to create {}", path.display()))
}

fn handle_encode(matches: &clap::ArgMatches) -> Result<()> {
    let paths = StreamPaths::from_args(matches).context("data file is required")?;
    let config = ProtectConfig::from_args(matches)?;
    let reporter = ConsoleReporter::new();

    let file_size = fs::metadata(&paths.data)
        .with_context(|| format!("Failed to stat {}", paths.data.display()))?
        .len();
    let meta = Metadata::from_config(file_size, &config);
    reporter.report_encode_start(&paths.data, &meta);

    let data = open(&paths.data)?;
    let ecc = create(&paths.ecc)?;
    let crc = create(&paths.crc)?;

    let (summary, ecc, crc) = encode(&meta, data, ecc, crc).context("Failed to encode")?;
    ecc.sync_all()?;
    crc.sync_all()?;

    reporter.report_encode_results(&summary, &paths.ecc, &paths.crc);
    Ok(())
}

fn run_scan(paths: &StreamPaths, reporter: &dyn ScanReporter) -> Result<(ScanReport, Metadata)> {
    let mut ecc = open(&paths.ecc)?;
    let meta = Metadata::read_from(&mut ecc)?;
    reporter.report_scan_start(&paths.data, &meta);

    let report = scan_file(Some(&meta), open(&paths.data)?, ecc, open(&paths.crc)?)?;
    reporter.report_scan_results(&report, &meta);
    Ok((report, meta))
}

fn handle_scan(matches: &clap::ArgMatches) -> Result<()> {
    let paths = StreamPaths::from_args(matches).context("data file is required")?;
    let reporter: Box<dyn ScanReporter> = if matches.get_flag("quiet") {
        Box::new(SilentReporter::new())
    } else {
        Box::new(ConsoleReporter::new())
    };

    let report = match run_scan(&paths, reporter.as_ref()) {
        Ok((report, _)) => report,
        Err(e) => {
            reporter.report_error(&format!("{:#}", e));
            std::process::exit(2);
        }
    };

    if report.is_fatal() {
        std::process::exit(2);
    }
    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}

fn handle_repair(matches: &clap::ArgMatches) -> Result<()> {
    let paths = StreamPaths::from_args(matches).context("data file is required")?;
    let output = Path::new(
        matches
            .get_one::<String>("output")
            .context("output file is required")?,
    );
    let quiet = matches.get_flag("quiet");

    // Manual lists are parsed before any file is touched
    let data_list = matches.get_one::<String>("data_damage");
    let ecc_list = matches.get_one::<String>("ecc_damage");
    let manual = if data_list.is_some() || ecc_list.is_some() {
        let parse = |list: Option<&String>| -> Result<Vec<u64>> {
            let mut indices = match list {
                Some(text) => parse_index_list(text)
                    .with_context(|| format!("Malformed damage list '{}'", text))?,
                None => Vec::new(),
            };
            indices.sort_unstable();
            indices.dedup();
            Ok(indices)
        };
        Some((parse(data_list)?, parse(ecc_list)?))
    } else {
        None
    };

    if let (Ok(a), Ok(b)) = (fs::canonicalize(&paths.data), fs::canonicalize(output)) {
        anyhow::ensure!(a != b, "Output must not overwrite the data file");
    }

    let console = ConsoleReporter::new();
    let silent = SilentReporter::new();
    let (scan_reporter, repair_reporter) = if quiet {
        (
            &silent as &dyn ScanReporter,
            &silent as &dyn RepairReporter,
        )
    } else {
        (
            &console as &dyn ScanReporter,
            &console as &dyn RepairReporter,
        )
    };

    let (meta, damages) = match manual {
        Some((data_indices, ecc_indices)) => {
            let meta = Metadata::read_from(&mut open(&paths.ecc)?)?;
            let damages = csv_to_damage(&meta, &data_indices, &ecc_indices);
            (meta, damages)
        }
        None => {
            let (report, meta) = run_scan(&paths, scan_reporter)?;
            anyhow::ensure!(
                !report.is_fatal(),
                "Scan stopped on a stream fault; refusing to repair"
            );
            (meta, report.damages)
        }
    };

    repair_reporter.report_repair_start(&paths.data, output, damages.len());

    // Streams are reopened from the start for the repair pass
    let mut ecc = open(&paths.ecc)?;
    Metadata::read_from(&mut ecc)?;
    let mut out = create(output)?;
    let report = fast_repair(Some(&meta), &mut out, open(&paths.data)?, ecc, &damages)
        .context("Failed to repair")?;
    out.sync_all()?;

    repair_reporter.report_repair_results(&report);

    if report.is_success() {
        Ok(())
    } else {
        std::process::exit(1);
    }
}

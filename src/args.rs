//! Command-line definition for the `eccguard` binary

use clap::{Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

fn data_arg() -> Arg {
    Arg::new("data")
        .help("File to protect, scan or repair")
        .required(true)
        .index(1)
}

fn crc_arg() -> Arg {
    Arg::new("crc")
        .long("crc")
        .help("Checksum file (default: <ECC>.crc)")
        .value_name("PATH")
}

fn quiet_arg() -> Arg {
    Arg::new("quiet")
        .short('q')
        .long("quiet")
        .help("Quiet mode - minimal output")
        .action(ArgAction::SetTrue)
}

pub fn build_cli() -> Command {
    Command::new("eccguard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Block-level Reed-Solomon protection for single files")
        .arg_required_else_help(true)
        .subcommand(
            Command::new("encode")
                .visible_alias("e")
                .about("Create ECC and checksum files for a data file")
                .arg(data_arg())
                .arg(
                    Arg::new("ecc")
                        .short('o')
                        .long("ecc")
                        .help("ECC file to write (default: <DATA>.ecc)")
                        .value_name("PATH"),
                )
                .arg(crc_arg())
                .arg(
                    Arg::new("block_size")
                        .short('s')
                        .long("block-size")
                        .help("Block size in bytes (default: 4096)")
                        .value_name("BYTES"),
                )
                .arg(
                    Arg::new("level")
                        .short('r')
                        .long("level")
                        .help("Parity blocks per 10 data blocks (default: 1)")
                        .value_name("R"),
                ),
        )
        .subcommand(
            Command::new("scan")
                .visible_alias("s")
                .about("Check a data file against its ECC and checksum files")
                .arg(data_arg())
                .arg(
                    Arg::new("ecc")
                        .long("ecc")
                        .help("ECC file (default: <DATA>.ecc)")
                        .value_name("PATH"),
                )
                .arg(crc_arg())
                .arg(quiet_arg()),
        )
        .subcommand(
            Command::new("repair")
                .visible_alias("r")
                .about("Write a repaired copy of a data file")
                .arg(data_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("out")
                        .help("Where to write the repaired file")
                        .value_name("PATH")
                        .required(true),
                )
                .arg(
                    Arg::new("ecc")
                        .long("ecc")
                        .help("ECC file (default: <DATA>.ecc)")
                        .value_name("PATH"),
                )
                .arg(crc_arg())
                .arg(
                    Arg::new("data_damage")
                        .long("data-damage")
                        .help("Damaged data blocks, e.g. [1,15,69]; skips the scan")
                        .value_name("LIST"),
                )
                .arg(
                    Arg::new("ecc_damage")
                        .long("ecc-damage")
                        .help("Damaged ECC blocks, e.g. [0,3]; skips the scan")
                        .value_name("LIST"),
                )
                .arg(quiet_arg()),
        )
}

pub fn parse_args() -> ArgMatches {
    build_cli().get_matches()
}

/// Parse from an explicit argument list (first item is the program name)
pub fn try_parse_from<I, T>(args: I) -> Result<ArgMatches, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    build_cli().try_get_matches_from(args)
}

/// The data file and its two companions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPaths {
    pub data: PathBuf,
    pub ecc: PathBuf,
    pub crc: PathBuf,
}

impl StreamPaths {
    /// Resolve paths from subcommand arguments
    ///
    /// The ECC file defaults to `<DATA>.ecc` and the checksum file to
    /// `<ECC>.crc`.
    pub fn from_args(matches: &ArgMatches) -> Option<Self> {
        let data = PathBuf::from(matches.get_one::<String>("data")?);
        let ecc = match matches.get_one::<String>("ecc") {
            Some(path) => PathBuf::from(path),
            None => with_suffix(&data, "ecc"),
        };
        let crc = match matches.get_one::<String>("crc") {
            Some(path) => PathBuf::from(path),
            None => with_suffix(&ecc, "crc"),
        };
        Some(Self { data, ecc, crc })
    }
}

fn with_suffix(path: &std::path::Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

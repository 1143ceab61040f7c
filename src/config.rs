//! Configuration for encode operations

use crate::error::{EccError, Result};

/// Default block size in bytes
pub const DEFAULT_BLOCK_SIZE: u32 = 4096;

/// Stripe width: data blocks per section
pub const DEFAULT_DATA_BLOCKS: u16 = 10;

/// Default redundancy level (parity blocks per section)
pub const DEFAULT_LEVEL: u16 = 1;

/// Largest block size accepted from the command line (64MB)
pub const MAX_BLOCK_SIZE: u32 = 64 * 1024 * 1024;

/// Stripe shape used when protecting a file
///
/// Passed explicitly into [`encode`](crate::encoder::encode) via
/// [`Metadata::from_config`](crate::metadata::Metadata::from_config); the
/// library keeps no process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectConfig {
    /// Size of each block in bytes
    pub block_size: u32,
    /// N: data blocks per section
    pub num_data: u16,
    /// R: parity blocks per section (the redundancy level)
    pub num_recovery: u16,
}

impl Default for ProtectConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            num_data: DEFAULT_DATA_BLOCKS,
            num_recovery: DEFAULT_LEVEL,
        }
    }
}

impl ProtectConfig {
    pub fn new(block_size: u32, num_data: u16, num_recovery: u16) -> Self {
        Self {
            block_size,
            num_data,
            num_recovery,
        }
    }

    /// Build from `encode` subcommand arguments, falling back to defaults
    pub fn from_args(matches: &clap::ArgMatches) -> Result<Self> {
        let block_size = match matches.get_one::<String>("block_size") {
            Some(raw) => raw.trim().parse::<u32>().map_err(|_| {
                EccError::InvalidConfig(format!("block size '{raw}' is not a positive integer"))
            })?,
            None => DEFAULT_BLOCK_SIZE,
        };

        let num_recovery = match matches.get_one::<String>("level") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| {
                EccError::InvalidConfig(format!("level '{raw}' is not a positive integer"))
            })?,
            None => DEFAULT_LEVEL,
        };

        let config = Self::new(block_size, DEFAULT_DATA_BLOCKS, num_recovery);
        config.validate()?;
        Ok(config)
    }

    /// Check the ranges the CLI accepts
    ///
    /// The redundancy level may not exceed the stripe width.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(EccError::InvalidConfig(format!(
                "block size must be between 1 and {MAX_BLOCK_SIZE} bytes, got {}",
                self.block_size
            )));
        }
        if self.num_data == 0 {
            return Err(EccError::InvalidConfig(
                "stripe width must be at least 1".to_string(),
            ));
        }
        if self.num_recovery == 0 || self.num_recovery > self.num_data {
            return Err(EccError::InvalidConfig(format!(
                "level must be between 1 and {}, got {}",
                self.num_data, self.num_recovery
            )));
        }
        Ok(())
    }
}

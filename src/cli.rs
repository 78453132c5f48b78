//! CLI argument parsing

use crate::programmers;
use ch341eeprom_core::protocol::I2cSpeed;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal 7-bit I2C address
fn parse_i2c_address(s: &str) -> Result<u8, String> {
    let addr = if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))?
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))?
    };
    if addr > 0x7F {
        return Err(format!("0x{:02X} is not a 7-bit I2C address", addr));
    }
    Ok(addr)
}

/// Generate dynamic help text for the programmer argument
fn programmer_help() -> String {
    format!(
        "Programmer to use [available: {}]",
        programmers::programmer_names_short()
    )
}

#[derive(Parser)]
#[command(name = "ch341eeprom")]
#[command(author, version, about = "24Cxx I2C EEPROM programmer for the CH341A", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Extra EEPROM definitions (a .ron file or a directory of them)
    #[arg(long, global = true)]
    pub chip_db: Option<PathBuf>,

    /// I2C bus speed: low (20 kHz), standard (100 kHz), fast (400 kHz), high (750 kHz)
    #[arg(short, long, default_value = "standard", global = true)]
    pub speed: I2cSpeed,

    /// 7-bit bus address of the EEPROM
    #[arg(long, default_value = "0x50", value_parser = parse_i2c_address, global = true)]
    pub address: u8,

    /// Check the device acknowledge on every transaction
    #[arg(long, global = true)]
    pub ack_check: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read EEPROM contents to file
    Read {
        /// Programmer to use
        #[arg(short, long, default_value = "ch341a", help = programmer_help())]
        programmer: String,

        /// EEPROM type, e.g. 24c32 (case-sensitive)
        #[arg(short, long)]
        chip: String,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Write file to EEPROM
    Write {
        /// Programmer to use
        #[arg(short, long, default_value = "ch341a", help = programmer_help())]
        programmer: String,

        /// EEPROM type, e.g. 24c32 (case-sensitive)
        #[arg(short, long)]
        chip: String,

        /// Input file path
        #[arg(short, long)]
        input: PathBuf,

        /// Read back and compare after writing
        #[arg(long)]
        verify: bool,
    },

    /// Fill EEPROM with 0xFF
    Erase {
        /// Programmer to use
        #[arg(short, long, default_value = "ch341a", help = programmer_help())]
        programmer: String,

        /// EEPROM type, e.g. 24c32 (case-sensitive)
        #[arg(short, long)]
        chip: String,
    },

    /// Verify EEPROM contents against file
    Verify {
        /// Programmer to use
        #[arg(short, long, default_value = "ch341a", help = programmer_help())]
        programmer: String,

        /// EEPROM type, e.g. 24c32 (case-sensitive)
        #[arg(short, long)]
        chip: String,

        /// Input file path to verify against
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Probe the I2C bus for devices
    Scan {
        /// Programmer to use
        #[arg(short, long, default_value = "ch341a", help = programmer_help())]
        programmer: String,
    },

    /// List supported programmers
    ListProgrammers,

    /// List supported EEPROM types
    ListChips,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_i2c_address() {
        assert_eq!(parse_i2c_address("0x50"), Ok(0x50));
        assert_eq!(parse_i2c_address("80"), Ok(80));
        assert!(parse_i2c_address("0x80").is_err());
        assert!(parse_i2c_address("zz").is_err());
    }

    #[test]
    fn test_global_options() {
        let cli = Cli::try_parse_from([
            "ch341eeprom",
            "read",
            "-c",
            "24c32",
            "-o",
            "out.bin",
            "--speed",
            "fast",
            "--ack-check",
            "-vv",
        ])
        .unwrap();
        assert_eq!(cli.speed, I2cSpeed::Fast);
        assert_eq!(cli.address, 0x50);
        assert!(cli.ack_check);
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Read { ref chip, .. } if chip == "24c32"));
    }

    #[test]
    fn test_chip_is_required() {
        assert!(Cli::try_parse_from(["ch341eeprom", "erase"]).is_err());
        assert!(Cli::try_parse_from(["ch341eeprom", "scan", "-p", "dummy"]).is_ok());
    }
}

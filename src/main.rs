//! ch341eeprom - 24Cxx I2C EEPROM programmer
//!
//! Reads, writes, erases and verifies serial EEPROMs through the I2C
//! stream interface of a WCH CH341A USB bridge.
//!
//! # Architecture
//!
//! All device commands go through `ch341eeprom_core::eeprom::EepromProgrammer`,
//! which only needs a byte-level `Transport`. The programmer named on the
//! command line supplies it:
//! - **ch341a** - the real bridge over USB bulk endpoints
//! - **dummy** - a simulated bridge with an in-memory part, for trying
//!   things out without hardware

mod cli;
mod commands;
mod programmers;

use clap::Parser;
use cli::{Cli, Commands};
use commands::{open_programmer, BusSettings};
use programmers::{with_programmer, Target};

use ch341eeprom_core::chip::{ChipDatabase, EepromChip};
use ch341eeprom_core::eeprom::ProgrammerConfig;
use ch341eeprom_core::error::Error as CoreError;
use ch341eeprom_core::protocol::Handshake;
use std::path::{Path, PathBuf};

fn main() {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Load chip database
    let db = match load_chip_database(cli.chip_db.as_deref()) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to load chip database: {}", e);
            std::process::exit(1);
        }
    };

    log::debug!("Loaded {} EEPROM definitions", db.len());

    if let Err(e) = run(cli, &db) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli, db: &ChipDatabase) -> Result<(), Box<dyn std::error::Error>> {
    let settings = BusSettings {
        speed: cli.speed,
        config: ProgrammerConfig {
            bus_addr: cli.address,
            handshake: if cli.ack_check {
                Handshake::Status
            } else {
                Handshake::Plain
            },
        },
    };

    match cli.command {
        Commands::Read {
            programmer,
            chip,
            output,
        } => {
            let chip = find_chip(db, &chip)?;
            let target = Target {
                chip: Some(chip),
                bus_addr: cli.address,
            };
            with_programmer(&programmer, &target, |transport| {
                let mut eeprom = open_programmer(transport, &settings)?;
                commands::run_read(&mut eeprom, chip, &output)
            })
        }
        Commands::Write {
            programmer,
            chip,
            input,
            verify,
        } => {
            let chip = find_chip(db, &chip)?;
            let target = Target {
                chip: Some(chip),
                bus_addr: cli.address,
            };
            with_programmer(&programmer, &target, |transport| {
                let mut eeprom = open_programmer(transport, &settings)?;
                commands::run_write(&mut eeprom, chip, &input, verify)
            })
        }
        Commands::Erase { programmer, chip } => {
            let chip = find_chip(db, &chip)?;
            let target = Target {
                chip: Some(chip),
                bus_addr: cli.address,
            };
            with_programmer(&programmer, &target, |transport| {
                let mut eeprom = open_programmer(transport, &settings)?;
                commands::run_erase(&mut eeprom, chip)
            })
        }
        Commands::Verify {
            programmer,
            chip,
            input,
        } => {
            let chip = find_chip(db, &chip)?;
            let target = Target {
                chip: Some(chip),
                bus_addr: cli.address,
            };
            with_programmer(&programmer, &target, |transport| {
                let mut eeprom = open_programmer(transport, &settings)?;
                commands::run_verify(&mut eeprom, chip, &input)
            })
        }
        Commands::Scan { programmer } => {
            let target = Target {
                chip: None,
                bus_addr: cli.address,
            };
            with_programmer(&programmer, &target, |transport| {
                let mut eeprom = open_programmer(transport, &settings)?;
                commands::run_scan(&mut eeprom)
            })
        }
        Commands::ListProgrammers => {
            commands::list_programmers();
            Ok(())
        }
        Commands::ListChips => {
            commands::list_chips(db);
            Ok(())
        }
    }
}

/// Resolve an EEPROM type before any hardware is touched
fn find_chip<'a>(db: &'a ChipDatabase, name: &str) -> Result<&'a EepromChip, CoreError> {
    db.find(name)
        .ok_or_else(|| CoreError::UnknownChip(name.to_string()))
}

/// Load the chip database from the specified path or default locations
///
/// The built-in parts are always present; files only add or override.
fn load_chip_database(path: Option<&Path>) -> Result<ChipDatabase, Box<dyn std::error::Error>> {
    let mut db = ChipDatabase::new();

    if let Some(path) = path {
        // User specified a path
        if path.is_dir() {
            db.load_dir(path)?;
        } else if path.is_file() {
            db.load_file(path)?;
        } else {
            return Err(format!("Chip database path not found: {}", path.display()).into());
        }
    } else {
        // Try default locations
        let default_paths = [
            PathBuf::from("/usr/share/ch341eeprom/chips"),
            PathBuf::from("/usr/local/share/ch341eeprom/chips"),
        ];

        for dir in &default_paths {
            if dir.is_dir() {
                match db.load_dir(dir) {
                    Ok(count) => {
                        log::debug!("Loaded {} EEPROM types from {}", count, dir.display());
                    }
                    Err(e) => {
                        log::warn!("Failed to load EEPROM types from {}: {}", dir.display(), e);
                    }
                }
            }
        }
    }

    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_chip() {
        let db = ChipDatabase::new();
        assert_eq!(find_chip(&db, "24c02").unwrap().size, 256);
        assert!(matches!(
            find_chip(&db, "24C02"),
            Err(CoreError::UnknownChip(ref name)) if name == "24C02"
        ));
    }

    #[test]
    fn test_missing_chip_db_path() {
        let path = Path::new("/nonexistent/ch341eeprom/chips");
        assert!(load_chip_database(Some(path)).is_err());
    }
}

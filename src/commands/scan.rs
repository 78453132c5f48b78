//! Scan command implementation

use super::progress::IndicatifProgress;
use super::{CmdResult, Programmer};

/// Probe every bus address and list the ones that acknowledge
pub fn run_scan(programmer: &mut Programmer<'_>) -> CmdResult {
    let mut progress = IndicatifProgress::new();
    let results = match programmer.scan_bus_with_progress(&mut progress) {
        Ok(results) => results,
        Err(e) => {
            progress.abandon();
            return Err(e.into());
        }
    };

    let found: Vec<u8> = results
        .iter()
        .filter(|r| r.present)
        .map(|r| r.address)
        .collect();

    if found.is_empty() {
        println!("No devices found");
        return Ok(());
    }

    println!("Found {} device(s):", found.len());
    for address in found {
        println!("  0x{:02X}", address);
    }
    Ok(())
}

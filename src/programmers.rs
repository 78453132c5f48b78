//! Programmer registration and dispatch
//!
//! This module provides a centralized registry for all programmers, with support
//! for feature-gated inclusion and dynamic help text generation.

use ch341eeprom_core::chip::EepromChip;
use ch341eeprom_core::Transport;

/// Information about a programmer
pub struct ProgrammerInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// What the programmer is going to talk to
///
/// Only the simulated programmer needs this; it builds its bus from it
/// unless `chip=` or `address=` options say otherwise.
pub struct Target<'a> {
    /// Selected EEPROM type, if the command names one
    pub chip: Option<&'a EepromChip>,
    /// 7-bit bus address of the EEPROM
    pub bus_addr: u8,
}

/// Get information about all available programmers (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_programmers() -> Vec<ProgrammerInfo> {
    let mut programmers = Vec::new();

    #[cfg(feature = "ch341a")]
    programmers.push(ProgrammerInfo {
        name: "ch341a",
        aliases: &["ch341a_i2c"],
        description: "CH341A USB I2C bridge (VID:1a86 PID:5512) (index=<n>)",
    });

    #[cfg(feature = "dummy")]
    programmers.push(ProgrammerInfo {
        name: "dummy",
        aliases: &[],
        description: "Simulated CH341A with an in-memory EEPROM (chip=<type>,address=<addr>)",
    });

    programmers
}

/// Generate help text listing all available programmers
pub fn programmer_help() -> String {
    let programmers = available_programmers();

    if programmers.is_empty() {
        return "No programmers available (recompile with programmer features enabled)".to_string();
    }

    let mut help = String::from("Available programmers:\n");

    for p in &programmers {
        help.push_str(&format!("  {:12} - {}\n", p.name, p.description));
        if !p.aliases.is_empty() {
            help.push_str(&format!("  {:12}   aliases: {}\n", "", p.aliases.join(", ")));
        }
    }

    help
}

/// Generate a short list of programmer names for CLI help
pub fn programmer_names_short() -> String {
    let programmers = available_programmers();
    let names: Vec<&str> = programmers.iter().map(|p| p.name).collect();
    names.join(", ")
}

/// Resolve a programmer name or alias to its primary name
pub fn find_programmer(name: &str) -> Option<&'static str> {
    available_programmers()
        .into_iter()
        .find(|p| p.name == name || p.aliases.contains(&name))
        .map(|p| p.name)
}

/// Execute a function with the specified programmer
///
/// The programmer string can be just the name (e.g., "ch341a") or include
/// parameters (e.g., "ch341a:index=1").
#[allow(unused_variables)]
pub fn with_programmer<F>(
    programmer: &str,
    target: &Target<'_>,
    f: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut dyn Transport) -> Result<(), Box<dyn std::error::Error>>,
{
    let (name, options) = parse_programmer_string(programmer);

    let canonical_name = match find_programmer(name) {
        Some(n) => n,
        None => {
            return Err(unknown_programmer_error(name));
        }
    };

    match canonical_name {
        #[cfg(feature = "ch341a")]
        "ch341a" => {
            use ch341eeprom_ch341a::{parse_options, Ch341a};

            let config =
                parse_options(&options).map_err(|e| format!("Invalid ch341a parameters: {}", e))?;

            log::info!("Opening CH341A programmer...");
            let mut bridge = Ch341a::open_with_config(&config).map_err(|e| {
                format!(
                    "Failed to open CH341A: {}\nMake sure the device is connected and you have permissions.",
                    e
                )
            })?;
            f(&mut bridge)
        }
        #[cfg(feature = "dummy")]
        "dummy" => {
            use ch341eeprom_dummy::{parse_options, DummyCh341a};

            let mut config =
                parse_options(&options).map_err(|e| format!("Invalid dummy parameters: {}", e))?;
            let has_option = |key: &str| options.iter().any(|(k, _)| *k == key);
            if !has_option("chip") {
                if let Some(chip) = target.chip {
                    config.chip = chip.clone();
                }
            }
            if !has_option("address") {
                config.bus_addr = target.bus_addr;
            }

            log::info!(
                "Simulating {} at 0x{:02X} (contents are not persisted)",
                config.chip.name,
                config.bus_addr
            );
            let mut bridge = DummyCh341a::new(config);
            f(&mut bridge)
        }
        _ => Err(unknown_programmer_error(name)),
    }
}

/// Parse a programmer string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_programmer_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

fn unknown_programmer_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown programmer: {}\n\n", name);
    msg.push_str(&programmer_help());
    msg.push_str("\nUse 'ch341eeprom list-programmers' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_programmer_string() {
        assert_eq!(parse_programmer_string("ch341a"), ("ch341a", vec![]));
        assert_eq!(
            parse_programmer_string("dummy:chip=24c02,address=0x51"),
            ("dummy", vec![("chip", "24c02"), ("address", "0x51")])
        );
        assert_eq!(
            parse_programmer_string("ch341a:bogus"),
            ("ch341a", vec![])
        );
    }

    #[test]
    fn test_unknown_programmer() {
        let target = Target {
            chip: None,
            bus_addr: 0x50,
        };
        let err = with_programmer("nonexistent", &target, |_| Ok(())).unwrap_err();
        assert!(err.to_string().starts_with("Unknown programmer: nonexistent"));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_follows_target() {
        use ch341eeprom_core::chip;
        use ch341eeprom_core::eeprom::EepromProgrammer;

        let part = chip::lookup("24c02").unwrap();
        let target = Target {
            chip: Some(part),
            bus_addr: 0x52,
        };
        with_programmer("dummy", &target, |transport| {
            let results = EepromProgrammer::new(transport).scan_bus()?;
            let present: Vec<u8> = results
                .iter()
                .filter(|r| r.present)
                .map(|r| r.address)
                .collect();
            assert_eq!(present, [0x52]);
            Ok(())
        })
        .unwrap();
    }

    #[cfg(feature = "ch341a")]
    #[test]
    fn test_alias_resolves() {
        assert_eq!(find_programmer("ch341a_i2c"), Some("ch341a"));
        assert_eq!(find_programmer("ch341"), None);
    }
}

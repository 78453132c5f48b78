//! Property-based tests for the frame encoder and the whole-part operations.
//!
//! Uses `proptest` to generate random images and transaction lengths and
//! checks them against the simulated bridge.

use ch341eeprom_core::chip::{self, EepromChip};
use ch341eeprom_core::eeprom::{EepromProgrammer, ProgrammerConfig};
use ch341eeprom_core::protocol::{
    encode_read, encode_write, Handshake, MAX_READ_CHUNK, PACKET_LENGTH, STM_STA,
};
use ch341eeprom_dummy::{DummyCh341a, DummyConfig};
use proptest::prelude::*;

/// Small and medium parts, covering both address widths and folded bits.
fn chip_strategy() -> impl Strategy<Value = &'static EepromChip> {
    prop_oneof![
        Just("24c01"),
        Just("24c02"),
        Just("24c04"),
        Just("24c16"),
        Just("24c32"),
        Just("24c64"),
    ]
    .prop_map(|name| chip::lookup(name).unwrap())
}

fn handshake_strategy() -> impl Strategy<Value = Handshake> {
    prop_oneof![Just(Handshake::Plain), Just(Handshake::Status)]
}

/// A part together with an image no larger than it.
fn chip_and_image() -> impl Strategy<Value = (&'static EepromChip, Vec<u8>)> {
    chip_strategy().prop_flat_map(|chip| {
        (
            Just(chip),
            prop::collection::vec(any::<u8>(), 0..=chip.size as usize),
        )
    })
}

fn programmer_for(
    dummy: &mut DummyCh341a,
    handshake: Handshake,
) -> EepromProgrammer<&mut DummyCh341a> {
    let config = ProgrammerConfig {
        handshake,
        ..Default::default()
    };
    EepromProgrammer::with_config(dummy, config).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Write-all followed by read-all returns the image.
    #[test]
    fn write_then_read_round_trip(
        (chip, image) in chip_and_image(),
        handshake in handshake_strategy(),
    ) {
        let mut dummy = DummyCh341a::new(DummyConfig { chip: chip.clone(), bus_addr: 0x50 });

        let mut programmer = programmer_for(&mut dummy, handshake);
        programmer.write_eeprom(chip, &image).unwrap();
        let back = programmer.read_eeprom(chip, image.len()).unwrap();
        prop_assert_eq!(&back, &image, "round trip failed on {}", chip.name);

        prop_assert!(dummy.packets().iter().all(|p| p.len() <= PACKET_LENGTH));
    }

    /// Writing the same image twice leaves the part as writing it once.
    #[test]
    fn double_write_is_idempotent((chip, image) in chip_and_image()) {
        let config = DummyConfig { chip: chip.clone(), bus_addr: 0x50 };
        let mut once = DummyCh341a::new(config.clone());
        let mut twice = DummyCh341a::new(config);

        programmer_for(&mut once, Handshake::Plain).write_eeprom(chip, &image).unwrap();
        {
            let mut programmer = programmer_for(&mut twice, Handshake::Plain);
            programmer.write_eeprom(chip, &image).unwrap();
            programmer.write_eeprom(chip, &image).unwrap();
        }

        prop_assert_eq!(once.devices()[0].data(), twice.devices()[0].data());
    }

    /// No encoded frame exceeds the packet size, and payload is preserved.
    #[test]
    fn write_frames_fit_packets(
        addr in 0u8..0x80,
        data in prop::collection::vec(any::<u8>(), 0..300),
        handshake in handshake_strategy(),
    ) {
        let cmd = encode_write(addr, &data, handshake);
        prop_assert!(cmd.frames.iter().all(|f| f.len() <= PACKET_LENGTH));
        prop_assert_eq!(cmd.frames[0].as_bytes()[1], STM_STA);
        for frame in &cmd.frames[1..] {
            prop_assert_ne!(frame.as_bytes()[1], STM_STA);
            // Continuations always carry payload
            prop_assert!(frame.as_bytes()[1] > 0x80 && frame.as_bytes()[1] < 0xC0);
        }
    }

    /// Reads are split into full transactions of bounded size.
    #[test]
    fn read_chunks_cover_length(
        len in 0usize..500,
        handshake in handshake_strategy(),
    ) {
        let chunks = encode_read(0x50, len, handshake);
        let total: usize = chunks.iter().map(|c| c.len).sum();
        prop_assert_eq!(total, len);
        for chunk in &chunks {
            prop_assert!(chunk.frame.len() <= PACKET_LENGTH);
            prop_assert!(chunk.len <= MAX_READ_CHUNK);
            prop_assert!(chunk.response_len <= PACKET_LENGTH);
            prop_assert_eq!(chunk.frame.as_bytes()[1], STM_STA);
        }
    }
}

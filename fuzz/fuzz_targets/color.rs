//! Color Converter Fuzz Target
//!
//! Hex and RGB parsing must never panic, and accepted values must fit in
//! 24 bits.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tfd_discord::codec::{MAX_COLOR, hex_to_decimal, rgb_to_decimal};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok(value) = hex_to_decimal(text) {
        assert!(value <= MAX_COLOR);
    }
    if let Ok(value) = rgb_to_decimal(text) {
        assert!(value <= MAX_COLOR);
    }
});

//! Composite Import ID Fuzz Target
//!
//! Parsers must never panic, and every accepted ID must render back to
//! exactly the input.

#![no_main]

use libfuzzer_sys::fuzz_target;
use tfd_discord::codec::import_id;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    if let Ok((a, b)) = import_id::parse2(text, import_id::ROLE) {
        assert_eq!(import_id::build(&[&a, &b]), text);
    }
    if let Ok((a, b, c)) = import_id::parse3(text, import_id::ROLE_MEMBER) {
        assert_eq!(import_id::build(&[&a, &b, &c]), text);
    }
    if let Ok(key) = import_id::parse_channel_permission(text) {
        assert_eq!(key.to_import_id(), text);
    }
});

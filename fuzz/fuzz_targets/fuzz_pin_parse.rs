//! Fuzz target: `PinSet::parse`
//!
//! Pin lists arrive straight from URL path segments and form fields. Any
//! string must either be rejected or yield a set that is non-empty, holds
//! only GPIO header pins, and re-parses to itself from its key.
//!
//! cargo fuzz run fuzz_pin_parse

#![no_main]

use libfuzzer_sys::fuzz_target;
use railyard::pins::{self, PinSet};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(set) = PinSet::parse(text) {
        assert!(!set.is_empty(), "parser must not yield an empty set");
        assert!(set.len() <= 2, "no device uses more than two pins");
        assert!(set.as_slice().iter().all(|&p| pins::is_assignable(p)));
        assert_eq!(PinSet::parse(&set.key()), Ok(set));
    }
});

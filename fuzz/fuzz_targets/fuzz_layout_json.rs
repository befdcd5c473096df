//! Fuzz target: `Layout::from_json`
//!
//! Saved layouts are read back from disk at startup. A damaged or hostile
//! file must be rejected, and an accepted one must validate and survive a
//! save/load round trip unchanged.
//!
//! cargo fuzz run fuzz_layout_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use railyard::app::layout::Layout;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(layout) = Layout::from_json(text) {
        assert!(layout.validate().is_ok(), "decoded layout must validate");
        let json = layout.to_json().expect("valid layout must encode");
        assert_eq!(Layout::from_json(&json).ok(), Some(layout));
    }
});

//! Fuzz target for the dictionary parser.
//!
//! Feeds arbitrary UTF-8 through parse -> expand -> write -> reparse and
//! checks:
//! - the parser never panics on malformed input (errors are `Result`s),
//! - anything that parses also round-trips: write then reparse succeeds and
//!   reproduces the same content.
//!
//! # Running
//!
//! ```bash
//! cargo +nightly fuzz run fuzz_dict_parse
//! cargo +nightly fuzz run fuzz_dict_parse -- -max_len=4096
//! ```

#![no_main]

use libfuzzer_sys::fuzz_target;

use dictionary_rs::Dictionary;

/// Keep iterations fast; long inputs add length, not new grammar.
const MAX_INPUT_LEN: usize = 8 * 1024;

fuzz_target!(|data: &[u8]| {
    if data.len() > MAX_INPUT_LEN {
        return;
    }
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(mut dict) = Dictionary::parse("fuzz", text) else {
        return;
    };
    dict.expand();

    let written = dict.to_text();
    let reparsed = Dictionary::parse("fuzz", &written)
        .unwrap_or_else(|e| panic!("round-trip reparse failed: {e}\ninput:\n{written}"));
    assert!(
        dict.content_eq(&reparsed),
        "round-trip content drift\nwritten:\n{written}"
    );
});

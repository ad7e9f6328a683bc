#![no_main]

use craft_core::workflow::{decode, encode};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(mut workflow) = decode(text) {
        let reencoded = encode(&mut workflow);
        let _ = decode(&reencoded);
    }
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use cetus::consensus::certificate::Certificate;

fuzz_target!(|data: &[u8]| {
    // The certificate decoder faces untrusted network input.  Every count
    // field is bounds-checked before allocation, so arbitrary bytes must
    // never panic or exhaust memory.
    let _ = Certificate::deserialize(data);
});

#![no_main]
use libfuzzer_sys::fuzz_target;
use share_link::{LinkCodec, SecretKey};

fuzz_target!(|data: &[u8]| {
    let codec = LinkCodec::new(SecretKey::load(b"random-key").unwrap());
    let _ = codec.decode(&String::from_utf8_lossy(data));
});

#![no_main]

use libfuzzer_sys::fuzz_target;
use once_cell::sync::Lazy;
use ohttp_envelope::{MediaType, PrivateKey, Recipient};

static RECIPIENT: Lazy<Recipient> = Lazy::new(|| Recipient::new(PrivateKey::generate()));

fuzz_target!(|data: &[u8]| {
    if data.is_empty() {
        return;
    }

    let media_type = MediaType::from_changed(data[0] & 1 == 1);
    if let Ok((_, ctx)) = RECIPIENT.decrypt(&data[1..], media_type) {
        let _ = ctx.encrypt(b"");
    }
});

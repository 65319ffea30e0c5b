#![no_main]

use libfuzzer_sys::fuzz_target;
use ohttp_envelope::KeyConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = KeyConfig::parse(data) else {
        return;
    };

    // Anything that parses with a usable suite must re-parse to the same selection.
    if let Ok(bytes) = config.serialize() {
        let again = KeyConfig::parse(&bytes).expect("serialized config must parse");
        assert_eq!(again.key_id(), config.key_id());
        assert_eq!(again.kdf_id(), config.kdf_id());
        assert_eq!(again.aead_id(), config.aead_id());
        assert_eq!(again.public_key(), config.public_key());
    }
});

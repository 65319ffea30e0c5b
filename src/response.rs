//! Response key schedule (RFC 9458 section 4.4)
//!
//!   secret = Export(response_label, max(Nn, Nk))
//!   salt   = enc || response_nonce
//!   prk    = Extract(salt, secret)
//!   key    = Expand(prk, "key", Nk)
//!   nonce  = Expand(prk, "nonce", Nn)
//!
//! Runs outside the HPKE context, so only the exported secret and a fresh
//! nonce are needed to seal or open a response.

extern crate alloc;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::error::{OhttpError, Result};
use crate::hpke::Suite;

const KEY_LABEL: &[u8] = b"key";
const NONCE_LABEL: &[u8] = b"nonce";

/// Returns (aead_key, aead_nonce).
pub(crate) fn derive_key_nonce(
    suite: Suite,
    secret: &[u8],
    enc: &[u8],
    response_nonce: &[u8],
) -> Result<(Zeroizing<Vec<u8>>, Zeroizing<Vec<u8>>)> {
    if response_nonce.len() != suite.aead.response_nonce_len() {
        return Err(OhttpError::InvalidArgument("response nonce length mismatch"));
    }

    let mut salt = Vec::with_capacity(enc.len() + response_nonce.len());
    salt.extend_from_slice(enc);
    salt.extend_from_slice(response_nonce);

    let prk = suite.kdf.extract(&salt, secret);
    let key = suite.kdf.expand(&prk, KEY_LABEL, suite.aead.key_len())?;
    let nonce = suite.kdf.expand(&prk, NONCE_LABEL, suite.aead.nonce_len())?;
    Ok((key, nonce))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aead::Aead;
    use crate::kdf::Kdf;
    use crate::kem::Kem;

    #[test]
    fn lengths_follow_aead() {
        for aead in [Aead::Aes128Gcm, Aead::Aes256Gcm, Aead::ChaCha20Poly1305] {
            let suite = Suite::new(Kem::X25519HkdfSha256, Kdf::HkdfSha256, aead);
            let nonce = alloc::vec![3u8; aead.response_nonce_len()];
            let (key, n) = derive_key_nonce(suite, &[9u8; 32], &[1u8; 32], &nonce).unwrap();
            assert_eq!(key.len(), aead.key_len());
            assert_eq!(n.len(), aead.nonce_len());
        }
    }

    #[test]
    fn every_input_changes_key() {
        let suite = Suite::new(Kem::X25519HkdfSha256, Kdf::HkdfSha256, Aead::Aes128Gcm);
        let (base, _) = derive_key_nonce(suite, &[9u8; 16], &[1u8; 32], &[3u8; 16]).unwrap();
        let (a, _) = derive_key_nonce(suite, &[8u8; 16], &[1u8; 32], &[3u8; 16]).unwrap();
        let (b, _) = derive_key_nonce(suite, &[9u8; 16], &[2u8; 32], &[3u8; 16]).unwrap();
        let (c, _) = derive_key_nonce(suite, &[9u8; 16], &[1u8; 32], &[4u8; 16]).unwrap();
        assert_ne!(*base, *a);
        assert_ne!(*base, *b);
        assert_ne!(*base, *c);
    }

    #[test]
    fn wrong_nonce_length_is_rejected() {
        let suite = Suite::new(Kem::X25519HkdfSha256, Kdf::HkdfSha256, Aead::Aes256Gcm);
        assert!(derive_key_nonce(suite, &[9u8; 32], &[1u8; 32], &[3u8; 16]).is_err());
    }
}

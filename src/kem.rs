//! KEM capability table: DHKEM(X25519, HKDF-SHA256).
//!
//! Key serialization:
//!   PublicKey  = x25519_pk[32]
//!   PrivateKey = x25519_sk[32]
//!
//! Encapsulated key (on wire):
//!   x25519_ephemeral_pk[32]
//!
//! Shared secret (RFC 9180 section 4.1):
//!   eae_prk       = LabeledExtract("", "eae_prk", dh)
//!   shared_secret = LabeledExpand(eae_prk, "shared_secret", enc || pkR, 32)

extern crate alloc;
use alloc::vec::Vec;

use rand_core::OsRng;
use subtle::ConstantTimeEq;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::error::{AlgorithmKind, OhttpError, Result};
use crate::kdf::Kdf;

/// X25519 public key / private key / encapsulated key size
pub const X25519_KEY_BYTES: usize = 32;

/// Nsecret for DHKEM(X25519, HKDF-SHA256)
pub const SHARED_SECRET_BYTES: usize = 32;

/// Supported KEMs, keyed by their HPKE identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kem {
    X25519HkdfSha256,
}

impl Kem {
    pub const X25519_HKDF_SHA256_ID: u16 = 0x0020;

    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            Self::X25519_HKDF_SHA256_ID => Ok(Self::X25519HkdfSha256),
            other => Err(OhttpError::unsupported(AlgorithmKind::Kem, other)),
        }
    }

    pub fn is_supported(id: u16) -> bool {
        Self::from_id(id).is_ok()
    }

    pub fn id(self) -> u16 {
        match self {
            Self::X25519HkdfSha256 => Self::X25519_HKDF_SHA256_ID,
        }
    }

    /// Npk
    pub fn public_key_len(self) -> usize {
        match self {
            Self::X25519HkdfSha256 => X25519_KEY_BYTES,
        }
    }

    /// Nenc
    pub fn enc_len(self) -> usize {
        match self {
            Self::X25519HkdfSha256 => X25519_KEY_BYTES,
        }
    }

    /// Nsk
    pub fn private_key_len(self) -> usize {
        match self {
            Self::X25519HkdfSha256 => X25519_KEY_BYTES,
        }
    }

    fn kdf(self) -> Kdf {
        match self {
            Self::X25519HkdfSha256 => Kdf::HkdfSha256,
        }
    }

    fn suite_id(self) -> [u8; 5] {
        let id = self.id().to_be_bytes();
        [b'K', b'E', b'M', id[0], id[1]]
    }

    /// Encap(pkR) with a fresh ephemeral key.
    /// Returns (shared_secret, enc).
    pub fn encapsulate(self, pk: &PublicKey) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>)> {
        let ephemeral = StaticSecret::random_from_rng(OsRng);
        self.encapsulate_with(pk, ephemeral)
    }

    /// Encap(pkR) with the ephemeral private key taken verbatim from `seed`.
    /// Only for reproducing conformance vectors.
    #[cfg(any(test, feature = "kat"))]
    pub fn encapsulate_with_seed(self, pk: &PublicKey, seed: &[u8]) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>)> {
        let seed: [u8; X25519_KEY_BYTES] = seed
            .try_into()
            .map_err(|_| OhttpError::InvalidArgument("seed must be 32 bytes"))?;
        self.encapsulate_with(pk, StaticSecret::from(seed))
    }

    fn encapsulate_with(self, pk: &PublicKey, ephemeral: StaticSecret) -> Result<(Zeroizing<Vec<u8>>, Vec<u8>)> {
        let enc = X25519PublicKey::from(&ephemeral);
        let dh = ephemeral.diffie_hellman(&pk.inner);
        if !dh.was_contributory() {
            return Err(OhttpError::InvalidArgument("public key has low order"));
        }
        let shared_secret = self.extract_and_expand(dh.as_bytes(), enc.as_bytes(), pk.as_bytes())?;
        Ok((shared_secret, enc.as_bytes().to_vec()))
    }

    /// Decap(enc, skR). Returns shared_secret.
    pub fn decapsulate(self, sk: &PrivateKey, enc: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let enc_bytes: [u8; X25519_KEY_BYTES] = enc.try_into().map_err(|_| OhttpError::Decapsulation)?;
        let pk_e = X25519PublicKey::from(enc_bytes);
        let dh = sk.inner.diffie_hellman(&pk_e);
        if !dh.was_contributory() {
            return Err(OhttpError::Decapsulation);
        }
        let pk_r = X25519PublicKey::from(&sk.inner);
        self.extract_and_expand(dh.as_bytes(), enc, pk_r.as_bytes())
    }

    fn extract_and_expand(self, dh: &[u8], enc: &[u8], pk_r: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let suite_id = self.suite_id();
        let mut kem_context = Vec::with_capacity(enc.len() + pk_r.len());
        kem_context.extend_from_slice(enc);
        kem_context.extend_from_slice(pk_r);

        let eae_prk = self.kdf().labeled_extract(&suite_id, b"", b"eae_prk", dh);
        self.kdf()
            .labeled_expand(&suite_id, &eae_prk, b"shared_secret", &kem_context, SHARED_SECRET_BYTES)
    }
}

// ---------------------------------------------------------------------------
// Key types
// ---------------------------------------------------------------------------

/// Recipient public key, as advertised in a key configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    inner: X25519PublicKey,
}

impl PublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(OhttpError::InvalidArgument("public key is empty"));
        }
        let bytes: [u8; X25519_KEY_BYTES] = bytes
            .try_into()
            .map_err(|_| OhttpError::InvalidArgument("public key length mismatch"))?;
        Ok(Self {
            inner: X25519PublicKey::from(bytes),
        })
    }

    pub fn as_bytes(&self) -> &[u8; X25519_KEY_BYTES] {
        self.inner.as_bytes()
    }
}

impl core::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("PublicKey").field(self.as_bytes()).finish()
    }
}

/// Recipient (gateway) private key. Zeroized on drop.
#[derive(Clone)]
pub struct PrivateKey {
    inner: StaticSecret,
}

impl PrivateKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(OhttpError::InvalidArgument("private key is empty"));
        }
        let bytes: Zeroizing<[u8; X25519_KEY_BYTES]> = Zeroizing::new(
            bytes
                .try_into()
                .map_err(|_| OhttpError::InvalidArgument("private key length mismatch"))?,
        );
        Ok(Self {
            inner: StaticSecret::from(*bytes),
        })
    }

    pub fn generate() -> Self {
        Self {
            inner: StaticSecret::random_from_rng(OsRng),
        }
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: X25519PublicKey::from(&self.inner),
        }
    }

    pub fn to_bytes(&self) -> Zeroizing<[u8; X25519_KEY_BYTES]> {
        Zeroizing::new(self.inner.to_bytes())
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner.as_bytes().ct_eq(other.inner.as_bytes()).into()
    }
}

impl Eq for PrivateKey {}

impl core::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encapsulate_decapsulate_agree() {
        let sk = PrivateKey::generate();
        let kem = Kem::X25519HkdfSha256;
        let (ss_sender, enc) = kem.encapsulate(&sk.public_key()).unwrap();
        assert_eq!(enc.len(), kem.enc_len());

        let ss_recipient = kem.decapsulate(&sk, &enc).unwrap();
        assert_eq!(*ss_sender, *ss_recipient);
        assert_eq!(ss_sender.len(), SHARED_SECRET_BYTES);
    }

    #[test]
    fn seeded_encapsulation_is_deterministic() {
        let pk = PrivateKey::generate().public_key();
        let kem = Kem::X25519HkdfSha256;
        let seed = [0x77u8; 32];
        let (ss1, enc1) = kem.encapsulate_with_seed(&pk, &seed).unwrap();
        let (ss2, enc2) = kem.encapsulate_with_seed(&pk, &seed).unwrap();
        assert_eq!(enc1, enc2);
        assert_eq!(*ss1, *ss2);
        assert!(kem.encapsulate_with_seed(&pk, &seed[..31]).is_err());
    }

    #[test]
    fn wrong_length_enc_is_decapsulation_error() {
        let sk = PrivateKey::generate();
        let kem = Kem::X25519HkdfSha256;
        assert_eq!(kem.decapsulate(&sk, &[1u8; 31]), Err(OhttpError::Decapsulation));
        assert_eq!(kem.decapsulate(&sk, &[]), Err(OhttpError::Decapsulation));
    }

    #[test]
    fn low_order_enc_is_decapsulation_error() {
        let sk = PrivateKey::generate();
        assert_eq!(
            Kem::X25519HkdfSha256.decapsulate(&sk, &[0u8; 32]),
            Err(OhttpError::Decapsulation)
        );
    }

    #[test]
    fn low_order_public_key_is_rejected_by_sender() {
        let pk = PublicKey::from_bytes(&[0u8; 32]).unwrap();
        assert!(matches!(
            Kem::X25519HkdfSha256.encapsulate(&pk),
            Err(OhttpError::InvalidArgument(_))
        ));
    }

    #[test]
    fn empty_or_short_key_material_is_invalid_argument() {
        assert!(matches!(PrivateKey::from_bytes(&[]), Err(OhttpError::InvalidArgument(_))));
        assert!(matches!(PrivateKey::from_bytes(&[1u8; 16]), Err(OhttpError::InvalidArgument(_))));
        assert!(matches!(PublicKey::from_bytes(&[]), Err(OhttpError::InvalidArgument(_))));
    }

    #[test]
    fn private_key_serialization_roundtrip() {
        let sk = PrivateKey::generate();
        let sk2 = PrivateKey::from_bytes(&*sk.to_bytes()).unwrap();
        assert_eq!(sk, sk2);
        assert_eq!(sk.public_key(), sk2.public_key());
    }
}

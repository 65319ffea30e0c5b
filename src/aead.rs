//! AEAD capability table: AES-128-GCM, AES-256-GCM, ChaCha20-Poly1305.
//!
//! Direct seal/open take an explicit key and nonce; the HPKE context and the
//! response key schedule both go through here.

extern crate alloc;
use alloc::vec::Vec;

use aes_gcm::{
    aead::{Aead as AeadCipher, KeyInit, Nonce, Payload},
    Aes128Gcm, Aes256Gcm,
};
use chacha20poly1305::ChaCha20Poly1305;
use getrandom::getrandom;

use crate::error::{AlgorithmKind, OhttpError, Result};

/// Nn for every supported AEAD.
pub const NONCE_BYTES: usize = 12;

/// Nt for every supported AEAD.
pub const TAG_BYTES: usize = 16;

/// Supported AEADs, keyed by their HPKE identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aead {
    Aes128Gcm,
    Aes256Gcm,
    ChaCha20Poly1305,
}

impl Aead {
    pub const AES_128_GCM_ID: u16 = 0x0001;
    pub const AES_256_GCM_ID: u16 = 0x0002;
    pub const CHACHA20_POLY1305_ID: u16 = 0x0003;

    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            Self::AES_128_GCM_ID => Ok(Self::Aes128Gcm),
            Self::AES_256_GCM_ID => Ok(Self::Aes256Gcm),
            Self::CHACHA20_POLY1305_ID => Ok(Self::ChaCha20Poly1305),
            other => Err(OhttpError::unsupported(AlgorithmKind::Aead, other)),
        }
    }

    pub fn is_supported(id: u16) -> bool {
        Self::from_id(id).is_ok()
    }

    pub fn id(self) -> u16 {
        match self {
            Self::Aes128Gcm => Self::AES_128_GCM_ID,
            Self::Aes256Gcm => Self::AES_256_GCM_ID,
            Self::ChaCha20Poly1305 => Self::CHACHA20_POLY1305_ID,
        }
    }

    /// Nk
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128Gcm => 16,
            Self::Aes256Gcm | Self::ChaCha20Poly1305 => 32,
        }
    }

    /// Nn
    pub fn nonce_len(self) -> usize {
        NONCE_BYTES
    }

    pub fn tag_len(self) -> usize {
        TAG_BYTES
    }

    /// Length of the response nonce and of the exported response secret.
    pub fn response_nonce_len(self) -> usize {
        self.key_len().max(self.nonce_len())
    }

    /// AEAD seal with explicit key/nonce. Output is ciphertext || tag.
    pub fn seal(self, key: &[u8], nonce: &[u8], aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.check_lengths(key, nonce)?;
        let payload = Payload { msg: plaintext, aad };
        match self {
            Self::Aes128Gcm => seal_with::<Aes128Gcm>(key, nonce, payload),
            Self::Aes256Gcm => seal_with::<Aes256Gcm>(key, nonce, payload),
            Self::ChaCha20Poly1305 => seal_with::<ChaCha20Poly1305>(key, nonce, payload),
        }
    }

    /// AEAD open with explicit key/nonce. Fails with `Authentication` on any
    /// tag mismatch, including input shorter than the tag.
    pub fn open(self, key: &[u8], nonce: &[u8], aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_lengths(key, nonce)?;
        if ciphertext.len() < self.tag_len() {
            return Err(OhttpError::Authentication);
        }
        let payload = Payload { msg: ciphertext, aad };
        match self {
            Self::Aes128Gcm => open_with::<Aes128Gcm>(key, nonce, payload),
            Self::Aes256Gcm => open_with::<Aes256Gcm>(key, nonce, payload),
            Self::ChaCha20Poly1305 => open_with::<ChaCha20Poly1305>(key, nonce, payload),
        }
    }

    fn check_lengths(self, key: &[u8], nonce: &[u8]) -> Result<()> {
        if key.len() != self.key_len() {
            return Err(OhttpError::InvalidArgument("aead key length mismatch"));
        }
        if nonce.len() != self.nonce_len() {
            return Err(OhttpError::InvalidArgument("aead nonce length mismatch"));
        }
        Ok(())
    }
}

fn seal_with<C: KeyInit + AeadCipher>(key: &[u8], nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>> {
    let cipher = C::new_from_slice(key).map_err(|_| OhttpError::InvalidArgument("aead key length mismatch"))?;
    cipher
        .encrypt(Nonce::<C>::from_slice(nonce), payload)
        .map_err(|_| OhttpError::InvalidArgument("plaintext too long for aead"))
}

fn open_with<C: KeyInit + AeadCipher>(key: &[u8], nonce: &[u8], payload: Payload<'_, '_>) -> Result<Vec<u8>> {
    let cipher = C::new_from_slice(key).map_err(|_| OhttpError::InvalidArgument("aead key length mismatch"))?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), payload)
        .map_err(|_| OhttpError::Authentication)
}

/// Draw `len` fresh random bytes. Used for response nonces only.
pub fn random_bytes(len: usize) -> Result<Vec<u8>> {
    let mut out = alloc::vec![0u8; len];
    getrandom(&mut out).map_err(|_| OhttpError::Randomness)?;
    Ok(out)
}

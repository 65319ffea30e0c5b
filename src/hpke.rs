//! HPKE base mode (RFC 9180) over the KEM/KDF/AEAD capability tables.
//!
//! Key schedule (mode_base = 0x00, empty psk/psk_id):
//!   suite_id             = "HPKE" || kem_id || kdf_id || aead_id
//!   key_schedule_context = mode || LabeledExtract("", "psk_id_hash", "")
//!                               || LabeledExtract("", "info_hash", info)
//!   secret               = LabeledExtract(shared_secret, "secret", "")
//!   key                  = LabeledExpand(secret, "key", ksc, Nk)
//!   base_nonce           = LabeledExpand(secret, "base_nonce", ksc, Nn)
//!   exporter_secret      = LabeledExpand(secret, "exp", ksc, Nh)
//!
//! Contexts own their secrets in zeroizing buffers; dropping a context on any
//! path releases them.

extern crate alloc;
use alloc::vec::Vec;

use zeroize::Zeroizing;

use crate::aead::Aead;
use crate::error::{OhttpError, Result};
use crate::kdf::Kdf;
use crate::kem::{Kem, PrivateKey, PublicKey};

const MODE_BASE: u8 = 0x00;

/// A negotiated (KEM, KDF, AEAD) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Suite {
    pub kem: Kem,
    pub kdf: Kdf,
    pub aead: Aead,
}

impl Suite {
    pub fn new(kem: Kem, kdf: Kdf, aead: Aead) -> Self {
        Self { kem, kdf, aead }
    }

    /// Resolve raw identifiers, failing on the first unsupported one.
    pub fn from_ids(kem_id: u16, kdf_id: u16, aead_id: u16) -> Result<Self> {
        Ok(Self {
            kem: Kem::from_id(kem_id)?,
            kdf: Kdf::from_id(kdf_id)?,
            aead: Aead::from_id(aead_id)?,
        })
    }

    fn suite_id(&self) -> [u8; 10] {
        let kem = self.kem.id().to_be_bytes();
        let kdf = self.kdf.id().to_be_bytes();
        let aead = self.aead.id().to_be_bytes();
        [b'H', b'P', b'K', b'E', kem[0], kem[1], kdf[0], kdf[1], aead[0], aead[1]]
    }

    fn key_schedule(&self, shared_secret: &[u8], info: &[u8]) -> Result<Context> {
        let suite_id = self.suite_id();
        let kdf = self.kdf;

        let psk_id_hash = kdf.labeled_extract(&suite_id, b"", b"psk_id_hash", b"");
        let info_hash = kdf.labeled_extract(&suite_id, b"", b"info_hash", info);

        let mut ksc = Vec::with_capacity(1 + psk_id_hash.len() + info_hash.len());
        ksc.push(MODE_BASE);
        ksc.extend_from_slice(&psk_id_hash);
        ksc.extend_from_slice(&info_hash);

        let secret = kdf.labeled_extract(&suite_id, shared_secret, b"secret", b"");
        let key = kdf.labeled_expand(&suite_id, &secret, b"key", &ksc, self.aead.key_len())?;
        let base_nonce = kdf.labeled_expand(&suite_id, &secret, b"base_nonce", &ksc, self.aead.nonce_len())?;
        let exporter_secret = kdf.labeled_expand(&suite_id, &secret, b"exp", &ksc, kdf.hash_len())?;

        Ok(Context {
            suite: *self,
            suite_id,
            key,
            base_nonce,
            exporter_secret,
            seq: 0,
        })
    }
}

// ---------------------------------------------------------------------------
// Encryption context
// ---------------------------------------------------------------------------

/// Shared state behind both sender and recipient contexts.
struct Context {
    suite: Suite,
    suite_id: [u8; 10],
    key: Zeroizing<Vec<u8>>,
    base_nonce: Zeroizing<Vec<u8>>,
    exporter_secret: Zeroizing<Vec<u8>>,
    seq: u64,
}

impl Context {
    fn next_nonce(&mut self) -> Result<Zeroizing<Vec<u8>>> {
        let mut nonce = self.base_nonce.clone();
        let seq = self.seq.to_be_bytes();
        let offset = nonce.len() - seq.len();
        for (n, s) in nonce[offset..].iter_mut().zip(seq.iter()) {
            *n ^= s;
        }
        self.seq = self
            .seq
            .checked_add(1)
            .ok_or(OhttpError::InvalidArgument("hpke sequence number overflow"))?;
        Ok(nonce)
    }

    fn seal(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = self.next_nonce()?;
        self.suite.aead.seal(&self.key, &nonce, aad, plaintext)
    }

    fn open(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        // The sequence number only advances on success.
        let saved = self.seq;
        let nonce = self.next_nonce()?;
        self.suite.aead.open(&self.key, &nonce, aad, ciphertext).map_err(|e| {
            self.seq = saved;
            e
        })
    }

    fn export(&self, exporter_context: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
        self.suite
            .kdf
            .labeled_expand(&self.suite_id, &self.exporter_secret, b"sec", exporter_context, len)
    }
}

/// Sender-side HPKE context produced by [`setup_sender`].
pub struct SenderContext {
    inner: Context,
}

impl SenderContext {
    pub fn suite(&self) -> Suite {
        self.inner.suite
    }

    pub fn seal(&mut self, aad: &[u8], plaintext: &[u8]) -> Result<Vec<u8>> {
        self.inner.seal(aad, plaintext)
    }

    /// Derive an independent secret bound to `exporter_context`.
    pub fn export(&self, exporter_context: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
        self.inner.export(exporter_context, len)
    }
}

impl core::fmt::Debug for SenderContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SenderContext").field("suite", &self.inner.suite).finish_non_exhaustive()
    }
}

/// Recipient-side HPKE context produced by [`setup_recipient`].
pub struct RecipientContext {
    inner: Context,
}

impl RecipientContext {
    pub fn suite(&self) -> Suite {
        self.inner.suite
    }

    pub fn open(&mut self, aad: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.inner.open(aad, ciphertext)
    }

    /// Derive an independent secret bound to `exporter_context`.
    pub fn export(&self, exporter_context: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
        self.inner.export(exporter_context, len)
    }
}

impl core::fmt::Debug for RecipientContext {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RecipientContext").field("suite", &self.inner.suite).finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// SetupBaseS(pkR, info) -> (enc, ctx)
pub fn setup_sender(suite: Suite, pk_r: &PublicKey, info: &[u8]) -> Result<(Vec<u8>, SenderContext)> {
    let (shared_secret, enc) = suite.kem.encapsulate(pk_r)?;
    let inner = suite.key_schedule(&shared_secret, info)?;
    Ok((enc, SenderContext { inner }))
}

/// SetupBaseS with a caller-chosen ephemeral key. Conformance vectors only.
#[cfg(any(test, feature = "kat"))]
pub fn setup_sender_with_seed(
    suite: Suite,
    pk_r: &PublicKey,
    info: &[u8],
    seed: &[u8],
) -> Result<(Vec<u8>, SenderContext)> {
    let (shared_secret, enc) = suite.kem.encapsulate_with_seed(pk_r, seed)?;
    let inner = suite.key_schedule(&shared_secret, info)?;
    Ok((enc, SenderContext { inner }))
}

/// SetupBaseR(enc, skR, info) -> ctx
pub fn setup_recipient(suite: Suite, sk_r: &PrivateKey, enc: &[u8], info: &[u8]) -> Result<RecipientContext> {
    let shared_secret = suite.kem.decapsulate(sk_r, enc)?;
    let inner = suite.key_schedule(&shared_secret, info)?;
    Ok(RecipientContext { inner })
}

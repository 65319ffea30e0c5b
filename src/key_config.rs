//! Key configuration (RFC 9458 section 3)
//!
//! Format:
//!   key_id[1] || kem_id[2] || public_key[Npk] || algorithms_len[2]
//!   || (kdf_id[2] || aead_id[2])*
//!
//! The first advertised pair with both ids supported is selected at parse
//! time and frozen. A config with no usable pair still parses; every use of
//! it fails with `UnsupportedAlgorithm`.

extern crate alloc;
use alloc::vec::Vec;

use tracing::{debug, warn};

use crate::aead::Aead;
use crate::error::{AlgorithmKind, OhttpError, Result};
use crate::hpke::Suite;
use crate::kdf::Kdf;
use crate::kem::{Kem, PublicKey};
use crate::wire::{self, Header, MediaType, HEADER_BYTES};

/// Size of one (kdf_id, aead_id) entry.
const ALGORITHM_ENTRY_BYTES: usize = 4;

/// A symmetric (KDF, AEAD) pair as advertised, not yet checked for support.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SymmetricAlgorithms {
    pub kdf_id: u16,
    pub aead_id: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyConfig {
    key_id: u8,
    kem: Kem,
    public_key: PublicKey,
    advertised: Vec<SymmetricAlgorithms>,
    selected: Option<(Kdf, Aead)>,
}

impl KeyConfig {
    /// Parse a serialized key configuration.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(data);

        let key_id = reader.u8()?;
        let kem_id = reader.u16()?;
        // Public key length depends on the KEM, so an unknown KEM stops here.
        let kem = Kem::from_id(kem_id)?;
        let pk_bytes = reader
            .take(kem.public_key_len())
            .map_err(|_| OhttpError::MalformedKeyConfig("truncated public key"))?;
        let public_key = PublicKey::from_bytes(pk_bytes)
            .map_err(|_| OhttpError::MalformedKeyConfig("invalid public key"))?;

        let algorithms_len = reader
            .u16()
            .map_err(|_| OhttpError::MalformedKeyConfig("truncated algorithms length"))?
            as usize;
        if algorithms_len % ALGORITHM_ENTRY_BYTES != 0 {
            return Err(OhttpError::MalformedKeyConfig(
                "algorithms length not a multiple of 4",
            ));
        }
        let algorithms = reader
            .take(algorithms_len)
            .map_err(|_| OhttpError::MalformedKeyConfig("truncated algorithms list"))?;

        let advertised: Vec<SymmetricAlgorithms> = algorithms
            .chunks_exact(ALGORITHM_ENTRY_BYTES)
            .map(|entry| SymmetricAlgorithms {
                kdf_id: u16::from_be_bytes([entry[0], entry[1]]),
                aead_id: u16::from_be_bytes([entry[2], entry[3]]),
            })
            .collect();

        if reader.remaining() > 0 {
            debug!(
                trailing = reader.remaining(),
                "ignoring bytes after key config algorithms list"
            );
        }

        Ok(Self::from_parts(key_id, kem, public_key, advertised))
    }

    fn from_parts(
        key_id: u8,
        kem: Kem,
        public_key: PublicKey,
        advertised: Vec<SymmetricAlgorithms>,
    ) -> Self {
        let selected = advertised.iter().find_map(|alg| {
            match (Kdf::from_id(alg.kdf_id), Aead::from_id(alg.aead_id)) {
                (Ok(kdf), Ok(aead)) => Some((kdf, aead)),
                _ => None,
            }
        });

        match selected {
            Some((kdf, aead)) => debug!(
                key_id,
                kdf_id = kdf.id(),
                aead_id = aead.id(),
                advertised = advertised.len(),
                "selected ohttp symmetric suite"
            ),
            None => warn!(
                key_id,
                advertised = advertised.len(),
                "key config advertises no supported kdf/aead pair"
            ),
        }

        Self {
            key_id,
            kem,
            public_key,
            advertised,
            selected,
        }
    }

    pub fn builder() -> KeyConfigBuilder {
        KeyConfigBuilder::default()
    }

    /// Fails with `UnsupportedAlgorithm` if no advertised pair is usable.
    pub fn validate(&self) -> Result<()> {
        self.suite().map(|_| ())
    }

    /// The frozen (KEM, KDF, AEAD) selection.
    pub fn suite(&self) -> Result<Suite> {
        match self.selected {
            Some((kdf, aead)) => Ok(Suite::new(self.kem, kdf, aead)),
            None => Err(self.unusable()),
        }
    }

    fn unusable(&self) -> OhttpError {
        // Report the first advertised pair's offending id. With nothing
        // advertised, report the reserved AEAD id 0x0000.
        let Some(alg) = self.advertised.first() else {
            return OhttpError::unsupported(AlgorithmKind::Aead, 0x0000);
        };
        match (Kdf::from_id(alg.kdf_id), Aead::from_id(alg.aead_id)) {
            (Err(e), _) | (_, Err(e)) => e,
            (Ok(_), Ok(_)) => OhttpError::unsupported(AlgorithmKind::Aead, alg.aead_id),
        }
    }

    pub fn key_id(&self) -> u8 {
        self.key_id
    }

    pub fn kem_id(&self) -> u16 {
        self.kem.id()
    }

    pub fn kdf_id(&self) -> Result<u16> {
        self.suite().map(|s| s.kdf.id())
    }

    pub fn aead_id(&self) -> Result<u16> {
        self.suite().map(|s| s.aead.id())
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// Every pair the source blob advertised, in order, supported or not.
    pub fn advertised_algorithms(&self) -> &[SymmetricAlgorithms] {
        &self.advertised
    }

    /// The 7-byte request header for the selected suite.
    pub fn header(&self) -> Result<[u8; HEADER_BYTES]> {
        Ok(Header::new(self.key_id, self.suite()?).encode())
    }

    /// HPKE info for a request: `request_label || 0x00 || header`.
    pub fn request_info(&self, media_type: MediaType) -> Result<Vec<u8>> {
        Ok(wire::request_info(media_type.request_label(), &self.header()?))
    }

    /// Serialize with exactly one algorithm pair, the selected one.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let suite = self.suite()?;
        let pk = self.public_key.as_bytes();

        let mut out = Vec::with_capacity(1 + 2 + pk.len() + 2 + ALGORITHM_ENTRY_BYTES);
        out.push(self.key_id);
        out.extend_from_slice(&self.kem.id().to_be_bytes());
        out.extend_from_slice(pk);
        out.extend_from_slice(&(ALGORITHM_ENTRY_BYTES as u16).to_be_bytes());
        out.extend_from_slice(&suite.kdf.id().to_be_bytes());
        out.extend_from_slice(&suite.aead.id().to_be_bytes());
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Build a `KeyConfig` from individual fields (local or test key material).
#[derive(Debug, Clone, Default)]
pub struct KeyConfigBuilder {
    key_id: u8,
    kem_id: Option<u16>,
    kdf_id: Option<u16>,
    aead_id: Option<u16>,
    public_key: Option<Vec<u8>>,
}

impl KeyConfigBuilder {
    pub fn key_id(mut self, key_id: u8) -> Self {
        self.key_id = key_id;
        self
    }

    pub fn kem_id(mut self, kem_id: u16) -> Self {
        self.kem_id = Some(kem_id);
        self
    }

    pub fn kdf_id(mut self, kdf_id: u16) -> Self {
        self.kdf_id = Some(kdf_id);
        self
    }

    pub fn aead_id(mut self, aead_id: u16) -> Self {
        self.aead_id = Some(aead_id);
        self
    }

    pub fn public_key(mut self, public_key: &[u8]) -> Self {
        self.public_key = Some(public_key.to_vec());
        self
    }

    /// Every field except `key_id` is required; the suite must be supported.
    pub fn build(self) -> Result<KeyConfig> {
        let kem_id = self.kem_id.ok_or(OhttpError::InvalidArgument("kem_id not set"))?;
        let kdf_id = self.kdf_id.ok_or(OhttpError::InvalidArgument("kdf_id not set"))?;
        let aead_id = self.aead_id.ok_or(OhttpError::InvalidArgument("aead_id not set"))?;
        let pk_bytes = self
            .public_key
            .ok_or(OhttpError::InvalidArgument("public key not set"))?;

        let suite = Suite::from_ids(kem_id, kdf_id, aead_id)?;
        if pk_bytes.len() != suite.kem.public_key_len() {
            return Err(OhttpError::InvalidArgument("public key length mismatch"));
        }
        let public_key = PublicKey::from_bytes(&pk_bytes)?;

        Ok(KeyConfig::from_parts(
            self.key_id,
            suite.kem,
            public_key,
            alloc::vec![SymmetricAlgorithms { kdf_id, aead_id }],
        ))
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.remaining() < len {
            return Err(OhttpError::MalformedKeyConfig("truncated key config"));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }
}

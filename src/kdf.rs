//! KDF capability table: HKDF over SHA-2.
//!
//! Plain extract/expand are used directly by the response key schedule.
//! The labeled variants prefix inputs as RFC 9180 section 4 requires:
//!
//!   LabeledExtract(salt, label, ikm)   = Extract(salt, "HPKE-v1" || suite_id || label || ikm)
//!   LabeledExpand(prk, label, info, L) = Expand(prk, I2OSP(L, 2) || "HPKE-v1" || suite_id || label || info, L)

extern crate alloc;
use alloc::vec::Vec;

use hkdf::Hkdf;
use sha2::{Sha256, Sha384, Sha512};
use zeroize::Zeroizing;

use crate::error::{AlgorithmKind, OhttpError, Result};

/// Version prefix mixed into every labeled derivation.
pub const HPKE_VERSION_LABEL: &[u8] = b"HPKE-v1";

/// Supported key derivation functions, keyed by their HPKE identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kdf {
    HkdfSha256,
    HkdfSha384,
    HkdfSha512,
}

macro_rules! with_hash {
    ($kdf:expr, $h:ident => $body:expr) => {
        match $kdf {
            Kdf::HkdfSha256 => {
                type $h = Sha256;
                $body
            }
            Kdf::HkdfSha384 => {
                type $h = Sha384;
                $body
            }
            Kdf::HkdfSha512 => {
                type $h = Sha512;
                $body
            }
        }
    };
}

impl Kdf {
    pub const HKDF_SHA256_ID: u16 = 0x0001;
    pub const HKDF_SHA384_ID: u16 = 0x0002;
    pub const HKDF_SHA512_ID: u16 = 0x0003;

    pub fn from_id(id: u16) -> Result<Self> {
        match id {
            Self::HKDF_SHA256_ID => Ok(Self::HkdfSha256),
            Self::HKDF_SHA384_ID => Ok(Self::HkdfSha384),
            Self::HKDF_SHA512_ID => Ok(Self::HkdfSha512),
            other => Err(OhttpError::unsupported(AlgorithmKind::Kdf, other)),
        }
    }

    pub fn is_supported(id: u16) -> bool {
        Self::from_id(id).is_ok()
    }

    pub fn id(self) -> u16 {
        match self {
            Self::HkdfSha256 => Self::HKDF_SHA256_ID,
            Self::HkdfSha384 => Self::HKDF_SHA384_ID,
            Self::HkdfSha512 => Self::HKDF_SHA512_ID,
        }
    }

    /// Nh: hash output length, also the PRK length.
    pub fn hash_len(self) -> usize {
        match self {
            Self::HkdfSha256 => 32,
            Self::HkdfSha384 => 48,
            Self::HkdfSha512 => 64,
        }
    }

    /// HKDF-Extract(salt, ikm) -> prk
    pub fn extract(self, salt: &[u8], ikm: &[u8]) -> Zeroizing<Vec<u8>> {
        with_hash!(self, H => {
            let (prk, _) = Hkdf::<H>::extract(Some(salt), ikm);
            Zeroizing::new(prk.to_vec())
        })
    }

    /// HKDF-Expand(prk, info, len) -> okm
    pub fn expand(self, prk: &[u8], info: &[u8], len: usize) -> Result<Zeroizing<Vec<u8>>> {
        self.expand_parts(prk, &[info], len)
    }

    fn expand_parts(self, prk: &[u8], info: &[&[u8]], len: usize) -> Result<Zeroizing<Vec<u8>>> {
        let mut okm = Zeroizing::new(alloc::vec![0u8; len]);
        with_hash!(self, H => {
            let hk = Hkdf::<H>::from_prk(prk)
                .map_err(|_| OhttpError::InvalidArgument("prk shorter than hash length"))?;
            hk.expand_multi_info(info, &mut okm)
                .map_err(|_| OhttpError::InvalidArgument("requested output too long for kdf"))?;
        });
        Ok(okm)
    }

    pub fn labeled_extract(
        self,
        suite_id: &[u8],
        salt: &[u8],
        label: &[u8],
        ikm: &[u8],
    ) -> Zeroizing<Vec<u8>> {
        let mut labeled_ikm = Zeroizing::new(Vec::with_capacity(
            HPKE_VERSION_LABEL.len() + suite_id.len() + label.len() + ikm.len(),
        ));
        labeled_ikm.extend_from_slice(HPKE_VERSION_LABEL);
        labeled_ikm.extend_from_slice(suite_id);
        labeled_ikm.extend_from_slice(label);
        labeled_ikm.extend_from_slice(ikm);
        self.extract(salt, &labeled_ikm)
    }

    pub fn labeled_expand(
        self,
        suite_id: &[u8],
        prk: &[u8],
        label: &[u8],
        info: &[u8],
        len: usize,
    ) -> Result<Zeroizing<Vec<u8>>> {
        let len_be = u16::try_from(len)
            .map_err(|_| OhttpError::InvalidArgument("requested output too long for kdf"))?
            .to_be_bytes();
        self.expand_parts(
            prk,
            &[&len_be, HPKE_VERSION_LABEL, suite_id, label, info],
            len,
        )
    }
}

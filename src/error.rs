//! Unified error type for OHTTP encapsulation.
//!
//! Variants never carry key material, nonces or plaintext.

use core::fmt;

/// Which capability table an unsupported identifier was looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Kem,
    Kdf,
    Aead,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kem => write!(f, "KEM"),
            Self::Kdf => write!(f, "KDF"),
            Self::Aead => write!(f, "AEAD"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OhttpError {
    /// Key configuration blob is truncated or structurally invalid.
    #[error("malformed key config: {0}")]
    MalformedKeyConfig(&'static str),

    /// Well-formed input names a KEM/KDF/AEAD this crate does not implement.
    #[error("unsupported {kind} algorithm: {id:#06x}")]
    UnsupportedAlgorithm { kind: AlgorithmKind, id: u16 },

    /// Encapsulated key is not valid for the recipient's private key.
    #[error("decapsulation failed")]
    Decapsulation,

    /// AEAD tag check failed. No plaintext is ever returned alongside this.
    #[error("authentication failed")]
    Authentication,

    /// Missing, empty or mis-sized key material or parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// Encapsulated request too short to hold its header.
    #[error("malformed message: {0}")]
    MalformedMessage(&'static str),

    /// The operating system random source failed.
    #[error("system randomness unavailable")]
    Randomness,
}

pub type Result<T> = core::result::Result<T, OhttpError>;

impl OhttpError {
    pub(crate) fn unsupported(kind: AlgorithmKind, id: u16) -> Self {
        Self::UnsupportedAlgorithm { kind, id }
    }
}

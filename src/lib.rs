//! # OHTTP Envelope
//!
//! Oblivious HTTP request/response encapsulation (RFC 9458) over HPKE base
//! mode (RFC 9180). A sender encrypts a payload to a gateway's advertised
//! key configuration; relays see only ciphertext; the gateway's response is
//! bound to the request through an exported secret.
//!
//! ## Quick Start
//!
//! ```rust
//! use ohttp_envelope::{KeyConfig, MediaType, PrivateKey, Recipient, Sender};
//!
//! let gateway_key = PrivateKey::generate();
//! let config = KeyConfig::builder()
//!     .key_id(1)
//!     .kem_id(0x0020)
//!     .kdf_id(0x0001)
//!     .aead_id(0x0002)
//!     .public_key(gateway_key.public_key().as_bytes())
//!     .build()
//!     .unwrap();
//!
//! let sender = Sender::new(config).unwrap();
//! let (request, context) = sender.create_request(b"bid", MediaType::Auction).unwrap();
//!
//! let gateway = Recipient::new(gateway_key);
//! let (plaintext, response_context) = gateway.decrypt(request.as_bytes(), MediaType::Auction).unwrap();
//! assert_eq!(plaintext, b"bid");
//!
//! let response = response_context.encrypt(b"accepted").unwrap();
//! assert_eq!(sender.decrypt_response(&response, context).unwrap(), b"accepted");
//! ```
//!
//! ## Supported algorithms
//!
//! - **KEM**: DHKEM(X25519, HKDF-SHA256) `0x0020`
//! - **KDF**: HKDF-SHA256 `0x0001`, HKDF-SHA384 `0x0002`, HKDF-SHA512 `0x0003`
//! - **AEAD**: AES-128-GCM `0x0001`, AES-256-GCM `0x0002`, ChaCha20-Poly1305 `0x0003`
//!
//! ## What's NOT Provided
//!
//! - Transport, retries, or key fetching
//! - Binary HTTP framing of the plaintext
//! - Key persistence or rotation
//! - HPKE PSK/Auth modes

#![deny(unsafe_code)]

extern crate alloc;

mod error;
mod key_config;
mod recipient;
mod response;
mod sender;

pub mod aead;
pub mod hpke;
pub mod kdf;
pub mod kem;
pub mod wire;

pub use error::{AlgorithmKind, OhttpError, Result};
pub use key_config::{KeyConfig, KeyConfigBuilder, SymmetricAlgorithms};
pub use kem::{PrivateKey, PublicKey};
pub use recipient::{Recipient, ResponseContext};
pub use sender::{EncapsulatedRequest, RequestContext, Sender};
pub use wire::MediaType;

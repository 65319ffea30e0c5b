//! Recipient (gateway) side: decapsulate requests, encapsulate bound responses.

extern crate alloc;
use alloc::vec::Vec;

use tracing::debug;
use zeroize::Zeroizing;

use crate::aead;
use crate::error::{OhttpError, Result};
use crate::hpke::{self, RecipientContext};
use crate::kem::PrivateKey;
use crate::response;
use crate::wire::{self, MediaType};

/// Holds the gateway private key.
#[derive(Debug, Clone)]
pub struct Recipient {
    private_key: PrivateKey,
}

/// State needed to encrypt the response to one decrypted request.
///
/// Single use: encrypting a response consumes it.
#[derive(Debug)]
pub struct ResponseContext {
    hpke: RecipientContext,
    enc: Vec<u8>,
    media_type: MediaType,
}

impl ResponseContext {
    pub fn encapsulated_key(&self) -> &[u8] {
        &self.enc
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Encrypt `plaintext` as the response to the request this context came from.
    pub fn encrypt(self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let suite = self.hpke.suite();
        let nonce_len = suite.aead.response_nonce_len();
        let response_nonce = aead::random_bytes(nonce_len)?;

        let secret: Zeroizing<Vec<u8>> = self
            .hpke
            .export(self.media_type.response_label(), nonce_len)?;
        let (key, nonce) = response::derive_key_nonce(suite, &secret, &self.enc, &response_nonce)?;
        let ciphertext = suite.aead.seal(&key, &nonce, b"", plaintext)?;

        let out = wire::encode_response(&response_nonce, &ciphertext);
        debug!(response_len = out.len(), "created ohttp response");
        Ok(out)
    }
}

impl Recipient {
    pub fn new(private_key: PrivateKey) -> Self {
        Self { private_key }
    }

    /// Build from raw private key bytes. Empty or mis-sized input is `InvalidArgument`.
    pub fn from_private_key_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(Self::new(PrivateKey::from_bytes(bytes)?))
    }

    /// Decrypt an encapsulated request.
    ///
    /// `media_type` must match what the sender used; it is not on the wire.
    pub fn decrypt(&self, encapsulated_request: &[u8], media_type: MediaType) -> Result<(Vec<u8>, ResponseContext)> {
        let parts = wire::decode_request(encapsulated_request)?;
        let info = wire::request_info(media_type.request_label(), &parts.header.encode());

        let mut ctx = hpke::setup_recipient(parts.suite, &self.private_key, parts.enc, &info).map_err(|e| {
            debug!(key_id = parts.header.key_id, error = %e, "ohttp request decapsulation failed");
            e
        })?;
        let plaintext = ctx.open(b"", parts.ciphertext).map_err(|e| {
            debug!(key_id = parts.header.key_id, error = %e, "ohttp request failed authentication");
            e
        })?;

        debug!(
            key_id = parts.header.key_id,
            ?media_type,
            plaintext_len = plaintext.len(),
            "decrypted ohttp request"
        );

        let context = ResponseContext {
            hpke: ctx,
            enc: parts.enc.to_vec(),
            media_type,
        };
        Ok((plaintext, context))
    }

    /// Encrypt a response with a context returned by [`Recipient::decrypt`].
    pub fn encrypt(&self, context: ResponseContext, plaintext: &[u8]) -> Result<Vec<u8>> {
        context.encrypt(plaintext)
    }

    /// One-shot gateway helper: re-derive the context from the original
    /// request bytes, then encrypt `plaintext` as its response.
    pub fn encrypt_response(
        &self,
        encapsulated_request: &[u8],
        media_type: MediaType,
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        if encapsulated_request.is_empty() {
            return Err(OhttpError::InvalidArgument("encapsulated request is empty"));
        }
        let (_, context) = self.decrypt(encapsulated_request, media_type)?;
        context.encrypt(plaintext)
    }
}

//! Sender (client) side: encapsulate requests, decapsulate the paired response.

extern crate alloc;
use alloc::vec::Vec;

use tracing::debug;
use zeroize::Zeroizing;

use crate::error::{OhttpError, Result};
use crate::hpke::{self, SenderContext, Suite};
use crate::key_config::KeyConfig;
use crate::response;
use crate::wire::{self, MediaType};

/// Encapsulates requests to one key configuration.
///
/// The suite is checked once at construction; a `Sender` is immutable and
/// can be shared across threads to create any number of requests.
#[derive(Debug, Clone)]
pub struct Sender {
    key_config: KeyConfig,
    suite: Suite,
    header: [u8; wire::HEADER_BYTES],
}

/// Wire bytes of an encapsulated request: `header || enc || ciphertext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulatedRequest {
    bytes: Vec<u8>,
    enc_len: usize,
}

impl EncapsulatedRequest {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn encapsulated_key(&self) -> &[u8] {
        &self.bytes[wire::HEADER_BYTES..wire::HEADER_BYTES + self.enc_len]
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.bytes[wire::HEADER_BYTES + self.enc_len..]
    }
}

impl AsRef<[u8]> for EncapsulatedRequest {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// State retained between a request and its response.
///
/// Single use: decrypting a response consumes it.
#[derive(Debug)]
pub struct RequestContext {
    enc: Vec<u8>,
    hpke: SenderContext,
    media_type: MediaType,
    key_config: KeyConfig,
}

impl RequestContext {
    pub fn encapsulated_key(&self) -> &[u8] {
        &self.enc
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn key_config(&self) -> &KeyConfig {
        &self.key_config
    }

    pub fn response_label(&self) -> &'static [u8] {
        self.media_type.response_label()
    }

    /// Decrypt the response bound to this request.
    pub fn decrypt_response(self, encapsulated_response: &[u8]) -> Result<Vec<u8>> {
        let suite = self.hpke.suite();
        let parts = wire::decode_response(encapsulated_response, suite.aead)?;

        let secret: Zeroizing<Vec<u8>> = self
            .hpke
            .export(self.response_label(), suite.aead.response_nonce_len())?;
        let (key, nonce) = response::derive_key_nonce(suite, &secret, &self.enc, parts.response_nonce)?;

        let plaintext = suite
            .aead
            .open(&key, &nonce, b"", parts.ciphertext)
            .map_err(|e| {
                debug!(key_id = self.key_config.key_id(), "ohttp response failed authentication");
                e
            })?;
        debug!(
            key_id = self.key_config.key_id(),
            plaintext_len = plaintext.len(),
            "decrypted ohttp response"
        );
        Ok(plaintext)
    }
}

impl Sender {
    /// Fails with `UnsupportedAlgorithm` if the config has no usable suite.
    pub fn new(key_config: KeyConfig) -> Result<Self> {
        let suite = key_config.suite()?;
        let header = key_config.header()?;
        Ok(Self {
            key_config,
            suite,
            header,
        })
    }

    pub fn key_config(&self) -> &KeyConfig {
        &self.key_config
    }

    pub fn suite(&self) -> Suite {
        self.suite
    }

    /// Encapsulate `plaintext` to the configured key.
    pub fn create_request(
        &self,
        plaintext: &[u8],
        media_type: MediaType,
    ) -> Result<(EncapsulatedRequest, RequestContext)> {
        let info = wire::request_info(media_type.request_label(), &self.header);
        let (enc, ctx) = hpke::setup_sender(self.suite, self.key_config.public_key(), &info)?;
        self.finish_request(plaintext, media_type, enc, ctx)
    }

    /// Same as [`Sender::create_request`] with a fixed ephemeral key.
    /// Reproducible output for conformance vectors; never use in production.
    #[cfg(any(test, feature = "kat"))]
    pub fn create_request_with_seed(
        &self,
        plaintext: &[u8],
        media_type: MediaType,
        seed: &[u8],
    ) -> Result<(EncapsulatedRequest, RequestContext)> {
        let info = wire::request_info(media_type.request_label(), &self.header);
        let (enc, ctx) = hpke::setup_sender_with_seed(self.suite, self.key_config.public_key(), &info, seed)?;
        self.finish_request(plaintext, media_type, enc, ctx)
    }

    fn finish_request(
        &self,
        plaintext: &[u8],
        media_type: MediaType,
        enc: Vec<u8>,
        mut ctx: SenderContext,
    ) -> Result<(EncapsulatedRequest, RequestContext)> {
        let ciphertext = ctx.seal(b"", plaintext)?;
        let bytes = wire::encode_request(&self.header, &enc, &ciphertext);
        debug!(
            key_id = self.key_config.key_id(),
            ?media_type,
            request_len = bytes.len(),
            "created ohttp request"
        );

        let request = EncapsulatedRequest {
            bytes,
            enc_len: enc.len(),
        };
        let context = RequestContext {
            enc,
            hpke: ctx,
            media_type,
            key_config: self.key_config.clone(),
        };
        Ok((request, context))
    }

    /// Decrypt the response for `context`, consuming it.
    pub fn decrypt_response(&self, encapsulated_response: &[u8], context: RequestContext) -> Result<Vec<u8>> {
        if context.key_config != self.key_config {
            return Err(OhttpError::InvalidArgument("request context belongs to another key"));
        }
        context.decrypt_response(encapsulated_response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kem::PrivateKey;
    use crate::recipient::Recipient;

    const SERVER_PUBLIC_KEY: &str = "6d21cfe09fbea5122f9ebc2eb2a69fcc4f06408cd54aac934f012e76fcdcef62";
    const SERVER_PRIVATE_KEY: &str = "b77431ecfa8f4cfc30d6e467aafa06944dffe28cb9dd1409e33a3045f5adc8a1";
    const SEED: &[u8; 32] = b"wwwwwwwwwwwwwwwwwwwwwwwwwwwwwwww";
    const EXPECTED_ENC: &str = "1cf579aba45a10ba1d1ef06d91fca2aa9ed0a1150515653155405d0b18cb9a67";

    fn vector_config() -> KeyConfig {
        KeyConfig::builder()
            .key_id(1)
            .kem_id(0x0020)
            .kdf_id(0x0001)
            .aead_id(0x0002)
            .public_key(&hex::decode(SERVER_PUBLIC_KEY).unwrap())
            .build()
            .unwrap()
    }

    fn vector_recipient() -> Recipient {
        Recipient::new(PrivateKey::from_bytes(&hex::decode(SERVER_PRIVATE_KEY).unwrap()).unwrap())
    }

    #[test]
    fn seeded_request_matches_known_encapsulated_key() {
        let sender = Sender::new(vector_config()).unwrap();
        let (request, ctx) = sender
            .create_request_with_seed(b"test request 1", MediaType::Bhttp, SEED)
            .unwrap();

        assert_eq!(hex::encode(request.encapsulated_key()), EXPECTED_ENC);
        assert_eq!(hex::encode(ctx.encapsulated_key()), EXPECTED_ENC);
        assert_eq!(&request.as_bytes()[..7], &[0x01, 0x00, 0x20, 0x00, 0x01, 0x00, 0x02]);

        let (plaintext, _) = vector_recipient().decrypt(request.as_bytes(), MediaType::Bhttp).unwrap();
        assert_eq!(plaintext, b"test request 1");
    }

    #[test]
    fn seeded_request_is_deterministic() {
        let sender = Sender::new(vector_config()).unwrap();
        let (a, _) = sender.create_request_with_seed(b"bid", MediaType::Auction, SEED).unwrap();
        let (b, _) = sender.create_request_with_seed(b"bid", MediaType::Auction, SEED).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn media_type_changes_ciphertext_under_same_seed() {
        let sender = Sender::new(vector_config()).unwrap();
        let (bhttp, _) = sender
            .create_request_with_seed(b"test request 1", MediaType::Bhttp, SEED)
            .unwrap();
        let (auction, _) = sender
            .create_request_with_seed(b"test request 1", MediaType::Auction, SEED)
            .unwrap();

        assert_eq!(bhttp.encapsulated_key(), auction.encapsulated_key());
        assert_ne!(bhttp.ciphertext(), auction.ciphertext());

        let recipient = vector_recipient();
        let (pt, _) = recipient.decrypt(auction.as_bytes(), MediaType::Auction).unwrap();
        assert_eq!(pt, b"test request 1");
        assert_eq!(
            recipient.decrypt(auction.as_bytes(), MediaType::Bhttp).err(),
            Some(OhttpError::Authentication)
        );
    }

    #[test]
    fn unusable_config_is_rejected_once_at_construction() {
        let mut blob = vector_config().serialize().unwrap();
        let last = blob.len() - 1;
        blob[last] = 0x09;
        let config = KeyConfig::parse(&blob).unwrap();
        assert!(matches!(
            Sender::new(config),
            Err(OhttpError::UnsupportedAlgorithm { .. })
        ));
    }

    #[test]
    fn response_roundtrip_through_context() {
        let sender = Sender::new(vector_config()).unwrap();
        let recipient = vector_recipient();

        let (request, ctx) = sender.create_request(b"get bids", MediaType::Auction).unwrap();
        let (_, response_ctx) = recipient.decrypt(request.as_bytes(), MediaType::Auction).unwrap();
        let response = response_ctx.encrypt(b"winning bid").unwrap();

        assert_eq!(sender.decrypt_response(&response, ctx).unwrap(), b"winning bid");
    }

    #[test]
    fn context_from_other_key_is_rejected() {
        let sender = Sender::new(vector_config()).unwrap();
        let other_pk = PrivateKey::generate().public_key();
        let other = Sender::new(
            KeyConfig::builder()
                .key_id(2)
                .kem_id(0x0020)
                .kdf_id(0x0001)
                .aead_id(0x0002)
                .public_key(other_pk.as_bytes())
                .build()
                .unwrap(),
        )
        .unwrap();

        let (_, ctx) = other.create_request(b"x", MediaType::Bhttp).unwrap();
        assert!(matches!(
            sender.decrypt_response(&[0u8; 64], ctx),
            Err(OhttpError::InvalidArgument(_))
        ));
    }
}

//! Wire format
//!
//! Request header (7 bytes):
//!   key_id[1] || kem_id[2] || kdf_id[2] || aead_id[2]
//!
//! Encapsulated request:
//!   header[7] || enc[Nenc] || ciphertext[..]
//!
//! Encapsulated response:
//!   response_nonce[max(Nn, Nk)] || ciphertext[..]
//!
//! Request info:
//!   request_label || 0x00 || header
//!
//! All integers are big-endian.

extern crate alloc;
use alloc::vec::Vec;

use crate::aead::Aead;
use crate::error::{OhttpError, Result};
use crate::hpke::Suite;

/// Header size: key_id + kem_id(u16) + kdf_id(u16) + aead_id(u16)
pub const HEADER_BYTES: usize = 1 + 2 + 2 + 2; // 7

pub const BHTTP_REQUEST_LABEL: &[u8] = b"message/bhttp request";
pub const BHTTP_RESPONSE_LABEL: &[u8] = b"message/bhttp response";
pub const AUCTION_REQUEST_LABEL: &[u8] = b"message/auction request";
pub const AUCTION_RESPONSE_LABEL: &[u8] = b"message/auction response";

/// Which label pair binds an exchange.
///
/// Not carried on the wire; both ends must agree out of band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    /// `message/bhttp request` / `message/bhttp response`
    Bhttp,
    /// `message/auction request` / `message/auction response`
    Auction,
}

impl MediaType {
    /// Map the legacy `has_media_type_changed` flag onto a label pair.
    pub fn from_changed(has_media_type_changed: bool) -> Self {
        if has_media_type_changed {
            Self::Auction
        } else {
            Self::Bhttp
        }
    }

    pub fn request_label(self) -> &'static [u8] {
        match self {
            Self::Bhttp => BHTTP_REQUEST_LABEL,
            Self::Auction => AUCTION_REQUEST_LABEL,
        }
    }

    pub fn response_label(self) -> &'static [u8] {
        match self {
            Self::Bhttp => BHTTP_RESPONSE_LABEL,
            Self::Auction => AUCTION_RESPONSE_LABEL,
        }
    }
}

/// Decoded request header. Identifiers are raw; resolve with [`Suite::from_ids`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub key_id: u8,
    pub kem_id: u16,
    pub kdf_id: u16,
    pub aead_id: u16,
}

impl Header {
    pub fn new(key_id: u8, suite: Suite) -> Self {
        Self {
            key_id,
            kem_id: suite.kem.id(),
            kdf_id: suite.kdf.id(),
            aead_id: suite.aead.id(),
        }
    }

    pub fn encode(&self) -> [u8; HEADER_BYTES] {
        let kem = self.kem_id.to_be_bytes();
        let kdf = self.kdf_id.to_be_bytes();
        let aead = self.aead_id.to_be_bytes();
        [self.key_id, kem[0], kem[1], kdf[0], kdf[1], aead[0], aead[1]]
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_BYTES {
            return Err(OhttpError::MalformedMessage("request shorter than header"));
        }
        Ok(Self {
            key_id: data[0],
            kem_id: u16::from_be_bytes([data[1], data[2]]),
            kdf_id: u16::from_be_bytes([data[3], data[4]]),
            aead_id: u16::from_be_bytes([data[5], data[6]]),
        })
    }
}

/// `label || 0x00 || header`
pub fn request_info(label: &[u8], header: &[u8; HEADER_BYTES]) -> Vec<u8> {
    let mut info = Vec::with_capacity(label.len() + 1 + HEADER_BYTES);
    info.extend_from_slice(label);
    info.push(0x00);
    info.extend_from_slice(header);
    info
}

/// Borrowed view of a parsed encapsulated request.
#[derive(Debug, Clone, Copy)]
pub struct RequestComponents<'a> {
    pub header: Header,
    pub suite: Suite,
    pub enc: &'a [u8],
    pub ciphertext: &'a [u8],
}

pub fn decode_request(data: &[u8]) -> Result<RequestComponents<'_>> {
    let header = Header::decode(data)?;
    let suite = Suite::from_ids(header.kem_id, header.kdf_id, header.aead_id)?;

    // A short enc is a bad encapsulated key, not a framing error.
    let enc_end = HEADER_BYTES + suite.kem.enc_len();
    if data.len() < enc_end {
        return Err(OhttpError::Decapsulation);
    }

    Ok(RequestComponents {
        header,
        suite,
        enc: &data[HEADER_BYTES..enc_end],
        ciphertext: &data[enc_end..],
    })
}

pub fn encode_request(header: &[u8; HEADER_BYTES], enc: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_BYTES + enc.len() + ciphertext.len());
    out.extend_from_slice(header);
    out.extend_from_slice(enc);
    out.extend_from_slice(ciphertext);
    out
}

/// Borrowed view of a parsed encapsulated response.
#[derive(Debug, Clone, Copy)]
pub struct ResponseComponents<'a> {
    pub response_nonce: &'a [u8],
    pub ciphertext: &'a [u8],
}

/// A response too short for nonce and tag fails `Authentication`.
pub fn decode_response(data: &[u8], aead: Aead) -> Result<ResponseComponents<'_>> {
    let nonce_len = aead.response_nonce_len();
    if data.len() < nonce_len + aead.tag_len() {
        return Err(OhttpError::Authentication);
    }
    let (response_nonce, ciphertext) = data.split_at(nonce_len);
    Ok(ResponseComponents {
        response_nonce,
        ciphertext,
    })
}

pub fn encode_response(response_nonce: &[u8], ciphertext: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(response_nonce.len() + ciphertext.len());
    out.extend_from_slice(response_nonce);
    out.extend_from_slice(ciphertext);
    out
}

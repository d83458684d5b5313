//! Byte layout and text encoding of encryption results.
//!
//! The default layout is the bare blob `NONCE (12) | CIPHERTEXT+TAG`, with no
//! length prefix. [`v1`] describes the self-describing envelope that also
//! carries the KDF parameters.

use std::fmt;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;

use crate::crypto::{MIN_BLOB_LEN, NONCE_LEN};
use crate::error::{CryptError, Result};

pub mod v1;

pub use v1::Envelope;

/// Magic bytes identifying a passlock envelope ("PLCK").
pub const MAGIC: &[u8; 4] = b"PLCK";
/// Length of magic bytes.
pub const MAGIC_LEN: usize = 4;
/// Length of version field.
pub const VER_LEN: usize = 1;
/// Latest envelope version
pub const CURRENT_VERSION: u8 = v1::VERSION_V1;

/// Text representation of an encrypted blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Lowercase hex, two digits per byte, no separators.
    #[default]
    Hex,
    /// Standard base64 alphabet with padding.
    Base64,
}

impl Encoding {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Hex => "hex",
            Self::Base64 => "base64",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Encoding {
    type Err = CryptError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hex" => Ok(Self::Hex),
            "base64" => Ok(Self::Base64),
            _ => Err(CryptError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Join nonce and ciphertext into one blob.
pub fn pack(nonce: &[u8; NONCE_LEN], ciphertext: &[u8]) -> Vec<u8> {
    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(nonce);
    blob.extend_from_slice(ciphertext);
    blob
}

/// Split a blob into nonce and ciphertext.
///
/// # Errors
///
/// Returns [`CryptError::TooShort`] if the blob cannot hold a nonce and a tag.
pub fn unpack(blob: &[u8]) -> Result<([u8; NONCE_LEN], &[u8])> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(CryptError::TooShort);
    }
    let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
    let nonce: [u8; NONCE_LEN] = nonce.try_into().map_err(|_| CryptError::TooShort)?;
    Ok((nonce, ciphertext))
}

/// Encode bytes as text.
pub fn encode(bytes: &[u8], format: Encoding) -> String {
    match format {
        Encoding::Hex => hex::encode(bytes),
        Encoding::Base64 => STANDARD.encode(bytes),
    }
}

/// Decode text produced by [`encode`].
///
/// # Errors
///
/// Returns [`CryptError::InvalidEncoding`] for odd-length or non-hex input,
/// or base64 with a bad alphabet or padding.
pub fn decode(text: &str, format: Encoding) -> Result<Vec<u8>> {
    match format {
        Encoding::Hex => hex::decode(text).map_err(|_| CryptError::InvalidEncoding),
        Encoding::Base64 => STANDARD.decode(text).map_err(|_| CryptError::InvalidEncoding),
    }
}

/// Parses an envelope, dispatching on its version byte.
///
/// # Errors
///
/// Returns [`CryptError::InvalidEncoding`] if:
/// - The data is too short to hold magic and version
/// - The magic bytes are wrong
/// - The version is unsupported
pub fn parse_envelope(data: &[u8]) -> Result<Envelope> {
    if data.len() < MAGIC_LEN + VER_LEN {
        return Err(CryptError::InvalidEncoding);
    }

    if &data[..MAGIC_LEN] != MAGIC {
        return Err(CryptError::InvalidEncoding);
    }

    match data[MAGIC_LEN] {
        v1::VERSION_V1 => v1::parse(data),
        version => {
            tracing::debug!(version, "unsupported envelope version");
            Err(CryptError::InvalidEncoding)
        }
    }
}

/// Serializes an envelope in the current version.
pub fn serialize_envelope(envelope: &Envelope) -> Result<Vec<u8>> {
    v1::serialize(envelope)
}

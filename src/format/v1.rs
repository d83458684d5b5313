//! Envelope format v1.
//!
//! V1 layout:
//! ```text
//! MAGIC (4) | VERSION (1) | ITERATIONS (4, LE) | SALT_LEN (1) | SALT (SALT_LEN) | NONCE (12) | CIPHERTEXT+TAG
//! ```
//!
//! The salt is stored as UTF-8 text, so a 12-character salt occupies between
//! 12 and 48 bytes.

use super::{MAGIC, MAGIC_LEN, VER_LEN};
use crate::crypto::MIN_BLOB_LEN;
use crate::error::{CryptError, Result};

/// Current envelope version.
pub const VERSION_V1: u8 = 1;

const ITER_LEN: usize = 4;
const SALT_LEN_LEN: usize = 1;

const FIXED_LEN: usize = MAGIC_LEN + VER_LEN + ITER_LEN + SALT_LEN_LEN;

/// A parsed envelope. Field contents are not validated here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    iterations: u32,
    salt: String,
    /// `NONCE | CIPHERTEXT+TAG`, the same layout as a bare blob.
    blob: Vec<u8>,
}

impl Envelope {
    pub fn new(iterations: u32, salt: String, blob: Vec<u8>) -> Self {
        Self {
            iterations,
            salt,
            blob,
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn salt(&self) -> &str {
        &self.salt
    }

    pub fn blob(&self) -> &[u8] {
        &self.blob
    }
}

/// Parses a v1 envelope.
///
/// # Errors
///
/// [`CryptError::InvalidEncoding`] if the header is truncated or the salt is
/// not UTF-8; [`CryptError::TooShort`] if the body cannot hold a nonce and tag.
pub fn parse(data: &[u8]) -> Result<Envelope> {
    if data.len() < FIXED_LEN {
        return Err(CryptError::InvalidEncoding);
    }

    let mut offset = MAGIC_LEN + VER_LEN;

    let iterations = u32::from_le_bytes(
        data[offset..offset + ITER_LEN]
            .try_into()
            .map_err(|_| CryptError::InvalidEncoding)?,
    );
    offset += ITER_LEN;

    let salt_len = data[offset] as usize;
    offset += SALT_LEN_LEN;

    let salt = data
        .get(offset..offset + salt_len)
        .ok_or(CryptError::InvalidEncoding)?;
    let salt = std::str::from_utf8(salt)
        .map_err(|_| CryptError::InvalidEncoding)?
        .to_string();
    offset += salt_len;

    let blob = data[offset..].to_vec();
    if blob.len() < MIN_BLOB_LEN {
        return Err(CryptError::TooShort);
    }

    Ok(Envelope::new(iterations, salt, blob))
}

/// Serializes an envelope to v1 bytes.
///
/// # Errors
///
/// [`CryptError::InvalidSaltLength`] if the salt does not fit the one-byte
/// length field.
pub fn serialize(envelope: &Envelope) -> Result<Vec<u8>> {
    let salt = envelope.salt().as_bytes();
    let salt_len: u8 = salt
        .len()
        .try_into()
        .map_err(|_| CryptError::InvalidSaltLength)?;

    let mut buf = Vec::with_capacity(FIXED_LEN + salt.len() + envelope.blob().len());

    buf.extend_from_slice(MAGIC);
    buf.push(VERSION_V1);
    buf.extend_from_slice(&envelope.iterations().to_le_bytes());
    buf.push(salt_len);
    buf.extend_from_slice(salt);
    buf.extend_from_slice(envelope.blob());

    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::NONCE_LEN;
    use crate::format;

    fn sample() -> Envelope {
        let mut blob = vec![2u8; NONCE_LEN];
        blob.extend_from_slice(&[3u8; 20]);
        Envelope::new(4096, "abcdefghijkl".into(), blob)
    }

    #[test]
    fn envelope_roundtrip() {
        let env = sample();
        let bytes = serialize(&env).unwrap();

        assert_eq!(&bytes[..MAGIC_LEN], MAGIC);
        assert_eq!(bytes[MAGIC_LEN], VERSION_V1);

        let parsed = format::parse_envelope(&bytes).unwrap();
        assert_eq!(parsed, env);
    }

    #[test]
    fn multibyte_salt_survives() {
        let env = Envelope::new(1000, "ääääääääääää".into(), sample().blob().to_vec());
        let parsed = parse(&serialize(&env).unwrap()).unwrap();
        assert_eq!(parsed.salt(), "ääääääääääää");
    }

    #[test]
    fn truncated_salt_fails() {
        let bytes = serialize(&sample()).unwrap();
        assert_eq!(parse(&bytes[..FIXED_LEN + 4]), Err(CryptError::InvalidEncoding));
    }

    #[test]
    fn short_body_fails() {
        let bytes = serialize(&sample()).unwrap();
        let cut = bytes.len() - 5;
        assert_eq!(parse(&bytes[..cut]), Err(CryptError::TooShort));
    }

    #[test]
    fn header_too_short_fails() {
        assert_eq!(parse(&[0u8; 5]), Err(CryptError::InvalidEncoding));
    }
}

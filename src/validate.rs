//! Input checks run before any key material is touched.
//!
//! Each check looks at one field and either passes or returns the error the
//! caller should see. Callers run them in the order key, salt, iterations,
//! text and stop at the first failure.

use crate::crypto::{KdfParams, MIN_BLOB_LEN, SALT_CHARS};
use crate::error::{CryptError, Result};
use crate::format::{self, Encoding};

/// The passphrase must not be empty. Whitespace-only passphrases are allowed.
pub fn check_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CryptError::EmptyKey);
    }
    Ok(())
}

/// The salt must be exactly 12 characters (not bytes).
pub fn check_salt(salt: &str) -> Result<()> {
    if salt.chars().count() != SALT_CHARS {
        return Err(CryptError::InvalidSaltLength);
    }
    Ok(())
}

/// Parse an iteration count given as text.
///
/// Surrounding whitespace is ignored; anything that is not a non-negative
/// integer, or is below the minimum, is rejected.
pub fn check_iterations(iterations: &str) -> Result<KdfParams> {
    let n: u32 = iterations
        .trim()
        .parse()
        .map_err(|_| CryptError::InvalidIterations)?;
    KdfParams::new(n)
}

/// Plaintext or ciphertext must contain something other than whitespace.
pub fn check_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(CryptError::EmptyText);
    }
    Ok(())
}

/// The ciphertext must be well-formed in the selected encoding.
///
/// Returns the decoded bytes so the input is only decoded once.
pub fn check_encoding(input: &str, format: Encoding) -> Result<Vec<u8>> {
    let bad_hex = input.is_empty() || !input.bytes().all(|b| b.is_ascii_hexdigit());
    if format == Encoding::Hex && bad_hex {
        return Err(CryptError::InvalidEncoding);
    }
    format::decode(input, format)
}

/// A decoded blob must hold at least a nonce and a tag.
pub fn check_blob_len(blob: &[u8]) -> Result<()> {
    if blob.len() < MIN_BLOB_LEN {
        return Err(CryptError::TooShort);
    }
    Ok(())
}

/// Run the shared field checks in order and return the parsed KDF parameters.
pub fn check_inputs(key: &str, salt: &str, iterations: &str, text: &str) -> Result<KdfParams> {
    check_key(key)?;
    check_salt(salt)?;
    let kdf = check_iterations(iterations)?;
    check_text(text)?;
    Ok(kdf)
}
